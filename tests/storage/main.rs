mod common;

mod header_test;
