pub mod file;
pub mod header;
pub mod io_handle;
pub mod io_provider;
pub mod page_table;
