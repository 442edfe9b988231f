use std::{
    cell::Cell,
    io::{self, SeekFrom},
    rc::Rc,
};

use esedb::{AbortHandle, BlockIoProvider, MemoryIoProvider};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Memory provider that counts how often it was closed.
pub struct CountingProvider {
    inner: MemoryIoProvider,
    pub closes: Rc<Cell<u32>>,
}

impl CountingProvider {
    pub fn new(image: Vec<u8>) -> Self {
        Self {
            inner: MemoryIoProvider::new(image),
            closes: Rc::new(Cell::new(0)),
        }
    }
}

impl BlockIoProvider for CountingProvider {
    fn open(&mut self, read_only: bool) -> io::Result<()> {
        self.inner.open(read_only)
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buffer)
    }

    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        self.inner.seek(position)
    }

    fn size(&mut self) -> io::Result<u64> {
        self.inner.size()
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes.set(self.closes.get() + 1);
        self.inner.close()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}

/// Provider whose open always fails.
pub struct FailingProvider;

impl BlockIoProvider for FailingProvider {
    fn open(&mut self, _read_only: bool) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"))
    }

    fn read(&mut self, _buffer: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("not open"))
    }

    fn seek(&mut self, _position: SeekFrom) -> io::Result<u64> {
        Err(io::Error::other("not open"))
    }

    fn size(&mut self) -> io::Result<u64> {
        Err(io::Error::other("not open"))
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        false
    }
}

/// Memory provider that raises an abort signal the first time a read is
/// positioned at or past `trigger_offset`.
pub struct AbortingProvider {
    inner: MemoryIoProvider,
    abort: Option<AbortHandle>,
    trigger_offset: u64,
}

impl AbortingProvider {
    pub fn new(image: Vec<u8>, trigger_offset: u64) -> Self {
        Self {
            inner: MemoryIoProvider::new(image),
            abort: None,
            trigger_offset,
        }
    }

    pub fn attach(&mut self, abort: AbortHandle) {
        self.abort = Some(abort);
    }
}

impl BlockIoProvider for AbortingProvider {
    fn open(&mut self, read_only: bool) -> io::Result<()> {
        self.inner.open(read_only)
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buffer)
    }

    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        let offset = self.inner.seek(position)?;
        if offset >= self.trigger_offset {
            if let Some(abort) = &self.abort {
                abort.signal();
            }
        }
        Ok(offset)
    }

    fn size(&mut self) -> io::Result<u64> {
        self.inner.size()
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }
}
