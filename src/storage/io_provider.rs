use std::{
    fs::{File, OpenOptions},
    io::{self, Cursor, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

/// Random-access byte source backing an ESE file.
pub trait BlockIoProvider {
    fn open(&mut self, read_only: bool) -> io::Result<()>;

    /// Reads up to `buffer.len()` bytes, returning the count read.
    /// A count lower than requested means end of data.
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    fn seek(&mut self, position: SeekFrom) -> io::Result<u64>;

    fn size(&mut self) -> io::Result<u64>;

    fn close(&mut self) -> io::Result<()>;

    fn is_open(&self) -> bool;

    /// Fills `buffer` as far as the data allows.
    fn read_fully(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buffer.len() {
            match self.read(&mut buffer[total..]) {
                Ok(0) => break,
                Ok(count) => total += count,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "block I/O provider is not open")
}

/// Local file provider.
pub struct FileIoProvider {
    path: PathBuf,
    file: Option<File>,
}

impl FileIoProvider {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(not_open)
    }
}

impl BlockIoProvider for FileIoProvider {
    fn open(&mut self, read_only: bool) -> io::Result<()> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .read(true)
            .write(!read_only)
            .open(&self.path)?;
        self.file = Some(file);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.file_mut()?.read(buffer)
    }

    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        self.file_mut()?.seek(position)
    }

    fn size(&mut self) -> io::Result<u64> {
        Ok(self.file_mut()?.metadata()?.len())
    }

    fn close(&mut self) -> io::Result<()> {
        self.file = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

/// In-memory provider over an owned buffer, e.g. a carved image.
pub struct MemoryIoProvider {
    cursor: Cursor<Vec<u8>>,
    open: bool,
}

impl MemoryIoProvider {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(data),
            open: false,
        }
    }

    pub fn data(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl BlockIoProvider for MemoryIoProvider {
    fn open(&mut self, _read_only: bool) -> io::Result<()> {
        self.cursor.set_position(0);
        self.open = true;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        if !self.open {
            return Err(not_open());
        }
        self.cursor.read(buffer)
    }

    fn seek(&mut self, position: SeekFrom) -> io::Result<u64> {
        if !self.open {
            return Err(not_open());
        }
        self.cursor.seek(position)
    }

    fn size(&mut self) -> io::Result<u64> {
        if !self.open {
            return Err(not_open());
        }
        Ok(self.cursor.get_ref().len() as u64)
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
