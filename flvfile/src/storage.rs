//! Seekable byte storage backing a write session.

use std::fs::File;
use std::io::{self, Cursor, Seek, Write};

/// Storage a [`FlvWriter`](crate::FlvWriter) appends to.
///
/// Besides sequential writes and absolute seeks, a writer needs a way to push data to
/// durable storage after the preamble and on every finalize.
pub trait Storage: Write + Seek {
    /// Flush buffered data and wait until it reaches durable storage.
    fn sync_durable(&mut self) -> io::Result<()>;
}

impl Storage for File {
    fn sync_durable(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

impl Storage for Cursor<Vec<u8>> {
    fn sync_durable(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Storage for Cursor<&mut Vec<u8>> {
    fn sync_durable(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn sync_durable(&mut self) -> io::Result<()> {
        (**self).sync_durable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::SeekFrom;

    #[test]
    fn test_cursor_storage() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_all(b"abcdef").unwrap();
        cursor.seek(SeekFrom::Start(1)).unwrap();
        cursor.write_all(b"X").unwrap();
        cursor.sync_durable().unwrap();
        assert_eq!(cursor.into_inner(), b"aXcdef");
    }

    #[test]
    fn test_file_storage() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"FLV").unwrap();
        file.sync_durable().unwrap();
        assert_eq!(file.metadata().unwrap().len(), 3);
    }
}
