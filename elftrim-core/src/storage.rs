use std::fs::File;
use std::io::{self, Cursor, Read, Seek, Write};

/// Byte storage a trim operates on: seekable reads and writes plus the two
/// whole-file operations the committer needs.
///
/// Implemented for `File` (the real thing) and for `Cursor<Vec<u8>>`, which
/// keeps the whole pipeline runnable against in-memory images.
pub trait Storage: Read + Write + Seek {
    /// Current total length in bytes.
    fn len(&mut self) -> io::Result<u64>;

    /// Sets the total length to `len`, truncating or zero-extending.
    fn resize(&mut self, len: u64) -> io::Result<()>;
}

impl Storage for File {
    fn len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn resize(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl Storage for Cursor<Vec<u8>> {
    fn len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().len() as u64)
    }

    fn resize(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().resize(len as usize, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_resize_truncates_and_extends() {
        let mut cur = Cursor::new(vec![1u8, 2, 3, 4]);
        cur.resize(2).unwrap();
        assert_eq!(cur.len().unwrap(), 2);
        assert_eq!(cur.get_ref(), &vec![1, 2]);

        cur.resize(5).unwrap();
        assert_eq!(cur.get_ref(), &vec![1, 2, 0, 0, 0]);
    }
}
