//! Streams over memory.

use std::io;

use super::{FileMode, Mode, NativeStream};
use crate::{Decorator, Error, Result};

/// A readable, writable and seekable stream over a growable byte buffer.
///
/// The buffer lives as long as the stream, and is released on dispose.
pub type MemoryStream = Decorator<NativeStream<io::Cursor<Vec<u8>>>>;

impl Decorator<NativeStream<io::Cursor<Vec<u8>>>> {
    /// Creates an empty memory stream.
    ///
    /// Only [`FileMode::Open`], which is read-write, and [`FileMode::Append`],
    /// which is read-write with every write going to the end, are supported.
    ///
    /// # Errors
    ///
    /// Other modes are an [`Error::InvalidArgument`].
    pub fn open(mode: FileMode) -> Result<MemoryStream> {
        let mode = match mode {
            FileMode::Open => Mode::READ_WRITE,
            FileMode::Append => Mode::APPEND_READ,
            _ => {
                return Err(Error::invalid_argument(
                    "mode",
                    format!("{mode:?}"),
                    "memory stream supports only open and append",
                ))
            }
        };
        Ok(Decorator::new(NativeStream::new(io::Cursor::default(), mode)))
    }

    /// Creates a read-write memory stream holding `bytes`, positioned at the
    /// start.
    #[must_use]
    pub fn with_bytes<B: Into<Vec<u8>>>(bytes: B) -> MemoryStream {
        Decorator::new(NativeStream::new(
            io::Cursor::new(bytes.into()),
            Mode::READ_WRITE,
        ))
    }

    /// Returns the buffer, unless the stream has been disposed.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.get_ref().get_ref().map(|cursor| cursor.get_ref().as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SeekOrigin, Stream};

    #[test]
    fn memory_open() {
        let case = "open is read-write";
        let mut stream = MemoryStream::open(FileMode::Open).expect(case);
        assert!(stream.can_read() && stream.can_write() && stream.can_seek(), "{case}");
        stream.write(b"abc").expect(case);
        stream.seek(1, SeekOrigin::Origin).expect(case);
        stream.write(b"X").expect(case);
        assert_eq!(stream.bytes(), Some(&b"aXc"[..]), "{case}");

        let case = "append writes at the end";
        let mut stream = MemoryStream::open(FileMode::Append).expect(case);
        stream.write(b"abc").expect(case);
        stream.seek(0, SeekOrigin::Origin).expect(case);
        stream.write(b"d").expect(case);
        assert_eq!(stream.bytes(), Some(&b"abcd"[..]), "{case}");

        let case = "other modes fail";
        for mode in [FileMode::Create, FileMode::CreateNew, FileMode::OpenOrCreate, FileMode::Truncate] {
            let err = MemoryStream::open(mode).expect_err(case);
            assert!(
                matches!(err, Error::InvalidArgument { name: "mode", .. }),
                "{case}: {mode:?}"
            );
        }
    }

    #[test]
    fn memory_with_bytes() {
        let mut stream = MemoryStream::with_bytes("hello");
        assert_eq!(stream.position().unwrap(), 0);
        assert_eq!(stream.length().unwrap(), Some(5));
        assert_eq!(stream.read(3).unwrap(), b"hel");

        stream.dispose().unwrap();
        assert_eq!(stream.bytes(), None);
    }
}
