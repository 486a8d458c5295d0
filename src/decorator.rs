//! A stream forwarding to another stream.

use std::{fs, time::Duration};

use crate::{Result, SeekOrigin, Stream};

/// Forwards every [`Stream`] operation to the inner stream unchanged.
///
/// It serves as a base for specialized streams that only differ in how the
/// inner stream is created, such as [`FileStream`] or [`MemoryStream`],
/// without reimplementing the contract.
///
/// [`FileStream`]: crate::io::FileStream
/// [`MemoryStream`]: crate::io::MemoryStream
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Decorator<S> {
    inner: S,
}

impl<S> Decorator<S> {
    /// Wraps `inner`.
    #[inline]
    #[must_use]
    pub fn new(inner: S) -> Decorator<S> {
        Decorator { inner }
    }

    /// Returns the inner stream.
    #[inline]
    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns the inner stream.
    #[inline]
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwraps the inner stream.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Stream> From<S> for Decorator<S> {
    #[inline]
    fn from(value: S) -> Decorator<S> {
        Decorator::new(value)
    }
}

impl<S: Stream> Stream for Decorator<S> {
    #[inline]
    fn can_read(&self) -> bool {
        self.inner.can_read()
    }

    #[inline]
    fn can_write(&self) -> bool {
        self.inner.can_write()
    }

    #[inline]
    fn can_seek(&self) -> bool {
        self.inner.can_seek()
    }

    #[inline]
    fn can_timeout(&self) -> bool {
        self.inner.can_timeout()
    }

    #[inline]
    fn length(&mut self) -> Result<Option<u64>> {
        self.inner.length()
    }

    #[inline]
    fn position(&mut self) -> Result<u64> {
        self.inner.position()
    }

    #[inline]
    fn set_position(&mut self, position: u64) -> Result<()> {
        self.inner.set_position(position)
    }

    #[inline]
    fn set_length(&mut self, length: u64) -> Result<()> {
        self.inner.set_length(length)
    }

    #[inline]
    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        self.inner.read(count)
    }

    #[inline]
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.inner.write(data)
    }

    #[inline]
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        self.inner.seek(offset, origin)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    #[inline]
    fn dispose(&mut self) -> Result<()> {
        self.inner.dispose()
    }

    #[inline]
    fn read_timeout(&self) -> Result<Duration> {
        self.inner.read_timeout()
    }

    #[inline]
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.inner.set_read_timeout(timeout)
    }

    #[inline]
    fn write_timeout(&self) -> Result<Duration> {
        self.inner.write_timeout()
    }

    #[inline]
    fn set_write_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.inner.set_write_timeout(timeout)
    }

    #[inline]
    fn copy_to(&mut self, destination: &mut dyn Stream, buffer_size: Option<usize>) -> Result<u64> {
        self.inner.copy_to(destination, buffer_size)
    }

    #[inline]
    fn native_file(&mut self) -> Option<&mut fs::File> {
        self.inner.native_file()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::{
        io::{Mode, NativeStream},
        Error,
    };

    #[test]
    fn decorator_forwards_capabilities() {
        let case = "write capability is the inner write capability";
        let stream = Decorator::new(NativeStream::new(io::Cursor::new(Vec::new()), Mode::WRITE));
        assert!(stream.can_write(), "{case}");
        assert!(!stream.can_timeout(), "{case}");
        assert!(!stream.can_read(), "{case}");

        let case = "read-only";
        let stream = Decorator::new(NativeStream::new(io::Cursor::new(Vec::new()), Mode::READ));
        assert!(!stream.can_write(), "{case}");
        assert!(stream.can_read(), "{case}");
        assert!(stream.can_seek(), "{case}");
    }

    #[test]
    fn decorator_forwards_io() {
        let mut stream = Decorator::new(NativeStream::new(
            io::Cursor::new(b"abcdef".to_vec()),
            Mode::READ_WRITE,
        ));
        assert_eq!(stream.read(2).unwrap(), b"ab");
        assert_eq!(stream.seek(-1, SeekOrigin::End).unwrap(), 5);
        assert_eq!(stream.write(b"XY").unwrap(), 2);
        assert_eq!(stream.length().unwrap(), Some(7));
        assert_eq!(stream.position().unwrap(), 7);
        assert!(matches!(
            stream.read_timeout(),
            Err(Error::NotSupported(_))
        ));

        stream.dispose().unwrap();
        assert!(!stream.can_read());
        assert!(matches!(stream.read(1), Err(Error::ObjectDisposed(_))));
        assert!(stream.into_inner().into_inner().is_none());
    }
}
