//! A stream created on first use.

use core::fmt;
use std::{fs, time::Duration};

use once_cell::unsync::OnceCell;

use crate::{Error, Result, SeekOrigin, Stream};

/// A stream that defers creating the inner stream until the first call that
/// needs it.
///
/// The constructor is called at most once successfully; if it fails, the
/// error is returned from the call that triggered it, and the next call tries
/// again. Capability queries cannot fail, so they report `false` until the
/// stream can be created.
///
/// Disposing a stream that has never been created does not create it, yet
/// marks it as disposed.
pub struct Lazy<S, F> {
    inner: OnceCell<S>,
    constructor: F,
    disposed: bool,
}

impl<S, F> Lazy<S, F>
where
    S: Stream,
    F: Fn() -> Result<S>,
{
    /// Creates a lazy stream, which is created by `constructor` on first use.
    #[inline]
    #[must_use]
    pub fn new(constructor: F) -> Lazy<S, F> {
        Lazy {
            inner: OnceCell::new(),
            constructor,
            disposed: false,
        }
    }

    /// Whether the inner stream has been created.
    #[inline]
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.inner.get().is_some()
    }

    /// Returns the inner stream, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectDisposed`] if the stream was disposed before
    /// being created, or the error of the constructor.
    pub fn get(&self) -> Result<&S> {
        if self.disposed && !self.is_materialized() {
            return Err(Error::ObjectDisposed("lazy stream"));
        }
        self.inner.get_or_try_init(|| {
            log::debug!("materializing lazy stream");
            (self.constructor)()
        })
    }

    /// Returns the inner stream, creating it if needed.
    ///
    /// # Errors
    ///
    /// Same as [`Lazy::get`].
    pub fn get_mut(&mut self) -> Result<&mut S> {
        self.get()?;
        self.inner
            .get_mut()
            .ok_or(Error::InvalidOperation("lazy stream is not materialized"))
    }

    /// Unwraps the inner stream, if it has been created.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Option<S> {
        self.inner.into_inner()
    }

    /// Queries a capability of the inner stream, reporting `false` if it
    /// cannot be created.
    #[inline]
    fn capability(&self, f: impl FnOnce(&S) -> bool) -> bool {
        match self.get() {
            Ok(stream) => f(stream),
            Err(Error::ObjectDisposed(_)) => false,
            Err(err) => {
                log::warn!("lazy stream cannot be materialized: {err}");
                false
            }
        }
    }
}

impl<S: fmt::Debug, F> fmt::Debug for Lazy<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("inner", &self.inner)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<S, F> Stream for Lazy<S, F>
where
    S: Stream,
    F: Fn() -> Result<S>,
{
    fn can_read(&self) -> bool {
        self.capability(Stream::can_read)
    }

    fn can_write(&self) -> bool {
        self.capability(Stream::can_write)
    }

    fn can_seek(&self) -> bool {
        self.capability(Stream::can_seek)
    }

    fn can_timeout(&self) -> bool {
        self.capability(Stream::can_timeout)
    }

    fn length(&mut self) -> Result<Option<u64>> {
        self.get_mut()?.length()
    }

    fn position(&mut self) -> Result<u64> {
        self.get_mut()?.position()
    }

    fn set_position(&mut self, position: u64) -> Result<()> {
        self.get_mut()?.set_position(position)
    }

    fn set_length(&mut self, length: u64) -> Result<()> {
        self.get_mut()?.set_length(length)
    }

    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        self.get_mut()?.read(count)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.get_mut()?.write(data)
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        self.get_mut()?.seek(offset, origin)
    }

    fn flush(&mut self) -> Result<()> {
        self.get_mut()?.flush()
    }

    fn dispose(&mut self) -> Result<()> {
        self.disposed = true;
        match self.inner.get_mut() {
            Some(stream) => stream.dispose(),
            None => Ok(()),
        }
    }

    fn read_timeout(&self) -> Result<Duration> {
        self.get()?.read_timeout()
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.get_mut()?.set_read_timeout(timeout)
    }

    fn write_timeout(&self) -> Result<Duration> {
        self.get()?.write_timeout()
    }

    fn set_write_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.get_mut()?.set_write_timeout(timeout)
    }

    fn copy_to(&mut self, destination: &mut dyn Stream, buffer_size: Option<usize>) -> Result<u64> {
        self.get_mut()?.copy_to(destination, buffer_size)
    }

    fn native_file(&mut self) -> Option<&mut fs::File> {
        self.get_mut().ok()?.native_file()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::io::MemoryStream;

    #[test]
    fn lazy_materializes_once() {
        let calls = Cell::new(0);
        let mut stream = Lazy::new(|| {
            calls.set(calls.get() + 1);
            Ok(MemoryStream::with_bytes("abc"))
        });

        let case = "not created on construction";
        assert!(!stream.is_materialized(), "{case}");
        assert_eq!(calls.get(), 0, "{case}");

        let case = "created by a capability query";
        assert!(stream.can_read(), "{case}");
        assert!(stream.is_materialized(), "{case}");

        let case = "created only once";
        assert_eq!(stream.read(2).unwrap(), b"ab", "{case}");
        assert_eq!(stream.position().unwrap(), 2, "{case}");
        assert_eq!(calls.get(), 1, "{case}");
    }

    #[test]
    fn lazy_constructor_failure() {
        let fail = Cell::new(true);
        let mut stream = Lazy::new(|| {
            if fail.get() {
                return Err(Error::NotSupported("not yet"));
            }
            Ok(MemoryStream::with_bytes("abc"))
        });

        let case = "capabilities are false";
        assert!(!stream.can_read(), "{case}");
        assert!(!stream.can_seek(), "{case}");

        let case = "io returns the constructor error";
        let err = stream.read(1).expect_err(case);
        assert!(matches!(err, Error::NotSupported("not yet")), "{case}");
        assert!(!stream.is_materialized(), "{case}");

        let case = "retried on next call";
        fail.set(false);
        assert_eq!(stream.read(1).expect(case), b"a", "{case}");
    }

    #[test]
    fn lazy_dispose() {
        let case = "not created on dispose";
        let mut stream = Lazy::new(|| Ok(MemoryStream::with_bytes("abc")));
        stream.dispose().expect(case);
        assert!(!stream.is_materialized(), "{case}");
        assert!(!stream.can_read(), "{case}");
        let err = stream.read(1).expect_err(case);
        assert!(matches!(err, Error::ObjectDisposed(_)), "{case}");

        let case = "created stream is disposed";
        let mut stream = Lazy::new(|| Ok(MemoryStream::with_bytes("abc")));
        assert!(stream.can_write(), "{case}");
        stream.dispose().expect(case);
        assert!(!stream.can_write(), "{case}");
        let err = stream.read(1).expect_err(case);
        assert!(matches!(err, Error::ObjectDisposed(_)), "{case}");
        stream.dispose().expect(case);
    }
}
