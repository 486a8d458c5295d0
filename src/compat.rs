//! Interop with [`std::io`].

use std::io;

use crate::{SeekOrigin, Stream};

/// Adapts a [`Stream`] to [`io::Read`], [`io::Write`] and [`io::Seek`], so it
/// can be used with [`io::copy`], [`io::BufReader`] and the like.
///
/// Errors are converted into [`io::Error`] with a matching kind.
#[derive(Clone, Debug, Default)]
pub struct StdIo<S> {
    inner: S,
}

impl<S: Stream> StdIo<S> {
    /// Wraps `inner`.
    #[inline]
    #[must_use]
    pub fn new(inner: S) -> StdIo<S> {
        StdIo { inner }
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

impl<S: Stream> io::Read for StdIo<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let data = self.inner.read(buf.len())?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

impl<S: Stream> io::Write for StdIo<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        Ok(self.inner.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.inner.flush()?)
    }
}

impl<S: Stream> io::Seek for StdIo<S> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let (offset, origin) = match pos {
            io::SeekFrom::Start(position) => (
                i64::try_from(position)
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "position out of range"))?,
                SeekOrigin::Origin,
            ),
            io::SeekFrom::Current(offset) => (offset, SeekOrigin::Current),
            io::SeekFrom::End(offset) => (offset, SeekOrigin::End),
        };
        Ok(self.inner.seek(offset, origin)?)
    }
}
