//! The contract shared by every stream.
//!
//! A [`Stream`] is a synchronous, blocking view over a logical sequence of
//! bytes. Each stream declares up front what it is capable of via capability
//! flags, and every operation checks the relevant flag before touching the
//! underlying data. Once a stream is disposed all flags turn `false` and every
//! further IO fails with [`Error::ObjectDisposed`].
//!
//! Reads return owned buffers. An empty buffer is returned only when there is
//! no more data, while a shorter buffer than requested is a valid result and
//! is not an error.

use std::{cell::RefCell, fs, io, rc::Rc, time::Duration};

use crate::{Error, Result};

/// The default size of a chunk used by [`Stream::copy_to`].
pub const DEFAULT_COPY_BUFFER_SIZE: usize = 65536;

/// The reference point for the offset of a [`Stream::seek`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SeekOrigin {
    /// The offset is an absolute position from the first byte.
    Origin,
    /// The offset is relative to the current position.
    Current,
    /// The offset is relative to the end of the data.
    End,
}

impl SeekOrigin {
    /// Converts `offset` relative to this origin into [`io::SeekFrom`].
    ///
    /// # Errors
    ///
    /// A negative offset from [`SeekOrigin::Origin`] is an
    /// [`Error::InvalidArgument`].
    #[inline]
    pub fn seek_from(self, offset: i64) -> Result<io::SeekFrom> {
        match self {
            SeekOrigin::Origin => u64::try_from(offset)
                .map(io::SeekFrom::Start)
                .map_err(|_| {
                    Error::invalid_argument("position", offset, "cannot seek before the origin")
                }),
            SeekOrigin::Current => Ok(io::SeekFrom::Current(offset)),
            SeekOrigin::End => Ok(io::SeekFrom::End(offset)),
        }
    }
}

/// Maps C `whence` values, that is `SEEK_SET`, `SEEK_CUR` and `SEEK_END`.
impl TryFrom<i32> for SeekOrigin {
    type Error = Error;

    fn try_from(value: i32) -> Result<SeekOrigin> {
        match value {
            0 => Ok(SeekOrigin::Origin),
            1 => Ok(SeekOrigin::Current),
            2 => Ok(SeekOrigin::End),
            _ => Err(Error::invalid_argument(
                "origin",
                value,
                "unrecognized seek origin",
            )),
        }
    }
}

/// A snapshot of capability flags of a stream.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// See [`Stream::can_read`].
    pub read: bool,
    /// See [`Stream::can_write`].
    pub write: bool,
    /// See [`Stream::can_seek`].
    pub seek: bool,
    /// See [`Stream::can_timeout`].
    pub timeout: bool,
}

impl Capabilities {
    /// Whether this looks like a disposed stream, i.e. it can neither read
    /// nor write.
    #[inline]
    #[must_use]
    pub fn is_closed(self) -> bool {
        !self.read && !self.write
    }
}

/// A capability-checked, synchronous byte stream.
///
/// Implementations must check the capability of the stream before carrying
/// out an operation and fail with [`Error::NotSupported`] if it is missing, or
/// with [`Error::ObjectDisposed`] after [`Stream::dispose`] was called.
pub trait Stream {
    /// Whether the stream can be read from.
    fn can_read(&self) -> bool;

    /// Whether the stream can be written to.
    fn can_write(&self) -> bool;

    /// Whether the stream supports seeking, as well as [`Stream::length`] and
    /// [`Stream::position`] queries.
    fn can_seek(&self) -> bool;

    /// Whether IO operations on the stream can time out.
    fn can_timeout(&self) -> bool;

    /// Returns all capability flags at once.
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            read: self.can_read(),
            write: self.can_write(),
            seek: self.can_seek(),
            timeout: self.can_timeout(),
        }
    }

    /// Returns the length of the stream in bytes, or `None` if it cannot be
    /// determined.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotSupported`] if the stream is not seekable.
    fn length(&mut self) -> Result<Option<u64>>;

    /// Returns the current position within the stream.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotSupported`] if the stream is not seekable.
    fn position(&mut self) -> Result<u64>;

    /// Moves the position to `position` bytes from the origin.
    ///
    /// # Errors
    ///
    /// Same as [`Stream::seek`].
    fn set_position(&mut self, position: u64) -> Result<()> {
        let offset = i64::try_from(position)
            .map_err(|_| Error::invalid_argument("position", position, "out of range"))?;
        self.seek(offset, SeekOrigin::Origin).map(|_| ())
    }

    /// Truncates or extends the stream to `length` bytes.
    ///
    /// # Errors
    ///
    /// By default, fails with [`Error::NotSupported`].
    fn set_length(&mut self, length: u64) -> Result<()> {
        let _ = length;
        Err(Error::NotSupported("stream does not support setting length"))
    }

    /// Reads up to `count` bytes. An empty buffer marks the end of data.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if `count` is zero, with
    /// [`Error::NotSupported`] if the stream is not readable, or with
    /// [`Error::ObjectDisposed`] after disposal.
    fn read(&mut self, count: usize) -> Result<Vec<u8>>;

    /// Writes `data` to the stream and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotSupported`] if the stream is not writable.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Moves the position by `offset` relative to `origin` and returns the
    /// resulting absolute position.
    ///
    /// # Errors
    ///
    /// Fails if the stream is not seekable, or if the target position is
    /// not reachable.
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64>;

    /// Flushes any pending writes to the underlying storage.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ObjectDisposed`] after disposal, or with an IO
    /// error.
    fn flush(&mut self) -> Result<()>;

    /// Releases the underlying resources. Calling it more than once is a
    /// no-op. Afterwards, all capability flags are `false`.
    ///
    /// # Errors
    ///
    /// An error is returned if releasing the resources failed. The stream is
    /// considered disposed nevertheless.
    fn dispose(&mut self) -> Result<()>;

    /// The read timeout.
    ///
    /// # Errors
    ///
    /// By default, fails with [`Error::NotSupported`].
    fn read_timeout(&self) -> Result<Duration> {
        Err(Error::NotSupported("timeouts are not implemented"))
    }

    /// Sets the read timeout.
    ///
    /// # Errors
    ///
    /// By default, fails with [`Error::NotSupported`].
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        let _ = timeout;
        Err(Error::NotSupported("timeouts are not implemented"))
    }

    /// The write timeout.
    ///
    /// # Errors
    ///
    /// By default, fails with [`Error::NotSupported`].
    fn write_timeout(&self) -> Result<Duration> {
        Err(Error::NotSupported("timeouts are not implemented"))
    }

    /// Sets the write timeout.
    ///
    /// # Errors
    ///
    /// By default, fails with [`Error::NotSupported`].
    fn set_write_timeout(&mut self, timeout: Duration) -> Result<()> {
        let _ = timeout;
        Err(Error::NotSupported("timeouts are not implemented"))
    }

    /// Copies the rest of this stream into `destination` in chunks of
    /// `buffer_size`, or [`DEFAULT_COPY_BUFFER_SIZE`] if not given, and
    /// returns the number of bytes copied.
    ///
    /// # Errors
    ///
    /// See [`verify_copy`] for argument checks, otherwise returns the first
    /// error of a read or a write.
    fn copy_to(&mut self, destination: &mut dyn Stream, buffer_size: Option<usize>) -> Result<u64> {
        let chunk = verify_copy(self.capabilities(), destination.capabilities(), buffer_size)?;
        copy_chunked(self, destination, chunk)
    }

    /// Exposes the operating system file backing this stream, if there is
    /// one. This is used to copy between files without moving the data
    /// through user space. Implementations must assume that the file is
    /// modified by the caller.
    fn native_file(&mut self) -> Option<&mut fs::File> {
        None
    }
}

/// Checks whether `source` can be copied into `destination` and returns the
/// chunk size to copy with.
///
/// # Errors
///
/// If either side is closed, the error is [`Error::ObjectDisposed`]. If the
/// source is not readable or the destination is not writable, the error is
/// [`Error::NotSupported`]. A zero `buffer_size` is an
/// [`Error::InvalidArgument`].
pub fn verify_copy(
    source: Capabilities,
    destination: Capabilities,
    buffer_size: Option<usize>,
) -> Result<usize> {
    if source.is_closed() {
        return Err(Error::ObjectDisposed("source"));
    }
    if destination.is_closed() {
        return Err(Error::ObjectDisposed("destination"));
    }
    if !source.read {
        return Err(Error::NotSupported("source does not support read"));
    }
    if !destination.write {
        return Err(Error::NotSupported("destination does not support write"));
    }
    match buffer_size {
        Some(0) => Err(Error::invalid_argument(
            "buffer_size",
            0,
            "must be greater than 0",
        )),
        Some(size) => Ok(size),
        None => Ok(DEFAULT_COPY_BUFFER_SIZE),
    }
}

/// Reads `source` in chunks of `chunk` bytes until the end, writing every
/// chunk into `destination`.
pub(crate) fn copy_chunked<S: Stream + ?Sized>(
    source: &mut S,
    destination: &mut dyn Stream,
    chunk: usize,
) -> Result<u64> {
    let mut copied = 0;
    loop {
        let data = source.read(chunk)?;
        if data.is_empty() {
            return Ok(copied);
        }
        let mut written = 0;
        while written < data.len() {
            match destination.write(&data[written..])? {
                0 => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                n => written += n,
            }
        }
        copied += data.len() as u64;
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    #[inline]
    fn can_read(&self) -> bool {
        (**self).can_read()
    }

    #[inline]
    fn can_write(&self) -> bool {
        (**self).can_write()
    }

    #[inline]
    fn can_seek(&self) -> bool {
        (**self).can_seek()
    }

    #[inline]
    fn can_timeout(&self) -> bool {
        (**self).can_timeout()
    }

    #[inline]
    fn length(&mut self) -> Result<Option<u64>> {
        (**self).length()
    }

    #[inline]
    fn position(&mut self) -> Result<u64> {
        (**self).position()
    }

    #[inline]
    fn set_position(&mut self, position: u64) -> Result<()> {
        (**self).set_position(position)
    }

    #[inline]
    fn set_length(&mut self, length: u64) -> Result<()> {
        (**self).set_length(length)
    }

    #[inline]
    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        (**self).read(count)
    }

    #[inline]
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    #[inline]
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        (**self).seek(offset, origin)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    #[inline]
    fn dispose(&mut self) -> Result<()> {
        (**self).dispose()
    }

    #[inline]
    fn read_timeout(&self) -> Result<Duration> {
        (**self).read_timeout()
    }

    #[inline]
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_read_timeout(timeout)
    }

    #[inline]
    fn write_timeout(&self) -> Result<Duration> {
        (**self).write_timeout()
    }

    #[inline]
    fn set_write_timeout(&mut self, timeout: Duration) -> Result<()> {
        (**self).set_write_timeout(timeout)
    }

    #[inline]
    fn copy_to(&mut self, destination: &mut dyn Stream, buffer_size: Option<usize>) -> Result<u64> {
        (**self).copy_to(destination, buffer_size)
    }

    #[inline]
    fn native_file(&mut self) -> Option<&mut fs::File> {
        (**self).native_file()
    }
}

/// A stream shared between several holders, e.g. a child of an
/// [`AppendStream`] that is also modified from the outside.
///
/// Every call borrows the cell for its duration, and panics if the cell is
/// already borrowed. The native file is never exposed, since it cannot
/// outlive the borrow.
///
/// [`AppendStream`]: crate::AppendStream
impl<S: Stream> Stream for Rc<RefCell<S>> {
    fn can_read(&self) -> bool {
        self.borrow().can_read()
    }

    fn can_write(&self) -> bool {
        self.borrow().can_write()
    }

    fn can_seek(&self) -> bool {
        self.borrow().can_seek()
    }

    fn can_timeout(&self) -> bool {
        self.borrow().can_timeout()
    }

    fn length(&mut self) -> Result<Option<u64>> {
        self.borrow_mut().length()
    }

    fn position(&mut self) -> Result<u64> {
        self.borrow_mut().position()
    }

    fn set_position(&mut self, position: u64) -> Result<()> {
        self.borrow_mut().set_position(position)
    }

    fn set_length(&mut self, length: u64) -> Result<()> {
        self.borrow_mut().set_length(length)
    }

    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        self.borrow_mut().read(count)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.borrow_mut().write(data)
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        self.borrow_mut().seek(offset, origin)
    }

    fn flush(&mut self) -> Result<()> {
        self.borrow_mut().flush()
    }

    fn dispose(&mut self) -> Result<()> {
        self.borrow_mut().dispose()
    }

    fn read_timeout(&self) -> Result<Duration> {
        self.borrow().read_timeout()
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.borrow_mut().set_read_timeout(timeout)
    }

    fn write_timeout(&self) -> Result<Duration> {
        self.borrow().write_timeout()
    }

    fn set_write_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.borrow_mut().set_write_timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStream;

    #[test]
    fn seek_origin_try_from() {
        assert_eq!(SeekOrigin::try_from(0).unwrap(), SeekOrigin::Origin);
        assert_eq!(SeekOrigin::try_from(1).unwrap(), SeekOrigin::Current);
        assert_eq!(SeekOrigin::try_from(2).unwrap(), SeekOrigin::End);

        let case = "unrecognized origin";
        let err = SeekOrigin::try_from(3).expect_err(case);
        assert!(
            matches!(err, Error::InvalidArgument { name: "origin", .. }),
            "{case}: {err:?}"
        );
    }

    #[test]
    fn seek_origin_seek_from() {
        let case = "negative from origin";
        let err = SeekOrigin::Origin.seek_from(-1).expect_err(case);
        assert!(
            matches!(err, Error::InvalidArgument { name: "position", .. }),
            "{case}"
        );

        let case = "negative from end";
        let from = SeekOrigin::End.seek_from(-1).expect(case);
        assert_eq!(from, io::SeekFrom::End(-1), "{case}");
    }

    #[test]
    fn verify_copy_checks() {
        let readable = Capabilities {
            read: true,
            ..Capabilities::default()
        };
        let writable = Capabilities {
            write: true,
            ..Capabilities::default()
        };

        let case = "closed source";
        let err = verify_copy(Capabilities::default(), writable, None).expect_err(case);
        assert!(matches!(err, Error::ObjectDisposed("source")), "{case}");

        let case = "closed destination";
        let err = verify_copy(readable, Capabilities::default(), None).expect_err(case);
        assert!(matches!(err, Error::ObjectDisposed("destination")), "{case}");

        let case = "unreadable source";
        let err = verify_copy(writable, writable, None).expect_err(case);
        assert!(matches!(err, Error::NotSupported(_)), "{case}");

        let case = "unwritable destination";
        let err = verify_copy(readable, readable, None).expect_err(case);
        assert!(matches!(err, Error::NotSupported(_)), "{case}");

        let case = "zero buffer size";
        let err = verify_copy(readable, writable, Some(0)).expect_err(case);
        assert!(
            matches!(err, Error::InvalidArgument { name: "buffer_size", .. }),
            "{case}"
        );

        let case = "default buffer size";
        let size = verify_copy(readable, writable, None).expect(case);
        assert_eq!(size, DEFAULT_COPY_BUFFER_SIZE, "{case}");
    }

    #[test]
    fn stream_copy_to_chunked() {
        let mut source = MemoryStream::with_bytes(b"hello, world".to_vec());
        let mut destination = MemoryStream::with_bytes(Vec::new());

        let copied = source.copy_to(&mut destination, Some(5)).unwrap();
        assert_eq!(copied, 12);
        destination.set_position(0).unwrap();
        assert_eq!(destination.read(64).unwrap(), b"hello, world");
    }

    #[test]
    fn stream_shared() {
        let shared = Rc::new(RefCell::new(MemoryStream::with_bytes(b"abc".to_vec())));
        let mut holder: Box<dyn Stream> = Box::new(Rc::clone(&shared));

        assert_eq!(holder.read(2).unwrap(), b"ab");
        shared.borrow_mut().seek(0, SeekOrigin::End).unwrap();
        shared.borrow_mut().write(b"de").unwrap();
        assert_eq!(holder.length().unwrap(), Some(5));
        assert!(holder.native_file().is_none());
    }
}
