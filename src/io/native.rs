//! Streams over native handles.
//!
//! For more details, see [`NativeStream`] documentation.

use std::{
    fs,
    io::{self, Read, Seek, Write},
    path::Path,
};

use super::Mode;
use crate::{
    stream::{self, Stream},
    Error, Result, SeekOrigin,
};

/// Something a [`NativeStream`] can do IO on.
///
/// It is implemented for [`fs::File`], which is the primary handle, and an
/// in-memory [`io::Cursor`] over a vector, which mirrors the file semantics:
/// seeking past the end is allowed, and a write past the end fills the gap
/// with zeroes.
pub trait Handle: Read + Write + Seek {
    /// Whether the handle supports seeking. It is queried once, when a stream
    /// is created.
    #[inline]
    fn is_seekable(&self) -> bool {
        true
    }

    /// Returns the current size of the underlying data, if it is known.
    ///
    /// The default implementation seeks to the end and back.
    ///
    /// # Errors
    ///
    /// An error is returned if an IO error is encountered.
    fn size(&mut self) -> io::Result<Option<u64>> {
        let position = self.stream_position()?;
        let end = self.seek(io::SeekFrom::End(0))?;
        if end != position {
            self.seek(io::SeekFrom::Start(position))?;
        }
        Ok(Some(end))
    }

    /// Truncates or extends the underlying data to `size` bytes.
    ///
    /// # Errors
    ///
    /// An error is returned if an IO error is encountered.
    fn set_size(&mut self, size: u64) -> io::Result<()>;

    /// Returns the operating system file, if the handle is one.
    #[inline]
    fn as_file(&mut self) -> Option<&mut fs::File> {
        None
    }
}

impl Handle for fs::File {
    /// Only regular files are considered seekable, so that pipes, sockets or
    /// character devices are not.
    #[inline]
    fn is_seekable(&self) -> bool {
        self.metadata().map(|meta| meta.is_file()).unwrap_or(false)
    }

    #[inline]
    fn size(&mut self) -> io::Result<Option<u64>> {
        Ok(Some(self.metadata()?.len()))
    }

    #[inline]
    fn set_size(&mut self, size: u64) -> io::Result<()> {
        self.set_len(size)
    }

    #[inline]
    fn as_file(&mut self) -> Option<&mut fs::File> {
        Some(self)
    }
}

impl Handle for io::Cursor<Vec<u8>> {
    #[inline]
    fn size(&mut self) -> io::Result<Option<u64>> {
        Ok(Some(self.get_ref().len() as u64))
    }

    fn set_size(&mut self, size: u64) -> io::Result<()> {
        let size = usize::try_from(size)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "size too large"))?;
        self.get_mut().resize(size, 0);
        Ok(())
    }
}

/// A leaf [`Stream`] doing actual IO on a [`Handle`].
///
/// Capabilities are derived once from the [`Mode`] the handle was opened
/// with, and seekability is taken from the handle itself. They never change
/// afterwards, except for being cleared on dispose.
///
/// The length is fetched lazily and cached. The cache is dropped on every
/// write, truncation, or when the raw handle is handed out, since any of these
/// may change the size.
///
/// Reads do a single call to the handle, so they may return fewer bytes than
/// requested and never wait for more data to fill the buffer. A single read
/// returns at most [`DEFAULT_COPY_BUFFER_SIZE`] bytes.
///
/// [`DEFAULT_COPY_BUFFER_SIZE`]: crate::DEFAULT_COPY_BUFFER_SIZE
///
/// # Copying
///
/// [`Stream::copy_to`] into another stream backed by a [`fs::File`] bypasses
/// the chunked read and write loop. On Linux with the `libc` feature it is
/// done via `copy_file_range`, keeping the data in the kernel, otherwise via
/// [`io::copy`].
#[derive(Debug)]
pub struct NativeStream<H> {
    /// The handle. It is dropped on dispose, closing it.
    handle: Option<H>,
    /// The mode the handle was opened with.
    mode: Mode,
    /// Cached length of the handle.
    size: Option<u64>,
    can_read: bool,
    can_write: bool,
    can_seek: bool,
}

impl<H: Handle> NativeStream<H> {
    /// Creates a stream over `handle`, which has been opened with `mode`.
    #[must_use]
    pub fn new(handle: H, mode: Mode) -> NativeStream<H> {
        let can_seek = handle.is_seekable();
        NativeStream {
            handle: Some(handle),
            mode,
            size: None,
            can_read: mode.can_read(),
            can_write: mode.can_write(),
            can_seek,
        }
    }

    /// The mode the handle was opened with.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the handle, unless the stream has been disposed.
    #[inline]
    #[must_use]
    pub fn get_ref(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// Returns the handle, unless the stream has been disposed. The cached
    /// length is dropped.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut H> {
        self.size = None;
        self.handle.as_mut()
    }

    /// Unwraps the handle, unless the stream has been disposed.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Option<H> {
        self.handle
    }

    #[inline]
    fn handle(&mut self) -> Result<&mut H> {
        self.handle
            .as_mut()
            .ok_or(Error::ObjectDisposed("native stream"))
    }

    #[inline]
    fn require_open(&self) -> Result<()> {
        if self.handle.is_none() {
            return Err(Error::ObjectDisposed("native stream"));
        }
        Ok(())
    }

    #[inline]
    fn require_seekable(&self) -> Result<()> {
        self.require_open()?;
        if !self.can_seek {
            return Err(Error::NotSupported("stream does not support seeking"));
        }
        Ok(())
    }

    #[inline]
    fn require_readable(&self) -> Result<()> {
        self.require_open()?;
        if !self.can_read {
            return Err(Error::NotSupported("stream does not support reading"));
        }
        Ok(())
    }

    #[inline]
    fn require_writable(&self) -> Result<()> {
        self.require_open()?;
        if !self.can_write {
            return Err(Error::NotSupported("stream does not support writing"));
        }
        Ok(())
    }
}

impl NativeStream<fs::File> {
    /// Opens a file at `path` in `mode`.
    ///
    /// # Errors
    ///
    /// Returns the IO error from the underlying [`fs::File`] API or the
    /// operating system.
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> Result<NativeStream<fs::File>> {
        let path = path.as_ref();
        let file = mode.options().open(path)?;
        log::debug!("opened {} in mode {mode}", path.display());
        Ok(NativeStream::new(file, mode))
    }
}

impl<H: Handle> Stream for NativeStream<H> {
    #[inline]
    fn can_read(&self) -> bool {
        self.can_read
    }

    #[inline]
    fn can_write(&self) -> bool {
        self.can_write
    }

    #[inline]
    fn can_seek(&self) -> bool {
        self.can_seek
    }

    #[inline]
    fn can_timeout(&self) -> bool {
        false
    }

    fn length(&mut self) -> Result<Option<u64>> {
        self.require_seekable()?;
        if self.size.is_none() {
            self.size = self.handle()?.size()?;
        }
        Ok(self.size)
    }

    fn position(&mut self) -> Result<u64> {
        self.require_seekable()?;
        Ok(self.handle()?.stream_position()?)
    }

    fn set_length(&mut self, length: u64) -> Result<()> {
        self.require_seekable()?;
        self.require_writable()?;
        self.size = None;
        let handle = self.handle()?;
        handle.flush()?;
        handle.set_size(length)?;
        Ok(())
    }

    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        if count == 0 {
            return Err(Error::invalid_argument(
                "count",
                count,
                "must be greater than 0",
            ));
        }
        self.require_readable()?;
        let handle = self.handle()?;
        let mut buf = vec![0; count.min(stream::DEFAULT_COPY_BUFFER_SIZE)];
        let read = loop {
            match handle.read(&mut buf) {
                Ok(read) => break read,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        };
        buf.truncate(read);
        Ok(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.require_writable()?;
        self.size = None;
        let appends = self.mode.appends();
        let handle = self.handle()?;
        if appends {
            handle.seek(io::SeekFrom::End(0))?;
        }
        handle.write_all(data)?;
        Ok(data.len())
    }

    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        self.require_seekable()?;
        let from = origin.seek_from(offset)?;
        Ok(self.handle()?.seek(from)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.handle()?.flush()?)
    }

    fn dispose(&mut self) -> Result<()> {
        self.can_read = false;
        self.can_write = false;
        self.can_seek = false;
        self.size = None;
        if let Some(mut handle) = self.handle.take() {
            log::debug!("disposing native stream opened in mode {}", self.mode);
            handle.flush()?;
        }
        Ok(())
    }

    fn copy_to(&mut self, destination: &mut dyn Stream, buffer_size: Option<usize>) -> Result<u64> {
        let chunk =
            stream::verify_copy(self.capabilities(), destination.capabilities(), buffer_size)?;
        if let Some(target) = destination.native_file() {
            if let Some(source) = self.handle.as_mut().and_then(Handle::as_file) {
                target.flush()?;
                return Ok(copy_file(source, target)?);
            }
        }
        stream::copy_chunked(self, destination, chunk)
    }

    #[inline]
    fn native_file(&mut self) -> Option<&mut fs::File> {
        self.size = None;
        self.handle.as_mut().and_then(Handle::as_file)
    }
}

/// The maximum number of bytes for a single `copy_file_range` call.
#[cfg(all(feature = "libc", target_os = "linux"))]
const COPY_FILE_RANGE_CHUNK: usize = 1 << 30;

/// Copies the rest of `source` into `target` within the kernel, falling back
/// to [`io::copy`] if the file systems do not support it.
#[cfg(all(feature = "libc", target_os = "linux"))]
#[allow(clippy::cast_sign_loss)]
fn copy_file(source: &mut fs::File, target: &mut fs::File) -> io::Result<u64> {
    use std::{os::fd::AsRawFd, ptr};

    let mut copied = 0;
    loop {
        let ret = unsafe {
            // Null offsets make the call use and advance the file offsets.
            libc::copy_file_range(
                source.as_raw_fd(),
                ptr::null_mut(),
                target.as_raw_fd(),
                ptr::null_mut(),
                COPY_FILE_RANGE_CHUNK,
                0,
            )
        };
        match ret {
            0 => return Ok(copied),
            -1 => {
                let err = io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(libc::EINTR) => {}
                    // EBADF is also returned for a target opened for append.
                    Some(
                        libc::EXDEV | libc::ENOSYS | libc::EINVAL | libc::EOPNOTSUPP | libc::EBADF,
                    ) if copied == 0 => return io::copy(source, target),
                    _ => return Err(err),
                }
            }
            n if n > 0 => copied += n as u64,
            _ => unreachable!("copy_file_range: unexpected return {ret}"),
        }
    }
}

#[cfg(not(all(feature = "libc", target_os = "linux")))]
#[inline]
fn copy_file(source: &mut fs::File, target: &mut fs::File) -> io::Result<u64> {
    io::copy(source, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(bytes: &[u8], mode: &str) -> NativeStream<io::Cursor<Vec<u8>>> {
        NativeStream::new(io::Cursor::new(bytes.to_vec()), mode.parse().unwrap())
    }

    /// A handle over a pipe-like source that cannot seek.
    struct Unseekable(io::Cursor<Vec<u8>>);

    impl Read for Unseekable {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl Write for Unseekable {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for Unseekable {
        fn seek(&mut self, _pos: io::SeekFrom) -> io::Result<u64> {
            Err(io::Error::from(io::ErrorKind::Unsupported))
        }
    }

    impl Handle for Unseekable {
        fn is_seekable(&self) -> bool {
            false
        }

        fn set_size(&mut self, _size: u64) -> io::Result<()> {
            unimplemented!()
        }
    }

    #[test]
    fn native_capabilities() {
        let stream = cursor(b"", "r");
        assert!(stream.can_read());
        assert!(!stream.can_write());
        assert!(stream.can_seek());
        assert!(!stream.can_timeout());

        let stream = cursor(b"", "a");
        assert!(!stream.can_read());
        assert!(stream.can_write());

        let stream = NativeStream::new(Unseekable(io::Cursor::default()), Mode::READ_WRITE);
        assert!(stream.can_read());
        assert!(stream.can_write());
        assert!(!stream.can_seek());
    }

    #[test]
    fn native_read() {
        let mut stream = cursor(b"abcdef", "r");

        let case = "zero count fails";
        let err = stream.read(0).expect_err(case);
        assert!(
            matches!(err, Error::InvalidArgument { name: "count", .. }),
            "{case}"
        );

        let case = "reads requested";
        assert_eq!(stream.read(4).expect(case), b"abcd", "{case}");

        let case = "short read at the end";
        assert_eq!(stream.read(4).expect(case), b"ef", "{case}");

        let case = "empty at the end";
        assert!(stream.read(4).expect(case).is_empty(), "{case}");

        let case = "huge count is a short read";
        let mut stream = cursor(b"abc", "r");
        assert_eq!(stream.read(usize::MAX).expect(case), b"abc", "{case}");

        let case = "single read is bounded";
        let mut stream = cursor(&vec![7; stream::DEFAULT_COPY_BUFFER_SIZE + 10], "r");
        let read = stream.read(usize::MAX).expect(case);
        assert_eq!(read.len(), stream::DEFAULT_COPY_BUFFER_SIZE, "{case}");
        assert_eq!(stream.read(usize::MAX).expect(case).len(), 10, "{case}");

        let case = "write-only fails";
        let mut stream = cursor(b"abc", "w");
        let err = stream.read(1).expect_err(case);
        assert!(matches!(err, Error::NotSupported(_)), "{case}");
    }

    #[test]
    fn native_write() {
        let case = "read-only fails";
        let mut stream = cursor(b"abc", "r");
        let err = stream.write(b"d").expect_err(case);
        assert!(matches!(err, Error::NotSupported(_)), "{case}");

        let case = "length cache is invalidated";
        let mut stream = cursor(b"abc", "r+");
        assert_eq!(stream.length().unwrap(), Some(3), "{case}");
        stream.seek(0, SeekOrigin::End).unwrap();
        assert_eq!(stream.write(b"de").expect(case), 2, "{case}");
        assert_eq!(stream.length().unwrap(), Some(5), "{case}");

        let case = "append mode writes at the end";
        let mut stream = cursor(b"abc", "a+");
        stream.seek(0, SeekOrigin::Origin).unwrap();
        stream.write(b"xy").expect(case);
        stream.seek(0, SeekOrigin::Origin).unwrap();
        assert_eq!(stream.read(16).unwrap(), b"abcxy", "{case}");
    }

    #[test]
    fn native_seek() {
        let mut stream = cursor(b"0123456789", "r");

        let case = "from origin";
        assert_eq!(stream.seek(4, SeekOrigin::Origin).expect(case), 4, "{case}");
        assert_eq!(stream.position().unwrap(), 4, "{case}");

        let case = "from current";
        assert_eq!(stream.seek(-3, SeekOrigin::Current).expect(case), 1, "{case}");

        let case = "from end";
        assert_eq!(stream.seek(-2, SeekOrigin::End).expect(case), 8, "{case}");
        assert_eq!(stream.read(10).unwrap(), b"89", "{case}");

        let case = "past the end";
        assert_eq!(stream.seek(5, SeekOrigin::End).expect(case), 15, "{case}");
        assert_eq!(stream.position().unwrap(), 15, "{case}");
        assert!(stream.read(1).unwrap().is_empty(), "{case}");
        assert_eq!(stream.length().unwrap(), Some(10), "{case}");

        let case = "negative from origin";
        let err = stream.seek(-1, SeekOrigin::Origin).expect_err(case);
        assert!(
            matches!(err, Error::InvalidArgument { name: "position", .. }),
            "{case}"
        );

        let case = "before start";
        let err = stream.seek(-11, SeekOrigin::End).expect_err(case);
        assert!(matches!(err, Error::Io(_)), "{case}");
    }

    #[test]
    fn native_unseekable() {
        let mut stream = NativeStream::new(
            Unseekable(io::Cursor::new(b"abc".to_vec())),
            Mode::READ,
        );
        assert!(matches!(stream.length(), Err(Error::NotSupported(_))));
        assert!(matches!(stream.position(), Err(Error::NotSupported(_))));
        assert!(matches!(
            stream.seek(0, SeekOrigin::Origin),
            Err(Error::NotSupported(_))
        ));
        assert_eq!(stream.read(8).unwrap(), b"abc");
    }

    #[test]
    fn native_set_length() {
        let mut stream = cursor(b"abcdef", "r+");
        assert_eq!(stream.length().unwrap(), Some(6));
        stream.set_length(2).unwrap();
        assert_eq!(stream.length().unwrap(), Some(2));
        stream.set_length(4).unwrap();
        assert_eq!(stream.get_ref().unwrap().get_ref(), b"ab\0\0");

        let case = "read-only fails";
        let mut stream = cursor(b"abc", "r");
        let err = stream.set_length(1).expect_err(case);
        assert!(matches!(err, Error::NotSupported(_)), "{case}");
    }

    #[test]
    fn native_dispose() {
        let mut stream = cursor(b"abc", "r+");
        stream.dispose().unwrap();

        let case = "flags are cleared";
        assert_eq!(stream.capabilities(), crate::Capabilities::default(), "{case}");

        let case = "io fails as disposed";
        assert!(matches!(stream.read(1), Err(Error::ObjectDisposed(_))), "{case}");
        assert!(matches!(stream.write(b"a"), Err(Error::ObjectDisposed(_))), "{case}");
        assert!(matches!(stream.length(), Err(Error::ObjectDisposed(_))), "{case}");
        assert!(
            matches!(stream.seek(0, SeekOrigin::Origin), Err(Error::ObjectDisposed(_))),
            "{case}"
        );
        assert!(matches!(stream.flush(), Err(Error::ObjectDisposed(_))), "{case}");

        let case = "second dispose is a no-op";
        stream.dispose().expect(case);
        assert!(stream.into_inner().is_none(), "{case}");
    }

    #[test]
    fn native_copy_to() {
        let mut source = cursor(b"0123456789", "r");
        let mut destination = cursor(b"", "w+");
        source.seek(3, SeekOrigin::Origin).unwrap();

        let copied = source.copy_to(&mut destination, Some(4)).unwrap();
        assert_eq!(copied, 7);
        assert_eq!(destination.get_ref().unwrap().get_ref(), b"3456789");

        let case = "into a read-only stream";
        let mut readonly = cursor(b"", "r");
        let err = source.copy_to(&mut readonly, None).expect_err(case);
        assert!(matches!(err, Error::NotSupported(_)), "{case}");
    }
}
