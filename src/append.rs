//! A stream concatenating other streams.
//!
//! [`AppendStream`] presents an ordered sequence of readable streams as one
//! contiguous stream. It is read-only, and seekable as long as every stream
//! appended to it is seekable.
//!
//! # Positions
//!
//! Each appended stream occupies a half-open range of absolute positions,
//! starting where the previous one ends. One of the streams is *active*, and
//! the absolute position is the sum of the full lengths of the streams before
//! it plus the position of the active stream itself.
//!
//! The absolute position is never cached. The streams may be shared with
//! other holders (see the [`Stream`] implementation for `Rc<RefCell<_>>`),
//! which are free to write, truncate or reposition them between calls, so
//! every query walks the streams and asks them instead.
//!
//! Let's say there are three streams of 3, 5 and 2 bytes, and the active
//! stream is the second one at position 3:
//!
//! ```text
//! Streams:   |abc|defgh|ij|
//! Ranges:     0   3     8  10
//! Position:          ^ = 3 + 3 = 6
//! ```
//!
//! Seeking past the end lands on the last stream with an offset past its own
//! end, so it is up to that stream whether it allows it. Seeking before the
//! start fails with [`Error::SeekBeforeStart`], and leaves the active stream
//! and every position untouched.

use core::fmt;

use crate::{Error, Result, SeekOrigin, Stream, DEFAULT_COPY_BUFFER_SIZE};

/// A read-only stream over a sequence of streams, one after another.
///
/// Streams can only be appended, never removed or reordered. A stream that
/// cannot be read is rejected when appended. Once a stream that cannot seek is
/// appended, the whole stream cannot seek anymore.
///
/// Disposing an append stream disposes every stream within it.
///
/// The type parameter defaults to boxed streams, which allows mixing streams
/// of different types, including other append streams.
#[derive()] // manual: Debug
pub struct AppendStream<S = Box<dyn Stream>> {
    /// The streams, in order.
    streams: Vec<S>,
    /// The index of the active stream. Always within `streams`, unless
    /// `streams` is empty.
    current: usize,
    /// Cleared on dispose. Every appended stream is readable.
    can_read: bool,
    /// Whether every appended stream can seek. Cleared on dispose.
    can_seek: bool,
    disposed: bool,
}

impl<S: Stream> AppendStream<S> {
    /// Creates an empty stream.
    #[must_use]
    pub fn new() -> AppendStream<S> {
        AppendStream {
            streams: Vec::new(),
            current: 0,
            can_read: true,
            can_seek: true,
            disposed: false,
        }
    }

    /// Creates a stream from `streams`, appending them in order.
    ///
    /// # Errors
    ///
    /// Same as [`AppendStream::append_stream`]. The streams that have been
    /// taken from the iterator are dropped.
    pub fn from_streams<I: IntoIterator<Item = S>>(streams: I) -> Result<AppendStream<S>> {
        let mut this = AppendStream::new();
        for stream in streams {
            this.append_stream(stream)?;
        }
        Ok(this)
    }

    /// Appends `stream` to the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if `stream` cannot be read, in which
    /// case it is not appended, or [`Error::ObjectDisposed`] if this stream
    /// has been disposed.
    pub fn append_stream(&mut self, stream: S) -> Result<()> {
        self.require_open()?;
        if !stream.can_read() {
            return Err(Error::NotSupported("stream does not support read"));
        }
        if self.can_seek && !stream.can_seek() {
            log::debug!("stream {} cannot seek, append stream is no longer seekable", self.streams.len());
            self.can_seek = false;
        }
        self.streams.push(stream);
        log::debug!("appended stream {}", self.streams.len() - 1);
        Ok(())
    }

    /// The number of streams.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether there are no streams.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// The index of the active stream.
    #[inline]
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Returns the stream at `index`.
    #[inline]
    #[must_use]
    pub fn stream(&self, index: usize) -> Option<&S> {
        self.streams.get(index)
    }

    /// Returns the stream at `index`. Modifying it is fine, as positions are
    /// always recomputed.
    #[inline]
    pub fn stream_mut(&mut self, index: usize) -> Option<&mut S> {
        self.streams.get_mut(index)
    }

    /// Unwraps the streams.
    #[inline]
    #[must_use]
    pub fn into_streams(self) -> Vec<S> {
        self.streams
    }

    #[inline]
    fn require_open(&self) -> Result<()> {
        if self.disposed {
            return Err(Error::ObjectDisposed("append stream"));
        }
        Ok(())
    }

    /// Returns the absolute position, assuming there is at least one stream.
    fn absolute_position(&mut self) -> Result<i64> {
        let start = self.start_of(self.current)?;
        add(start, signed(self.streams[self.current].position()?)?)
    }

    /// Returns the absolute position where the stream at `index` starts.
    fn start_of(&mut self, index: usize) -> Result<i64> {
        let mut start = 0;
        for stream in &mut self.streams[..index] {
            start = add(start, child_length(stream)?)?;
        }
        Ok(start)
    }

    /// Makes the stream at `index` active after seeking it by `offset` from
    /// `origin`, and returns the resulting absolute position. Nothing is
    /// changed if the seek fails, or if its result is out of range.
    fn activate(&mut self, index: usize, offset: i64, origin: SeekOrigin) -> Result<u64> {
        let start = self.start_of(index)?;
        let stream = &mut self.streams[index];
        let previous = stream.position()?;
        let position = stream.seek(offset, origin)?;
        match signed(position).and_then(|position| add(start, position)) {
            Ok(absolute) => {
                self.current = index;
                unsigned(absolute)
            }
            Err(err) => {
                stream.set_position(previous)?;
                Err(err)
            }
        }
    }

    fn seek_from_origin(&mut self, position: i64) -> Result<u64> {
        if position < 0 {
            return Err(Error::invalid_argument(
                "position",
                position,
                "cannot seek before the origin",
            ));
        }
        if self.streams.is_empty() {
            return unsigned(position);
        }
        let last = self.streams.len() - 1;
        let mut start = 0;
        for index in 0..last {
            let end = add(start, child_length(&mut self.streams[index])?)?;
            if position < end {
                return self.activate(index, position - start, SeekOrigin::Origin);
            }
            start = end;
        }
        self.activate(last, position - start, SeekOrigin::Origin)
    }

    fn seek_from_current(&mut self, offset: i64) -> Result<u64> {
        if self.streams.is_empty() {
            return Ok(0);
        }
        let absolute = self.absolute_position()?;
        if offset == 0 {
            return unsigned(absolute);
        }
        let target = absolute.checked_add(offset).ok_or_else(|| {
            Error::invalid_argument("offset", offset, "seek target overflows i64")
        })?;
        let active_start = absolute - signed(self.streams[self.current].position()?)?;

        if offset > 0 {
            let last = self.streams.len() - 1;
            let mut start = active_start;
            for index in self.current..last {
                let end = add(start, child_length(&mut self.streams[index])?)?;
                if target < end {
                    return self.activate(index, target - start, SeekOrigin::Origin);
                }
                start = end;
            }
            return self.activate(last, target - start, SeekOrigin::Origin);
        }

        let mut end = add(active_start, child_length(&mut self.streams[self.current])?)?;
        for index in (0..=self.current).rev() {
            let start = end
                .checked_sub(child_length(&mut self.streams[index])?)
                .ok_or(OVERFLOW)?;
            if target >= start {
                return self.activate(index, target - end, SeekOrigin::End);
            }
            end = start;
        }
        Err(Error::SeekBeforeStart)
    }

    fn seek_from_end(&mut self, offset: i64) -> Result<u64> {
        if self.streams.is_empty() {
            return Ok(0);
        }
        let last = self.streams.len() - 1;
        if offset >= 0 {
            // The end of the last stream is the end of this stream.
            return self.activate(last, offset, SeekOrigin::End);
        }
        let mut end: i64 = 0;
        for index in (0..=last).rev() {
            let start = end
                .checked_sub(child_length(&mut self.streams[index])?)
                .ok_or(OVERFLOW)?;
            if offset >= start {
                return self.activate(index, offset - end, SeekOrigin::End);
            }
            end = start;
        }
        Err(Error::SeekBeforeStart)
    }
}

impl AppendStream<Box<dyn Stream>> {
    /// Boxes `stream` and appends it to the end.
    ///
    /// # Errors
    ///
    /// Same as [`AppendStream::append_stream`].
    #[inline]
    pub fn append_boxed<T: Stream + 'static>(&mut self, stream: T) -> Result<()> {
        self.append_stream(Box::new(stream))
    }
}

impl<S: Stream> Default for AppendStream<S> {
    #[inline]
    fn default() -> AppendStream<S> {
        AppendStream::new()
    }
}

impl<S> fmt::Debug for AppendStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppendStream")
            .field("streams", &self.streams.len())
            .field("current", &self.current)
            .field("can_read", &self.can_read)
            .field("can_seek", &self.can_seek)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl<S: Stream> Stream for AppendStream<S> {
    #[inline]
    fn can_read(&self) -> bool {
        self.can_read
    }

    #[inline]
    fn can_write(&self) -> bool {
        false
    }

    #[inline]
    fn can_seek(&self) -> bool {
        self.can_seek
    }

    #[inline]
    fn can_timeout(&self) -> bool {
        false
    }

    /// The sum of lengths of all streams, or `None` as soon as one of them
    /// cannot tell its length.
    fn length(&mut self) -> Result<Option<u64>> {
        self.require_open()?;
        if !self.can_seek {
            return Err(Error::NotSupported("stream does not support seeking"));
        }
        let mut length = 0;
        for stream in &mut self.streams {
            match stream.length()? {
                Some(len) => length += len,
                None => return Ok(None),
            }
        }
        Ok(Some(length))
    }

    fn position(&mut self) -> Result<u64> {
        self.require_open()?;
        if !self.can_seek {
            return Err(Error::NotSupported("stream does not support seeking"));
        }
        if self.streams.is_empty() {
            return Ok(0);
        }
        unsigned(self.absolute_position()?)
    }

    /// Reads from the active stream, moving on to the next streams until
    /// `count` bytes are read or there are no streams left. A stream that is
    /// moved on to is rewound to its start first, if seekable.
    fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        if count == 0 {
            return Err(Error::invalid_argument(
                "count",
                count,
                "must be greater than 0",
            ));
        }
        self.require_open()?;
        if self.streams.is_empty() {
            return Ok(Vec::new());
        }
        let mut buf = Vec::with_capacity(count.min(DEFAULT_COPY_BUFFER_SIZE));
        while buf.len() < count {
            let read = self.streams[self.current].read(count - buf.len())?;
            if read.is_empty() {
                if self.current + 1 == self.streams.len() {
                    break;
                }
                let next = self.current + 1;
                if self.can_seek {
                    self.streams[next].seek(0, SeekOrigin::Origin)?;
                }
                self.current = next;
                log::trace!("reading moves on to stream {next}");
                continue;
            }
            buf.extend_from_slice(&read);
        }
        Ok(buf)
    }

    fn write(&mut self, _data: &[u8]) -> Result<usize> {
        self.require_open()?;
        Err(Error::NotSupported("append stream does not support write"))
    }

    /// Seeks to the position relative to `origin`, making the stream that
    /// holds it active.
    ///
    /// # Errors
    ///
    /// If the stream cannot seek, the error is [`Error::InvalidOperation`].
    /// A negative position from [`SeekOrigin::Origin`] is an
    /// [`Error::InvalidArgument`], and a position before the start from other
    /// origins is [`Error::SeekBeforeStart`].
    fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        self.require_open()?;
        if !self.can_seek {
            return Err(Error::InvalidOperation("stream does not support seek"));
        }
        let position = match origin {
            SeekOrigin::Origin => self.seek_from_origin(offset),
            SeekOrigin::Current => self.seek_from_current(offset),
            SeekOrigin::End => self.seek_from_end(offset),
        }?;
        log::debug!(
            "seek {offset} from {origin:?} is at {position} in stream {}",
            self.current
        );
        Ok(position)
    }

    fn flush(&mut self) -> Result<()> {
        self.require_open()
    }

    /// Disposes every stream, even if some of them fail, and returns the
    /// first error.
    fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        self.can_read = false;
        self.can_seek = false;
        let mut failed = None;
        for (index, stream) in self.streams.iter_mut().enumerate() {
            if let Err(err) = stream.dispose() {
                log::warn!("failed to dispose stream {index}: {err}");
                failed.get_or_insert(err);
            }
        }
        log::debug!("disposed append stream of {} streams", self.streams.len());
        failed.map_or(Ok(()), Err)
    }
}

/// Returns the length of a stream within an append stream, which must be
/// known for positions to be computed.
#[inline]
fn child_length<S: Stream>(stream: &mut S) -> Result<i64> {
    match stream.length()? {
        Some(length) => signed(length),
        None => Err(Error::InvalidOperation(
            "length of an appended stream cannot be determined",
        )),
    }
}

const OVERFLOW: Error = Error::InvalidOperation("stream offset overflows i64");

#[inline]
fn signed(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| OVERFLOW)
}

#[inline]
fn add(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b).ok_or(OVERFLOW)
}

#[inline]
fn unsigned(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::SeekBeforeStart)
}
