//! Temporary streams, kept in memory up to a limit.

use std::io;

use tempfile::SpooledTempFile;

use super::{FileMode, Handle, Mode, NativeStream};
use crate::{Decorator, Error, Result};

/// The memory limit of a [`TemporaryStream`] if none is given, 2 MiB.
pub const DEFAULT_MEMORY_LIMIT: usize = 2 << 20;

impl Handle for SpooledTempFile {
    #[inline]
    fn set_size(&mut self, size: u64) -> io::Result<()> {
        self.set_len(size)
    }
}

/// A read-write stream that keeps data in memory until it grows past a limit,
/// after which it is moved into an anonymous temporary file. The file is
/// removed by the operating system once the stream is disposed or dropped.
pub type TemporaryStream = Decorator<NativeStream<SpooledTempFile>>;

impl Decorator<NativeStream<SpooledTempFile>> {
    /// Creates an empty temporary stream, holding up to `memory_limit` bytes
    /// in memory, or [`DEFAULT_MEMORY_LIMIT`] if not given.
    ///
    /// Only [`FileMode::Open`] and [`FileMode::Append`] are supported, same as
    /// for a [`MemoryStream`].
    ///
    /// # Errors
    ///
    /// Other modes, or a zero `memory_limit`, are an
    /// [`Error::InvalidArgument`].
    ///
    /// [`MemoryStream`]: super::MemoryStream
    pub fn open(mode: FileMode, memory_limit: Option<usize>) -> Result<TemporaryStream> {
        let mode = match mode {
            FileMode::Open => Mode::READ_WRITE,
            FileMode::Append => Mode::APPEND_READ,
            _ => {
                return Err(Error::invalid_argument(
                    "mode",
                    format!("{mode:?}"),
                    "temporary stream supports only open and append",
                ))
            }
        };
        let memory_limit = match memory_limit {
            Some(0) => {
                return Err(Error::invalid_argument(
                    "memory_limit",
                    0,
                    "must be greater than 0",
                ))
            }
            Some(limit) => limit,
            None => DEFAULT_MEMORY_LIMIT,
        };
        Ok(Decorator::new(NativeStream::new(
            SpooledTempFile::new(memory_limit),
            mode,
        )))
    }

    /// Whether the data has been moved from memory into a file.
    #[inline]
    #[must_use]
    pub fn is_spilled(&self) -> bool {
        self.get_ref().get_ref().is_some_and(SpooledTempFile::is_rolled)
    }
}
