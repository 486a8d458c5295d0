//! Errors shared by every stream in the crate.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// A result with the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while operating a [`Stream`].
///
/// Errors are always returned to the caller as they happen, nothing is
/// retried internally.
///
/// [`Stream`]: crate::Stream
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied a value outside of the accepted domain.
    #[error("invalid argument `{name}` ({value}): {reason}")]
    InvalidArgument {
        /// The name of the argument.
        name: &'static str,
        /// The offending value, rendered for display.
        value: String,
        /// What the argument must satisfy.
        reason: &'static str,
    },
    /// The operation is impossible given the current state of the stream.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    /// The stream lacks the capability required by the operation.
    #[error("not supported: {0}")]
    NotSupported(&'static str),
    /// The stream has been disposed. The enclosed value names the object.
    #[error("object {0} has been disposed")]
    ObjectDisposed(&'static str),
    /// A seek target lies before the first byte of a composite stream.
    #[error("seek before start of composite")]
    SeekBeforeStart,
    /// The file was required not to exist.
    #[error("file already exists: {}", .0.display())]
    FileExists(PathBuf),
    /// The file was required to exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    /// The operating system denied access to the file.
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    /// The underlying IO primitive failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    #[inline]
    pub(crate) fn invalid_argument(
        name: &'static str,
        value: impl fmt::Display,
        reason: &'static str,
    ) -> Error {
        Error::InvalidArgument {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> io::Error {
        let kind = match value {
            Error::Io(err) => return err,
            Error::InvalidArgument { .. } | Error::SeekBeforeStart => io::ErrorKind::InvalidInput,
            Error::NotSupported(_) => io::ErrorKind::Unsupported,
            Error::FileExists(_) => io::ErrorKind::AlreadyExists,
            Error::FileNotFound(_) => io::ErrorKind::NotFound,
            Error::PermissionDenied(_) => io::ErrorKind::PermissionDenied,
            Error::InvalidOperation(_) | Error::ObjectDisposed(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, value)
    }
}
