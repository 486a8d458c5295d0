//! Streams over files in a generic filesystem.
//!
//! All IO is synchronous. For more details, see [`FileStream`] documentation.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::{FileAccess, FileMode, Mode, ModeKind, NativeStream};
use crate::{Decorator, Error, Result};

/// A stream over a file opened at a path.
///
/// The file is opened according to the [`FileMode`] intent and the
/// [`FileAccess`] requested, which are checked against the file system before
/// opening:
///
/// -   [`FileMode::CreateNew`] fails with [`Error::FileExists`] if the file
///     exists.
/// -   [`FileMode::Open`] and [`FileMode::Truncate`] fail with
///     [`Error::FileNotFound`] if the file is missing.
/// -   [`FileMode::OpenOrCreate`] with [`FileAccess::Read`] creates an empty
///     file first, as a read-only handle cannot create one.
///
/// The checks are racy by nature, so the errors of the operating system are
/// mapped the same way.
pub type FileStream = Decorator<NativeStream<fs::File>>;

impl Decorator<NativeStream<fs::File>> {
    /// Opens a file at `path`.
    ///
    /// # Errors
    ///
    /// An empty `path`, or a `mode` that requires write access with
    /// [`FileAccess::Read`], is an [`Error::InvalidArgument`]. Failures due to
    /// existence or permissions of the file are [`Error::FileExists`],
    /// [`Error::FileNotFound`] and [`Error::PermissionDenied`]. In other cases
    /// returns the IO error from the underlying [`fs::File`] API or the
    /// operating system.
    pub fn open<P: AsRef<Path>>(path: P, mode: FileMode, access: FileAccess) -> Result<FileStream> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument(
                "path",
                "\"\"",
                "path must not be empty",
            ));
        }
        let open_mode = mode.mode(access)?;

        match mode {
            FileMode::CreateNew if path.exists() => {
                return Err(Error::FileExists(path.to_path_buf()));
            }
            FileMode::Open | FileMode::Truncate if !path.exists() => {
                return Err(Error::FileNotFound(path.to_path_buf()));
            }
            FileMode::OpenOrCreate if open_mode.kind() == ModeKind::Read && !path.exists() => {
                log::debug!("creating {} before opening read-only", path.display());
                Mode::new(ModeKind::Create, false)
                    .options()
                    .open(path)
                    .map_err(|err| map_open_error(err, path))?;
            }
            _ => {}
        }

        let file = open_mode
            .options()
            .open(path)
            .map_err(|err| map_open_error(err, path))?;
        log::debug!(
            "opened {} as {mode:?}/{access:?} in mode {open_mode}",
            path.display()
        );
        Ok(Decorator::new(NativeStream::new(file, open_mode)))
    }
}

/// Maps the errors of opening a file onto the specific kinds.
fn map_open_error(err: io::Error, path: &Path) -> Error {
    let path = PathBuf::from(path);
    match err.kind() {
        io::ErrorKind::AlreadyExists => Error::FileExists(path),
        io::ErrorKind::NotFound => Error::FileNotFound(path),
        io::ErrorKind::PermissionDenied => Error::PermissionDenied(path),
        _ => Error::Io(err),
    }
}
