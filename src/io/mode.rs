//! Open modes and their classification.
//!
//! [`Mode`] follows the conventional `fopen` mode strings, which is what the
//! capabilities of a [`NativeStream`] are derived from. [`FileMode`] and
//! [`FileAccess`] are the higher level intents used by the constructors, and
//! are mapped onto a `Mode` exhaustively.
//!
//! [`NativeStream`]: super::NativeStream

use core::{fmt, str::FromStr};
use std::fs;

use crate::{Error, Result};

/// The primary intent of a [`Mode`], the first letter of a mode string.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ModeKind {
    /// `r`: open an existing file.
    Read,
    /// `w`: create a file or truncate an existing one.
    Write,
    /// `a`: create a file if missing, every write goes to the end.
    Append,
    /// `x`: create a file, failing if it exists.
    CreateNew,
    /// `c`: create a file if missing, without truncating.
    Create,
}

impl ModeKind {
    #[inline]
    fn letter(self) -> char {
        match self {
            ModeKind::Read => 'r',
            ModeKind::Write => 'w',
            ModeKind::Append => 'a',
            ModeKind::CreateNew => 'x',
            ModeKind::Create => 'c',
        }
    }
}

/// A mode to open a handle with, parsed from strings such as `r`, `w+` or
/// `a+b`.
///
/// Binary and text flags are accepted and ignored, there is no newline
/// translation. `rw` is treated as `r+`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Mode {
    kind: ModeKind,
    /// Whether `+` is set, allowing the opposite access of the kind.
    update: bool,
}

impl Mode {
    /// `r`
    pub const READ: Mode = Mode::new(ModeKind::Read, false);
    /// `r+`
    pub const READ_WRITE: Mode = Mode::new(ModeKind::Read, true);
    /// `w`
    pub const WRITE: Mode = Mode::new(ModeKind::Write, false);
    /// `a+`
    pub const APPEND_READ: Mode = Mode::new(ModeKind::Append, true);

    /// Creates a mode of `kind`, with `update` being the `+` flag.
    #[inline]
    #[must_use]
    pub const fn new(kind: ModeKind, update: bool) -> Mode {
        Mode { kind, update }
    }

    /// The primary intent.
    #[inline]
    #[must_use]
    pub fn kind(self) -> ModeKind {
        self.kind
    }

    /// Whether the `+` flag is set.
    #[inline]
    #[must_use]
    pub fn is_update(self) -> bool {
        self.update
    }

    /// Whether a handle opened in this mode is readable.
    #[inline]
    #[must_use]
    pub fn can_read(self) -> bool {
        self.update || self.kind == ModeKind::Read
    }

    /// Whether a handle opened in this mode is writable.
    #[inline]
    #[must_use]
    pub fn can_write(self) -> bool {
        self.update || self.kind != ModeKind::Read
    }

    /// Whether writes always go to the end.
    #[inline]
    #[must_use]
    pub fn appends(self) -> bool {
        self.kind == ModeKind::Append
    }

    /// Returns the options to open a file in this mode.
    #[must_use]
    pub fn options(self) -> fs::OpenOptions {
        let mut options = fs::OpenOptions::new();
        match self.kind {
            ModeKind::Read => options.read(true).write(self.update),
            ModeKind::Write => options.write(true).create(true).truncate(true),
            ModeKind::Append => options.append(true).create(true),
            ModeKind::CreateNew => options.write(true).create_new(true),
            ModeKind::Create => options.write(true).create(true),
        };
        if self.update {
            options.read(true);
        }
        options
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Mode> {
        let invalid = || Error::invalid_argument("mode", s, "not a valid open mode");
        let mut chars = s.chars();
        let kind = match chars.next() {
            Some('r') => ModeKind::Read,
            Some('w') => ModeKind::Write,
            Some('a') => ModeKind::Append,
            Some('x') => ModeKind::CreateNew,
            Some('c') => ModeKind::Create,
            _ => return Err(invalid()),
        };
        let mut update = false;
        let mut translation = false;
        for c in chars {
            match c {
                '+' if !update => update = true,
                'w' if kind == ModeKind::Read && !update => update = true,
                'b' | 't' if !translation => translation = true,
                _ => return Err(invalid()),
            }
        }
        Ok(Mode { kind, update })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.letter())?;
        if self.update {
            write!(f, "+")?;
        }
        Ok(())
    }
}

/// How to treat an existing, or a missing file when opening it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FileMode {
    /// Open or create a file, positioning writes at the end.
    Append,
    /// Create a file, truncating an existing one.
    Create,
    /// Create a file, failing if it already exists.
    CreateNew,
    /// Open an existing file, failing if it is missing.
    Open,
    /// Open a file, creating it if missing.
    OpenOrCreate,
    /// Open an existing file and truncate it, failing if it is missing.
    Truncate,
}

/// The kind of access requested for a file.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FileAccess {
    /// Read-only access.
    Read,
    /// Write-only access.
    Write,
    /// Read and write access.
    ReadWrite,
}

impl FileMode {
    /// Maps this file mode and `access` onto an open [`Mode`].
    ///
    /// # Errors
    ///
    /// Every mode except [`FileMode::Open`] and [`FileMode::OpenOrCreate`]
    /// modifies the file, so requesting [`FileAccess::Read`] with them is an
    /// [`Error::InvalidArgument`].
    pub fn mode(self, access: FileAccess) -> Result<Mode> {
        use FileAccess::{Read, ReadWrite, Write};
        let (kind, update) = match (self, access) {
            (FileMode::Append, Write) => (ModeKind::Append, false),
            (FileMode::Append, ReadWrite) => (ModeKind::Append, true),
            (FileMode::Create | FileMode::Truncate, Write) => (ModeKind::Write, false),
            (FileMode::Create | FileMode::Truncate, ReadWrite) => (ModeKind::Write, true),
            (FileMode::CreateNew, Write) => (ModeKind::CreateNew, false),
            (FileMode::CreateNew, ReadWrite) => (ModeKind::CreateNew, true),
            (FileMode::Open | FileMode::OpenOrCreate, Read) => (ModeKind::Read, false),
            (FileMode::Open | FileMode::OpenOrCreate, Write) => (ModeKind::Create, false),
            (FileMode::Open, ReadWrite) => (ModeKind::Read, true),
            (FileMode::OpenOrCreate, ReadWrite) => (ModeKind::Create, true),
            (
                FileMode::Append | FileMode::Create | FileMode::CreateNew | FileMode::Truncate,
                Read,
            ) => {
                return Err(Error::invalid_argument(
                    "access",
                    format!("{self:?}/{access:?}"),
                    "requested file mode requires write access",
                ))
            }
        };
        Ok(Mode::new(kind, update))
    }
}
