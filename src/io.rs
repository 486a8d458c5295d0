//! Built-in leaf streams.
//!
//! Every leaf is a [`NativeStream`] over some [`Handle`], created through a
//! [`Decorator`] that validates the arguments and translates them into a
//! [`Mode`]. Memory streams are always available, while file and temporary
//! streams require the `io-filesystem` feature.
//!
//! [`Decorator`]: crate::Decorator

#[cfg(all(not(feature = "io-filesystem"), feature = "libc"))]
compile_error!("there is no use for libc without \"io-filesystem\" feature");

#[cfg(feature = "io-filesystem")]
mod file;
mod memory;
mod mode;
mod native;
#[cfg(feature = "io-filesystem")]
mod temp;

#[cfg(feature = "io-filesystem")]
#[cfg_attr(docsrs, doc(cfg(feature = "io-filesystem")))]
pub use file::FileStream;
pub use memory::MemoryStream;
pub use mode::{FileAccess, FileMode, Mode, ModeKind};
pub use native::{Handle, NativeStream};
#[cfg(feature = "io-filesystem")]
#[cfg_attr(docsrs, doc(cfg(feature = "io-filesystem")))]
pub use temp::{TemporaryStream, DEFAULT_MEMORY_LIMIT};
