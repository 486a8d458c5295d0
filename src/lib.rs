//! Composable, capability-checked byte streams.
//!
//! The core of the library is [`AppendStream`], a read-only stream that
//! presents an ordered sequence of other streams as a single contiguous one,
//! such as a header kept in memory followed by a body stored in a file. It can
//! be read from start to end across stream boundaries, and seeked to any
//! absolute position when every stream within it can seek.
//!
//! Every stream implements the [`Stream`] trait, which makes capabilities
//! explicit: a stream tells up front whether it can be read, written or
//! seeked, and operations check that before touching any data. A stream is
//! released with [`Stream::dispose`], after which every IO fails with
//! [`Error::ObjectDisposed`].
//!
//! Leaf streams over memory, files and temporary spooled storage live in the
//! [`io`] module. A [`Lazy`] stream defers opening until first use, and
//! [`StdIo`] makes any stream usable with [`std::io`].
//!
//! All IO is synchronous, and streams are not meant to be shared across
//! threads. Share a stream within a thread with `Rc<RefCell<_>>`, which is a
//! [`Stream`] itself.
//!
//! ```
//! use appendstream::{io::MemoryStream, AppendStream, SeekOrigin, Stream};
//!
//! # fn main() -> appendstream::Result<()> {
//! let mut stream: AppendStream = AppendStream::new();
//! stream.append_boxed(MemoryStream::with_bytes("abc"))?;
//! stream.append_boxed(MemoryStream::with_bytes("defgh"))?;
//! stream.append_boxed(MemoryStream::with_bytes("ij"))?;
//!
//! assert_eq!(stream.length()?, Some(10));
//! assert_eq!(stream.seek(-4, SeekOrigin::End)?, 6);
//! assert_eq!(stream.read(10)?, b"ghij");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::inline_always)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod append;
mod compat;
mod decorator;
mod error;
pub mod io;
mod lazy;
mod stream;

#[doc(inline)]
pub use append::AppendStream;
pub use compat::StdIo;
pub use decorator::Decorator;
pub use error::{Error, Result};
pub use lazy::Lazy;
#[doc(inline)]
pub use stream::{verify_copy, Capabilities, SeekOrigin, Stream, DEFAULT_COPY_BUFFER_SIZE};
