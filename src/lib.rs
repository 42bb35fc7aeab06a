//! A broadcasting fan-out registry
//!
//! This crate provides a [`Broadcaster`] that hands out any number of
//! outputs and delivers every value sent to it to all of them,
//! unlike a mpmc channel where each value goes to a single receiver.
//!
//! The two types used for the fan-out are:
//!
//! * [`Broadcaster`]
//! * [`Receiver`]
//!
//! Misusing the broadcaster's lifecycle (sending with no outputs, or adding,
//! sending, counting or closing after it was closed) is a bug in the caller
//! and panics with a [`ContractViolation`]. The `try_*` methods return the
//! violation instead.
//!
//! Around the broadcaster sit a few collaborators for programs built on it:
//! [`Options`] (diagnostic sink, termination handler, output settings),
//! [`ShutdownHooks`] and the file recorders [`record_string`],
//! [`record_csv`] and [`record_bytes`], plus the text helpers
//! [`prettify_json`], [`concatenate_errors`] and [`user_host_info`].
//!
//! [`Broadcaster`]: struct.Broadcaster.html
//! [`Receiver`]: struct.Receiver.html
//! [`ContractViolation`]: enum.ContractViolation.html
//! [`Options`]: struct.Options.html
//! [`ShutdownHooks`]: struct.ShutdownHooks.html
//! [`record_string`]: fn.record_string.html
//! [`record_csv`]: fn.record_csv.html
//! [`record_bytes`]: fn.record_bytes.html
//! [`prettify_json`]: fn.prettify_json.html
//! [`concatenate_errors`]: fn.concatenate_errors.html
//! [`user_host_info`]: fn.user_host_info.html
//!
//! # Examples
//! Simple use:
//! ```rust
//! use multi_chan::Broadcaster;
//!
//! # fn main() {
//! let tx = Broadcaster::with_output_buffer(0, 1);
//! let mut rx = tx.add_chan();
//! tx.send(1);
//! assert_eq!(rx.next(), Some(1));
//! # }
//! ```
//! Threaded use:
//!```rust
//! use multi_chan::Broadcaster;
//! use std::thread;
//!
//! # fn main() {
//! let tx = Broadcaster::new(0);
//! let readers: Vec<_> = (0..3)
//!     .map(|_| {
//!         let rx = tx.add_chan();
//!         thread::spawn(move || rx.collect::<Vec<_>>())
//!     })
//!     .collect();
//! tx.send_all(0..10);
//! tx.close();
//! for reader in readers {
//!     assert_eq!(reader.join().unwrap(), (0..10).collect::<Vec<_>>());
//! }
//! # }
//! ```

mod error;
mod hooks;
mod options;
mod record;
mod sync;
mod text;

pub use error::*;
pub use hooks::*;
pub use options::*;
pub use record::*;
pub use sync::*;
pub use text::*;
