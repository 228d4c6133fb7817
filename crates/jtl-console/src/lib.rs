//! Browser-style console output for WebAssembly guests.
//!
//! [`ConsoleCtx`] decodes the guest's text out of its linear memory and hands
//! it to a [`ConsoleSink`]. By default that is [`TracingSink`], which turns
//! every console line into a `tracing` event under the `jtl::console`
//! target.

pub mod bindings;
mod ctx;
pub mod sink;

pub use self::ctx::ConsoleCtx;
pub use self::sink::{ConsoleSink, Line, RecordingSink, TracingSink};
