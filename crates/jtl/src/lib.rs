//! Core of the JTL translation layer.
//!
//! A WebAssembly guest only has integers and byte offsets into its own linear
//! memory, while object-based host APIs (a WebGL-like graphics context, a
//! console) deal in opaque references and UTF-8 text. Every call that crosses
//! the boundary has to be translated, and this crate holds the pieces that do
//! it:
//!
//! * [`HandleTable`] maps integer [`Handle`]s to host resources. Handles are
//!   issued sequentially and never reused.
//! * [`LocationCache`] deduplicates named sub-resource lookups so the host is
//!   queried at most once per `(owner, name)` pair.
//! * [`decode_utf8`] and [`copy_numeric`] copy data out of the guest's linear
//!   memory, always producing owned values.
//! * [`Lifecycle`] tracks whether the guest's memory is known yet. Bindings
//!   must be handed to the linker before instantiation, but the memory only
//!   exists afterwards; any marshaling call made in between fails with
//!   [`BridgeError::NotReady`].
//!
//! Capability surfaces such as `jtl-webgl` and `jtl-console` build their
//! contexts out of these parts and register them with a [`wasmtime::Linker`].

#![deny(missing_docs)]

mod context;
mod error;
mod handle;
mod lifecycle;
mod location;
mod marshal;

pub use self::context::{HostContext, guest_memory};
pub use self::error::{BridgeError, Result};
pub use self::handle::{Handle, HandleTable};
pub use self::lifecycle::{Lifecycle, Phase};
pub use self::location::LocationCache;
pub use self::marshal::{Element, byte_range, copy_numeric, decode_optional, decode_utf8};
