use crate::Handle;
use std::str::Utf8Error;
use thiserror::Error;

/// Failures raised while translating a call across the guest/host boundary.
///
/// None of these are recovered from internally. Inside a linker binding they
/// turn into a trap, which aborts the guest call that triggered them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The handle is negative or was never issued by the table.
    #[error("invalid handle {0}")]
    InvalidHandle(i64),
    /// The handle is valid but names a different kind of resource.
    #[error("handle {handle} refers to a {found}, expected a {expected}")]
    WrongKind {
        /// The handle passed by the guest.
        handle: Handle,
        /// The kind of resource the call needed.
        expected: &'static str,
        /// The kind of resource actually bound to `handle`.
        found: &'static str,
    },
    /// The requested range does not fit inside the current memory region.
    #[error("out of bounds: {len} bytes at offset {offset} exceed a {size}-byte memory")]
    OutOfBounds {
        /// Start of the requested range.
        offset: u64,
        /// Length of the requested range, in bytes.
        len: u64,
        /// Size of the memory region at the time of the call.
        size: usize,
    },
    /// Guest text was not valid UTF-8.
    #[error("guest string is not valid UTF-8: {0}")]
    InvalidEncoding(#[from] Utf8Error),
    /// A call needed the guest's memory before it was activated.
    #[error("guest memory is not available; the translation layer has not been activated")]
    NotReady,
    /// `activate` was called on an already active translation layer.
    #[error("translation layer is already active")]
    AlreadyActive,
    /// The host API reported a failure, with its diagnostic text.
    #[error("host rejected the call: {0}")]
    HostRejected(String),
}

/// A `Result` specialized to [`BridgeError`].
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
