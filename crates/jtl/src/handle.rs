//! Integer handles standing in for host resources.

use crate::{BridgeError, Result};
use std::fmt;

/// An opaque index into a [`HandleTable`].
///
/// Handles are only meaningful to the table that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    /// Creates a handle from its raw index.
    pub const fn from_u32(index: u32) -> Self {
        Handle(index)
    }

    /// Returns the raw index of this handle.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the value handed to the guest, which sees handles as `i32`.
    pub const fn to_guest(self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i32> for Handle {
    type Error = BridgeError;

    fn try_from(raw: i32) -> Result<Self> {
        u32::try_from(raw)
            .map(Handle)
            .map_err(|_| BridgeError::InvalidHandle(raw.into()))
    }
}

impl From<Handle> for u32 {
    fn from(handle: Handle) -> u32 {
        handle.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An append-only table of host resources indexed by [`Handle`].
///
/// Entries are never replaced or removed: a resource lives as long as the
/// table, which lives as long as the guest instance that uses it. A caller
/// that needs to "replace" a resource creates a new handle; the old one keeps
/// resolving to the superseded resource.
pub struct HandleTable<R> {
    entries: Vec<R>,
}

impl<R> Default for HandleTable<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R> HandleTable<R> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `resource` at the next index and returns its handle.
    pub fn create(&mut self, resource: R) -> Handle {
        // Guests see handles as `i32`, far below the point where the length
        // stops fitting in a `u32`.
        let handle = Handle(self.entries.len() as u32);
        self.entries.push(resource);
        handle
    }

    /// Returns the resource bound to `handle`.
    pub fn resolve(&self, handle: Handle) -> Result<&R> {
        self.entries
            .get(handle.0 as usize)
            .ok_or(BridgeError::InvalidHandle(handle.0.into()))
    }

    /// Like [`HandleTable::resolve`], starting from the guest's `i32`.
    pub fn resolve_guest(&self, raw: i32) -> Result<&R> {
        self.resolve(Handle::try_from(raw)?)
    }

    /// Number of handles issued so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no handle has been issued yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over every entry in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &R)> {
        (0..).map(Handle).zip(self.entries.iter())
    }
}

impl<R: fmt::Debug> fmt::Debug for HandleTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn handles_are_sequential() {
        let mut table = HandleTable::new();
        assert!(table.is_empty());
        let a = table.create("a");
        let b = table.create("b");
        assert_eq!(a, Handle::from_u32(0));
        assert_eq!(b, Handle::from_u32(1));
        assert_eq!(table.resolve(a), Ok(&"a"));
        assert_eq!(table.resolve(b), Ok(&"b"));
        assert_eq!(
            table.resolve(Handle::from_u32(2)),
            Err(BridgeError::InvalidHandle(2))
        );
    }

    #[test]
    fn resolve_in_any_order() {
        let mut table = HandleTable::new();
        let handles = (0..32).map(|i| (table.create(i * 10), i * 10)).collect::<Vec<_>>();
        for (handle, value) in handles.iter().rev() {
            assert_eq!(table.resolve(*handle), Ok(value));
        }
        for (handle, value) in handles.iter().step_by(3) {
            assert_eq!(table.resolve(*handle), Ok(value));
        }
        assert_eq!(table.len(), 32);
    }

    #[test]
    fn invalid_at_every_length() {
        let mut table = HandleTable::new();
        for len in 0..8u32 {
            assert_eq!(
                table.resolve(Handle::from_u32(len)),
                Err(BridgeError::InvalidHandle(len.into()))
            );
            assert_eq!(table.resolve_guest(-1), Err(BridgeError::InvalidHandle(-1)));
            assert!(table.resolve_guest(i32::MIN).is_err());
            table.create(len);
        }
    }

    #[test]
    fn negative_guest_handles() {
        assert_eq!(Handle::try_from(-5), Err(BridgeError::InvalidHandle(-5)));
        assert_eq!(Handle::try_from(7), Ok(Handle::from_u32(7)));
        assert_eq!(Handle::from_u32(7).to_guest(), 7);
    }

    #[test]
    fn iter_matches_create() {
        let mut table = HandleTable::new();
        let created = ["vs", "fs", "program"].map(|r| table.create(r));
        let listed = table.iter().collect::<Vec<_>>();
        assert_eq!(listed.len(), 3);
        for ((handle, resource), expected) in listed.into_iter().zip(created) {
            assert_eq!(handle, expected);
            assert_eq!(table.resolve(handle), Ok(resource));
        }
    }

    #[test]
    fn debug_lists_entries() {
        let mut table = HandleTable::new();
        table.create("shader");
        assert_eq!(format!("{table:?}"), r#"{Handle(0): "shader"}"#);
    }
}
