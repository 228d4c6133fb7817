//! Deduplication of named sub-resource lookups.

use crate::Handle;
use std::collections::HashMap;

/// Caches the handle produced by the first lookup of each `(owner, name)`.
///
/// Some host APIs hand out a fresh, non-interchangeable object every time a
/// named sub-resource (such as a uniform slot within a program) is looked
/// up, so the first result has to be kept and reused rather than re-queried.
/// Results that the host reports as "not found" are cached the same way.
///
/// Entries are only dropped through [`LocationCache::evict_owner`], which
/// callers use when the owning resource is rebuilt (a program relink).
#[derive(Debug)]
pub struct LocationCache {
    kind: &'static str,
    entries: HashMap<(Handle, String), Handle>,
}

impl LocationCache {
    /// Creates an empty cache; `kind` names the looked-up resources in logs.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
        }
    }

    /// Returns the cached handle for `(owner, name)`, computing it on a miss.
    ///
    /// `compute` performs the host lookup and registers its result, yielding
    /// a new handle. It runs at most once per key; if it fails the error is
    /// returned and nothing is cached.
    pub fn lookup<E>(
        &mut self,
        owner: Handle,
        name: &str,
        compute: impl FnOnce(Handle, &str) -> Result<Handle, E>,
    ) -> Result<Handle, E> {
        let key = (owner, name.to_owned());
        if let Some(&handle) = self.entries.get(&key) {
            tracing::trace!(kind = self.kind, %owner, name, %handle, "location cache hit");
            return Ok(handle);
        }
        let handle = compute(owner, name)?;
        tracing::debug!(kind = self.kind, %owner, name, %handle, "cached new location");
        self.entries.insert(key, handle);
        Ok(handle)
    }

    /// Returns the cached handle for `(owner, name)` without computing it.
    pub fn get(&self, owner: Handle, name: &str) -> Option<Handle> {
        self.entries.get(&(owner, name.to_owned())).copied()
    }

    /// Drops every entry owned by `owner`, returning how many were removed.
    ///
    /// Handles issued for the dropped entries stay valid in the handle table
    /// but will no longer be returned by [`LocationCache::lookup`].
    pub fn evict_owner(&mut self, owner: Handle) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(o, _), _| *o != owner);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(kind = self.kind, %owner, evicted, "evicted stale locations");
        }
        evicted
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
