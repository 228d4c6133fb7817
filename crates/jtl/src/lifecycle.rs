//! Tracking when the guest's linear memory becomes available.

use crate::{BridgeError, Result};

/// Where a translation context is in its setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Created; nothing registered yet.
    Constructed,
    /// Bindings have been handed to the linker, but the guest is not yet
    /// instantiated, so there is no memory to read from.
    Bound,
    /// The guest's memory is known and marshaling calls succeed.
    Active,
}

#[derive(Debug)]
enum State<M> {
    Constructed,
    Bound,
    Active(M),
}

/// Holds the guest memory token once the guest is instantiated.
///
/// `M` is whatever identifies the memory for the host; for wasmtime that is a
/// [`wasmtime::Memory`], which is re-resolved against the store on every call
/// rather than cached as a raw slice.
#[derive(Debug)]
pub struct Lifecycle<M = wasmtime::Memory> {
    state: State<M>,
}

impl<M> Default for Lifecycle<M> {
    fn default() -> Self {
        Self {
            state: State::Constructed,
        }
    }
}

impl<M: Copy> Lifecycle<M> {
    /// Creates a lifecycle in the [`Phase::Constructed`] phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        match self.state {
            State::Constructed => Phase::Constructed,
            State::Bound => Phase::Bound,
            State::Active(_) => Phase::Active,
        }
    }

    /// Records that bindings were exported. Has no effect once active.
    pub fn bind(&mut self) {
        if let State::Constructed = self.state {
            self.state = State::Bound;
        }
    }

    /// Supplies the guest's memory, after which marshaling calls succeed.
    ///
    /// Activation happens exactly once. A second call fails with
    /// [`BridgeError::AlreadyActive`] and the first memory stays in place.
    pub fn activate(&mut self, memory: M) -> Result<()> {
        if let State::Active(_) = self.state {
            return Err(BridgeError::AlreadyActive);
        }
        self.state = State::Active(memory);
        Ok(())
    }

    /// Returns the guest memory, or [`BridgeError::NotReady`] before
    /// activation.
    pub fn memory(&self) -> Result<M> {
        match self.state {
            State::Active(memory) => Ok(memory),
            State::Constructed | State::Bound => Err(BridgeError::NotReady),
        }
    }

    /// Returns `true` once [`Lifecycle::activate`] has succeeded.
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }
}
