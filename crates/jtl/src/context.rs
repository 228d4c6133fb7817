//! Access to the guest's memory from inside a linker binding.

use crate::{Lifecycle, Result};
use wasmtime::Caller;

/// A translation context stored in (or reachable from) wasmtime store data.
pub trait HostContext {
    /// The lifecycle that holds the guest's memory once activated.
    fn lifecycle(&self) -> &Lifecycle;
}

/// Borrows the guest's memory and the host context at the same time.
///
/// `get_cx` projects the context out of the store data, the same way it is
/// passed to the surfaces' `add_to_linker` functions. The memory is looked up
/// afresh on every call, so the slice reflects any growth that happened
/// since the previous call. Fails with [`crate::BridgeError::NotReady`] if the
/// context has not been activated yet.
pub fn guest_memory<'a, T: 'static, U: HostContext + 'a>(
    caller: &'a mut Caller<'_, T>,
    get_cx: impl Fn(&mut T) -> &mut U,
) -> Result<(&'a [u8], &'a mut U)> {
    let memory = get_cx(caller.data_mut()).lifecycle().memory()?;
    let (bytes, data) = memory.data_and_store_mut(caller);
    Ok((bytes, get_cx(data)))
}
