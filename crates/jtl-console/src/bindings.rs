//! Linker bindings for the console surface.
//!
//! Text arguments are `(ptr, len)` pairs. Where an argument is optional (a
//! label or tag), a `len` of zero means it was omitted. Every call that takes
//! a pair reads the guest's memory and so fails with
//! [`jtl::BridgeError::NotReady`] before activation, even if the pair is
//! empty.

use crate::{ConsoleCtx, ConsoleSink};
use jtl::{decode_optional, decode_utf8, guest_memory};
use tracing::Level;
use wasmtime::{Caller, Linker, Result};

/// Message calls and the level each one prints at.
pub const MESSAGES: &[(&str, Level)] = &[
    ("log", Level::INFO),
    ("info", Level::INFO),
    ("warn", Level::WARN),
    ("debug", Level::DEBUG),
    ("error", Level::ERROR),
    ("exception", Level::ERROR),
];

/// Registers the console calls under `module`.
pub fn add_to_linker<T: 'static, S: ConsoleSink + 'static>(
    linker: &mut Linker<T>,
    module: &str,
    get_cx: impl Fn(&mut T) -> &mut ConsoleCtx<S> + Send + Sync + Copy + 'static,
) -> Result<()> {
    for &(name, level) in MESSAGES {
        linker.func_wrap(
            module,
            name,
            move |mut caller: Caller<'_, T>, ptr: u32, len: u32| -> Result<()> {
                let (memory, cx) = guest_memory(&mut caller, get_cx)?;
                let text = decode_utf8(memory, ptr, len)?;
                cx.print(level, &text);
                Ok(())
            },
        )?;
    }

    let labeled: [(&str, fn(&mut ConsoleCtx<S>, Option<&str>)); 8] = [
        ("trace", ConsoleCtx::trace),
        ("count", ConsoleCtx::count),
        ("countReset", ConsoleCtx::count_reset),
        ("group", ConsoleCtx::group),
        ("groupCollapsed", ConsoleCtx::group),
        ("time", ConsoleCtx::time),
        ("timeLog", ConsoleCtx::time_log),
        ("timeEnd", ConsoleCtx::time_end),
    ];
    for (name, call) in labeled {
        linker.func_wrap(
            module,
            name,
            move |mut caller: Caller<'_, T>, ptr: u32, len: u32| -> Result<()> {
                let (memory, cx) = guest_memory(&mut caller, get_cx)?;
                let label = decode_optional(memory, ptr, len)?;
                call(cx, label.as_deref());
                Ok(())
            },
        )?;
    }

    linker.func_wrap(
        module,
        "assert",
        move |mut caller: Caller<'_, T>, condition: i32, ptr: u32, len: u32| -> Result<()> {
            let (memory, cx) = guest_memory(&mut caller, get_cx)?;
            let message = decode_optional(memory, ptr, len)?;
            cx.assert(condition != 0, message.as_deref());
            Ok(())
        },
    )?;
    linker.func_wrap(module, "clear", move |mut caller: Caller<'_, T>| {
        get_cx(caller.data_mut()).clear();
    })?;
    linker.func_wrap(module, "groupEnd", move |mut caller: Caller<'_, T>| {
        get_cx(caller.data_mut()).group_end();
    })?;
    linker.func_wrap(
        module,
        "jsConsoleLogWrite",
        move |mut caller: Caller<'_, T>, ptr: u32, len: u32| -> Result<()> {
            let (memory, cx) = guest_memory(&mut caller, get_cx)?;
            let text = decode_utf8(memory, ptr, len)?;
            cx.write(&text);
            Ok(())
        },
    )?;
    linker.func_wrap(module, "jsConsoleLogFlush", move |mut caller: Caller<'_, T>| {
        get_cx(caller.data_mut()).flush();
    })?;
    Ok(())
}
