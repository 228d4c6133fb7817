use anyhow::{Result, anyhow};
use jtl::{BridgeError, Phase};
use jtl_console::{ConsoleCtx, RecordingSink, TracingSink};
use tracing::Level;
use wasmtime::*;

const GUEST: &str = r#"
(module
    (import "console" "log" (func $log (param i32 i32)))
    (import "console" "warn" (func $warn (param i32 i32)))
    (import "console" "error" (func $error (param i32 i32)))
    (import "console" "assert" (func $assert (param i32 i32 i32)))
    (import "console" "count" (func $count (param i32 i32)))
    (import "console" "group" (func $group (param i32 i32)))
    (import "console" "groupEnd" (func $group_end))
    (import "console" "trace" (func $trace (param i32 i32)))
    (import "console" "jsConsoleLogWrite" (func $write (param i32 i32)))
    (import "console" "jsConsoleLogFlush" (func $flush))

    (memory (export "memory") 1)
    (data (i32.const 0) "hello")
    (data (i32.const 8) "careful")
    (data (i32.const 16) "frames")
    (data (i32.const 24) "setup")
    (data (i32.const 32) "h\c3\a9llo ")
    (data (i32.const 40) "w\c3\b6rld")
    (data (i32.const 48) "\ff\fe")

    (func (export "enter")
        (call $group (i32.const 24) (i32.const 5))
        (call $log (i32.const 0) (i32.const 5))
        (call $warn (i32.const 8) (i32.const 7))
        (call $group_end)
        (call $assert (i32.const 1) (i32.const 8) (i32.const 7))
        (call $assert (i32.const 0) (i32.const 8) (i32.const 7))
        (call $assert (i32.const 0) (i32.const 0) (i32.const 0))
        (call $trace (i32.const 0) (i32.const 0)))

    (func (export "step") (param $now f64)
        (call $count (i32.const 16) (i32.const 6))
        (call $count (i32.const 0) (i32.const 0))
        (call $write (i32.const 32) (i32.const 7))
        (call $write (i32.const 40) (i32.const 6))
        (call $flush))

    (func (export "bad_text")
        (call $error (i32.const 48) (i32.const 2)))

    (func (export "past_end")
        (call $log (i32.const 65535) (i32.const 2)))
)
"#;

fn instantiate<S: jtl_console::ConsoleSink + 'static>(
    sink: S,
) -> Result<(Store<ConsoleCtx<S>>, Instance)> {
    let engine = Engine::default();
    let module = Module::new(&engine, GUEST)?;
    let mut linker = Linker::new(&engine);
    let mut store = Store::new(&engine, ConsoleCtx::new(sink));
    store
        .data_mut()
        .export_bindings(&mut linker, "console", |cx| cx)?;
    assert_eq!(store.data().phase(), Phase::Bound);
    let instance = linker.instantiate(&mut store, &module)?;
    Ok((store, instance))
}

fn activate<T>(store: &mut Store<ConsoleCtx<T>>, instance: &Instance) -> Result<()>
where
    T: jtl_console::ConsoleSink + 'static,
{
    let memory = instance
        .get_memory(&mut *store, "memory")
        .ok_or_else(|| anyhow!("no memory export"))?;
    store.data_mut().activate(memory)?;
    Ok(())
}

fn call<T: 'static>(store: &mut Store<T>, instance: &Instance, name: &str) -> Result<()> {
    instance
        .get_typed_func::<(), ()>(&mut *store, name)?
        .call(store, ())
}

#[test]
fn messages_reach_the_sink() -> Result<()> {
    let (mut store, instance) = instantiate(RecordingSink::default())?;
    activate(&mut store, &instance)?;
    call(&mut store, &instance, "enter")?;
    let step = instance.get_typed_func::<f64, ()>(&mut store, "step")?;
    step.call(&mut store, 16.0)?;
    step.call(&mut store, 32.0)?;

    let sink = store.data().sink();
    assert_eq!(
        sink.texts(),
        [
            "setup",
            "hello",
            "careful",
            "Assertion failed: careful",
            "Assertion failed",
            "Trace",
            "frames: 1",
            "default: 1",
            "héllo wörld",
            "frames: 2",
            "default: 2",
            "héllo wörld",
        ]
    );
    let levels = sink.lines.iter().take(6).map(|l| l.level).collect::<Vec<_>>();
    assert_eq!(
        levels,
        [
            Level::INFO,
            Level::INFO,
            Level::WARN,
            Level::ERROR,
            Level::ERROR,
            Level::TRACE
        ]
    );
    let depths = sink.lines.iter().take(3).map(|l| l.depth).collect::<Vec<_>>();
    assert_eq!(depths, [0, 1, 1]);
    Ok(())
}

#[test]
fn calls_before_activation_fail() -> Result<()> {
    let (mut store, instance) = instantiate(RecordingSink::default())?;
    let err = call(&mut store, &instance, "enter").unwrap_err();
    assert_eq!(
        err.downcast_ref::<BridgeError>(),
        Some(&BridgeError::NotReady)
    );

    // Even an omitted label needs memory to be known.
    let err = instance
        .get_typed_func::<f64, ()>(&mut store, "step")?
        .call(&mut store, 0.0)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<BridgeError>(),
        Some(&BridgeError::NotReady)
    );
    assert!(store.data().sink().lines.is_empty());
    Ok(())
}

#[test]
fn malformed_text_traps() -> Result<()> {
    let (mut store, instance) = instantiate(RecordingSink::default())?;
    activate(&mut store, &instance)?;

    let err = call(&mut store, &instance, "bad_text").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BridgeError>(),
        Some(BridgeError::InvalidEncoding(_))
    ));

    let err = call(&mut store, &instance, "past_end").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BridgeError>(),
        Some(BridgeError::OutOfBounds { .. })
    ));
    assert!(store.data().sink().lines.is_empty());
    Ok(())
}

#[test_log::test]
fn tracing_sink() -> Result<()> {
    let (mut store, instance) = instantiate(TracingSink)?;
    activate(&mut store, &instance)?;
    call(&mut store, &instance, "enter")?;
    assert_eq!(store.data().depth(), 0);
    Ok(())
}

#[test]
fn exporting_again_is_idempotent() -> Result<()> {
    let engine = Engine::default();
    let module = Module::new(&engine, GUEST)?;
    let mut linker = Linker::new(&engine);
    let mut store = Store::new(&engine, ConsoleCtx::new(RecordingSink::default()));
    store
        .data_mut()
        .export_bindings(&mut linker, "console", |cx| cx)?;
    store
        .data_mut()
        .export_bindings(&mut linker, "console", |cx| cx)?;
    assert_eq!(store.data().phase(), Phase::Bound);

    // Shadowing is off again once the bindings are in place.
    let err = linker
        .func_wrap("console", "log", |_: i32, _: i32| {})
        .unwrap_err();
    assert!(err.to_string().contains("defined twice"), "{err}");

    let instance = linker.instantiate(&mut store, &module)?;
    activate(&mut store, &instance)?;
    call(&mut store, &instance, "enter")?;
    assert_eq!(store.data().sink().texts()[..2], ["setup", "hello"]);

    store.data_mut().sink_mut().lines.clear();
    let step = instance.get_typed_func::<f64, ()>(&mut store, "step")?;
    step.call(&mut store, 16.0)?;
    assert_eq!(
        store.data().sink().texts(),
        ["frames: 1", "default: 1", "héllo wörld"]
    );
    Ok(())
}
