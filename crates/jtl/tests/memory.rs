use anyhow::Result;
use jtl::{BridgeError, HostContext, Lifecycle, decode_utf8, guest_memory};
use wasmtime::{Caller, Engine, Instance, Linker, Memory, Module, Store};

#[derive(Default)]
struct Recorder {
    lifecycle: Lifecycle,
    seen: Vec<String>,
}

impl HostContext for Recorder {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

const GUEST: &str = r#"
    (module
        (import "env" "record" (func $record (param i32 i32)))
        (memory (export "memory") 1)
        (data (i32.const 16) "hello")
        (func (export "hello")
            (call $record (i32.const 16) (i32.const 5)))
        (func (export "past_end")
            (call $record (i32.const 65534) (i32.const 4)))
        (func (export "grow_and_record")
            (drop (memory.grow (i32.const 1)))
            (i32.store8 (i32.const 65544) (i32.const 102))
            (i32.store8 (i32.const 65545) (i32.const 97))
            (i32.store8 (i32.const 65546) (i32.const 114))
            (call $record (i32.const 65544) (i32.const 3)))
    )
"#;

fn instantiate() -> Result<(Store<Recorder>, Instance)> {
    let engine = Engine::default();
    let module = Module::new(&engine, GUEST)?;
    let mut linker = Linker::new(&engine);
    linker.func_wrap(
        "env",
        "record",
        |mut caller: Caller<'_, Recorder>, ptr: u32, len: u32| -> Result<()> {
            let (memory, cx) = guest_memory(&mut caller, |cx| cx)?;
            let text = decode_utf8(memory, ptr, len)?;
            cx.seen.push(text);
            Ok(())
        },
    )?;
    let mut store = Store::new(&engine, Recorder::default());
    let instance = linker.instantiate(&mut store, &module)?;
    Ok((store, instance))
}

fn call(store: &mut Store<Recorder>, instance: &Instance, name: &str) -> Result<()> {
    instance
        .get_typed_func::<(), ()>(&mut *store, name)?
        .call(store, ())
}

fn activate(store: &mut Store<Recorder>, instance: &Instance) -> Result<Memory> {
    let memory = instance
        .get_memory(&mut *store, "memory")
        .ok_or_else(|| anyhow::anyhow!("no memory export"))?;
    store.data_mut().lifecycle.activate(memory)?;
    Ok(memory)
}

#[test_log::test]
fn not_ready_before_activation() -> Result<()> {
    let (mut store, instance) = instantiate()?;
    let err = call(&mut store, &instance, "hello").unwrap_err();
    assert_eq!(
        err.downcast_ref::<BridgeError>(),
        Some(&BridgeError::NotReady),
        "{err:?}"
    );
    assert!(store.data().seen.is_empty());
    Ok(())
}

#[test]
fn reads_after_activation() -> Result<()> {
    let (mut store, instance) = instantiate()?;
    activate(&mut store, &instance)?;
    call(&mut store, &instance, "hello")?;
    call(&mut store, &instance, "hello")?;
    assert_eq!(store.data().seen, ["hello", "hello"]);
    Ok(())
}

#[test]
fn second_activation_is_rejected() -> Result<()> {
    let (mut store, instance) = instantiate()?;
    let memory = activate(&mut store, &instance)?;
    assert_eq!(
        store.data_mut().lifecycle.activate(memory),
        Err(BridgeError::AlreadyActive)
    );
    call(&mut store, &instance, "hello")?;
    assert_eq!(store.data().seen, ["hello"]);
    Ok(())
}

#[test_log::test]
fn growth_is_observed() -> Result<()> {
    let (mut store, instance) = instantiate()?;
    let memory = activate(&mut store, &instance)?;

    let err = call(&mut store, &instance, "past_end").unwrap_err();
    assert_eq!(
        err.downcast_ref::<BridgeError>(),
        Some(&BridgeError::OutOfBounds {
            offset: 65534,
            len: 4,
            size: 65536
        })
    );

    call(&mut store, &instance, "grow_and_record")?;
    assert_eq!(memory.data_size(&store), 2 * 65536);
    call(&mut store, &instance, "past_end")?;
    assert_eq!(store.data().seen, ["far", "\0\0\0\0"]);
    Ok(())
}
