//! WebGL-style graphics for WebAssembly guests.
//!
//! A guest cannot hold references to shaders, programs or buffers, so this
//! crate keeps them in a [`jtl::HandleTable`] and gives the guest integer
//! handles instead. [`WebglCtx`] is the per-instance translation layer; it is
//! generic over the host [`GraphicsApi`], with [`HeadlessGl`] as an
//! in-process implementation for tests and command-line runs.
//!
//! A typical embedding stores the context in the store data, exports the
//! bindings before instantiating, and activates the context with the guest's
//! memory afterwards:
//!
//! ```no_run
//! use jtl_webgl::{HeadlessGl, WebglCtx};
//! use wasmtime::{Engine, Linker, Module, Store};
//!
//! # fn main() -> wasmtime::Result<()> {
//! let engine = Engine::default();
//! let module = Module::from_file(&engine, "guest.wasm")?;
//! let mut linker = Linker::<WebglCtx<HeadlessGl>>::new(&engine);
//! let mut store = Store::new(&engine, WebglCtx::new(HeadlessGl::new()));
//! store.data_mut().export_bindings(&mut linker, "webgl", |cx| cx)?;
//! jtl_webgl::define_constants(&mut linker, &mut store, "webgl")?;
//!
//! let instance = linker.instantiate(&mut store, &module)?;
//! let memory = instance.get_memory(&mut store, "memory").unwrap();
//! store.data_mut().activate(memory)?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod bindings;
pub mod consts;
mod ctx;
pub mod headless;
mod object;
pub mod passthrough;

pub use self::api::{GraphicsApi, ShaderKind};
pub use self::consts::define_constants;
pub use self::ctx::WebglCtx;
pub use self::headless::{AttribLayout, HeadlessGl, Pipeline};
pub use self::object::{GlObject, Objects};
