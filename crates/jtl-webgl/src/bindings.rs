//! Hand-written translations between guest calls and [`WebglCtx`].
//!
//! Handles cross the boundary as `i32`, enumerants as `u32`, and every
//! string or array as a `(ptr, len)` pair into the guest's memory. Calls that
//! read memory fail with [`jtl::BridgeError::NotReady`] until the context is
//! activated; the others work as soon as they are linked.

use crate::{GraphicsApi, WebglCtx};
use jtl::{copy_numeric, decode_utf8, guest_memory};
use wasmtime::{Caller, Linker, Result};

/// Names registered by [`add_to_linker`]. These take precedence over
/// pass-through calls of the same name.
pub const TRANSLATED: &[&str] = &[
    "createShader",
    "shaderSource",
    "compileShader",
    "createProgram",
    "attachShader",
    "linkProgram",
    "useProgram",
    "createBuffer",
    "bindBuffer",
    "bufferData",
    "getAttribLocation",
    "getUniformLocation",
    "uniform4fv",
    "vertexAttribPointer",
    "enableVertexAttribArray",
    "compileShaderSource",
    "linkShaderProgram",
];

/// Registers the translated graphics calls under `module`.
pub fn add_to_linker<T: 'static, G: GraphicsApi + 'static>(
    linker: &mut Linker<T>,
    module: &str,
    get_cx: impl Fn(&mut T) -> &mut WebglCtx<G> + Send + Sync + Copy + 'static,
) -> Result<()> {
    linker.func_wrap(
        module,
        "createShader",
        move |mut caller: Caller<'_, T>, kind: u32| -> Result<i32> {
            Ok(get_cx(caller.data_mut()).create_shader(kind)?.to_guest())
        },
    )?;
    linker.func_wrap(
        module,
        "shaderSource",
        move |mut caller: Caller<'_, T>, shader: i32, ptr: u32, len: u32| -> Result<()> {
            let (memory, cx) = guest_memory(&mut caller, get_cx)?;
            let source = decode_utf8(memory, ptr, len)?;
            cx.shader_source(shader, &source)?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "compileShader",
        move |mut caller: Caller<'_, T>, shader: i32| -> Result<()> {
            get_cx(caller.data_mut()).compile_shader(shader)?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "createProgram",
        move |mut caller: Caller<'_, T>| -> Result<i32> {
            Ok(get_cx(caller.data_mut()).create_program()?.to_guest())
        },
    )?;
    linker.func_wrap(
        module,
        "attachShader",
        move |mut caller: Caller<'_, T>, program: i32, shader: i32| -> Result<()> {
            get_cx(caller.data_mut()).attach_shader(program, shader)?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "linkProgram",
        move |mut caller: Caller<'_, T>, program: i32| -> Result<()> {
            get_cx(caller.data_mut()).link_program(program)?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "useProgram",
        move |mut caller: Caller<'_, T>, program: i32| -> Result<()> {
            get_cx(caller.data_mut()).use_program(program)?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "createBuffer",
        move |mut caller: Caller<'_, T>| -> Result<i32> {
            Ok(get_cx(caller.data_mut()).create_buffer()?.to_guest())
        },
    )?;
    linker.func_wrap(
        module,
        "bindBuffer",
        move |mut caller: Caller<'_, T>, target: u32, buffer: i32| -> Result<()> {
            get_cx(caller.data_mut()).bind_buffer(target, buffer)?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "bufferData",
        move |mut caller: Caller<'_, T>, target: u32, ptr: u32, count: u32, usage: u32| -> Result<()> {
            let (memory, cx) = guest_memory(&mut caller, get_cx)?;
            let data = copy_numeric::<f32>(memory, ptr, count)?;
            cx.buffer_data(target, &data, usage);
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "getAttribLocation",
        move |mut caller: Caller<'_, T>, program: i32, ptr: u32, len: u32| -> Result<i32> {
            let (memory, cx) = guest_memory(&mut caller, get_cx)?;
            let name = decode_utf8(memory, ptr, len)?;
            Ok(cx.get_attrib_location(program, &name)?.to_guest())
        },
    )?;
    linker.func_wrap(
        module,
        "getUniformLocation",
        move |mut caller: Caller<'_, T>, program: i32, ptr: u32, len: u32| -> Result<i32> {
            let (memory, cx) = guest_memory(&mut caller, get_cx)?;
            let name = decode_utf8(memory, ptr, len)?;
            Ok(cx.get_uniform_location(program, &name)?.to_guest())
        },
    )?;
    linker.func_wrap(
        module,
        "uniform4fv",
        move |mut caller: Caller<'_, T>, location: i32, x: f32, y: f32, z: f32, w: f32| -> Result<()> {
            get_cx(caller.data_mut()).uniform4fv(location, [x, y, z, w])?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "vertexAttribPointer",
        move |mut caller: Caller<'_, T>,
              attrib: i32,
              size: i32,
              ty: u32,
              normalized: i32,
              stride: i32,
              offset: i32|
              -> Result<()> {
            get_cx(caller.data_mut()).vertex_attrib_pointer(
                attrib,
                size,
                ty,
                normalized != 0,
                stride,
                offset,
            )?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "enableVertexAttribArray",
        move |mut caller: Caller<'_, T>, attrib: i32| -> Result<()> {
            get_cx(caller.data_mut()).enable_vertex_attrib_array(attrib)?;
            Ok(())
        },
    )?;
    linker.func_wrap(
        module,
        "compileShaderSource",
        move |mut caller: Caller<'_, T>, ptr: u32, len: u32, kind: u32| -> Result<i32> {
            let (memory, cx) = guest_memory(&mut caller, get_cx)?;
            let source = decode_utf8(memory, ptr, len)?;
            Ok(cx.compile_shader_source(kind, &source)?.to_guest())
        },
    )?;
    linker.func_wrap(
        module,
        "linkShaderProgram",
        move |mut caller: Caller<'_, T>, vertex: i32, fragment: i32| -> Result<i32> {
            Ok(get_cx(caller.data_mut())
                .link_shader_program(vertex, fragment)?
                .to_guest())
        },
    )?;
    Ok(())
}
