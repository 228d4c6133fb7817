//! GL enumerants, exported to the guest as immutable globals.

use wasmtime::{AsContextMut, Global, GlobalType, Linker, Mutability, Result, Val, ValType};

macro_rules! constants {
    ($($name:ident = $value:expr,)*) => {
        $(pub const $name: u32 = $value;)*

        /// Every enumerant exported by [`define_constants`], by name.
        pub const CONSTANTS: &[(&str, u32)] = &[$((stringify!($name), $name),)*];
    };
}

constants! {
    // Clear masks.
    DEPTH_BUFFER_BIT = 0x0000_0100,
    STENCIL_BUFFER_BIT = 0x0000_0400,
    COLOR_BUFFER_BIT = 0x0000_4000,

    // Primitives.
    POINTS = 0x0000,
    LINES = 0x0001,
    LINE_LOOP = 0x0002,
    LINE_STRIP = 0x0003,
    TRIANGLES = 0x0004,
    TRIANGLE_STRIP = 0x0005,
    TRIANGLE_FAN = 0x0006,

    // Blending.
    ZERO = 0,
    ONE = 1,
    SRC_COLOR = 0x0300,
    ONE_MINUS_SRC_COLOR = 0x0301,
    SRC_ALPHA = 0x0302,
    ONE_MINUS_SRC_ALPHA = 0x0303,
    DST_ALPHA = 0x0304,
    ONE_MINUS_DST_ALPHA = 0x0305,

    // Buffers.
    ARRAY_BUFFER = 0x8892,
    ELEMENT_ARRAY_BUFFER = 0x8893,
    STREAM_DRAW = 0x88E0,
    STATIC_DRAW = 0x88E4,
    DYNAMIC_DRAW = 0x88E8,

    // Faces.
    FRONT = 0x0404,
    BACK = 0x0405,
    FRONT_AND_BACK = 0x0408,
    CW = 0x0900,
    CCW = 0x0901,

    // Capabilities.
    CULL_FACE = 0x0B44,
    DEPTH_TEST = 0x0B71,
    STENCIL_TEST = 0x0B90,
    BLEND = 0x0BE2,
    SCISSOR_TEST = 0x0C11,

    // Data types.
    BYTE = 0x1400,
    UNSIGNED_BYTE = 0x1401,
    SHORT = 0x1402,
    UNSIGNED_SHORT = 0x1403,
    INT = 0x1404,
    UNSIGNED_INT = 0x1405,
    FLOAT = 0x1406,

    // Depth functions.
    NEVER = 0x0200,
    LESS = 0x0201,
    EQUAL = 0x0202,
    LEQUAL = 0x0203,
    GREATER = 0x0204,
    NOTEQUAL = 0x0205,
    GEQUAL = 0x0206,
    ALWAYS = 0x0207,

    // Shaders.
    FRAGMENT_SHADER = 0x8B30,
    VERTEX_SHADER = 0x8B31,
    COMPILE_STATUS = 0x8B81,
    LINK_STATUS = 0x8B82,
}

/// Defines every entry of [`CONSTANTS`] as an immutable `i32` global in
/// `module`.
pub fn define_constants<T: 'static>(
    linker: &mut Linker<T>,
    mut store: impl AsContextMut<Data = T>,
    module: &str,
) -> Result<()> {
    let mut store = store.as_context_mut();
    let ty = GlobalType::new(ValType::I32, Mutability::Const);
    for (name, value) in CONSTANTS {
        let global = Global::new(&mut store, ty.clone(), Val::I32(*value as i32))?;
        linker.define(&store, module, name, global)?;
    }
    tracing::debug!(module, count = CONSTANTS.len(), "defined graphics constants");
    Ok(())
}
