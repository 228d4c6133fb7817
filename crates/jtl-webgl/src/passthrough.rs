//! Stateless graphics calls forwarded to the host unchanged.
//!
//! These take only numbers, so there is nothing to translate and they do not
//! depend on the guest's memory. The table below is the full list; each entry
//! names the guest-visible import and the [`GraphicsApi`] method it forwards to.

use crate::{GraphicsApi, WebglCtx};
use wasmtime::{Caller, Linker, Result};

macro_rules! passthrough {
    ($($name:literal => $method:ident($($arg:ident: $ty:ty),*);)*) => {
        /// Names of the pass-through calls, including ones shadowed by a
        /// translation.
        pub const PASSTHROUGH: &[&str] = &[$($name),*];

        /// Registers the pass-through calls under `module`, skipping any name
        /// listed in [`crate::bindings::TRANSLATED`].
        pub fn add_to_linker<T: 'static, G: GraphicsApi + 'static>(
            linker: &mut Linker<T>,
            module: &str,
            get_cx: impl Fn(&mut T) -> &mut WebglCtx<G> + Send + Sync + Copy + 'static,
        ) -> Result<()> {
            $(
                if crate::bindings::TRANSLATED.contains(&$name) {
                    tracing::trace!(call = $name, "pass-through shadowed by translation");
                } else {
                    linker.func_wrap(
                        module,
                        $name,
                        move |mut caller: Caller<'_, T>, $($arg: $ty),*| {
                            tracing::trace!(call = $name, "pass-through");
                            get_cx(caller.data_mut()).api_mut().$method($($arg),*);
                        },
                    )?;
                }
            )*
            Ok(())
        }
    };
}

passthrough! {
    "clearColor" => clear_color(red: f32, green: f32, blue: f32, alpha: f32);
    "clearDepth" => clear_depth(depth: f32);
    "clear" => clear(mask: u32);
    "enable" => enable(cap: u32);
    "disable" => disable(cap: u32);
    "depthFunc" => depth_func(func: u32);
    "cullFace" => cull_face(mode: u32);
    "frontFace" => front_face(mode: u32);
    "blendFunc" => blend_func(sfactor: u32, dfactor: u32);
    "lineWidth" => line_width(width: f32);
    "viewport" => viewport(x: i32, y: i32, width: i32, height: i32);
    "drawArrays" => draw_arrays(mode: u32, first: i32, count: i32);
    "enableVertexAttribArray" => enable_vertex_attrib_array(index: u32);
    "disableVertexAttribArray" => disable_vertex_attrib_array(index: u32);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bindings::TRANSLATED;
    use std::collections::HashSet;

    #[test]
    fn tables_have_no_duplicates() {
        let mut seen = HashSet::new();
        for name in PASSTHROUGH {
            assert!(seen.insert(*name), "duplicate pass-through {name}");
        }
        let mut seen = HashSet::new();
        for name in TRANSLATED {
            assert!(seen.insert(*name), "duplicate translation {name}");
        }
    }

    #[test]
    fn translation_shadows_raw_index() {
        assert!(PASSTHROUGH.contains(&"enableVertexAttribArray"));
        assert!(TRANSLATED.contains(&"enableVertexAttribArray"));
        assert!(!TRANSLATED.contains(&"disableVertexAttribArray"));
    }
}
