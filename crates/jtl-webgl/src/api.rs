//! The host graphics API that guest calls are translated into.

use std::fmt::Debug;

/// The kind of shader passed to [`GraphicsApi::create_shader`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// `VERTEX_SHADER`
    Vertex,
    /// `FRAGMENT_SHADER`
    Fragment,
}

impl ShaderKind {
    /// Maps a GL enumerant to a shader kind.
    pub fn from_gl(value: u32) -> Option<Self> {
        match value {
            crate::consts::VERTEX_SHADER => Some(ShaderKind::Vertex),
            crate::consts::FRAGMENT_SHADER => Some(ShaderKind::Fragment),
            _ => None,
        }
    }

    /// The GL enumerant for this kind.
    pub fn to_gl(self) -> u32 {
        match self {
            ShaderKind::Vertex => crate::consts::VERTEX_SHADER,
            ShaderKind::Fragment => crate::consts::FRAGMENT_SHADER,
        }
    }
}

/// A stateful, object-based graphics context in the style of WebGL.
///
/// Object-producing methods return opaque host references, which the guest
/// never sees directly; they are stored in a handle table and the guest gets
/// an integer instead. Calls that only take numbers are forwarded with no
/// translation at all.
///
/// Creation methods return `None` when the context cannot produce an object
/// (for example after a lost context). Uniform lookups return `None` for
/// names that are not active in the program, and attribute lookups return
/// `-1`; both results are legitimate and are forwarded to the guest.
pub trait GraphicsApi {
    /// A compiled or uncompiled shader object.
    type Shader: Debug;
    /// A program object.
    type Program: Debug;
    /// A buffer object.
    type Buffer: Debug;
    /// A uniform location. Lookups of the same name may return distinct
    /// values that are not interchangeable.
    type UniformLocation: Debug;

    /// Creates a shader of `kind`.
    fn create_shader(&mut self, kind: ShaderKind) -> Option<Self::Shader>;
    /// Replaces the source text of `shader`.
    fn shader_source(&mut self, shader: &Self::Shader, source: &str);
    /// Compiles `shader`.
    fn compile_shader(&mut self, shader: &Self::Shader);
    /// Returns whether the last compile of `shader` succeeded.
    fn shader_compile_status(&self, shader: &Self::Shader) -> bool;
    /// Returns the diagnostic text from the last compile of `shader`.
    fn shader_info_log(&self, shader: &Self::Shader) -> String;

    /// Creates an empty program.
    fn create_program(&mut self) -> Option<Self::Program>;
    /// Attaches `shader` to `program`.
    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    /// Links `program`.
    fn link_program(&mut self, program: &Self::Program);
    /// Returns whether the last link of `program` succeeded.
    fn program_link_status(&self, program: &Self::Program) -> bool;
    /// Returns the diagnostic text from the last link of `program`.
    fn program_info_log(&self, program: &Self::Program) -> String;
    /// Makes `program` current, or unbinds the current program.
    fn use_program(&mut self, program: Option<&Self::Program>);

    /// Returns the attribute index of `name` in `program`, or `-1`.
    fn get_attrib_location(&mut self, program: &Self::Program, name: &str) -> i32;
    /// Returns the location of uniform `name` in `program`, if active.
    fn get_uniform_location(
        &mut self,
        program: &Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    /// Sets a `vec4` uniform on the current program.
    fn uniform4fv(&mut self, location: Option<&Self::UniformLocation>, value: [f32; 4]);

    /// Creates a buffer.
    fn create_buffer(&mut self) -> Option<Self::Buffer>;
    /// Binds `buffer` to `target`, or unbinds it.
    fn bind_buffer(&mut self, target: u32, buffer: Option<&Self::Buffer>);
    /// Uploads `data` to the buffer bound at `target`.
    fn buffer_data_f32(&mut self, target: u32, data: &[f32], usage: u32);

    /// Describes the layout of vertex attribute `index`.
    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    /// Enables vertex attribute array `index`.
    fn enable_vertex_attrib_array(&mut self, index: u32);
    /// Disables vertex attribute array `index`.
    fn disable_vertex_attrib_array(&mut self, index: u32);

    /// Sets the clear color.
    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32);
    /// Sets the clear depth.
    fn clear_depth(&mut self, depth: f32);
    /// Clears the buffers selected by `mask`.
    fn clear(&mut self, mask: u32);
    /// Enables a capability.
    fn enable(&mut self, cap: u32);
    /// Disables a capability.
    fn disable(&mut self, cap: u32);
    /// Sets the depth comparison function.
    fn depth_func(&mut self, func: u32);
    /// Selects which faces are culled.
    fn cull_face(&mut self, mode: u32);
    /// Selects the winding order of front faces.
    fn front_face(&mut self, mode: u32);
    /// Sets the blend factors.
    fn blend_func(&mut self, sfactor: u32, dfactor: u32);
    /// Sets the rasterized line width.
    fn line_width(&mut self, width: f32);
    /// Sets the viewport rectangle.
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    /// Draws `count` vertices starting at `first`.
    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32);
}
