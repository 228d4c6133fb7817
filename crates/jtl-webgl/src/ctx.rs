use crate::api::{GraphicsApi, ShaderKind};
use crate::object::{GlObject, Objects};
use jtl::{BridgeError, Handle, HostContext, Lifecycle, LocationCache, Phase, Result};
use wasmtime::{Linker, Memory};

/// The graphics translation layer for one guest instance.
///
/// Owns the host context, the handle table every graphics object is stored
/// in, one location cache each for attributes and uniforms, and the memory
/// lifecycle. The methods here take already-decoded arguments and are what
/// the linker bindings call once they have read the guest's memory.
pub struct WebglCtx<G: GraphicsApi> {
    api: G,
    objects: Objects<G>,
    attribs: LocationCache,
    uniforms: LocationCache,
    lifecycle: Lifecycle,
}

impl<G: GraphicsApi> WebglCtx<G> {
    /// Wraps `api` in a fresh translation layer.
    pub fn new(api: G) -> Self {
        Self {
            api,
            objects: Objects::default(),
            attribs: LocationCache::new("attribute"),
            uniforms: LocationCache::new("uniform"),
            lifecycle: Lifecycle::new(),
        }
    }

    /// The host graphics context.
    pub fn api(&self) -> &G {
        &self.api
    }

    /// Mutable access to the host graphics context.
    pub fn api_mut(&mut self) -> &mut G {
        &mut self.api
    }

    /// All objects registered so far.
    pub fn objects(&self) -> &Objects<G> {
        &self.objects
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Registers this surface's bindings in `linker` under `module`.
    ///
    /// Both the hand-written translations and the stateless pass-through
    /// calls are registered; a name present in both is bound to the
    /// translation. Calling this again replaces the earlier registrations
    /// with identical ones. Shadowing is left disabled on `linker` afterwards.
    pub fn export_bindings<T: 'static>(
        &mut self,
        linker: &mut Linker<T>,
        module: &str,
        get_cx: impl Fn(&mut T) -> &mut WebglCtx<G> + Send + Sync + Copy + 'static,
    ) -> wasmtime::Result<()>
    where
        G: 'static,
    {
        linker.allow_shadowing(true);
        let registered = crate::bindings::add_to_linker(linker, module, get_cx)
            .and_then(|()| crate::passthrough::add_to_linker(linker, module, get_cx));
        linker.allow_shadowing(false);
        registered?;
        self.lifecycle.bind();
        tracing::debug!(module, "exported graphics bindings");
        Ok(())
    }

    /// Supplies the guest's memory. Fails if already active.
    pub fn activate(&mut self, memory: Memory) -> Result<()> {
        self.lifecycle.activate(memory)?;
        tracing::debug!("graphics translation layer active");
        Ok(())
    }

    /// Creates a shader of GL type `kind` and returns its handle.
    pub fn create_shader(&mut self, kind: u32) -> Result<Handle> {
        let kind = ShaderKind::from_gl(kind).ok_or_else(|| {
            BridgeError::HostRejected(format!("unsupported shader type {kind:#x}"))
        })?;
        let shader = self
            .api
            .create_shader(kind)
            .ok_or_else(|| BridgeError::HostRejected("context could not create a shader".into()))?;
        Ok(self.objects.create(GlObject::Shader(shader)))
    }

    /// Replaces the source of `shader`.
    pub fn shader_source(&mut self, shader: i32, source: &str) -> Result<()> {
        let shader = self.objects.shader(shader)?;
        self.api.shader_source(shader, source);
        Ok(())
    }

    /// Compiles `shader`, failing with the info log if the host rejects it.
    pub fn compile_shader(&mut self, shader: i32) -> Result<()> {
        let handle = shader;
        let shader = self.objects.shader(handle)?;
        self.api.compile_shader(shader);
        if self.api.shader_compile_status(shader) {
            return Ok(());
        }
        let log = self.api.shader_info_log(shader);
        tracing::warn!(shader = handle, %log, "shader failed to compile");
        Err(BridgeError::HostRejected(log))
    }

    /// Creates an empty program and returns its handle.
    pub fn create_program(&mut self) -> Result<Handle> {
        let program = self
            .api
            .create_program()
            .ok_or_else(|| BridgeError::HostRejected("context could not create a program".into()))?;
        Ok(self.objects.create(GlObject::Program(program)))
    }

    /// Attaches `shader` to `program`.
    pub fn attach_shader(&mut self, program: i32, shader: i32) -> Result<()> {
        let program = self.objects.program(program)?;
        let shader = self.objects.shader(shader)?;
        self.api.attach_shader(program, shader);
        Ok(())
    }

    /// Links `program`, failing with the info log if the host rejects it.
    ///
    /// A successful link evicts every attribute and uniform location cached
    /// for `program`, so later lookups see the new link. Handles issued for
    /// the old locations still resolve, but to stale values.
    pub fn link_program(&mut self, program: i32) -> Result<()> {
        let handle = Handle::try_from(program)?;
        let program = self.objects.program(program)?;
        self.api.link_program(program);
        if !self.api.program_link_status(program) {
            let log = self.api.program_info_log(program);
            tracing::warn!(program = %handle, %log, "program failed to link");
            return Err(BridgeError::HostRejected(log));
        }
        let stale = self.attribs.evict_owner(handle) + self.uniforms.evict_owner(handle);
        if stale > 0 {
            tracing::warn!(program = %handle, stale, "relinked program; cached locations dropped");
        }
        Ok(())
    }

    /// Makes `program` current.
    pub fn use_program(&mut self, program: i32) -> Result<()> {
        let program = self.objects.program(program)?;
        self.api.use_program(Some(program));
        Ok(())
    }

    /// Creates a buffer and returns its handle.
    pub fn create_buffer(&mut self) -> Result<Handle> {
        let buffer = self
            .api
            .create_buffer()
            .ok_or_else(|| BridgeError::HostRejected("context could not create a buffer".into()))?;
        Ok(self.objects.create(GlObject::Buffer(buffer)))
    }

    /// Binds `buffer` to `target`.
    pub fn bind_buffer(&mut self, target: u32, buffer: i32) -> Result<()> {
        let buffer = self.objects.buffer(buffer)?;
        self.api.bind_buffer(target, Some(buffer));
        Ok(())
    }

    /// Uploads `data` to the buffer bound at `target`.
    pub fn buffer_data(&mut self, target: u32, data: &[f32], usage: u32) {
        tracing::trace!(target, len = data.len(), usage, "buffer upload");
        self.api.buffer_data_f32(target, data, usage);
    }

    /// Returns a handle to the location of attribute `name` in `program`.
    ///
    /// The host is asked once per `(program, name)` until the program is
    /// relinked. A name that is not active still gets a handle; using it
    /// where an attribute index is required fails.
    pub fn get_attrib_location(&mut self, program: i32, name: &str) -> Result<Handle> {
        let Self {
            api,
            objects,
            attribs,
            ..
        } = self;
        attribs.lookup(Handle::try_from(program)?, name, |owner, name| {
            let location = api.get_attrib_location(objects.program(owner.to_guest())?, name);
            Ok(objects.create(GlObject::AttribLocation(location)))
        })
    }

    /// Returns a handle to the location of uniform `name` in `program`.
    ///
    /// Cached like [`WebglCtx::get_attrib_location`]. The host hands out a
    /// distinct location object on every lookup, so the cache is what makes
    /// repeated lookups of one name agree.
    pub fn get_uniform_location(&mut self, program: i32, name: &str) -> Result<Handle> {
        let Self {
            api,
            objects,
            uniforms,
            ..
        } = self;
        uniforms.lookup(Handle::try_from(program)?, name, |owner, name| {
            let location = api.get_uniform_location(objects.program(owner.to_guest())?, name);
            Ok(objects.create(GlObject::UniformLocation(location)))
        })
    }

    /// Sets a `vec4` uniform on the current program.
    pub fn uniform4fv(&mut self, location: i32, value: [f32; 4]) -> Result<()> {
        let location = self.objects.uniform(location)?;
        self.api.uniform4fv(location, value);
        Ok(())
    }

    fn attrib_index(&self, attrib: i32) -> Result<u32> {
        let raw = self.objects.attrib(attrib)?;
        u32::try_from(raw).map_err(|_| {
            BridgeError::HostRejected(format!(
                "attribute handle {attrib} does not name an active attribute"
            ))
        })
    }

    /// Describes the layout of the attribute behind handle `attrib`.
    pub fn vertex_attrib_pointer(
        &mut self,
        attrib: i32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) -> Result<()> {
        let index = self.attrib_index(attrib)?;
        self.api
            .vertex_attrib_pointer(index, size, ty, normalized, stride, offset);
        Ok(())
    }

    /// Enables the attribute array behind handle `attrib`.
    pub fn enable_vertex_attrib_array(&mut self, attrib: i32) -> Result<()> {
        let index = self.attrib_index(attrib)?;
        self.api.enable_vertex_attrib_array(index);
        Ok(())
    }

    /// Creates, sources and compiles a shader in one step.
    pub fn compile_shader_source(&mut self, kind: u32, source: &str) -> Result<Handle> {
        let shader = self.create_shader(kind)?;
        self.shader_source(shader.to_guest(), source)?;
        self.compile_shader(shader.to_guest())?;
        Ok(shader)
    }

    /// Creates a program from a vertex and fragment shader and links it.
    pub fn link_shader_program(&mut self, vertex: i32, fragment: i32) -> Result<Handle> {
        let program = self.create_program()?;
        self.attach_shader(program.to_guest(), vertex)?;
        self.attach_shader(program.to_guest(), fragment)?;
        self.link_program(program.to_guest())?;
        Ok(program)
    }
}

impl<G: GraphicsApi> HostContext for WebglCtx<G> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::consts::*;
    use crate::headless::HeadlessGl;

    const VERTEX: &str = "attribute vec2 pos; uniform vec4 u_offset; void main() {}";
    const FRAGMENT: &str = "uniform vec4 u_color; void main() {}";

    fn program(cx: &mut WebglCtx<HeadlessGl>) -> i32 {
        let vs = cx.compile_shader_source(VERTEX_SHADER, VERTEX).unwrap();
        let fs = cx.compile_shader_source(FRAGMENT_SHADER, FRAGMENT).unwrap();
        cx.link_shader_program(vs.to_guest(), fs.to_guest())
            .unwrap()
            .to_guest()
    }

    #[test]
    fn creation_yields_sequential_handles() {
        let mut cx = WebglCtx::new(HeadlessGl::new());
        assert_eq!(cx.create_shader(VERTEX_SHADER).unwrap(), Handle::from_u32(0));
        assert_eq!(cx.create_program().unwrap(), Handle::from_u32(1));
        assert_eq!(cx.create_buffer().unwrap(), Handle::from_u32(2));
        assert!(matches!(
            cx.create_shader(ARRAY_BUFFER),
            Err(BridgeError::HostRejected(_))
        ));
        assert_eq!(cx.objects().len(), 3);
    }

    #[test]
    fn wrong_kinds_are_rejected() {
        let mut cx = WebglCtx::new(HeadlessGl::new());
        let shader = cx.create_shader(VERTEX_SHADER).unwrap();
        let buffer = cx.create_buffer().unwrap();
        assert_eq!(
            cx.use_program(shader.to_guest()),
            Err(BridgeError::WrongKind {
                handle: shader,
                expected: "program",
                found: "shader",
            })
        );
        assert!(matches!(
            cx.shader_source(buffer.to_guest(), "x"),
            Err(BridgeError::WrongKind { .. })
        ));
        assert_eq!(cx.use_program(7), Err(BridgeError::InvalidHandle(7)));
        assert_eq!(cx.use_program(-3), Err(BridgeError::InvalidHandle(-3)));
    }

    #[test]
    fn compile_failure_carries_log() {
        let mut cx = WebglCtx::new(HeadlessGl::new());
        assert_eq!(
            cx.compile_shader_source(FRAGMENT_SHADER, ""),
            Err(BridgeError::HostRejected("empty shader source".into()))
        );
        let vs = cx.compile_shader_source(VERTEX_SHADER, VERTEX).unwrap();
        assert_eq!(
            cx.link_shader_program(vs.to_guest(), vs.to_guest()),
            Err(BridgeError::HostRejected(
                "no compiled fragment shader attached".into()
            ))
        );
    }

    #[test]
    fn lookups_are_cached() {
        let mut cx = WebglCtx::new(HeadlessGl::new());
        let program = program(&mut cx);
        let pos = cx.get_attrib_location(program, "pos").unwrap();
        assert_eq!(cx.get_attrib_location(program, "pos").unwrap(), pos);
        let color = cx.get_uniform_location(program, "u_color").unwrap();
        assert_eq!(cx.get_uniform_location(program, "u_color").unwrap(), color);
        assert_ne!(pos, color);
        assert_eq!(cx.api().stats().lookups, 2);

        // Misses are cached too.
        let missing = cx.get_uniform_location(program, "u_missing").unwrap();
        assert_eq!(cx.get_uniform_location(program, "u_missing").unwrap(), missing);
        assert_eq!(cx.api().stats().lookups, 3);
        cx.uniform4fv(missing.to_guest(), [1.0; 4]).unwrap();
    }

    #[test]
    fn lookup_on_non_program_caches_nothing() {
        let mut cx = WebglCtx::new(HeadlessGl::new());
        let shader = cx.create_shader(VERTEX_SHADER).unwrap();
        assert!(matches!(
            cx.get_attrib_location(shader.to_guest(), "pos"),
            Err(BridgeError::WrongKind { .. })
        ));
        assert!(matches!(
            cx.get_uniform_location(99, "u"),
            Err(BridgeError::InvalidHandle(99))
        ));
        assert_eq!(cx.objects().len(), 1);
        assert_eq!(cx.api().stats().lookups, 0);
    }

    #[test]
    fn relink_evicts_locations() {
        let mut cx = WebglCtx::new(HeadlessGl::new());
        let program = program(&mut cx);
        let before = cx.get_uniform_location(program, "u_color").unwrap();
        cx.link_program(program).unwrap();
        let after = cx.get_uniform_location(program, "u_color").unwrap();
        assert_ne!(before, after);
        assert!(matches!(
            cx.objects().get(before.to_guest()),
            Ok(GlObject::UniformLocation(Some(_)))
        ));
    }

    #[test]
    fn missing_attribute_is_rejected_on_use() {
        let mut cx = WebglCtx::new(HeadlessGl::new());
        let program = program(&mut cx);
        let missing = cx.get_attrib_location(program, "normal").unwrap();
        assert!(matches!(
            cx.objects().get(missing.to_guest()),
            Ok(GlObject::AttribLocation(-1))
        ));
        assert!(matches!(
            cx.enable_vertex_attrib_array(missing.to_guest()),
            Err(BridgeError::HostRejected(_))
        ));

        let pos = cx.get_attrib_location(program, "pos").unwrap();
        cx.enable_vertex_attrib_array(pos.to_guest()).unwrap();
        cx.vertex_attrib_pointer(pos.to_guest(), 2, FLOAT, false, 0, 0)
            .unwrap();
        assert!(cx.api().is_attrib_array_enabled(0));
    }
}
