//! An in-process graphics host that tracks state without rendering.
//!
//! [`HeadlessGl`] implements enough of the WebGL object model for guests to
//! run unmodified: shaders compile as long as their source is non-empty,
//! programs link when a compiled vertex and fragment shader are attached, and
//! attribute and uniform names are discovered by scanning the declarations in
//! the attached sources. Nothing is drawn; draw calls, clears and uploads are
//! counted instead.

use crate::api::{GraphicsApi, ShaderKind};
use crate::consts::{BACK, CCW, LESS, ONE, ZERO};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A shader created by [`HeadlessGl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(u32);

/// A program created by [`HeadlessGl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(u32);

/// A buffer created by [`HeadlessGl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(u32);

/// A uniform location created by [`HeadlessGl`].
///
/// Like in a browser, every lookup yields a new location object, and two
/// lookups of the same name do not compare equal.
#[derive(Debug, PartialEq, Eq)]
pub struct UniformLocation {
    program: ProgramId,
    link: u32,
    index: usize,
    lookup: u64,
}

/// Counters for the work a guest asked the headless host to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Named attribute and uniform lookups that reached the host.
    pub lookups: u64,
    /// `drawArrays` calls.
    pub draw_calls: u64,
    /// Vertices submitted through `drawArrays`.
    pub vertices: u64,
    /// `clear` calls.
    pub clears: u64,
    /// `bufferData` uploads.
    pub uploads: u64,
}

/// The layout recorded by `vertexAttribPointer` for one attribute index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttribLayout {
    /// Components per vertex.
    pub size: i32,
    /// Component type, e.g. `FLOAT`.
    pub ty: u32,
    /// Whether integer components are normalized.
    pub normalized: bool,
    /// Bytes between consecutive vertices.
    pub stride: i32,
    /// Byte offset of the first component.
    pub offset: i32,
}

/// Fixed-function state set by the stateless calls.
///
/// Starts out with the values a fresh WebGL context reports.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pipeline {
    /// `clearDepth`
    pub clear_depth: f32,
    /// `depthFunc`
    pub depth_func: u32,
    /// `cullFace`
    pub cull_face: u32,
    /// `frontFace`
    pub front_face: u32,
    /// `blendFunc` as `(sfactor, dfactor)`.
    pub blend_func: (u32, u32),
    /// `lineWidth`
    pub line_width: f32,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            clear_depth: 1.0,
            depth_func: LESS,
            cull_face: BACK,
            front_face: CCW,
            blend_func: (ONE, ZERO),
            line_width: 1.0,
        }
    }
}

#[derive(Debug)]
struct Shader {
    kind: ShaderKind,
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct Program {
    attached: Vec<ShaderId>,
    /// Bumped on every successful link; locations from older links are
    /// silently ignored.
    link: u32,
    linked: bool,
    info_log: String,
    attributes: Vec<String>,
    uniforms: Vec<String>,
}

/// A [`GraphicsApi`] that keeps all state in memory.
#[derive(Debug)]
pub struct HeadlessGl {
    next_id: u32,
    next_lookup: u64,
    shaders: HashMap<u32, Shader>,
    programs: HashMap<u32, Program>,
    buffers: HashMap<u32, Vec<f32>>,
    bindings: HashMap<u32, u32>,
    current_program: Option<u32>,
    uniform_values: HashMap<(u32, String), [f32; 4]>,
    attrib_arrays: BTreeSet<u32>,
    attrib_layouts: BTreeMap<u32, AttribLayout>,
    capabilities: BTreeSet<u32>,
    clear_color: [f32; 4],
    pipeline: Pipeline,
    viewport: [i32; 4],
    stats: Stats,
}

impl Default for HeadlessGl {
    fn default() -> Self {
        Self {
            next_id: 1,
            next_lookup: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            bindings: HashMap::new(),
            current_program: None,
            uniform_values: HashMap::new(),
            attrib_arrays: BTreeSet::new(),
            attrib_layouts: BTreeMap::new(),
            capabilities: BTreeSet::new(),
            clear_color: [0.0; 4],
            pipeline: Pipeline::default(),
            viewport: [0; 4],
            stats: Stats::default(),
        }
    }
}

impl HeadlessGl {
    /// Creates a context with no objects and default state.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Work counters accumulated so far.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// The current viewport as `[x, y, width, height]`.
    pub fn viewport(&self) -> [i32; 4] {
        self.viewport
    }

    /// The current clear color.
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Depth, face, blend and line state.
    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    /// The layout last given to attribute `index` by `vertexAttribPointer`.
    pub fn attrib_layout(&self, index: u32) -> Option<AttribLayout> {
        self.attrib_layouts.get(&index).copied()
    }

    /// Whether `cap` was enabled with `enable`.
    pub fn is_enabled(&self, cap: u32) -> bool {
        self.capabilities.contains(&cap)
    }

    /// Whether vertex attribute array `index` is enabled.
    pub fn is_attrib_array_enabled(&self, index: u32) -> bool {
        self.attrib_arrays.contains(&index)
    }

    /// The program made current with `useProgram`, if any.
    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program.map(ProgramId)
    }

    /// Contents of `buffer` as last uploaded.
    pub fn buffer_data(&self, buffer: &BufferId) -> Option<&[f32]> {
        self.buffers.get(&buffer.0).map(|data| data.as_slice())
    }

    /// Source text of `shader`.
    pub fn shader_text(&self, shader: &ShaderId) -> Option<&str> {
        self.shaders.get(&shader.0).map(|s| s.source.as_str())
    }

    /// The last `vec4` written to uniform `name` of `program`.
    pub fn uniform_value(&self, program: &ProgramId, name: &str) -> Option<[f32; 4]> {
        self.uniform_values
            .get(&(program.0, name.to_owned()))
            .copied()
    }

    /// Active attribute names of `program`, in location order.
    pub fn active_attributes(&self, program: &ProgramId) -> &[String] {
        self.programs
            .get(&program.0)
            .map(|p| p.attributes.as_slice())
            .unwrap_or_default()
    }

    /// Active uniform names of `program`.
    pub fn active_uniforms(&self, program: &ProgramId) -> &[String] {
        self.programs
            .get(&program.0)
            .map(|p| p.uniforms.as_slice())
            .unwrap_or_default()
    }

    fn linked_program(&self, program: &ProgramId) -> Option<&Program> {
        self.programs.get(&program.0).filter(|p| p.linked)
    }
}

/// Names declared by statements like `attribute vec2 pos;` whose first token
/// is one of `qualifiers`. Array suffixes are dropped.
fn declared_names(source: &str, qualifiers: &[&str]) -> Vec<String> {
    let code = source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .map(|line| line.split("//").next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");
    code.split([';', '{', '}'])
        .filter_map(|statement| {
            let statement = statement.trim();
            let statement = match statement.strip_prefix("layout") {
                Some(rest) => rest.split_once(')')?.1,
                None => statement,
            };
            let tokens = statement.split_whitespace().collect::<Vec<_>>();
            let (first, rest) = tokens.split_first()?;
            if !qualifiers.contains(first) || rest.len() < 2 {
                return None;
            }
            let name = rest.last()?.split('[').next()?;
            (!name.is_empty()).then(|| name.to_owned())
        })
        .collect()
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_owned());
    }
}

impl GraphicsApi for HeadlessGl {
    type Shader = ShaderId;
    type Program = ProgramId;
    type Buffer = BufferId;
    type UniformLocation = UniformLocation;

    fn create_shader(&mut self, kind: ShaderKind) -> Option<ShaderId> {
        let id = self.next_id();
        self.shaders.insert(
            id,
            Shader {
                kind,
                source: String::new(),
                compiled: false,
                info_log: String::new(),
            },
        );
        Some(ShaderId(id))
    }

    fn shader_source(&mut self, shader: &ShaderId, source: &str) {
        if let Some(s) = self.shaders.get_mut(&shader.0) {
            s.source = source.to_owned();
        }
    }

    fn compile_shader(&mut self, shader: &ShaderId) {
        let Some(s) = self.shaders.get_mut(&shader.0) else {
            return;
        };
        let error = s
            .source
            .lines()
            .find_map(|line| line.trim().strip_prefix("#error"))
            .map(|message| message.trim().to_owned());
        (s.compiled, s.info_log) = if s.source.trim().is_empty() {
            (false, "empty shader source".to_owned())
        } else if let Some(message) = error {
            (false, message)
        } else {
            (true, String::new())
        };
    }

    fn shader_compile_status(&self, shader: &ShaderId) -> bool {
        self.shaders.get(&shader.0).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: &ShaderId) -> String {
        self.shaders
            .get(&shader.0)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn create_program(&mut self) -> Option<ProgramId> {
        let id = self.next_id();
        self.programs.insert(id, Program::default());
        Some(ProgramId(id))
    }

    fn attach_shader(&mut self, program: &ProgramId, shader: &ShaderId) {
        if let Some(p) = self.programs.get_mut(&program.0) {
            if !p.attached.contains(shader) {
                p.attached.push(*shader);
            }
        }
    }

    fn link_program(&mut self, program: &ProgramId) {
        let Some(p) = self.programs.get(&program.0) else {
            return;
        };
        let compiled = |kind: ShaderKind| {
            p.attached
                .iter()
                .filter_map(|id| self.shaders.get(&id.0))
                .find(|s| s.kind == kind && s.compiled)
        };
        let result = match (compiled(ShaderKind::Vertex), compiled(ShaderKind::Fragment)) {
            (None, _) => Err("no compiled vertex shader attached"),
            (_, None) => Err("no compiled fragment shader attached"),
            (Some(vertex), Some(fragment)) => {
                let mut attributes = Vec::new();
                let mut uniforms = Vec::new();
                for name in declared_names(&vertex.source, &["attribute", "in"]) {
                    push_unique(&mut attributes, &name);
                }
                for source in [&vertex.source, &fragment.source] {
                    for name in declared_names(source, &["uniform"]) {
                        push_unique(&mut uniforms, &name);
                    }
                }
                Ok((attributes, uniforms))
            }
        };

        let Some(p) = self.programs.get_mut(&program.0) else {
            return;
        };
        match result {
            Ok((attributes, uniforms)) => {
                p.link += 1;
                p.linked = true;
                p.info_log.clear();
                p.attributes = attributes;
                p.uniforms = uniforms;
            }
            Err(message) => {
                p.linked = false;
                p.info_log = message.to_owned();
                p.attributes.clear();
                p.uniforms.clear();
            }
        }
    }

    fn program_link_status(&self, program: &ProgramId) -> bool {
        self.programs.get(&program.0).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: &ProgramId) -> String {
        self.programs
            .get(&program.0)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: Option<&ProgramId>) {
        self.current_program = program.map(|p| p.0);
    }

    fn get_attrib_location(&mut self, program: &ProgramId, name: &str) -> i32 {
        self.stats.lookups += 1;
        self.linked_program(program)
            .and_then(|p| p.attributes.iter().position(|a| a == name))
            .map_or(-1, |index| index as i32)
    }

    fn get_uniform_location(&mut self, program: &ProgramId, name: &str) -> Option<UniformLocation> {
        self.stats.lookups += 1;
        let (link, index) = self
            .linked_program(program)
            .and_then(|p| Some((p.link, p.uniforms.iter().position(|u| u == name)?)))?;
        self.next_lookup += 1;
        Some(UniformLocation {
            program: *program,
            link,
            index,
            lookup: self.next_lookup,
        })
    }

    fn uniform4fv(&mut self, location: Option<&UniformLocation>, value: [f32; 4]) {
        let Some(location) = location else {
            return;
        };
        if self.current_program != Some(location.program.0) {
            return;
        }
        let Some(name) = self
            .linked_program(&location.program)
            .filter(|p| p.link == location.link)
            .and_then(|p| p.uniforms.get(location.index))
        else {
            return;
        };
        let key = (location.program.0, name.clone());
        self.uniform_values.insert(key, value);
    }

    fn create_buffer(&mut self) -> Option<BufferId> {
        let id = self.next_id();
        self.buffers.insert(id, Vec::new());
        Some(BufferId(id))
    }

    fn bind_buffer(&mut self, target: u32, buffer: Option<&BufferId>) {
        match buffer {
            Some(buffer) => self.bindings.insert(target, buffer.0),
            None => self.bindings.remove(&target),
        };
    }

    fn buffer_data_f32(&mut self, target: u32, data: &[f32], _usage: u32) {
        let Some(id) = self.bindings.get(&target) else {
            return;
        };
        if let Some(contents) = self.buffers.get_mut(id) {
            contents.clear();
            contents.extend_from_slice(data);
            self.stats.uploads += 1;
        }
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        let layout = AttribLayout {
            size,
            ty,
            normalized,
            stride,
            offset,
        };
        self.attrib_layouts.insert(index, layout);
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.attrib_arrays.insert(index);
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.attrib_arrays.remove(&index);
    }

    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.clear_color = [red, green, blue, alpha];
    }

    fn clear_depth(&mut self, depth: f32) {
        self.pipeline.clear_depth = depth;
    }

    fn clear(&mut self, _mask: u32) {
        self.stats.clears += 1;
    }

    fn enable(&mut self, cap: u32) {
        self.capabilities.insert(cap);
    }

    fn disable(&mut self, cap: u32) {
        self.capabilities.remove(&cap);
    }

    fn depth_func(&mut self, func: u32) {
        self.pipeline.depth_func = func;
    }

    fn cull_face(&mut self, mode: u32) {
        self.pipeline.cull_face = mode;
    }

    fn front_face(&mut self, mode: u32) {
        self.pipeline.front_face = mode;
    }

    fn blend_func(&mut self, sfactor: u32, dfactor: u32) {
        self.pipeline.blend_func = (sfactor, dfactor);
    }

    fn line_width(&mut self, width: f32) {
        self.pipeline.line_width = width;
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.viewport = [x, y, width, height];
    }

    fn draw_arrays(&mut self, _mode: u32, _first: i32, count: i32) {
        self.stats.draw_calls += 1;
        self.stats.vertices += u64::try_from(count).unwrap_or(0);
    }
}
