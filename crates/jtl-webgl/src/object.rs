use crate::GraphicsApi;
use jtl::{BridgeError, Handle, HandleTable, Result};
use std::fmt;

/// A host object stored behind a guest handle.
///
/// All graphics objects share one table, so a handle to a shader passed where
/// a program is expected resolves fine but fails with
/// [`BridgeError::WrongKind`].
pub enum GlObject<G: GraphicsApi> {
    /// A shader object.
    Shader(G::Shader),
    /// A program object.
    Program(G::Program),
    /// A buffer object.
    Buffer(G::Buffer),
    /// The result of a uniform lookup; `None` when the name is not active.
    UniformLocation(Option<G::UniformLocation>),
    /// The raw result of an attribute lookup; `-1` when the name is not
    /// active.
    AttribLocation(i32),
}

impl<G: GraphicsApi> GlObject<G> {
    /// Name of this object's kind, as used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GlObject::Shader(_) => "shader",
            GlObject::Program(_) => "program",
            GlObject::Buffer(_) => "buffer",
            GlObject::UniformLocation(_) => "uniform location",
            GlObject::AttribLocation(_) => "attribute location",
        }
    }
}

impl<G: GraphicsApi> fmt::Debug for GlObject<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlObject::Shader(s) => f.debug_tuple("Shader").field(s).finish(),
            GlObject::Program(p) => f.debug_tuple("Program").field(p).finish(),
            GlObject::Buffer(b) => f.debug_tuple("Buffer").field(b).finish(),
            GlObject::UniformLocation(u) => f.debug_tuple("UniformLocation").field(u).finish(),
            GlObject::AttribLocation(a) => f.debug_tuple("AttribLocation").field(a).finish(),
        }
    }
}

macro_rules! accessor {
    ($(#[$attr:meta])* $name:ident -> $ret:ty, $expected:literal, $pat:pat => $out:expr) => {
        $(#[$attr])*
        pub fn $name(&self, raw: i32) -> Result<$ret> {
            let handle = Handle::try_from(raw)?;
            match self.table.resolve(handle)? {
                $pat => Ok($out),
                other => Err(BridgeError::WrongKind {
                    handle,
                    expected: $expected,
                    found: other.kind(),
                }),
            }
        }
    };
}

/// The handle table of a graphics context, with typed accessors.
pub struct Objects<G: GraphicsApi> {
    table: HandleTable<GlObject<G>>,
}

impl<G: GraphicsApi> Default for Objects<G> {
    fn default() -> Self {
        Self {
            table: HandleTable::new(),
        }
    }
}

impl<G: GraphicsApi> Objects<G> {
    /// Registers `object` and returns its handle.
    pub fn create(&mut self, object: GlObject<G>) -> Handle {
        let kind = object.kind();
        let handle = self.table.create(object);
        tracing::debug!(%handle, kind, "registered graphics object");
        handle
    }

    /// Resolves a raw guest handle to whatever object it names.
    pub fn get(&self, raw: i32) -> Result<&GlObject<G>> {
        self.table.resolve_guest(raw)
    }

    /// Number of handles issued.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no handle has been issued.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    accessor!(
        /// Resolves a shader handle.
        shader -> &G::Shader, "shader", GlObject::Shader(s) => s
    );
    accessor!(
        /// Resolves a program handle.
        program -> &G::Program, "program", GlObject::Program(p) => p
    );
    accessor!(
        /// Resolves a buffer handle.
        buffer -> &G::Buffer, "buffer", GlObject::Buffer(b) => b
    );
    accessor!(
        /// Resolves a uniform location handle.
        uniform -> Option<&G::UniformLocation>, "uniform location",
        GlObject::UniformLocation(u) => u.as_ref()
    );
    accessor!(
        /// Resolves an attribute location handle to the host's raw value.
        attrib -> i32, "attribute location", GlObject::AttribLocation(a) => *a
    );
}

impl<G: GraphicsApi> fmt::Debug for Objects<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}
