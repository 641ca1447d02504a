//! The device seam.
//!
//! Everything above this module talks to the GPU through the [`Gpu`] trait: a
//! small, GL-flavoured state machine with named uniform and attribute
//! locations, numbered texture units and a current program. Handles are plain
//! `Copy` ids; whoever creates a resource owns it and must hand it back through
//! the matching `delete_*` call exactly once.
//!
//! [`WgpuGpu`](wgpu_gpu::WgpuGpu) is the production implementation. Tests plug
//! in a recording implementation instead.

use cgmath::{Matrix4, Vector3};

use crate::shader::{ShaderError, ShaderSources};

pub mod wgpu_gpu;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

handle!(
    /// A linked shader program.
    ProgramHandle
);
handle!(
    /// A vertex, index or dynamic buffer.
    BufferHandle
);
handle!(
    /// A 2D colour texture or a depth texture.
    TextureHandle
);
handle!(
    /// A vertex layout bound to a vertex buffer and an optional index buffer.
    VertexArrayHandle
);

/// A uniform or attribute slot inside a program. `-1` means the program does
/// not declare the name; writes to it are silently dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location(pub i32);

impl Location {
    pub const UNUSED: Location = Location(-1);

    pub fn from_index(index: Option<usize>) -> Self {
        index
            .and_then(|i| i32::try_from(i).ok())
            .map_or(Self::UNUSED, Location)
    }

    pub fn is_used(self) -> bool {
        self.0 >= 0
    }

    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::UNUSED
    }
}

/// A value written to a uniform location.
///
/// Texture uniforms take an [`Int`](UniformValue::Int) holding the texture
/// unit they sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    /// Native-endian bytes as laid out in a WGSL uniform block.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Int(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Float(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec3(v) => bytemuck::cast_slice(v).to_vec(),
            UniformValue::Mat4(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(m: Matrix4<f32>) -> Self {
        UniformValue::Mat4(m.into())
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(v: Vector3<f32>) -> Self {
        UniformValue::Vec3(v.into())
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    /// 16-bit indices.
    Index,
    /// A vertex buffer rewritten from the CPU every frame.
    Dynamic,
}

/// One float attribute inside an interleaved vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: Location,
    /// Number of `f32` components (1 to 4).
    pub components: u32,
    /// Byte offset inside the vertex.
    pub offset: u64,
}

#[derive(Clone, Debug)]
pub struct VertexArrayDesc<'a> {
    pub label: &'a str,
    pub vertex_buffer: BufferHandle,
    pub index_buffer: Option<BufferHandle>,
    /// Bytes per vertex.
    pub stride: u64,
    /// Attributes with an unused location are skipped.
    pub attributes: &'a [VertexAttribute],
}

/// Where the draws between `begin_pass` and `end_pass` land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassTarget {
    /// Depth-only render into a square depth texture; clears depth to 1.0 and
    /// sets the viewport to the texture size.
    Shadow { map: TextureHandle, size: u32 },
    /// The window; clears colour and depth and sets the viewport to the
    /// window size.
    Screen,
}

pub trait Gpu {
    /// Compiles and links a program. Failures are fatal setup errors.
    fn create_program(
        &mut self,
        label: &str,
        sources: &ShaderSources,
    ) -> Result<ProgramHandle, ShaderError>;
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Location;
    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Location;
    fn delete_program(&mut self, program: ProgramHandle);

    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> BufferHandle;
    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]);
    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn create_texture(&mut self, label: &str, image: &image::RgbaImage) -> TextureHandle;
    fn create_depth_texture(&mut self, label: &str, size: u32) -> TextureHandle;
    fn delete_texture(&mut self, texture: TextureHandle);

    fn create_vertex_array(&mut self, desc: &VertexArrayDesc<'_>) -> VertexArrayHandle;
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    /// `None` restores the no-program state.
    fn use_program(&mut self, program: Option<ProgramHandle>);
    /// Writes into the current program. A no-op for [`Location::UNUSED`] or
    /// when no program is in use.
    fn set_uniform(&mut self, location: Location, value: UniformValue);
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    /// Indexed triangle list.
    fn draw_elements(&mut self, vertex_array: VertexArrayHandle, index_count: u32);
    /// One screen-facing sprite per point.
    fn draw_points(&mut self, vertex_array: VertexArrayHandle, count: u32);

    fn begin_frame(&mut self) -> anyhow::Result<()>;
    fn begin_pass(&mut self, target: PassTarget);
    fn end_pass(&mut self);
    /// Submits everything recorded since `begin_frame` and presents.
    fn end_frame(&mut self) -> anyhow::Result<()>;

    fn resize(&mut self, width: u32, height: u32);
}
