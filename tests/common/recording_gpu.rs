use std::collections::{HashMap, HashSet};

use shading_sandbox::gpu::{
    BufferHandle, BufferUsage, Gpu, Location, PassTarget, ProgramHandle, TextureHandle,
    UniformValue, VertexArrayDesc, VertexArrayHandle, VertexAttribute,
};
use shading_sandbox::shader::reflect::ProgramLayout;
use shading_sandbox::shader::{ShaderError, ShaderSources};

/// Everything a [`RecordingGpu`] was asked to do, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateProgram(ProgramHandle, String),
    DeleteProgram(ProgramHandle),
    CreateBuffer(BufferHandle, BufferUsage, usize),
    WriteBuffer(BufferHandle, u64, usize),
    DeleteBuffer(BufferHandle),
    CreateTexture(TextureHandle),
    CreateDepthTexture(TextureHandle, u32),
    DeleteTexture(TextureHandle),
    CreateVertexArray(VertexArrayHandle, Vec<VertexAttribute>),
    DeleteVertexArray(VertexArrayHandle),
    UseProgram(Option<ProgramHandle>),
    /// Only writes that reach a declared uniform are recorded.
    SetUniform {
        program: ProgramHandle,
        name: String,
        value: UniformValue,
    },
    BindTexture(u32, TextureHandle),
    DrawElements {
        program: ProgramHandle,
        vertex_array: VertexArrayHandle,
        count: u32,
    },
    DrawPoints {
        program: ProgramHandle,
        vertex_array: VertexArrayHandle,
        count: u32,
    },
    BeginFrame,
    BeginPass(PassTarget),
    EndPass,
    EndFrame,
    Resize(u32, u32),
}

/// A [`Gpu`] that reflects programs like the real backend but only logs what
/// it is asked to do. Deleting anything twice, or anything it never handed
/// out, panics.
#[derive(Default)]
pub struct RecordingGpu {
    pub calls: Vec<Call>,
    next_id: u32,
    programs: HashMap<ProgramHandle, ProgramLayout>,
    current: Option<ProgramHandle>,
    buffers: HashSet<BufferHandle>,
    textures: HashSet<TextureHandle>,
    vertex_arrays: HashSet<VertexArrayHandle>,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Resources created and not deleted yet.
    pub fn live_resources(&self) -> usize {
        self.programs.len() + self.buffers.len() + self.textures.len() + self.vertex_arrays.len()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// The calls of every pass recorded so far, with its target.
    pub fn passes(&self) -> Vec<(PassTarget, Vec<Call>)> {
        let mut passes = Vec::new();
        let mut open: Option<(PassTarget, Vec<Call>)> = None;
        for call in &self.calls {
            match call {
                Call::BeginPass(target) => open = Some((*target, Vec::new())),
                Call::EndPass => passes.extend(open.take()),
                other => {
                    if let Some((_, calls)) = &mut open {
                        calls.push(other.clone());
                    }
                }
            }
        }
        passes
    }

    /// Names of the uniforms written anywhere in the recorded calls.
    pub fn uniform_writes(calls: &[Call]) -> Vec<(ProgramHandle, String, UniformValue)> {
        calls
            .iter()
            .filter_map(|call| match call {
                Call::SetUniform {
                    program,
                    name,
                    value,
                } => Some((*program, name.clone(), *value)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }
}

impl Gpu for RecordingGpu {
    fn create_program(
        &mut self,
        label: &str,
        sources: &ShaderSources,
    ) -> Result<ProgramHandle, ShaderError> {
        let layout = ProgramLayout::reflect(label, sources)?;
        let handle = ProgramHandle(self.next_id());
        self.programs.insert(handle, layout);
        self.calls.push(Call::CreateProgram(handle, label.to_owned()));
        Ok(handle)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Location {
        self.programs
            .get(&program)
            .map_or(Location::UNUSED, |l| Location::from_index(l.uniform_index(name)))
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Location {
        self.programs
            .get(&program)
            .and_then(|l| l.attribute_location(name))
            .map_or(Location::UNUSED, |l| Location(l as i32))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        assert!(self.programs.remove(&program).is_some(), "{program:?} deleted twice");
        self.calls.push(Call::DeleteProgram(program));
    }

    fn create_buffer(&mut self, _label: &str, usage: BufferUsage, contents: &[u8]) -> BufferHandle {
        let handle = BufferHandle(self.next_id());
        self.buffers.insert(handle);
        self.calls.push(Call::CreateBuffer(handle, usage, contents.len()));
        handle
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        assert!(self.buffers.contains(&buffer), "write to dead {buffer:?}");
        self.calls.push(Call::WriteBuffer(buffer, offset, data.len()));
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        assert!(self.buffers.remove(&buffer), "{buffer:?} deleted twice");
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn create_texture(&mut self, _label: &str, _image: &image::RgbaImage) -> TextureHandle {
        let handle = TextureHandle(self.next_id());
        self.textures.insert(handle);
        self.calls.push(Call::CreateTexture(handle));
        handle
    }

    fn create_depth_texture(&mut self, _label: &str, size: u32) -> TextureHandle {
        let handle = TextureHandle(self.next_id());
        self.textures.insert(handle);
        self.calls.push(Call::CreateDepthTexture(handle, size));
        handle
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        assert!(self.textures.remove(&texture), "{texture:?} deleted twice");
        self.calls.push(Call::DeleteTexture(texture));
    }

    fn create_vertex_array(&mut self, desc: &VertexArrayDesc<'_>) -> VertexArrayHandle {
        assert!(self.buffers.contains(&desc.vertex_buffer));
        let handle = VertexArrayHandle(self.next_id());
        self.vertex_arrays.insert(handle);
        self.calls
            .push(Call::CreateVertexArray(handle, desc.attributes.to_vec()));
        handle
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        assert!(
            self.vertex_arrays.remove(&vertex_array),
            "{vertex_array:?} deleted twice"
        );
        self.calls.push(Call::DeleteVertexArray(vertex_array));
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.current = program;
        self.calls.push(Call::UseProgram(program));
    }

    fn set_uniform(&mut self, location: Location, value: UniformValue) {
        let (Some(index), Some(program)) = (location.index(), self.current) else {
            return;
        };
        let name = self.programs[&program].uniforms[index].name.clone();
        self.calls.push(Call::SetUniform {
            program,
            name,
            value,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        assert!(self.textures.contains(&texture), "binding dead {texture:?}");
        self.calls.push(Call::BindTexture(unit, texture));
    }

    fn draw_elements(&mut self, vertex_array: VertexArrayHandle, index_count: u32) {
        let program = self.current.expect("draw without a program");
        self.calls.push(Call::DrawElements {
            program,
            vertex_array,
            count: index_count,
        });
    }

    fn draw_points(&mut self, vertex_array: VertexArrayHandle, count: u32) {
        let program = self.current.expect("draw without a program");
        self.calls.push(Call::DrawPoints {
            program,
            vertex_array,
            count,
        });
    }

    fn begin_frame(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::BeginFrame);
        Ok(())
    }

    fn begin_pass(&mut self, target: PassTarget) {
        self.calls.push(Call::BeginPass(target));
    }

    fn end_pass(&mut self) {
        self.calls.push(Call::EndPass);
    }

    fn end_frame(&mut self) -> anyhow::Result<()> {
        self.calls.push(Call::EndFrame);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(Call::Resize(width, height));
    }
}
