//! The wgpu implementation of [`Gpu`].
//!
//! wgpu has no current program, no loose uniforms and no texture units, so
//! this backend keeps that state on the CPU:
//!
//! - every program owns a copy of its uniform block; `set_uniform` writes into
//!   it and the values stick until overwritten, like GL uniforms do,
//! - texture uniforms remember the unit they sample, and `bind_texture` fills a
//!   unit table,
//! - a draw snapshots the block and the textures its program samples.
//!
//! `end_frame` then packs every snapshot into one dynamic-offset uniform
//! buffer, builds the texture bind groups, creates any missing pipelines and
//! encodes the recorded passes in order into a single command buffer.

use std::collections::HashMap;
use std::num::NonZeroU64;

use anyhow::{Context as _, Result, bail};
use wgpu::util::DeviceExt;

use super::{
    BufferHandle, BufferUsage, Gpu, Location, PassTarget, ProgramHandle, TextureHandle,
    UniformValue, VertexArrayDesc, VertexArrayHandle,
};
use crate::context::Context;
use crate::data_structures::texture::{self, Texture};
use crate::pipelines::basic::{PassKind, mk_render_pipeline};
use crate::shader::reflect::{ProgramLayout, UniformKind};
use crate::shader::{ShaderError, ShaderSources, ShaderStage};

/// Programs without a uniform block still get a binding this large.
const MIN_BINDING_SIZE: u64 = 16;
const INITIAL_ARENA_SIZE: u64 = 64 * 1024;
const STAGES: wgpu::ShaderStages = wgpu::ShaderStages::VERTEX_FRAGMENT;

struct GpuProgram {
    label: String,
    layout: ProgramLayout,
    vertex: wgpu::ShaderModule,
    fragment: Option<wgpu::ShaderModule>,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    binding_size: u64,
    block: Vec<u8>,
    /// Unit sampled by each texture uniform, by uniform index. Unset means 0.
    units: HashMap<usize, u32>,
}

struct VertexArray {
    label: String,
    vertex_buffer: BufferHandle,
    index_buffer: Option<BufferHandle>,
    stride: u64,
    attributes: Vec<wgpu::VertexAttribute>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Primitive {
    Triangles,
    /// Expanded to a 4 vertex strip per point.
    Points,
}

struct RecordedDraw {
    program: ProgramHandle,
    vertex_array: VertexArrayHandle,
    primitive: Primitive,
    count: u32,
    uniform_offset: u32,
    /// `(binding, is depth, texture)` for each texture the program samples.
    textures: Vec<(u32, bool, Option<TextureHandle>)>,
}

struct RecordedPass {
    target: PassTarget,
    draws: Vec<RecordedDraw>,
}

type PipelineKey = (ProgramHandle, VertexArrayHandle, PassKind, Primitive);

pub struct WgpuGpu {
    ctx: Context,
    clear_colour: wgpu::Color,
    next_id: u32,
    programs: HashMap<ProgramHandle, GpuProgram>,
    buffers: HashMap<BufferHandle, wgpu::Buffer>,
    textures: HashMap<TextureHandle, Texture>,
    vertex_arrays: HashMap<VertexArrayHandle, VertexArray>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    current_program: Option<ProgramHandle>,
    units: HashMap<u32, TextureHandle>,
    frame: Option<wgpu::SurfaceTexture>,
    passes: Vec<RecordedPass>,
    pass_open: bool,
    uniform_data: Vec<u8>,
    uniform_alignment: u64,
    arena: wgpu::Buffer,
    arena_groups: HashMap<ProgramHandle, wgpu::BindGroup>,
    white: Texture,
    cleared_depth: Texture,
    linear_sampler: wgpu::Sampler,
    comparison_sampler: wgpu::Sampler,
}

impl WgpuGpu {
    pub fn new(ctx: Context, clear_colour: [f64; 4]) -> Self {
        let device = &ctx.device;
        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let arena = create_arena(device, INITIAL_ARENA_SIZE);
        let white = Texture::create_solid(device, &ctx.queue, [255; 4], "white");
        let cleared_depth = Texture::create_cleared_depth(device, &ctx.queue);
        let linear_sampler = texture::create_default_sampler(device);
        let comparison_sampler = texture::create_comparison_sampler(device);
        let [r, g, b, a] = clear_colour;
        Self {
            ctx,
            clear_colour: wgpu::Color { r, g, b, a },
            next_id: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            vertex_arrays: HashMap::new(),
            pipelines: HashMap::new(),
            current_program: None,
            units: HashMap::new(),
            frame: None,
            passes: Vec::new(),
            pass_open: false,
            uniform_data: Vec::new(),
            uniform_alignment,
            arena,
            arena_groups: HashMap::new(),
            white,
            cleared_depth,
            linear_sampler,
            comparison_sampler,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn record(&mut self, vertex_array: VertexArrayHandle, primitive: Primitive, count: u32) {
        let Some(handle) = self.current_program else {
            log::warn!("draw without a program in use");
            return;
        };
        let Some(target) = self.passes.last().filter(|_| self.pass_open).map(|p| p.target) else {
            log::warn!("draw outside of a pass");
            return;
        };
        let Some(program) = self.programs.get(&handle) else {
            return;
        };
        if program.fragment.is_none() && target == PassTarget::Screen {
            log::warn!("`{}` has no fragment stage, skipping its colour draw", program.label);
            return;
        }

        let offset = self.uniform_data.len();
        self.uniform_data.extend_from_slice(&program.block);
        self.uniform_data
            .resize(offset + align_to(program.binding_size, self.uniform_alignment) as usize, 0);

        let textures = program
            .layout
            .texture_bindings()
            .map(|(index, binding, depth)| {
                let unit = program.units.get(&index).copied().unwrap_or(0);
                (binding, depth, self.units.get(&unit).copied())
            })
            .collect();

        if let Some(pass) = self.passes.last_mut() {
            pass.draws.push(RecordedDraw {
                program: handle,
                vertex_array,
                primitive,
                count,
                uniform_offset: offset as u32,
                textures,
            });
        }
    }

    fn upload_uniforms(&mut self) {
        let needed = self.uniform_data.len() as u64;
        if needed == 0 {
            return;
        }
        if needed > self.arena.size() {
            let size = needed.next_power_of_two();
            log::info!("growing the uniform arena to {size} bytes");
            self.arena.destroy();
            self.arena = create_arena(&self.ctx.device, size);
            self.arena_groups.clear();
        }
        self.ctx.queue.write_buffer(&self.arena, 0, &self.uniform_data);

        for (handle, program) in &self.programs {
            self.arena_groups.entry(*handle).or_insert_with(|| {
                self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&program.label),
                    layout: &program.uniform_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &self.arena,
                            offset: 0,
                            size: NonZeroU64::new(program.binding_size),
                        }),
                    }],
                })
            });
        }
    }

    fn prepare_pipelines(&mut self, passes: &[RecordedPass]) {
        for pass in passes {
            let kind = pass_kind(pass.target);
            for draw in &pass.draws {
                let key = (draw.program, draw.vertex_array, kind, draw.primitive);
                if self.pipelines.contains_key(&key) {
                    continue;
                }
                let (Some(program), Some(vertex_array)) = (
                    self.programs.get(&draw.program),
                    self.vertex_arrays.get(&draw.vertex_array),
                ) else {
                    continue;
                };
                let (step_mode, topology) = match draw.primitive {
                    Primitive::Triangles => (
                        wgpu::VertexStepMode::Vertex,
                        wgpu::PrimitiveTopology::TriangleList,
                    ),
                    Primitive::Points => (
                        wgpu::VertexStepMode::Instance,
                        wgpu::PrimitiveTopology::TriangleStrip,
                    ),
                };
                let layout = wgpu::VertexBufferLayout {
                    array_stride: vertex_array.stride,
                    step_mode,
                    attributes: &vertex_array.attributes,
                };
                log::info!(
                    "creating {kind:?} pipeline for `{}` on `{}`",
                    program.label,
                    vertex_array.label
                );
                let pipeline = mk_render_pipeline(
                    &self.ctx.device,
                    &format!("{} / {}", program.label, vertex_array.label),
                    &program.pipeline_layout,
                    (&program.vertex, &program.layout.vertex_entry),
                    program
                        .fragment
                        .as_ref()
                        .zip(program.layout.fragment_entry.as_deref()),
                    kind,
                    self.ctx.config.format,
                    &[layout],
                    topology,
                );
                self.pipelines.insert(key, pipeline);
            }
        }
    }

    fn texture_groups(&self, passes: &[RecordedPass]) -> Vec<Vec<Option<wgpu::BindGroup>>> {
        passes
            .iter()
            .map(|pass| {
                pass.draws
                    .iter()
                    .map(|draw| self.texture_group(draw))
                    .collect()
            })
            .collect()
    }

    fn texture_group(&self, draw: &RecordedDraw) -> Option<wgpu::BindGroup> {
        let program = self.programs.get(&draw.program)?;
        let mut entries = Vec::new();
        for (binding, depth, texture) in &draw.textures {
            let fallback = if *depth { &self.cleared_depth } else { &self.white };
            let texture = texture
                .and_then(|t| self.textures.get(&t))
                .filter(|t| t.is_depth() == *depth)
                .unwrap_or(fallback);
            entries.push(wgpu::BindGroupEntry {
                binding: *binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
        }
        for sampler in &program.layout.samplers {
            let resource = if sampler.comparison {
                &self.comparison_sampler
            } else {
                &self.linear_sampler
            };
            entries.push(wgpu::BindGroupEntry {
                binding: sampler.binding,
                resource: wgpu::BindingResource::Sampler(resource),
            });
        }
        Some(self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&program.label),
            layout: &program.texture_layout,
            entries: &entries,
        }))
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame_view: &wgpu::TextureView,
        pass: &RecordedPass,
        groups: &[Option<wgpu::BindGroup>],
    ) {
        let kind = pass_kind(pass.target);
        let (color, depth_view, width, height) = match pass.target {
            PassTarget::Shadow { map, size } => {
                let Some(texture) = self.textures.get(&map) else {
                    log::warn!("shadow pass into a deleted texture");
                    return;
                };
                let width = size.min(texture.texture.width());
                let height = size.min(texture.texture.height());
                (None, &texture.view, width, height)
            }
            PassTarget::Screen => {
                let color = wgpu::RenderPassColorAttachment {
                    view: frame_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                };
                let (width, height) = self.ctx.size();
                (Some(color), &self.ctx.depth_texture.view, width, height)
            }
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> =
            color.into_iter().map(Some).collect();

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(match kind {
                PassKind::Shadow => "shadow pass",
                PassKind::Color => "colour pass",
            }),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);

        for (draw, group) in pass.draws.iter().zip(groups) {
            let key = (draw.program, draw.vertex_array, kind, draw.primitive);
            let (Some(pipeline), Some(uniforms), Some(textures), Some(vertex_array)) = (
                self.pipelines.get(&key),
                self.arena_groups.get(&draw.program),
                group.as_ref(),
                self.vertex_arrays.get(&draw.vertex_array),
            ) else {
                continue;
            };
            let Some(vertex_buffer) = self.buffers.get(&vertex_array.vertex_buffer) else {
                continue;
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
            render_pass.set_bind_group(1, textures, &[]);
            render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            match draw.primitive {
                Primitive::Triangles => {
                    match vertex_array.index_buffer.and_then(|b| self.buffers.get(&b)) {
                        Some(index_buffer) => {
                            render_pass.set_index_buffer(
                                index_buffer.slice(..),
                                wgpu::IndexFormat::Uint16,
                            );
                            render_pass.draw_indexed(0..draw.count, 0, 0..1);
                        }
                        None => render_pass.draw(0..draw.count, 0..1),
                    }
                }
                Primitive::Points => render_pass.draw(0..4, 0..draw.count),
            }
        }
    }
}

impl Gpu for WgpuGpu {
    fn create_program(
        &mut self,
        label: &str,
        sources: &ShaderSources,
    ) -> Result<ProgramHandle, ShaderError> {
        let layout = ProgramLayout::reflect(label, sources)?;
        check_stages(label, sources)?;

        let device = &self.ctx.device;
        let module = |stage: ShaderStage, source: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{label} {stage}")),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };
        let vertex = module(ShaderStage::Vertex, &sources.vertex);
        let fragment = sources
            .fragment
            .as_deref()
            .map(|source| module(ShaderStage::Fragment, source));

        let binding_size = align_to((layout.block_size as u64).max(MIN_BINDING_SIZE), 16);
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: STAGES,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(binding_size),
                },
                count: None,
            }],
        });

        let mut entries: Vec<wgpu::BindGroupLayoutEntry> = layout
            .texture_bindings()
            .map(|(_, binding, depth)| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: STAGES,
                ty: wgpu::BindingType::Texture {
                    sample_type: if depth {
                        wgpu::TextureSampleType::Depth
                    } else {
                        wgpu::TextureSampleType::Float { filterable: true }
                    },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        entries.extend(layout.samplers.iter().map(|sampler| wgpu::BindGroupLayoutEntry {
            binding: sampler.binding,
            visibility: STAGES,
            ty: wgpu::BindingType::Sampler(if sampler.comparison {
                wgpu::SamplerBindingType::Comparison
            } else {
                wgpu::SamplerBindingType::Filtering
            }),
            count: None,
        }));
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            immediate_size: 0,
        });

        let handle = ProgramHandle(self.next_id());
        self.programs.insert(
            handle,
            GpuProgram {
                label: label.to_owned(),
                layout,
                vertex,
                fragment,
                uniform_layout,
                texture_layout,
                pipeline_layout,
                binding_size,
                block: vec![0; binding_size as usize],
                units: HashMap::new(),
            },
        );
        Ok(handle)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Location {
        self.programs
            .get(&program)
            .map_or(Location::UNUSED, |p| Location::from_index(p.layout.uniform_index(name)))
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Location {
        self.programs
            .get(&program)
            .and_then(|p| p.layout.attribute_location(name))
            .map_or(Location::UNUSED, |location| Location(location as i32))
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program).is_none() {
            log::warn!("deleting unknown program {program:?}");
        }
        self.arena_groups.remove(&program);
        self.pipelines.retain(|key, _| key.0 != program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_buffer(&mut self, label: &str, usage: BufferUsage, contents: &[u8]) -> BufferHandle {
        let usage = match usage {
            BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsage::Index => wgpu::BufferUsages::INDEX,
            BufferUsage::Dynamic => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        };
        let buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        let handle = BufferHandle(self.next_id());
        self.buffers.insert(handle, buffer);
        handle
    }

    fn write_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        match self.buffers.get(&buffer) {
            Some(target) if offset + data.len() as u64 <= target.size() => {
                self.ctx.queue.write_buffer(target, offset, data)
            }
            Some(_) => log::warn!("write of {} bytes overruns {buffer:?}", data.len()),
            None => log::warn!("writing to unknown buffer {buffer:?}"),
        }
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        match self.buffers.remove(&buffer) {
            Some(buffer) => buffer.destroy(),
            None => log::warn!("deleting unknown buffer {buffer:?}"),
        }
    }

    fn create_texture(&mut self, label: &str, image: &image::RgbaImage) -> TextureHandle {
        let texture = Texture::from_image(&self.ctx.device, &self.ctx.queue, image, label);
        let handle = TextureHandle(self.next_id());
        self.textures.insert(handle, texture);
        handle
    }

    fn create_depth_texture(&mut self, label: &str, size: u32) -> TextureHandle {
        let texture = Texture::create_depth_texture(&self.ctx.device, [size, size], label);
        let handle = TextureHandle(self.next_id());
        self.textures.insert(handle, texture);
        handle
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        match self.textures.remove(&texture) {
            Some(removed) => removed.texture.destroy(),
            None => log::warn!("deleting unknown texture {texture:?}"),
        }
        self.units.retain(|_, bound| *bound != texture);
    }

    fn create_vertex_array(&mut self, desc: &VertexArrayDesc<'_>) -> VertexArrayHandle {
        let attributes = desc
            .attributes
            .iter()
            .filter(|a| a.location.is_used())
            .filter_map(|a| {
                let format = match a.components {
                    1 => wgpu::VertexFormat::Float32,
                    2 => wgpu::VertexFormat::Float32x2,
                    3 => wgpu::VertexFormat::Float32x3,
                    4 => wgpu::VertexFormat::Float32x4,
                    n => {
                        log::warn!("`{}`: skipping a {n} component attribute", desc.label);
                        return None;
                    }
                };
                Some(wgpu::VertexAttribute {
                    format,
                    offset: a.offset,
                    shader_location: a.location.0 as u32,
                })
            })
            .collect();
        let handle = VertexArrayHandle(self.next_id());
        self.vertex_arrays.insert(
            handle,
            VertexArray {
                label: desc.label.to_owned(),
                vertex_buffer: desc.vertex_buffer,
                index_buffer: desc.index_buffer,
                stride: desc.stride,
                attributes,
            },
        );
        handle
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        if self.vertex_arrays.remove(&vertex_array).is_none() {
            log::warn!("deleting unknown vertex array {vertex_array:?}");
        }
        self.pipelines.retain(|key, _| key.1 != vertex_array);
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.current_program = program;
    }

    fn set_uniform(&mut self, location: Location, value: UniformValue) {
        let Some(index) = location.index() else {
            return;
        };
        let Some(program) = self
            .current_program
            .and_then(|handle| self.programs.get_mut(&handle))
        else {
            log::warn!("uniform write without a program in use");
            return;
        };
        let Some(kind) = program.layout.uniforms.get(index).map(|u| u.kind) else {
            log::warn!("`{}` has no uniform {index}", program.label);
            return;
        };
        match (kind, value) {
            (UniformKind::Texture { .. }, UniformValue::Int(unit)) => match u32::try_from(unit) {
                Ok(unit) => {
                    program.units.insert(index, unit);
                }
                Err(_) => log::warn!("`{}`: negative texture unit {unit}", program.label),
            },
            (UniformKind::Block { offset, size }, value) => {
                let bytes = value.to_bytes();
                if bytes.len() != size as usize {
                    log::warn!(
                        "`{}`: {value:?} doesn't fit the {size} byte uniform {}",
                        program.label,
                        program.layout.uniforms[index].name
                    );
                    return;
                }
                let start = offset as usize;
                program.block[start..start + bytes.len()].copy_from_slice(&bytes);
            }
            (UniformKind::Texture { .. }, value) => {
                log::warn!("`{}`: texture uniforms take a unit, not {value:?}", program.label)
            }
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.units.insert(unit, texture);
    }

    fn draw_elements(&mut self, vertex_array: VertexArrayHandle, index_count: u32) {
        self.record(vertex_array, Primitive::Triangles, index_count);
    }

    fn draw_points(&mut self, vertex_array: VertexArrayHandle, count: u32) {
        self.record(vertex_array, Primitive::Points, count);
    }

    fn begin_frame(&mut self) -> Result<()> {
        self.passes.clear();
        self.uniform_data.clear();
        self.pass_open = false;
        let frame = match self.ctx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.ctx.reconfigure();
                bail!("the surface was lost or outdated and has been reconfigured");
            }
            Err(e) => return Err(e).context("acquiring the next frame"),
        };
        self.frame = Some(frame);
        Ok(())
    }

    fn begin_pass(&mut self, target: PassTarget) {
        if self.pass_open {
            log::warn!("beginning a pass inside another one");
        }
        self.passes.push(RecordedPass {
            target,
            draws: Vec::new(),
        });
        self.pass_open = true;
    }

    fn end_pass(&mut self) {
        self.pass_open = false;
    }

    fn end_frame(&mut self) -> Result<()> {
        let frame = self.frame.take().context("end_frame without begin_frame")?;
        let passes = std::mem::take(&mut self.passes);
        self.pass_open = false;

        self.upload_uniforms();
        self.prepare_pipelines(&passes);
        let groups = self.texture_groups(&passes);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        for (pass, groups) in passes.iter().zip(&groups) {
            self.encode_pass(&mut encoder, &view, pass, groups);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.uniform_data.clear();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }
}

/// wgpu has no geometry stage; a program that ships one can't be linked here.
fn check_stages(label: &str, sources: &ShaderSources) -> Result<(), ShaderError> {
    if sources.geometry.is_some() {
        return Err(ShaderError::UnsupportedStage {
            label: label.to_owned(),
            stage: ShaderStage::Geometry,
        });
    }
    Ok(())
}

fn pass_kind(target: PassTarget) -> PassKind {
    match target {
        PassTarget::Shadow { .. } => PassKind::Shadow,
        PassTarget::Screen => PassKind::Color,
    }
}

fn create_arena(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("uniform arena"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn align_to(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}
