//! Program reflection.
//!
//! Every stage is parsed and validated with naga, then the globals and the
//! vertex entry point are read back into a [`ProgramLayout`]:
//!
//! - members of the `var<uniform>` bound at `@group(0) @binding(0)` become
//!   block uniforms at their WGSL offsets,
//! - texture globals in `@group(1)` become texture uniforms whose value is the
//!   unit they sample, samplers in `@group(1)` are collected separately,
//! - `@location(n)` inputs of the `@vertex` entry point become attributes.
//!
//! A uniform location is the index of the name in [`ProgramLayout::uniforms`];
//! an attribute location is its `@location`.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, ImageClass, Module, TypeInner};

use super::{ShaderError, ShaderSources, ShaderStage};

pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Block { offset: u32, size: u32 },
    Texture { binding: u32, depth: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub kind: UniformKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplerSlot {
    pub binding: u32,
    pub comparison: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSlot {
    pub name: String,
    pub location: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramLayout {
    pub uniforms: Vec<UniformSlot>,
    pub samplers: Vec<SamplerSlot>,
    pub attributes: Vec<AttributeSlot>,
    /// Size in bytes of the largest uniform block declared by any stage.
    pub block_size: u32,
    pub vertex_entry: String,
    pub fragment_entry: Option<String>,
}

impl ProgramLayout {
    pub fn reflect(label: &str, sources: &ShaderSources) -> Result<Self, ShaderError> {
        let vertex = parse(label, ShaderStage::Vertex, &sources.vertex)?;
        if let Some(geometry) = &sources.geometry {
            parse(label, ShaderStage::Geometry, geometry)?;
        }
        let fragment = sources
            .fragment
            .as_deref()
            .map(|source| parse(label, ShaderStage::Fragment, source))
            .transpose()?;

        let mut layout = ProgramLayout::default();

        let entry = entry_point(&vertex, naga::ShaderStage::Vertex)
            .ok_or_else(|| link_error(label, "the vertex stage has no @vertex entry point"))?;
        layout.vertex_entry = entry.name.clone();
        layout.attributes = vertex_inputs(&vertex, entry);
        layout.merge_globals(label, &vertex)?;

        if let Some(fragment) = &fragment {
            let entry = entry_point(fragment, naga::ShaderStage::Fragment).ok_or_else(|| {
                link_error(label, "the fragment stage has no @fragment entry point")
            })?;
            layout.fragment_entry = Some(entry.name.clone());
            layout.merge_globals(label, fragment)?;
        }

        for sampler in &layout.samplers {
            if layout.texture_bindings().any(|(_, binding, _)| binding == sampler.binding) {
                return Err(link_error(
                    label,
                    format!(
                        "binding {} of group {TEXTURE_GROUP} holds both a texture and a sampler",
                        sampler.binding
                    ),
                ));
            }
        }

        Ok(layout)
    }

    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|u| u.name == name)
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
    }

    /// `(uniform index, binding, is depth)` of every texture uniform.
    pub fn texture_bindings(&self) -> impl Iterator<Item = (usize, u32, bool)> + '_ {
        self.uniforms
            .iter()
            .enumerate()
            .filter_map(|(index, u)| match u.kind {
                UniformKind::Texture { binding, depth } => Some((index, binding, depth)),
                UniformKind::Block { .. } => None,
            })
    }

    fn merge_globals(&mut self, label: &str, module: &Module) -> Result<(), ShaderError> {
        for (_, var) in module.global_variables.iter() {
            let Some(binding) = &var.binding else {
                continue;
            };
            let inner = &module.types[var.ty].inner;
            match var.space {
                AddressSpace::Uniform
                    if binding.group == UNIFORM_GROUP && binding.binding == UNIFORM_BINDING =>
                {
                    if let TypeInner::Struct { members, span } = inner {
                        self.block_size = self.block_size.max(*span);
                        for member in members {
                            let Some(name) = &member.name else {
                                continue;
                            };
                            let size = module.types[member.ty].inner.size(module.to_ctx());
                            self.add_uniform(
                                label,
                                name,
                                UniformKind::Block {
                                    offset: member.offset,
                                    size,
                                },
                            )?;
                        }
                    } else if let Some(name) = &var.name {
                        let size = inner.size(module.to_ctx());
                        self.block_size = self.block_size.max(size);
                        self.add_uniform(label, name, UniformKind::Block { offset: 0, size })?;
                    }
                }
                AddressSpace::Handle if binding.group == TEXTURE_GROUP => match inner {
                    TypeInner::Image { class, .. } => {
                        if let Some(name) = &var.name {
                            let depth = matches!(class, ImageClass::Depth { .. });
                            let kind = UniformKind::Texture {
                                binding: binding.binding,
                                depth,
                            };
                            self.add_uniform(label, name, kind)?;
                        }
                    }
                    TypeInner::Sampler { comparison } => self.add_sampler(
                        label,
                        SamplerSlot {
                            binding: binding.binding,
                            comparison: *comparison,
                        },
                    )?,
                    _ => log::warn!(
                        "`{label}`: ignoring unsupported resource {:?} in group {TEXTURE_GROUP}",
                        var.name
                    ),
                },
                _ => {}
            }
        }
        Ok(())
    }

    fn add_uniform(
        &mut self,
        label: &str,
        name: &str,
        kind: UniformKind,
    ) -> Result<(), ShaderError> {
        if let Some(existing) = self.uniforms.iter().find(|u| u.name == name) {
            if existing.kind == kind {
                return Ok(());
            }
            return Err(link_error(
                label,
                format!(
                    "`{name}` is declared as {:?} in one stage and {kind:?} in another",
                    existing.kind
                ),
            ));
        }
        // Every stage reads the same block, so members must not alias.
        if let UniformKind::Block { offset, size } = kind {
            let overlaps = |u: &&UniformSlot| match u.kind {
                UniformKind::Block {
                    offset: other,
                    size: other_size,
                } => offset < other + other_size && other < offset + size,
                UniformKind::Texture { .. } => false,
            };
            if let Some(clash) = self.uniforms.iter().find(overlaps) {
                return Err(link_error(
                    label,
                    format!(
                        "`{name}` (bytes {offset}..{}) overlaps `{}` in the uniform block",
                        offset + size,
                        clash.name
                    ),
                ));
            }
        }
        if let UniformKind::Texture { binding, .. } = kind {
            if let Some(clash) = self
                .uniforms
                .iter()
                .find(|u| matches!(u.kind, UniformKind::Texture { binding: b, .. } if b == binding))
            {
                return Err(link_error(
                    label,
                    format!("`{name}` and `{}` share texture binding {binding}", clash.name),
                ));
            }
        }
        self.uniforms.push(UniformSlot {
            name: name.to_owned(),
            kind,
        });
        Ok(())
    }

    fn add_sampler(&mut self, label: &str, sampler: SamplerSlot) -> Result<(), ShaderError> {
        match self.samplers.iter().find(|s| s.binding == sampler.binding) {
            Some(existing) if *existing == sampler => Ok(()),
            Some(_) => Err(link_error(
                label,
                format!(
                    "sampler binding {} is declared with different comparison modes",
                    sampler.binding
                ),
            )),
            None => {
                self.samplers.push(sampler);
                Ok(())
            }
        }
    }
}

fn parse(label: &str, stage: ShaderStage, source: &str) -> Result<Module, ShaderError> {
    let compile_error = |log: String| ShaderError::Compile {
        label: label.to_owned(),
        stage,
        log,
    };
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_error(e.into_inner().to_string()))?;
    Ok(module)
}

fn entry_point(module: &Module, stage: naga::ShaderStage) -> Option<&naga::EntryPoint> {
    module.entry_points.iter().find(|e| e.stage == stage)
}

fn vertex_inputs(module: &Module, entry: &naga::EntryPoint) -> Vec<AttributeSlot> {
    let mut inputs = Vec::new();
    let mut push = |binding: &Option<Binding>, name: &Option<String>| {
        if let (Some(Binding::Location { location, .. }), Some(name)) = (binding, name) {
            inputs.push(AttributeSlot {
                name: name.clone(),
                location: *location,
            });
        }
    };
    for argument in &entry.function.arguments {
        if argument.binding.is_some() {
            push(&argument.binding, &argument.name);
        } else if let TypeInner::Struct { members, .. } = &module.types[argument.ty].inner {
            for member in members {
                push(&member.binding, &member.name);
            }
        }
    }
    inputs
}

fn link_error(label: &str, reason: impl Into<String>) -> ShaderError {
    ShaderError::Link {
        label: label.to_owned(),
        reason: reason.into(),
    }
}
