//! Shader programs.
//!
//! A [`ShaderProgram`] is a linked program on some [`Gpu`] plus every uniform
//! and attribute location the rest of the crate writes to, resolved once by
//! name right after linking. Names the program doesn't declare resolve to
//! [`Location::UNUSED`], so binding code never has to care which shader it is
//! talking to.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::data_structures::material::TextureSlot;
use crate::gpu::{Gpu, Location, ProgramHandle};

pub mod reflect;

/// Uniform names shared by every program.
pub mod names {
    pub const MODEL_MATRIX: &str = "model_matrix";
    pub const MVP_MATRIX: &str = "mvp_matrix";
    pub const DIFFUSE_MAP: &str = "diffuse_map";
    pub const SPECULAR_MAP: &str = "specular_map";
    pub const NORMAL_MAP: &str = "normal_map";
    pub const HEIGHT_MAP: &str = "height_map";
    pub const SHADOW_MAP: &str = "shadow_map";
    pub const SHADOW_BIAS: &str = "shadow_bias";
    pub const LIGHT_POSITION: &str = "light_position";
    pub const LIGHT_MATRIX: &str = "light_matrix";

    pub const VERTEX_POSITION: &str = "vertex_position";
    pub const VERTEX_NORMAL: &str = "vertex_normal";
    pub const VERTEX_TANGENT: &str = "vertex_tangent";
    pub const VERTEX_BITANGENT: &str = "vertex_bitangent";
    pub const VERTEX_COLOR: &str = "vertex_color";
    pub const VERTEX_TEXCOORD: &str = "vertex_texcoord";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl ShaderStage {
    /// File extension used for the stage's source file.
    pub fn extension(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::Geometry => "geom",
            ShaderStage::Fragment => "frag",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("could not read the {stage} stage source {path}")]
    Io {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("the {stage} stage of `{label}` failed to compile:\n{log}")]
    Compile {
        label: String,
        stage: ShaderStage,
        log: String,
    },
    #[error("`{label}` failed to link: {reason}")]
    Link { label: String, reason: String },
    #[error("`{label}` has a {stage} stage, which this device cannot run")]
    UnsupportedStage { label: String, stage: ShaderStage },
}

/// The stage sources of one program, all WGSL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub geometry: Option<String>,
    pub fragment: Option<String>,
}

impl ShaderSources {
    /// Reads `<name>.vert`, `<name>.geom` and `<name>.frag` from `dir`.
    ///
    /// The geometry stage is optional; a missing vertex or fragment file is an
    /// error.
    pub fn load(dir: impl AsRef<Path>, name: &str) -> Result<Self, ShaderError> {
        let dir = dir.as_ref();
        let vertex = read_stage(dir, name, ShaderStage::Vertex)?;
        let geometry = match read_stage(dir, name, ShaderStage::Geometry) {
            Ok(source) => Some(source),
            Err(ShaderError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                None
            }
            Err(e) => return Err(e),
        };
        let fragment = read_stage(dir, name, ShaderStage::Fragment)?;
        Ok(Self {
            vertex,
            geometry,
            fragment: Some(fragment),
        })
    }
}

fn read_stage(dir: &Path, name: &str, stage: ShaderStage) -> Result<String, ShaderError> {
    let path = dir.join(format!("{name}.{}", stage.extension()));
    std::fs::read_to_string(&path).map_err(|source| ShaderError::Io {
        stage,
        path,
        source,
    })
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UniformLocations {
    pub model_matrix: Location,
    pub mvp_matrix: Location,
    pub diffuse_map: Location,
    pub specular_map: Location,
    pub normal_map: Location,
    pub height_map: Location,
    pub shadow_map: Location,
    pub shadow_bias: Location,
    pub light_position: Location,
    pub light_matrix: Location,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttributeLocations {
    pub position: Location,
    pub normal: Location,
    pub tangent: Location,
    pub bitangent: Location,
    pub color: Location,
    pub texcoord: Location,
}

#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    handle: ProgramHandle,
    pub uniforms: UniformLocations,
    pub attributes: AttributeLocations,
}

impl ShaderProgram {
    /// Compiles and links `sources`, then resolves every known location.
    pub fn compile(
        gpu: &mut dyn Gpu,
        label: &str,
        sources: &ShaderSources,
    ) -> Result<Self, ShaderError> {
        let handle = gpu.create_program(label, sources)?;
        let uniform = |name| gpu.uniform_location(handle, name);
        let uniforms = UniformLocations {
            model_matrix: uniform(names::MODEL_MATRIX),
            mvp_matrix: uniform(names::MVP_MATRIX),
            diffuse_map: uniform(names::DIFFUSE_MAP),
            specular_map: uniform(names::SPECULAR_MAP),
            normal_map: uniform(names::NORMAL_MAP),
            height_map: uniform(names::HEIGHT_MAP),
            shadow_map: uniform(names::SHADOW_MAP),
            shadow_bias: uniform(names::SHADOW_BIAS),
            light_position: uniform(names::LIGHT_POSITION),
            light_matrix: uniform(names::LIGHT_MATRIX),
        };
        let attribute = |name| gpu.attribute_location(handle, name);
        let attributes = AttributeLocations {
            position: attribute(names::VERTEX_POSITION),
            normal: attribute(names::VERTEX_NORMAL),
            tangent: attribute(names::VERTEX_TANGENT),
            bitangent: attribute(names::VERTEX_BITANGENT),
            color: attribute(names::VERTEX_COLOR),
            texcoord: attribute(names::VERTEX_TEXCOORD),
        };
        log::info!("linked shader program `{label}`");
        Ok(Self {
            label: label.to_owned(),
            handle,
            uniforms,
            attributes,
        })
    }

    /// Loads `<name>.*` from `dir` and compiles it under that name.
    pub fn load(gpu: &mut dyn Gpu, dir: impl AsRef<Path>, name: &str) -> Result<Self, ShaderError> {
        let sources = ShaderSources::load(dir, name)?;
        Self::compile(gpu, name, &sources)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// The sampler uniform fed by a material texture slot.
    pub fn texture_location(&self, slot: TextureSlot) -> Location {
        match slot {
            TextureSlot::Diffuse => self.uniforms.diffuse_map,
            TextureSlot::Specular => self.uniforms.specular_map,
            TextureSlot::Normal => self.uniforms.normal_map,
            TextureSlot::Height => self.uniforms.height_map,
        }
    }

    /// Releases the program and its stage modules.
    pub fn unload(self, gpu: &mut dyn Gpu) {
        gpu.delete_program(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "shading-sandbox-shader-{tag}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_geometry_stage_is_tolerated() {
        let dir = scratch_dir("nogeom");
        std::fs::write(dir.join("flat.vert"), "// vertex").unwrap();
        std::fs::write(dir.join("flat.frag"), "// fragment").unwrap();

        let sources = ShaderSources::load(&dir, "flat").unwrap();
        assert_eq!(sources.vertex, "// vertex");
        assert_eq!(sources.geometry, None);
        assert_eq!(sources.fragment.as_deref(), Some("// fragment"));
    }

    #[test]
    fn present_geometry_stage_is_loaded() {
        let dir = scratch_dir("geom");
        std::fs::write(dir.join("spiky.vert"), "// vertex").unwrap();
        std::fs::write(dir.join("spiky.geom"), "// geometry").unwrap();
        std::fs::write(dir.join("spiky.frag"), "// fragment").unwrap();

        let sources = ShaderSources::load(&dir, "spiky").unwrap();
        assert_eq!(sources.geometry.as_deref(), Some("// geometry"));
    }

    #[test]
    fn missing_fragment_stage_is_fatal() {
        let dir = scratch_dir("nofrag");
        std::fs::write(dir.join("flat.vert"), "// vertex").unwrap();

        match ShaderSources::load(&dir, "flat") {
            Err(ShaderError::Io { stage, .. }) => assert_eq!(stage, ShaderStage::Fragment),
            other => panic!("expected a fragment io error, got {other:?}"),
        }
    }

    #[test]
    fn missing_vertex_stage_is_fatal() {
        let dir = scratch_dir("novert");
        match ShaderSources::load(&dir, "absent") {
            Err(ShaderError::Io { stage, .. }) => assert_eq!(stage, ShaderStage::Vertex),
            other => panic!("expected a vertex io error, got {other:?}"),
        }
    }
}
