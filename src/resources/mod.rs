//! Loading meshes and texture bytes from disk.
//!
//! Everything here is synchronous and runs once at startup; failures carry the
//! offending path in their context.

use std::path::Path;

use anyhow::{Context as _, Result, bail};

use crate::data_structures::mesh::{MeshData, SourceMesh};

pub mod mesh;

pub fn load_binary(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Imports every sub-mesh of a model file, picking the importer by extension.
pub fn load_source_meshes(path: impl AsRef<Path>) -> Result<Vec<SourceMesh>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mut meshes = match extension.as_deref() {
        Some("obj") => mesh::load_obj(path)?,
        Some("gltf" | "glb") => mesh::load_gltf(path)?,
        other => bail!("{}: unsupported mesh format {other:?}", path.display()),
    };
    for source in &mut meshes {
        source.generate_tangents();
    }
    Ok(meshes)
}

/// Imports and interleaves a model file into one mesh.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<MeshData> {
    let path = path.as_ref();
    log::info!("loading mesh {}", path.display());
    let sources = load_source_meshes(path)?;
    if sources.is_empty() {
        log::warn!("{} contains no triangle meshes", path.display());
    }
    MeshData::from_sources(&sources).with_context(|| format!("importing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_source_meshes("model.fbx").unwrap_err();
        assert!(err.to_string().contains("unsupported mesh format"));
    }

    #[test]
    fn missing_file_names_its_path() {
        let err = load_binary("definitely/not/here.png").unwrap_err();
        assert!(format!("{err:#}").contains("definitely/not/here.png"));
    }
}
