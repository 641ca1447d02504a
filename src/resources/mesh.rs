use std::path::Path;

use anyhow::{Context as _, Result};
use cgmath::{Vector3, Vector4};

use crate::data_structures::mesh::{SourceMesh, TangentBasis};

/// Obj files have no tangents and no vertex colours; tangents are generated
/// by the caller.
pub fn load_obj(path: &Path) -> Result<Vec<SourceMesh>> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .with_context(|| format!("parsing {}", path.display()))?;

    Ok(models.into_iter().map(|m| obj_source(&m.mesh)).collect())
}

fn obj_source(mesh: &tobj::Mesh) -> SourceMesh {
    let vertices = mesh.positions.len() / 3;
    let triples = |data: &[f32]| -> Option<Vec<[f32; 3]>> {
        (data.len() == vertices * 3 && vertices > 0)
            .then(|| data.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
    };
    SourceMesh {
        positions: triples(&mesh.positions).unwrap_or_default(),
        normals: triples(&mesh.normals),
        tangent_basis: None,
        colors: triples(&mesh.vertex_color),
        // obj's v axis points up, images are stored top-down
        tex_coords: (mesh.texcoords.len() == vertices * 2 && vertices > 0).then(|| {
            mesh.texcoords
                .chunks_exact(2)
                .map(|c| [c[0], 1.0 - c[1]])
                .collect()
        }),
        indices: mesh.indices.clone(),
    }
}

/// Every triangle primitive of every mesh in the file becomes one sub-mesh.
/// Node transforms are not applied.
pub fn load_gltf(path: &Path) -> Result<Vec<SourceMesh>> {
    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("parsing {}", path.display()))?;

    let mut sources = Vec::new();
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "{}: skipping a {:?} primitive of mesh {:?}",
                    path.display(),
                    primitive.mode(),
                    mesh.name()
                );
                continue;
            }
            let reader = primitive.reader(|buffer| Some(&*buffers[buffer.index()]));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|n| n.collect());
            let tangent_basis = match (&normals, reader.read_tangents()) {
                (Some(normals), Some(tangents)) => Some(tangent_basis(normals, tangents)),
                _ => None,
            };
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            sources.push(SourceMesh {
                normals,
                tangent_basis,
                colors: reader.read_colors(0).map(|c| c.into_rgb_f32().collect()),
                tex_coords: reader.read_tex_coords(0).map(|t| t.into_f32().collect()),
                indices,
                positions,
            });
        }
    }
    Ok(sources)
}

/// glTF stores the bitangent as a sign in the tangent's w.
fn tangent_basis(normals: &[[f32; 3]], tangents: impl Iterator<Item = [f32; 4]>) -> TangentBasis {
    let mut basis = TangentBasis::default();
    for (normal, tangent) in normals.iter().zip(tangents) {
        let n = Vector3::from(*normal);
        let t = Vector4::from(tangent);
        let bitangent = n.cross(t.truncate()) * t.w;
        basis.tangents.push(t.truncate().into());
        basis.bitangents.push(bitangent.into());
    }
    basis
}
