//! Mesh data: what importers produce, how it is interleaved and how it lives
//! on the GPU.
//!
//! Every vertex is 17 floats: position, normal, tangent, bitangent, colour
//! (3 each) and texture coordinates (2). Channels the source doesn't carry are
//! filled with zeros, except colour which defaults to green and uv which
//! defaults to `(0, 0)`.

use anyhow::{bail, Result};
use cgmath::{InnerSpace, Vector2, Vector3, Zero};

use crate::gpu::{BufferHandle, BufferUsage, Gpu, VertexAttribute};
use crate::shader::ShaderProgram;

pub const FLOATS_PER_VERTEX: usize = 17;
pub const DEFAULT_COLOR: [f32; 3] = [0.0, 1.0, 0.0];
pub const DEFAULT_TEXCOORD: [f32; 2] = [0.0, 0.0];
/// 16-bit indices can address at most this many vertices.
pub const MAX_VERTICES: usize = u16::MAX as usize + 1;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub color: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl MeshVertex {
    pub const STRIDE: u64 = std::mem::size_of::<MeshVertex>() as u64;

    /// The interleaved layout against `program`'s attribute locations.
    pub fn attributes(program: &ShaderProgram) -> [VertexAttribute; 6] {
        use std::mem::size_of;
        let vec3 = size_of::<[f32; 3]>() as u64;
        let locations = &program.attributes;
        let attribute = |location, components, slot: u64| VertexAttribute {
            location,
            components,
            offset: slot * vec3,
        };
        [
            attribute(locations.position, 3, 0),
            attribute(locations.normal, 3, 1),
            attribute(locations.tangent, 3, 2),
            attribute(locations.bitangent, 3, 3),
            attribute(locations.color, 3, 4),
            attribute(locations.texcoord, 2, 5),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TangentBasis {
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
}

/// One sub-mesh as an importer hands it over: positions, optional channels and
/// triangle indices local to the sub-mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tangent_basis: Option<TangentBasis>,
    pub colors: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
}

impl SourceMesh {
    /// Averages per-triangle tangents and bitangents onto the vertices.
    ///
    /// Needs normals and uvs and does nothing without them or when a basis is
    /// already present. Triangles with degenerate uvs don't contribute.
    pub fn generate_tangents(&mut self) {
        let (Some(_), Some(uvs), None) = (&self.normals, &self.tex_coords, &self.tangent_basis)
        else {
            return;
        };

        let count = self.positions.len();
        let mut tangents = vec![Vector3::<f32>::zero(); count];
        let mut bitangents = vec![Vector3::<f32>::zero(); count];
        let mut triangles_included = vec![0u32; count];

        for c in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
            if i0 >= count || i1 >= count || i2 >= count {
                continue;
            }
            let pos0 = Vector3::from(self.positions[i0]);
            let pos1 = Vector3::from(self.positions[i1]);
            let pos2 = Vector3::from(self.positions[i2]);
            let uv0 = Vector2::from(uvs[i0]);
            let uv1 = Vector2::from(uvs[i1]);
            let uv2 = Vector2::from(uvs[i2]);

            let delta_pos1 = pos1 - pos0;
            let delta_pos2 = pos2 - pos0;
            let delta_uv1 = uv1 - uv0;
            let delta_uv2 = uv2 - uv0;

            // delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
            // delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
            let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
            if det.abs() <= f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
            let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

            for i in [i0, i1, i2] {
                tangents[i] += tangent;
                bitangents[i] += bitangent;
                triangles_included[i] += 1;
            }
        }

        let average = |sum: Vector3<f32>, n: u32| -> [f32; 3] {
            if n == 0 {
                [0.0; 3]
            } else {
                (sum / n as f32).into()
            }
        };
        self.tangent_basis = Some(TangentBasis {
            tangents: tangents
                .iter()
                .zip(&triangles_included)
                .map(|(t, n)| average(*t, *n))
                .collect(),
            bitangents: bitangents
                .iter()
                .zip(&triangles_included)
                .map(|(b, n)| average(*b, *n))
                .collect(),
        });
    }

    /// A unit cube centred on the origin, one quad per face, each face tinted
    /// differently.
    pub fn cube() -> Self {
        let faces: [([f32; 3], [f32; 3], [f32; 3], [f32; 3]); 6] = [
            // normal, u axis, v axis, colour
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 1.0]),
        ];
        let mut mesh = SourceMesh {
            normals: Some(Vec::new()),
            colors: Some(Vec::new()),
            tex_coords: Some(Vec::new()),
            ..Default::default()
        };
        for (normal, u, v, color) in faces {
            let n = Vector3::from(normal);
            let u = Vector3::from(u);
            let v = Vector3::from(v);
            mesh.push_quad(n * 0.5, u * 0.5, v * 0.5, normal, color);
        }
        mesh.generate_tangents();
        mesh
    }

    /// A square in the XZ plane facing +Y, `2 * half_extent` wide.
    pub fn plane(half_extent: f32) -> Self {
        let mut mesh = SourceMesh {
            normals: Some(Vec::new()),
            colors: Some(Vec::new()),
            tex_coords: Some(Vec::new()),
            ..Default::default()
        };
        mesh.push_quad(
            Vector3::zero(),
            Vector3::unit_x() * half_extent,
            -Vector3::unit_z() * half_extent,
            [0.0, 1.0, 0.0],
            [0.8, 0.8, 0.8],
        );
        mesh.generate_tangents();
        mesh
    }

    fn push_quad(
        &mut self,
        center: Vector3<f32>,
        u: Vector3<f32>,
        v: Vector3<f32>,
        normal: [f32; 3],
        color: [f32; 3],
    ) {
        debug_assert!(u.cross(v).dot(Vector3::from(normal)) > 0.0);
        let base = self.positions.len() as u32;
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        for (su, sv) in corners {
            self.positions.push((center + u * su + v * sv).into());
            if let Some(normals) = &mut self.normals {
                normals.push(normal);
            }
            if let Some(colors) = &mut self.colors {
                colors.push(color);
            }
            if let Some(uvs) = &mut self.tex_coords {
                uvs.push([(su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5]);
            }
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Interleaved vertices and 16-bit indices ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    /// Interleaves every sub-mesh into one vertex array, rebasing each
    /// sub-mesh's indices by the vertices that came before it.
    pub fn from_sources(sources: &[SourceMesh]) -> Result<Self> {
        let total: usize = sources.iter().map(|s| s.positions.len()).sum();
        if total > MAX_VERTICES {
            bail!("{total} vertices do not fit 16-bit indices (at most {MAX_VERTICES})");
        }

        let mut data = MeshData {
            vertices: Vec::with_capacity(total),
            indices: Vec::with_capacity(sources.iter().map(|s| s.indices.len()).sum()),
        };
        for (sub_mesh, source) in sources.iter().enumerate() {
            let base = data.vertices.len();
            let count = source.positions.len();
            if source.indices.len() % 3 != 0 {
                bail!(
                    "sub-mesh {sub_mesh} has {} indices, which is not a whole number of triangles",
                    source.indices.len()
                );
            }
            for (i, position) in source.positions.iter().enumerate() {
                let pick3 = |channel: Option<&Vec<[f32; 3]>>, default| {
                    channel.and_then(|c| c.get(i)).copied().unwrap_or(default)
                };
                let basis = source.tangent_basis.as_ref();
                data.vertices.push(MeshVertex {
                    position: *position,
                    normal: pick3(source.normals.as_ref(), [0.0; 3]),
                    tangent: pick3(basis.map(|b| &b.tangents), [0.0; 3]),
                    bitangent: pick3(basis.map(|b| &b.bitangents), [0.0; 3]),
                    color: pick3(source.colors.as_ref(), DEFAULT_COLOR),
                    tex_coords: source
                        .tex_coords
                        .as_ref()
                        .and_then(|c| c.get(i))
                        .copied()
                        .unwrap_or(DEFAULT_TEXCOORD),
                });
            }
            for &index in &source.indices {
                let index = index as usize;
                if index >= count {
                    bail!("sub-mesh {sub_mesh} references vertex {index} of {count}");
                }
                // `total` was checked against MAX_VERTICES above.
                data.indices.push((base + index) as u16);
            }
        }
        Ok(data)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The raw interleaved floats, `FLOATS_PER_VERTEX` per vertex.
    pub fn floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Mesh data uploaded to the GPU. Owns its two buffers.
#[derive(Debug)]
pub struct Mesh {
    name: String,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    index_count: u32,
}

impl Mesh {
    pub fn upload(gpu: &mut dyn Gpu, name: &str, data: MeshData) -> Self {
        let vertex_buffer = gpu.create_buffer(
            &format!("{name} vertex buffer"),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&data.vertices),
        );
        let index_buffer = gpu.create_buffer(
            &format!("{name} index buffer"),
            BufferUsage::Index,
            bytemuck::cast_slice(&data.indices),
        );
        log::info!(
            "uploaded mesh `{name}`: {} vertices, {} triangles",
            data.vertex_count(),
            data.triangle_count()
        );
        Self {
            name: name.to_owned(),
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn release(self, gpu: &mut dyn Gpu) {
        gpu.delete_buffer(self.vertex_buffer);
        gpu.delete_buffer(self.index_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> SourceMesh {
        SourceMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            ..Default::default()
        }
    }

    #[test]
    fn vertex_is_seventeen_floats() {
        assert_eq!(MeshVertex::STRIDE as usize, FLOATS_PER_VERTEX * 4);
    }

    #[test]
    fn missing_channels_get_defaults() {
        let data = MeshData::from_sources(&[triangle()]).unwrap();
        assert_eq!(data.floats().len(), 3 * FLOATS_PER_VERTEX);
        for v in &data.vertices {
            assert_eq!(v.normal, [0.0; 3]);
            assert_eq!(v.tangent, [0.0; 3]);
            assert_eq!(v.bitangent, [0.0; 3]);
            assert_eq!(v.color, DEFAULT_COLOR);
            assert_eq!(v.tex_coords, DEFAULT_TEXCOORD);
        }
    }

    #[test]
    fn sub_mesh_indices_are_rebased() {
        let data = MeshData::from_sources(&[triangle(), triangle()]).unwrap();
        assert_eq!(data.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(data.triangle_count() * 3, data.indices.len());
        assert!(data.indices.iter().all(|&i| (i as usize) < data.vertex_count()));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut broken = triangle();
        broken.indices = vec![0, 1, 3];
        assert!(MeshData::from_sources(&[broken]).is_err());
    }

    #[test]
    fn partial_triangle_is_rejected() {
        let mut broken = triangle();
        broken.indices = vec![0, 1];
        assert!(MeshData::from_sources(&[broken]).is_err());
    }

    #[test]
    fn too_many_vertices_is_rejected() {
        let big = SourceMesh {
            positions: vec![[0.0; 3]; MAX_VERTICES + 1],
            ..Default::default()
        };
        assert!(MeshData::from_sources(&[big]).is_err());
    }

    #[test]
    fn tangents_follow_uv_axes() {
        let mut plane = SourceMesh::plane(1.0);
        plane.tangent_basis = None;
        plane.generate_tangents();
        let basis = plane.tangent_basis.unwrap();
        for (t, b) in basis.tangents.iter().zip(&basis.bitangents) {
            let t = Vector3::from(*t).normalize();
            let b = Vector3::from(*b).normalize();
            assert_relative_eq!(t, Vector3::unit_x(), epsilon = 1e-5);
            // v grows towards +z because image rows run top-down
            assert_relative_eq!(b, Vector3::unit_z(), epsilon = 1e-5);
        }
    }

    #[test]
    fn tangents_need_uvs() {
        let mut mesh = triangle();
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
        mesh.generate_tangents();
        assert_eq!(mesh.tangent_basis, None);
    }

    #[test]
    fn degenerate_uvs_leave_zero_tangents() {
        let mut mesh = triangle();
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
        mesh.tex_coords = Some(vec![[0.5, 0.5]; 3]);
        mesh.generate_tangents();
        let basis = mesh.tangent_basis.unwrap();
        assert!(basis.tangents.iter().all(|t| *t == [0.0; 3]));
        assert!(basis.tangents.iter().all(|t| t.iter().all(|f| f.is_finite())));
    }

    #[test]
    fn cube_is_closed_and_coloured() {
        let data = MeshData::from_sources(&[SourceMesh::cube()]).unwrap();
        assert_eq!(data.vertex_count(), 24);
        assert_eq!(data.triangle_count(), 12);
        let front = data.vertices.iter().filter(|v| v.normal == [0.0, 0.0, 1.0]);
        assert!(front.clone().count() == 4);
        assert!(front.clone().all(|v| v.color == [1.0, 0.0, 0.0]));
        for v in &data.vertices {
            assert!(v.position.iter().all(|p| p.abs() <= 0.5 + f32::EPSILON));
        }
    }
}
