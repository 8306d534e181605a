//! Triangulated vertex buffers for the rendering collaborator.

use crate::material::MaterialSlot;
use crate::mesh::Mesh;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Flat-shaded vertex with box-projected UVs and its material slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ExportVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub material: u32,
}

impl ExportVertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2, material: MaterialSlot) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coords: tex_coords.to_array(),
            material: material.index(),
        }
    }
}

/// Triangle list built from the mesh, ready for upload.
#[derive(Debug, Clone, Default)]
pub struct MeshExport {
    pub vertices: Vec<ExportVertex>,
    pub indices: Vec<u32>,
}

impl MeshExport {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Project onto the plane most facing the normal.
fn box_project(p: Vec3, normal: Vec3) -> Vec2 {
    let n = normal.abs();
    if n.x >= n.y && n.x >= n.z {
        Vec2::new(p.y, p.z)
    } else if n.y >= n.z {
        Vec2::new(p.x, p.z)
    } else {
        Vec2::new(p.x, p.y)
    }
}

impl Mesh {
    /// Fan-triangulate every face. Vertices are not shared between faces so
    /// each face keeps its own flat normal.
    pub fn to_export(&self) -> MeshExport {
        let mut export = MeshExport::default();
        for (_, face) in self.faces() {
            let normal = self.vector_area(&face.verts).normalize_or_zero();
            let base = export.vertices.len() as u32;
            for &v in &face.verts {
                let p = self.position(v);
                export
                    .vertices
                    .push(ExportVertex::new(p, normal, box_project(p, normal), face.material));
            }
            for i in 1..face.verts.len() as u32 - 1 {
                export.indices.extend_from_slice(&[base, base + i, base + i + 1]);
            }
        }
        export
    }
}
