// Triangle mesh generation from plant geometry.
//
// Turns a `PlantGeometry` into flat vertex/normal/UV/index buffers a
// renderer can upload directly. Each branch segment becomes an open
// `radial_sides`-gon prism whose diameter is the segment thickness; each
// leaf becomes a double-sided quad (front and back faces with opposite
// normals) centered on the leaf position, oriented by its Euler rotation and
// sized `leaf_size * scale`.
//
// This is a **read-only rendering utility**: it consumes plant geometry and
// never mutates sim state. It uses no randomness.
//
// See also: `plant.rs` for `PlantGeometry`, `scene.rs` for the publishing
// seam that hands geometry to the host.

use crate::foliage::LeafInstance;
use crate::plant::PlantGeometry;
use crate::turtle::BranchSegment;
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Configuration for mesh generation. All fields have sensible defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Sides of each branch prism (minimum 3).
    pub radial_sides: u32,
    /// Edge length of a leaf quad at scale 1.0.
    pub leaf_size: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            radial_sides: 6,
            leaf_size: 0.12,
        }
    }
}

/// Mesh geometry output: flat arrays ready for a GPU buffer.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Vertex positions as flat [x, y, z, x, y, z, ...].
    pub vertices: Vec<f32>,
    /// Per-vertex normals as flat [nx, ny, nz, ...].
    pub normals: Vec<f32>,
    /// Per-vertex UV coordinates as flat [u, v, u, v, ...].
    pub uvs: Vec<f32>,
    /// Triangle indices (3 per triangle).
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3, uv: [f32; 2]) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position.to_array());
        self.normals.extend_from_slice(&normal.to_array());
        self.uvs.extend_from_slice(&uv);
        index
    }
}

/// Build the full mesh for one plant.
pub fn build_plant_mesh(geometry: &PlantGeometry, config: &MeshConfig) -> MeshData {
    let mut mesh = MeshData::default();
    let sides = config.radial_sides.max(3);
    for segment in &geometry.segments {
        emit_branch(&mut mesh, segment, sides);
    }
    for leaf in &geometry.leaves {
        emit_leaf(&mut mesh, leaf, config.leaf_size);
    }
    mesh
}

fn emit_branch(mesh: &mut MeshData, segment: &BranchSegment, sides: u32) {
    let axis = segment.end - segment.start;
    if axis.length_squared() <= f32::EPSILON {
        return;
    }
    let axis = axis.normalize();
    let u = axis.any_orthonormal_vector();
    let v = axis.cross(u);
    let radius = segment.thickness * 0.5;

    let base = mesh.vertex_count() as u32;
    for k in 0..sides {
        let t = k as f32 / sides as f32;
        let theta = t * TAU;
        let normal = u * theta.cos() + v * theta.sin();
        mesh.push_vertex(segment.start + normal * radius, normal, [t, 0.0]);
        mesh.push_vertex(segment.end + normal * radius, normal, [t, 1.0]);
    }
    for k in 0..sides {
        let next = (k + 1) % sides;
        let s0 = base + k * 2;
        let e0 = s0 + 1;
        let s1 = base + next * 2;
        let e1 = s1 + 1;
        mesh.indices.extend_from_slice(&[s0, s1, e1, s0, e1, e0]);
    }
}

fn emit_leaf(mesh: &mut MeshData, leaf: &LeafInstance, leaf_size: f32) {
    let r = leaf.rotation;
    let rotation = Quat::from_euler(EulerRot::YXZ, r.y, r.x, r.z);
    let half = leaf_size * leaf.scale * 0.5;
    let right = rotation * Vec3::X * half;
    let up = rotation * Vec3::Y * half;
    let normal = rotation * Vec3::Z;
    let corners = [
        (leaf.position - right - up, [0.0, 0.0]),
        (leaf.position + right - up, [1.0, 0.0]),
        (leaf.position + right + up, [1.0, 1.0]),
        (leaf.position - right + up, [0.0, 1.0]),
    ];

    let front = mesh.vertex_count() as u32;
    for (position, uv) in corners {
        mesh.push_vertex(position, normal, uv);
    }
    mesh.indices
        .extend_from_slice(&[front, front + 1, front + 2, front, front + 2, front + 3]);

    let back = mesh.vertex_count() as u32;
    for (position, uv) in corners {
        mesh.push_vertex(position, -normal, uv);
    }
    mesh.indices
        .extend_from_slice(&[back, back + 2, back + 1, back, back + 3, back + 2]);
}
