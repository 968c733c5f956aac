//! Point-topology mesh fed from render snapshots

use bytemuck::{Pod, Zeroable};

use crate::system::RenderSnapshot;

/// GPU vertex for one particle point. 12 bytes, tightly packed.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
}

/// Renderer-side copy of the particle buffers.
///
/// Vertices mirror the whole slot-indexed position buffer and are refreshed on
/// every upload. The index buffer only lists live slots and is rebuilt only
/// when the snapshot reports a topology change.
#[derive(Default)]
pub struct PointMesh {
    vertices: Vec<PointVertex>,
    indices: Vec<u32>,
    index_rebuilds: u64,
    uploads: u64,
}

impl PointMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload(&mut self, snapshot: &RenderSnapshot<'_>) {
        self.vertices.clear();
        self.vertices.extend(snapshot.positions.iter().map(|p| PointVertex {
            position: p.to_array(),
        }));

        if snapshot.topology_changed {
            self.indices.clear();
            self.indices.extend_from_slice(snapshot.indices);
            self.index_rebuilds += 1;
        }
        self.uploads += 1;
    }

    pub fn vertices(&self) -> &[PointVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex buffer as raw bytes for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Number of points to draw
    pub fn draw_count(&self) -> usize {
        self.indices.len()
    }

    pub fn index_rebuilds(&self) -> u64 {
        self.index_rebuilds
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}
