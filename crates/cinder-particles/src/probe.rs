//! Maps world positions onto a terrain and samples it

use cinder_core::{inverse_lerp, Vec3};
use cinder_terrain::TerrainField;

/// Everything known about the terrain under one world position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSample {
    pub world_position: Vec3,
    pub offset_from_terrain: Vec3,
    pub normalized: [f32; 2],
    pub height: f32,
    /// World Y minus terrain height; <= 0 means at or below the surface
    pub height_diff: f32,
    pub normal: Vec3,
}

/// Thin facade over a [`TerrainField`] for an axis-aligned terrain
pub struct TerrainCollisionProbe<'a> {
    terrain: &'a dyn TerrainField,
}

impl<'a> TerrainCollisionProbe<'a> {
    pub fn new(terrain: &'a dyn TerrainField) -> Self {
        Self { terrain }
    }

    pub fn offset_from_terrain(&self, world_position: Vec3) -> Vec3 {
        world_position - self.terrain.origin()
    }

    /// Normalized (u, v) over the terrain's X and Z extents, clamped to [0, 1]
    pub fn world_to_normalized(&self, world_position: Vec3) -> [f32; 2] {
        let offset = self.offset_from_terrain(world_position);
        let (size_x, size_z) = self.terrain.size();
        [
            inverse_lerp(0.0, size_x, offset.x),
            inverse_lerp(0.0, size_z, offset.z),
        ]
    }

    pub fn height_at(&self, [u, v]: [f32; 2]) -> f32 {
        self.terrain.interpolated_height(u, v)
    }

    pub fn normal_at(&self, [u, v]: [f32; 2]) -> Vec3 {
        self.terrain.interpolated_normal(u, v)
    }

    /// Full probe at a world position
    pub fn sample(&self, world_position: Vec3) -> ProbeSample {
        let normalized = self.world_to_normalized(world_position);
        let height = self.height_at(normalized);
        ProbeSample {
            world_position,
            offset_from_terrain: self.offset_from_terrain(world_position),
            normalized,
            height,
            height_diff: world_position.y - height,
            normal: self.normal_at(normalized),
        }
    }
}
