//! The terrain query surface consumed by collision probing

use cinder_core::Vec3;

/// An axis-aligned height field that can be queried at normalized coordinates.
///
/// `u` runs along world X and `v` along world Z, both in [0, 1] across the
/// terrain's extent. Heights are relative to the terrain origin; the origin's
/// Y is not added.
pub trait TerrainField {
    /// Interpolated surface height at (u, v)
    fn interpolated_height(&self, u: f32, v: f32) -> f32;

    /// Interpolated unit surface normal at (u, v)
    fn interpolated_normal(&self, u: f32, v: f32) -> Vec3;

    /// World-space extent as (x, z)
    fn size(&self) -> (f32, f32);

    /// World-space position of the (u, v) = (0, 0) corner
    fn origin(&self) -> Vec3;
}

impl<T: TerrainField + ?Sized> TerrainField for Box<T> {
    fn interpolated_height(&self, u: f32, v: f32) -> f32 {
        (**self).interpolated_height(u, v)
    }

    fn interpolated_normal(&self, u: f32, v: f32) -> Vec3 {
        (**self).interpolated_normal(u, v)
    }

    fn size(&self) -> (f32, f32) {
        (**self).size()
    }

    fn origin(&self) -> Vec3 {
        (**self).origin()
    }
}
