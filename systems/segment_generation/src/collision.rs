//! Solid volumes and hazard kill bands attached to generated tiles.

use glam::Vec2;
use lava_runner_core::{
    Aabb, ColliderShape, CollisionGeometryProvider, HazardTuning, MaterialDescriptor,
    TileCollision, TileMaterial, TileTuning,
};

use crate::sampling::finite_or_zero;

/// Collision volumes for a tile with the provided descriptor.
///
/// The solid volume comes from the provider's outline, or a centred
/// `width x height` rectangle when no outline exists. Hazard tiles also carry a
/// kill band straddling the tile's top edge.
#[must_use]
pub fn tile_collision(
    descriptor: MaterialDescriptor,
    tiles: &TileTuning,
    hazard: &HazardTuning,
    geometry: &dyn CollisionGeometryProvider,
) -> TileCollision {
    let size = tile_size(tiles);
    let solid = match geometry.outline(descriptor) {
        Some(paths) if paths.iter().any(|path| path.len() >= 3) => ColliderShape::Outline {
            paths: paths.into_iter().filter(|path| path.len() >= 3).collect(),
        },
        _ => ColliderShape::Rect(Aabb::centered(size)),
    };
    let kill_band = match descriptor.material {
        TileMaterial::Hazard => Some(kill_band(size, hazard)),
        TileMaterial::Grass => None,
    };
    TileCollision { solid, kill_band }
}

fn tile_size(tiles: &TileTuning) -> Vec2 {
    Vec2::new(
        finite_or_zero(tiles.width).abs(),
        finite_or_zero(tiles.height).abs(),
    )
}

fn kill_band(size: Vec2, hazard: &HazardTuning) -> Aabb {
    let half_width = size.x * 0.5;
    let top = size.y * 0.5;
    let depth = finite_or_zero(hazard.kill_band_depth).max(0.0);
    let height = finite_or_zero(hazard.kill_band_height).max(0.0);
    Aabb::from_corners(
        Vec2::new(-half_width, top - depth),
        Vec2::new(half_width, top + height),
    )
}
