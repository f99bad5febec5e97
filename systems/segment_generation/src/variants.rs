//! Neighbour-derived tile variants for the visual tile list.

use lava_runner_core::{TileMaterial, TileVariant};

/// Classifies every tile of a segment's visual tile list.
///
/// Boundary tiles are always edges. Interior tiles prefer `FromOther` when the
/// left neighbour differs, then `IntoOther` when the right neighbour differs.
#[must_use]
pub fn classify(materials: &[TileMaterial]) -> Vec<TileVariant> {
    let last = materials.len().saturating_sub(1);
    materials
        .iter()
        .enumerate()
        .map(|(index, current)| {
            if index == 0 {
                return TileVariant::LeftEdge;
            }
            if index == last {
                return TileVariant::RightEdge;
            }
            if materials[index - 1] != *current {
                TileVariant::FromOther
            } else if materials[index + 1] != *current {
                TileVariant::IntoOther
            } else {
                TileVariant::Middle
            }
        })
        .collect()
}
