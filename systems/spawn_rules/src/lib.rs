#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Probabilistic placement of traps, bonuses, and debuffs on core tiles.
//!
//! Categories are evaluated in strict priority order and the first rule that
//! fires claims the tile. Eligibility checks never consume randomness; a single
//! draw is taken only for rules that pass every check.

use std::time::Duration;

use glam::Vec2;
use lava_runner_core::{
    clamp_unit, scaled_probability, CategoryRules, ObjectPlan, PrefabRef, SpawnCatalog,
    SpawnCategory, SpawnRule, TileMaterial,
};
use rand::Rng;

/// Tile facts consulted when resolving spawn rules.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileContext {
    /// Index of the tile within its segment's visual tile list.
    pub tile_index: usize,
    /// Surface material of the tile.
    pub material: TileMaterial,
    /// Tile position in world units.
    pub position: Vec2,
    /// Horizontal distance between the tile and the generation origin.
    pub distance_from_origin: f32,
    /// Whether the tile belongs to the safe start segment.
    pub is_start_segment: bool,
}

/// Per-segment spawn counters, one slot per rule and category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpawnCounters {
    traps: Vec<u32>,
    bonuses: Vec<u32>,
    debuffs: Vec<u32>,
}

impl SpawnCounters {
    /// Number of objects the rule spawned on the current segment.
    #[must_use]
    pub fn count(&self, category: SpawnCategory, rule_index: usize) -> u32 {
        self.slots(category).get(rule_index).copied().unwrap_or(0)
    }

    fn slots(&self, category: SpawnCategory) -> &[u32] {
        match category {
            SpawnCategory::Trap => &self.traps,
            SpawnCategory::Bonus => &self.bonuses,
            SpawnCategory::Debuff => &self.debuffs,
        }
    }

    fn increment(&mut self, category: SpawnCategory, rule_index: usize) {
        let slots = match category {
            SpawnCategory::Trap => &mut self.traps,
            SpawnCategory::Bonus => &mut self.bonuses,
            SpawnCategory::Debuff => &mut self.debuffs,
        };
        if let Some(slot) = slots.get_mut(rule_index) {
            *slot = slot.saturating_add(1);
        }
    }
}

/// Evaluates the configured spawn catalog against individual tiles.
#[derive(Clone, Debug)]
pub struct SpawnRuleEngine {
    catalog: SpawnCatalog,
    difficulty_scaling: bool,
}

impl SpawnRuleEngine {
    /// Creates an engine over the provided catalog.
    ///
    /// `difficulty_scaling` is the global switch; a category additionally has to
    /// opt in through [`CategoryRules::scales_with_difficulty`].
    #[must_use]
    pub fn new(catalog: SpawnCatalog, difficulty_scaling: bool) -> Self {
        Self {
            catalog,
            difficulty_scaling,
        }
    }

    /// Fresh counters sized for the catalog, used once per segment.
    #[must_use]
    pub fn counters(&self) -> SpawnCounters {
        SpawnCounters {
            traps: vec![0; self.catalog.traps.rules.len()],
            bonuses: vec![0; self.catalog.bonuses.rules.len()],
            debuffs: vec![0; self.catalog.debuffs.rules.len()],
        }
    }

    /// Spawn probability of a rule at the provided session time.
    #[must_use]
    pub fn effective_chance(
        &self,
        category: SpawnCategory,
        rule: &SpawnRule,
        elapsed: Duration,
    ) -> f32 {
        let rules = self.category(category);
        if self.difficulty_scaling && rules.scales_with_difficulty {
            scaled_probability(rule.base_chance, rules.growth_per_second, elapsed)
        } else {
            clamp_unit(rule.base_chance)
        }
    }

    /// Decides whether an object spawns on the tile, updating counters when it does.
    pub fn resolve_tile<R>(
        &self,
        tile: &TileContext,
        counters: &mut SpawnCounters,
        elapsed: Duration,
        rng: &mut R,
    ) -> Option<ObjectPlan>
    where
        R: Rng + ?Sized,
    {
        for category in SpawnCategory::PRIORITY {
            let rules = &self.category(category).rules;
            for (rule_index, rule) in rules.iter().enumerate() {
                let Some(prefab) = usable_prefab(rule) else {
                    continue;
                };
                if !is_eligible(rule, tile, counters.count(category, rule_index)) {
                    continue;
                }

                let chance = self.effective_chance(category, rule, elapsed);
                if rng.gen::<f32>() >= chance {
                    continue;
                }

                counters.increment(category, rule_index);
                tracing::trace!(
                    rule = %rule.name,
                    ?category,
                    x = tile.position.x,
                    "spawn rule fired"
                );
                return Some(ObjectPlan {
                    tile_index: tile.tile_index,
                    category,
                    rule_index,
                    prefab: prefab.clone(),
                    position: tile.position + Vec2::new(0.0, rule.vertical_offset),
                });
            }
        }
        None
    }

    fn category(&self, category: SpawnCategory) -> &CategoryRules {
        match category {
            SpawnCategory::Trap => &self.catalog.traps,
            SpawnCategory::Bonus => &self.catalog.bonuses,
            SpawnCategory::Debuff => &self.catalog.debuffs,
        }
    }
}

fn usable_prefab(rule: &SpawnRule) -> Option<&PrefabRef> {
    rule.prefab.as_ref().filter(|prefab| prefab.is_valid())
}

fn is_eligible(rule: &SpawnRule, tile: &TileContext, spawned: u32) -> bool {
    if tile.is_start_segment && !rule.allow_on_start_segment {
        return false;
    }
    if tile.distance_from_origin < rule.min_distance_from_origin {
        return false;
    }
    let surface_allowed = match tile.material {
        TileMaterial::Grass => rule.allow_on_grass,
        TileMaterial::Hazard => rule.allow_on_hazard,
    };
    if !surface_allowed {
        return false;
    }
    rule.max_per_segment == 0 || spawned < rule.max_per_segment
}
