use std::time::Duration;

use glam::Vec2;
use lava_runner_core::{
    CategoryRules, PrefabRef, SpawnCatalog, SpawnCategory, SpawnRule, TileMaterial,
};
use lava_runner_system_spawn_rules::{SpawnRuleEngine, TileContext};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn certain(name: &str) -> SpawnRule {
    SpawnRule {
        name: name.to_owned(),
        prefab: Some(PrefabRef::new(name)),
        base_chance: 1.0,
        max_per_segment: 0,
        ..SpawnRule::default()
    }
}

fn category(rules: Vec<SpawnRule>) -> CategoryRules {
    CategoryRules {
        rules,
        ..CategoryRules::default()
    }
}

fn tile(index: usize, material: TileMaterial) -> TileContext {
    let x = 20.0 + index as f32;
    TileContext {
        tile_index: index,
        material,
        position: Vec2::new(x, 3.0),
        distance_from_origin: x,
        is_start_segment: false,
    }
}

#[test]
fn traps_claim_tiles_before_bonuses_and_debuffs() {
    let catalog = SpawnCatalog {
        traps: category(vec![certain("saw")]),
        bonuses: category(vec![certain("coin")]),
        debuffs: category(vec![certain("slime")]),
    };
    let engine = SpawnRuleEngine::new(catalog, true);
    let mut counters = engine.counters();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for index in 1..=6 {
        let plan = engine
            .resolve_tile(
                &tile(index, TileMaterial::Grass),
                &mut counters,
                Duration::ZERO,
                &mut rng,
            )
            .expect("certain trap always spawns");
        assert_eq!(plan.category, SpawnCategory::Trap);
        assert_eq!(plan.tile_index, index);
    }
    assert_eq!(counters.count(SpawnCategory::Trap, 0), 6);
    assert_eq!(counters.count(SpawnCategory::Bonus, 0), 0);
}

#[test]
fn capped_rule_yields_to_next_category() {
    let catalog = SpawnCatalog {
        traps: category(vec![SpawnRule {
            max_per_segment: 2,
            ..certain("saw")
        }]),
        bonuses: category(vec![certain("coin")]),
        debuffs: CategoryRules::default(),
    };
    let engine = SpawnRuleEngine::new(catalog, false);
    let mut counters = engine.counters();
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let categories: Vec<SpawnCategory> = (1..=5)
        .filter_map(|index| {
            engine.resolve_tile(
                &tile(index, TileMaterial::Grass),
                &mut counters,
                Duration::ZERO,
                &mut rng,
            )
        })
        .map(|plan| plan.category)
        .collect();

    assert_eq!(
        categories,
        vec![
            SpawnCategory::Trap,
            SpawnCategory::Trap,
            SpawnCategory::Bonus,
            SpawnCategory::Bonus,
            SpawnCategory::Bonus,
        ]
    );
}

#[test]
fn per_segment_cap_holds_under_random_draws() {
    let catalog = SpawnCatalog {
        traps: category(vec![SpawnRule {
            base_chance: 0.6,
            max_per_segment: 3,
            ..certain("saw")
        }]),
        ..SpawnCatalog::default()
    };
    let engine = SpawnRuleEngine::new(catalog, false);
    let mut rng = ChaCha8Rng::seed_from_u64(0xfeed);

    for _segment in 0..50 {
        let mut counters = engine.counters();
        let spawned = (1..=10)
            .filter_map(|index| {
                engine.resolve_tile(
                    &tile(index, TileMaterial::Grass),
                    &mut counters,
                    Duration::ZERO,
                    &mut rng,
                )
            })
            .count();
        assert!(spawned <= 3, "cap exceeded: {spawned}");
        assert_eq!(counters.count(SpawnCategory::Trap, 0) as usize, spawned);
    }
}

#[test]
fn rules_without_prefab_are_skipped_individually() {
    let catalog = SpawnCatalog {
        traps: category(vec![
            SpawnRule {
                prefab: None,
                ..certain("broken")
            },
            SpawnRule {
                prefab: Some(PrefabRef::new("  ")),
                ..certain("blank")
            },
            certain("saw"),
        ]),
        ..SpawnCatalog::default()
    };
    let engine = SpawnRuleEngine::new(catalog, false);
    let mut counters = engine.counters();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let plan = engine
        .resolve_tile(
            &tile(2, TileMaterial::Grass),
            &mut counters,
            Duration::ZERO,
            &mut rng,
        )
        .expect("valid rule fires");
    assert_eq!(plan.rule_index, 2);
    assert_eq!(plan.prefab, PrefabRef::new("saw"));
}

#[test]
fn spawn_position_applies_vertical_offset() {
    let catalog = SpawnCatalog {
        bonuses: category(vec![SpawnRule {
            vertical_offset: 0.75,
            ..certain("coin")
        }]),
        ..SpawnCatalog::default()
    };
    let engine = SpawnRuleEngine::new(catalog, false);
    let mut counters = engine.counters();
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let plan = engine
        .resolve_tile(
            &tile(3, TileMaterial::Grass),
            &mut counters,
            Duration::ZERO,
            &mut rng,
        )
        .expect("certain bonus spawns");
    assert_eq!(plan.position, Vec2::new(23.0, 3.75));
}

#[test]
fn zero_chance_and_disallowed_surfaces_never_spawn() {
    let catalog = SpawnCatalog {
        traps: category(vec![SpawnRule {
            base_chance: 0.0,
            allow_on_hazard: true,
            ..certain("saw")
        }]),
        bonuses: category(vec![certain("coin")]),
        ..SpawnCatalog::default()
    };
    let engine = SpawnRuleEngine::new(catalog, false);
    let mut counters = engine.counters();
    let mut rng = ChaCha8Rng::seed_from_u64(9);

    for index in 1..=20 {
        let outcome = engine.resolve_tile(
            &tile(index, TileMaterial::Hazard),
            &mut counters,
            Duration::ZERO,
            &mut rng,
        );
        assert!(outcome.is_none());
    }
}

#[test]
fn trap_chance_grows_with_session_time() {
    let catalog = SpawnCatalog {
        traps: CategoryRules {
            rules: vec![SpawnRule {
                base_chance: 0.0,
                ..certain("saw")
            }],
            scales_with_difficulty: true,
            growth_per_second: 0.01,
        },
        ..SpawnCatalog::default()
    };
    let engine = SpawnRuleEngine::new(catalog, true);
    let mut rng = ChaCha8Rng::seed_from_u64(21);

    let mut early = engine.counters();
    assert!(engine
        .resolve_tile(
            &tile(1, TileMaterial::Grass),
            &mut early,
            Duration::ZERO,
            &mut rng,
        )
        .is_none());

    let mut late = engine.counters();
    assert!(engine
        .resolve_tile(
            &tile(1, TileMaterial::Grass),
            &mut late,
            Duration::from_secs(100),
            &mut rng,
        )
        .is_some());
}
