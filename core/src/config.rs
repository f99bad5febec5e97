//! Designer-facing tuning surface for the generator.
//!
//! Every struct derives `Deserialize` with `#[serde(default)]`, so a TOML file
//! only needs to mention the knobs it changes. Values are *not* validated here:
//! each consumer clamps the values it reads, which keeps steady-state ticking
//! total over any configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DisappearScope, DisappearSettings, LaneId, LaneSetup, MotionAxis, PrefabRef};

/// Errors raised while loading a generator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed into a configuration.
    #[error("failed to parse generator configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Aggregated tuning knobs controlling every adjustable aspect of generation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Seed for the shared random stream; `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// Optional feature toggles.
    pub features: FeatureFlags,
    /// Lane count, spacing, and per-lane overrides.
    pub lanes: LaneLayout,
    /// Tile dimensions.
    pub tiles: TileTuning,
    /// Segment length, gap, and height bounds.
    pub segments: SegmentTuning,
    /// Generation and cleanup windows around the player.
    pub streaming: StreamingTuning,
    /// Hazard run bounds, chance, and kill band geometry.
    pub hazard: HazardTuning,
    /// Trap, bonus, and debuff spawn rules.
    pub spawns: SpawnCatalog,
    /// Moving segment parameters.
    pub motion: MotionTuning,
    /// Disappearing tile parameters.
    pub disappearing: DisappearTuning,
    /// Cross-lane vertical separation parameters.
    pub overlap: OverlapTuning,
}

impl GeneratorConfig {
    /// Parses a configuration from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Builds the lane setups implied by the layout and feature flags.
    ///
    /// With `multi_lane` disabled only the start lane is created.
    #[must_use]
    pub fn lane_setups(&self) -> Vec<LaneSetup> {
        let layout = &self.lanes;
        let count = layout.count.max(1);
        let start_lane = layout.start_lane.min(count - 1);

        let indices: Vec<u32> = if self.features.multi_lane {
            (0..count).collect()
        } else {
            vec![start_lane]
        };

        indices
            .into_iter()
            .map(|index| {
                let tuning = layout.tuning_for(index);
                let gap_multiplier = if tuning.gap_multiplier.is_finite() {
                    tuning.gap_multiplier.max(0.0)
                } else {
                    1.0
                };
                LaneSetup {
                    lane: LaneId::new(index),
                    base_height: layout.origin_y
                        + index as f32 * layout.spacing
                        + tuning.extra_height_offset,
                    gap_multiplier,
                    is_start_lane: index == start_lane,
                }
            })
            .collect()
    }
}

/// Optional behaviours that can be switched off independently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Generate every configured lane instead of only the start lane.
    pub multi_lane: bool,
    /// Attach disappearing behaviour to grass tiles.
    pub disappearing_tiles: bool,
    /// Attach oscillating motion to segments.
    pub moving_segments: bool,
    /// Grow hazard and trap probabilities with session time.
    pub difficulty_scaling: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            multi_lane: true,
            disappearing_tiles: true,
            moving_segments: true,
            difficulty_scaling: true,
        }
    }
}

/// Vertical arrangement of lanes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneLayout {
    /// Number of lanes; values below one are treated as one.
    pub count: u32,
    /// Vertical distance between consecutive lane base heights.
    pub spacing: f32,
    /// Index of the lane that opens with the safe start segment.
    pub start_lane: u32,
    /// World X coordinate where every lane begins.
    pub origin_x: f32,
    /// Base height of lane zero.
    pub origin_y: f32,
    /// Per-lane overrides indexed by lane; missing entries use defaults.
    pub overrides: Vec<LaneTuning>,
}

impl LaneLayout {
    fn tuning_for(&self, index: u32) -> LaneTuning {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.overrides.get(index))
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for LaneLayout {
    fn default() -> Self {
        Self {
            count: 1,
            spacing: 4.0,
            start_lane: 0,
            origin_x: 0.0,
            origin_y: 0.0,
            overrides: Vec::new(),
        }
    }
}

/// Per-lane overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneTuning {
    /// Added to the lane's base height.
    pub extra_height_offset: f32,
    /// Multiplies every gap generated in the lane.
    pub gap_multiplier: f32,
}

impl Default for LaneTuning {
    fn default() -> Self {
        Self {
            extra_height_offset: 0.0,
            gap_multiplier: 1.0,
        }
    }
}

/// Tile dimensions in world units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileTuning {
    /// Width of one tile; a non-positive width stops the lane from advancing.
    pub width: f32,
    /// Height of one tile.
    pub height: f32,
}

impl Default for TileTuning {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.0,
        }
    }
}

/// Segment length, gap, and vertical step bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentTuning {
    /// Minimum core tile count of a random segment.
    pub min_tiles: u32,
    /// Maximum core tile count of a random segment (inclusive).
    pub max_tiles: u32,
    /// Core tile count of the safe start segment.
    pub start_platform_tiles: u32,
    /// Minimum horizontal gap before a segment.
    pub min_gap: f32,
    /// Maximum horizontal gap before a segment.
    pub max_gap: f32,
    /// Largest upward step between consecutive segments of a lane.
    pub max_step_up: f32,
    /// Largest downward step between consecutive segments of a lane.
    pub max_step_down: f32,
    /// Lowest segment height, relative to the lane's base height.
    pub min_height: f32,
    /// Highest segment height, relative to the lane's base height.
    pub max_height: f32,
}

impl Default for SegmentTuning {
    fn default() -> Self {
        Self {
            min_tiles: 4,
            max_tiles: 10,
            start_platform_tiles: 5,
            min_gap: 1.5,
            max_gap: 3.5,
            max_step_up: 1.5,
            max_step_down: 3.0,
            min_height: -3.0,
            max_height: 5.0,
        }
    }
}

/// Generation and cleanup windows around the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingTuning {
    /// Lanes are generated until their frontier reaches `player_x + ahead_distance`.
    pub ahead_distance: f32,
    /// Segments ending before `player_x - behind_distance` are removed.
    pub behind_distance: f32,
    /// Upper bound on segments planned for one lane in a single tick.
    pub max_segments_per_tick: u32,
}

impl Default for StreamingTuning {
    fn default() -> Self {
        Self {
            ahead_distance: 25.0,
            behind_distance: 20.0,
            max_segments_per_tick: 64,
        }
    }
}

/// Hazard (lava) composition and geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    /// Chance that a random segment contains a hazard run.
    pub base_chance: f32,
    /// Per-second growth of the hazard chance when difficulty scaling is on.
    pub growth_per_second: f32,
    /// Shortest hazard run; values below two are raised to two.
    pub min_run: u32,
    /// Longest hazard run.
    pub max_run: u32,
    /// Height of the kill band above the tile top.
    pub kill_band_height: f32,
    /// Depth of the kill band below the tile top.
    pub kill_band_depth: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            base_chance: 0.4,
            growth_per_second: 0.0,
            min_run: 2,
            max_run: 3,
            kill_band_height: 0.2,
            kill_band_depth: 0.05,
        }
    }
}

/// Spawn rules grouped by category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnCatalog {
    /// Trap rules; evaluated first.
    pub traps: CategoryRules,
    /// Bonus rules; evaluated second.
    pub bonuses: CategoryRules,
    /// Debuff rules; evaluated last.
    pub debuffs: CategoryRules,
}

impl Default for SpawnCatalog {
    fn default() -> Self {
        Self {
            traps: CategoryRules {
                scales_with_difficulty: true,
                ..CategoryRules::default()
            },
            bonuses: CategoryRules::default(),
            debuffs: CategoryRules::default(),
        }
    }
}

/// Rules of one spawn category plus its difficulty scaling.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRules {
    /// Rules in declaration order.
    pub rules: Vec<SpawnRule>,
    /// Whether the category's chances grow with session time.
    pub scales_with_difficulty: bool,
    /// Per-second growth added to every rule's base chance when scaling applies.
    pub growth_per_second: f32,
}

/// Probabilistic policy for placing one kind of object on eligible tiles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnRule {
    /// Label used in logs.
    pub name: String,
    /// Prefab to instantiate; rules without a usable prefab are skipped.
    pub prefab: Option<PrefabRef>,
    /// Probability per eligible tile.
    pub base_chance: f32,
    /// Allow spawning on grass tiles.
    pub allow_on_grass: bool,
    /// Allow spawning on hazard tiles.
    pub allow_on_hazard: bool,
    /// Allow spawning on the safe start segment.
    pub allow_on_start_segment: bool,
    /// Minimum X distance from the generation origin.
    pub min_distance_from_origin: f32,
    /// Per-segment cap; zero means unlimited.
    pub max_per_segment: u32,
    /// Vertical offset above the tile centre.
    pub vertical_offset: f32,
}

impl Default for SpawnRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            prefab: None,
            base_chance: 0.1,
            allow_on_grass: true,
            allow_on_hazard: false,
            allow_on_start_segment: false,
            min_distance_from_origin: 0.0,
            max_per_segment: 1,
            vertical_offset: 0.5,
        }
    }
}

/// Moving segment parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Chance that a non-start segment moves.
    pub chance: f32,
    /// Axis of oscillation.
    pub axis: MotionAxis,
    /// Smallest amplitude.
    pub min_amplitude: f32,
    /// Largest amplitude.
    pub max_amplitude: f32,
    /// Smallest angular speed.
    pub min_speed: f32,
    /// Largest angular speed.
    pub max_speed: f32,
    /// Phase offsets are drawn from `0.0..max_phase` seconds.
    pub max_phase: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            chance: 0.1,
            axis: MotionAxis::Horizontal,
            min_amplitude: 1.0,
            max_amplitude: 2.0,
            min_speed: 1.0,
            max_speed: 1.5,
            max_phase: 10.0,
        }
    }
}

/// Disappearing tile parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisappearTuning {
    /// Chance that a grass tile disappears after being touched.
    pub chance: f32,
    /// Seconds between the touch and the start of the fade-out.
    pub delay_before_disappear: f32,
    /// Seconds spent fading in either direction.
    pub fade_duration: f32,
    /// Seconds spent hidden before reappearing; zero or less never reappears.
    pub reappear_delay: f32,
    /// Fade every tile of the segment instead of only the touched tile.
    pub whole_segment: bool,
    /// Keep hazard tiles solid while the rest of the segment is hidden.
    pub exempt_hazard_tiles: bool,
    /// Allow disappearing tiles on the safe start segment.
    pub allow_on_start_segment: bool,
}

impl DisappearTuning {
    /// Converts designer seconds into runtime timings.
    ///
    /// Negative and NaN values floor at zero; values too large for a `Duration` saturate.
    #[must_use]
    pub fn settings(&self) -> DisappearSettings {
        let reappear = seconds(self.reappear_delay);
        DisappearSettings {
            delay_before_disappear: seconds(self.delay_before_disappear),
            fade_duration: seconds(self.fade_duration),
            reappear_delay: (!reappear.is_zero()).then_some(reappear),
            scope: if self.whole_segment {
                DisappearScope::WholeSegment
            } else {
                DisappearScope::Tile
            },
            exempt_hazard_tiles: self.exempt_hazard_tiles,
        }
    }
}

impl Default for DisappearTuning {
    fn default() -> Self {
        Self {
            chance: 0.05,
            delay_before_disappear: 0.5,
            fade_duration: 0.3,
            reappear_delay: 0.0,
            whole_segment: true,
            exempt_hazard_tiles: true,
            allow_on_start_segment: false,
        }
    }
}

/// Cross-lane vertical separation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlapTuning {
    /// Minimum vertical distance between horizontally overlapping segments.
    pub min_vertical_distance: f32,
    /// Number of relocation attempts before accepting the last candidate.
    pub max_relocate_attempts: u32,
}

impl Default for OverlapTuning {
    fn default() -> Self {
        Self {
            min_vertical_distance: 2.0,
            max_relocate_attempts: 6,
        }
    }
}

fn seconds(value: f32) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
}
