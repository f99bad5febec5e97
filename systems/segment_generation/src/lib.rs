#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Plans complete platform segments: gap, height, materials, tiles, motion, and objects.
//!
//! The generator is pure. It reads a [`LaneCursor`] describing where the lane
//! currently ends, the spans already occupied by other lanes, and draws from
//! the caller's random stream. The resulting [`SegmentPlan`] is submitted to
//! the world as a single `AppendSegment` command.

use std::time::Duration;

use glam::Vec2;
use lava_runner_core::{
    CollisionGeometryProvider, DisappearTuning, FeatureFlags, GeneratorConfig, HazardTuning,
    LaneId, MaterialDescriptor, MotionTuning, SegmentMotion, SegmentPlan, SegmentTuning,
    TileMaterial, TilePlan, TileTuning,
};
use lava_runner_system_spawn_rules::{SpawnRuleEngine, TileContext};
use rand::Rng;

pub mod collision;
pub mod materials;
pub mod overlap;
mod sampling;
pub mod variants;

pub use overlap::{OccupiedSpan, OverlapResolver};

/// Where a lane currently ends, as seen by the generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneCursor {
    /// Lane being extended.
    pub lane: LaneId,
    /// Right boundary of the furthest segment appended so far.
    pub frontier_x: f32,
    /// Height of the most recently appended segment.
    pub last_height: f32,
    /// Base height of the lane.
    pub base_height: f32,
    /// Multiplier applied to generated gaps.
    pub gap_multiplier: f32,
    /// Whether the lane opens with the safe start segment.
    pub is_start_lane: bool,
    /// Number of segments appended to the lane so far.
    pub appended: u64,
}

impl LaneCursor {
    /// Whether the next segment of this lane is the safe start segment.
    #[must_use]
    pub fn next_is_start(&self) -> bool {
        self.is_start_lane && self.appended == 0
    }

    /// Advances the cursor past a planned segment.
    pub fn advance(&mut self, plan: &SegmentPlan) {
        self.frontier_x = plan.end_x();
        self.last_height = plan.height;
        self.appended = self.appended.saturating_add(1);
    }
}

/// Session facts consulted while planning.
#[derive(Clone, Copy)]
pub struct GenerationContext<'a> {
    /// Generation origin on the X axis.
    pub origin_x: f32,
    /// Session time used for difficulty scaling.
    pub elapsed: Duration,
    /// Source of tile collision outlines.
    pub geometry: &'a dyn CollisionGeometryProvider,
}

/// Stateless planner for new segments.
#[derive(Clone, Debug)]
pub struct SegmentGenerator {
    features: FeatureFlags,
    tiles: TileTuning,
    segments: SegmentTuning,
    hazard: HazardTuning,
    motion: MotionTuning,
    disappearing: DisappearTuning,
    overlap: OverlapResolver,
    spawns: SpawnRuleEngine,
}

impl SegmentGenerator {
    /// Creates a generator from the full configuration.
    #[must_use]
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            features: config.features.clone(),
            tiles: config.tiles.clone(),
            segments: config.segments.clone(),
            hazard: config.hazard.clone(),
            motion: config.motion.clone(),
            disappearing: config.disappearing.clone(),
            overlap: OverlapResolver::new(&config.overlap),
            spawns: SpawnRuleEngine::new(
                config.spawns.clone(),
                config.features.difficulty_scaling,
            ),
        }
    }

    /// Plans the segment that follows `lane`.
    ///
    /// `occupied` lists the spans of every live segment plus the segments
    /// planned earlier in the same tick.
    pub fn plan_next<R>(
        &self,
        lane: &LaneCursor,
        occupied: &[OccupiedSpan],
        context: &GenerationContext<'_>,
        rng: &mut R,
    ) -> SegmentPlan
    where
        R: Rng + ?Sized,
    {
        let is_start = lane.next_is_start();
        let tile_width = sampling::finite_or_zero(self.tiles.width);

        let gap = if is_start {
            0.0
        } else {
            let gap = sampling::uniform(rng, self.segments.min_gap, self.segments.max_gap);
            gap.max(0.0) * lane.gap_multiplier.max(0.0)
        };
        let start_x = lane.frontier_x + gap;

        let band = self.height_band(lane.base_height);
        let candidate = if is_start {
            lane.base_height
        } else {
            let step = sampling::uniform(
                rng,
                -self.segments.max_step_down.abs(),
                self.segments.max_step_up.abs(),
            );
            (lane.last_height + step).clamp(band.0, band.1)
        };

        let core_count = if is_start {
            self.segments.start_platform_tiles.max(1)
        } else {
            sampling::uniform_count(rng, self.segments.min_tiles, self.segments.max_tiles).max(1)
        };
        let core_count = core_count as usize;

        let core_materials = if is_start {
            vec![TileMaterial::Grass; core_count]
        } else {
            let chance = materials::hazard_chance(
                &self.hazard,
                self.features.difficulty_scaling,
                context.elapsed,
            );
            materials::core_materials(core_count, &self.hazard, chance, rng)
        };

        let visual_count = core_count + 2;
        let end_x = start_x + visual_count as f32 * tile_width;
        let height = if is_start {
            candidate
        } else {
            self.overlap.resolve(lane.lane, start_x, end_x, candidate, band, occupied)
        };

        let visual = visual_materials(&core_materials);
        let variants = variants::classify(&visual);
        let mut tiles: Vec<TilePlan> = visual
            .iter()
            .zip(variants)
            .enumerate()
            .map(|(index, (material, variant))| {
                let descriptor = MaterialDescriptor::new(*material, variant);
                TilePlan {
                    position: Vec2::new(start_x + index as f32 * tile_width, height),
                    descriptor,
                    is_edge: index == 0 || index == visual_count - 1,
                    collision: collision::tile_collision(
                        descriptor,
                        &self.tiles,
                        &self.hazard,
                        context.geometry,
                    ),
                    disappearing: None,
                }
            })
            .collect();

        let motion = self.roll_motion(is_start, rng);
        self.roll_disappearing(is_start, &mut tiles, rng);

        let mut objects = Vec::new();
        if !is_start {
            let mut counters = self.spawns.counters();
            for (index, tile) in tiles.iter().enumerate() {
                if tile.is_edge {
                    continue;
                }
                let tile_context = TileContext {
                    tile_index: index,
                    material: tile.descriptor.material,
                    position: tile.position,
                    distance_from_origin: tile.position.x - context.origin_x,
                    is_start_segment: is_start,
                };
                if let Some(object) =
                    self.spawns
                        .resolve_tile(&tile_context, &mut counters, context.elapsed, rng)
                {
                    objects.push(object);
                }
            }
        }

        tracing::debug!(
            lane = lane.lane.get(),
            start_x,
            end_x,
            height,
            core = core_count,
            objects = objects.len(),
            moving = motion.is_some(),
            "planned segment"
        );

        SegmentPlan {
            start_x,
            tile_width,
            height,
            is_start,
            core_materials,
            tiles,
            motion,
            objects,
        }
    }

    fn height_band(&self, base_height: f32) -> (f32, f32) {
        let (low, high) = sampling::ordered(self.segments.min_height, self.segments.max_height);
        let base_height = sampling::finite_or_zero(base_height);
        (base_height + low, base_height + high)
    }

    fn roll_motion<R>(&self, is_start: bool, rng: &mut R) -> Option<SegmentMotion>
    where
        R: Rng + ?Sized,
    {
        if is_start || !self.features.moving_segments || !sampling::chance(rng, self.motion.chance)
        {
            return None;
        }
        Some(SegmentMotion {
            axis: self.motion.axis,
            amplitude: sampling::uniform(rng, self.motion.min_amplitude, self.motion.max_amplitude),
            speed: sampling::uniform(rng, self.motion.min_speed, self.motion.max_speed),
            phase: sampling::uniform_below(rng, self.motion.max_phase),
        })
    }

    fn roll_disappearing<R>(&self, is_start: bool, tiles: &mut [TilePlan], rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        if !self.features.disappearing_tiles
            || (is_start && !self.disappearing.allow_on_start_segment)
        {
            return;
        }
        let settings = self.disappearing.settings();
        for tile in tiles
            .iter_mut()
            .filter(|tile| tile.descriptor.material == TileMaterial::Grass)
        {
            if sampling::chance(rng, self.disappearing.chance) {
                tile.disappearing = Some(settings);
            }
        }
    }
}

fn visual_materials(core: &[TileMaterial]) -> Vec<TileMaterial> {
    let (Some(first), Some(last)) = (core.first(), core.last()) else {
        return Vec::new();
    };
    let mut visual = Vec::with_capacity(core.len() + 2);
    visual.push(*first);
    visual.extend_from_slice(core);
    visual.push(*last);
    visual
}
