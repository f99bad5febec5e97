#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Keeps every lane generated ahead of the player and trims segments left behind.
//!
//! The lifecycle system owns the session's random stream. Each `TimeAdvanced`
//! event triggers one generation pass followed by one cleanup pass; both only
//! emit commands, so the world stays the single authority over lane state.

use std::collections::BTreeSet;
use std::time::Duration;

use lava_runner_core::{
    CollisionGeometryProvider, Command, Event, GeneratorConfig, LaneId, StreamingTuning,
};
use lava_runner_system_segment_generation::{
    GenerationContext, LaneCursor, OccupiedSpan, SegmentGenerator,
};
use lava_runner_world::query::{LaneSnapshot, LaneView, SegmentView};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded random stream shared by every generation decision of a session.
#[derive(Clone, Debug)]
pub struct GeneratorState {
    seed: u64,
    rng: ChaCha8Rng,
}

impl GeneratorState {
    /// Creates the stream for `seed`, drawing one from OS entropy when absent.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        let seed = match seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random();
                tracing::info!(seed, "no seed configured; drew one from entropy");
                seed
            }
        };
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed the stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewinds the stream to its initial position.
    pub fn reseed(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }
}

/// Pure system that streams segments in front of the player and culls those behind.
pub struct Lifecycle {
    generator: SegmentGenerator,
    streaming: StreamingTuning,
    geometry: Box<dyn CollisionGeometryProvider>,
    state: GeneratorState,
    stalled: BTreeSet<LaneId>,
}

impl Lifecycle {
    /// Creates the lifecycle system from configuration and a collision geometry source.
    #[must_use]
    pub fn new(config: &GeneratorConfig, geometry: Box<dyn CollisionGeometryProvider>) -> Self {
        Self {
            generator: SegmentGenerator::new(config),
            streaming: config.streaming.clone(),
            geometry,
            state: GeneratorState::new(config.seed),
            stalled: BTreeSet::new(),
        }
    }

    /// Seed driving the generation stream.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.state.seed()
    }

    /// Whether `lane` stopped advancing because its planned segments have no usable extent.
    #[must_use]
    pub fn is_stalled(&self, lane: LaneId) -> bool {
        self.stalled.contains(&lane)
    }

    /// Restores the initial random stream and forgets stalled lanes.
    pub fn reset(&mut self) {
        self.state.reseed();
        self.stalled.clear();
    }

    /// Consumes world events and emits append and removal commands.
    ///
    /// `lanes` and `segments` must reflect the world after the events were produced.
    pub fn handle(
        &mut self,
        events: &[Event],
        lanes: &LaneView,
        segments: &SegmentView,
        origin_x: f32,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::LanesConfigured { .. } => self.stalled.clear(),
                Event::TimeAdvanced {
                    elapsed, player_x, ..
                } => {
                    self.ensure_generated_ahead(
                        *player_x, *elapsed, lanes, segments, origin_x, out,
                    );
                    self.cleanup_behind(*player_x, segments, out);
                }
                _ => {}
            }
        }
    }

    fn ensure_generated_ahead(
        &mut self,
        player_x: f32,
        elapsed: Duration,
        lanes: &LaneView,
        segments: &SegmentView,
        origin_x: f32,
        out: &mut Vec<Command>,
    ) {
        let horizon = player_x + self.streaming.ahead_distance;
        let budget = self.streaming.max_segments_per_tick.max(1);
        let context = GenerationContext {
            origin_x,
            elapsed,
            geometry: self.geometry.as_ref(),
        };

        let mut occupied: Vec<OccupiedSpan> = segments
            .iter()
            .map(|segment| OccupiedSpan {
                lane: segment.lane,
                start_x: segment.start_x,
                end_x: segment.end_x,
                height: segment.height,
            })
            .collect();

        for snapshot in lanes.iter() {
            if self.stalled.contains(&snapshot.id) {
                continue;
            }
            let mut cursor = cursor_for(snapshot);
            let mut planned = 0;
            while cursor.frontier_x < horizon {
                if planned == budget {
                    tracing::debug!(
                        lane = snapshot.id.get(),
                        frontier_x = cursor.frontier_x,
                        horizon,
                        "segment budget exhausted for this tick"
                    );
                    break;
                }
                let plan = self
                    .generator
                    .plan_next(&cursor, &occupied, &context, &mut self.state.rng);
                let end_x = plan.end_x();
                if !(end_x.is_finite() && end_x > cursor.frontier_x && end_x > plan.start_x) {
                    tracing::warn!(
                        lane = snapshot.id.get(),
                        frontier_x = cursor.frontier_x,
                        "lane cannot advance; planned segments have no usable extent"
                    );
                    let _ = self.stalled.insert(snapshot.id);
                    break;
                }
                occupied.push(OccupiedSpan {
                    lane: snapshot.id,
                    start_x: plan.start_x,
                    end_x,
                    height: plan.height,
                });
                cursor.advance(&plan);
                planned += 1;
                out.push(Command::AppendSegment {
                    lane: snapshot.id,
                    plan,
                });
            }
        }
    }

    fn cleanup_behind(&self, player_x: f32, segments: &SegmentView, out: &mut Vec<Command>) {
        let cutoff = player_x - self.streaming.behind_distance;
        for segment in segments.iter().filter(|segment| segment.end_x < cutoff) {
            tracing::trace!(
                lane = segment.lane.get(),
                segment = segment.id.get(),
                end_x = segment.end_x,
                "segment fell behind the player"
            );
            out.push(Command::RemoveSegment {
                segment: segment.id,
            });
        }
    }
}

fn cursor_for(snapshot: &LaneSnapshot) -> LaneCursor {
    LaneCursor {
        lane: snapshot.id,
        frontier_x: snapshot.frontier_x,
        last_height: snapshot.last_height,
        base_height: snapshot.base_height,
        gap_multiplier: snapshot.gap_multiplier,
        is_start_lane: snapshot.is_start_lane,
        appended: snapshot.appended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reseed_rewinds_the_stream() {
        use rand::Rng;

        let mut state = GeneratorState::new(Some(42));
        let first: u64 = state.rng.gen();
        state.reseed();
        let again: u64 = state.rng.gen();
        assert_eq!(first, again);
        assert_eq!(state.seed(), 42);
    }
}
