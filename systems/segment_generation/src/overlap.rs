//! Vertical separation between horizontally overlapping segments of different lanes.

use lava_runner_core::{LaneId, OverlapTuning};

use crate::sampling::{finite_or_zero, ordered};

/// Horizontal extent and height of a segment that already exists or was planned this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OccupiedSpan {
    /// Lane owning the segment.
    pub lane: LaneId,
    /// Left boundary in world units.
    pub start_x: f32,
    /// Right boundary in world units.
    pub end_x: f32,
    /// Vertical centre of the segment.
    pub height: f32,
}

/// Nudges candidate heights away from nearby segments, best effort.
#[derive(Clone, Copy, Debug)]
pub struct OverlapResolver {
    min_vertical_distance: f32,
    max_attempts: u32,
}

impl OverlapResolver {
    /// Creates a resolver from tuning, flooring a negative distance at zero.
    #[must_use]
    pub fn new(tuning: &OverlapTuning) -> Self {
        Self {
            min_vertical_distance: finite_or_zero(tuning.min_vertical_distance).max(0.0),
            max_attempts: tuning.max_relocate_attempts,
        }
    }

    /// Whether a candidate at `height` spanning `[start_x, end_x)` crowds `span`.
    #[must_use]
    pub fn is_too_close(&self, span: &OccupiedSpan, start_x: f32, end_x: f32, height: f32) -> bool {
        span.end_x > start_x
            && span.start_x < end_x
            && (span.height - height).abs() < self.min_vertical_distance
    }

    /// Accepted height for the candidate.
    ///
    /// Only spans owned by lanes other than `lane` are considered. Attempts
    /// alternate `+d, -d, +2d, -2d, ...` around `candidate`, each clamped into
    /// `band`. When every attempt is crowded the last one wins.
    #[must_use]
    pub fn resolve(
        &self,
        lane: LaneId,
        start_x: f32,
        end_x: f32,
        candidate: f32,
        band: (f32, f32),
        occupied: &[OccupiedSpan],
    ) -> f32 {
        let is_clear = |height: f32| {
            !occupied
                .iter()
                .filter(|span| span.lane != lane)
                .any(|span| self.is_too_close(span, start_x, end_x, height))
        };

        if is_clear(candidate) {
            return candidate;
        }

        let (low, high) = ordered(band.0, band.1);
        let mut attempt = candidate;
        for index in 1..=self.max_attempts {
            let magnitude = ((index + 1) / 2) as f32 * self.min_vertical_distance;
            let offset = if index % 2 == 1 { magnitude } else { -magnitude };
            attempt = (candidate + offset).clamp(low, high);
            if is_clear(attempt) {
                return attempt;
            }
        }

        tracing::trace!(
            lane = lane.get(),
            candidate,
            accepted = attempt,
            start_x,
            "overlap relocation exhausted; keeping last attempt"
        );
        attempt
    }
}
