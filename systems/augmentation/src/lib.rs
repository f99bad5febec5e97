#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick augmentation of generated terrain: moving segments and disappearing tiles.

use std::collections::BTreeMap;

use lava_runner_core::{
    Command, DisappearScope, DisappearSettings, Event, SegmentId, SegmentMotion, TileId,
    TileMaterial,
};

mod disappear;

use disappear::{DisappearMachine, Presentation};
pub use disappear::DisappearPhase;

/// Identifies the owner of a shared state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum MachineKey {
    Tile(TileId),
    Segment(SegmentId),
}

#[derive(Clone, Copy, Debug)]
struct TrackedTile {
    id: TileId,
    material: TileMaterial,
}

#[derive(Clone, Debug)]
struct FadeGroup {
    machine: DisappearMachine,
    presented: Presentation,
}

/// Pure system that animates moving segments and runs disappearing tile timers.
#[derive(Debug, Default)]
pub struct Augmentation {
    motions: BTreeMap<SegmentId, SegmentMotion>,
    segment_tiles: BTreeMap<SegmentId, Vec<TrackedTile>>,
    triggers: BTreeMap<TileId, MachineKey>,
    groups: BTreeMap<MachineKey, FadeGroup>,
}

impl Augmentation {
    /// Creates an augmentation system without any tracked segments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and emits motion and visibility commands.
    ///
    /// Touches are applied in event order, so a touch reported before a tick's
    /// `TimeAdvanced` starts its countdown with that tick.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::LanesConfigured { .. } => self.clear(),
                Event::SegmentCreated {
                    segment, motion, ..
                } => {
                    if let Some(motion) = motion {
                        let _ = self.motions.insert(*segment, *motion);
                    }
                    let _ = self.segment_tiles.insert(*segment, Vec::new());
                }
                Event::TileCreated {
                    segment,
                    tile,
                    descriptor,
                    disappearing,
                    ..
                } => {
                    self.track_tile(*segment, *tile, descriptor.material, *disappearing);
                }
                Event::TileTouched { segment, tile } => self.touch(*segment, *tile),
                Event::TimeAdvanced { dt, elapsed, .. } => {
                    for (segment, motion) in &self.motions {
                        out.push(Command::MoveSegment {
                            segment: *segment,
                            offset: motion.displacement(*elapsed),
                        });
                    }
                    for group in self.groups.values_mut() {
                        group.machine.advance(*dt);
                    }
                    self.publish(out);
                }
                Event::TileDestroyed { tile, .. } => {
                    let _ = self.triggers.remove(tile);
                    let _ = self.groups.remove(&MachineKey::Tile(*tile));
                }
                Event::SegmentRemoved { segment, .. } => self.forget_segment(*segment),
                _ => {}
            }
        }
    }

    /// Phase of the state machine governing `tile`, if the tile disappears.
    #[must_use]
    pub fn phase(&self, tile: TileId) -> Option<DisappearPhase> {
        self.triggers
            .get(&tile)
            .and_then(|key| self.groups.get(key))
            .map(|group| group.machine.phase())
    }

    /// Number of segments currently animated by motion.
    #[must_use]
    pub fn moving_segments(&self) -> usize {
        self.motions.len()
    }

    fn clear(&mut self) {
        self.motions.clear();
        self.segment_tiles.clear();
        self.triggers.clear();
        self.groups.clear();
    }

    fn track_tile(
        &mut self,
        segment: SegmentId,
        tile: TileId,
        material: TileMaterial,
        disappearing: Option<DisappearSettings>,
    ) {
        self.segment_tiles
            .entry(segment)
            .or_default()
            .push(TrackedTile { id: tile, material });

        let Some(settings) = disappearing else {
            return;
        };
        let key = match settings.scope {
            DisappearScope::Tile => MachineKey::Tile(tile),
            DisappearScope::WholeSegment => MachineKey::Segment(segment),
        };
        let _ = self.groups.entry(key).or_insert_with(|| FadeGroup {
            machine: DisappearMachine::new(settings),
            presented: Presentation {
                alpha: 1.0,
                solid: true,
            },
        });
        let _ = self.triggers.insert(tile, key);
    }

    fn touch(&mut self, segment: SegmentId, tile: TileId) {
        let Some(key) = self.triggers.get(&tile) else {
            return;
        };
        if let Some(group) = self.groups.get_mut(key) {
            if group.machine.trigger() {
                tracing::debug!(
                    segment = segment.get(),
                    tile = tile.get(),
                    "disappearing tile triggered"
                );
            }
        }
    }

    fn publish(&mut self, out: &mut Vec<Command>) {
        for (key, group) in self.groups.iter_mut() {
            let presentation = group.machine.presentation();
            if presentation == group.presented {
                continue;
            }
            group.presented = presentation;

            match key {
                MachineKey::Tile(tile) => out.push(Command::SetTileVisibility {
                    tile: *tile,
                    alpha: presentation.alpha,
                    solid: presentation.solid,
                }),
                MachineKey::Segment(segment) => {
                    let exempt_hazards = group.machine.settings().exempt_hazard_tiles;
                    let members = self.segment_tiles.get(segment).map(Vec::as_slice);
                    for member in members.unwrap_or_default() {
                        let exempt = exempt_hazards && member.material == TileMaterial::Hazard;
                        out.push(Command::SetTileVisibility {
                            tile: member.id,
                            alpha: presentation.alpha,
                            solid: presentation.solid || exempt,
                        });
                    }
                }
            }
        }
    }

    fn forget_segment(&mut self, segment: SegmentId) {
        let _ = self.motions.remove(&segment);
        let _ = self.groups.remove(&MachineKey::Segment(segment));
        if let Some(tiles) = self.segment_tiles.remove(&segment) {
            for tile in tiles {
                let _ = self.triggers.remove(&tile.id);
                let _ = self.groups.remove(&MachineKey::Tile(tile.id));
            }
        }
    }
}
