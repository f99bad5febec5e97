#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative lane and segment state for the Lava Runner terrain generator.

use std::{collections::VecDeque, time::Duration};

use glam::Vec2;
use lava_runner_core::{
    AppendRejection, Command, DisappearSettings, Event, LaneId, LaneSetup, MaterialDescriptor,
    ObjectId, PrefabRef, SegmentId, SegmentMotion, SegmentPlan, SpawnCategory, TileCollision,
    TileId, TileMaterial,
};

/// Represents the authoritative terrain state shared by every system.
#[derive(Debug)]
pub struct World {
    lanes: Vec<Lane>,
    origin_x: f32,
    elapsed: Duration,
    player_x: f32,
    tick_index: u64,
    next_segment: u64,
    next_tile: u64,
    next_object: u64,
}

impl World {
    /// Creates an empty world without lanes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lanes: Vec::new(),
            origin_x: 0.0,
            elapsed: Duration::ZERO,
            player_x: 0.0,
            tick_index: 0,
            next_segment: 0,
            next_tile: 0,
            next_object: 0,
        }
    }

    fn lane_mut(&mut self, lane: LaneId) -> Option<&mut Lane> {
        self.lanes.iter_mut().find(|candidate| candidate.id == lane)
    }

    fn locate_segment(&self, segment: SegmentId) -> Option<(usize, usize)> {
        self.lanes.iter().enumerate().find_map(|(lane_index, lane)| {
            lane.segments
                .iter()
                .position(|candidate| candidate.id == segment)
                .map(|segment_index| (lane_index, segment_index))
        })
    }

    fn segment_mut(&mut self, segment: SegmentId) -> Option<&mut Segment> {
        self.lanes
            .iter_mut()
            .flat_map(|lane| lane.segments.iter_mut())
            .find(|candidate| candidate.id == segment)
    }

    fn tile_mut(&mut self, tile: TileId) -> Option<(SegmentId, &mut Tile)> {
        self.lanes
            .iter_mut()
            .flat_map(|lane| lane.segments.iter_mut())
            .find_map(|segment| {
                let owner = segment.id;
                segment
                    .tiles
                    .iter_mut()
                    .find(|candidate| candidate.id == tile)
                    .map(|found| (owner, found))
            })
    }

    fn allocate_segment(&mut self) -> SegmentId {
        let id = SegmentId::new(self.next_segment);
        self.next_segment = self.next_segment.wrapping_add(1);
        id
    }

    fn allocate_tile(&mut self) -> TileId {
        let id = TileId::new(self.next_tile);
        self.next_tile = self.next_tile.wrapping_add(1);
        id
    }

    fn allocate_object(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_object);
        self.next_object = self.next_object.wrapping_add(1);
        id
    }

    fn clear_lanes(&mut self, out_events: &mut Vec<Event>) {
        for lane in self.lanes.iter_mut() {
            while let Some(segment) = lane.segments.pop_front() {
                segment.emit_removal(lane.id, out_events);
            }
        }
        self.lanes.clear();
    }

    fn append(&mut self, lane_id: LaneId, plan: SegmentPlan, out_events: &mut Vec<Event>) {
        let end_x = plan.end_x();
        let Some(lane) = self.lanes.iter().find(|lane| lane.id == lane_id) else {
            out_events.push(Event::SegmentRejected {
                lane: lane_id,
                reason: AppendRejection::UnknownLane,
            });
            return;
        };

        if plan.tiles.is_empty() || !end_x.is_finite() || end_x <= plan.start_x {
            out_events.push(Event::SegmentRejected {
                lane: lane_id,
                reason: AppendRejection::Empty,
            });
            return;
        }

        if plan.start_x < lane.frontier_x {
            tracing::debug!(
                lane = lane_id.get(),
                start_x = plan.start_x,
                frontier_x = lane.frontier_x,
                "segment rejected behind frontier"
            );
            out_events.push(Event::SegmentRejected {
                lane: lane_id,
                reason: AppendRejection::BehindFrontier,
            });
            return;
        }

        let segment_id = self.allocate_segment();
        out_events.push(Event::SegmentCreated {
            lane: lane_id,
            segment: segment_id,
            start_x: plan.start_x,
            end_x,
            height: plan.height,
            is_start: plan.is_start,
            motion: plan.motion,
        });

        let mut tiles = Vec::with_capacity(plan.tiles.len());
        for tile_plan in plan.tiles {
            let tile_id = self.allocate_tile();
            out_events.push(Event::TileCreated {
                segment: segment_id,
                tile: tile_id,
                position: tile_plan.position,
                descriptor: tile_plan.descriptor,
                is_edge: tile_plan.is_edge,
                collision: tile_plan.collision.clone(),
                disappearing: tile_plan.disappearing,
            });
            tiles.push(Tile {
                id: tile_id,
                position: tile_plan.position,
                descriptor: tile_plan.descriptor,
                is_edge: tile_plan.is_edge,
                collision: tile_plan.collision,
                disappearing: tile_plan.disappearing,
                alpha: 1.0,
                solid: true,
            });
        }

        let mut objects = Vec::with_capacity(plan.objects.len());
        for object_plan in plan.objects {
            let Some(tile) = tiles.get(object_plan.tile_index) else {
                tracing::debug!(
                    segment = segment_id.get(),
                    tile_index = object_plan.tile_index,
                    "object references a tile outside its segment"
                );
                continue;
            };
            let tile_id = tile.id;
            let object_id = self.allocate_object();
            out_events.push(Event::ObjectSpawned {
                segment: segment_id,
                object: object_id,
                tile: tile_id,
                category: object_plan.category,
                rule_index: object_plan.rule_index,
                prefab: object_plan.prefab.clone(),
                position: object_plan.position,
            });
            objects.push(Object {
                id: object_id,
                tile: tile_id,
                category: object_plan.category,
                rule_index: object_plan.rule_index,
                prefab: object_plan.prefab,
                position: object_plan.position,
            });
        }

        let segment = Segment {
            id: segment_id,
            start_x: plan.start_x,
            end_x,
            height: plan.height,
            is_start: plan.is_start,
            tile_width: plan.tile_width,
            core_materials: plan.core_materials,
            motion: plan.motion,
            offset: Vec2::ZERO,
            tiles,
            objects,
        };

        if let Some(lane) = self.lane_mut(lane_id) {
            lane.frontier_x = end_x;
            lane.last_height = segment.height;
            lane.appended = lane.appended.saturating_add(1);
            lane.segments.push_back(segment);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureLanes { origin_x, lanes } => {
            world.clear_lanes(out_events);
            world.origin_x = origin_x;
            world.elapsed = Duration::ZERO;
            world.player_x = origin_x;
            world.tick_index = 0;

            let mut sorted = lanes;
            sorted.sort_by_key(|setup| setup.lane);
            sorted.dedup_by_key(|setup| setup.lane);
            world.lanes = sorted
                .into_iter()
                .map(|setup| Lane::from_setup(setup, origin_x))
                .collect();

            out_events.push(Event::LanesConfigured {
                lanes: world.lanes.iter().map(|lane| lane.id).collect(),
                origin_x,
            });
        }
        Command::Tick { dt, player_x } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            if player_x.is_finite() {
                world.player_x = player_x;
            }
            out_events.push(Event::TimeAdvanced {
                dt,
                elapsed: world.elapsed,
                player_x: world.player_x,
            });
        }
        Command::AppendSegment { lane, plan } => world.append(lane, plan, out_events),
        Command::RemoveSegment { segment } => {
            let Some((lane_index, segment_index)) = world.locate_segment(segment) else {
                return;
            };
            let lane = &mut world.lanes[lane_index];
            if let Some(removed) = lane.segments.remove(segment_index) {
                removed.emit_removal(lane.id, out_events);
            }
        }
        Command::TouchTile { tile } => {
            if let Some((segment, _)) = world.tile_mut(tile) {
                out_events.push(Event::TileTouched { segment, tile });
            }
        }
        Command::MoveSegment { segment, offset } => {
            if let Some(target) = world.segment_mut(segment) {
                target.offset = offset;
                out_events.push(Event::SegmentMoved { segment, offset });
            }
        }
        Command::SetTileVisibility { tile, alpha, solid } => {
            if let Some((_, target)) = world.tile_mut(tile) {
                let alpha = lava_runner_core::clamp_unit(alpha);
                if target.alpha == alpha && target.solid == solid {
                    return;
                }
                target.alpha = alpha;
                target.solid = solid;
                out_events.push(Event::TileVisibilityChanged { tile, alpha, solid });
            }
        }
    }
}

#[derive(Debug)]
struct Lane {
    id: LaneId,
    base_height: f32,
    gap_multiplier: f32,
    is_start_lane: bool,
    frontier_x: f32,
    last_height: f32,
    appended: u64,
    segments: VecDeque<Segment>,
}

impl Lane {
    fn from_setup(setup: LaneSetup, origin_x: f32) -> Self {
        Self {
            id: setup.lane,
            base_height: setup.base_height,
            gap_multiplier: setup.gap_multiplier,
            is_start_lane: setup.is_start_lane,
            frontier_x: origin_x,
            last_height: setup.base_height,
            appended: 0,
            segments: VecDeque::new(),
        }
    }
}

#[derive(Debug)]
struct Segment {
    id: SegmentId,
    start_x: f32,
    end_x: f32,
    height: f32,
    is_start: bool,
    tile_width: f32,
    core_materials: Vec<TileMaterial>,
    motion: Option<SegmentMotion>,
    offset: Vec2,
    tiles: Vec<Tile>,
    objects: Vec<Object>,
}

impl Segment {
    fn emit_removal(self, lane: LaneId, out_events: &mut Vec<Event>) {
        for object in &self.objects {
            out_events.push(Event::ObjectDestroyed {
                segment: self.id,
                object: object.id,
            });
        }
        for tile in &self.tiles {
            out_events.push(Event::TileDestroyed {
                segment: self.id,
                tile: tile.id,
            });
        }
        out_events.push(Event::SegmentRemoved {
            lane,
            segment: self.id,
        });
    }
}

#[derive(Debug)]
struct Tile {
    id: TileId,
    position: Vec2,
    descriptor: MaterialDescriptor,
    is_edge: bool,
    collision: TileCollision,
    disappearing: Option<DisappearSettings>,
    alpha: f32,
    solid: bool,
}

#[derive(Debug)]
struct Object {
    id: ObjectId,
    tile: TileId,
    category: SpawnCategory,
    rule_index: usize,
    prefab: PrefabRef,
    position: Vec2,
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use lava_runner_core::{
        DisappearSettings, LaneId, MaterialDescriptor, ObjectId, PrefabRef, SegmentId,
        SegmentMotion, SpawnCategory, TileCollision, TileId, TileMaterial,
    };

    use super::{Segment, Tile, World};

    /// Generation origin on the X axis.
    #[must_use]
    pub fn origin_x(world: &World) -> f32 {
        world.origin_x
    }

    /// Total simulated time since the lanes were configured.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Player X recorded by the most recent tick.
    #[must_use]
    pub fn player_x(world: &World) -> f32 {
        world.player_x
    }

    /// Number of ticks processed since the lanes were configured.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of every lane in index order.
    #[must_use]
    pub fn lane_view(world: &World) -> LaneView {
        let snapshots = world
            .lanes
            .iter()
            .map(|lane| LaneSnapshot {
                id: lane.id,
                base_height: lane.base_height,
                gap_multiplier: lane.gap_multiplier,
                is_start_lane: lane.is_start_lane,
                frontier_x: lane.frontier_x,
                last_height: lane.last_height,
                appended: lane.appended,
                segment_count: lane.segments.len(),
            })
            .collect();
        LaneView { snapshots }
    }

    /// Captures every live segment, lanes in index order and segments left to right.
    #[must_use]
    pub fn segment_view(world: &World) -> SegmentView {
        let snapshots = world
            .lanes
            .iter()
            .flat_map(|lane| {
                lane.segments
                    .iter()
                    .map(move |segment| snapshot_segment(lane.id, segment))
            })
            .collect();
        SegmentView { snapshots }
    }

    /// Captures a single segment, if it is still live.
    #[must_use]
    pub fn segment(world: &World, id: SegmentId) -> Option<SegmentSnapshot> {
        world.lanes.iter().find_map(|lane| {
            lane.segments
                .iter()
                .find(|segment| segment.id == id)
                .map(|segment| snapshot_segment(lane.id, segment))
        })
    }

    /// Captures a single tile, if its segment is still live.
    #[must_use]
    pub fn tile(world: &World, id: TileId) -> Option<TileSnapshot> {
        world
            .lanes
            .iter()
            .flat_map(|lane| lane.segments.iter())
            .find_map(|segment| {
                segment
                    .tiles
                    .iter()
                    .find(|tile| tile.id == id)
                    .map(|tile| snapshot_tile(segment.id, tile))
            })
    }

    fn snapshot_segment(lane: LaneId, segment: &Segment) -> SegmentSnapshot {
        SegmentSnapshot {
            id: segment.id,
            lane,
            start_x: segment.start_x,
            end_x: segment.end_x,
            height: segment.height,
            is_start: segment.is_start,
            tile_width: segment.tile_width,
            core_materials: segment.core_materials.clone(),
            motion: segment.motion,
            offset: segment.offset,
            tiles: segment
                .tiles
                .iter()
                .map(|tile| snapshot_tile(segment.id, tile))
                .collect(),
            objects: segment
                .objects
                .iter()
                .map(|object| ObjectSnapshot {
                    id: object.id,
                    tile: object.tile,
                    category: object.category,
                    rule_index: object.rule_index,
                    prefab: object.prefab.clone(),
                    position: object.position,
                })
                .collect(),
        }
    }

    fn snapshot_tile(segment: SegmentId, tile: &Tile) -> TileSnapshot {
        TileSnapshot {
            id: tile.id,
            segment,
            position: tile.position,
            descriptor: tile.descriptor,
            is_edge: tile.is_edge,
            collision: tile.collision.clone(),
            disappearing: tile.disappearing,
            alpha: tile.alpha,
            solid: tile.solid,
        }
    }

    /// Read-only snapshot describing all lanes.
    #[derive(Clone, Debug)]
    pub struct LaneView {
        snapshots: Vec<LaneSnapshot>,
    }

    impl LaneView {
        /// Iterator over the captured lanes in index order.
        pub fn iter(&self) -> impl Iterator<Item = &LaneSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<LaneSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single lane.
    #[derive(Clone, Debug, PartialEq)]
    pub struct LaneSnapshot {
        /// Identifier of the lane.
        pub id: LaneId,
        /// Base height configured for the lane.
        pub base_height: f32,
        /// Gap multiplier configured for the lane.
        pub gap_multiplier: f32,
        /// Whether the lane opens with the safe start segment.
        pub is_start_lane: bool,
        /// Right boundary of the furthest segment ever appended.
        pub frontier_x: f32,
        /// Height of the most recently appended segment.
        pub last_height: f32,
        /// Number of segments appended since the lane was configured.
        pub appended: u64,
        /// Number of segments currently live in the lane.
        pub segment_count: usize,
    }

    /// Read-only snapshot describing all live segments.
    #[derive(Clone, Debug)]
    pub struct SegmentView {
        snapshots: Vec<SegmentSnapshot>,
    }

    impl SegmentView {
        /// Iterator over the captured segments in deterministic order.
        pub fn iter(&self) -> impl Iterator<Item = &SegmentSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<SegmentSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single segment.
    #[derive(Clone, Debug, PartialEq)]
    pub struct SegmentSnapshot {
        /// Identifier of the segment.
        pub id: SegmentId,
        /// Lane that owns the segment.
        pub lane: LaneId,
        /// Left boundary in world units.
        pub start_x: f32,
        /// Right boundary in world units.
        pub end_x: f32,
        /// Vertical centre of the tiles.
        pub height: f32,
        /// Whether this is the safe start segment.
        pub is_start: bool,
        /// Width of one tile.
        pub tile_width: f32,
        /// Materials of the core tiles.
        pub core_materials: Vec<TileMaterial>,
        /// Oscillation attached to the segment.
        pub motion: Option<SegmentMotion>,
        /// Current displacement from the generated position.
        pub offset: Vec2,
        /// Every tile including edges, left to right.
        pub tiles: Vec<TileSnapshot>,
        /// Objects placed on the segment.
        pub objects: Vec<ObjectSnapshot>,
    }

    /// Immutable representation of a single tile.
    #[derive(Clone, Debug, PartialEq)]
    pub struct TileSnapshot {
        /// Identifier of the tile.
        pub id: TileId,
        /// Segment that owns the tile.
        pub segment: SegmentId,
        /// Generated anchor: left edge of the cell on X, vertical centre on Y.
        pub position: Vec2,
        /// Material and variant.
        pub descriptor: MaterialDescriptor,
        /// Whether the tile is a boundary tile.
        pub is_edge: bool,
        /// Collision volumes.
        pub collision: TileCollision,
        /// Disappearing behaviour, if any.
        pub disappearing: Option<DisappearSettings>,
        /// Current opacity.
        pub alpha: f32,
        /// Whether the solid collision volume is enabled.
        pub solid: bool,
    }

    /// Immutable representation of a spawned object.
    #[derive(Clone, Debug, PartialEq)]
    pub struct ObjectSnapshot {
        /// Identifier of the object.
        pub id: ObjectId,
        /// Tile carrying the object.
        pub tile: TileId,
        /// Category of the spawning rule.
        pub category: SpawnCategory,
        /// Index of the spawning rule within its category.
        pub rule_index: usize,
        /// Prefab instantiated for the object.
        pub prefab: PrefabRef,
        /// Spawn position in world units.
        pub position: Vec2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lava_runner_core::{Aabb, ColliderShape, ObjectPlan, TilePlan, TileVariant};

    fn lane_setup(index: u32) -> LaneSetup {
        LaneSetup {
            lane: LaneId::new(index),
            base_height: index as f32 * 4.0,
            gap_multiplier: 1.0,
            is_start_lane: index == 0,
        }
    }

    fn configured_world(lanes: u32) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureLanes {
                origin_x: 0.0,
                lanes: (0..lanes).map(lane_setup).collect(),
            },
            &mut events,
        );
        world
    }

    fn grass_plan(start_x: f32, core: usize) -> SegmentPlan {
        let tiles = (0..core + 2)
            .map(|index| TilePlan {
                position: Vec2::new(start_x + index as f32, 0.0),
                descriptor: MaterialDescriptor::new(TileMaterial::Grass, TileVariant::Middle),
                is_edge: index == 0 || index == core + 1,
                collision: TileCollision {
                    solid: ColliderShape::Rect(Aabb::centered(Vec2::ONE)),
                    kill_band: None,
                },
                disappearing: None,
            })
            .collect();
        SegmentPlan {
            start_x,
            tile_width: 1.0,
            height: 0.0,
            is_start: false,
            core_materials: vec![TileMaterial::Grass; core],
            tiles,
            motion: None,
            objects: vec![ObjectPlan {
                tile_index: 1,
                category: SpawnCategory::Bonus,
                rule_index: 0,
                prefab: PrefabRef::new("coin"),
                position: Vec2::new(start_x + 1.0, 0.5),
            }],
        }
    }

    #[test]
    fn configure_lanes_orders_and_deduplicates() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureLanes {
                origin_x: 2.0,
                lanes: vec![lane_setup(1), lane_setup(0), lane_setup(1)],
            },
            &mut events,
        );

        let lanes = query::lane_view(&world).into_vec();
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[0].id, LaneId::new(0));
        assert_eq!(lanes[1].frontier_x, 2.0);
        assert_eq!(
            events,
            vec![Event::LanesConfigured {
                lanes: vec![LaneId::new(0), LaneId::new(1)],
                origin_x: 2.0,
            }]
        );
    }

    #[test]
    fn append_advances_frontier_and_emits_creation() {
        let mut world = configured_world(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(0),
                plan: grass_plan(1.5, 4),
            },
            &mut events,
        );

        assert!(matches!(
            events[0],
            Event::SegmentCreated { start_x, end_x, .. } if start_x == 1.5 && end_x == 7.5
        ));
        let tiles = events
            .iter()
            .filter(|event| matches!(event, Event::TileCreated { .. }))
            .count();
        assert_eq!(tiles, 6);
        assert!(matches!(events.last(), Some(Event::ObjectSpawned { .. })));

        let lane = &query::lane_view(&world).into_vec()[0];
        assert_eq!(lane.frontier_x, 7.5);
        assert_eq!(lane.appended, 1);
        assert_eq!(lane.segment_count, 1);
    }

    #[test]
    fn append_behind_frontier_is_rejected() {
        let mut world = configured_world(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(0),
                plan: grass_plan(0.0, 4),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(0),
                plan: grass_plan(3.0, 4),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SegmentRejected {
                lane: LaneId::new(0),
                reason: AppendRejection::BehindFrontier,
            }]
        );

        events.clear();
        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(7),
                plan: grass_plan(10.0, 4),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SegmentRejected {
                lane: LaneId::new(7),
                reason: AppendRejection::UnknownLane,
            }]
        );
    }

    #[test]
    fn append_without_tiles_is_rejected() {
        let mut world = configured_world(1);
        let mut events = Vec::new();
        let mut plan = grass_plan(0.0, 4);
        plan.tiles.clear();
        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(0),
                plan,
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::SegmentRejected {
                lane: LaneId::new(0),
                reason: AppendRejection::Empty,
            }]
        );
    }

    #[test]
    fn removal_emits_destruction_exactly_once() {
        let mut world = configured_world(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(0),
                plan: grass_plan(0.0, 2),
            },
            &mut events,
        );
        let segment = query::segment_view(&world).into_vec()[0].id;
        events.clear();

        apply(&mut world, Command::RemoveSegment { segment }, &mut events);
        apply(&mut world, Command::RemoveSegment { segment }, &mut events);

        let removed = events
            .iter()
            .filter(|event| matches!(event, Event::SegmentRemoved { .. }))
            .count();
        let tiles = events
            .iter()
            .filter(|event| matches!(event, Event::TileDestroyed { .. }))
            .count();
        assert_eq!(removed, 1);
        assert_eq!(tiles, 4);
        assert!(matches!(events[0], Event::ObjectDestroyed { .. }));
        assert_eq!(query::lane_view(&world).into_vec()[0].frontier_x, 4.0);
    }

    #[test]
    fn reconfiguring_removes_live_segments_first() {
        let mut world = configured_world(2);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(1),
                plan: grass_plan(0.0, 2),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::ConfigureLanes {
                origin_x: 0.0,
                lanes: vec![lane_setup(0)],
            },
            &mut events,
        );

        assert!(matches!(
            events.iter().rev().nth(1),
            Some(Event::SegmentRemoved { lane, .. }) if *lane == LaneId::new(1)
        ));
        assert!(matches!(events.last(), Some(Event::LanesConfigured { .. })));
        assert!(query::segment_view(&world).into_vec().is_empty());
    }

    #[test]
    fn tick_accumulates_elapsed_time() {
        let mut world = configured_world(1);
        let mut events = Vec::new();
        for _ in 0..3 {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(250),
                    player_x: 4.0,
                },
                &mut events,
            );
        }
        assert_eq!(query::elapsed(&world), Duration::from_millis(750));
        assert_eq!(query::player_x(&world), 4.0);
        assert_eq!(query::tick_index(&world), 3);
        assert!(matches!(
            events.last(),
            Some(Event::TimeAdvanced { elapsed, .. }) if *elapsed == Duration::from_millis(750)
        ));
    }

    #[test]
    fn visibility_changes_are_reported_once() {
        let mut world = configured_world(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(0),
                plan: grass_plan(0.0, 2),
            },
            &mut events,
        );
        let tile = query::segment_view(&world).into_vec()[0].tiles[1].id;
        events.clear();

        let hide = Command::SetTileVisibility {
            tile,
            alpha: 0.0,
            solid: false,
        };
        apply(&mut world, hide.clone(), &mut events);
        apply(&mut world, hide, &mut events);

        assert_eq!(events.len(), 1);
        let snapshot = query::tile(&world, tile).expect("tile is live");
        assert_eq!(snapshot.alpha, 0.0);
        assert!(!snapshot.solid);
    }

    #[test]
    fn touch_reports_owning_segment() {
        let mut world = configured_world(1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AppendSegment {
                lane: LaneId::new(0),
                plan: grass_plan(0.0, 2),
            },
            &mut events,
        );
        let segment = query::segment_view(&world).into_vec()[0].clone();
        events.clear();

        apply(
            &mut world,
            Command::TouchTile {
                tile: segment.tiles[2].id,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::TouchTile {
                tile: TileId::new(999),
            },
            &mut events,
        );
        assert_eq!(
            events,
            vec![Event::TileTouched {
                segment: segment.id,
                tile: segment.tiles[2].id,
            }]
        );
    }
}
