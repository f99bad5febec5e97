#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lava Runner terrain generator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values.
//! The event stream doubles as the create/destroy request stream consumed by
//! an [`EntityFactory`] living in the host game.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod config;

pub use config::{
    CategoryRules, ConfigError, DisappearTuning, FeatureFlags, GeneratorConfig, HazardTuning,
    LaneLayout, LaneTuning, MotionTuning, OverlapTuning, SegmentTuning, SpawnCatalog, SpawnRule,
    StreamingTuning, TileTuning,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards every lane and segment and rebuilds the lane layout.
    ConfigureLanes {
        /// World X coordinate where generation begins; spawn distances are measured from it.
        origin_x: f32,
        /// Lanes to create, in index order.
        lanes: Vec<LaneSetup>,
    },
    /// Advances the simulation clock and records the sampled player position.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
        /// Player world X coordinate sampled for this tick.
        player_x: f32,
    },
    /// Registers a fully planned segment at the end of a lane.
    AppendSegment {
        /// Lane receiving the segment.
        lane: LaneId,
        /// Complete description of the segment, its tiles, and its objects.
        plan: SegmentPlan,
    },
    /// Removes a segment together with its tiles and objects.
    RemoveSegment {
        /// Identifier of the segment to remove.
        segment: SegmentId,
    },
    /// Reports that the player made contact with a tile.
    TouchTile {
        /// Identifier of the touched tile.
        tile: TileId,
    },
    /// Moves a segment rigidly relative to its generated position.
    MoveSegment {
        /// Identifier of the moving segment.
        segment: SegmentId,
        /// Displacement from the generated position.
        offset: Vec2,
    },
    /// Updates the fade alpha and collision state of a tile.
    SetTileVisibility {
        /// Identifier of the tile to update.
        tile: TileId,
        /// Opacity in the range 0.0..=1.0.
        alpha: f32,
        /// Whether the tile's solid collision volume is enabled.
        solid: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Event {
    /// Announces that the lane layout was rebuilt.
    LanesConfigured {
        /// Identifiers of the lanes that now exist.
        lanes: Vec<LaneId>,
        /// Generation origin on the X axis.
        origin_x: f32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Total simulated time since the lanes were configured.
        elapsed: Duration,
        /// Player world X coordinate sampled for the tick.
        player_x: f32,
    },
    /// Confirms that a segment was appended to a lane.
    SegmentCreated {
        /// Lane that owns the segment.
        lane: LaneId,
        /// Identifier assigned to the segment.
        segment: SegmentId,
        /// Left boundary of the segment in world units.
        start_x: f32,
        /// Right boundary of the segment in world units.
        end_x: f32,
        /// Vertical centre of the segment's tiles.
        height: f32,
        /// Whether this is the safe start segment.
        is_start: bool,
        /// Oscillation attached to the segment, if any.
        motion: Option<SegmentMotion>,
    },
    /// Requests creation of a tile entity.
    TileCreated {
        /// Segment that owns the tile.
        segment: SegmentId,
        /// Identifier assigned to the tile.
        tile: TileId,
        /// Tile anchor in world units: left edge of its cell on X, vertical centre on Y.
        position: Vec2,
        /// Material and neighbour-derived variant of the tile.
        descriptor: MaterialDescriptor,
        /// Whether the tile is a boundary tile of its segment.
        is_edge: bool,
        /// Collision volumes attached to the tile.
        collision: TileCollision,
        /// Disappearing behaviour attached to the tile, if any.
        disappearing: Option<DisappearSettings>,
    },
    /// Requests creation of a trap, bonus, or debuff entity.
    ObjectSpawned {
        /// Segment that owns the object.
        segment: SegmentId,
        /// Identifier assigned to the object.
        object: ObjectId,
        /// Tile the object was placed on.
        tile: TileId,
        /// Category the spawning rule belongs to.
        category: SpawnCategory,
        /// Index of the spawning rule within its category.
        rule_index: usize,
        /// Prefab the host should instantiate.
        prefab: PrefabRef,
        /// Spawn position in world units.
        position: Vec2,
    },
    /// Reports that an append request was rejected.
    SegmentRejected {
        /// Lane named in the request.
        lane: LaneId,
        /// Specific reason the request failed.
        reason: AppendRejection,
    },
    /// Confirms that a segment moved relative to its generated position.
    SegmentMoved {
        /// Identifier of the moved segment.
        segment: SegmentId,
        /// Displacement from the generated position.
        offset: Vec2,
    },
    /// Confirms that the player touched a tile.
    TileTouched {
        /// Segment that owns the tile.
        segment: SegmentId,
        /// Identifier of the touched tile.
        tile: TileId,
    },
    /// Confirms that a tile's fade alpha or collision state changed.
    TileVisibilityChanged {
        /// Identifier of the tile.
        tile: TileId,
        /// Opacity in the range 0.0..=1.0.
        alpha: f32,
        /// Whether the tile's solid collision volume is enabled.
        solid: bool,
    },
    /// Requests destruction of an object entity.
    ObjectDestroyed {
        /// Segment that owned the object.
        segment: SegmentId,
        /// Identifier of the destroyed object.
        object: ObjectId,
    },
    /// Requests destruction of a tile entity.
    TileDestroyed {
        /// Segment that owned the tile.
        segment: SegmentId,
        /// Identifier of the destroyed tile.
        tile: TileId,
    },
    /// Confirms that a segment left its lane.
    SegmentRemoved {
        /// Lane that owned the segment.
        lane: LaneId,
        /// Identifier of the removed segment.
        segment: SegmentId,
    },
}

/// Unique identifier assigned to a lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneId(u32);

impl LaneId {
    /// Creates a new lane identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(u64);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier assigned to a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u64);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Unique identifier assigned to a spawned object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Creates a new object identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Opaque handle returned by the host's [`EntityFactory`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(u64);

impl EntityHandle {
    /// Wraps a host-side entity identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the host-side identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Surface material of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileMaterial {
    /// Safe walkable surface.
    Grass,
    /// Lethal lava surface; walkable geometry plus a kill band.
    Hazard,
}

/// Visual placement of a tile relative to its neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileVariant {
    /// Left boundary tile of a segment.
    LeftEdge,
    /// Interior tile surrounded by the same material.
    Middle,
    /// First interior tile after a run of the other material.
    FromOther,
    /// Last interior tile before a run of the other material.
    IntoOther,
    /// Right boundary tile of a segment.
    RightEdge,
}

/// Material descriptor handed to the entity factory and collision provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialDescriptor {
    /// Surface material of the tile.
    pub material: TileMaterial,
    /// Neighbour-derived variant used to select art.
    pub variant: TileVariant,
}

impl MaterialDescriptor {
    /// Creates a descriptor from a material and its variant.
    #[must_use]
    pub const fn new(material: TileMaterial, variant: TileVariant) -> Self {
        Self { material, variant }
    }
}

/// Category of a spawnable gameplay object, listed in evaluation priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpawnCategory {
    /// Harmful objects such as saw blades.
    Trap,
    /// Pickups that help the player.
    Bonus,
    /// Pickups that hinder the player.
    Debuff,
}

impl SpawnCategory {
    /// Every category in strict evaluation priority.
    pub const PRIORITY: [SpawnCategory; 3] = [Self::Trap, Self::Bonus, Self::Debuff];
}

/// Reference to a host prefab used when instantiating an object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabRef(String);

impl PrefabRef {
    /// Wraps a prefab name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Prefab name as provided by configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Reports whether the reference names something; blank references are unusable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

/// Axis along which a moving segment oscillates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionAxis {
    /// Oscillate along the X axis.
    #[default]
    Horizontal,
    /// Oscillate along the Y axis.
    Vertical,
}

/// Sinusoidal oscillation attached to a whole segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentMotion {
    /// Axis of travel.
    pub axis: MotionAxis,
    /// Peak displacement in world units.
    pub amplitude: f32,
    /// Angular speed multiplier.
    pub speed: f32,
    /// Phase offset in seconds.
    pub phase: f32,
}

impl SegmentMotion {
    /// Displacement of the segment at the provided session time.
    ///
    /// Follows `amplitude * sin((time + phase) * speed)` along the configured axis.
    #[must_use]
    pub fn displacement(&self, elapsed: Duration) -> Vec2 {
        let t = elapsed.as_secs_f32();
        let distance = self.amplitude * ((t + self.phase) * self.speed).sin();
        match self.axis {
            MotionAxis::Horizontal => Vec2::new(distance, 0.0),
            MotionAxis::Vertical => Vec2::new(0.0, distance),
        }
    }
}

/// Whether a disappearing tile fades alone or with its whole segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisappearScope {
    /// Only the touched tile fades.
    Tile,
    /// Every tile of the segment shares one state machine.
    WholeSegment,
}

/// Timing attached to a disappearing tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DisappearSettings {
    /// Delay between the touch and the start of the fade-out.
    pub delay_before_disappear: Duration,
    /// Length of the linear fade in either direction.
    pub fade_duration: Duration,
    /// Delay spent hidden before fading back in; `None` keeps the tile hidden.
    pub reappear_delay: Option<Duration>,
    /// Tiles affected by one trigger.
    pub scope: DisappearScope,
    /// Whether hazard tiles keep their collision while the segment is hidden.
    pub exempt_hazard_tiles: bool,
}

/// Axis-aligned rectangle in tile-local or world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Aabb {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl Aabb {
    /// Creates a rectangle from its corners, reordering them when inverted.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Rectangle of the provided size centred on the origin.
    #[must_use]
    pub fn centered(size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: -half,
            max: half,
        }
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Shape of a tile's solid collision volume in tile-local units.
///
/// Tile-local coordinates are relative to the centre of the tile's cell,
/// half a tile to the right of its anchor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ColliderShape {
    /// Closed polygons traced from the tile art.
    Outline {
        /// One closed path per physics shape.
        paths: Vec<Vec<Vec2>>,
    },
    /// Fallback rectangle used when no outline is available.
    Rect(Aabb),
}

/// Collision volumes attached to one tile.
///
/// Every tile is solid; hazard tiles additionally carry a non-solid kill band
/// that signals instant player death on contact.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TileCollision {
    /// Walkable collision volume.
    pub solid: ColliderShape,
    /// Lethal contact zone in tile-local units, present on hazard tiles only.
    pub kill_band: Option<Aabb>,
}

impl TileCollision {
    /// Reports whether touching the tile's kill band is lethal.
    #[must_use]
    pub fn is_lethal(&self) -> bool {
        self.kill_band.is_some()
    }
}

/// Per-lane parameters supplied when configuring lanes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneSetup {
    /// Identifier of the lane.
    pub lane: LaneId,
    /// Vertical centre that the lane's first segment starts from.
    pub base_height: f32,
    /// Multiplier applied to every horizontal gap generated in the lane.
    pub gap_multiplier: f32,
    /// Whether the lane opens with the safe start segment.
    pub is_start_lane: bool,
}

/// Planned tile inside a [`SegmentPlan`].
#[derive(Clone, Debug, PartialEq)]
pub struct TilePlan {
    /// Tile anchor in world units: left edge of its cell on X, vertical centre on Y.
    ///
    /// Tile `i` of a segment sits at `start_x + i * tile_width` and its cell
    /// spans `[x, x + tile_width)`, so the cells exactly cover `[start_x, end_x)`.
    pub position: Vec2,
    /// Material and variant of the tile.
    pub descriptor: MaterialDescriptor,
    /// Whether the tile is a boundary tile.
    pub is_edge: bool,
    /// Collision volumes of the tile.
    pub collision: TileCollision,
    /// Disappearing behaviour, if the tile was selected for it.
    pub disappearing: Option<DisappearSettings>,
}

/// Planned object inside a [`SegmentPlan`].
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectPlan {
    /// Index into [`SegmentPlan::tiles`] of the tile carrying the object.
    pub tile_index: usize,
    /// Category of the spawning rule.
    pub category: SpawnCategory,
    /// Index of the spawning rule within its category.
    pub rule_index: usize,
    /// Prefab to instantiate.
    pub prefab: PrefabRef,
    /// Spawn position in world units.
    pub position: Vec2,
}

/// Complete description of a segment produced by the segment generator.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentPlan {
    /// Left boundary in world units.
    pub start_x: f32,
    /// Width of one tile in world units.
    pub tile_width: f32,
    /// Vertical centre of the segment's tiles.
    pub height: f32,
    /// Whether this is the safe start segment.
    pub is_start: bool,
    /// Materials of the core (non-edge) tiles in order.
    pub core_materials: Vec<TileMaterial>,
    /// Every tile including both edge tiles, left to right.
    pub tiles: Vec<TilePlan>,
    /// Oscillation attached to the segment, if any.
    pub motion: Option<SegmentMotion>,
    /// Objects placed on core tiles.
    pub objects: Vec<ObjectPlan>,
}

impl SegmentPlan {
    /// Right boundary in world units.
    #[must_use]
    pub fn end_x(&self) -> f32 {
        self.start_x + self.tiles.len() as f32 * self.tile_width
    }
}

/// Reasons an append request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AppendRejection {
    /// The named lane does not exist.
    UnknownLane,
    /// The segment starts before the lane's frontier.
    BehindFrontier,
    /// The segment has no horizontal extent.
    Empty,
}

/// Source of the player's world X coordinate, sampled once per tick.
pub trait PlayerProbe {
    /// Current player X in world units.
    fn sample_x(&self) -> f32;
}

impl<F> PlayerProbe for F
where
    F: Fn() -> f32,
{
    fn sample_x(&self) -> f32 {
        self()
    }
}

/// Host-side factory that turns generator requests into game entities.
pub trait EntityFactory {
    /// Creates a tile entity and returns its handle.
    fn create_tile(
        &mut self,
        position: Vec2,
        descriptor: MaterialDescriptor,
        collision: &TileCollision,
    ) -> EntityHandle;

    /// Creates a trap, bonus, or debuff entity and returns its handle.
    fn create_object(
        &mut self,
        prefab: &PrefabRef,
        category: SpawnCategory,
        position: Vec2,
    ) -> EntityHandle;

    /// Destroys a previously created entity.
    fn destroy(&mut self, handle: EntityHandle);

    /// Moves an entity by `offset` relative to the position it was created at.
    fn translate(&mut self, _handle: EntityHandle, _offset: Vec2) {}

    /// Applies fade alpha and solid-collision state to a tile entity.
    fn set_visibility(&mut self, _handle: EntityHandle, _alpha: f32, _solid: bool) {}
}

/// Supplies collision outlines traced from tile art.
pub trait CollisionGeometryProvider {
    /// Closed outline paths in tile-local units, or `None` to fall back to a rectangle.
    fn outline(&self, descriptor: MaterialDescriptor) -> Option<Vec<Vec<Vec2>>>;
}

/// Geometry provider without any outlines; every tile uses its rectangle.
#[derive(Clone, Copy, Debug, Default)]
pub struct RectangleGeometry;

impl CollisionGeometryProvider for RectangleGeometry {
    fn outline(&self, _descriptor: MaterialDescriptor) -> Option<Vec<Vec<Vec2>>> {
        None
    }
}

/// Clamps a probability into `0.0..=1.0`, mapping NaN to zero.
#[must_use]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Linear time-based difficulty scaling of a probability, bounded to `0.0..=1.0`.
#[must_use]
pub fn scaled_probability(base: f32, growth_per_second: f32, elapsed: Duration) -> f32 {
    clamp_unit(base + growth_per_second * elapsed.as_secs_f32())
}
