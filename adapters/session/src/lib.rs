#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Composition root that wires the world, generation systems, and host services.
//!
//! A [`Session`] owns one [`World`] plus the lifecycle and augmentation systems.
//! Every [`Session::tick`] samples the player probe, advances the world, lets the
//! systems respond until no further commands are produced, and forwards the
//! resulting events to the host's entity factory.

use std::time::Duration;

use lava_runner_core::{
    CollisionGeometryProvider, Command, EntityFactory, EntityHandle, Event, GeneratorConfig,
    PlayerProbe, RectangleGeometry, TileId,
};
use lava_runner_system_augmentation::Augmentation;
use lava_runner_system_lifecycle::Lifecycle;
use lava_runner_world::{self as world, query, World};
use thiserror::Error;

mod bridge;

use bridge::EntityBridge;

/// Services missing when a session was assembled.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No source of the player position was supplied.
    #[error("session requires a player probe")]
    MissingPlayerProbe,
    /// No factory for tiles and objects was supplied.
    #[error("session requires an entity factory")]
    MissingEntityFactory,
}

/// Collects configuration and services before starting a [`Session`].
pub struct SessionBuilder {
    config: GeneratorConfig,
    probe: Option<Box<dyn PlayerProbe>>,
    factory: Option<Box<dyn EntityFactory>>,
    geometry: Box<dyn CollisionGeometryProvider>,
}

impl SessionBuilder {
    /// Starts a builder using rectangle collision for every tile.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            probe: None,
            factory: None,
            geometry: Box::new(RectangleGeometry),
        }
    }

    /// Supplies the player position source.
    #[must_use]
    pub fn player_probe<P>(mut self, probe: P) -> Self
    where
        P: PlayerProbe + 'static,
    {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Supplies the factory that instantiates tiles and objects.
    #[must_use]
    pub fn entity_factory<F>(mut self, factory: F) -> Self
    where
        F: EntityFactory + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Replaces the rectangle fallback with outlines traced from tile art.
    #[must_use]
    pub fn collision_geometry<G>(mut self, geometry: G) -> Self
    where
        G: CollisionGeometryProvider + 'static,
    {
        self.geometry = Box::new(geometry);
        self
    }

    /// Starts the session, reporting missing services as an error.
    pub fn try_build(self) -> Result<Session, SessionError> {
        let probe = self.probe.ok_or(SessionError::MissingPlayerProbe)?;
        let factory = self.factory.ok_or(SessionError::MissingEntityFactory)?;
        let lifecycle = Lifecycle::new(&self.config, self.geometry);

        let mut active = Active {
            world: World::new(),
            lifecycle,
            augmentation: Augmentation::new(),
            bridge: EntityBridge::new(factory),
            probe,
            config: self.config,
            pending: Vec::new(),
        };
        let mut discarded = Vec::new();
        active.configure(&mut discarded);

        tracing::info!(
            seed = active.lifecycle.seed(),
            lanes = query::lane_view(&active.world).iter().count(),
            "generation session started"
        );
        Ok(Session {
            state: State::Active(Box::new(active)),
        })
    }

    /// Starts the session, falling back to a disabled session when services are missing.
    ///
    /// The fault is logged once; every call on a disabled session is a no-op.
    #[must_use]
    pub fn build(self) -> Session {
        match self.try_build() {
            Ok(session) => session,
            Err(error) => {
                tracing::error!(%error, "generation disabled");
                Session {
                    state: State::Disabled(error),
                }
            }
        }
    }
}

/// Running generator session.
pub struct Session {
    state: State,
}

enum State {
    Active(Box<Active>),
    Disabled(SessionError),
}

struct Active {
    world: World,
    lifecycle: Lifecycle,
    augmentation: Augmentation,
    bridge: EntityBridge,
    probe: Box<dyn PlayerProbe>,
    config: GeneratorConfig,
    pending: Vec<Event>,
}

impl Session {
    /// Whether the session is generating terrain.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// Fault that disabled the session, if any.
    #[must_use]
    pub fn fault(&self) -> Option<SessionError> {
        match &self.state {
            State::Active(_) => None,
            State::Disabled(error) => Some(*error),
        }
    }

    /// Authoritative world state, for read-only queries.
    #[must_use]
    pub fn world(&self) -> Option<&World> {
        match &self.state {
            State::Active(active) => Some(&active.world),
            State::Disabled(_) => None,
        }
    }

    /// Seed driving generation.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        match &self.state {
            State::Active(active) => Some(active.lifecycle.seed()),
            State::Disabled(_) => None,
        }
    }

    /// Number of host entities currently alive.
    #[must_use]
    pub fn live_entities(&self) -> usize {
        match &self.state {
            State::Active(active) => active.bridge.live_entities(),
            State::Disabled(_) => 0,
        }
    }

    /// Advances the session by `dt` and appends every event of the tick to `out_events`.
    pub fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let State::Active(active) = &mut self.state else {
            return;
        };
        let player_x = active.probe.sample_x();
        let mut events = std::mem::take(&mut active.pending);
        world::apply(
            &mut active.world,
            Command::Tick { dt, player_x },
            &mut events,
        );
        active.pump(events, out_events);
    }

    /// Reports that the player touched the entity behind `handle`.
    ///
    /// Returns `false` when the handle is not a live tile. The touch takes
    /// effect at the start of the next tick.
    pub fn report_touch(&mut self, handle: EntityHandle) -> bool {
        let tile = match &self.state {
            State::Active(active) => active.bridge.tile_for(handle),
            State::Disabled(_) => None,
        };
        tile.is_some_and(|tile| self.report_tile_touch(tile))
    }

    /// Reports that the player touched `tile`; returns `false` for unknown tiles.
    pub fn report_tile_touch(&mut self, tile: TileId) -> bool {
        let State::Active(active) = &mut self.state else {
            return false;
        };
        if query::tile(&active.world, tile).is_none() {
            return false;
        }
        world::apply(
            &mut active.world,
            Command::TouchTile { tile },
            &mut active.pending,
        );
        true
    }

    /// Discards every lane and timer and restarts generation from the configured seed.
    pub fn reset(&mut self, out_events: &mut Vec<Event>) {
        let State::Active(active) = &mut self.state else {
            return;
        };
        active.pending.clear();
        active.lifecycle.reset();
        active.configure(out_events);
        tracing::info!(seed = active.lifecycle.seed(), "generation session reset");
    }
}

impl Active {
    fn configure(&mut self, out_events: &mut Vec<Event>) {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::ConfigureLanes {
                origin_x: self.config.lanes.origin_x,
                lanes: self.config.lane_setups(),
            },
            &mut events,
        );
        self.pump(events, out_events);
    }

    /// Runs systems until the world stops producing events.
    fn pump(&mut self, mut events: Vec<Event>, out_events: &mut Vec<Event>) {
        while !events.is_empty() {
            let mut commands = Vec::new();
            self.lifecycle.handle(
                &events,
                &query::lane_view(&self.world),
                &query::segment_view(&self.world),
                query::origin_x(&self.world),
                &mut commands,
            );
            self.augmentation.handle(&events, &mut commands);
            self.bridge.dispatch(&events);
            out_events.append(&mut events);

            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }
}
