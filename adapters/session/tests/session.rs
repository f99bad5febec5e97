use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::Rc,
    time::Duration,
};

use glam::Vec2;
use lava_runner_core::{
    EntityFactory, EntityHandle, Event, GeneratorConfig, MaterialDescriptor, PrefabRef,
    SpawnCategory, TileCollision, TileMaterial,
};
use lava_runner_session::{SessionBuilder, SessionError};
use lava_runner_world::query;

const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct Ledger {
    next: u64,
    tiles: BTreeMap<EntityHandle, Vec2>,
    objects: BTreeMap<EntityHandle, PrefabRef>,
    destroyed: Vec<EntityHandle>,
    translated: BTreeMap<EntityHandle, Vec2>,
    visibility: BTreeMap<EntityHandle, (f32, bool)>,
}

impl Ledger {
    fn issue(&mut self) -> EntityHandle {
        self.next += 1;
        EntityHandle::new(self.next)
    }

    fn live(&self) -> usize {
        self.tiles.len() + self.objects.len()
    }
}

#[derive(Clone, Default)]
struct RecordingFactory {
    ledger: Rc<RefCell<Ledger>>,
}

impl EntityFactory for RecordingFactory {
    fn create_tile(
        &mut self,
        position: Vec2,
        _descriptor: MaterialDescriptor,
        _collision: &TileCollision,
    ) -> EntityHandle {
        let mut ledger = self.ledger.borrow_mut();
        let handle = ledger.issue();
        let _ = ledger.tiles.insert(handle, position);
        handle
    }

    fn create_object(
        &mut self,
        prefab: &PrefabRef,
        _category: SpawnCategory,
        _position: Vec2,
    ) -> EntityHandle {
        let mut ledger = self.ledger.borrow_mut();
        let handle = ledger.issue();
        let _ = ledger.objects.insert(handle, prefab.clone());
        handle
    }

    fn destroy(&mut self, handle: EntityHandle) {
        let mut ledger = self.ledger.borrow_mut();
        let removed = ledger.tiles.remove(&handle).is_some()
            || ledger.objects.remove(&handle).is_some();
        assert!(removed, "destroyed unknown handle {handle:?}");
        ledger.destroyed.push(handle);
    }

    fn translate(&mut self, handle: EntityHandle, offset: Vec2) {
        let _ = self.ledger.borrow_mut().translated.insert(handle, offset);
    }

    fn set_visibility(&mut self, handle: EntityHandle, alpha: f32, solid: bool) {
        let _ = self
            .ledger
            .borrow_mut()
            .visibility
            .insert(handle, (alpha, solid));
    }
}

fn player(position: &Rc<RefCell<f32>>) -> impl Fn() -> f32 + 'static {
    let position = Rc::clone(position);
    move || *position.borrow()
}

fn seeded(seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        seed: Some(seed),
        ..GeneratorConfig::default()
    }
}

#[test]
fn missing_services_disable_the_session() {
    let error = SessionBuilder::new(seeded(1))
        .entity_factory(RecordingFactory::default())
        .try_build()
        .err();
    assert_eq!(error, Some(SessionError::MissingPlayerProbe));

    let error = SessionBuilder::new(seeded(1))
        .player_probe(|| 0.0_f32)
        .try_build()
        .err();
    assert_eq!(error, Some(SessionError::MissingEntityFactory));

    let factory = RecordingFactory::default();
    let mut session = SessionBuilder::new(seeded(1))
        .entity_factory(factory.clone())
        .build();
    assert!(!session.is_enabled());
    assert_eq!(session.fault(), Some(SessionError::MissingPlayerProbe));

    let mut events = Vec::new();
    for _ in 0..10 {
        session.tick(TICK, &mut events);
    }
    assert!(events.is_empty());
    assert!(session.world().is_none());
    assert_eq!(factory.ledger.borrow().next, 0);
}

#[test]
fn factory_mirrors_every_live_tile_and_object() {
    let factory = RecordingFactory::default();
    let position = Rc::new(RefCell::new(0.0_f32));
    let mut session = SessionBuilder::new(seeded(42))
        .player_probe(player(&position))
        .entity_factory(factory.clone())
        .build();
    assert!(session.is_enabled());
    assert_eq!(session.seed(), Some(42));

    let mut events = Vec::new();
    for step in 0..300 {
        *position.borrow_mut() = step as f32 * 1.25;
        session.tick(TICK, &mut events);

        let world = session.world().expect("session is active");
        let segments = query::segment_view(world).into_vec();
        let tiles: usize = segments.iter().map(|segment| segment.tiles.len()).sum();
        let objects: usize = segments.iter().map(|segment| segment.objects.len()).sum();
        assert_eq!(factory.ledger.borrow().live(), tiles + objects);
        assert_eq!(session.live_entities(), tiles + objects);
    }
    assert!(!factory.ledger.borrow().destroyed.is_empty());

    session.reset(&mut events);
    assert_eq!(factory.ledger.borrow().live(), 0);
    assert_eq!(session.live_entities(), 0);
}

#[test]
fn touched_tile_turns_non_solid_through_the_factory() {
    let mut config = seeded(8);
    config.disappearing.chance = 1.0;
    config.disappearing.delay_before_disappear = 0.0;
    config.disappearing.fade_duration = 0.0;
    config.disappearing.whole_segment = false;

    let factory = RecordingFactory::default();
    let mut session = SessionBuilder::new(config)
        .player_probe(|| 0.0_f32)
        .entity_factory(factory.clone())
        .build();
    let mut events = Vec::new();
    session.tick(TICK, &mut events);

    let world = session.world().expect("session is active");
    let target = query::segment_view(world)
        .into_vec()
        .into_iter()
        .flat_map(|segment| segment.tiles)
        .find(|tile| {
            tile.disappearing.is_some() && tile.descriptor.material == TileMaterial::Grass
        })
        .expect("a disappearing grass tile exists");
    let handle = factory
        .ledger
        .borrow()
        .tiles
        .iter()
        .find(|(_, position)| **position == target.position)
        .map(|(handle, _)| *handle)
        .expect("tile entity exists");

    assert!(session.report_touch(handle));
    assert!(!session.report_touch(EntityHandle::new(u64::MAX)));

    events.clear();
    session.tick(TICK, &mut events);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::TileTouched { tile, .. } if *tile == target.id)));
    assert_eq!(
        factory.ledger.borrow().visibility.get(&handle),
        Some(&(0.0, false))
    );

    let world = session.world().expect("session is active");
    let snapshot = query::tile(world, target.id).expect("tile is still live");
    assert!(!snapshot.solid);
}

#[test]
fn moving_segments_translate_their_entities() {
    let mut config = seeded(5);
    config.motion.chance = 1.0;

    let factory = RecordingFactory::default();
    let mut session = SessionBuilder::new(config)
        .player_probe(|| 0.0_f32)
        .entity_factory(factory.clone())
        .build();
    let mut events = Vec::new();
    session.tick(TICK, &mut events);
    session.tick(TICK, &mut events);

    let world = session.world().expect("session is active");
    let moving: Vec<_> = query::segment_view(world)
        .into_vec()
        .into_iter()
        .filter(|segment| segment.motion.is_some())
        .collect();
    assert!(!moving.is_empty());

    let ledger = factory.ledger.borrow();
    for segment in &moving {
        let expected = segment.offset;
        for tile in &segment.tiles {
            let handle = ledger
                .tiles
                .iter()
                .find(|(_, position)| **position == tile.position)
                .map(|(handle, _)| *handle)
                .expect("tile entity exists");
            assert_eq!(ledger.translated.get(&handle), Some(&expected));
        }
    }
}

#[test]
fn reset_restarts_the_same_terrain() {
    let factory = RecordingFactory::default();
    let mut session = SessionBuilder::new(seeded(77))
        .player_probe(|| 0.0_f32)
        .entity_factory(factory.clone())
        .build();
    let mut events = Vec::new();
    session.tick(TICK, &mut events);
    let before = layout(&session);

    session.reset(&mut events);
    session.tick(TICK, &mut events);
    assert_eq!(layout(&session), before);
}

fn layout(session: &lava_runner_session::Session) -> Vec<(u32, u32, Vec<TileMaterial>)> {
    let world = session.world().expect("session is active");
    query::segment_view(world)
        .into_vec()
        .into_iter()
        .map(|segment| {
            (
                segment.start_x.to_bits(),
                segment.end_x.to_bits(),
                segment.core_materials,
            )
        })
        .collect()
}
