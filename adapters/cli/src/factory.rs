//! Entity factory that only counts what the generator asks for.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use glam::Vec2;
use lava_runner_core::{
    EntityFactory, EntityHandle, MaterialDescriptor, PrefabRef, SpawnCategory, TileCollision,
    TileMaterial,
};

/// Totals gathered over a headless run.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    next_handle: u64,
    live: BTreeMap<EntityHandle, Kind>,
    pub(crate) tiles_created: u64,
    pub(crate) hazard_tiles_created: u64,
    pub(crate) objects_created: BTreeMap<SpawnCategory, u64>,
    pub(crate) destroyed: u64,
    pub(crate) hidden_updates: u64,
}

impl Tally {
    pub(crate) fn live(&self) -> usize {
        self.live.len()
    }
}

#[derive(Clone, Copy, Debug)]
enum Kind {
    Tile,
    Object,
}

/// Factory handing out sequential handles and recording totals in a shared [`Tally`].
#[derive(Clone, Debug, Default)]
pub(crate) struct CountingFactory {
    tally: Rc<RefCell<Tally>>,
}

impl CountingFactory {
    pub(crate) fn tally(&self) -> Rc<RefCell<Tally>> {
        Rc::clone(&self.tally)
    }

    fn issue(&self, kind: Kind) -> EntityHandle {
        let mut tally = self.tally.borrow_mut();
        tally.next_handle += 1;
        let handle = EntityHandle::new(tally.next_handle);
        let _ = tally.live.insert(handle, kind);
        handle
    }
}

impl EntityFactory for CountingFactory {
    fn create_tile(
        &mut self,
        _position: Vec2,
        descriptor: MaterialDescriptor,
        _collision: &TileCollision,
    ) -> EntityHandle {
        let handle = self.issue(Kind::Tile);
        let mut tally = self.tally.borrow_mut();
        tally.tiles_created += 1;
        if descriptor.material == TileMaterial::Hazard {
            tally.hazard_tiles_created += 1;
        }
        handle
    }

    fn create_object(
        &mut self,
        _prefab: &PrefabRef,
        category: SpawnCategory,
        _position: Vec2,
    ) -> EntityHandle {
        let handle = self.issue(Kind::Object);
        *self
            .tally
            .borrow_mut()
            .objects_created
            .entry(category)
            .or_default() += 1;
        handle
    }

    fn destroy(&mut self, handle: EntityHandle) {
        let mut tally = self.tally.borrow_mut();
        if tally.live.remove(&handle).is_some() {
            tally.destroyed += 1;
        } else {
            tracing::warn!(handle = handle.get(), "destroy requested for unknown entity");
        }
    }

    fn set_visibility(&mut self, handle: EntityHandle, _alpha: f32, solid: bool) {
        let mut tally = self.tally.borrow_mut();
        if !solid && matches!(tally.live.get(&handle), Some(Kind::Tile)) {
            tally.hidden_updates += 1;
        }
    }
}
