//! Forwards world events to the host's entity factory.

use std::collections::BTreeMap;

use lava_runner_core::{EntityFactory, EntityHandle, Event, ObjectId, SegmentId, TileId};

/// Maps generator identifiers to the host entities created for them.
pub(crate) struct EntityBridge {
    factory: Box<dyn EntityFactory>,
    tiles: BTreeMap<TileId, EntityHandle>,
    objects: BTreeMap<ObjectId, EntityHandle>,
    touchable: BTreeMap<EntityHandle, TileId>,
    members: BTreeMap<SegmentId, Vec<EntityHandle>>,
}

impl EntityBridge {
    pub(crate) fn new(factory: Box<dyn EntityFactory>) -> Self {
        Self {
            factory,
            tiles: BTreeMap::new(),
            objects: BTreeMap::new(),
            touchable: BTreeMap::new(),
            members: BTreeMap::new(),
        }
    }

    pub(crate) fn tile_for(&self, handle: EntityHandle) -> Option<TileId> {
        self.touchable.get(&handle).copied()
    }

    pub(crate) fn live_entities(&self) -> usize {
        self.tiles.len() + self.objects.len()
    }

    pub(crate) fn dispatch(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TileCreated {
                    segment,
                    tile,
                    position,
                    descriptor,
                    collision,
                    ..
                } => {
                    let handle = self.factory.create_tile(*position, *descriptor, collision);
                    let _ = self.tiles.insert(*tile, handle);
                    let _ = self.touchable.insert(handle, *tile);
                    self.members.entry(*segment).or_default().push(handle);
                }
                Event::ObjectSpawned {
                    segment,
                    object,
                    category,
                    prefab,
                    position,
                    ..
                } => {
                    let handle = self.factory.create_object(prefab, *category, *position);
                    let _ = self.objects.insert(*object, handle);
                    self.members.entry(*segment).or_default().push(handle);
                }
                Event::SegmentMoved { segment, offset } => {
                    if let Some(handles) = self.members.get(segment) {
                        for handle in handles {
                            self.factory.translate(*handle, *offset);
                        }
                    }
                }
                Event::TileVisibilityChanged { tile, alpha, solid } => {
                    if let Some(handle) = self.tiles.get(tile) {
                        self.factory.set_visibility(*handle, *alpha, *solid);
                    }
                }
                Event::ObjectDestroyed { object, .. } => {
                    if let Some(handle) = self.objects.remove(object) {
                        self.factory.destroy(handle);
                    }
                }
                Event::TileDestroyed { tile, .. } => {
                    if let Some(handle) = self.tiles.remove(tile) {
                        let _ = self.touchable.remove(&handle);
                        self.factory.destroy(handle);
                    }
                }
                Event::SegmentRemoved { segment, .. } => {
                    let _ = self.members.remove(segment);
                }
                _ => {}
            }
        }
    }
}
