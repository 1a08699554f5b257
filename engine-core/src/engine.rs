use bevy_ecs::prelude::*;

use crate::components::*;
use crate::transform::world_transform_system;

pub struct Engine {
    pub world: World,
    /// Runs once per simulation frame. Transform propagation is registered by
    /// [`Engine::bootstrap`]; subsystems order themselves after it.
    pub variable_schedule: Schedule,
}

impl Engine {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(ActiveListener::default());
        world.insert_resource(GamePaused::default());
        world.insert_resource(FrameTime::default());

        Self { world, variable_schedule: Schedule::default() }
    }

    /// Called once to register engine-provided systems.
    pub fn bootstrap(&mut self) {
        self.variable_schedule.add_systems(world_transform_system);
    }

    /// Expose mutable access to the frame schedule so callers can register systems.
    pub fn variable_schedule_mut(&mut self) -> &mut Schedule {
        &mut self.variable_schedule
    }

    pub fn create_entity(&mut self) -> Entity {
        self.world.spawn(TransformComponent::default()).id()
    }

    pub fn destroy_entity(&mut self, e: Entity) {
        if self.world.resource::<ActiveListener>().0 == Some(e) {
            self.world.resource_mut::<ActiveListener>().0 = None;
        }
        self.world.despawn(e);
    }

    pub fn set_position(&mut self, entity: Entity, pos: glam::Vec3) {
        if let Ok(mut e) = self.world.get_entity_mut(entity) {
            if let Some(mut t) = e.get_mut::<TransformComponent>() {
                t.position = pos;
            } else {
                e.insert(TransformComponent { position: pos, ..Default::default() });
            }
        }
    }

    pub fn set_orientation(&mut self, entity: Entity, rot: glam::Quat) {
        if let Ok(mut e) = self.world.get_entity_mut(entity) {
            if let Some(mut t) = e.get_mut::<TransformComponent>() {
                t.rotation = rot;
            } else {
                e.insert(TransformComponent { rotation: rot, ..Default::default() });
            }
        }
    }

    pub fn set_parent(&mut self, entity: Entity, parent: Option<Entity>) {
        if let Some(mut t) = self.world.get_mut::<TransformComponent>(entity) {
            t.parent = parent;
        }
    }

    /// Make `entity` the active listener, giving it default listener settings
    /// unless it already has some.
    pub fn set_listener(&mut self, entity: Entity) {
        let Ok(mut e) = self.world.get_entity_mut(entity) else { return };
        if !e.contains::<AudioListenerComponent>() {
            e.insert(AudioListenerComponent::default());
        }
        self.world.resource_mut::<ActiveListener>().0 = Some(entity);
    }

    pub fn clear_listener(&mut self) {
        self.world.resource_mut::<ActiveListener>().0 = None;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.world.resource_mut::<GamePaused>().0 = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.world.resource::<GamePaused>().0
    }

    /// Runs the frame schedule once with the provided delta (seconds).
    pub fn update(&mut self, delta: f32) {
        {
            let mut time = self.world.resource_mut::<FrameTime>();
            time.delta = delta.max(0.0);
            time.frame += 1;
        }
        self.variable_schedule.run(&mut self.world);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
