use engine_core::{ActiveListener, AudioListenerComponent, Engine, FrameTime, WorldTransformComponent};
use glam::{vec3, Quat, Vec3};

#[test]
fn world_transform_follows_local_position() {
    let mut engine = Engine::new();
    engine.bootstrap();
    let e = engine.create_entity();
    engine.set_position(e, vec3(1.0, 2.0, 3.0));
    engine.update(1.0 / 60.0);

    let wt = engine.world.get::<WorldTransformComponent>(e).expect("world transform");
    assert!((wt.position() - vec3(1.0, 2.0, 3.0)).length() < 1e-5);

    engine.set_position(e, vec3(-4.0, 0.0, 0.0));
    engine.update(1.0 / 60.0);
    let wt = engine.world.get::<WorldTransformComponent>(e).unwrap();
    assert!((wt.position() - vec3(-4.0, 0.0, 0.0)).length() < 1e-5);
    assert_eq!(engine.world.resource::<FrameTime>().frame, 2);
}

#[test]
fn child_inherits_parent_rotation_and_translation() {
    let mut engine = Engine::new();
    engine.bootstrap();
    let parent = engine.create_entity();
    let child = engine.create_entity();
    engine.set_position(parent, vec3(10.0, 0.0, 0.0));
    engine.set_orientation(parent, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
    engine.set_position(child, vec3(0.0, 0.0, -1.0));
    engine.set_parent(child, Some(parent));
    engine.update(0.016);

    let wt = engine.world.get::<WorldTransformComponent>(child).unwrap();
    // -Z rotated a quarter turn about +Y points along -X.
    assert!((wt.position() - vec3(9.0, 0.0, 0.0)).length() < 1e-4);
}

#[test]
fn parent_cycle_does_not_hang() {
    let mut engine = Engine::new();
    engine.bootstrap();
    let a = engine.create_entity();
    let b = engine.create_entity();
    engine.set_parent(a, Some(b));
    engine.set_parent(b, Some(a));
    engine.update(0.016);
    assert!(engine.world.get::<WorldTransformComponent>(a).is_some());
}

#[test]
fn set_listener_inserts_defaults_and_destroy_clears_it() {
    let mut engine = Engine::new();
    engine.bootstrap();
    let l = engine.create_entity();
    engine.set_listener(l);
    assert_eq!(engine.world.resource::<ActiveListener>().0, Some(l));
    let comp = engine.world.get::<AudioListenerComponent>(l).unwrap();
    assert_eq!(comp.mask, u32::MAX);
    assert_eq!(comp.volume, 1.0);

    engine.destroy_entity(l);
    assert_eq!(engine.world.resource::<ActiveListener>().0, None);
    engine.update(0.016);
    assert!(engine.world.get_entity(l).is_err());
}

#[test]
fn orientation_drives_world_rotation() {
    let mut engine = Engine::new();
    engine.bootstrap();
    let e = engine.create_entity();
    engine.set_orientation(e, Quat::from_rotation_y(std::f32::consts::PI));
    engine.update(0.016);
    let wt = engine.world.get::<WorldTransformComponent>(e).unwrap();
    let forward = wt.rotation() * Vec3::NEG_Z;
    assert!((forward - Vec3::Z).length() < 1e-4);
}
