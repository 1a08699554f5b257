use std::sync::Arc;

use audio_system::{AudioClip, AudioConfig, SoundGroup, SoundSource};
use bevy_ecs::prelude::*;
use engine_core::{AudioListenerComponent, Engine};
use glam::vec3;
use integration_tests::{stereo_peaks, Harness};

const BLOCK: usize = 256;

fn spawn_source(engine: &mut Engine, position: glam::Vec3, source: SoundSource) -> Entity {
    let e = engine.create_entity();
    engine.set_position(e, position);
    engine.world.entity_mut(e).insert(source);
    e
}

fn listener_at_origin(h: &mut Harness) -> Entity {
    let l = h.engine.create_entity();
    h.engine.set_listener(l);
    l
}

#[test]
fn source_to_the_right_is_louder_on_the_right() {
    let mut h = Harness::new(AudioConfig::default());
    let tone = h.bank.register_clip("tone", AudioClip::constant(0.5, 48_000, 48_000));
    listener_at_origin(&mut h);

    let mut source = SoundSource::new();
    assert!(source.play_sound(&h.ctx(), tone, 0, None));
    spawn_source(&mut h.engine, vec3(4.0, 0.0, 0.0), source);

    let out = h.step(BLOCK);
    let (l, r) = stereo_peaks(&out);
    assert!(r > 0.0);
    assert!(r > l, "expected right-heavy mix, got l={l} r={r}");
}

#[test]
fn hrtf_output_keeps_gains_centered_for_mixer() {
    let mut h = Harness::new(AudioConfig { hrtf: true, ..Default::default() });
    let tone = h.bank.register_clip("tone", AudioClip::constant(0.5, 48_000, 48_000));
    listener_at_origin(&mut h);

    let mut source = SoundSource::new();
    source.play_sound(&h.ctx(), tone, 0, None);
    let e = spawn_source(&mut h.engine, vec3(0.0, 0.0, -2.0), source);

    h.step(BLOCK);
    let s = h.engine.world.get::<SoundSource>(e).unwrap();
    let [l, r] = s.channel_volume();
    assert_eq!(l, r);
    assert!((s.local_dir() - glam::Vec3::NEG_Z).length() < 1e-5);
}

#[test]
fn queued_sound_follows_when_the_first_finishes() {
    let mut h = Harness::new(AudioConfig::default());
    let intro = h.bank.register_clip("intro", AudioClip::constant(0.5, 100, 48_000));
    let body = h.bank.register_clip("body", AudioClip::constant(0.25, 10_000, 48_000));
    listener_at_origin(&mut h);

    let ctx = h.ctx();
    let mut source = SoundSource::new();
    assert!(source.add_to_queue(&ctx, intro));
    assert!(source.add_to_queue(&ctx, body));
    assert_eq!(source.queue_len(), 1);
    let e = spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), source);

    h.step(BLOCK);
    assert_eq!(h.engine.world.get::<SoundSource>(e).unwrap().playback_position(), 100);

    h.step(BLOCK);
    let s = h.engine.world.get::<SoundSource>(e).unwrap();
    assert_eq!(s.handle(), body);
    assert_eq!(s.queue_len(), 0);
    assert_eq!(s.playback_position(), BLOCK as u64);
}

#[test]
fn source_without_queue_goes_silent_after_its_sound() {
    let mut h = Harness::new(AudioConfig::default());
    let blip = h.bank.register_clip("blip", AudioClip::constant(0.5, 64, 48_000));
    listener_at_origin(&mut h);

    let mut source = SoundSource::new();
    source.play_sound(&h.ctx(), blip, 0, None);
    let e = spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), source);

    h.step(BLOCK);
    h.step(BLOCK);
    assert!(h.engine.world.get::<SoundSource>(e).unwrap().is_silent());
    assert_eq!(h.mixer.active_voices(), 0);
}

#[test]
fn pooled_one_shots_play_and_are_collected() {
    let mut h = Harness::new(AudioConfig::default());
    let click = h.bank.register_clip("click", AudioClip::constant(0.5, 100, 48_000));
    listener_at_origin(&mut h);

    let ai = h.interface();
    assert!(ai.play_sound_background(click, None, 1.0, 0));
    assert!(ai.play_sound_at(click, vec3(-3.0, 0.0, 0.0), None, 1.0, 0));
    assert_eq!(ai.one_shot_count(), 2);

    let out = h.step(BLOCK);
    let (l, r) = stereo_peaks(&out);
    assert!(l > r);
    assert_eq!(h.mixer.active_voices(), 0);

    h.engine.update(1.0 / 60.0);
    assert_eq!(ai.one_shot_count(), 0);
}

#[test]
fn virtualized_source_keeps_time_while_out_of_range() {
    let mut h = Harness::new(AudioConfig::default());
    let ambience = h.bank.register_clip("ambience", AudioClip::constant(0.5, 48_000, 48_000));
    let listener = listener_at_origin(&mut h);

    let mut source = SoundSource::new();
    source.set_virtualize_when_silent(true);
    source.play_sound(&h.ctx(), ambience, 0, Some(0));
    let e = spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), source);

    let out = h.step(BLOCK);
    assert!(stereo_peaks(&out).0 > 0.0);

    h.engine.set_position(listener, vec3(10_000.0, 0.0, 0.0));
    let out = h.step(BLOCK);
    assert!(out.iter().all(|s| *s == 0.0));
    assert_eq!(h.engine.world.get::<SoundSource>(e).unwrap().playback_position(), 2 * BLOCK as u64);

    h.engine.set_position(listener, glam::Vec3::ZERO);
    let out = h.step(BLOCK);
    assert!(stereo_peaks(&out).0 > 0.0);
}

#[test]
fn game_pause_freezes_all_but_unpausable_groups() {
    let mut h = Harness::new(AudioConfig::default());
    let tone = h.bank.register_clip("tone", AudioClip::constant(0.5, 48_000, 48_000));
    listener_at_origin(&mut h);

    let ctx = h.ctx();
    let mut world_sound = SoundSource::new();
    world_sound.play_sound(&ctx, tone, 0, None);
    let a = spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), world_sound);

    let menu = Arc::new(SoundGroup::new());
    menu.set_play_even_when_paused(true);
    let mut menu_sound = SoundSource::new();
    menu_sound.set_group(Some(menu));
    menu_sound.play_sound(&ctx, tone, 0, None);
    let b = spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), menu_sound);

    h.engine.set_paused(true);
    h.step(BLOCK);
    h.step(BLOCK);
    assert_eq!(h.engine.world.get::<SoundSource>(a).unwrap().playback_position(), 0);
    assert_eq!(h.engine.world.get::<SoundSource>(b).unwrap().playback_position(), 2 * BLOCK as u64);

    h.engine.set_paused(false);
    h.step(BLOCK);
    assert_eq!(h.engine.world.get::<SoundSource>(a).unwrap().playback_position(), BLOCK as u64);
}

#[test]
fn listener_mask_filters_sources() {
    let mut h = Harness::new(AudioConfig::default());
    let tone = h.bank.register_clip("tone", AudioClip::constant(0.5, 48_000, 48_000));
    let listener = listener_at_origin(&mut h);
    h.engine.world.entity_mut(listener).insert(AudioListenerComponent { volume: 1.0, mask: 0b01 });

    let mut source = SoundSource::new();
    source.set_listener_mask(0b10);
    source.set_virtualize_when_silent(true);
    source.play_sound(&h.ctx(), tone, 0, None);
    spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), source);

    let out = h.step(BLOCK);
    assert!(out.iter().all(|s| *s == 0.0));
}

#[test]
fn despawning_a_source_stops_its_voice() {
    let mut h = Harness::new(AudioConfig::default());
    let tone = h.bank.register_clip("tone", AudioClip::constant(0.5, 48_000, 48_000));
    listener_at_origin(&mut h);

    let mut source = SoundSource::new();
    source.play_sound(&h.ctx(), tone, 0, None);
    let e = spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), source);
    h.step(BLOCK);
    assert_eq!(h.mixer.active_voices(), 1);

    h.engine.destroy_entity(e);
    let out = h.step(BLOCK);
    assert_eq!(h.mixer.active_voices(), 0);
    assert!(out.iter().all(|s| *s == 0.0));
}

#[test]
fn looping_ambience_survives_a_block_ending_on_its_last_frame() {
    let mut h = Harness::new(AudioConfig::default());
    assert_eq!(h.block_frames, 800);
    // One second at 48 kHz: exactly 60 refresh blocks.
    let ambience = h.bank.register_clip("ambience", AudioClip::constant(0.5, 48_000, 48_000));
    listener_at_origin(&mut h);

    let mut source = SoundSource::new();
    assert!(source.play_sound(&h.ctx(), ambience, 0, Some(0)));
    let e = spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), source);

    for _ in 0..60 {
        h.step_refresh();
    }
    let out = h.step_refresh();
    assert!(stereo_peaks(&out).0 > 0.0);

    let s = h.engine.world.get::<SoundSource>(e).unwrap();
    assert_eq!(s.handle(), ambience);
    assert!(!s.is_silent());
    assert_eq!(s.track().unwrap().loop_count(), 1);
    assert_eq!(s.playback_position(), 800);
    assert_eq!(h.mixer.active_voices(), 1);
}

#[test]
fn short_loop_matching_the_block_keeps_playing() {
    let mut h = Harness::new(AudioConfig::default());
    let blip = h.bank.register_clip("blip", AudioClip::constant(0.5, BLOCK, 48_000));
    listener_at_origin(&mut h);

    let mut source = SoundSource::new();
    source.play_sound(&h.ctx(), blip, 0, Some(0));
    let e = spawn_source(&mut h.engine, vec3(0.0, 0.0, -1.0), source);

    h.step(BLOCK);
    assert_eq!(h.engine.world.get::<SoundSource>(e).unwrap().playback_position(), 0);
    h.engine.update(1.0 / 60.0);
    let s = h.engine.world.get::<SoundSource>(e).unwrap();
    assert_eq!(s.handle(), blip);
    assert!(!s.is_silent());
}
