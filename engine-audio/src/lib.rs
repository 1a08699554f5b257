//! Wires the audio subsystem into an [`Engine`]: resources, the per-frame
//! sound system and the output backend.

use std::sync::Arc;

use anyhow::Context;
use bevy_ecs::prelude::*;

use audio_backend::AudioBackend;
use audio_system::{render_fn_for_mixer, AudioConfig, AudioContext, AudioInterface, SoftwareMixer, SoundResolver, SoundSystem};
use engine_core::{world_transform_system, Engine};

/// Insert [`AudioInterface`] and [`SoundSystem`], schedule the sound system
/// after transform propagation and start `backend` rendering the mixer.
///
/// Call after [`Engine::bootstrap`]. The caller keeps ownership of the
/// backend; dropping or stopping it silences output without affecting the
/// frame-side state.
pub fn install_audio(
    engine: &mut Engine,
    config: AudioConfig,
    resolver: Arc<dyn SoundResolver>,
    backend: &mut dyn AudioBackend,
) -> anyhow::Result<Arc<SoftwareMixer>> {
    let device = backend.device_info();
    let config = config.sanitized();
    let mixer = Arc::new(SoftwareMixer::new(config.max_pending_tracks, &device));

    backend
        .start(render_fn_for_mixer(mixer.clone()))
        .context("starting audio backend")?;

    tracing::info!(
        sample_rate = device.sample_rate,
        channels = device.channels,
        hrtf = config.hrtf,
        block_frames = config.block_frames(device.sample_rate),
        "audio installed"
    );

    let interface = AudioInterface::new(AudioContext::new(resolver, device));
    engine.world.insert_resource(interface);
    engine.world.insert_resource(SoundSystem::new(config, mixer.clone()));
    engine
        .variable_schedule_mut()
        .add_systems(sound_system_update.after(world_transform_system));
    Ok(mixer)
}

/// Exclusive frame system running [`SoundSystem::update`].
pub fn sound_system_update(world: &mut World) {
    if !world.contains_resource::<SoundSystem>() {
        return;
    }
    world.resource_scope(|world, mut system: Mut<SoundSystem>| system.update(world));
}
