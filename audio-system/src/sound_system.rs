use std::sync::Arc;

use bevy_ecs::prelude::*;
use tracing::trace;

use engine_core::{GamePaused, WorldTransformComponent};

use crate::config::AudioConfig;
use crate::interface::AudioInterface;
use crate::listener::{ListenerSnapshot, OutputMode};
use crate::mixer::Mixer;
use crate::sound_source::SoundSource;
use crate::submit::SubmitQueue;

/// Per-frame driver: snapshot the listener, step every source, update the
/// one-shot pool and hand newly ready tracks to the mixer.
#[derive(Resource)]
pub struct SoundSystem {
    config: AudioConfig,
    mixer: Arc<dyn Mixer>,
    submit: SubmitQueue,
    listener: ListenerSnapshot,
}

impl SoundSystem {
    pub fn new(config: AudioConfig, mixer: Arc<dyn Mixer>) -> Self {
        let config = config.sanitized();
        let submit = SubmitQueue::with_capacity(config.max_pending_tracks);
        Self { config, mixer, submit, listener: ListenerSnapshot::default() }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AudioConfig) {
        self.config = config.sanitized();
    }

    /// Listener state used by the most recent frame.
    pub fn listener(&self) -> &ListenerSnapshot {
        &self.listener
    }

    /// Run one frame against `world`. Expects an [`AudioInterface`] resource;
    /// without one there is nothing to play and the frame is skipped.
    pub fn update(&mut self, world: &mut World) {
        let Some(interface) = world.get_resource::<AudioInterface>().cloned() else {
            trace!("no audio interface, skipping audio frame");
            return;
        };
        let ctx = interface.context();
        let game_paused = world.get_resource::<GamePaused>().is_some_and(|p| p.0);
        let output = OutputMode::select(ctx.device().is_mono(), self.config.hrtf);
        let master = interface.master_volume() * self.config.master_volume;
        self.listener = ListenerSnapshot::capture(world, master, output);

        let mut sources = world.query::<(Entity, &WorldTransformComponent, &mut SoundSource)>();
        for (entity, transform, mut source) in sources.iter_mut(world) {
            if source.entity() != Some(entity) {
                source.set_entity(Some(entity));
            }
            source.set_transform(transform.position(), transform.rotation());
            source.spatialize(&self.listener);
            source.update_track(ctx, &mut self.submit, game_paused);
        }

        interface.update_one_shot_sound(&mut self.submit, &self.listener);

        if !self.submit.is_empty() {
            trace!(tracks = self.submit.len(), "submitting tracks");
            self.mixer.submit_tracks(&mut self.submit);
        }
        self.submit.clear();
    }
}
