use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bevy_ecs::prelude::*;
use glam::Vec3;
use tracing::warn;

use crate::attenuation::VOLUME_EPSILON;
use crate::context::AudioContext;
use crate::error::PlayError;
use crate::group::{saturate, SoundGroup};
use crate::listener::ListenerSnapshot;
use crate::one_shot::{OneShotPool, OneShotSound, Placement};
use crate::resource::SoundHandle;
use crate::submit::SubmitQueue;
use crate::track::{Track, TrackSlot};

struct InterfaceInner {
    context: AudioContext,
    master_volume: AtomicU32,
    pool: OneShotPool,
}

/// Engine-wide audio entry point: the playback context, the interface
/// master volume and the pool of entity-less one-shots.
///
/// Cheap to clone; clones share state, so gameplay code on any thread can
/// keep one and fire sounds through it.
#[derive(Resource, Clone)]
pub struct AudioInterface {
    inner: Arc<InterfaceInner>,
}

impl AudioInterface {
    pub fn new(context: AudioContext) -> Self {
        Self {
            inner: Arc::new(InterfaceInner {
                context,
                master_volume: AtomicU32::new(1.0f32.to_bits()),
                pool: OneShotPool::new(),
            }),
        }
    }

    pub fn context(&self) -> &AudioContext {
        &self.inner.context
    }

    pub fn master_volume(&self) -> f32 {
        f32::from_bits(self.inner.master_volume.load(Ordering::Relaxed))
    }

    pub fn set_master_volume(&self, volume: f32) {
        self.inner.master_volume.store(saturate(volume).to_bits(), Ordering::Relaxed);
    }

    /// Play a positional sound that is not attached to an entity.
    pub fn play_sound_at(
        &self,
        handle: SoundHandle,
        position: Vec3,
        group: Option<Arc<SoundGroup>>,
        volume: f32,
        start_frame: u64,
    ) -> bool {
        self.play(handle, Placement::At(position), group, volume, start_frame)
    }

    /// Play an unspatialized sound (music, UI).
    pub fn play_sound_background(
        &self,
        handle: SoundHandle,
        group: Option<Arc<SoundGroup>>,
        volume: f32,
        start_frame: u64,
    ) -> bool {
        self.play(handle, Placement::Background, group, volume, start_frame)
    }

    fn play(
        &self,
        handle: SoundHandle,
        placement: Placement,
        group: Option<Arc<SoundGroup>>,
        volume: f32,
        start_frame: u64,
    ) -> bool {
        let result = if !(volume > VOLUME_EPSILON) {
            Err(PlayError::VolumeTooLow)
        } else {
            self.inner.context.load_clip(handle).and_then(|clip| Track::start(handle, clip, start_frame, None))
        };
        match result {
            Ok(track) => {
                self.inner.pool.add(OneShotSound {
                    slot: TrackSlot::new(track),
                    group,
                    placement,
                    volume: saturate(volume),
                });
                true
            }
            Err(err) => {
                warn!(%handle, reason = %err, "one-shot rejected");
                false
            }
        }
    }

    /// Per-frame pool update. Called by the sound system.
    pub fn update_one_shot_sound(&self, submit: &mut SubmitQueue, listener: &ListenerSnapshot) {
        self.inner.pool.update(submit, listener);
    }

    pub fn clear_one_shot_sounds(&self) {
        self.inner.pool.clear();
    }

    pub fn one_shot_count(&self) -> usize {
        self.inner.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use glam::vec3;

    #[test]
    fn rejects_bad_requests() {
        let fx = Fixture::new();
        let ai = AudioInterface::new(fx.ctx.clone());
        assert!(!ai.play_sound_at(SoundHandle::INVALID, Vec3::ZERO, None, 1.0, 0));
        assert!(!ai.play_sound_at(fx.no_audio, Vec3::ZERO, None, 1.0, 0));
        assert!(!ai.play_sound_at(fx.short, Vec3::ZERO, None, 0.0, 0));
        assert!(!ai.play_sound_background(fx.short, None, 1.0, SHORT_FRAMES));
        assert_eq!(ai.one_shot_count(), 0);
    }

    #[test]
    fn positional_and_background_sounds_submit_once() {
        let fx = Fixture::new();
        let ai = AudioInterface::new(fx.ctx.clone());
        let listener = ListenerSnapshot::default();
        let mut submit = SubmitQueue::new();

        assert!(ai.play_sound_at(fx.long, vec3(2.0, 0.0, 0.0), None, 1.0, 0));
        assert!(ai.play_sound_background(fx.long, None, 0.5, 0));
        assert_eq!(ai.one_shot_count(), 2);

        ai.update_one_shot_sound(&mut submit, &listener);
        assert_eq!(submit.len(), 2);
        let positional = submit.tracks()[0].params();
        assert_eq!(positional.channel_volume[0], 0);
        assert!(positional.channel_volume[1] > 0);
        assert_eq!(submit.tracks()[1].params().channel_volume, [32768, 32768]);

        ai.update_one_shot_sound(&mut submit, &listener);
        assert_eq!(submit.len(), 2);
        assert_eq!(ai.one_shot_count(), 2);
    }

    #[test]
    fn inaudible_entries_are_dropped_before_submit() {
        let fx = Fixture::new();
        let ai = AudioInterface::new(fx.ctx.clone());
        let mut submit = SubmitQueue::new();
        ai.play_sound_at(fx.long, vec3(0.0, 0.0, 5_000.0), None, 1.0, 0);
        ai.update_one_shot_sound(&mut submit, &ListenerSnapshot::default());
        assert!(submit.is_empty());
        assert_eq!(ai.one_shot_count(), 0);
    }

    #[test]
    fn finished_entries_are_removed_and_groups_apply() {
        let fx = Fixture::new();
        let ai = AudioInterface::new(fx.ctx.clone());
        let group = Arc::new(SoundGroup::new());
        let mut submit = SubmitQueue::new();
        ai.play_sound_background(fx.short, Some(group.clone()), 1.0, 0);
        ai.update_one_shot_sound(&mut submit, &ListenerSnapshot::default());
        let track = submit.tracks()[0].clone();

        group.set_paused(true);
        group.set_volume(0.5);
        ai.update_one_shot_sound(&mut submit, &ListenerSnapshot::default());
        assert!(track.params().paused);
        assert_eq!(track.params().channel_volume, [32768, 32768]);

        track.set_position(SHORT_FRAMES);
        ai.update_one_shot_sound(&mut submit, &ListenerSnapshot::default());
        assert_eq!(ai.one_shot_count(), 0);
        assert!(track.is_stopped());
    }

    #[test]
    fn concurrent_producers_are_all_collected() {
        let fx = Fixture::new();
        let ai = AudioInterface::new(fx.ctx.clone());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let ai = ai.clone();
                let h = fx.long;
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        assert!(ai.play_sound_background(h, None, 1.0, 0));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        let mut submit = SubmitQueue::new();
        ai.update_one_shot_sound(&mut submit, &ListenerSnapshot::default());
        assert_eq!(submit.len(), 100);

        ai.clear_one_shot_sounds();
        assert_eq!(ai.one_shot_count(), 0);
        assert!(submit.tracks().iter().all(|t| t.is_stopped()));
    }

    #[test]
    fn master_volume_is_clamped() {
        let fx = Fixture::new();
        let ai = AudioInterface::new(fx.ctx.clone());
        ai.set_master_volume(1.5);
        assert_eq!(ai.master_volume(), 1.0);
        ai.set_master_volume(0.25);
        assert_eq!(ai.clone().master_volume(), 0.25);
    }
}
