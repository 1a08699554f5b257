use std::sync::Arc;

use crossbeam::queue::SegQueue;
use glam::Vec3;
use parking_lot::Mutex;
use tracing::trace;

use crate::attenuation::{self, Emitter};
use crate::group::SoundGroup;
use crate::listener::ListenerSnapshot;
use crate::submit::SubmitQueue;
use crate::track::{PlaybackParams, TrackSlot};

/// Where a pooled one-shot is heard from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    At(Vec3),
    Background,
}

#[derive(Debug)]
pub(crate) struct OneShotSound {
    pub(crate) slot: TrackSlot,
    pub(crate) group: Option<Arc<SoundGroup>>,
    pub(crate) placement: Placement,
    pub(crate) volume: f32,
}

/// Fire-and-forget sounds not bound to an entity.
///
/// Any thread may add; additions are staged in a lock-free queue and moved
/// into the live set by [`OneShotPool::update`], which runs once per frame.
#[derive(Default)]
pub struct OneShotPool {
    staged: SegQueue<OneShotSound>,
    live: Mutex<Vec<OneShotSound>>,
}

impl OneShotPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, sound: OneShotSound) {
        self.staged.push(sound);
    }

    /// Staged plus live entries.
    pub fn len(&self) -> usize {
        self.staged.len() + self.live.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops every pooled sound.
    pub fn clear(&self) {
        while self.staged.pop().is_some() {}
        self.live.lock().clear();
    }

    /// Retire finished entries, spatialize the rest and submit new ones.
    pub fn update(&self, submit: &mut SubmitQueue, listener: &ListenerSnapshot) {
        let mut live = self.live.lock();
        while let Some(sound) = self.staged.pop() {
            live.push(sound);
        }

        live.retain_mut(|sound| {
            let track = sound.slot.track();
            if track.is_finished() || track.is_stopped() {
                trace!(handle = %track.handle(), "pooled one-shot finished");
                return false;
            }
            let audible = listener.hears(None, u32::MAX);
            let group_volume = sound.group.as_ref().map_or(1.0, |g| g.volume());
            let spatial = if !audible {
                attenuation::SpatialResult::SILENT
            } else {
                let emitter = match sound.placement {
                    Placement::At(position) => Emitter::point(position),
                    Placement::Background => Emitter::background(),
                };
                attenuation::spatialize(listener, &emitter, sound.volume * group_volume)
            };
            if sound.slot.needs_submit() && spatial.is_silent() {
                trace!(handle = %track.handle(), "silent pooled one-shot discarded before submit");
                return false;
            }
            let paused = sound.group.as_ref().is_some_and(|g| g.is_paused());
            sound.slot.publish(
                PlaybackParams {
                    channel_volume: spatial.channel_volume,
                    local_dir: spatial.local_dir,
                    spatialized_stereo: spatial.spatialized_stereo,
                    paused,
                },
                submit,
            );
            true
        });
    }
}
