use std::sync::Arc;

use audio_backend::DeviceInfo;

use crate::error::PlayError;
use crate::resource::{AudioClip, SoundHandle, SoundResolver};

/// What playback operations need from the outside world: a way to resolve
/// sounds and the layout of the output device.
#[derive(Clone)]
pub struct AudioContext {
    resolver: Arc<dyn SoundResolver>,
    device: DeviceInfo,
}

impl AudioContext {
    pub fn new(resolver: Arc<dyn SoundResolver>, device: DeviceInfo) -> Self {
        Self { resolver, device }
    }

    pub fn resolver(&self) -> &Arc<dyn SoundResolver> {
        &self.resolver
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn sample_rate(&self) -> u32 {
        self.device.sample_rate.max(1)
    }

    /// Resolve `handle` to playable audio. Every play path goes through here.
    pub fn load_clip(&self, handle: SoundHandle) -> Result<Arc<AudioClip>, PlayError> {
        if !handle.is_valid() {
            return Err(PlayError::InvalidHandle);
        }
        let resource = self.resolver.resolve(handle).ok_or(PlayError::Unresolved(handle))?;
        let clip = resource.source().cloned().ok_or(PlayError::NoAudio(handle))?;
        if clip.frame_count() == 0 {
            return Err(PlayError::ZeroFrames(handle));
        }
        Ok(clip)
    }

    pub fn frames_to_seconds(&self, frames: u64) -> f32 {
        frames as f32 / self.sample_rate() as f32
    }

    pub fn seconds_to_frames(&self, seconds: f32) -> u64 {
        (seconds.max(0.0) * self.sample_rate() as f32).round() as u64
    }
}

impl std::fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioContext").field("device", &self.device).finish_non_exhaustive()
    }
}
