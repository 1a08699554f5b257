//! Sound assets as the audio core sees them: handles, decoded clips and the
//! resolver that maps one to the other.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Opaque reference to a sound resource. `0` never refers to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SoundHandle(pub u32);

impl SoundHandle {
    pub const INVALID: SoundHandle = SoundHandle(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SoundHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Decoded, interleaved PCM.
#[derive(Clone)]
pub struct AudioClip {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
}

impl AudioClip {
    /// Trailing samples that do not fill a whole frame are ignored.
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self { samples: samples.into(), channels: channels.max(1), sample_rate }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    /// Constant-valued mono clip, handy for tests and placeholder assets.
    pub fn constant(value: f32, frames: usize, sample_rate: u32) -> Self {
        Self::mono(vec![value; frames], sample_rate)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frame_count(&self) -> u64 {
        (self.samples.len() / self.channels as usize) as u64
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Samples of one frame, or an empty slice past the end.
    pub fn frame(&self, index: u64) -> &[f32] {
        let ch = self.channels as usize;
        let start = index as usize * ch;
        self.samples.get(start..start + ch).unwrap_or(&[])
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("frames", &self.frame_count())
            .finish()
    }
}

/// A loaded resource. It may exist without carrying decodable audio (a
/// failed decode, or an asset of the wrong kind).
#[derive(Debug, Clone)]
pub struct SoundResource {
    name: String,
    clip: Option<Arc<AudioClip>>,
}

impl SoundResource {
    pub fn new(name: impl Into<String>, clip: AudioClip) -> Self {
        Self { name: name.into(), clip: Some(Arc::new(clip)) }
    }

    pub fn without_audio(name: impl Into<String>) -> Self {
        Self { name: name.into(), clip: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&Arc<AudioClip>> {
        self.clip.as_ref()
    }
}

/// The resource manager seam.
pub trait SoundResolver: Send + Sync {
    fn resolve(&self, handle: SoundHandle) -> Option<Arc<SoundResource>>;
}

/// Thread-safe in-memory resolver.
pub struct SoundBank {
    next_handle: AtomicU32,
    resources: RwLock<HashMap<SoundHandle, Arc<SoundResource>>>,
}

impl SoundBank {
    pub fn new() -> Self {
        Self { next_handle: AtomicU32::new(1), resources: RwLock::new(HashMap::new()) }
    }

    pub fn register(&self, resource: SoundResource) -> SoundHandle {
        let handle = SoundHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%handle, name = resource.name(), "sound registered");
        self.resources.write().insert(handle, Arc::new(resource));
        handle
    }

    pub fn register_clip(&self, name: impl Into<String>, clip: AudioClip) -> SoundHandle {
        self.register(SoundResource::new(name, clip))
    }

    /// Playing tracks keep their clip alive; only new plays fail to resolve.
    pub fn unregister(&self, handle: SoundHandle) -> bool {
        self.resources.write().remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SoundBank {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundResolver for SoundBank {
    fn resolve(&self, handle: SoundHandle) -> Option<Arc<SoundResource>> {
        self.resources.read().get(&handle).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_start_at_one_and_resolve() {
        let bank = SoundBank::new();
        let h = bank.register_clip("beep", AudioClip::constant(0.5, 10, 48_000));
        assert!(h.is_valid());
        assert_eq!(h, SoundHandle(1));
        let res = bank.resolve(h).expect("resolved");
        assert_eq!(res.name(), "beep");
        assert_eq!(res.source().map(|c| c.frame_count()), Some(10));
        assert!(bank.resolve(SoundHandle::INVALID).is_none());
    }

    #[test]
    fn unregister_removes_resource() {
        let bank = SoundBank::new();
        let h = bank.register(SoundResource::without_audio("broken"));
        assert_eq!(bank.len(), 1);
        assert!(bank.unregister(h));
        assert!(!bank.unregister(h));
        assert!(bank.is_empty());
    }

    #[test]
    fn stereo_frames_are_sliced_by_channel_count() {
        let clip = AudioClip::new(vec![0.1, 0.2, 0.3, 0.4, 0.5], 2, 44_100);
        assert_eq!(clip.frame_count(), 2);
        assert_eq!(clip.frame(1), &[0.3, 0.4]);
        assert!(clip.frame(2).is_empty());
    }
}
