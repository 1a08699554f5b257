use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Upper bound on [`AudioConfig::max_pending_tracks`]; the queues using it
/// allocate up front.
pub const MAX_PENDING_TRACKS: usize = 65_536;

/// Runtime tunables of the audio subsystem. Every field has a default, so a
/// config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Global master volume, in [0, 1].
    pub master_volume: f32,
    /// Directional rendering instead of simple panning.
    pub hrtf: bool,
    /// Mixer refresh rate in Hz. The host renders blocks of
    /// [`AudioConfig::block_frames`] frames per refresh.
    pub refresh_rate: u32,
    /// Capacity of the mixer's track ingestion queue, at most
    /// [`MAX_PENDING_TRACKS`].
    pub max_pending_tracks: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { master_volume: 1.0, hrtf: false, refresh_rate: 60, max_pending_tracks: 256 }
    }
}

impl AudioConfig {
    pub fn from_ron_str(text: &str) -> anyhow::Result<Self> {
        let cfg: AudioConfig = ron::from_str(text).context("invalid audio config")?;
        Ok(cfg.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading audio config {}", path.display()))?;
        Self::from_ron_str(&text).with_context(|| format!("loading audio config {}", path.display()))
    }

    /// Clamp every field into its valid range.
    pub fn sanitized(mut self) -> Self {
        self.master_volume = crate::group::saturate(self.master_volume);
        self.refresh_rate = self.refresh_rate.clamp(1, 1000);
        self.max_pending_tracks = self.max_pending_tracks.clamp(1, MAX_PENDING_TRACKS);
        self
    }

    /// Frames the mixer renders per refresh at `sample_rate`.
    pub fn block_frames(&self, sample_rate: u32) -> usize {
        (sample_rate / self.refresh_rate.clamp(1, 1000)).max(1) as usize
    }
}
