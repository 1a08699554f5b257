use std::sync::Arc;

use crate::track::Track;

/// Tracks that became ready during one frame, in the order they were found.
/// Built by the sound system, consumed once by the mixer.
#[derive(Debug, Default)]
pub struct SubmitQueue {
    tracks: Vec<Arc<Track>>,
}

impl SubmitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { tracks: Vec::with_capacity(capacity) }
    }

    pub fn push(&mut self, track: Arc<Track>) {
        self.tracks.push(track);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    /// Take every queued track, keeping the allocation for the next frame.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Arc<Track>> {
        self.tracks.drain(..)
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}
