//! Playback instances shared between the frame thread and the mixer.
//!
//! The frame side owns a [`TrackSlot`] and publishes [`PlaybackParams`] every
//! frame; the mixer holds an `Arc<Track>` after submission and advances the
//! cursor. Neither side blocks the other.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use glam::Vec3;

use crate::error::PlayError;
use crate::resource::{AudioClip, SoundHandle};
use crate::submit::SubmitQueue;

/// Parameters the mixer reads on every render pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParams {
    pub channel_volume: [u16; 2],
    pub local_dir: Vec3,
    pub spatialized_stereo: bool,
    pub paused: bool,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self { channel_volume: [0, 0], local_dir: Vec3::Y, spatialized_stereo: false, paused: false }
    }
}

pub struct Track {
    handle: SoundHandle,
    clip: Arc<AudioClip>,
    position: AtomicU64,
    loop_start: Option<u64>,
    loop_count: AtomicU32,
    stopped: AtomicBool,
    params: ArcSwap<PlaybackParams>,
}

impl Track {
    /// Create a track positioned at `start_frame`. A start frame past the
    /// end is accepted only when a valid `loop_start` lets playback wrap, in
    /// which case the track begins at the loop point with one loop counted.
    pub fn start(
        handle: SoundHandle,
        clip: Arc<AudioClip>,
        start_frame: u64,
        loop_start: Option<u64>,
    ) -> Result<Self, PlayError> {
        let frames = clip.frame_count();
        if frames == 0 {
            return Err(PlayError::ZeroFrames(handle));
        }
        let loop_start = loop_start.filter(|&l| l < frames);
        let (position, loops) = if start_frame < frames {
            (start_frame, 0)
        } else if let Some(l) = loop_start {
            (l, 1)
        } else {
            return Err(PlayError::StartFrameOutOfRange { start: start_frame, frames });
        };
        Ok(Self {
            handle,
            clip,
            position: AtomicU64::new(position),
            loop_start,
            loop_count: AtomicU32::new(loops),
            stopped: AtomicBool::new(false),
            params: ArcSwap::from_pointee(PlaybackParams::default()),
        })
    }

    pub fn handle(&self) -> SoundHandle {
        self.handle
    }

    pub fn clip(&self) -> &Arc<AudioClip> {
        &self.clip
    }

    pub fn frame_count(&self) -> u64 {
        self.clip.frame_count()
    }

    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Acquire)
    }

    /// Seek. Clamped to `[0, frame_count]`; a looping track seeked to the end
    /// lands on its loop point instead.
    pub fn set_position(&self, frame: u64) {
        let frame = match self.loop_start {
            Some(l) if frame >= self.frame_count() => {
                self.count_loop();
                l
            }
            _ => frame.min(self.frame_count()),
        };
        self.position.store(frame, Ordering::Release);
    }

    pub fn loop_start(&self) -> Option<u64> {
        self.loop_start
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count.load(Ordering::Relaxed)
    }

    /// A looping track never finishes; only a stop ends it.
    pub fn is_finished(&self) -> bool {
        self.loop_start.is_none() && self.position() >= self.frame_count()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn params(&self) -> PlaybackParams {
        **self.params.load()
    }

    pub fn set_params(&self, params: PlaybackParams) {
        self.params.store(Arc::new(params));
    }

    /// Mixer side: publish a cursor advanced from `from`. A seek that landed
    /// in between wins.
    pub(crate) fn commit_position(&self, from: u64, to: u64) {
        let _ = self.position.compare_exchange(from, to, Ordering::AcqRel, Ordering::Relaxed);
    }

    pub(crate) fn count_loop(&self) {
        self.loop_count.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("handle", &self.handle)
            .field("position", &self.position())
            .field("frames", &self.frame_count())
            .field("loop_start", &self.loop_start)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Frame-side ownership of a track. Dropping the slot stops the track so the
/// mixer retires its voice.
#[derive(Debug)]
pub struct TrackSlot {
    track: Arc<Track>,
    needs_submit: bool,
}

impl TrackSlot {
    pub fn new(track: Track) -> Self {
        Self { track: Arc::new(track), needs_submit: true }
    }

    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    pub fn needs_submit(&self) -> bool {
        self.needs_submit
    }

    /// Push this frame's parameters and hand the track to the mixer the first
    /// time round.
    pub fn publish(&mut self, params: PlaybackParams, submit: &mut SubmitQueue) {
        self.track.set_params(params);
        if self.needs_submit {
            submit.push(self.track.clone());
            self.needs_submit = false;
        }
    }
}

impl Drop for TrackSlot {
    fn drop(&mut self) {
        self.track.stop();
    }
}
