//! Mixer seam and a reference software mixer.
//!
//! The frame side only ever calls [`Mixer::submit_tracks`]. [`SoftwareMixer`]
//! takes submitted tracks through a bounded lock-free queue so the frame
//! thread never waits on the audio thread, then sums voices into the
//! backend's interleaved buffer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use audio_backend::{DeviceInfo, RenderFn};
use crossbeam::queue::ArrayQueue;
use parking_lot::Mutex;

use crate::attenuation::MAX_CHANNEL_VOLUME;
use crate::submit::SubmitQueue;
use crate::track::Track;

pub trait Mixer: Send + Sync {
    /// Take ownership of this frame's newly ready tracks. Leaves `queue` empty.
    fn submit_tracks(&self, queue: &mut SubmitQueue);
}

pub struct SoftwareMixer {
    incoming: ArrayQueue<Arc<Track>>,
    voices: Mutex<Vec<Arc<Track>>>,
    channels: u16,
    dropped_count: AtomicU64,
    frames_rendered: AtomicU64,
}

impl SoftwareMixer {
    pub fn new(capacity: usize, device: &DeviceInfo) -> Self {
        Self {
            incoming: ArrayQueue::new(capacity.max(1)),
            voices: Mutex::new(Vec::new()),
            channels: device.channels.max(1),
            dropped_count: AtomicU64::new(0),
            frames_rendered: AtomicU64::new(0),
        }
    }

    /// Tracks submitted but not yet picked up by a render pass.
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.lock().len()
    }

    /// Submissions refused because the ingestion queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Relaxed)
    }

    /// Render `frames` interleaved frames into `out`, overwriting it.
    pub fn render(&self, out: &mut [f32], frames: usize) {
        out.iter_mut().for_each(|s| *s = 0.0);
        let ch = self.channels as usize;
        let frames = frames.min(out.len() / ch);

        let mut voices = self.voices.lock();
        while let Some(track) = self.incoming.pop() {
            voices.push(track);
        }
        voices.retain(|v| !v.is_stopped());

        for voice in voices.iter() {
            let params = voice.params();
            if params.paused {
                continue;
            }
            let mut gain_l = params.channel_volume[0] as f32 / MAX_CHANNEL_VOLUME as f32;
            let mut gain_r = params.channel_volume[1] as f32 / MAX_CHANNEL_VOLUME as f32;
            if params.spatialized_stereo && ch >= 2 {
                let pan = params.local_dir.x.clamp(-1.0, 1.0);
                gain_l *= (1.0 - pan).min(1.0);
                gain_r *= (1.0 + pan).min(1.0);
            }
            mix_voice(voice, out, frames, ch, gain_l, gain_r);
        }

        voices.retain(|v| !v.is_finished());
        self.frames_rendered.fetch_add(frames as u64, Ordering::Relaxed);
    }
}

fn mix_voice(voice: &Track, out: &mut [f32], frames: usize, ch: usize, gain_l: f32, gain_r: f32) {
    let clip = voice.clip();
    let total = clip.frame_count();
    let start = voice.position();
    let mut pos = start;
    for i in 0..frames {
        if pos >= total {
            break;
        }
        let (l, r) = match clip.frame(pos) {
            [m] => (*m, *m),
            [l, r, ..] => (*l, *r),
            [] => break,
        };
        let frame = &mut out[i * ch..(i + 1) * ch];
        if ch == 1 {
            frame[0] += 0.5 * (l * gain_l + r * gain_r);
        } else {
            frame[0] += l * gain_l;
            frame[1] += r * gain_r;
        }
        pos += 1;
        // Wrap as soon as the last frame is consumed so a looping cursor
        // never rests on the end of the clip.
        if pos >= total {
            if let Some(l) = voice.loop_start() {
                pos = l;
                voice.count_loop();
            }
        }
    }
    voice.commit_position(start, pos);
}

impl Mixer for SoftwareMixer {
    fn submit_tracks(&self, queue: &mut SubmitQueue) {
        for track in queue.drain() {
            if self.incoming.push(track).is_err() {
                self.dropped_count.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(capacity = self.incoming.capacity(), "mixer ingestion queue full, track dropped");
            }
        }
    }
}

/// Adapt a mixer into a backend render callback.
pub fn render_fn_for_mixer(mixer: Arc<SoftwareMixer>) -> RenderFn {
    Arc::new(move |buffer: &mut [f32], _sample_rate: u32, frames: usize| {
        mixer.render(buffer, frames);
    })
}
