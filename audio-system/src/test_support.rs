use std::sync::Arc;

use audio_backend::DeviceInfo;

use crate::context::AudioContext;
use crate::resource::{AudioClip, SoundBank, SoundHandle, SoundResource};

pub const SAMPLE_RATE: u32 = 1_000;
pub const SHORT_FRAMES: u64 = 16;
pub const LONG_FRAMES: u64 = 2_000;

pub struct Fixture {
    pub bank: Arc<SoundBank>,
    pub ctx: AudioContext,
    pub short: SoundHandle,
    pub long: SoundHandle,
    pub no_audio: SoundHandle,
    pub empty: SoundHandle,
}

impl Fixture {
    pub fn new() -> Self {
        let bank = Arc::new(SoundBank::new());
        let short = bank.register_clip("short", AudioClip::constant(0.5, SHORT_FRAMES as usize, SAMPLE_RATE));
        let long = bank.register_clip("long", AudioClip::constant(0.25, LONG_FRAMES as usize, SAMPLE_RATE));
        let no_audio = bank.register(SoundResource::without_audio("no-audio"));
        let empty = bank.register_clip("empty", AudioClip::mono(Vec::new(), SAMPLE_RATE));
        let ctx = AudioContext::new(bank.clone(), DeviceInfo::new(SAMPLE_RATE, 2));
        Self { bank, ctx, short, long, no_audio, empty }
    }
}
