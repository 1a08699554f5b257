//! Shared setup for the cross-crate tests in `tests/`.

use std::sync::Arc;

use audio_backend::{AudioBackend, MockAudioBackend};
use audio_system::{AudioConfig, AudioContext, AudioInterface, SoftwareMixer, SoundBank};
use engine_core::Engine;

pub struct Harness {
    pub engine: Engine,
    pub backend: MockAudioBackend,
    pub bank: Arc<SoundBank>,
    pub mixer: Arc<SoftwareMixer>,
    /// Device block rendered per simulation frame, from the config's refresh rate.
    pub block_frames: usize,
}

impl Harness {
    pub fn new(config: AudioConfig) -> Self {
        Self::with_bank(config, Arc::new(SoundBank::new()))
    }

    pub fn with_bank(config: AudioConfig, bank: Arc<SoundBank>) -> Self {
        let mut engine = Engine::new();
        engine.bootstrap();
        let mut backend = MockAudioBackend::new();
        let block_frames = config.clone().sanitized().block_frames(backend.device_info().sample_rate);
        let mixer = engine_audio::install_audio(&mut engine, config, bank.clone(), &mut backend)
            .expect("install audio");
        Self { engine, backend, bank, mixer, block_frames }
    }

    pub fn interface(&self) -> AudioInterface {
        self.engine.world.resource::<AudioInterface>().clone()
    }

    pub fn ctx(&self) -> AudioContext {
        self.interface().context().clone()
    }

    /// One simulation frame followed by one device block.
    pub fn step(&mut self, block_frames: usize) -> Vec<f32> {
        self.engine.update(1.0 / 60.0);
        self.backend.render_block(block_frames)
    }

    /// [`Harness::step`] at the configured refresh rate.
    pub fn step_refresh(&mut self) -> Vec<f32> {
        self.step(self.block_frames)
    }
}

/// Peak absolute sample per channel of interleaved stereo.
pub fn stereo_peaks(out: &[f32]) -> (f32, f32) {
    out.chunks_exact(2).fold((0.0f32, 0.0f32), |(l, r), f| (l.max(f[0].abs()), r.max(f[1].abs())))
}
