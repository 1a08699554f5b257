use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;

use crate::{AudioBackend, BackendError, DeviceInfo, DeviceInfoProvider, DiagnosticsCb, RenderFn};

/// A Send-safe mock audio backend using arc-swap for RT-safe render access.
///
/// No thread is spawned: callers pump the installed render callback with
/// [`MockAudioBackend::render_block`], which makes mixer tests deterministic.
pub struct MockAudioBackend {
    info: DeviceInfo,
    render: ArcSwapOption<RenderFn>,
    frames: AtomicU64,
    diagnostics: Option<DiagnosticsCb>,
}

impl MockAudioBackend {
    pub fn new() -> Self {
        Self::with_device(DeviceInfo {
            sample_rate: 48_000,
            buffer_size: 256,
            channels: 2,
            device_name: Some("mock-device".to_string()),
        })
    }

    pub fn with_device(info: DeviceInfo) -> Self {
        Self {
            info,
            render: ArcSwapOption::from(None),
            frames: AtomicU64::new(0),
            diagnostics: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.render.load().is_some()
    }

    /// Run the render callback once for `frames` frames and return the
    /// interleaved output. Returns silence when the backend is stopped.
    pub fn render_block(&self, frames: usize) -> Vec<f32> {
        let channels = self.info.channels.max(1) as usize;
        let mut out = vec![0.0f32; frames * channels];
        if let Some(render) = self.render.load_full() {
            let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                (render)(&mut out, self.info.sample_rate, frames);
            }));
            if res.is_err() {
                out.iter_mut().for_each(|s| *s = 0.0);
                if let Some(cb) = &self.diagnostics {
                    cb(crate::DiagnosticEvent::Other("render callback panicked".into()));
                }
            }
            self.frames.fetch_add(frames as u64, Ordering::Relaxed);
        }
        out
    }
}

impl Default for MockAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for MockAudioBackend {
    fn start(&mut self, render: RenderFn) -> Result<(), BackendError> {
        self.render.store(Some(Arc::new(render)));
        self.frames.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.render.store(None);
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        self.info.clone()
    }

    fn frames_since_start(&self) -> u64 {
        if self.is_running() { self.frames.load(Ordering::Relaxed) } else { 0 }
    }

    fn set_diagnostics_callback(&mut self, cb: Option<DiagnosticsCb>) {
        self.diagnostics = cb;
    }

    fn as_device_info_provider(&self) -> Option<&dyn DeviceInfoProvider> {
        Some(self)
    }
}

impl DeviceInfoProvider for MockAudioBackend {
    fn get_device_name(&self) -> Option<&str> {
        self.info.device_name.as_deref()
    }
}
