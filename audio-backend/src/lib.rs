//! Audio device abstraction used by the mixer.
//!
//! The backend owns the hardware stream and periodically calls a [`RenderFn`]
//! to fill interleaved `f32` output. Everything above this crate only needs
//! [`DeviceInfo`] (sample rate, channel layout) and the render callback.

use std::fmt;
use std::sync::Arc;

pub mod mock_backend;

#[cfg(feature = "cpal")]
pub mod cpal_backend;

pub use mock_backend::MockAudioBackend;

/// A specialized error type for audio backend failures.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no output device available")]
    DeviceNotFound,
    #[error("unsupported stream format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to create output stream")]
    StreamCreationFailed,
    #[error("playback error: {0}")]
    PlaybackError(String),
    #[error("{0}")]
    Other(String),
}

/// The render callback function.
///
/// Called on the audio thread with `(interleaved_output, sample_rate, frames)`.
pub type RenderFn = Arc<dyn Fn(&mut [f32], u32, usize) + Send + Sync + 'static>;

/// Diagnostics events emitted by the backend (non-RT callbacks expected).
#[derive(Debug, Clone)]
pub enum DiagnosticEvent {
    XRun { count: u32 },
    DeviceRemoved,
    BufferSizeChanged { frames: usize },
    Other(String),
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::XRun { count } => write!(f, "XRun(count={})", count),
            DiagnosticEvent::DeviceRemoved => write!(f, "DeviceRemoved"),
            DiagnosticEvent::BufferSizeChanged { frames } => {
                write!(f, "BufferSizeChanged(frames={})", frames)
            }
            DiagnosticEvent::Other(s) => write!(f, "Other({})", s),
        }
    }
}

/// Non-RT diagnostics callback type.
pub type DiagnosticsCb = Arc<dyn Fn(DiagnosticEvent) + Send + Sync + 'static>;

/// Effective configuration of an output device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub sample_rate: u32,
    pub buffer_size: usize,
    pub channels: u16,
    pub device_name: Option<String>,
}

impl DeviceInfo {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self { sample_rate, buffer_size: 0, channels, device_name: None }
    }

    /// True when the device cannot render a stereo image.
    pub fn is_mono(&self) -> bool {
        self.channels < 2
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::new(48_000, 2)
    }
}

/// A trait for backends that can provide additional information about the audio device.
pub trait DeviceInfoProvider {
    fn get_device_name(&self) -> Option<&str>;
}

/// The core trait defining the audio backend's contract.
pub trait AudioBackend: Send {
    fn start(&mut self, render: RenderFn) -> Result<(), BackendError>;
    fn stop(&mut self) -> Result<(), BackendError>;
    fn device_info(&self) -> DeviceInfo;
    fn sample_rate(&self) -> u32 {
        self.device_info().sample_rate
    }
    fn channels(&self) -> u16 {
        self.device_info().channels
    }
    /// Returns frames since stream start. 0 if not running.
    fn frames_since_start(&self) -> u64;
    /// Register or clear non-RT diagnostics callback.
    fn set_diagnostics_callback(&mut self, cb: Option<DiagnosticsCb>);

    fn as_device_info_provider(&self) -> Option<&dyn DeviceInfoProvider>;
}

/// Create the default backend for this build: the CPAL device when the `cpal`
/// feature is enabled, otherwise the mock device.
pub fn create_audio_backend() -> Result<Box<dyn AudioBackend>, BackendError> {
    #[cfg(feature = "cpal")]
    let backend: Box<dyn AudioBackend> = Box::new(cpal_backend::CpalAudioBackend::new()?);
    #[cfg(not(feature = "cpal"))]
    let backend: Box<dyn AudioBackend> = Box::new(MockAudioBackend::new());

    let info = backend.device_info();
    tracing::info!(
        sample_rate = info.sample_rate,
        buffer_size = info.buffer_size,
        channels = info.channels,
        device = info.device_name.as_deref().unwrap_or("<unknown>"),
        "audio backend created"
    );
    Ok(backend)
}

/// Runtime helper telling dependents which backend variant was compiled.
pub fn is_mock_backend_enabled() -> bool {
    cfg!(not(feature = "cpal"))
}
