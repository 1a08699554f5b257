use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use arc_swap::ArcSwapOption;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig};
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::{
    AudioBackend, BackendError, DeviceInfo, DeviceInfoProvider, DiagnosticEvent, DiagnosticsCb,
    RenderFn,
};

/// Worker-thread-backed CPAL backend.
///
/// The worker owns the CPAL `Stream` (which is not `Send` on every platform);
/// this handle talks to it over a control channel.
pub struct CpalAudioBackend {
    inner: Arc<CpalBackendInner>,
}

struct CpalBackendInner {
    info: DeviceInfo,
    render: ArcSwapOption<RenderFn>,
    frames: AtomicU64,
    ctrl_tx: Sender<CtrlMsg>,
}

enum CtrlMsg {
    Start,
    Stop,
    SetDiagnostics(Option<DiagnosticsCb>),
    Shutdown,
}

impl CpalAudioBackend {
    pub fn new() -> Result<Self, BackendError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(BackendError::DeviceNotFound)?;

        let supported_configs = device
            .supported_output_configs()
            .map_err(|e| BackendError::Other(e.to_string()))?
            .collect::<Vec<_>>();

        // Prefer f32 interleaved stereo.
        let chosen = supported_configs
            .iter()
            .rev()
            .find(|c| c.sample_format() == SampleFormat::F32 && c.channels() >= 2)
            .or_else(|| supported_configs.iter().find(|c| c.sample_format() == SampleFormat::F32))
            .cloned()
            .ok_or_else(|| BackendError::UnsupportedFormat("no f32 output config".into()))?;

        let config = chosen.with_max_sample_rate().config();

        let buffer_frames = match config.buffer_size {
            cpal::BufferSize::Fixed(n) => n as usize,
            cpal::BufferSize::Default => 0_usize,
        };

        let info = DeviceInfo {
            sample_rate: config.sample_rate.0,
            buffer_size: buffer_frames,
            channels: config.channels,
            device_name: device.name().ok(),
        };

        let (tx, rx) = unbounded::<CtrlMsg>();

        let inner = Arc::new(CpalBackendInner {
            info,
            render: ArcSwapOption::from(None),
            frames: AtomicU64::new(0),
            ctrl_tx: tx,
        });

        let inner_worker = inner.clone();
        thread::Builder::new()
            .name("audio-device".into())
            .spawn(move || worker_loop(device, config, rx, inner_worker))
            .map_err(|e| BackendError::Other(e.to_string()))?;

        Ok(Self { inner })
    }

    fn send(&self, msg: CtrlMsg) -> Result<(), BackendError> {
        self.inner
            .ctrl_tx
            .send(msg)
            .map_err(|_| BackendError::Other("ctrl channel closed".into()))
    }
}

impl Drop for CpalAudioBackend {
    fn drop(&mut self) {
        let _ = self.inner.ctrl_tx.send(CtrlMsg::Shutdown);
    }
}

fn worker_loop(
    device: Device,
    config: StreamConfig,
    rx: Receiver<CtrlMsg>,
    inner: Arc<CpalBackendInner>,
) {
    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0;
    let mut diagnostics: Option<DiagnosticsCb> = None;
    let mut stream_opt: Option<cpal::Stream> = None;

    // Event-driven: the worker sleeps until the handle sends a control message.
    while let Ok(msg) = rx.recv() {
        match msg {
            CtrlMsg::Start => {
                if stream_opt.is_some() {
                    continue;
                }
                let inner_for_cb = inner.clone();
                let diagnostics_for_err_cb = diagnostics.clone();
                let err_cb = move |err| {
                    tracing::warn!(%err, "cpal stream error");
                    if let Some(cb) = &diagnostics_for_err_cb {
                        cb(DiagnosticEvent::XRun { count: 1 });
                    }
                };
                let data_cb = move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels;
                    match &*inner_for_cb.render.load() {
                        Some(render) => {
                            let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                                (render)(data, sample_rate, frames);
                            }));
                            if res.is_err() {
                                data.iter_mut().for_each(|s| *s = 0.0);
                            }
                        }
                        None => data.iter_mut().for_each(|s| *s = 0.0),
                    }
                    inner_for_cb.frames.fetch_add(frames as u64, Ordering::Relaxed);
                };

                match device.build_output_stream(&config, data_cb, err_cb, None) {
                    Ok(s) => match s.play() {
                        Ok(()) => stream_opt = Some(s),
                        Err(e) => tracing::warn!(%e, "failed to play stream"),
                    },
                    Err(e) => {
                        tracing::warn!(%e, "failed to build stream");
                        if let Some(cb) = &diagnostics {
                            cb(DiagnosticEvent::Other(format!("stream build failed: {}", e)));
                        }
                    }
                }
            }
            CtrlMsg::Stop => stream_opt = None,
            CtrlMsg::SetDiagnostics(cb) => diagnostics = cb,
            CtrlMsg::Shutdown => return,
        }
    }
}

impl AudioBackend for CpalAudioBackend {
    fn start(&mut self, render: RenderFn) -> Result<(), BackendError> {
        self.inner.render.store(Some(Arc::new(render)));
        self.send(CtrlMsg::Start)
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.send(CtrlMsg::Stop)?;
        self.inner.render.store(None);
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        self.inner.info.clone()
    }

    fn frames_since_start(&self) -> u64 {
        self.inner.frames.load(Ordering::Relaxed)
    }

    fn set_diagnostics_callback(&mut self, cb: Option<DiagnosticsCb>) {
        let _ = self.send(CtrlMsg::SetDiagnostics(cb));
    }

    fn as_device_info_provider(&self) -> Option<&dyn DeviceInfoProvider> {
        Some(self)
    }
}

impl DeviceInfoProvider for CpalAudioBackend {
    fn get_device_name(&self) -> Option<&str> {
        self.inner.info.device_name.as_deref()
    }
}
