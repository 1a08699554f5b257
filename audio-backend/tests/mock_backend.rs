use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use audio_backend::{AudioBackend, DeviceInfo, MockAudioBackend, RenderFn};

#[test]
fn stopped_backend_renders_silence() {
    let backend = MockAudioBackend::new();
    let out = backend.render_block(64);
    assert_eq!(out.len(), 128);
    assert!(out.iter().all(|s| *s == 0.0));
    assert_eq!(backend.frames_since_start(), 0);
}

#[test]
fn render_callback_receives_device_layout() {
    let mut backend = MockAudioBackend::with_device(DeviceInfo::new(22_050, 1));
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let render: RenderFn = Arc::new(move |buf: &mut [f32], sr: u32, frames: usize| {
        assert_eq!(sr, 22_050);
        assert_eq!(buf.len(), frames);
        buf.iter_mut().for_each(|s| *s = 0.25);
        seen.fetch_add(1, Ordering::Relaxed);
    });
    backend.start(render).expect("start");

    let out = backend.render_block(32);
    assert!(out.iter().all(|s| (*s - 0.25).abs() < 1e-6));
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(backend.frames_since_start(), 32);

    backend.stop().expect("stop");
    assert!(!backend.is_running());
    assert_eq!(backend.frames_since_start(), 0);
}

#[test]
fn panicking_render_outputs_silence() {
    let mut backend = MockAudioBackend::new();
    backend
        .start(Arc::new(|buf: &mut [f32], _sr: u32, _frames: usize| {
            buf[0] = 1.0;
            panic!("render failure");
        }))
        .expect("start");
    let out = backend.render_block(16);
    assert!(out.iter().all(|s| *s == 0.0));
}

#[test]
fn default_factory_uses_mock_without_cpal_feature() {
    if !audio_backend::is_mock_backend_enabled() {
        return;
    }
    let backend = audio_backend::create_audio_backend().expect("create backend");
    let provider = backend.as_device_info_provider().expect("device info provider");
    assert_eq!(provider.get_device_name(), Some("mock-device"));
    assert!(!backend.device_info().is_mono());
}
