use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Shared volume/pause modifier. Sources and one-shots hold it by `Arc`;
/// changes apply on the next frame.
#[derive(Debug)]
pub struct SoundGroup {
    volume: AtomicU32,
    paused: AtomicBool,
    play_even_when_paused: AtomicBool,
}

impl SoundGroup {
    pub fn new() -> Self {
        Self {
            volume: AtomicU32::new(1.0f32.to_bits()),
            paused: AtomicBool::new(false),
            play_even_when_paused: AtomicBool::new(false),
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    pub fn set_volume(&self, volume: f32) {
        self.volume.store(saturate(volume).to_bits(), Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn plays_even_when_paused(&self) -> bool {
        self.play_even_when_paused.load(Ordering::Relaxed)
    }

    pub fn set_play_even_when_paused(&self, enabled: bool) {
        self.play_even_when_paused.store(enabled, Ordering::Relaxed);
    }
}

impl Default for SoundGroup {
    fn default() -> Self {
        Self::new()
    }
}

/// NaN maps to 0.
pub(crate) fn saturate(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Group pause always wins; source and game pause can be overridden by a
/// group that plays while the game is paused.
pub(crate) fn effective_pause(group: Option<&SoundGroup>, source_paused: bool, game_paused: bool) -> bool {
    let requested = source_paused || game_paused;
    match group {
        Some(g) => (requested && !g.plays_even_when_paused()) || g.is_paused(),
        None => requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_clamped() {
        let g = SoundGroup::new();
        assert_eq!(g.volume(), 1.0);
        g.set_volume(3.0);
        assert_eq!(g.volume(), 1.0);
        g.set_volume(-0.5);
        assert_eq!(g.volume(), 0.0);
        g.set_volume(f32::NAN);
        assert_eq!(g.volume(), 0.0);
    }

    #[test]
    fn pause_resolution() {
        assert!(!effective_pause(None, false, false));
        assert!(effective_pause(None, false, true));
        assert!(effective_pause(None, true, false));

        let ui = SoundGroup::new();
        ui.set_play_even_when_paused(true);
        assert!(!effective_pause(Some(&ui), true, true));

        ui.set_paused(true);
        assert!(effective_pause(Some(&ui), false, false));
    }
}
