//! Distance, cone and panning model.
//!
//! Everything here is pure. [`calc_attenuation`] turns emitter parameters and
//! listener state into left/right gains in [0, 1]; [`spatialize`] scales those
//! into 16-bit channel volumes and the listener-space direction the mixer
//! needs for directional rendering.

use glam::Vec3;

use crate::listener::{ListenerSnapshot, OutputMode};

pub const MIN_SOUND_DISTANCE: f32 = 0.1;
pub const MAX_SOUND_DISTANCE: f32 = 1000.0;

pub const DEFAULT_REFERENCE_DISTANCE: f32 = 1.0;
pub const DEFAULT_MAX_DISTANCE: f32 = 100.0;
pub const DEFAULT_ROLLOFF_RATE: f32 = 1.0;

/// Width of the fade-out zone past max distance, relative to max distance.
pub const FALLOFF_DISTANCE_SCALE: f32 = 1.3;
/// Max distance plus its fade-out zone.
pub const CULL_DISTANCE_SCALE: f32 = 1.0 + FALLOFF_DISTANCE_SCALE;

/// Volumes at or below this never start playback.
pub const VOLUME_EPSILON: f32 = 0.0001;

pub const MAX_CHANNEL_VOLUME: u16 = u16::MAX;

/// Closer than this the source counts as sitting on the listener.
const COLOCATED_DISTANCE: f32 = 1e-4;

/// Sound cone of a directional source, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub inner_angle: f32,
    pub outer_angle: f32,
}

impl Cone {
    pub const OMNI: Cone = Cone { inner_angle: 360.0, outer_angle: 360.0 };

    pub fn new(inner_angle: f32, outer_angle: f32) -> Self {
        Self { inner_angle: clamp_angle(inner_angle), outer_angle: clamp_angle(outer_angle) }
    }

    /// Attenuation for a listener `angle` degrees off the cone axis.
    pub fn attenuation(&self, angle: f32) -> f32 {
        if self.inner_angle >= 360.0 || angle <= self.inner_angle {
            1.0
        } else if angle >= self.outer_angle {
            0.0
        } else {
            (self.outer_angle - angle) / (self.outer_angle - self.inner_angle)
        }
    }
}

impl Default for Cone {
    fn default() -> Self {
        Cone::OMNI
    }
}

pub(crate) fn clamp_angle(a: f32) -> f32 {
    if a.is_nan() { 0.0 } else { a.clamp(0.0, 360.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SourceKind {
    #[default]
    Point,
    Directional(Cone),
    /// Music and ambience: never attenuated or panned.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceParams {
    pub reference_distance: f32,
    pub max_distance: f32,
    pub rolloff_rate: f32,
}

impl Default for DistanceParams {
    fn default() -> Self {
        Self {
            reference_distance: DEFAULT_REFERENCE_DISTANCE,
            max_distance: DEFAULT_MAX_DISTANCE,
            rolloff_rate: DEFAULT_ROLLOFF_RATE,
        }
    }
}

impl DistanceParams {
    /// Beyond this distance the source is guaranteed silent.
    pub fn cull_distance(&self) -> f32 {
        self.max_distance.max(self.reference_distance).min(MAX_SOUND_DISTANCE) * CULL_DISTANCE_SCALE
    }

    /// Distance attenuation including the fade-out zone past max distance.
    pub fn attenuation(&self, distance: f32) -> f32 {
        let reference = self.reference_distance.max(MIN_SOUND_DISTANCE);
        let max = self.max_distance.max(reference);
        let clamped = distance.clamp(reference, max);
        let mut att = reference / (reference + self.rolloff_rate * (clamped - reference));
        if distance > max {
            let width = max * FALLOFF_DISTANCE_SCALE;
            let over = distance - max;
            att = if over >= width { 0.0 } else { att * (1.0 - over / width) };
        }
        att
    }
}

/// Everything about a source the model needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    pub kind: SourceKind,
    pub position: Vec3,
    pub direction: Vec3,
    pub distance: DistanceParams,
}

impl Emitter {
    pub fn point(position: Vec3) -> Self {
        Self { kind: SourceKind::Point, position, direction: Vec3::NEG_Z, distance: DistanceParams::default() }
    }

    pub fn background() -> Self {
        Self { kind: SourceKind::Background, ..Self::point(Vec3::ZERO) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub left: f32,
    pub right: f32,
}

impl Gains {
    pub const FULL: Gains = Gains { left: 1.0, right: 1.0 };
    pub const SILENT: Gains = Gains { left: 0.0, right: 0.0 };

    fn centered(g: f32) -> Self {
        Gains { left: g, right: g }
    }
}

/// Left/right gains for `emitter` heard from `listener_position`.
pub fn calc_attenuation(emitter: &Emitter, listener_position: Vec3, listener_right: Vec3, output: OutputMode) -> Gains {
    if emitter.kind == SourceKind::Background {
        return Gains::FULL;
    }
    let to_source = emitter.position - listener_position;
    if !to_source.is_finite() {
        return Gains::SILENT;
    }
    let distance = to_source.length();
    if !(distance > COLOCATED_DISTANCE) {
        return Gains::FULL;
    }
    let dir = to_source / distance;

    let mut att = 1.0;
    if let SourceKind::Directional(cone) = emitter.kind {
        if cone.inner_angle < 360.0 {
            if let Some(forward) = emitter.direction.try_normalize() {
                let angle = forward.dot(-dir).clamp(-1.0, 1.0).acos().to_degrees();
                att = cone.attenuation(angle);
            }
        }
    }

    att *= emitter.distance.attenuation(distance);

    if output.pans() {
        let pan = listener_right.dot(dir);
        Gains { left: (att * (1.0 - pan)).clamp(0.0, 1.0), right: (att * (1.0 + pan)).clamp(0.0, 1.0) }
    } else {
        Gains::centered(att.clamp(0.0, 1.0))
    }
}

/// Output of one spatialization pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialResult {
    pub channel_volume: [u16; 2],
    /// Unit direction to the source in listener space. `+Y` when unknown.
    pub local_dir: Vec3,
    /// The mixer should render `local_dir` directionally.
    pub spatialized_stereo: bool,
}

impl SpatialResult {
    pub const SILENT: SpatialResult =
        SpatialResult { channel_volume: [0, 0], local_dir: Vec3::Y, spatialized_stereo: false };

    pub fn is_silent(&self) -> bool {
        self.channel_volume == [0, 0]
    }
}

/// Scale `volume` (already combined from source and group) by the listener
/// and the attenuation model.
pub fn spatialize(listener: &ListenerSnapshot, emitter: &Emitter, volume: f32) -> SpatialResult {
    let base = (volume * listener.volume_scale).clamp(0.0, 1.0) * MAX_CHANNEL_VOLUME as f32;
    let to_source = emitter.position - listener.position;
    if emitter.kind != SourceKind::Background && !to_source.is_finite() {
        return SpatialResult::SILENT;
    }
    let bypass = emitter.kind == SourceKind::Background || !(to_source.length() > COLOCATED_DISTANCE);
    if bypass {
        return SpatialResult { channel_volume: [to_channel(base), to_channel(base)], ..SpatialResult::SILENT };
    }

    let gains = calc_attenuation(emitter, listener.position, listener.right, listener.output);
    let hrtf = listener.output == OutputMode::Hrtf;
    let local_dir = if hrtf {
        listener.to_local(emitter.position).try_normalize().unwrap_or(Vec3::Y)
    } else {
        Vec3::Y
    };
    SpatialResult {
        channel_volume: [to_channel(base * gains.left), to_channel(base * gains.right)],
        local_dir,
        spatialized_stereo: hrtf,
    }
}

pub(crate) fn to_channel(v: f32) -> u16 {
    if v.is_nan() { 0 } else { v.round().clamp(0.0, MAX_CHANNEL_VOLUME as f32) as u16 }
}

/// Scale a channel volume by a [0, 1] factor.
pub(crate) fn scale_channel(v: u16, scale: f32) -> u16 {
    to_channel(v as f32 * scale)
}
