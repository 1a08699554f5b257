use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};

use engine_core::{ActiveListener, AudioListenerComponent, WorldTransformComponent};

use crate::group::saturate;

/// How spatialized gains reach the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Single-channel device; both gains equal the scalar attenuation.
    Mono,
    /// Simple left/right panning.
    #[default]
    StereoPan,
    /// Directional rendering: gains stay centered and the mixer receives a
    /// listener-space direction instead.
    Hrtf,
}

impl OutputMode {
    pub fn select(device_is_mono: bool, hrtf: bool) -> Self {
        if device_is_mono {
            OutputMode::Mono
        } else if hrtf {
            OutputMode::Hrtf
        } else {
            OutputMode::StereoPan
        }
    }

    pub fn pans(self) -> bool {
        self == OutputMode::StereoPan
    }
}

/// Listener state captured once per frame and shared by every source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerSnapshot {
    pub entity: Option<Entity>,
    pub inverse_transform: Mat4,
    pub position: Vec3,
    pub right: Vec3,
    /// Always within [0, 1].
    pub volume_scale: f32,
    pub mask: u32,
    pub output: OutputMode,
}

impl Default for ListenerSnapshot {
    fn default() -> Self {
        Self {
            entity: None,
            inverse_transform: Mat4::IDENTITY,
            position: Vec3::ZERO,
            right: Vec3::X,
            volume_scale: 1.0,
            mask: u32::MAX,
            output: OutputMode::default(),
        }
    }
}

impl ListenerSnapshot {
    pub fn new(entity: Option<Entity>, world_matrix: Option<&Mat4>, volume: f32, mask: u32, output: OutputMode) -> Self {
        let mut snapshot = Self { entity, volume_scale: saturate(volume), mask, output, ..Default::default() };
        if let Some(m) = world_matrix {
            snapshot.inverse_transform = m.inverse();
            snapshot.position = m.w_axis.truncate();
            snapshot.right = m.x_axis.truncate().try_normalize().unwrap_or(Vec3::X);
        }
        snapshot
    }

    /// Build the frame's snapshot from the active listener entity. Missing
    /// entities or components fall back to a centered, full-volume listener.
    pub fn capture(world: &World, master_volume: f32, output: OutputMode) -> Self {
        let entity = world.get_resource::<ActiveListener>().and_then(|l| l.0);
        let (volume, mask) = entity
            .and_then(|e| world.get::<AudioListenerComponent>(e))
            .map_or((1.0, u32::MAX), |l| (l.volume, l.mask));
        let matrix = entity.and_then(|e| world.get::<WorldTransformComponent>(e)).map(|t| t.matrix);
        Self::new(entity, matrix.as_ref(), volume * master_volume, mask, output)
    }

    /// Whether a source with this target filter and mask is audible.
    pub fn hears(&self, target: Option<Entity>, mask: u32) -> bool {
        if let Some(t) = target {
            if self.entity != Some(t) {
                return false;
            }
        }
        self.mask & mask != 0
    }

    pub fn to_local(&self, world_position: Vec3) -> Vec3 {
        self.inverse_transform.transform_point3(world_position)
    }
}
