use bevy_ecs::prelude::*;

/// Local transform component (position, rotation, scale, parent)
#[derive(Component, Debug, Clone)]
pub struct TransformComponent {
    pub position: glam::Vec3,
    pub rotation: glam::Quat,
    pub scale: glam::Vec3,
    pub parent: Option<Entity>,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: glam::Vec3::ZERO,
            rotation: glam::Quat::IDENTITY,
            scale: glam::Vec3::ONE,
            parent: None,
        }
    }
}

impl TransformComponent {
    pub fn local_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Cached world transform
#[derive(Component, Debug, Clone)]
pub struct WorldTransformComponent {
    pub matrix: glam::Mat4,
}

impl WorldTransformComponent {
    pub fn position(&self) -> glam::Vec3 {
        self.matrix.w_axis.truncate()
    }

    pub fn rotation(&self) -> glam::Quat {
        let (_, rotation, _) = self.matrix.to_scale_rotation_translation();
        rotation
    }
}

/// Per-listener audio settings. The entity referenced by [`ActiveListener`]
/// reads these when present.
#[derive(Component, Debug, Clone)]
pub struct AudioListenerComponent {
    /// Listener volume, clamped to [0, 1] by the audio system.
    pub volume: f32,
    /// Only sources whose listener mask shares a bit with this one are audible.
    pub mask: u32,
}

impl Default for AudioListenerComponent {
    fn default() -> Self {
        Self { volume: 1.0, mask: u32::MAX }
    }
}

/// The entity the audio system hears the world through.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct ActiveListener(pub Option<Entity>);

/// Set while gameplay is paused; sounds pause unless their group opts out.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct GamePaused(pub bool);

/// Timing of the frame currently being simulated.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameTime {
    pub delta: f32,
    pub frame: u64,
}
