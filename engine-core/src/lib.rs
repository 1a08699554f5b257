//! Minimal ECS host the audio subsystem runs inside: transforms, the
//! listener component and the per-frame schedule.

pub mod components;
pub mod engine;
pub mod transform;

pub use components::{
    ActiveListener, AudioListenerComponent, FrameTime, GamePaused, TransformComponent,
    WorldTransformComponent,
};
pub use engine::Engine;
pub use transform::world_transform_system;
