//! Spatialization and source lifecycle for the engine's 3D audio.
//!
//! Frame side: [`SoundSource`] components and the [`AudioInterface`] one-shot
//! pool are stepped once per frame by [`SoundSystem`], which hands newly
//! ready tracks to a [`Mixer`]. Audio side: [`SoftwareMixer`] renders those
//! tracks from the backend's render callback.

pub mod attenuation;
pub mod config;
pub mod context;
pub mod error;
pub mod group;
pub mod interface;
pub mod listener;
pub mod mixer;
pub mod one_shot;
pub mod resource;
pub mod sound_source;
pub mod sound_system;
pub mod submit;
pub mod track;

#[cfg(test)]
mod test_support;

pub use attenuation::{calc_attenuation, Cone, DistanceParams, Emitter, Gains, SourceKind, SpatialResult};
pub use config::AudioConfig;
pub use context::AudioContext;
pub use error::PlayError;
pub use group::SoundGroup;
pub use interface::AudioInterface;
pub use listener::{ListenerSnapshot, OutputMode};
pub use mixer::{render_fn_for_mixer, Mixer, SoftwareMixer};
pub use resource::{AudioClip, SoundBank, SoundHandle, SoundResolver, SoundResource};
pub use sound_source::SoundSource;
pub use sound_system::SoundSystem;
pub use submit::SubmitQueue;
pub use track::{PlaybackParams, Track, TrackSlot};
