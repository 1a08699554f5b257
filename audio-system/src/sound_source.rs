//! Per-entity playback state machine.
//!
//! A [`SoundSource`] owns at most one main track, a FIFO of sounds to play
//! after it, and any number of one-shot sub-tracks layered on top. Each frame
//! the sound system calls [`SoundSource::spatialize`] followed by
//! [`SoundSource::update_track`].

use std::collections::VecDeque;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use tracing::{debug, trace, warn};

use crate::attenuation::{
    self, clamp_angle, scale_channel, Cone, DistanceParams, Emitter, SourceKind, SpatialResult, MAX_SOUND_DISTANCE,
    MIN_SOUND_DISTANCE, VOLUME_EPSILON,
};
use crate::context::AudioContext;
use crate::error::PlayError;
use crate::group::{effective_pause, saturate, SoundGroup};
use crate::listener::ListenerSnapshot;
use crate::resource::SoundHandle;
use crate::submit::SubmitQueue;
use crate::track::{PlaybackParams, Track, TrackSlot};

#[derive(Debug)]
struct OneShotTrack {
    slot: TrackSlot,
    volume_scale: f32,
}

#[derive(Component, Debug)]
pub struct SoundSource {
    entity: Option<Entity>,
    position: Vec3,
    direction: Vec3,
    target_listener: Option<Entity>,
    listener_mask: u32,
    kind: SourceKind,
    group: Option<Arc<SoundGroup>>,

    handle: SoundHandle,
    track: Option<TrackSlot>,
    queue: VecDeque<SoundHandle>,
    one_shots: Vec<OneShotTrack>,

    volume: f32,
    distance: DistanceParams,
    muted: bool,
    paused: bool,
    virtualize_when_silent: bool,

    spatial: SpatialResult,
}

impl Default for SoundSource {
    fn default() -> Self {
        Self {
            entity: None,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            target_listener: None,
            listener_mask: u32::MAX,
            kind: SourceKind::Point,
            group: None,
            handle: SoundHandle::INVALID,
            track: None,
            queue: VecDeque::new(),
            one_shots: Vec::new(),
            volume: 1.0,
            distance: DistanceParams::default(),
            muted: false,
            paused: false,
            virtualize_when_silent: false,
            spatial: SpatialResult::SILENT,
        }
    }
}

impl SoundSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(kind: SourceKind) -> Self {
        let mut s = Self::default();
        s.set_kind(kind);
        s
    }

    // ---- playback -------------------------------------------------------

    /// Replace whatever is playing (and the queue) with `handle`. On failure
    /// nothing changes and the current track keeps playing.
    pub fn play_sound(&mut self, ctx: &AudioContext, handle: SoundHandle, start_frame: u64, loop_start: Option<u64>) -> bool {
        match self.start_track(ctx, handle, start_frame, loop_start) {
            Ok(()) => {
                self.queue.clear();
                true
            }
            Err(err) => {
                warn!(%handle, reason = %err, "play_sound rejected");
                false
            }
        }
    }

    /// Layer an independent track on top of the main one.
    pub fn play_one_shot(&mut self, ctx: &AudioContext, handle: SoundHandle, volume_scale: f32, start_frame: u64) -> bool {
        let result = if !(volume_scale > VOLUME_EPSILON) {
            Err(PlayError::VolumeTooLow)
        } else {
            ctx.load_clip(handle).and_then(|clip| Track::start(handle, clip, start_frame, None))
        };
        match result {
            Ok(track) => {
                self.one_shots.push(OneShotTrack { slot: TrackSlot::new(track), volume_scale: volume_scale.min(1.0) });
                true
            }
            Err(err) => {
                warn!(%handle, reason = %err, "play_one_shot rejected");
                false
            }
        }
    }

    /// Play `handle` now if nothing is playing, otherwise after everything
    /// already queued.
    pub fn add_to_queue(&mut self, ctx: &AudioContext, handle: SoundHandle) -> bool {
        if let Err(err) = ctx.load_clip(handle) {
            warn!(%handle, reason = %err, "add_to_queue rejected");
            return false;
        }
        if self.is_silent() && self.queue.is_empty() {
            return match self.start_track(ctx, handle, 0, None) {
                Ok(()) => true,
                Err(err) => {
                    warn!(%handle, reason = %err, "add_to_queue could not start");
                    false
                }
            };
        }
        self.queue.push_back(handle);
        if self.is_silent() {
            self.select_next_sound(ctx);
        }
        true
    }

    pub fn clear_sound(&mut self) {
        self.track = None;
        self.handle = SoundHandle::INVALID;
        self.spatial.channel_volume = [0, 0];
        self.queue.clear();
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Start the current sound again from the top, keeping its loop point.
    pub fn restart_sound(&mut self, ctx: &AudioContext) -> bool {
        if !self.handle.is_valid() {
            return false;
        }
        let loop_start = self.track.as_ref().and_then(|s| s.track().loop_start());
        match self.start_track(ctx, self.handle, 0, loop_start) {
            Ok(()) => true,
            Err(err) => {
                warn!(handle = %self.handle, reason = %err, "restart_sound failed");
                false
            }
        }
    }

    /// Start the first queued sound that can play, discarding the ones that
    /// cannot. Each queued entry is tried at most once.
    pub fn select_next_sound(&mut self, ctx: &AudioContext) -> bool {
        let attempts = self.queue.len();
        for _ in 0..attempts {
            let Some(handle) = self.queue.pop_front() else { break };
            match self.start_track(ctx, handle, 0, None) {
                Ok(()) => {
                    debug!(%handle, remaining = self.queue.len(), "advanced to queued sound");
                    return true;
                }
                Err(err) => warn!(%handle, reason = %err, "skipping queued sound"),
            }
        }
        false
    }

    fn start_track(
        &mut self,
        ctx: &AudioContext,
        handle: SoundHandle,
        start_frame: u64,
        loop_start: Option<u64>,
    ) -> Result<(), PlayError> {
        let clip = ctx.load_clip(handle)?;
        let track = Track::start(handle, clip, start_frame, loop_start)?;
        self.handle = handle;
        self.track = Some(TrackSlot::new(track));
        Ok(())
    }

    // ---- position -------------------------------------------------------

    pub fn playback_position(&self) -> u64 {
        self.track.as_ref().map_or(0, |s| s.track().position())
    }

    pub fn set_playback_position(&mut self, frame: u64) {
        if let Some(slot) = &self.track {
            let track = slot.track();
            let frame = frame.min(track.frame_count());
            if frame != track.position() {
                track.set_position(frame);
            }
        }
    }

    pub fn playback_time(&self, ctx: &AudioContext) -> f32 {
        ctx.frames_to_seconds(self.playback_position())
    }

    pub fn set_playback_time(&mut self, ctx: &AudioContext, seconds: f32) {
        self.set_playback_position(ctx.seconds_to_frames(seconds));
    }

    // ---- configuration --------------------------------------------------

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    pub fn set_entity(&mut self, entity: Option<Entity>) {
        self.entity = entity;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// The rotation's forward (-Z) axis becomes the emit direction.
    pub fn set_transform(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.direction = rotation * Vec3::NEG_Z;
    }

    pub fn group(&self) -> Option<&Arc<SoundGroup>> {
        self.group.as_ref()
    }

    pub fn set_group(&mut self, group: Option<Arc<SoundGroup>>) {
        self.group = group;
    }

    pub fn target_listener(&self) -> Option<Entity> {
        self.target_listener
    }

    pub fn set_target_listener(&mut self, listener: Option<Entity>) {
        self.target_listener = listener;
    }

    pub fn listener_mask(&self) -> u32 {
        self.listener_mask
    }

    pub fn set_listener_mask(&mut self, mask: u32) {
        self.listener_mask = mask;
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: SourceKind) {
        self.kind = match kind {
            SourceKind::Directional(c) => SourceKind::Directional(Cone::new(c.inner_angle, c.outer_angle)),
            other => other,
        };
    }

    pub fn virtualize_when_silent(&self) -> bool {
        self.virtualize_when_silent
    }

    pub fn set_virtualize_when_silent(&mut self, enabled: bool) {
        self.virtualize_when_silent = enabled;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = saturate(volume);
    }

    pub fn reference_distance(&self) -> f32 {
        self.distance.reference_distance
    }

    /// Raises max distance if needed to keep `reference <= max`.
    pub fn set_reference_distance(&mut self, distance: f32) {
        let d = clamp_distance(distance);
        self.distance.reference_distance = d;
        self.distance.max_distance = self.distance.max_distance.max(d);
    }

    pub fn max_distance(&self) -> f32 {
        self.distance.max_distance
    }

    /// Never goes below the reference distance.
    pub fn set_max_distance(&mut self, distance: f32) {
        self.distance.max_distance = clamp_distance(distance).max(self.distance.reference_distance);
    }

    pub fn rolloff_rate(&self) -> f32 {
        self.distance.rolloff_rate
    }

    pub fn set_rolloff_rate(&mut self, rate: f32) {
        self.distance.rolloff_rate = saturate(rate);
    }

    /// `None` unless the source is directional.
    pub fn cone(&self) -> Option<Cone> {
        match self.kind {
            SourceKind::Directional(c) => Some(c),
            _ => None,
        }
    }

    /// Only affects directional sources.
    pub fn set_cone_inner_angle(&mut self, degrees: f32) {
        if let SourceKind::Directional(c) = &mut self.kind {
            c.inner_angle = clamp_angle(degrees);
        } else {
            trace!(degrees, "cone angle ignored on non-directional source");
        }
    }

    /// Only affects directional sources.
    pub fn set_cone_outer_angle(&mut self, degrees: f32) {
        if let SourceKind::Directional(c) = &mut self.kind {
            c.outer_angle = clamp_angle(degrees);
        } else {
            trace!(degrees, "cone angle ignored on non-directional source");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    // ---- queries --------------------------------------------------------

    /// No current sound.
    pub fn is_silent(&self) -> bool {
        !self.handle.is_valid()
    }

    pub fn handle(&self) -> SoundHandle {
        self.handle
    }

    pub fn track(&self) -> Option<&Arc<Track>> {
        self.track.as_ref().map(|s| s.track())
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn one_shot_count(&self) -> usize {
        self.one_shots.len()
    }

    pub fn channel_volume(&self) -> [u16; 2] {
        self.spatial.channel_volume
    }

    pub fn local_dir(&self) -> Vec3 {
        self.spatial.local_dir
    }

    pub fn cull_distance(&self) -> f32 {
        self.distance.cull_distance()
    }

    fn emitter(&self) -> Emitter {
        Emitter { kind: self.kind, position: self.position, direction: self.direction, distance: self.distance }
    }

    // ---- per frame ------------------------------------------------------

    /// Compute this frame's channel volumes against `listener`.
    pub fn spatialize(&mut self, listener: &ListenerSnapshot) -> SpatialResult {
        let audible = !self.muted && listener.hears(self.target_listener, self.listener_mask);
        self.spatial = if audible {
            let group_volume = self.group.as_ref().map_or(1.0, |g| g.volume());
            attenuation::spatialize(listener, &self.emitter(), self.volume * group_volume)
        } else {
            SpatialResult::SILENT
        };
        self.spatial
    }

    /// Advance the state machine and publish parameters to the mixer. Must
    /// run after [`SoundSource::spatialize`] in the same frame.
    pub fn update_track(&mut self, ctx: &AudioContext, submit: &mut SubmitQueue, game_paused: bool) {
        let paused = effective_pause(self.group.as_deref(), self.paused, game_paused);
        let spatial = self.spatial;
        let virtualize = self.virtualize_when_silent;

        self.one_shots.retain_mut(|shot| {
            let track = shot.slot.track();
            if track.is_finished() || track.is_stopped() {
                trace!(handle = %track.handle(), "one-shot finished");
                return false;
            }
            let volume = [
                scale_channel(spatial.channel_volume[0], shot.volume_scale),
                scale_channel(spatial.channel_volume[1], shot.volume_scale),
            ];
            if shot.slot.needs_submit() && volume == [0, 0] && !virtualize {
                trace!(handle = %track.handle(), "silent one-shot discarded before submit");
                return false;
            }
            shot.slot.publish(params(volume, &spatial, paused), submit);
            true
        });

        let Some(slot) = &self.track else { return };
        if slot.track().is_finished() {
            debug!(handle = %self.handle, "track reached end");
            if !self.select_next_sound(ctx) {
                self.clear_sound();
                return;
            }
        }

        let Some(slot) = &mut self.track else { return };
        if slot.track().is_stopped() {
            self.clear_sound();
            return;
        }
        if slot.needs_submit() && spatial.is_silent() && !virtualize {
            trace!(handle = %self.handle, "silent track discarded before submit");
            self.clear_sound();
            return;
        }
        slot.publish(params(spatial.channel_volume, &spatial, paused), submit);
    }
}

fn params(channel_volume: [u16; 2], spatial: &SpatialResult, paused: bool) -> PlaybackParams {
    PlaybackParams {
        channel_volume,
        local_dir: spatial.local_dir,
        spatialized_stereo: spatial.spatialized_stereo,
        paused,
    }
}

fn clamp_distance(d: f32) -> f32 {
    if d.is_nan() { MIN_SOUND_DISTANCE } else { d.clamp(MIN_SOUND_DISTANCE, MAX_SOUND_DISTANCE) }
}
