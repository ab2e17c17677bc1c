//! Playback engine boundary.
//!
//! [`PlaybackEngine`] is everything the player window needs from a media
//! backend. [`FfmpegEngine`] implements it with FFmpeg for demuxing and
//! decoding and rodio for audio output; decoding happens on a thread owned
//! by the engine and never leaks past this module.

mod audio;
mod clock;
mod cursor;
mod decoder;
mod engine;
mod events;
mod sample_ring;
mod video;

use crossbeam_channel::Receiver;
use egui::TextureId;
use std::path::Path;

pub use engine::FfmpegEngine;
pub use events::{EngineEvent, EventHub, MediaStatus};

/// The current video frame as it lives on the GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSurface {
    pub texture: TextureId,
    /// Frame size in pixels.
    pub size: [u32; 2],
}

/// Media backend driven by the player window.
///
/// All methods are called from the UI thread. Positions and durations are
/// milliseconds. Notifications are delivered through [`subscribe`]; an
/// implementation must emit them from within its own method calls so they
/// arrive on the UI thread, after the call that caused them.
///
/// [`subscribe`]: PlaybackEngine::subscribe
pub trait PlaybackEngine {
    /// Registers a listener. Dropping the receiver unregisters it.
    fn subscribe(&mut self) -> Receiver<EngineEvent>;

    fn load_source(&mut self, path: &Path);
    fn stop(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;

    fn seek(&mut self, position_ms: u64);
    fn position(&self) -> u64;
    fn duration(&self) -> u64;

    /// `volume` is linear gain in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    fn set_muted(&mut self, muted: bool);
    fn is_muted(&self) -> bool;

    /// True once a source has been set, whether or not it decoded.
    fn source_is_valid(&self) -> bool;

    /// Per-frame pump: moves decoded frames to the surface and turns
    /// backend state changes into notifications.
    fn update(&mut self);

    fn surface(&self) -> Option<VideoSurface>;
}
