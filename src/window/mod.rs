//! The player window's behaviour, independent of how it is drawn.
//!
//! [`PlayerWindow`] owns the engine, the dialogs, the two range controls and
//! the refresh timer. User intents come in as method calls (or
//! [`ControlAction`]s), engine notifications through [`process_events`], and
//! after every change the transport icons are recomputed from
//! [`PlaybackState`].
//!
//! [`process_events`]: PlayerWindow::process_events

mod dialogs;
mod timer;

pub use dialogs::{Dialogs, NativeDialogs};
pub use timer::RefreshTimer;

use crossbeam_channel::Receiver;
use egui::{Key, Pos2, Rect};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::{PlayerConfig, VideoFilter};
use crate::error::PlayerError;
use crate::player::{EngineEvent, MediaStatus, PlaybackEngine};
use crate::ui::time::format_time_label;
use crate::ui::{render_transport_state, ControlAction, ControlView, IconSet, RangeControl};

/// Where the current source is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportPhase {
    NoSource,
    Loading,
    Paused,
    Playing,
    Ended,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub source_path: Option<PathBuf>,
    pub is_playing: bool,
    pub is_muted: bool,
    /// Volume bar position, 0..=100.
    pub volume: u32,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// Set when a source is opened, cleared by the pause that follows its
    /// first load.
    pub is_first_load: bool,
    pub is_full_screen: bool,
    /// Cleared by an engine error, restored by loading another file.
    pub play_enabled: bool,
    pub phase: TransportPhase,
}

impl PlaybackState {
    pub fn new(volume: u32) -> Self {
        Self {
            source_path: None,
            is_playing: false,
            is_muted: false,
            volume: volume.min(100),
            position_ms: 0,
            duration_ms: 0,
            is_first_load: true,
            is_full_screen: false,
            play_enabled: true,
            phase: TransportPhase::NoSource,
        }
    }
}

pub struct PlayerWindow<E, D> {
    engine: E,
    dialogs: D,
    events: Receiver<EngineEvent>,
    state: PlaybackState,
    icons: IconSet,
    scrub: RangeControl,
    volume_bar: RangeControl,
    time_label: String,
    timer: RefreshTimer,
    filter: VideoFilter,
    last_error: Option<PlayerError>,
}

impl<E: PlaybackEngine, D: Dialogs> PlayerWindow<E, D> {
    /// Subscribes to `engine`, applies the configured volume and starts the
    /// refresh timer at `now`.
    pub fn new(mut engine: E, dialogs: D, config: &PlayerConfig, now: Instant) -> Self {
        let events = engine.subscribe();
        let state = PlaybackState::new(config.initial_volume);
        engine.set_volume(state.volume as f32 / 100.0);

        Self {
            engine,
            dialogs,
            events,
            icons: render_transport_state(&state),
            scrub: RangeControl::new(0.0, 0.0, 0.0),
            volume_bar: RangeControl::new(0.0, 100.0, f64::from(state.volume)),
            time_label: format_time_label(0, 0),
            timer: RefreshTimer::start(config.refresh_interval, now),
            filter: config.video_filter.clone(),
            last_error: None,
            state,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn icons(&self) -> IconSet {
        self.icons
    }

    pub fn time_label(&self) -> &str {
        &self.time_label
    }

    pub fn scrub_bar(&self) -> &RangeControl {
        &self.scrub
    }

    pub fn volume_bar(&self) -> &RangeControl {
        &self.volume_bar
    }

    pub fn last_error(&self) -> Option<&PlayerError> {
        self.last_error.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn dialogs(&self) -> &D {
        &self.dialogs
    }

    pub fn controls(&mut self) -> ControlView<'_> {
        ControlView {
            icons: self.icons,
            time_label: &self.time_label,
            scrub: &mut self.scrub,
            volume: &mut self.volume_bar,
        }
    }

    fn render(&mut self) {
        self.icons = render_transport_state(&self.state);
    }

    pub fn apply(&mut self, action: ControlAction) -> Result<(), PlayerError> {
        match action {
            ControlAction::OpenFile => self.open_file(),
            ControlAction::PlayPause => self.play_pause(),
            ControlAction::Seek(position) => {
                self.seek(position);
                Ok(())
            }
            ControlAction::Volume(volume) => {
                self.change_volume(volume);
                Ok(())
            }
            ControlAction::ToggleMute => {
                self.toggle_mute();
                Ok(())
            }
            ControlAction::ToggleFullScreen => {
                self.toggle_full_screen();
                Ok(())
            }
        }
    }

    /// Stops playback, then asks for a file. Cancelling leaves the player
    /// stopped on whatever was loaded before.
    pub fn open_file(&mut self) -> Result<(), PlayerError> {
        self.stop();
        self.state.is_first_load = true;
        match self.dialogs.pick_video(&self.filter) {
            Some(path) => {
                self.load(path);
                Ok(())
            }
            None => {
                debug!("open dialog cancelled");
                Err(PlayerError::UserCancelled)
            }
        }
    }

    /// Loads `path` without asking. Used for the startup file and drops.
    pub fn load(&mut self, path: PathBuf) {
        info!("loading {}", path.display());
        self.engine.load_source(&path);
        self.state.source_path = Some(path);
        self.state.is_first_load = true;
        self.state.is_playing = false;
        self.state.play_enabled = true;
        self.state.phase = TransportPhase::Loading;
        self.last_error = None;
        self.render();
    }

    /// Loads a dropped file if the filter accepts it.
    pub fn load_dropped(&mut self, path: PathBuf) -> Result<(), PlayerError> {
        if !self.filter.accepts(&path) {
            return Err(PlayerError::UnsupportedFile { path });
        }
        self.stop();
        self.load(path);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.engine.stop();
        self.state.is_playing = false;
        self.render();
    }

    pub fn play_pause(&mut self) -> Result<(), PlayerError> {
        if !self.engine.source_is_valid() {
            warn!("play requested with no video loaded");
            if self.dialogs.offer_open_file() {
                if let Err(e) = self.open_file() {
                    debug!("open after no-video warning: {e}");
                }
            }
            return Err(PlayerError::NoSourceSelected);
        }
        if !self.state.play_enabled {
            return Err(PlayerError::PlaybackDisabled);
        }

        if self.engine.is_playing() {
            self.engine.pause();
            self.state.phase = TransportPhase::Paused;
        } else {
            self.engine.play();
            self.state.phase = TransportPhase::Playing;
        }
        self.state.is_playing = self.engine.is_playing();
        self.render();
        Ok(())
    }

    pub fn seek(&mut self, position_ms: u64) {
        self.engine.seek(position_ms);
    }

    /// Volume bar moved to `volume` (0..=100).
    pub fn change_volume(&mut self, volume: u32) {
        let volume = volume.min(100);
        self.state.volume = volume;
        self.volume_bar.set_value(f64::from(volume));
        self.engine.set_volume(volume as f32 / 100.0);
        self.state.is_muted = self.engine.is_muted();
        self.render();
    }

    pub fn toggle_mute(&mut self) {
        let muted = !self.engine.is_muted();
        self.engine.set_muted(muted);
        self.state.is_muted = self.engine.is_muted();
        self.render();
    }

    /// Flips the requested full-screen state; the app applies it to the
    /// viewport.
    pub fn toggle_full_screen(&mut self) {
        self.state.is_full_screen = !self.state.is_full_screen;
        debug!("full screen: {}", self.state.is_full_screen);
        self.render();
    }

    /// Escape leaves full screen; Space plays or pauses; F and Q toggle
    /// full screen. Other keys are ignored.
    pub fn handle_key(&mut self, key: Key) -> Result<(), PlayerError> {
        match key {
            Key::Escape if self.state.is_full_screen => self.toggle_full_screen(),
            Key::Space => return self.play_pause(),
            Key::F | Key::Q => self.toggle_full_screen(),
            _ => {}
        }
        Ok(())
    }

    /// A primary press at `pointer`; inside `video` it acts as play/pause.
    pub fn press_on_video(&mut self, pointer: Pos2, video: Rect) -> Result<(), PlayerError> {
        if video.contains(pointer) {
            self.play_pause()
        } else {
            Ok(())
        }
    }

    /// True if the window may close.
    pub fn confirm_close(&mut self) -> bool {
        let close = self.dialogs.confirm_close();
        info!("close requested, confirmed: {close}");
        close
    }

    /// Refreshes the time label if the refresh interval elapsed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.timer.fire_if_due(now) {
            return false;
        }
        self.refresh_time_label();
        true
    }

    pub fn until_next_tick(&self, now: Instant) -> Duration {
        self.timer.until_due(now)
    }

    pub fn refresh_time_label(&mut self) {
        self.time_label = format_time_label(self.engine.position(), self.engine.duration());
    }

    /// Handles every notification the engine queued since the last call.
    pub fn process_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::PositionChanged(position) => {
                self.state.position_ms = position;
                self.scrub.set_value(position as f64);
            }
            EngineEvent::DurationChanged(duration) => {
                self.state.duration_ms = duration;
                self.scrub.set_range(0.0, duration as f64);
            }
            EngineEvent::Error(reason) => {
                error!("playback error: {reason}");
                self.state.play_enabled = false;
                self.state.is_playing = false;
                self.state.phase = TransportPhase::Failed;
                self.last_error = self
                    .state
                    .source_path
                    .clone()
                    .map(|path| PlayerError::SourceLoad { path, reason });
            }
            EngineEvent::MediaStatusChanged(status) => self.handle_status(status),
        }
        self.render();
    }

    fn handle_status(&mut self, status: MediaStatus) {
        match status {
            MediaStatus::EndOfMedia => {
                info!("reached end of media");
                self.state.is_playing = false;
                self.state.phase = TransportPhase::Ended;
                self.engine.seek(0);
            }
            MediaStatus::LoadedMedia => {
                if self.state.is_first_load {
                    self.engine.pause();
                    self.state.is_first_load = false;
                    self.state.is_playing = false;
                    self.state.phase = TransportPhase::Paused;
                }
            }
            MediaStatus::Loading => self.state.phase = TransportPhase::Loading,
            MediaStatus::InvalidMedia => self.state.phase = TransportPhase::Failed,
            MediaStatus::NoMedia => self.state.phase = TransportPhase::NoSource,
        }
    }
}
