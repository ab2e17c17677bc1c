use crossbeam_channel::Receiver;
use egui::{pos2, Key, Rect};
use egui_player::player::{EngineEvent, EventHub, MediaStatus, PlaybackEngine, VideoSurface};
use egui_player::ui::{ControlAction, Glyph};
use egui_player::window::{Dialogs, PlayerWindow, TransportPhase};
use egui_player::{PlayerConfig, PlayerError, VideoFilter};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(PathBuf),
    Stop,
    Play,
    Pause,
    Seek(u64),
    Volume(f32),
    Muted(bool),
}

/// Engine double: records calls and lets the test play the backend's part.
#[derive(Default)]
struct RecordingEngine {
    hub: EventHub,
    calls: Vec<Call>,
    source: Option<PathBuf>,
    playing: bool,
    muted: bool,
    volume: f32,
    position: u64,
    duration: u64,
}

impl RecordingEngine {
    fn emit(&mut self, event: EngineEvent) {
        self.hub.emit(event);
    }

    fn transport_calls(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Play | Call::Pause))
            .cloned()
            .collect()
    }
}

impl PlaybackEngine for RecordingEngine {
    fn subscribe(&mut self) -> Receiver<EngineEvent> {
        self.hub.subscribe()
    }

    fn load_source(&mut self, path: &Path) {
        self.calls.push(Call::Load(path.to_path_buf()));
        self.source = Some(path.to_path_buf());
        self.playing = false;
        self.hub
            .emit(EngineEvent::MediaStatusChanged(MediaStatus::Loading));
    }

    fn stop(&mut self) {
        self.calls.push(Call::Stop);
        self.playing = false;
        self.position = 0;
    }

    fn play(&mut self) {
        self.calls.push(Call::Play);
        self.playing = true;
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek(&mut self, position_ms: u64) {
        self.calls.push(Call::Seek(position_ms));
        self.position = position_ms;
        self.hub.emit(EngineEvent::PositionChanged(position_ms));
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn duration(&self) -> u64 {
        self.duration
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(Call::Volume(volume));
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_muted(&mut self, muted: bool) {
        self.calls.push(Call::Muted(muted));
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn source_is_valid(&self) -> bool {
        self.source.is_some()
    }

    fn update(&mut self) {}

    fn surface(&self) -> Option<VideoSurface> {
        None
    }
}

/// Answers dialogs from pre-loaded queues and counts what was asked.
#[derive(Default)]
struct ScriptedDialogs {
    files: VecDeque<Option<PathBuf>>,
    open_offers: VecDeque<bool>,
    close_answers: VecDeque<bool>,
    asked_for_file: usize,
    warned_no_source: usize,
    asked_to_close: usize,
}

impl Dialogs for ScriptedDialogs {
    fn pick_video(&mut self, filter: &VideoFilter) -> Option<PathBuf> {
        assert_eq!(filter.extensions, vec!["mp4".to_owned()]);
        self.asked_for_file += 1;
        self.files.pop_front().flatten()
    }

    fn offer_open_file(&mut self) -> bool {
        self.warned_no_source += 1;
        self.open_offers.pop_front().unwrap_or(false)
    }

    fn confirm_close(&mut self) -> bool {
        self.asked_to_close += 1;
        self.close_answers.pop_front().unwrap_or(false)
    }
}

type Window = PlayerWindow<RecordingEngine, ScriptedDialogs>;

fn window_with(dialogs: ScriptedDialogs) -> (Window, Instant) {
    let start = Instant::now();
    let window = PlayerWindow::new(
        RecordingEngine::default(),
        dialogs,
        &PlayerConfig::default(),
        start,
    );
    (window, start)
}

fn window() -> (Window, Instant) {
    window_with(ScriptedDialogs::default())
}

/// Window with `clip.mp4` loaded, its first load completed and
/// notifications drained.
fn loaded_window(duration_ms: u64) -> Window {
    let (mut window, _) = window();
    window.load(PathBuf::from("clip.mp4"));
    let engine = window.engine_mut();
    engine.duration = duration_ms;
    engine.emit(EngineEvent::DurationChanged(duration_ms));
    engine.emit(EngineEvent::MediaStatusChanged(MediaStatus::LoadedMedia));
    window.process_events();
    window
}

#[test]
fn starts_empty_with_configured_volume() {
    let (window, _) = window();
    assert_eq!(window.time_label(), "0:00/0:00");
    assert_eq!(window.state().phase, TransportPhase::NoSource);
    assert_eq!(window.state().volume, 50);
    assert_eq!(window.engine().volume, 0.5);
    assert_eq!(window.icons().play_pause, Glyph::Play);
    assert_eq!(window.volume_bar().value(), 50.0);
}

#[test]
fn play_without_source_warns_instead_of_playing() {
    let (mut window, _) = window();

    assert_eq!(window.play_pause(), Err(PlayerError::NoSourceSelected));
    assert_eq!(window.handle_key(Key::Space), Err(PlayerError::NoSourceSelected));

    assert_eq!(window.dialogs().warned_no_source, 2);
    assert_eq!(window.dialogs().asked_for_file, 0);
    assert!(window.engine().transport_calls().is_empty());
}

#[test]
fn no_source_warning_can_open_a_file() {
    let (mut window, _) = window_with(ScriptedDialogs {
        open_offers: VecDeque::from([true]),
        files: VecDeque::from([Some(PathBuf::from("/videos/Tutorial.mp4"))]),
        ..Default::default()
    });

    assert_eq!(window.play_pause(), Err(PlayerError::NoSourceSelected));
    assert!(window.engine().transport_calls().is_empty());
    assert!(window
        .engine()
        .calls
        .contains(&Call::Load(PathBuf::from("/videos/Tutorial.mp4"))));
    assert_eq!(window.state().phase, TransportPhase::Loading);
}

#[test]
fn open_file_stops_first_and_cancel_loads_nothing() {
    let (mut window, _) = window_with(ScriptedDialogs {
        files: VecDeque::from([None]),
        ..Default::default()
    });

    assert_eq!(window.apply(ControlAction::OpenFile), Err(PlayerError::UserCancelled));
    assert_eq!(window.engine().calls, vec![Call::Volume(0.5), Call::Stop]);
    assert_eq!(window.state().source_path, None);
}

#[test]
fn first_load_pauses_once() {
    let mut window = loaded_window(125_000);

    assert_eq!(window.engine().transport_calls(), vec![Call::Pause]);
    assert_eq!(window.state().phase, TransportPhase::Paused);
    assert!(!window.state().is_first_load);
    assert_eq!(window.scrub_bar().maximum(), 125_000.0);

    window.play_pause().unwrap();
    window
        .engine_mut()
        .emit(EngineEvent::MediaStatusChanged(MediaStatus::LoadedMedia));
    window.process_events();

    assert_eq!(window.engine().transport_calls(), vec![Call::Pause, Call::Play]);
    assert!(window.state().is_playing);
}

#[test]
fn play_pause_toggles_engine_and_icon() {
    let mut window = loaded_window(10_000);

    window.play_pause().unwrap();
    assert!(window.engine().playing);
    assert_eq!(window.icons().play_pause, Glyph::Pause);
    assert_eq!(window.state().phase, TransportPhase::Playing);

    window.play_pause().unwrap();
    assert!(!window.engine().playing);
    assert_eq!(window.icons().play_pause, Glyph::Play);
    assert_eq!(window.state().phase, TransportPhase::Paused);
}

#[test]
fn end_of_media_rewinds_without_restarting() {
    let mut window = loaded_window(10_000);
    window.play_pause().unwrap();
    window.engine_mut().playing = false;
    window
        .engine_mut()
        .emit(EngineEvent::MediaStatusChanged(MediaStatus::EndOfMedia));
    window.process_events();

    assert_eq!(window.engine().calls.last(), Some(&Call::Seek(0)));
    assert_eq!(window.engine().transport_calls(), vec![Call::Pause, Call::Play]);
    assert_eq!(window.icons().play_pause, Glyph::Play);
    assert_eq!(window.state().phase, TransportPhase::Ended);
    assert_eq!(window.state().position_ms, 0);
    assert_eq!(window.scrub_bar().value(), 0.0);
}

#[test]
fn end_of_media_while_paused_also_rewinds() {
    let mut window = loaded_window(10_000);
    window
        .engine_mut()
        .emit(EngineEvent::MediaStatusChanged(MediaStatus::EndOfMedia));
    window.process_events();

    assert_eq!(window.engine().calls.last(), Some(&Call::Seek(0)));
    assert_eq!(window.icons().play_pause, Glyph::Play);
}

#[test]
fn engine_error_disables_play_until_next_file() {
    let (mut window, _) = window_with(ScriptedDialogs {
        files: VecDeque::from([Some(PathBuf::from("good.mp4"))]),
        ..Default::default()
    });
    window.load(PathBuf::from("broken.mp4"));
    window
        .engine_mut()
        .emit(EngineEvent::Error("moov atom not found".into()));
    window.process_events();

    assert!(!window.icons().play_enabled);
    assert_eq!(window.state().phase, TransportPhase::Failed);
    assert_eq!(
        window.last_error(),
        Some(&PlayerError::SourceLoad {
            path: PathBuf::from("broken.mp4"),
            reason: "moov atom not found".into(),
        })
    );
    assert_eq!(window.play_pause(), Err(PlayerError::PlaybackDisabled));
    assert!(window.engine().transport_calls().is_empty());

    window.open_file().unwrap();
    assert!(window.icons().play_enabled);
    assert_eq!(window.last_error(), None);
}

#[test]
fn scrub_seeks_directly_and_progress_does_not_seek() {
    let mut window = loaded_window(125_000);

    window.apply(ControlAction::Seek(65_000)).unwrap();
    window.apply(ControlAction::Seek(66_000)).unwrap();
    let seeks: Vec<_> = window
        .engine()
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Seek(_)))
        .cloned()
        .collect();
    assert_eq!(seeks, vec![Call::Seek(65_000), Call::Seek(66_000)]);

    let before = window.engine().calls.len();
    window
        .engine_mut()
        .emit(EngineEvent::PositionChanged(70_000));
    window.process_events();
    assert_eq!(window.scrub_bar().value(), 70_000.0);
    assert_eq!(window.engine().calls.len(), before);
}

#[test]
fn volume_maps_to_engine_gain() {
    let (mut window, _) = window();
    for volume in [0, 1, 37, 50, 99, 100] {
        window.apply(ControlAction::Volume(volume)).unwrap();
        assert_eq!(window.engine().volume, volume as f32 / 100.0);
        let expected = if volume == 0 { Glyph::Muted } else { Glyph::Volume };
        assert_eq!(window.icons().volume, expected);
    }
}

#[test]
fn mute_toggle_follows_engine() {
    let (mut window, _) = window();
    window.apply(ControlAction::ToggleMute).unwrap();
    assert!(window.engine().muted);
    assert_eq!(window.icons().volume, Glyph::Muted);

    window.change_volume(80);
    assert_eq!(window.icons().volume, Glyph::Muted);

    window.toggle_mute();
    assert!(!window.engine().muted);
    assert_eq!(window.icons().volume, Glyph::Volume);
}

#[test]
fn full_screen_shortcuts() {
    let (mut window, _) = window();

    window.handle_key(Key::Escape).unwrap();
    assert!(!window.state().is_full_screen);

    window.handle_key(Key::F).unwrap();
    assert!(window.state().is_full_screen);
    assert_eq!(window.icons().full_screen, Glyph::ExitFullScreen);

    window.handle_key(Key::Escape).unwrap();
    assert!(!window.state().is_full_screen);

    window.handle_key(Key::Q).unwrap();
    assert!(window.state().is_full_screen);
    window.apply(ControlAction::ToggleFullScreen).unwrap();
    assert!(!window.state().is_full_screen);
    assert_eq!(window.icons().full_screen, Glyph::EnterFullScreen);
}

#[test]
fn press_inside_video_toggles_playback() {
    let mut window = loaded_window(10_000);
    let video = Rect::from_min_max(pos2(0.0, 0.0), pos2(800.0, 540.0));

    window.press_on_video(pos2(900.0, 580.0), video).unwrap();
    assert!(!window.engine().playing);

    window.press_on_video(pos2(400.0, 300.0), video).unwrap();
    assert!(window.engine().playing);
}

#[test]
fn time_label_refreshes_on_the_timer() {
    let (mut window, start) = window();
    window.load(PathBuf::from("clip.mp4"));
    window.engine_mut().position = 65_000;
    window.engine_mut().duration = 125_000;

    assert!(!window.tick(start + Duration::from_millis(500)));
    assert_eq!(window.time_label(), "0:00/0:00");

    assert!(window.tick(start + Duration::from_secs(1)));
    assert_eq!(window.time_label(), "1:05/2:05");
    assert_eq!(
        window.until_next_tick(start + Duration::from_secs(1)),
        Duration::from_secs(1)
    );
}

#[test]
fn close_needs_explicit_yes() {
    let (mut window, _) = window_with(ScriptedDialogs {
        close_answers: VecDeque::from([false, true]),
        ..Default::default()
    });

    assert!(!window.confirm_close());
    assert!(window.confirm_close());
    assert!(!window.confirm_close());
    assert_eq!(window.dialogs().asked_to_close, 3);
}

#[test]
fn dropped_files_respect_the_filter() {
    let (mut window, _) = window();

    assert_eq!(
        window.load_dropped(PathBuf::from("notes.txt")),
        Err(PlayerError::UnsupportedFile {
            path: PathBuf::from("notes.txt")
        })
    );
    assert!(window.engine().source.is_none());

    window.load_dropped(PathBuf::from("movie.mp4")).unwrap();
    assert_eq!(window.state().source_path, Some(PathBuf::from("movie.mp4")));
    assert!(window.state().is_first_load);
}
