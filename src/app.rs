use egui::{CentralPanel, Context, Frame, Key, Rect, TopBottomPanel, ViewportCommand};
use log::{debug, warn};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::PlayerConfig;
use crate::error::PlayerError;
use crate::player::FfmpegEngine;
use crate::ui::surface::show_surface;
use crate::ui::ControlBar;
use crate::window::{NativeDialogs, PlayerWindow};

const SHORTCUTS: [Key; 4] = [Key::Escape, Key::Space, Key::F, Key::Q];

/// Input gathered in one pass so no dialog opens while egui's input is
/// locked.
#[derive(Default)]
struct FrameInput {
    keys: Vec<Key>,
    primary_press: Option<egui::Pos2>,
    dropped: Option<PathBuf>,
    close_requested: bool,
}

pub struct VideoPlayerApp {
    window: PlayerWindow<FfmpegEngine, NativeDialogs>,
    /// Video area from the previous frame, for click-to-play hit testing.
    video_rect: Option<Rect>,
    /// Full-screen state last sent to the viewport.
    applied_full_screen: bool,
}

impl VideoPlayerApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: &PlayerConfig, initial: Option<PathBuf>) -> Self {
        let engine = FfmpegEngine::new(cc.egui_ctx.clone());
        let mut window = PlayerWindow::new(engine, NativeDialogs, config, Instant::now());
        if let Some(path) = initial {
            window.load(path);
        }
        Self {
            window,
            video_rect: None,
            applied_full_screen: false,
        }
    }

    fn gather_input(&self, ctx: &Context) -> FrameInput {
        ctx.input(|i| FrameInput {
            keys: SHORTCUTS
                .into_iter()
                .filter(|key| i.key_pressed(*key))
                .collect(),
            primary_press: i
                .pointer
                .primary_pressed()
                .then(|| i.pointer.interact_pos())
                .flatten(),
            dropped: i.raw.dropped_files.first().and_then(|f| f.path.clone()),
            close_requested: i.viewport().close_requested(),
        })
    }

    fn handle_input(&mut self, ctx: &Context, input: FrameInput) {
        if input.close_requested && !self.window.confirm_close() {
            ctx.send_viewport_cmd(ViewportCommand::CancelClose);
        }

        for key in input.keys {
            report(self.window.handle_key(key));
        }

        if let (Some(pointer), Some(video)) = (input.primary_press, self.video_rect) {
            report(self.window.press_on_video(pointer, video));
        }

        if let Some(path) = input.dropped {
            report(self.window.load_dropped(path));
        }
    }

    fn sync_viewport(&mut self, ctx: &Context) {
        let wanted = self.window.state().is_full_screen;
        if wanted != self.applied_full_screen {
            ctx.send_viewport_cmd(ViewportCommand::Fullscreen(wanted));
            self.applied_full_screen = wanted;
        }
    }
}

impl eframe::App for VideoPlayerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.window.engine_mut().update();
        self.window.process_events();

        let input = self.gather_input(ctx);
        self.handle_input(ctx, input);

        let mut actions = Vec::new();
        TopBottomPanel::bottom("controls").show(ctx, |ui| {
            actions = ControlBar::show(ui, self.window.controls());
        });

        CentralPanel::default()
            .frame(Frame::none())
            .show(ctx, |ui| {
                let (placeholder, is_error) = match self.window.last_error() {
                    Some(e) => (e.to_string(), true),
                    None => ("No video loaded".to_owned(), false),
                };
                let surface = self.window.engine().surface();
                self.video_rect = Some(show_surface(ui, surface, &placeholder, is_error));
            });

        for action in actions {
            report(self.window.apply(action));
        }
        self.window.process_events();
        self.sync_viewport(ctx);

        let now = Instant::now();
        self.window.tick(now);
        if self.window.state().is_playing {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(self.window.until_next_tick(now));
        }
    }
}

fn report(result: Result<(), PlayerError>) {
    match result {
        Ok(()) => {}
        Err(e) if e.is_quiet() => debug!("{e}"),
        Err(e) => warn!("{e}"),
    }
}
