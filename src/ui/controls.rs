use egui::{Button, RichText, Ui};

use super::range_control::RangeControl;
use super::transport::{Glyph, IconSet};

const VOLUME_BAR_WIDTH: f32 = 100.0;
/// Room kept right of the scrub bar for the label, volume bar and buttons.
const TRAILING_WIDTH: f32 = 280.0;
const MIN_SCRUB_WIDTH: f32 = 60.0;
const GLYPH_SIZE: f32 = 16.0;

/// What the user asked for through the control bar this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    OpenFile,
    PlayPause,
    Seek(u64),
    Volume(u32),
    ToggleMute,
    ToggleFullScreen,
}

/// Borrowed view of the window state the control bar draws.
pub struct ControlView<'a> {
    pub icons: IconSet,
    pub time_label: &'a str,
    pub scrub: &'a mut RangeControl,
    pub volume: &'a mut RangeControl,
}

pub struct ControlBar;

impl ControlBar {
    /// Lays out `open | play | scrub bar | time | volume | mute | full screen`
    /// and returns the actions triggered.
    pub fn show(ui: &mut Ui, view: ControlView<'_>) -> Vec<ControlAction> {
        let mut actions = Vec::new();

        ui.horizontal(|ui| {
            if glyph_button(ui, Glyph::OpenFile, true) {
                actions.push(ControlAction::OpenFile);
            }

            if glyph_button(ui, view.icons.play_pause, view.icons.play_enabled) {
                actions.push(ControlAction::PlayPause);
            }

            let scrub_width = (ui.available_width() - TRAILING_WIDTH).max(MIN_SCRUB_WIDTH);
            if let Some(position) = view.scrub.show(ui, scrub_width) {
                actions.push(ControlAction::Seek(position.round() as u64));
            }

            ui.label(view.time_label);

            if let Some(volume) = view.volume.show(ui, VOLUME_BAR_WIDTH) {
                actions.push(ControlAction::Volume(volume.round() as u32));
            }

            if glyph_button(ui, view.icons.volume, true) {
                actions.push(ControlAction::ToggleMute);
            }

            if glyph_button(ui, view.icons.full_screen, true) {
                actions.push(ControlAction::ToggleFullScreen);
            }
        });

        actions
    }
}

fn glyph_button(ui: &mut Ui, glyph: Glyph, enabled: bool) -> bool {
    ui.add_enabled(
        enabled,
        Button::new(RichText::new(glyph.symbol()).size(GLYPH_SIZE)),
    )
    .on_hover_text(glyph.hint())
    .clicked()
}
