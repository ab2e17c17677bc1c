use crate::window::PlaybackState;

/// Symbols shown on the transport buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Play,
    Pause,
    Volume,
    Muted,
    EnterFullScreen,
    ExitFullScreen,
    OpenFile,
}

impl Glyph {
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Play => "▶",
            Glyph::Pause => "⏸",
            Glyph::Volume => "🔊",
            Glyph::Muted => "🔇",
            Glyph::EnterFullScreen => "⛶",
            Glyph::ExitFullScreen => "🗗",
            Glyph::OpenFile => "🗁",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Glyph::Play => "Play (Space)",
            Glyph::Pause => "Pause (Space)",
            Glyph::Volume => "Mute",
            Glyph::Muted => "Unmute",
            Glyph::EnterFullScreen => "Full screen (F)",
            Glyph::ExitFullScreen => "Exit full screen (Esc)",
            Glyph::OpenFile => "Open video file",
        }
    }
}

/// What the control bar shows for a given playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconSet {
    pub play_pause: Glyph,
    pub volume: Glyph,
    pub full_screen: Glyph,
    pub play_enabled: bool,
}

/// Icon selection lives here and only here; the window calls it after every
/// state change.
pub fn render_transport_state(state: &PlaybackState) -> IconSet {
    IconSet {
        play_pause: if state.is_playing {
            Glyph::Pause
        } else {
            Glyph::Play
        },
        volume: if state.volume == 0 || state.is_muted {
            Glyph::Muted
        } else {
            Glyph::Volume
        },
        full_screen: if state.is_full_screen {
            Glyph::ExitFullScreen
        } else {
            Glyph::EnterFullScreen
        },
        play_enabled: state.play_enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_shows_play_and_volume() {
        let icons = render_transport_state(&PlaybackState::new(50));
        assert_eq!(icons.play_pause, Glyph::Play);
        assert_eq!(icons.volume, Glyph::Volume);
        assert_eq!(icons.full_screen, Glyph::EnterFullScreen);
        assert!(icons.play_enabled);
    }

    #[test]
    fn mute_glyph_depends_only_on_volume_and_mute_flag() {
        for volume in [0, 1, 50, 100] {
            for muted in [false, true] {
                let mut state = PlaybackState::new(volume);
                state.is_muted = muted;
                let expected = if volume == 0 || muted {
                    Glyph::Muted
                } else {
                    Glyph::Volume
                };
                assert_eq!(render_transport_state(&state).volume, expected);
            }
        }
    }

    #[test]
    fn playing_full_screen_state() {
        let mut state = PlaybackState::new(50);
        state.is_playing = true;
        state.is_full_screen = true;
        state.play_enabled = false;
        let icons = render_transport_state(&state);
        assert_eq!(icons.play_pause, Glyph::Pause);
        assert_eq!(icons.full_screen, Glyph::ExitFullScreen);
        assert!(!icons.play_enabled);
    }
}
