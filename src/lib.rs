pub mod app;
pub mod config;
pub mod error;
pub mod player;
pub mod ui;
pub mod window;

pub use app::VideoPlayerApp;
pub use config::{PlayerConfig, VideoFilter};
pub use error::PlayerError;
pub use player::{EngineEvent, FfmpegEngine, MediaStatus, PlaybackEngine};
pub use ui::range_control::RangeControl;
pub use window::{PlaybackState, PlayerWindow};
