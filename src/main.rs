use clap::Parser;
use egui_player::{PlayerConfig, VideoPlayerApp};
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "egui-player", version, about = "Play a video file")]
struct Cli {
    /// Video to open at startup
    path: Option<PathBuf>,

    /// Initial volume, 0-100
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    volume: Option<u32>,
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    ffmpeg_next::init().expect("Failed to initialize FFmpeg");

    let mut config = PlayerConfig::default();
    if let Some(volume) = cli.volume {
        config = config.with_initial_volume(volume);
    }
    info!("starting {}", config.window_title);

    let options = config.native_options();
    let title = config.window_title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(VideoPlayerApp::new(cc, &config, cli.path)))),
    )
}
