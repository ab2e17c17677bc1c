use std::path::Path;
use std::time::Duration;

/// File types offered by the open dialog and accepted from drag and drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl VideoFilter {
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

impl Default for VideoFilter {
    fn default() -> Self {
        Self {
            name: "Videos".to_owned(),
            extensions: vec!["mp4".to_owned()],
        }
    }
}

/// Startup settings. Nothing here is persisted.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub window_title: String,
    pub inner_size: [f32; 2],
    pub min_inner_size: [f32; 2],
    /// How often the time label is refreshed.
    pub refresh_interval: Duration,
    /// Volume bar position at startup, 0..=100.
    pub initial_volume: u32,
    pub video_filter: VideoFilter,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            window_title: "Video Player".to_owned(),
            inner_size: [800.0, 600.0],
            min_inner_size: [640.0, 480.0],
            refresh_interval: Duration::from_secs(1),
            initial_volume: 50,
            video_filter: VideoFilter::default(),
        }
    }
}

impl PlayerConfig {
    pub fn with_initial_volume(mut self, volume: u32) -> Self {
        self.initial_volume = volume.min(100);
        self
    }

    pub fn native_options(&self) -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title(self.window_title.clone())
                .with_inner_size(self.inner_size)
                .with_min_inner_size(self.min_inner_size),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_mp4_only() {
        let filter = VideoFilter::default();
        assert!(filter.accepts(Path::new("/videos/Tutorial.mp4")));
        assert!(filter.accepts(Path::new("CLIP.MP4")));
        assert!(!filter.accepts(Path::new("movie.mkv")));
        assert!(!filter.accepts(Path::new("no_extension")));
    }

    #[test]
    fn initial_volume_is_capped() {
        let config = PlayerConfig::default().with_initial_volume(250);
        assert_eq!(config.initial_volume, 100);
        assert_eq!(PlayerConfig::default().initial_volume, 50);
    }
}
