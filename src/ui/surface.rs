use egui::{pos2, Align2, Color32, FontId, Rect, Sense, Ui, Vec2};

use crate::player::VideoSurface;

/// Largest size with the video's aspect ratio that fits in `area`.
pub fn fit_to_area(area: Vec2, video: [u32; 2]) -> Vec2 {
    let [width, height] = video;
    if width == 0 || height == 0 || area.x <= 0.0 || area.y <= 0.0 {
        return Vec2::ZERO;
    }
    let aspect = width as f32 / height as f32;
    if aspect > area.x / area.y {
        Vec2::new(area.x, area.x / aspect)
    } else {
        Vec2::new(area.y * aspect, area.y)
    }
}

/// Fills the remaining space with the video (letterboxed on black) and
/// returns the area it occupies. Without a surface `placeholder` is drawn
/// instead, in red when `is_error`.
pub fn show_surface(
    ui: &mut Ui,
    surface: Option<VideoSurface>,
    placeholder: &str,
    is_error: bool,
) -> Rect {
    let (rect, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, Color32::BLACK);

    match surface {
        Some(surface) => {
            let shown = Rect::from_center_size(rect.center(), fit_to_area(rect.size(), surface.size));
            painter.image(
                surface.texture,
                shown,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        None => {
            let colour = if is_error {
                Color32::LIGHT_RED
            } else {
                Color32::GRAY
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                placeholder,
                FontId::proportional(18.0),
                colour,
            );
        }
    }
    rect
}
