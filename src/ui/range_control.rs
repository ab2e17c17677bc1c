use egui::{pos2, vec2, Rect, Sense, Ui};

/// Radius of the drag handle, in points.
pub const HANDLE_RADIUS: f32 = 6.0;
const RAIL_HEIGHT: f32 = 4.0;

/// Value under a pointer `press_x` points from the left end of a track
/// `track_width` points wide. A degenerate track maps to `minimum`.
pub fn value_at(press_x: f32, track_width: f32, minimum: f64, maximum: f64) -> f64 {
    if !(track_width > 0.0) {
        return minimum;
    }
    let fraction = (f64::from(press_x) / f64::from(track_width)).clamp(0.0, 1.0);
    (minimum + fraction * (maximum - minimum)).clamp(minimum, maximum)
}

/// Horizontal slider where pressing anywhere on the track jumps straight to
/// that value instead of stepping toward it.
///
/// User gestures ([`press`], [`drag`]) return the new value; programmatic
/// updates ([`set_value`], [`set_range`]) never do, so playback progress
/// written into a scrub bar cannot come back out as a seek.
///
/// [`press`]: RangeControl::press
/// [`drag`]: RangeControl::drag
/// [`set_value`]: RangeControl::set_value
/// [`set_range`]: RangeControl::set_range
#[derive(Debug, Clone, PartialEq)]
pub struct RangeControl {
    minimum: f64,
    maximum: f64,
    value: f64,
    /// Pointer offset from the handle centre while the user holds it.
    grab: Option<f32>,
}

impl RangeControl {
    pub fn new(minimum: f64, maximum: f64, value: f64) -> Self {
        let maximum = maximum.max(minimum);
        Self {
            minimum,
            maximum,
            value: value.clamp(minimum, maximum),
            grab: None,
        }
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_held(&self) -> bool {
        self.grab.is_some()
    }

    pub fn set_range(&mut self, minimum: f64, maximum: f64) {
        self.minimum = minimum;
        self.maximum = maximum.max(minimum);
        self.value = self.value.clamp(self.minimum, self.maximum);
    }

    /// Ignored while the user is holding the handle.
    pub fn set_value(&mut self, value: f64) {
        if self.grab.is_none() {
            self.value = value.clamp(self.minimum, self.maximum);
        }
    }

    /// Handle centre, in points from the left end of the track.
    pub fn handle_offset(&self, track_width: f32) -> f32 {
        let span = self.maximum - self.minimum;
        if span <= 0.0 || track_width <= 0.0 {
            return 0.0;
        }
        (((self.value - self.minimum) / span) as f32 * track_width).clamp(0.0, track_width)
    }

    /// Pointer went down `x` points into the track. Pressing the handle
    /// itself grabs it without moving; anywhere else jumps there.
    pub fn press(&mut self, x: f32, track_width: f32) -> Option<f64> {
        if track_width > 0.0 {
            let handle = self.handle_offset(track_width);
            if (x - handle).abs() <= HANDLE_RADIUS {
                self.grab = Some(x - handle);
                return None;
            }
        }
        self.grab = Some(0.0);
        self.value = value_at(x, track_width, self.minimum, self.maximum);
        Some(self.value)
    }

    /// Pointer moved to `x` while held. Returns the value if it changed.
    pub fn drag(&mut self, x: f32, track_width: f32) -> Option<f64> {
        let offset = self.grab?;
        let value = value_at(x - offset, track_width, self.minimum, self.maximum);
        if value == self.value {
            return None;
        }
        self.value = value;
        Some(value)
    }

    pub fn release(&mut self) {
        self.grab = None;
    }

    /// Draws the control `width` points wide and feeds pointer input through
    /// [`press`](Self::press)/[`drag`](Self::drag). Returns a value only when
    /// the user changed it this frame.
    pub fn show(&mut self, ui: &mut Ui, width: f32) -> Option<f64> {
        let height = ui.spacing().interact_size.y;
        let (rect, response) = ui.allocate_exact_size(vec2(width, height), Sense::click_and_drag());
        let track = rect.shrink2(vec2(HANDLE_RADIUS, 0.0));

        let mut changed = None;
        match (
            response.is_pointer_button_down_on(),
            response.interact_pointer_pos(),
        ) {
            (true, Some(pointer)) if !self.is_held() => {
                changed = self.press(pointer.x - track.left(), track.width());
            }
            (true, Some(pointer)) => {
                changed = self.drag(pointer.x - track.left(), track.width());
            }
            (false, _) if self.is_held() => self.release(),
            _ => {}
        }

        if ui.is_rect_visible(rect) {
            let visuals = ui.style().interact(&response);
            let centre_y = rect.center().y;
            let handle_x = track.left() + self.handle_offset(track.width());
            let rail = Rect::from_min_max(
                pos2(track.left(), centre_y - RAIL_HEIGHT / 2.0),
                pos2(track.right(), centre_y + RAIL_HEIGHT / 2.0),
            );
            let filled = Rect::from_min_max(rail.min, pos2(handle_x, rail.max.y));

            let painter = ui.painter();
            painter.rect_filled(rail, RAIL_HEIGHT / 2.0, ui.visuals().widgets.inactive.bg_fill);
            painter.rect_filled(filled, RAIL_HEIGHT / 2.0, ui.visuals().selection.bg_fill);
            painter.circle(
                pos2(handle_x, centre_y),
                HANDLE_RADIUS,
                visuals.bg_fill,
                visuals.fg_stroke,
            );
        }

        changed
    }
}
