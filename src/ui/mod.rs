pub mod controls;
pub mod range_control;
pub mod surface;
pub mod time;
pub mod transport;

pub use controls::{ControlAction, ControlBar, ControlView};
pub use range_control::RangeControl;
pub use transport::{render_transport_state, Glyph, IconSet};
