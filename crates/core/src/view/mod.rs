pub mod dashboard;
pub mod render;
pub mod session;

pub use dashboard::{BadgeView, DashboardView, EntityRow, GaugeView};
pub use render::render_text;
pub use session::{Session, ViewState, COPIED_INDICATOR_DURATION};
