pub mod date_codec;
pub mod month_grid;
pub mod placement;

pub use date_codec::{format_display, format_iso, parse_iso};
pub use month_grid::{build_grid, is_selectable, GridCell, MonthGrid, VisibleMonth};
pub use placement::{
    compute_placement, PlacementConfig, PlacementResult, TriggerRect, Viewport, ViewportMetrics,
};
