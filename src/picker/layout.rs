use crate::calc::{PlacementResult, TriggerRect, Viewport};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("host layout is not ready")]
    NotReady,
    #[error("trigger `{0}` is not laid out")]
    TriggerNotMounted(String),
}

/// Read-only geometry queries answered by the host on demand.
pub trait LayoutSource {
    fn trigger_rect(&self) -> Result<TriggerRect, LayoutError>;
    fn viewport(&self) -> Result<Viewport, LayoutError>;

    /// Area the host actually drew for `placement`. Hosts that draw less
    /// than `max_height` report the smaller box so presses below it count
    /// as outside.
    fn popover_surface(&self, placement: &PlacementResult) -> PlacementResult {
        *placement
    }
}

/// Preferred popover width taken from a sibling form control.
pub trait WidthHint {
    fn preferred_width(&self) -> Option<f64>;
}

impl<F> WidthHint for F
where
    F: Fn() -> Option<f64>,
{
    fn preferred_width(&self) -> Option<f64> {
        self()
    }
}

/// Fixed geometry, mostly useful for tests and one-shot placement.
#[derive(Clone, Copy, Debug)]
pub struct StaticLayout {
    pub trigger: TriggerRect,
    pub viewport: Viewport,
}

impl LayoutSource for StaticLayout {
    fn trigger_rect(&self) -> Result<TriggerRect, LayoutError> {
        Ok(self.trigger)
    }

    fn viewport(&self) -> Result<Viewport, LayoutError> {
        Ok(self.viewport)
    }
}

/// A host that has not produced a layout yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnmountedLayout;

impl LayoutSource for UnmountedLayout {
    fn trigger_rect(&self) -> Result<TriggerRect, LayoutError> {
        Err(LayoutError::NotReady)
    }

    fn viewport(&self) -> Result<Viewport, LayoutError> {
        Err(LayoutError::NotReady)
    }
}
