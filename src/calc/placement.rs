use serde::{Deserialize, Serialize};

/// Screen rectangle of the trigger, in viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TriggerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl TriggerRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        TriggerRect {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Everything the engine reads. Recomputed for every placement, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportMetrics {
    pub trigger: TriggerRect,
    pub viewport: Viewport,
    /// Width of a neighbouring field, if the host can measure one.
    pub width_hint: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlacementResult {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub max_height: f64,
}

impl PlacementResult {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left
            && x < self.left + self.width
            && y >= self.top
            && y < self.top + self.max_height
    }
}

/// Tunable constants for [`compute_placement`]. Defaults are in pixels; the
/// terminal front end loads cell-sized values from `config.yaml`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PlacementConfig {
    pub side_margin: f64,
    pub min_popover_width: f64,
    pub absolute_min_width: f64,
    pub outer_margin: f64,
    pub edge_margin: f64,
    pub gap: f64,
    pub comfortable_height: f64,
    pub min_max_height: f64,
    pub absolute_max_height: f64,
    pub top_floor: f64,
    pub min_width_hint: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        PlacementConfig {
            side_margin: 20.0,
            min_popover_width: 320.0,
            absolute_min_width: 200.0,
            outer_margin: 40.0,
            edge_margin: 12.0,
            gap: 8.0,
            comfortable_height: 320.0,
            min_max_height: 360.0,
            absolute_max_height: 900.0,
            top_floor: 8.0,
            min_width_hint: 40.0,
        }
    }
}

impl PlacementConfig {
    /// Sizes for a terminal, where one unit is one character cell. The popover
    /// body is 23 columns by 10 rows including its border.
    pub fn terminal() -> Self {
        PlacementConfig {
            side_margin: 2.0,
            min_popover_width: 23.0,
            absolute_min_width: 23.0,
            outer_margin: 2.0,
            edge_margin: 1.0,
            gap: 0.0,
            comfortable_height: 10.0,
            min_max_height: 10.0,
            absolute_max_height: 10.0,
            top_floor: 0.0,
            min_width_hint: 4.0,
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

fn sanitize(metrics: &ViewportMetrics) -> ViewportMetrics {
    let t = &metrics.trigger;
    ViewportMetrics {
        trigger: TriggerRect {
            left: finite_or_zero(t.left),
            top: finite_or_zero(t.top),
            width: finite_or_zero(t.width).max(0.0),
            height: finite_or_zero(t.height).max(0.0),
        },
        viewport: Viewport {
            width: finite_or_zero(metrics.viewport.width).max(0.0),
            height: finite_or_zero(metrics.viewport.height).max(0.0),
        },
        width_hint: metrics.width_hint.filter(|w| w.is_finite()),
    }
}

/// Chooses popover geometry for the current layout.
///
/// The popover goes on the side with room for it and below the trigger unless
/// the space below is tight and there is more above. A final containment pass
/// keeps the result inside the viewport even for degenerate inputs such as a
/// zero-sized viewport during startup.
pub fn compute_placement(metrics: &ViewportMetrics, config: &PlacementConfig) -> PlacementResult {
    let m = sanitize(metrics);
    let trigger = m.trigger;
    let vw = m.viewport.width;
    let vh = m.viewport.height;

    // ── Horizontal ────────────────────────────────────────────────────────────
    let right_space = (vw - trigger.right() - config.side_margin).floor().max(0.0);
    let left_space = (trigger.left - config.side_margin).floor().max(0.0);
    let available = right_space.max(left_space);

    let hint = m
        .width_hint
        .filter(|w| *w > config.min_width_hint)
        .unwrap_or(trigger.width);
    let desired = config.min_popover_width.max(hint);
    let upper = available.max(vw - config.outer_margin);
    let width = desired.min(upper).max(config.absolute_min_width);

    let left = if right_space >= width {
        trigger.right() - width
    } else if left_space >= width {
        trigger.left
    } else {
        let hi = vw - width - config.edge_margin;
        trigger.left.min(hi).max(config.edge_margin)
    };

    // ── Vertical ──────────────────────────────────────────────────────────────
    let mut max_height = config
        .min_max_height
        .max((vh - config.outer_margin).min(config.absolute_max_height));
    let mut top = trigger.bottom() + config.gap;
    let space_below = vh - trigger.bottom() - config.gap;
    if space_below < config.comfortable_height && trigger.top > space_below {
        top = (trigger.top - config.gap - max_height).max(config.top_floor);
    }

    // ── Containment ───────────────────────────────────────────────────────────
    let vw = vw.floor();
    let vh = vh.floor();
    let width = width.round().min(vw);
    let left = left.round().min(vw - width).max(0.0);
    let top = top.round().min(vh).max(0.0);
    max_height = max_height.round().min(vh - top).max(0.0);

    PlacementResult {
        left,
        top,
        width,
        max_height,
    }
}
