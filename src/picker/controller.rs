use crate::calc::{
    build_grid, compute_placement, format_display, format_iso, is_selectable, parse_iso,
    MonthGrid, PlacementConfig, PlacementResult, ViewportMetrics, VisibleMonth,
};
use crate::picker::layout::{LayoutError, LayoutSource, WidthHint};
use crate::picker::listeners::{ListenerKind, ListenerRegistry, OwnerId, Subscription};
use chrono::{Datelike, Duration, NaiveDate};
use log::{debug, info, warn};

pub const DEFAULT_PLACEHOLDER: &str = "YYYY-MM-DD";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    OutsidePointer,
    CancelKey,
    Selected,
    ExternalChange,
    /// The trigger was activated again while open.
    Toggled,
}

/// Where a pointer press landed relative to an open picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    Trigger,
    Popover,
    /// Outside both regions; the picker closed.
    Outside,
    /// The picker was closed and ignores pointers.
    Ignored,
}

/// Snapshot of everything the picker owns. Handed out read-only.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlState {
    pub is_open: bool,
    pub selected: Option<NaiveDate>,
    pub visible_month: VisibleMonth,
    pub placement: Option<PlacementResult>,
    /// Keyboard-focused day while open.
    pub cursor: NaiveDate,
}

/// Lifecycle controller of one date field.
///
/// Starts `Closed`. Opening computes a placement and subscribes to outside
/// pointer presses, the cancel key and layout changes; every way of closing
/// drops that subscription.
pub struct DatePicker {
    owner: OwnerId,
    registry: ListenerRegistry,
    state: ControlState,
    placeholder: String,
    config: PlacementConfig,
    today: NaiveDate,
    width_hint: Option<Box<dyn WidthHint>>,
    on_change: Option<Box<dyn FnMut(&str)>>,
    subscription: Option<Subscription>,
}

impl DatePicker {
    /// `initial` is the external ISO value; anything unparsable means no
    /// selection. `today` picks the visible month when nothing is selected.
    pub fn new(initial: &str, registry: &ListenerRegistry, today: NaiveDate) -> Self {
        let selected = parse_iso(initial);
        let visible_month = VisibleMonth::containing(selected.unwrap_or(today));
        DatePicker {
            owner: registry.register_owner(),
            registry: registry.clone(),
            state: ControlState {
                is_open: false,
                selected,
                visible_month,
                placement: None,
                cursor: selected.unwrap_or(today),
            },
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            config: PlacementConfig::default(),
            today,
            width_hint: None,
            on_change: None,
            subscription: None,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_config(mut self, config: PlacementConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_width_hint(mut self, hint: impl WidthHint + 'static) -> Self {
        self.width_hint = Some(Box::new(hint));
        self
    }

    /// Called once per completed selection with the new ISO string.
    pub fn on_change(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.state.selected
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// External string form of the selection (empty when nothing is selected).
    pub fn value(&self) -> String {
        self.state.selected.map(format_iso).unwrap_or_default()
    }

    /// Text for the trigger: the formatted selection or the placeholder.
    pub fn label(&self) -> String {
        match self.state.selected {
            Some(date) => format_display(date),
            None => self.placeholder.clone(),
        }
    }

    pub fn grid(&self) -> MonthGrid {
        build_grid(self.state.visible_month, self.state.selected)
    }

    // ── Open / close ──────────────────────────────────────────────────────────

    /// Trigger activation: opens when closed, closes when open.
    pub fn activate(&mut self, layout: &dyn LayoutSource) {
        if self.state.is_open {
            self.close(CloseReason::Toggled);
        } else {
            self.open(layout);
        }
    }

    /// Opens the popover. Opening an already open picker is a no-op so
    /// repeated requests never stack subscriptions.
    pub fn open(&mut self, layout: &dyn LayoutSource) {
        if self.state.is_open {
            return;
        }
        self.state.is_open = true;
        self.state.cursor = self
            .state
            .selected
            .unwrap_or_else(|| self.state.visible_month.first_day());
        self.subscription = Some(self.registry.subscribe(self.owner, &ListenerKind::ALL));
        info!("picker {:?} opened", self.owner);
        self.place(layout);
    }

    pub fn close(&mut self, reason: CloseReason) {
        if !self.state.is_open {
            return;
        }
        self.state.is_open = false;
        self.state.placement = None;
        if let Some(sub) = self.subscription.take() {
            debug!("picker {:?} releasing {} listeners", self.owner, sub.len());
        }
        info!("picker {:?} closed: {:?}", self.owner, reason);
    }

    /// Cancellation key while open.
    pub fn cancel(&mut self) {
        self.close(CloseReason::CancelKey);
    }

    /// Pointer press anywhere on screen. Presses outside the trigger and the
    /// drawn popover surface close the picker. Membership is by screen
    /// region, so it does not matter where the popover is drawn.
    pub fn pointer_down(&mut self, x: f64, y: f64, layout: &dyn LayoutSource) -> PointerTarget {
        if !self.state.is_open {
            return PointerTarget::Ignored;
        }
        let surface = self
            .state
            .placement
            .map(|p| layout.popover_surface(&p));
        if surface.is_some_and(|p| p.contains(x, y)) {
            return PointerTarget::Popover;
        }
        match layout.trigger_rect() {
            Ok(rect) if rect.contains(x, y) => PointerTarget::Trigger,
            Ok(_) => {
                self.close(CloseReason::OutsidePointer);
                PointerTarget::Outside
            }
            Err(e) => {
                // Without a trigger rect only the popover region is known.
                debug!("picker {:?}: trigger rect unavailable: {e}", self.owner);
                self.close(CloseReason::OutsidePointer);
                PointerTarget::Outside
            }
        }
    }

    // ── Layout ────────────────────────────────────────────────────────────────

    /// Viewport resize, scroll, or trigger size change.
    pub fn layout_changed(&mut self, layout: &dyn LayoutSource) {
        if self.state.is_open {
            self.place(layout);
        }
    }

    fn place(&mut self, layout: &dyn LayoutSource) {
        match self.measure(layout) {
            Ok(metrics) => {
                let placement = compute_placement(&metrics, &self.config);
                debug!("picker {:?} placed at {:?}", self.owner, placement);
                self.state.placement = Some(placement);
            }
            Err(e) => warn!("picker {:?}: keeping previous placement: {e}", self.owner),
        }
    }

    fn measure(&self, layout: &dyn LayoutSource) -> Result<ViewportMetrics, LayoutError> {
        Ok(ViewportMetrics {
            trigger: layout.trigger_rect()?,
            viewport: layout.viewport()?,
            width_hint: self.width_hint.as_ref().and_then(|h| h.preferred_width()),
        })
    }

    // ── Navigation & selection ────────────────────────────────────────────────

    pub fn prev_month(&mut self) {
        self.shift_month(-1);
    }

    pub fn next_month(&mut self) {
        self.shift_month(1);
    }

    /// Moves the visible month; the keyboard cursor follows, keeping its day
    /// where the new month allows.
    pub fn shift_month(&mut self, months: i32) {
        let month = self.state.visible_month.shifted(months);
        self.state.visible_month = month;
        self.state.cursor = month.day_or_last(self.state.cursor.day());
    }

    /// Moves the keyboard cursor by whole days, paging the grid when the
    /// cursor leaves the visible month.
    pub fn move_cursor(&mut self, days: i64) {
        if !self.state.is_open {
            return;
        }
        let Some(next) = self.state.cursor.checked_add_signed(Duration::days(days)) else {
            return;
        };
        let month = VisibleMonth::containing(next);
        if !month.contains(next) {
            return;
        }
        self.state.cursor = next;
        self.state.visible_month = month;
    }

    pub fn confirm_cursor(&mut self) {
        if self.state.is_open {
            self.select(self.state.cursor);
        }
    }

    /// A day was chosen: record it, emit its ISO form, close. Ignored while
    /// closed and for grid cells past the navigation range.
    pub fn select(&mut self, date: NaiveDate) {
        if !self.state.is_open || !is_selectable(date) {
            return;
        }
        self.state.selected = Some(date);
        self.state.cursor = date;
        let value = format_iso(date);
        info!("picker {:?} selected {value}", self.owner);
        if let Some(cb) = self.on_change.as_mut() {
            cb(&value);
        }
        self.close(CloseReason::Selected);
    }

    /// The field value was replaced from outside. An open popover closes;
    /// the selection follows the new value either way and nothing is emitted.
    pub fn set_value(&mut self, value: &str) {
        self.state.selected = parse_iso(value);
        if let Some(date) = self.state.selected {
            self.state.cursor = date;
        }
        self.close(CloseReason::ExternalChange);
    }
}
