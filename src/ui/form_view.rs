use crate::calc::{PlacementResult, TriggerRect, Viewport};
use crate::data::{AppSettings, FieldDef, FieldKind, FormSchema, FormValues};
use crate::picker::{
    DatePicker, LayoutError, LayoutSource, ListenerKind, ListenerRegistry, PointerTarget,
};
use crate::ui::popover::{hit_test, placement_rect, PopoverHit, PopoverView};
use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::{
    self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use log::debug;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::cell::{Cell, RefCell};
use std::io::Stdout;
use std::rc::Rc;
use std::time::Duration as StdDuration;

const LABEL_WIDTH: u16 = 14;
/// "Mmm DD, YYYY" plus the drop marker.
const DATE_TRIGGER_WIDTH: u16 = 16;
const TEXTAREA_ROWS: u16 = 3;

#[derive(PartialEq)]
enum Mode {
    Normal,
    /// Typing into the focused text field.
    Editing,
}

/// Screen areas of the form for one terminal size.
#[derive(Clone, Copy, Debug, PartialEq)]
struct FormGeometry {
    block: Rect,
    inner: Rect,
    help: Rect,
}

impl FormGeometry {
    fn new(area: Rect) -> Self {
        let block = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        let help = Rect {
            y: area.y + block.height,
            height: area.height - block.height,
            ..area
        };
        let inner = Block::default().borders(Borders::ALL).inner(block);
        FormGeometry { block, inner, help }
    }

    fn input_x(&self) -> u16 {
        self.inner.x + LABEL_WIDTH.min(self.inner.width)
    }

    fn input_width(&self) -> u16 {
        self.inner.width.saturating_sub(LABEL_WIDTH)
    }
}

fn field_height(field: &FieldDef) -> u16 {
    if field.kind == FieldKind::Textarea {
        TEXTAREA_ROWS
    } else {
        1
    }
}

/// Content row of every field, with one blank row between fields.
fn field_offsets(schema: &FormSchema) -> Vec<u16> {
    let mut offset = 0;
    schema
        .fields
        .iter()
        .map(|field| {
            let at = offset;
            offset += field_height(field) + 1;
            at
        })
        .collect()
}

fn content_height(schema: &FormSchema) -> u16 {
    schema
        .fields
        .iter()
        .map(|field| field_height(field) + 1)
        .sum::<u16>()
        .saturating_sub(1)
}

/// Geometry of one date field as its picker sees it.
#[derive(Clone, Debug)]
struct FieldLayout {
    trigger: Result<TriggerRect, LayoutError>,
    viewport: Option<Viewport>,
}

impl LayoutSource for FieldLayout {
    fn trigger_rect(&self) -> Result<TriggerRect, LayoutError> {
        self.trigger.clone()
    }

    fn viewport(&self) -> Result<Viewport, LayoutError> {
        self.viewport.ok_or(LayoutError::NotReady)
    }

    fn popover_surface(&self, placement: &PlacementResult) -> PlacementResult {
        PlacementResult {
            max_height: f64::from(placement_rect(placement).height),
            ..*placement
        }
    }
}

pub struct App {
    schema: FormSchema,
    values: Rc<RefCell<FormValues>>,
    /// One picker per date field, `None` for every other kind.
    pickers: Vec<Option<DatePicker>>,
    registry: ListenerRegistry,
    offsets: Vec<u16>,
    focus: usize,
    mode: Mode,
    /// Content rows scrolled off the top of the form.
    scroll: u16,
    /// Last known terminal size. Empty until the first frame or resize.
    viewport: Rect,
    /// Width of the input column, shared with every picker as its width hint.
    input_width: Rc<Cell<f64>>,
}

impl App {
    pub fn new(
        schema: FormSchema,
        values: Rc<RefCell<FormValues>>,
        settings: &AppSettings,
        today: NaiveDate,
    ) -> Self {
        let registry = ListenerRegistry::new();
        let input_width = Rc::new(Cell::new(0.0));
        let pickers = schema
            .fields
            .iter()
            .map(|field| {
                if field.kind != FieldKind::Date {
                    return None;
                }
                let initial = values.borrow().get(&field.name).to_string();
                let placeholder = if field.placeholder.is_empty() {
                    settings.placeholder.clone()
                } else {
                    field.placeholder.clone()
                };
                let sink = Rc::clone(&values);
                let name = field.name.clone();
                let hint = Rc::clone(&input_width);
                Some(
                    DatePicker::new(&initial, &registry, today)
                        .with_placeholder(placeholder)
                        .with_config(settings.placement)
                        .with_width_hint(move || Some(hint.get()))
                        .on_change(move |value| sink.borrow_mut().set(&name, value)),
                )
            })
            .collect();
        let offsets = field_offsets(&schema);
        App {
            schema,
            values,
            pickers,
            registry,
            offsets,
            focus: 0,
            mode: Mode::Normal,
            scroll: 0,
            viewport: Rect::default(),
            input_width,
        }
    }

    fn geometry(&self) -> FormGeometry {
        FormGeometry::new(self.viewport)
    }

    fn focused_kind(&self) -> Option<FieldKind> {
        self.schema.fields.get(self.focus).map(|field| field.kind)
    }

    fn layout_for(&self, index: usize) -> FieldLayout {
        let viewport = (!self.viewport.is_empty()).then(|| Viewport {
            width: f64::from(self.viewport.width),
            height: f64::from(self.viewport.height),
        });
        let geo = self.geometry();
        let trigger = if viewport.is_none() {
            Err(LayoutError::NotReady)
        } else if geo.input_width() == 0 {
            Err(LayoutError::TriggerNotMounted(
                self.schema.fields[index].name.clone(),
            ))
        } else {
            // may sit above the viewport once scrolled away
            let top = f64::from(geo.inner.y) + f64::from(self.offsets[index])
                - f64::from(self.scroll);
            Ok(TriggerRect::new(
                f64::from(geo.input_x()),
                top,
                f64::from(DATE_TRIGGER_WIDTH.min(geo.input_width())),
                1.0,
            ))
        };
        FieldLayout { trigger, viewport }
    }

    /// Screen rect of field `index`, label included, when fully on screen.
    fn visible_rect(&self, index: usize) -> Option<Rect> {
        let inner = self.geometry().inner;
        let top = self.offsets[index];
        let height = field_height(&self.schema.fields[index]);
        if top < self.scroll || top + height > self.scroll + inner.height {
            return None;
        }
        Some(Rect::new(
            inner.x,
            inner.y + top - self.scroll,
            inner.width,
            height,
        ))
    }

    fn field_at(&self, x: u16, y: u16) -> Option<usize> {
        if !self.geometry().inner.contains(Position { x, y }) {
            return None;
        }
        (0..self.schema.fields.len()).find(|&index| {
            self.visible_rect(index)
                .is_some_and(|rect| y >= rect.y && y < rect.y + rect.height)
        })
    }

    fn trigger_contains(&self, index: usize, x: u16, y: u16) -> bool {
        self.layout_for(index)
            .trigger
            .is_ok_and(|rect| rect.contains(f64::from(x), f64::from(y)))
    }

    // ── Listener routing ──────────────────────────────────────────────────────

    /// Indices of the pickers holding a `kind` listener right now.
    fn listening(&self, kind: ListenerKind) -> Vec<usize> {
        let owners = self.registry.listeners_for(kind);
        self.pickers
            .iter()
            .enumerate()
            .filter_map(|(index, picker)| {
                picker
                    .as_ref()
                    .filter(|p| owners.contains(&p.owner()))
                    .map(|_| index)
            })
            .collect()
    }

    fn open_picker(&self) -> Option<usize> {
        self.listening(ListenerKind::CancelKey).into_iter().next()
    }

    fn notify_layout_change(&mut self) {
        for index in self.listening(ListenerKind::LayoutChange) {
            let layout = self.layout_for(index);
            if let Some(picker) = self.pickers[index].as_mut() {
                picker.layout_changed(&layout);
            }
        }
    }

    // ── Form actions ──────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport = Rect::new(0, 0, width, height);
        self.input_width
            .set(f64::from(self.geometry().input_width()));
        self.scroll = self.scroll.min(self.max_scroll());
        debug!("form resized to {width}x{height}");
        self.notify_layout_change();
    }

    fn max_scroll(&self) -> u16 {
        content_height(&self.schema).saturating_sub(self.geometry().inner.height)
    }

    fn scroll_by(&mut self, delta: i32) {
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(self.max_scroll())) as u16;
        if next != self.scroll {
            self.scroll = next;
            self.notify_layout_change();
        }
    }

    fn reveal_focus(&mut self) {
        let height = self.geometry().inner.height;
        let Some(field) = self.schema.fields.get(self.focus) else {
            return;
        };
        if height == 0 {
            return;
        }
        let top = self.offsets[self.focus];
        let bottom = top + field_height(field);
        if top < self.scroll {
            self.scroll = top;
        } else if bottom > self.scroll + height {
            self.scroll = bottom.saturating_sub(height).min(self.max_scroll());
        }
    }

    fn focus_next(&mut self) {
        let count = self.schema.fields.len();
        if count > 0 {
            self.focus = (self.focus + 1) % count;
            self.reveal_focus();
        }
    }

    fn focus_prev(&mut self) {
        let count = self.schema.fields.len();
        if count > 0 {
            self.focus = (self.focus + count - 1) % count;
            self.reveal_focus();
        }
    }

    fn activate(&mut self, index: usize) {
        let layout = self.layout_for(index);
        if let Some(picker) = self.pickers[index].as_mut() {
            picker.activate(&layout);
        }
    }

    /// Clears a field from the host side. A date picker sees this as an
    /// external value change.
    fn clear_field(&mut self, index: usize) {
        let name = self.schema.fields[index].name.clone();
        self.values.borrow_mut().clear(&name);
        if let Some(picker) = self.pickers[index].as_mut() {
            picker.set_value("");
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Returns true when the app should quit.
    pub fn handle_event(&mut self, event: CEvent) -> bool {
        match event {
            CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key(key.code, key.modifiers)
            }
            CEvent::Mouse(mouse) => {
                self.handle_mouse(mouse.kind, mouse.column, mouse.row);
                false
            }
            CEvent::Resize(width, height) => {
                self.resize(width, height);
                false
            }
            _ => false,
        }
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        if let Some(index) = self.open_picker() {
            self.handle_picker_key(index, code);
            return false;
        }

        match self.mode {
            Mode::Editing => {
                self.handle_edit_key(code);
                false
            }
            Mode::Normal => match code {
                KeyCode::Char('q') => true,
                KeyCode::Tab | KeyCode::Down => {
                    self.focus_next();
                    false
                }
                KeyCode::BackTab | KeyCode::Up => {
                    self.focus_prev();
                    false
                }
                KeyCode::Enter | KeyCode::Char(' ') => {
                    match self.focused_kind() {
                        Some(FieldKind::Date) => self.activate(self.focus),
                        Some(_) => self.mode = Mode::Editing,
                        None => {}
                    }
                    false
                }
                KeyCode::Delete | KeyCode::Backspace => {
                    if self.focused_kind() == Some(FieldKind::Date) {
                        self.clear_field(self.focus);
                    }
                    false
                }
                _ => false,
            },
        }
    }

    fn handle_picker_key(&mut self, index: usize, code: KeyCode) {
        match code {
            KeyCode::Tab | KeyCode::BackTab => {
                if let Some(picker) = self.pickers[index].as_mut() {
                    picker.cancel();
                }
                if code == KeyCode::Tab {
                    self.focus_next();
                } else {
                    self.focus_prev();
                }
            }
            KeyCode::Delete | KeyCode::Backspace => self.clear_field(index),
            _ => {
                let Some(picker) = self.pickers[index].as_mut() else {
                    return;
                };
                match code {
                    KeyCode::Esc => picker.cancel(),
                    KeyCode::Left => picker.move_cursor(-1),
                    KeyCode::Right => picker.move_cursor(1),
                    KeyCode::Up => picker.move_cursor(-7),
                    KeyCode::Down => picker.move_cursor(7),
                    KeyCode::PageUp => picker.prev_month(),
                    KeyCode::PageDown => picker.next_month(),
                    KeyCode::Enter | KeyCode::Char(' ') => picker.confirm_cursor(),
                    _ => {}
                }
            }
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(field) = self.schema.fields.get(self.focus) else {
            self.mode = Mode::Normal;
            return;
        };
        let name = field.name.clone();
        match code {
            KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Tab => {
                self.mode = Mode::Normal;
                self.focus_next();
            }
            KeyCode::Backspace => {
                let mut values = self.values.borrow_mut();
                let mut text = values.get(&name).to_string();
                text.pop();
                values.set(&name, &text);
            }
            KeyCode::Char(c) => {
                let mut values = self.values.borrow_mut();
                let mut text = values.get(&name).to_string();
                text.push(c);
                values.set(&name, &text);
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, kind: MouseEventKind, x: u16, y: u16) {
        match kind {
            MouseEventKind::ScrollDown => self.scroll_by(1),
            MouseEventKind::ScrollUp => self.scroll_by(-1),
            MouseEventKind::Down(MouseButton::Left) => self.pointer_down(x, y),
            _ => {}
        }
    }

    fn pointer_down(&mut self, x: u16, y: u16) {
        for index in self.listening(ListenerKind::OutsidePointer) {
            let layout = self.layout_for(index);
            let Some(picker) = self.pickers[index].as_mut() else {
                continue;
            };
            match picker.pointer_down(f64::from(x), f64::from(y), &layout) {
                PointerTarget::Popover => {
                    match hit_test(picker.state(), x, y) {
                        Some(PopoverHit::Prev) => picker.prev_month(),
                        Some(PopoverHit::Next) => picker.next_month(),
                        Some(PopoverHit::Day(date)) => picker.select(date),
                        Some(PopoverHit::Inside) | None => {}
                    }
                    return;
                }
                PointerTarget::Trigger => {
                    picker.activate(&layout);
                    return;
                }
                // a press outside falls through to the form below
                PointerTarget::Outside | PointerTarget::Ignored => {}
            }
        }

        if let Some(index) = self.field_at(x, y) {
            self.mode = Mode::Normal;
            self.focus = index;
            if self.pickers[index].is_some() && self.trigger_contains(index, x, y) {
                self.activate(index);
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    pub fn render(&mut self, f: &mut Frame) {
        let area = f.area();
        if area != self.viewport {
            self.resize(area.width, area.height);
        }
        let geo = self.geometry();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Form ")
            .border_style(Style::default().fg(Color::DarkGray));
        f.render_widget(block, geo.block);

        for index in 0..self.schema.fields.len() {
            if let Some(rect) = self.visible_rect(index) {
                self.render_field(f, index, rect);
            }
        }
        f.render_widget(Paragraph::new(self.help_line()), geo.help);

        // last, so it covers the fields below it
        if let Some(index) = self.open_picker() {
            if let Some(picker) = self.pickers[index].as_ref() {
                PopoverView::new(picker.state(), picker.today()).render(f);
            }
        }
    }

    fn render_field(&self, f: &mut Frame, index: usize, rect: Rect) {
        let field = &self.schema.fields[index];
        let focused = index == self.focus;

        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let label = Rect {
            width: LABEL_WIDTH.min(rect.width),
            height: 1,
            ..rect
        };
        f.render_widget(
            Paragraph::new(Span::styled(field.display_label().to_string(), label_style)),
            label,
        );

        let input = Rect {
            x: rect.x + label.width,
            width: rect.width - label.width,
            ..rect
        };
        if input.is_empty() {
            return;
        }

        if let Some(picker) = &self.pickers[index] {
            let mut style = if picker.selected().is_some() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            if focused {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let trigger = Rect {
                width: DATE_TRIGGER_WIDTH.min(input.width),
                ..input
            };
            let text = format!("{:<width$}▾", picker.label(), width = DATE_TRIGGER_WIDTH as usize - 1);
            f.render_widget(Paragraph::new(Span::styled(text, style)), trigger);
            return;
        }

        let value = self.values.borrow().get(&field.name).to_string();
        let editing = focused && self.mode == Mode::Editing;
        let mut spans = if value.is_empty() && !editing {
            vec![Span::styled(
                field.placeholder.clone(),
                Style::default().fg(Color::DarkGray),
            )]
        } else {
            vec![Span::raw(value)]
        };
        if editing {
            spans.push(Span::styled(" ", Style::default().add_modifier(Modifier::REVERSED)));
        }
        let mut body = Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false });
        if focused && !editing {
            body = body.style(Style::default().add_modifier(Modifier::UNDERLINED));
        }
        f.render_widget(body, input);
    }

    fn help_line(&self) -> Line<'static> {
        let text = if self.open_picker().is_some() {
            " ←↑↓→ day   PgUp/PgDn month   Enter pick   Del clear   Esc close"
        } else if self.mode == Mode::Editing {
            " type to edit   Enter/Esc done"
        } else {
            " Tab/↑↓ move   Enter edit/open   Del clear date   q quit"
        };
        Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
    }
}

// ── App event loop ────────────────────────────────────────────────────────────

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;
        if event::poll(StdDuration::from_millis(16))? && app.handle_event(event::read()?) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{PlacementConfig, VisibleMonth};
    use ratatui::backend::TestBackend;

    const DATE: usize = 1;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn make_test_app(initial_date: &str) -> (App, Rc<RefCell<FormValues>>) {
        let values = Rc::new(RefCell::new(FormValues::default()));
        if !initial_date.is_empty() {
            values.borrow_mut().set("effDate", initial_date);
        }
        let mut app = App::new(
            FormSchema::default(),
            Rc::clone(&values),
            &AppSettings::default(),
            d(2026, 10, 18),
        );
        app.resize(80, 24);
        (app, values)
    }

    fn key(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code, KeyModifiers::empty())
    }

    fn click(app: &mut App, x: u16, y: u16) {
        app.handle_mouse(MouseEventKind::Down(MouseButton::Left), x, y);
    }

    fn open_date_field(app: &mut App) {
        key(app, KeyCode::Tab);
        key(app, KeyCode::Enter);
        assert!(picker(app).is_open());
    }

    fn picker(app: &App) -> &DatePicker {
        app.pickers[DATE].as_ref().unwrap()
    }

    /// First screen cell where the open popover reports `wanted`.
    fn find_hit(app: &App, wanted: PopoverHit) -> (u16, u16) {
        let state = picker(app).state();
        for y in 0..24 {
            for x in 0..80 {
                if hit_test(state, x, y) == Some(wanted) {
                    return (x, y);
                }
            }
        }
        panic!("no cell for {wanted:?}");
    }

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buf = terminal.backend().buffer();
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    // ── layout helper tests ───────────────────────────────────────────────────

    #[test]
    fn test_field_offsets_leave_a_gap_between_fields() {
        let schema = FormSchema::default();
        assert_eq!(field_offsets(&schema), vec![0, 2, 4, 6]);
        assert_eq!(content_height(&schema), 9);
    }

    #[test]
    fn test_layout_not_ready_before_first_frame() {
        let values = Rc::new(RefCell::new(FormValues::default()));
        let app = App::new(
            FormSchema::default(),
            values,
            &AppSettings::default(),
            d(2026, 10, 18),
        );
        let layout = app.layout_for(DATE);
        assert_eq!(layout.viewport(), Err(LayoutError::NotReady));
        assert_eq!(layout.trigger_rect(), Err(LayoutError::NotReady));
    }

    #[test]
    fn test_narrow_terminal_has_no_trigger() {
        let (mut app, _) = make_test_app("");
        app.resize(10, 24);
        assert_eq!(
            app.layout_for(DATE).trigger_rect(),
            Err(LayoutError::TriggerNotMounted("effDate".to_string()))
        );
    }

    // ── handle_key tests ──────────────────────────────────────────────────────

    #[test]
    fn test_tab_cycles_focus() {
        let (mut app, _) = make_test_app("");
        for expected in [1, 2, 3, 0] {
            key(&mut app, KeyCode::Tab);
            assert_eq!(app.focus, expected);
        }
        key(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, 3);
    }

    #[test]
    fn test_enter_on_date_field_opens_picker() {
        let (mut app, _) = make_test_app("");
        open_date_field(&mut app);
        assert_eq!(app.registry.active_count(), 3);
        assert_eq!(
            picker(&app).state().placement,
            Some(PlacementResult {
                left: 15.0,
                top: 4.0,
                width: 64.0,
                max_height: 10.0,
            })
        );
    }

    #[test]
    fn test_picker_keys_move_cursor_and_select() {
        let (mut app, values) = make_test_app("");
        open_date_field(&mut app);
        assert_eq!(picker(&app).state().cursor, d(2026, 10, 1));
        key(&mut app, KeyCode::Right);
        key(&mut app, KeyCode::Down);
        assert_eq!(picker(&app).state().cursor, d(2026, 10, 9));
        key(&mut app, KeyCode::Enter);

        assert_eq!(values.borrow().get("effDate"), "2026-10-09");
        assert!(!picker(&app).is_open());
        assert_eq!(picker(&app).label(), "Oct 9, 2026");
        assert_eq!(app.registry.active_count(), 0);
    }

    #[test]
    fn test_page_keys_change_month_without_writing_value() {
        let (mut app, values) = make_test_app("2025-03-15");
        open_date_field(&mut app);
        key(&mut app, KeyCode::PageDown);
        key(&mut app, KeyCode::PageDown);
        key(&mut app, KeyCode::PageUp);
        assert_eq!(
            picker(&app).state().visible_month,
            VisibleMonth {
                year: 2025,
                month: 4
            }
        );
        assert_eq!(values.borrow().get("effDate"), "2025-03-15");
    }

    #[test]
    fn test_esc_closes_picker_and_q_ignored_while_open() {
        let (mut app, _) = make_test_app("");
        open_date_field(&mut app);
        assert!(!key(&mut app, KeyCode::Char('q')));
        assert!(picker(&app).is_open());
        key(&mut app, KeyCode::Esc);
        assert!(!picker(&app).is_open());
        assert_eq!(app.registry.active_count(), 0);
        assert!(key(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_ctrl_c_quits_even_while_open() {
        let (mut app, _) = make_test_app("");
        open_date_field(&mut app);
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_tab_while_open_closes_and_moves_on() {
        let (mut app, _) = make_test_app("");
        open_date_field(&mut app);
        key(&mut app, KeyCode::Tab);
        assert!(!picker(&app).is_open());
        assert_eq!(app.focus, 2);
    }

    #[test]
    fn test_delete_while_open_clears_and_closes() {
        let (mut app, values) = make_test_app("2025-03-15");
        open_date_field(&mut app);
        key(&mut app, KeyCode::Delete);
        assert!(!picker(&app).is_open());
        assert_eq!(picker(&app).selected(), None);
        assert_eq!(picker(&app).label(), "YYYY-MM-DD");
        assert_eq!(values.borrow().get("effDate"), "");
        assert_eq!(app.registry.active_count(), 0);
    }

    #[test]
    fn test_text_field_editing() {
        let (mut app, values) = make_test_app("");
        key(&mut app, KeyCode::Enter);
        for c in ['A', 'n', 'n', 'q'] {
            assert!(!key(&mut app, KeyCode::Char(c)));
        }
        key(&mut app, KeyCode::Backspace);
        key(&mut app, KeyCode::Enter);
        assert_eq!(values.borrow().get("caller"), "Ann");
        assert!(key(&mut app, KeyCode::Char('q')));
    }

    // ── mouse and layout tests ────────────────────────────────────────────────

    #[test]
    fn test_click_trigger_opens_then_toggles_closed() {
        let (mut app, _) = make_test_app("");
        click(&mut app, 16, 3);
        assert_eq!(app.focus, DATE);
        assert!(picker(&app).is_open());
        click(&mut app, 16, 3);
        assert!(!picker(&app).is_open());
        assert_eq!(app.registry.active_count(), 0);
    }

    #[test]
    fn test_click_outside_closes_without_change() {
        let (mut app, values) = make_test_app("2025-03-15");
        open_date_field(&mut app);
        click(&mut app, 2, 20);
        assert!(!picker(&app).is_open());
        assert_eq!(app.registry.active_count(), 0);
        assert_eq!(values.borrow().get("effDate"), "2025-03-15");
    }

    #[test]
    fn test_click_day_selects() {
        let (mut app, values) = make_test_app("");
        open_date_field(&mut app);
        let (x, y) = find_hit(&app, PopoverHit::Day(d(2026, 10, 15)));
        click(&mut app, x, y);
        assert_eq!(values.borrow().get("effDate"), "2026-10-15");
        assert!(!picker(&app).is_open());
    }

    #[test]
    fn test_click_next_arrow_keeps_open() {
        let (mut app, _) = make_test_app("");
        open_date_field(&mut app);
        let (x, y) = find_hit(&app, PopoverHit::Next);
        click(&mut app, x, y);
        assert!(picker(&app).is_open());
        assert_eq!(
            picker(&app).state().visible_month,
            VisibleMonth {
                year: 2026,
                month: 11
            }
        );
    }

    #[test]
    fn test_scroll_replaces_placement() {
        let (mut app, _) = make_test_app("");
        app.resize(80, 8);
        open_date_field(&mut app);
        assert_eq!(picker(&app).state().placement.unwrap().top, 4.0);
        app.handle_mouse(MouseEventKind::ScrollDown, 40, 2);
        assert_eq!(app.scroll, 1);
        assert_eq!(picker(&app).state().placement.unwrap().top, 3.0);
    }

    #[test]
    fn test_scroll_stops_at_content_end() {
        let (mut app, _) = make_test_app("");
        app.resize(80, 8);
        for _ in 0..10 {
            app.handle_mouse(MouseEventKind::ScrollDown, 40, 2);
        }
        assert_eq!(app.scroll, 4);
        app.handle_mouse(MouseEventKind::ScrollUp, 40, 2);
        assert_eq!(app.scroll, 3);
    }

    #[test]
    fn test_resize_replaces_placement() {
        let (mut app, _) = make_test_app("");
        open_date_field(&mut app);
        app.handle_event(CEvent::Resize(100, 30));
        let p = picker(&app).state().placement.unwrap();
        assert_eq!(p.width, 84.0);
        assert_eq!(p.left, 15.0);
    }

    // ── render tests ──────────────────────────────────────────────────────────

    #[test]
    fn test_render_shows_labels_and_values() {
        let (mut app, _) = make_test_app("2025-03-15");
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        assert!(row_text(&terminal, 1).contains("Caller"));
        assert!(row_text(&terminal, 1).contains("Caller name"));
        assert!(row_text(&terminal, 3).contains("Eff Date"));
        assert!(row_text(&terminal, 3).contains("Mar 15, 2025"));
        assert!(row_text(&terminal, 5).contains("Policy #"));
    }

    #[test]
    fn test_render_draws_popover_over_fields() {
        let (mut app, _) = make_test_app("");
        open_date_field(&mut app);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        // popover border on row 4, header on row 5 over the policy input
        assert!(row_text(&terminal, 4).contains("Select date"));
        assert!(row_text(&terminal, 5).contains("Oct 2026"));
        assert!(!row_text(&terminal, 5).contains("Policy number"));

        key(&mut app, KeyCode::Esc);
        terminal.draw(|f| app.render(f)).unwrap();
        assert!(row_text(&terminal, 5).contains("Policy number"));
    }

    #[test]
    fn test_click_below_drawn_popover_closes() {
        let values = Rc::new(RefCell::new(FormValues::default()));
        let settings = AppSettings {
            placement: PlacementConfig {
                min_max_height: 20.0,
                absolute_max_height: 20.0,
                ..PlacementConfig::terminal()
            },
            ..AppSettings::default()
        };
        let mut app = App::new(FormSchema::default(), values, &settings, d(2026, 10, 18));
        app.resize(80, 24);
        open_date_field(&mut app);
        let placement = picker(&app).state().placement.unwrap();
        assert_eq!(placement.max_height, 20.0);
        // drawn rows 4..14; row 17 is plain form
        assert_eq!(placement_rect(&placement).height, 10);
        click(&mut app, 30, 17);
        assert!(!picker(&app).is_open());
        assert_eq!(app.registry.active_count(), 0);
    }
}
