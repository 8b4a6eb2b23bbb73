use crate::calc::month_grid::{DAYS_PER_WEEK, WEEKDAY_HEADERS, WEEKS};
use crate::calc::{build_grid, is_selectable, MonthGrid, PlacementResult};
use crate::picker::ControlState;
use chrono::{Datelike, NaiveDate, Weekday};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Header row plus weekday row plus six weeks.
pub const CONTENT_ROWS: u16 = 2 + WEEKS as u16;
/// Seven two-char day columns separated by one space.
pub const GRID_WIDTH: u16 = (DAYS_PER_WEEK as u16) * 3 - 1;
const NAV_WIDTH: u16 = 3;

/// What a pointer press inside the popover means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopoverHit {
    Prev,
    Next,
    Day(NaiveDate),
    /// Inside the popover but on nothing interactive.
    Inside,
}

/// Screen rect for a placement, trimmed to the content height.
pub fn placement_rect(p: &PlacementResult) -> Rect {
    let to_u16 = |v: f64| v.clamp(0.0, u16::MAX as f64) as u16;
    Rect::new(
        to_u16(p.left),
        to_u16(p.top),
        to_u16(p.width),
        to_u16(p.max_height).min(CONTENT_ROWS + 2),
    )
}

/// Geometry shared by rendering and hit-testing so both agree on where
/// things are.
struct PopoverGeometry {
    inner: Rect,
    grid_x: u16,
    /// Content lines scrolled off the top when the popover is too short.
    scroll: u16,
}

impl PopoverGeometry {
    fn new(area: Rect, grid: &MonthGrid, cursor: NaiveDate) -> Self {
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let grid_x = inner.x + inner.width.saturating_sub(GRID_WIDTH) / 2;
        let cursor_line = grid
            .position_of(cursor)
            .map(|(row, _)| row as u16 + 2)
            .unwrap_or(0);
        let scroll = (cursor_line + 1).saturating_sub(inner.height);
        PopoverGeometry {
            inner,
            grid_x,
            scroll,
        }
    }

    /// Content line under screen row `y`, if any.
    fn line_at(&self, y: u16) -> Option<u16> {
        if y < self.inner.y || y >= self.inner.y + self.inner.height {
            return None;
        }
        Some(y - self.inner.y + self.scroll)
    }
}

/// Stateless view of an open picker.
pub struct PopoverView<'a> {
    state: &'a ControlState,
    today: NaiveDate,
}

impl<'a> PopoverView<'a> {
    pub fn new(state: &'a ControlState, today: NaiveDate) -> Self {
        PopoverView { state, today }
    }

    pub fn area(&self) -> Option<Rect> {
        if !self.state.is_open {
            return None;
        }
        self.state.placement.as_ref().map(placement_rect)
    }

    pub fn render(&self, f: &mut Frame) {
        let Some(area) = self.area() else {
            return;
        };
        let area = area.intersection(f.area());
        if area.is_empty() {
            return;
        }
        let grid = build_grid(self.state.visible_month, self.state.selected);
        let geo = PopoverGeometry::new(area, &grid, self.state.cursor);

        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Select date ")
            .border_style(Style::default().fg(Color::Cyan));
        f.render_widget(block, area);

        let pad = " ".repeat((geo.grid_x - geo.inner.x) as usize);
        let mut lines: Vec<Line> = Vec::with_capacity(CONTENT_ROWS as usize);
        lines.push(self.header_line(geo.inner.width));
        lines.push(Line::from(Span::styled(
            format!("{pad}{}", WEEKDAY_HEADERS.join(" ")),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for week in &grid.weeks {
            let mut spans = vec![Span::raw(pad.clone())];
            for (i, cell) in week.iter().enumerate() {
                let style = day_style(
                    cell.is_selected,
                    cell.date == self.state.cursor,
                    cell.in_current_month && is_selectable(cell.date),
                    cell.date == self.today,
                    matches!(cell.date.weekday(), Weekday::Sat | Weekday::Sun),
                );
                spans.push(Span::styled(format!("{:2}", cell.date.day()), style));
                if i + 1 < week.len() {
                    spans.push(Span::raw(" "));
                }
            }
            lines.push(Line::from(spans));
        }

        let body = Paragraph::new(lines).scroll((geo.scroll, 0));
        f.render_widget(body, geo.inner);
    }

    fn header_line(&self, width: u16) -> Line<'static> {
        let title = self.state.visible_month.title();
        let middle = width.saturating_sub(NAV_WIDTH * 2) as usize;
        let nav = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        Line::from(vec![
            Span::styled(" ◀ ", nav),
            Span::styled(
                format!("{title:^middle$}"),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ▶ ", nav),
        ])
    }
}

/// Maps a press at `(x, y)` to an intent. `None` when outside the popover.
pub fn hit_test(state: &ControlState, x: u16, y: u16) -> Option<PopoverHit> {
    let area = PopoverView::new(state, NaiveDate::MIN).area()?;
    if !area.contains(ratatui::layout::Position { x, y }) {
        return None;
    }
    let grid = build_grid(state.visible_month, state.selected);
    let geo = PopoverGeometry::new(area, &grid, state.cursor);
    let Some(line) = geo.line_at(y) else {
        return Some(PopoverHit::Inside);
    };
    if x < geo.inner.x || x >= geo.inner.x + geo.inner.width {
        return Some(PopoverHit::Inside);
    }

    if line == 0 {
        let rel = x - geo.inner.x;
        if rel < NAV_WIDTH {
            return Some(PopoverHit::Prev);
        }
        if rel >= geo.inner.width.saturating_sub(NAV_WIDTH) {
            return Some(PopoverHit::Next);
        }
        return Some(PopoverHit::Inside);
    }
    if line < 2 || x < geo.grid_x {
        return Some(PopoverHit::Inside);
    }

    let row = (line - 2) as usize;
    let rel = x - geo.grid_x;
    let col = (rel / 3) as usize;
    // the third column of each slot is the separator
    if row >= WEEKS || col >= DAYS_PER_WEEK || rel % 3 == 2 {
        return Some(PopoverHit::Inside);
    }
    let date = grid.weeks[row][col].date;
    if !is_selectable(date) {
        return Some(PopoverHit::Inside);
    }
    Some(PopoverHit::Day(date))
}

/// Style for one day cell.
pub(crate) fn day_style(
    is_selected: bool,
    is_cursor: bool,
    in_current_month: bool,
    is_today: bool,
    is_weekend: bool,
) -> Style {
    let mut s = if is_selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if !in_current_month {
        Style::default().fg(Color::DarkGray)
    } else if is_weekend {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default()
    };
    if is_today {
        s = s.add_modifier(Modifier::UNDERLINED);
    }
    if is_cursor {
        s = s.add_modifier(Modifier::REVERSED);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::VisibleMonth;
    use ratatui::{backend::TestBackend, Terminal};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Open state for October 2026 placed at (2, 1), 23x10.
    fn open_state() -> ControlState {
        ControlState {
            is_open: true,
            selected: Some(d(2026, 10, 15)),
            visible_month: VisibleMonth {
                year: 2026,
                month: 10,
            },
            placement: Some(PlacementResult {
                left: 2.0,
                top: 1.0,
                width: 23.0,
                max_height: 10.0,
            }),
            cursor: d(2026, 10, 15),
        }
    }

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buf = terminal.backend().buffer();
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn test_placement_rect_trims_to_content() {
        let p = PlacementResult {
            left: 3.0,
            top: 4.0,
            width: 30.0,
            max_height: 50.0,
        };
        assert_eq!(placement_rect(&p), Rect::new(3, 4, 30, CONTENT_ROWS + 2));
    }

    #[test]
    fn test_placement_rect_keeps_short_height() {
        let p = PlacementResult {
            left: 0.0,
            top: 0.0,
            width: 23.0,
            max_height: 6.0,
        };
        assert_eq!(placement_rect(&p).height, 6);
    }

    #[test]
    fn test_closed_state_has_no_area() {
        let mut state = open_state();
        state.is_open = false;
        assert_eq!(PopoverView::new(&state, d(2026, 10, 18)).area(), None);
        assert_eq!(hit_test(&state, 5, 5), None);
    }

    #[test]
    fn test_render_shows_header_and_grid() {
        let state = open_state();
        let mut terminal = Terminal::new(TestBackend::new(30, 14)).unwrap();
        terminal
            .draw(|f| PopoverView::new(&state, d(2026, 10, 18)).render(f))
            .unwrap();
        // row 1 is the top border, row 2 the header
        assert!(row_text(&terminal, 2).contains("Oct 2026"));
        assert!(row_text(&terminal, 3).contains("Mo Tu We Th Fr Sa Su"));
        // first week of Oct 2026 starts Monday Sep 28
        assert!(row_text(&terminal, 4).contains("28 29 30  1  2  3  4"));
        assert!(row_text(&terminal, 9).contains(" 2  3  4  5  6  7  8"));
    }

    #[test]
    fn test_hit_test_navigation_arrows() {
        let state = open_state();
        // inner area starts at (3, 2), width 21
        assert_eq!(hit_test(&state, 3, 2), Some(PopoverHit::Prev));
        assert_eq!(hit_test(&state, 23, 2), Some(PopoverHit::Next));
        assert_eq!(hit_test(&state, 12, 2), Some(PopoverHit::Inside));
    }

    #[test]
    fn test_hit_test_days() {
        let state = open_state();
        // first day row is y = 4; column 0 at x = 3
        assert_eq!(hit_test(&state, 3, 4), Some(PopoverHit::Day(d(2026, 9, 28))));
        assert_eq!(hit_test(&state, 4, 4), Some(PopoverHit::Day(d(2026, 9, 28))));
        assert_eq!(hit_test(&state, 5, 4), Some(PopoverHit::Inside));
        // row 2, column 3 (Thursday)
        assert_eq!(hit_test(&state, 12, 6), Some(PopoverHit::Day(d(2026, 10, 15))));
        // weekday header row
        assert_eq!(hit_test(&state, 3, 3), Some(PopoverHit::Inside));
        // border
        assert_eq!(hit_test(&state, 2, 1), Some(PopoverHit::Inside));
        // outside
        assert_eq!(hit_test(&state, 0, 0), None);
        assert_eq!(hit_test(&state, 25, 4), None);
    }

    #[test]
    fn test_short_popover_scrolls_to_cursor() {
        let mut state = open_state();
        state.cursor = d(2026, 11, 8);
        if let Some(p) = state.placement.as_mut() {
            p.max_height = 6.0;
        }
        // inner height 4, cursor on content line 7 -> scroll 4
        assert_eq!(hit_test(&state, 3, 2), Some(PopoverHit::Day(d(2026, 10, 12))));
        assert_eq!(hit_test(&state, 21, 5), Some(PopoverHit::Day(d(2026, 11, 8))));
    }

    #[test]
    fn test_style_selected() {
        let s = day_style(true, false, true, false, false);
        assert_eq!(
            s,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        );
    }

    #[test]
    fn test_style_outside_month_is_muted() {
        let s = day_style(false, false, false, false, false);
        assert_eq!(s, Style::default().fg(Color::DarkGray));
    }

    #[test]
    fn test_style_weekend_dim() {
        let s = day_style(false, false, true, false, true);
        assert_eq!(s, Style::default().add_modifier(Modifier::DIM));
    }

    #[test]
    fn test_style_cursor_and_today_stack() {
        let s = day_style(false, true, true, true, false);
        assert_eq!(
            s,
            Style::default().add_modifier(Modifier::UNDERLINED | Modifier::REVERSED)
        );
    }

    #[test]
    fn test_days_past_last_year_are_not_hits() {
        let mut state = open_state();
        state.visible_month = VisibleMonth {
            year: 9999,
            month: 12,
        };
        state.selected = None;
        state.cursor = d(9999, 12, 1);
        // Dec 9999 starts on a Wednesday; the last row runs into January 10000
        assert_eq!(hit_test(&state, 3, 4), Some(PopoverHit::Day(d(9999, 11, 29))));
        assert_eq!(hit_test(&state, 21, 9), Some(PopoverHit::Inside));
    }
}
