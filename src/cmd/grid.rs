use crate::calc::month_grid::WEEKDAY_HEADERS;
use crate::calc::{build_grid, parse_iso, MonthGrid, VisibleMonth};
use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};

pub fn run(month: Option<&str>, selected: Option<&str>) -> Result<()> {
    let selected = selected
        .map(|s| parse_iso(s).with_context(|| format!("invalid date `{s}`, expected YYYY-MM-DD")))
        .transpose()?;
    let visible = match month {
        Some(key) => parse_month(key)?,
        None => VisibleMonth::containing(selected.unwrap_or_else(|| Local::now().date_naive())),
    };
    let grid = build_grid(visible, selected);
    write_grid(&grid, &mut std::io::stdout())
}

/// Parses `YYYY-MM`.
pub(crate) fn parse_month(key: &str) -> Result<VisibleMonth> {
    let Some(date) = parse_iso(&format!("{key}-01")) else {
        bail!("invalid month `{key}`, expected YYYY-MM");
    };
    Ok(VisibleMonth::containing(date))
}

/// Prints the six weeks of `grid`. Days outside the month are shown in
/// parentheses and the selected day in brackets.
pub(crate) fn write_grid<W: std::io::Write>(grid: &MonthGrid, out: &mut W) -> Result<()> {
    writeln!(out, "{}", grid.month.title())?;
    let header: Vec<String> = WEEKDAY_HEADERS.iter().map(|h| format!(" {h:>2} ")).collect();
    writeln!(out, "{}", header.join(""))?;
    for week in &grid.weeks {
        let line: String = week
            .iter()
            .map(|cell| cell_text(cell.date, cell.in_current_month, cell.is_selected))
            .collect();
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}

fn cell_text(date: NaiveDate, in_current_month: bool, is_selected: bool) -> String {
    let day = date.day();
    if is_selected {
        format!("[{day:>2}]")
    } else if in_current_month {
        format!(" {day:>2} ")
    } else {
        format!("({day:>2})")
    }
}
