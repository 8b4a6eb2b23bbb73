use chrono::{Datelike, Duration, NaiveDate};

pub const WEEKS: usize = 6;
pub const DAYS_PER_WEEK: usize = 7;

/// Lowest and highest years reachable by month navigation. Keeps every
/// reachable date inside the four-digit ISO form.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

pub const WEEKDAY_HEADERS: [&str; DAYS_PER_WEEK] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// Dates a picker may emit: those whose year stays inside the navigation
/// range and so has a four-digit ISO form.
pub fn is_selectable(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// The month shown in the popover, independent of the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibleMonth {
    pub year: i32,
    pub month: u32,
}

impl VisibleMonth {
    pub fn containing(date: NaiveDate) -> Self {
        VisibleMonth {
            year: date.year().clamp(MIN_YEAR, MAX_YEAR),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn prev(self) -> Self {
        self.shifted(-1)
    }

    pub fn next(self) -> Self {
        self.shifted(1)
    }

    /// Steps by whole months, rolling the year over. Saturates at
    /// January `MIN_YEAR` and December `MAX_YEAR`.
    pub fn shifted(self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        let year = index.div_euclid(12);
        if year < MIN_YEAR {
            return VisibleMonth { year: MIN_YEAR, month: 1 };
        }
        if year > MAX_YEAR {
            return VisibleMonth { year: MAX_YEAR, month: 12 };
        }
        VisibleMonth {
            year,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn days(self) -> u32 {
        days_in_month(self.year, self.month)
    }

    /// `day` of this month, or its last day when the month is shorter.
    pub fn day_or_last(self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days());
        NaiveDate::from_ymd_opt(self.year, self.month, day).unwrap_or_else(|| self.first_day())
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Header text, e.g. `Oct 2026`.
    pub fn title(self) -> String {
        format!("{} {}", short_month_name(self.month), self.year)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_selected: bool,
}

/// A 6x7 Monday-first day matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthGrid {
    pub month: VisibleMonth,
    pub weeks: [[GridCell; DAYS_PER_WEEK]; WEEKS],
}

impl MonthGrid {
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.weeks.iter().flatten()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.weeks[0][0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.weeks[WEEKS - 1][DAYS_PER_WEEK - 1].date
    }

    /// Row/column of `date`, if the grid shows it.
    pub fn position_of(&self, date: NaiveDate) -> Option<(usize, usize)> {
        let offset = (date - self.first_date()).num_days();
        if !(0..(WEEKS * DAYS_PER_WEEK) as i64).contains(&offset) {
            return None;
        }
        let offset = offset as usize;
        Some((offset / DAYS_PER_WEEK, offset % DAYS_PER_WEEK))
    }
}

/// Builds the 42-cell grid for `month`. Leading and trailing cells come from
/// the neighbouring months and carry `in_current_month = false`.
pub fn build_grid(month: VisibleMonth, selected: Option<NaiveDate>) -> MonthGrid {
    let first = month.first_day();
    let offset = first.weekday().num_days_from_monday() as i64;
    let start = first - Duration::days(offset);

    let mut current = start;
    let weeks = std::array::from_fn(|_| {
        std::array::from_fn(|_| {
            let cell = GridCell {
                date: current,
                in_current_month: month.contains(current),
                is_selected: selected == Some(current),
            };
            current = current.succ_opt().unwrap_or(current);
            cell
        })
    });

    MonthGrid { month, weeks }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    match (
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
        NaiveDate::from_ymd_opt(year, month, 1),
    ) {
        (Some(next), Some(first)) => (next - first).num_days() as u32,
        _ => 30,
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

pub fn short_month_name(month: u32) -> &'static str {
    month_name(month).get(..3).unwrap_or("???")
}
