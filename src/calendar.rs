use chrono::{Datelike, NaiveDate};

use crate::dates::{days_in_month, month_label};
use crate::range::DateRange;

pub const DAYS_PER_WEEK: usize = 7;
pub const WEEKDAY_HEADERS: [&str; DAYS_PER_WEEK] = ["S", "M", "T", "W", "T", "F", "S"];

/// One Sunday-first row. `None` slots belong to a neighbouring month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarWeek {
    slots: [Option<u32>; DAYS_PER_WEEK],
}

impl CalendarWeek {
    pub fn slots(&self) -> &[Option<u32>; DAYS_PER_WEEK] {
        &self.slots
    }

    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub fn first_day(&self) -> Option<u32> {
        self.days().next()
    }

    pub fn last_day(&self) -> Option<u32> {
        self.days().last()
    }

    pub fn is_empty(&self) -> bool {
        self.first_day().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
    weeks: Vec<CalendarWeek>,
}

impl CalendarMonth {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn weeks(&self) -> &[CalendarWeek] {
        &self.weeks
    }

    pub fn week(&self, index: usize) -> Option<&CalendarWeek> {
        self.weeks.get(index)
    }

    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn week_index_of(&self, day: u32) -> Option<usize> {
        self.weeks
            .iter()
            .position(|week| week.days().any(|value| value == day))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// The grid follows the range start, or today while nothing is anchored.
pub fn reference_date(range: &DateRange, today: NaiveDate) -> NaiveDate {
    range.start().unwrap_or(today)
}

/// Heading for the month the grid shows for `range`, e.g. "March, 2024".
pub fn month_label_for(range: &DateRange, today: NaiveDate) -> String {
    month_label(reference_date(range, today))
}

/// Lays out the month containing `reference` in Sunday-first weeks.
pub fn build_month(reference: NaiveDate) -> CalendarMonth {
    let year = reference.year();
    let month = reference.month();
    let last = days_in_month(year, month);

    let mut weeks = Vec::new();
    let mut current = CalendarWeek::default();
    for day in 1..=last {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            continue;
        };
        let weekday = date.weekday().num_days_from_sunday() as usize;
        current.slots[weekday] = Some(day);

        if weekday == DAYS_PER_WEEK - 1 || day == last {
            weeks.push(current);
            current = CalendarWeek::default();
        }
    }

    CalendarMonth { year, month, weeks }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub date: NaiveDate,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedWeek {
    pub label: String,
    pub cells: [Option<DayCell>; DAYS_PER_WEEK],
}

/// Marks days inside `[start, end]`. A lone anchor highlights nothing.
pub fn annotate(month: &CalendarMonth, range: &DateRange) -> Vec<AnnotatedWeek> {
    month
        .weeks
        .iter()
        .enumerate()
        .map(|(index, week)| {
            let mut cells = [None; DAYS_PER_WEEK];
            for (slot, day) in week.slots.iter().enumerate() {
                let Some(day) = *day else {
                    continue;
                };
                let Some(date) = month.date_of(day) else {
                    continue;
                };
                cells[slot] = Some(DayCell {
                    day,
                    date,
                    selected: range.contains(date),
                });
            }
            AnnotatedWeek {
                label: format!("W{}", index + 1),
                cells,
            }
        })
        .collect()
}
