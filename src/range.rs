use std::fmt;

use chrono::NaiveDate;

use crate::dates::to_display_date;

/// A pair of optional calendar days.
///
/// Constructors that take both ends order them so `start <= end`. The manual
/// setters are the one exception: a half-edited From/To pair may be inverted,
/// and readers go through [`DateRange::interval`] to skip that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

/// Where the range stands in the two-click protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// No start. A lone end left over from manual entry counts as empty.
    Empty,
    AnchorOnly(NaiveDate),
    Complete { start: NaiveDate, end: NaiveDate },
}

impl DateRange {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(date: NaiveDate) -> Self {
        Self::between(date, date)
    }

    pub fn between(a: NaiveDate, b: NaiveDate) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn anchor(date: NaiveDate) -> Self {
        Self {
            start: Some(date),
            end: None,
        }
    }

    /// Raw pair, kept exactly as given.
    pub fn unordered(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn with_start(self, start: Option<NaiveDate>) -> Self {
        Self { start, ..self }
    }

    pub fn with_end(self, end: Option<NaiveDate>) -> Self {
        Self { end, ..self }
    }

    pub fn selection(&self) -> Selection {
        match (self.start, self.end) {
            (None, _) => Selection::Empty,
            (Some(start), None) => Selection::AnchorOnly(start),
            (Some(start), Some(end)) => Selection::Complete { start, end },
        }
    }

    /// Both ends present and in order.
    pub fn interval(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start > end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.interval()
            .map(|(start, end)| start <= date && date <= end)
            .unwrap_or(false)
    }

    /// Inclusive span in days; 0 when either end is missing. Inverted pairs count
    /// the same as their ordered twin.
    pub fn day_count(&self) -> i64 {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).num_days().abs() + 1,
            _ => 0,
        }
    }
}

pub fn day_count(range: &DateRange) -> i64 {
    range.day_count()
}

/// `DD/MM/YYYY - DD/MM/YYYY`, with a placeholder for a missing end.
pub fn format_range(range: &DateRange) -> String {
    format!(
        "{} - {}",
        to_display_date(range.start),
        to_display_date(range.end)
    )
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_range(self))
    }
}
