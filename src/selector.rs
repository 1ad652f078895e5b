use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::{CalendarMonth, CalendarWeek};
use crate::range::{DateRange, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Also the fallback for keys nobody recognises.
    #[default]
    Today,
    Yesterday,
    Last7,
    Last14,
    Last30,
    Last60,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Today,
        Preset::Yesterday,
        Preset::Last7,
        Preset::Last14,
        Preset::Last30,
        Preset::Last60,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Preset::Today => "today",
            Preset::Yesterday => "yesterday",
            Preset::Last7 => "last7",
            Preset::Last14 => "last14",
            Preset::Last30 => "last30",
            Preset::Last60 => "last60",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Preset::Today => "Today",
            Preset::Yesterday => "Yesterday",
            Preset::Last7 => "Last 7 days",
            Preset::Last14 => "Last 14 days",
            Preset::Last30 => "Last 30 days",
            Preset::Last60 => "Last 60 days",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Preset::Today => "Today",
            Preset::Yesterday => "Yesterday",
            Preset::Last7 => "7d",
            Preset::Last14 => "14d",
            Preset::Last30 => "30d",
            Preset::Last60 => "60d",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.key().eq_ignore_ascii_case(key.trim()))
    }

    /// Unknown keys resolve to [`Preset::Today`].
    pub fn resolve(key: &str) -> Self {
        Self::from_key(key).unwrap_or_else(|| {
            warn!(key, "unknown preset key, using today");
            Preset::Today
        })
    }

    pub fn range(self, today: NaiveDate) -> DateRange {
        match self {
            Preset::Today => DateRange::single(today),
            Preset::Yesterday => DateRange::single(today - Duration::days(1)),
            Preset::Last7 => last_days(today, 7),
            Preset::Last14 => last_days(today, 14),
            Preset::Last30 => last_days(today, 30),
            Preset::Last60 => last_days(today, 60),
        }
    }
}

/// `days` inclusive days ending today.
pub fn last_days(today: NaiveDate, days: i64) -> DateRange {
    DateRange::between(today - Duration::days(days.max(1) - 1), today)
}

pub fn apply_preset(key: &str, today: NaiveDate) -> DateRange {
    Preset::resolve(key).range(today)
}

/// First click anchors, second click completes. A completed pair is replaced by
/// a fresh anchor; a click before the anchor swaps the roles.
pub fn toggle_day(range: &DateRange, date: NaiveDate) -> DateRange {
    match range.selection() {
        Selection::Empty | Selection::Complete { .. } => DateRange::anchor(date),
        Selection::AnchorOnly(anchor) => DateRange::between(anchor, date),
    }
}

/// Selects the real days of `week`. A week without any days leaves the range as it was.
pub fn select_week(range: &DateRange, week: &CalendarWeek, year: i32, month: u32) -> DateRange {
    let first = week
        .first_day()
        .and_then(|day| NaiveDate::from_ymd_opt(year, month, day));
    let last = week
        .last_day()
        .and_then(|day| NaiveDate::from_ymd_opt(year, month, day));
    match (first, last) {
        (Some(start), Some(end)) => DateRange::between(start, end),
        _ => {
            warn!(year, month, "week selection on a week without days");
            *range
        }
    }
}

pub fn set_start_manually(range: &DateRange, date: Option<NaiveDate>) -> DateRange {
    range.with_start(date)
}

pub fn set_end_manually(range: &DateRange, date: Option<NaiveDate>) -> DateRange {
    range.with_end(date)
}

/// Owns the one live range and applies gestures to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelector {
    range: DateRange,
}

impl RangeSelector {
    /// Starts on the last seven days, today included.
    pub fn new(today: NaiveDate) -> Self {
        Self::with_range(Preset::Last7.range(today))
    }

    pub fn with_range(range: DateRange) -> Self {
        Self { range }
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn apply_preset(&mut self, key: &str, today: NaiveDate) {
        self.replace(apply_preset(key, today), "preset");
    }

    pub fn toggle_day(&mut self, date: NaiveDate) {
        self.replace(toggle_day(&self.range, date), "day");
    }

    pub fn select_week(&mut self, month: &CalendarMonth, index: usize) {
        let Some(week) = month.week(index) else {
            warn!(index, "week index outside the grid");
            return;
        };
        let next = select_week(&self.range, week, month.year(), month.month());
        self.replace(next, "week");
    }

    pub fn set_start_manually(&mut self, date: Option<NaiveDate>) {
        self.replace(set_start_manually(&self.range, date), "manual start");
    }

    pub fn set_end_manually(&mut self, date: Option<NaiveDate>) {
        self.replace(set_end_manually(&self.range, date), "manual end");
    }

    pub fn day_count(&self) -> i64 {
        self.range.day_count()
    }

    fn replace(&mut self, next: DateRange, gesture: &'static str) {
        debug!(
            gesture,
            start = ?next.start(),
            end = ?next.end(),
            "range updated"
        );
        self.range = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::build_month;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn today_preset_is_a_single_day() {
        let today = ymd(2024, 3, 15);
        let range = apply_preset("today", today);
        assert_eq!(range.start(), Some(today));
        assert_eq!(range.end(), Some(today));
    }

    #[test]
    fn yesterday_preset() {
        let range = apply_preset("yesterday", ymd(2024, 3, 1));
        assert_eq!(range, DateRange::single(ymd(2024, 2, 29)));
    }

    #[test]
    fn last_n_presets_are_inclusive() {
        let today = ymd(2024, 3, 15);
        assert_eq!(
            apply_preset("last7", today),
            DateRange::between(ymd(2024, 3, 9), today)
        );
        assert_eq!(
            apply_preset("last14", today),
            DateRange::between(ymd(2024, 3, 2), today)
        );
        assert_eq!(
            apply_preset("last30", today),
            DateRange::between(ymd(2024, 2, 15), today)
        );
        assert_eq!(
            apply_preset("last60", today),
            DateRange::between(ymd(2024, 1, 16), today)
        );
        for preset in [Preset::Last7, Preset::Last14, Preset::Last30, Preset::Last60] {
            let expected = preset.key().trim_start_matches("last").parse::<i64>().unwrap();
            assert_eq!(preset.range(today).day_count(), expected);
        }
    }

    #[test]
    fn unknown_preset_falls_back_to_today() {
        let today = ymd(2024, 3, 15);
        assert_eq!(apply_preset("last90", today), DateRange::single(today));
        assert_eq!(apply_preset("", today), DateRange::single(today));
    }

    #[test]
    fn preset_keys_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_key(preset.key()), Some(preset));
        }
        assert_eq!(Preset::from_key("LAST30"), Some(Preset::Last30));
        let json = serde_json::to_string(&Preset::Last14).unwrap();
        assert_eq!(json, "\"last14\"");
    }

    #[test]
    fn two_clicks_make_an_ordered_range() {
        let mut selector = RangeSelector::with_range(DateRange::empty());
        selector.toggle_day(ymd(2024, 3, 10));
        assert_eq!(*selector.range(), DateRange::anchor(ymd(2024, 3, 10)));
        selector.toggle_day(ymd(2024, 3, 5));
        assert_eq!(selector.range().start(), Some(ymd(2024, 3, 5)));
        assert_eq!(selector.range().end(), Some(ymd(2024, 3, 10)));
    }

    #[test]
    fn click_after_anchor_keeps_roles() {
        let range = toggle_day(&DateRange::anchor(ymd(2024, 3, 5)), ymd(2024, 3, 20));
        assert_eq!(range, DateRange::between(ymd(2024, 3, 5), ymd(2024, 3, 20)));
    }

    #[test]
    fn click_on_anchor_makes_single_day() {
        let range = toggle_day(&DateRange::anchor(ymd(2024, 3, 5)), ymd(2024, 3, 5));
        assert_eq!(range, DateRange::single(ymd(2024, 3, 5)));
    }

    #[test]
    fn click_on_complete_range_starts_over() {
        let range = DateRange::between(ymd(2024, 3, 5), ymd(2024, 3, 10));
        assert_eq!(
            toggle_day(&range, ymd(2024, 4, 1)),
            DateRange::anchor(ymd(2024, 4, 1))
        );
    }

    #[test]
    fn click_with_lone_manual_end_starts_over() {
        let range = DateRange::unordered(None, Some(ymd(2024, 3, 10)));
        assert_eq!(
            toggle_day(&range, ymd(2024, 3, 1)),
            DateRange::anchor(ymd(2024, 3, 1))
        );
    }

    #[test]
    fn week_selection_skips_padding() {
        // February 2024 starts on a Thursday: four empty slots, then 1..=3.
        let grid = build_month(ymd(2024, 2, 1));
        let mut selector = RangeSelector::new(ymd(2024, 2, 20));
        selector.select_week(&grid, 0);
        assert_eq!(
            *selector.range(),
            DateRange::between(ymd(2024, 2, 1), ymd(2024, 2, 3))
        );

        selector.select_week(&grid, 2);
        assert_eq!(
            *selector.range(),
            DateRange::between(ymd(2024, 2, 11), ymd(2024, 2, 17))
        );
    }

    #[test]
    fn empty_week_is_a_no_op() {
        let before = DateRange::between(ymd(2024, 3, 5), ymd(2024, 3, 10));
        let empty = CalendarWeek::default();
        assert!(empty.is_empty());
        assert_eq!(select_week(&before, &empty, 2024, 3), before);

        let grid = build_month(ymd(2024, 3, 1));
        let mut selector = RangeSelector::with_range(before);
        selector.select_week(&grid, 42);
        assert_eq!(*selector.range(), before);
    }

    #[test]
    fn manual_edits_allow_inversion() {
        let mut selector =
            RangeSelector::with_range(DateRange::between(ymd(2024, 3, 5), ymd(2024, 3, 10)));
        selector.set_start_manually(Some(ymd(2024, 3, 20)));
        assert_eq!(selector.range().start(), Some(ymd(2024, 3, 20)));
        assert_eq!(selector.range().end(), Some(ymd(2024, 3, 10)));
        assert!(selector.range().is_inverted());
        assert_eq!(selector.day_count(), 11);

        selector.set_end_manually(None);
        assert_eq!(selector.range().end(), None);
        assert_eq!(selector.day_count(), 0);
    }

    #[test]
    fn default_selector_covers_last_week() {
        let selector = RangeSelector::new(ymd(2024, 3, 15));
        assert_eq!(
            *selector.range(),
            DateRange::between(ymd(2024, 3, 9), ymd(2024, 3, 15))
        );
        assert_eq!(selector.day_count(), 7);
    }
}
