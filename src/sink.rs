use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binding::FieldBinding;
use crate::dates::{end_of_day, parse_iso_date, start_of_day, to_iso};
use crate::error::Result;
use crate::range::DateRange;

/// Remembers a selection across sessions.
pub trait PersistenceSink {
    fn persist(&mut self, selection: &PersistedSelection) -> Result<()>;
}

/// Receives the filter derived from a complete selection.
pub trait FilterSink {
    fn apply(&mut self, filter: &AdvancedFilter) -> Result<()>;
    fn clear(&mut self, target: &FilterTarget) -> Result<()>;
}

/// Stored form of a range. Missing ends are `null`, never empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSelection {
    pub current_start: Option<String>,
    pub current_end: Option<String>,
    #[serde(default, alias = "dayCountCurrent")]
    pub day_count: i64,
}

impl PersistedSelection {
    pub fn from_range(range: &DateRange) -> Self {
        Self {
            current_start: range.start().map(|date| to_iso(start_of_day(date))),
            current_end: range.end().map(|date| to_iso(start_of_day(date))),
            day_count: range.day_count(),
        }
    }

    /// Unreadable ends come back absent.
    pub fn to_range(&self) -> DateRange {
        let start = self.current_start.as_deref().and_then(parse_iso_date);
        let end = self.current_end.as_deref().and_then(parse_iso_date);
        DateRange::unordered(start, end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTarget {
    pub table: String,
    pub column: String,
}

impl From<&FieldBinding> for FilterTarget {
    fn from(binding: &FieldBinding) -> Self {
        Self {
            table: binding.table.clone(),
            column: binding.column.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    GreaterThanOrEqual,
    LessThanOrEqual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub operator: FilterOperator,
    pub value: String,
}

/// Closed interval from the first millisecond of `start` to the last of `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterInterval {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl FilterInterval {
    pub fn from_range(range: &DateRange) -> Option<Self> {
        let (start, end) = range.interval()?;
        Some(Self {
            start: start_of_day(start),
            end: end_of_day(end),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedFilter {
    pub target: FilterTarget,
    pub logical_operator: String,
    pub conditions: Vec<FilterCondition>,
}

impl AdvancedFilter {
    pub fn between(target: FilterTarget, interval: &FilterInterval) -> Self {
        Self {
            target,
            logical_operator: "And".to_string(),
            conditions: vec![
                FilterCondition {
                    operator: FilterOperator::GreaterThanOrEqual,
                    value: to_iso(interval.start),
                },
                FilterCondition {
                    operator: FilterOperator::LessThanOrEqual,
                    value: to_iso(interval.end),
                },
            ],
        }
    }
}

pub fn persist_selection(sink: &mut dyn PersistenceSink, range: &DateRange) -> Result<()> {
    sink.persist(&PersistedSelection::from_range(range))
}

/// Returns `Ok(false)` without touching the sink when the range is incomplete or
/// inverted, or when no field is bound.
pub fn apply_filter(
    sink: &mut dyn FilterSink,
    range: &DateRange,
    binding: Option<&FieldBinding>,
) -> Result<bool> {
    let Some(interval) = FilterInterval::from_range(range) else {
        debug!(start = ?range.start(), end = ?range.end(), "skipping filter: no complete range");
        return Ok(false);
    };
    let Some(binding) = binding else {
        debug!("skipping filter: no field bound");
        return Ok(false);
    };

    let filter = AdvancedFilter::between(FilterTarget::from(binding), &interval);
    sink.apply(&filter)?;
    debug!(table = %binding.table, column = %binding.column, "filter applied");
    Ok(true)
}

pub fn clear_filter(sink: &mut dyn FilterSink, binding: Option<&FieldBinding>) -> Result<bool> {
    let Some(binding) = binding else {
        debug!("skipping clear: no field bound");
        return Ok(false);
    };
    sink.clear(&FilterTarget::from(binding))?;
    debug!(table = %binding.table, column = %binding.column, "filter cleared");
    Ok(true)
}

/// Keeps everything in memory; used by tests and by hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub persisted: Vec<PersistedSelection>,
    pub active: Option<AdvancedFilter>,
    pub applied: usize,
    pub cleared: usize,
}

impl PersistenceSink for MemorySink {
    fn persist(&mut self, selection: &PersistedSelection) -> Result<()> {
        self.persisted.push(selection.clone());
        Ok(())
    }
}

impl FilterSink for MemorySink {
    fn apply(&mut self, filter: &AdvancedFilter) -> Result<()> {
        self.active = Some(filter.clone());
        self.applied += 1;
        Ok(())
    }

    fn clear(&mut self, _target: &FilterTarget) -> Result<()> {
        self.active = None;
        self.cleared += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn bound() -> FieldBinding {
        FieldBinding::parse("Sales.OrderDate").unwrap()
    }

    #[test]
    fn persisted_selection_uses_nulls() {
        let record = PersistedSelection::from_range(&DateRange::anchor(ymd(2024, 3, 5)));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["currentStart"].is_string());
        assert!(json["currentEnd"].is_null());
        assert_eq!(json["dayCount"], 0);
    }

    #[test]
    fn persisted_selection_rehydrates() {
        let range = DateRange::between(ymd(2024, 3, 9), ymd(2024, 3, 15));
        let record = PersistedSelection::from_range(&range);
        assert_eq!(record.day_count, 7);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: PersistedSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.to_range(), range);
    }

    #[test]
    fn rehydrate_accepts_legacy_count_key_and_bad_dates() {
        let parsed: PersistedSelection = serde_json::from_str(
            r#"{"currentStart":"2024-03-09","currentEnd":"garbage","dayCountCurrent":3}"#,
        )
        .unwrap();
        assert_eq!(parsed.day_count, 3);
        assert_eq!(parsed.to_range(), DateRange::anchor(ymd(2024, 3, 9)));
    }

    #[test]
    fn filter_covers_whole_days() {
        let mut sink = MemorySink::default();
        let range = DateRange::between(ymd(2024, 3, 5), ymd(2024, 3, 10));
        let binding = bound();
        assert!(apply_filter(&mut sink, &range, Some(&binding)).unwrap());

        let filter = sink.active.unwrap();
        assert_eq!(filter.target.table, "Sales");
        assert_eq!(filter.target.column, "OrderDate");
        assert_eq!(filter.logical_operator, "And");
        assert_eq!(filter.conditions.len(), 2);
        assert_eq!(filter.conditions[0].operator, FilterOperator::GreaterThanOrEqual);
        assert!(filter.conditions[0].value.starts_with("2024-03-05T00:00:00.000"));
        assert_eq!(filter.conditions[1].operator, FilterOperator::LessThanOrEqual);
        assert!(filter.conditions[1].value.starts_with("2024-03-10T23:59:59.999"));
    }

    #[test]
    fn filter_skips_incomplete_or_inverted_ranges() {
        let mut sink = MemorySink::default();
        let binding = bound();
        let anchor = DateRange::anchor(ymd(2024, 3, 5));
        let inverted = DateRange::unordered(Some(ymd(2024, 3, 10)), Some(ymd(2024, 3, 5)));
        assert!(!apply_filter(&mut sink, &anchor, Some(&binding)).unwrap());
        assert!(!apply_filter(&mut sink, &inverted, Some(&binding)).unwrap());
        assert_eq!(sink.applied, 0);
    }

    #[test]
    fn filter_skips_unbound_field() {
        let mut sink = MemorySink::default();
        let range = DateRange::single(ymd(2024, 3, 5));
        assert!(!apply_filter(&mut sink, &range, None).unwrap());
        assert!(!clear_filter(&mut sink, None).unwrap());
        assert_eq!(sink.applied, 0);
        assert_eq!(sink.cleared, 0);
    }

    #[test]
    fn clear_removes_active_filter() {
        let mut sink = MemorySink::default();
        let binding = bound();
        let range = DateRange::single(ymd(2024, 3, 5));
        apply_filter(&mut sink, &range, Some(&binding)).unwrap();
        assert!(clear_filter(&mut sink, Some(&binding)).unwrap());
        assert!(sink.active.is_none());
        assert_eq!(sink.cleared, 1);
    }

    #[test]
    fn persist_records_day_count() {
        let mut sink = MemorySink::default();
        let range = DateRange::unordered(Some(ymd(2024, 3, 10)), Some(ymd(2024, 3, 5)));
        persist_selection(&mut sink, &range).unwrap();
        assert_eq!(sink.persisted[0].day_count, 6);
    }
}
