//! Date range slicer: a range-selection state machine, a month grid builder and
//! the adapters that hand a finished range to a host for persistence and filtering.

pub mod app;
pub mod binding;
pub mod calendar;
pub mod dates;
pub mod error;
pub mod logging;
pub mod range;
pub mod selector;
pub mod sink;
pub mod storage;
pub mod ui;

pub use binding::FieldBinding;
pub use calendar::{CalendarMonth, CalendarWeek, build_month, month_label_for};
pub use error::{Error, Result};
pub use range::{DateRange, Selection, day_count, format_range};
pub use selector::{Preset, RangeSelector};
