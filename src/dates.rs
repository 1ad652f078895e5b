use chrono::{DateTime, Datelike, Local, Months, NaiveDate, SecondsFormat, TimeZone};

use crate::error::{Error, Result};

/// Shown in place of an endpoint that has not been picked yet.
pub const PLACEHOLDER: &str = "—";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidDate(value.trim().to_string()))
}

/// Reads a manual From/To field. Blank and unparseable text both clear the endpoint.
pub fn parse_input_date(value: &str) -> Option<NaiveDate> {
    if value.trim().is_empty() {
        return None;
    }
    parse_date(value).ok()
}

pub fn to_input_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn to_display_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Long month name and year, e.g. `March, 2024`.
pub fn month_label(date: NaiveDate) -> String {
    format!("{}, {}", date.format("%B"), date.year())
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month: day 0 of the following month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// First day of the month `delta` months away from `date`.
pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let first = first_of_month(date);
    let shifted = if delta >= 0 {
        first.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(first)
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Local> {
    local_datetime(date, 0, 0, 0, 0)
}

pub fn end_of_day(date: NaiveDate) -> DateTime<Local> {
    local_datetime(date, 23, 59, 59, 999)
}

pub fn to_iso(value: DateTime<Local>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// Accepts a full RFC 3339 timestamp (taken in local time) or a bare `YYYY-MM-DD`.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value.trim()) {
        return Some(timestamp.with_timezone(&Local).date_naive());
    }
    parse_date(value).ok()
}

fn local_datetime(date: NaiveDate, hour: u32, minute: u32, second: u32, milli: u32) -> DateTime<Local> {
    let naive = date
        .and_hms_milli_opt(hour, minute, second, milli)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    let result = Local.from_local_datetime(&naive);
    result
        .earliest()
        .or_else(|| result.latest())
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}
