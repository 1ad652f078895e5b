use arboard::Clipboard;
use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::binding::FieldBinding;
use crate::calendar::{CalendarMonth, build_month, reference_date};
use crate::dates::{first_of_month, parse_input_date, shift_month, to_input_date};
use crate::range::{DateRange, format_range};
use crate::selector::{Preset, RangeSelector};
use crate::sink::{FilterSink, PersistenceSink, apply_filter, clear_filter, persist_selection};
use crate::storage::{FileFilterSink, FileStateStore, ThemePreference};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Collapsed,
    Expanded,
    DateInput(DateInputMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInputMode {
    Start,
    End,
}

/// Host shell around the selector: owns the live range and the sinks, and turns
/// key presses into gestures.
pub struct App<S = FileStateStore, F = FileFilterSink> {
    pub should_quit: bool,
    pub mode: Mode,
    pub status: Option<String>,
    pub input: String,
    pub show_help: bool,
    pub theme: ThemePreference,
    pub binding: Option<FieldBinding>,
    pub cursor: NaiveDate,
    selector: RangeSelector,
    browse: Option<NaiveDate>,
    today: NaiveDate,
    state_store: S,
    filter_sink: F,
    toast: Option<Toast>,
}

impl<S: PersistenceSink, F: FilterSink> App<S, F> {
    pub fn new(
        selector: RangeSelector,
        binding: Option<FieldBinding>,
        theme: ThemePreference,
        state_store: S,
        filter_sink: F,
        today: NaiveDate,
    ) -> Self {
        let cursor = reference_date(selector.range(), today);
        App {
            should_quit: false,
            mode: Mode::Collapsed,
            status: None,
            input: String::new(),
            show_help: false,
            theme,
            binding,
            cursor,
            selector,
            browse: None,
            today,
            state_store,
            filter_sink,
            toast: None,
        }
    }

    pub fn range(&self) -> &DateRange {
        self.selector.range()
    }

    pub fn day_count(&self) -> i64 {
        self.selector.day_count()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn state_store(&self) -> &S {
        &self.state_store
    }

    pub fn filter_sink(&self) -> &F {
        &self.filter_sink
    }

    /// Month on screen: the browsed one, else the month of the range start.
    pub fn view_month(&self) -> CalendarMonth {
        build_month(self.view_date())
    }

    fn view_date(&self) -> NaiveDate {
        self.browse
            .unwrap_or_else(|| reference_date(self.selector.range(), self.today))
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.show_help {
            match key.code {
                KeyCode::Char('h') | KeyCode::Esc => self.show_help = false,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match self.mode {
            Mode::Collapsed => self.handle_collapsed_input(key),
            Mode::Expanded => self.handle_expanded_input(key),
            Mode::DateInput(mode) => self.handle_date_input(mode, key),
        }
    }

    fn handle_collapsed_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Enter | KeyCode::Char(' ') => self.mode = Mode::Expanded,
            KeyCode::Char('h') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_expanded_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => self.mode = Mode::Collapsed,
            KeyCode::Char('h') => self.show_help = true,
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Up => self.move_cursor(-7),
            KeyCode::Down => self.move_cursor(7),
            KeyCode::Char('[') => self.browse_month(-1),
            KeyCode::Char(']') => self.browse_month(1),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_cursor_day(),
            KeyCode::Char('w') => self.select_cursor_week(),
            KeyCode::Char('f') => self.enter_date_input(DateInputMode::Start),
            KeyCode::Char('t') => self.enter_date_input(DateInputMode::End),
            KeyCode::Char('a') => self.apply(),
            KeyCode::Char('c') => self.clear(),
            KeyCode::Char('y') => self.copy_range_to_clipboard(),
            KeyCode::Char(ch @ '1'..='6') => {
                let index = ch as usize - '1' as usize;
                if let Some(preset) = Preset::ALL.get(index) {
                    self.apply_preset(*preset);
                }
            }
            _ => {}
        }
    }

    fn handle_date_input(&mut self, mode: DateInputMode, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let date = parse_input_date(&self.input);
                match mode {
                    DateInputMode::Start => self.selector.set_start_manually(date),
                    DateInputMode::End => self.selector.set_end_manually(date),
                }
                self.status = if date.is_none() && !self.input.trim().is_empty() {
                    Some(format!("Could not read '{}'; field cleared.", self.input.trim()))
                } else {
                    None
                };
                self.input.clear();
                self.mode = Mode::Expanded;
                self.after_range_change();
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    self.input.push(ch);
                }
            }
            KeyCode::Esc => {
                self.input.clear();
                self.mode = Mode::Expanded;
            }
            _ => {}
        }
    }

    fn enter_date_input(&mut self, mode: DateInputMode) {
        let current = match mode {
            DateInputMode::Start => self.selector.range().start(),
            DateInputMode::End => self.selector.range().end(),
        };
        self.input = current.map(to_input_date).unwrap_or_default();
        self.mode = Mode::DateInput(mode);
        self.status = None;
    }

    /// Preset clicks commit straight away: persist, filter, redraw.
    pub fn apply_preset(&mut self, preset: Preset) {
        self.selector.apply_preset(preset.key(), self.today);
        self.after_range_change();
        self.persist();
        self.push_filter();
    }

    pub fn toggle_cursor_day(&mut self) {
        self.selector.toggle_day(self.cursor);
        self.after_range_change();
    }

    pub fn select_cursor_week(&mut self) {
        let month = self.view_month();
        if !month.contains(self.cursor) {
            return;
        }
        let Some(index) = month.week_index_of(self.cursor.day()) else {
            return;
        };
        self.selector.select_week(&month, index);
        self.after_range_change();
    }

    /// Persist, filter and fold the panel away.
    pub fn apply(&mut self) {
        self.persist();
        self.push_filter();
        self.mode = Mode::Collapsed;
    }

    /// Drops the host filter and folds the panel away. Unbound, nothing
    /// happens and the panel stays open.
    pub fn clear(&mut self) {
        if self.binding.is_none() {
            debug!("clear ignored, no field bound");
            return;
        }
        match clear_filter(&mut self.filter_sink, self.binding.as_ref()) {
            Ok(true) => {
                info!("filter cleared");
                self.set_toast("Filter cleared.", false);
            }
            Ok(false) => {}
            Err(err) => {
                error!(%err, "clearing filter failed");
                self.set_toast(format!("Could not clear filter: {err}"), true);
            }
        }
        self.mode = Mode::Collapsed;
    }

    fn persist(&mut self) {
        if let Err(err) = persist_selection(&mut self.state_store, self.selector.range()) {
            error!(%err, "persisting selection failed");
            self.status = Some(format!("Could not save selection: {err}"));
            self.set_toast("Could not save selection.", true);
        }
    }

    fn push_filter(&mut self) {
        match apply_filter(&mut self.filter_sink, self.selector.range(), self.binding.as_ref()) {
            Ok(true) => {
                info!(range = %format_range(self.selector.range()), "filter applied");
                self.set_toast("Filter applied.", false);
            }
            Ok(false) => {}
            Err(err) => {
                error!(%err, "applying filter failed");
                self.set_toast(format!("Could not apply filter: {err}"), true);
            }
        }
    }

    /// A new range drops any month browsing; the cursor follows if it fell off the grid.
    fn after_range_change(&mut self) {
        self.browse = None;
        if !self.view_month().contains(self.cursor) {
            self.cursor = reference_date(self.selector.range(), self.today);
        }
    }

    fn move_cursor(&mut self, days: i64) {
        let next = self.cursor + Duration::days(days);
        self.cursor = next;
        if !self.view_month().contains(next) {
            self.browse = Some(first_of_month(next));
        }
    }

    fn browse_month(&mut self, delta: i32) {
        let target = shift_month(self.view_date(), delta);
        self.browse = Some(target);
        self.cursor = target;
    }

    fn copy_range_to_clipboard(&mut self) {
        let text = format_range(self.selector.range());
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(_) => self.set_toast("Copied range to clipboard.", false),
            Err(err) => self.set_toast(format!("Clipboard error: {err}"), true),
        }
    }

    pub fn active_toast(&mut self) -> Option<ToastView> {
        let toast = self.toast.as_ref()?;
        if toast.created_at.elapsed() > std::time::Duration::from_secs(2) {
            self.toast = None;
            return None;
        }
        Some(ToastView {
            message: toast.message.clone(),
            is_error: toast.is_error,
        })
    }

    fn set_toast(&mut self, message: impl Into<String>, is_error: bool) {
        self.toast = Some(Toast {
            message: message.into(),
            created_at: Instant::now(),
            is_error,
        });
    }
}

struct Toast {
    message: String,
    created_at: Instant,
    is_error: bool,
}

pub struct ToastView {
    pub message: String,
    pub is_error: bool,
}
