use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Flex, Layout, Margin, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Wrap};

use crate::app::{App, DateInputMode, Mode};
use crate::calendar::{WEEKDAY_HEADERS, annotate};
use crate::dates::{PLACEHOLDER, month_label, to_input_date};
use crate::range::format_range;
use crate::selector::Preset;
use crate::sink::{FilterSink, PersistenceSink};
use crate::storage::ThemePreference;

/// Below this width the presets collapse into one row of short labels.
pub const COMPACT_WIDTH: u16 = 64;

const CELL_WIDTH: usize = 3;
const WEEK_LABEL_WIDTH: usize = 4;
const TOAST_HEIGHT: u16 = 3;
const TOAST_MIN_WIDTH: u16 = 20;
const TOAST_MIN_ROOM: u16 = 4;

/// Draws the whole screen from `app`. Drawing twice without input in between
/// produces the same frame.
pub fn draw<S: PersistenceSink, F: FilterSink>(frame: &mut Frame, app: &mut App<S, F>) {
    let area = frame.area();
    let palette = Palette::for_preference(app.theme);
    palette.paint_screen(frame, area);

    match app.mode {
        Mode::Collapsed => draw_collapsed(frame, app, area, &palette),
        Mode::Expanded => draw_expanded(frame, app, area, &palette),
        Mode::DateInput(field) => {
            draw_expanded(frame, app, area, &palette);
            draw_date_input(frame, app, area, field, &palette);
        }
    }

    if app.show_help {
        draw_help(frame, area, &palette);
    } else if let Some(toast) = app.active_toast() {
        draw_toast(frame, area, &toast.message, toast.is_error, &palette);
    }
}

fn draw_collapsed<S, F>(frame: &mut Frame, app: &App<S, F>, area: Rect, palette: &Palette)
where
    S: PersistenceSink,
    F: FilterSink,
{
    let content = area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });
    let [pill_area, _, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(content);

    let pill = Line::from(vec![
        Span::raw("📅 "),
        Span::styled(
            format_range(app.range()),
            Style::new().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!(" {}d ", app.day_count()), palette.badge()),
        Span::styled("  ▲", palette.hint()),
    ]);
    let paragraph = Paragraph::new(pill)
        .alignment(Alignment::Center)
        .block(palette.card("Date Range"));
    frame.render_widget(paragraph, pill_area);

    let footer = Paragraph::new(Span::styled(
        "Enter expand • h help • q quit",
        palette.hint(),
    ));
    frame.render_widget(footer, footer_area);
}

fn draw_expanded<S, F>(frame: &mut Frame, app: &App<S, F>, area: Rect, palette: &Palette)
where
    S: PersistenceSink,
    F: FilterSink,
{
    let content = area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    });

    let card_area = if content.width < COMPACT_WIDTH {
        let [chips, card] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(content);
        draw_compact_presets(frame, app, chips, palette);
        card
    } else {
        let [list, card] =
            Layout::horizontal([Constraint::Length(24), Constraint::Min(0)]).areas(content);
        draw_presets(frame, app, list, palette);
        card
    };

    let card = Paragraph::new(calendar_card_lines(app, palette))
        .block(palette.card("Select Date Range"));
    frame.render_widget(card, card_area);
}

fn active_preset<S, F>(app: &App<S, F>) -> Option<Preset>
where
    S: PersistenceSink,
    F: FilterSink,
{
    Preset::ALL
        .into_iter()
        .find(|preset| preset.range(app.today()) == *app.range())
}

fn draw_presets<S, F>(frame: &mut Frame, app: &App<S, F>, area: Rect, palette: &Palette)
where
    S: PersistenceSink,
    F: FilterSink,
{
    let active = active_preset(app);
    let lines: Vec<Line> = Preset::ALL
        .into_iter()
        .enumerate()
        .map(|(index, preset)| {
            let style = if Some(preset) == active {
                palette.active_preset()
            } else {
                Style::new()
            };
            Line::from(vec![
                Span::styled(format!("{} ", index + 1), palette.hint()),
                Span::styled(preset.label(), style),
            ])
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines).block(palette.card("Quick ranges")),
        area,
    );
}

fn draw_compact_presets<S, F>(frame: &mut Frame, app: &App<S, F>, area: Rect, palette: &Palette)
where
    S: PersistenceSink,
    F: FilterSink,
{
    let active = active_preset(app);
    let mut spans = Vec::new();
    for (index, preset) in Preset::ALL.into_iter().enumerate() {
        let style = if Some(preset) == active {
            palette.badge()
        } else {
            Style::new()
        };
        spans.push(Span::styled(
            format!("{}:{}", index + 1, preset.short_label()),
            style,
        ));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(palette.card("Quick ranges")),
        area,
    );
}

fn calendar_card_lines<S, F>(app: &App<S, F>, palette: &Palette) -> Vec<Line<'static>>
where
    S: PersistenceSink,
    F: FilterSink,
{
    let range = *app.range();
    let month = app.view_month();
    let reference = month.date_of(1).unwrap_or(app.cursor);

    let mut lines = vec![
        Line::from(Span::styled(
            format_range(&range),
            Style::new().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(month_label(reference), palette.heading())),
    ];

    let mut header = vec![Span::raw(" ".repeat(WEEK_LABEL_WIDTH))];
    header.extend(WEEKDAY_HEADERS.iter().map(|label| {
        Span::styled(format!("{label:>CELL_WIDTH$}"), palette.hint())
    }));
    lines.push(Line::from(header));

    for week in annotate(&month, &range) {
        let mut spans = vec![Span::styled(
            format!("{:<WEEK_LABEL_WIDTH$}", week.label),
            palette.hint(),
        )];
        spans.extend(week.cells.into_iter().map(|cell| match cell {
            Some(cell) => Span::styled(
                format!("{:>CELL_WIDTH$}", cell.day),
                palette.day(cell.selected, cell.date == app.cursor),
            ),
            None => Span::raw(" ".repeat(CELL_WIDTH)),
        }));
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Selected Period  ", palette.hint()),
        Span::styled(
            format!("{} Days", app.day_count()),
            Style::new().add_modifier(Modifier::BOLD),
        ),
    ]));

    let input_value = |date: Option<chrono::NaiveDate>| {
        date.map(to_input_date).unwrap_or_else(|| PLACEHOLDER.to_string())
    };
    lines.push(Line::from(vec![
        Span::styled("From ", palette.hint()),
        Span::raw(input_value(range.start())),
        Span::styled("   To ", palette.hint()),
        Span::raw(input_value(range.end())),
    ]));

    let field = match &app.binding {
        Some(binding) => format!("{}[{}]", binding.table, binding.column),
        None => "not bound".to_string(),
    };
    lines.push(Line::from(vec![
        Span::styled("Field ", palette.hint()),
        Span::raw(field),
    ]));

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[c] Clear Filter", palette.hint()),
        Span::raw("   "),
        Span::styled("[a] Apply Filter", palette.heading()),
    ]));

    if let Some(status) = &app.status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(status.clone(), palette.failure())));
    }

    lines
}

fn draw_date_input<S, F>(
    frame: &mut Frame,
    app: &App<S, F>,
    area: Rect,
    field: DateInputMode,
    palette: &Palette,
) where
    S: PersistenceSink,
    F: FilterSink,
{
    let (title, label) = match field {
        DateInputMode::Start => ("From", "Start date (YYYY-MM-DD)"),
        DateInputMode::End => ("To", "End date (YYYY-MM-DD)"),
    };

    let lines = vec![
        Line::from(label),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", Style::new().add_modifier(Modifier::BOLD)),
            Span::styled(app.input.clone(), Style::new().fg(palette.cursor)),
            Span::styled("▏", palette.hint()),
        ]),
        Line::from(""),
        Line::from(Span::styled("Enter set • empty clears • Esc cancel", palette.hint())),
    ];

    let rect = overlay(area, 44, lines.len() as u16 + 2);
    let paragraph = Paragraph::new(lines)
        .block(palette.card(title))
        .wrap(Wrap { trim: true });
    frame.render_widget(Clear, rect);
    frame.render_widget(paragraph, rect);
}

/// A dialog of at most `width` x `height` cells in the middle of `area`.
fn overlay(area: Rect, width: u16, height: u16) -> Rect {
    let [band] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [dialog] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(band);
    dialog
}

/// Bottom-right slot for a toast, or `None` when the terminal has no room for one.
fn toast_area(area: Rect, message: &str) -> Option<Rect> {
    let room = area.width.saturating_sub(2);
    if room < TOAST_MIN_ROOM || area.height < TOAST_HEIGHT {
        return None;
    }
    let wanted = u16::try_from(message.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(6);
    let width = wanted.max(TOAST_MIN_WIDTH).min(room);
    let x = area.x + area.width.saturating_sub(width + 1);
    let y = area.y + area.height.saturating_sub(TOAST_HEIGHT + 1);
    Some(Rect::new(x, y, width, TOAST_HEIGHT).intersection(area))
}

fn draw_toast(frame: &mut Frame, area: Rect, message: &str, is_error: bool, palette: &Palette) {
    let Some(rect) = toast_area(area, message) else {
        return;
    };
    let (style, title) = palette.notice(is_error);
    let paragraph = Paragraph::new(Line::from(Span::styled(message.to_string(), style)))
        .alignment(Alignment::Center)
        .block(palette.card(title));
    frame.render_widget(Clear, rect);
    frame.render_widget(paragraph, rect);
}

fn draw_help(frame: &mut Frame, area: Rect, palette: &Palette) {
    let keys = [
        ("Enter", "Expand panel / pick the day under the cursor"),
        ("Arrows", "Move the day cursor"),
        ("[ ]", "Previous / next month"),
        ("w", "Select the cursor's week"),
        ("1-6", "Today, Yesterday, Last 7/14/30/60 days"),
        ("f / t", "Type the From / To date"),
        ("a", "Apply filter"),
        ("c", "Clear filter"),
        ("y", "Copy range to clipboard"),
        ("Esc", "Collapse panel"),
        ("q", "Quit"),
    ];

    let mut lines = vec![Line::from("")];
    lines.extend(keys.into_iter().map(|(key, description)| {
        Line::from(vec![
            Span::styled(format!("{key:<8}"), palette.heading()),
            Span::raw(description),
        ])
    }));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Press h or Esc to close", palette.hint())));

    let rect = overlay(area, 60, lines.len() as u16 + 2);
    let paragraph = Paragraph::new(lines)
        .block(palette.card("Keys"))
        .wrap(Wrap { trim: true });
    frame.render_widget(Clear, rect);
    frame.render_widget(paragraph, rect);
}

/// Colours named after the part of the picker they paint.
#[derive(Clone, Copy)]
struct Palette {
    screen: Color,
    card: Color,
    edge: Color,
    ink: Color,
    hint: Color,
    /// Days inside the selected interval, the day-count badge and the active chip.
    span_bg: Color,
    span_fg: Color,
    /// Day under the keyboard cursor and the active preset in the list.
    cursor: Color,
    heading: Color,
    applied: Color,
    failed: Color,
}

const TERMINAL: Palette = Palette {
    screen: Color::Reset,
    card: Color::Reset,
    edge: Color::Gray,
    ink: Color::Reset,
    hint: Color::DarkGray,
    span_bg: Color::Blue,
    span_fg: Color::White,
    cursor: Color::Magenta,
    heading: Color::Blue,
    applied: Color::Green,
    failed: Color::LightRed,
};

const DARK: Palette = Palette {
    screen: Color::Rgb(18, 18, 24),
    card: Color::Rgb(28, 28, 38),
    edge: Color::Rgb(70, 70, 92),
    ink: Color::Rgb(232, 232, 240),
    hint: Color::Rgb(150, 150, 170),
    span_bg: Color::Rgb(74, 98, 196),
    span_fg: Color::Rgb(244, 246, 255),
    cursor: Color::Rgb(255, 184, 108),
    heading: Color::Rgb(138, 160, 255),
    applied: Color::Rgb(110, 210, 140),
    failed: Color::Rgb(255, 110, 120),
};

const LIGHT: Palette = Palette {
    screen: Color::Rgb(240, 240, 245),
    card: Color::Rgb(252, 252, 255),
    edge: Color::Rgb(196, 198, 214),
    ink: Color::Rgb(28, 28, 40),
    hint: Color::Rgb(110, 112, 130),
    span_bg: Color::Rgb(58, 86, 200),
    span_fg: Color::Rgb(255, 255, 255),
    cursor: Color::Rgb(196, 96, 20),
    heading: Color::Rgb(48, 72, 180),
    applied: Color::Rgb(30, 130, 70),
    failed: Color::Rgb(196, 40, 60),
};

impl Palette {
    fn for_preference(preference: ThemePreference) -> Self {
        match preference {
            ThemePreference::Terminal => TERMINAL,
            ThemePreference::Dark => DARK,
            ThemePreference::Light => LIGHT,
        }
    }

    fn paint_screen(&self, frame: &mut Frame, area: Rect) {
        frame
            .buffer_mut()
            .set_style(area, Style::new().bg(self.screen).fg(self.ink));
    }

    fn card(&self, title: &str) -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(self.edge))
            .style(Style::new().bg(self.card).fg(self.ink))
            .title(Span::styled(format!(" {title} "), self.heading()))
    }

    fn heading(&self) -> Style {
        Style::new().fg(self.heading).add_modifier(Modifier::BOLD)
    }

    fn hint(&self) -> Style {
        Style::new().fg(self.hint)
    }

    fn span(&self) -> Style {
        Style::new().bg(self.span_bg).fg(self.span_fg)
    }

    fn badge(&self) -> Style {
        self.span().add_modifier(Modifier::BOLD)
    }

    fn active_preset(&self) -> Style {
        Style::new().fg(self.cursor).add_modifier(Modifier::BOLD)
    }

    fn day(&self, selected: bool, under_cursor: bool) -> Style {
        let base = if selected { self.span() } else { Style::new() };
        if under_cursor {
            base.fg(self.cursor)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            base
        }
    }

    fn notice(&self, is_error: bool) -> (Style, &'static str) {
        if is_error {
            (Style::new().fg(self.failed).add_modifier(Modifier::BOLD), "Error")
        } else {
            (Style::new().fg(self.applied).add_modifier(Modifier::BOLD), "Done")
        }
    }

    fn failure(&self) -> Style {
        Style::new().fg(self.failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::FieldBinding;
    use crate::selector::RangeSelector;
    use crate::sink::MemorySink;
    use chrono::NaiveDate;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn app() -> App<MemorySink, MemorySink> {
        bound_app(None)
    }

    fn bound_app(binding: Option<&str>) -> App<MemorySink, MemorySink> {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        App::new(
            RangeSelector::new(today),
            binding.and_then(FieldBinding::parse),
            ThemePreference::Dark,
            MemorySink::default(),
            MemorySink::default(),
            today,
        )
    }

    fn render(app: &mut App<MemorySink, MemorySink>, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn text(buffer: &Buffer) -> String {
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<Vec<_>>()
            .join("")
    }

    #[test]
    fn redraw_is_idempotent() {
        let mut app = app();
        app.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let first = render(&mut app, 100, 40);
        let second = render(&mut app, 100, 40);
        assert_eq!(first, second);
    }

    #[test]
    fn collapsed_pill_shows_range_and_count() {
        let mut app = app();
        let screen = text(&render(&mut app, 80, 10));
        assert!(screen.contains("09/03/2024 - 15/03/2024"));
        assert!(screen.contains("7d"));
    }

    #[test]
    fn expanded_panel_lists_weeks() {
        let mut app = app();
        app.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let screen = text(&render(&mut app, 100, 40));
        assert!(screen.contains("March, 2024"));
        assert!(screen.contains("W6"));
        assert!(screen.contains("Last 60 days"));
        assert!(screen.contains("7 Days"));
    }

    #[test]
    fn narrow_terminal_uses_short_preset_labels() {
        let mut app = app();
        app.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        let screen = text(&render(&mut app, 60, 40));
        assert!(screen.contains("6:60d"));
        assert!(!screen.contains("Last 60 days"));
    }

    #[test]
    fn toast_fits_a_tiny_terminal() {
        let mut app = bound_app(Some("Sales.OrderDate"));
        app.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        app.handle_key_event(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        assert!(app.active_toast().is_some());

        let screen = text(&render(&mut app, 18, 10));
        assert!(screen.contains("Done"));
        // Narrower than any toast: drawn without it.
        render(&mut app, 4, 3);
        render(&mut app, 1, 1);
    }

    #[test]
    fn toast_width_stays_inside_the_frame() {
        let wide = Rect::new(0, 0, 100, 20);
        assert_eq!(toast_area(wide, "Filter applied.").map(|r| r.width), Some(21));
        assert_eq!(toast_area(wide, "ok").map(|r| r.width), Some(TOAST_MIN_WIDTH));

        let narrow = Rect::new(0, 0, 18, 10);
        let rect = toast_area(narrow, "Filter applied.").unwrap();
        assert_eq!(rect.width, 16);
        assert_eq!(rect.intersection(narrow), rect);

        assert_eq!(toast_area(Rect::new(0, 0, 5, 10), "Filter applied."), None);
        assert_eq!(toast_area(Rect::new(0, 0, 40, 2), "Filter applied."), None);
    }

    #[test]
    fn overlays_shrink_to_small_terminals() {
        let area = Rect::new(0, 0, 30, 6);
        let dialog = overlay(area, 60, 18);
        assert_eq!(dialog.intersection(area), dialog);
        assert!(dialog.width <= 30 && dialog.height <= 6);

        let roomy = overlay(Rect::new(0, 0, 100, 40), 44, 7);
        assert_eq!((roomy.x, roomy.width, roomy.height), (28, 44, 7));
        assert!((16..=17).contains(&roomy.y));
    }
}
