use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;

use rangeslicer::app::App;
use rangeslicer::dates::{self, parse_date};
use rangeslicer::sink::PersistedSelection;
use rangeslicer::storage::{self, Config, FileFilterSink, FileStateStore};
use rangeslicer::{DateRange, FieldBinding, RangeSelector, logging, ui};

#[derive(Debug, Parser)]
#[command(name = "rangeslicer", version, about = "Pick a date range and hand it to a filter")]
struct Cli {
    /// Field to filter, as `table.column` or `table[column]`
    #[arg(long)]
    field: Option<String>,

    /// today, yesterday, last7, last14, last30 or last60
    #[arg(long)]
    preset: Option<String>,

    #[arg(long, value_parser = parse_cli_date)]
    start: Option<NaiveDate>,

    #[arg(long, value_parser = parse_cli_date)]
    end: Option<NaiveDate>,

    /// Ignore the selection saved by the last session
    #[arg(long)]
    fresh: bool,

    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_cli_date(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|err| err.to_string())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = storage::read_config();

    if let Some(path) = cli.log_file.clone().or_else(storage::default_log_path) {
        if let Err(err) = logging::init(&config.log_level, &config.log_format, &path) {
            eprintln!("{err}");
        }
    }

    let today = dates::today();
    let state_store = FileStateStore::in_home()?;
    let filter_sink = FileFilterSink::in_home()?;
    let saved = if cli.fresh { None } else { state_store.load() };
    let selector = initial_selector(&cli, &config, saved.as_ref(), today);
    let binding = cli.field.as_deref().and_then(FieldBinding::parse);
    info!(range = %selector.range(), ?binding, "starting");

    let mut app = App::new(selector, binding, config.theme, state_store, filter_sink, today);

    let mut stdout = std::io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(120))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key_event(key);
                }
            }
        }
    }

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    println!("{}", app.range());
    Ok(())
}

/// CLI dates, then a CLI preset, then the saved selection, then the configured
/// preset, then the last 7 days.
fn initial_selector(
    cli: &Cli,
    config: &Config,
    saved: Option<&PersistedSelection>,
    today: NaiveDate,
) -> RangeSelector {
    match (cli.start, cli.end) {
        (Some(start), Some(end)) => return RangeSelector::with_range(DateRange::between(start, end)),
        (None, None) => {}
        (start, end) => return RangeSelector::with_range(DateRange::unordered(start, end)),
    }

    let mut selector = RangeSelector::new(today);
    if let Some(key) = &cli.preset {
        selector.apply_preset(key, today);
        return selector;
    }
    if let Some(saved) = saved {
        return RangeSelector::with_range(saved.to_range());
    }
    if let Some(key) = &config.default_preset {
        selector.apply_preset(key, today);
    }
    selector
}
