use std::process::ExitCode;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::info;

use peopledir::controller::Controller;
use peopledir::domain::{
    DEFAULT_MAX_PHOTO_BYTES, DEFAULT_PAGE_SIZE, DEFAULT_SEED_COUNT, DirConfig, DirError,
};
use peopledir::import::expand_path;
use peopledir::logging::init_logging;
use peopledir::model::{AppStatus, Model};
use peopledir::ui::DirUI;

/// Browse and maintain a directory of people in the terminal.
#[derive(Parser, Debug)]
#[command(name = "pd", version, about)]
struct Cli {
    /// Load people from a CSV, Parquet or Arrow file instead of generating them
    #[arg(long)]
    import: Option<String>,

    /// Number of generated people
    #[arg(long, default_value_t = DEFAULT_SEED_COUNT)]
    seed_count: usize,

    /// Seed for the generator, for reproducible data
    #[arg(long)]
    seed: Option<u64>,

    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = at_least_one)]
    page_size: usize,

    /// Start location, e.g. "/people?role=QA%20Engineer"
    #[arg(long, default_value = "/people")]
    location: String,

    /// Write logs to this file (RUST_LOG sets the filter)
    #[arg(long)]
    log_file: Option<String>,

    /// Largest accepted profile photo, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_PHOTO_BYTES)]
    max_photo_bytes: u64,

    /// Keyboard poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn at_least_one(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    fn into_config(self) -> Result<DirConfig, DirError> {
        let mut cfg = DirConfig::default()
            .with_seed_count(self.seed_count)
            .with_page_size(self.page_size)
            .with_location(self.location)
            .with_max_photo_bytes(self.max_photo_bytes)
            .with_event_poll_time(self.poll_ms);
        if let Some(seed) = self.seed {
            cfg = cfg.with_seed(seed);
        }
        if let Some(import) = self.import {
            cfg = cfg.with_import(expand_path(&import)?);
        }
        if let Some(log_file) = self.log_file {
            cfg = cfg.with_log_file(expand_path(&log_file)?);
        }
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cli: Cli) -> Result<(), DirError> {
    let cfg = cli.into_config()?;
    init_logging(cfg.log_file.as_deref())?;
    info!("Starting pd with {cfg:?}");

    let mut model = Model::init(&cfg)?;
    let ui = DirUI::new();
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut model, &ui, &controller, &mut terminal);
    ratatui::restore();
    info!("Exit pd");
    result
}

fn event_loop(
    model: &mut Model,
    ui: &DirUI,
    controller: &Controller,
    terminal: &mut DefaultTerminal,
) -> Result<(), DirError> {
    while model.status != AppStatus::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Always update, finished photo reads are picked up between key presses
        let message = controller.handle_event(model)?;
        model.update(message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "pd",
            "--seed",
            "7",
            "--page-size",
            "25",
            "--location",
            "/",
        ])
        .unwrap();
        let cfg = cli.into_config().unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.location, "/");
        assert_eq!(cfg.seed_count, DEFAULT_SEED_COUNT);
        assert!(cfg.import.is_none());
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(Cli::try_parse_from(["pd", "--page-size", "0"]).is_err());
    }
}
