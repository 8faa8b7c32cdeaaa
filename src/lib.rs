pub mod clock;
pub mod db;
pub mod error;
pub mod fare;
pub mod history;
pub mod presenter;
pub mod settings;
pub mod trip;
mod utils;

use std::{fs::OpenOptions, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::io::{self, AsyncBufReadExt, BufReader};

use clock::SystemClock;
use db::Database;
use presenter::{Notice, Presenter, TerminalPresenter};
use settings::SettingsStore;
use trip::{
    commands::{dispatch, Command, Flow},
    DisplayTicker, TripController,
};

const DEFAULT_DATA_DIR: &str = ".taximeter";

fn data_dir() -> PathBuf {
    std::env::var_os("TAXIMETER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Logs go to `<data dir>/taximeter.log` so they do not interleave with the
/// live display; stderr is used when the file cannot be opened.
fn init_logging(data_dir: &std::path::Path) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log::LevelFilter::Info);

    let log_path = data_dir.join("taximeter.log");
    let file = std::fs::create_dir_all(data_dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&log_path));
    match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
            builder.init();
        }
        Err(err) => {
            builder.init();
            warn!("Cannot open {}: {err}; logging to stderr", log_path.display());
        }
    }
}

pub async fn run() -> Result<()> {
    let data_dir = data_dir();
    init_logging(&data_dir);

    info!("Taximeter starting up...");

    let settings_store = SettingsStore::load(data_dir.join("settings.json"))
        .context("failed to load settings")?;
    settings_store.write_defaults_if_missing()?;
    let settings = settings_store.settings().clone();
    info!("Fare rates in effect: {:?}", settings.rates);

    let database = Database::new(data_dir.join("history.sqlite3"))?;

    let controller = TripController::new(
        settings.rates,
        Arc::new(SystemClock),
        Arc::new(database.clone()),
    )
    .with_distance_preview(settings.distance_preview);

    let presenter: Arc<dyn Presenter> = Arc::new(TerminalPresenter::new(settings.language));
    presenter.present_notice(&Notice::Welcome);
    presenter.present_notice(&Notice::Help);

    let ticker = settings
        .display_refresh
        .then(|| DisplayTicker::new(controller.clone(), presenter.clone()).spawn());

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let command = Command::parse(&line);
        if dispatch(&controller, presenter.as_ref(), command).await == Flow::Exit {
            break;
        }
    }

    if let Some(ticker) = ticker {
        ticker.stop().await?;
    }

    info!("Taximeter shutting down");
    Ok(())
}
