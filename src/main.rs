use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod aggregate;
mod chart;
mod controller;
mod domain;
mod inputter;
mod model;
mod store;
mod ui;

use controller::Controller;
use domain::{FVConfig, FVError};
use model::{Model, Status};
use ui::DashboardUI;

/// A tui based spreadsheet frequency dashboard.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Spreadsheet to load on startup (xlsx or csv).
    path: Option<String>,
}

fn main() -> ExitCode {
    let result = run();
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run() -> Result<(), FVError> {
    let cli = Cli::parse();
    init_tracing()?;

    let cfg = FVConfig {
        event_poll_time: 100,
    };
    let mut model = Model::init();
    // A bad path on the command line is a status message, not a crash.
    if let Some(path) = cli.path.as_deref() {
        model.open(path);
    }

    let ui = DashboardUI::new();
    let controller = Controller::new(&cfg);
    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message);
        }
    }

    Ok(())
}

// A tui cannot log to stdout. FV_LOG names a file receiving the trace
// output, filtered through RUST_LOG.
fn init_tracing() -> Result<(), FVError> {
    if let Ok(path) = std::env::var("FV_LOG") {
        let file = std::fs::File::create(path)?;
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            )
            .with(ErrorLayer::default())
            .init();
    }
    Ok(())
}
