use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

mod cli;
mod controller;
mod countries;
mod domain;
mod form;
mod inputter;
mod logging;
mod login;
mod model;
mod remote;
mod spell;
mod stopwatch;
mod table;
mod ui;
mod weather;

use cli::Cli;
use controller::Controller;
use domain::TwError;
use model::{Model, Status};
use remote::HttpSource;
use ui::WidgetUI;

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn run() -> Result<(), TwError> {
    let cli = Cli::parse();
    logging::init(cli.log_path()?.as_deref(), &cli.log_level)?;
    let cfg = cli.into_config()?;
    info!("Starting tw, polling every {}ms", cfg.event_poll_time);

    let source = Arc::new(HttpSource::new(&cfg)?);
    let mut model = Model::init(&cfg, source)?;
    let ui = WidgetUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    info!("Bye");
    Ok(())
}
