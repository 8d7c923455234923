//! Binary entry point: parse flags, bind the transport, then run either the
//! terminal UI or a single batch command.
use std::io;

use anyhow::{Context, Result};
use bookshelf::cli::Cli;
use bookshelf::{logging, run_app, select, App, CatalogClient};
use clap::Parser;
use tracing::info;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.is_tui() {
        logging::init_file(&cli.log_path()?)?;
    } else {
        logging::init_stderr()?;
    }

    let config = cli.transport_config()?;
    let transport = select(&config).context("could not reach the catalog")?;
    let client = CatalogClient::new(transport);

    match &cli.command {
        Some(command) if !cli.is_tui() => {
            let stdout = io::stdout();
            command.execute(&client, &mut stdout.lock())
        }
        _ => {
            info!(transport = %client.transport_kind(), "starting terminal UI");
            let mut app = App::new(client);
            app.load();
            run_app(&mut app)
        }
    }
}
