use std::env;
use std::io::{self, BufRead};
use std::process;

use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use vending_engine::cli::session;
use vending_engine::csv::read_catalog;
use vending_engine::{Inventory, Machine};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let inventory = match env::args().nth(1) {
        Some(path) => {
            if !path.ends_with(".csv") {
                warn!(path, "catalog file seems to not be a csv file");
            }
            match read_catalog(&path) {
                Ok(inventory) => inventory,
                Err(e) => {
                    error!(path, "{e}");
                    process::exit(1);
                }
            }
        }
        None => Inventory::default(),
    };

    let mut machine = Machine::new(inventory);
    let (line_sender, line_receiver) = tokio::sync::mpsc::channel(16);

    // stdin is read on a blocking thread, lines are fed to the machine in order
    tokio::task::spawn_blocking(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if line_sender.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("failed to read input: {e}");
                    break;
                }
            }
        }
    });

    let mut stdout = io::stdout();
    if let Err(e) = session(&mut machine, ReceiverStream::new(line_receiver), &mut stdout).await {
        error!("failed to write output: {e}");
        process::exit(1);
    }
}
