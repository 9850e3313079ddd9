// main.rs - Headless Game of Life: async ticker, frames printed as text

use std::io;
use std::process::ExitCode;

use clap::Parser;
use conway::{LifeArgs, TextSink, cpu_scheduler, ticker};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "conway_coro", about = "Double-buffered Game of Life in the terminal")]
struct Cli {
    #[command(flatten)]
    life: LifeArgs,

    /// Stop after this many generations (runs until Ctrl-C otherwise)
    #[arg(long)]
    ticks: Option<u64>,

    /// Append frames instead of redrawing the screen
    #[arg(long)]
    no_clear: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> conway::Result<()> {
    let config = cli.life.resolve()?;
    info!(
        width = config.width,
        height = config.height,
        interval_ms = config.interval_ms,
        seed = ?config.seed_strategy,
        rule = %config.rule,
        "starting"
    );

    let sink = TextSink::new(io::stdout(), !cli.no_clear);
    let scheduler = cpu_scheduler(&config, sink)?;
    let handle = ticker::spawn(scheduler, config.interval(), cli.ticks);

    // Dropping the handle on Ctrl-C stops the ticker.
    tokio::select! {
        result = handle.join() => {
            let scheduler = result?;
            let population = scheduler
                .current_cells()?
                .iter()
                .filter(|&&c| c == conway::ALIVE)
                .count();
            info!(generations = scheduler.step(), population, "finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::new("warn,conway=info,conway_coro=info"),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
