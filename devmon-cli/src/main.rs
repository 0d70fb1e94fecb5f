use clap::{Parser, Subcommand};
use reqwest::Client;
use std::error::Error;

mod doctor;
mod processes;
mod queries;
mod state;

#[derive(clap::Parser, Debug)]
struct Args {
    /// Base URL of the devmond service
    #[clap(long, default_value = "http://127.0.0.1:4567")]
    url: String,

    /// Disable colorized output
    #[clap(long)]
    no_color: bool,

    /// Subcommands
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// One-line CPU, memory and disk summary
    Metrics,
    /// List watched development processes
    Processes,
    /// Show captured database queries
    Queries {
        /// Only show queries flagged as possible N+1
        #[clap(long)]
        warnings: bool,
    },
    /// Send a synthetic query event to the daemon
    Emit {
        /// SQL text of the query
        #[clap(long)]
        sql: String,
        /// Reported execution time
        #[clap(long, default_value_t = 1.0)]
        duration_ms: f64,
        /// Mark the query as served from cache
        #[clap(long)]
        cached: bool,
    },
    /// Check daemon health and connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let client = Client::new();
    let color = !args.no_color;
    if !color {
        colored::control::set_override(false);
    }

    match args.command.unwrap_or(Command::Metrics) {
        Command::Metrics => {
            let state = state::fetch_state(&client, &args.url).await?;
            state::print_metrics(&state);
        }
        Command::Processes => processes::run_processes(&client, &args.url, color).await?,
        Command::Queries { warnings } => {
            queries::run_queries(&client, &args.url, warnings, color).await?
        }
        Command::Emit {
            sql,
            duration_ms,
            cached,
        } => queries::run_emit(&client, &args.url, &sql, duration_ms, cached).await?,
        Command::Doctor => doctor::run_doctor(&args.url).await?,
    }
    Ok(())
}
