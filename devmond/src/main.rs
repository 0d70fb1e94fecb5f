use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use devmond::Config;

#[derive(Parser, Debug)]
#[command(version, about = "Pushes host metrics and captured queries to live dashboards")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // nothing, not even the config file, is touched unless launch is requested
    if !devmond::launch_allowed() {
        return Ok(());
    }
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    devmond::logging::init(&config.logging);

    devmond::serve(config).await
}
