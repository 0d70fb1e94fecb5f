use colored::*;
use reqwest::Client;
use std::error::Error;

use crate::state::fetch_state;

pub async fn run_processes(client: &Client, url: &str, color: bool) -> Result<(), Box<dyn Error>> {
    let state = fetch_state(client, url).await?;

    println!("{:<8} {:<16} {:<44} CMD", "PID", "COMM", "DESCRIPTION");

    if state.process_info.is_empty() {
        println!("{}", "(no watched processes running)".dimmed());
        return Ok(());
    }

    for p in state.process_info {
        let description = if color {
            p.description.cyan()
        } else {
            p.description.normal()
        };
        println!(
            "{:<8} {:<16} {:<44} {}",
            p.pid,
            truncate(&p.comm, 16),
            description,
            p.cmdline
        );
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).chain(['…']).collect()
    }
}
