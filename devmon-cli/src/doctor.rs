use colored::*;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;

use crate::state::fetch_state;

#[derive(Deserialize, Debug)]
struct HealthResponse {
    #[allow(dead_code)]
    status: String,
    version: String,
}

pub async fn run_doctor(url: &str) -> Result<(), Box<dyn Error>> {
    println!("{}", "devmon doctor".bold().cyan());
    println!("{}", "Checking the monitor daemon...".dimmed());
    println!();

    let client = Client::new();
    let mut all_good = true;

    // 1. Connectivity & health
    print!("• Daemon Connectivity: ");
    match client.get(format!("{}/healthz", url)).send().await {
        Ok(resp) => {
            if resp.status().is_success() {
                match resp.json::<HealthResponse>().await {
                    Ok(health) => println!("{}", format!("OK (v{})", health.version).green()),
                    Err(_) => println!("{}", "OK (Invalid JSON)".yellow()),
                }
            } else {
                println!("{}", format!("FAIL (Status {})", resp.status()).red());
                all_good = false;
            }
        }
        Err(e) => {
            println!("{}", format!("FAIL ({})", e).red());
            println!("  → Is devmond running with LAUNCH_DEV_ENV_MONITOR=true?");
            return Ok(());
        }
    }

    // 2. Snapshot
    print!("• Snapshot:            ");
    let state = match fetch_state(&client, url).await {
        Ok(state) => {
            println!("{}", "OK".green());
            state
        }
        Err(e) => {
            println!("{}", format!("FAIL ({})", e).red());
            return Ok(());
        }
    };

    // 3. Host metrics
    print!("• Host Metrics:        ");
    if state.memory_usage.total > 0.0 && state.disk_usage.total > 0.0 {
        println!("{}", "Available".green());
    } else {
        println!("{}", "PARTIAL (some collectors report zero)".yellow());
        all_good = false;
    }

    // 4. Watched processes
    print!("• Watched Processes:   ");
    if state.process_info.is_empty() {
        println!("{}", "None running".dimmed());
    } else {
        println!("{}", state.process_info.len().to_string().green());
    }

    // 5. Query capture
    print!("• Captured Queries:    ");
    let flagged = state.sql_queries.iter().filter(|q| q.warning).count();
    if state.sql_queries.is_empty() {
        println!("{}", "None yet (is the app instrumented?)".dimmed());
    } else if flagged > 0 {
        println!(
            "{}",
            format!("{} ({} flagged)", state.sql_queries.len(), flagged).yellow()
        );
    } else {
        println!("{}", state.sql_queries.len().to_string().green());
    }

    println!();
    if all_good {
        println!("{}", "✅ Monitor is healthy.".bold().green());
    } else {
        println!("{}", "⚠️  Monitor has issues. See above.".bold().yellow());
    }

    Ok(())
}
