//! capataz CLI; operator interface to the validation robot.

use anyhow::Context;
use capataz::config::Config;
use capataz::engine::Runner;
use capataz::model::RunSummary;
use capataz::report::ConsoleReporter;
use capataz::telemetry::init_telemetry;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "capataz",
    about = "Unattended validation of pending worker time entries"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a full validation run
    Run {
        /// Prior months to review in addition to the current one
        #[arg(long)]
        months_back: Option<u32>,
        /// Print the run summary as JSON (for the surrounding system)
        #[arg(long)]
        json: bool,
    },
    /// Discovery only: list pending days without validating anything
    Discover {
        /// Prior months to review in addition to the current one
        #[arg(long)]
        months_back: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_telemetry(&config.log_level)?;

    match cli.command {
        Command::Run { months_back, json } => cmd_run(config, months_back, json).await,
        Command::Discover { months_back } => cmd_discover(config, months_back).await,
    }
}

async fn cmd_run(config: Config, months_back: Option<u32>, json: bool) -> anyhow::Result<()> {
    let months_back = months_back.unwrap_or(config.months_back).max(1);
    let runner = Runner::new(&config.portal_url, config.browser.clone());
    let reporter = ConsoleReporter;

    let summary = runner
        .run(&config.credentials, months_back, &reporter)
        .await
        .context("validation run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

async fn cmd_discover(config: Config, months_back: Option<u32>) -> anyhow::Result<()> {
    let months_back = months_back.unwrap_or(config.months_back).max(1);
    let runner = Runner::new(&config.portal_url, config.browser.clone());
    let reporter = ConsoleReporter;

    let dates = runner
        .discover(&config.credentials, months_back, &reporter)
        .await
        .context("discovery failed")?;

    if dates.is_empty() {
        println!("No pending days.");
        return Ok(());
    }

    println!("{} pending day(s):", dates.len());
    for date in &dates {
        println!("  {date}");
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Validated: {} worker entries", summary.total_validated);
    for day in &summary.days {
        println!(
            "  {}  {:>3} validated  {}",
            day.date,
            day.workers_validated,
            day.obras.join(", ")
        );
    }
    println!("Months reviewed:");
    for month in &summary.months_reviewed {
        println!(
            "  {}  {}",
            month.month,
            if month.pending_found {
                "pending found"
            } else {
                "clean"
            }
        );
    }
    if !summary.errors.is_empty() {
        println!("Errors:");
        for error in &summary.errors {
            println!("  {error}");
        }
    }
}
