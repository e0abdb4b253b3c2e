mod errors;
mod history;
mod rating;
mod results;
mod simulate;

use crate::errors::{Result, SpeedTestError};
use crate::history::HistoryStore;
use crate::rating::Rating;
use crate::results::RunResults;
use crate::simulate::{
    CancelToken, EngineConfig, IntervalTicker, NullProgress,
    ProgressCallback, ProgressEvent, RandomMetrics, RunOutcome, TestEngine,
    TestPhase,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use colored::{ColoredString, Colorize};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Version string assembled in build.rs; falls back to the bare package
/// version when the build script could not run git.
const LONG_VERSION: &str = match option_env!("SPEEDSIM_BUILD_LONG_VERSION") {
    Some(long_version) => long_version,
    None => env!("CARGO_PKG_VERSION"),
};

#[derive(Parser)]
#[command(author, version, long_version = LONG_VERSION)]
#[command(about = "Simulated internet speed test with ratings and history")]
struct Cli {
    /// Path to the history file (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    history_file: Option<PathBuf>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulated speed test
    Run {
        /// Seed the metrics generator for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// Milliseconds between bandwidth readings
        #[arg(long, default_value_t = 80)]
        interval_ms: u64,

        /// Do not append the result to history
        #[arg(long)]
        no_save: bool,

        /// Print the full results as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// Inspect or edit the stored test history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List stored tests, newest first
    List {
        /// Only show tests completed within the given window
        #[arg(long, value_enum)]
        since: Option<Window>,

        /// Print the matching records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the test at the given position (1 = newest)
    Delete {
        position: usize,
    },
    /// Remove all stored tests
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum Window {
    Week,
    Month,
    Year,
}

impl Window {
    fn cutoff(self) -> DateTime<Utc> {
        let now = Utc::now();
        match self {
            Window::Week => now - chrono::Duration::weeks(1),
            Window::Month => now - chrono::Duration::days(30),
            Window::Year => now - chrono::Duration::days(365),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbosity.log_level_filter())
        .init();

    if let Err(error) = run(cli).await {
        eprintln!("{}", errors::format_error_for_display(&error));
        std::process::exit(error.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = match cli.history_file {
        Some(path) => HistoryStore::new(path),
        None => HistoryStore::open_default()?,
    };
    debug!("history file: {}", store.path().display());

    match cli.command {
        Command::Run { seed, interval_ms, no_save, json } => {
            run_test(&store, seed, interval_ms, no_save, json).await
        }
        Command::History { command } => match command {
            HistoryCommand::List { since, json } => {
                list_history(&store, since, json)
            }
            HistoryCommand::Delete { position } => {
                delete_history(&store, position)
            }
            HistoryCommand::Clear => {
                store.clear()?;
                println!("History cleared.");
                Ok(())
            }
        },
    }
}

async fn run_test(
    store: &HistoryStore,
    seed: Option<u64>,
    interval_ms: u64,
    no_save: bool,
    json: bool,
) -> Result<()> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut source = RandomMetrics::new(rng);
    let mut ticker = IntervalTicker::new(Duration::from_millis(interval_ms));
    let engine = TestEngine::new(EngineConfig::default());

    let cancel = CancelToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let callback: Box<dyn ProgressCallback> = if json {
        Box::new(NullProgress)
    } else {
        Box::new(ConsoleProgress)
    };

    let outcome = engine
        .run(
            &mut source,
            &mut ticker,
            (!no_save).then_some(store),
            &cancel,
            callback.as_ref(),
        )
        .await?;

    match outcome {
        RunOutcome::Completed(results) => {
            if json {
                let rendered = serde_json::to_string_pretty(&*results)
                    .map_err(|e| {
                        SpeedTestError::run_failed(
                            "could not render results as JSON",
                        )
                        .with_source(e)
                    })?;
                println!("{rendered}");
            } else {
                print_results(&results, no_save);
            }
            Ok(())
        }
        // The progress callback already reported the cancelled status
        RunOutcome::Cancelled => Ok(()),
    }
}

fn list_history(
    store: &HistoryStore,
    since: Option<Window>,
    json: bool,
) -> Result<()> {
    let mut records = store.filter(since.map(Window::cutoff))?;
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    if json {
        let rendered = serde_json::to_string_pretty(&records).map_err(|e| {
            SpeedTestError::storage("could not render history as JSON")
                .with_source(e)
        })?;
        println!("{rendered}");
        return Ok(());
    }

    if records.is_empty() {
        println!("No test history.");
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        println!(
            "{:>3}. {}  [{}]  {:>6.1} Mbps down  {:>6.1} Mbps up  {:>5.1} ms ping  {} via {}",
            i + 1,
            record.timestamp.format("%Y-%m-%d %H:%M"),
            rating_label(record.rating),
            record.download_speed,
            record.upload_speed,
            record.ping_value,
            record.connection_type,
            record.server_location,
        );
    }

    if store.is_near_capacity()? {
        println!();
        println!(
            "{}",
            "Your history list is getting full. Consider deleting old tests."
                .yellow()
        );
    }

    Ok(())
}

fn delete_history(store: &HistoryStore, position: usize) -> Result<()> {
    let records = store.all()?;
    if position == 0 || position > records.len() {
        return Err(SpeedTestError::invalid_index(position, records.len()));
    }

    // Displayed positions count from the newest record backwards; sort the
    // stored indices the same way the listing sorts records, since the
    // stored blob itself is not guaranteed to be chronological.
    let mut indices: Vec<usize> = (0..records.len()).collect();
    indices.sort_by(|&a, &b| records[b].timestamp.cmp(&records[a].timestamp));

    let removed = store.delete_at(indices[position - 1])?;
    println!(
        "Deleted test from {} ({:.1} Mbps down, rated {}).",
        removed.timestamp.format("%Y-%m-%d %H:%M"),
        removed.download_speed,
        removed.rating.label(),
    );
    Ok(())
}

/// Renders progress events as live terminal output.
struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::PhaseChange(phase) => match phase {
                TestPhase::Idle => {}
                TestPhase::Complete => {
                    println!("{}", phase.status_text().bold().green())
                }
                TestPhase::Failed => {
                    println!("{}", phase.status_text().bold().red())
                }
                TestPhase::Cancelled => {
                    // End any in-progress reading line first
                    println!();
                    println!("{}", phase.status_text().bold().yellow());
                }
                _ => println!("{}", phase.status_text().bold().white()),
            },
            ProgressEvent::Reading { mbps, progress, .. } => {
                print!("\r  {:>6.1} Mbps  {:>3.0}%", mbps, progress * 100.0);
                let _ = std::io::stdout().flush();
            }
            ProgressEvent::PhaseComplete(phase) => {
                if matches!(phase, TestPhase::Download | TestPhase::Upload) {
                    println!();
                }
            }
            ProgressEvent::LatencySample { ping_ms, jitter_ms } => {
                println!("  ping {ping_ms:.1} ms, jitter {jitter_ms:.1} ms");
            }
            ProgressEvent::RunComplete => {}
            ProgressEvent::Error(message) => {
                eprintln!();
                eprintln!("{}", message.red());
            }
        }
    }
}

fn rating_label(rating: Rating) -> ColoredString {
    let label = rating.label();
    match rating {
        Rating::APlus | Rating::A => label.bright_green().bold(),
        Rating::BPlus => label.yellow().bold(),
        Rating::B => label.red().bold(),
    }
}

fn print_results(results: &RunResults, no_save: bool) {
    let record = &results.record;
    let assessment = &results.assessment;
    let advanced = &results.advanced;

    println!();
    println!(
        "{} {}",
        "Server Location:".bold().white(),
        record.server_location.bright_blue()
    );
    println!(
        "{} {}",
        "Connection Type:".bold().white(),
        record.connection_type.bright_blue()
    );
    println!(
        "{} {}",
        "Download speed:".bold().white(),
        format!("{:.1} Mbps", record.download_speed).bright_cyan()
    );
    println!(
        "{} {}",
        "Upload speed:".bold().white(),
        format!("{:.1} Mbps", record.upload_speed).bright_cyan()
    );
    println!("{} {:.1} ms", "Ping:".bold().white(), record.ping_value);
    println!("{} {:.1} ms", "Jitter:".bold().white(), record.jitter_value);
    println!(
        "{} {:.2}%",
        "Packet loss:".bold().white(),
        advanced.packet_loss_pct
    );
    println!(
        "{} {}",
        "Latency stability:".bold().white(),
        advanced.latency_stability
    );
    println!(
        "{} {:.1} ms",
        "DNS response:".bold().white(),
        advanced.dns_response_ms
    );

    println!();
    println!(
        "{} {}",
        "Rating:".bold().white(),
        rating_label(assessment.rating)
    );
    println!(
        "Your connection is {} and {}.",
        assessment.rating.description(),
        assessment.comparison_text()
    );

    if !assessment.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations:".bold().white());
        for tip in &assessment.recommendations {
            println!("  - {tip}");
        }
    }

    if no_save {
        println!();
        println!("{}", "Result not saved to history.".yellow());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::results::TestRecord;
    use chrono::Duration as TimeDelta;
    use clap::CommandFactory;
    use tempfile::TempDir;

    fn record_at(timestamp: DateTime<Utc>, download: f64) -> TestRecord {
        TestRecord {
            timestamp,
            download_speed: download,
            upload_speed: download * 0.5,
            ping_value: 12.0,
            jitter_value: 1.5,
            rating: Rating::A,
            connection_type: "Fiber Optic".to_string(),
            server_location: "Lunar Data Center".to_string(),
        }
    }

    #[test]
    fn test_cli_declaration_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_long_version_contains_package_version() {
        let command = Cli::command();
        let long_version = command.get_long_version().unwrap();
        assert!(long_version.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_delete_position_follows_displayed_order() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let now = Utc::now();

        // Stored out of chronological order: the newest record first
        store.append(&record_at(now, 90.0)).unwrap();
        store.append(&record_at(now - TimeDelta::days(3), 20.0)).unwrap();

        // Position 1 is the newest record in the displayed order
        delete_history(&store, 1).unwrap();

        let remaining = store.all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].download_speed, 20.0);
    }

    #[test]
    fn test_delete_position_maps_across_many_records() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        let now = Utc::now();

        // Shuffled ages: 2 days, 4 days, 1 day, 3 days
        for (days, download) in [(2, 40.0), (4, 20.0), (1, 80.0), (3, 30.0)] {
            store
                .append(&record_at(now - TimeDelta::days(days), download))
                .unwrap();
        }

        // Position 3 is the third-newest record, aged 3 days (30 Mbps)
        delete_history(&store, 3).unwrap();

        let remaining = store.all().unwrap();
        assert_eq!(remaining.len(), 3);
        assert!(remaining.iter().all(|r| r.download_speed != 30.0));
    }

    #[test]
    fn test_delete_position_out_of_range_errors() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"));
        store.append(&record_at(Utc::now(), 30.0)).unwrap();

        let err = delete_history(&store, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidIndex);
        let err = delete_history(&store, 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidIndex);
        assert_eq!(store.len().unwrap(), 1);
    }
}
