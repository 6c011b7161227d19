//! Scripted location query runner.
//!
//! Run with: cargo run -p pinpoint-sim -- --status undetermined --grant-after 200 --fix-after 400

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use owo_colors::OwoColorize;
use pinpoint_location::testing::{ScriptedBackend, ScriptedSession};
use pinpoint_location::{
    Accuracy, AuthorizationStatus, Location, Locator, QueryConfig, QueryOptions,
};

#[derive(Parser)]
#[command(name = "pinpoint-sim")]
#[command(about = "Run one location query against a scripted provider", long_about = None)]
struct Cli {
    /// Authorization status reported when the query starts
    #[arg(long, default_value = "authorized", value_parser = parse_status)]
    status: AuthorizationStatus,
    /// Grant permission this many milliseconds after the query starts
    #[arg(long, value_name = "MS")]
    grant_after: Option<u64>,
    /// Deny permission this many milliseconds after the query starts
    #[arg(long, value_name = "MS")]
    deny_after: Option<u64>,
    /// Report a position this many milliseconds after the query starts
    #[arg(long, value_name = "MS")]
    fix_after: Option<u64>,
    /// Report a sensing failure this many milliseconds after the query starts
    #[arg(long, value_name = "MS")]
    fail_after: Option<u64>,
    /// Report an empty batch instead of a position
    #[arg(long)]
    empty_batch: bool,
    /// Latitude of the reported position
    #[arg(long, default_value_t = 37.3349, allow_negative_numbers = true)]
    latitude: f64,
    /// Longitude of the reported position
    #[arg(long, default_value_t = -122.009, allow_negative_numbers = true)]
    longitude: f64,
    /// Timeout in seconds, overriding the config file
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    timeout: Option<f64>,
    /// Accuracy hint, overriding the config file
    #[arg(long, value_parser = parse_accuracy)]
    accuracy: Option<Accuracy>,
    /// JSON file with query options
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_status(value: &str) -> Result<AuthorizationStatus, String> {
    serde_json::from_value(serde_json::Value::String(value.to_owned())).map_err(|e| e.to_string())
}

fn parse_accuracy(value: &str) -> Result<Accuracy, String> {
    serde_json::from_value(serde_json::Value::String(value.to_owned())).map_err(|e| e.to_string())
}

enum Step {
    Answer(AuthorizationStatus),
    Report(Vec<Location>),
    Fail,
}

impl Cli {
    fn options(&self) -> Result<QueryOptions> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                QueryConfig::from_json(&json).context("Parse config")?
            }
            None => QueryConfig::default(),
        };
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(accuracy) = self.accuracy {
            config.accuracy = accuracy;
        }
        Ok(QueryOptions::try_from(config)?)
    }

    fn script(&self) -> Vec<(Duration, Step)> {
        let position = if self.empty_batch {
            Vec::new()
        } else {
            let mut location = Location::new(self.latitude, self.longitude);
            location.horizontal_accuracy = Some(5.0);
            vec![location]
        };

        let mut steps = Vec::new();
        if let Some(ms) = self.grant_after {
            steps.push((ms, Step::Answer(AuthorizationStatus::Authorized)));
        }
        if let Some(ms) = self.deny_after {
            steps.push((ms, Step::Answer(AuthorizationStatus::Denied)));
        }
        if let Some(ms) = self.fix_after {
            steps.push((ms, Step::Report(position)));
        }
        if let Some(ms) = self.fail_after {
            steps.push((ms, Step::Fail));
        }
        steps.sort_by_key(|(ms, _)| *ms);
        steps
            .into_iter()
            .map(|(ms, step)| (Duration::from_millis(ms), step))
            .collect()
    }
}

fn play(session: &ScriptedSession, started: Instant, script: Vec<(Duration, Step)>) {
    for (at, step) in script {
        if let Some(wait) = at.checked_sub(started.elapsed()) {
            thread::sleep(wait);
        }
        match step {
            Step::Answer(status) => {
                info!("script: user answers {status}");
                session.answer(status);
            }
            Step::Report(locations) => {
                info!("script: reporting {} position(s)", locations.len());
                session.report(locations);
            }
            Step::Fail => {
                info!("script: reporting failure");
                session.fail("simulated sensing failure");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    let options = cli.options()?;

    println!("{}", "=== Pinpoint Scripted Query ===".bold());
    println!("Authorization: {}", cli.status);
    println!("Accuracy:      {:?}", options.accuracy);
    println!("Timeout:       {:?}\n", options.timeout);

    let backend = Arc::new(ScriptedBackend::new(cli.status));
    let locator = Locator::new(backend.clone()).context("Failed to start locator")?;
    let script = cli.script();
    let started = Instant::now();

    let locate = locator.locate(options);
    // The session exists as soon as the query is submitted, which happens on
    // the first poll; the script thread waits for it.
    let _player = {
        let backend = Arc::clone(&backend);
        thread::spawn(move || {
            let session = loop {
                if let Some(session) = backend.last_session() {
                    break session;
                }
                thread::sleep(Duration::from_millis(1));
            };
            play(&session, started, script);
        })
    };

    let outcome = locate.await;
    let elapsed = started.elapsed();

    match outcome {
        Ok(location) => {
            println!("{}", "✓ Location retrieved".green().bold());
            println!("  Latitude:  {:.6}°", location.latitude);
            println!("  Longitude: {:.6}°", location.longitude);
            if let Some(acc) = location.horizontal_accuracy {
                println!("  Accuracy:  {acc:.1}m");
            }
            println!("  Elapsed:   {elapsed:?}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("{} {err}", "✗ Query failed:".red().bold());
            println!("  Elapsed:   {elapsed:?}");
            Ok(ExitCode::FAILURE)
        }
    }
}
