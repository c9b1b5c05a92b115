//! Energy profile commands for inspecting productivity patterns.

use std::path::{Path, PathBuf};

use cadence_core::health::{self, HealthSnapshot};
use cadence_core::{EnergyProfile, EnergyProfileBuilder, EnergySample};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use super::{load_config, read_input, CommandResult};

#[derive(Args)]
pub struct HistoryArgs {
    /// History file (JSON array of samples)
    pub history: PathBuf,
    /// Build the profile as of this instant (RFC 3339, defaults to now)
    #[arg(long)]
    pub as_of: Option<String>,
    /// Read the file as health snapshots instead of energy samples
    #[arg(long)]
    pub health: bool,
}

#[derive(Subcommand)]
pub enum EnergyAction {
    /// Show the hourly energy curve
    Show(HistoryArgs),
    /// List peak hours, one per line
    Peaks(HistoryArgs),
    /// Score the latest health snapshot
    Health {
        /// Snapshot file (JSON array of health snapshots)
        snapshots: PathBuf,
    },
}

pub fn run(action: EnergyAction, config: Option<&Path>) -> CommandResult {
    match action {
        EnergyAction::Show(args) => {
            let profile = build_profile(&args, config)?;
            println!("{}", profile.render_ascii_chart());

            println!("Summary:");
            println!("  Samples analyzed: {}", profile.sample_count());
            println!("  Peak hours: {}", format_hours(profile.peak_hours()));
            println!();
            for line in profile.recommendations() {
                println!("  {line}");
            }
        }
        EnergyAction::Peaks(args) => {
            let profile = build_profile(&args, config)?;
            for hour in profile.peak_hours() {
                println!("{hour:02}:00");
            }
        }
        EnergyAction::Health { snapshots } => {
            let snapshots = read_snapshots(&read_input(&snapshots)?)?;
            let latest = snapshots
                .iter()
                .max_by_key(|s| s.timestamp)
                .ok_or("no health snapshots in file")?;
            println!(
                "Health score: {} ({})",
                health::overall_score(&latest.metrics),
                latest.timestamp.format("%Y-%m-%d %H:%M UTC")
            );
        }
    }
    Ok(())
}

fn build_profile(
    args: &HistoryArgs,
    config: Option<&Path>,
) -> Result<EnergyProfile, Box<dyn std::error::Error>> {
    let config = load_config(config)?;
    let as_of = match &args.as_of {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map_err(|e| format!("invalid --as-of '{s}': {e}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let input = read_input(&args.history)?;
    let samples: Vec<EnergySample> = if args.health {
        health::energy_samples(&read_snapshots(&input)?)
    } else {
        serde_json::from_str(&input)?
    };

    Ok(EnergyProfileBuilder::from_config(&config.energy).build(&samples, as_of))
}

fn read_snapshots(input: &str) -> Result<Vec<HealthSnapshot>, Box<dyn std::error::Error>> {
    let snapshots: Vec<HealthSnapshot> = serde_json::from_str(input)?;
    for snapshot in &snapshots {
        snapshot.metrics.validate()?;
    }
    Ok(snapshots)
}

fn format_hours(hours: &[u8]) -> String {
    if hours.is_empty() {
        return "none yet".to_string();
    }
    hours
        .iter()
        .map(|h| format!("{h:02}:00"))
        .collect::<Vec<_>>()
        .join(", ")
}
