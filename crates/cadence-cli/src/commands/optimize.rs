//! `cadence optimize`: run the engine over a request document.

use std::io::Read;
use std::path::{Path, PathBuf};

use cadence_core::{OptimizationRequest, OptimizationResult, ScheduleOptimizer};
use clap::Args;

use super::{load_config, read_input, CommandResult};

#[derive(Args)]
pub struct OptimizeArgs {
    /// Request file (JSON), or "-" for stdin
    pub request: PathBuf,
    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: OptimizeArgs, config: Option<&Path>) -> CommandResult {
    let config = load_config(config)?;
    let input = if args.request.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        read_input(&args.request)?
    };

    let request = OptimizationRequest::from_json_with_defaults(&input, &config.schedule)?;
    let result = ScheduleOptimizer::new(config).optimize_request(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &OptimizationResult) {
    if result.schedule.is_empty() {
        println!("No tasks scheduled.");
    } else {
        println!("Schedule:");
        for entry in &result.schedule {
            println!(
                "  {} {}-{}  [P{}] {}",
                entry.start.format("%a %Y-%m-%d"),
                entry.start.format("%H:%M"),
                entry.end.format("%H:%M"),
                entry.priority,
                entry.title,
            );
        }
    }

    if !result.dropped.is_empty() {
        println!("\nNot scheduled:");
        for dropped in &result.dropped {
            println!("  {} ({})", dropped.title, dropped.reason.describe());
        }
    }

    println!("\nEfficiency score: {:.1}", result.efficiency_score);
    println!("  Energy alignment: {:.1}", result.factors.energy_alignment);
    println!("  Priority balance: {:.1}", result.factors.priority_balance);
    println!("  Time efficiency:  {:.1}", result.factors.time_efficiency);

    if !result.insights.is_empty() {
        println!("\nInsights:");
        for insight in &result.insights {
            println!("  - {insight}");
        }
    }
}
