use std::path::Path;

use cadence_core::EngineConfig;
use clap::Subcommand;

use super::{config_path, load_config, CommandResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "ranking.priority_weight", "schedule.work_start")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction, explicit: Option<&Path>) -> CommandResult {
    match action {
        ConfigAction::Get { key } => {
            let config = load_config(explicit)?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let path = config_path(explicit)?;
            let mut config = EngineConfig::load_from(&path)?;
            config.set(&key, &value)?;
            config.save_to(&path)?;
            tracing::info!(%key, %value, path = %path.display(), "config updated");
            println!("ok");
        }
        ConfigAction::List => {
            let config = load_config(explicit)?;
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            EngineConfig::default().save_to(&config_path(explicit)?)?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", config_path(explicit)?.display());
        }
    }
    Ok(())
}
