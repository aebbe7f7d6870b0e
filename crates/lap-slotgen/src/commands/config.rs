use crate::common::GlobalOpts;
use crate::errors::ConfigCommandError;
use clap::Subcommand;
use colored::Colorize;
use lap_config::Config;
use lap_logger as logger;
use lap_slots::{AllocationStrategy, CollisionPolicy, OutputFormat};
use std::str::FromStr;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set a configuration value
    Set { key: String, value: String },
    /// Get or set the path to the config file.
    /// If `new_path` is provided, future runs read the config from that file.
    /// If omitted, the CLI prints the current configuration file path.
    Path {
        /// Optional new config path to set
        new_path: Option<String>,
    },
}

pub fn handle_config(
    action: Option<ConfigAction>,
    opts: &GlobalOpts,
) -> Result<(), ConfigCommandError> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
            }
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            validate_setting(&key, &value)?;
            let mut config = Config::load()?;
            config.set(&key, value.clone());
            let path = config.save()?;
            logger::debug(&format!("Saved config to {}", path.display()));
            logger::success(&format!("Set {} = {}", key, value));
            Ok(())
        }
        ConfigAction::Path { new_path } => {
            let config_path = Config::path();
            logger::debug(&format!("Reading config from: {}", config_path.display()));

            match new_path {
                Some(p) => {
                    Config::write_pointer(&p)?;
                    logger::success(&format!("Config path set to {}", p));
                }
                None => {
                    println!("{}", config_path.display());
                    if let Some(target) = Config::read_pointer() {
                        println!("{} {}", "overridden-by".cyan(), target);
                    }
                }
            }
            Ok(())
        }
    }
}

/// Reject unknown keys and values the generator would not accept
pub fn validate_setting(key: &str, value: &str) -> Result<(), ConfigCommandError> {
    if !Config::is_known_key(key) {
        return Err(ConfigCommandError::UnknownKey {
            key: key.to_string(),
            supported: Config::KEYS.join(", "),
        });
    }

    let checked = match key {
        "strategy" => AllocationStrategy::from_str(value).map(|_| ()),
        "collision-policy" => CollisionPolicy::from_str(value).map(|_| ()),
        "format" => OutputFormat::from_str(value).map(|_| ()),
        _ if value.trim().is_empty() => Err("value must not be empty".to_string()),
        _ => Ok(()),
    };
    checked.map_err(|message| ConfigCommandError::InvalidValue {
        key: key.to_string(),
        message,
    })
}
