//! `config` subcommands: inspect and edit `config.ini`.

use clap::Subcommand;
use texstack::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name as section.key (e.g. convert.mip_filter)
        key: String,
    },

    /// Change one setting and save the file
    Set {
        /// Setting name as section.key (e.g. export.quality)
        key: String,

        /// New value; an empty string clears optional settings
        value: String,
    },

    /// Print every setting grouped by section
    List,

    /// Print where the configuration file lives
    Path,
}

/// Run a config subcommand against the loaded configuration.
pub fn run(command: ConfigCommands, config: ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let value = parse_key(&key)?.get(&config);
            println!("{}", if value.is_empty() { "(not set)" } else { &value });
            Ok(())
        }
        ConfigCommands::Set { key, value } => set(&key, &value, config),
        ConfigCommands::List => {
            list(&config);
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown key '{}'. Run 'texstack config list' for the available keys.",
            key
        ))
    })
}

fn set(key: &str, value: &str, mut config: ConfigFile) -> Result<(), CliError> {
    let key = parse_key(key)?;
    key.set(&mut config, value)?;
    config.save()?;
    println!("{} = {}", key, key.get(&config));
    Ok(())
}

fn list(config: &ConfigFile) {
    println!("Settings ({})", config_file_path().display());

    let mut section = "";
    for key in ConfigKey::all() {
        if key.section() != section {
            section = key.section();
            println!();
            println!("[{}]", section);
        }
        let value = key.get(config);
        if value.is_empty() {
            println!("  {} = (not set)", key.key_name());
        } else {
            println!("  {} = {}", key.key_name(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_accepts_section_names() {
        assert_eq!(parse_key("export.quality").unwrap(), ConfigKey::ExportQuality);
        assert_eq!(
            parse_key("Convert.Mip_Filter").unwrap(),
            ConfigKey::ConvertMipFilter
        );
    }

    #[test]
    fn test_parse_key_unknown_is_config_error() {
        let err = parse_key("convert.nope").unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), 0xFF);
    }
}
