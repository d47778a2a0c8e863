//! Configuration initialization and hierarchy management

use anyhow::{Context, Result};
use tracing::debug;

use crate::adapters::env_tools::EnvToolsAdapter;
use crate::adapters::toml_config::{AppConfig, TomlConfigAdapter};
use crate::cli::Cli;
use crate::domain::errors::DomainError;
use crate::utils::logging::{LogFormat, LogLevel};

/// Environment variables recognized as configuration overrides
pub const ENV_OVERRIDES: &[&str] = &[
    "AUDESC_FFMPEG",
    "AUDESC_FFPROBE",
    "AUDESC_TTS_PROGRAM",
    "AUDESC_LOG_LEVEL",
    "AUDESC_LOG_FORMAT",
    "AUDESC_PRESET",
    "AUDESC_CRF",
];

/// Build the configuration following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration(cli: &Cli) -> Result<AppConfig> {
    let mut config = match TomlConfigAdapter::discover(cli.config.as_deref()) {
        Some(path) => TomlConfigAdapter::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };

    let mut env = Vec::new();
    for key in ENV_OVERRIDES {
        if let Some(value) = EnvToolsAdapter::get_env(key)? {
            env.push((*key, value));
        }
    }
    apply_environment_overrides(&mut config, &env)?;
    apply_cli_overrides(&mut config, cli);

    config.validate()?;
    Ok(config)
}

/// Apply `(variable, value)` pairs on top of the file configuration
pub fn apply_environment_overrides(
    config: &mut AppConfig,
    env: &[(&str, String)],
) -> Result<(), DomainError> {
    for (key, value) in env {
        debug!("Environment override: {} = {}", key, value);
        match *key {
            "AUDESC_FFMPEG" => config.tools.ffmpeg = value.clone(),
            "AUDESC_FFPROBE" => config.tools.ffprobe = value.clone(),
            "AUDESC_TTS_PROGRAM" => {
                // The listing command follows the engine unless configured apart
                if config.speech.voices_program == config.speech.program {
                    config.speech.voices_program = value.clone();
                }
                config.speech.program = value.clone();
            }
            "AUDESC_LOG_LEVEL" => {
                config.logging.level = LogLevel::parse(value).ok_or_else(|| {
                    DomainError::Config(format!("Invalid {}: {}", key, value))
                })?;
            }
            "AUDESC_LOG_FORMAT" => {
                config.logging.format = LogFormat::parse(value).ok_or_else(|| {
                    DomainError::Config(format!("Invalid {}: {}", key, value))
                })?;
            }
            "AUDESC_PRESET" => config.render.preset = value.clone(),
            "AUDESC_CRF" => {
                config.render.crf = value
                    .trim()
                    .parse()
                    .map_err(|_| DomainError::Config(format!("Invalid {}: {}", key, value)))?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
}
