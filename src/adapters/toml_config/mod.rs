// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::*;
use crate::utils::logging::LoggingConfig;

/// External media tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Command-line speech engine.
///
/// Argument templates accept `{voice}`, `{rate}`, `{wpm}`, `{output}` and
/// `{text}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub program: String,
    pub args: Vec<String>,
    pub voices_program: String,
    pub voices_args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            program: "espeak-ng".to_string(),
            args: ["-v", "{voice}", "-s", "{wpm}", "-w", "{output}", "{text}"]
                .iter()
                .map(|arg| arg.to_string())
                .collect(),
            voices_program: "espeak-ng".to_string(),
            voices_args: vec!["--voices".to_string()],
        }
    }
}

/// Encoder tuning; the codec pair itself is fixed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub preset: String,
    pub crf: u8,
    pub audio_bitrate: String,
    /// Encoder threads; 0 lets the tool decide
    pub threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            preset: "medium".to_string(),
            crf: 18,
            audio_bitrate: "192k".to_string(),
            threads: num_cpus::get(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tools: ToolsConfig,
    pub speech: SpeechConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.render.crf > 51 {
            return Err(DomainError::Config(format!(
                "CRF value {} is invalid (must be 0-51)",
                self.render.crf
            )));
        }
        if self.tools.ffmpeg.trim().is_empty() || self.tools.ffprobe.trim().is_empty() {
            return Err(DomainError::Config("Tool paths cannot be empty".to_string()));
        }
        if self.speech.program.trim().is_empty() {
            return Err(DomainError::Config("Speech program cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Default per-user config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("audesc").join("config.toml"))
    }

    /// First existing config file: explicit path, user config, then `./audesc.toml`
    pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        Self::default_config_path()
            .into_iter()
            .chain(std::iter::once(PathBuf::from("audesc.toml")))
            .find(|candidate| candidate.exists())
    }

    /// Load configuration from a TOML file
    pub fn load(file_path: &Path) -> Result<AppConfig, DomainError> {
        if !file_path.exists() {
            return Err(DomainError::Config(format!(
                "Config file does not exist: {}",
                file_path.display()
            )));
        }

        let content = std::fs::read_to_string(file_path)
            .map_err(|e| DomainError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<AppConfig, DomainError> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a TOML file
    pub fn save(file_path: &Path, config: &AppConfig) -> Result<(), DomainError> {
        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DomainError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| DomainError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(file_path, content)
            .map_err(|e| DomainError::Config(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }
}
