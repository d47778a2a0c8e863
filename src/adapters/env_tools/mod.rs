//! Environment adapter
//!
//! Environment variable access and lookup of the external programs the
//! application drives.

use std::path::PathBuf;

use serde::Serialize;

use crate::adapters::toml_config::AppConfig;
use crate::domain::errors::DomainError;

/// Availability of one external program
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolStatus {
    /// Role the program plays (`ffmpeg`, `ffprobe`, `speech`)
    pub role: String,
    pub program: String,
    pub resolved: Option<PathBuf>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Environment adapter
pub struct EnvToolsAdapter;

impl EnvToolsAdapter {
    /// Get environment variable; unset or empty yields `None`
    pub fn get_env(key: &str) -> Result<Option<String>, DomainError> {
        match std::env::var(key) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(DomainError::Config(format!(
                "Failed to read environment variable {}: {}",
                key, e
            ))),
        }
    }

    /// Resolve a program name or path against `PATH`
    pub fn locate(program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn status(role: &str, program: &str) -> ToolStatus {
        ToolStatus {
            role: role.to_string(),
            program: program.to_string(),
            resolved: Self::locate(program),
        }
    }

    /// Check every program the configuration refers to
    pub fn check_tools(config: &AppConfig) -> Vec<ToolStatus> {
        let mut report = vec![
            Self::status("ffmpeg", &config.tools.ffmpeg),
            Self::status("ffprobe", &config.tools.ffprobe),
            Self::status("speech", &config.speech.program),
        ];
        if config.speech.voices_program != config.speech.program {
            report.push(Self::status("voices", &config.speech.voices_program));
        }
        report
    }

    /// Fail with `DependencyMissing` unless `program` can be found
    pub fn require(role: &str, program: &str) -> Result<PathBuf, DomainError> {
        Self::locate(program).ok_or_else(|| {
            DomainError::DependencyMissing(format!(
                "{} program '{}' was not found on PATH",
                role, program
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_program_is_missing() {
        let result = EnvToolsAdapter::require("ffmpeg", "audesc-definitely-not-installed");
        assert!(matches!(result, Err(DomainError::DependencyMissing(_))));
    }

    #[test]
    fn test_check_tools_reports_every_role() {
        let mut config = AppConfig::default();
        config.tools.ffmpeg = "audesc-missing-ffmpeg".to_string();
        config.speech.voices_program = "audesc-missing-voices".to_string();

        let report = EnvToolsAdapter::check_tools(&config);
        let roles: Vec<&str> = report.iter().map(|status| status.role.as_str()).collect();
        assert_eq!(roles, vec!["ffmpeg", "ffprobe", "speech", "voices"]);
        assert!(!report[0].is_available());
    }

    #[test]
    fn test_unset_env_is_none() {
        assert_eq!(EnvToolsAdapter::get_env("AUDESC_TEST_UNSET_VARIABLE").unwrap(), None);
    }
}
