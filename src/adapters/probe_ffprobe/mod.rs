//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe` as a child process and reads its JSON report.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    program: String,
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter using the given executable
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, file_path: &Path) -> Result<ProbeReport, DomainError> {
        if !file_path.exists() {
            return Err(DomainError::FileNotFound(file_path.display().to_string()));
        }

        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration:stream=codec_type,duration",
                "-of",
                "json",
            ])
            .arg(file_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DomainError::DependencyMissing(format!(
                    "'{}' was not found; install FFmpeg or set tools.ffprobe",
                    self.program
                )),
                _ => DomainError::Probe(format!("Failed to run {}: {}", self.program, e)),
            })?;

        if !output.status.success() {
            return Err(DomainError::Probe(format!(
                "{}: {}",
                file_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("ffprobe report for {}: {}", file_path.display(), stdout.trim());
        parse_report(&stdout)
            .map_err(|e| DomainError::Probe(format!("{}: {}", file_path.display(), e)))
    }
}

fn parse_report(json: &str) -> Result<ProbeReport, String> {
    serde_json::from_str(json).map_err(|e| format!("unreadable ffprobe output: {}", e))
}

fn parse_seconds(value: &Option<String>) -> Option<f64> {
    value
        .as_deref()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

fn has_stream(report: &ProbeReport, kind: &str) -> bool {
    report
        .streams
        .iter()
        .any(|stream| stream.codec_type.as_deref() == Some(kind))
}

/// Container duration, falling back to the longest stream of `kind`
fn report_duration(report: &ProbeReport, kind: &str) -> Option<f64> {
    report
        .format
        .as_ref()
        .and_then(|format| parse_seconds(&format.duration))
        .or_else(|| {
            report
                .streams
                .iter()
                .filter(|stream| stream.codec_type.as_deref() == Some(kind))
                .filter_map(|stream| parse_seconds(&stream.duration))
                .reduce(f64::max)
        })
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
        let report = self.run(file_path).await?;

        let has_video = has_stream(&report, "video");
        if !has_video {
            return Err(DomainError::Probe(format!(
                "No video stream found in {}",
                file_path.display()
            )));
        }

        let duration = report_duration(&report, "video").ok_or_else(|| {
            DomainError::Probe(format!(
                "Could not determine the duration of {}",
                file_path.display()
            ))
        })?;

        Ok(MediaInfo {
            path: file_path.to_path_buf(),
            duration,
            has_video,
            has_audio: has_stream(&report, "audio"),
        })
    }

    async fn probe_audio_duration(&self, file_path: &Path) -> Result<f64, DomainError> {
        let report = self.run(file_path).await?;

        if !has_stream(&report, "audio") {
            return Err(DomainError::Probe(format!(
                "No audio stream found in {}",
                file_path.display()
            )));
        }

        report_duration(&report, "audio").ok_or_else(|| {
            DomainError::Probe(format!(
                "Could not determine the duration of {}",
                file_path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_report() {
        let report = parse_report(
            r#"{
                "programs": [],
                "streams": [
                    {"codec_type": "video", "duration": "120.040000"},
                    {"codec_type": "audio", "duration": "119.980000"}
                ],
                "format": {"duration": "120.064000"}
            }"#,
        )
        .unwrap();

        assert!(has_stream(&report, "video"));
        assert!(has_stream(&report, "audio"));
        assert_eq!(report_duration(&report, "video"), Some(120.064));
    }

    #[test]
    fn test_duration_falls_back_to_streams() {
        let report = parse_report(
            r#"{"streams": [{"codec_type": "audio", "duration": "3.5"}, {"codec_type": "audio", "duration": "N/A"}], "format": {}}"#,
        )
        .unwrap();

        assert_eq!(report_duration(&report, "audio"), Some(3.5));
    }

    #[test]
    fn test_garbage_output_is_error() {
        assert!(parse_report("not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let adapter = FFprobeAdapter::new("ffprobe");
        let result = adapter
            .probe_audio_duration(Path::new("/nonexistent/clip.wav"))
            .await;
        assert!(matches!(result, Err(DomainError::FileNotFound(_))));
    }
}
