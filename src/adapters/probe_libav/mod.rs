// Probe LibAV adapter - In-process media analysis through ffmpeg-next

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ffmpeg_next::media::Type;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// LibAV-based media probing adapter
pub struct ProbeLibavAdapter;

struct StreamSummary {
    duration: Option<f64>,
    audio_duration: Option<f64>,
    has_video: bool,
    has_audio: bool,
}

impl ProbeLibavAdapter {
    /// Create new LibAV probing adapter
    pub fn new() -> Result<Self, DomainError> {
        ffmpeg_next::init().map_err(|e| {
            DomainError::DependencyMissing(format!("Failed to initialize FFmpeg: {}", e))
        })?;
        Ok(Self)
    }

    /// Open the container and summarize it; the input context is closed on return
    fn summarize(path: &Path) -> Result<StreamSummary, DomainError> {
        if !path.exists() {
            return Err(DomainError::FileNotFound(path.display().to_string()));
        }

        let input_ctx = ffmpeg_next::format::input(&path)
            .map_err(|e| DomainError::Probe(format!("{}: {}", path.display(), e)))?;

        let container_duration = if input_ctx.duration() > 0 {
            Some(input_ctx.duration() as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64)
        } else {
            None
        };

        let stream_seconds = |kind: Type| {
            input_ctx
                .streams()
                .filter(|stream| stream.parameters().medium() == kind)
                .filter(|stream| stream.duration() > 0)
                .map(|stream| stream.duration() as f64 * f64::from(stream.time_base()))
                .reduce(f64::max)
        };

        let summary = StreamSummary {
            duration: container_duration.or_else(|| stream_seconds(Type::Video)),
            audio_duration: container_duration.or_else(|| stream_seconds(Type::Audio)),
            has_video: input_ctx.streams().best(Type::Video).is_some(),
            has_audio: input_ctx.streams().best(Type::Audio).is_some(),
        };

        debug!(
            "libav probe {}: duration={:?} video={} audio={}",
            path.display(),
            summary.duration,
            summary.has_video,
            summary.has_audio
        );
        Ok(summary)
    }

    async fn summarize_blocking(path: &Path) -> Result<StreamSummary, DomainError> {
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::summarize(&owned))
            .await
            .map_err(|e| DomainError::Probe(format!("Probe task failed: {}", e)))?
    }
}

#[async_trait]
impl ProbePort for ProbeLibavAdapter {
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
        let summary = Self::summarize_blocking(file_path).await?;

        if !summary.has_video {
            return Err(DomainError::Probe(format!(
                "No video stream found in {}",
                file_path.display()
            )));
        }

        let duration = summary.duration.ok_or_else(|| {
            DomainError::Probe(format!(
                "Could not determine the duration of {}",
                file_path.display()
            ))
        })?;

        Ok(MediaInfo {
            path: file_path.to_path_buf(),
            duration,
            has_video: summary.has_video,
            has_audio: summary.has_audio,
        })
    }

    async fn probe_audio_duration(&self, file_path: &Path) -> Result<f64, DomainError> {
        let summary = Self::summarize_blocking(file_path).await?;

        if !summary.has_audio {
            return Err(DomainError::Probe(format!(
                "No audio stream found in {}",
                file_path.display()
            )));
        }

        summary.audio_duration.ok_or_else(|| {
            DomainError::Probe(format!(
                "Could not determine the duration of {}",
                file_path.display()
            ))
        })
    }
}
