// Render interactor - Orchestrates the timeline composition use case

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::domain::usecases::*;
use crate::ports::*;

/// Interactor for full renders and previews
pub struct RenderInteractor {
    probe_port: Arc<dyn ProbePort>,
    render_port: Arc<dyn RenderPort>,
}

impl RenderInteractor {
    /// Create new render interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>, render_port: Arc<dyn RenderPort>) -> Self {
        Self {
            probe_port,
            render_port,
        }
    }

    /// Render `items` over the requested window of the video
    pub async fn execute(
        &self,
        items: Vec<AudioDescriptionItem>,
        request: RenderRequest,
        progress: &dyn ProgressSink,
    ) -> Result<RenderReport, DomainError> {
        let started = Instant::now();
        self.preflight(&items, &request)?;

        info!(
            "Rendering {} over {}",
            request.video_path.display(),
            match request.scope {
                RenderScope::Full => "the full video".to_string(),
                RenderScope::Preview { start, end } => format!(
                    "{} - {}",
                    TimeSpec::from_seconds(start),
                    TimeSpec::from_seconds(end)
                ),
            }
        );

        let media = self.probe_port.probe_media(&request.video_path).await?;
        let window = Self::resolve_window(request.scope, media.duration)?;
        debug!(
            "Video duration {:.3}s, original audio: {}",
            media.duration, media.has_audio
        );

        let mut warnings = Vec::new();
        let pending = items.iter().filter(|item| item.is_pending()).count();
        if pending > 0 {
            warnings.push(format!(
                "{} description(s) have text but no audio yet; run synthesis to include them",
                pending
            ));
        }

        let (sources, skipped) = self.collect_sources(&items, &window).await;
        let plan = TimelineCompositor::plan(window, &sources, request.gains, media.has_audio, skipped);

        for skip in plan.degenerate_items() {
            let item = &items[skip.item_index];
            warn!(
                "Skipping description #{} at {}: {}",
                skip.item_index + 1,
                item.time(),
                skip.reason
            );
            if !item.is_pending() {
                warnings.push(format!(
                    "Description #{} at {} skipped: {}",
                    skip.item_index + 1,
                    item.time(),
                    skip.reason
                ));
            }
        }
        if plan.is_silent() {
            warnings.push("The output has no audio track: the video has no sound and no description clip applies".to_string());
        }
        for warning in &warnings {
            progress.warning(warning.clone());
        }

        debug!(
            "Plan: {} clips placed, {} skipped",
            plan.clips.len(),
            plan.skipped.len()
        );
        for clip in &plan.clips {
            debug!(
                "  #{} {} trim={:.3} start={:.3} duration={:.3}",
                clip.item_index + 1,
                clip.path.display(),
                clip.trim_offset,
                clip.start,
                clip.duration
            );
        }

        self.render_port
            .render(&request.video_path, &plan, &request.output_path, progress)
            .await?;

        let processing_time = started.elapsed();
        info!(
            "Render finished in {:.1}s: {}",
            processing_time.as_secs_f64(),
            request.output_path.display()
        );

        Ok(RenderReport {
            output_path: request.output_path,
            window: plan.window,
            clips_placed: plan.clips.len(),
            has_audio: !plan.is_silent(),
            skipped: plan.skipped,
            warnings,
            processing_time,
        })
    }

    fn preflight(&self, items: &[AudioDescriptionItem], request: &RenderRequest) -> Result<(), DomainError> {
        if items.is_empty() {
            return Err(DomainError::BadArgs(
                "The project has no descriptions; add at least one before rendering".to_string(),
            ));
        }
        if !request.video_path.exists() {
            return Err(DomainError::FileNotFound(request.video_path.display().to_string()));
        }
        if same_file(&request.video_path, &request.output_path) {
            return Err(DomainError::BadArgs(
                "The output file cannot be the source video".to_string(),
            ));
        }
        if request.output_path.exists() && !request.overwrite {
            return Err(DomainError::BadArgs(format!(
                "Output file already exists: {} (use --overwrite to replace it)",
                request.output_path.display()
            )));
        }
        Ok(())
    }

    /// Window for the scope; a preview end past the video is clamped to its end
    pub fn resolve_window(scope: RenderScope, video_duration: f64) -> Result<RenderWindow, DomainError> {
        match scope {
            RenderScope::Full => RenderWindow::full(video_duration),
            RenderScope::Preview { start, end } => {
                if start >= video_duration {
                    return Err(DomainError::BadArgs(format!(
                        "Preview start {} is past the end of the video ({})",
                        TimeSpec::from_seconds(start),
                        TimeSpec::from_seconds(video_duration)
                    )));
                }
                RenderWindow::new(start, end.min(video_duration))
            }
        }
    }

    /// Probe the clips that can matter for the window; unusable items are
    /// returned as skips instead of failing the pass.
    async fn collect_sources(
        &self,
        items: &[AudioDescriptionItem],
        window: &RenderWindow,
    ) -> (Vec<ClipSource>, Vec<SkippedItem>) {
        let mut sources = Vec::new();
        let mut skipped = Vec::new();

        for (item_index, item) in items.iter().enumerate() {
            if item.time_seconds >= window.end {
                skipped.push(SkippedItem {
                    item_index,
                    reason: SkipReason::OutsideWindow,
                });
                continue;
            }
            if !item.has_audio() {
                skipped.push(SkippedItem {
                    item_index,
                    reason: SkipReason::NoAudio,
                });
                continue;
            }

            let path = PathBuf::from(&item.audio_path);
            if !path.exists() {
                skipped.push(SkippedItem {
                    item_index,
                    reason: SkipReason::MissingFile,
                });
                continue;
            }

            match self.probe_port.probe_audio_duration(&path).await {
                Ok(duration) if duration > 0.0 => sources.push(ClipSource {
                    item_index,
                    time_seconds: item.time_seconds,
                    path,
                    duration,
                }),
                Ok(_) => skipped.push(SkippedItem {
                    item_index,
                    reason: SkipReason::Unreadable("clip is empty".to_string()),
                }),
                Err(e) => skipped.push(SkippedItem {
                    item_index,
                    reason: SkipReason::Unreadable(e.to_string()),
                }),
            }
        }

        (sources, skipped)
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
