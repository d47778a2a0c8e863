// Domain rules - Timeline arithmetic and item policies

use std::path::Path;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Placement rules for description clips on a render window
pub struct TimelineCompositor;

impl TimelineCompositor {
    /// Place the given clips on the window-relative timeline.
    ///
    /// `sources` must be sorted by `time_seconds`. Items already known to be
    /// unusable are passed in `skipped` and carried into the plan untouched.
    pub fn plan(
        window: RenderWindow,
        sources: &[ClipSource],
        gains: Gains,
        has_original_audio: bool,
        mut skipped: Vec<SkippedItem>,
    ) -> CompositionPlan {
        let window_duration = window.duration();
        let mut clips: Vec<PlacedClip> = Vec::new();

        for source in sources {
            if !Self::is_relevant(&window, source) {
                skipped.push(SkippedItem {
                    item_index: source.item_index,
                    reason: SkipReason::OutsideWindow,
                });
                continue;
            }

            let trim_offset = (window.start - source.time_seconds).max(0.0);
            let mut start = (source.time_seconds - window.start).max(0.0);
            let mut duration = source.duration - trim_offset;

            // Clips queue behind the previous one instead of overlapping
            if let Some(previous) = clips.last() {
                if start < previous.end() {
                    start = previous.end();
                }
            }

            if start + duration > window_duration {
                duration = window_duration - start;
            }
            if duration <= 0.0 {
                skipped.push(SkippedItem {
                    item_index: source.item_index,
                    reason: SkipReason::NoRoomInWindow,
                });
                continue;
            }

            clips.push(PlacedClip {
                item_index: source.item_index,
                path: source.path.clone(),
                trim_offset,
                start,
                duration,
            });
        }

        skipped.sort_by_key(|skip| skip.item_index);

        CompositionPlan {
            window,
            clips,
            gains,
            has_original_audio,
            skipped,
        }
    }

    /// An item applies if it starts inside the window, or starts earlier but
    /// is still sounding when the window opens.
    pub fn is_relevant(window: &RenderWindow, source: &ClipSource) -> bool {
        window.contains(source.time_seconds)
            || (source.time_seconds < window.start
                && source.time_seconds + source.duration > window.start)
    }
}

/// Policies for individual items
pub struct ItemRules;

impl ItemRules {
    /// Prefix of files produced by the synthesis driver
    pub const GENERATED_PREFIX: &'static str = "tts_";
    pub const GENERATED_EXTENSION: &'static str = "wav";

    /// Check an item timestamp against the video duration, when known
    pub fn validate_time(time_seconds: f64, video_duration: Option<f64>) -> Result<(), DomainError> {
        if !time_seconds.is_finite() || time_seconds < 0.0 {
            return Err(DomainError::BadArgs(format!(
                "Description time must be a non-negative number, got {}",
                time_seconds
            )));
        }
        if let Some(duration) = video_duration {
            if time_seconds > duration {
                return Err(DomainError::BadArgs(format!(
                    "Description time {} is past the end of the video ({})",
                    TimeSpec::from_seconds(time_seconds),
                    TimeSpec::from_seconds(duration)
                )));
            }
        }
        Ok(())
    }

    /// Deterministic file name for a synthesized clip, e.g. `tts_12_50_003.wav`
    pub fn synthesized_file_name(time_seconds: f64, index: usize) -> String {
        let time = format!("{:.2}", time_seconds).replace('.', "_");
        format!(
            "{}{}_{:03}.{}",
            Self::GENERATED_PREFIX,
            time,
            index,
            Self::GENERATED_EXTENSION
        )
    }

    /// True when the path looks like a synthesis driver output
    pub fn is_synthesized_audio(path: &Path) -> bool {
        let name_matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(Self::GENERATED_PREFIX))
            .unwrap_or(false);
        let extension_matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(Self::GENERATED_EXTENSION))
            .unwrap_or(false);
        name_matches && extension_matches
    }
}
