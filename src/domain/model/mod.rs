// Domain models - Core types and data structures

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Default gain applied to the original soundtrack
pub const DEFAULT_VOLUME_ORIGINAL: f64 = 0.6;
/// Default gain applied to the description track
pub const DEFAULT_VOLUME_DESCRIPTION: f64 = 1.5;
/// Output file used when no video has been chosen yet
pub const DEFAULT_OUTPUT_FILE: &str = "video_with_audio_description.mp4";
/// Valid speech rate range (SAPI-style scale)
pub const MIN_TTS_RATE: i32 = -10;
pub const MAX_TTS_RATE: i32 = 10;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Create a new TimeSpec from hours, minutes, seconds, milliseconds
    pub fn from_components(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> Self {
        let total_seconds = hours as f64 * 3600.0
            + minutes as f64 * 60.0
            + seconds as f64
            + milliseconds as f64 / 1000.0;
        Self { seconds: total_seconds }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        // Try parsing as seconds (float)
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() {
                return Err(DomainError::BadArgs("Time must be a finite number".to_string()));
            }
            if seconds < 0.0 {
                return Err(DomainError::BadArgs("Time cannot be negative".to_string()));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() == 2 {
            // MM:SS.ms format
            let minutes = parts[0]
                .parse::<u32>()
                .map_err(|_| DomainError::BadArgs("Invalid minutes format".to_string()))?;
            let seconds_part = Self::parse_seconds_part(parts[1])?;

            Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds_part))
        } else if parts.len() == 3 {
            // HH:MM:SS.ms format
            let hours = parts[0]
                .parse::<u32>()
                .map_err(|_| DomainError::BadArgs("Invalid hours format".to_string()))?;
            let minutes = parts[1]
                .parse::<u32>()
                .map_err(|_| DomainError::BadArgs("Invalid minutes format".to_string()))?;
            let seconds_part = Self::parse_seconds_part(parts[2])?;

            if minutes >= 60 {
                return Err(DomainError::BadArgs("Minutes must be less than 60".to_string()));
            }

            Ok(Self::from_seconds(
                hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds_part,
            ))
        } else {
            Err(DomainError::BadArgs(
                "Invalid time format. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)".to_string()
            ))
        }
    }

    fn parse_seconds_part(part: &str) -> Result<f64, DomainError> {
        let seconds = part
            .parse::<f64>()
            .map_err(|_| DomainError::BadArgs("Invalid seconds format".to_string()))?;
        if !(0.0..60.0).contains(&seconds) {
            return Err(DomainError::BadArgs("Seconds must be less than 60".to_string()));
        }
        Ok(seconds)
    }

    /// Format as HH:MM:SS.mmm (hours omitted when zero)
    pub fn format_hms(&self) -> String {
        let total_millis = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let seconds = (total_millis % 60_000) / 1000;
        let milliseconds = total_millis % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }

    /// Format as a whole-second clock, HH:MM:SS
    pub fn format_clock(&self) -> String {
        let total = self.seconds.max(0.0) as u64;
        format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// One narration clip anchored to a moment of the video
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioDescriptionItem {
    /// Offset from the start of the video, in seconds
    #[serde(rename = "tiempo", default)]
    pub time_seconds: f64,
    /// Rendered or user-supplied audio file; empty while synthesis is pending
    #[serde(rename = "archivo_audio", default)]
    pub audio_path: String,
    /// Description text, the TTS source or a free annotation
    #[serde(rename = "descripcion", default)]
    pub text: String,
}

impl AudioDescriptionItem {
    pub fn new(time_seconds: f64, audio_path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            time_seconds,
            audio_path: audio_path.into(),
            text: text.into(),
        }
    }

    /// Item created from text alone, waiting for synthesis
    pub fn pending(time_seconds: f64, text: impl Into<String>) -> Self {
        Self::new(time_seconds, String::new(), text)
    }

    /// True when the item has text to synthesize but no audio yet
    pub fn is_pending(&self) -> bool {
        self.audio_path.is_empty() && !self.text.trim().is_empty()
    }

    pub fn has_audio(&self) -> bool {
        !self.audio_path.is_empty()
    }

    pub fn time(&self) -> TimeSpec {
        TimeSpec::from_seconds(self.time_seconds)
    }
}

/// Sort items ascending by time; equal times keep their relative order
pub fn sort_items(items: &mut [AudioDescriptionItem]) {
    items.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
}

/// Text-to-speech settings stored with the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsSettings {
    #[serde(default)]
    pub voice_index: usize,
    #[serde(default)]
    pub rate: i32,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            voice_index: 0,
            rate: 0,
        }
    }
}

impl TtsSettings {
    pub fn new(voice_index: usize, rate: i32) -> Result<Self, DomainError> {
        if !(MIN_TTS_RATE..=MAX_TTS_RATE).contains(&rate) {
            return Err(DomainError::BadArgs(format!(
                "Speech rate must be between {} and {}",
                MIN_TTS_RATE, MAX_TTS_RATE
            )));
        }
        Ok(Self { voice_index, rate })
    }
}

/// Relative levels of the two audio layers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains {
    pub original: f64,
    pub description: f64,
}

impl Gains {
    pub fn new(original: f64, description: f64) -> Result<Self, DomainError> {
        Self::validate_gain("original", original)?;
        Self::validate_gain("description", description)?;
        Ok(Self {
            original,
            description,
        })
    }

    fn validate_gain(name: &str, value: f64) -> Result<(), DomainError> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::BadArgs(format!(
                "The {} volume must be a non-negative number, got {}",
                name, value
            )));
        }
        Ok(())
    }
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            original: DEFAULT_VOLUME_ORIGINAL,
            description: DEFAULT_VOLUME_DESCRIPTION,
        }
    }
}

/// Complete, persistable project state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(rename = "video_file", default)]
    pub video_path: String,
    #[serde(rename = "audiodescriptions", default)]
    items: Vec<AudioDescriptionItem>,
    #[serde(rename = "output_file", default = "default_output_file")]
    pub output_path: String,
    #[serde(default = "default_volume_original")]
    pub volume_original: f64,
    #[serde(default = "default_volume_description")]
    pub volume_description: f64,
    #[serde(default)]
    pub tts_settings: TtsSettings,
}

fn default_output_file() -> String {
    DEFAULT_OUTPUT_FILE.to_string()
}

fn default_volume_original() -> f64 {
    DEFAULT_VOLUME_ORIGINAL
}

fn default_volume_description() -> f64 {
    DEFAULT_VOLUME_DESCRIPTION
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            video_path: String::new(),
            items: Vec::new(),
            output_path: default_output_file(),
            volume_original: DEFAULT_VOLUME_ORIGINAL,
            volume_description: DEFAULT_VOLUME_DESCRIPTION,
            tts_settings: TtsSettings::default(),
        }
    }
}

impl ProjectState {
    /// Items, always sorted by time
    pub fn items(&self) -> &[AudioDescriptionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert an item and restore time order; returns its resulting index
    pub fn add_item(&mut self, item: AudioDescriptionItem) -> usize {
        self.items.push(item);
        let last = self.items.len() - 1;
        let marker = self.items[last].clone();
        sort_items(&mut self.items);
        self.items
            .iter()
            .rposition(|candidate| *candidate == marker)
            .unwrap_or(last)
    }

    /// Apply a change to one item and restore time order
    pub fn update_item<F>(&mut self, index: usize, change: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut AudioDescriptionItem),
    {
        let item = self
            .items
            .get_mut(index)
            .ok_or_else(|| DomainError::BadArgs(format!("No description at index {}", index)))?;
        change(item);
        sort_items(&mut self.items);
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<AudioDescriptionItem, DomainError> {
        if index >= self.items.len() {
            return Err(DomainError::BadArgs(format!("No description at index {}", index)));
        }
        Ok(self.items.remove(index))
    }

    /// Replace the whole list (subtitle import, synthesis results)
    pub fn replace_items(&mut self, mut items: Vec<AudioDescriptionItem>) {
        sort_items(&mut items);
        self.items = items;
    }

    /// Move the item list out, leaving the project empty
    pub fn take_items(&mut self) -> Vec<AudioDescriptionItem> {
        std::mem::take(&mut self.items)
    }

    /// Indices of items waiting for synthesis
    pub fn pending_indices(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_pending())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn gains(&self) -> Result<Gains, DomainError> {
        Gains::new(self.volume_original, self.volume_description)
    }

    /// Restore invariants after deserialization
    pub fn normalize(&mut self) {
        sort_items(&mut self.items);
        if self.output_path.is_empty() {
            self.output_path = default_output_file();
        }
    }

    pub fn video(&self) -> Option<&Path> {
        if self.video_path.is_empty() {
            None
        } else {
            Some(Path::new(&self.video_path))
        }
    }
}

/// Time range of the source video being rendered, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderWindow {
    pub start: f64,
    pub end: f64,
}

impl RenderWindow {
    pub fn new(start: f64, end: f64) -> Result<Self, DomainError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(DomainError::BadArgs("Window bounds must be finite".to_string()));
        }
        if start < 0.0 {
            return Err(DomainError::BadArgs("Window start cannot be negative".to_string()));
        }
        if start >= end {
            return Err(DomainError::BadArgs(format!(
                "Invalid window: start ({:.3}s) must be before end ({:.3}s)",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering a whole video
    pub fn full(video_duration: f64) -> Result<Self, DomainError> {
        Self::new(0.0, video_duration)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

/// Probed facts about a media file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    /// Container duration in seconds
    pub duration: f64,
    pub has_video: bool,
    pub has_audio: bool,
}

/// A description clip whose duration is known
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSource {
    /// Index of the originating item in the sorted list
    pub item_index: usize,
    pub time_seconds: f64,
    pub path: PathBuf,
    pub duration: f64,
}

/// A clip positioned on the window-relative timeline
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedClip {
    pub item_index: usize,
    pub path: PathBuf,
    /// Seconds cut from the head of the clip
    pub trim_offset: f64,
    /// Window-relative start
    pub start: f64,
    /// Seconds actually played
    pub duration: f64,
}

impl PlacedClip {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Why an item did not make it into a composition
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoAudio,
    MissingFile,
    Unreadable(String),
    OutsideWindow,
    NoRoomInWindow,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoAudio => write!(f, "no audio file assigned"),
            SkipReason::MissingFile => write!(f, "audio file does not exist"),
            SkipReason::Unreadable(reason) => write!(f, "audio file could not be read: {}", reason),
            SkipReason::OutsideWindow => write!(f, "outside the render window"),
            SkipReason::NoRoomInWindow => write!(f, "no time left in the window after queueing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub item_index: usize,
    pub reason: SkipReason,
}

/// Everything the renderer needs to produce one output file
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    pub window: RenderWindow,
    pub clips: Vec<PlacedClip>,
    pub gains: Gains,
    pub has_original_audio: bool,
    pub skipped: Vec<SkippedItem>,
}

impl CompositionPlan {
    /// True when neither layer contributes sound
    pub fn is_silent(&self) -> bool {
        !self.has_original_audio && self.clips.is_empty()
    }

    /// Skips caused by unusable audio, as opposed to window geometry
    pub fn degenerate_items(&self) -> impl Iterator<Item = &SkippedItem> {
        self.skipped.iter().filter(|skip| {
            matches!(
                skip.reason,
                SkipReason::NoAudio | SkipReason::MissingFile | SkipReason::Unreadable(_)
            )
        })
    }
}

#[cfg(test)]
mod tests;
