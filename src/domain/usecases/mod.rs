// Domain use cases - Requests and reports exchanged with the interactors

use std::path::PathBuf;

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Which part of the video a render covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderScope {
    /// The whole video
    Full,
    /// A user-chosen sub-range
    Preview { start: f64, end: f64 },
}

/// Request to render the project
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub video_path: PathBuf,
    pub output_path: PathBuf,
    pub scope: RenderScope,
    pub gains: Gains,
    /// Replace an existing output file
    pub overwrite: bool,
}

/// Outcome of a finished render
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub output_path: PathBuf,
    pub window: RenderWindow,
    pub clips_placed: usize,
    pub skipped: Vec<SkippedItem>,
    pub has_audio: bool,
    pub warnings: Vec<String>,
    pub processing_time: std::time::Duration,
}

/// Request to synthesize every pending item
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub settings: TtsSettings,
    pub output_dir: PathBuf,
}

/// Outcome of a synthesis batch; items are handed back even on failure
#[derive(Debug)]
pub struct SynthesisReport {
    pub items: Vec<AudioDescriptionItem>,
    pub generated: usize,
    pub requested: usize,
    pub output_dir: PathBuf,
    /// Set when the batch stopped early; completed items keep their audio
    pub failure: Option<DomainError>,
}

impl SynthesisReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}
