// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Receiver of progress reports from long-running adapters
pub trait ProgressSink: Send + Sync {
    /// Report completion in `[0, 1]` with an optional status line
    fn progress(&self, fraction: f64, message: Option<String>);

    /// Report a non-fatal problem
    fn warning(&self, message: String);
}

/// Sink that drops every report
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn progress(&self, _fraction: f64, _message: Option<String>) {}

    fn warning(&self, _message: String) {}
}

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a video file: duration and which stream kinds it carries
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError>;

    /// Duration in seconds of an audio clip
    async fn probe_audio_duration(&self, file_path: &Path) -> Result<f64, DomainError>;
}

/// Port for producing the final muxed file
#[async_trait]
pub trait RenderPort: Send + Sync {
    /// Render the plan over `video` into `output`.
    ///
    /// Implementations must not leave a file at `output` when they fail.
    async fn render(
        &self,
        video: &Path,
        plan: &CompositionPlan,
        output: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<(), DomainError>;
}

/// A voice offered by the speech engine
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VoiceInfo {
    /// Identifier passed back to the engine
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub language: Option<String>,
}

/// Port for the text-to-speech engine
#[async_trait]
pub trait SpeechPort: Send + Sync {
    /// Voices available on this machine, in a stable order
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, DomainError>;

    /// Start a session configured with one voice and rate, reused for a whole batch
    async fn open_session(
        &self,
        voice: Option<VoiceInfo>,
        rate: i32,
    ) -> Result<Box<dyn SpeechSession>, DomainError>;
}

/// A configured speech engine session
#[async_trait]
pub trait SpeechSession: Send {
    /// Speak `text` into a new audio file at `output`
    async fn synthesize(&mut self, text: &str, output: &Path) -> Result<(), DomainError>;
}

/// One timed entry of a subtitle document
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Port for subtitle-timing documents
#[async_trait]
pub trait SubtitlePort: Send + Sync {
    /// Read every cue of the document, in document order
    async fn load_cues(&self, file_path: &Path) -> Result<Vec<SubtitleCue>, DomainError>;
}

/// Port for project persistence
#[async_trait]
pub trait ProjectStorePort: Send + Sync {
    async fn load_project(&self, file_path: &Path) -> Result<ProjectState, DomainError>;

    async fn save_project(&self, file_path: &Path, project: &ProjectState) -> Result<(), DomainError>;
}
