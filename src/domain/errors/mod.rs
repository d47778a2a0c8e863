// Domain errors - Error types shared by the domain, ports and interactors

use thiserror::Error;

/// Domain-specific error types
#[derive(Error, Debug)]
pub enum DomainError {
    /// Invalid arguments provided
    #[error("Bad arguments: {0}")]
    BadArgs(String),

    /// Input file not found or inaccessible
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// An external tool (ffmpeg, ffprobe, speech engine) is not available
    #[error("Missing dependency: {0}")]
    DependencyMissing(String),

    /// Media probing failed
    #[error("Failed to probe media file: {0}")]
    Probe(String),

    /// Rendering aborted
    #[error("Render failed: {0}")]
    Render(String),

    /// Speech synthesis aborted
    #[error("Speech synthesis failed: {0}")]
    Speech(String),

    /// Project document could not be read or written
    #[error("Project error: {0}")]
    Project(String),

    /// Subtitle document could not be parsed
    #[error("Subtitle error: {0}")]
    Subtitle(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// A job is already running
    #[error("Another job is already running")]
    Busy,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for domain operations
pub type DomainResult<T> = std::result::Result<T, DomainError>;
