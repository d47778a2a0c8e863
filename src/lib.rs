//! audesc - audio description compositor
//!
//! Attach spoken descriptions to a video at given timestamps, synthesize them
//! from text through a speech engine, and mix them over the original
//! soundtrack with FFmpeg.
//!
//! # Features
//!
//! - Timeline compositor: windowing, trimming and queueing of description clips
//! - Full renders and sub-range previews
//! - Text-to-speech synthesis of pending descriptions
//! - SubRip import and JSON project files
//!
//! # Usage
//!
//! ```bash
//! audesc init --video film.mp4
//! audesc import-srt film.srt
//! audesc render --synthesize
//! ```

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::{DomainError, DomainResult};
pub use domain::model::{AudioDescriptionItem, CompositionPlan, ProjectState, RenderWindow, TimeSpec};
pub use domain::rules::TimelineCompositor;
