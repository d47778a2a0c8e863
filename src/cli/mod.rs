//! CLI module for audesc
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;
pub mod progress;

pub use args::*;

/// Audio description compositor
///
/// Attach spoken descriptions to a video at given times, synthesize them
/// from text, and mix them over the original soundtrack.
#[derive(Parser, Debug)]
#[command(name = "audesc")]
#[command(about = "Audio description compositor - narrate a video and mix it in")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Project file (default: the per-user autosave)
    #[arg(long, global = true, env = "AUDESC_PROJECT")]
    pub project: Option<PathBuf>,

    /// Configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new project on a video
    Init(InitArgs),
    /// Add a description
    Add(AddArgs),
    /// Change a description
    Edit(EditArgs),
    /// Delete a description
    Remove(RemoveArgs),
    /// Show the project
    List(ListArgs),
    /// Replace the descriptions with the cues of a SubRip file
    ImportSrt(ImportSrtArgs),
    /// Change volumes, voice, rate or output
    Set(SetArgs),
    /// List the installed voices
    Voices,
    /// Generate audio for every description that only has text
    Synthesize(SynthesizeArgs),
    /// Render the whole video with descriptions
    Render(RenderArgs),
    /// Render a time range only
    Preview(PreviewArgs),
    /// Export the project to a file
    Save(SaveArgs),
    /// Load a project file into the active project
    Load(LoadArgs),
    /// Start over with an empty project
    Clear(ClearArgs),
    /// Report which external programs are available
    Check(CheckArgs),
}

impl Commands {
    /// Commands that work on the project and need it opened
    pub fn needs_project(&self) -> bool {
        !matches!(self, Commands::Voices | Commands::Check(_))
    }

    /// Commands whose changes are written back to the project file
    pub fn mutates_project(&self) -> bool {
        !matches!(
            self,
            Commands::List(_) | Commands::Voices | Commands::Save(_) | Commands::Check(_)
        )
    }
}
