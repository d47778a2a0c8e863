//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::model::{TimeSpec, MAX_TTS_RATE, MIN_TTS_RATE};
use crate::utils::time::parse_time_arg;

fn parse_rate(value: &str) -> Result<i32, String> {
    clap_num::number_range(value, MIN_TTS_RATE, MAX_TTS_RATE)
}

fn parse_position(value: &str) -> Result<usize, String> {
    clap_num::number_range(value, 1, usize::MAX)
}

fn parse_gain(value: &str) -> Result<f64, String> {
    let gain: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !gain.is_finite() || gain < 0.0 {
        return Err("volume must be a non-negative number".to_string());
    }
    Ok(gain)
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Source video file
    #[arg(short, long)]
    pub video: PathBuf,

    /// Render target (default: <video>_with_audio_description.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Discard the current descriptions without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(long, value_parser = parse_time_arg)]
    pub at: TimeSpec,

    /// Recorded audio clip to play at that time
    #[arg(short, long)]
    pub audio: Option<PathBuf>,

    /// Description text (synthesized later when no audio is given)
    #[arg(short, long)]
    pub text: Option<String>,
}

/// Arguments for the edit command
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Description number as shown by `list`
    #[arg(value_parser = parse_position)]
    pub index: usize,

    /// New start time
    #[arg(long, value_parser = parse_time_arg)]
    pub at: Option<TimeSpec>,

    /// New description text
    #[arg(short, long)]
    pub text: Option<String>,

    /// New audio clip
    #[arg(short, long)]
    pub audio: Option<PathBuf>,
}

/// Arguments for the remove command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Description number as shown by `list`
    #[arg(value_parser = parse_position)]
    pub index: usize,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print the project as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the import-srt command
#[derive(Args, Debug)]
pub struct ImportSrtArgs {
    /// SubRip file whose cues become pending descriptions
    pub file: PathBuf,

    /// Replace the current descriptions without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the set command
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Gain applied to the original soundtrack
    #[arg(long, value_parser = parse_gain)]
    pub volume_original: Option<f64>,

    /// Gain applied to the description clips
    #[arg(long, value_parser = parse_gain)]
    pub volume_description: Option<f64>,

    /// Voice number as shown by `voices`
    #[arg(long)]
    pub voice: Option<usize>,

    /// Speech rate (-10 to 10)
    #[arg(long, value_parser = parse_rate, allow_hyphen_values = true)]
    pub rate: Option<i32>,

    /// Render target
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the synthesize command
#[derive(Args, Debug)]
pub struct SynthesizeArgs {
    /// Directory for the generated clips (default: next to the project file)
    #[arg(long, conflicts_with = "scratch")]
    pub out_dir: Option<PathBuf>,

    /// Write clips into a temporary directory removed on exit
    #[arg(long)]
    pub scratch: bool,
}

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Output file (default: the project's output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Synthesize pending descriptions first
    #[arg(long)]
    pub synthesize: bool,

    /// Replace an existing output file
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for the preview command
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Window start (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long, value_parser = parse_time_arg)]
    pub start: TimeSpec,

    /// Window end
    #[arg(short, long, value_parser = parse_time_arg)]
    pub end: TimeSpec,

    /// Output file (default: <output>_preview_<start>_<end>.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Synthesize pending descriptions into scratch space first
    #[arg(long)]
    pub synthesize: bool,

    /// Replace an existing output file
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for the save command
#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Destination (`.json` is appended when missing)
    pub file: PathBuf,
}

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Project file to load
    pub file: PathBuf,

    /// Replace the current descriptions without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the clear command
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}
