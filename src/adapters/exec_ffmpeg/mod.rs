//! FFmpeg execution adapter
//!
//! Turns a [`CompositionPlan`] into a single `ffmpeg` invocation: the source
//! video is cut to the window, every placed clip is trimmed and delayed to its
//! window-relative start, the clips are mixed into one description layer and
//! laid over the original soundtrack.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::adapters::toml_config::RenderConfig;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Fixed output codec pairing
pub const VIDEO_CODEC: &str = "libx264";
pub const AUDIO_CODEC: &str = "aac";
const PIXEL_FORMAT: &str = "yuv420p";
const MIX_SAMPLE_RATE: u32 = 48_000;
const STDERR_TAIL_LINES: usize = 12;

/// FFmpeg-based render adapter
pub struct FFmpegRenderAdapter {
    program: String,
    settings: RenderConfig,
}

impl FFmpegRenderAdapter {
    /// Create new FFmpeg adapter
    pub fn new(program: impl Into<String>, settings: RenderConfig) -> Self {
        Self {
            program: program.into(),
            settings,
        }
    }
}

fn seconds_arg(seconds: f64) -> String {
    format!("{:.3}", seconds.max(0.0))
}

/// Build the audio filter graph; `None` when the output carries no audio
pub fn build_filter_graph(plan: &CompositionPlan) -> Option<String> {
    if plan.is_silent() {
        return None;
    }

    let mut graph: Vec<String> = Vec::new();

    // Description layer: clip inputs start at index 1
    let description = if plan.clips.is_empty() {
        None
    } else {
        let mut labels = String::new();
        for (position, clip) in plan.clips.iter().enumerate() {
            let delay_ms = (clip.start * 1000.0).round() as u64;
            graph.push(format!(
                "[{input}:a]aresample={rate},adelay=delays={delay}:all=1[d{position}]",
                input = position + 1,
                rate = MIX_SAMPLE_RATE,
                delay = delay_ms,
                position = position
            ));
            labels.push_str(&format!("[d{}]", position));
        }

        let volume = format!("volume={:.6}", plan.gains.description);
        if plan.clips.len() == 1 {
            graph.push(format!("{}{}[desc]", labels, volume));
        } else {
            graph.push(format!(
                "{}amix=inputs={}:duration=longest:dropout_transition=0:normalize=0,{}[desc]",
                labels,
                plan.clips.len(),
                volume
            ));
        }
        Some("[desc]")
    };

    let original = if plan.has_original_audio {
        graph.push(format!(
            "[0:a]aresample={},volume={:.6}[orig]",
            MIX_SAMPLE_RATE, plan.gains.original
        ));
        Some("[orig]")
    } else {
        None
    };

    // Pad so the audio never ends before the pinned output duration
    match (original, description) {
        (Some(original), Some(description)) => graph.push(format!(
            "{}{}amix=inputs=2:duration=longest:dropout_transition=0:normalize=0,apad[aout]",
            original, description
        )),
        (Some(only), None) | (None, Some(only)) => graph.push(format!("{}apad[aout]", only)),
        (None, None) => return None,
    }

    Some(graph.join(";"))
}

/// Build the complete `ffmpeg` argument list for a plan
pub fn build_command_args(
    video: &Path,
    plan: &CompositionPlan,
    output: &Path,
    settings: &RenderConfig,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |value: &str| args.push(OsString::from(value));

    push("-hide_banner");
    push("-nostdin");
    push("-y");
    push("-loglevel");
    push("error");
    push("-progress");
    push("pipe:1");
    push("-nostats");

    let window = plan.window;
    if window.start > 0.0 {
        push("-ss");
        push(&seconds_arg(window.start));
    }
    push("-t");
    push(&seconds_arg(window.duration()));
    args.push(OsString::from("-i"));
    args.push(video.as_os_str().to_os_string());

    for clip in &plan.clips {
        if clip.trim_offset > 0.0 {
            args.push(OsString::from("-ss"));
            args.push(OsString::from(seconds_arg(clip.trim_offset)));
        }
        args.push(OsString::from("-t"));
        args.push(OsString::from(seconds_arg(clip.duration)));
        args.push(OsString::from("-i"));
        args.push(clip.path.as_os_str().to_os_string());
    }

    let mut push = |value: &str| args.push(OsString::from(value));
    push("-map");
    push("0:v:0");
    match build_filter_graph(plan) {
        Some(graph) => {
            push("-filter_complex");
            push(&graph);
            push("-map");
            push("[aout]");
            push("-c:a");
            push(AUDIO_CODEC);
            push("-b:a");
            push(&settings.audio_bitrate);
        }
        None => push("-an"),
    }

    push("-c:v");
    push(VIDEO_CODEC);
    push("-preset");
    push(&settings.preset);
    push("-crf");
    push(&settings.crf.to_string());
    push("-pix_fmt");
    push(PIXEL_FORMAT);
    if settings.threads > 0 {
        push("-threads");
        push(&settings.threads.to_string());
    }

    // Output length follows the window, whatever the audio length
    push("-t");
    push(&seconds_arg(window.duration()));

    if output.extension().is_none() {
        push("-f");
        push("mp4");
    }
    args.push(output.as_os_str().to_os_string());
    args
}

/// Fraction of the window encoded so far, from one `-progress` line
pub fn parse_progress_line(line: &str, window_duration: f64) -> Option<f64> {
    let (key, value) = line.split_once('=')?;
    match key.trim() {
        // out_time_ms is reported in microseconds as well
        "out_time_us" | "out_time_ms" => {
            if window_duration <= 0.0 {
                return None;
            }
            let micros: f64 = value.trim().parse().ok()?;
            Some((micros / 1_000_000.0 / window_duration).clamp(0.0, 1.0))
        }
        "progress" if value.trim() == "end" => Some(1.0),
        _ => None,
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl RenderPort for FFmpegRenderAdapter {
    async fn render(
        &self,
        video: &Path,
        plan: &CompositionPlan,
        output: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<(), DomainError> {
        let output_dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        tokio::fs::create_dir_all(&output_dir).await?;

        // Encode next to the destination and move into place only on success
        let suffix = output
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let staging = tempfile::Builder::new()
            .prefix(".audesc-render-")
            .suffix(&suffix)
            .tempfile_in(&output_dir)
            .map_err(|e| DomainError::Render(format!("Failed to create staging file: {}", e)))?
            .into_temp_path();

        let args = build_command_args(video, plan, &staging, &self.settings);
        debug!("Running {} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DomainError::DependencyMissing(format!(
                    "'{}' was not found; install FFmpeg or set tools.ffmpeg",
                    self.program
                )),
                _ => DomainError::Render(format!("Failed to start {}: {}", self.program, e)),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DomainError::Render("Encoder stdout unavailable".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DomainError::Render("Encoder stderr unavailable".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buffer = Vec::new();
            let _ = stderr.read_to_end(&mut buffer).await;
            String::from_utf8_lossy(&buffer).into_owned()
        });

        let window_duration = plan.window.duration();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| DomainError::Render(format!("Failed to read encoder progress: {}", e)))?
        {
            if let Some(fraction) = parse_progress_line(&line, window_duration) {
                progress.progress(fraction, None);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DomainError::Render(format!("Failed to wait for encoder: {}", e)))?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            warn!("Encoder failed with {}", status);
            return Err(DomainError::Render(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                stderr_tail(&stderr_text)
            )));
        }

        staging.persist(output).map_err(|e| {
            DomainError::Render(format!(
                "Failed to move rendered file to {}: {}",
                output.display(),
                e.error
            ))
        })?;

        info!("Rendered {}", output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn clip(item_index: usize, trim_offset: f64, start: f64, duration: f64) -> PlacedClip {
        PlacedClip {
            item_index,
            path: PathBuf::from(format!("clip{}.wav", item_index)),
            trim_offset,
            start,
            duration,
        }
    }

    fn plan(clips: Vec<PlacedClip>, has_original_audio: bool) -> CompositionPlan {
        CompositionPlan {
            window: RenderWindow::new(20.0, 40.0).unwrap(),
            clips,
            gains: Gains::new(0.5, 1.5).unwrap(),
            has_original_audio,
            skipped: Vec::new(),
        }
    }

    fn args_as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_filter_graph_mixes_both_layers() {
        let graph = build_filter_graph(&plan(
            vec![clip(0, 5.0, 0.0, 5.0), clip(1, 0.0, 7.25, 2.0)],
            true,
        ))
        .unwrap();

        assert!(graph.contains("[1:a]aresample=48000,adelay=delays=0:all=1[d0]"));
        assert!(graph.contains("[2:a]aresample=48000,adelay=delays=7250:all=1[d1]"));
        assert!(graph.contains("[d0][d1]amix=inputs=2"));
        assert!(graph.contains("volume=1.500000[desc]"));
        assert!(graph.contains("[0:a]aresample=48000,volume=0.500000[orig]"));
        assert!(graph.ends_with("[orig][desc]amix=inputs=2:duration=longest:dropout_transition=0:normalize=0,apad[aout]"));
    }

    #[test]
    fn test_filter_graph_single_side() {
        let only_original = build_filter_graph(&plan(Vec::new(), true)).unwrap();
        assert!(only_original.ends_with("[orig]apad[aout]"));

        let only_description = build_filter_graph(&plan(vec![clip(0, 0.0, 1.0, 1.0)], false)).unwrap();
        assert!(!only_description.contains("[0:a]"));
        assert!(only_description.ends_with("[desc]apad[aout]"));
    }

    #[test]
    fn test_silent_plan_has_no_audio() {
        let settings = RenderConfig::default();
        let args = args_as_strings(&build_command_args(
            Path::new("in.mp4"),
            &plan(Vec::new(), false),
            Path::new("out.mp4"),
            &settings,
        ));

        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-filter_complex".to_string()));
    }

    #[test]
    fn test_command_args_window_and_codecs() {
        let settings = RenderConfig::default();
        let args = args_as_strings(&build_command_args(
            Path::new("in.mp4"),
            &plan(vec![clip(0, 5.0, 0.0, 5.0)], true),
            Path::new("out.mp4"),
            &settings,
        ));

        let joined = args.join(" ");
        assert!(joined.contains("-ss 20.000 -t 20.000 -i in.mp4"));
        assert!(joined.contains("-ss 5.000 -t 5.000 -i clip0.wav"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("-map 0:v:0"));
        assert!(joined.contains("-map [aout]"));
        assert_eq!(args.last().unwrap(), "out.mp4");
        let pinned = args.iter().rposition(|arg| arg == "-t").unwrap();
        assert_eq!(args[pinned + 1], "20.000");
    }

    #[test]
    fn test_untrimmed_clip_has_no_seek() {
        let settings = RenderConfig::default();
        let mut full = plan(vec![clip(0, 0.0, 10.0, 3.0)], true);
        full.window = RenderWindow::full(120.0).unwrap();
        let args = args_as_strings(&build_command_args(
            Path::new("in.mp4"),
            &full,
            Path::new("out"),
            &settings,
        ));

        let joined = args.join(" ");
        assert!(joined.contains("-nostats -t 120.000 -i in.mp4"));
        assert!(joined.contains("-t 3.000 -i clip0.wav"));
        assert!(joined.contains("-f mp4 out"));
    }

    #[test]
    fn test_parse_progress_line() {
        assert_eq!(parse_progress_line("out_time_us=10000000", 20.0), Some(0.5));
        assert_eq!(parse_progress_line("out_time_ms=40000000", 20.0), Some(1.0));
        assert_eq!(parse_progress_line("out_time_us=N/A", 20.0), None);
        assert_eq!(parse_progress_line("progress=end", 20.0), Some(1.0));
        assert_eq!(parse_progress_line("progress=continue", 20.0), None);
        assert_eq!(parse_progress_line("frame=12", 20.0), None);
    }

    #[test]
    fn test_stderr_tail() {
        let text = (0..20).map(|n| format!("line {}", n)).collect::<Vec<_>>().join("\n");
        let tail = stderr_tail(&text);
        assert!(tail.starts_with("line 8"));
        assert!(tail.ends_with("line 19"));
    }
}
