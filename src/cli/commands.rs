//! Command implementations

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use dialoguer::Confirm;
use tracing::{info, warn};

use crate::adapters::env_tools::EnvToolsAdapter;
use crate::adapters::toml_config::AppConfig;
use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::project_interactor::{ItemEdit, SettingsUpdate};
use crate::app::session::Session;
use crate::app::worker::EventSender;
use crate::cli::args::*;
use crate::cli::progress::render_events;
use crate::domain::model::*;
use crate::domain::usecases::*;
use crate::utils::path::PathUtils;
use crate::utils::Utils;

/// Everything a command needs
pub struct CommandContext {
    pub container: DefaultAppContainer,
    pub config: AppConfig,
}

/// Ask before a destructive action; non-interactive runs need the flag
fn confirm(prompt: &str, assume_yes: bool, flag: &str) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        bail!("{} (pass {} to confirm non-interactively)", prompt, flag);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

fn require_video(session: &Session) -> Result<PathBuf> {
    session
        .project()
        .video()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("The project has no video; run `audesc init --video <file>` first"))
}

/// Execute the init command
pub async fn init(ctx: &CommandContext, session: &mut Session, args: InitArgs) -> Result<()> {
    if !session.project().is_empty()
        && !confirm(
            &format!(
                "Start a new project? The {} current descriptions will be discarded",
                session.project().len()
            ),
            args.yes,
            "--yes",
        )?
    {
        bail!("Cancelled");
    }

    let media = ctx
        .container
        .project_interactor()
        .init(session, &args.video, args.output.as_deref())
        .await
        .with_context(|| format!("Failed to open {}", args.video.display()))?;

    println!("Video:    {}", session.project().video_path);
    println!("Duration: {}", TimeSpec::from_seconds(media.duration));
    println!(
        "Audio:    {}",
        if media.has_audio { "original track present" } else { "no original track" }
    );
    println!("Output:   {}", session.project().output_path);
    Ok(())
}

/// Execute the add command
pub async fn add(ctx: &CommandContext, session: &mut Session, args: AddArgs) -> Result<()> {
    let index = ctx
        .container
        .project_interactor()
        .add_item(session, args.at, args.audio.as_deref(), args.text)
        .await
        .context("Failed to add description")?;

    let item = &session.project().items()[index];
    println!(
        "Added #{} at {} ({})",
        index + 1,
        item.time(),
        if item.has_audio() { "audio" } else { "pending synthesis" }
    );
    Ok(())
}

/// Execute the edit command
pub async fn edit(ctx: &CommandContext, session: &mut Session, args: EditArgs) -> Result<()> {
    let edit = ItemEdit {
        time: args.at,
        text: args.text,
        audio: args.audio,
    };
    if edit.time.is_none() && edit.text.is_none() && edit.audio.is_none() {
        bail!("Nothing to change; pass --at, --text or --audio");
    }

    ctx.container
        .project_interactor()
        .edit_item(session, args.index - 1, edit)
        .await
        .with_context(|| format!("Failed to edit description #{}", args.index))?;

    println!("Updated description #{}", args.index);
    Ok(())
}

/// Execute the remove command
pub fn remove(ctx: &CommandContext, session: &mut Session, args: RemoveArgs) -> Result<()> {
    let item = ctx
        .container
        .project_interactor()
        .remove_item(session, args.index - 1)
        .with_context(|| format!("Failed to remove description #{}", args.index))?;

    println!("Removed #{} at {}", args.index, item.time());
    Ok(())
}

fn status_label(item: &AudioDescriptionItem) -> &'static str {
    if item.has_audio() {
        if Path::new(&item.audio_path).exists() {
            "audio"
        } else {
            "missing"
        }
    } else if item.is_pending() {
        "pending"
    } else {
        "empty"
    }
}

/// Execute the list command
pub fn list(session: &Session, args: ListArgs) -> Result<()> {
    let project = session.project();
    if args.json {
        let json = serde_json::to_string_pretty(project)
            .context("Failed to serialize project to JSON")?;
        println!("{}", json);
        return Ok(());
    }

    println!(
        "Video:  {}",
        project.video().map_or("(none)".to_string(), |video| video.display().to_string())
    );
    println!("Output: {}", project.output_path);
    println!(
        "Volume: original {:.2}, descriptions {:.2}",
        project.volume_original, project.volume_description
    );
    println!(
        "Voice:  #{} at rate {}",
        project.tts_settings.voice_index, project.tts_settings.rate
    );
    println!();

    if project.is_empty() {
        println!("No descriptions.");
        return Ok(());
    }

    println!("{:>4}  {:<12}  {:<8}  {}", "#", "Time", "Status", "Description");
    for (index, item) in project.items().iter().enumerate() {
        println!(
            "{:>4}  {:<12}  {:<8}  {}",
            index + 1,
            item.time().format_hms(),
            status_label(item),
            item.text
        );
        if item.has_audio() {
            println!("{:>4}  {:<12}  {:<8}  {}", "", "", "", item.audio_path);
        }
    }
    Ok(())
}

/// Execute the import-srt command
pub async fn import_srt(ctx: &CommandContext, session: &mut Session, args: ImportSrtArgs) -> Result<()> {
    let interactor = ctx.container.project_interactor();
    let items = interactor
        .read_subtitles(&args.file)
        .await
        .with_context(|| format!("Failed to import {}", args.file.display()))?;

    if !session.project().is_empty()
        && !confirm(
            &format!(
                "Found {} descriptions. Import them and replace the current {}?",
                items.len(),
                session.project().len()
            ),
            args.yes,
            "--yes",
        )?
    {
        bail!("Cancelled");
    }

    let count = items.len();
    interactor.replace_items(session, items);
    println!("Imported {} descriptions, ready for synthesis", count);
    Ok(())
}

/// Execute the set command
pub fn set(ctx: &CommandContext, session: &mut Session, args: SetArgs) -> Result<()> {
    let update = SettingsUpdate {
        volume_original: args.volume_original,
        volume_description: args.volume_description,
        voice_index: args.voice,
        rate: args.rate,
        output: args.output,
    };
    if update.is_empty() {
        bail!("Nothing to change; see `audesc set --help`");
    }

    ctx.container
        .project_interactor()
        .update_settings(session, update)
        .context("Invalid settings")?;
    println!("Settings updated");
    Ok(())
}

/// Execute the voices command
pub async fn voices(ctx: &CommandContext, selected: Option<usize>) -> Result<()> {
    let voices = ctx
        .container
        .synthesize_interactor()
        .list_voices()
        .await
        .context("Failed to list voices")?;

    if voices.is_empty() {
        println!("The speech engine reports no voices; its default voice will be used.");
        return Ok(());
    }

    for (index, voice) in voices.iter().enumerate() {
        let marker = if Some(index) == selected { "*" } else { " " };
        match &voice.language {
            Some(language) => println!("{} {:>3}  {}  [{}]", marker, index, voice.name, language),
            None => println!("{} {:>3}  {}", marker, index, voice.name),
        }
    }
    Ok(())
}

/// Synthesize pending items into `output_dir` on the worker, then put the
/// items back into the session whatever the outcome.
async fn run_synthesis(ctx: &CommandContext, session: &mut Session, output_dir: PathBuf) -> Result<()> {
    let pending = session.project().pending_indices().len();
    if pending == 0 {
        println!("No descriptions need synthesis");
        return Ok(());
    }
    EnvToolsAdapter::require("speech", &ctx.config.speech.program)?;

    let request = SynthesisRequest {
        settings: session.project().tts_settings,
        output_dir,
    };
    // Put back if the job never hands the items back
    let snapshot = session.project().items().to_vec();
    let items = session.project_mut().take_items();
    let interactor = ctx.container.synthesize_interactor();
    let (events, rx) = EventSender::channel();
    let sink = events.clone();

    let spawned = ctx.container.job_runner().spawn("Synthesizing", events, async move {
        Ok(interactor.execute(items, request, &sink).await)
    });
    let joined = match spawned {
        Ok(handle) => {
            render_events(rx).await;
            handle
                .await
                .map_err(|e| anyhow!("Synthesis task failed: {}", e))
                .and_then(|result| result.map_err(anyhow::Error::from))
        }
        Err(e) => Err(e.into()),
    };
    let report = match joined {
        Ok(report) => report,
        Err(e) => {
            session.project_mut().replace_items(snapshot);
            return Err(e);
        }
    };
    session.project_mut().replace_items(report.items);

    println!(
        "Synthesized {}/{} descriptions into {}",
        report.generated,
        report.requested,
        report.output_dir.display()
    );
    if let Some(failure) = report.failure {
        return Err(anyhow!(failure)).context(format!(
            "Synthesis stopped after {} of {} descriptions",
            report.generated, report.requested
        ));
    }
    Ok(())
}

/// Execute the synthesize command
pub async fn synthesize(ctx: &CommandContext, session: &mut Session, args: SynthesizeArgs) -> Result<()> {
    if args.scratch {
        // Scratch clips vanish on exit, so the project keeps its pending items
        let original = session.project().items().to_vec();
        let output_dir = session.scratch_dir()?;
        let result = run_synthesis(ctx, session, output_dir).await;
        session.project_mut().replace_items(original);
        return result;
    }

    let output_dir = args.out_dir.unwrap_or_else(|| session.default_tts_dir());
    run_synthesis(ctx, session, output_dir).await
}

fn check_render_tools(config: &AppConfig) -> Result<()> {
    EnvToolsAdapter::require("ffmpeg", &config.tools.ffmpeg)?;
    if cfg!(not(feature = "libav")) {
        EnvToolsAdapter::require("ffprobe", &config.tools.ffprobe)?;
    }
    Ok(())
}

async fn run_render(
    ctx: &CommandContext,
    session: &Session,
    output_path: PathBuf,
    scope: RenderScope,
    overwrite: bool,
) -> Result<RenderReport> {
    check_render_tools(&ctx.config)?;
    let video_path = require_video(session)?;

    let overwrite = overwrite
        || (output_path.exists()
            && confirm(
                &format!("{} already exists. Replace it?", output_path.display()),
                false,
                "--overwrite",
            )?);

    let request = RenderRequest {
        video_path,
        output_path,
        scope,
        gains: session.project().gains()?,
        overwrite,
    };
    let items = session.project().items().to_vec();
    let interactor = ctx.container.render_interactor();
    let (events, rx) = EventSender::channel();
    let sink = events.clone();

    let label = match scope {
        RenderScope::Full => "Rendering",
        RenderScope::Preview { .. } => "Rendering preview",
    };
    let handle = ctx.container.job_runner().spawn(label, events, async move {
        interactor.execute(items, request, &sink).await
    })?;
    render_events(rx).await;

    let report = handle
        .await
        .map_err(|e| anyhow!("Render task failed: {}", e))??;
    Ok(report)
}

fn print_render_report(report: &RenderReport) {
    let size = std::fs::metadata(&report.output_path)
        .map(|meta| Utils::format_file_size(meta.len()))
        .unwrap_or_else(|_| "unknown size".to_string());

    println!("Rendered {} ({})", report.output_path.display(), size);
    println!(
        "Window:   {} - {}",
        TimeSpec::from_seconds(report.window.start),
        TimeSpec::from_seconds(report.window.end)
    );
    println!("Clips:    {} placed, {} skipped", report.clips_placed, report.skipped.len());
    if !report.has_audio {
        println!("Audio:    none");
    }
    println!("Time:     {}", Utils::format_duration(report.processing_time));
}

/// Execute the render command
pub async fn render(ctx: &CommandContext, session: &mut Session, args: RenderArgs) -> Result<()> {
    if args.synthesize {
        let output_dir = session.default_tts_dir();
        run_synthesis(ctx, session, output_dir).await?;
    }

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&session.project().output_path));
    let report = run_render(ctx, session, output_path, RenderScope::Full, args.overwrite)
        .await
        .context("Render failed")?;

    info!("Render finished with {} warning(s)", report.warnings.len());
    print_render_report(&report);
    Ok(())
}

/// Execute the preview command
pub async fn preview(ctx: &CommandContext, session: &mut Session, args: PreviewArgs) -> Result<()> {
    let (start, end) = (args.start.as_seconds(), args.end.as_seconds());
    if start >= end {
        bail!("Preview start must be before its end");
    }

    let output_path = args.output.unwrap_or_else(|| {
        PathUtils::preview_output_path(Path::new(&session.project().output_path), start, end)
    });

    // Clips synthesized for a preview live in scratch space and are not kept
    let original = session.project().items().to_vec();
    let result = async {
        if args.synthesize {
            let output_dir = session.scratch_dir()?;
            run_synthesis(ctx, session, output_dir).await?;
        }
        run_render(
            ctx,
            session,
            output_path,
            RenderScope::Preview { start, end },
            args.overwrite,
        )
        .await
        .context("Preview failed")
    }
    .await;
    if args.synthesize {
        session.project_mut().replace_items(original);
    }

    print_render_report(&result?);
    Ok(())
}

/// Execute the save command
pub async fn save(ctx: &CommandContext, session: &Session, args: SaveArgs) -> Result<()> {
    let path = ctx
        .container
        .project_interactor()
        .export(session, &args.file)
        .await
        .with_context(|| format!("Failed to save {}", args.file.display()))?;
    println!("Project saved to {}", path.display());
    Ok(())
}

/// Execute the load command
pub async fn load(ctx: &CommandContext, session: &mut Session, args: LoadArgs) -> Result<()> {
    if !session.project().is_empty()
        && !confirm(
            &format!(
                "Replace the current {} descriptions with {}?",
                session.project().len(),
                args.file.display()
            ),
            args.yes,
            "--yes",
        )?
    {
        bail!("Cancelled");
    }

    ctx.container
        .project_interactor()
        .import(session, &args.file)
        .await
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    println!(
        "Loaded {} descriptions from {}",
        session.project().len(),
        args.file.display()
    );
    Ok(())
}

/// Execute the clear command
pub fn clear(ctx: &CommandContext, session: &mut Session, args: ClearArgs) -> Result<()> {
    if !confirm(
        "Clear the project and delete generated audio?",
        args.yes,
        "--yes",
    )? {
        bail!("Cancelled");
    }

    let removed = ctx.container.project_interactor().clear(session);
    println!("Project cleared ({} generated files deleted)", removed);
    Ok(())
}

/// Execute the check command
pub fn check(ctx: &CommandContext, args: CheckArgs) -> Result<()> {
    let report = EnvToolsAdapter::check_tools(&ctx.config);

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize dependency report to JSON")?;
        println!("{}", json);
    } else {
        for status in &report {
            match &status.resolved {
                Some(path) => println!("✓ {:<8} {} ({})", status.role, status.program, path.display()),
                None => println!("✗ {:<8} {} not found", status.role, status.program),
            }
        }
    }

    let missing = report.iter().filter(|status| !status.is_available()).count();
    if missing > 0 {
        warn!("{} external programs are missing", missing);
        bail!("{} external program(s) missing", missing);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::mock::{MockProbeAdapter, MockRenderAdapter, MockSpeechAdapter};
    use crate::domain::errors::DomainError;

    fn context() -> CommandContext {
        let mut config = AppConfig::default();
        // Any program found on PATH passes the speech tool check
        config.speech.program = "sh".to_string();
        CommandContext {
            container: DefaultAppContainer::with_ports(
                Arc::new(MockProbeAdapter::new(60.0, true)),
                Arc::new(MockRenderAdapter::new()),
                Arc::new(MockSpeechAdapter::new()),
            ),
            config,
        }
    }

    #[tokio::test]
    async fn test_synthesis_refused_keeps_items() {
        let ctx = context();
        let mut session = Session::new(ProjectState::default(), None);
        session
            .project_mut()
            .add_item(AudioDescriptionItem::pending(2.0, "Cae la noche"));

        let (events, _rx) = EventSender::channel();
        let (release, wait) = tokio::sync::oneshot::channel::<()>();
        let running = ctx
            .container
            .job_runner()
            .spawn("other", events, async move {
                let _ = wait.await;
                Ok::<(), DomainError>(())
            })
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let result = run_synthesis(&ctx, &mut session, dir.path().join("tts")).await;
        assert!(result.is_err());
        assert_eq!(session.project().len(), 1);
        assert_eq!(session.project().items()[0].text, "Cae la noche");

        release.send(()).unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_synthesis_hands_items_back() {
        let ctx = context();
        let mut session = Session::new(ProjectState::default(), None);
        session
            .project_mut()
            .add_item(AudioDescriptionItem::pending(2.0, "Cae la noche"));

        let dir = tempfile::tempdir().unwrap();
        run_synthesis(&ctx, &mut session, dir.path().join("tts-1"))
            .await
            .unwrap();
        assert_eq!(session.project().len(), 1);
        assert!(session.project().items()[0].has_audio());
    }
}
