//! audesc - audio description compositor
//!
//! Narrate a video with timed description clips and mix them over the
//! original soundtrack.
//!
//! # Usage
//!
//! ```bash
//! audesc init --video film.mp4
//! audesc add --at 1:02.5 --text "She opens the door"
//! audesc synthesize
//! audesc preview --start 55 --end 75
//! audesc render
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use audesc::adapters::json_project::JsonProjectStore;
use audesc::app::container::{AppContainer, DefaultAppContainer};
use audesc::cli::commands::{self, CommandContext};
use audesc::cli::{Cli, Commands};
use audesc::config_initialization::initialize_configuration;
use audesc::utils::logging::init_logging;

/// Main entry point for the audesc CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = initialize_configuration(&cli)?;
    init_logging(&config.logging);
    debug!("Configuration: {:?}", config);

    let container = DefaultAppContainer::new(&config).context("Failed to initialize")?;
    let ctx = CommandContext { container, config };

    if !cli.command.needs_project() {
        return match cli.command {
            Commands::Check(args) => commands::check(&ctx, args),
            _ => {
                let selected = match project_file(cli.project.clone()) {
                    Ok(file) => ctx
                        .container
                        .project_interactor()
                        .open(file)
                        .await
                        .ok()
                        .map(|session| session.project().tts_settings.voice_index),
                    Err(_) => None,
                };
                commands::voices(&ctx, selected).await
            }
        };
    }

    let file = project_file(cli.project.clone())?;
    let project_interactor = ctx.container.project_interactor();
    let mut session = project_interactor
        .open(file.clone())
        .await
        .with_context(|| format!("Failed to open project {}", file.display()))?;
    info!("Project {} ({} descriptions)", file.display(), session.project().len());

    let mutates = cli.command.mutates_project();
    let result = match cli.command {
        Commands::Init(args) => commands::init(&ctx, &mut session, args).await,
        Commands::Add(args) => commands::add(&ctx, &mut session, args).await,
        Commands::Edit(args) => commands::edit(&ctx, &mut session, args).await,
        Commands::Remove(args) => commands::remove(&ctx, &mut session, args),
        Commands::List(args) => commands::list(&session, args),
        Commands::ImportSrt(args) => commands::import_srt(&ctx, &mut session, args).await,
        Commands::Set(args) => commands::set(&ctx, &mut session, args),
        Commands::Synthesize(args) => commands::synthesize(&ctx, &mut session, args).await,
        Commands::Render(args) => commands::render(&ctx, &mut session, args).await,
        Commands::Preview(args) => commands::preview(&ctx, &mut session, args).await,
        Commands::Save(args) => commands::save(&ctx, &session, args).await,
        Commands::Load(args) => commands::load(&ctx, &mut session, args).await,
        Commands::Clear(args) => commands::clear(&ctx, &mut session, args),
        Commands::Voices | Commands::Check(_) => Ok(()),
    };

    // Partial progress (an interrupted synthesis batch) is kept as well
    if mutates {
        let saved = project_interactor
            .persist(&session)
            .await
            .with_context(|| format!("Failed to save project {}", file.display()));
        return merge_outcomes(result, saved);
    }

    result
}

/// The command's own error wins; a save failure after it is only logged
fn merge_outcomes(command: Result<()>, saved: Result<()>) -> Result<()> {
    match (command, saved) {
        (Err(command_error), Err(save_error)) => {
            warn!("{:#}", save_error);
            Err(command_error)
        }
        (Ok(()), saved) => saved,
        (command, Ok(())) => command,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_survives_save_failure() {
        let merged = merge_outcomes(Err(anyhow!("render failed")), Err(anyhow!("disk full")));
        assert_eq!(merged.unwrap_err().to_string(), "render failed");

        let merged = merge_outcomes(Ok(()), Err(anyhow!("disk full")));
        assert_eq!(merged.unwrap_err().to_string(), "disk full");

        assert!(merge_outcomes(Ok(()), Ok(())).is_ok());
    }
}

fn project_file(explicit: Option<std::path::PathBuf>) -> Result<std::path::PathBuf> {
    match explicit {
        Some(file) => Ok(file),
        None => JsonProjectStore::autosave_path()
            .ok_or_else(|| anyhow!("No per-user data directory; pass --project <file>")),
    }
}
