//! Terminal rendering of job events

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::worker::JobEvent;

const BAR_LENGTH: u64 = 1000;

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(BAR_LENGTH);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ");
    pb.set_style(style);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Draw events until the job ends; returns the warnings it published
pub async fn render_events(mut events: UnboundedReceiver<JobEvent>) -> Vec<String> {
    let pb = progress_bar();
    let mut label = String::new();
    let mut warnings = Vec::new();

    while let Some(event) = events.recv().await {
        match event {
            JobEvent::Started { label: started } => {
                pb.set_message(started.clone());
                label = started;
            }
            JobEvent::Progress { fraction, message } => {
                pb.set_position((fraction * BAR_LENGTH as f64).round() as u64);
                if let Some(message) = message {
                    pb.set_message(message);
                }
            }
            JobEvent::Warning(message) => {
                pb.suspend(|| eprintln!("warning: {}", message));
                warnings.push(message);
            }
            JobEvent::Finished => {
                pb.finish_and_clear();
                break;
            }
            JobEvent::Failed(reason) => {
                pb.abandon_with_message(format!("{} failed: {}", label, reason));
                break;
            }
        }
    }

    if !pb.is_finished() {
        pb.finish_and_clear();
    }
    warnings
}
