// Synthesize interactor - Drives text-to-speech over pending items

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::domain::usecases::*;
use crate::ports::*;

/// Interactor for the TTS synthesis driver
pub struct SynthesizeInteractor {
    speech_port: Arc<dyn SpeechPort>,
}

impl SynthesizeInteractor {
    /// Create new synthesize interactor with injected ports
    pub fn new(speech_port: Arc<dyn SpeechPort>) -> Self {
        Self { speech_port }
    }

    pub async fn list_voices(&self) -> Result<Vec<VoiceInfo>, DomainError> {
        self.speech_port.list_voices().await
    }

    /// Resolve the configured voice; an unknown index falls back to the
    /// engine default with a warning.
    async fn select_voice(&self, voice_index: usize, progress: &dyn ProgressSink) -> Option<VoiceInfo> {
        let voices = match self.speech_port.list_voices().await {
            Ok(voices) => voices,
            Err(e) => {
                warn!("Could not list voices: {}", e);
                if voice_index != 0 {
                    progress.warning(format!(
                        "Voice #{} could not be resolved ({}); using the default voice",
                        voice_index, e
                    ));
                }
                return None;
            }
        };

        match voices.get(voice_index) {
            Some(voice) => Some(voice.clone()),
            None => {
                if voice_index != 0 || !voices.is_empty() {
                    let message = format!(
                        "Voice #{} is not available ({} voices installed); using the default voice",
                        voice_index,
                        voices.len()
                    );
                    warn!("{}", message);
                    progress.warning(message);
                }
                None
            }
        }
    }

    /// Synthesize every pending item, in time order.
    ///
    /// The items are handed back in the report whether or not the batch
    /// completes; items finished before a failure keep their audio path.
    pub async fn execute(
        &self,
        mut items: Vec<AudioDescriptionItem>,
        request: SynthesisRequest,
        progress: &dyn ProgressSink,
    ) -> SynthesisReport {
        let pending: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_pending())
            .map(|(index, _)| index)
            .collect();
        let requested = pending.len();

        let mut report = SynthesisReport {
            items: Vec::new(),
            generated: 0,
            requested,
            output_dir: request.output_dir.clone(),
            failure: None,
        };

        if requested == 0 {
            info!("Nothing to synthesize");
            report.items = items;
            return report;
        }

        if let Err(e) = tokio::fs::create_dir_all(&request.output_dir).await {
            report.failure = Some(DomainError::Speech(format!(
                "Cannot create {}: {}",
                request.output_dir.display(),
                e
            )));
            report.items = items;
            return report;
        }

        let voice = self.select_voice(request.settings.voice_index, progress).await;
        info!(
            "Synthesizing {} descriptions into {} (voice: {}, rate: {})",
            requested,
            request.output_dir.display(),
            voice.as_ref().map_or("default", |voice| voice.name.as_str()),
            request.settings.rate
        );

        let mut session = match self
            .speech_port
            .open_session(voice, request.settings.rate)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                report.failure = Some(e);
                report.items = items;
                return report;
            }
        };

        progress.progress(0.0, Some(format!("Synthesizing 1/{}", requested)));
        for (position, &index) in pending.iter().enumerate() {
            let item = &mut items[index];
            let file_name = ItemRules::synthesized_file_name(item.time_seconds, position);
            let output = request.output_dir.join(file_name);

            if let Err(e) = session.synthesize(&item.text, &output).await {
                warn!(
                    "Synthesis stopped at description #{} ({}): {}",
                    index + 1,
                    item.time(),
                    e
                );
                report.failure = Some(e);
                break;
            }

            item.audio_path = output.to_string_lossy().into_owned();
            report.generated += 1;
            progress.progress(
                report.generated as f64 / requested as f64,
                Some(format!("Synthesized {}/{}", report.generated, requested)),
            );
        }

        info!("Synthesized {}/{} descriptions", report.generated, requested);
        report.items = items;
        report
    }
}
