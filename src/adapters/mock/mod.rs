//! In-memory port implementations for tests and dry runs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Probe answering from fixed tables
pub struct MockProbeAdapter {
    video_duration: f64,
    video_has_audio: bool,
    clips: HashMap<PathBuf, f64>,
}

impl MockProbeAdapter {
    pub fn new(video_duration: f64, video_has_audio: bool) -> Self {
        Self {
            video_duration,
            video_has_audio,
            clips: HashMap::new(),
        }
    }

    /// Register an audio clip and its duration
    pub fn with_clip(mut self, path: impl Into<PathBuf>, duration: f64) -> Self {
        self.clips.insert(path.into(), duration);
        self
    }
}

#[async_trait]
impl ProbePort for MockProbeAdapter {
    async fn probe_media(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
        Ok(MediaInfo {
            path: file_path.to_path_buf(),
            duration: self.video_duration,
            has_video: true,
            has_audio: self.video_has_audio,
        })
    }

    async fn probe_audio_duration(&self, file_path: &Path) -> Result<f64, DomainError> {
        self.clips
            .get(file_path)
            .copied()
            .ok_or_else(|| DomainError::Probe(format!("Unknown clip {}", file_path.display())))
    }
}

/// Renderer that records plans and writes a placeholder output
#[derive(Default)]
pub struct MockRenderAdapter {
    plans: Mutex<Vec<CompositionPlan>>,
    fail_with: Option<String>,
}

impl MockRenderAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every render fails with a `Render` error carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            plans: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Plans received so far
    pub fn plans(&self) -> Vec<CompositionPlan> {
        self.plans.lock().map(|plans| plans.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RenderPort for MockRenderAdapter {
    async fn render(
        &self,
        _video: &Path,
        plan: &CompositionPlan,
        output: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<(), DomainError> {
        if let Ok(mut plans) = self.plans.lock() {
            plans.push(plan.clone());
        }
        if let Some(message) = &self.fail_with {
            return Err(DomainError::Render(message.clone()));
        }

        progress.progress(0.5, None);
        tokio::fs::write(output, b"rendered").await?;
        progress.progress(1.0, None);
        Ok(())
    }
}

/// Speech engine writing tiny placeholder files
#[derive(Default)]
pub struct MockSpeechAdapter {
    voices: Vec<VoiceInfo>,
    fail_on_call: Option<usize>,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl MockSpeechAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voice(mut self, id: &str, language: Option<&str>) -> Self {
        self.voices.push(VoiceInfo {
            id: id.to_string(),
            name: id.to_string(),
            language: language.map(str::to_string),
        });
        self
    }

    /// The `n`th utterance (0-based) of each session fails
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Texts synthesized so far, in call order
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|spoken| spoken.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechPort for MockSpeechAdapter {
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, DomainError> {
        Ok(self.voices.clone())
    }

    async fn open_session(
        &self,
        voice: Option<VoiceInfo>,
        rate: i32,
    ) -> Result<Box<dyn SpeechSession>, DomainError> {
        Ok(Box::new(MockSpeechSession {
            voice: voice.map(|voice| voice.id),
            rate,
            calls: 0,
            fail_on_call: self.fail_on_call,
            spoken: Arc::clone(&self.spoken),
        }))
    }
}

struct MockSpeechSession {
    voice: Option<String>,
    rate: i32,
    calls: usize,
    fail_on_call: Option<usize>,
    spoken: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SpeechSession for MockSpeechSession {
    async fn synthesize(&mut self, text: &str, output: &Path) -> Result<(), DomainError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on_call == Some(call) {
            return Err(DomainError::Speech(format!("engine refused '{}'", text)));
        }

        let content = format!(
            "voice={} rate={} text={}",
            self.voice.as_deref().unwrap_or("default"),
            self.rate,
            text
        );
        tokio::fs::write(output, content).await?;
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
        Ok(())
    }
}
