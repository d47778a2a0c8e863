use std::sync::Arc;

use crate::adapters::{
    CommandSpeechAdapter, FFmpegRenderAdapter, JsonProjectStore, SrtSubtitleAdapter,
};
use crate::adapters::toml_config::AppConfig;
use crate::app::{
    project_interactor::ProjectInteractor, render_interactor::RenderInteractor,
    synthesize_interactor::SynthesizeInteractor, worker::JobRunner,
};
use crate::domain::errors::DomainError;
use crate::ports::{ProbePort, ProjectStorePort, RenderPort, SpeechPort, SubtitlePort};

pub trait AppContainer: Send + Sync {
    fn project_interactor(&self) -> Arc<ProjectInteractor>;
    fn render_interactor(&self) -> Arc<RenderInteractor>;
    fn synthesize_interactor(&self) -> Arc<SynthesizeInteractor>;
    fn job_runner(&self) -> JobRunner;
}

pub struct DefaultAppContainer {
    project_interactor: Arc<ProjectInteractor>,
    render_interactor: Arc<RenderInteractor>,
    synthesize_interactor: Arc<SynthesizeInteractor>,
    job_runner: JobRunner,
}

#[cfg(feature = "libav")]
fn probe_adapter(_config: &AppConfig) -> Result<Arc<dyn ProbePort>, DomainError> {
    Ok(Arc::new(crate::adapters::ProbeLibavAdapter::new()?))
}

#[cfg(not(feature = "libav"))]
fn probe_adapter(config: &AppConfig) -> Result<Arc<dyn ProbePort>, DomainError> {
    Ok(Arc::new(crate::adapters::FFprobeAdapter::new(
        config.tools.ffprobe.clone(),
    )))
}

impl DefaultAppContainer {
    /// Wire the production adapters described by `config`
    pub fn new(config: &AppConfig) -> Result<Self, DomainError> {
        config.validate()?;

        let probe_port = probe_adapter(config)?;
        let render_port: Arc<dyn RenderPort> = Arc::new(FFmpegRenderAdapter::new(
            config.tools.ffmpeg.clone(),
            config.render.clone(),
        ));
        let speech_port: Arc<dyn SpeechPort> =
            Arc::new(CommandSpeechAdapter::new(config.speech.clone()));

        Ok(Self::with_ports(probe_port, render_port, speech_port))
    }

    /// Wire arbitrary probe, render and speech ports (mocks in tests)
    pub fn with_ports(
        probe_port: Arc<dyn ProbePort>,
        render_port: Arc<dyn RenderPort>,
        speech_port: Arc<dyn SpeechPort>,
    ) -> Self {
        let store_port: Arc<dyn ProjectStorePort> = Arc::new(JsonProjectStore::new());
        let subtitle_port: Arc<dyn SubtitlePort> = Arc::new(SrtSubtitleAdapter::new());

        let project_interactor = Arc::new(ProjectInteractor::new(
            Arc::clone(&probe_port),
            store_port,
            subtitle_port,
        ));

        let render_interactor = Arc::new(RenderInteractor::new(
            Arc::clone(&probe_port),
            render_port,
        ));

        let synthesize_interactor = Arc::new(SynthesizeInteractor::new(speech_port));

        Self {
            project_interactor,
            render_interactor,
            synthesize_interactor,
            job_runner: JobRunner::new(),
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn project_interactor(&self) -> Arc<ProjectInteractor> {
        Arc::clone(&self.project_interactor)
    }

    fn render_interactor(&self) -> Arc<RenderInteractor> {
        Arc::clone(&self.render_interactor)
    }

    fn synthesize_interactor(&self) -> Arc<SynthesizeInteractor> {
        Arc::clone(&self.synthesize_interactor)
    }

    fn job_runner(&self) -> JobRunner {
        self.job_runner.clone()
    }
}
