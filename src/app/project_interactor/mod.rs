// Project interactor - Editing, import and persistence of the project

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::session::Session;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;
use crate::utils::path::PathUtils;

/// Changes to an existing item; `None` leaves a field as it is
#[derive(Debug, Default, Clone)]
pub struct ItemEdit {
    pub time: Option<TimeSpec>,
    pub text: Option<String>,
    pub audio: Option<PathBuf>,
}

/// Changes to the project settings; `None` leaves a setting as it is
#[derive(Debug, Default, Clone)]
pub struct SettingsUpdate {
    pub volume_original: Option<f64>,
    pub volume_description: Option<f64>,
    pub voice_index: Option<usize>,
    pub rate: Option<i32>,
    pub output: Option<PathBuf>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.volume_original.is_none()
            && self.volume_description.is_none()
            && self.voice_index.is_none()
            && self.rate.is_none()
            && self.output.is_none()
    }
}

/// Interactor for project editing
pub struct ProjectInteractor {
    probe_port: Arc<dyn ProbePort>,
    store_port: Arc<dyn ProjectStorePort>,
    subtitle_port: Arc<dyn SubtitlePort>,
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl ProjectInteractor {
    /// Create new project interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        store_port: Arc<dyn ProjectStorePort>,
        subtitle_port: Arc<dyn SubtitlePort>,
    ) -> Self {
        Self {
            probe_port,
            store_port,
            subtitle_port,
        }
    }

    /// Open the project stored at `file`, or start an empty one when it does not exist yet
    pub async fn open(&self, file: PathBuf) -> Result<Session, DomainError> {
        let project = match self.store_port.load_project(&file).await {
            Ok(project) => project,
            Err(DomainError::FileNotFound(_)) => {
                debug!("No project at {}, starting a new one", file.display());
                ProjectState::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Session::new(project, Some(file)))
    }

    /// Write the session's project back to its own file
    pub async fn persist(&self, session: &Session) -> Result<(), DomainError> {
        match session.project_file() {
            Some(file) => self.store_port.save_project(file, session.project()).await,
            None => Ok(()),
        }
    }

    /// Start a new project on `video`; existing descriptions are dropped
    pub async fn init(
        &self,
        session: &mut Session,
        video: &Path,
        output: Option<&Path>,
    ) -> Result<MediaInfo, DomainError> {
        let media = self.probe_port.probe_media(video).await?;
        let video = absolute(video);
        let output = match output {
            Some(output) => absolute(output),
            None => PathUtils::default_output_path(Some(&video)),
        };

        session.clear();
        let project = session.project_mut();
        project.video_path = video.to_string_lossy().into_owned();
        project.output_path = output.to_string_lossy().into_owned();

        info!(
            "New project on {} ({}, original audio: {})",
            video.display(),
            TimeSpec::from_seconds(media.duration),
            media.has_audio
        );
        Ok(media)
    }

    /// Video duration when it can be determined; used only to validate times
    async fn known_duration(&self, project: &ProjectState) -> Option<f64> {
        let video = project.video()?;
        match self.probe_port.probe_media(video).await {
            Ok(media) => Some(media.duration),
            Err(e) => {
                warn!("Cannot check times against the video: {}", e);
                None
            }
        }
    }

    fn checked_audio(audio: &Path) -> Result<String, DomainError> {
        if !audio.exists() {
            return Err(DomainError::FileNotFound(audio.display().to_string()));
        }
        Ok(absolute(audio).to_string_lossy().into_owned())
    }

    /// Add a description; returns its position in the sorted list
    pub async fn add_item(
        &self,
        session: &mut Session,
        time: TimeSpec,
        audio: Option<&Path>,
        text: Option<String>,
    ) -> Result<usize, DomainError> {
        let text = text.unwrap_or_default();
        if audio.is_none() && text.trim().is_empty() {
            return Err(DomainError::BadArgs(
                "A description needs an audio file or text to synthesize".to_string(),
            ));
        }

        let duration = self.known_duration(session.project()).await;
        ItemRules::validate_time(time.as_seconds(), duration)?;

        let audio_path = match audio {
            Some(audio) => Self::checked_audio(audio)?,
            None => String::new(),
        };
        let index = session
            .project_mut()
            .add_item(AudioDescriptionItem::new(time.as_seconds(), audio_path, text));
        debug!("Added description at {} as #{}", time, index + 1);
        Ok(index)
    }

    /// Apply `edit` to the item at `index`.
    ///
    /// Changing the text of an item whose audio came from synthesis clears
    /// that audio so it is generated again.
    pub async fn edit_item(
        &self,
        session: &mut Session,
        index: usize,
        edit: ItemEdit,
    ) -> Result<(), DomainError> {
        if index >= session.project().len() {
            return Err(DomainError::BadArgs(format!(
                "No description #{} (the project has {})",
                index + 1,
                session.project().len()
            )));
        }
        if let Some(time) = edit.time {
            let duration = self.known_duration(session.project()).await;
            ItemRules::validate_time(time.as_seconds(), duration)?;
        }
        let audio = match &edit.audio {
            Some(audio) => Some(Self::checked_audio(audio)?),
            None => None,
        };

        let generated = session.is_generated_audio(Path::new(&session.project().items()[index].audio_path));
        session.project_mut().update_item(index, |item| {
            if let Some(time) = edit.time {
                item.time_seconds = time.as_seconds();
            }
            if let Some(text) = edit.text {
                let changed = text != item.text;
                item.text = text;
                if changed && audio.is_none() && generated {
                    item.audio_path.clear();
                }
            }
            if let Some(audio) = audio {
                item.audio_path = audio;
            }
        })
    }

    pub fn remove_item(
        &self,
        session: &mut Session,
        index: usize,
    ) -> Result<AudioDescriptionItem, DomainError> {
        session.project_mut().remove_item(index)
    }

    /// Read a subtitle document as pending items, without touching the project
    pub async fn read_subtitles(&self, file: &Path) -> Result<Vec<AudioDescriptionItem>, DomainError> {
        let cues = self.subtitle_port.load_cues(file).await?;
        let mut items: Vec<AudioDescriptionItem> = cues
            .into_iter()
            .map(|cue| AudioDescriptionItem::pending(cue.start, cue.text))
            .collect();
        sort_items(&mut items);
        Ok(items)
    }

    /// Replace every item with `items`, discarding previously generated audio
    pub fn replace_items(&self, session: &mut Session, items: Vec<AudioDescriptionItem>) {
        let removed = session.remove_generated_audio();
        if removed > 0 {
            debug!("Removed {} generated clips before import", removed);
        }
        session.project_mut().replace_items(items);
    }

    pub fn update_settings(&self, session: &mut Session, update: SettingsUpdate) -> Result<(), DomainError> {
        let current = session.project();
        let gains = Gains::new(
            update.volume_original.unwrap_or(current.volume_original),
            update.volume_description.unwrap_or(current.volume_description),
        )?;
        let tts = TtsSettings::new(
            update.voice_index.unwrap_or(current.tts_settings.voice_index),
            update.rate.unwrap_or(current.tts_settings.rate),
        )?;

        let project = session.project_mut();
        project.volume_original = gains.original;
        project.volume_description = gains.description;
        project.tts_settings = tts;
        if let Some(output) = update.output {
            project.output_path = absolute(&output).to_string_lossy().into_owned();
        }
        Ok(())
    }

    /// Export the project; a `.json` extension is appended when missing
    pub async fn export(&self, session: &Session, file: &Path) -> Result<PathBuf, DomainError> {
        let target = crate::adapters::json_project::JsonProjectStore::export_path(file);
        self.store_port.save_project(&target, session.project()).await?;
        info!("Project exported to {}", target.display());
        Ok(target)
    }

    /// Replace the session's project with the one stored in `file`
    pub async fn import(&self, session: &mut Session, file: &Path) -> Result<(), DomainError> {
        let project = self.store_port.load_project(file).await?;
        info!("Loaded {} descriptions from {}", project.len(), file.display());
        session.set_project(project);
        Ok(())
    }

    /// Reset to an empty project; returns the number of generated files deleted
    pub fn clear(&self, session: &mut Session) -> usize {
        let removed = session.clear();
        info!("Project cleared ({} generated clips deleted)", removed);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json_project::JsonProjectStore;
    use crate::adapters::mock::MockProbeAdapter;
    use crate::adapters::srt_subtitles::SrtSubtitleAdapter;

    fn interactor() -> ProjectInteractor {
        ProjectInteractor::new(
            Arc::new(MockProbeAdapter::new(60.0, true)),
            Arc::new(JsonProjectStore::new()),
            Arc::new(SrtSubtitleAdapter::new()),
        )
    }

    fn session_with_video() -> Session {
        let mut project = ProjectState::default();
        project.video_path = "/videos/film.mp4".to_string();
        Session::new(project, None)
    }

    #[tokio::test]
    async fn test_add_keeps_items_sorted() {
        let interactor = interactor();
        let mut session = session_with_video();

        interactor
            .add_item(&mut session, TimeSpec::from_seconds(30.0), None, Some("b".into()))
            .await
            .unwrap();
        let index = interactor
            .add_item(&mut session, TimeSpec::from_seconds(5.0), None, Some("a".into()))
            .await
            .unwrap();

        assert_eq!(index, 0);
        let times: Vec<f64> = session.project().items().iter().map(|i| i.time_seconds).collect();
        assert_eq!(times, vec![5.0, 30.0]);
    }

    #[tokio::test]
    async fn test_add_rejects_time_past_video_end() {
        let interactor = interactor();
        let mut session = session_with_video();

        let result = interactor
            .add_item(&mut session, TimeSpec::from_seconds(61.0), None, Some("late".into()))
            .await;
        assert!(matches!(result, Err(DomainError::BadArgs(_))));
    }

    #[tokio::test]
    async fn test_add_requires_audio_or_text() {
        let interactor = interactor();
        let mut session = session_with_video();

        let result = interactor
            .add_item(&mut session, TimeSpec::from_seconds(1.0), None, Some("  ".into()))
            .await;
        assert!(matches!(result, Err(DomainError::BadArgs(_))));
    }

    #[tokio::test]
    async fn test_edit_text_clears_generated_audio() {
        let interactor = interactor();
        let mut session = session_with_video();
        session
            .project_mut()
            .add_item(AudioDescriptionItem::new(1.0, "/tmp/x-tts-1/tts_1_00_000.wav", "old"));
        session
            .project_mut()
            .add_item(AudioDescriptionItem::new(2.0, "/voice/take.wav", "mine"));

        for index in 0..2 {
            interactor
                .edit_item(
                    &mut session,
                    index,
                    ItemEdit {
                        text: Some("new".into()),
                        ..ItemEdit::default()
                    },
                )
                .await
                .unwrap();
        }

        assert!(session.project().items()[0].is_pending());
        assert_eq!(session.project().items()[1].audio_path, "/voice/take.wav");
    }

    #[tokio::test]
    async fn test_edit_text_keeps_user_clip_named_like_generated() {
        let interactor = interactor();
        let mut session = session_with_video();
        session
            .project_mut()
            .add_item(AudioDescriptionItem::new(4.0, "/voice/tts_x.wav", "mine"));

        interactor
            .edit_item(
                &mut session,
                0,
                ItemEdit {
                    text: Some("reworded".into()),
                    ..ItemEdit::default()
                },
            )
            .await
            .unwrap();

        let item = &session.project().items()[0];
        assert_eq!(item.text, "reworded");
        assert_eq!(item.audio_path, "/voice/tts_x.wav");
    }

    #[tokio::test]
    async fn test_edit_time_resorts() {
        let interactor = interactor();
        let mut session = session_with_video();
        session.project_mut().add_item(AudioDescriptionItem::pending(1.0, "first"));
        session.project_mut().add_item(AudioDescriptionItem::pending(2.0, "second"));

        interactor
            .edit_item(
                &mut session,
                0,
                ItemEdit {
                    time: Some(TimeSpec::from_seconds(9.0)),
                    ..ItemEdit::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(session.project().items()[1].text, "first");
        assert!(interactor
            .edit_item(&mut session, 5, ItemEdit::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_import_subtitles_replaces_items() {
        let dir = tempfile::tempdir().unwrap();
        let srt = dir.path().join("film.srt");
        std::fs::write(
            &srt,
            "1\n00:00:08,000 --> 00:00:09,000\nLater\n\n2\n00:00:02,000 --> 00:00:03,000\nSooner\nline two\n",
        )
        .unwrap();

        let interactor = interactor();
        let mut session = session_with_video();
        session.project_mut().add_item(AudioDescriptionItem::pending(1.0, "old"));

        let items = interactor.read_subtitles(&srt).await.unwrap();
        interactor.replace_items(&mut session, items);

        let texts: Vec<&str> = session.project().items().iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Sooner line two", "Later"]);
        assert!(session.project().items().iter().all(|item| item.is_pending()));
    }

    #[test]
    fn test_update_settings_validates() {
        let interactor = interactor();
        let mut session = session_with_video();

        interactor
            .update_settings(
                &mut session,
                SettingsUpdate {
                    volume_original: Some(0.2),
                    rate: Some(-3),
                    ..SettingsUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(session.project().volume_original, 0.2);
        assert_eq!(session.project().volume_description, DEFAULT_VOLUME_DESCRIPTION);
        assert_eq!(session.project().tts_settings.rate, -3);

        let result = interactor.update_settings(
            &mut session,
            SettingsUpdate {
                volume_description: Some(-1.0),
                rate: Some(20),
                ..SettingsUpdate::default()
            },
        );
        assert!(result.is_err());
        assert_eq!(session.project().tts_settings.rate, -3);
    }

    #[tokio::test]
    async fn test_export_and_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let interactor = interactor();
        let mut session = session_with_video();
        session.project_mut().add_item(AudioDescriptionItem::pending(4.0, "Mañana"));
        session.project_mut().volume_original = 0.3;

        let saved = interactor
            .export(&session, &dir.path().join("backup"))
            .await
            .unwrap();
        assert_eq!(saved, dir.path().join("backup.json"));

        let mut other = Session::new(ProjectState::default(), None);
        interactor.import(&mut other, &saved).await.unwrap();
        assert_eq!(other.project(), session.project());
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let session = interactor()
            .open(dir.path().join("autosave.json"))
            .await
            .unwrap();
        assert!(session.project().is_empty());
        assert_eq!(session.project_file(), Some(dir.path().join("autosave.json").as_path()));
    }
}
