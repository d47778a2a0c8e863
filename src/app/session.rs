//! Explicit session context
//!
//! A [`Session`] owns the project being edited, the file it is persisted to
//! and the scratch directories created while working on it. Interactors take
//! the session (or the item list moved out of it) as plain parameters.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::ItemRules;
use crate::utils::path::PathUtils;

const SCRATCH_PREFIX: &str = "audesc-";

pub struct Session {
    project: ProjectState,
    project_file: Option<PathBuf>,
    scratch: Option<TempDir>,
}

impl Session {
    pub fn new(project: ProjectState, project_file: Option<PathBuf>) -> Self {
        Self {
            project,
            project_file,
            scratch: None,
        }
    }

    pub fn project(&self) -> &ProjectState {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut ProjectState {
        &mut self.project
    }

    pub fn set_project(&mut self, project: ProjectState) {
        self.project = project;
    }

    /// File the project is loaded from and saved back to
    pub fn project_file(&self) -> Option<&Path> {
        self.project_file.as_deref()
    }

    /// Session-owned scratch directory, created on first use
    pub fn scratch_dir(&mut self) -> Result<PathBuf, DomainError> {
        if self.scratch.is_none() {
            let dir = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
            debug!("Created scratch directory {}", dir.path().display());
            self.scratch = Some(dir);
        }
        match &self.scratch {
            Some(dir) => Ok(dir.path().to_path_buf()),
            None => Err(DomainError::Project("Scratch directory unavailable".to_string())),
        }
    }

    /// Default destination for synthesized clips, unique per session
    pub fn default_tts_dir(&self) -> PathBuf {
        PathUtils::tts_dir(self.project_file(), chrono::Utc::now().timestamp())
    }

    /// True for clips written by the synthesis driver: a `tts_*.wav` file
    /// inside a TTS directory or this session's scratch space
    pub fn is_generated_audio(&self, path: &Path) -> bool {
        if !ItemRules::is_synthesized_audio(path) {
            return false;
        }
        match path.parent() {
            Some(parent) => {
                PathUtils::is_tts_dir(parent)
                    || self.scratch.as_ref().map_or(false, |dir| dir.path() == parent)
            }
            None => false,
        }
    }

    /// Delete the generated clips the items reference, then any TTS directory
    /// left empty. Failures are logged; returns the number of files removed.
    pub fn remove_generated_audio(&self) -> usize {
        let generated: BTreeSet<PathBuf> = self
            .project
            .items()
            .iter()
            .filter(|item| item.has_audio())
            .map(|item| PathBuf::from(&item.audio_path))
            .filter(|path| self.is_generated_audio(path))
            .collect();

        let mut removed = 0;
        let mut parents = BTreeSet::new();
        for path in generated {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not delete {}: {}", path.display(), e),
            }
            if let Some(parent) = path.parent() {
                parents.insert(parent.to_path_buf());
            }
        }

        for dir in parents.iter().filter(|dir| PathUtils::is_tts_dir(dir)) {
            Self::remove_if_empty(dir);
        }
        removed
    }

    fn remove_if_empty(dir: &Path) {
        let is_empty = std::fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            match std::fs::remove_dir(dir) {
                Ok(()) => debug!("Removed {}", dir.display()),
                Err(e) => warn!("Could not delete {}: {}", dir.display(), e),
            }
        }
    }

    fn release_scratch(&mut self) {
        if let Some(dir) = self.scratch.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("Could not delete scratch directory {}: {}", path.display(), e);
            }
        }
    }

    /// Reset to an empty project, deleting generated audio and scratch space
    pub fn clear(&mut self) -> usize {
        let removed = self.remove_generated_audio();
        self.release_scratch();
        self.project = ProjectState::default();
        removed
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release_scratch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let mut session = Session::new(ProjectState::default(), None);
        let scratch = session.scratch_dir().unwrap();
        assert!(scratch.is_dir());
        assert_eq!(session.scratch_dir().unwrap(), scratch);

        drop(session);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_clear_removes_generated_audio_only() {
        let work = tempfile::tempdir().unwrap();
        let tts_dir = work.path().join("film-tts-100");
        std::fs::create_dir_all(&tts_dir).unwrap();
        let generated = tts_dir.join("tts_1_00_000.wav");
        std::fs::write(&generated, b"x").unwrap();
        let manual = work.path().join("narration.wav");
        std::fs::write(&manual, b"x").unwrap();

        let mut project = ProjectState::default();
        project.add_item(AudioDescriptionItem::new(1.0, generated.to_string_lossy(), "a"));
        project.add_item(AudioDescriptionItem::new(5.0, manual.to_string_lossy(), "b"));
        let mut session = Session::new(project, Some(work.path().join("film.json")));

        assert_eq!(session.clear(), 1);
        assert!(!generated.exists());
        assert!(!tts_dir.exists());
        assert!(manual.exists());
        assert!(session.project().is_empty());
    }

    #[test]
    fn test_clear_leaves_user_files_named_like_generated_ones() {
        let work = tempfile::tempdir().unwrap();
        let tts_dir = work.path().join("film-tts-200");
        std::fs::create_dir_all(&tts_dir).unwrap();
        let generated = tts_dir.join("tts_3_00_000.wav");
        let stray = tts_dir.join("tts_9_00_004.wav");
        std::fs::write(&generated, b"x").unwrap();
        std::fs::write(&stray, b"x").unwrap();

        let music = work.path().join("Music");
        std::fs::create_dir_all(&music).unwrap();
        let user_clip = music.join("tts_intro.wav");
        let neighbour = music.join("tts_other_project.wav");
        std::fs::write(&user_clip, b"x").unwrap();
        std::fs::write(&neighbour, b"x").unwrap();

        let mut project = ProjectState::default();
        project.add_item(AudioDescriptionItem::new(3.0, generated.to_string_lossy(), "a"));
        project.add_item(AudioDescriptionItem::new(6.0, user_clip.to_string_lossy(), "b"));
        let mut session = Session::new(project, None);

        assert!(!session.is_generated_audio(&user_clip));
        assert_eq!(session.clear(), 1);
        assert!(!generated.exists());
        assert!(user_clip.exists());
        assert!(neighbour.exists());
        // Files the project never referenced keep their directory alive
        assert!(stray.exists());
        assert!(tts_dir.exists());
    }

    #[test]
    fn test_scratch_clips_count_as_generated() {
        let mut session = Session::new(ProjectState::default(), None);
        let scratch = session.scratch_dir().unwrap();
        assert!(session.is_generated_audio(&scratch.join("tts_1_00_000.wav")));
        assert!(!session.is_generated_audio(&scratch.join("take.wav")));
    }

    #[test]
    fn test_default_tts_dir_next_to_project() {
        let session = Session::new(ProjectState::default(), Some(PathBuf::from("/work/film.json")));
        let dir = session.default_tts_dir();
        assert_eq!(dir.parent(), Some(Path::new("/work")));
        assert!(PathUtils::is_tts_dir(&dir));
    }
}
