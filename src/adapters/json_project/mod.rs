// JSON project adapter - Project state persistence

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Fixed file name of the autosaved project
pub const AUTOSAVE_FILE_NAME: &str = "audiodescription_project_autosave.json";
const PROJECT_EXTENSION: &str = "json";

/// Project store writing pretty-printed JSON documents
#[derive(Default)]
pub struct JsonProjectStore;

impl JsonProjectStore {
    pub fn new() -> Self {
        Self
    }

    /// Per-user autosave location
    pub fn autosave_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("audesc").join(AUTOSAVE_FILE_NAME))
    }

    /// Export target with a `.json` extension appended when missing
    pub fn export_path(path: &Path) -> PathBuf {
        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case(PROJECT_EXTENSION));
        if is_json {
            path.to_path_buf()
        } else {
            let mut name = path.as_os_str().to_os_string();
            name.push(".");
            name.push(PROJECT_EXTENSION);
            PathBuf::from(name)
        }
    }

    pub fn parse(content: &str, origin: &Path) -> Result<ProjectState, DomainError> {
        let mut project: ProjectState = serde_json::from_str(content).map_err(|e| {
            DomainError::Project(format!("{} is not a valid project: {}", origin.display(), e))
        })?;
        project.normalize();
        Ok(project)
    }

    fn write_atomically(file_path: &Path, content: &str) -> Result<(), DomainError> {
        let dir = match file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut staging = tempfile::NamedTempFile::new_in(&dir)?;
        staging.write_all(content.as_bytes())?;
        staging.flush()?;
        staging.persist(file_path).map_err(|e| {
            DomainError::Project(format!("Failed to write {}: {}", file_path.display(), e.error))
        })?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStorePort for JsonProjectStore {
    async fn load_project(&self, file_path: &Path) -> Result<ProjectState, DomainError> {
        if !file_path.exists() {
            return Err(DomainError::FileNotFound(file_path.display().to_string()));
        }

        let content = tokio::fs::read_to_string(file_path).await.map_err(|e| {
            DomainError::Project(format!("Failed to read {}: {}", file_path.display(), e))
        })?;
        let project = Self::parse(&content, file_path)?;
        debug!("Loaded {} items from {}", project.len(), file_path.display());
        Ok(project)
    }

    async fn save_project(&self, file_path: &Path, project: &ProjectState) -> Result<(), DomainError> {
        let content = serde_json::to_string_pretty(project)?;
        let target = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::write_atomically(&target, &content))
            .await
            .map_err(|e| DomainError::Project(format!("Save task failed: {}", e)))??;
        debug!("Saved {} items to {}", project.len(), file_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_path_appends_extension() {
        assert_eq!(
            JsonProjectStore::export_path(Path::new("/tmp/my project")),
            PathBuf::from("/tmp/my project.json")
        );
        assert_eq!(
            JsonProjectStore::export_path(Path::new("/tmp/film.srt")),
            PathBuf::from("/tmp/film.srt.json")
        );
        assert_eq!(
            JsonProjectStore::export_path(Path::new("/tmp/film.JSON")),
            PathBuf::from("/tmp/film.JSON")
        );
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("project.json");
        let store = JsonProjectStore::new();

        let mut project = ProjectState::default();
        project.video_path = "/videos/película.mp4".to_string();
        project.volume_original = 0.4;
        project.add_item(AudioDescriptionItem::new(12.0, "/a/b.wav", "Entra María"));
        project.add_item(AudioDescriptionItem::pending(3.5, "Amanece"));

        store.save_project(&path, &project).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("película"));
        assert!(raw.contains("\"audiodescriptions\""));

        let loaded = store.load_project(&path).await.unwrap();
        assert_eq!(loaded, project);
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let store = JsonProjectStore::new();
        let result = store.load_project(Path::new("/nonexistent/project.json")).await;
        assert!(matches!(result, Err(DomainError::FileNotFound(_))));
    }

    #[test]
    fn test_malformed_project_is_error() {
        let result = JsonProjectStore::parse("{\"audiodescriptions\": 3}", Path::new("p.json"));
        assert!(matches!(result, Err(DomainError::Project(_))));
    }

    #[test]
    fn test_load_sorts_items() {
        let project = JsonProjectStore::parse(
            r#"{"audiodescriptions": [
                {"tiempo": 9.0, "archivo_audio": "", "descripcion": "b"},
                {"tiempo": 1.0, "archivo_audio": "", "descripcion": "a"}
            ], "output_file": ""}"#,
            Path::new("p.json"),
        )
        .unwrap();

        assert_eq!(project.items()[0].text, "a");
        assert_eq!(project.output_path, DEFAULT_OUTPUT_FILE);
    }
}
