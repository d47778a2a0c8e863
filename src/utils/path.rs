//! Output and working-directory naming

use std::path::{Path, PathBuf};

use crate::domain::model::DEFAULT_OUTPUT_FILE;
use crate::utils::time::format_time_tag;

const OUTPUT_SUFFIX: &str = "_with_audio_description";
const TTS_DIR_MARKER: &str = "-tts-";
const FALLBACK_STEM: &str = "audesc";

/// Path naming helpers
pub struct PathUtils;

impl PathUtils {
    /// Get file stem (name without extension) from path
    pub fn get_stem(path: &Path) -> Option<String> {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .filter(|stem| !stem.is_empty())
    }

    /// `<stem><suffix><.ext>` next to `path`
    fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
        let stem = Self::get_stem(path).unwrap_or_else(|| FALLBACK_STEM.to_string());
        let name = match path.extension() {
            Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
            None => format!("{}{}", stem, suffix),
        };
        path.with_file_name(name)
    }

    /// Default render target for a video: `<stem>_with_audio_description<.ext>`
    pub fn default_output_path(video: Option<&Path>) -> PathBuf {
        match video {
            Some(video) if video.file_stem().is_some() => {
                Self::sibling_with_suffix(video, OUTPUT_SUFFIX)
            }
            _ => PathBuf::from(DEFAULT_OUTPUT_FILE),
        }
    }

    /// Preview target derived from the final output: `<stem>_preview_<start>_<end><.ext>`
    pub fn preview_output_path(output: &Path, start: f64, end: f64) -> PathBuf {
        let suffix = format!(
            "_preview_{}_{}",
            format_time_tag(start),
            format_time_tag(end)
        );
        Self::sibling_with_suffix(output, &suffix)
    }

    /// Directory for synthesized clips: `<dir>/<stem>-tts-<unix_seconds>`
    pub fn tts_dir(project_file: Option<&Path>, unix_seconds: i64) -> PathBuf {
        let stem = project_file
            .and_then(Self::get_stem)
            .unwrap_or_else(|| FALLBACK_STEM.to_string());
        let dir = project_file
            .and_then(Path::parent)
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(format!("{}{}{}", stem, TTS_DIR_MARKER, unix_seconds))
    }

    /// Whether `dir` looks like a directory created by [`PathUtils::tts_dir`]
    pub fn is_tts_dir(dir: &Path) -> bool {
        let Some(name) = dir.file_name() else {
            return false;
        };
        match name.to_string_lossy().rsplit_once(TTS_DIR_MARKER) {
            Some((_, stamp)) => !stamp.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            PathUtils::default_output_path(Some(Path::new("/videos/film.mkv"))),
            PathBuf::from("/videos/film_with_audio_description.mkv")
        );
        assert_eq!(
            PathUtils::default_output_path(None),
            PathBuf::from(DEFAULT_OUTPUT_FILE)
        );
    }

    #[test]
    fn test_preview_output_path() {
        assert_eq!(
            PathUtils::preview_output_path(Path::new("out/film_ad.mp4"), 20.0, 40.5),
            PathBuf::from("out/film_ad_preview_00-00-20_00-00-40.500.mp4")
        );
    }

    #[test]
    fn test_tts_dir() {
        let dir = PathUtils::tts_dir(Some(Path::new("/work/film.json")), 1_700_000_000);
        assert_eq!(dir, PathBuf::from("/work/film-tts-1700000000"));
        assert!(PathUtils::is_tts_dir(&dir));

        assert_eq!(
            PathUtils::tts_dir(None, 5),
            PathBuf::from("./audesc-tts-5")
        );
        assert!(!PathUtils::is_tts_dir(Path::new("/work/film")));
        assert!(!PathUtils::is_tts_dir(Path::new("/work/my-tts-takes")));
    }
}
