// SRT subtitle adapter - Reads SubRip documents as timed cues

use std::path::Path;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

const TIMING_PATTERN: &str = r"^\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{1,3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{1,3})";

/// SubRip (`.srt`) reader
#[derive(Default)]
pub struct SrtSubtitleAdapter;

impl SrtSubtitleAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn timestamp(captures: &regex::Captures<'_>, first: usize) -> Option<f64> {
    let field = |offset: usize| -> Option<f64> { captures.get(first + offset)?.as_str().parse().ok() };
    let millis_text = captures.get(first + 3)?.as_str();
    // "5" after the separator means 500 ms
    let millis = field(3)? * 10f64.powi(3 - millis_text.len() as i32);
    Some(field(0)? * 3600.0 + field(1)? * 60.0 + field(2)? + millis / 1000.0)
}

/// Parse a SubRip document into cues, in document order
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleCue>, DomainError> {
    let timing = Regex::new(TIMING_PATTERN)
        .map_err(|e| DomainError::Subtitle(format!("Invalid timing pattern: {}", e)))?;

    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    let mut flush = |block: &mut Vec<&str>| {
        if let Some(position) = block.iter().position(|line| timing.is_match(line)) {
            if let Some(captures) = timing.captures(block[position]) {
                if let (Some(start), Some(end)) = (timestamp(&captures, 1), timestamp(&captures, 5)) {
                    let text = block[position + 1..]
                        .iter()
                        .map(|line| line.trim())
                        .filter(|line| !line.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ");
                    cues.push(SubtitleCue { start, end, text });
                }
            }
        }
        block.clear();
    };

    for line in content.lines() {
        if line.trim().is_empty() {
            flush(&mut block);
        } else {
            block.push(line);
        }
    }
    flush(&mut block);

    if cues.is_empty() {
        return Err(DomainError::Subtitle(
            "The subtitle file is empty or has no valid entries".to_string(),
        ));
    }
    Ok(cues)
}

#[async_trait]
impl SubtitlePort for SrtSubtitleAdapter {
    async fn load_cues(&self, file_path: &Path) -> Result<Vec<SubtitleCue>, DomainError> {
        if !file_path.exists() {
            return Err(DomainError::FileNotFound(file_path.display().to_string()));
        }

        let bytes = tokio::fs::read(file_path).await?;
        let content = String::from_utf8(bytes).map_err(|_| {
            DomainError::Subtitle(format!("{} is not valid UTF-8", file_path.display()))
        })?;

        let cues = parse_srt(&content)?;
        debug!("Read {} cues from {}", cues.len(), file_path.display());
        Ok(cues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_document() {
        let cues = parse_srt(
            "\u{feff}1\r\n00:00:01,500 --> 00:00:04,000\r\nUna mujer abre\r\nla puerta.\r\n\r\n2\r\n01:02:03,007 --> 01:02:05,000\r\nLlueve.\r\n",
        )
        .unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start, 1.5);
        assert_eq!(cues[0].end, 4.0);
        assert_eq!(cues[0].text, "Una mujer abre la puerta.");
        assert!((cues[1].start - 3723.007).abs() < 1e-9);
    }

    #[test]
    fn test_dot_separator_and_missing_counter() {
        let cues = parse_srt("00:00:10.25 --> 00:00:12.000\nHello\n\n\n\n").unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start, 10.25);
    }

    #[test]
    fn test_blocks_without_timing_are_ignored() {
        let cues = parse_srt("garbage\n\n3\n00:00:02,000 --> 00:00:03,000\nok\n").unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "ok");
    }

    #[test]
    fn test_empty_document_is_error() {
        assert!(matches!(parse_srt(""), Err(DomainError::Subtitle(_))));
        assert!(matches!(parse_srt("not a subtitle"), Err(DomainError::Subtitle(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = SrtSubtitleAdapter::new()
            .load_cues(Path::new("/nonexistent/film.srt"))
            .await;
        assert!(matches!(result, Err(DomainError::FileNotFound(_))));
    }
}
