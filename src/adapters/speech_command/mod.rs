//! Command-line speech engine adapter
//!
//! Drives an external TTS program (`espeak-ng` by default) through an
//! argument template. One session keeps the resolved voice and rate and
//! spawns the program once per utterance.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::adapters::toml_config::SpeechConfig;
use crate::domain::errors::*;
use crate::domain::model::{MAX_TTS_RATE, MIN_TTS_RATE};
use crate::ports::*;

const BASE_WORDS_PER_MINUTE: i32 = 175;
const WORDS_PER_MINUTE_STEP: i32 = 15;
const MIN_WORDS_PER_MINUTE: i32 = 80;
const MAX_WORDS_PER_MINUTE: i32 = 450;

/// Speech adapter backed by an external command
pub struct CommandSpeechAdapter {
    config: SpeechConfig,
}

impl CommandSpeechAdapter {
    pub fn new(config: SpeechConfig) -> Self {
        Self { config }
    }
}

/// Words per minute for a `-10..=10` rate
pub fn words_per_minute(rate: i32) -> i32 {
    (BASE_WORDS_PER_MINUTE + WORDS_PER_MINUTE_STEP * rate)
        .clamp(MIN_WORDS_PER_MINUTE, MAX_WORDS_PER_MINUTE)
}

/// Values substituted into the argument template
pub struct TemplateValues<'a> {
    pub voice: Option<&'a str>,
    pub rate: i32,
    pub output: &'a Path,
    pub text: &'a str,
}

/// Expand `{voice}`, `{rate}`, `{wpm}`, `{output}` and `{text}`.
///
/// Without a voice the `{voice}` argument is dropped together with the flag
/// right before it, so the engine falls back to its default voice.
pub fn expand_args(template: &[String], values: &TemplateValues<'_>) -> Vec<String> {
    let mut args: Vec<String> = Vec::with_capacity(template.len());
    let output = values.output.to_string_lossy();
    let rate = values.rate.to_string();
    let wpm = words_per_minute(values.rate).to_string();

    for arg in template {
        if arg.contains("{voice}") {
            match values.voice {
                Some(voice) => args.push(arg.replace("{voice}", voice)),
                None => {
                    if args.last().map_or(false, |flag| flag.starts_with('-')) {
                        args.pop();
                    }
                }
            }
            continue;
        }

        args.push(
            arg.replace("{rate}", &rate)
                .replace("{wpm}", &wpm)
                .replace("{output}", &output)
                .replace("{text}", values.text),
        );
    }
    args
}

/// Parse a voice listing.
///
/// Understands the `espeak`/`espeak-ng --voices` table (header starting with
/// `Pty`); any other listing is read as `<id> [language] ...` per line.
pub fn parse_voice_list(listing: &str) -> Vec<VoiceInfo> {
    let mut lines = listing.lines().filter(|line| !line.trim().is_empty()).peekable();

    let espeak_table = lines
        .peek()
        .map_or(false, |header| header.trim_start().starts_with("Pty"));

    if espeak_table {
        lines.next();
        return lines
            .filter_map(|line| {
                let columns: Vec<&str> = line.split_whitespace().collect();
                if columns.len() < 4 {
                    return None;
                }
                Some(VoiceInfo {
                    id: columns[1].to_string(),
                    name: columns[3].replace('_', " "),
                    language: Some(columns[1].to_string()),
                })
            })
            .collect();
    }

    lines
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let id = columns.next()?;
            Some(VoiceInfo {
                id: id.to_string(),
                name: id.to_string(),
                language: columns.next().map(str::to_string),
            })
        })
        .collect()
}

fn launch_error(program: &str, error: std::io::Error) -> DomainError {
    match error.kind() {
        std::io::ErrorKind::NotFound => DomainError::DependencyMissing(format!(
            "Speech engine '{}' was not found; install it or set speech.program",
            program
        )),
        _ => DomainError::Speech(format!("Failed to run {}: {}", program, error)),
    }
}

#[async_trait]
impl SpeechPort for CommandSpeechAdapter {
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, DomainError> {
        let output = Command::new(&self.config.voices_program)
            .args(&self.config.voices_args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| launch_error(&self.config.voices_program, e))?;

        if !output.status.success() {
            return Err(DomainError::Speech(format!(
                "Voice listing failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!("Speech engine offers {} voices", voices.len());
        Ok(voices)
    }

    async fn open_session(
        &self,
        voice: Option<VoiceInfo>,
        rate: i32,
    ) -> Result<Box<dyn SpeechSession>, DomainError> {
        if !(MIN_TTS_RATE..=MAX_TTS_RATE).contains(&rate) {
            return Err(DomainError::BadArgs(format!(
                "Speech rate {} is outside {}..={}",
                rate, MIN_TTS_RATE, MAX_TTS_RATE
            )));
        }

        Ok(Box::new(CommandSpeechSession {
            program: self.config.program.clone(),
            template: self.config.args.clone(),
            voice: voice.map(|voice| voice.id),
            rate,
        }))
    }
}

/// A voice/rate pair bound to the configured program
pub struct CommandSpeechSession {
    program: String,
    template: Vec<String>,
    voice: Option<String>,
    rate: i32,
}

#[async_trait]
impl SpeechSession for CommandSpeechSession {
    async fn synthesize(&mut self, text: &str, output: &Path) -> Result<(), DomainError> {
        let args = expand_args(
            &self.template,
            &TemplateValues {
                voice: self.voice.as_deref(),
                rate: self.rate,
                output,
                text,
            },
        );
        debug!("Running {} {:?}", self.program, args);

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| launch_error(&self.program, e))?;

        if !result.status.success() {
            return Err(DomainError::Speech(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        if !output.exists() {
            warn!("{} reported success without writing {}", self.program, output.display());
            return Err(DomainError::Speech(format!(
                "No audio was written to {}",
                output.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Vec<String> {
        SpeechConfig::default().args
    }

    #[test]
    fn test_words_per_minute() {
        assert_eq!(words_per_minute(0), 175);
        assert_eq!(words_per_minute(10), 325);
        assert_eq!(words_per_minute(-10), 80);
        assert_eq!(words_per_minute(-6), 85);
    }

    #[test]
    fn test_expand_args_with_voice() {
        let args = expand_args(
            &template(),
            &TemplateValues {
                voice: Some("es"),
                rate: 2,
                output: Path::new("/tmp/tts_1_00_000.wav"),
                text: "Un perro cruza la calle",
            },
        );

        assert_eq!(
            args,
            vec![
                "-v",
                "es",
                "-s",
                "205",
                "-w",
                "/tmp/tts_1_00_000.wav",
                "Un perro cruza la calle"
            ]
        );
    }

    #[test]
    fn test_expand_args_without_voice_drops_flag() {
        let args = expand_args(
            &template(),
            &TemplateValues {
                voice: None,
                rate: 0,
                output: Path::new("out.wav"),
                text: "hello",
            },
        );

        assert_eq!(args, vec!["-s", "175", "-w", "out.wav", "hello"]);
    }

    #[test]
    fn test_parse_espeak_voices() {
        let listing = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
             5  af              --/M      Afrikaans          gmw/af\n \
             5  es              --/M      Spanish_(Spain)    roa/es\n";

        let voices = parse_voice_list(listing);
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[1].id, "es");
        assert_eq!(voices[1].name, "Spanish (Spain)");
        assert_eq!(voices[1].language.as_deref(), Some("es"));
    }

    #[test]
    fn test_parse_plain_voices() {
        let voices = parse_voice_list("Alex en_US # Most people\n\nMonica es_MX\n");
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].id, "Alex");
        assert_eq!(voices[1].language.as_deref(), Some("es_MX"));
    }

    #[tokio::test]
    async fn test_rate_out_of_range_rejected() {
        let adapter = CommandSpeechAdapter::new(SpeechConfig::default());
        let result = adapter.open_session(None, 11).await;
        assert!(matches!(result, Err(DomainError::BadArgs(_))));
    }
}
