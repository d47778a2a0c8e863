// Adapters - External system implementations

pub mod env_tools;
pub mod exec_ffmpeg;
pub mod json_project;
pub mod mock;
pub mod probe_ffprobe;
#[cfg(feature = "libav")]
pub mod probe_libav;
pub mod speech_command;
pub mod srt_subtitles;
pub mod toml_config;

// Re-export adapters
pub use env_tools::EnvToolsAdapter;
pub use exec_ffmpeg::FFmpegRenderAdapter;
pub use json_project::JsonProjectStore;
pub use mock::{MockProbeAdapter, MockRenderAdapter, MockSpeechAdapter};
pub use probe_ffprobe::FFprobeAdapter;
#[cfg(feature = "libav")]
pub use probe_libav::ProbeLibavAdapter;
pub use speech_command::CommandSpeechAdapter;
pub use srt_subtitles::SrtSubtitleAdapter;
pub use toml_config::{AppConfig, TomlConfigAdapter};
