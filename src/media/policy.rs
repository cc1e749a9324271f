use super::errors::{DownloadError, Result};
use super::types::OutputKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const VIDEO_FORMAT_SELECTOR: &str = "bestvideo+bestaudio/best";
pub const AUDIO_FORMAT_SELECTOR: &str = "bestaudio/best";
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

const VBR_BEST: u8 = 0;
const VBR_WORST: u8 = 9;
const MIN_BITRATE_KBPS: u16 = 8;
const MAX_BITRATE_KBPS: u16 = 320;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Mp3,
}

impl AudioCodec {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
        }
    }

    pub fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "libmp3lame",
        }
    }
}

/// Target audio quality: a VBR level where 0 is best, or a constant bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AudioQuality {
    Vbr(u8),
    Bitrate(u16),
}

impl AudioQuality {
    pub const BEST: AudioQuality = AudioQuality::Vbr(VBR_BEST);

    pub fn vbr(level: u8) -> Result<Self> {
        if level > VBR_WORST {
            return Err(DownloadError::Config(format!(
                "VBR quality must be between {VBR_BEST} (best) and {VBR_WORST}, got {level}"
            )));
        }
        Ok(AudioQuality::Vbr(level))
    }

    pub fn bitrate(kbps: u16) -> Result<Self> {
        if !(MIN_BITRATE_KBPS..=MAX_BITRATE_KBPS).contains(&kbps) {
            return Err(DownloadError::Config(format!(
                "bitrate must be between {MIN_BITRATE_KBPS}k and {MAX_BITRATE_KBPS}k, got {kbps}k"
            )));
        }
        Ok(AudioQuality::Bitrate(kbps))
    }

    /// Value for `yt-dlp --audio-quality`.
    pub fn ytdlp_value(&self) -> String {
        match self {
            AudioQuality::Vbr(level) => level.to_string(),
            AudioQuality::Bitrate(kbps) => format!("{kbps}K"),
        }
    }

    /// Encoder flag and value for ffmpeg.
    pub fn ffmpeg_args(&self) -> [String; 2] {
        match self {
            AudioQuality::Vbr(level) => ["-q:a".to_string(), level.to_string()],
            AudioQuality::Bitrate(kbps) => ["-b:a".to_string(), format!("{kbps}k")],
        }
    }
}

impl Default for AudioQuality {
    fn default() -> Self {
        AudioQuality::BEST
    }
}

impl FromStr for AudioQuality {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_ascii_lowercase();
        if value == "best" {
            return Ok(AudioQuality::BEST);
        }

        if let Some(kbps) = value.strip_suffix('k') {
            let kbps = kbps
                .parse::<u16>()
                .map_err(|_| DownloadError::Config(format!("invalid bitrate '{s}'")))?;
            return AudioQuality::bitrate(kbps);
        }

        let level = value
            .parse::<u8>()
            .map_err(|_| DownloadError::Config(format!("invalid audio quality '{s}'")))?;
        AudioQuality::vbr(level)
    }
}

impl TryFrom<String> for AudioQuality {
    type Error = DownloadError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AudioQuality> for String {
    fn from(quality: AudioQuality) -> Self {
        match quality {
            AudioQuality::BEST => "best".to_string(),
            AudioQuality::Vbr(level) => level.to_string(),
            AudioQuality::Bitrate(kbps) => format!("{kbps}k"),
        }
    }
}

/// Which collaborator turns a download into an audio file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioStrategy {
    /// The resolver runs its own extract-audio post-processor.
    #[default]
    Resolver,
    /// The resolver only downloads; the transcoder extracts afterwards.
    Transcoder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    ResolverExtract {
        codec: AudioCodec,
        quality: AudioQuality,
    },
    Transcode {
        codec: AudioCodec,
        quality: AudioQuality,
    },
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub strategy: AudioStrategy,
    pub quality: AudioQuality,
}

/// How a single request is fetched and finished, derived from its output kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPolicy {
    format_selector: &'static str,
    merge_format: Option<&'static str>,
    post_process: Option<PostProcess>,
    output_template: PathBuf,
}

impl OutputPolicy {
    pub fn for_kind(kind: OutputKind, audio: AudioSettings, destination: &Path) -> Self {
        let output_template = destination.join(OUTPUT_TEMPLATE);

        match kind {
            OutputKind::Video => Self {
                format_selector: VIDEO_FORMAT_SELECTOR,
                merge_format: Some(OutputKind::Video.extension()),
                post_process: None,
                output_template,
            },
            OutputKind::Audio => {
                let codec = AudioCodec::Mp3;
                let quality = audio.quality;
                let post_process = match audio.strategy {
                    AudioStrategy::Resolver => PostProcess::ResolverExtract { codec, quality },
                    AudioStrategy::Transcoder => PostProcess::Transcode { codec, quality },
                };
                Self {
                    format_selector: AUDIO_FORMAT_SELECTOR,
                    merge_format: None,
                    post_process: Some(post_process),
                    output_template,
                }
            }
        }
    }

    pub fn format_selector(&self) -> &str {
        self.format_selector
    }

    pub fn merge_format(&self) -> Option<&str> {
        self.merge_format
    }

    pub fn post_process(&self) -> Option<PostProcess> {
        self.post_process
    }

    pub fn output_template(&self) -> &Path {
        &self.output_template
    }

    /// Settings the resolver must apply itself, if any.
    pub fn resolver_extraction(&self) -> Option<(AudioCodec, AudioQuality)> {
        match self.post_process() {
            Some(PostProcess::ResolverExtract { codec, quality }) => Some((codec, quality)),
            _ => None,
        }
    }

    /// Settings for a separate transcoder pass, if any.
    pub fn transcode_step(&self) -> Option<(AudioCodec, AudioQuality)> {
        match self.post_process() {
            Some(PostProcess::Transcode { codec, quality }) => Some((codec, quality)),
            _ => None,
        }
    }
}
