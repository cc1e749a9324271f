use super::{
    downloader::Transcoder,
    errors::{DownloadError, Result},
    policy::{AudioCodec, AudioQuality},
    utils::{failure_detail, check_tool},
};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Output lands next to the input with the codec's extension. When the
    /// input already has that extension ffmpeg writes to a `.part` sibling that
    /// replaces the input afterwards.
    fn output_paths(input: &Path, codec: AudioCodec) -> (PathBuf, PathBuf) {
        let output = input.with_extension(codec.extension());
        if output == input {
            let staging = input.with_extension(format!("part.{}", codec.extension()));
            (staging, output)
        } else {
            (output.clone(), output)
        }
    }

    fn extract_args(
        input: &Path,
        output: &Path,
        codec: AudioCodec,
        quality: AudioQuality,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_os_string());
        args.push("-vn".into());
        args.push("-codec:a".into());
        args.push(codec.ffmpeg_encoder().into());
        args.extend(quality.ffmpeg_args().into_iter().map(OsString::from));
        args.push(output.as_os_str().to_os_string());
        args
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn extract_audio(
        &self,
        input: &Path,
        codec: AudioCodec,
        quality: AudioQuality,
    ) -> Result<PathBuf> {
        let (staging_path, output_path) = Self::output_paths(input, codec);
        info!(
            "Extracting {} audio from {} with ffmpeg",
            codec.extension(),
            input.display()
        );

        let output = Command::new(&self.program)
            .args(Self::extract_args(input, &staging_path, codec, quality))
            .output()
            .await
            .map_err(|e| {
                DownloadError::Transcode(format!("failed to run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            return Err(DownloadError::Transcode(failure_detail(&output)));
        }

        let written = tokio::fs::metadata(&staging_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if written == 0 {
            return Err(DownloadError::Transcode(format!(
                "ffmpeg produced no audio at {}",
                staging_path.display()
            )));
        }

        if staging_path != output_path {
            tokio::fs::rename(&staging_path, &output_path)
                .await
                .map_err(|e| {
                    DownloadError::Transcode(format!(
                        "failed to replace {}: {e}",
                        output_path.display()
                    ))
                })?;
        }

        info!("Wrote {} bytes to {}", written, output_path.display());
        Ok(output_path)
    }

    async fn test_availability(&self) -> bool {
        check_tool(self.program.as_os_str(), "-version").await
    }
}

/// Stand-in ffmpeg that writes a few bytes to its last argument.
#[cfg(all(test, unix))]
pub(super) fn fake_ffmpeg(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-ffmpeg");
    std::fs::write(
        &script,
        "#!/bin/sh\nfor arg; do out=\"$arg\"; done\nprintf encoded > \"$out\"\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths_swap_extension() {
        let (staging, output) =
            FfmpegTranscoder::output_paths(Path::new("out/Big Buck Bunny.webm"), AudioCodec::Mp3);
        assert_eq!(output, PathBuf::from("out/Big Buck Bunny.mp3"));
        assert_eq!(staging, output);
    }

    #[test]
    fn test_output_paths_stage_when_input_has_target_extension() {
        let (staging, output) =
            FfmpegTranscoder::output_paths(Path::new("out/song.mp3"), AudioCodec::Mp3);
        assert_eq!(output, PathBuf::from("out/song.mp3"));
        assert_eq!(staging, PathBuf::from("out/song.part.mp3"));
    }

    #[test]
    fn test_extract_args_for_vbr_best() {
        let args = FfmpegTranscoder::extract_args(
            Path::new("in.webm"),
            Path::new("in.mp3"),
            AudioCodec::Mp3,
            AudioQuality::BEST,
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "-hide_banner",
                "-loglevel",
                "error",
                "-y",
                "-i",
                "in.webm",
                "-vn",
                "-codec:a",
                "libmp3lame",
                "-q:a",
                "0",
                "in.mp3"
            ]
        );
    }

    #[test]
    fn test_extract_args_for_bitrate() {
        let args = FfmpegTranscoder::extract_args(
            Path::new("in.mp4"),
            Path::new("in.mp3"),
            AudioCodec::Mp3,
            AudioQuality::Bitrate(192),
        );
        let pos = args.iter().position(|a| a == "-b:a").unwrap();
        assert_eq!(args[pos + 1], "192k");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_input_with_target_extension_is_replaced_in_place() {
        let dir = tempfile::TempDir::new().unwrap();
        let transcoder = FfmpegTranscoder::new(fake_ffmpeg(dir.path()));
        let input = dir.path().join("song.mp3");
        std::fs::write(&input, b"original").unwrap();

        let output = transcoder
            .extract_audio(&input, AudioCodec::Mp3, AudioQuality::BEST)
            .await
            .unwrap();

        assert_eq!(output, input);
        assert_eq!(std::fs::read(&output).unwrap(), b"encoded");
        assert!(!dir.path().join("song.part.mp3").exists());
    }

    #[tokio::test]
    async fn test_missing_binary_is_transcode_error() {
        let transcoder = FfmpegTranscoder::new("mediagrab-missing-ffmpeg");
        let err = transcoder
            .extract_audio(Path::new("in.webm"), AudioCodec::Mp3, AudioQuality::BEST)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Transcode(_)));
    }

    #[tokio::test]
    #[ignore] // Requires ffmpeg to be installed
    async fn test_ffmpeg_available() {
        assert!(FfmpegTranscoder::new("ffmpeg").test_availability().await);
    }
}
