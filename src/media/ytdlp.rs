use super::{
    downloader::Resolver,
    errors::{DownloadError, Result},
    policy::OutputPolicy,
    types::MediaMetadata,
    utils::{failure_detail, check_tool},
};
use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub struct YtDlpResolver {
    program: PathBuf,
}

impl YtDlpResolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn metadata_args(url: &str) -> Vec<OsString> {
        ["--dump-json", "--skip-download", "--no-playlist", "--no-warnings", url]
            .into_iter()
            .map(OsString::from)
            .collect()
    }

    fn download_args(url: &str, policy: &OutputPolicy) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--no-playlist",
            "--no-warnings",
            "--no-progress",
            "--no-simulate",
            "--print",
            "after_move:filepath",
            "--format",
            policy.format_selector(),
            "--output",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(policy.output_template().as_os_str().to_os_string());

        if let Some(merge_format) = policy.merge_format() {
            args.push("--merge-output-format".into());
            args.push(merge_format.into());
        }

        if let Some((codec, quality)) = policy.resolver_extraction() {
            args.push("--extract-audio".into());
            args.push("--audio-format".into());
            args.push(codec.extension().into());
            args.push("--audio-quality".into());
            args.push(quality.ytdlp_value().into());
        }

        args.push(url.into());
        args
    }

    fn parse_metadata(json_str: &str) -> Result<MediaMetadata> {
        let line = json_str
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| DownloadError::Resolution("no metadata returned".into()))?;

        let json: Value = serde_json::from_str(line).map_err(|e| {
            DownloadError::Resolution(format!("failed to parse media metadata: {e}"))
        })?;

        Ok(MediaMetadata {
            title: json["title"].as_str().map(|s| s.to_string()),
            id: json["id"].as_str().map(|s| s.to_string()),
            uploader: json["uploader"]
                .as_str()
                .or(json["channel"].as_str())
                .map(|s| s.to_string()),
            view_count: json["view_count"].as_u64(),
            duration: json["duration"].as_f64().map(|d| d as u64),
        })
    }

    fn final_path(stdout: &str) -> Option<PathBuf> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(PathBuf::from)
    }

    async fn run(&self, args: &[OsString]) -> Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                DownloadError::Resolution(format!(
                    "failed to run {}: {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            return Err(DownloadError::Resolution(failure_detail(&output)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata> {
        debug!("Extracting metadata with yt-dlp for: {}", url);

        let json_str = self.run(&Self::metadata_args(url)).await?;
        let metadata = Self::parse_metadata(&json_str)?;

        debug!("yt-dlp metadata: {:?}", metadata);
        Ok(metadata)
    }

    async fn materialize(&self, url: &str, policy: &OutputPolicy) -> Result<PathBuf> {
        info!(
            "Downloading with yt-dlp using format '{}'",
            policy.format_selector()
        );

        let stdout = self.run(&Self::download_args(url, policy)).await?;
        let path = Self::final_path(&stdout).ok_or_else(|| {
            DownloadError::Resolution("yt-dlp did not report a downloaded file".into())
        })?;

        tokio::fs::metadata(&path).await.map_err(|e| {
            DownloadError::Resolution(format!(
                "downloaded file {} is missing: {e}",
                path.display()
            ))
        })?;

        info!("yt-dlp produced {}", path.display());
        Ok(path)
    }

    async fn test_availability(&self) -> bool {
        let available = check_tool(self.program.as_os_str(), "--version").await;
        if !available {
            warn!("⚠️  downloads will fail until yt-dlp is installed");
        }
        available
    }
}
