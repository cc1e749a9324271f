mod downloader;
mod errors;
mod ffmpeg;
mod policy;
mod types;
mod utils;
mod ytdlp;

pub use errors::DownloadError;
pub use ffmpeg::FfmpegTranscoder;
pub use policy::{AudioQuality, AudioSettings, AudioStrategy};
pub use types::{DownloadResult, DownloadStatus};
pub use ytdlp::YtDlpResolver;

use crate::utils::{format_duration, format_number};
use downloader::{Resolver, Transcoder};
use errors::Result;
use policy::OutputPolicy;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use types::{DownloadRequest, MediaMetadata};

/// Drives one request through the resolver and, for audio, the transcoder.
pub struct DownloadConfigurator {
    resolver: Box<dyn Resolver>,
    transcoder: Box<dyn Transcoder>,
    audio: AudioSettings,
}

impl DownloadConfigurator {
    pub fn new(
        resolver: Box<dyn Resolver>,
        transcoder: Box<dyn Transcoder>,
        audio: AudioSettings,
    ) -> Self {
        info!(
            "Download configurator initialized - resolver: {}, transcoder: {}, audio strategy: {:?}",
            resolver.name(),
            transcoder.name(),
            audio.strategy
        );

        Self {
            resolver,
            transcoder,
            audio,
        }
    }

    /// Never fails: every error becomes a `Failure` result and a printed diagnostic.
    pub async fn configure_and_run(
        &self,
        url: &str,
        kind: &str,
        destination: impl AsRef<Path>,
    ) -> DownloadResult {
        let destination = destination.as_ref();
        let mut metadata = None;

        match self.execute(url, kind, destination, &mut metadata).await {
            Ok(path) => {
                println!(
                    "Download completed. File saved in {} ({})",
                    destination.display(),
                    path.display()
                );
                DownloadResult::success(metadata.and_then(|m| m.title), path)
            }
            Err(e) => {
                info!("Download of {} failed: {}", url, e);
                println!("An error occurred: {e}");
                DownloadResult::failure(metadata.and_then(|m| m.title), &e)
            }
        }
    }

    async fn execute(
        &self,
        url: &str,
        kind: &str,
        destination: &Path,
        metadata_slot: &mut Option<MediaMetadata>,
    ) -> Result<PathBuf> {
        let request = DownloadRequest::parse(url, kind, destination)?;
        info!(
            "Starting {} download for URL: {}",
            request.kind, request.url
        );

        ensure_destination(&request.destination).await?;

        let metadata = self.resolver.fetch_metadata(&request.url).await?;
        debug!(
            "Resolved {} to id {}",
            request.url,
            metadata.id.as_deref().unwrap_or("unknown")
        );
        announce(&metadata);
        let metadata = metadata_slot.insert(metadata);

        let policy = OutputPolicy::for_kind(request.kind, self.audio, &request.destination);
        let materialized = self.resolver.materialize(&request.url, &policy).await?;
        info!(
            "{} materialized {} for '{}'",
            self.resolver.name(),
            materialized.display(),
            metadata.display_title()
        );

        let Some((codec, quality)) = policy.transcode_step() else {
            return Ok(materialized);
        };

        println!("Converting to {}...", codec.extension());
        // On failure the download stays on disk so it can be converted by hand.
        let audio = self
            .transcoder
            .extract_audio(&materialized, codec, quality)
            .await?;

        if audio == materialized {
            debug!("Transcoded {} in place", audio.display());
        } else if let Err(e) = tokio::fs::remove_file(&materialized).await {
            warn!(
                "Could not remove intermediate file {}: {}",
                materialized.display(),
                e
            );
        }

        Ok(audio)
    }

    pub async fn test_setup(&self) -> anyhow::Result<()> {
        info!("Testing media tool setup...");

        let resolver_available = self.resolver.test_availability().await;
        let transcoder_needed = self.audio.strategy == AudioStrategy::Transcoder;
        // yt-dlp also needs ffmpeg for merging and its own audio extraction.
        let transcoder_available = self.transcoder.test_availability().await;

        if !resolver_available {
            return Err(anyhow::anyhow!(
                "{} is not available. Please install it.",
                self.resolver.name()
            ));
        }

        if !transcoder_available {
            if transcoder_needed {
                return Err(anyhow::anyhow!(
                    "{} is not available but the transcoder audio strategy needs it",
                    self.transcoder.name()
                ));
            }
            warn!("⚠️  merging and audio extraction will fail without ffmpeg");
        }

        Ok(())
    }
}

async fn ensure_destination(destination: &Path) -> Result<()> {
    tokio::fs::create_dir_all(destination)
        .await
        .map_err(|source| DownloadError::Filesystem {
            path: destination.to_path_buf(),
            source,
        })
}

fn announce(metadata: &MediaMetadata) {
    println!("Downloading: {}", metadata.display_title());
    if let Some(uploader) = &metadata.uploader {
        println!("Uploader: {uploader}");
    }
    if let Some(views) = metadata.view_count {
        println!("Views: {}", format_number(views));
    }
    if let Some(duration) = metadata.duration {
        println!("Duration: {}", format_duration(duration));
    }
}
