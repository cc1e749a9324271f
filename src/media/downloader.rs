use super::errors::Result;
use super::policy::{AudioCodec, AudioQuality, OutputPolicy};
use super::types::MediaMetadata;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Turns a URL into metadata and, on request, a file on local disk.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Human-readable name of the resolver
    fn name(&self) -> &'static str;

    /// Query metadata only. Must never start a transfer.
    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata>;

    /// Transfer the representation chosen by `policy` and return the final path.
    async fn materialize(&self, url: &str, policy: &OutputPolicy) -> Result<PathBuf>;

    /// Test if this resolver is available on the system
    async fn test_availability(&self) -> bool;
}

/// Extracts and re-encodes the audio track of a local media file.
#[async_trait]
pub trait Transcoder: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract_audio(
        &self,
        input: &Path,
        codec: AudioCodec,
        quality: AudioQuality,
    ) -> Result<PathBuf>;

    async fn test_availability(&self) -> bool;
}
