use super::errors::{DownloadError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const UNKNOWN_TITLE: &str = "Unknown Title";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Video,
    Audio,
}

impl OutputKind {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Video => "mp4",
            OutputKind::Audio => "mp3",
        }
    }
}

impl FromStr for OutputKind {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(OutputKind::Video),
            "mp3" => Ok(OutputKind::Audio),
            other => Err(DownloadError::InvalidArgument(format!(
                "output type must be 'mp4' or 'mp3', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub kind: OutputKind,
    pub destination: PathBuf,
}

impl DownloadRequest {
    /// Validates the raw CLI values without touching the filesystem or network.
    pub fn parse(url: &str, kind: &str, destination: impl Into<PathBuf>) -> Result<Self> {
        let kind = kind.parse::<OutputKind>()?;
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::InvalidArgument("URL must not be empty".into()));
        }

        Ok(Self {
            url: url.to_string(),
            kind,
            destination: destination.into(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub id: Option<String>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub duration: Option<u64>,
}

impl MediaMetadata {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNKNOWN_TITLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    resolved_title: Option<String>,
    final_file_path: Option<PathBuf>,
    status: DownloadStatus,
    error_message: Option<String>,
}

impl DownloadResult {
    pub fn success(resolved_title: Option<String>, final_file_path: PathBuf) -> Self {
        Self {
            resolved_title,
            final_file_path: Some(final_file_path),
            status: DownloadStatus::Success,
            error_message: None,
        }
    }

    pub fn failure(resolved_title: Option<String>, error: &DownloadError) -> Self {
        Self {
            resolved_title,
            final_file_path: None,
            status: DownloadStatus::Failure,
            error_message: Some(error.to_string()),
        }
    }

    pub fn resolved_title(&self) -> Option<&str> {
        self.resolved_title.as_deref()
    }

    pub fn final_file_path(&self) -> Option<&Path> {
        self.final_file_path.as_deref()
    }

    pub fn status(&self) -> DownloadStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}
