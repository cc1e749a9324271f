use std::path::PathBuf;

/// Everything that can go wrong while configuring and running a download.
#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot create or access {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Media resolution failed: {0}")]
    Resolution(String),

    #[error("Audio extraction failed: {0}")]
    Transcode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filesystem_error_names_path() {
        let err = DownloadError::Filesystem {
            path: PathBuf::from("/readonly/out"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let message = err.to_string();
        assert!(message.starts_with("Cannot create or access /readonly/out"));
    }

    #[test]
    fn test_messages_carry_detail() {
        assert_eq!(
            DownloadError::InvalidArgument("bad type".into()).to_string(),
            "Invalid argument: bad type"
        );
        assert_eq!(
            DownloadError::Resolution("HTTP Error 404".into()).to_string(),
            "Media resolution failed: HTTP Error 404"
        );
    }
}
