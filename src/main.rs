use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod config;
mod media;
mod utils;

use config::{Config, LoggingConfig};
use media::{DownloadConfigurator, DownloadStatus, FfmpegTranscoder, YtDlpResolver};

/// Download a video as mp4 or extract its audio as mp3
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL of the video
    url: String,

    /// Output file type: mp4 for video, mp3 for audio
    #[arg(short = 't', long = "type", default_value = "mp4")]
    kind: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

fn init_logging(logging: &LoggingConfig) {
    let default_level = logging
        .level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::WARN);

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = config::find_config_path();
    let (config, config_error) = match &config_path {
        Some(path) => match Config::from_file(path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
        None => (Config::default(), None),
    };

    init_logging(&config.logging);

    match (&config_path, config_error) {
        (Some(path), None) => info!("Loaded config from: {}", path.display()),
        (_, Some(e)) => warn!("Ignoring config file, using defaults: {:#}", e),
        (None, None) => debug!("No config file found, using defaults"),
    }

    let configurator = DownloadConfigurator::new(
        Box::new(YtDlpResolver::new(config.tools.ytdlp.clone())),
        Box::new(FfmpegTranscoder::new(config.tools.ffmpeg.clone())),
        config.audio,
    );

    if let Err(e) = configurator.test_setup().await {
        warn!("Media tool check failed: {}", e);
    }

    let result = configurator
        .configure_and_run(&args.url, &args.kind, &args.output)
        .await;

    // Failures were already reported; the exit status stays zero.
    match result.status() {
        DownloadStatus::Success => info!(
            "Finished '{}' -> {}",
            result.resolved_title().unwrap_or("Unknown Title"),
            result
                .final_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        ),
        DownloadStatus::Failure => debug!(
            "Finished with failure: {}",
            result.error_message().unwrap_or("unknown error")
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["mediagrab", "https://youtu.be/x"]).unwrap();
        assert_eq!(args.url, "https://youtu.be/x");
        assert_eq!(args.kind, "mp4");
        assert_eq!(args.output, PathBuf::from("."));
    }

    #[test]
    fn test_args_short_and_long_flags() {
        let args =
            Args::try_parse_from(["mediagrab", "-t", "mp3", "-o", "music", "https://youtu.be/x"])
                .unwrap();
        assert_eq!(args.kind, "mp3");
        assert_eq!(args.output, PathBuf::from("music"));

        let args = Args::try_parse_from([
            "mediagrab",
            "https://youtu.be/x",
            "--type",
            "mp4",
            "--output",
            "videos",
        ])
        .unwrap();
        assert_eq!(args.kind, "mp4");
        assert_eq!(args.output, PathBuf::from("videos"));
    }

    #[test]
    fn test_args_require_url() {
        assert!(Args::try_parse_from(["mediagrab"]).is_err());
    }
}
