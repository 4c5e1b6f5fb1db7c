//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, ResumePolicy};

/// Media stream downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "streamvault",
    version,
    about = "Download a media stream with pause, resume and cancel",
    long_about = "Resolve a media URL into quality-tagged streams and download one of them.\n\n\
                  While downloading, type 'p' and Enter to pause or resume, 'c' and Enter to cancel.\n\
                  Ctrl-C also cancels. Partial files are kept on disk."
)]
pub struct Args {
    /// Media URL: a direct media file or a JSON stream manifest.
    pub url: String,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory", env = "STREAMVAULT_DIR")]
    pub download_directory: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "streamvault.toml")]
    pub config: PathBuf,

    /// Quality label to download (e.g. 720p). Defaults to the best offered.
    #[arg(short, long)]
    pub quality: Option<String>,

    /// List the offered qualities and exit.
    #[arg(long)]
    pub list: bool,

    /// Restart from the beginning on resume instead of continuing.
    #[arg(long)]
    pub restart_on_resume: bool,

    /// Bytes copied per chunk.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Hide download progress information.
    #[arg(long)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(dir) = &self.download_directory {
            config.download.directory = Some(dir.clone());
        }

        if let Some(chunk_size) = self.chunk_size {
            config.download.chunk_size = chunk_size;
        }

        // Boolean flags (only override if set to non-default)
        if self.restart_on_resume {
            config.download.resume_policy = ResumePolicy::Restart;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let args = Args::try_parse_from(["streamvault", "https://example.com/a.mp4"]).unwrap();
        assert_eq!(args.url, "https://example.com/a.mp4");
        assert_eq!(args.config, PathBuf::from("streamvault.toml"));
        assert!(args.quality.is_none());
        assert!(!args.list);
    }

    #[test]
    fn test_url_required() {
        assert!(Args::try_parse_from(["streamvault"]).is_err());
    }

    #[test]
    fn test_merge_overrides() {
        let args = Args::try_parse_from([
            "streamvault",
            "-d",
            "/tmp/out",
            "-q",
            "720p",
            "--chunk-size",
            "4096",
            "--restart-on-resume",
            "https://example.com/manifest.json",
        ])
        .unwrap();

        let mut config = Config::default();
        args.merge_into_config(&mut config);

        assert_eq!(config.download.directory, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.download.chunk_size, 4096);
        assert_eq!(config.download.resume_policy, ResumePolicy::Restart);
        assert_eq!(args.quality.as_deref(), Some("720p"));
    }

    #[test]
    fn test_merge_keeps_file_values() {
        let args = Args::try_parse_from(["streamvault", "https://example.com/a.mp4"]).unwrap();

        let mut config = Config::default();
        config.download.chunk_size = 8192;
        config.download.resume_policy = ResumePolicy::Continue;
        args.merge_into_config(&mut config);

        assert_eq!(config.download.chunk_size, 8192);
        assert_eq!(config.download.resume_policy, ResumePolicy::Continue);
        assert!(config.download.directory.is_none());
    }
}
