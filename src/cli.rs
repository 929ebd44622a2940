// Command-line arguments

use clap::Parser;
use std::path::PathBuf;

use crate::downloader::{
    ClientConfig, DownloadOptions, DownloadRequest, PlatformRegistry, Result,
};

const AFTER_HELP: &str = "\
Examples:
  mget https://www.youtube.com/watch?v=VIDEO_ID
  mget --audio https://www.youtube.com/watch?v=VIDEO_ID
  mget -a https://youtu.be/VIDEO_ID

Supported Platforms:
  - YouTube (youtube.com, youtu.be, m.youtube.com)

Output:
  Downloads are saved to ~/mget-downloads/ unless --output is given
  Files are automatically named with UUIDs to avoid conflicts";

/// mget - A simple and efficient command-line tool for downloading media from various platforms
#[derive(Debug, Parser)]
#[command(name = "mget", disable_version_flag = true, after_help = AFTER_HELP)]
pub struct Args {
    /// URL of the video to download
    pub url: Option<String>,

    /// Download only the audio track (MP3 format)
    #[arg(short, long)]
    pub audio: bool,

    /// Directory to save downloads in
    #[arg(short, long, env = "MGET_OUTPUT_DIR", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// SOCKS5/HTTP proxy, e.g. socks5://127.0.0.1:1080
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// cookies.txt file passed to yt-dlp
    #[arg(long, value_name = "FILE")]
    pub cookies: Option<PathBuf>,

    /// Path to the yt-dlp binary
    #[arg(long = "yt-dlp", value_name = "PATH")]
    pub ytdlp: Option<PathBuf>,

    /// Network timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub timeout: u32,

    /// Don't render a progress bar
    #[arg(short, long)]
    pub quiet: bool,

    /// Log pipeline stages to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Show version information
    #[arg(short = 'v', long)]
    pub version: bool,
}

impl Args {
    pub fn request(&self) -> Option<DownloadRequest> {
        self.url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .map(|u| DownloadRequest::new(u, self.audio))
    }

    /// The request after the checks that need no network: URL shape, platform and video ID
    pub fn checked_request(&self, registry: &PlatformRegistry) -> Result<Option<DownloadRequest>> {
        let Some(request) = self.request() else {
            return Ok(None);
        };

        let classified = registry.classify(&request.url)?;
        if let Some(handler) = registry.handler(classified.platform) {
            handler.extract_id(&classified.url)?;
        }

        Ok(Some(request))
    }

    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions::default().with_output_dir(self.output.clone())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_ytdlp_path(self.ytdlp.clone())
            .with_proxy(self.proxy.clone())
            .with_cookies_path(self.cookies.clone())
            .with_timeout(self.timeout)
    }

    /// Filter used when RUST_LOG is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "mget=debug,mget_lib=debug"
        } else {
            "warn"
        }
    }
}
