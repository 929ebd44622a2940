// Common data models for downloader

use std::fmt;
use std::path::PathBuf;

/// Directory name used under the home directory when no output dir is given
pub const DEFAULT_DIR_NAME: &str = "mget-downloads";

/// What the user asked for: full video or audio only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
}

impl MediaKind {
    pub fn from_audio_flag(audio_only: bool) -> Self {
        if audio_only {
            Self::Audio
        } else {
            Self::Video
        }
    }

    /// MIME type an encoding must contain to be picked for this kind
    pub fn mime_filter(&self) -> &'static str {
        match self {
            Self::Video => "video/mp4",
            Self::Audio => "audio/mp4",
        }
    }

    /// Audio is an MP4 audio-only container saved under `.mp3`
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::Audio => "mp3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One available representation of a video
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    /// Format ID (e.g., "18", "140")
    pub format_id: String,
    /// e.g. `video/mp4; codecs="avc1.42001E, mp4a.40.2"`
    pub mime_type: String,
    pub has_audio: bool,
    /// Length declared in the metadata, if any
    pub content_length: Option<u64>,
    /// Direct media URL the stream is opened from
    pub url: String,
    /// Extra headers the media host expects
    pub http_headers: Vec<(String, String)>,
}

/// Video metadata resolved by the extraction client
#[derive(Debug, Clone)]
pub struct VideoDescriptor {
    pub id: String,
    pub title: String,
    pub encodings: Vec<Encoding>,
}

impl VideoDescriptor {
    /// Encodings that carry an audio channel, in original order
    pub fn with_audio_channels(&self) -> impl Iterator<Item = &Encoding> {
        self.encodings.iter().filter(|e| e.has_audio)
    }
}

/// A single invocation's input
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub audio_only: bool,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, audio_only: bool) -> Self {
        Self {
            url: url.into(),
            audio_only,
        }
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_audio_flag(self.audio_only)
    }
}

/// Download options
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
}

impl DownloadOptions {
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// `~/mget-downloads`, or a relative dir when no home is known
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME))
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub path: PathBuf,
    pub title: String,
    pub kind: MediaKind,
    pub bytes_written: u64,
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = match self.kind {
            MediaKind::Video => "Video",
            MediaKind::Audio => "Audio",
        };
        write!(
            f,
            "{} \"{}\" downloaded to {}",
            noun,
            self.title,
            self.path.display()
        )
    }
}

/// Settings for the extraction client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Explicit yt-dlp binary; searched for when unset
    pub ytdlp_path: Option<PathBuf>,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<PathBuf>,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            proxy: None,
            cookies_path: None,
            timeout_seconds: 30,
        }
    }
}

impl ClientConfig {
    pub fn with_ytdlp_path(mut self, path: Option<PathBuf>) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_flag() {
        let video = MediaKind::from_audio_flag(false);
        assert_eq!(video.mime_filter(), "video/mp4");
        assert_eq!(video.extension(), "mp4");

        let audio = DownloadRequest::new("https://youtu.be/dQw4w9WgXcQ", true).kind();
        assert_eq!(audio.mime_filter(), "audio/mp4");
        assert_eq!(audio.extension(), "mp3");
    }

    #[test]
    fn test_default_output_dir_name() {
        let options = DownloadOptions::default();
        assert!(options.output_dir.ends_with(DEFAULT_DIR_NAME));

        let options = options.with_output_dir(Some(PathBuf::from("/tmp/media")));
        assert_eq!(options.output_dir, PathBuf::from("/tmp/media"));
    }

    #[test]
    fn test_outcome_message() {
        let outcome = DownloadOutcome {
            path: PathBuf::from("/out/abc.mp4"),
            title: "Never Gonna Give You Up".into(),
            kind: MediaKind::Video,
            bytes_written: 3,
        };
        assert_eq!(
            outcome.to_string(),
            "Video \"Never Gonna Give You Up\" downloaded to /out/abc.mp4"
        );
    }
}
