// Error types for the download pipeline

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DownloadError>;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Input could not be parsed as an absolute URL
    #[error("invalid video URL")]
    InvalidUrl(String),

    /// Host is not served by any registered platform
    #[error("unsupported website. accepted sites: {accepted}")]
    UnsupportedPlatform { host: String, accepted: String },

    /// Platform was recognized but no path/query shape yielded a valid ID
    #[error("could not extract video ID from URL")]
    VideoIdNotFound(String),

    /// Extraction client could not resolve metadata or open the stream
    #[error("error fetching youtube video: {0}")]
    FetchFailed(String),

    /// No encoding carries audio and the requested MIME type
    #[error("no {kind} format found ({mime})")]
    NoFormatFound { kind: &'static str, mime: &'static str },

    /// Directory creation, file creation or final rename failed
    #[error("{context} {}: {source}", .path.display())]
    OutputIo {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying the stream to disk failed part-way
    #[error("error downloading youtube {kind}: {reason}")]
    DownloadFailed { kind: &'static str, reason: String },
}

impl DownloadError {
    pub fn output_io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OutputIo {
            context,
            path: path.into(),
            source,
        }
    }

    /// True for failures that happen before any network activity
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_) | Self::UnsupportedPlatform { .. } | Self::VideoIdNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            DownloadError::InvalidUrl("not-a-url".into()).to_string(),
            "invalid video URL"
        );
        let unsupported = DownloadError::UnsupportedPlatform {
            host: "example.com".into(),
            accepted: "youtube".into(),
        };
        assert_eq!(
            unsupported.to_string(),
            "unsupported website. accepted sites: youtube"
        );
        let no_format = DownloadError::NoFormatFound {
            kind: "audio",
            mime: "audio/mp4",
        };
        assert_eq!(no_format.to_string(), "no audio format found (audio/mp4)");
    }

    #[test]
    fn test_output_io_keeps_source() {
        let err = DownloadError::output_io(
            "error creating output directory",
            "/nope",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().starts_with("error creating output directory /nope"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_input_error());
    }
}
