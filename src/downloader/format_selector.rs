// FormatSelector - picks the encoding to download and the size to report
//
// Policy:
// - only encodings that carry an audio channel are considered
// - first one whose MIME type contains `video/mp4` (or `audio/mp4`) wins

use super::errors::{DownloadError, Result};
use super::models::{Encoding, MediaKind, VideoDescriptor};

pub struct FormatSelector;

impl FormatSelector {
    /// First audio-carrying encoding matching the kind's MIME filter
    pub fn select(video: &VideoDescriptor, kind: MediaKind) -> Result<&Encoding> {
        let mime = kind.mime_filter();
        video
            .with_audio_channels()
            .find(|e| e.mime_type.contains(mime))
            .ok_or(DownloadError::NoFormatFound {
                kind: kind.label(),
                mime,
            })
    }

    /// Stream-open length wins, then the declared length; `None` when neither is known
    pub fn effective_total(stream_length: u64, declared: Option<u64>) -> Option<u64> {
        if stream_length > 0 {
            return Some(stream_length);
        }
        declared.filter(|len| *len > 0)
    }

    /// Format file size for display
    pub fn format_size(bytes: Option<u64>) -> String {
        match bytes {
            Some(b) => {
                let mb = b as f64 / 1_048_576.0;
                if mb >= 1024.0 {
                    format!("{:.1} GB", mb / 1024.0)
                } else {
                    format!("{:.1} MB", mb)
                }
            }
            None => "unknown size".to_string(),
        }
    }
}
