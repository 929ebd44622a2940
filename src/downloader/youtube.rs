// YouTube handler - video ID extraction for the known URL shapes
//
// Supported:
// - https://youtu.be/VIDEO_ID
// - https://www.youtube.com/watch?v=VIDEO_ID (also m.youtube.com)
// - https://www.youtube.com/embed/VIDEO_ID
// - https://www.youtube.com/v/VIDEO_ID

use regex::Regex;
use url::Url;

use super::errors::{DownloadError, Result};
use super::platform::{Platform, PlatformHandler};

const HOSTS: &[&str] = &["youtube.com", "youtu.be", "m.youtube.com"];

pub struct YoutubeHandler;

impl PlatformHandler for YoutubeHandler {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    fn hosts(&self) -> &[&'static str] {
        HOSTS
    }

    fn extract_id(&self, url: &Url) -> Result<String> {
        extract_video_id(url)
    }
}

/// Pull the 11-character video ID out of a YouTube URL
pub fn extract_video_id(url: &Url) -> Result<String> {
    let host = url.host_str().unwrap_or("").to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);

    let found = match host {
        "youtu.be" => {
            let candidate = url.path().trim_start_matches('/');
            let candidate = truncate_at(truncate_at(candidate, '?'), '&');
            Some(candidate.to_string()).filter(|id| is_valid_video_id(id))
        }
        "youtube.com" => candidates(url).find(|id| is_valid_video_id(id)),
        _ => None,
    };

    found.ok_or_else(|| DownloadError::VideoIdNotFound(url.to_string()))
}

/// Decoded `v` query parameter, then `/embed/`, then `/v/`
fn candidates(url: &Url) -> impl Iterator<Item = String> + '_ {
    let query = url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty());

    let path = url.path();
    let embed = path.strip_prefix("/embed/").map(str::to_string);
    let legacy = path.strip_prefix("/v/").map(str::to_string);

    [query, embed, legacy]
        .into_iter()
        .flatten()
        .map(|id| truncate_at(id.trim_start_matches('/'), '?').to_string())
}

fn truncate_at(s: &str, delim: char) -> &str {
    match s.find(delim) {
        Some(idx) => &s[..idx],
        None => s,
    }
}

/// Exactly 11 characters of `[A-Za-z0-9_-]`
pub fn is_valid_video_id(id: &str) -> bool {
    lazy_static::lazy_static! {
        static ref VIDEO_ID_RE: Regex = Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap();
    }

    id.len() == 11 && VIDEO_ID_RE.is_match(id)
}
