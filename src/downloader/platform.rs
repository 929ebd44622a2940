// Platform registry - maps a URL's host to a supported platform

use std::fmt;
use url::Url;

use super::errors::{DownloadError, Result};
use super::youtube::YoutubeHandler;

/// Supported media source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Youtube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Youtube => "youtube",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-platform host matching and ID extraction
pub trait PlatformHandler: Send + Sync {
    fn platform(&self) -> Platform;

    /// Known hostnames, already normalized
    fn hosts(&self) -> &[&'static str];

    /// Exact match or dotted suffix (`sub.youtube.com` matches `youtube.com`)
    fn matches_host(&self, host: &str) -> bool {
        !host.is_empty()
            && self.hosts().iter().any(|known| {
                host == *known
                    || host
                        .strip_suffix(known)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
    }

    fn extract_id(&self, url: &Url) -> Result<String>;
}

/// A URL whose host belongs to a known platform
#[derive(Debug, Clone)]
pub struct Classified {
    pub platform: Platform,
    pub url: Url,
}

/// Immutable set of platform handlers, consulted in order
pub struct PlatformRegistry {
    handlers: Vec<Box<dyn PlatformHandler>>,
}

impl PlatformRegistry {
    pub fn new(handlers: Vec<Box<dyn PlatformHandler>>) -> Self {
        Self { handlers }
    }

    /// Parse, normalize the host and find the owning platform
    pub fn classify(&self, input: &str) -> Result<Classified> {
        let url = parse_request_url(input)?;
        let host = normalize_host(url.as_ref().and_then(Url::host_str).unwrap_or(""));

        match (url, self.handlers.iter().find(|h| h.matches_host(&host))) {
            (Some(url), Some(handler)) => Ok(Classified {
                platform: handler.platform(),
                url,
            }),
            _ => Err(DownloadError::UnsupportedPlatform {
                host,
                accepted: self.accepted_sites(),
            }),
        }
    }

    pub fn handler(&self, platform: Platform) -> Option<&dyn PlatformHandler> {
        self.handlers
            .iter()
            .find(|h| h.platform() == platform)
            .map(|h| &**h)
    }

    /// Platform names for error messages, e.g. "youtube"
    pub fn accepted_sites(&self) -> String {
        self.handlers
            .iter()
            .map(|h| h.platform().as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self::new(vec![Box::new(YoutubeHandler)])
    }
}

/// Request-URI rules: an absolute URL, or an absolute path (`Ok(None)`, no host).
///
/// The input is taken verbatim; leading whitespace or control characters make it invalid.
fn parse_request_url(input: &str) -> Result<Option<Url>> {
    let invalid = || DownloadError::InvalidUrl(input.to_string());

    if input.chars().any(|c| c.is_ascii_control()) {
        return Err(invalid());
    }

    match input.chars().next() {
        Some('/') => Ok(None),
        Some(c) if c.is_ascii_alphabetic() => {
            Url::parse(input).map(Some).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

/// Lower-case, drop the port and a leading `www.`
pub fn normalize_host(host: &str) -> String {
    let mut host = host.to_lowercase();

    // Remove port if present
    if let Some(idx) = host.find(':') {
        host.truncate(idx);
    }

    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
