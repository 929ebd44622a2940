// Downloader module - URL classification, extraction and the file writer

pub mod client;
pub mod errors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod platform;
pub mod progress;
pub mod traits;
pub mod youtube;

pub use client::YtDlpClient;
pub use errors::{DownloadError, Result};
pub use format_selector::FormatSelector;
pub use models::{
    ClientConfig, DownloadOptions, DownloadOutcome, DownloadRequest, Encoding, MediaKind,
    VideoDescriptor,
};
pub use orchestrator::{Downloader, Stage};
pub use platform::{Platform, PlatformHandler, PlatformRegistry};
pub use progress::{NoProgress, TerminalProgress};
pub use traits::{MediaClient, MediaStream, ProgressSink};
