pub mod cli;
pub mod downloader;

pub use downloader::{DownloadError, Downloader};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
