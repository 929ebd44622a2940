// Capabilities the pipeline depends on

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::io;

use super::errors::Result;
use super::models::{Encoding, VideoDescriptor};

/// Readable body plus the length reported when it was opened (0 if unknown)
pub struct MediaStream {
    pub body: BoxStream<'static, io::Result<Bytes>>,
    pub content_length: u64,
}

/// External extraction client: resolves metadata and opens streams
#[async_trait]
pub trait MediaClient: Send + Sync {
    /// Name of the client (for logging)
    fn name(&self) -> &'static str;

    /// Resolve title and available encodings for a video ID
    async fn resolve(&self, video_id: &str) -> Result<VideoDescriptor>;

    /// Open a byte stream for the chosen encoding
    async fn open_stream(&self, video: &VideoDescriptor, encoding: &Encoding)
        -> Result<MediaStream>;
}

/// Receives byte counts while the stream is copied
pub trait ProgressSink: Send {
    /// `None` means the total is unknown
    fn start(&mut self, total: Option<u64>, description: &str);

    fn advance(&mut self, bytes: u64);

    fn finish(&mut self);

    /// Called instead of `finish` when the copy fails
    fn abandon(&mut self);
}
