// Orchestrator - runs one download from URL to file
//
// Idle -> Classified -> IdExtracted -> StreamOpened -> Writing -> Done
// Any error ends the run; nothing is retried.

use std::fmt;

use super::errors::{DownloadError, Result};
use super::format_selector::FormatSelector;
use super::models::{DownloadOptions, DownloadOutcome, DownloadRequest};
use super::output;
use super::platform::PlatformRegistry;
use super::traits::{MediaClient, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Classified,
    IdExtracted,
    StreamOpened,
    Writing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Classified => "classified",
            Self::IdExtracted => "id-extracted",
            Self::StreamOpened => "stream-opened",
            Self::Writing => "writing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

pub struct Downloader {
    registry: PlatformRegistry,
    client: Box<dyn MediaClient>,
    options: DownloadOptions,
}

impl Downloader {
    pub fn new(client: Box<dyn MediaClient>) -> Self {
        Self {
            registry: PlatformRegistry::default(),
            client,
            options: DownloadOptions::default(),
        }
    }

    pub fn with_registry(mut self, registry: PlatformRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    pub async fn download(
        &self,
        request: &DownloadRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<DownloadOutcome> {
        let result = self.run(request, progress).await;
        if let Err(e) = &result {
            tracing::warn!(url = %request.url, error = %e, "download failed");
        }
        result
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        progress: &mut dyn ProgressSink,
    ) -> Result<DownloadOutcome> {
        let kind = request.kind();
        trace_stage(Stage::Idle);

        let classified = self.registry.classify(&request.url)?;
        trace_stage(Stage::Classified);
        tracing::debug!(platform = %classified.platform, "platform identified");

        let handler = self
            .registry
            .handler(classified.platform)
            .ok_or_else(|| DownloadError::UnsupportedPlatform {
                host: classified.url.host_str().unwrap_or("").to_string(),
                accepted: self.registry.accepted_sites(),
            })?;
        let video_id = handler.extract_id(&classified.url)?;
        trace_stage(Stage::IdExtracted);
        tracing::debug!(video_id = %video_id, client = self.client.name(), "resolving video");

        let video = self.client.resolve(&video_id).await?;
        let encoding = FormatSelector::select(&video, kind)?;
        let stream = self.client.open_stream(&video, encoding).await?;
        trace_stage(Stage::StreamOpened);

        let total = FormatSelector::effective_total(stream.content_length, encoding.content_length);
        tracing::debug!(
            format = %encoding.format_id,
            mime = %encoding.mime_type,
            size = %FormatSelector::format_size(total),
            "selected encoding"
        );

        output::ensure_output_dir(&self.options.output_dir).await?;
        trace_stage(Stage::Writing);
        let (path, bytes_written) =
            output::write_stream(&self.options.output_dir, kind, stream, total, progress).await?;
        trace_stage(Stage::Done);

        Ok(DownloadOutcome {
            path,
            title: video.title,
            kind,
            bytes_written,
        })
    }
}

fn trace_stage(stage: Stage) {
    tracing::debug!(stage = %stage, "download stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::{Encoding, VideoDescriptor};
    use crate::downloader::traits::MediaStream;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::{stream, StreamExt};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PAYLOAD: &[u8] = b"fake mp4 payload";

    struct StubClient {
        calls: Arc<AtomicUsize>,
        encodings: Vec<Encoding>,
        stream_length: u64,
    }

    #[async_trait]
    impl MediaClient for StubClient {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn resolve(&self, video_id: &str) -> Result<VideoDescriptor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VideoDescriptor {
                id: video_id.to_string(),
                title: "Never Gonna Give You Up".to_string(),
                encodings: self.encodings.clone(),
            })
        }

        async fn open_stream(
            &self,
            _video: &VideoDescriptor,
            _encoding: &Encoding,
        ) -> Result<MediaStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let chunks = PAYLOAD
                .chunks(5)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect::<Vec<_>>();
            Ok(MediaStream {
                body: stream::iter(chunks).boxed(),
                content_length: self.stream_length,
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        total: Option<Option<u64>>,
        bytes: u64,
        finished: bool,
    }

    impl ProgressSink for Recorder {
        fn start(&mut self, total: Option<u64>, _description: &str) {
            self.total = Some(total);
        }

        fn advance(&mut self, bytes: u64) {
            self.bytes += bytes;
        }

        fn finish(&mut self) {
            self.finished = true;
        }

        fn abandon(&mut self) {}
    }

    fn encoding(id: &str, mime: &str, declared: Option<u64>) -> Encoding {
        Encoding {
            format_id: id.to_string(),
            mime_type: mime.to_string(),
            has_audio: true,
            content_length: declared,
            url: format!("https://media.example/{}", id),
            http_headers: Vec::new(),
        }
    }

    fn downloader(
        dir: &std::path::Path,
        encodings: Vec<Encoding>,
        stream_length: u64,
    ) -> (Downloader, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = StubClient {
            calls: calls.clone(),
            encodings,
            stream_length,
        };
        let options = DownloadOptions::default().with_output_dir(Some(dir.to_path_buf()));
        (Downloader::new(Box::new(client)).with_options(options), calls)
    }

    #[tokio::test]
    async fn test_video_download_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("downloads");
        let (dl, calls) = downloader(
            &out_dir,
            vec![encoding("18", "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"", None)],
            PAYLOAD.len() as u64,
        );
        let mut recorder = Recorder::default();

        let request = DownloadRequest::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ", false);
        let outcome = dl.download(&request, &mut recorder).await.unwrap();

        assert_eq!(outcome.title, "Never Gonna Give You Up");
        assert_eq!(outcome.bytes_written, PAYLOAD.len() as u64);
        assert_eq!(outcome.path.parent().unwrap(), out_dir);
        assert_eq!(outcome.path.extension().unwrap(), "mp4");
        assert_eq!(outcome.path.file_stem().unwrap().len(), 36);
        assert_eq!(std::fs::read(&outcome.path).unwrap(), PAYLOAD);
        assert_eq!(recorder.total, Some(Some(PAYLOAD.len() as u64)));
        assert_eq!(recorder.bytes, PAYLOAD.len() as u64);
        assert!(recorder.finished);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(outcome.to_string().contains("Never Gonna Give You Up"));
    }

    #[tokio::test]
    async fn test_audio_download_uses_declared_length() {
        let tmp = tempfile::tempdir().unwrap();
        let (dl, _) = downloader(
            tmp.path(),
            vec![
                encoding("18", "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"", Some(999)),
                encoding("140", "audio/mp4; codecs=\"mp4a.40.2\"", Some(4242)),
            ],
            0,
        );
        let mut recorder = Recorder::default();

        let request = DownloadRequest::new("https://youtu.be/dQw4w9WgXcQ", true);
        let outcome = dl.download(&request, &mut recorder).await.unwrap();

        assert_eq!(outcome.path.extension().unwrap(), "mp3");
        assert_eq!(recorder.total, Some(Some(4242)));
    }

    #[tokio::test]
    async fn test_unknown_total_is_indeterminate() {
        let tmp = tempfile::tempdir().unwrap();
        let (dl, _) = downloader(tmp.path(), vec![encoding("18", "video/mp4", Some(0))], 0);
        let mut recorder = Recorder::default();

        let request = DownloadRequest::new("https://m.youtube.com/watch?v=dQw4w9WgXcQ", false);
        dl.download(&request, &mut recorder).await.unwrap();

        assert_eq!(recorder.total, Some(None));
    }

    #[tokio::test]
    async fn test_invalid_url_before_network() {
        let tmp = tempfile::tempdir().unwrap();
        let (dl, calls) = downloader(tmp.path(), Vec::new(), 0);

        let request = DownloadRequest::new("not-a-url", false);
        let err = dl.download(&request, &mut Recorder::default()).await.unwrap_err();

        assert!(matches!(err, DownloadError::InvalidUrl(_)));
        assert_eq!(err.to_string(), "invalid video URL");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_platform_lists_sites() {
        let tmp = tempfile::tempdir().unwrap();
        let (dl, calls) = downloader(tmp.path(), Vec::new(), 0);

        let request = DownloadRequest::new("https://example.com/video", false);
        let err = dl.download(&request, &mut Recorder::default()).await.unwrap_err();

        assert!(matches!(err, DownloadError::UnsupportedPlatform { .. }));
        assert!(err.to_string().contains(&dl.registry().accepted_sites()));
        assert!(err.to_string().contains("youtube"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_format_leaves_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out_dir = tmp.path().join("downloads");
        let (dl, calls) = downloader(&out_dir, vec![encoding("43", "video/webm", None)], 0);

        let request = DownloadRequest::new("https://youtu.be/dQw4w9WgXcQ", false);
        let err = dl.download(&request, &mut Recorder::default()).await.unwrap_err();

        assert!(matches!(err, DownloadError::NoFormatFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!out_dir.exists());
    }

    #[tokio::test]
    async fn test_missing_video_id() {
        let tmp = tempfile::tempdir().unwrap();
        let (dl, calls) = downloader(tmp.path(), Vec::new(), 0);

        let request = DownloadRequest::new("https://www.youtube.com/watch?v=short", false);
        let err = dl.download(&request, &mut Recorder::default()).await.unwrap_err();

        assert!(matches!(err, DownloadError::VideoIdNotFound(_)));
        assert!(err.is_input_error());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
