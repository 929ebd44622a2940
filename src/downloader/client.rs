// yt-dlp backed extraction client
//
// Metadata comes from `yt-dlp --dump-json`; the chosen format's direct URL is
// then streamed with reqwest so the copy loop sees every chunk.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use super::errors::{DownloadError, Result};
use super::models::{ClientConfig, Encoding, VideoDescriptor};
use super::traits::{MediaClient, MediaStream};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Extra seconds the yt-dlp process gets on top of its socket timeout
const PROCESS_GRACE_SECS: u64 = 30;

const YTDLP_BIN: &str = "yt-dlp";

/// Searched after `PATH`
const INSTALL_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// The parts of `--dump-json` output the client reads
#[derive(Debug, Deserialize)]
struct DumpJson {
    id: Option<String>,
    title: Option<String>,
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    #[serde(default)]
    format_id: String,
    url: Option<String>,
    protocol: Option<String>,
    #[serde(default)]
    ext: String,
    vcodec: Option<String>,
    acodec: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
    #[serde(default)]
    http_headers: BTreeMap<String, String>,
}

impl RawFormat {
    /// Formats without a plain HTTP(S) URL (HLS, DASH manifests, storyboards) are skipped
    fn into_encoding(self) -> Option<Encoding> {
        let url = self.url?;
        if !matches!(self.protocol.as_deref().unwrap_or("https"), "https" | "http") {
            return None;
        }
        if self.ext.is_empty() || self.ext == "mhtml" {
            return None;
        }

        let vcodec = present_codec(self.vcodec.as_deref());
        let acodec = present_codec(self.acodec.as_deref());

        Some(Encoding {
            mime_type: mime_type_for(&self.ext, vcodec, acodec),
            has_audio: acodec.is_some(),
            content_length: self.filesize.or(self.filesize_approx),
            format_id: self.format_id,
            url,
            http_headers: self.http_headers.into_iter().collect(),
        })
    }
}

pub struct YtDlpClient {
    ytdlp_path: PathBuf,
    config: ClientConfig,
    http: reqwest::Client,
}

impl YtDlpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let ytdlp_path = config
            .ytdlp_path
            .clone()
            .unwrap_or_else(Self::find_ytdlp);

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(config.timeout_seconds as u64));

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| DownloadError::FetchFailed(format!("invalid proxy {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| DownloadError::FetchFailed(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ytdlp_path,
            config,
            http,
        })
    }

    /// First `yt-dlp` file on `PATH`, then under the usual install prefixes; bare name otherwise
    fn find_ytdlp() -> PathBuf {
        let on_path = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect::<Vec<_>>())
            .unwrap_or_default();

        on_path
            .into_iter()
            .chain(INSTALL_DIRS.iter().map(PathBuf::from))
            .map(|dir| dir.join(YTDLP_BIN))
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| PathBuf::from(YTDLP_BIN))
    }

    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }

    /// Build command arguments
    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.timeout_seconds.to_string(),
            "--user-agent".to_string(),
            USER_AGENT.to_string(),
        ];

        if let Some(path) = &self.config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push(url.to_string());
        args
    }

    fn parse_json(stdout: &[u8]) -> Result<VideoDescriptor> {
        let dump: DumpJson = serde_json::from_slice(stdout)
            .map_err(|e| DownloadError::FetchFailed(format!("unreadable yt-dlp metadata: {}", e)))?;

        Ok(VideoDescriptor {
            id: dump.id.unwrap_or_else(|| "unknown".to_string()),
            title: dump.title.unwrap_or_else(|| "Unknown".to_string()),
            encodings: dump.formats.into_iter().filter_map(RawFormat::into_encoding).collect(),
        })
    }

    /// Captures yt-dlp's output; the child is killed if `limit` elapses first
    async fn capture(&self, args: &[String], limit: Duration) -> Result<Output> {
        let child = TokioCommand::new(&self.ytdlp_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DownloadError::FetchFailed(format!(
                    "cannot run {}: {}",
                    self.ytdlp_path.display(),
                    e
                ))
            })?;

        match timeout(limit, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| {
                DownloadError::FetchFailed(format!("lost contact with yt-dlp: {}", e))
            }),
            Err(_) => Err(DownloadError::FetchFailed(format!(
                "yt-dlp gave no answer within {}s",
                limit.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl MediaClient for YtDlpClient {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve(&self, video_id: &str) -> Result<VideoDescriptor> {
        let url = format!("{}{}", WATCH_URL, video_id);
        let args = self.build_args(&url);
        tracing::debug!(
            "running {} {}",
            self.ytdlp_path.display(),
            args.join(" ")
        );

        let limit = Duration::from_secs(self.config.timeout_seconds as u64 + PROCESS_GRACE_SECS);
        let output = self.capture(&args, limit).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, "yt-dlp failed");
            return Err(DownloadError::FetchFailed(summarize_stderr(&stderr)));
        }

        let video = Self::parse_json(&output.stdout)?;
        tracing::debug!(
            title = %video.title,
            encodings = video.encodings.len(),
            "resolved video metadata"
        );
        Ok(video)
    }

    async fn open_stream(
        &self,
        video: &VideoDescriptor,
        encoding: &Encoding,
    ) -> Result<MediaStream> {
        tracing::debug!(video = %video.id, format = %encoding.format_id, "opening stream");

        let mut request = self.http.get(&encoding.url);
        for (name, value) in &encoding.http_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DownloadError::FetchFailed(format!("failed to open stream: {}", e)))?;

        let content_length = response.content_length().unwrap_or(0);
        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
            .boxed();

        Ok(MediaStream {
            body,
            content_length,
        })
    }
}

/// `None` for missing or "none" codec fields
fn present_codec(codec: Option<&str>) -> Option<&str> {
    codec.filter(|c| !c.is_empty() && *c != "none")
}

/// e.g. `video/mp4; codecs="avc1.42001E, mp4a.40.2"` or `audio/mp4; codecs="mp4a.40.2"`
fn mime_type_for(ext: &str, vcodec: Option<&str>, acodec: Option<&str>) -> String {
    let container = match ext {
        "m4a" => "mp4",
        "mp3" => "mpeg",
        other => other,
    };
    let top = if vcodec.is_some() { "video" } else { "audio" };

    let codecs: Vec<&str> = [vcodec, acodec].into_iter().flatten().collect();
    if codecs.is_empty() {
        format!("{}/{}", top, container)
    } else {
        format!("{}/{}; codecs=\"{}\"", top, container, codecs.join(", "))
    }
}

/// Last `ERROR:` line from yt-dlp, or the last non-empty line
fn summarize_stderr(stderr: &str) -> String {
    let lines = || stderr.lines().map(str::trim).filter(|l| !l.is_empty());
    lines()
        .filter(|l| l.starts_with("ERROR:"))
        .last()
        .or_else(|| lines().last())
        .unwrap_or("yt-dlp exited with an error")
        .to_string()
}
