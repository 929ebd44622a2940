// Output files - naming and the stream-to-disk copy

use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::errors::{DownloadError, Result};
use super::models::MediaKind;
use super::traits::{MediaStream, ProgressSink};

const PARTIAL_SUFFIX: &str = "part";

/// Random 36-character UUID token
pub fn generate_filename() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Idempotent, recursive
pub async fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| DownloadError::output_io("error creating output directory", dir, e))
}

/// Copies the stream into `<dir>/<uuid>.<ext>`, reporting every chunk to `progress`.
///
/// Bytes land in a `.part` file first, which is renamed once the copy completes and
/// removed if it fails.
pub async fn write_stream(
    dir: &Path,
    kind: MediaKind,
    stream: MediaStream,
    total: Option<u64>,
    progress: &mut dyn ProgressSink,
) -> Result<(PathBuf, u64)> {
    let final_path = dir.join(format!("{}.{}", generate_filename(), kind.extension()));
    let partial_path = partial_path_for(&final_path);

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&partial_path)
        .await
        .map_err(|e| DownloadError::output_io("error creating output file", &partial_path, e))?;

    progress.start(total, "Downloading");

    let written = match copy_stream(file, stream, progress).await {
        Ok(written) => written,
        Err(reason) => {
            progress.abandon();
            discard_partial(&partial_path).await;
            return Err(DownloadError::DownloadFailed {
                kind: kind.label(),
                reason,
            });
        }
    };

    progress.finish();

    finalize(&partial_path, &final_path).await?;

    Ok((final_path, written))
}

/// Moves the finished `.part` file into place; the partial file never outlives a failure
async fn finalize(partial_path: &Path, final_path: &Path) -> Result<()> {
    if let Err(e) = fs::rename(partial_path, final_path).await {
        discard_partial(partial_path).await;
        return Err(DownloadError::output_io(
            "error finalizing output file",
            final_path,
            e,
        ));
    }
    Ok(())
}

async fn discard_partial(partial_path: &Path) {
    if let Err(e) = fs::remove_file(partial_path).await {
        tracing::warn!(path = %partial_path.display(), error = %e, "could not remove partial file");
    }
}

async fn copy_stream(
    mut file: fs::File,
    mut stream: MediaStream,
    progress: &mut dyn ProgressSink,
) -> std::result::Result<u64, String> {
    let mut written = 0u64;

    while let Some(chunk) = stream.body.next().await {
        let chunk = chunk.map_err(|e| format!("stream read failed: {}", e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| format!("write failed: {}", e))?;
        written += chunk.len() as u64;
        progress.advance(chunk.len() as u64);
    }

    file.flush()
        .await
        .map_err(|e| format!("flush failed: {}", e))?;

    Ok(written)
}

fn partial_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
