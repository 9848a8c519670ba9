//! Downloads the package behind an `apk` scan result.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::ScanResult;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

const FALLBACK_FILE_NAME: &str = "download.apk";

#[derive(Debug, Clone)]
pub(crate) struct ApkDownloader {
    http_client: Client,
    download_dir: PathBuf,
}

impl ApkDownloader {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            download_dir: config.download_dir.clone(),
        })
    }

    /// Streams the package linked by `result` into the download directory.
    ///
    /// # Returns
    /// * `Ok(PathBuf)` with the location of the saved file.
    /// * `Err(AppError::NotInstallable)` if `result` is not tagged `apk`.
    /// * `Err(AppError::DownloadStatus)` if the server does not answer 2xx.
    pub(crate) async fn download(&self, result: &ScanResult) -> Result<PathBuf> {
        let link = match result {
            ScanResult::Apk { content, .. } => content,
            other => return Err(AppError::NotInstallable(other.tag().to_string())),
        };
        let url = Url::parse(link).map_err(|e| AppError::MalformedUrl {
            input: link.clone(),
            reason: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = self.download_dir.join(file_name_for(&url));

        tracing::info!(target: "download_task", "Downloading {} to {}", url, path.display());
        let response = self.http_client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            tracing::warn!(target: "download_task", "Server answered {} for {}", response.status(), url);
            return Err(AppError::DownloadStatus {
                status: response.status(),
                url: url.to_string(),
            });
        }

        let progress_bar = match response.content_length() {
            Some(len) => ProgressBar::new(len).with_style(
                ProgressStyle::with_template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
            ),
            None => ProgressBar::new_spinner(),
        };

        let partial = partial_path(&path);
        let written = match write_body(response, &partial, &progress_bar).await {
            Ok(written) => written,
            Err(e) => {
                progress_bar.abandon_with_message("Download failed");
                if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                    tracing::debug!(target: "download_task", "Could not remove {}: {}", partial.display(), remove_err);
                }
                tracing::warn!(target: "download_task", "Download of {} failed: {}", url, e);
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, &path).await?;
        progress_bar.finish_with_message("Download complete");

        tracing::info!(target: "download_task", "Saved {} bytes to {}", written, path.display());
        Ok(path)
    }
}

/// Streams the response body into `partial`, returning the byte count.
async fn write_body(
    response: reqwest::Response,
    partial: &Path,
    progress_bar: &ProgressBar,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        progress_bar.inc(chunk.len() as u64);
    }
    file.flush().await?;
    Ok(written)
}

/// The `.part` sibling a download is written to before it is complete.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

/// Last non-empty path segment of the link, or a fixed fallback name.
fn file_name_for(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}
