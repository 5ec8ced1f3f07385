// Shared HTTP client utilities

use crate::ui;
use crate::verify::ChecksumDownloader;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// User-Agent string for all HTTP requests
const USER_AGENT: &str = concat!("aim/", env!("CARGO_PKG_VERSION"));

lazy_static::lazy_static! {
    /// Shared HTTP client with proper User-Agent
    static ref CLIENT: Client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to create HTTP client");
}

/// Get a reference to the shared HTTP client
#[allow(dead_code)]
pub fn client() -> &'static Client {
    &CLIENT
}

/// Build a GET request, attaching the GitHub token to API requests when
/// one is configured. Unauthenticated API requests are rate-limited hard.
fn get(url: &str) -> reqwest::RequestBuilder {
    let mut builder = CLIENT.get(url);
    if url.starts_with("https://api.github.com/")
        && let Ok(token) = std::env::var("GITHUB_TOKEN")
        && !token.is_empty()
    {
        builder = builder.bearer_auth(token);
    }
    builder
}

/// Fetch JSON from a URL and deserialize it
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T> {
    let response: Response = get(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        anyhow::bail!("Resource not found: {}", url);
    }

    if !response.status().is_success() {
        anyhow::bail!("HTTP request failed: {} ({})", url, response.status());
    }

    let result = response.json().await?;
    Ok(result)
}

/// Fetch a text body from a URL
pub async fn fetch_text(url: &str) -> Result<String> {
    let response: Response = get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP request failed: {} ({})", url, response.status());
    }

    let text = response.text().await?;
    Ok(text)
}

/// Download a file to the given path, streaming chunks straight to disk
/// with a progress bar. Artifacts run to hundreds of megabytes.
pub async fn download_to_path(url: &str, path: &Path, expected_size: u64) -> Result<()> {
    let mut response = get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed: {} ({})", url, response.status());
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download")
        .to_string();

    let total = response.content_length().unwrap_or(expected_size);
    let pb = if total > 0 {
        ui::download_bar(total)
    } else {
        ui::download_bar_indeterminate()
    };
    pb.set_message(name.clone());

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(path).await?;

    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;

    ui::finish_download_success(&pb, &name);
    Ok(())
}

/// Extract filename from Content-Disposition header or URL
#[allow(dead_code)]
pub fn extract_filename(response: &Response, url: &str) -> String {
    // Try Content-Disposition header first
    if let Some(filename) = response
        .headers()
        .get("content-disposition")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| {
            s.split("filename=")
                .nth(1)
                .and_then(|f| f.trim_matches('"').split(';').next())
                .map(|f| f.trim_matches('"').to_string())
        })
    {
        return filename;
    }

    // Fall back to extracting from URL
    url.split('/')
        .next_back()
        .unwrap_or("download.AppImage")
        .split('?')
        .next()
        .unwrap_or("download.AppImage")
        .to_string()
}

/// Checksum download collaborator backed by the shared client.
pub struct HttpChecksumDownloader;

#[async_trait]
impl ChecksumDownloader for HttpChecksumDownloader {
    async fn download_checksum_file(&self, url: &str) -> Result<String> {
        fetch_text(url).await
    }
}
