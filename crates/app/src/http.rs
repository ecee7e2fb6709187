//! HTTP collaborators: bundle download and upload
//!
//! Plain one-shot requests, no retry or timeout policy; a failed
//! transfer fails the whole run.

use std::path::Path;

use reqwest::{Client, StatusCode};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(StatusCode),

    #[error("upload response '{0}' does not contain a usable remote id")]
    BadUploadResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download `url` to a local file
pub async fn download(client: &Client, url: &Url, dest: &Path) -> Result<(), HttpError> {
    let response = client.get(url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(HttpError::Status(response.status()));
    }

    // bundles are single zip files, small enough to buffer
    let bytes = response.bytes().await?;
    tokio::fs::write(dest, &bytes).await?;
    Ok(())
}

/// Upload a bundle archive, returning the remote id assigned by the host
///
/// The host answers with the public URL of the upload; the remote id is
/// its last path segment minus the `.zip` suffix.
pub async fn upload(
    client: &Client,
    endpoint: &str,
    archive_name: &str,
    archive: Vec<u8>,
    expire_hours: u32,
) -> Result<String, HttpError> {
    let part = reqwest::multipart::Part::bytes(archive)
        .file_name(archive_name.to_string())
        .mime_str("application/zip")?;
    let form = reqwest::multipart::Form::new()
        .part("file", part)
        .text("expire", expire_hours.to_string());

    let response = client.post(endpoint).multipart(form).send().await?;
    if !response.status().is_success() {
        return Err(HttpError::Status(response.status()));
    }

    let body = response.text().await?;
    parse_remote_id(&body).ok_or_else(|| HttpError::BadUploadResponse(body.trim().to_string()))
}

fn parse_remote_id(body: &str) -> Option<String> {
    let segment = body.trim().rsplit('/').next()?;
    let remote = segment.strip_suffix(".zip").unwrap_or(segment);
    (!remote.is_empty()).then(|| remote.to_string())
}
