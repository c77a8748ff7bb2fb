use crate::resolve::ResolvedStream;

use async_trait::async_trait;
use color_eyre::eyre::{Report, Result, WrapErr};
use futures::StreamExt;
use log::{debug, warn};
use reqwest::{header::COOKIE, Client, Response};
use std::{ffi::OsString, io, path::Path};
use tempfile::TempPath;
use tokio::{fs::File, io::AsyncWriteExt};

/// Saves a resolved stream to disk.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Returns `Ok(false)` if the server would not serve the stream.
    async fn fetch(&self, stream: &ResolvedStream, output: &Path) -> Result<bool>;
}

pub struct Downloader {
    /// Shared between missions; cookies travel per request, never in the client.
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Downloader { client }
    }
}

/// Opens a fresh `.part` file next to `output`. Every attempt gets its own,
/// so missions saving to the same path never write into each other's file.
fn partial_file(output: &Path) -> io::Result<(File, TempPath)> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut prefix = OsString::from(".");
    if let Some(name) = output.file_name() {
        prefix.push(name);
        prefix.push(".");
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix).suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }
    let (file, path) = builder.tempfile_in(dir)?.into_parts();
    Ok((File::from_std(file), path))
}

fn discard(partial: TempPath) {
    let shown = partial.display().to_string();
    if let Err(e) = partial.close() {
        warn!("Failed to remove partial download {shown}: {e}");
    }
}

/// Streams the body into `file` chunk by chunk, returning the byte count.
async fn write_body(response: Response, mut file: File) -> Result<u64> {
    let body = response.bytes_stream();
    futures::pin_mut!(body);
    let mut written = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

#[async_trait]
impl Fetch for Downloader {
    async fn fetch(&self, stream: &ResolvedStream, output: &Path) -> Result<bool> {
        let url = &stream.url;
        let mut request = self.client.get(url.clone());
        if let Some(cookies) = stream.cookie_header() {
            request = request.header(COOKIE, cookies);
        }
        let response = request
            .send()
            .await
            .wrap_err(format!("Failed to request {url}"))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{url} responded with status code {status}");
            return Ok(false);
        }

        // Only a complete download ever shows up under the output name.
        let (file, partial) = partial_file(output)
            .wrap_err(format!("unable to create a partial file for {}", output.display()))?;
        let written = match write_body(response, file).await {
            Ok(written) => written,
            Err(e) => {
                discard(partial);
                return Err(e.wrap_err(format!("Failed to save {url}")));
            }
        };
        if let Err(e) = partial.persist(output) {
            discard(e.path);
            return Err(Report::new(e.error)
                .wrap_err(format!("unable to move download into {}", output.display())));
        }
        debug!("Wrote {written} bytes to {}", output.display());
        Ok(true)
    }
}
