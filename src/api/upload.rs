//
//  atlas-client
//  api/upload.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # File Uploads
//!
//! Version-creating endpoints answer with an `upload_path` on the storage
//! tier rather than accepting the payload themselves. Uploading is two
//! requests:
//!
//! 1. `HEAD <upload_path>`: a `Location` in the answer redirects the upload
//! 2. `PUT <target>` with the payload and an exact `Content-Length`
//!
//! Neither request carries the access token; the upload path itself is the
//! credential. Any non-success status at either step fails the upload and
//! nothing is retried.
//!
//! Payloads are blocking [`Read`]ers (files, [`Archive`]s). They are pumped
//! on the blocking thread pool into a small bounded channel that backs the
//! request body, so only a few chunks are ever held in memory.

use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use reqwest::header::{HeaderValue, CONTENT_LENGTH, LOCATION, USER_AGENT};
use reqwest::{Body, Url};
use tokio::sync::mpsc;

use super::client::{classify, AtlasClient, Response};
use crate::api::common::{ApiError, ApiResult};
use crate::archive::Archive;
use crate::util::format_size;

/// Bytes read from the payload per body chunk.
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the reader thread and the connection.
const CHUNK_DEPTH: usize = 4;

impl AtlasClient {
    /// Uploads `size` bytes from `reader` to a server-issued upload path.
    ///
    /// # Parameters
    ///
    /// * `upload_path` - The `upload_path` from a version-creating call;
    ///   a path starting with `/` goes below the client address (keeping any
    ///   path prefix and the upload path's own query), anything else is
    ///   resolved as a URL reference against it
    /// * `reader` - The payload
    /// * `size` - Exact payload length, sent as `Content-Length`
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidUrl`] if `upload_path` or a redirect target is malformed
    /// - Any classified status error from the preflight or the PUT
    /// - [`ApiError::Network`] if the payload could not be sent, including a
    ///   reader that fails or yields a different number of bytes than `size`
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use atlas_client::api::AtlasClient;
    ///
    /// # async fn example(upload_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    /// let client = AtlasClient::from_env()?;
    /// let file = std::fs::File::open("box.tar.gz")?;
    /// let size = file.metadata()?.len();
    /// client.put_file(upload_path, file, size).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn put_file<R>(&self, upload_path: &str, reader: R, size: u64) -> ApiResult<()>
    where
        R: Read + Send + 'static,
    {
        self.upload(upload_path, reader, Some(size)).await
    }

    /// Uploads an archive, with its size when known.
    ///
    /// A streamed archive does not know its size until it has been read, so
    /// it goes out with chunked transfer encoding instead of a
    /// `Content-Length`. Use [`archive::create_spooled`](crate::archive::create_spooled)
    /// when the storage tier requires a length.
    pub async fn put_archive(&self, upload_path: &str, archive: Archive) -> ApiResult<()> {
        let size = archive.size();
        self.upload(upload_path, archive, size).await
    }

    async fn upload<R>(&self, upload_path: &str, reader: R, size: Option<u64>) -> ApiResult<()>
    where
        R: Read + Send + 'static,
    {
        let target = self.preflight(self.upload_url(upload_path)?).await?;

        match size {
            Some(size) => tracing::info!("Uploading {} to {}", format_size(size), target.path()),
            None => tracing::info!("Uploading stream to {}", target.path()),
        }

        let mut request = self
            .upload_http
            .put(target.clone())
            .header(USER_AGENT, crate::USER_AGENT);
        if let Some(size) = size {
            request = request.header(CONTENT_LENGTH, HeaderValue::from(size));
        }

        let response = request
            .body(Body::wrap_stream(spawn_reader(reader)))
            .send()
            .await?;
        classify(self.protocol, target.path(), Response::buffer(response).await?)?;

        tracing::debug!("Upload to {} complete", target.path());
        Ok(())
    }

    fn upload_url(&self, upload_path: &str) -> ApiResult<Url> {
        if upload_path.starts_with('/') {
            let (path, query) = match upload_path.split_once('?') {
                Some((path, query)) => (path, Some(query)),
                None => (upload_path, None),
            };
            let mut url = self.endpoint(path);
            url.set_query(query);
            return Ok(url);
        }

        self.base_url
            .join(upload_path)
            .map_err(|e| ApiError::InvalidUrl(upload_path.to_string(), e))
    }

    /// Resolves where the payload should actually be sent.
    async fn preflight(&self, url: Url) -> ApiResult<Url> {
        let response = self
            .upload_http
            .head(url.clone())
            .header(USER_AGENT, crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        match location {
            Some(location) if status.is_redirection() || status.is_success() => {
                let target = url
                    .join(&location)
                    .map_err(|e| ApiError::InvalidUrl(location.clone(), e))?;
                tracing::debug!("Upload redirected to {}", target);
                Ok(target)
            }
            None if status.is_success() => Ok(url),
            _ => {
                let response = Response::buffer(response).await?;
                let body = response.text();
                classify(self.protocol, url.path(), response)?;
                Err(ApiError::UnexpectedStatus { status, body })
            }
        }
    }
}

/// Pumps `reader` on the blocking pool into a bounded channel.
fn spawn_reader<R>(mut reader: R) -> ChunkStream
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHUNK_DEPTH);

    tokio::task::spawn_blocking(move || loop {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                chunk.truncate(n);
                // The receiver is gone once the request is dropped.
                if tx.blocking_send(Ok(chunk)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("Upload payload failed: {}", e);
                let _ = tx.blocking_send(Err(e));
                break;
            }
        }
    });

    ChunkStream { rx }
}

/// Request body stream fed by [`spawn_reader`].
struct ChunkStream {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
}

impl Stream for ChunkStream {
    type Item = io::Result<Vec<u8>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{self, ArchiveOptions};
    use mockito::Matcher;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_put_file_sends_exact_length() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/upload/abc123")
            .with_status(200)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/upload/abc123")
            .match_header("content-length", "11")
            .match_header("x-atlas-token", Matcher::Missing)
            .match_body("hello world")
            .with_status(200)
            .create_async()
            .await;

        let client = AtlasClient::new(&server.url()).unwrap().with_token("secret");
        client
            .put_file("/upload/abc123", Cursor::new(b"hello world".to_vec()), 11)
            .await
            .unwrap();

        head.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_preflight_redirect_moves_the_put() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/upload/abc123")
            .with_status(307)
            .with_header("location", "/storage/shard-2/abc123")
            .create_async()
            .await;
        let original_put = server
            .mock("PUT", "/upload/abc123")
            .expect(0)
            .create_async()
            .await;
        let redirected_put = server
            .mock("PUT", "/storage/shard-2/abc123")
            .match_body("payload")
            .with_status(201)
            .create_async()
            .await;

        let client = AtlasClient::new(&server.url()).unwrap();
        let upload_url = format!("{}/upload/abc123", server.url());
        client
            .put_file(&upload_url, Cursor::new(b"payload".to_vec()), 7)
            .await
            .unwrap();

        original_put.assert_async().await;
        redirected_put.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_preflight_skips_upload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/upload/gone")
            .with_status(404)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/upload/gone")
            .expect(0)
            .create_async()
            .await;

        let err = AtlasClient::new(&server.url())
            .unwrap()
            .put_file("/upload/gone", Cursor::new(Vec::new()), 0)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_redirect_without_location_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/upload/odd")
            .with_status(302)
            .create_async()
            .await;

        let err = AtlasClient::new(&server.url())
            .unwrap()
            .put_file("/upload/odd", Cursor::new(Vec::new()), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { status, .. } if status.as_u16() == 302));
    }

    #[tokio::test]
    async fn test_rejected_put() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/upload/full")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("PUT", "/upload/full")
            .with_status(500)
            .with_body("disk full")
            .create_async()
            .await;

        let err = AtlasClient::new(&server.url())
            .unwrap()
            .put_file("/upload/full", Cursor::new(b"x".to_vec()), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedStatus { ref body, .. } if body == "disk full"));
    }

    #[tokio::test]
    async fn test_upload_path_keeps_base_prefix() {
        let mut server = mockito::Server::new_async().await;
        let head = server
            .mock("HEAD", "/atlas/_binstore/abc")
            .match_query(Matcher::UrlEncoded("sig".into(), "xyz".into()))
            .with_status(200)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/atlas/_binstore/abc")
            .match_query(Matcher::UrlEncoded("sig".into(), "xyz".into()))
            .match_body("data")
            .with_status(200)
            .create_async()
            .await;

        AtlasClient::new(&format!("{}/atlas", server.url()))
            .unwrap()
            .put_file("/_binstore/abc?sig=xyz", Cursor::new(b"data".to_vec()), 4)
            .await
            .unwrap();
        head.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_payload_larger_than_one_chunk() {
        let payload: String = (0..CHUNK_SIZE * 3 + 17)
            .map(|i| (b'a' + (i % 26) as u8) as char)
            .collect();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/upload/big")
            .with_status(200)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/upload/big")
            .match_header("content-length", payload.len().to_string().as_str())
            .match_body(payload.as_str())
            .with_status(200)
            .create_async()
            .await;

        let size = payload.len() as u64;
        AtlasClient::new(&server.url())
            .unwrap()
            .put_file("/upload/big", Cursor::new(payload.into_bytes()), size)
            .await
            .unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_spooled_archive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tf"), "resource {}").unwrap();
        let archive = archive::create_spooled(dir.path(), &ArchiveOptions::default()).unwrap();
        let size = archive.size().unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/upload/tf")
            .with_status(200)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/upload/tf")
            .match_header("content-length", size.to_string().as_str())
            .with_status(200)
            .create_async()
            .await;

        AtlasClient::new(&server.url())
            .unwrap()
            .put_archive("/upload/tf", archive)
            .await
            .unwrap();
        put.assert_async().await;
    }
}
