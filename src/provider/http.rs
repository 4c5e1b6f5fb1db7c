//! Generic HTTP stream provider.
//!
//! Resolves either a direct media URL (one stream) or a JSON stream manifest
//! listing several quality-tagged streams.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use tokio_util::io::StreamReader;
use url::Url;

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::fs::sanitize_extension;
use crate::provider::types::{
    ByteSource, OpenedSource, ResolvedMedia, StreamDescriptor, StreamProvider, DEFAULT_CONTAINER,
};

/// Quality label given to a direct media URL.
pub const SOURCE_QUALITY: &str = "source";

/// Extensions preferred when a MIME type maps to several.
const PREFERRED_CONTAINERS: &[&str] = &["mp4", "webm", "mkv", "mov", "mp3", "m4a", "ogg", "flac"];

/// JSON stream manifest.
#[derive(Debug, Deserialize)]
struct Manifest {
    title: String,
    #[serde(default)]
    streams: Vec<ManifestStream>,
}

#[derive(Debug, Deserialize)]
struct ManifestStream {
    #[serde(default)]
    quality: String,
    url: String,
    #[serde(default)]
    size: u64,
    container: Option<String>,
}

/// Resolves `http(s)` URLs into streams.
pub struct HttpStreamProvider {
    client: Client,
}

impl HttpStreamProvider {
    /// Build a provider with its own HTTP client.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn from_manifest(&self, base: &Url, manifest: Manifest) -> Result<ResolvedMedia> {
        if manifest.streams.is_empty() {
            return Err(Error::NoStreams(format!(
                "manifest for '{}' lists no streams",
                manifest.title
            )));
        }

        let mut streams = Vec::with_capacity(manifest.streams.len());
        for entry in manifest.streams {
            let url = base.join(&entry.url)?;
            let container = entry
                .container
                .as_deref()
                .and_then(sanitize_extension)
                .or_else(|| extension_of(&url))
                .unwrap_or_else(|| DEFAULT_CONTAINER.to_string());
            let source = Arc::new(HttpSource::new(self.client.clone(), url));
            streams.push(
                StreamDescriptor::new(entry.quality, entry.size, source).with_container(container),
            );
        }

        Ok(ResolvedMedia {
            title: manifest.title,
            streams,
        })
    }

    fn from_media_response(&self, url: Url, response: &Response, mime: &str) -> ResolvedMedia {
        let total = response.content_length().unwrap_or(0);
        let title = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .map(|name| strip_extension(&name).to_string())
            .or_else(|| title_from_url(&url))
            .unwrap_or_else(|| url.host_str().unwrap_or("download").to_string());
        let container = extension_of(&url)
            .or_else(|| container_for_mime(mime))
            .unwrap_or_else(|| DEFAULT_CONTAINER.to_string());

        let source = Arc::new(HttpSource::new(self.client.clone(), url));
        ResolvedMedia {
            title,
            streams: vec![StreamDescriptor::new(SOURCE_QUALITY, total, source).with_container(container)],
        }
    }
}

#[async_trait]
impl StreamProvider for HttpStreamProvider {
    async fn resolve(&self, url: &str) -> Result<ResolvedMedia> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| Error::NotFound(format!("'{}' is not a valid URL: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::NotFound(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        tracing::debug!("Resolving {}", parsed);
        let response = self.client.get(parsed.clone()).send().await?;
        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(Error::NotFound(format!("{} returned HTTP {}", parsed, status)));
        }
        if !status.is_success() {
            return Err(Error::Api(format!("{} returned HTTP {}", parsed, status)));
        }

        let mime = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or("").trim().to_lowercase())
            .unwrap_or_default();

        if mime == "application/json" || mime.ends_with("+json") {
            let text = response.text().await?;
            let manifest: Manifest = serde_json::from_str(&text)?;
            return self.from_manifest(&parsed, manifest);
        }

        if is_media(&mime) {
            return Ok(self.from_media_response(parsed, &response, &mime));
        }

        Err(Error::NoStreams(format!(
            "{} serves '{}', not a media stream",
            parsed,
            if mime.is_empty() {
                "unknown content"
            } else {
                mime.as_str()
            }
        )))
    }
}

/// Byte source backed by an HTTP GET, using `Range` to resume.
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn open(&self, offset: u64) -> Result<OpenedSource> {
        let mut request = self.client.get(self.url.clone());
        if offset > 0 {
            request = request.header(header::RANGE, format!("bytes={}-", offset));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("{}: {}", self.url, e)))?;

        let status = response.status();
        if offset > 0 && status == StatusCode::RANGE_NOT_SATISFIABLE {
            // Every byte is already on disk; the copy loop only has to see EOF
            tracing::debug!(url = %self.url, offset, "Range starts at end of stream");
            return Ok(OpenedSource {
                reader: Box::new(tokio::io::empty()),
                offset,
            });
        }
        if !status.is_success() {
            return Err(Error::SourceUnavailable(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        let honored = if offset > 0 && status == StatusCode::PARTIAL_CONTENT {
            offset
        } else {
            0
        };
        tracing::debug!(url = %self.url, requested = offset, honored, "Source opened");

        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));

        Ok(OpenedSource {
            reader: Box::new(StreamReader::new(Box::pin(stream))),
            offset: honored,
        })
    }
}

fn is_media(mime: &str) -> bool {
    mime.starts_with("video/") || mime.starts_with("audio/") || mime == "application/octet-stream"
}

/// Extract `filename` from a Content-Disposition header value.
fn filename_from_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

fn last_segment(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

fn title_from_url(url: &Url) -> Option<String> {
    last_segment(url)
        .map(|segment| strip_extension(&segment).to_string())
        .filter(|title| !title.trim().is_empty())
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

fn extension_of(url: &Url) -> Option<String> {
    let segment = last_segment(url)?;
    let (_, ext) = segment.rsplit_once('.')?;
    sanitize_extension(ext)
}

fn container_for_mime(mime: &str) -> Option<String> {
    let extensions = mime_guess::get_mime_extensions_str(mime)?;
    PREFERRED_CONTAINERS
        .iter()
        .find(|preferred| extensions.contains(*preferred))
        .or_else(|| extensions.first())
        .map(|ext| ext.to_string())
}
