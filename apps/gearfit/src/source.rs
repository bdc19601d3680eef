//! # Item Sources
//!
//! Concrete implementations of the core `ItemSource` trait: an HTTP source
//! backed by a blocking reqwest client and a local file source.
//!
//! Both are blocking. Callers on an async runtime must use them from
//! `spawn_blocking`.

use crate::config::Config;
use gearfit_core::{GearError, ItemSource};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum payload accepted from either source (64 MB).
const MAX_PAYLOAD_SIZE: u64 = 64 * 1024 * 1024;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Read at most `limit` bytes, failing if `reader` holds more.
fn read_capped(reader: impl Read, limit: u64, origin: &str) -> Result<Vec<u8>, GearError> {
    let mut body = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|e| GearError::Io(format!("Failed reading body from {}: {}", origin, e)))?;
    if body.len() as u64 > limit {
        return Err(GearError::InvalidPayload(format!(
            "payload from {} exceeds {} bytes",
            origin, limit
        )));
    }
    Ok(body)
}

// =============================================================================
// HTTP
// =============================================================================

/// Fetches the raw item payload with a GET request.
pub struct HttpItemSource {
    http: reqwest::blocking::Client,
    url: String,
    max_payload: u64,
}

impl HttpItemSource {
    pub fn new(url: impl Into<String>) -> Result<Self, GearError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("gearfit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GearError::Io(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            max_payload: MAX_PAYLOAD_SIZE,
        })
    }

    /// Override the body size limit.
    #[must_use]
    pub fn with_max_payload(mut self, max_payload: u64) -> Self {
        self.max_payload = max_payload;
        self
    }
}

impl ItemSource for HttpItemSource {
    fn fetch(&self) -> Result<Vec<u8>, GearError> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .map_err(|e| GearError::Io(format!("Cannot reach {}: {}", self.url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GearError::Io(format!("{} returned {}", self.url, status)));
        }
        if resp.content_length().is_some_and(|len| len > self.max_payload) {
            return Err(GearError::InvalidPayload(format!(
                "payload exceeds {} bytes",
                self.max_payload
            )));
        }

        // Chunked bodies carry no length, so the limit is enforced while reading.
        read_capped(resp, self.max_payload, &self.url)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Reads the raw item payload from disk.
#[derive(Debug, Clone)]
pub struct FileItemSource {
    path: PathBuf,
}

impl FileItemSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ItemSource for FileItemSource {
    fn fetch(&self) -> Result<Vec<u8>, GearError> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| {
            GearError::Io(format!("Cannot read '{}': {}", self.path.display(), e))
        })?;
        if metadata.len() > MAX_PAYLOAD_SIZE {
            return Err(GearError::InvalidPayload(format!(
                "File size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_PAYLOAD_SIZE
            )));
        }
        std::fs::read(&self.path)
            .map_err(|e| GearError::Io(format!("Cannot read '{}': {}", self.path.display(), e)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// Always fails; used when no source is configured so a durable snapshot
/// can still be served.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredSource;

impl ItemSource for UnconfiguredSource {
    fn fetch(&self) -> Result<Vec<u8>, GearError> {
        Err(GearError::Io(
            "no item source configured (set --source-url or --source-file)".to_string(),
        ))
    }

    fn describe(&self) -> String {
        "unconfigured".to_string()
    }
}

/// Build the item source named by `config`. A file wins over a URL.
pub fn from_config(config: &Config) -> Result<Box<dyn ItemSource>, GearError> {
    if let Some(path) = &config.catalog.source_file {
        return Ok(Box::new(FileItemSource::new(path.clone())));
    }
    if let Some(url) = &config.catalog.source_url {
        return Ok(Box::new(HttpItemSource::new(url.clone())?));
    }
    tracing::warn!("No item source configured; only a stored snapshot can be served");
    Ok(Box::new(UnconfiguredSource))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_reads_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("items.json");
        std::fs::write(&path, b"[]").expect("write");
        let source = FileItemSource::new(&path);
        assert_eq!(source.fetch().expect("fetch"), b"[]".to_vec());
    }

    #[test]
    fn read_capped_rejects_oversized_body() {
        let data = vec![b'x'; 33];
        let ok = read_capped(data.as_slice(), 33, "test").expect("within limit");
        assert_eq!(ok.len(), 33);
        assert!(matches!(
            read_capped(data.as_slice(), 32, "test"),
            Err(GearError::InvalidPayload(_))
        ));
    }

    #[test]
    fn chunked_http_body_is_capped() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let chunk = "y".repeat(64);
            let response = format!(
                concat!(
                    "HTTP/1.1 200 OK\r\n",
                    "Transfer-Encoding: chunked\r\n",
                    "Connection: close\r\n\r\n",
                    "{:x}\r\n{}\r\n0\r\n\r\n",
                ),
                chunk.len(),
                chunk
            );
            stream.write_all(response.as_bytes()).expect("write");
        });

        let source = HttpItemSource::new(format!("http://{}/items.json", addr))
            .expect("client")
            .with_max_payload(16);
        assert!(matches!(source.fetch(), Err(GearError::InvalidPayload(_))));
        server.join().expect("server");
    }

    #[test]
    fn missing_file_is_io_error() {
        let source = FileItemSource::new("/definitely/not/here.json");
        assert!(matches!(source.fetch(), Err(GearError::Io(_))));
    }

    #[test]
    fn unconfigured_source_fails() {
        assert!(UnconfiguredSource.fetch().is_err());
        let source = from_config(&Config::default()).expect("source");
        assert_eq!(source.describe(), "unconfigured");
    }
}
