//! Blocking HTTP transport over libcurl.
//!
//! A single GET primitive is enough for the whole installer: the release
//! index query, the archive download and the helper-script download all go
//! through [`Transport::fetch`]. The trait exists so tests can drive the
//! pipeline without a network.

use std::time::Duration;
use thiserror::Error;

/// Error from one fetch: curl failure or non-2xx response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, DNS, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u32 },
}

/// Seam between the installer stages and the network.
pub trait Transport {
    /// GET `url` with the given headers and return the full response body.
    fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, FetchError>;
}

/// Production transport: one curl Easy handle per request, redirects
/// followed, bounded connect and total timeouts.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            // Generous total budget; the archive is tens of megabytes.
            timeout: Duration::from_secs(600),
        }
    }
}

impl Transport for CurlTransport {
    fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>, FetchError> {
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        // GitHub rejects requests without a User-Agent.
        easy.useragent("sdi/0.1")?;

        let mut list = curl::easy::List::new();
        for (name, value) in headers {
            list.append(&format!("{}: {}", name.trim(), value.trim()))?;
        }
        if !headers.is_empty() {
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        if !(200..300).contains(&status) {
            return Err(FetchError::Http {
                url: url.to_string(),
                status,
            });
        }
        Ok(body)
    }
}
