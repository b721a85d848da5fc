// HTTP client for the record service.
//
// Wraps `reqwest::Client` with URL construction and uniform response
// handling. The service keeps no session state, so every method is one
// self-contained request: no retries, no auth, no idempotency keys.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::model::{Country, Tax};
use crate::transport::TransportConfig;

/// Client for the tax record service.
///
/// Exposes the four endpoints the application uses: list/get/update for
/// taxes, list for countries. Any non-2xx status is surfaced uniformly as
/// [`Error::Api`] -- the service does not document status-specific behavior.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client for the service at `base_url` using the given
    /// transport settings.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Used by tests that point at a mock server.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Taxes ────────────────────────────────────────────────────────

    /// Fetch the full tax collection, in service order.
    pub async fn list_taxes(&self) -> Result<Vec<Tax>, Error> {
        let url = self.endpoint(&["taxes"]);
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        Self::parse(resp).await
    }

    /// Fetch one tax by id.
    pub async fn get_tax(&self, id: &str) -> Result<Tax, Error> {
        let url = self.endpoint(&["taxes", id]);
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        Self::parse(resp).await
    }

    /// Replace the tax with id `id` by the given record and return the
    /// service's canonical post-write representation.
    ///
    /// Callers are expected to send the *full* record (freshly fetched, with
    /// the edited fields overlaid) so fields this client never interprets
    /// survive the write.
    pub async fn update_tax(&self, id: &str, tax: &Tax) -> Result<Tax, Error> {
        let url = self.endpoint(&["taxes", id]);
        debug!("PUT {url}");
        let resp = self.http.put(url).json(tax).send().await?;
        Self::parse(resp).await
    }

    // ── Countries ────────────────────────────────────────────────────

    /// Fetch the country lookup collection.
    pub async fn list_countries(&self) -> Result<Vec<Country>, Error> {
        let url = self.endpoint(&["countries"]);
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        Self::parse(resp).await
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Build a full URL under the base by appending path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            // http(s) URLs always have a path; parse() rejected anything else
            .expect("base URL has path segments")
            .pop_if_empty()
            .extend(segments);
        url
    }

    /// Check the status and decode the body, mapping non-2xx to
    /// [`Error::Api`] and decode failures to [`Error::Deserialization`].
    async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
