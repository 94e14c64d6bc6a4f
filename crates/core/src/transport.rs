//! HTTP seam between the uploader and the FHIR server.
//!
//! The uploader only needs two interactions: a type-level create (`POST
//! {base}/{type}`) and a type-level search (`GET {base}/{type}?param=value`).
//! [`FhirTransport`] captures exactly those so tests can substitute an in-memory
//! server, and [`HttpTransport`] implements them with `reqwest`.

use crate::config::FhirServerConfig;
use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use fhir::FHIR_JSON_CONTENT_TYPE;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

/// Status and body of a completed HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `200 OK` and `201 Created` are the only statuses treated as accepted.
    pub fn is_created_or_ok(&self) -> bool {
        matches!(self.status, 200 | 201)
    }
}

/// The request never produced an HTTP response (connect failure, timeout, TLS).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.to_string())
    }
}

#[async_trait]
pub trait FhirTransport: Send + Sync {
    /// Create a resource of `resource_type` from a serialised JSON body.
    async fn create(
        &self,
        resource_type: &str,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError>;

    /// Search `resource_type` by a single parameter.
    async fn search(
        &self,
        resource_type: &str,
        param: &str,
        value: &str,
    ) -> Result<TransportResponse, TransportError>;
}

/// `reqwest` transport authenticating every request with HTTP Basic credentials.
pub struct HttpTransport {
    config: FhirServerConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the credentials cannot form a header
    /// value, and [`CoreError::HttpClient`] if the client cannot be constructed.
    pub fn new(config: &FhirServerConfig) -> CoreResult<Self> {
        let mut auth =
            HeaderValue::from_str(&config.credentials().header_value()).map_err(|_| {
                CoreError::InvalidConfig("FHIR credentials are not valid header text".into())
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(FHIR_JSON_CONTENT_TYPE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(CoreError::HttpClient)?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }
}

#[async_trait]
impl FhirTransport for HttpTransport {
    async fn create(
        &self,
        resource_type: &str,
        body: Vec<u8>,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(self.config.resource_url(resource_type))
            .header(CONTENT_TYPE, FHIR_JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }

    async fn search(
        &self,
        resource_type: &str,
        param: &str,
        value: &str,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(self.config.resource_url(resource_type))
            .query(&[(param, value)])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
