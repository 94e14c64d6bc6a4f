//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the generator, serializer and uploader. Nothing in the core reads environment
//! variables; binaries resolve them and hand the result in. This keeps credentials out of
//! process-wide state and lets tests build configurations pointing at fake endpoints.

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_UPLOAD_WORKERS, DEVICES_FILENAME, OBSERVATIONS_FILENAME,
};
use crate::{CoreError, CoreResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    mappings_path: PathBuf,
    output_dir: PathBuf,
    upload_workers: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `upload_workers` is zero.
    pub fn new(
        mappings_path: PathBuf,
        output_dir: PathBuf,
        upload_workers: usize,
    ) -> CoreResult<Self> {
        if upload_workers == 0 {
            return Err(CoreError::InvalidConfig(
                "upload_workers must be at least 1".into(),
            ));
        }

        Ok(Self {
            mappings_path,
            output_dir,
            upload_workers,
        })
    }

    pub fn mappings_path(&self) -> &Path {
        &self.mappings_path
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn devices_path(&self) -> PathBuf {
        self.output_dir.join(DEVICES_FILENAME)
    }

    pub fn observations_path(&self) -> PathBuf {
        self.output_dir.join(OBSERVATIONS_FILENAME)
    }

    pub fn upload_workers(&self) -> usize {
        self.upload_workers
    }
}

/// Username/password pair for HTTP Basic authentication.
///
/// `Debug` never prints the password.
#[derive(Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the username is blank or contains `:`,
    /// which cannot be represented in a Basic credential.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> CoreResult<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(CoreError::InvalidConfig("FHIR username cannot be empty".into()));
        }
        if username.contains(':') {
            return Err(CoreError::InvalidConfig(
                "FHIR username cannot contain ':'".into(),
            ));
        }

        Ok(Self {
            username,
            password: password.into(),
        })
    }

    /// `Authorization` header value: `Basic base64(username:password)`.
    pub fn header_value(&self) -> String {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {encoded}")
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection parameters for the target FHIR server.
#[derive(Clone, Debug)]
pub struct FhirServerConfig {
    base_url: String,
    credentials: BasicAuth,
    timeout: Duration,
}

impl FhirServerConfig {
    /// Create a server configuration.
    ///
    /// Trailing slashes are trimmed from `base_url` so resource URLs are always
    /// `{base_url}/{resourceType}`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the base URL is empty or not http(s).
    pub fn new(base_url: &str, credentials: BasicAuth, timeout: Duration) -> CoreResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(CoreError::InvalidConfig("FHIR base URL cannot be empty".into()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CoreError::InvalidConfig(format!(
                "FHIR base URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        Ok(Self {
            base_url: base_url.to_string(),
            credentials,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &BasicAuth {
        &self.credentials
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Endpoint for type-level interactions (create, search).
    pub fn resource_url(&self, resource_type: &str) -> String {
        format!("{}/{}", self.base_url, resource_type)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the device upload pool size from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_UPLOAD_WORKERS`].
pub fn upload_workers_from_env_value(value: Option<String>) -> CoreResult<usize> {
    match non_blank(value) {
        None => Ok(DEFAULT_UPLOAD_WORKERS),
        Some(v) => match v.parse::<usize>() {
            Ok(0) | Err(_) => Err(CoreError::InvalidConfig(format!(
                "upload worker count must be a positive integer, got '{v}'"
            ))),
            Ok(n) => Ok(n),
        },
    }
}

/// Parse the HTTP timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_HTTP_TIMEOUT_SECS`].
pub fn http_timeout_from_env_value(value: Option<String>) -> CoreResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)),
        Some(v) => match v.parse::<u64>() {
            Ok(0) | Err(_) => Err(CoreError::InvalidConfig(format!(
                "HTTP timeout must be a positive number of seconds, got '{v}'"
            ))),
            Ok(secs) => Ok(Duration::from_secs(secs)),
        },
    }
}
