use crate::errors::SubmitError;
use async_trait::async_trait;
use reqwest::{header, Client, Request};
use serde::Serialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://metrics-api.librato.com/v1/metrics";

/// Names and sources are limited to 255 characters.
pub const MAX_NAME_LEN: usize = 255;

#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn submit(&self, measurements: &Measurements) -> Result<(), SubmitError>;
}

/// A set of gauge measurements taken at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurements {
    /// Unix timestamp for when the measurements were taken.
    pub measure_time: i64,
    pub gauges: Vec<Gauge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub name: String,
    pub value: f64,
    /// Originating source of the measurement.
    pub source: String,
}

/// Check a metric name or source against the API's rules:
/// at most 255 characters of `A-Za-z0-9.:-_`.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("must not be empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("longer than {} characters", MAX_NAME_LEN));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '-' | '_')))
    {
        return Err(format!("contains invalid character {:?}", c));
    }
    Ok(())
}

/// Submits measurements to Librato. Only legacy source-based metrics
/// are supported.
pub struct LibratoClient {
    http: Client,
    url: String,
    email: String,
    token: String,
}

impl LibratoClient {
    /// The token must belong to the account with the given email and
    /// have record permissions.
    pub fn new(email: impl Into<String>, token: impl Into<String>) -> Result<Self, SubmitError> {
        Self::with_url(DEFAULT_API_URL, email, token)
    }

    pub fn with_url(
        url: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, SubmitError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(SubmitError::Request)?;

        Ok(Self {
            http,
            url: url.into(),
            email: email.into(),
            token: token.into(),
        })
    }

    fn build_request(&self, measurements: &Measurements) -> Result<Request, SubmitError> {
        let body = serde_json::to_vec(measurements).map_err(SubmitError::Serialize)?;

        self.http
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .basic_auth(&self.email, Some(&self.token))
            .body(body)
            .build()
            .map_err(SubmitError::Request)
    }
}

#[async_trait]
impl MetricsSink for LibratoClient {
    async fn submit(&self, measurements: &Measurements) -> Result<(), SubmitError> {
        let request = self.build_request(measurements)?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(SubmitError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
