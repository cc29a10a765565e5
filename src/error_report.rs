//! Optional forwarding of fatal errors and panics to an error-tracking
//! endpoint. Delivery is best effort and never changes control flow.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, warn};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEvent {
    pub message: String,
    pub level: &'static str,
    pub environment: String,
    pub release: &'static str,
    pub server_name: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ErrorReporter {
    http: Client,
    url: String,
    environment: String,
    server_name: String,
}

impl ErrorReporter {
    pub fn new(
        url: impl Into<String>,
        environment: impl Into<String>,
        server_name: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(DELIVERY_TIMEOUT).build()?;

        Ok(Self {
            http,
            url: url.into(),
            environment: environment.into(),
            server_name: server_name.into(),
        })
    }

    pub fn event(&self, level: &'static str, message: impl Into<String>) -> ErrorEvent {
        ErrorEvent {
            message: message.into(),
            level,
            environment: self.environment.clone(),
            release: env!("CARGO_PKG_VERSION"),
            server_name: self.server_name.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Send an event; failures are only logged.
    pub async fn capture(&self, event: &ErrorEvent) {
        let result = self
            .http
            .post(&self.url)
            .json(event)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        if let Err(e) = result {
            warn!(error = %e, "couldn't deliver error report");
        }
    }

    /// For the panic hook, which may run outside any runtime or inside one
    /// that can no longer make progress. Sends from a dedicated thread.
    fn capture_blocking(&self, event: ErrorEvent) {
        let url = self.url.clone();
        let handle = std::thread::spawn(move || -> Result<(), reqwest::Error> {
            reqwest::blocking::Client::builder()
                .timeout(DELIVERY_TIMEOUT)
                .build()?
                .post(&url)
                .json(&event)
                .send()?
                .error_for_status()?;
            Ok(())
        });

        match handle.join() {
            Ok(Err(e)) => warn!(error = %e, "couldn't deliver panic report"),
            Err(_) => warn!("panic report thread panicked"),
            Ok(Ok(())) => {}
        }
    }
}

/// Log every panic through tracing and forward it to the reporter, if any,
/// before running the previously installed hook.
pub fn install_panic_hook(reporter: Option<ErrorReporter>) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let message = info.to_string();
        error!(panic = %message, "panicked");
        if let Some(reporter) = &reporter {
            reporter.capture_blocking(reporter.event("fatal", message));
        }
        previous(info);
    }));
}
