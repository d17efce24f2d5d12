use std::time::Duration;

use crate::error::ProbeError;

/// Blocking HTTP reachability check against a server under test.
///
/// Must not be created or dropped from inside an async runtime; use
/// [`AsyncHttpProbe`] there.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpProbe {
    /// `request_timeout` bounds a single check, which bounds how far a wait
    /// on this probe can overshoot its deadline.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("condwait/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `target` (an absolute URL or a path below the base URL) and report
    /// whether it answered with a 2xx status.
    pub fn check_server(&self, target: &str) -> Result<bool, ProbeError> {
        let url = resolve(&self.base_url, target);
        let outcome = self
            .client
            .get(&url)
            .send()
            .map(|response| response.status());
        classify(&url, outcome)
    }
}

/// Async variant of [`HttpProbe`] for use with
/// [`wait_async`](crate::waiter::async_waiter::wait_async).
#[derive(Debug, Clone)]
pub struct AsyncHttpProbe {
    client: reqwest::Client,
    base_url: String,
}

impl AsyncHttpProbe {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("condwait/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn check_server(&self, target: &str) -> Result<bool, ProbeError> {
        let url = resolve(&self.base_url, target);
        let outcome = self
            .client
            .get(&url)
            .send()
            .await
            .map(|response| response.status());
        classify(&url, outcome)
    }
}

fn resolve(base_url: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }

    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        target.trim_start_matches('/')
    )
}

fn classify(
    url: &str,
    outcome: Result<reqwest::StatusCode, reqwest::Error>,
) -> Result<bool, ProbeError> {
    match outcome {
        Ok(status) if status.is_success() => Ok(true),
        Ok(status) => {
            log::debug!("Server check {url} answered {status}");
            Ok(false)
        }
        // Malformed URLs and redirect loops will not fix themselves
        Err(e) if e.is_builder() || e.is_redirect() => Err(e.into()),
        Err(e) => {
            log::debug!("Server check {url} not reachable yet: {e}");
            Ok(false)
        }
    }
}
