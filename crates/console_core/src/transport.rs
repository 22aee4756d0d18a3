//! Outbound request layer: one entry point, one error shape.

use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::error::ErrorBody;
use tracing::{debug, warn};

use crate::{config::ConsoleSettings, error::RequestError, session::Credential};

#[derive(Clone)]
pub struct RequestClient {
    http: Client,
    api_root: String,
}

impl RequestClient {
    pub fn new(settings: &ConsoleSettings) -> anyhow::Result<Self> {
        let api_root = settings.api_root()?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self {
            http,
            api_root: api_root.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// `api_root` is the full prefix, e.g. `http://127.0.0.1:8080/api/v1`.
    pub fn with_api_root(api_root: impl Into<String>) -> Self {
        let api_root = api_root.into();
        Self {
            http: Client::new(),
            api_root: api_root.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Sends `body` as JSON to `path` below the api root.
    ///
    /// Yields `Ok(None)` for a success response with an empty (or `null`)
    /// payload. Never retries.
    pub async fn send<B, R>(
        &self,
        path: &str,
        method: Method,
        body: Option<&B>,
        credential: Option<&Credential>,
    ) -> Result<Option<R>, RequestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.api_root);
        debug!(%method, path, authenticated = credential.is_some(), "request: sending");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.expose());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            warn!(%method, path, error = %err, "request: transport failure");
            RequestError::transport(err.to_string())
        })?;
        let status = response.status();
        let payload = response.bytes().await.map_err(RequestError::from)?;

        if !status.is_success() {
            let message = failure_message(status, &payload);
            warn!(%method, path, status = status.as_u16(), %message, "request: rejected");
            return Err(RequestError::new(Some(status.as_u16()), message));
        }

        if is_blank(&payload) {
            return Ok(None);
        }
        let value: serde_json::Value = serde_json::from_slice(&payload).map_err(|err| {
            RequestError::new(Some(status.as_u16()), format!("invalid response body: {err}"))
        })?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some).map_err(|err| {
            RequestError::new(
                Some(status.as_u16()),
                format!("unexpected response shape: {err}"),
            )
        })
    }
}

/// `error`, then `message`, then the status reason phrase.
pub(crate) fn failure_message(status: StatusCode, payload: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(payload)
        .ok()
        .and_then(|body| body.best_message().map(str::to_string))
        .unwrap_or_else(|| status_text(status))
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

fn is_blank(payload: &[u8]) -> bool {
    payload.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
