//! Session credential lifecycle.

use std::{fmt, sync::Arc};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    api::ConsoleApi,
    error::{AuthError, ConsoleError},
};

/// Opaque bearer token. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

#[derive(Deserialize)]
struct TokenClaims {
    sub: Option<String>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `sub` claim of a JWT-shaped token, decoded without verification.
    /// Display only; the service is the one validating the token.
    pub fn subject(&self) -> Option<String> {
        let payload = self.0.split('.').nth(1)?;
        let decoded = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice::<TokenClaims>(&decoded).ok()?.sub
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Holds at most one live credential for the lifetime of a login.
pub struct AuthSession {
    api: ConsoleApi,
    credential: RwLock<Option<Credential>>,
}

impl AuthSession {
    pub fn new(api: ConsoleApi) -> Arc<Self> {
        Arc::new(Self {
            api,
            credential: RwLock::new(None),
        })
    }

    pub fn api(&self) -> &ConsoleApi {
        &self.api
    }

    /// Creates an account. Does not sign in.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        check_not_blank(username, password)?;
        self.api.register(username, password).await.map_err(|err| {
            warn!(username, error = %err, "session: registration rejected");
            AuthError::Rejected(err)
        })?;
        info!(username, "session: account registered");
        Ok(())
    }

    /// Replaces any prior credential on success; a failed login leaves the
    /// current one in place.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        check_not_blank(username, password)?;
        let response = self.api.login(username, password).await.map_err(|err| {
            warn!(username, error = %err, "session: login rejected");
            AuthError::Rejected(err)
        })?;
        let token = response
            .map(|body| body.token)
            .filter(|token| !token.trim().is_empty())
            .ok_or(AuthError::MissingToken)?;

        let credential = Credential::new(token);
        let replaced = self.credential.write().await.replace(credential.clone());
        info!(
            username,
            replaced_previous = replaced.is_some(),
            "session: signed in"
        );
        Ok(credential)
    }

    pub async fn logout(&self) {
        if self.credential.write().await.take().is_some() {
            info!("session: signed out");
        }
    }

    pub async fn current_credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credential.read().await.is_some()
    }

    /// Capability gate for protected operations. No network call.
    pub async fn require_credential(&self) -> Result<Credential, ConsoleError> {
        self.current_credential()
            .await
            .ok_or(ConsoleError::Unauthenticated)
    }

    pub async fn signed_in_as(&self) -> Option<String> {
        self.credential
            .read()
            .await
            .as_ref()
            .and_then(Credential::subject)
    }
}

fn check_not_blank(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err(AuthError::BlankCredentials);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
