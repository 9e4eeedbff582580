//! Authenticated session handle and per-request lookup
//!
//! The blueprint publishes a [`CognitoSession`] into each request's
//! extensions before any other handling of that request. Handlers read it
//! back either with the explicit [`cognito_oauth`] accessor or by extracting
//! `CognitoSession` directly. Extensions are per-request, so concurrent
//! requests never observe each other's session.

use std::sync::Arc;

use anyhow::{Context, bail};
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use http::Extensions;

use crate::cognito::storage::{StoredToken, TokenStorage};

/// Authenticated HTTP client for the Cognito-protected resources
///
/// Cheap to clone; all clones share the same HTTP client and token storage.
#[derive(Debug, Clone)]
pub struct CognitoSession {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    client: reqwest::Client,
    user_info_url: String,
    storage: Arc<dyn TokenStorage>,
}

impl CognitoSession {
    pub(crate) fn new(
        client: reqwest::Client,
        user_info_url: String,
        storage: Arc<dyn TokenStorage>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client,
                user_info_url,
                storage,
            }),
        }
    }

    /// Whether a non-expired token is stored for this session
    pub fn authorized(&self) -> bool {
        self.inner
            .storage
            .get()
            .map(|token| !token.is_expired())
            .unwrap_or(false)
    }

    /// Current stored token, if any
    pub fn token(&self) -> Option<StoredToken> {
        self.inner.storage.get()
    }

    fn bearer_token(&self) -> anyhow::Result<String> {
        match self.inner.storage.get() {
            Some(token) => Ok(token.access_token),
            None => bail!("session has no stored token; complete the login dance first"),
        }
    }

    /// GET the given URL with the bearer token attached
    pub async fn get(&self, url: &str) -> anyhow::Result<reqwest::Response> {
        let token = self.bearer_token()?;
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        Ok(response)
    }

    /// Fetch the user's claims from the hosted UI's userInfo endpoint
    pub async fn user_info(&self) -> anyhow::Result<serde_json::Value> {
        let response = self.get(&self.inner.user_info_url).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("userInfo request failed (status {status}): {body}");
        }
        Ok(response.json().await?)
    }
}

/// Store the session into a request's extension slot
pub(crate) fn publish(session: CognitoSession, extensions: &mut Extensions) {
    extensions.insert(session);
}

/// Read the session published for the current request
///
/// Fails when called outside a request that passed through the blueprint's
/// session middleware, i.e. when no request scope carrying a session is
/// active.
pub fn cognito_oauth(extensions: &Extensions) -> anyhow::Result<CognitoSession> {
    extensions
        .get::<CognitoSession>()
        .cloned()
        .context("no Cognito session in the current request scope; is the session middleware installed?")
}

/// Extractor rejection: the request never passed the session middleware
#[derive(Debug)]
pub struct SessionNotPublished;

impl IntoResponse for SessionNotPublished {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Cognito session not available; the session middleware is not installed on this route",
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for CognitoSession
where
    S: Send + Sync,
{
    type Rejection = SessionNotPublished;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CognitoSession>()
            .cloned()
            .ok_or(SessionNotPublished)
    }
}
