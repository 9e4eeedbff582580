//! Cognito blueprint factory
//!
//! Wires provider settings into the generic OAuth2 consumer and exposes the
//! login/callback routes plus the per-request session publication middleware.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, bail};
use axum::{
    Router,
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::{DateTime, Duration, Utc};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicTokenResponse, BasicTokenType},
    reqwest::async_http_client,
};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;

use crate::cognito::endpoints::CognitoEndpoints;
use crate::cognito::session::{self, CognitoSession};
use crate::cognito::settings::{CognitoSettings, PostAuthRedirect, ResolvedSettings};
use crate::cognito::storage::StoredToken;
use crate::http_client::{ClientOptions, build_client};

/// How long an issued authorization state stays valid
const STATE_TTL_MINUTES: i64 = 10;

/// Configured OAuth2 dance against one Cognito user pool
///
/// Cheap to clone; all clones share the consumer client, the session handle
/// and the pending-state map.
#[derive(Debug, Clone)]
pub struct CognitoBlueprint {
    inner: Arc<BlueprintInner>,
}

#[derive(Debug)]
struct BlueprintInner {
    settings: ResolvedSettings,
    endpoints: CognitoEndpoints,
    oauth: BasicClient,
    session: CognitoSession,
    /// CSRF states issued by the login route, pruned on expiry
    pending: Mutex<HashMap<String, PendingAuth>>,
    /// Route-name table for view-based post-auth redirects
    views: RwLock<HashMap<String, String>>,
}

#[derive(Debug)]
struct PendingAuth {
    created_at: DateTime<Utc>,
}

impl PendingAuth {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.created_at + Duration::minutes(STATE_TTL_MINUTES)
    }
}

/// Build a blueprint for authenticating with Cognito over OAuth2
///
/// Credentials left unset in `settings` are read from the environment keys
/// `COGNITO_OAUTH_CLIENT_ID` / `COGNITO_OAUTH_CLIENT_SECRET`; a credential
/// missing from both places resolves to an empty string and is rejected by
/// Cognito at exchange time rather than here. The same applies to the domain
/// name: no validation is performed before URL derivation, so a missing or
/// malformed domain surfaces from the consumer, not from this factory.
pub fn make_cognito_blueprint(settings: CognitoSettings) -> anyhow::Result<CognitoBlueprint> {
    let settings = settings.resolve();
    let endpoints = CognitoEndpoints::derive(&settings.domain_name, &settings.aws_region);

    let auth_url = AuthUrl::new(endpoints.authorization_url.clone())
        .context("authorization URL rejected by the OAuth2 consumer")?;
    let token_url = TokenUrl::new(endpoints.token_url.clone())
        .context("token URL rejected by the OAuth2 consumer")?;

    let mut oauth = BasicClient::new(
        ClientId::new(settings.client_id.clone()),
        Some(ClientSecret::new(settings.client_secret.clone())),
        auth_url,
        Some(token_url),
    );
    if let Some(callback_url) = &settings.callback_url {
        oauth = oauth.set_redirect_uri(
            RedirectUrl::new(callback_url.clone())
                .context("callback URL rejected by the OAuth2 consumer")?,
        );
    }

    let client = match settings.http_client.clone() {
        Some(client) => client,
        None => build_client(&ClientOptions::default())?,
    };
    let session = CognitoSession::new(client, endpoints.user_info_url(), settings.storage.clone());

    tracing::debug!(
        "Cognito blueprint configured for {} ({})",
        endpoints.base_url,
        settings.aws_region
    );

    Ok(CognitoBlueprint {
        inner: Arc::new(BlueprintInner {
            settings,
            endpoints,
            oauth,
            session,
            pending: Mutex::new(HashMap::new()),
            views: RwLock::new(HashMap::new()),
        }),
    })
}

impl CognitoBlueprint {
    /// Derived endpoint URLs for this blueprint's hosted domain
    pub fn endpoints(&self) -> &CognitoEndpoints {
        &self.inner.endpoints
    }

    /// Path of the login route
    pub fn login_url(&self) -> &str {
        &self.inner.settings.login_url
    }

    /// Path of the callback route
    pub fn authorized_url(&self) -> &str {
        &self.inner.settings.authorized_url
    }

    /// The session handle published to each request
    pub fn session(&self) -> CognitoSession {
        self.inner.session.clone()
    }

    /// Register a route name for view-based post-auth redirects
    pub fn register_view(&self, name: impl Into<String>, path: impl Into<String>) {
        self.inner.views.write().insert(name.into(), path.into());
    }

    /// Build the authorize URL for the hosted UI and record its CSRF state
    pub fn authorization_request(&self) -> (oauth2::url::Url, String) {
        let mut request = self.inner.oauth.authorize_url(CsrfToken::new_random);
        for scope in &self.inner.settings.scope {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, csrf_token) = request.url();
        let state = csrf_token.secret().clone();

        let mut pending = self.inner.pending.lock();
        pending.retain(|_, auth| !auth.is_expired());
        pending.insert(
            state.clone(),
            PendingAuth {
                created_at: Utc::now(),
            },
        );

        (url, state)
    }

    /// Exchange an authorization code and store the resulting token
    ///
    /// The state must match one issued by [`authorization_request`] that has
    /// not expired; each state is consumed on first use.
    ///
    /// [`authorization_request`]: Self::authorization_request
    pub async fn exchange_code(&self, code: &str, state: &str) -> anyhow::Result<StoredToken> {
        match self.inner.pending.lock().remove(state) {
            Some(auth) if !auth.is_expired() => {}
            Some(_) => bail!("authorization state expired, restart the login dance"),
            None => bail!("unknown authorization state, restart the login dance"),
        }

        let response = self
            .inner
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| anyhow::anyhow!("code exchange failed: {e}"))?;

        let token = stored_token_from(&response);
        self.inner.settings.storage.set(token.clone());
        tracing::info!("Cognito dance complete, token stored");
        Ok(token)
    }

    /// Refresh the stored token via the refresh-token grant
    pub async fn refresh(&self) -> anyhow::Result<StoredToken> {
        let current = self
            .inner
            .settings
            .storage
            .get()
            .context("no stored token to refresh")?;
        let refresh_token = current
            .refresh_token
            .clone()
            .context("stored token has no refresh token")?;

        let response = self
            .inner
            .oauth
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(async_http_client)
            .await
            .map_err(|e| anyhow::anyhow!("token refresh failed: {e}"))?;

        let mut token = stored_token_from(&response);
        if token.refresh_token.is_none() {
            // Cognito omits the refresh token from refresh responses
            token.refresh_token = current.refresh_token;
        }
        self.inner.settings.storage.set(token.clone());
        tracing::info!("Cognito token refreshed");
        Ok(token)
    }

    /// Where to send the browser after a completed dance
    pub fn post_auth_redirect(&self) -> String {
        match &self.inner.settings.redirect {
            None => "/".to_string(),
            Some(PostAuthRedirect::Url(url)) => url.clone(),
            Some(PostAuthRedirect::View(name)) => match self.inner.views.read().get(name) {
                Some(path) => path.clone(),
                None => {
                    tracing::warn!("no route registered under view name {name:?}, redirecting to /");
                    "/".to_string()
                }
            },
        }
    }

    /// Router with the login and callback routes
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.inner.settings.login_url, get(handle_login))
            .route(&self.inner.settings.authorized_url, get(handle_authorized))
            .with_state(self.clone())
    }
}

/// Publish the blueprint's session into the request scope
///
/// Install with `middleware::from_fn_with_state` ahead of any handler that
/// reads the session. Runs before the rest of the request handling; the slot
/// lives in the request's extensions and is dropped with the request.
pub async fn publish_session_middleware(
    State(blueprint): State<CognitoBlueprint>,
    mut request: Request,
    next: Next,
) -> Response {
    session::publish(blueprint.session(), request.extensions_mut());
    next.run(request).await
}

/// Query parameters Cognito sends to the callback route
#[derive(Debug, Deserialize)]
struct AuthorizedParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Handle login: redirect into the hosted UI
async fn handle_login(State(blueprint): State<CognitoBlueprint>) -> Redirect {
    let (url, _state) = blueprint.authorization_request();
    Redirect::temporary(url.as_str())
}

/// Handle the callback: exchange the code, then redirect onward
async fn handle_authorized(
    State(blueprint): State<CognitoBlueprint>,
    Query(params): Query<AuthorizedParams>,
) -> Response {
    if let Some(error) = params.error {
        let detail = params.error_description.unwrap_or_else(|| error.clone());
        tracing::warn!("Cognito denied the authorization: {detail}");
        return (StatusCode::FORBIDDEN, format!("Authorization denied: {detail}")).into_response();
    }

    let (code, state) = match (params.code, params.state) {
        (Some(code), Some(state)) => (code, state),
        _ => {
            return (StatusCode::BAD_REQUEST, "Missing code or state parameter").into_response();
        }
    };

    match blueprint.exchange_code(&code, &state).await {
        Ok(_) => Redirect::temporary(&blueprint.post_auth_redirect()).into_response(),
        Err(e) => {
            tracing::error!("Code exchange failed: {e}");
            (StatusCode::BAD_GATEWAY, format!("Token exchange failed: {e}")).into_response()
        }
    }
}

/// Map a consumer token response into the stored form
fn stored_token_from(response: &BasicTokenResponse) -> StoredToken {
    let token_type = match response.token_type() {
        BasicTokenType::Bearer => "Bearer".to_string(),
        BasicTokenType::Mac => "Mac".to_string(),
        BasicTokenType::Extension(other) => other.clone(),
    };

    StoredToken {
        access_token: response.access_token().secret().clone(),
        token_type,
        refresh_token: response.refresh_token().map(|t| t.secret().clone()),
        expires_at: response
            .expires_in()
            .map(|d| Utc::now() + Duration::from_std(d).unwrap_or_else(|_| Duration::zero())),
        scopes: response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cognito::storage::{MemoryStorage, TokenStorage};

    fn blueprint() -> CognitoBlueprint {
        make_cognito_blueprint(
            CognitoSettings::new()
                .with_client_id("client-id")
                .with_client_secret("client-secret")
                .with_domain_name("mypool")
                .with_aws_region("eu-west-1"),
        )
        .unwrap()
    }

    #[test]
    fn test_factory_derives_endpoints() {
        let blueprint = blueprint();
        assert_eq!(
            blueprint.endpoints().base_url,
            "https://mypool.auth.eu-west-1.amazoncognito.com"
        );
        assert_eq!(
            blueprint.endpoints().authorization_url,
            "https://mypool.auth.eu-west-1.amazoncognito.com/oauth2/authorize"
        );
        assert_eq!(
            blueprint.endpoints().token_url,
            "https://mypool.auth.eu-west-1.amazoncognito.com/oauth2/token"
        );
    }

    #[test]
    fn test_authorize_url_targets_hosted_ui() {
        let blueprint = blueprint();
        let (url, state) = blueprint.authorization_request();
        assert!(
            url.as_str()
                .starts_with("https://mypool.auth.eu-west-1.amazoncognito.com/oauth2/authorize")
        );
        assert!(!state.is_empty());
    }

    #[test]
    fn test_authorize_url_carries_default_scope() {
        let blueprint = blueprint();
        let (url, _) = blueprint.authorization_request();
        let scope = url
            .query_pairs()
            .find(|(key, _)| key == "scope")
            .map(|(_, value)| value.to_string())
            .unwrap();
        assert_eq!(scope, "openid profile");
    }

    #[test]
    fn test_authorize_url_preserves_explicit_scope_order() {
        let blueprint = make_cognito_blueprint(
            CognitoSettings::new()
                .with_domain_name("mypool")
                .with_scope(vec!["email".to_string(), "openid".to_string()]),
        )
        .unwrap();
        let (url, _) = blueprint.authorization_request();
        let scope = url
            .query_pairs()
            .find(|(key, _)| key == "scope")
            .map(|(_, value)| value.to_string())
            .unwrap();
        assert_eq!(scope, "email openid");
    }

    #[test]
    fn test_states_are_unique_per_request() {
        let blueprint = blueprint();
        let (_, first) = blueprint.authorization_request();
        let (_, second) = blueprint.authorization_request();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_exchange_rejects_unknown_state() {
        let blueprint = blueprint();
        let err = blueprint.exchange_code("code", "never-issued").await.unwrap_err();
        assert!(err.to_string().contains("unknown authorization state"));
    }

    #[tokio::test]
    async fn test_exchange_rejects_expired_state() {
        let blueprint = blueprint();
        blueprint.inner.pending.lock().insert(
            "stale".to_string(),
            PendingAuth {
                created_at: Utc::now() - Duration::minutes(STATE_TTL_MINUTES + 1),
            },
        );
        let err = blueprint.exchange_code("code", "stale").await.unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[tokio::test]
    async fn test_states_are_consumed_on_use() {
        let blueprint = blueprint();
        let (_, state) = blueprint.authorization_request();
        blueprint.inner.pending.lock().remove(&state).unwrap();
        let err = blueprint.exchange_code("code", &state).await.unwrap_err();
        assert!(err.to_string().contains("unknown authorization state"));
    }

    #[test]
    fn test_post_auth_redirect_defaults_to_root() {
        assert_eq!(blueprint().post_auth_redirect(), "/");
    }

    #[test]
    fn test_post_auth_redirect_literal_url() {
        let blueprint = make_cognito_blueprint(
            CognitoSettings::new()
                .with_domain_name("mypool")
                .with_redirect(PostAuthRedirect::Url("/welcome".to_string())),
        )
        .unwrap();
        assert_eq!(blueprint.post_auth_redirect(), "/welcome");
    }

    #[test]
    fn test_post_auth_redirect_resolves_view_name() {
        let blueprint = make_cognito_blueprint(
            CognitoSettings::new()
                .with_domain_name("mypool")
                .with_redirect(PostAuthRedirect::View("profile".to_string())),
        )
        .unwrap();
        blueprint.register_view("profile", "/me");
        assert_eq!(blueprint.post_auth_redirect(), "/me");

        // Unregistered names fall back to the root
        let orphan = make_cognito_blueprint(
            CognitoSettings::new()
                .with_domain_name("mypool")
                .with_redirect(PostAuthRedirect::View("missing".to_string())),
        )
        .unwrap();
        assert_eq!(orphan.post_auth_redirect(), "/");
    }

    #[test]
    fn test_callback_url_reaches_authorize_request() {
        let blueprint = make_cognito_blueprint(
            CognitoSettings::new()
                .with_domain_name("mypool")
                .with_callback_url("https://app.example.com/cognito/authorized"),
        )
        .unwrap();
        let (url, _) = blueprint.authorization_request();
        let redirect_uri = url
            .query_pairs()
            .find(|(key, _)| key == "redirect_uri")
            .map(|(_, value)| value.to_string())
            .unwrap();
        assert_eq!(redirect_uri, "https://app.example.com/cognito/authorized");
    }

    #[test]
    fn test_session_is_shared_across_clones() {
        let storage = Arc::new(MemoryStorage::new());
        let blueprint = make_cognito_blueprint(
            CognitoSettings::new()
                .with_domain_name("mypool")
                .with_storage(storage.clone()),
        )
        .unwrap();
        let first = blueprint.session();
        let second = blueprint.clone().session();
        assert!(first.token().is_none());

        // A token stored through the shared backend is visible to every clone
        storage.set(StoredToken {
            access_token: "shared".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expires_at: None,
            scopes: Vec::new(),
        });
        assert_eq!(first.token().unwrap().access_token, "shared");
        assert_eq!(second.token().unwrap().access_token, "shared");
    }
}
