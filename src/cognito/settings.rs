//! Cognito provider settings
//!
//! All fields are optional at call time; anything left unset is filled in
//! during resolution, either from a fixed default or from the environment.

use std::env;
use std::sync::Arc;

use crate::cognito::storage::{MemoryStorage, TokenStorage};

/// Default OAuth scopes requested from the hosted UI
pub const DEFAULT_SCOPE: &[&str] = &["openid", "profile"];

/// Default AWS region for the hosted domain
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Default path for the login route
pub const DEFAULT_LOGIN_URL: &str = "/cognito";

/// Default path for the post-dance callback route
pub const DEFAULT_AUTHORIZED_URL: &str = "/cognito/authorized";

/// Environment keys consulted for credentials not supplied directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialKeys {
    pub client_id: &'static str,
    pub client_secret: &'static str,
}

/// The fixed credential key table
///
/// Consulted only when the corresponding settings field is unset; directly
/// supplied credentials bypass the environment entirely.
pub const CREDENTIAL_KEYS: CredentialKeys = CredentialKeys {
    client_id: "COGNITO_OAUTH_CLIENT_ID",
    client_secret: "COGNITO_OAUTH_CLIENT_SECRET",
};

/// Where to send the user after the dance completes
///
/// Either a literal URL or the name of a route registered on the blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAuthRedirect {
    /// Redirect to this URL verbatim
    Url(String),
    /// Redirect to the path registered under this route name
    View(String),
}

/// Provider settings for the Cognito blueprint
#[derive(Debug, Clone, Default)]
pub struct CognitoSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub domain_name: Option<String>,
    pub aws_region: Option<String>,
    /// Ordered scope list; order is preserved in the authorize request
    pub scope: Option<Vec<String>>,
    pub redirect: Option<PostAuthRedirect>,
    pub login_url: Option<String>,
    pub authorized_url: Option<String>,
    /// Absolute URL of the callback route, as registered with Cognito
    ///
    /// axum has no reverse URL resolution, so the external callback URL must
    /// be supplied explicitly. When unset the authorize request carries no
    /// redirect_uri and Cognito falls back to the one registered for the
    /// app client.
    pub callback_url: Option<String>,
    /// Pre-built HTTP client for the authenticated session
    pub http_client: Option<reqwest::Client>,
    /// Token storage backend; defaults to in-memory
    pub storage: Option<Arc<dyn TokenStorage>>,
}

impl CognitoSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_domain_name(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = Some(domain_name.into());
        self
    }

    pub fn with_aws_region(mut self, aws_region: impl Into<String>) -> Self {
        self.aws_region = Some(aws_region.into());
        self
    }

    pub fn with_scope(mut self, scope: Vec<String>) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_redirect(mut self, redirect: PostAuthRedirect) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = Some(login_url.into());
        self
    }

    pub fn with_authorized_url(mut self, authorized_url: impl Into<String>) -> Self {
        self.authorized_url = Some(authorized_url.into());
        self
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn TokenStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Fill in defaults and resolve credentials
    ///
    /// Direct arguments win; unset credentials fall back to the environment
    /// keys in [`CREDENTIAL_KEYS`]. A credential missing from both places
    /// resolves to an empty string and fails later at the token endpoint;
    /// this step raises no errors of its own.
    pub(crate) fn resolve(self) -> ResolvedSettings {
        let client_id = self
            .client_id
            .or_else(|| env::var(CREDENTIAL_KEYS.client_id).ok())
            .unwrap_or_default();
        let client_secret = self
            .client_secret
            .or_else(|| env::var(CREDENTIAL_KEYS.client_secret).ok())
            .unwrap_or_default();

        ResolvedSettings {
            client_id,
            client_secret,
            domain_name: self.domain_name.unwrap_or_default(),
            aws_region: self
                .aws_region
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            scope: self
                .scope
                .unwrap_or_else(|| DEFAULT_SCOPE.iter().map(|s| s.to_string()).collect()),
            redirect: self.redirect,
            login_url: self
                .login_url
                .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            authorized_url: self
                .authorized_url
                .unwrap_or_else(|| DEFAULT_AUTHORIZED_URL.to_string()),
            callback_url: self.callback_url,
            http_client: self.http_client,
            storage: self.storage.unwrap_or_else(|| Arc::new(MemoryStorage::new())),
        }
    }
}

/// Settings after defaulting and credential resolution
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSettings {
    pub client_id: String,
    pub client_secret: String,
    pub domain_name: String,
    pub aws_region: String,
    pub scope: Vec<String>,
    pub redirect: Option<PostAuthRedirect>,
    pub login_url: String,
    pub authorized_url: String,
    pub callback_url: Option<String>,
    pub http_client: Option<reqwest::Client>,
    pub storage: Arc<dyn TokenStorage>,
}
