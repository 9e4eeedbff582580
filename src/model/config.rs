use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cognito::settings::{CognitoSettings, PostAuthRedirect};
use crate::http_client::{ClientOptions, TlsBackend};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP proxy URL (optional)
    /// Supported formats: http://host:port, https://host:port, socks5://host:port
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Proxy authentication username (optional)
    #[serde(default)]
    pub proxy_username: Option<String>,

    /// Proxy authentication password (optional)
    #[serde(default)]
    pub proxy_password: Option<String>,

    #[serde(default)]
    pub tls_backend: TlsBackend,

    /// Cognito provider settings
    #[serde(default)]
    pub cognito: CognitoFileConfig,

    /// Config file path (runtime metadata, not written to JSON)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

/// Cognito provider fields as they appear in the config file
///
/// Everything is optional; unset credentials are resolved from the
/// environment at blueprint construction and the remaining fields fall back
/// to the provider defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitoFileConfig {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// Cognito domain prefix for the user pool's hosted UI
    #[serde(default)]
    pub domain_name: Option<String>,

    #[serde(default)]
    pub aws_region: Option<String>,

    /// Ordered scope list for the OAuth token
    #[serde(default)]
    pub scope: Option<Vec<String>>,

    /// Literal URL to redirect to after the dance completes
    #[serde(default)]
    pub redirect_url: Option<String>,

    /// Name of the view to redirect to when no redirectUrl is set
    #[serde(default)]
    pub redirect_to: Option<String>,

    #[serde(default)]
    pub login_url: Option<String>,

    #[serde(default)]
    pub authorized_url: Option<String>,

    /// Absolute callback URL as registered with the Cognito app client
    #[serde(default)]
    pub callback_url: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            proxy_url: None,
            proxy_username: None,
            proxy_password: None,
            tls_backend: TlsBackend::default(),
            cognito: CognitoFileConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Get default config file path
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            // Config file doesn't exist, return default config
            let mut config = Self::default();
            config.config_path = Some(path.to_path_buf());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config =
            serde_json::from_str(&content).context("Failed to parse config")?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get config file path (if available)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write current config back to original config file
    pub fn save(&self) -> anyhow::Result<()> {
        let path = self
            .config_path
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Config file path unknown, cannot save config"))?;

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Options for the session's HTTP client, from the proxy and TLS fields
    pub fn client_options(&self) -> ClientOptions {
        let proxy_auth = match (&self.proxy_username, &self.proxy_password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        };
        ClientOptions {
            proxy_url: self.proxy_url.clone(),
            proxy_auth,
            tls_backend: self.tls_backend,
            ..Default::default()
        }
    }
}

impl CognitoFileConfig {
    /// Map the file fields onto provider settings
    ///
    /// `redirectUrl` wins when both redirect fields are set; the spare one
    /// is ignored with a warning.
    pub fn to_settings(&self) -> CognitoSettings {
        let mut settings = CognitoSettings::new();

        if let Some(client_id) = &self.client_id {
            settings = settings.with_client_id(client_id);
        }
        if let Some(client_secret) = &self.client_secret {
            settings = settings.with_client_secret(client_secret);
        }
        if let Some(domain_name) = &self.domain_name {
            settings = settings.with_domain_name(domain_name);
        }
        if let Some(aws_region) = &self.aws_region {
            settings = settings.with_aws_region(aws_region);
        }
        if let Some(scope) = &self.scope {
            settings = settings.with_scope(scope.clone());
        }
        if let Some(login_url) = &self.login_url {
            settings = settings.with_login_url(login_url);
        }
        if let Some(authorized_url) = &self.authorized_url {
            settings = settings.with_authorized_url(authorized_url);
        }
        if let Some(callback_url) = &self.callback_url {
            settings = settings.with_callback_url(callback_url);
        }

        match (&self.redirect_url, &self.redirect_to) {
            (Some(url), other) => {
                if other.is_some() {
                    tracing::warn!("both redirectUrl and redirectTo set, using redirectUrl");
                }
                settings = settings.with_redirect(PostAuthRedirect::Url(url.clone()));
            }
            (None, Some(view)) => {
                settings = settings.with_redirect(PostAuthRedirect::View(view.clone()));
            }
            (None, None) => {}
        }

        settings
    }
}
