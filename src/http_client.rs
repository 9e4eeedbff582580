//! HTTP client builder
//!
//! Builds the reqwest client used by the authenticated session.

use reqwest::{Client, Proxy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TLS implementation for outbound requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TlsBackend {
    #[default]
    Rustls,
    NativeTls,
}

/// Options for the session's HTTP client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Proxy URL, supports http/https/socks5
    pub proxy_url: Option<String>,
    /// Proxy basic-auth credentials (username, password)
    pub proxy_auth: Option<(String, String)>,
    pub timeout_secs: u64,
    pub tls_backend: TlsBackend,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            proxy_url: None,
            proxy_auth: None,
            timeout_secs: 30,
            tls_backend: TlsBackend::default(),
        }
    }
}

/// Build the session's HTTP client
pub fn build_client(options: &ClientOptions) -> anyhow::Result<Client> {
    let mut builder = Client::builder().timeout(Duration::from_secs(options.timeout_secs));

    if options.tls_backend == TlsBackend::Rustls {
        builder = builder.use_rustls_tls();
    }

    if let Some(proxy_url) = &options.proxy_url {
        let mut proxy = Proxy::all(proxy_url)?;

        if let Some((username, password)) = &options.proxy_auth {
            proxy = proxy.basic_auth(username, password);
        }

        builder = builder.proxy(proxy);
        tracing::debug!("HTTP client using proxy: {}", proxy_url);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert!(options.proxy_url.is_none());
        assert_eq!(options.timeout_secs, 30);
        assert_eq!(options.tls_backend, TlsBackend::Rustls);
    }

    #[test]
    fn test_build_client_without_proxy() {
        assert!(build_client(&ClientOptions::default()).is_ok());
    }

    #[test]
    fn test_build_client_with_proxy() {
        let options = ClientOptions {
            proxy_url: Some("socks5://127.0.0.1:1080".to_string()),
            proxy_auth: Some(("user".to_string(), "pass".to_string())),
            ..Default::default()
        };
        assert!(build_client(&options).is_ok());
    }
}
