//! Cognito hosted UI endpoint derivation
//!
//! Builds the OAuth2 endpoint URLs for a Cognito user pool's hosted domain.

/// OAuth2 endpoint URLs for one Cognito hosted domain
///
/// All URLs are derived from a single (domain_name, aws_region) pair and
/// always agree on both values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognitoEndpoints {
    /// Hosted UI base URL
    pub base_url: String,
    /// Authorization endpoint (starts the hosted UI login)
    pub authorization_url: String,
    /// Token endpoint (code and refresh-token exchange)
    pub token_url: String,
}

impl CognitoEndpoints {
    /// Derive the endpoint set for a hosted domain
    ///
    /// Pure string substitution; neither value is validated or escaped.
    /// An empty or malformed `domain_name` therefore produces a malformed
    /// URL here and fails later, at the OAuth2 client, not in this function.
    pub fn derive(domain_name: &str, aws_region: &str) -> Self {
        let base_url = format!("https://{domain_name}.auth.{aws_region}.amazoncognito.com");
        let authorization_url = format!("{base_url}/oauth2/authorize");
        let token_url = format!("{base_url}/oauth2/token");
        Self {
            base_url,
            authorization_url,
            token_url,
        }
    }

    /// UserInfo endpoint on the same hosted domain
    pub fn user_info_url(&self) -> String {
        format!("{}/oauth2/userInfo", self.base_url)
    }
}
