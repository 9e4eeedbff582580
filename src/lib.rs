//! Cognito hosted-UI OAuth2 dance configuration
//!
//! Wires client credentials, scopes and callback URLs for an AWS Cognito
//! user pool into a generic OAuth2 consumer, and publishes the resulting
//! authenticated session into each request's scope for later lookup.

pub mod cognito;
pub mod http_client;
pub mod model;

pub use cognito::blueprint::{CognitoBlueprint, make_cognito_blueprint, publish_session_middleware};
pub use cognito::endpoints::CognitoEndpoints;
pub use cognito::session::{CognitoSession, SessionNotPublished, cognito_oauth};
pub use cognito::settings::{CREDENTIAL_KEYS, CognitoSettings, CredentialKeys, PostAuthRedirect};
pub use cognito::storage::{MemoryStorage, StoredToken, TokenStorage};
