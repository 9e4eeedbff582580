//! Cognito OAuth2 provider module
//!
//! Configures the authorization-code dance against a Cognito user pool's
//! hosted UI:
//! - Endpoint URL derivation for the hosted domain
//! - Provider settings with environment credential resolution
//! - Blueprint factory wiring settings into the OAuth2 consumer
//! - Per-request session publication and lookup

pub mod blueprint;
pub mod endpoints;
pub mod session;
pub mod settings;
pub mod storage;

pub use blueprint::{CognitoBlueprint, make_cognito_blueprint, publish_session_middleware};
pub use endpoints::CognitoEndpoints;
pub use session::{CognitoSession, cognito_oauth};
pub use settings::{CognitoSettings, PostAuthRedirect};
