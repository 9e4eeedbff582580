use axum::{Json, Router, middleware, routing::get};
use clap::Parser;

use cognito_oauth::model::arg::Args;
use cognito_oauth::model::config::Config;
use cognito_oauth::{
    CognitoSession, http_client, make_cognito_blueprint, publish_session_middleware,
};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {}", e);
        std::process::exit(1);
    });

    if let Some(proxy_url) = &config.proxy_url {
        tracing::info!("HTTP proxy configured: {}", proxy_url);
    }

    let session_client =
        http_client::build_client(&config.client_options()).unwrap_or_else(|e| {
            tracing::error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        });

    // Build the Cognito blueprint from file settings
    let settings = config.cognito.to_settings().with_http_client(session_client);
    let blueprint = make_cognito_blueprint(settings).unwrap_or_else(|e| {
        tracing::error!("Failed to build Cognito blueprint: {}", e);
        std::process::exit(1);
    });

    // The session middleware runs before every request and publishes the
    // blueprint's session into the request scope
    let app = Router::new()
        .route("/", get(index))
        .merge(blueprint.router())
        .layer(middleware::from_fn_with_state(
            blueprint.clone(),
            publish_session_middleware,
        ));

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server: {}", addr);
    tracing::info!("Cognito hosted UI: {}", blueprint.endpoints().base_url);
    tracing::info!("Available routes:");
    tracing::info!("  GET  /");
    tracing::info!("  GET  {}", blueprint.login_url());
    tracing::info!("  GET  {}", blueprint.authorized_url());

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Sample route reading the published session
async fn index(session: CognitoSession) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "authorized": session.authorized(),
    }))
}
