//! API server configuration.

use url::Url;
use vidtube_core::auth::TokenSecrets;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Allowed CORS origin; `*` in development.
    pub cors_origin: String,
    /// Whether auth cookies carry the `Secure` attribute (production).
    pub secure_cookies: bool,
    /// Blob-storage collaborator endpoint.
    pub blob_store_endpoint: Url,
}

impl ApiConfig {
    /// Reads configuration from environment variables with development
    /// defaults.
    ///
    /// | Variable              | Default                              |
    /// |-----------------------|--------------------------------------|
    /// | `BIND_ADDR`           | `127.0.0.1:8000`                     |
    /// | `DATABASE_URL`        | `postgres://localhost:5432/vidtube`  |
    /// | `CORS_ORIGIN`         | `*`                                  |
    /// | `ENVIRONMENT`         | `development` (`production` → secure cookies) |
    /// | `BLOB_STORE_ENDPOINT` | `http://localhost:9000/`             |
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/vidtube".into()),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".into()),
            secure_cookies: environment == "production",
            blob_store_endpoint: std::env::var("BLOB_STORE_ENDPOINT")
                .ok()
                .and_then(|raw| Url::parse(&raw).ok())
                .unwrap_or_else(|| Url::parse("http://localhost:9000/").expect("static url")),
        }
    }

    /// Resolve token-signing secrets from the environment.
    pub fn token_secrets() -> TokenSecrets {
        TokenSecrets::from_env()
    }
}
