use crate::auth::jwt::JwtConfig;

/// Shared secrets for inbound webhook verification. An unset secret makes
/// the matching endpoint reject every delivery.
#[derive(Debug, Clone, Default)]
pub struct WebhookSecrets {
    pub shopify: Option<String>,
    pub stripe: Option<String>,
    pub easypost: Option<String>,
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins; `["*"]` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub webhooks: WebhookSecrets,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default    |
    /// |---------------------------|------------|
    /// | `HOST`                    | `0.0.0.0`  |
    /// | `PORT`                    | `3000`     |
    /// | `CORS_ORIGINS`            | `*`        |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`       |
    /// | `SHOPIFY_WEBHOOK_SECRET`  | unset      |
    /// | `STRIPE_WEBHOOK_SECRET`   | unset      |
    /// | `EASYPOST_WEBHOOK_SECRET` | unset      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let secret = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let webhooks = WebhookSecrets {
            shopify: secret("SHOPIFY_WEBHOOK_SECRET"),
            stripe: secret("STRIPE_WEBHOOK_SECRET"),
            easypost: secret("EASYPOST_WEBHOOK_SECRET"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            webhooks,
        }
    }

    /// Whether CORS allows any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}
