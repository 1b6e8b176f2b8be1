//! Third-party credentials loaded from the environment.
//!
//! A service whose required variables are missing is left unconfigured; the
//! endpoints depending on it answer 503 instead of the process refusing to
//! start.

use crate::shipping::Address;

/// Default Shopify Admin API version.
pub const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-10";

#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// `my-store.myshopify.com`
    pub store_domain: String,
    pub admin_token: String,
    pub api_version: String,
}

impl ShopifyConfig {
    pub fn graphql_url(&self) -> String {
        format!(
            "https://{}/admin/api/{}/graphql.json",
            self.store_domain.trim_end_matches('/'),
            self.api_version
        )
    }
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct EasyPostConfig {
    pub api_key: String,
    pub api_base: String,
    /// Return address printed on labels.
    pub ship_from: Address,
}

#[derive(Debug, Clone)]
pub struct SendGridConfig {
    pub api_key: String,
    pub from_email: String,
    pub from_name: Option<String>,
    pub api_base: String,
}

#[derive(Debug, Clone, Default)]
pub struct IntegrationsConfig {
    pub shopify: Option<ShopifyConfig>,
    pub stripe: Option<StripeConfig>,
    pub easypost: Option<EasyPostConfig>,
    pub sendgrid: Option<SendGridConfig>,
}

impl IntegrationsConfig {
    /// Load credentials from environment variables.
    ///
    /// | Env Var                 | Required for | Default                     |
    /// |-------------------------|--------------|-----------------------------|
    /// | `SHOPIFY_STORE_DOMAIN`  | Shopify      | --                          |
    /// | `SHOPIFY_ADMIN_TOKEN`   | Shopify      | --                          |
    /// | `SHOPIFY_API_VERSION`   | no           | `2024-10`                   |
    /// | `STRIPE_SECRET_KEY`     | Stripe       | --                          |
    /// | `EASYPOST_API_KEY`      | EasyPost     | --                          |
    /// | `SHIP_FROM_NAME`, `SHIP_FROM_STREET1`, `SHIP_FROM_CITY`, `SHIP_FROM_STATE`, `SHIP_FROM_ZIP` | EasyPost | -- |
    /// | `SHIP_FROM_STREET2`, `SHIP_FROM_PHONE` | no | --                  |
    /// | `SHIP_FROM_COUNTRY`     | no           | `US`                        |
    /// | `SENDGRID_API_KEY`      | SendGrid     | --                          |
    /// | `SENDGRID_FROM_EMAIL`   | SendGrid     | --                          |
    /// | `SENDGRID_FROM_NAME`    | no           | --                          |
    pub fn from_env() -> Self {
        let shopify = match (env("SHOPIFY_STORE_DOMAIN"), env("SHOPIFY_ADMIN_TOKEN")) {
            (Some(store_domain), Some(admin_token)) => Some(ShopifyConfig {
                store_domain,
                admin_token,
                api_version: env("SHOPIFY_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_SHOPIFY_API_VERSION.into()),
            }),
            _ => None,
        };

        let stripe = env("STRIPE_SECRET_KEY").map(|secret_key| StripeConfig {
            secret_key,
            api_base: "https://api.stripe.com".into(),
        });

        let easypost = match (env("EASYPOST_API_KEY"), ship_from_env()) {
            (Some(api_key), Some(ship_from)) => Some(EasyPostConfig {
                api_key,
                api_base: "https://api.easypost.com".into(),
                ship_from,
            }),
            (Some(_), None) => {
                tracing::warn!("EASYPOST_API_KEY is set but SHIP_FROM_* is incomplete; shipping disabled");
                None
            }
            _ => None,
        };

        let sendgrid = match (env("SENDGRID_API_KEY"), env("SENDGRID_FROM_EMAIL")) {
            (Some(api_key), Some(from_email)) => Some(SendGridConfig {
                api_key,
                from_email,
                from_name: env("SENDGRID_FROM_NAME"),
                api_base: "https://api.sendgrid.com".into(),
            }),
            _ => None,
        };

        Self {
            shopify,
            stripe,
            easypost,
            sendgrid,
        }
    }
}

/// A non-empty environment variable.
fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn ship_from_env() -> Option<Address> {
    Some(Address {
        name: env("SHIP_FROM_NAME")?,
        street1: env("SHIP_FROM_STREET1")?,
        street2: env("SHIP_FROM_STREET2"),
        city: env("SHIP_FROM_CITY")?,
        state: env("SHIP_FROM_STATE")?,
        zip: env("SHIP_FROM_ZIP")?,
        country: env("SHIP_FROM_COUNTRY").unwrap_or_else(|| "US".into()),
        phone: env("SHIP_FROM_PHONE"),
        email: None,
    })
}
