//! Clients for the hosted services the backend talks to: Shopify Admin
//! GraphQL (catalog), Stripe (payments), EasyPost (shipping) and SendGrid
//! (email).
//!
//! Each service sits behind a trait so handlers and jobs can be driven by an
//! in-memory fake in tests. [`Integrations`] holds whichever clients are
//! configured; an unconfigured one yields [`IntegrationError::NotConfigured`].

use std::sync::Arc;
use std::time::Duration;

pub mod catalog;
pub mod config;
pub mod easypost;
pub mod error;
pub mod mailer;
pub mod payments;
pub mod sendgrid;
pub mod shipping;
pub mod shopify;
pub mod stripe;

pub use catalog::CatalogSource;
pub use config::IntegrationsConfig;
pub use error::IntegrationError;
pub use mailer::Mailer;
pub use payments::PaymentGateway;
pub use shipping::ShippingCarrier;

/// Timeout applied to every outbound request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the shared outbound HTTP client.
pub fn build_http_client() -> Result<reqwest::Client, IntegrationError> {
    Ok(reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(concat!("kct-backend/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// The configured third-party clients.
#[derive(Clone, Default)]
pub struct Integrations {
    pub catalog: Option<Arc<dyn CatalogSource>>,
    pub payments: Option<Arc<dyn PaymentGateway>>,
    pub shipping: Option<Arc<dyn ShippingCarrier>>,
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl Integrations {
    /// Build clients for every service that has credentials in `config`.
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        let http = build_http_client()?;

        let catalog = config.shopify.as_ref().map(|c| {
            Arc::new(shopify::ShopifyClient::with_client(http.clone(), c.clone()))
                as Arc<dyn CatalogSource>
        });
        let payments = config.stripe.as_ref().map(|c| {
            Arc::new(stripe::StripeClient::with_client(http.clone(), c.clone()))
                as Arc<dyn PaymentGateway>
        });
        let shipping = config.easypost.as_ref().map(|c| {
            Arc::new(easypost::EasyPostClient::with_client(http.clone(), c.clone()))
                as Arc<dyn ShippingCarrier>
        });
        let mailer = config.sendgrid.as_ref().map(|c| {
            Arc::new(sendgrid::SendGridClient::with_client(http.clone(), c.clone()))
                as Arc<dyn Mailer>
        });

        tracing::info!(
            catalog = catalog.is_some(),
            payments = payments.is_some(),
            shipping = shipping.is_some(),
            mailer = mailer.is_some(),
            "Integrations configured"
        );

        Ok(Self {
            catalog,
            payments,
            shipping,
            mailer,
        })
    }

    pub fn catalog(&self) -> Result<&Arc<dyn CatalogSource>, IntegrationError> {
        self.catalog
            .as_ref()
            .ok_or(IntegrationError::NotConfigured("Shopify"))
    }

    pub fn payments(&self) -> Result<&Arc<dyn PaymentGateway>, IntegrationError> {
        self.payments
            .as_ref()
            .ok_or(IntegrationError::NotConfigured("Stripe"))
    }

    pub fn shipping(&self) -> Result<&Arc<dyn ShippingCarrier>, IntegrationError> {
        self.shipping
            .as_ref()
            .ok_or(IntegrationError::NotConfigured("EasyPost"))
    }

    pub fn mailer(&self) -> Result<&Arc<dyn Mailer>, IntegrationError> {
        self.mailer
            .as_ref()
            .ok_or(IntegrationError::NotConfigured("SendGrid"))
    }
}
