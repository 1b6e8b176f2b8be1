//! Stripe REST client. Only PaymentIntent creation is needed; webhooks are
//! verified in `kct_core::signatures`.

use async_trait::async_trait;

use crate::config::StripeConfig;
use crate::error::{ensure_success, IntegrationError};
use crate::payments::{PaymentGateway, PaymentIntent, PaymentIntentRequest};

const SERVICE: &str = "Stripe";

pub struct StripeClient {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, IntegrationError> {
        Ok(Self::with_client(crate::build_http_client()?, config))
    }

    pub fn with_client(client: reqwest::Client, config: StripeConfig) -> Self {
        Self { client, config }
    }
}

/// Form body for `POST /v1/payment_intents`. Stripe expects nested keys in
/// bracket notation (`metadata[order_id]=42`).
fn intent_form_params(request: &PaymentIntentRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), request.amount_cents.to_string()),
        ("currency".to_string(), request.currency.to_lowercase()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    if let Some(description) = &request.description {
        params.push(("description".to_string(), description.clone()));
    }
    if let Some(email) = &request.receipt_email {
        params.push(("receipt_email".to_string(), email.clone()));
    }
    for (key, value) in &request.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }
    params
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, IntegrationError> {
        let url = format!("{}/v1/payment_intents", self.config.api_base);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.secret_key)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&intent_form_params(request))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let intent: PaymentIntent = response.json().await?;
        tracing::info!(
            payment_intent_id = %intent.id,
            amount = intent.amount,
            "Created Stripe PaymentIntent"
        );
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn form_params_use_bracketed_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert("payment_type".to_string(), "group".to_string());
        metadata.insert("wedding_id".to_string(), "7".to_string());
        let request = PaymentIntentRequest {
            amount_cents: 45_000,
            currency: "USD".into(),
            description: None,
            receipt_email: Some("groom@example.com".into()),
            metadata,
            idempotency_key: "k".into(),
        };

        let params = intent_form_params(&request);
        let get = |k: &str| {
            params
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("amount"), Some("45000"));
        assert_eq!(get("currency"), Some("usd"));
        assert_eq!(get("metadata[payment_type]"), Some("group"));
        assert_eq!(get("metadata[wedding_id]"), Some("7"));
        assert_eq!(get("receipt_email"), Some("groom@example.com"));
        assert_eq!(get("description"), None);
    }

    #[test]
    fn intent_response_parses() {
        let body = serde_json::json!({
            "id": "pi_123",
            "object": "payment_intent",
            "client_secret": "pi_123_secret_abc",
            "status": "requires_payment_method",
            "amount": 45000,
            "currency": "usd"
        });
        let intent: PaymentIntent = serde_json::from_value(body).unwrap();
        assert_eq!(intent.id, "pi_123");
        assert_eq!(intent.client_secret.as_deref(), Some("pi_123_secret_abc"));
    }
}
