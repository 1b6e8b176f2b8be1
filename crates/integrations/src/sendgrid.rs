//! SendGrid v3 mail client.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::SendGridConfig;
use crate::error::{ensure_success, IntegrationError};
use crate::mailer::{Email, Mailer};

const SERVICE: &str = "SendGrid";

pub struct SendGridClient {
    client: reqwest::Client,
    config: SendGridConfig,
}

impl SendGridClient {
    pub fn new(config: SendGridConfig) -> Result<Self, IntegrationError> {
        Ok(Self::with_client(crate::build_http_client()?, config))
    }

    pub fn with_client(client: reqwest::Client, config: SendGridConfig) -> Self {
        Self { client, config }
    }

    fn payload(&self, email: &Email) -> Value {
        let mut from = json!({ "email": self.config.from_email });
        if let Some(name) = &self.config.from_name {
            from["name"] = json!(name);
        }
        json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": from,
            "subject": email.subject,
            "content": [{ "type": "text/plain", "value": email.text }],
        })
    }
}

#[async_trait]
impl Mailer for SendGridClient {
    async fn send(&self, email: &Email) -> Result<(), IntegrationError> {
        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&self.payload(email))
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;
        tracing::debug!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}
