use async_trait::async_trait;

use crate::error::IntegrationError;

/// A plain-text transactional email.
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), IntegrationError>;
}
