use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub street1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn default_country() -> String {
    "US".to_string()
}

/// Dimensions in inches, weight in ounces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
}

impl Default for Parcel {
    fn default() -> Self {
        use kct_core::shipping::*;
        Self {
            length: DEFAULT_PARCEL_LENGTH_IN,
            width: DEFAULT_PARCEL_WIDTH_IN,
            height: DEFAULT_PARCEL_HEIGHT_IN,
            weight: DEFAULT_PARCEL_WEIGHT_OZ,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rate {
    pub id: String,
    pub carrier: String,
    pub service: String,
    /// Decimal string as returned by the carrier, e.g. `"12.40"`.
    pub rate: String,
    pub currency: Option<String>,
    pub delivery_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Shipment {
    pub id: String,
    pub rates: Vec<Rate>,
}

impl Shipment {
    /// Cheapest quoted rate. Unparseable prices sort last.
    pub fn cheapest_rate(&self) -> Option<&Rate> {
        self.rates.iter().min_by(|a, b| {
            let a = a.rate.parse::<f64>().unwrap_or(f64::MAX);
            let b = b.rate.parse::<f64>().unwrap_or(f64::MAX);
            a.total_cmp(&b)
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchasedLabel {
    pub shipment_id: String,
    pub tracking_code: String,
    pub carrier: String,
    pub label_url: String,
}

#[async_trait]
pub trait ShippingCarrier: Send + Sync {
    /// Create a shipment and return its rate quotes.
    async fn create_shipment(
        &self,
        to: &Address,
        parcel: &Parcel,
    ) -> Result<Shipment, IntegrationError>;

    /// Buy the label for a previously quoted rate.
    async fn buy_label(
        &self,
        shipment_id: &str,
        rate_id: &str,
    ) -> Result<PurchasedLabel, IntegrationError>;
}
