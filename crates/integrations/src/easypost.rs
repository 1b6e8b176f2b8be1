//! EasyPost REST client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::EasyPostConfig;
use crate::error::{ensure_success, IntegrationError};
use crate::shipping::{Address, Parcel, PurchasedLabel, Rate, Shipment, ShippingCarrier};

const SERVICE: &str = "EasyPost";

pub struct EasyPostClient {
    client: reqwest::Client,
    config: EasyPostConfig,
}

impl EasyPostClient {
    pub fn new(config: EasyPostConfig) -> Result<Self, IntegrationError> {
        Ok(Self::with_client(crate::build_http_client()?, config))
    }

    pub fn with_client(client: reqwest::Client, config: EasyPostConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2{path}", self.config.api_base)
    }
}

#[derive(Debug, Deserialize)]
struct ShipmentResponse {
    id: String,
    #[serde(default)]
    rates: Vec<Rate>,
}

#[derive(Debug, Deserialize)]
struct BoughtShipmentResponse {
    id: String,
    tracking_code: Option<String>,
    postage_label: Option<PostageLabel>,
    selected_rate: Option<Rate>,
}

#[derive(Debug, Deserialize)]
struct PostageLabel {
    label_url: Option<String>,
}

impl BoughtShipmentResponse {
    fn into_label(self) -> Result<PurchasedLabel, IntegrationError> {
        let missing = |field: &str| IntegrationError::Decode {
            service: SERVICE,
            message: format!("bought shipment {} has no {field}", self.id),
        };
        let tracking_code = self.tracking_code.clone().ok_or_else(|| missing("tracking_code"))?;
        let label_url = self
            .postage_label
            .as_ref()
            .and_then(|l| l.label_url.clone())
            .ok_or_else(|| missing("postage_label.label_url"))?;
        let carrier = self
            .selected_rate
            .as_ref()
            .map(|r| r.carrier.clone())
            .ok_or_else(|| missing("selected_rate"))?;
        Ok(PurchasedLabel {
            shipment_id: self.id,
            tracking_code,
            carrier,
            label_url,
        })
    }
}

#[async_trait]
impl ShippingCarrier for EasyPostClient {
    async fn create_shipment(
        &self,
        to: &Address,
        parcel: &Parcel,
    ) -> Result<Shipment, IntegrationError> {
        let body = json!({
            "shipment": {
                "to_address": to,
                "from_address": self.config.ship_from,
                "parcel": parcel,
            }
        });
        let response = self
            .client
            .post(self.url("/shipments"))
            .basic_auth(&self.config.api_key, Some(""))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let shipment: ShipmentResponse = response.json().await?;
        tracing::debug!(shipment_id = %shipment.id, rates = shipment.rates.len(), "Created EasyPost shipment");
        Ok(Shipment {
            id: shipment.id,
            rates: shipment.rates,
        })
    }

    async fn buy_label(
        &self,
        shipment_id: &str,
        rate_id: &str,
    ) -> Result<PurchasedLabel, IntegrationError> {
        let response = self
            .client
            .post(self.url(&format!("/shipments/{shipment_id}/buy")))
            .basic_auth(&self.config.api_key, Some(""))
            .json(&json!({ "rate": { "id": rate_id } }))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let bought: BoughtShipmentResponse = response.json().await?;
        let label = bought.into_label()?;
        tracing::info!(
            shipment_id = %label.shipment_id,
            tracking_code = %label.tracking_code,
            "Purchased EasyPost label"
        );
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn bought_shipment_maps_to_label() {
        let body = json!({
            "id": "shp_1",
            "tracking_code": "9400100000000000000000",
            "postage_label": { "label_url": "https://easypost-files.s3/label.png" },
            "selected_rate": {
                "id": "rate_1", "carrier": "USPS", "service": "Priority",
                "rate": "9.85", "currency": "USD", "delivery_days": 2
            }
        });
        let bought: BoughtShipmentResponse = serde_json::from_value(body).unwrap();
        let label = bought.into_label().unwrap();
        assert_eq!(label.carrier, "USPS");
        assert_eq!(label.tracking_code, "9400100000000000000000");
    }

    #[test]
    fn bought_shipment_without_label_is_decode_error() {
        let body = json!({ "id": "shp_1", "tracking_code": "94001" });
        let bought: BoughtShipmentResponse = serde_json::from_value(body).unwrap();
        assert_matches!(bought.into_label(), Err(IntegrationError::Decode { .. }));
    }
}
