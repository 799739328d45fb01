//! HTTP client for the inventory service.
//!
//! Stock is read with `GET /productos/{id}` and decremented with
//! `POST /productos/{id}/actualizar_inventario`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{InventorySettings, ProductEnvelope};
use crate::domain::inventory::{InventoryError, Product};
use crate::domain::ports::InventoryGateway;

#[derive(Deserialize)]
struct NestedProductResponse {
    producto: Product,
}

#[derive(Serialize)]
struct DecrementRequest {
    cantidad: i32,
}

/// Parse a product body according to the configured response contract.
pub fn parse_product(envelope: ProductEnvelope, body: &[u8]) -> Result<Product, InventoryError> {
    let parsed = match envelope {
        ProductEnvelope::Nested => {
            serde_json::from_slice::<NestedProductResponse>(body).map(|r| r.producto)
        }
        ProductEnvelope::Flat => serde_json::from_slice::<Product>(body),
    };
    parsed.map_err(|e| InventoryError::MalformedResponse(e.to_string()))
}

fn transport_error(e: reqwest::Error) -> InventoryError {
    if e.is_timeout() {
        InventoryError::Unreachable(format!("request timed out: {}", e))
    } else {
        InventoryError::Unreachable(e.to_string())
    }
}

pub struct HttpInventoryClient {
    client: Client,
    base_url: String,
    envelope: ProductEnvelope,
}

impl HttpInventoryClient {
    pub fn new(settings: &InventorySettings) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            envelope: settings.envelope,
        })
    }
}

#[async_trait]
impl InventoryGateway for HttpInventoryClient {
    async fn fetch_product(&self, product_id: i32) -> Result<Product, InventoryError> {
        let response = self
            .client
            .get(format!("{}/productos/{}", self.base_url, product_id))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(InventoryError::NotFound(product_id));
        }
        if !status.is_success() {
            return Err(InventoryError::Unreachable(format!(
                "GET product {} returned HTTP {}",
                product_id, status
            )));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        parse_product(self.envelope, &body)
    }

    async fn decrement_stock(&self, product_id: i32, quantity: i32) -> Result<(), InventoryError> {
        let response = self
            .client
            .post(format!(
                "{}/productos/{}/actualizar_inventario",
                self.base_url, product_id
            ))
            .json(&DecrementRequest { cantidad: quantity })
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(InventoryError::RejectedByService {
                product_id,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
