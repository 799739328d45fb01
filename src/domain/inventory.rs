use serde::Deserialize;
use thiserror::Error;

/// Read-only view of a product as reported by the inventory service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: i32,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "inventario")]
    pub stock: u32,
    #[serde(rename = "precio")]
    pub price: f64,
}

impl Product {
    pub fn has_stock_for(&self, quantity: i32) -> bool {
        i64::from(self.stock) >= i64::from(quantity)
    }
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory service unreachable: {0}")]
    Unreachable(String),
    #[error("product {0} not found in inventory")]
    NotFound(i32),
    #[error("malformed inventory response: {0}")]
    MalformedResponse(String),
    #[error("inventory service rejected stock update for product {product_id} (HTTP {status})")]
    RejectedByService { product_id: i32, status: u16 },
}
