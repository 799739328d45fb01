use thiserror::Error;

use super::inventory::InventoryError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: i32,
        requested: i32,
        available: u32,
    },
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
    #[error("Persistence error: {0}")]
    Persistence(String),
}
