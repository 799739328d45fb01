use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::DomainError;
use super::inventory::{InventoryError, Product};
use super::order::{CreatedOrder, DecrementStatus, Order, OrderLineInput, PendingDecrement};

pub trait OrderRepository: Send + Sync + 'static {
    /// Inserts the order, its lines and one pending decrement per line in a
    /// single transaction. The decrements stay claimed by the caller until
    /// `claimed_until`.
    fn create(
        &self,
        customer: &str,
        lines: &[OrderLineInput],
        claimed_until: DateTime<Utc>,
    ) -> Result<CreatedOrder, DomainError>;
    fn find_by_id(&self, id: i32) -> Result<Option<Order>, DomainError>;
    fn list(&self) -> Result<Vec<Order>, DomainError>;
}

pub trait DecrementOutbox: Send + Sync + 'static {
    fn complete(&self, id: i32) -> Result<(), DomainError>;
    /// Counts a failed attempt and releases the claim; the row becomes
    /// `Failed` once `max_attempts` is reached.
    fn record_failure(
        &self,
        id: i32,
        error: &str,
        max_attempts: i32,
    ) -> Result<DecrementStatus, DomainError>;
    /// Pending rows nobody holds a claim on at `now`.
    fn due(
        &self,
        now: DateTime<Utc>,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<PendingDecrement>, DomainError>;
}

#[async_trait]
pub trait InventoryGateway: Send + Sync + 'static {
    async fn fetch_product(&self, product_id: i32) -> Result<Product, InventoryError>;
    async fn decrement_stock(&self, product_id: i32, quantity: i32)
        -> Result<(), InventoryError>;
}
