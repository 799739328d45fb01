use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use log::{debug, info};

use crate::config::{RetrySettings, Settings};
use crate::domain::errors::DomainError;
use crate::domain::inventory::InventoryError;
use crate::domain::order::{DecrementClaim, Order, OrderLineInput, PendingDecrement};
use crate::domain::ports::{DecrementOutbox, InventoryGateway, OrderRepository};

use super::decrement_relay::attempt_decrement;

/// Run a blocking store call on the blocking thread pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Persistence(e.to_string()))?
}

/// Widest customer name `pedidos.cliente` holds.
pub const MAX_CUSTOMER_LEN: usize = 255;

/// Payload checks that need no remote call.
pub fn validate_order(
    customer: &str,
    lines: &[OrderLineInput],
    allow_empty: bool,
) -> Result<(), DomainError> {
    if customer.trim().is_empty() {
        return Err(DomainError::InvalidInput(
            "cliente must not be empty".to_string(),
        ));
    }
    // Postgres counts characters, not bytes.
    if customer.chars().count() > MAX_CUSTOMER_LEN {
        return Err(DomainError::InvalidInput(format!(
            "cliente must be at most {} characters",
            MAX_CUSTOMER_LEN
        )));
    }
    if lines.is_empty() && !allow_empty {
        return Err(DomainError::InvalidInput(
            "an order needs at least one line".to_string(),
        ));
    }
    let zero = BigDecimal::from(0);
    for line in lines {
        if line.quantity <= 0 {
            return Err(DomainError::InvalidInput(format!(
                "cantidad for product {} must be positive, got {}",
                line.product_id, line.quantity
            )));
        }
        if line.unit_price < zero {
            return Err(DomainError::InvalidInput(format!(
                "precio_unitario for product {} must not be negative",
                line.product_id
            )));
        }
    }
    Ok(())
}

/// Order placement workflow plus the read paths over stored orders.
///
/// Creation validates every line against the inventory service before
/// anything is written, persists the order in one transaction, then asks the
/// inventory service to decrement stock line by line. Decrement failures are
/// logged and left in the outbox; they never fail the request.
///
/// Two concurrent orders for the same product can both pass validation: stock
/// is read, not reserved.
///
/// The decrements written with an order are claimed for long enough to send
/// them all, so the relay does not send them a second time.
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    outbox: Arc<dyn DecrementOutbox>,
    inventory: Arc<dyn InventoryGateway>,
    allow_empty: bool,
    max_decrement_attempts: i32,
    decrement_claim: DecrementClaim,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        outbox: Arc<dyn DecrementOutbox>,
        inventory: Arc<dyn InventoryGateway>,
    ) -> Self {
        Self {
            repo,
            outbox,
            inventory,
            allow_empty: true,
            max_decrement_attempts: RetrySettings::default().max_attempts,
            decrement_claim: Settings::default().decrement_claim(),
        }
    }

    pub fn allow_empty_orders(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    pub fn max_decrement_attempts(mut self, attempts: i32) -> Self {
        self.max_decrement_attempts = attempts;
        self
    }

    pub fn decrement_claim(mut self, claim: DecrementClaim) -> Self {
        self.decrement_claim = claim;
        self
    }

    pub async fn create_order(
        &self,
        customer: String,
        lines: Vec<OrderLineInput>,
    ) -> Result<i32, DomainError> {
        validate_order(&customer, &lines, self.allow_empty)?;
        self.check_stock(&lines).await?;

        let claimed_until = self.decrement_claim.deadline(Utc::now(), lines.len());
        let repo = Arc::clone(&self.repo);
        let created = blocking(move || repo.create(&customer, &lines, claimed_until)).await?;
        info!(
            "Created order {} with {} line(s)",
            created.order_id,
            created.decrements.len()
        );

        self.dispatch_decrements(&created.decrements).await;
        Ok(created.order_id)
    }

    pub async fn get_order(&self, id: i32) -> Result<Order, DomainError> {
        let repo = Arc::clone(&self.repo);
        blocking(move || repo.find_by_id(id))
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        let repo = Arc::clone(&self.repo);
        blocking(move || repo.list()).await
    }

    /// Fetch and check each line in submitted order; the first failure wins.
    async fn check_stock(&self, lines: &[OrderLineInput]) -> Result<(), DomainError> {
        for line in lines {
            let product = self.inventory.fetch_product(line.product_id).await?;
            if product.id != line.product_id {
                return Err(InventoryError::MalformedResponse(format!(
                    "asked for product {} but got product {}",
                    line.product_id, product.id
                ))
                .into());
            }
            debug!(
                "Product {} has {} in stock, {} requested",
                product.id, product.stock, line.quantity
            );
            if !product.has_stock_for(line.quantity) {
                return Err(DomainError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }
        }
        Ok(())
    }

    async fn dispatch_decrements(&self, decrements: &[PendingDecrement]) {
        for decrement in decrements {
            attempt_decrement(
                self.inventory.as_ref(),
                &self.outbox,
                decrement,
                self.max_decrement_attempts,
            )
            .await;
        }
    }
}
