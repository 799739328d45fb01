use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use tokio::time::MissedTickBehavior;

use crate::config::RetrySettings;
use crate::domain::errors::DomainError;
use crate::domain::order::{DecrementStatus, PendingDecrement};
use crate::domain::ports::{DecrementOutbox, InventoryGateway};

use super::order_service::blocking;

/// Send one decrement to the inventory service and record the outcome in the
/// outbox. Returns `true` when the inventory service accepted it.
pub(crate) async fn attempt_decrement(
    inventory: &dyn InventoryGateway,
    outbox: &Arc<dyn DecrementOutbox>,
    decrement: &PendingDecrement,
    max_attempts: i32,
) -> bool {
    let id = decrement.id;
    let outbox = Arc::clone(outbox);

    match inventory
        .decrement_stock(decrement.product_id, decrement.quantity)
        .await
    {
        Ok(()) => {
            if let Err(e) = blocking(move || outbox.complete(id)).await {
                error!(
                    "Stock for product {} (order {}) was decremented but outbox row {} could not be closed: {}",
                    decrement.product_id, decrement.order_id, id, e
                );
            }
            true
        }
        Err(e) => {
            let reason = e.to_string();
            warn!(
                "Stock decrement failed for order {} product {} quantity {}: {}",
                decrement.order_id, decrement.product_id, decrement.quantity, reason
            );
            match blocking(move || outbox.record_failure(id, &reason, max_attempts)).await {
                Ok(DecrementStatus::Failed) => error!(
                    "Giving up on stock decrement {} for order {} product {} after {} attempts",
                    id, decrement.order_id, decrement.product_id, max_attempts
                ),
                Ok(_) => {}
                Err(e) => error!("Could not record failed decrement {}: {}", id, e),
            }
            false
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayReport {
    pub completed: usize,
    pub failed: usize,
}

/// Background retry of stock decrements that did not go through inline.
///
/// Only rows without a live claim are taken, so a decrement the creating
/// request still owns is never sent from here as well.
pub struct DecrementRelay {
    outbox: Arc<dyn DecrementOutbox>,
    inventory: Arc<dyn InventoryGateway>,
    settings: RetrySettings,
}

impl DecrementRelay {
    pub fn new(
        outbox: Arc<dyn DecrementOutbox>,
        inventory: Arc<dyn InventoryGateway>,
        settings: RetrySettings,
    ) -> Self {
        Self {
            outbox,
            inventory,
            settings,
        }
    }

    /// Poll the outbox forever at the configured interval.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.settings.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!("Decrement relay pass failed: {}", e);
            }
        }
    }

    pub async fn run_once(&self) -> Result<RelayReport, DomainError> {
        let now = Utc::now();
        let max_attempts = self.settings.max_attempts;
        let limit = self.settings.batch_size;

        let outbox = Arc::clone(&self.outbox);
        let due = blocking(move || outbox.due(now, max_attempts, limit)).await?;

        let mut report = RelayReport::default();
        for decrement in &due {
            if attempt_decrement(self.inventory.as_ref(), &self.outbox, decrement, max_attempts)
                .await
            {
                report.completed += 1;
            } else {
                report.failed += 1;
            }
        }

        if !due.is_empty() {
            info!(
                "Decrement relay retried {} row(s): {} completed, {} failed",
                due.len(),
                report.completed,
                report.failed
            );
        }
        Ok(report)
    }
}
