use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
}

impl OrderStatus {
    /// Literal stored in `pedidos.estado`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pendiente",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pendiente" => Ok(OrderStatus::Pending),
            other => Err(DomainError::Persistence(format!(
                "unknown order status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineInput {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i32,
    pub customer: String,
    pub created_on: NaiveDate,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementStatus {
    Pending,
    Completed,
    Failed,
}

impl DecrementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecrementStatus::Pending => "pending",
            DecrementStatus::Completed => "completed",
            DecrementStatus::Failed => "failed",
        }
    }
}

impl FromStr for DecrementStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DecrementStatus::Pending),
            "completed" => Ok(DecrementStatus::Completed),
            "failed" => Ok(DecrementStatus::Failed),
            other => Err(DomainError::Persistence(format!(
                "unknown decrement status '{}'",
                other
            ))),
        }
    }
}

/// A stock decrement the service still owes the inventory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDecrement {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub attempts: i32,
}

/// Result of persisting an order: its id plus the decrements recorded
/// alongside it in the same transaction.
#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub order_id: i32,
    pub decrements: Vec<PendingDecrement>,
}

/// How long the request that created an order keeps exclusive ownership of
/// the decrements it owes. The relay only touches a never-attempted row after
/// its claim has run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecrementClaim {
    /// Worst-case time to send one decrement and record its outcome.
    pub per_line: Duration,
    /// Slack on top of the worst case.
    pub grace: Duration,
}

impl DecrementClaim {
    /// Claim deadline for an order of `lines` lines created at `from`. One
    /// extra slot covers the insert transaction itself.
    pub fn deadline(&self, from: DateTime<Utc>, lines: usize) -> DateTime<Utc> {
        let slots = i32::try_from(lines.saturating_add(1)).unwrap_or(i32::MAX);
        let hold = self
            .per_line
            .checked_mul(slots)
            .and_then(|d| d.checked_add(&self.grace))
            .unwrap_or(Duration::MAX);
        from.checked_add_signed(hold).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
