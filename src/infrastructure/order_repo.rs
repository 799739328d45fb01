use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    CreatedOrder, DecrementStatus, Order, OrderLine, OrderLineInput, OrderStatus, PendingDecrement,
};
use crate::domain::ports::{DecrementOutbox, OrderRepository};
use crate::schema::{detalle_pedido, inventory_outbox, pedidos};

use super::models::{NewOrderLineRow, NewOrderRow, NewOutboxRow, OrderLineRow, OrderRow, OutboxRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Persistence(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Persistence(e.to_string())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn into_order(row: OrderRow, lines: Vec<OrderLineRow>) -> Result<Order, DomainError> {
    Ok(Order {
        id: row.id_pedido,
        customer: row.cliente,
        created_on: row.fecha,
        status: row.estado.parse::<OrderStatus>()?,
        lines: lines
            .into_iter()
            .map(|l| OrderLine {
                product_id: l.producto_id,
                quantity: l.cantidad,
                unit_price: l.precio_unitario,
            })
            .collect(),
    })
}

impl From<OutboxRow> for PendingDecrement {
    fn from(row: OutboxRow) -> Self {
        PendingDecrement {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            attempts: row.attempts,
        }
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn create(
        &self,
        customer: &str,
        lines: &[OrderLineInput],
        claimed_until: DateTime<Utc>,
    ) -> Result<CreatedOrder, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order; id and date are assigned by Postgres.
            let order_id: i32 = diesel::insert_into(pedidos::table)
                .values(&NewOrderRow {
                    cliente: customer,
                    estado: OrderStatus::Pending.as_str(),
                })
                .returning(pedidos::id_pedido)
                .get_result(conn)?;

            if lines.is_empty() {
                return Ok(CreatedOrder {
                    order_id,
                    decrements: Vec::new(),
                });
            }

            // 2. Insert order lines
            let new_lines: Vec<NewOrderLineRow> = lines
                .iter()
                .map(|l| NewOrderLineRow {
                    id_pedido: order_id,
                    producto_id: l.product_id,
                    cantidad: l.quantity,
                    precio_unitario: l.unit_price.clone(),
                })
                .collect();
            diesel::insert_into(detalle_pedido::table)
                .values(&new_lines)
                .execute(conn)?;

            // 3. Record the stock decrements owed to the inventory service,
            //    claimed by the caller who is about to send them.
            let new_decrements: Vec<NewOutboxRow> = lines
                .iter()
                .map(|l| NewOutboxRow {
                    order_id,
                    product_id: l.product_id,
                    quantity: l.quantity,
                    status: DecrementStatus::Pending.as_str(),
                    claimed_until,
                })
                .collect();
            let mut rows: Vec<OutboxRow> = diesel::insert_into(inventory_outbox::table)
                .values(&new_decrements)
                .returning(OutboxRow::as_returning())
                .get_results(conn)?;
            rows.sort_by_key(|r| r.id);

            Ok(CreatedOrder {
                order_id,
                decrements: rows.into_iter().map(PendingDecrement::from).collect(),
            })
        })
    }

    fn find_by_id(&self, id: i32) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, DomainError, _>(|conn| {
                let order = pedidos::table
                    .find(id)
                    .select(OrderRow::as_select())
                    .first(conn)
                    .optional()?;

                let Some(order) = order else {
                    return Ok(None);
                };

                let lines = OrderLineRow::belonging_to(&order)
                    .select(OrderLineRow::as_select())
                    .order(detalle_pedido::id_detalle.asc())
                    .load(conn)?;

                into_order(order, lines).map(Some)
            })
    }

    fn list(&self) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run::<_, DomainError, _>(|conn| {
                let orders = pedidos::table
                    .select(OrderRow::as_select())
                    .order(pedidos::id_pedido.asc())
                    .load(conn)?;

                let lines = OrderLineRow::belonging_to(&orders)
                    .select(OrderLineRow::as_select())
                    .order(detalle_pedido::id_detalle.asc())
                    .load(conn)?;

                lines
                    .grouped_by(&orders)
                    .into_iter()
                    .zip(orders)
                    .map(|(lines, order)| into_order(order, lines))
                    .collect()
            })
    }
}

impl DecrementOutbox for DieselOrderRepository {
    fn complete(&self, id: i32) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::update(inventory_outbox::table.find(id))
            .set((
                inventory_outbox::status.eq(DecrementStatus::Completed.as_str()),
                inventory_outbox::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn record_failure(
        &self,
        id: i32,
        error: &str,
        max_attempts: i32,
    ) -> Result<DecrementStatus, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let attempts: i32 = diesel::update(inventory_outbox::table.find(id))
                .set((
                    inventory_outbox::attempts.eq(inventory_outbox::attempts + 1),
                    inventory_outbox::last_error.eq(error),
                    inventory_outbox::claimed_until.eq(None::<DateTime<Utc>>),
                    inventory_outbox::updated_at.eq(Utc::now()),
                ))
                .returning(inventory_outbox::attempts)
                .get_result(conn)?;

            if attempts < max_attempts {
                return Ok(DecrementStatus::Pending);
            }

            diesel::update(inventory_outbox::table.find(id))
                .set(inventory_outbox::status.eq(DecrementStatus::Failed.as_str()))
                .execute(conn)?;
            Ok(DecrementStatus::Failed)
        })
    }

    fn due(
        &self,
        now: DateTime<Utc>,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<PendingDecrement>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = inventory_outbox::table
            .select(OutboxRow::as_select())
            .filter(inventory_outbox::status.eq(DecrementStatus::Pending.as_str()))
            .filter(inventory_outbox::attempts.lt(max_attempts))
            .filter(
                inventory_outbox::claimed_until
                    .is_null()
                    .or(inventory_outbox::claimed_until.lt(now)),
            )
            .order(inventory_outbox::id.asc())
            .limit(limit)
            .load(&mut conn)?;

        Ok(rows.into_iter().map(PendingDecrement::from).collect())
    }
}
