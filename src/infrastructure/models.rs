use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::schema::{detalle_pedido, inventory_outbox, pedidos};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = pedidos)]
#[diesel(primary_key(id_pedido))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id_pedido: i32,
    pub cliente: String,
    pub fecha: NaiveDate,
    pub estado: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pedidos)]
pub struct NewOrderRow<'a> {
    pub cliente: &'a str,
    pub estado: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = detalle_pedido)]
#[diesel(primary_key(id_detalle))]
#[diesel(belongs_to(OrderRow, foreign_key = id_pedido))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineRow {
    pub id_detalle: i32,
    pub id_pedido: i32,
    pub producto_id: i32,
    pub cantidad: i32,
    pub precio_unitario: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = detalle_pedido)]
pub struct NewOrderLineRow {
    pub id_pedido: i32,
    pub producto_id: i32,
    pub cantidad: i32,
    pub precio_unitario: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = inventory_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxRow {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub claimed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = inventory_outbox)]
pub struct NewOutboxRow<'a> {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub status: &'a str,
    pub claimed_until: DateTime<Utc>,
}
