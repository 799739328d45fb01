use std::str::FromStr;

use actix_web::http::header::ContentType;
use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::OrderService;
use crate::domain::order::{Order, OrderLine, OrderLineInput};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderLineRequest {
    pub producto_id: i32,
    pub cantidad: i32,
    pub precio_unitario: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub cliente: String,
    /// Missing or `null` means an order without lines.
    pub detalles: Option<Vec<CreateOrderLineRequest>>,
}

impl TryFrom<CreateOrderLineRequest> for OrderLineInput {
    type Error = AppError;

    fn try_from(line: CreateOrderLineRequest) -> Result<Self, Self::Error> {
        // Go through the shortest decimal rendering so 9.99 stays 9.99.
        let unit_price = BigDecimal::from_str(&line.precio_unitario.to_string()).map_err(|e| {
            AppError::BadRequest(format!(
                "Invalid precio_unitario '{}': {}",
                line.precio_unitario, e
            ))
        })?;
        Ok(OrderLineInput {
            product_id: line.producto_id,
            quantity: line.cantidad,
            unit_price,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub producto_id: i32,
    pub cantidad: i32,
    pub precio_unitario: f64,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        OrderLineResponse {
            producto_id: line.product_id,
            cantidad: line.quantity,
            precio_unitario: line.unit_price.to_f64().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id_pedido: i32,
    pub cliente: String,
    /// `YYYY-MM-DD`
    pub fecha: String,
    pub estado: String,
    pub detalles: Vec<OrderLineResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id_pedido: order.id,
            cliente: order.customer,
            fecha: order.created_on.to_string(),
            estado: order.status.to_string(),
            detalles: order.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /pedidos
///
/// Checks stock for every line with the inventory service, stores the order
/// and its lines in one transaction, then asks the inventory service to
/// decrement stock. A failed decrement does not change the response.
#[utoipa::path(
    post,
    path = "/pedidos",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created: `Pedido creado con ID: <id>`", body = String,
            content_type = "text/plain"),
        (status = 400, description = "Invalid payload or insufficient stock"),
        (status = 500, description = "Inventory service or database failure"),
    ),
    tag = "pedidos"
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let lines = body
        .detalles
        .unwrap_or_default()
        .into_iter()
        .map(OrderLineInput::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let order_id = service.create_order(body.cliente, lines).await?;

    Ok(HttpResponse::Created()
        .content_type(ContentType::plaintext())
        .body(format!("Pedido creado con ID: {}", order_id)))
}

/// GET /pedidos/{id}
///
/// Returns the order together with its lines.
#[utoipa::path(
    get,
    path = "/pedidos/{id}",
    params(
        ("id" = i32, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 400, description = "Invalid order id"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pedidos"
)]
pub async fn get_order(
    service: web::Data<OrderService>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let order = service.get_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /pedidos
///
/// Returns every order with its lines.
#[utoipa::path(
    get,
    path = "/pedidos",
    responses(
        (status = 200, description = "All orders", body = Vec<OrderResponse>),
        (status = 500, description = "Internal server error"),
    ),
    tag = "pedidos"
)]
pub async fn list_orders(service: web::Data<OrderService>) -> Result<HttpResponse, AppError> {
    let orders: Vec<OrderResponse> = service
        .list_orders()
        .await?
        .into_iter()
        .map(OrderResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(orders))
}
