//! Shared fixtures: an in-memory order store and an in-process mock of the
//! inventory service.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use pedidos_service::config::{InventorySettings, ProductEnvelope};
use pedidos_service::domain::errors::DomainError;
use pedidos_service::domain::order::{
    CreatedOrder, DecrementStatus, Order, OrderLine, OrderLineInput, OrderStatus,
    PendingDecrement,
};
use pedidos_service::domain::ports::{DecrementOutbox, OrderRepository};
use pedidos_service::infrastructure::HttpInventoryClient;
use pedidos_service::OrderService;

// ── In-memory store ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub decrement: PendingDecrement,
    pub status: DecrementStatus,
    pub last_error: Option<String>,
    pub claimed_until: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct StoreState {
    orders: Vec<Order>,
    outbox: Vec<OutboxEntry>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn line_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .map(|o| o.lines.len())
            .sum()
    }

    pub fn outbox(&self) -> Vec<OutboxEntry> {
        self.state.lock().unwrap().outbox.clone()
    }

    /// Pretend the rows were written a while ago.
    pub fn age_outbox(&self, by: chrono::Duration) {
        for entry in self.state.lock().unwrap().outbox.iter_mut() {
            entry.claimed_until = entry.claimed_until.map(|until| until - by);
        }
    }
}

impl OrderRepository for InMemoryStore {
    fn create(
        &self,
        customer: &str,
        lines: &[OrderLineInput],
        claimed_until: DateTime<Utc>,
    ) -> Result<CreatedOrder, DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Persistence(
                "simulated database outage".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();
        let order_id = state.orders.len() as i32 + 1;
        state.orders.push(Order {
            id: order_id,
            customer: customer.to_string(),
            created_on: Utc::now().date_naive(),
            status: OrderStatus::Pending,
            lines: lines
                .iter()
                .map(|l| OrderLine {
                    product_id: l.product_id,
                    quantity: l.quantity,
                    unit_price: l.unit_price.clone(),
                })
                .collect(),
        });

        let mut decrements = Vec::new();
        for line in lines {
            let decrement = PendingDecrement {
                id: state.outbox.len() as i32 + 1,
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                attempts: 0,
            };
            state.outbox.push(OutboxEntry {
                decrement: decrement.clone(),
                status: DecrementStatus::Pending,
                last_error: None,
                claimed_until: Some(claimed_until),
            });
            decrements.push(decrement);
        }

        Ok(CreatedOrder {
            order_id,
            decrements,
        })
    }

    fn find_by_id(&self, id: i32) -> Result<Option<Order>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.state.lock().unwrap().orders.clone())
    }
}

impl DecrementOutbox for InMemoryStore {
    fn complete(&self, id: i32) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .outbox
            .iter_mut()
            .find(|e| e.decrement.id == id)
            .ok_or(DomainError::NotFound)?;
        entry.status = DecrementStatus::Completed;
        Ok(())
    }

    fn record_failure(
        &self,
        id: i32,
        error: &str,
        max_attempts: i32,
    ) -> Result<DecrementStatus, DomainError> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .outbox
            .iter_mut()
            .find(|e| e.decrement.id == id)
            .ok_or(DomainError::NotFound)?;
        entry.decrement.attempts += 1;
        entry.last_error = Some(error.to_string());
        entry.claimed_until = None;
        if entry.decrement.attempts >= max_attempts {
            entry.status = DecrementStatus::Failed;
        }
        Ok(entry.status)
    }

    fn due(
        &self,
        now: DateTime<Utc>,
        max_attempts: i32,
        limit: i64,
    ) -> Result<Vec<PendingDecrement>, DomainError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .outbox
            .iter()
            .filter(|e| e.status == DecrementStatus::Pending)
            .filter(|e| e.decrement.attempts < max_attempts)
            .filter(|e| e.claimed_until.map_or(true, |until| until < now))
            .take(limit as usize)
            .map(|e| e.decrement.clone())
            .collect())
    }
}

// ── Mock inventory service ────────────────────────────────────────────────────

#[derive(Default)]
struct MockState {
    stock: HashMap<i32, u32>,
    malformed: HashSet<i32>,
    rejecting: HashSet<i32>,
    mislabelled: HashSet<i32>,
    decrements: Vec<(i32, i32)>,
    flat: bool,
    delay: Option<Duration>,
}

type SharedMockState = Arc<Mutex<MockState>>;

#[derive(Deserialize)]
struct DecrementBody {
    cantidad: i32,
}

async fn get_product(state: web::Data<SharedMockState>, path: web::Path<i32>) -> HttpResponse {
    let id = path.into_inner();
    let (delay, response) = {
        let state = state.lock().unwrap();
        let response = if state.malformed.contains(&id) {
            HttpResponse::Ok().body("<html>inventory is down</html>")
        } else {
            match state.stock.get(&id) {
                None => HttpResponse::NotFound().json(json!({ "error": "Producto no encontrado" })),
                Some(stock) => {
                    let reported_id = if state.mislabelled.contains(&id) {
                        id + 1000
                    } else {
                        id
                    };
                    let product = json!({
                        "id": reported_id,
                        "nombre": format!("Producto {}", id),
                        "inventario": stock,
                        "precio": 10.0,
                    });
                    if state.flat {
                        HttpResponse::Ok().json(product)
                    } else {
                        HttpResponse::Ok().json(json!({ "producto": product }))
                    }
                }
            }
        };
        (state.delay, response)
    };

    if let Some(delay) = delay {
        actix_web::rt::time::sleep(delay).await;
    }
    response
}

async fn decrement(
    state: web::Data<SharedMockState>,
    path: web::Path<i32>,
    body: web::Json<DecrementBody>,
) -> HttpResponse {
    let id = path.into_inner();
    let mut state = state.lock().unwrap();
    state.decrements.push((id, body.cantidad));
    if state.rejecting.contains(&id) {
        return HttpResponse::InternalServerError().json(json!({ "error": "stock update failed" }));
    }
    let quantity = body.cantidad.max(0) as u32;
    if let Some(stock) = state.stock.get_mut(&id) {
        *stock = stock.saturating_sub(quantity);
    }
    HttpResponse::Ok().json(json!({ "message": "Inventario actualizado" }))
}

/// In-process inventory service listening on a random local port.
pub struct MockInventory {
    state: SharedMockState,
    pub base_url: String,
}

impl MockInventory {
    /// Must be called from within an actix runtime (`#[actix_web::test]`).
    pub fn start() -> Self {
        let state: SharedMockState = Arc::new(Mutex::new(MockState::default()));
        let data = web::Data::new(state.clone());

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind failed");
        let addr = listener.local_addr().expect("addr failed");

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/productos/{id}", web::get().to(get_product))
                .route(
                    "/productos/{id}/actualizar_inventario",
                    web::post().to(decrement),
                )
        })
        .workers(1)
        .listen(listener)
        .expect("listen failed")
        .run();
        actix_web::rt::spawn(server);

        Self {
            state,
            base_url: format!("http://{}", addr),
        }
    }

    pub fn with_stock(self, product_id: i32, stock: u32) -> Self {
        self.set_stock(product_id, stock);
        self
    }

    pub fn set_stock(&self, product_id: i32, stock: u32) {
        self.state.lock().unwrap().stock.insert(product_id, stock);
    }

    pub fn stock(&self, product_id: i32) -> Option<u32> {
        self.state.lock().unwrap().stock.get(&product_id).copied()
    }

    pub fn serve_malformed(&self, product_id: i32) {
        self.state.lock().unwrap().malformed.insert(product_id);
    }

    /// Answer reads for `product_id` with a different product's id.
    pub fn mislabel(&self, product_id: i32) {
        self.state.lock().unwrap().mislabelled.insert(product_id);
    }

    pub fn reject_decrements(&self, product_id: i32) {
        self.state.lock().unwrap().rejecting.insert(product_id);
    }

    pub fn accept_decrements(&self, product_id: i32) {
        self.state.lock().unwrap().rejecting.remove(&product_id);
    }

    pub fn use_flat_envelope(&self) {
        self.state.lock().unwrap().flat = true;
    }

    pub fn delay_reads(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    /// Every decrement request received, as `(product_id, cantidad)`.
    pub fn decrements(&self) -> Vec<(i32, i32)> {
        self.state.lock().unwrap().decrements.clone()
    }
}

/// Base URL where nothing is listening.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind failed");
    let addr = listener.local_addr().expect("addr failed");
    drop(listener);
    format!("http://{}", addr)
}

pub fn inventory_settings(base_url: &str, envelope: ProductEnvelope) -> InventorySettings {
    InventorySettings {
        base_url: base_url.to_string(),
        timeout_secs: 2,
        envelope,
        ..InventorySettings::default()
    }
}

pub fn inventory_client(base_url: &str) -> Arc<HttpInventoryClient> {
    Arc::new(
        HttpInventoryClient::new(&inventory_settings(base_url, ProductEnvelope::Nested))
            .expect("client"),
    )
}

pub fn order_service(store: &Arc<InMemoryStore>, inventory_url: &str) -> OrderService {
    OrderService::new(store.clone(), store.clone(), inventory_client(inventory_url))
}
