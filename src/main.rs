use std::io;
use std::sync::Arc;

use actix_web::web;
use dotenvy::dotenv;
use pedidos_service::config::Settings;
use pedidos_service::infrastructure::{DieselOrderRepository, HttpInventoryClient};
use pedidos_service::{build_server, create_pool, run_migrations, DecrementRelay, OrderService};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let settings = Settings::load().map_err(io::Error::other)?;

    let pool = create_pool(&settings.db).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let repo = Arc::new(DieselOrderRepository::new(pool));
    let inventory = Arc::new(HttpInventoryClient::new(&settings.inventory).map_err(io::Error::other)?);

    let service = OrderService::new(repo.clone(), repo.clone(), inventory.clone())
        .allow_empty_orders(settings.orders.allow_empty)
        .max_decrement_attempts(settings.inventory.retry.max_attempts)
        .decrement_claim(settings.decrement_claim());

    let relay = if settings.inventory.retry.enabled {
        let relay = DecrementRelay::new(repo, inventory, settings.inventory.retry.clone());
        Some(actix_web::rt::spawn(relay.run()))
    } else {
        None
    };

    log::info!(
        "Starting server at http://{}:{} (inventory service at {})",
        settings.server.host,
        settings.server.port,
        settings.inventory.base_url
    );

    let result = build_server(
        web::Data::new(service),
        &settings.server.host,
        settings.server.port,
    )?
    .await;

    if let Some(relay) = relay {
        relay.abort();
    }
    result
}
