pub mod health;
pub mod orders;

use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::errors::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::echo,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
    ),
    components(schemas(
        health::EchoResponse,
        orders::CreateOrderRequest,
        orders::CreateOrderLineRequest,
        orders::OrderResponse,
        orders::OrderLineResponse,
    )),
    tags(
        (name = "pedidos", description = "Order placement and lookup"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Register routes and extractor error handlers.
///
/// Malformed JSON bodies and non-numeric order ids are reported as `400`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid order id: {}", err)).into()
    }))
    .route("/", web::get().to(health::echo))
    .service(
        web::scope("/pedidos")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/{id}", web::get().to(orders::get_order)),
    )
    .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));
}
