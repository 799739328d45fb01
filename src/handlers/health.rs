use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct EchoResponse {
    pub message: String,
}

/// GET /
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = EchoResponse),
    ),
    tag = "health"
)]
pub async fn echo() -> HttpResponse {
    HttpResponse::Ok().json(EchoResponse {
        message: "Echo Test OK".to_string(),
    })
}
