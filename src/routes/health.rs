use crate::models::health::HealthResponse;
use actix_web::{HttpResponse, get};
use chrono::Utc;

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        time: Utc::now(),
    };

    HttpResponse::Ok().json(response)
}
