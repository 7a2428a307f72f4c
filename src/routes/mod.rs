pub mod auth;
pub mod health;
pub mod listings;
pub mod payment;
pub mod reviews;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(listings::listing_routes)
            .configure(payment::payment_routes),
    );
}
