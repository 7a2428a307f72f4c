mod config;
mod db;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;

use actix_web::{App, HttpServer, web};

use crate::config::Config;
use crate::services::auth_service::LocalAuthenticator;
use crate::services::email_service::EmailService;
use crate::services::geocoding_service::GeocodingService;
use crate::services::media_service::CloudinaryStore;
use crate::services::payment_service::PaymentService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    // Configuration chargée une fois, passée explicitement partout
    let config = Config::from_env();

    println!("🔌 Connecting to database...");
    let db = web::Data::new(
        db::establish_connection(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );
    println!("✅ Database connected!");

    // Services construits depuis la config (pas de env::var ad hoc)
    let authenticator = web::Data::new(LocalAuthenticator::new(config.jwt_secret.clone()));
    let payment = web::Data::new(PaymentService::new(
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    ));
    let geocoder = web::Data::new(GeocodingService::new());
    let media_store = web::Data::new(CloudinaryStore::new(
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_upload_preset.clone(),
    ));
    let email_service = web::Data::new(
        EmailService::new(
            &config.smtp_host,
            config.smtp_username.clone(),
            config.smtp_password.clone(),
            config.mail_from.clone(),
        )
        .expect("Failed to build SMTP transport"),
    );

    let port = config.port;
    let config = web::Data::new(config);

    println!("🚀 Starting server on http://127.0.0.1:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(authenticator.clone())
            .app_data(payment.clone())
            .app_data(geocoder.clone())
            .app_data(media_store.clone())
            .app_data(email_service.clone())
            .configure(routes::configure_routes)
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}
