// Configuration chargée UNE SEULE FOIS au démarrage (pas de env::var ad hoc
// dans les services) puis passée explicitement aux constructeurs.

use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub mail_from: String,
    pub host_url: String,
    pub port: u16,
}

impl Config {
    /// Charge la configuration depuis les variables d'environnement (.env)
    /// Les secrets obligatoires font échouer le démarrage s'ils manquent
    pub fn from_env() -> Self {
        Config {
            database_url: require("DATABASE_URL"),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                eprintln!("⚠️  WARNING: JWT_SECRET not found in .env, using default (INSECURE)");
                "default-insecure-key-change-this".to_string()
            }),
            razorpay_key_id: require("RAZORPAY_KEY_ID"),
            razorpay_key_secret: require("RAZORPAY_KEY_SECRET"),
            cloudinary_cloud_name: require("CLOUDINARY_CLOUD_NAME"),
            cloudinary_upload_preset: require("CLOUDINARY_UPLOAD_PRESET"),
            smtp_host: or_default("SMTP_HOST", "smtp.gmail.com"),
            smtp_username: require("GMAIL_EMAIL"),
            smtp_password: require("GMAIL_APP_PASSWORD"),
            mail_from: or_default("MAIL_FROM", "no-reply@wanderlust.com"),
            host_url: or_default("HOST_URL", "http://localhost:8080"),
            port: or_default("PORT", "8080")
                .parse()
                .expect("PORT must be a number"),
        }
    }
}

fn require(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{} must be set in .env file", key))
}

fn or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
