use actix_web::{HttpResponse, post, web};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::middleware::AuthUser;
use crate::services::listing_service::ListingService;
use crate::services::payment_service::{PaymentError, PaymentService};

// DTO pour la création d'un ordre de paiement
#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub listing_id: i32,
    /// Montant en unités majeures (roupies)
    pub amount: f64,
}

// DTO du callback de paiement (noms de champs imposés par Razorpay)
#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// POST /payment/create-order - Créer un ordre Razorpay (PROTÉGÉE)
#[post("/create-order")]
pub async fn create_order(
    _auth_user: AuthUser,
    body: web::Json<CreateOrderRequest>,
    db: web::Data<DatabaseConnection>,
    payment: web::Data<PaymentService>,
) -> HttpResponse {
    // 1. L'annonce référencée doit exister
    match ListingService::find(db.get_ref(), body.listing_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": "The listing you requested does not exist",
                "redirect": "/listings"
            }));
        }
        Err(e) => {
            log::error!("Failed to fetch listing {}: {}", body.listing_id, e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Something went wrong"
            }));
        }
    }

    // 2. Créer l'ordre (le montant est validé par le service AVANT l'appel
    //    provider ; l'erreur provider brute ne sort jamais d'ici)
    match payment.create_order(body.listing_id, body.amount).await {
        Ok(order) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "order": order,
        })),
        Err(PaymentError::InvalidAmount) => {
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": "Invalid amount"
            }))
        }
        Err(PaymentError::Provider) => {
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": "Failed to create order"
            }))
        }
    }
}

/// POST /payment/verify - Vérifier la signature du callback (PUBLIC)
/// Un mismatch est un rejet 400 loggé, jamais un succès silencieux ni un 500
#[post("/verify")]
pub async fn verify_payment(
    body: web::Json<VerifyPaymentRequest>,
    payment: web::Data<PaymentService>,
) -> HttpResponse {
    let verified = payment.verify_signature(
        &body.razorpay_order_id,
        &body.razorpay_payment_id,
        &body.razorpay_signature,
    );

    if verified {
        HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Payment verified successfully"
        }))
    } else {
        log::warn!(
            "Payment signature mismatch for order {} / payment {}",
            body.razorpay_order_id,
            body.razorpay_payment_id
        );
        HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": "Payment verification failed"
        }))
    }
}

pub fn payment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/payment")
            .service(create_order)
            .service(verify_payment),
    );
}
