use actix_web::{HttpRequest, HttpResponse, delete, post, web};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use validator::Validate;

use crate::middleware::AuthUser;
use crate::middleware::ownership;
use crate::services::listing_service::ListingService;
use crate::services::review_service::ReviewService;

// DTO pour la création d'un avis
#[derive(Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(length(min = 1, message = "Review body is required"))]
    pub body: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
}

/// POST /listings/{id}/reviews - Créer un avis (PROTÉGÉE)
#[post("/{id}/reviews")]
pub async fn create(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<CreateReviewRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let listing_id = path.into_inner();

    // 1. Valider le DTO
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": errors.to_string()
        }));
    }

    // 2. L'annonce doit exister (cas distinct du refus d'accès)
    match ListingService::find(db.get_ref(), listing_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "The listing you requested does not exist",
                "redirect": "/listings"
            }));
        }
        Err(e) => {
            log::error!("Failed to fetch listing {}: {}", listing_id, e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    }

    // 3. Créer l'avis, auteur = utilisateur connecté
    let body = body.into_inner();
    match ReviewService::create(
        db.get_ref(),
        listing_id,
        auth_user.user_id,
        body.body,
        body.rating,
    )
    .await
    {
        Ok(review) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "message": "New review created",
            "review": review,
            "redirect": format!("/listings/{}", listing_id),
        })),
        Err(e) => {
            log::error!("Failed to create review: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }))
        }
    }
}

/// DELETE /listings/{id}/reviews/{review_id} - Supprimer un avis
/// (PROTÉGÉE, auteur uniquement)
#[delete("/{id}/reviews/{review_id}")]
pub async fn destroy(
    req: HttpRequest,
    auth_user: AuthUser,
    path: web::Path<(i32, i32)>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let (listing_id, review_id) = path.into_inner();

    // Garde : l'avis existe, est rattaché à cette annonce, et l'utilisateur
    // en est l'auteur
    if let Err(guard_error) = ownership::require_review_author(
        db.get_ref(),
        Some(auth_user.user_id),
        listing_id,
        review_id,
    )
    .await
    {
        return guard_error.to_response(req.path());
    }

    match ReviewService::delete(db.get_ref(), review_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Review deleted",
            "redirect": format!("/listings/{}", listing_id),
        })),
        Err(e) => {
            log::error!("Failed to delete review {}: {}", review_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }))
        }
    }
}

pub fn review_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create).service(destroy);
}
