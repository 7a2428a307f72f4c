// Garde d'autorisation : décide si l'utilisateur courant peut modifier une
// annonce ou un avis. La garde SIGNALE seulement (Allow / erreur typée),
// c'est la route qui construit la réponse HTTP.

use actix_web::HttpResponse;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::models::{listing, review};

/// Décision pure d'accès, indépendante de la BD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Pas de session - le client doit se logger puis revenir
    MissingLogin,
    /// Loggé mais pas propriétaire/auteur de la ressource
    Forbidden,
}

#[derive(Debug, PartialEq, Eq)]
pub enum GuardError {
    /// Ressource absente - cas distinct du refus, évalué AVANT l'ownership
    NotFound(&'static str),
    MissingLogin,
    Forbidden(&'static str),
    Db(String),
}

/// Règle d'accès : DENY si anonyme, DENY si l'id courant diffère du
/// propriétaire, ALLOW sinon
pub fn evaluate(current_user: Option<i32>, owner_id: i32) -> Access {
    match current_user {
        None => Access::MissingLogin,
        Some(id) if id == owner_id => Access::Allow,
        Some(_) => Access::Forbidden,
    }
}

impl GuardError {
    /// Traduction en réponse HTTP flash-style ("error" + "redirect"),
    /// `path` est le chemin de la requête d'origine (pour revenir après login)
    pub fn to_response(&self, path: &str) -> HttpResponse {
        match self {
            GuardError::NotFound(what) => HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("The {} you requested does not exist", what),
                "redirect": "/listings",
            })),
            GuardError::MissingLogin => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "You must be logged in",
                "redirect": path,
            })),
            GuardError::Forbidden(what) => HttpResponse::Forbidden().json(serde_json::json!({
                "error": format!("You are not the {} of this resource", what),
                "redirect": "/listings",
            })),
            GuardError::Db(e) => {
                log::error!("Guard database error: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Something went wrong"
                }))
            }
        }
    }
}

/// Charge l'annonce puis vérifie l'ownership
/// L'absence de l'annonce court-circuite avant toute évaluation d'accès
pub async fn require_listing_owner(
    db: &DatabaseConnection,
    current_user: Option<i32>,
    listing_id: i32,
) -> Result<listing::Model, GuardError> {
    let listing = listing::Entity::find_by_id(listing_id)
        .one(db)
        .await
        .map_err(|e| GuardError::Db(e.to_string()))?
        .ok_or(GuardError::NotFound("listing"))?;

    match evaluate(current_user, listing.owner_id) {
        Access::Allow => Ok(listing),
        Access::MissingLogin => Err(GuardError::MissingLogin),
        Access::Forbidden => Err(GuardError::Forbidden("owner")),
    }
}

/// Charge l'avis (rattaché à la bonne annonce) puis vérifie l'auteur
pub async fn require_review_author(
    db: &DatabaseConnection,
    current_user: Option<i32>,
    listing_id: i32,
    review_id: i32,
) -> Result<review::Model, GuardError> {
    let review = review::Entity::find_by_id(review_id)
        .filter(review::Column::ListingId.eq(listing_id))
        .one(db)
        .await
        .map_err(|e| GuardError::Db(e.to_string()))?
        .ok_or(GuardError::NotFound("review"))?;

    match evaluate(current_user, review.author_id) {
        Access::Allow => Ok(review),
        Access::MissingLogin => Err(GuardError::MissingLogin),
        Access::Forbidden => Err(GuardError::Forbidden("author")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_is_denied() {
        assert_eq!(evaluate(None, 42), Access::MissingLogin);
    }

    #[test]
    fn test_owner_is_allowed() {
        assert_eq!(evaluate(Some(42), 42), Access::Allow);
    }

    #[test]
    fn test_other_user_is_forbidden() {
        assert_eq!(evaluate(Some(7), 42), Access::Forbidden);
    }
}
