use sea_orm::*;

use crate::models::review;

pub struct ReviewService;

impl ReviewService {
    /// Crée un avis rattaché à l'annonce, auteur = utilisateur connecté
    pub async fn create(
        db: &DatabaseConnection,
        listing_id: i32,
        author_id: i32,
        body: String,
        rating: i32,
    ) -> Result<review::Model, DbErr> {
        let model = review::ActiveModel {
            listing_id: Set(listing_id),
            author_id: Set(author_id),
            body: Set(body),
            rating: Set(rating),
            created_at: Set(Some(chrono::Utc::now().naive_utc())),
            ..Default::default()
        };

        model.insert(db).await
    }

    /// Supprime l'avis ; le lien annonce<->avis est la colonne listing_id,
    /// un seul delete couvre donc les deux côtés
    pub async fn delete(db: &DatabaseConnection, review_id: i32) -> Result<(), DbErr> {
        review::Entity::delete_by_id(review_id).exec(db).await?;
        Ok(())
    }
}
