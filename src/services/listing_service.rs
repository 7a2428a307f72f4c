use sea_orm::sea_query::{Expr, Func};
use sea_orm::*;

use crate::models::{listing, listing_image, review, users};

pub struct ListingService;

/// Champs d'une nouvelle annonce, coordonnées déjà géocodées
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub country: String,
    pub longitude: f64,
    pub latitude: f64,
}

/// Champs modifiables d'une annonce (owner_id est immuable, jamais ici)
#[derive(Default)]
pub struct ListingChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub location: Option<String>,
    pub country: Option<String>,
}

impl ListingService {
    /// Crée l'annonce avec l'owner posé depuis l'utilisateur connecté
    pub async fn create(
        db: &DatabaseConnection,
        owner_id: i32,
        new: NewListing,
    ) -> Result<listing::Model, DbErr> {
        let model = listing::ActiveModel {
            title: Set(new.title),
            description: Set(new.description),
            price: Set(new.price),
            location: Set(new.location),
            country: Set(new.country),
            longitude: Set(new.longitude),
            latitude: Set(new.latitude),
            owner_id: Set(owner_id),
            ..Default::default()
        };

        model.insert(db).await
    }

    pub async fn find(
        db: &DatabaseConnection,
        listing_id: i32,
    ) -> Result<Option<listing::Model>, DbErr> {
        listing::Entity::find_by_id(listing_id).one(db).await
    }

    pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<listing::Model>, DbErr> {
        listing::Entity::find()
            .order_by_desc(listing::Column::Id)
            .all(db)
            .await
    }

    /// Merge les champs soumis (seuls les champs présents changent)
    pub async fn update(
        db: &DatabaseConnection,
        existing: listing::Model,
        changes: ListingChanges,
    ) -> Result<listing::Model, DbErr> {
        let mut active: listing::ActiveModel = existing.into();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        if let Some(country) = changes.country {
            active.country = Set(country);
        }

        active.update(db).await
    }

    /// Supprime l'annonce ET ses dépendances (reviews, images) dans UNE
    /// transaction - pas d'orphelins possibles en cas de crash au milieu
    pub async fn delete(db: &DatabaseConnection, listing_id: i32) -> Result<(), DbErr> {
        let txn = db.begin().await?;

        review::Entity::delete_many()
            .filter(review::Column::ListingId.eq(listing_id))
            .exec(&txn)
            .await?;

        listing_image::Entity::delete_many()
            .filter(listing_image::Column::ListingId.eq(listing_id))
            .exec(&txn)
            .await?;

        listing::Entity::delete_by_id(listing_id).exec(&txn).await?;

        txn.commit().await
    }

    /// Recherche sur la localisation, insensible à la casse
    /// `exact = false` (défaut) : sous-chaîne ; `exact = true` : égalité
    /// (les deux sémantiques de l'ancienne version, exposées explicitement)
    pub async fn search(
        db: &DatabaseConnection,
        location: &str,
        exact: bool,
    ) -> Result<Vec<listing::Model>, DbErr> {
        let needle = location.trim().to_lowercase();
        if needle.is_empty() {
            return Self::find_all(db).await;
        }

        let lowered = Expr::expr(Func::lower(Expr::col(listing::Column::Location)));

        // exact = égalité stricte (pas un pattern LIKE : un % ou _ saisi par
        // l'utilisateur reste littéral) ; partiel = sous-chaîne, avec les
        // métacaractères LIKE échappés pour la même raison
        let condition = if exact {
            lowered.eq(needle)
        } else {
            lowered.like(format!("%{}%", escape_like(&needle)))
        };

        listing::Entity::find()
            .filter(condition)
            .order_by_desc(listing::Column::Id)
            .all(db)
            .await
    }

    pub async fn images(
        db: &DatabaseConnection,
        listing_id: i32,
    ) -> Result<Vec<listing_image::Model>, DbErr> {
        listing_image::Entity::find()
            .filter(listing_image::Column::ListingId.eq(listing_id))
            .all(db)
            .await
    }

    /// Attache une image stockée chez le media host (url + filename)
    pub async fn attach_image(
        db: &DatabaseConnection,
        listing_id: i32,
        url: String,
        filename: String,
    ) -> Result<listing_image::Model, DbErr> {
        let model = listing_image::ActiveModel {
            listing_id: Set(listing_id),
            url: Set(url),
            filename: Set(filename),
            ..Default::default()
        };

        model.insert(db).await
    }

    /// Retire des images par filename (sémantique deleteImages de l'update)
    pub async fn remove_images_by_filename(
        db: &DatabaseConnection,
        listing_id: i32,
        filenames: &[String],
    ) -> Result<u64, DbErr> {
        if filenames.is_empty() {
            return Ok(0);
        }

        let result = listing_image::Entity::delete_many()
            .filter(listing_image::Column::ListingId.eq(listing_id))
            .filter(listing_image::Column::Filename.is_in(filenames.iter().cloned()))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Reviews d'une annonce avec leur auteur (pour la page show)
    pub async fn reviews_with_authors(
        db: &DatabaseConnection,
        listing_id: i32,
    ) -> Result<Vec<(review::Model, Option<users::Model>)>, DbErr> {
        review::Entity::find()
            .filter(review::Column::ListingId.eq(listing_id))
            .find_also_related(users::Entity)
            .order_by_desc(review::Column::Id)
            .all(db)
            .await
    }
}

/// Échappe les métacaractères LIKE (%, _, \) pour qu'une recherche partielle
/// reste une recherche de sous-chaîne littérale
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn test_escape_like_keeps_metacharacters_literal() {
        assert_eq!(escape_like("100% delhi"), "100\\% delhi");
        assert_eq!(escape_like("new_delhi"), "new\\_delhi");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("goa"), "goa");
    }

    #[tokio::test]
    async fn test_delete_cascades_dependents_in_one_transaction() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                // deletes : reviews, images, puis l'annonce elle-même
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        ListingService::delete(&db, 7).await.unwrap();

        // Un SEUL bloc transactionnel : pas d'orphelins possibles si un
        // crash survient entre les deletes
        let log = db.into_transaction_log();
        assert_eq!(log.len(), 1);

        // "listings" n'apparaît ni dans "listing_images" ni dans
        // "listing_id" : les trois recherches sont sans ambiguïté
        let sql = format!("{:?}", log[0]);
        let reviews_pos = sql.find("reviews").expect("reviews delete missing");
        let images_pos = sql.find("listing_images").expect("images delete missing");
        let listing_pos = sql.find("listings").expect("listing delete missing");

        // Les dépendants partent avant l'annonce
        assert!(reviews_pos < listing_pos);
        assert!(images_pos < listing_pos);
    }
}
