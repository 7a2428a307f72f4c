// ============================================================================
// MODÈLE : LISTINGS
// ============================================================================
//
// Description:
//   Une annonce (lieu à louer) publiée par un utilisateur.
//
// Colonnes de la table listings:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - title, description (VARCHAR/TEXT, NOT NULL)
//   - price (BIGINT, NOT NULL) - unités majeures ; Razorpay reçoit price * 100
//   - location (VARCHAR) - texte libre, géocodé à la création
//   - country (VARCHAR)
//   - longitude / latitude (DOUBLE PRECISION) - point de repli Delhi
//     (77.209, 28.6139) si le geocoder ne renvoie aucun candidat
//   - owner_id (INTEGER, NOT NULL, FK vers users) - posé à la création,
//     jamais modifié par un update
//
// Points d'attention:
//   - Supprimer une annonce supprime aussi ses reviews et ses images
//     (cascade faite dans une transaction par ListingService::delete)
//   - Les images vivent dans la table listing_image (une annonce peut en
//     avoir plusieurs)
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,

    pub description: String,

    pub price: i64,

    pub location: String,

    pub country: String,

    pub longitude: f64,

    pub latitude: f64,

    pub owner_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id"
    )]
    Owner,

    #[sea_orm(has_many = "super::review::Entity")]
    Review,

    #[sea_orm(has_many = "super::listing_image::Entity")]
    ListingImage,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::listing_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListingImage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
