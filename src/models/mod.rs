// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - users : Utilisateurs (email unique + hash du mot de passe + token reset)
//   - listing : Annonces (titre, prix, localisation géocodée, owner)
//   - listing_image : Images Cloudinary attachées à une annonce (url + filename)
//   - review : Avis (note + commentaire) rattachés à une annonce
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les relations entre tables sont définies dans chaque modèle
//   - owner_id / author_id sont posés à la création et jamais modifiés ensuite
//
// ============================================================================

pub mod health;
pub mod listing;
pub mod listing_image;
pub mod review;
pub mod users;
