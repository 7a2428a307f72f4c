// ============================================================================
// SERVICE : AUTHENTIFICATION
// ============================================================================
//
// L'ancienne version branchait un plugin passport directement sur l'entité
// User. Ici la capacité est une interface dédiée (trait Authenticator) :
//   - validate_credential : email + mot de passe -> utilisateur ou None
//   - serialize_session   : utilisateur -> token de session (JWT)
//   - deserialize_session : token -> identité de session
// L'entité users reste un simple modèle de données.
//
// Le flot de reset password vit aussi ici :
//   1. issue_reset_token pose un UUID v4 + expiration (+1h) sur le user
//   2. find_user_by_valid_token ne matche que si le token existe ET n'est
//      pas expiré (comparé à maintenant, au moment de l'USAGE)
//   3. consume_reset_token change le hash et remet les deux champs à NULL
//      (usage unique : un token consommé ne matche plus jamais)
//
// ============================================================================

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::models::users;
use crate::utils::{jwt, password};

/// Capacité d'authentification pour un enregistrement de type User
#[async_trait]
pub trait Authenticator {
    async fn validate_credential(
        &self,
        db: &DatabaseConnection,
        email: &str,
        plain_password: &str,
    ) -> Result<Option<users::Model>, DbErr>;

    fn serialize_session(&self, user: &users::Model) -> Result<String, String>;

    fn deserialize_session(&self, token: &str) -> Result<AuthUser, String>;
}

/// Implémentation locale : mot de passe PBKDF2 + session JWT
pub struct LocalAuthenticator {
    jwt_secret: String,
}

impl LocalAuthenticator {
    pub fn new(jwt_secret: String) -> Self {
        LocalAuthenticator { jwt_secret }
    }
}

#[async_trait]
impl Authenticator for LocalAuthenticator {
    async fn validate_credential(
        &self,
        db: &DatabaseConnection,
        email: &str,
        plain_password: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?;

        let user = match user {
            Some(user) => user,
            None => return Ok(None),
        };

        match password::verify_password(plain_password, &user.password_hash) {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => Err(DbErr::Custom(format!("Password verification error: {}", e))),
        }
    }

    fn serialize_session(&self, user: &users::Model) -> Result<String, String> {
        jwt::generate_token(user.id, &user.email, &self.jwt_secret)
    }

    fn deserialize_session(&self, token: &str) -> Result<AuthUser, String> {
        let claims = jwt::verify_token(token, &self.jwt_secret)?;
        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

/// Un token de reset est valable ssi il a une expiration ET qu'elle est
/// strictement dans le futur au moment de l'usage
pub fn reset_token_is_valid(expires_at: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    matches!(expires_at, Some(exp) if exp > now)
}

/// Pose un token de reset UUID v4 (+1h) sur l'utilisateur
/// Retourne l'utilisateur mis à jour et le token en clair (pour l'email)
pub async fn issue_reset_token(
    db: &DatabaseConnection,
    user: users::Model,
) -> Result<(users::Model, String), DbErr> {
    let token = Uuid::new_v4().to_string();
    // Durée de vie : 1 heure
    let expires = Utc::now().naive_utc() + Duration::hours(1);

    let mut active: users::ActiveModel = user.into();
    active.reset_password_token = Set(Some(token.clone()));
    active.reset_password_expires = Set(Some(expires));

    let user = active.update(db).await?;
    Ok((user, token))
}

/// Cherche l'utilisateur porteur de ce token, en rejetant les expirés
pub async fn find_user_by_valid_token(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<users::Model>, DbErr> {
    let user = users::Entity::find()
        .filter(users::Column::ResetPasswordToken.eq(token))
        .one(db)
        .await?;

    Ok(user.filter(|u| reset_token_is_valid(u.reset_password_expires, Utc::now().naive_utc())))
}

/// Change le mot de passe et consomme le token (usage unique)
pub async fn consume_reset_token(
    db: &DatabaseConnection,
    user: users::Model,
    new_password_hash: String,
) -> Result<users::Model, DbErr> {
    let mut active: users::ActiveModel = user.into();
    active.password_hash = Set(new_password_hash);
    active.reset_password_token = Set(None);
    active.reset_password_expires = Set(None);

    active.update(db).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_valid_before_expiry() {
        let now = Utc::now().naive_utc();
        assert!(reset_token_is_valid(Some(now + Duration::minutes(30)), now));
    }

    #[test]
    fn test_token_invalid_after_expiry() {
        let now = Utc::now().naive_utc();
        assert!(!reset_token_is_valid(Some(now - Duration::seconds(1)), now));
        assert!(!reset_token_is_valid(Some(now), now));
    }

    #[test]
    fn test_consumed_token_has_no_expiry() {
        // après consommation les deux champs sont NULL -> plus jamais valide
        let now = Utc::now().naive_utc();
        assert!(!reset_token_is_valid(None, now));
    }
}
