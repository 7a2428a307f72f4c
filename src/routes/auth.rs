use actix_web::{HttpResponse, get, post, web};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::Config;
use crate::middleware::AuthUser;
use crate::models::users::{ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users};
use crate::services::auth_service::{self, Authenticator, LocalAuthenticator};
use crate::services::email_service::EmailService;
use crate::utils::password;

// DTO pour l'inscription
#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

// DTO pour la connexion
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// DTO pour forgot-password
#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

// DTO pour reset-password
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm: String,
}

// Réponse après login/signup
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
    pub email: String,
}

/// POST /auth/signup - Créer un compte (PUBLIC)
#[post("/signup")]
pub async fn signup(
    body: web::Json<SignupRequest>,
    db: web::Data<DatabaseConnection>,
    authenticator: web::Data<LocalAuthenticator>,
) -> HttpResponse {
    // 1. Valider le DTO
    if let Err(errors) = body.validate() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": errors.to_string()
        }));
    }

    // 2. Vérifier si l'email est déjà pris
    let existing_user = Users::find()
        .filter(UserColumn::Email.eq(&body.email))
        .one(db.get_ref())
        .await;

    match existing_user {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(serde_json::json!({
                "error": "An account with that email already exists"
            }));
        }
        Err(e) => {
            log::error!("Database error during signup: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
        _ => {}
    }

    // 3. Hash le mot de passe
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    // 4. Créer l'utilisateur
    let new_user = UserActiveModel {
        email: Set(body.email.clone()),
        password_hash: Set(password_hash),
        reset_password_token: Set(None),
        reset_password_expires: Set(None),
        ..Default::default()
    };

    let user = match new_user.insert(db.get_ref()).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("Failed to create user: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    // 5. Ouvrir la session
    let token = match authenticator.serialize_session(&user) {
        Ok(token) => token,
        Err(e) => {
            log::error!("Failed to generate token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    HttpResponse::Created().json(AuthResponse {
        token,
        user_id: user.id,
        email: user.email,
    })
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    authenticator: web::Data<LocalAuthenticator>,
) -> HttpResponse {
    // 1. Valider le credential (email + mot de passe)
    let user = match authenticator
        .validate_credential(db.get_ref(), &body.email, &body.password)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Invalid email or password"
            }));
        }
        Err(e) => {
            log::error!("Database error during login: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    // 2. Ouvrir la session
    let token = match authenticator.serialize_session(&user) {
        Ok(token) => token,
        Err(e) => {
            log::error!("Failed to generate token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: user.id,
        email: user.email,
    })
}

/// GET /auth/logout - Se déconnecter (PROTÉGÉE)
/// La session est un JWT côté client : le serveur acquitte, le client jette
/// son token
#[get("/logout")]
pub async fn logout(_auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "You are logged out",
        "redirect": "/listings"
    }))
}

/// GET /auth/me - Vérifier le token (PROTÉGÉE)
#[get("/me")]
pub async fn me(auth_user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(auth_user)
}

/// POST /auth/forgot-password - Demander un lien de reset (PUBLIC)
#[post("/forgot-password")]
pub async fn forgot_password(
    body: web::Json<ForgotPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    email_service: web::Data<EmailService>,
    config: web::Data<Config>,
) -> HttpResponse {
    // 1. Chercher le compte
    let user = match Users::find()
        .filter(UserColumn::Email.eq(&body.email))
        .one(db.get_ref())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "No account with that email found.",
                "redirect": "/forgot-password"
            }));
        }
        Err(e) => {
            log::error!("Database error during forgot-password: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    // 2. Poser le token (UUID v4, expire dans 1h)
    let (user, token) = match auth_service::issue_reset_token(db.get_ref(), user).await {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("Failed to issue reset token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    // 3. Envoyer le lien par email
    let reset_url = format!("{}/reset-password/{}", config.host_url, token);
    if let Err(e) = email_service.send_reset_email(&user.email, &reset_url).await {
        log::error!("Failed to send reset email: {}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Failed to send the reset email. Please try again."
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Check your email for the reset link.",
        "redirect": "/login"
    }))
}

/// GET /auth/reset-password/{token} - Vérifier un token de reset (PUBLIC)
#[get("/reset-password/{token}")]
pub async fn check_reset_token(
    path: web::Path<String>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let token = path.into_inner();

    match auth_service::find_user_by_valid_token(db.get_ref(), &token).await {
        Ok(Some(_)) => HttpResponse::Ok().json(serde_json::json!({
            "valid": true,
            "token": token
        })),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Password reset token is invalid or expired.",
            "redirect": "/forgot-password"
        })),
        Err(e) => {
            log::error!("Database error during token check: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }))
        }
    }
}

/// POST /auth/reset-password/{token} - Changer le mot de passe (PUBLIC)
#[post("/reset-password/{token}")]
pub async fn reset_password(
    path: web::Path<String>,
    body: web::Json<ResetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    authenticator: web::Data<LocalAuthenticator>,
) -> HttpResponse {
    let token = path.into_inner();

    // 1. Les deux saisies doivent correspondre
    if body.password != body.confirm {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Passwords do not match."
        }));
    }

    // 2. Retrouver l'utilisateur par token valide (existe ET non expiré)
    let user = match auth_service::find_user_by_valid_token(db.get_ref(), &token).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::NotFound().json(serde_json::json!({
                "error": "Password reset token is invalid or expired.",
                "redirect": "/forgot-password"
            }));
        }
        Err(e) => {
            log::error!("Database error during reset-password: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    // 3. Hasher le nouveau mot de passe
    let new_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    // 4. Consommer le token (usage unique) et changer le hash
    let user = match auth_service::consume_reset_token(db.get_ref(), user, new_hash).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("Failed to consume reset token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    // 5. Re-logger l'utilisateur directement (comme l'ancien req.login)
    let session = match authenticator.serialize_session(&user) {
        Ok(token) => token,
        Err(e) => {
            log::error!("Failed to generate token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Something went wrong"
            }));
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Your password has been changed.",
        "token": session,
        "redirect": "/listings"
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(login)
            .service(logout)
            .service(me)
            .service(forgot_password)
            .service(check_reset_token)
            .service(reset_password),
    );
}
