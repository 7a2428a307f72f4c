use actix_web::{Error, FromRequest, HttpRequest, HttpResponse, dev::Payload, web};
use futures::future::{Ready, ready};
use serde::{Deserialize, Serialize};

use crate::services::auth_service::{Authenticator, LocalAuthenticator};

/// Structure qui contient les infos de l'utilisateur authentifié
/// Utilisée comme extracteur dans les routes protégées
///
/// Les réponses 401 embarquent le chemin demandé dans "redirect" pour que
/// le client puisse revenir sur la page d'origine après le login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

fn unauthorized(req: &HttpRequest, message: &str) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "error": message,
        "redirect": req.path(),
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

/// Implémentation de FromRequest pour AuthUser
/// Cela permet à Actix-Web d'extraire automatiquement AuthUser des requêtes
impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // 1. Récupérer l'authenticator applicatif
        let authenticator = match req.app_data::<web::Data<LocalAuthenticator>>() {
            Some(authenticator) => authenticator,
            None => {
                let response = HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Server configuration missing"
                }));
                return ready(Err(actix_web::error::InternalError::from_response(
                    "", response,
                )
                .into()));
            }
        };

        // 2. Extraire le header Authorization
        let auth_header = match req.headers().get("Authorization") {
            Some(header) => header,
            None => {
                return ready(Err(unauthorized(req, "You must be logged in")));
            }
        };

        let auth_str = match auth_header.to_str() {
            Ok(s) => s,
            Err(_) => {
                return ready(Err(unauthorized(req, "Invalid Authorization header")));
            }
        };

        // 3. Extraire le token (format: "Bearer <token>")
        let token = if auth_str.starts_with("Bearer ") {
            &auth_str[7..]
        } else {
            return ready(Err(unauthorized(
                req,
                "Invalid Authorization format (expected: Bearer <token>)",
            )));
        };

        // 4. Désérialiser la session via la capacité d'authentification
        match authenticator.deserialize_session(token) {
            Ok(auth_user) => ready(Ok(auth_user)),
            Err(_) => ready(Err(unauthorized(req, "You must be logged in"))),
        }
    }
}
