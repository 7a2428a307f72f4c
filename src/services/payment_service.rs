// ============================================================================
// SERVICE : PAIEMENT (Razorpay)
// ============================================================================
//
// Deux responsabilités :
//   1. Créer un ordre de paiement chez le provider (POST /v1/orders avec
//      basic auth key_id/key_secret) - montant en unités MINEURES (paise)
//   2. Vérifier la signature HMAC-SHA256 du callback de paiement :
//      expected = hex(HMAC-SHA256(key_secret, "order_id|payment_id"))
//      C'est LA frontière de confiance : le secret ne quitte jamais le
//      serveur, un client ne peut pas prétendre avoir payé sans lui.
//
// Points d'attention:
//   - Le montant est validé AVANT tout appel provider (jamais de défaut à 0)
//   - Le receipt fait au plus 40 caractères (contrainte Razorpay)
//   - L'erreur brute du provider part dans les logs, jamais vers le client
//   - Pas de retry : l'idempotence est gérée côté provider via le receipt
//   - La comparaison de signature passe par Mac::verify_slice (temps
//     constant), pas par une égalité de strings
//
// ============================================================================

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";
const CURRENCY: &str = "INR";
const RECEIPT_MAX_LEN: usize = 40;

#[derive(Debug, Error, PartialEq)]
pub enum PaymentError {
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Failed to create order")]
    Provider,
}

/// Ordre tel que renvoyé par le provider, repassé tel quel au client
/// (le client en a besoin pour ouvrir le checkout)
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: Option<String>,
    pub status: Option<String>,
}

pub struct PaymentService {
    key_id: String,
    key_secret: String,
    client: reqwest::Client,
}

impl PaymentService {
    pub fn new(key_id: String, key_secret: String) -> Self {
        PaymentService {
            key_id,
            key_secret,
            client: reqwest::Client::new(),
        }
    }

    /// Crée un ordre de paiement pour une annonce
    /// `amount_major` est en roupies ; Razorpay reçoit des paise (x100)
    pub async fn create_order(
        &self,
        listing_id: i32,
        amount_major: f64,
    ) -> Result<ProviderOrder, PaymentError> {
        // 1. Valider le montant avant tout appel provider
        let amount_minor = to_minor_units(amount_major)?;

        // 2. Construire le receipt (<= 40 chars, contrainte provider)
        let receipt = build_receipt(listing_id, chrono::Utc::now().timestamp_millis());

        // 3. Appeler le provider
        let response = self
            .client
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&serde_json::json!({
                "amount": amount_minor,
                "currency": CURRENCY,
                "receipt": receipt,
            }))
            .send()
            .await
            .map_err(|e| {
                log::error!("Razorpay order request failed: {}", e);
                PaymentError::Provider
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Razorpay order rejected ({}): {}", status, body);
            return Err(PaymentError::Provider);
        }

        response.json::<ProviderOrder>().await.map_err(|e| {
            log::error!("Razorpay order response unreadable: {}", e);
            PaymentError::Provider
        })
    }

    /// Vérifie qu'un callback de paiement vient bien du provider
    /// Retourne false (jamais de panique) pour toute signature invalide
    pub fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        client_signature: &str,
    ) -> bool {
        let mut mac = match HmacSha256::new_from_slice(self.key_secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());

        // La signature client est l'encodage hex du HMAC attendu
        let provided = match hex::decode(client_signature) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        mac.verify_slice(&provided).is_ok()
    }
}

/// Convertit un montant en unités majeures vers les unités mineures du
/// provider ; rejette NaN/inf/négatif/zéro plutôt que de défaulter à 0
pub fn to_minor_units(amount_major: f64) -> Result<i64, PaymentError> {
    if !amount_major.is_finite() || amount_major <= 0.0 {
        return Err(PaymentError::InvalidAmount);
    }
    Ok((amount_major * 100.0).round() as i64)
}

/// Receipt déterministe et borné : rcpt_<6 derniers chars de l'id>_<6
/// derniers chars du timestamp ms>
fn build_receipt(listing_id: i32, now_millis: i64) -> String {
    let id = listing_id.to_string();
    let id_frag = &id[id.len().saturating_sub(6)..];
    let ts = now_millis.to_string();
    let ts_frag = &ts[ts.len().saturating_sub(6)..];

    let mut receipt = format!("rcpt_{}_{}", id_frag, ts_frag);
    receipt.truncate(RECEIPT_MAX_LEN);
    receipt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PaymentService {
        PaymentService::new("rzp_test_key".to_string(), "test_secret".to_string())
    }

    /// Calcule la signature qu'enverrait le provider (même secret)
    fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_is_verified() {
        let svc = service();
        let sig = sign("test_secret", "order_ABC123", "pay_XYZ789");
        assert!(svc.verify_signature("order_ABC123", "pay_XYZ789", &sig));
    }

    #[test]
    fn test_mutated_inputs_are_rejected() {
        let svc = service();
        let sig = sign("test_secret", "order_ABC123", "pay_XYZ789");

        // un caractère changé dans chaque entrée -> rejet
        assert!(!svc.verify_signature("order_ABC124", "pay_XYZ789", &sig));
        assert!(!svc.verify_signature("order_ABC123", "pay_XYZ780", &sig));

        let mut bad_sig = sig.clone();
        let last = if bad_sig.pop() == Some('0') { '1' } else { '0' };
        bad_sig.push(last);
        assert!(!svc.verify_signature("order_ABC123", "pay_XYZ789", &bad_sig));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let svc = service();
        let sig = sign("other_secret", "order_ABC123", "pay_XYZ789");
        assert!(!svc.verify_signature("order_ABC123", "pay_XYZ789", &sig));
    }

    #[test]
    fn test_non_hex_signature_is_rejected() {
        let svc = service();
        assert!(!svc.verify_signature("order_ABC123", "pay_XYZ789", "not-hex!!"));
        assert!(!svc.verify_signature("order_ABC123", "pay_XYZ789", ""));
    }

    #[test]
    fn test_amount_conversion() {
        // 500 roupies -> 50000 paise
        assert_eq!(to_minor_units(500.0), Ok(50000));
        assert_eq!(to_minor_units(0.01), Ok(1));
        assert_eq!(to_minor_units(99.999), Ok(10000));
    }

    #[test]
    fn test_invalid_amounts_are_rejected() {
        assert_eq!(to_minor_units(0.0), Err(PaymentError::InvalidAmount));
        assert_eq!(to_minor_units(-500.0), Err(PaymentError::InvalidAmount));
        assert_eq!(to_minor_units(f64::NAN), Err(PaymentError::InvalidAmount));
        assert_eq!(to_minor_units(f64::INFINITY), Err(PaymentError::InvalidAmount));
    }

    #[test]
    fn test_receipt_stays_within_provider_limit() {
        assert_eq!(build_receipt(42, 1734567890123), "rcpt_42_890123");

        // id et timestamp les plus longs possibles
        let receipt = build_receipt(i32::MAX, i64::MAX);
        assert!(receipt.len() <= 40);
        assert!(receipt.starts_with("rcpt_"));
    }
}
