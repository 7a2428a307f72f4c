// Géocodage Nominatim : texte libre -> (longitude, latitude)
// Premier candidat retenu ; aucun candidat -> point de repli (PAS une erreur)

use serde::Deserialize;
use thiserror::Error;

const SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

// Nominatim exige un User-Agent identifiant l'application
const USER_AGENT: &str = "wanderlust-backend/0.1";

/// Point de repli quand la localisation ne donne aucun résultat (Delhi)
pub const FALLBACK_COORDINATES: (f64, f64) = (77.209, 28.6139);

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Candidat tel que renvoyé par Nominatim (lat/lon en strings)
#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub lat: String,
    pub lon: String,
}

pub struct GeocodingService {
    client: reqwest::Client,
}

impl GeocodingService {
    pub fn new() -> Self {
        GeocodingService {
            client: reqwest::Client::new(),
        }
    }

    /// Géocode une localisation en texte libre
    /// Seule une panne TRANSPORT est une erreur ; zéro candidat renvoie
    /// simplement le point de repli
    pub async fn geocode(&self, location: &str) -> Result<(f64, f64), GeocodingError> {
        let candidates: Vec<Candidate> = self
            .client
            .get(SEARCH_URL)
            .header("User-Agent", USER_AGENT)
            .query(&[("format", "json"), ("q", location)])
            .send()
            .await?
            .json()
            .await?;

        Ok(pick_coordinates(&candidates))
    }
}

/// Premier candidat parseable, sinon point de repli
pub fn pick_coordinates(candidates: &[Candidate]) -> (f64, f64) {
    for candidate in candidates {
        if let (Ok(lon), Ok(lat)) = (candidate.lon.parse::<f64>(), candidate.lat.parse::<f64>()) {
            return (lon, lat);
        }
    }
    FALLBACK_COORDINATES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_candidate_wins() {
        let candidates = vec![
            Candidate {
                lat: "48.8566".to_string(),
                lon: "2.3522".to_string(),
            },
            Candidate {
                lat: "45.5019".to_string(),
                lon: "-73.5674".to_string(),
            },
        ];
        assert_eq!(pick_coordinates(&candidates), (2.3522, 48.8566));
    }

    #[test]
    fn test_no_candidates_falls_back_to_delhi() {
        assert_eq!(pick_coordinates(&[]), FALLBACK_COORDINATES);
    }

    #[test]
    fn test_unparseable_candidate_is_skipped() {
        let candidates = vec![
            Candidate {
                lat: "not-a-number".to_string(),
                lon: "2.3522".to_string(),
            },
            Candidate {
                lat: "45.5019".to_string(),
                lon: "-73.5674".to_string(),
            },
        ];
        assert_eq!(pick_coordinates(&candidates), (-73.5674, 45.5019));
    }
}
