// Upload d'images vers Cloudinary (unsigned upload preset)
// On ne retient que l'url servie et le public_id (= filename)

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Failed to upload image")]
    Upload,
}

/// Les deux seuls champs conservés de la réponse du media host
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub url: String,
    pub filename: String,
}

#[derive(Deserialize)]
struct CloudinaryResponse {
    secure_url: String,
    public_id: String,
}

pub struct CloudinaryStore {
    client: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryStore {
    pub fn new(cloud_name: String, upload_preset: String) -> Self {
        CloudinaryStore {
            client: reqwest::Client::new(),
            cloud_name,
            upload_preset,
        }
    }

    /// Upload un fichier ; l'erreur brute du provider part dans les logs,
    /// le client ne voit qu'un échec générique
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<StoredMedia, MediaError> {
        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Cloudinary upload request failed: {}", e);
                MediaError::Upload
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Cloudinary upload rejected ({}): {}", status, body);
            return Err(MediaError::Upload);
        }

        let parsed: CloudinaryResponse = response.json().await.map_err(|e| {
            log::error!("Cloudinary response unreadable: {}", e);
            MediaError::Upload
        })?;

        Ok(StoredMedia {
            url: parsed.secure_url,
            filename: parsed.public_id,
        })
    }
}
