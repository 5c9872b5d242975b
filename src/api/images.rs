use log::{debug, error, info};
use reqwest::{header, Client};
use serde_json::json;
use std::future::Future;

use super::ledger::NewCandidate;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::draft::{CandidateDraft, ImageFile};

/// Object storage for candidate portraits.
pub trait ImageStore {
    /// Uploads one image and returns its public URL.
    fn upload(
        &self,
        file: &ImageFile,
        candidate_id: u64,
        batch_id: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn delete(&self, image_urls: &[String]) -> impl Future<Output = Result<()>> + Send;
}

pub fn object_name(file: &ImageFile, candidate_id: u64, batch_id: &str) -> String {
    format!("candidate_{candidate_id}_{batch_id}.{}", file.extension())
}

/// Uploads one image per candidate, in order, with ids from 1. The first failure
/// aborts the whole batch.
pub async fn upload_candidate_images<S: ImageStore>(
    store: &S,
    candidates: &[CandidateDraft],
    batch_id: &str,
) -> Result<Vec<NewCandidate>> {
    let mut uploaded = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let candidate_id = index as u64 + 1;
        let Some(image) = candidate.image.as_ref() else {
            return Err(Error::Upload {
                candidate: candidate.name.clone(),
                reason: "no image selected".to_owned(),
            });
        };
        debug!(
            "Uploading image for candidate {}: {} ({} bytes)",
            candidate_id,
            image.file_name,
            image.bytes.len()
        );
        let image_url = store
            .upload(image, candidate_id, batch_id)
            .await
            .map_err(|e| {
                error!("Failed to upload image for candidate {}: {}", candidate.name, e);
                Error::Upload {
                    candidate: candidate.name.clone(),
                    reason: e.to_string(),
                }
            })?;
        info!("Uploaded image for {}: {}", candidate.name, image_url);
        uploaded.push(NewCandidate {
            name: candidate.name.trim().to_owned(),
            party: candidate.party.trim().to_owned(),
            image_url,
        });
    }
    Ok(uploaded)
}

/// Storage REST API in the Supabase layout.
pub struct HttpImageStore {
    client: Client,
    base_url: String,
    bucket: String,
    api_key: Option<String>,
}

impl HttpImageStore {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.image_store_url.trim_end_matches('/').to_owned(),
            bucket: config.image_bucket.clone(),
            api_key: config.image_store_key.clone(),
        }
    }

    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, name
        )
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder
                .header(header::AUTHORIZATION, format!("Bearer {key}"))
                .header("apikey", key),
            None => builder,
        }
    }
}

impl ImageStore for HttpImageStore {
    async fn upload(&self, file: &ImageFile, candidate_id: u64, batch_id: &str) -> Result<String> {
        let name = object_name(file, candidate_id, batch_id);
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, name);
        let resp = self
            .authorized(self.client.post(&url))
            .header(header::CONTENT_TYPE, &file.content_type)
            .header(header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(file.bytes.clone())
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(self.public_url(&name))
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(Error::Upload {
                candidate: format!("#{candidate_id}"),
                reason: format!("HTTP {status}: {body}"),
            })
        }
    }

    async fn delete(&self, image_urls: &[String]) -> Result<()> {
        let prefixes: Vec<&str> = image_urls
            .iter()
            .filter_map(|url| url.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .collect();
        if prefixes.is_empty() {
            return Ok(());
        }
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let resp = self
            .authorized(self.client.delete(&url))
            .json(&json!({ "prefixes": prefixes }))
            .send()
            .await?;

        if resp.status().is_success() {
            info!("Deleted {} candidate images", prefixes.len());
            Ok(())
        } else {
            error!("Error deleting images from storage: {}", resp.status());
            Err(Error::MalformedResponse(format!(
                "image delete failed with HTTP {}",
                resp.status()
            )))
        }
    }
}
