use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use crate::models::{Coordinate, UserId, UserProfile};
use crate::services::store::{ProfileStore, StoreError};

/// Client for the profile service that owns user profiles.
///
/// Profiles are served as documents:
/// - `GET  /profiles/{id}` returns one profile or 404
/// - `GET  /profiles?query=[...]` returns `{ "documents": [...], "total": n }`
/// - `PATCH /profiles/{id}` updates location or presence fields
///
/// A document may carry its attributes at the top level or under `data`.
pub struct ProfileApiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl ProfileApiClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn parse_document(doc: &Value) -> Result<UserProfile, StoreError> {
        let data = doc.get("data").unwrap_or(doc);
        serde_json::from_value(data.clone())
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }

    async fn patch_profile(&self, user_id: UserId, body: Value) -> Result<bool, StoreError> {
        let url = self.url(&format!("profiles/{}", user_id));

        let response = self
            .client
            .patch(&url)
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(StoreError::Api(format!("Failed to update profile {}: {}", user_id, status))),
        }
    }
}

#[async_trait]
impl ProfileStore for ProfileApiClient {
    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let url = self.url(&format!("profiles/{}", user_id));

        tracing::debug!("Fetching profile for user: {}", user_id);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to fetch profile for {}: {} - {}", user_id, status, body);
            return Err(StoreError::Api(format!("Failed to fetch profile: {}", status)));
        }

        let json: Value = response.json().await?;
        Self::parse_document(&json).map(Some)
    }

    async fn active_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        let queries = serde_json::to_string(&["equal(\"isActive\", true)"])
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        let url = format!("{}?query={}", self.url("profiles"), urlencoding::encode(&queries));

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Api(format!(
                "Failed to list profiles: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| StoreError::InvalidResponse("Missing documents array".into()))?;

        // Skip malformed documents rather than failing the whole batch
        let profiles: Vec<UserProfile> = documents
            .iter()
            .filter_map(|doc| match Self::parse_document(doc) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Skipping profile document: {}", e);
                    None
                }
            })
            .filter(|p| p.is_active)
            .collect();

        tracing::debug!("Listed {} active profiles (total: {})", profiles.len(), total);

        Ok(profiles)
    }

    async fn update_location(
        &self,
        user_id: UserId,
        location: Option<Coordinate>,
    ) -> Result<bool, StoreError> {
        let body = json!({
            "latitude": location.map(|c| c.latitude),
            "longitude": location.map(|c| c.longitude),
        });
        self.patch_profile(user_id, body).await
    }

    async fn update_online_status(&self, user_id: UserId, online: bool) -> Result<bool, StoreError> {
        let now = Utc::now();
        let body = json!({
            "isOnline": online,
            "lastSeen": now,
            "lastActive": now,
        });
        self.patch_profile(user_id, body).await
    }
}
