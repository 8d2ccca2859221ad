use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::types::{CategoryInfo, ListResponse};
use super::{BuildStore, CatalogSource};
use crate::build::SavedBuild;
use crate::catalog::{Component, Slot};
use crate::config::ApiSettings;
use crate::error::{DroneClearError, Result};

/// Longest response body quoted back in a backend error.
const MAX_ERROR_BODY: usize = 300;

/// HTTP client for the DroneClear REST backend.
///
/// One `reqwest::Client` is built up front with the configured user agent and
/// timeout, and every request goes through it.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let mut base = settings.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| DroneClearError::Config(format!("Invalid API base URL '{}': {}", base, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| DroneClearError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DroneClearError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| DroneClearError::Network(format!("Failed to reach '{}': {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DroneClearError::NotFound(url.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("Unknown").to_string()
        } else {
            body.chars().take(MAX_ERROR_BODY).collect()
        };
        warn!("Backend returned {} for {}", status.as_u16(), url);
        Err(DroneClearError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self.send(self.client.get(url.clone()), &url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DroneClearError::Network(format!("Invalid response from '{}': {}", url, e)))
    }

    async fn get_list<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let list: ListResponse<T> = self.get_json(url).await?;
        Ok(list.into_items())
    }
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn list_categories(&self) -> Result<Vec<CategoryInfo>> {
        let url = self.endpoint("api/categories/")?;
        self.get_list(url).await
    }

    async fn list_components(&self, slot: Slot) -> Result<Vec<Component>> {
        let mut url = self.endpoint("api/components/")?;
        url.query_pairs_mut().append_pair("category", slot.slug());

        let components: Vec<Component> = self.get_list(url).await?;
        info!("Fetched {} components for {}", components.len(), slot);
        Ok(components)
    }

    async fn get_component(&self, slot: Slot, pid: &str) -> Result<Component> {
        let url = self.endpoint(&format!("api/components/{}/", urlencoding::encode(pid)))?;
        let component: Component = self.get_json(url).await?;
        if component.category != slot {
            return Err(DroneClearError::NotFound(format!(
                "{} is a {}, not a {}",
                pid, component.category, slot
            )));
        }
        Ok(component)
    }
}

#[async_trait]
impl BuildStore for ApiClient {
    async fn save_build(&self, build: &SavedBuild) -> Result<SavedBuild> {
        let url = self.endpoint("api/drone-models/")?;
        debug!("POST {}", url);
        let response = self.send(self.client.post(url.clone()).json(build), &url).await?;
        let saved = response
            .json::<SavedBuild>()
            .await
            .map_err(|e| DroneClearError::Network(format!("Invalid response from '{}': {}", url, e)))?;
        info!("Saved build {} ({})", saved.name, saved.pid);
        Ok(saved)
    }

    async fn list_saved_builds(&self) -> Result<Vec<SavedBuild>> {
        let url = self.endpoint("api/drone-models/")?;
        self.get_list(url).await
    }

    async fn get_saved_build(&self, pid: &str) -> Result<SavedBuild> {
        let url = self.endpoint(&format!("api/drone-models/{}/", urlencoding::encode(pid)))?;
        self.get_json(url).await
    }

    async fn delete_saved_build(&self, pid: &str) -> Result<()> {
        let url = self.endpoint(&format!("api/drone-models/{}/", urlencoding::encode(pid)))?;
        debug!("DELETE {}", url);
        self.send(self.client.delete(url.clone()), &url).await?;
        info!("Deleted saved build {}", pid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> ApiSettings {
        ApiSettings {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            user_agent: "DroneClear/test".to_string(),
        }
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = ApiClient::new(&settings("http://localhost:8000")).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/");
        let url = client.endpoint("api/categories/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/categories/");
    }

    #[test]
    fn test_base_url_with_prefix_is_kept() {
        let client = ApiClient::new(&settings("https://example.com/droneclear/")).unwrap();
        let url = client.endpoint("api/drone-models/").unwrap();
        assert_eq!(url.as_str(), "https://example.com/droneclear/api/drone-models/");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = ApiClient::new(&settings("not a url"));
        assert!(matches!(result, Err(DroneClearError::Config(_))));
    }
}
