use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::RouteStoreSettings;
use crate::core::route::{RouteStore, RouteStoreError};
use crate::models::{NewRoute, PersistedRoute};

/// REST client for the external route store
///
/// Handles all communication with the route persistence API:
/// - Creating routes
/// - Listing a user's routes
/// - Fetching a single route
pub struct HttpRouteStore {
    base_url: String,
    client: Client,
}

impl HttpRouteStore {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_settings(settings: &RouteStoreSettings) -> Result<Self, reqwest::Error> {
        Self::new(settings.base_url.clone(), Duration::from_secs(settings.timeout_secs.max(1)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl From<reqwest::Error> for RouteStoreError {
    fn from(err: reqwest::Error) -> Self {
        RouteStoreError::Transport(err.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, RouteStoreError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(RouteStoreError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Route store rejected request for {}: {} - {}", what, status, body);
        return Err(RouteStoreError::ApiError(format!("{} ({})", status, what)));
    }

    response
        .json()
        .await
        .map_err(|e| RouteStoreError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
}

#[async_trait]
impl RouteStore for HttpRouteStore {
    async fn create_route(&self, route: &NewRoute) -> Result<PersistedRoute, RouteStoreError> {
        let response = self.client.post(self.url("/routes")).json(route).send().await?;
        decode(response, "new route").await
    }

    async fn list_routes(&self, user_id: &str) -> Result<Vec<PersistedRoute>, RouteStoreError> {
        let url = self.url(&format!("/users/{}/routes", urlencoding::encode(user_id)));
        tracing::debug!("Listing routes for user: {}", user_id);

        let response = self.client.get(url).send().await?;
        decode(response, &format!("routes of user {}", user_id)).await
    }

    async fn get_route(&self, route_id: &str) -> Result<PersistedRoute, RouteStoreError> {
        let url = self.url(&format!("/routes/{}", urlencoding::encode(route_id)));

        let response = self.client.get(url).send().await?;
        decode(response, &format!("route {}", route_id)).await
    }
}
