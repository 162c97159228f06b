use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use shared::domain::{CheckoutId, CheckoutSnapshot, StoreConfig};
use tracing::info;

/// Extra resources requested alongside the base checkout.
pub const CHECKOUT_INCLUDES: [&str; 2] = [
    "cart.lineItems.physicalItems.categoryNames",
    "cart.lineItems.digitalItems.categoryNames",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCheckoutRequest {
    pub checkout_id: CheckoutId,
    pub include: Vec<String>,
}

impl LoadCheckoutRequest {
    pub fn new(checkout_id: CheckoutId) -> Self {
        Self {
            checkout_id,
            include: CHECKOUT_INCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
pub trait CheckoutLoader: Send + Sync {
    async fn load_checkout(&self, request: &LoadCheckoutRequest) -> Result<CheckoutSnapshot>;
}

pub struct HttpCheckoutLoader {
    http: Client,
    store_url: String,
}

impl HttpCheckoutLoader {
    pub fn new(store_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            store_url: store_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?;
        res.json::<T>()
            .await
            .with_context(|| format!("malformed payload from {url}"))
    }
}

/// Store settings served apart from the checkout resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutSettingsResponse {
    store_config: StoreConfig,
}

#[async_trait]
impl CheckoutLoader for HttpCheckoutLoader {
    async fn load_checkout(&self, request: &LoadCheckoutRequest) -> Result<CheckoutSnapshot> {
        let checkout_url = format!(
            "{}/api/storefront/checkouts/{}",
            self.store_url, request.checkout_id
        );
        info!(url = %checkout_url, include = ?request.include, "loading checkout");
        let mut snapshot: CheckoutSnapshot = self
            .get_json(&checkout_url, &[("include", request.include.join(","))])
            .await?;

        let settings_url = format!("{}/api/storefront/checkout-settings", self.store_url);
        let settings: CheckoutSettingsResponse = self
            .get_json(&settings_url, &[])
            .await
            .context("failed to load store config")?;
        snapshot.config = Some(settings.store_config);
        Ok(snapshot)
    }
}

/// Reads a snapshot recorded as JSON, for offline replays.
pub struct FileCheckoutLoader {
    path: PathBuf,
}

impl FileCheckoutLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CheckoutLoader for FileCheckoutLoader {
    async fn load_checkout(&self, request: &LoadCheckoutRequest) -> Result<CheckoutSnapshot> {
        info!(path = %self.path.display(), checkout_id = %request.checkout_id, "loading checkout from file");
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read '{}'", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("malformed checkout snapshot in '{}'", self.path.display()))
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
