//! HTTP catalog source
//!
//! Endpoints, relative to the base URL:
//! - `GET categories` / `GET categories/large` -> category tree JSON
//! - `GET products/{id}` -> product JSON; 404 (or a `null` body) is a soft miss

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use shared::models::{CategoryNode, Product};

use super::{CategoryTreeSource, ProductSource, TreeVariant};
use crate::config::CatalogConfig;
use crate::error::SourceError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tree and product source over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpCatalogSource {
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let base_url =
            Url::parse(base_url).map_err(|e| SourceError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &CatalogConfig) -> Result<Self, SourceError> {
        Self::with_timeout(&config.source_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl CategoryTreeSource for HttpCatalogSource {
    async fn get_tree(&self, variant: TreeVariant) -> Result<CategoryNode, SourceError> {
        let url = match variant {
            TreeVariant::Standard => self.endpoint(&["categories"])?,
            TreeVariant::Large => self.endpoint(&["categories", "large"])?,
        };
        tracing::debug!(%url, ?variant, "Requesting category tree");

        let resp = self.client.get(url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }
        // Decoded by hand: `Response::json` applies serde_json's nesting cap
        let body = resp.bytes().await?;
        Ok(CategoryNode::from_json_slice(&body)?)
    }
}

#[async_trait]
impl ProductSource for HttpCatalogSource {
    async fn get_product(&self, id: &str) -> Result<Option<Product>, SourceError> {
        let url = self.endpoint(&["products", id])?;

        let resp = self.client.get(url.clone()).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(resp.json::<Option<Product>>().await?),
            status => Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}
