//! Commerce platform (Magento REST) client.
//!
//! Only one call is needed: the customer search filtered by email, which
//! returns customers with their addresses nested.
//!
//! # API Reference
//!
//! - Base URL: configured per stage, e.g. `https://shop.example.com/rest/V1/`
//! - Authentication: integration token via `Authorization: Bearer <token>`

mod types;

pub use types::*;

use std::future::Future;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use profile_bridge_core::Email;

use crate::config::MagentoConfig;

/// Customer search path, relative to the base URL.
const SEARCH_PATH: &str = "customers/search";

/// Errors that can occur when interacting with the commerce API.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("source HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-2xx response.
    #[error("source endpoint ({url}) returned status {status}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    /// Failed to build a request URL.
    #[error("invalid source URL: {0}")]
    Url(#[from] url::ParseError),

    /// Failed to parse response.
    #[error("source parse error: {0}")]
    Parse(String),
}

/// Customer directory lookups on the commerce platform.
pub trait SourceDirectory: Sync {
    /// Find every customer registered with `email`.
    fn find_users_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<SourceSearchResult, SourceError>> + Send;
}

/// Commerce REST API client.
#[derive(Clone)]
pub struct SourceClient {
    inner: Arc<SourceClientInner>,
}

struct SourceClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl SourceClient {
    /// Create a new commerce API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &MagentoConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.bearer_token.expose_secret());
        let mut auth_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| SourceError::Parse(format!("Invalid bearer token format: {e}")))?;
        auth_value.set_sensitive(true);
        headers.insert("Authorization", auth_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(SourceClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Build the search URL for one email.
    fn search_url(&self, email: &Email) -> Result<Url, SourceError> {
        let mut url = self.inner.base_url.join(SEARCH_PATH)?;
        url.query_pairs_mut()
            .append_pair("searchCriteria[filter_groups][0][filters][0][field]", "email")
            .append_pair(
                "searchCriteria[filter_groups][0][filters][0][value]",
                email.as_str(),
            );
        Ok(url)
    }
}

impl SourceDirectory for SourceClient {
    #[instrument(skip_all, fields(email = %email))]
    async fn find_users_by_email(&self, email: &Email) -> Result<SourceSearchResult, SourceError> {
        let url = self.search_url(email)?;
        let response = self.inner.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let result: SourceSearchResult = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to parse customer search: {e}")))?;

        tracing::debug!(total = result.total_count, "Source search complete");
        Ok(result)
    }
}

impl std::fmt::Debug for SourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
