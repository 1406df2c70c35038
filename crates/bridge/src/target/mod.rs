//! Profile platform (GAMA) API client.
//!
//! Provides the user lookup, user create/update and bulk profile calls the
//! sync engine needs.
//!
//! # API Reference
//!
//! - Base URL: configured per stage
//! - Authentication: HTTP basic auth (API user + API key)
//! - Every request carries the configured redirect parameter (`gredir=gama`)
//!
//! | Call               | Method | Path               |
//! |--------------------|--------|--------------------|
//! | Lookup by email    | GET    | `api/users?email=` |
//! | Create user        | POST   | `api/users`        |
//! | Update user        | PUT    | `api/users/{id}`   |
//! | Bulk create        | POST   | `api/profiles`     |
//! | Bulk update        | PUT    | `api/profiles/1`   |

mod types;

pub use types::*;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use profile_bridge_core::{Email, SourceAddressId, TargetProfileId, TargetUserId};

use crate::config::GamaConfig;

const USERS_PATH: &str = "api/users";
const PROFILES_PATH: &str = "api/profiles";

/// The bulk update route needs a resource id in the path even though the
/// profiles to update are listed in the body.
const BULK_UPDATE_RESOURCE: &str = "1";

/// Errors that can occur when interacting with the profile platform API.
#[derive(Debug, Error)]
pub enum TargetError {
    /// HTTP request failed.
    #[error("target HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-2xx response.
    #[error("target endpoint ({url}) returned status {status}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    /// Failed to build a request URL.
    #[error("invalid target URL: {0}")]
    Url(#[from] url::ParseError),

    /// Failed to parse response.
    #[error("target parse error: {0}")]
    Parse(String),

    /// The lookup reported a match but returned no user record.
    #[error("target lookup for {0} reported a match but returned no user")]
    MissingLookupUser(String),
}

/// User and profile operations on the profile platform.
pub trait TargetDirectory: Sync {
    /// Find users registered with `email`.
    fn find_users_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<TargetLookup, TargetError>> + Send;

    /// Create a user; returns its id and default profile id.
    fn create_user(
        &self,
        payload: &TargetUserPayload,
    ) -> impl Future<Output = Result<CreatedTargetUser, TargetError>> + Send;

    /// Update an existing user.
    fn update_user(
        &self,
        user_id: &TargetUserId,
        payload: &TargetUserPayload,
    ) -> impl Future<Output = Result<(), TargetError>> + Send;

    /// Bulk-create profiles, keyed in the response by Source address id.
    fn create_profiles(
        &self,
        email: &Email,
        profiles: &[TargetProfile],
    ) -> impl Future<Output = Result<HashMap<SourceAddressId, TargetProfileId>, TargetError>> + Send;

    /// Bulk-update profiles, keyed in the response by profile id.
    fn update_profiles(
        &self,
        email: &Email,
        profiles: &[TargetProfile],
    ) -> impl Future<Output = Result<HashMap<TargetProfileId, bool>, TargetError>> + Send;
}

/// Profile platform API client.
#[derive(Clone)]
pub struct TargetClient {
    inner: Arc<TargetClientInner>,
}

struct TargetClientInner {
    client: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
    redirect_param: (String, String),
}

impl TargetClient {
    /// Create a new profile platform API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GamaConfig) -> Result<Self, TargetError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(TargetClientInner {
                client,
                base_url: config.base_url.clone(),
                username: config.username.clone(),
                password: config.password.clone(),
                redirect_param: config.redirect_param.clone(),
            }),
        })
    }

    /// Build an endpoint URL with the redirect parameter appended.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, TargetError> {
        let mut url = self.inner.base_url.join(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            let (key, value) = &self.inner.redirect_param;
            pairs.append_pair(key, value);
        }
        Ok(url)
    }

    /// Send an authenticated request and return the successful response.
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, TargetError> {
        let mut request = self
            .inner
            .client
            .request(method, url.clone())
            .basic_auth(&self.inner.username, Some(self.inner.password.expose_secret()));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(TargetError::Api {
            url: url.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    /// Parse a JSON response body.
    async fn parse<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, TargetError> {
        response
            .json()
            .await
            .map_err(|e| TargetError::Parse(format!("Failed to parse {what} response: {e}")))
    }
}

impl TargetDirectory for TargetClient {
    #[instrument(skip_all, fields(email = %email))]
    async fn find_users_by_email(&self, email: &Email) -> Result<TargetLookup, TargetError> {
        let url = self.endpoint(USERS_PATH, &[("email", email.as_str())])?;
        let response = self.send::<()>(Method::GET, url, None).await?;
        Self::parse(response, "user lookup").await
    }

    #[instrument(skip_all, fields(email = %payload.email))]
    async fn create_user(
        &self,
        payload: &TargetUserPayload,
    ) -> Result<CreatedTargetUser, TargetError> {
        let url = self.endpoint(USERS_PATH, &[])?;
        let response = self.send(Method::POST, url, Some(payload)).await?;
        Self::parse(response, "user create").await
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn update_user(
        &self,
        user_id: &TargetUserId,
        payload: &TargetUserPayload,
    ) -> Result<(), TargetError> {
        let url = self.endpoint(&format!("{USERS_PATH}/{user_id}"), &[])?;
        self.send(Method::PUT, url, Some(payload)).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(email = %email, count = profiles.len()))]
    async fn create_profiles(
        &self,
        email: &Email,
        profiles: &[TargetProfile],
    ) -> Result<HashMap<SourceAddressId, TargetProfileId>, TargetError> {
        let url = self.endpoint(PROFILES_PATH, &[])?;
        let body = ProfileBatchRequest {
            email: email.as_str(),
            profiles,
        };
        let response = self.send(Method::POST, url, Some(&body)).await?;
        let parsed: CreateProfilesResponse = Self::parse(response, "profile create").await?;
        Ok(parsed.profiles)
    }

    #[instrument(skip_all, fields(email = %email, count = profiles.len()))]
    async fn update_profiles(
        &self,
        email: &Email,
        profiles: &[TargetProfile],
    ) -> Result<HashMap<TargetProfileId, bool>, TargetError> {
        let url = self.endpoint(&format!("{PROFILES_PATH}/{BULK_UPDATE_RESOURCE}"), &[])?;
        let body = ProfileBatchRequest {
            email: email.as_str(),
            profiles,
        };
        let response = self.send(Method::PUT, url, Some(&body)).await?;
        let parsed: UpdateProfilesResponse = Self::parse(response, "profile update").await?;
        Ok(parsed.profiles)
    }
}

impl std::fmt::Debug for TargetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("username", &self.inner.username)
            .finish_non_exhaustive()
    }
}
