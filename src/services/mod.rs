// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Backend collaborators consumed by the onboarding pipeline

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::submission::OrganizationPayload;
use crate::Result;

pub use http::ApiClient;

/// Organization as returned by the creation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Authenticated user profile. Fields we don't model are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of a zip code lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipLookup {
    pub city: String,
    pub state_code: String,
}

#[async_trait]
pub trait OrganizationService: Send + Sync {
    async fn create(&self, payload: &OrganizationPayload) -> Result<Organization>;
}

#[async_trait]
pub trait SessionService: Send + Sync {
    async fn get_current_user(&self) -> Result<UserProfile>;
}

#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// `Ok(None)` when the code is unknown
    async fn lookup_by_zip_code(&self, zip: &str) -> Result<Option<ZipLookup>>;

    async fn get_cities_by_state(&self, state_code: &str) -> Result<Vec<String>>;
}

/// Where the user goes after onboarding
pub trait Navigator: Send + Sync {
    /// Client-side route change
    fn navigate(&self, route: &str);

    /// Full page load
    fn hard_redirect(&self, url: &str);
}

/// Navigator for headless use: records the destination in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        info!("Navigating to {}", route);
    }

    fn hard_redirect(&self, url: &str) {
        info!("Redirecting to {}", url);
    }
}
