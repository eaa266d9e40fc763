// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the onboarding pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{OnboardError, Result};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Website enrichment settings
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Local session storage
    #[serde(default)]
    pub session: SessionConfig,

    /// Post-submission navigation
    #[serde(default)]
    pub navigation: NavigationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EnrichmentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Quiet period after the last website edit before analysis runs
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Suggestions at or above this confidence are applied without review
    #[serde(default = "default_auto_apply_threshold")]
    pub auto_apply_threshold: f64,
    /// Websites must be longer than this to be analyzed
    #[serde(default = "default_min_website_length")]
    pub min_website_length: usize,
    /// Market sector passed to the enrichment service as context
    #[serde(default)]
    pub market_sector: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NavigationConfig {
    /// Client-side route of the application home
    #[serde(default = "default_home_route")]
    pub home_route: String,
    /// Origin used for hard redirects
    #[serde(default = "default_app_url")]
    pub app_url: String,
}

// Default value functions
fn default_base_url() -> String { "http://localhost:8000".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_retries() -> u32 { 2 }
fn default_true() -> bool { true }
fn default_debounce_ms() -> u64 { 1500 }
fn default_auto_apply_threshold() -> f64 { 0.85 }
fn default_min_website_length() -> usize { 5 }
fn default_session_path() -> String { "onboard_session.db".to_string() }
fn default_home_route() -> String { "/".to_string() }
fn default_app_url() -> String { "http://localhost:3000".to_string() }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            retries: default_retries(),
            auth_token: None,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: default_debounce_ms(),
            auto_apply_threshold: default_auto_apply_threshold(),
            min_website_length: default_min_website_length(),
            market_sector: String::new(),
        }
    }
}

impl EnrichmentConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            home_route: default_home_route(),
            app_url: default_app_url(),
        }
    }
}

impl NavigationConfig {
    /// Absolute URL of the home route, for hard redirects
    pub fn home_url(&self) -> String {
        format!(
            "{}/{}",
            self.app_url.trim_end_matches('/'),
            self.home_route.trim_start_matches('/')
        )
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| OnboardError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(OnboardError::Config("api.base_url must not be empty".to_string()));
        }
        let threshold = self.enrichment.auto_apply_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(OnboardError::Config(format!(
                "enrichment.auto_apply_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.enrichment.debounce_ms == 0 {
            return Err(OnboardError::Config("enrichment.debounce_ms must be positive".to_string()));
        }
        Ok(())
    }
}
