// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for the onboarding pipeline

use thiserror::Error;

/// Result type alias for onboarding operations
pub type Result<T> = std::result::Result<T, OnboardError>;

/// Onboarding error types
#[derive(Error, Debug)]
pub enum OnboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Service returned status {status}: {message}")]
    ServiceStatus { status: u16, message: String },

    #[error("Session store error: {0}")]
    Session(#[from] rusqlite::Error),

    #[error("Session store unavailable: {0}")]
    SessionStore(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown field path: {0}")]
    UnknownField(String),

    #[error("Enrichment error: {0}")]
    Enrichment(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
