// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! org-onboard: AI-assisted organization onboarding
//!
//! The organization-creation form as a library: website edits are debounced
//! into an enrichment call, confident suggestions are merged into the draft,
//! every change is validated, and submission normalizes the payload, creates
//! the organization and refreshes the local session.

pub mod config;
pub mod controller;
pub mod debounce;
pub mod draft;
pub mod enrichment;
pub mod error;
pub mod events;
pub mod form;
pub mod merge;
pub mod services;
pub mod session;
pub mod submission;
pub mod validation;

pub use config::AppConfig;
pub use controller::{OrganizationForm, SubmitOutcome};
pub use draft::{FieldPath, OrganizationDraft};
pub use error::{OnboardError, Result};
