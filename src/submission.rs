// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Submission: payload normalization, creation and post-create navigation

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::NavigationConfig;
use crate::draft::OrganizationDraft;
use crate::services::{Navigator, Organization, OrganizationService, SessionService, UserProfile};
use crate::session::SessionStore;
use crate::Result;

/// Normalized body sent to the creation service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Where the submission pipeline is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Validating,
    Submitting,
    Success,
    Failure,
    Redirecting,
}

/// How the user left the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Navigation {
    ClientRoute(String),
    HardRedirect(String),
}

/// Trimmed text, or `None` when blank
fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Prefix `https://` when a non-blank website has no scheme
pub fn normalize_website(website: &str) -> Option<String> {
    let website = non_blank(website)?;
    let lower = website.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(website)
    } else {
        Some(format!("https://{}", website))
    }
}

/// Build the outgoing payload. Empty `address`/`contact` objects are omitted.
pub fn build_payload(draft: &OrganizationDraft) -> OrganizationPayload {
    let address = &draft.address;
    let pincode = non_blank(&address.pincode).and_then(|p| match p.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("Dropping non-numeric pincode '{}'", p);
            None
        }
    });
    let has_address = [&address.line1, &address.line2, &address.city]
        .iter()
        .any(|v| !v.trim().is_empty())
        || pincode.is_some();

    let address = has_address.then(|| AddressPayload {
        line1: non_blank(&address.line1),
        line2: non_blank(&address.line2),
        city: non_blank(&address.city),
        state: non_blank(&address.state),
        pincode,
    });

    let email = non_blank(&draft.contact.email);
    let phone = non_blank(&draft.contact.phone);
    let contact = (email.is_some() || phone.is_some()).then_some(ContactPayload { email, phone });

    OrganizationPayload {
        name: draft.name.trim().to_string(),
        website: normalize_website(&draft.website),
        address,
        contact,
    }
}

/// Collaborators needed to create the organization and leave the form
#[derive(Clone)]
pub struct SubmissionPipeline {
    organizations: Arc<dyn OrganizationService>,
    sessions: Arc<dyn SessionService>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    navigation: NavigationConfig,
}

impl SubmissionPipeline {
    pub fn new(
        organizations: Arc<dyn OrganizationService>,
        sessions: Arc<dyn SessionService>,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
        navigation: NavigationConfig,
    ) -> Self {
        Self {
            organizations,
            sessions,
            store,
            navigator,
            navigation,
        }
    }

    pub async fn create(&self, payload: &OrganizationPayload) -> Result<Organization> {
        let organization = self.organizations.create(payload).await?;
        info!("Created organization {} ({})", organization.name, organization.id);
        Ok(organization)
    }

    /// Refresh the profile into local storage, then route home.
    ///
    /// A failed refresh still counts as success: the organization exists, so
    /// the user is sent home with a full page load instead.
    pub async fn refresh_and_navigate(&self) -> Navigation {
        match self.refresh_session().await {
            Ok(_) => {
                let route = self.navigation.home_route.clone();
                self.navigator.navigate(&route);
                Navigation::ClientRoute(route)
            }
            Err(e) => {
                warn!("Session refresh failed after creation, falling back to redirect: {}", e);
                let url = self.navigation.home_url();
                self.navigator.hard_redirect(&url);
                Navigation::HardRedirect(url)
            }
        }
    }

    async fn refresh_session(&self) -> Result<UserProfile> {
        let profile = self.sessions.get_current_user().await?;
        self.store.save_user_info(&profile)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(name: &str, website: &str) -> OrganizationDraft {
        OrganizationDraft {
            name: name.to_string(),
            website: website.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_website_gets_https_prefix() {
        assert_eq!(normalize_website("example.com").as_deref(), Some("https://example.com"));
        assert_eq!(normalize_website("https://example.com").as_deref(), Some("https://example.com"));
        assert_eq!(normalize_website("HTTP://example.com").as_deref(), Some("HTTP://example.com"));
        assert_eq!(normalize_website("  example.com  ").as_deref(), Some("https://example.com"));
        assert_eq!(normalize_website("   "), None);
    }

    #[test]
    fn test_empty_address_and_contact_are_omitted() {
        let payload = build_payload(&draft("Acme", ""));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, json!({ "name": "Acme" }));
    }

    #[test]
    fn test_whitespace_only_address_is_omitted() {
        let mut d = draft("Acme", "");
        d.address.line1 = "   ".to_string();
        d.address.state = "CA".to_string();
        assert_eq!(build_payload(&d).address, None);
    }

    #[test]
    fn test_strings_are_trimmed() {
        let mut d = draft("  Acme  ", " acme.co ");
        d.address.city = " Springfield ".to_string();
        d.address.pincode = " 12345 ".to_string();
        d.contact.phone = " +1 555 0100 ".to_string();

        let payload = build_payload(&d);
        assert_eq!(payload.name, "Acme");
        assert_eq!(payload.website.as_deref(), Some("https://acme.co"));
        assert_eq!(payload.address, Some(AddressPayload {
            city: Some("Springfield".to_string()),
            pincode: Some(12345),
            ..Default::default()
        }));
        assert_eq!(payload.contact, Some(ContactPayload {
            email: None,
            phone: Some("+1 555 0100".to_string()),
        }));
    }

    #[test]
    fn test_pincode_alone_keeps_address() {
        let mut d = draft("Acme", "");
        d.address.pincode = "560001".to_string();
        let json = serde_json::to_value(build_payload(&d)).unwrap();
        assert_eq!(json["address"], json!({ "pincode": 560001 }));
    }

    #[test]
    fn test_unparseable_pincode_alone_omits_address() {
        let mut d = draft("Acme", "");
        d.address.pincode = "١٢٣٤٥".to_string();
        let json = serde_json::to_value(build_payload(&d)).unwrap();
        assert_eq!(json, json!({ "name": "Acme" }));
    }

    #[test]
    fn test_navigation_serializes_kind_and_target() {
        let json = serde_json::to_value(Navigation::HardRedirect("http://app/".into())).unwrap();
        assert_eq!(json, json!({ "kind": "hard_redirect", "target": "http://app/" }));
    }
}
