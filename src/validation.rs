// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Field validation rules for the organization form

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::draft::{FieldPath, OrganizationDraft};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

static WEBSITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?([0-9a-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$").expect("valid website regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[1-9][0-9]{0,15}$").expect("valid phone regex")
});

static PINCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{5,6}$").expect("valid pincode regex")
});

/// Per-field error messages. Absent field = valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationState<F: Ord> {
    errors: BTreeMap<F, String>,
}

impl<F: Ord> Default for ValidationState<F> {
    fn default() -> Self {
        Self { errors: BTreeMap::new() }
    }
}

impl<F: Ord + Copy> ValidationState<F> {
    pub fn insert(&mut self, field: F, message: impl Into<String>) {
        // First failing rule wins
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn error(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> {
        self.errors.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

/// Run every rule against the draft
pub fn validate_draft(draft: &OrganizationDraft) -> ValidationState<FieldPath> {
    let mut state = ValidationState::default();

    if let Some(msg) = check_name(&draft.name) {
        state.insert(FieldPath::Name, msg);
    }
    if let Some(msg) = check_website(&draft.website) {
        state.insert(FieldPath::Website, msg);
    }
    if let Some(msg) = check_pincode(&draft.address.pincode) {
        state.insert(FieldPath::AddressPincode, msg);
    }
    if let Some(msg) = check_email(&draft.contact.email) {
        state.insert(FieldPath::ContactEmail, msg);
    }
    if let Some(msg) = check_phone(&draft.contact.phone) {
        state.insert(FieldPath::ContactPhone, msg);
    }
    if !has_contact_method(draft) {
        state.insert(FieldPath::ContactEmail, "Provide at least one contact method");
    }

    state
}

pub fn check_name(name: &str) -> Option<String> {
    let len = name.trim().chars().count();
    if len == 0 {
        Some("Organization name is required".to_string())
    } else if len < NAME_MIN_CHARS {
        Some(format!("Name must be at least {} characters", NAME_MIN_CHARS))
    } else if len > NAME_MAX_CHARS {
        Some(format!("Name must be at most {} characters", NAME_MAX_CHARS))
    } else {
        None
    }
}

pub fn check_website(website: &str) -> Option<String> {
    let website = website.trim();
    if website.is_empty() || WEBSITE_RE.is_match(website) {
        None
    } else {
        Some("Please enter a valid website URL".to_string())
    }
}

pub fn check_pincode(pincode: &str) -> Option<String> {
    let pincode = pincode.trim();
    if pincode.is_empty() || PINCODE_RE.is_match(pincode) {
        None
    } else {
        Some("Pincode must be a 5 or 6 digit number".to_string())
    }
}

pub fn check_email(email: &str) -> Option<String> {
    let email = email.trim();
    if email.is_empty() || EMAIL_RE.is_match(email) {
        None
    } else {
        Some("Please enter a valid email address".to_string())
    }
}

pub fn check_phone(phone: &str) -> Option<String> {
    let digits = strip_phone_punctuation(phone);
    if digits.is_empty() || PHONE_RE.is_match(&digits) {
        None
    } else {
        Some("Please enter a valid phone number".to_string())
    }
}

/// Drop spaces, dashes and parentheses
pub fn strip_phone_punctuation(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

/// "At least one contact method" rule. Currently always satisfied; enforcement
/// is pending a product decision on whether contact details are mandatory.
fn has_contact_method(_draft: &OrganizationDraft) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_named(name: &str) -> OrganizationDraft {
        OrganizationDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_length_bounds() {
        assert!(check_name("").is_some());
        assert!(check_name("   ").is_some());
        assert!(check_name("A").is_some());
        assert!(check_name("Acme").is_none());
        assert!(check_name(&"x".repeat(100)).is_none());
        assert!(check_name(&"x".repeat(101)).is_some());
    }

    #[test]
    fn test_pincode_digits() {
        assert!(check_pincode("1234").is_some());
        assert!(check_pincode("12345").is_none());
        assert!(check_pincode("560001").is_none());
        assert!(check_pincode("5600011").is_some());
        assert!(check_pincode("12a45").is_some());
        assert!(check_pincode("").is_none());
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        assert!(check_pincode("١٢٣٤٥").is_some());
        assert!(check_pincode("１２３４５").is_some());
        assert!(check_phone("+١٥٥٥١٢٣٤").is_some());
        assert!(check_website("١٢٣.com").is_some());
    }

    #[test]
    fn test_website_pattern() {
        assert!(check_website("example.com").is_none());
        assert!(check_website("https://example.com").is_none());
        assert!(check_website("http://sub.example.co.uk/about-us").is_none());
        assert!(check_website("acme.co").is_none());
        assert!(check_website("not a url").is_some());
        assert!(check_website("ftp://example.com").is_some());
        assert!(check_website("").is_none());
    }

    #[test]
    fn test_email_pattern() {
        assert!(check_email("ops@acme.co").is_none());
        assert!(check_email("ops@acme").is_some());
        assert!(check_email("ops acme.co").is_some());
    }

    #[test]
    fn test_phone_strips_punctuation() {
        assert!(check_phone("+1 (555) 123-4567").is_none());
        assert!(check_phone("0555 1234").is_some());
        assert!(check_phone("+12345678901234567").is_some());
        assert!(check_phone("call me").is_some());
        assert_eq!(strip_phone_punctuation("(02) 12-34"), "021234");
    }

    #[test]
    fn test_validate_draft_collects_field_errors() {
        let mut draft = draft_named("A");
        draft.address.pincode = "1234".to_string();
        draft.contact.email = "nope".to_string();

        let state = validate_draft(&draft);
        assert!(!state.is_valid());
        assert_eq!(state.len(), 3);
        assert!(state.error(FieldPath::Name).is_some());
        assert!(state.error(FieldPath::AddressPincode).is_some());
        assert!(state.error(FieldPath::ContactEmail).is_some());
        assert!(state.error(FieldPath::Website).is_none());
    }

    #[test]
    fn test_minimal_draft_is_valid_without_contact() {
        let state = validate_draft(&draft_named("Acme"));
        assert!(state.is_valid());
    }

    #[test]
    fn test_serializes_as_field_map() {
        let state = validate_draft(&draft_named("A"));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["name"], "Name must be at least 2 characters");
    }
}
