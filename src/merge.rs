// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Merging enrichment suggestions into the organization form

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::draft::{FieldPath, OrganizationDraft};
use crate::enrichment::Suggestion;
use crate::form::FormController;

/// Form section a suggestion lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeTarget {
    Name,
    Email,
    Phone,
    Address,
}

impl MergeTarget {
    /// Map a service field name onto a form section
    pub fn from_field(field: &str) -> Option<Self> {
        match field {
            "name" | "company_name" | "organization_name" => Some(Self::Name),
            "email" | "contact_email" => Some(Self::Email),
            "phone" | "contact_phone" => Some(Self::Phone),
            "address" => Some(Self::Address),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }
}

/// Outcome of one merge pass over a suggestion set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// Sections overwritten without review, in application order
    pub auto_applied: Vec<MergeTarget>,
    /// Below-threshold suggestions kept for the user to accept or dismiss
    pub pending: Vec<Suggestion>,
    /// Field names nothing in the form corresponds to
    pub ignored: Vec<String>,
}

/// Write a single suggestion into the form.
///
/// Returns the section touched, or `None` when the field is unknown or the
/// value carries nothing usable. Only keys present in the value are written.
pub fn apply_suggestion(
    form: &mut FormController<OrganizationDraft>,
    field: &str,
    value: &Value,
) -> Option<MergeTarget> {
    let Some(target) = MergeTarget::from_field(field) else {
        debug!("No form field for suggestion '{}', ignoring", field);
        return None;
    };

    let written = match target {
        MergeTarget::Name => set_scalar(form, FieldPath::Name, value),
        MergeTarget::Email => set_scalar(form, FieldPath::ContactEmail, value),
        MergeTarget::Phone => set_scalar(form, FieldPath::ContactPhone, value),
        MergeTarget::Address => merge_address(form, value),
    };

    if written {
        Some(target)
    } else {
        debug!("Suggestion for '{}' had no usable value", field);
        None
    }
}

/// Apply everything at or above `threshold`, keep the rest for review
pub fn merge_suggestions(
    form: &mut FormController<OrganizationDraft>,
    suggestions: Vec<Suggestion>,
    threshold: f64,
) -> MergeReport {
    let mut report = MergeReport::default();

    for suggestion in suggestions {
        if MergeTarget::from_field(&suggestion.field).is_none() {
            debug!("Ignoring suggestion for unknown field '{}'", suggestion.field);
            report.ignored.push(suggestion.field);
            continue;
        }

        if suggestion.confidence < threshold {
            report.pending.push(suggestion);
            continue;
        }

        if let Some(target) = apply_suggestion(form, &suggestion.field, &suggestion.value) {
            info!(
                "Auto-applied {} (confidence: {:.0}%)",
                target.as_str(),
                suggestion.confidence * 100.0
            );
            if !report.auto_applied.contains(&target) {
                report.auto_applied.push(target);
            }
        }
    }

    report
}

fn set_scalar(form: &mut FormController<OrganizationDraft>, field: FieldPath, value: &Value) -> bool {
    match as_text(value) {
        Some(text) => {
            form.apply_field(field, text);
            true
        }
        None => false,
    }
}

fn merge_address(form: &mut FormController<OrganizationDraft>, value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    let line1 = obj.get("line1").or_else(|| obj.get("street"));
    let parts = [
        (FieldPath::AddressLine1, line1),
        (FieldPath::AddressLine2, obj.get("line2")),
        (FieldPath::AddressCity, obj.get("city")),
        (FieldPath::AddressState, obj.get("state")),
        (FieldPath::AddressPincode, obj.get("pincode")),
    ];

    let mut written = false;
    for (field, part) in parts {
        if let Some(text) = part.and_then(as_text) {
            form.apply_field(field, text);
            written = true;
        }
    }
    written
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> FormController<OrganizationDraft> {
        FormController::default()
    }

    #[test]
    fn test_scalar_aliases() {
        let mut form = form();
        assert_eq!(apply_suggestion(&mut form, "company_name", &json!("Acme Co")), Some(MergeTarget::Name));
        assert_eq!(apply_suggestion(&mut form, "contact_email", &json!("ops@acme.co")), Some(MergeTarget::Email));
        assert_eq!(apply_suggestion(&mut form, "phone", &json!(5551234567u64)), Some(MergeTarget::Phone));

        let draft = form.values();
        assert_eq!(draft.name, "Acme Co");
        assert_eq!(draft.contact.email, "ops@acme.co");
        assert_eq!(draft.contact.phone, "5551234567");
    }

    #[test]
    fn test_unknown_field_is_noop() {
        let mut form = form();
        assert_eq!(apply_suggestion(&mut form, "industry", &json!("Retail")), None);
        assert_eq!(form.values(), &OrganizationDraft::default());
    }

    #[test]
    fn test_null_never_clears_a_field() {
        let mut form = form();
        form.set_field(FieldPath::Name, "Acme");
        assert_eq!(apply_suggestion(&mut form, "name", &Value::Null), None);
        assert_eq!(form.values().name, "Acme");
    }

    #[test]
    fn test_address_merges_only_present_keys() {
        let mut form = form();
        form.set_field(FieldPath::AddressLine2, "Suite 4");
        form.set_field(FieldPath::AddressCity, "Springfield");

        let target = apply_suggestion(&mut form, "address", &json!({
            "street": "1 Main St",
            "pincode": 12345
        }));

        assert_eq!(target, Some(MergeTarget::Address));
        let address = &form.values().address;
        assert_eq!(address.line1, "1 Main St");
        assert_eq!(address.line2, "Suite 4");
        assert_eq!(address.city, "Springfield");
        assert_eq!(address.pincode, "12345");
    }

    #[test]
    fn test_line1_preferred_over_street() {
        let mut form = form();
        apply_suggestion(&mut form, "address", &json!({ "line1": "Unit 2", "street": "1 Main St" }));
        assert_eq!(form.values().address.line1, "Unit 2");
    }

    #[test]
    fn test_address_merge_is_idempotent() {
        let value = json!({ "line1": "1 Main St", "city": "Springfield", "state": "IL" });

        let mut once = form();
        apply_suggestion(&mut once, "address", &value);

        let mut twice = form();
        apply_suggestion(&mut twice, "address", &value);
        apply_suggestion(&mut twice, "address", &value);

        assert_eq!(once.values(), twice.values());
    }

    #[test]
    fn test_threshold_splits_applied_and_pending() {
        let mut form = form();
        form.set_field(FieldPath::ContactEmail, "me@typed.by.user");

        let report = merge_suggestions(&mut form, vec![
            Suggestion::new("company_name", json!("Acme Co"), 0.9),
            Suggestion::new("email", json!("info@acme.co"), 0.84),
            Suggestion::new("phone", json!("+1 555 0100"), 0.85),
            Suggestion::new("industry", json!("Retail"), 0.99),
        ], 0.85);

        assert_eq!(report.auto_applied, vec![MergeTarget::Name, MergeTarget::Phone]);
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.pending[0].field, "email");
        assert_eq!(report.ignored, vec!["industry".to_string()]);

        let draft = form.values();
        assert_eq!(draft.name, "Acme Co");
        assert_eq!(draft.contact.phone, "+1 555 0100");
        assert_eq!(draft.contact.email, "me@typed.by.user");
    }

    #[test]
    fn test_auto_apply_overwrites_user_input() {
        let mut form = form();
        form.set_field(FieldPath::Name, "Typed Name");

        let report = merge_suggestions(&mut form, vec![
            Suggestion::new("name", json!("Acme Co"), 0.95),
        ], 0.85);

        assert_eq!(report.auto_applied, vec![MergeTarget::Name]);
        assert_eq!(form.values().name, "Acme Co");
    }

    #[test]
    fn test_merge_revalidates() {
        let mut form = form();
        assert!(form.error(FieldPath::Name).is_some());
        merge_suggestions(&mut form, vec![Suggestion::new("company_name", json!("Acme Co"), 0.9)], 0.85);
        assert!(form.error(FieldPath::Name).is_none());
    }
}
