// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! The in-progress organization record edited by the onboarding form

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::form::FormModel;
use crate::validation::{self, ValidationState};
use crate::OnboardError;

/// Unsaved organization being built by the form.
///
/// Values are kept exactly as typed; an empty string means "not provided".
/// Normalization happens only when the payload is built for submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: AddressDraft,
    #[serde(default)]
    pub contact: ContactDraft,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub pincode: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDraft {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Addressable fields of [`OrganizationDraft`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    Name,
    Website,
    AddressLine1,
    AddressLine2,
    AddressCity,
    AddressState,
    AddressPincode,
    ContactEmail,
    ContactPhone,
}

impl FieldPath {
    pub const ALL: [FieldPath; 9] = [
        FieldPath::Name,
        FieldPath::Website,
        FieldPath::AddressLine1,
        FieldPath::AddressLine2,
        FieldPath::AddressCity,
        FieldPath::AddressState,
        FieldPath::AddressPincode,
        FieldPath::ContactEmail,
        FieldPath::ContactPhone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Website => "website",
            Self::AddressLine1 => "address.line1",
            Self::AddressLine2 => "address.line2",
            Self::AddressCity => "address.city",
            Self::AddressState => "address.state",
            Self::AddressPincode => "address.pincode",
            Self::ContactEmail => "contact.email",
            Self::ContactPhone => "contact.phone",
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldPath {
    type Err = OnboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| OnboardError::UnknownField(s.to_string()))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl OrganizationDraft {
    /// Current text of a field
    pub fn get(&self, field: FieldPath) -> &str {
        match field {
            FieldPath::Name => &self.name,
            FieldPath::Website => &self.website,
            FieldPath::AddressLine1 => &self.address.line1,
            FieldPath::AddressLine2 => &self.address.line2,
            FieldPath::AddressCity => &self.address.city,
            FieldPath::AddressState => &self.address.state,
            FieldPath::AddressPincode => &self.address.pincode,
            FieldPath::ContactEmail => &self.contact.email,
            FieldPath::ContactPhone => &self.contact.phone,
        }
    }

    /// Overwrite a single field
    pub fn set(&mut self, field: FieldPath, value: String) {
        let slot = match field {
            FieldPath::Name => &mut self.name,
            FieldPath::Website => &mut self.website,
            FieldPath::AddressLine1 => &mut self.address.line1,
            FieldPath::AddressLine2 => &mut self.address.line2,
            FieldPath::AddressCity => &mut self.address.city,
            FieldPath::AddressState => &mut self.address.state,
            FieldPath::AddressPincode => &mut self.address.pincode,
            FieldPath::ContactEmail => &mut self.contact.email,
            FieldPath::ContactPhone => &mut self.contact.phone,
        };
        *slot = value;
    }

    /// Load a draft from a JSON file
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl FormModel for OrganizationDraft {
    type Field = FieldPath;

    fn value(&self, field: FieldPath) -> &str {
        self.get(field)
    }

    fn set_value(&mut self, field: FieldPath, value: String) {
        self.set(field, value);
    }

    fn validate(&self) -> ValidationState<FieldPath> {
        validation::validate_draft(self)
    }
}

/// Accept `"560001"`, `560001` or `null` for text fields that are often numeric
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_round_trips_through_text() {
        for field in FieldPath::ALL {
            assert_eq!(field.as_str().parse::<FieldPath>().unwrap(), field);
        }
        assert!(matches!(
            "address.zip".parse::<FieldPath>(),
            Err(OnboardError::UnknownField(_))
        ));
    }

    #[test]
    fn test_set_and_get_nested_fields() {
        let mut draft = OrganizationDraft::default();
        draft.set(FieldPath::AddressCity, "Pune".to_string());
        draft.set(FieldPath::ContactPhone, "+91 98450 00000".to_string());

        assert_eq!(draft.address.city, "Pune");
        assert_eq!(draft.get(FieldPath::ContactPhone), "+91 98450 00000");
        assert_eq!(draft.get(FieldPath::Name), "");
    }

    #[test]
    fn test_numeric_pincode_deserializes_as_text() {
        let draft: OrganizationDraft = serde_json::from_str(
            r#"{ "name": "Acme", "address": { "line1": "1 Main St", "pincode": 12345 } }"#,
        ).unwrap();
        assert_eq!(draft.address.pincode, "12345");
        assert_eq!(draft.contact, ContactDraft::default());

        let draft: OrganizationDraft =
            serde_json::from_str(r#"{ "address": { "pincode": null } }"#).unwrap();
        assert_eq!(draft.address.pincode, "");
    }
}
