// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use org_onboard::draft::OrganizationDraft;
use org_onboard::enrichment::AnalysisResponse;
use org_onboard::submission::build_payload;
use org_onboard::validation::validate_draft;

#[derive(Arbitrary, Debug)]
struct Input {
    name: String,
    website: String,
    line1: String,
    city: String,
    pincode: String,
    email: String,
    phone: String,
    response: String,
}

fuzz_target!(|input: Input| {
    let mut draft = OrganizationDraft {
        name: input.name,
        website: input.website,
        ..Default::default()
    };
    draft.address.line1 = input.line1;
    draft.address.city = input.city;
    draft.address.pincode = input.pincode;
    draft.contact.email = input.email;
    draft.contact.phone = input.phone;

    let _ = validate_draft(&draft);
    let payload = build_payload(&draft);
    assert_eq!(payload.name, payload.name.trim());

    if let Ok(response) = serde_json::from_str::<AnalysisResponse>(&input.response) {
        for suggestion in response.into_suggestions() {
            assert!((0.0..=1.0).contains(&suggestion.confidence));
        }
    }
});
