// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Organization onboarding form: enrichment trigger, suggestion review and submission

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::EnrichmentConfig;
use crate::debounce::Debouncer;
use crate::draft::{FieldPath, OrganizationDraft};
use crate::enrichment::{AnalysisContext, EnrichmentService, Suggestion};
use crate::events::{EventBus, FormEvent, Notification};
use crate::form::FormController;
use crate::merge::{self, MergeTarget};
use crate::services::{AddressLookup, Organization};
use crate::submission::{build_payload, Navigation, PipelineState, SubmissionPipeline};
use crate::validation::{check_pincode, ValidationState};

/// Result of [`OrganizationForm::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent
    Invalid(ValidationState<FieldPath>),
    /// A submission is already running
    AlreadySubmitting,
    /// The creation call failed; the form is editable again
    Failed { reason: String },
    /// Created; the user has been sent home
    Redirected { organization: Organization, navigation: Navigation },
}

/// Address fields filled from a pincode lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressAutofill {
    pub city: String,
    pub state_code: String,
    /// Cities of the state, for the city picker
    pub cities: Vec<String>,
}

/// Point-in-time copy of the form, for rendering
#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub draft: OrganizationDraft,
    pub errors: ValidationState<FieldPath>,
    pub is_submitting: bool,
    pub auto_applied: Vec<MergeTarget>,
    pub pending: Vec<Suggestion>,
    pub state: PipelineState,
}

struct FormSession {
    form: FormController<OrganizationDraft>,
    last_analyzed: Option<String>,
    auto_applied: Vec<MergeTarget>,
    pending: Vec<Suggestion>,
    state: PipelineState,
    /// Bumped whenever the form is reset; analyses from an older generation are dropped
    generation: u64,
}

struct Shared {
    session: Mutex<FormSession>,
    events: EventBus,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, FormSession> {
        // State stays consistent across a panicked writer: every update is a plain field store
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, session: &mut FormSession, state: PipelineState) {
        debug!("Submission state {:?} -> {:?}", session.state, state);
        session.state = state;
        self.events.publish(FormEvent::SubmissionState { state });
    }
}

/// The organization-creation form.
///
/// Dropping the form cancels a pending analysis timer. Analyses already in
/// flight run to completion and their results are discarded.
pub struct OrganizationForm {
    shared: Arc<Shared>,
    debouncer: Mutex<Debouncer>,
    settings: EnrichmentConfig,
    enrichment: Arc<dyn EnrichmentService>,
    address: Arc<dyn AddressLookup>,
    submission: SubmissionPipeline,
}

/// Whether a website value is worth sending for analysis
pub fn should_analyze(website: &str, min_length: usize) -> bool {
    website.contains('.') && website.chars().count() > min_length
}

impl OrganizationForm {
    pub fn new(
        settings: EnrichmentConfig,
        enrichment: Arc<dyn EnrichmentService>,
        address: Arc<dyn AddressLookup>,
        submission: SubmissionPipeline,
        events: EventBus,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(FormSession {
                    form: FormController::default(),
                    last_analyzed: None,
                    auto_applied: Vec::new(),
                    pending: Vec::new(),
                    state: PipelineState::Idle,
                    generation: 0,
                }),
                events,
            }),
            debouncer: Mutex::new(Debouncer::new(settings.debounce())),
            settings,
            enrichment,
            address,
            submission,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.shared.events.subscribe()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let session = self.shared.lock();
        FormSnapshot {
            draft: session.form.values().clone(),
            errors: session.form.errors().clone(),
            is_submitting: session.form.is_submitting(),
            auto_applied: session.auto_applied.clone(),
            pending: session.pending.clone(),
            state: session.state,
        }
    }

    pub fn draft(&self) -> OrganizationDraft {
        self.shared.lock().form.values().clone()
    }

    pub fn errors(&self) -> ValidationState<FieldPath> {
        self.shared.lock().form.errors().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.shared.lock().form.is_submitting()
    }

    pub fn state(&self) -> PipelineState {
        self.shared.lock().state
    }

    pub fn auto_applied(&self) -> Vec<MergeTarget> {
        self.shared.lock().auto_applied.clone()
    }

    pub fn pending_suggestions(&self) -> Vec<Suggestion> {
        self.shared.lock().pending.clone()
    }

    /// User edit of any field. Website edits go through the enrichment trigger.
    pub fn set_field(&self, field: FieldPath, value: impl Into<String>) {
        if field == FieldPath::Website {
            self.on_website_change(value);
            return;
        }
        self.shared.lock().form.set_field(field, value);
        self.shared.events.publish(FormEvent::FieldChanged { field });
    }

    /// Replace every field with user-provided values (e.g. a saved draft).
    /// Fields blank in `draft` are cleared.
    pub fn fill(&self, draft: &OrganizationDraft) {
        for field in FieldPath::ALL {
            self.set_field(field, draft.get(field));
        }
    }

    /// Update the website immediately and (re)schedule its analysis
    pub fn on_website_change(&self, value: impl Into<String>) {
        let value = value.into();
        self.shared.lock().form.set_field(FieldPath::Website, value.clone());
        self.shared.events.publish(FormEvent::FieldChanged { field: FieldPath::Website });

        let mut debouncer = self.debouncer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        debouncer.cancel();

        if !self.settings.enabled || !should_analyze(&value, self.settings.min_website_length) {
            return;
        }

        let task = run_analysis(
            Arc::downgrade(&self.shared),
            value.clone(),
            self.enrichment.clone(),
            self.settings.market_sector.clone(),
            self.settings.auto_apply_threshold,
        );
        debouncer.schedule(task);
        debug!("Analysis of {} scheduled in {:?}", value, debouncer.delay());
        self.shared.events.publish(FormEvent::AnalysisScheduled { website: value });
    }

    /// Apply a suggestion held for review
    pub fn accept_suggestion(&self, field: &str) -> Option<MergeTarget> {
        let mut session = self.shared.lock();
        let idx = session.pending.iter().position(|s| s.field == field)?;
        let suggestion = session.pending.remove(idx);
        let target = merge::apply_suggestion(&mut session.form, &suggestion.field, &suggestion.value);
        drop(session);

        if let Some(target) = target {
            info!("Accepted suggestion for {}", target.as_str());
        }
        target
    }

    /// Drop a suggestion held for review
    pub fn dismiss_suggestion(&self, field: &str) -> bool {
        let mut session = self.shared.lock();
        let before = session.pending.len();
        session.pending.retain(|s| s.field != field);
        session.pending.len() != before
    }

    /// Fill city and state from a valid pincode and list the state's cities
    pub async fn autofill_address(&self) -> Option<AddressAutofill> {
        let pincode = self.shared.lock().form.values().address.pincode.trim().to_string();
        if pincode.is_empty() || check_pincode(&pincode).is_some() {
            return None;
        }

        let found = match self.address.lookup_by_zip_code(&pincode).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.shared.events.notify(Notification::warning(format!(
                    "No location found for pincode {}",
                    pincode
                )));
                return None;
            }
            Err(e) => {
                warn!("Pincode lookup failed: {}", e);
                self.shared.events.notify(Notification::warning("Could not look up pincode"));
                return None;
            }
        };

        {
            let mut session = self.shared.lock();
            session.form.apply_field(FieldPath::AddressCity, found.city.clone());
            session.form.apply_field(FieldPath::AddressState, found.state_code.clone());
        }
        self.shared.events.publish(FormEvent::FieldChanged { field: FieldPath::AddressCity });
        self.shared.events.publish(FormEvent::FieldChanged { field: FieldPath::AddressState });

        let cities = match self.address.get_cities_by_state(&found.state_code).await {
            Ok(cities) => cities,
            Err(e) => {
                warn!("City list for {} unavailable: {}", found.state_code, e);
                Vec::new()
            }
        };

        Some(AddressAutofill {
            city: found.city,
            state_code: found.state_code,
            cities,
        })
    }

    /// Validate, create, refresh the session and navigate home
    pub async fn submit(&self) -> SubmitOutcome {
        let payload = {
            let mut session = self.shared.lock();
            if session.form.is_submitting() {
                debug!("Submit ignored, already submitting");
                return SubmitOutcome::AlreadySubmitting;
            }

            self.shared.transition(&mut session, PipelineState::Validating);
            let errors = session.form.validate().clone();
            if !errors.is_valid() {
                debug!("Submit blocked by {} validation error(s)", errors.len());
                self.shared.transition(&mut session, PipelineState::Idle);
                return SubmitOutcome::Invalid(errors);
            }

            session.form.set_submitting(true);
            self.shared.transition(&mut session, PipelineState::Submitting);
            build_payload(session.form.values())
        };

        let organization = match self.submission.create(&payload).await {
            Ok(organization) => organization,
            Err(e) => {
                warn!("Organization creation failed: {}", e);
                let mut session = self.shared.lock();
                session.form.set_submitting(false);
                self.shared.transition(&mut session, PipelineState::Failure);
                self.shared.transition(&mut session, PipelineState::Idle);
                return SubmitOutcome::Failed { reason: e.to_string() };
            }
        };

        {
            let mut session = self.shared.lock();
            self.shared.transition(&mut session, PipelineState::Success);
        }
        self.debouncer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .cancel();

        let navigation = self.submission.refresh_and_navigate().await;

        {
            let mut session = self.shared.lock();
            session.form.reset();
            session.generation += 1;
            session.last_analyzed = None;
            session.auto_applied.clear();
            session.pending.clear();
            self.shared.transition(&mut session, PipelineState::Redirecting);
        }
        self.shared.events.publish(FormEvent::Navigated { navigation: navigation.clone() });

        SubmitOutcome::Redirected { organization, navigation }
    }
}

/// Body of a fired debounce timer. Holds the form weakly so a torn-down form
/// is never written to.
async fn run_analysis(
    shared: Weak<Shared>,
    website: String,
    enrichment: Arc<dyn EnrichmentService>,
    market_sector: String,
    threshold: f64,
) {
    let (context, generation) = {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let mut session = shared.lock();
        if session.last_analyzed.as_deref() == Some(website.as_str()) {
            drop(session);
            debug!("{} already analyzed, skipping", website);
            shared.events.publish(FormEvent::AnalysisSkipped { website });
            return;
        }
        session.last_analyzed = Some(website.clone());
        let context = AnalysisContext {
            client_name: session.form.values().name.trim().to_string(),
            market_sector,
        };
        let generation = session.generation;
        drop(session);
        shared.events.publish(FormEvent::AnalysisStarted { website: website.clone() });
        (context, generation)
    };

    info!("Analyzing website: {}", website);
    let result = enrichment.analyze(&website, &context).await;

    let Some(shared) = shared.upgrade() else {
        debug!("Form gone before analysis of {} returned, discarding", website);
        return;
    };

    match result {
        Ok(suggestions) => {
            let report = {
                let mut session = shared.lock();
                if session.generation != generation {
                    None
                } else {
                    let report = merge::merge_suggestions(&mut session.form, suggestions, threshold);
                    session.auto_applied = report.auto_applied.clone();
                    session.pending = report.pending.clone();
                    Some(report)
                }
            };
            let Some(report) = report else {
                debug!("Form reset before analysis of {} returned, discarding", website);
                return;
            };

            for target in &report.auto_applied {
                shared.events.publish(FormEvent::SuggestionAutoApplied {
                    field: target.as_str().to_string(),
                });
            }
            if !report.auto_applied.is_empty() {
                shared.events.notify(Notification::info(format!(
                    "Filled {} field(s) from {}",
                    report.auto_applied.len(),
                    website
                )));
            }
            shared.events.publish(FormEvent::AnalysisCompleted {
                website,
                auto_applied: report.auto_applied.len(),
                pending: report.pending.len(),
            });
        }
        Err(e) => {
            warn!("Website analysis failed for {}: {}", website, e);
            if shared.lock().generation != generation {
                return;
            }
            shared.events.notify(Notification::error(format!("Could not analyze {}: {}", website, e)));
            shared.events.publish(FormEvent::AnalysisFailed {
                website,
                reason: e.to_string(),
            });
        }
    }
}
