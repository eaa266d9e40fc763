// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Typed in-process event bus for form coordination

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::draft::FieldPath;
use crate::submission::{Navigation, PipelineState};

const DEFAULT_CAPACITY: usize = 64;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the user (toast)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into() }
    }
}

/// Events emitted by the onboarding form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    FieldChanged { field: FieldPath },
    AnalysisScheduled { website: String },
    AnalysisStarted { website: String },
    AnalysisSkipped { website: String },
    AnalysisCompleted { website: String, auto_applied: usize, pending: usize },
    AnalysisFailed { website: String, reason: String },
    SuggestionAutoApplied { field: String },
    Notification(Notification),
    SubmissionState { state: PipelineState },
    Navigated { navigation: Navigation },
}

/// Cloneable handle to a broadcast channel of [`FormEvent`]s.
///
/// Slow subscribers may miss events; publishing never blocks and never fails.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FormEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FormEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: FormEvent) {
        trace!(?event, "publish");
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn notify(&self, notification: Notification) {
        self.publish(FormEvent::Notification(notification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        bus.notify(Notification::info("nobody listening"));
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(FormEvent::FieldChanged { field: FieldPath::Website });
        bus.notify(Notification::error("Analysis failed"));

        assert_eq!(rx.recv().await.unwrap(), FormEvent::FieldChanged { field: FieldPath::Website });
        match rx.recv().await.unwrap() {
            FormEvent::Notification(n) => {
                assert_eq!(n.level, NotificationLevel::Error);
                assert_eq!(n.message, "Analysis failed");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(FormEvent::AnalysisSkipped { website: "acme.co".into() }).unwrap();
        assert_eq!(json["type"], "analysis_skipped");
        assert_eq!(json["website"], "acme.co");
    }
}
