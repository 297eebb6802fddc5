//! Dashboard State
//!
//! Runs use-cases through the service and keeps, per use-case, the request
//! state and the latest result. A completion whose ticket has been
//! superseded is returned to its caller but never published. A run whose
//! future is dropped before completing (client gone) leaves its slot
//! `Failed`, not `InFlight`.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use riskit_core::UseCase;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::display::ErrorCategory;
use crate::error::Result;
use crate::model::{
    AnalyzeRequest, ArchitectRequest, AssetAnalysis, CompareRequest, ComparisonVerdict,
    DomainResult, PortfolioPlan, PulseFeed,
};
use crate::sequence::{RequestSequencer, Ticket};
use crate::service::StructuredGenerationService;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    InFlight {
        seq: u64,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        seq: u64,
        completed_at: DateTime<Utc>,
    },
    Failed {
        seq: u64,
        message: String,
        category: ErrorCategory,
        failed_at: DateTime<Utc>,
    },
}

/// What the dashboard shows for one use-case.
///
/// A failure keeps the previous result so the tab is not blanked.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Slot {
    pub state: RequestState,
    pub result: Option<DomainResult>,
}

/// A completed run, tagged with its ticket
#[derive(Clone, Debug, Serialize)]
pub struct Tracked<T> {
    pub seq: u64,

    /// A newer request for the same use-case was started meanwhile
    pub stale: bool,

    pub result: T,
}

type Slots = BTreeMap<UseCase, Slot>;

const CANCELLED_MESSAGE: &str = "The request was cancelled before it completed.";

pub struct Dashboard {
    service: Arc<StructuredGenerationService>,
    sequencer: Arc<RequestSequencer>,
    slots: Arc<RwLock<Slots>>,
}

impl Dashboard {
    pub fn new(service: Arc<StructuredGenerationService>) -> Self {
        let slots = UseCase::ALL.into_iter().map(|u| (u, Slot::default())).collect();
        Self {
            service,
            sequencer: Arc::new(RequestSequencer::new()),
            slots: Arc::new(RwLock::new(slots)),
        }
    }

    pub fn service(&self) -> &StructuredGenerationService {
        &self.service
    }

    pub async fn architect(&self, request: &ArchitectRequest) -> Result<Tracked<PortfolioPlan>> {
        self.track(UseCase::Architect, self.service.architect(request)).await
    }

    pub async fn compare(&self, request: &CompareRequest) -> Result<Tracked<ComparisonVerdict>> {
        self.track(UseCase::Compare, self.service.compare(request)).await
    }

    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<Tracked<AssetAnalysis>> {
        self.track(UseCase::Analyze, self.service.analyze(request)).await
    }

    pub async fn pulse(&self) -> Result<Tracked<PulseFeed>> {
        self.track(UseCase::Pulse, self.service.pulse()).await
    }

    /// Current slot for one use-case
    pub async fn slot(&self, use_case: UseCase) -> Slot {
        self.slots.read().await.get(&use_case).cloned().unwrap_or_default()
    }

    /// All four slots
    pub async fn snapshot(&self) -> BTreeMap<UseCase, Slot> {
        self.slots.read().await.clone()
    }

    /// Reset a slot to idle; anything still in flight for it is discarded
    pub async fn clear(&self, use_case: UseCase) {
        let mut slots = self.slots.write().await;
        let ticket = self.sequencer.begin(use_case);
        slots.insert(use_case, Slot::default());
        tracing::info!(%use_case, seq = ticket.seq, "Dashboard slot cleared");
    }

    async fn track<T, F>(&self, use_case: UseCase, run: F) -> Result<Tracked<T>>
    where
        T: Clone + Into<DomainResult>,
        F: Future<Output = Result<T>>,
    {
        let ticket = self.sequencer.begin(use_case);
        self.publish(ticket, |slot| {
            slot.state = RequestState::InFlight {
                seq: ticket.seq,
                started_at: Utc::now(),
            };
        })
        .await;

        let mut guard = InFlightGuard {
            dashboard: self,
            ticket,
            armed: true,
        };
        let outcome = run.await;

        let applied = match &outcome {
            Ok(value) => {
                self.publish(ticket, |slot| {
                    slot.state = RequestState::Succeeded {
                        seq: ticket.seq,
                        completed_at: Utc::now(),
                    };
                    slot.result = Some(value.clone().into());
                })
                .await
            }
            Err(e) => {
                self.publish(ticket, |slot| {
                    slot.state = RequestState::Failed {
                        seq: ticket.seq,
                        message: e.user_message(),
                        category: ErrorCategory::of(e),
                        failed_at: Utc::now(),
                    };
                })
                .await
            }
        };

        guard.armed = false;

        if !applied {
            tracing::warn!(%use_case, seq = ticket.seq, "Discarding stale completion");
        }

        outcome.map(|result| Tracked {
            seq: ticket.seq,
            stale: !applied,
            result,
        })
    }

    /// Apply `update` only if `ticket` is still the newest for its use-case
    async fn publish(&self, ticket: Ticket, update: impl FnOnce(&mut Slot)) -> bool {
        let mut slots = self.slots.write().await;
        if !self.sequencer.is_latest(&ticket) {
            return false;
        }
        update(slots.entry(ticket.use_case).or_default());
        true
    }
}

/// Marks the slot failed if a tracked run is dropped before it completes
struct InFlightGuard<'a> {
    dashboard: &'a Dashboard,
    ticket: Ticket,
    armed: bool,
}

fn mark_cancelled(slots: &mut Slots, sequencer: &RequestSequencer, ticket: Ticket) {
    if !sequencer.is_latest(&ticket) {
        return;
    }
    slots.entry(ticket.use_case).or_default().state = RequestState::Failed {
        seq: ticket.seq,
        message: CANCELLED_MESSAGE.into(),
        category: ErrorCategory::Other,
        failed_at: Utc::now(),
    };
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let ticket = self.ticket;
        tracing::warn!(use_case = %ticket.use_case, seq = ticket.seq, "Request dropped before completion");

        if let Ok(mut slots) = self.dashboard.slots.try_write() {
            mark_cancelled(&mut slots, &self.dashboard.sequencer, ticket);
            return;
        }

        // lock is busy; finish the update on the runtime
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let slots = Arc::clone(&self.dashboard.slots);
                let sequencer = Arc::clone(&self.dashboard.sequencer);
                handle.spawn(async move {
                    mark_cancelled(&mut *slots.write().await, &sequencer, ticket);
                });
            }
            Err(_) => {
                tracing::warn!(use_case = %ticket.use_case, "No runtime to record cancellation; slot left in flight");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightError;
    use crate::service::tests::StubProvider;
    use riskit_core::GenerationError;
    use std::time::Duration;

    const PULSE: &str = r#"[{"title": "Fed holds rates", "impact": "high", "sector": "Macro"}]"#;

    fn dashboard(stub: StubProvider) -> Dashboard {
        Dashboard::new(Arc::new(StructuredGenerationService::new(Arc::new(stub))))
    }

    #[tokio::test]
    async fn test_success_is_published() {
        let dashboard = dashboard(StubProvider::replying(PULSE));
        assert_eq!(dashboard.slot(UseCase::Pulse).await.state, RequestState::Idle);

        let tracked = dashboard.pulse().await.unwrap();
        assert!(!tracked.stale);
        assert_eq!(tracked.seq, 1);

        let slot = dashboard.slot(UseCase::Pulse).await;
        assert!(matches!(slot.state, RequestState::Succeeded { seq: 1, .. }));
        assert!(matches!(slot.result, Some(DomainResult::Pulse(ref feed)) if feed.items.len() == 1));
    }

    #[tokio::test]
    async fn test_failure_records_category() {
        let dashboard = dashboard(StubProvider::failing(|| GenerationError::RateLimited {
            provider: "Gemini".into(),
            message: "Resource exhausted".into(),
        }));

        let err = dashboard.pulse().await.unwrap_err();
        assert!(matches!(err, InsightError::Generation(_)));

        match dashboard.slot(UseCase::Pulse).await.state {
            RequestState::Failed { category, .. } => assert_eq!(category, ErrorCategory::Quota),
            other => panic!("expected failure state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stale_completion_is_discarded() {
        let dashboard = dashboard(StubProvider::replying(PULSE));

        // a request issued after this one started supersedes it
        let superseded = async {
            dashboard.sequencer.begin(UseCase::Pulse);
            dashboard.service.pulse().await
        };
        let tracked = dashboard.track(UseCase::Pulse, superseded).await.unwrap();

        assert!(tracked.stale);
        let slot = dashboard.slot(UseCase::Pulse).await;
        assert!(matches!(slot.state, RequestState::InFlight { seq: 1, .. }));
        assert!(slot.result.is_none());
    }

    #[tokio::test]
    async fn test_dropped_run_does_not_stay_in_flight() {
        let dashboard = dashboard(StubProvider::replying(PULSE));

        let never = std::future::pending::<Result<PulseFeed>>();
        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), dashboard.track(UseCase::Pulse, never)).await;
        assert!(timed_out.is_err());

        match dashboard.slot(UseCase::Pulse).await.state {
            RequestState::Failed { seq, category, .. } => {
                assert_eq!(seq, 1);
                assert_eq!(category, ErrorCategory::Other);
            }
            other => panic!("expected cancelled run to be failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_superseded_run_leaves_newer_state() {
        let dashboard = dashboard(StubProvider::replying(PULSE));

        // a newer pulse completes while the first run is still waiting
        let overtaken = async {
            dashboard.pulse().await.unwrap();
            std::future::pending::<Result<PulseFeed>>().await
        };
        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), dashboard.track(UseCase::Pulse, overtaken)).await;
        assert!(timed_out.is_err());

        let slot = dashboard.slot(UseCase::Pulse).await;
        assert!(matches!(slot.state, RequestState::Succeeded { seq: 2, .. }));
        assert!(slot.result.is_some());
    }

    #[tokio::test]
    async fn test_clear_resets_slot_and_other_slots_untouched() {
        let dashboard = dashboard(StubProvider::replying(PULSE));
        dashboard.pulse().await.unwrap();

        dashboard.clear(UseCase::Pulse).await;
        assert_eq!(dashboard.slot(UseCase::Pulse).await, Slot::default());

        let snapshot = dashboard.snapshot().await;
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot[&UseCase::Compare].state, RequestState::Idle);
    }
}
