//! Per-use-case request sequencing
//!
//! Every run takes a ticket; only the holder of the newest ticket for a
//! use-case may publish its result.

use std::sync::atomic::{AtomicU64, Ordering};

use riskit_core::UseCase;
use serde::Serialize;

/// Proof that a request was started, and in which order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub use_case: UseCase,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    counters: [AtomicU64; UseCase::ALL.len()],
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, use_case: UseCase) -> &AtomicU64 {
        &self.counters[use_case as usize]
    }

    /// Start a request, superseding any earlier one for the same use-case
    pub fn begin(&self, use_case: UseCase) -> Ticket {
        let seq = self.counter(use_case).fetch_add(1, Ordering::AcqRel) + 1;
        Ticket { use_case, seq }
    }

    pub fn is_latest(&self, ticket: &Ticket) -> bool {
        self.counter(ticket.use_case).load(Ordering::Acquire) == ticket.seq
    }

    /// Newest sequence number issued, 0 if none
    pub fn current(&self, use_case: UseCase) -> u64 {
        self.counter(use_case).load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.begin(UseCase::Compare);
        let second = sequencer.begin(UseCase::Compare);

        assert!(second.seq > first.seq);
        assert!(!sequencer.is_latest(&first));
        assert!(sequencer.is_latest(&second));
    }

    #[test]
    fn test_use_cases_are_independent() {
        let sequencer = RequestSequencer::new();
        let analyze = sequencer.begin(UseCase::Analyze);
        sequencer.begin(UseCase::Pulse);
        sequencer.begin(UseCase::Pulse);

        assert!(sequencer.is_latest(&analyze));
        assert_eq!(sequencer.current(UseCase::Pulse), 2);
        assert_eq!(sequencer.current(UseCase::Architect), 0);
    }
}
