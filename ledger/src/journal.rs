//! Notification journal.
//!
//! Every successful deposit and withdrawal, and every diagnosed unrecognized
//! call, is appended here in commit order. The core never reads it back.
//! The journal keeps the most recent `capacity` events; sequence numbers keep
//! counting past evicted entries.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strongbox_common::{AccountId, Amount, EventId};

/// Events retained by [`Journal::default`].
pub const DEFAULT_JOURNAL_CAPACITY: usize = 10_000;

/// Payload bytes kept in an `UnexpectedCall` event.
pub const MAX_DIAGNOSTIC_PAYLOAD: usize = 256;

/// Kind of notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Value was deposited.
    Deposit { account: AccountId, amount: Amount },
    /// Value was withdrawn and delivered.
    Withdrawal { account: AccountId, amount: Amount },
    /// An interaction matched no recognized operation.
    UnexpectedCall {
        caller: AccountId,
        value: Amount,
        /// Leading bytes of the payload, at most [`MAX_DIAGNOSTIC_PAYLOAD`].
        payload: Vec<u8>,
        /// Length of the full payload.
        payload_len: usize,
    },
}

impl EventKind {
    /// Diagnostic for a rejected call, keeping a bounded payload prefix.
    pub fn unexpected_call(caller: AccountId, value: Amount, payload: &[u8]) -> Self {
        let kept = payload.len().min(MAX_DIAGNOSTIC_PAYLOAD);
        EventKind::UnexpectedCall {
            caller,
            value,
            payload: payload[..kept].to_vec(),
            payload_len: payload.len(),
        }
    }

    /// Short name used in logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Deposit { .. } => "deposit",
            EventKind::Withdrawal { .. } => "withdrawal",
            EventKind::UnexpectedCall { .. } => "unexpected_call",
        }
    }
}

/// A single journaled notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique event ID.
    pub id: EventId,
    /// Position in the journal, starting at 0.
    pub sequence: u64,
    /// What happened.
    pub kind: EventKind,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Bounded, append-only event list.
#[derive(Debug, Clone)]
pub struct Journal {
    events: VecDeque<LedgerEvent>,
    capacity: usize,
    next_sequence: u64,
}

impl Default for Journal {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_JOURNAL_CAPACITY)
    }
}

impl Journal {
    /// Create an empty journal with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty journal retaining at most `capacity` events.
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            next_sequence: 0,
        }
    }

    /// Append an event and return its sequence number, evicting the oldest
    /// event when full.
    pub fn record(&mut self, kind: EventKind) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);

        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(LedgerEvent {
            id: EventId::new(),
            sequence,
            kind,
            recorded_at: Utc::now(),
        });
        sequence
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Retained events with `sequence >= from`, oldest first.
    pub fn since(&self, from: u64) -> impl Iterator<Item = &LedgerEvent> {
        let first = self.next_sequence - self.events.len() as u64;
        let skip = usize::try_from(from.saturating_sub(first)).unwrap_or(usize::MAX);
        self.events.iter().skip(skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers() {
        let mut journal = Journal::new();
        let alice = AccountId::new("alice");

        assert_eq!(
            journal.record(EventKind::Deposit {
                account: alice.clone(),
                amount: Amount::new(100),
            }),
            0
        );
        assert_eq!(
            journal.record(EventKind::Withdrawal {
                account: alice,
                amount: Amount::new(30),
            }),
            1
        );

        assert_eq!(journal.len(), 2);
        let tail: Vec<&LedgerEvent> = journal.since(1).collect();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].kind.name(), "withdrawal");
        assert_eq!(journal.since(10).count(), 0);
    }

    #[test]
    fn test_oldest_events_are_evicted() {
        let mut journal = Journal::with_capacity(3);
        let alice = AccountId::new("alice");

        for amount in 1..=5u128 {
            journal.record(EventKind::Deposit {
                account: alice.clone(),
                amount: Amount::new(amount),
            });
        }

        assert_eq!(journal.len(), 3);
        let sequences: Vec<u64> = journal.since(0).map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
        let sequences: Vec<u64> = journal.since(4).map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![4]);
        assert_eq!(journal.record(EventKind::Withdrawal {
            account: alice,
            amount: Amount::new(1),
        }), 5);
        assert_eq!(journal.len(), 3);
    }

    #[test]
    fn test_diagnostic_payload_is_truncated() {
        let payload = vec![0xab; MAX_DIAGNOSTIC_PAYLOAD * 4];
        let kind = EventKind::unexpected_call(AccountId::new("mallory"), Amount::new(1), &payload);

        match kind {
            EventKind::UnexpectedCall {
                payload: kept,
                payload_len,
                ..
            } => {
                assert_eq!(kept.len(), MAX_DIAGNOSTIC_PAYLOAD);
                assert_eq!(payload_len, MAX_DIAGNOSTIC_PAYLOAD * 4);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
