//! Debounced, single-flight push scheduling.
//!
//! # Responsibility
//! - Coalesce local writes into one pending push per debounce window.
//! - Hand out at most one in-flight push and match its acknowledgement.
//!
//! # Invariants
//! - `pending` always holds the newest snapshot; scheduling replaces it and
//!   restarts the deadline.
//! - At most one ticket is in flight. A write that lands during a push
//!   becomes pending and is handed out after the push completes.
//! - Tickets are never reused within one scheduler.

use crate::model::layout::Layout;
use std::sync::Arc;

/// Identity of one handed-out push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushTicket {
    id: u64,
    last_modified: i64,
}

impl PushTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// `lastModified` of the snapshot this ticket carries.
    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }
}

/// A push the host should send now.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRequest {
    pub ticket: PushTicket,
    pub layout: Arc<Layout>,
}

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushPhase {
    Idle,
    Pending,
    InFlight,
    InFlightWithPending,
}

#[derive(Debug, Clone)]
struct PendingPush {
    due_at_ms: i64,
    snapshot: Arc<Layout>,
}

#[derive(Debug, Clone)]
pub struct PushScheduler {
    debounce_ms: i64,
    pending: Option<PendingPush>,
    in_flight: Option<PushTicket>,
    next_ticket: u64,
}

impl PushScheduler {
    pub fn new(debounce_ms: i64) -> Self {
        Self {
            debounce_ms: debounce_ms.max(0),
            pending: None,
            in_flight: None,
            next_ticket: 1,
        }
    }

    /// Replaces the pending snapshot; due one debounce window after `now_ms`.
    pub fn schedule(&mut self, snapshot: Arc<Layout>, now_ms: i64) {
        self.schedule_at(snapshot, now_ms.saturating_add(self.debounce_ms));
    }

    /// Replaces the pending snapshot; due immediately.
    pub fn schedule_now(&mut self, snapshot: Arc<Layout>, now_ms: i64) {
        self.schedule_at(snapshot, now_ms);
    }

    fn schedule_at(&mut self, snapshot: Arc<Layout>, due_at_ms: i64) {
        self.pending = Some(PendingPush {
            due_at_ms,
            snapshot,
        });
    }

    /// Deadline of the pending push, if any.
    pub fn next_due(&self) -> Option<i64> {
        self.pending.as_ref().map(|pending| pending.due_at_ms)
    }

    /// Hands out the pending push when it is due and nothing is in flight.
    pub fn poll(&mut self, now_ms: i64) -> Option<PushRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        if self.pending.as_ref()?.due_at_ms > now_ms {
            return None;
        }
        let pending = self.pending.take()?;
        let ticket = PushTicket {
            id: self.next_ticket,
            last_modified: pending.snapshot.last_modified,
        };
        self.next_ticket += 1;
        self.in_flight = Some(ticket);
        Some(PushRequest {
            ticket,
            layout: pending.snapshot,
        })
    }

    /// Releases the in-flight slot. Returns `false` for a ticket that is not
    /// the current in-flight one.
    pub fn complete(&mut self, ticket: PushTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Drops both the pending and the in-flight push.
    pub fn clear(&mut self) {
        self.pending = None;
        self.in_flight = None;
    }

    pub fn phase(&self) -> PushPhase {
        match (self.in_flight.is_some(), self.pending.is_some()) {
            (false, false) => PushPhase::Idle,
            (false, true) => PushPhase::Pending,
            (true, false) => PushPhase::InFlight,
            (true, true) => PushPhase::InFlightWithPending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PushPhase, PushScheduler};
    use crate::model::layout::Layout;
    use std::sync::Arc;

    fn snapshot(last_modified: i64) -> Arc<Layout> {
        let mut layout = Layout::default_layout();
        layout.last_modified = last_modified;
        Arc::new(layout)
    }

    #[test]
    fn writes_coalesce_and_restart_deadline() {
        let mut scheduler = PushScheduler::new(5_000);
        scheduler.schedule(snapshot(1), 0);
        scheduler.schedule(snapshot(2), 3_000);
        assert_eq!(scheduler.next_due(), Some(8_000));
        assert!(scheduler.poll(7_999).is_none());

        let request = scheduler.poll(8_000).unwrap();
        assert_eq!(request.layout.last_modified, 2);
        assert_eq!(request.ticket.last_modified(), 2);
        assert_eq!(scheduler.phase(), PushPhase::InFlight);
    }

    #[test]
    fn single_flight_defers_new_writes() {
        let mut scheduler = PushScheduler::new(0);
        scheduler.schedule(snapshot(1), 0);
        let first = scheduler.poll(0).unwrap();
        scheduler.schedule(snapshot(2), 1);
        assert_eq!(scheduler.phase(), PushPhase::InFlightWithPending);
        assert!(scheduler.poll(10).is_none());

        assert!(scheduler.complete(first.ticket));
        assert!(!scheduler.complete(first.ticket));
        let second = scheduler.poll(10).unwrap();
        assert_ne!(second.ticket, first.ticket);
        assert_eq!(second.layout.last_modified, 2);
    }

    #[test]
    fn clear_returns_to_idle() {
        let mut scheduler = PushScheduler::new(0);
        scheduler.schedule_now(snapshot(1), 0);
        scheduler.poll(0).unwrap();
        scheduler.schedule(snapshot(2), 0);
        scheduler.clear();
        assert_eq!(scheduler.phase(), PushPhase::Idle);
        assert!(scheduler.poll(100).is_none());
    }
}
