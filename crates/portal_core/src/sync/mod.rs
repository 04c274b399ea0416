//! Local-first persistence and lazy server reconciliation.
//!
//! # Responsibility
//! - Own the live layout and its local copy.
//! - Debounce pushes to the server and reconcile startup copies by
//!   `lastModified` (last writer wins).
//!
//! # Invariants
//! - Remote I/O is modeled as values: fetches arrive as `ServerFetch`,
//!   pushes leave as `PushRequest` and return with their ticket.
//! - Time is read only through `Clock`.

pub mod clock;
pub mod controller;
pub mod migrations;
pub mod push;
pub mod remote;
