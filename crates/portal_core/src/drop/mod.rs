//! Drag-and-drop resolution.
//!
//! # Responsibility
//! - Track one drag at a time and the boxes the host measures for it.
//! - Map a release point to a single structural decision.
//!
//! # See also
//! - `mutation::command` for the edits a decision turns into.

pub mod geometry;
pub mod resolver;
pub mod session;
