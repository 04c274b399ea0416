//! Portal home-screen domain model.
//!
//! # Responsibility
//! - Define the canonical layout aggregate shared by every engine component.
//! - Expose the static service catalog the layout references by `serviceId`.
//!
//! # Invariants
//! - A `serviceId` occupies at most one container (page grid, folder, dock).
//! - A layout always has at least one page.
//! - Layout values are replaced wholesale, never edited behind a reader.

pub mod catalog;
pub mod layout;
