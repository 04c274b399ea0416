//! Local persistence of the layout blob.
//!
//! # Responsibility
//! - Hide the key-value primitive behind the `LayoutStore` contract.
//! - Encode and decode the layout JSON wholesale.
//!
//! # Invariants
//! - A blob that fails to decode is reported, never propagated as an error.

pub mod layout_store;
