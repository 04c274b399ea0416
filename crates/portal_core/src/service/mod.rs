//! Use-case facade over the sync controller.
//!
//! # Responsibility
//! - Give hosts one object per session: active page, edits, drags.
//! - Keep FFI layers decoupled from storage and sync details.

pub mod portal_service;
