//! Flutter bridge for the portal layout engine.

pub mod api;
