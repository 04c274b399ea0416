//! Home-screen portal layout engine.
//! This crate is the single source of truth for layout invariants: the
//! layout model, its mutation algebra, drag-and-drop resolution, role
//! blueprints and local-first persistence with lazy server sync.

pub mod blueprint;
pub mod db;
pub mod drop;
pub mod logging;
pub mod model;
pub mod mutation;
pub mod repo;
pub mod service;
pub mod sync;

pub use blueprint::{
    apply_blueprint, fallback_blueprint, resolve_blueprint, BlueprintSource, RoleBlueprint,
};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use drop::geometry::{Point, Rect};
pub use drop::resolver::{DropConfig, DropDecision, TieBreak};
pub use drop::session::{DragSession, MeasurementTarget};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::layout::{
    Folder, GridEntry, GridItem, IconSize, Layout, Page, Widget, WidgetSize, WidgetType,
};
pub use mutation::command::LayoutCommand;
pub use mutation::dock::QuickAccessTarget;
pub use repo::layout_store::{LayoutStore, LoadOutcome, SqliteLayoutStore, StoreError, StoreResult};
pub use service::portal_service::{DragOutcome, PortalService};
pub use sync::clock::{Clock, ManualClock, SystemClock};
pub use sync::controller::{
    InitOutcome, LayoutSource, PushAck, StartupPush, SyncConfig, SyncController, SyncMode,
};
pub use sync::migrations::UserAccess;
pub use sync::push::{PushPhase, PushRequest, PushTicket};
pub use sync::remote::{RemoteEnvelope, RemoteError, RemoteLayoutClient, RemoteStage, ServerFetch};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
