//! FFI use-case API for the Flutter portal screen.
//!
//! # Responsibility
//! - Expose the portal session (layout, edits, drags, pushes) to Dart via FRB.
//! - Exchange layouts, commands and blueprints as JSON strings.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - One portal session per process, guarded by a mutex.
//! - Network I/O stays on the Dart side; pushes are handed out and
//!   acknowledged by ticket id.

use log::warn;
use portal_core::db::open_db;
use portal_core::model::catalog::SEEKER_ROLE;
use portal_core::{
    core_version as core_version_inner, fallback_blueprint, init_logging as init_logging_inner,
    ping as ping_inner, DragOutcome, DropConfig, Layout, LayoutCommand, MeasurementTarget, Point,
    PortalService, PushAck, PushTicket, Rect, RemoteEnvelope, RemoteError, RemoteStage,
    RoleBlueprint, ServerFetch, SqliteLayoutStore, SyncConfig, SyncController, SyncMode,
    SystemClock, UserAccess,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

const PORTAL_DB_FILE_NAME: &str = "portal_layout.sqlite3";
const PORTAL_DB_PATH_ENV: &str = "PORTAL_DB_PATH";

static PORTAL_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSION: OnceLock<Mutex<Option<FfiSession>>> = OnceLock::new();

struct FfiSession {
    service: PortalService<SqliteLayoutStore, SystemClock>,
    in_flight: Option<PushTicket>,
}

/// Health check.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust logging once per process.
///
/// # FFI contract
/// - Idempotent for the same `level + log_dir`.
/// - Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Host-measured box in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortalRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<PortalRect> for Rect {
    fn from(value: PortalRect) -> Self {
        Rect::new(value.x, value.y, value.width, value.height)
    }
}

/// Snapshot of the live layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalLayoutResponse {
    pub ok: bool,
    /// Layout JSON in the remote wire shape.
    pub layout_json: Option<String>,
    pub current_page: u32,
    pub message: String,
}

impl PortalLayoutResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            layout_json: None,
            current_page: 0,
            message: message.into(),
        }
    }
}

/// Outcome of an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalActionResponse {
    pub ok: bool,
    /// `false` when the edit was a no-op.
    pub changed: bool,
    pub message: String,
}

impl PortalActionResponse {
    fn success(changed: bool, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed: false,
            message: message.into(),
        }
    }
}

/// Drag progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalDragResponse {
    pub ok: bool,
    /// Ids still to measure; `"dock"` stands for the dock box.
    pub pending: Vec<String>,
    /// Decision JSON once resolved.
    pub decision_json: Option<String>,
    pub applied: bool,
    pub message: String,
}

impl PortalDragResponse {
    fn pending(pending: Vec<MeasurementTarget>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            pending: pending.into_iter().map(target_label).collect(),
            decision_json: None,
            applied: false,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            pending: Vec::new(),
            decision_json: None,
            applied: false,
            message: message.into(),
        }
    }
}

/// A push the host should send with `PUT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalPushResponse {
    pub ok: bool,
    pub ticket_id: Option<u64>,
    /// `{ "layout": ... }` request body.
    pub body_json: Option<String>,
    /// Epoch ms of the next scheduled push, if any.
    pub next_due_ms: Option<i64>,
    pub message: String,
}

/// Opens (or reopens) the portal session and runs the startup merge.
///
/// - `authenticated=false` keeps the session local-only.
/// - `server_reachable=false` means the server copy could not be fetched;
///   otherwise `server_body` is the raw `GET` body (empty when absent).
/// - `blueprint_json` is the blueprint endpoint body; when missing or
///   unreadable the built-in blueprint for `role` is used.
/// - A missing `role` counts as a seeker; seekers with
///   `profile_complete=false` get their locked services grouped.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_open(
    authenticated: bool,
    server_reachable: bool,
    server_body: Option<String>,
    role: Option<String>,
    profile_complete: bool,
    blueprint_json: Option<String>,
) -> PortalLayoutResponse {
    let store = match open_db(resolve_db_path()) {
        Ok(conn) => SqliteLayoutStore::new(conn),
        Err(err) => return PortalLayoutResponse::failure(format!("portal_open failed: {err}")),
    };
    let config = SyncConfig {
        mode: if authenticated {
            SyncMode::Remote
        } else {
            SyncMode::LocalOnly
        },
        ..SyncConfig::default()
    };
    let mut controller = SyncController::new(store, SystemClock, config);
    controller.set_access(Some(UserAccess::new(
        role.as_deref().unwrap_or(SEEKER_ROLE),
        profile_complete,
    )));

    let fetch = if server_reachable {
        ServerFetch::from_result(RemoteEnvelope::decode(server_body.as_deref().unwrap_or("")))
    } else {
        ServerFetch::Unreachable
    };
    let blueprint = decode_blueprint(role.as_deref(), blueprint_json.as_deref());
    if let Err(err) = controller.initialize(fetch, blueprint.as_ref()) {
        return PortalLayoutResponse::failure(format!("portal_open failed: {err}"));
    }

    let service = PortalService::new(controller, DropConfig::default());
    let response = layout_response(&service, "Portal opened.");
    match session_slot().lock() {
        Ok(mut slot) => {
            *slot = Some(FfiSession {
                service,
                in_flight: None,
            });
            response
        }
        Err(_) => PortalLayoutResponse::failure("portal_open failed: session lock poisoned"),
    }
}

/// Current layout and active page.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_layout() -> PortalLayoutResponse {
    with_session(|session| Ok(layout_response(&session.service, "OK.")))
        .unwrap_or_else(PortalLayoutResponse::failure)
}

#[flutter_rust_bridge::frb(sync)]
pub fn portal_set_page(page_index: u32) -> PortalActionResponse {
    with_session(|session| {
        let changed = session.service.set_current_page(page_index as usize);
        Ok(if changed {
            PortalActionResponse::success(true, "Page switched.")
        } else {
            PortalActionResponse::failure("page index out of range")
        })
    })
    .unwrap_or_else(PortalActionResponse::failure)
}

/// Applies one tagged command, e.g.
/// `{"op":"reorder_grid_items","page":0,"from":2,"to":0}`.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_apply(command_json: String) -> PortalActionResponse {
    let command = match serde_json::from_str::<LayoutCommand>(&command_json) {
        Ok(command) => command,
        Err(err) => {
            return PortalActionResponse::failure(format!("portal_apply invalid command: {err}"))
        }
    };
    with_session(|session| {
        let changed = session
            .service
            .apply(&command)
            .map_err(|err| format!("portal_apply failed: {err}"))?;
        Ok(PortalActionResponse::success(
            changed,
            if changed { "Layout updated." } else { "No change." },
        ))
    })
    .unwrap_or_else(PortalActionResponse::failure)
}

/// Starts a drag on the active page.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_begin_drag(moving_id: String) -> PortalDragResponse {
    with_session(|session| {
        Ok(match session.service.begin_drag(&moving_id) {
            Some(pending) => PortalDragResponse::pending(pending, "Drag started."),
            None => PortalDragResponse::failure("entry not found on the active page"),
        })
    })
    .unwrap_or_else(PortalDragResponse::failure)
}

/// Records a candidate box; `None` reports a failed measurement.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_record_measurement(id: String, rect: Option<PortalRect>) -> PortalDragResponse {
    with_session(|session| {
        let recorded = session
            .service
            .record_measurement(&id, rect.map(Rect::from));
        let message = if recorded { "Recorded." } else { "Ignored." };
        Ok(PortalDragResponse::pending(
            session.service.drag_pending(),
            message,
        ))
    })
    .unwrap_or_else(PortalDragResponse::failure)
}

#[flutter_rust_bridge::frb(sync)]
pub fn portal_record_dock(rect: Option<PortalRect>) -> PortalDragResponse {
    with_session(|session| {
        let recorded = session.service.record_dock(rect.map(Rect::from));
        let message = if recorded { "Recorded." } else { "Ignored." };
        Ok(PortalDragResponse::pending(
            session.service.drag_pending(),
            message,
        ))
    })
    .unwrap_or_else(PortalDragResponse::failure)
}

/// Resolves the drag released at `(x, y)` and applies the decision.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_finish_drag(x: f64, y: f64) -> PortalDragResponse {
    with_session(|session| {
        let outcome = session
            .service
            .finish_drag(Point::new(x, y))
            .map_err(|err| format!("portal_finish_drag failed: {err}"))?;
        Ok(match outcome {
            DragOutcome::NoSession => PortalDragResponse::failure("no drag in progress"),
            DragOutcome::Stale => {
                PortalDragResponse::failure("layout changed during the drag; nothing applied")
            }
            DragOutcome::Incomplete { .. } => PortalDragResponse::pending(
                session.service.drag_pending(),
                "Waiting for measurements.",
            ),
            DragOutcome::Resolved { decision, applied } => PortalDragResponse {
                ok: true,
                pending: Vec::new(),
                decision_json: serde_json::to_string(&decision).ok(),
                applied,
                message: "Drag resolved.".to_string(),
            },
        })
    })
    .unwrap_or_else(PortalDragResponse::failure)
}

#[flutter_rust_bridge::frb(sync)]
pub fn portal_cancel_drag() -> PortalActionResponse {
    with_session(|session| {
        let cancelled = session.service.cancel_drag();
        Ok(PortalActionResponse::success(cancelled, "Drag cancelled."))
    })
    .unwrap_or_else(PortalActionResponse::failure)
}

/// Hands out the due push, if any. The host sends `body_json` and reports
/// back with `portal_complete_push`.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_poll_push() -> PortalPushResponse {
    with_session(|session| take_due_push(session, RemoteEnvelope::encode)).unwrap_or_else(
        |message| PortalPushResponse {
            ok: false,
            ticket_id: None,
            body_json: None,
            next_due_ms: None,
            message,
        },
    )
}

fn take_due_push(
    session: &mut FfiSession,
    encode: impl FnOnce(&Layout) -> Result<String, RemoteError>,
) -> Result<PortalPushResponse, String> {
    let controller = session.service.controller_mut();
    let Some(request) = controller.poll_push() else {
        return Ok(PortalPushResponse {
            ok: true,
            ticket_id: None,
            body_json: None,
            next_due_ms: controller.next_push_due(),
            message: "Nothing due.".to_string(),
        });
    };
    let body = match encode(request.layout.as_ref()) {
        Ok(body) => body,
        Err(err) => {
            // Frees the single-flight slot.
            controller
                .complete_push(request.ticket, Err(err.clone()))
                .map_err(|store_err| format!("portal_poll_push failed: {store_err}"))?;
            return Err(format!("portal_poll_push encode failed: {err}"));
        }
    };
    session.in_flight = Some(request.ticket);
    Ok(PortalPushResponse {
        ok: true,
        ticket_id: Some(request.ticket.id()),
        body_json: Some(body),
        next_due_ms: None,
        message: "Push due.".to_string(),
    })
}

/// Acknowledges the push `ticket_id`. `error_message=None` means the server
/// accepted it.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_complete_push(ticket_id: u64, error_message: Option<String>) -> PortalActionResponse {
    with_session(|session| {
        let ticket = match session.in_flight {
            Some(ticket) if ticket.id() == ticket_id => ticket,
            _ => return Ok(PortalActionResponse::failure("unknown push ticket")),
        };
        session.in_flight = None;
        let result = match error_message {
            None => Ok(()),
            Some(message) => Err(RemoteError::network(RemoteStage::PushLayout, message)),
        };
        let ack = session
            .service
            .controller_mut()
            .complete_push(ticket, result)
            .map_err(|err| format!("portal_complete_push failed: {err}"))?;
        Ok(match ack {
            PushAck::Synced => PortalActionResponse::success(true, "Layout synced."),
            PushAck::Stale => PortalActionResponse::success(false, "Newer local changes pending."),
            PushAck::Failed(err) => PortalActionResponse::failure(err.to_string()),
            PushAck::UnknownTicket => PortalActionResponse::failure("unknown push ticket"),
        })
    })
    .unwrap_or_else(PortalActionResponse::failure)
}

/// Logout or role change: resets the layout to the default for `role`.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_reset(role: Option<String>, blueprint_json: Option<String>) -> PortalLayoutResponse {
    let blueprint = decode_blueprint(role.as_deref(), blueprint_json.as_deref());
    with_session(|session| {
        session.in_flight = None;
        session
            .service
            .reset(blueprint.as_ref())
            .map_err(|err| format!("portal_reset failed: {err}"))?;
        Ok(layout_response(&session.service, "Portal reset."))
    })
    .unwrap_or_else(PortalLayoutResponse::failure)
}

fn decode_blueprint(role: Option<&str>, blueprint_json: Option<&str>) -> Option<RoleBlueprint> {
    if let Some(raw) = blueprint_json.filter(|raw| !raw.trim().is_empty()) {
        match serde_json::from_str::<RoleBlueprint>(raw) {
            Ok(blueprint) => return Some(blueprint),
            Err(err) => warn!(
                "event=blueprint_decode module=ffi status=fallback error_code=decode_failed error={err}"
            ),
        }
    }
    role.map(fallback_blueprint)
}

fn layout_response(
    service: &PortalService<SqliteLayoutStore, SystemClock>,
    message: &str,
) -> PortalLayoutResponse {
    match serde_json::to_string(&*service.layout()) {
        Ok(json) => PortalLayoutResponse {
            ok: true,
            layout_json: Some(json),
            current_page: service.current_page() as u32,
            message: message.to_string(),
        },
        Err(err) => PortalLayoutResponse::failure(format!("layout encode failed: {err}")),
    }
}

fn target_label(target: MeasurementTarget) -> String {
    match target {
        MeasurementTarget::Dock => "dock".to_string(),
        MeasurementTarget::Entry(id) => id,
    }
}

fn session_slot() -> &'static Mutex<Option<FfiSession>> {
    SESSION.get_or_init(|| Mutex::new(None))
}

fn with_session<T>(f: impl FnOnce(&mut FfiSession) -> Result<T, String>) -> Result<T, String> {
    let mut slot = session_slot()
        .lock()
        .map_err(|_| "portal session lock poisoned".to_string())?;
    let session = slot
        .as_mut()
        .ok_or_else(|| "portal session is not open; call portal_open first".to_string())?;
    f(session)
}

fn resolve_db_path() -> PathBuf {
    PORTAL_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(PORTAL_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(PORTAL_DB_FILE_NAME)
        })
        .clone()
}
