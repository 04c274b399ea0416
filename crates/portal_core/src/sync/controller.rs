//! Local-first owner of the live layout.
//!
//! # Responsibility
//! - Load, merge, migrate and overlay the layout at startup.
//! - Apply the user's profile restrictions after the overlay.
//! - Apply mutations copy-on-write, persist them and schedule pushes.
//! - Match push acknowledgements against the live layout.
//!
//! # Invariants
//! - Local storage is written synchronously on every effective change.
//! - Every effective change stamps `lastModified = max(now, previous + 1)`
//!   and clears `syncedWithServer`.
//! - A push acknowledgement marks the layout synced only when its ticket's
//!   `lastModified` equals the live layout's.
//! - `SyncMode::LocalOnly` never schedules a push.
//!
//! # See also
//! - `sync::push` for the scheduling state machine.

use crate::blueprint::{
    apply_blueprint, fallback_blueprint, resolve_blueprint, BlueprintSource, RoleBlueprint,
};
use crate::model::layout::Layout;
use crate::mutation::command::LayoutCommand;
use crate::repo::layout_store::{load_layout, save_layout, LayoutStore, LoadOutcome, StoreResult};
use crate::sync::clock::Clock;
use crate::sync::migrations::{lock_services_for_profile, run_startup_migrations, UserAccess};
use crate::sync::push::{PushPhase, PushRequest, PushScheduler, PushTicket};
use crate::sync::remote::{RemoteError, RemoteLayoutClient, ServerFetch};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Storage key of the layout blob.
pub const DEFAULT_STORAGE_KEY: &str = "portal_layout";
/// Quiet period before a local write is pushed.
pub const DEFAULT_DEBOUNCE_MS: i64 = 5_000;

/// Whether the session talks to the server at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncMode {
    #[default]
    Remote,
    /// Unauthenticated session: local persistence only.
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub debounce_ms: i64,
    pub storage_key: String,
    pub mode: SyncMode,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            mode: SyncMode::default(),
        }
    }
}

/// Where the live layout came from at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    Local,
    Server,
    /// Nothing usable was stored locally or remotely.
    Default,
}

/// Push scheduled by `initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPush {
    None,
    Debounced,
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    pub source: LayoutSource,
    /// Migrations or the blueprint overlay changed the merged layout.
    pub migrated: bool,
    /// The local blob existed but could not be decoded.
    pub local_corrupt: bool,
    pub push: StartupPush,
}

/// Result of acknowledging a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushAck {
    /// The live layout is now marked synced.
    Synced,
    /// The push succeeded for an older snapshot; the live layout stays dirty.
    Stale,
    Failed(RemoteError),
    /// The ticket is not the one in flight.
    UnknownTicket,
}

pub struct SyncController<S: LayoutStore, C: Clock> {
    store: S,
    clock: C,
    config: SyncConfig,
    layout: Arc<Layout>,
    scheduler: PushScheduler,
    access: Option<UserAccess>,
}

impl<S: LayoutStore, C: Clock> SyncController<S, C> {
    /// Creates a controller holding the default layout. Call `initialize`
    /// (or `bootstrap`) before serving the layout.
    pub fn new(store: S, clock: C, config: SyncConfig) -> Self {
        let scheduler = PushScheduler::new(config.debounce_ms);
        Self {
            store,
            clock,
            config,
            layout: Arc::new(Layout::default_layout()),
            scheduler,
            access: None,
        }
    }

    /// Sets the role and profile state applied by `initialize` and `reset`.
    pub fn set_access(&mut self, access: Option<UserAccess>) {
        self.access = access;
    }

    pub fn access(&self) -> Option<&UserAccess> {
        self.access.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Snapshot of the live layout.
    pub fn current(&self) -> Arc<Layout> {
        Arc::clone(&self.layout)
    }

    pub fn push_phase(&self) -> PushPhase {
        self.scheduler.phase()
    }

    pub fn next_push_due(&self) -> Option<i64> {
        self.scheduler.next_due()
    }

    /// Merges the local copy with `fetch`, runs startup migrations and the
    /// optional blueprint overlay, persists and schedules pushes.
    pub fn initialize(
        &mut self,
        fetch: ServerFetch,
        blueprint: Option<&RoleBlueprint>,
    ) -> StoreResult<InitOutcome> {
        info!(
            "event=layout_init module=sync status=start mode={:?}",
            self.config.mode
        );
        let fetch = match self.config.mode {
            SyncMode::LocalOnly => ServerFetch::Unreachable,
            SyncMode::Remote => fetch,
        };
        let reachable = fetch != ServerFetch::Unreachable;

        let loaded = load_layout(&self.store, &self.config.storage_key)?;
        let local_corrupt = matches!(loaded, LoadOutcome::Corrupt { .. });
        let local = loaded.into_layout();

        let (source, merged) = match (local, fetch) {
            (local, ServerFetch::Present(mut server))
                if local
                    .as_ref()
                    .map_or(true, |local| server.last_modified > local.last_modified) =>
            {
                server.synced_with_server = true;
                (LayoutSource::Server, server)
            }
            (Some(local), _) => (LayoutSource::Local, local),
            (None, _) => (LayoutSource::Default, Layout::default_layout()),
        };
        let dirty_local = source == LayoutSource::Local && !merged.synced_with_server;

        let mut next = self.prepare(&merged, blueprint);
        let migrated = next != merged;
        if migrated {
            self.stamp(&mut next, merged.last_modified);
        }

        self.layout = Arc::new(next);
        self.scheduler.clear();
        let snapshot = self.current();
        let now = self.clock.now_ms();
        let push = if self.config.mode == SyncMode::LocalOnly {
            StartupPush::None
        } else if dirty_local && reachable {
            self.scheduler.schedule_now(snapshot, now);
            StartupPush::Immediate
        } else if migrated || source == LayoutSource::Default {
            self.scheduler.schedule(snapshot, now);
            StartupPush::Debounced
        } else {
            StartupPush::None
        };

        if migrated || source != LayoutSource::Local {
            self.persist()?;
        }
        info!(
            "event=layout_init module=sync status=ok source={source:?} migrated={migrated} local_corrupt={local_corrupt} push={push:?} last_modified={}",
            self.layout.last_modified
        );
        Ok(InitOutcome {
            source,
            migrated,
            local_corrupt,
            push,
        })
    }

    /// Fetches the server copy and blueprint through `client`/`blueprints`,
    /// then runs `initialize`.
    pub fn bootstrap(
        &mut self,
        client: &dyn RemoteLayoutClient,
        blueprints: &dyn BlueprintSource,
        role: Option<&str>,
    ) -> StoreResult<InitOutcome> {
        let (fetch, blueprint) = match self.config.mode {
            SyncMode::LocalOnly => (ServerFetch::Unreachable, role.map(fallback_blueprint)),
            SyncMode::Remote => (
                ServerFetch::from_result(client.fetch_layout()),
                role.map(|role| resolve_blueprint(blueprints, role)),
            ),
        };
        self.initialize(fetch, blueprint.as_ref())
    }

    /// Applies `command`. Returns `Ok(false)` for a no-op.
    ///
    /// On a storage failure the live layout has already advanced and the
    /// push is scheduled; the error is returned for the caller to report.
    pub fn apply(&mut self, command: &LayoutCommand) -> StoreResult<bool> {
        let next = command.apply(&self.layout);
        if next == *self.layout {
            debug!(
                "event=layout_apply module=sync status=skip op={}",
                command.name()
            );
            return Ok(false);
        }
        self.commit(next)?;
        info!(
            "event=layout_apply module=sync status=ok op={} last_modified={}",
            command.name(),
            self.layout.last_modified
        );
        Ok(true)
    }

    /// Replaces the live layout with a migrated default (optionally
    /// overlaid), persists it and drops any pending or in-flight push.
    pub fn reset(&mut self, blueprint: Option<&RoleBlueprint>) -> StoreResult<()> {
        self.scheduler.clear();
        let mut next = self.prepare(&Layout::default_layout(), blueprint);
        let previous = self.layout.last_modified;
        self.stamp(&mut next, previous);
        self.layout = Arc::new(next);
        info!(
            "event=layout_reset module=sync status=ok last_modified={}",
            self.layout.last_modified
        );
        self.persist()
    }

    /// Hands out the due push, if any.
    pub fn poll_push(&mut self) -> Option<PushRequest> {
        if self.config.mode == SyncMode::LocalOnly {
            return None;
        }
        let request = self.scheduler.poll(self.clock.now_ms())?;
        debug!(
            "event=layout_push module=sync status=start ticket={} last_modified={}",
            request.ticket.id(),
            request.ticket.last_modified()
        );
        Some(request)
    }

    /// Records the transport result for `ticket`.
    pub fn complete_push(
        &mut self,
        ticket: PushTicket,
        result: Result<(), RemoteError>,
    ) -> StoreResult<PushAck> {
        if !self.scheduler.complete(ticket) {
            warn!(
                "event=layout_push module=sync status=skip ticket={} reason=unknown_ticket",
                ticket.id()
            );
            return Ok(PushAck::UnknownTicket);
        }
        if let Err(err) = result {
            warn!(
                "event=layout_push module=sync status=error ticket={} error_code={} retryable={} error={}",
                ticket.id(),
                err.code,
                err.retryable,
                err
            );
            return Ok(PushAck::Failed(err));
        }
        if ticket.last_modified() != self.layout.last_modified {
            info!(
                "event=layout_push module=sync status=stale ticket={} acked={} live={}",
                ticket.id(),
                ticket.last_modified(),
                self.layout.last_modified
            );
            return Ok(PushAck::Stale);
        }
        if !self.layout.synced_with_server {
            let mut next = (*self.layout).clone();
            next.synced_with_server = true;
            self.layout = Arc::new(next);
            self.persist()?;
        }
        info!(
            "event=layout_push module=sync status=ok ticket={} last_modified={}",
            ticket.id(),
            ticket.last_modified()
        );
        Ok(PushAck::Synced)
    }

    /// Sends the due push through `client`, if any, and acknowledges it.
    pub fn flush_due(&mut self, client: &dyn RemoteLayoutClient) -> StoreResult<Option<PushAck>> {
        let Some(request) = self.poll_push() else {
            return Ok(None);
        };
        let result = client.push_layout(&request.layout);
        self.complete_push(request.ticket, result).map(Some)
    }

    fn commit(&mut self, mut next: Layout) -> StoreResult<()> {
        let previous = self.layout.last_modified;
        self.stamp(&mut next, previous);
        self.layout = Arc::new(next);
        if self.config.mode == SyncMode::Remote {
            let snapshot = self.current();
            let now = self.clock.now_ms();
            self.scheduler.schedule(snapshot, now);
        }
        self.persist()
    }

    /// Startup migrations, then the blueprint overlay, then profile locks.
    fn prepare(&self, base: &Layout, blueprint: Option<&RoleBlueprint>) -> Layout {
        let mut next = run_startup_migrations(base);
        if let Some(blueprint) = blueprint {
            next = apply_blueprint(&next, blueprint);
        }
        if let Some(access) = &self.access {
            next = lock_services_for_profile(&next, access);
        }
        next
    }

    fn stamp(&self, layout: &mut Layout, previous: i64) {
        layout.last_modified = self.clock.now_ms().max(previous.saturating_add(1));
        layout.synced_with_server = false;
    }

    fn persist(&self) -> StoreResult<()> {
        save_layout(&self.store, &self.config.storage_key, &self.layout).map_err(|err| {
            error!(
                "event=layout_save module=sync status=error error_code=layout_save_failed error={err}"
            );
            err
        })
    }
}
