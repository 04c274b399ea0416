//! Per-session portal facade.
//!
//! # Responsibility
//! - Track the active page and route page-scoped edits to it.
//! - Own at most one drag session and resolve it exactly once.
//! - Forward every effective edit to the sync controller.
//!
//! # Invariants
//! - The active page index is always a valid page index.
//! - A finished drag is consumed; later measurements for it are ignored.
//! - A drag that began on an older layout revision never applies.

use crate::blueprint::RoleBlueprint;
use crate::drop::geometry::{Point, Rect};
use crate::drop::resolver::{DropConfig, DropDecision};
use crate::drop::session::{DragSession, MeasurementTarget};
use crate::model::layout::{IconSize, Layout, WidgetSize, WidgetType};
use crate::mutation::command::LayoutCommand;
use crate::mutation::dock::QuickAccessTarget;
use crate::repo::layout_store::{LayoutStore, StoreResult};
use crate::sync::clock::Clock;
use crate::sync::controller::SyncController;
use log::{debug, info};
use std::sync::Arc;

/// Result of `finish_drag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// No drag was in progress.
    NoSession,
    /// Measurements are still outstanding; the drag stays active.
    Incomplete { remaining: usize },
    /// The layout changed after the drag began; the drag is dropped and
    /// nothing is applied.
    Stale,
    /// The drag was resolved; `applied` is false for spring-back and no-op
    /// decisions.
    Resolved {
        decision: DropDecision,
        applied: bool,
    },
}

pub struct PortalService<S: LayoutStore, C: Clock> {
    controller: SyncController<S, C>,
    current_page: usize,
    drag: Option<DragSession>,
    drop_config: DropConfig,
}

impl<S: LayoutStore, C: Clock> PortalService<S, C> {
    pub fn new(controller: SyncController<S, C>, drop_config: DropConfig) -> Self {
        Self {
            controller,
            current_page: 0,
            drag: None,
            drop_config,
        }
    }

    pub fn controller(&self) -> &SyncController<S, C> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut SyncController<S, C> {
        &mut self.controller
    }

    pub fn layout(&self) -> Arc<Layout> {
        self.controller.current()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn drop_config(&self) -> &DropConfig {
        &self.drop_config
    }

    /// Switches the active page. Out-of-range indices are rejected.
    pub fn set_current_page(&mut self, page_index: usize) -> bool {
        if page_index >= self.layout().pages.len() {
            return false;
        }
        self.current_page = page_index;
        true
    }

    /// Applies `command` and keeps the active page valid.
    pub fn apply(&mut self, command: &LayoutCommand) -> StoreResult<bool> {
        let result = self.controller.apply(command);
        let page_count = self.layout().pages.len();
        if matches!(command, LayoutCommand::AddNewPage) && matches!(result, Ok(true)) {
            self.current_page = page_count.saturating_sub(1);
        }
        self.current_page = self.current_page.min(page_count.saturating_sub(1));
        result
    }

    pub fn create_folder(&mut self, name: &str, color: Option<&str>) -> StoreResult<bool> {
        self.apply(&LayoutCommand::CreateFolder {
            page: self.current_page,
            name: name.to_string(),
            color: color.map(str::to_string),
        })
    }

    pub fn rename_folder(&mut self, folder_id: &str, name: &str) -> StoreResult<bool> {
        self.apply(&LayoutCommand::RenameFolder {
            page: self.current_page,
            folder_id: folder_id.to_string(),
            name: name.to_string(),
        })
    }

    pub fn change_folder_color(&mut self, folder_id: &str, color: &str) -> StoreResult<bool> {
        self.apply(&LayoutCommand::ChangeFolderColor {
            page: self.current_page,
            folder_id: folder_id.to_string(),
            color: color.to_string(),
        })
    }

    pub fn delete_folder(&mut self, folder_id: &str) -> StoreResult<bool> {
        self.apply(&LayoutCommand::DeleteFolder {
            page: self.current_page,
            folder_id: folder_id.to_string(),
        })
    }

    pub fn move_item_to_folder(&mut self, item_id: &str, folder_id: &str) -> StoreResult<bool> {
        self.apply(&LayoutCommand::MoveItemToFolder {
            page: self.current_page,
            item_id: item_id.to_string(),
            folder_id: folder_id.to_string(),
        })
    }

    pub fn move_item_to_quick_access(
        &mut self,
        item_id: &str,
        target: QuickAccessTarget,
    ) -> StoreResult<bool> {
        self.apply(&LayoutCommand::MoveItemToQuickAccess {
            page: self.current_page,
            item_id: item_id.to_string(),
            target,
        })
    }

    pub fn remove_item_from_folder(&mut self, folder_id: &str, item_id: &str) -> StoreResult<bool> {
        self.apply(&LayoutCommand::RemoveItemFromFolder {
            page: self.current_page,
            folder_id: folder_id.to_string(),
            item_id: item_id.to_string(),
        })
    }

    pub fn reorder_grid_items(&mut self, from: usize, to: usize) -> StoreResult<bool> {
        self.apply(&LayoutCommand::ReorderGridItems {
            page: self.current_page,
            from,
            to,
        })
    }

    pub fn delete_grid_item(&mut self, item_id: &str) -> StoreResult<bool> {
        self.apply(&LayoutCommand::DeleteGridItem {
            page: self.current_page,
            item_id: item_id.to_string(),
        })
    }

    pub fn add_widget(&mut self, kind: WidgetType, size: WidgetSize) -> StoreResult<bool> {
        self.apply(&LayoutCommand::AddWidget {
            page: self.current_page,
            kind,
            size,
        })
    }

    pub fn remove_widget(&mut self, widget_id: &str) -> StoreResult<bool> {
        self.apply(&LayoutCommand::RemoveWidget {
            page: self.current_page,
            widget_id: widget_id.to_string(),
        })
    }

    pub fn reorder_widgets(&mut self, from: usize, to: usize) -> StoreResult<bool> {
        self.apply(&LayoutCommand::ReorderWidgets {
            page: self.current_page,
            from,
            to,
        })
    }

    /// Appends a page and makes it active.
    pub fn add_new_page(&mut self) -> StoreResult<bool> {
        self.apply(&LayoutCommand::AddNewPage)
    }

    pub fn delete_page(&mut self, page_index: usize) -> StoreResult<bool> {
        self.apply(&LayoutCommand::DeletePage { page: page_index })
    }

    pub fn set_grid_columns(&mut self, columns: u8) -> StoreResult<bool> {
        self.apply(&LayoutCommand::SetGridColumns { columns })
    }

    pub fn set_icon_size(&mut self, size: IconSize) -> StoreResult<bool> {
        self.apply(&LayoutCommand::SetIconSize { size })
    }

    /// Starts a drag of `moving_id` on the active page and returns what the
    /// host must measure. Replaces any unfinished drag.
    pub fn begin_drag(&mut self, moving_id: &str) -> Option<Vec<MeasurementTarget>> {
        if self.drag.take().is_some() {
            debug!("event=drag_begin module=service status=skip reason=replaced_unfinished");
        }
        let layout = self.layout();
        let session = DragSession::begin(&layout, self.current_page, moving_id)?;
        let pending = session.pending();
        debug!(
            "event=drag_begin module=service status=ok page={} pending={}",
            self.current_page,
            pending.len()
        );
        self.drag = Some(session);
        Some(pending)
    }

    /// Records a candidate box. Returns `false` without an active drag or
    /// for ids outside it.
    pub fn record_measurement(&mut self, id: &str, rect: Option<Rect>) -> bool {
        self.drag
            .as_mut()
            .map_or(false, |session| session.record(id, rect))
    }

    pub fn record_dock(&mut self, rect: Option<Rect>) -> bool {
        self.drag
            .as_mut()
            .map_or(false, |session| session.record_dock(rect))
    }

    /// Measurements still outstanding for the active drag.
    pub fn drag_pending(&self) -> Vec<MeasurementTarget> {
        self.drag
            .as_ref()
            .map(DragSession::pending)
            .unwrap_or_default()
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Resolves the active drag at `point` and applies the decision.
    pub fn finish_drag(&mut self, point: Point) -> StoreResult<DragOutcome> {
        let Some(session) = self.drag.take() else {
            return Ok(DragOutcome::NoSession);
        };
        if session.is_stale(&self.layout()) {
            info!(
                "event=drag_finish module=service status=skip reason=stale_layout base_modified={}",
                session.base_modified()
            );
            return Ok(DragOutcome::Stale);
        }
        let Some(decision) = session.resolve(point, &self.drop_config) else {
            let remaining = session.remaining();
            self.drag = Some(session);
            return Ok(DragOutcome::Incomplete { remaining });
        };
        let applied = match decision.to_command(session.page_index()) {
            Some(command) => self.apply(&command)?,
            None => false,
        };
        info!(
            "event=drag_finish module=service status=ok decision={decision:?} applied={applied}"
        );
        Ok(DragOutcome::Resolved { decision, applied })
    }

    /// Logout or role change: resets the layout and session state.
    pub fn reset(&mut self, blueprint: Option<&RoleBlueprint>) -> StoreResult<()> {
        self.drag = None;
        self.current_page = 0;
        self.controller.reset(blueprint)
    }
}
