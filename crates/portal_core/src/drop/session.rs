//! Per-drag measurement state.
//!
//! # Responsibility
//! - Snapshot the dragged entry and the candidates it may land on when the
//!   drag starts.
//! - Collect asynchronous box measurements and report completion.
//! - Resolve exactly once, only after every measurement arrived.
//!
//! # Invariants
//! - A session measures only its own candidates; unknown ids are ignored.
//! - A zero-size box is stored as a missing measurement.
//! - `resolve` returns `None` while any measurement is outstanding.
//! - Indices are only meaningful against the layout revision the session
//!   began on; see `is_stale`.

use crate::drop::geometry::{Point, Rect};
use crate::drop::resolver::{
    resolve_drop, DragOrigin, DragSubject, DropCandidate, DropConfig, DropDecision, DropInput,
    EntryKind,
};
use crate::model::layout::{EntryId, GridEntry, Layout};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Something the host still has to measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", content = "id", rename_all = "snake_case")]
pub enum MeasurementTarget {
    Dock,
    Entry(EntryId),
}

/// In-progress drag on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    page_index: usize,
    base_modified: i64,
    subject: DragSubject,
    candidates: Vec<DropCandidate>,
    measurements: BTreeMap<EntryId, Option<Rect>>,
    needs_dock: bool,
    dock: Option<Option<Rect>>,
}

impl DragSession {
    /// Starts a drag of `moving_id` on page `page_index`.
    ///
    /// Returns `None` when the id is not a top-level entry or widget of the
    /// page, nor a dock item.
    pub fn begin(layout: &Layout, page_index: usize, moving_id: &str) -> Option<Self> {
        let page = layout.page(page_index)?;

        if let Some(slot) = layout
            .quick_access
            .iter()
            .position(|item| item.id == moving_id)
        {
            return Some(Self::new(
                layout,
                page_index,
                DragSubject {
                    id: moving_id.to_string(),
                    kind: EntryKind::Item,
                    origin: DragOrigin::Dock,
                    index: slot,
                },
                Vec::new(),
                true,
            ));
        }

        if let Some(index) = page.entry_index(moving_id) {
            let kind = entry_kind(&page.items[index]);
            let candidates = page
                .items
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.id() != moving_id)
                .map(|(index, entry)| DropCandidate {
                    id: entry.id().to_string(),
                    kind: entry_kind(entry),
                    index,
                })
                .collect();
            return Some(Self::new(
                layout,
                page_index,
                DragSubject {
                    id: moving_id.to_string(),
                    kind,
                    origin: DragOrigin::Grid,
                    index,
                },
                candidates,
                kind == EntryKind::Item,
            ));
        }

        let index = page.widget_index(moving_id)?;
        let candidates = page
            .widgets
            .iter()
            .enumerate()
            .filter(|(_, widget)| widget.id != moving_id)
            .map(|(index, widget)| DropCandidate {
                id: widget.id.clone(),
                kind: EntryKind::Widget,
                index,
            })
            .collect();
        Some(Self::new(
            layout,
            page_index,
            DragSubject {
                id: moving_id.to_string(),
                kind: EntryKind::Widget,
                origin: DragOrigin::Widgets,
                index,
            },
            candidates,
            false,
        ))
    }

    fn new(
        layout: &Layout,
        page_index: usize,
        subject: DragSubject,
        candidates: Vec<DropCandidate>,
        needs_dock: bool,
    ) -> Self {
        Self {
            page_index,
            base_modified: layout.last_modified,
            subject,
            candidates,
            measurements: BTreeMap::new(),
            needs_dock,
            dock: None,
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// `lastModified` of the layout the session was built from.
    pub fn base_modified(&self) -> i64 {
        self.base_modified
    }

    /// True once `layout` is a later revision than the one the drag began
    /// on. Every effective edit stamps a strictly larger `lastModified`.
    pub fn is_stale(&self, layout: &Layout) -> bool {
        layout.last_modified != self.base_modified
    }

    pub fn subject(&self) -> &DragSubject {
        &self.subject
    }

    pub fn candidates(&self) -> &[DropCandidate] {
        &self.candidates
    }

    /// Records the box of candidate `id`. Returns `false` for ids outside
    /// this session.
    pub fn record(&mut self, id: &str, rect: Option<Rect>) -> bool {
        if !self.candidates.iter().any(|candidate| candidate.id == id) {
            return false;
        }
        self.measurements
            .insert(id.to_string(), rect.filter(|rect| !rect.is_empty()));
        true
    }

    /// Records the dock box. Ignored for drags that never test the dock.
    pub fn record_dock(&mut self, rect: Option<Rect>) -> bool {
        if !self.needs_dock {
            return false;
        }
        self.dock = Some(rect.filter(|rect| !rect.is_empty()));
        true
    }

    /// Measurements the host has not delivered yet, dock first.
    pub fn pending(&self) -> Vec<MeasurementTarget> {
        let mut pending = Vec::new();
        if self.needs_dock && self.dock.is_none() {
            pending.push(MeasurementTarget::Dock);
        }
        pending.extend(
            self.candidates
                .iter()
                .filter(|candidate| !self.measurements.contains_key(&candidate.id))
                .map(|candidate| MeasurementTarget::Entry(candidate.id.clone())),
        );
        pending
    }

    pub fn remaining(&self) -> usize {
        let dock = usize::from(self.needs_dock && self.dock.is_none());
        dock + self.candidates.len() - self.measurements.len()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Decision for a release at `point`, or `None` while measurements are
    /// outstanding.
    pub fn resolve(&self, point: Point, config: &DropConfig) -> Option<DropDecision> {
        if !self.is_complete() {
            return None;
        }
        let input = DropInput {
            subject: &self.subject,
            candidates: &self.candidates,
            measurements: &self.measurements,
            dock: self.dock.flatten(),
        };
        Some(resolve_drop(&input, point, config))
    }
}

fn entry_kind(entry: &GridEntry) -> EntryKind {
    if entry.is_folder() {
        EntryKind::Folder
    } else {
        EntryKind::Item
    }
}
