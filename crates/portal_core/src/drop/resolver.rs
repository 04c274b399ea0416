//! Pure drop decision function.
//!
//! # Responsibility
//! - Turn a completed set of measurements plus a release point into exactly
//!   one structural decision.
//!
//! # Invariants
//! - Precedence: dock insertion, dock eviction, overlap (absorb/reorder),
//!   spring back.
//! - Folders and widgets are never dockable.
//! - Missing or empty boxes never overlap and never raise errors.
//! - Candidates are scanned in container order, so the outcome does not
//!   depend on measurement completion order.

use crate::drop::geometry::{Point, Rect};
use crate::model::layout::{EntryId, QUICK_ACCESS_CAPACITY};
use crate::mutation::command::LayoutCommand;
use crate::mutation::dock::QuickAccessTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Margin added around the dock box before testing the release point.
pub const DEFAULT_DOCK_MARGIN: f64 = 20.0;
/// Hit slop added around every candidate box.
pub const DEFAULT_HIT_SLOP: f64 = 50.0;

/// Rule for choosing among several overlapping candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First overlapping candidate in container iteration order.
    #[default]
    FirstInContainerOrder,
    /// Candidate whose box center is closest to the release point; equal
    /// distances fall back to container order.
    NearestCenter,
}

/// Hit-testing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropConfig {
    pub dock_margin: f64,
    pub hit_slop: f64,
    pub tie_break: TieBreak,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            dock_margin: DEFAULT_DOCK_MARGIN,
            hit_slop: DEFAULT_HIT_SLOP,
            tie_break: TieBreak::default(),
        }
    }
}

/// Kind of a dragged entry or a drop candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Item,
    Folder,
    Widget,
}

/// Container the dragged entry started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragOrigin {
    Grid,
    Dock,
    Widgets,
}

/// The entry being dragged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSubject {
    pub id: EntryId,
    pub kind: EntryKind,
    pub origin: DragOrigin,
    /// Index inside the origin container.
    pub index: usize,
}

/// Another entry of the same kind and container that the subject may land on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropCandidate {
    pub id: EntryId,
    pub kind: EntryKind,
    pub index: usize,
}

/// Outcome of one drag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DropDecision {
    DockInsert { item_id: EntryId, slot: usize },
    DockEvict { item_id: EntryId },
    Absorb { item_id: EntryId, folder_id: EntryId },
    ReorderGrid { from: usize, to: usize },
    ReorderWidgets { from: usize, to: usize },
    /// No target; the host animates the entry back. Not a mutation.
    SpringBack,
}

impl DropDecision {
    /// Mutation command for page `page`, or `None` for `SpringBack`.
    pub fn to_command(&self, page: usize) -> Option<LayoutCommand> {
        match self {
            Self::DockInsert { item_id, slot } => Some(LayoutCommand::MoveItemToQuickAccess {
                page,
                item_id: item_id.clone(),
                target: QuickAccessTarget::Slot(*slot),
            }),
            Self::DockEvict { item_id } => Some(LayoutCommand::MoveItemToQuickAccess {
                page,
                item_id: item_id.clone(),
                target: QuickAccessTarget::ReturnToGrid,
            }),
            Self::Absorb { item_id, folder_id } => Some(LayoutCommand::MoveItemToFolder {
                page,
                item_id: item_id.clone(),
                folder_id: folder_id.clone(),
            }),
            Self::ReorderGrid { from, to } => Some(LayoutCommand::ReorderGridItems {
                page,
                from: *from,
                to: *to,
            }),
            Self::ReorderWidgets { from, to } => Some(LayoutCommand::ReorderWidgets {
                page,
                from: *from,
                to: *to,
            }),
            Self::SpringBack => None,
        }
    }
}

/// Everything the decision depends on, gathered by a drag session.
#[derive(Debug, Clone, Copy)]
pub struct DropInput<'a> {
    pub subject: &'a DragSubject,
    pub candidates: &'a [DropCandidate],
    pub measurements: &'a BTreeMap<EntryId, Option<Rect>>,
    pub dock: Option<Rect>,
}

/// Dock slot under `x`: `clamp(floor((x - left) / (width / 3)), 0, 2)`.
pub fn dock_slot(dock: &Rect, x: f64) -> usize {
    let slot_width = dock.width / QUICK_ACCESS_CAPACITY as f64;
    let raw = ((x - dock.x) / slot_width).floor();
    if raw.is_nan() || raw < 0.0 {
        0
    } else {
        (raw as usize).min(QUICK_ACCESS_CAPACITY - 1)
    }
}

/// Decides the single outcome of a drag released at `point`.
pub fn resolve_drop(input: &DropInput<'_>, point: Point, config: &DropConfig) -> DropDecision {
    let subject = input.subject;
    let dock = input.dock.filter(|rect| !rect.is_empty());
    let over_dock = dock
        .map(|rect| rect.expand(config.dock_margin).contains(point))
        .unwrap_or(false);

    if subject.kind == EntryKind::Item && over_dock {
        if let Some(rect) = dock {
            return DropDecision::DockInsert {
                item_id: subject.id.clone(),
                slot: dock_slot(&rect, point.x),
            };
        }
    }
    if subject.origin == DragOrigin::Dock {
        return DropDecision::DockEvict {
            item_id: subject.id.clone(),
        };
    }

    let Some(target) = find_target(input, point, config) else {
        return DropDecision::SpringBack;
    };

    match (subject.kind, target.kind) {
        (EntryKind::Item, EntryKind::Folder) => DropDecision::Absorb {
            item_id: subject.id.clone(),
            folder_id: target.id.clone(),
        },
        (EntryKind::Widget, EntryKind::Widget) => DropDecision::ReorderWidgets {
            from: subject.index,
            to: target.index,
        },
        (EntryKind::Item | EntryKind::Folder, EntryKind::Item | EntryKind::Folder) => {
            DropDecision::ReorderGrid {
                from: subject.index,
                to: target.index,
            }
        }
        _ => DropDecision::SpringBack,
    }
}

fn find_target<'a>(
    input: &DropInput<'a>,
    point: Point,
    config: &DropConfig,
) -> Option<&'a DropCandidate> {
    let overlapping = input.candidates.iter().filter_map(|candidate| {
        if candidate.id == input.subject.id {
            return None;
        }
        let rect = input.measurements.get(&candidate.id).copied().flatten()?;
        if rect.is_empty() || !rect.expand(config.hit_slop).contains(point) {
            return None;
        }
        Some((candidate, rect))
    });

    match config.tie_break {
        TieBreak::FirstInContainerOrder => overlapping.map(|(candidate, _)| candidate).next(),
        TieBreak::NearestCenter => overlapping
            .fold(None, |best: Option<(&DropCandidate, f64)>, (candidate, rect)| {
                let distance = rect.center().distance_squared(point);
                match best {
                    Some((_, best_distance)) if best_distance <= distance => best,
                    _ => Some((candidate, distance)),
                }
            })
            .map(|(candidate, _)| candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        dock_slot, resolve_drop, DragOrigin, DragSubject, DropCandidate, DropConfig,
        DropDecision, DropInput, EntryKind, TieBreak,
    };
    use crate::drop::geometry::{Point, Rect};
    use std::collections::BTreeMap;

    fn subject(kind: EntryKind, origin: DragOrigin, index: usize) -> DragSubject {
        DragSubject {
            id: "mover".to_string(),
            kind,
            origin,
            index,
        }
    }

    fn candidate(id: &str, kind: EntryKind, index: usize) -> DropCandidate {
        DropCandidate {
            id: id.to_string(),
            kind,
            index,
        }
    }

    #[test]
    fn dock_slot_clamps_to_three_slots() {
        let dock = Rect::new(100.0, 500.0, 300.0, 80.0);
        assert_eq!(dock_slot(&dock, 80.0), 0);
        assert_eq!(dock_slot(&dock, 150.0), 0);
        assert_eq!(dock_slot(&dock, 250.0), 1);
        assert_eq!(dock_slot(&dock, 399.0), 2);
        assert_eq!(dock_slot(&dock, 420.0), 2);
    }

    #[test]
    fn grid_item_over_dock_inserts_but_folder_does_not() {
        let measurements = BTreeMap::new();
        let dock = Some(Rect::new(0.0, 600.0, 300.0, 80.0));
        let item = subject(EntryKind::Item, DragOrigin::Grid, 3);
        let input = DropInput {
            subject: &item,
            candidates: &[],
            measurements: &measurements,
            dock,
        };
        assert_eq!(
            resolve_drop(&input, Point::new(250.0, 590.0), &DropConfig::default()),
            DropDecision::DockInsert {
                item_id: "mover".to_string(),
                slot: 2
            }
        );

        let folder = subject(EntryKind::Folder, DragOrigin::Grid, 3);
        let input = DropInput {
            subject: &folder,
            ..input
        };
        assert_eq!(
            resolve_drop(&input, Point::new(250.0, 590.0), &DropConfig::default()),
            DropDecision::SpringBack
        );
    }

    #[test]
    fn dock_item_released_outside_dock_is_evicted() {
        let measurements = BTreeMap::new();
        let item = subject(EntryKind::Item, DragOrigin::Dock, 0);
        let input = DropInput {
            subject: &item,
            candidates: &[],
            measurements: &measurements,
            dock: Some(Rect::new(0.0, 600.0, 300.0, 80.0)),
        };
        assert_eq!(
            resolve_drop(&input, Point::new(100.0, 100.0), &DropConfig::default()),
            DropDecision::DockEvict {
                item_id: "mover".to_string()
            }
        );
    }

    #[test]
    fn item_over_folder_is_absorbed_and_over_item_reorders() {
        let candidates = vec![
            candidate("a", EntryKind::Item, 0),
            candidate("f", EntryKind::Folder, 1),
        ];
        let mut measurements = BTreeMap::new();
        measurements.insert("a".to_string(), Some(Rect::new(0.0, 0.0, 60.0, 60.0)));
        measurements.insert("f".to_string(), Some(Rect::new(400.0, 0.0, 60.0, 60.0)));
        let item = subject(EntryKind::Item, DragOrigin::Grid, 2);
        let input = DropInput {
            subject: &item,
            candidates: &candidates,
            measurements: &measurements,
            dock: None,
        };

        assert_eq!(
            resolve_drop(&input, Point::new(430.0, 30.0), &DropConfig::default()),
            DropDecision::Absorb {
                item_id: "mover".to_string(),
                folder_id: "f".to_string()
            }
        );
        assert_eq!(
            resolve_drop(&input, Point::new(30.0, 30.0), &DropConfig::default()),
            DropDecision::ReorderGrid { from: 2, to: 0 }
        );
        assert_eq!(
            resolve_drop(&input, Point::new(250.0, 300.0), &DropConfig::default()),
            DropDecision::SpringBack
        );
    }

    #[test]
    fn empty_measurements_never_overlap() {
        let candidates = vec![candidate("a", EntryKind::Item, 0)];
        let mut measurements = BTreeMap::new();
        measurements.insert("a".to_string(), Some(Rect::new(0.0, 0.0, 0.0, 0.0)));
        let item = subject(EntryKind::Item, DragOrigin::Grid, 1);
        let input = DropInput {
            subject: &item,
            candidates: &candidates,
            measurements: &measurements,
            dock: None,
        };
        assert_eq!(
            resolve_drop(&input, Point::new(0.0, 0.0), &DropConfig::default()),
            DropDecision::SpringBack
        );
    }

    #[test]
    fn tie_break_policies_pick_different_adjacent_cells() {
        let candidates = vec![
            candidate("left", EntryKind::Item, 0),
            candidate("right", EntryKind::Item, 1),
        ];
        let mut measurements = BTreeMap::new();
        measurements.insert("left".to_string(), Some(Rect::new(0.0, 0.0, 60.0, 60.0)));
        measurements.insert("right".to_string(), Some(Rect::new(70.0, 0.0, 60.0, 60.0)));
        let item = subject(EntryKind::Item, DragOrigin::Grid, 5);
        let input = DropInput {
            subject: &item,
            candidates: &candidates,
            measurements: &measurements,
            dock: None,
        };
        let point = Point::new(90.0, 30.0);

        let first = DropConfig::default();
        assert_eq!(
            resolve_drop(&input, point, &first),
            DropDecision::ReorderGrid { from: 5, to: 0 }
        );
        let nearest = DropConfig {
            tie_break: TieBreak::NearestCenter,
            ..DropConfig::default()
        };
        assert_eq!(
            resolve_drop(&input, point, &nearest),
            DropDecision::ReorderGrid { from: 5, to: 1 }
        );
    }

    #[test]
    fn spring_back_has_no_command() {
        assert!(DropDecision::SpringBack.to_command(0).is_none());
        assert!(DropDecision::ReorderGrid { from: 0, to: 1 }
            .to_command(0)
            .is_some());
    }
}
