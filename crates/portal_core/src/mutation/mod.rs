//! Mutation algebra over the layout aggregate.
//!
//! # Responsibility
//! - Provide pure `(&Layout, args) -> Layout` edit operations.
//! - Keep every operation total: stale ids, out-of-range indices and full
//!   docks resolve to "return the input unchanged".
//!
//! # Invariants
//! - Inputs are never mutated; each operation edits a private copy and
//!   discards it when the edit does not apply.
//! - Items leaving a container are removed before the destination receives
//!   them, so a service never occupies two containers.
//! - Positions inside every touched container are renumbered densely,
//!   except dock positions, which are slot addresses.

pub mod command;
pub mod dock;
pub mod folder;
pub mod grid;
pub mod page;
pub mod widget;

use crate::model::layout::{GridEntry, GridItem, Layout, Widget};

/// Applies `edit` to a copy of `layout`.
///
/// Returns the edited copy when `edit` reports success, otherwise an
/// unchanged clone of the input, so half-applied edits never escape.
pub(crate) fn edit_layout(layout: &Layout, edit: impl FnOnce(&mut Layout) -> bool) -> Layout {
    let mut next = layout.clone();
    if edit(&mut next) {
        next
    } else {
        layout.clone()
    }
}

pub(crate) fn renumber_entries(entries: &mut [GridEntry]) {
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.set_position(index);
    }
}

pub(crate) fn renumber_items(items: &mut [GridItem]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.position = index;
    }
}

pub(crate) fn renumber_widgets(widgets: &mut [Widget]) {
    for (index, widget) in widgets.iter_mut().enumerate() {
        widget.position = index;
    }
}

/// Moves `list[from]` to index `to`. Returns `false` for out-of-range or
/// identical indices.
pub(crate) fn splice<T>(list: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= list.len() || to >= list.len() || from == to {
        return false;
    }
    let moved = list.remove(from);
    list.insert(to, moved);
    true
}

/// Index of a top-level `GridItem` (not a folder) with `item_id`.
pub(crate) fn grid_item_index(entries: &[GridEntry], item_id: &str) -> Option<usize> {
    entries
        .iter()
        .position(|entry| matches!(entry, GridEntry::Item(item) if item.id == item_id))
}

/// Appends `item` to the end of a page grid with a fresh position.
pub(crate) fn append_to_grid(entries: &mut Vec<GridEntry>, item: GridItem) {
    let position = entries.len();
    entries.push(GridEntry::Item(GridItem { position, ..item }));
}
