//! Quick-access dock operations.
//!
//! # Invariants
//! - The dock never holds more than `QUICK_ACCESS_CAPACITY` items.
//! - Dock items are kept sorted by slot; slots are unique.
//! - A full dock only accepts a grid item by evicting the slot occupant back
//!   to the page grid.

use crate::model::layout::{GridEntry, GridItem, Layout, QUICK_ACCESS_CAPACITY};
use crate::mutation::{append_to_grid, edit_layout, grid_item_index, renumber_entries, renumber_items};
use serde::{Deserialize, Serialize};

/// Destination of a dock move.
///
/// Serialized as an integer: `-1` (or any negative) returns the item to the
/// grid, `0..3` addresses a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum QuickAccessTarget {
    Slot(usize),
    ReturnToGrid,
}

impl From<i64> for QuickAccessTarget {
    fn from(value: i64) -> Self {
        if value < 0 {
            Self::ReturnToGrid
        } else {
            Self::Slot(value as usize)
        }
    }
}

impl From<QuickAccessTarget> for i64 {
    fn from(value: QuickAccessTarget) -> Self {
        match value {
            QuickAccessTarget::Slot(slot) => slot as i64,
            QuickAccessTarget::ReturnToGrid => -1,
        }
    }
}

/// Moves an item into a dock slot or back to the page grid.
///
/// - `ReturnToGrid`: the dock item is removed, remaining dock positions are
///   renumbered and the item is appended to page `page_index`.
/// - `Slot(n)` from the grid: free slot takes the mover; an occupied slot
///   shifts its occupant to the lowest free slot, or evicts it to the grid
///   when the dock is full.
/// - `Slot(n)` from the dock: swaps positions with the occupant.
pub fn move_item_to_quick_access(
    layout: &Layout,
    page_index: usize,
    item_id: &str,
    target: QuickAccessTarget,
) -> Layout {
    edit_layout(layout, |next| match target {
        QuickAccessTarget::ReturnToGrid => return_to_grid(next, page_index, item_id),
        QuickAccessTarget::Slot(slot) => place_in_slot(next, page_index, item_id, slot),
    })
}

fn return_to_grid(layout: &mut Layout, page_index: usize, item_id: &str) -> bool {
    if page_index >= layout.pages.len() {
        return false;
    }
    let Some(index) = layout
        .quick_access
        .iter()
        .position(|item| item.id == item_id)
    else {
        return false;
    };

    let item = layout.quick_access.remove(index);
    renumber_items(&mut layout.quick_access);
    append_to_grid(&mut layout.pages[page_index].items, item);
    true
}

fn place_in_slot(layout: &mut Layout, page_index: usize, item_id: &str, slot: usize) -> bool {
    if slot >= QUICK_ACCESS_CAPACITY || page_index >= layout.pages.len() {
        return false;
    }

    if let Some(index) = layout
        .quick_access
        .iter()
        .position(|item| item.id == item_id)
    {
        return move_within_dock(&mut layout.quick_access, index, slot);
    }

    let page = &mut layout.pages[page_index];
    let Some(grid_index) = grid_item_index(&page.items, item_id) else {
        return false;
    };

    let occupant = layout
        .quick_access
        .iter()
        .position(|item| item.position == slot);
    let mut evicted = None;
    match occupant {
        None if layout.quick_access.len() >= QUICK_ACCESS_CAPACITY => return false,
        None => {}
        Some(occupant_index) => match lowest_free_slot(&layout.quick_access) {
            Some(free) => layout.quick_access[occupant_index].position = free,
            None => evicted = Some(layout.quick_access.remove(occupant_index)),
        },
    }

    let mover = match page.items.remove(grid_index) {
        GridEntry::Item(item) => item,
        GridEntry::Folder(_) => return false,
    };
    if let Some(evicted) = evicted {
        append_to_grid(&mut page.items, evicted);
    }
    renumber_entries(&mut page.items);

    layout.quick_access.push(GridItem {
        position: slot,
        ..mover
    });
    layout.quick_access.sort_by_key(|item| item.position);
    true
}

fn move_within_dock(dock: &mut [GridItem], index: usize, slot: usize) -> bool {
    let current = dock[index].position;
    if current == slot {
        return false;
    }
    if let Some(occupant) = dock.iter().position(|item| item.position == slot) {
        dock[occupant].position = current;
    }
    dock[index].position = slot;
    dock.sort_by_key(|item| item.position);
    true
}

fn lowest_free_slot(dock: &[GridItem]) -> Option<usize> {
    (0..QUICK_ACCESS_CAPACITY).find(|slot| !dock.iter().any(|item| item.position == *slot))
}
