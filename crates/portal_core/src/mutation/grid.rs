//! Page grid and display-setting operations.

use crate::model::layout::{IconSize, Layout, GRID_COLUMNS_RANGE};
use crate::mutation::{edit_layout, grid_item_index, renumber_entries, splice};

/// Moves the entry at `from_index` to `to_index` within one page grid and
/// renumbers every position.
pub fn reorder_grid_items(
    layout: &Layout,
    page_index: usize,
    from_index: usize,
    to_index: usize,
) -> Layout {
    edit_layout(layout, |next| {
        let Some(page) = next.pages.get_mut(page_index) else {
            return false;
        };
        if !splice(&mut page.items, from_index, to_index) {
            return false;
        }
        renumber_entries(&mut page.items);
        true
    })
}

/// Removes a top-level grid item. Folders are left alone; use
/// `delete_folder` so folder contents are never destroyed.
pub fn delete_grid_item(layout: &Layout, page_index: usize, item_id: &str) -> Layout {
    edit_layout(layout, |next| {
        let Some(page) = next.pages.get_mut(page_index) else {
            return false;
        };
        let Some(index) = grid_item_index(&page.items, item_id) else {
            return false;
        };
        page.items.remove(index);
        renumber_entries(&mut page.items);
        true
    })
}

/// Sets the grid column count. Values outside `GRID_COLUMNS_RANGE` are
/// ignored.
pub fn set_grid_columns(layout: &Layout, columns: u8) -> Layout {
    edit_layout(layout, |next| {
        if !GRID_COLUMNS_RANGE.contains(&columns) || next.grid_columns == columns {
            return false;
        }
        next.grid_columns = columns;
        true
    })
}

pub fn set_icon_size(layout: &Layout, size: IconSize) -> Layout {
    edit_layout(layout, |next| {
        if next.icon_size == size {
            return false;
        }
        next.icon_size = size;
        true
    })
}
