//! Page management operations.
//!
//! # Invariants
//! - A layout always keeps at least one page.
//! - Page `order` equals the page index after every operation.
//! - Grid entries of a deleted page move to a neighbouring page.

use crate::model::layout::{Layout, Page};
use crate::mutation::{edit_layout, renumber_entries};

/// Appends an empty page. Callers switch the active page to the new last
/// index.
pub fn add_new_page(layout: &Layout) -> Layout {
    edit_layout(layout, |next| {
        let order = next.pages.len();
        next.pages.push(Page::new(order));
        true
    })
}

/// Deletes page `page_index`. Deleting the last remaining page, or an index
/// out of range, is a no-op.
///
/// Items and folders of the deleted page are appended to the previous page
/// (the new first page when page 0 is deleted); its widgets are dropped.
pub fn delete_page(layout: &Layout, page_index: usize) -> Layout {
    edit_layout(layout, |next| {
        if next.pages.len() <= 1 || page_index >= next.pages.len() {
            return false;
        }
        let removed = next.pages.remove(page_index);
        let heir = &mut next.pages[page_index.saturating_sub(1)];
        heir.items.extend(removed.items);
        renumber_entries(&mut heir.items);
        for (order, page) in next.pages.iter_mut().enumerate() {
            page.order = order;
        }
        true
    })
}
