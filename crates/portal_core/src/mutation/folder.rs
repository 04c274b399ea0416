//! Folder operations.
//!
//! # Invariants
//! - Only `GridItem`s enter folders; folders never nest.
//! - Deleting a folder moves its items back to the page grid first.
//! - An item leaving a folder is re-inserted only when its service is not
//!   already present in a page grid or the dock.

use crate::model::catalog::{default_folder_color, DEFAULT_FOLDER_NAME};
use crate::model::layout::{Folder, GridEntry, GridItem, Layout};
use crate::mutation::{
    append_to_grid, edit_layout, grid_item_index, renumber_entries, renumber_items,
};

/// Appends a new empty folder to page `page_index`.
///
/// Blank names fall back to `DEFAULT_FOLDER_NAME`, a missing or blank color
/// to the palette default.
pub fn create_folder(
    layout: &Layout,
    page_index: usize,
    name: &str,
    color: Option<&str>,
) -> Layout {
    edit_layout(layout, |next| {
        let Some(page) = next.pages.get_mut(page_index) else {
            return false;
        };
        let name = match name.trim() {
            "" => DEFAULT_FOLDER_NAME,
            trimmed => trimmed,
        };
        let color = color
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(default_folder_color());
        let position = page.items.len();
        page.items
            .push(GridEntry::Folder(Folder::new(name, color, position)));
        true
    })
}

/// Renames a folder. Blank or unchanged names are no-ops.
pub fn rename_folder(layout: &Layout, page_index: usize, folder_id: &str, name: &str) -> Layout {
    let name = name.trim();
    edit_layout(layout, |next| {
        let Some(folder) = folder_mut(next, page_index, folder_id) else {
            return false;
        };
        if name.is_empty() || folder.name == name {
            return false;
        }
        folder.name = name.to_string();
        true
    })
}

/// Changes a folder color. Blank or unchanged colors are no-ops.
pub fn change_folder_color(
    layout: &Layout,
    page_index: usize,
    folder_id: &str,
    color: &str,
) -> Layout {
    let color = color.trim();
    edit_layout(layout, |next| {
        let Some(folder) = folder_mut(next, page_index, folder_id) else {
            return false;
        };
        if color.is_empty() || folder.color == color {
            return false;
        }
        folder.color = color.to_string();
        true
    })
}

/// Deletes a folder after moving every contained item back to the grid.
pub fn delete_folder(layout: &Layout, page_index: usize, folder_id: &str) -> Layout {
    edit_layout(layout, |next| {
        let Some(page) = next.pages.get_mut(page_index) else {
            return false;
        };
        let Some(index) = page
            .items
            .iter()
            .position(|entry| entry.is_folder() && entry.id() == folder_id)
        else {
            return false;
        };

        let folder = match page.items.remove(index) {
            GridEntry::Folder(folder) => folder,
            GridEntry::Item(_) => return false,
        };
        for item in folder.items {
            append_to_grid(&mut page.items, item);
        }
        renumber_entries(&mut page.items);
        true
    })
}

/// Moves a grid item into a folder on page `page_index`.
///
/// The item is looked up among the page's top-level entries first, then in
/// the dock, and removed from exactly that container before the folder
/// receives it at `position = len(folder.items)`.
pub fn move_item_to_folder(
    layout: &Layout,
    page_index: usize,
    item_id: &str,
    folder_id: &str,
) -> Layout {
    edit_layout(layout, |next| {
        match next.pages.get(page_index) {
            Some(page) if page.folder(folder_id).is_some() => {}
            _ => return false,
        }

        let item = if let Some(index) = grid_item_index(&next.pages[page_index].items, item_id) {
            let page = &mut next.pages[page_index];
            let item = match page.items.remove(index) {
                GridEntry::Item(item) => item,
                GridEntry::Folder(_) => return false,
            };
            renumber_entries(&mut page.items);
            item
        } else if let Some(index) = next.quick_access.iter().position(|item| item.id == item_id) {
            let item = next.quick_access.remove(index);
            renumber_items(&mut next.quick_access);
            item
        } else {
            return false;
        };

        let Some(folder) = folder_mut(next, page_index, folder_id) else {
            return false;
        };
        let position = folder.items.len();
        folder.items.push(GridItem { position, ..item });
        true
    })
}

/// Removes an item from a folder and returns it to the page grid.
///
/// The freed item gets a new identity. It is dropped instead of re-inserted
/// when its service already sits in a page grid or the dock.
pub fn remove_item_from_folder(
    layout: &Layout,
    page_index: usize,
    folder_id: &str,
    item_id: &str,
) -> Layout {
    edit_layout(layout, |next| {
        let Some(folder) = folder_mut(next, page_index, folder_id) else {
            return false;
        };
        let Some(index) = folder.items.iter().position(|item| item.id == item_id) else {
            return false;
        };
        let removed = folder.items.remove(index);
        renumber_items(&mut folder.items);

        let already_present = next.dock_has_service(&removed.service_id)
            || next
                .pages
                .iter()
                .any(|page| page.grid_has_service(&removed.service_id));
        if !already_present {
            let page = &mut next.pages[page_index];
            let position = page.items.len();
            page.items
                .push(GridEntry::Item(GridItem::new(removed.service_id, position)));
        }
        true
    })
}

fn folder_mut<'a>(layout: &'a mut Layout, page_index: usize, folder_id: &str) -> Option<&'a mut Folder> {
    layout
        .pages
        .get_mut(page_index)?
        .items
        .iter_mut()
        .filter_map(GridEntry::as_folder_mut)
        .find(|folder| folder.id == folder_id)
}

#[cfg(test)]
mod tests {
    use super::{
        change_folder_color, create_folder, delete_folder, move_item_to_folder,
        remove_item_from_folder, rename_folder,
    };
    use crate::model::catalog::{default_folder_color, DEFAULT_FOLDER_NAME};
    use crate::model::layout::{GridItem, Layout};

    fn layout_with_folder() -> (Layout, String) {
        let layout = create_folder(&Layout::default_layout(), 0, "Work", Some("#123456"));
        let folder_id = layout.pages[0]
            .items
            .last()
            .map(|entry| entry.id().to_string())
            .unwrap();
        (layout, folder_id)
    }

    #[test]
    fn create_folder_appends_with_defaults_for_blank_input() {
        let layout = create_folder(&Layout::default_layout(), 0, "   ", None);
        let folder = layout.pages[0].items.last().unwrap().as_folder().unwrap();
        assert_eq!(folder.name, DEFAULT_FOLDER_NAME);
        assert_eq!(folder.color, default_folder_color());
        assert_eq!(folder.position, 16);
        assert!(folder.items.is_empty());
    }

    #[test]
    fn rename_and_recolor_ignore_blank_values() {
        let (layout, folder_id) = layout_with_folder();
        assert_eq!(rename_folder(&layout, 0, &folder_id, "  "), layout);
        assert_eq!(change_folder_color(&layout, 0, &folder_id, ""), layout);

        let renamed = rename_folder(&layout, 0, &folder_id, " Play ");
        assert_eq!(renamed.pages[0].folder(&folder_id).unwrap().name, "Play");
        let recolored = change_folder_color(&renamed, 0, &folder_id, "#abcdef");
        assert_eq!(recolored.pages[0].folder(&folder_id).unwrap().color, "#abcdef");
    }

    #[test]
    fn move_item_to_folder_removes_from_grid_first() {
        let (layout, folder_id) = layout_with_folder();
        let next = move_item_to_folder(&layout, 0, "item-news", &folder_id);

        let folder = next.pages[0].folder(&folder_id).unwrap();
        assert_eq!(folder.items.len(), 1);
        assert_eq!(folder.items[0].service_id, "news");
        assert_eq!(folder.items[0].position, 0);
        assert!(!next.pages[0].grid_has_service("news"));
        assert_eq!(next.item_count(), layout.item_count());
        for (index, entry) in next.pages[0].items.iter().enumerate() {
            assert_eq!(entry.position(), index);
        }
    }

    #[test]
    fn move_item_to_folder_accepts_dock_items() {
        let (mut layout, folder_id) = layout_with_folder();
        layout.pages[0]
            .items
            .retain(|entry| entry.service_id() != Some("calls"));
        layout.quick_access = vec![GridItem::canonical("calls", 0)];

        let next = move_item_to_folder(&layout, 0, "item-calls", &folder_id);
        assert!(next.quick_access.is_empty());
        assert!(next.pages[0].folder(&folder_id).unwrap().contains_service("calls"));
    }

    #[test]
    fn move_folder_into_folder_is_noop() {
        let (layout, first) = layout_with_folder();
        let layout = create_folder(&layout, 0, "Other", None);
        let second = layout.pages[0].items.last().unwrap().id().to_string();
        assert_eq!(move_item_to_folder(&layout, 0, &second, &first), layout);
        assert_eq!(move_item_to_folder(&layout, 0, "item-news", "missing"), layout);
    }

    #[test]
    fn remove_item_from_folder_returns_item_with_new_identity() {
        let (layout, folder_id) = layout_with_folder();
        let layout = move_item_to_folder(&layout, 0, "item-news", &folder_id);
        let layout = move_item_to_folder(&layout, 0, "item-map", &folder_id);

        let next = remove_item_from_folder(&layout, 0, &folder_id, "item-news");
        let folder = next.pages[0].folder(&folder_id).unwrap();
        assert_eq!(folder.items.len(), 1);
        assert_eq!(folder.items[0].position, 0);
        let returned = next.pages[0].items.last().unwrap();
        assert_eq!(returned.service_id(), Some("news"));
        assert_ne!(returned.id(), "item-news");
        assert_eq!(next.item_count(), layout.item_count());
    }

    #[test]
    fn remove_item_from_folder_skips_duplicate_service() {
        let (mut layout, folder_id) = layout_with_folder();
        if let Some(folder) = layout.pages[0]
            .items
            .iter_mut()
            .filter_map(|entry| entry.as_folder_mut())
            .next()
        {
            folder.items.push(GridItem::canonical("chat", 0));
        }
        let next = remove_item_from_folder(&layout, 0, &folder_id, "item-chat");
        assert!(next.pages[0].folder(&folder_id).unwrap().items.is_empty());
        assert_eq!(next.pages[0].items.len(), layout.pages[0].items.len());
    }

    #[test]
    fn delete_folder_moves_contents_back_to_grid() {
        let (layout, folder_id) = layout_with_folder();
        let layout = move_item_to_folder(&layout, 0, "item-news", &folder_id);
        let layout = move_item_to_folder(&layout, 0, "item-map", &folder_id);

        let next = delete_folder(&layout, 0, &folder_id);
        assert!(next.pages[0].folder(&folder_id).is_none());
        assert_eq!(next.item_count(), layout.item_count());
        assert!(next.pages[0].grid_has_service("news"));
        assert!(next.pages[0].grid_has_service("map"));
        for (index, entry) in next.pages[0].items.iter().enumerate() {
            assert_eq!(entry.position(), index);
        }
        assert_eq!(delete_folder(&next, 0, &folder_id), next);
    }
}
