//! Layout edits expressed as data.
//!
//! # Responsibility
//! - Give hosts one serializable shape for every mutation.
//! - Dispatch each command to its pure mutation function.

use crate::model::layout::{EntryId, IconSize, Layout, WidgetSize, WidgetType};
use crate::mutation::dock::{move_item_to_quick_access, QuickAccessTarget};
use crate::mutation::folder::{
    change_folder_color, create_folder, delete_folder, move_item_to_folder,
    remove_item_from_folder, rename_folder,
};
use crate::mutation::grid::{delete_grid_item, reorder_grid_items, set_grid_columns, set_icon_size};
use crate::mutation::page::{add_new_page, delete_page};
use crate::mutation::widget::{add_widget, remove_widget, reorder_widgets};
use serde::{Deserialize, Serialize};

/// One structural edit. `page` is the index of the page the edit targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LayoutCommand {
    CreateFolder {
        page: usize,
        name: String,
        #[serde(default)]
        color: Option<String>,
    },
    RenameFolder {
        page: usize,
        folder_id: EntryId,
        name: String,
    },
    ChangeFolderColor {
        page: usize,
        folder_id: EntryId,
        color: String,
    },
    DeleteFolder {
        page: usize,
        folder_id: EntryId,
    },
    MoveItemToFolder {
        page: usize,
        item_id: EntryId,
        folder_id: EntryId,
    },
    MoveItemToQuickAccess {
        page: usize,
        item_id: EntryId,
        target: QuickAccessTarget,
    },
    RemoveItemFromFolder {
        page: usize,
        folder_id: EntryId,
        item_id: EntryId,
    },
    ReorderGridItems {
        page: usize,
        from: usize,
        to: usize,
    },
    DeleteGridItem {
        page: usize,
        item_id: EntryId,
    },
    AddWidget {
        page: usize,
        kind: WidgetType,
        size: WidgetSize,
    },
    RemoveWidget {
        page: usize,
        widget_id: EntryId,
    },
    ReorderWidgets {
        page: usize,
        from: usize,
        to: usize,
    },
    AddNewPage,
    DeletePage {
        page: usize,
    },
    SetGridColumns {
        columns: u8,
    },
    SetIconSize {
        size: IconSize,
    },
}

impl LayoutCommand {
    /// Applies the command, returning the input unchanged when it does not
    /// apply.
    pub fn apply(&self, layout: &Layout) -> Layout {
        match self {
            Self::CreateFolder { page, name, color } => {
                create_folder(layout, *page, name, color.as_deref())
            }
            Self::RenameFolder {
                page,
                folder_id,
                name,
            } => rename_folder(layout, *page, folder_id, name),
            Self::ChangeFolderColor {
                page,
                folder_id,
                color,
            } => change_folder_color(layout, *page, folder_id, color),
            Self::DeleteFolder { page, folder_id } => delete_folder(layout, *page, folder_id),
            Self::MoveItemToFolder {
                page,
                item_id,
                folder_id,
            } => move_item_to_folder(layout, *page, item_id, folder_id),
            Self::MoveItemToQuickAccess {
                page,
                item_id,
                target,
            } => move_item_to_quick_access(layout, *page, item_id, *target),
            Self::RemoveItemFromFolder {
                page,
                folder_id,
                item_id,
            } => remove_item_from_folder(layout, *page, folder_id, item_id),
            Self::ReorderGridItems { page, from, to } => {
                reorder_grid_items(layout, *page, *from, *to)
            }
            Self::DeleteGridItem { page, item_id } => delete_grid_item(layout, *page, item_id),
            Self::AddWidget { page, kind, size } => add_widget(layout, *page, *kind, *size),
            Self::RemoveWidget { page, widget_id } => remove_widget(layout, *page, widget_id),
            Self::ReorderWidgets { page, from, to } => reorder_widgets(layout, *page, *from, *to),
            Self::AddNewPage => add_new_page(layout),
            Self::DeletePage { page } => delete_page(layout, *page),
            Self::SetGridColumns { columns } => set_grid_columns(layout, *columns),
            Self::SetIconSize { size } => set_icon_size(layout, *size),
        }
    }

    /// Stable name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateFolder { .. } => "create_folder",
            Self::RenameFolder { .. } => "rename_folder",
            Self::ChangeFolderColor { .. } => "change_folder_color",
            Self::DeleteFolder { .. } => "delete_folder",
            Self::MoveItemToFolder { .. } => "move_item_to_folder",
            Self::MoveItemToQuickAccess { .. } => "move_item_to_quick_access",
            Self::RemoveItemFromFolder { .. } => "remove_item_from_folder",
            Self::ReorderGridItems { .. } => "reorder_grid_items",
            Self::DeleteGridItem { .. } => "delete_grid_item",
            Self::AddWidget { .. } => "add_widget",
            Self::RemoveWidget { .. } => "remove_widget",
            Self::ReorderWidgets { .. } => "reorder_widgets",
            Self::AddNewPage => "add_new_page",
            Self::DeletePage { .. } => "delete_page",
            Self::SetGridColumns { .. } => "set_grid_columns",
            Self::SetIconSize { .. } => "set_icon_size",
        }
    }
}
