//! Layout aggregate: pages, grid entries, folders, widgets and the dock.
//!
//! # Responsibility
//! - Define the serialized shape of the home-screen layout blob.
//! - Provide construction helpers and read-only queries.
//!
//! # Invariants
//! - `pages` is never empty for a layout that went through migrations.
//! - `quick_access` holds at most `QUICK_ACCESS_CAPACITY` items, sorted by
//!   slot; each item's `position` is its slot address in `[0, 3)`.
//! - Folders never contain folders.
//! - Field names serialize in camelCase to match the remote layout endpoint.

use crate::model::catalog::DEFAULT_SERVICES;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of any entry (item, folder, widget, page).
pub type EntryId = String;

/// Foreign key into the static service catalog.
pub type ServiceId = String;

/// Fixed number of dock slots.
pub const QUICK_ACCESS_CAPACITY: usize = 3;
/// Default grid column count for new layouts.
pub const DEFAULT_GRID_COLUMNS: u8 = 4;
/// Inclusive range accepted by `set_grid_columns`.
pub const GRID_COLUMNS_RANGE: std::ops::RangeInclusive<u8> = 2..=6;

const FIRST_PAGE_ID: &str = "page-1";

/// Icon size display setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Widget kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetType {
    Clock,
    Calendar,
    /// Short-form circles feed.
    CirclesQuick,
    /// Panel variant of the circles feed.
    CirclesPanel,
}

/// Widget size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetSize {
    #[serde(rename = "1x1")]
    Small,
    #[serde(rename = "2x1")]
    Wide,
    #[serde(rename = "2x2")]
    Large,
}

/// One service shortcut. `position` is the rank inside its container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    pub id: EntryId,
    pub service_id: ServiceId,
    pub position: usize,
}

impl GridItem {
    /// Creates an item with a freshly generated identity.
    pub fn new(service_id: impl Into<ServiceId>, position: usize) -> Self {
        let service_id = service_id.into();
        Self {
            id: format!("item-{service_id}-{}", Uuid::new_v4()),
            service_id,
            position,
        }
    }

    /// Creates an item with the deterministic `item-<serviceId>` identity.
    ///
    /// Used by default construction and dock synthesis so repeated runs
    /// produce identical layouts.
    pub fn canonical(service_id: impl Into<ServiceId>, position: usize) -> Self {
        let service_id = service_id.into();
        Self {
            id: format!("item-{service_id}"),
            service_id,
            position,
        }
    }
}

/// Named group of items on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: EntryId,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub items: Vec<GridItem>,
    pub position: usize,
}

impl Folder {
    /// Creates an empty folder with a generated identity.
    pub fn new(name: impl Into<String>, color: impl Into<String>, position: usize) -> Self {
        Self {
            id: format!("folder-{}", Uuid::new_v4()),
            name: name.into(),
            color: color.into(),
            items: Vec::new(),
            position,
        }
    }

    pub fn contains_service(&self, service_id: &str) -> bool {
        self.items.iter().any(|item| item.service_id == service_id)
    }
}

/// Top-level entry of a page grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridEntry {
    #[serde(rename = "service")]
    Item(GridItem),
    Folder(Folder),
}

impl GridEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Item(item) => &item.id,
            Self::Folder(folder) => &folder.id,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Self::Item(item) => item.position,
            Self::Folder(folder) => folder.position,
        }
    }

    pub fn set_position(&mut self, position: usize) {
        match self {
            Self::Item(item) => item.position = position,
            Self::Folder(folder) => folder.position = position,
        }
    }

    /// Service id for items; `None` for folders.
    pub fn service_id(&self) -> Option<&str> {
        match self {
            Self::Item(item) => Some(&item.service_id),
            Self::Folder(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&GridItem> {
        match self {
            Self::Item(item) => Some(item),
            Self::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Self::Item(_) => None,
            Self::Folder(folder) => Some(folder),
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            Self::Item(_) => None,
            Self::Folder(folder) => Some(folder),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

/// Page widget. `position` only orders widgets on the same page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub kind: WidgetType,
    pub size: WidgetSize,
    pub position: usize,
}

impl Widget {
    pub fn new(kind: WidgetType, size: WidgetSize, position: usize) -> Self {
        Self {
            id: format!("widget-{}", Uuid::new_v4()),
            kind,
            size,
            position,
        }
    }
}

/// One swipeable page of the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: EntryId,
    #[serde(default)]
    pub items: Vec<GridEntry>,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub order: usize,
}

impl Page {
    /// Creates an empty page with a generated identity.
    pub fn new(order: usize) -> Self {
        Self {
            id: format!("page-{}", Uuid::new_v4()),
            items: Vec::new(),
            widgets: Vec::new(),
            order,
        }
    }

    /// Index of the top-level entry with `id`.
    pub fn entry_index(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|entry| entry.id() == id)
    }

    /// Index of the widget with `id`.
    pub fn widget_index(&self, id: &str) -> Option<usize> {
        self.widgets.iter().position(|widget| widget.id == id)
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.items
            .iter()
            .filter_map(GridEntry::as_folder)
            .find(|folder| folder.id == id)
    }

    /// Whether a top-level grid item carries `service_id`.
    pub fn grid_has_service(&self, service_id: &str) -> bool {
        self.items
            .iter()
            .any(|entry| entry.service_id() == Some(service_id))
    }
}

fn default_grid_columns() -> u8 {
    DEFAULT_GRID_COLUMNS
}

/// Root aggregate persisted as one blob locally and remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub pages: Vec<Page>,
    #[serde(default)]
    pub quick_access: Vec<GridItem>,
    #[serde(default = "default_grid_columns")]
    pub grid_columns: u8,
    #[serde(default)]
    pub icon_size: IconSize,
    /// Epoch milliseconds of the last local write.
    #[serde(default)]
    pub last_modified: i64,
    #[serde(default)]
    pub synced_with_server: bool,
}

impl Layout {
    /// Builds the install-time layout: every catalog service on page 1 and
    /// an empty dock.
    pub fn default_layout() -> Self {
        let items = DEFAULT_SERVICES
            .iter()
            .enumerate()
            .map(|(position, service)| GridEntry::Item(GridItem::canonical(service.id, position)))
            .collect();
        Self {
            pages: vec![Page {
                id: FIRST_PAGE_ID.to_string(),
                items,
                widgets: Vec::new(),
                order: 0,
            }],
            quick_access: Vec::new(),
            grid_columns: DEFAULT_GRID_COLUMNS,
            icon_size: IconSize::default(),
            last_modified: 0,
            synced_with_server: false,
        }
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Dock item occupying `slot`, if any.
    pub fn quick_access_slot(&self, slot: usize) -> Option<&GridItem> {
        self.quick_access.iter().find(|item| item.position == slot)
    }

    pub fn dock_has_service(&self, service_id: &str) -> bool {
        self.quick_access
            .iter()
            .any(|item| item.service_id == service_id)
    }

    /// Whether `service_id` is present in any container.
    pub fn contains_service(&self, service_id: &str) -> bool {
        self.dock_has_service(service_id)
            || self.pages.iter().any(|page| {
                page.items.iter().any(|entry| match entry {
                    GridEntry::Item(item) => item.service_id == service_id,
                    GridEntry::Folder(folder) => folder.contains_service(service_id),
                })
            })
    }

    /// Every service id in the layout, in page, folder, dock order.
    ///
    /// Duplicates are reported as often as they occur.
    pub fn service_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for page in &self.pages {
            for entry in &page.items {
                match entry {
                    GridEntry::Item(item) => ids.push(item.service_id.as_str()),
                    GridEntry::Folder(folder) => {
                        ids.extend(folder.items.iter().map(|item| item.service_id.as_str()))
                    }
                }
            }
        }
        ids.extend(self.quick_access.iter().map(|item| item.service_id.as_str()));
        ids
    }

    /// Total number of items across grids, folders and the dock.
    pub fn item_count(&self) -> usize {
        self.service_ids().len()
    }
}
