//! Startup migrations that repair a loaded layout.
//!
//! # Responsibility
//! - Guarantee a populated dock and the presence of every catalog service.
//! - Drop unknown and duplicate services and renumber every container.
//! - Keep a circles widget on the portal.
//! - Gather a seeker's locked services into one canonical folder.
//!
//! # Invariants
//! - Every migration is idempotent and returns the input unchanged when
//!   there is nothing to repair.
//! - Migrations never stamp `lastModified`; the controller does.

use crate::model::catalog::{
    is_known_service, is_profile_locked, DEFAULT_SERVICES, FALLBACK_QUICK_ACCESS, FOLDER_COLORS,
    LOCKED_FOLDER_ID, LOCKED_FOLDER_NAME, PROFILE_FREE_SERVICES, SEEKER_ROLE,
};
use crate::model::layout::{
    Folder, GridEntry, GridItem, Layout, Page, Widget, WidgetSize, WidgetType,
    QUICK_ACCESS_CAPACITY,
};
use crate::mutation::{append_to_grid, edit_layout, renumber_entries, renumber_items, renumber_widgets};
use std::collections::{BTreeMap, BTreeSet};

/// Identity of the widget synthesized by `ensure_circles_widget`.
pub const CIRCLES_WIDGET_ID: &str = "widget-circles-quick";

/// Signed-in user's role and profile state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccess {
    pub role: String,
    pub profile_complete: bool,
}

impl UserAccess {
    pub fn new(role: impl Into<String>, profile_complete: bool) -> Self {
        Self {
            role: role.into(),
            profile_complete,
        }
    }

    /// Seekers without a profile get locked services.
    pub fn restricts_services(&self) -> bool {
        self.role == SEEKER_ROLE && !self.profile_complete
    }
}

/// Synthesizes the fallback dock when the dock is empty, stripping those
/// services from grids and folders.
pub fn ensure_quick_access(layout: &Layout) -> Layout {
    edit_layout(layout, |next| {
        if !next.quick_access.is_empty() {
            return false;
        }
        for page in &mut next.pages {
            page.items.retain(|entry| {
                entry
                    .service_id()
                    .map_or(true, |service_id| !FALLBACK_QUICK_ACCESS.contains(&service_id))
            });
            for folder in page.items.iter_mut().filter_map(GridEntry::as_folder_mut) {
                folder
                    .items
                    .retain(|item| !FALLBACK_QUICK_ACCESS.contains(&item.service_id.as_str()));
                renumber_items(&mut folder.items);
            }
            renumber_entries(&mut page.items);
        }
        next.quick_access = FALLBACK_QUICK_ACCESS
            .iter()
            .enumerate()
            .map(|(slot, service_id)| GridItem::canonical(*service_id, slot))
            .collect();
        true
    })
}

/// Appends catalog services missing from every container to the first page.
pub fn ensure_default_services(layout: &Layout) -> Layout {
    edit_layout(layout, |next| {
        let missing = DEFAULT_SERVICES
            .iter()
            .filter(|service| !next.contains_service(service.id))
            .map(|service| service.id)
            .collect::<Vec<_>>();
        if missing.is_empty() {
            return false;
        }
        if next.pages.is_empty() {
            next.pages.push(Page::new(0));
        }
        for service_id in missing {
            append_to_grid(&mut next.pages[0].items, GridItem::canonical(service_id, 0));
        }
        true
    })
}

/// Drops unknown and duplicate services (dock first, then pages in order),
/// keeps at least one page and renumbers every position and page order.
pub fn sanitize_layout(layout: &Layout) -> Layout {
    let mut next = layout.clone();
    let mut seen = BTreeSet::new();

    next.quick_access
        .retain(|item| is_known_service(&item.service_id) && seen.insert(item.service_id.clone()));
    next.quick_access.sort_by_key(|item| item.position);
    next.quick_access.truncate(QUICK_ACCESS_CAPACITY);
    let slots_valid = next
        .quick_access
        .iter()
        .enumerate()
        .all(|(index, item)| item.position >= index && item.position < QUICK_ACCESS_CAPACITY)
        && next
            .quick_access
            .windows(2)
            .all(|pair| pair[0].position < pair[1].position);
    if !slots_valid {
        renumber_items(&mut next.quick_access);
    }

    if next.pages.is_empty() {
        next.pages.push(Page::new(0));
    }
    for (order, page) in next.pages.iter_mut().enumerate() {
        page.order = order;
        page.items.retain_mut(|entry| match entry {
            GridEntry::Item(item) => {
                is_known_service(&item.service_id) && seen.insert(item.service_id.clone())
            }
            GridEntry::Folder(folder) => {
                folder.items.retain(|item| {
                    is_known_service(&item.service_id) && seen.insert(item.service_id.clone())
                });
                renumber_items(&mut folder.items);
                true
            }
        });
        renumber_entries(&mut page.items);
        renumber_widgets(&mut page.widgets);
    }

    if next == *layout {
        layout.clone()
    } else {
        next
    }
}

/// Adds a 1x1 circles widget to the first page when no page has one.
pub fn ensure_circles_widget(layout: &Layout) -> Layout {
    edit_layout(layout, |next| {
        let has_circles = next
            .pages
            .iter()
            .flat_map(|page| page.widgets.iter())
            .any(|widget| {
                matches!(
                    widget.kind,
                    WidgetType::CirclesQuick | WidgetType::CirclesPanel
                )
            });
        let Some(page) = next.pages.first_mut() else {
            return false;
        };
        if has_circles {
            return false;
        }
        let position = page.widgets.len();
        page.widgets.push(Widget {
            id: CIRCLES_WIDGET_ID.to_string(),
            kind: WidgetType::CirclesQuick,
            size: WidgetSize::Small,
            position,
        });
        true
    })
}

/// Moves every locked service into the canonical locked folder when
/// `access` restricts services; a no-op otherwise.
///
/// The dock keeps only profile-free services. Dock items that are not
/// locked either go back to the first page grid. Items in the locked
/// folder that are no longer locked move out to the first page grid.
/// Item identities are reused wherever the service already exists.
pub fn lock_services_for_profile(layout: &Layout, access: &UserAccess) -> Layout {
    if !access.restricts_services() || layout.pages.is_empty() {
        return layout.clone();
    }
    let mut next = layout.clone();
    let mut locked: BTreeMap<String, GridItem> = BTreeMap::new();
    let mut rehome: Vec<GridItem> = Vec::new();

    next.quick_access.retain(|item| {
        if PROFILE_FREE_SERVICES.contains(&item.service_id.as_str()) {
            return true;
        }
        if is_profile_locked(&item.service_id) {
            locked
                .entry(item.service_id.clone())
                .or_insert_with(|| item.clone());
        } else {
            rehome.push(item.clone());
        }
        false
    });

    for page in &mut next.pages {
        page.items.retain_mut(|entry| match entry {
            GridEntry::Item(item) => {
                if !is_profile_locked(&item.service_id) {
                    return true;
                }
                locked
                    .entry(item.service_id.clone())
                    .or_insert_with(|| item.clone());
                false
            }
            GridEntry::Folder(folder) if folder.id == LOCKED_FOLDER_ID => {
                for item in std::mem::take(&mut folder.items) {
                    if is_profile_locked(&item.service_id) {
                        locked.entry(item.service_id.clone()).or_insert(item);
                    } else {
                        rehome.push(item);
                    }
                }
                true
            }
            GridEntry::Folder(folder) => {
                folder.items.retain(|item| {
                    if !is_profile_locked(&item.service_id) {
                        return true;
                    }
                    locked
                        .entry(item.service_id.clone())
                        .or_insert_with(|| item.clone());
                    false
                });
                renumber_items(&mut folder.items);
                true
            }
        });
    }

    let mut items = DEFAULT_SERVICES
        .iter()
        .filter(|service| is_profile_locked(service.id))
        .map(|service| {
            locked.remove(service.id).unwrap_or_else(|| GridItem {
                id: format!("item-{}-locked", service.id),
                service_id: service.id.to_string(),
                position: 0,
            })
        })
        .collect::<Vec<_>>();
    renumber_items(&mut items);

    let existing = next.pages.iter().enumerate().find_map(|(page_index, page)| {
        page.entry_index(LOCKED_FOLDER_ID)
            .map(|entry_index| (page_index, entry_index))
    });
    match existing {
        Some((page_index, entry_index)) => {
            if let Some(folder) = next.pages[page_index].items[entry_index].as_folder_mut() {
                folder.name = LOCKED_FOLDER_NAME.to_string();
                folder.items = items;
            }
        }
        None => {
            let position = next.pages[0].items.len();
            next.pages[0].items.push(GridEntry::Folder(Folder {
                id: LOCKED_FOLDER_ID.to_string(),
                name: LOCKED_FOLDER_NAME.to_string(),
                color: FOLDER_COLORS[6].to_string(),
                items,
                position,
            }));
        }
    }

    for item in rehome {
        if !next.contains_service(&item.service_id) {
            append_to_grid(&mut next.pages[0].items, item);
        }
    }
    for page in &mut next.pages {
        renumber_entries(&mut page.items);
    }

    if next == *layout {
        layout.clone()
    } else {
        next
    }
}

/// Runs every role-independent startup migration in order.
pub fn run_startup_migrations(layout: &Layout) -> Layout {
    let layout = sanitize_layout(layout);
    let layout = ensure_quick_access(&layout);
    let layout = ensure_default_services(&layout);
    ensure_circles_widget(&layout)
}

#[cfg(test)]
mod tests {
    use super::{
        ensure_circles_widget, ensure_default_services, ensure_quick_access,
        lock_services_for_profile, run_startup_migrations, sanitize_layout, UserAccess,
        CIRCLES_WIDGET_ID,
    };
    use crate::model::catalog::LOCKED_FOLDER_ID;
    use crate::model::layout::{GridEntry, GridItem, Layout, WidgetSize, WidgetType};
    use crate::mutation::dock::{move_item_to_quick_access, QuickAccessTarget};
    use crate::mutation::widget::add_widget;
    use crate::mutation::folder::{create_folder, move_item_to_folder};

    #[test]
    fn empty_dock_gets_fallback_triple() {
        let next = ensure_quick_access(&Layout::default_layout());
        let dock = next
            .quick_access
            .iter()
            .map(|item| (item.id.as_str(), item.position))
            .collect::<Vec<_>>();
        assert_eq!(
            dock,
            vec![("item-contacts", 0), ("item-calls", 1), ("item-groups", 2)]
        );
        assert_eq!(next.pages[0].items.len(), 13);
        assert_eq!(next.pages[0].items[0].service_id(), Some("chat"));
        assert_eq!(next.item_count(), 16);
        assert_eq!(ensure_quick_access(&next), next);
    }

    #[test]
    fn fallback_services_are_stripped_from_folders() {
        let layout = create_folder(&Layout::default_layout(), 0, "Social", None);
        let folder_id = layout.pages[0].items[16].id().to_string();
        let layout = move_item_to_folder(&layout, 0, "item-calls", &folder_id);
        let next = ensure_quick_access(&layout);
        assert!(next.pages[0].folder(&folder_id).unwrap().items.is_empty());
        assert_eq!(next.item_count(), 16);
    }

    #[test]
    fn missing_services_are_appended_to_first_page() {
        let mut layout = Layout::default_layout();
        layout.pages[0].items.retain(|entry| entry.service_id() != Some("wallet"));
        let next = ensure_default_services(&layout);
        let last = next.pages[0].items.last().unwrap();
        assert_eq!(last.service_id(), Some("wallet"));
        assert_eq!(last.position(), 15);
        assert_eq!(ensure_default_services(&next), next);
    }

    #[test]
    fn sanitize_drops_unknown_and_duplicate_services() {
        let mut layout = Layout::default_layout();
        layout.quick_access = vec![GridItem::canonical("chat", 2)];
        layout.pages[0]
            .items
            .push(GridEntry::Item(GridItem::new("retired_service", 16)));
        let next = sanitize_layout(&layout);
        assert!(!next.pages[0].grid_has_service("chat"));
        assert!(!next.service_ids().contains(&"retired_service"));
        assert_eq!(next.quick_access[0].position, 2);
        assert_eq!(next.pages[0].items.len(), 15);
        assert_eq!(next.pages[0].items[14].position(), 14);
    }

    #[test]
    fn startup_migrations_are_idempotent() {
        let once = run_startup_migrations(&Layout::default_layout());
        assert_eq!(run_startup_migrations(&once), once);
        assert_eq!(once.quick_access.len(), 3);
        assert_eq!(once.item_count(), 16);
        assert_eq!(once.pages[0].widgets[0].kind, WidgetType::CirclesQuick);
    }

    #[test]
    fn circles_widget_is_added_once() {
        let next = ensure_circles_widget(&Layout::default_layout());
        assert_eq!(next.pages[0].widgets.len(), 1);
        assert_eq!(next.pages[0].widgets[0].id, CIRCLES_WIDGET_ID);
        assert_eq!(next.pages[0].widgets[0].size, WidgetSize::Small);
        assert_eq!(ensure_circles_widget(&next), next);
    }

    #[test]
    fn existing_circles_panel_suppresses_the_widget() {
        let layout = add_widget(
            &Layout::default_layout(),
            0,
            WidgetType::CirclesPanel,
            WidgetSize::Large,
        );
        assert_eq!(ensure_circles_widget(&layout), layout);
    }

    #[test]
    fn seeker_without_profile_gets_locked_folder() {
        let layout = run_startup_migrations(&Layout::default_layout());
        let layout = move_item_to_quick_access(&layout, 0, "item-seva", QuickAccessTarget::Slot(1));
        assert!(layout.dock_has_service("seva"));
        let access = UserAccess::new("user", false);

        let next = lock_services_for_profile(&layout, &access);
        let folder = next.pages[0].folder(LOCKED_FOLDER_ID).unwrap();
        let locked = folder
            .items
            .iter()
            .map(|item| (item.service_id.as_str(), item.position))
            .collect::<Vec<_>>();
        assert_eq!(locked, vec![("groups", 0), ("wallet", 1)]);
        assert_eq!(folder.items[1].id, "item-wallet");
        assert!(!next.dock_has_service("groups"));
        assert!(!next.dock_has_service("seva"));
        assert!(next.pages[0].grid_has_service("seva"));
        assert!(!next.pages[0].grid_has_service("wallet"));
        assert_eq!(next.item_count(), 16);
        assert_eq!(lock_services_for_profile(&next, &access), next);
    }

    #[test]
    fn unlocked_services_leave_the_locked_folder() {
        let access = UserAccess::new("user", false);
        let mut layout = lock_services_for_profile(
            &run_startup_migrations(&Layout::default_layout()),
            &access,
        );
        let news = layout.pages[0]
            .items
            .iter()
            .position(|entry| entry.service_id() == Some("news"))
            .unwrap();
        let GridEntry::Item(item) = layout.pages[0].items.remove(news) else {
            panic!("news should be a grid item");
        };
        let folder_index = layout.pages[0].entry_index(LOCKED_FOLDER_ID).unwrap();
        layout.pages[0].items[folder_index]
            .as_folder_mut()
            .unwrap()
            .items
            .push(item);

        let next = lock_services_for_profile(&layout, &access);
        assert!(next.pages[0].grid_has_service("news"));
        assert!(!next.pages[0].folder(LOCKED_FOLDER_ID).unwrap().contains_service("news"));
        assert_eq!(next.item_count(), 16);
    }

    #[test]
    fn complete_profile_or_other_role_is_untouched() {
        let layout = run_startup_migrations(&Layout::default_layout());
        assert_eq!(
            lock_services_for_profile(&layout, &UserAccess::new("user", true)),
            layout
        );
        assert_eq!(
            lock_services_for_profile(&layout, &UserAccess::new("yogi", false)),
            layout
        );
    }
}
