//! Applies a role blueprint to a layout.
//!
//! # Responsibility
//! - Rank page entries by the blueprint's hero services.
//! - Replace the dock with the blueprint's quick-access services.
//!
//! # Invariants
//! - No service is lost: dock occupants that are not re-selected move to the
//!   first page grid.
//! - No service is duplicated: chosen dock services are stripped from grids
//!   and folders.
//! - Applying the same blueprint twice equals applying it once.

use crate::blueprint::RoleBlueprint;
use crate::model::catalog::{is_known_service, FALLBACK_QUICK_ACCESS};
use crate::model::layout::{GridEntry, GridItem, Layout, Page, QUICK_ACCESS_CAPACITY};
use crate::mutation::{append_to_grid, renumber_entries, renumber_items};

/// Returns `layout` reordered and re-docked according to `blueprint`.
///
/// Does not stamp `lastModified`; callers compare the result with the input.
pub fn apply_blueprint(layout: &Layout, blueprint: &RoleBlueprint) -> Layout {
    let mut next = layout.clone();
    if next.pages.is_empty() {
        next.pages.push(Page::new(0));
    }

    let chosen = chosen_dock_services(blueprint);
    let dock = chosen
        .iter()
        .enumerate()
        .map(|(slot, service_id)| GridItem {
            id: existing_item_id(&next, service_id)
                .unwrap_or_else(|| GridItem::canonical(*service_id, slot).id),
            service_id: service_id.to_string(),
            position: slot,
        })
        .collect::<Vec<_>>();

    strip_services(&mut next, &chosen);

    let displaced = std::mem::take(&mut next.quick_access)
        .into_iter()
        .filter(|item| !chosen.contains(&item.service_id.as_str()))
        .collect::<Vec<_>>();
    for item in displaced {
        if !next.contains_service(&item.service_id) {
            append_to_grid(&mut next.pages[0].items, item);
        }
    }
    next.quick_access = dock;

    for page in &mut next.pages {
        rank_entries(page, &blueprint.hero_services);
    }
    next
}

/// Known, de-duplicated quick-access services, or the fallback triple.
fn chosen_dock_services(blueprint: &RoleBlueprint) -> Vec<&str> {
    let mut chosen: Vec<&str> = Vec::new();
    for service_id in &blueprint.quick_access {
        if chosen.len() == QUICK_ACCESS_CAPACITY {
            break;
        }
        if is_known_service(service_id) && !chosen.contains(&service_id.as_str()) {
            chosen.push(service_id.as_str());
        }
    }
    if chosen.is_empty() {
        chosen.extend(FALLBACK_QUICK_ACCESS);
    }
    chosen
}

fn existing_item_id(layout: &Layout, service_id: &str) -> Option<String> {
    let docked = layout
        .quick_access
        .iter()
        .find(|item| item.service_id == service_id);
    let in_pages = || {
        layout.pages.iter().find_map(|page| {
            page.items.iter().find_map(|entry| match entry {
                GridEntry::Item(item) => (item.service_id == service_id).then_some(item),
                GridEntry::Folder(folder) => folder
                    .items
                    .iter()
                    .find(|item| item.service_id == service_id),
            })
        })
    };
    docked.or_else(in_pages).map(|item| item.id.clone())
}

fn strip_services(layout: &mut Layout, services: &[&str]) {
    for page in &mut layout.pages {
        let before = page.items.len();
        page.items.retain(|entry| {
            entry
                .service_id()
                .map_or(true, |service_id| !services.contains(&service_id))
        });
        let mut touched = before != page.items.len();
        for folder in page.items.iter_mut().filter_map(GridEntry::as_folder_mut) {
            let before = folder.items.len();
            folder
                .items
                .retain(|item| !services.contains(&item.service_id.as_str()));
            if before != folder.items.len() {
                renumber_items(&mut folder.items);
                touched = true;
            }
        }
        if touched {
            renumber_entries(&mut page.items);
        }
    }
}

/// Stable sort by `(heroRank, priorPosition)`; folders and unranked items
/// rank after every hero service.
fn rank_entries(page: &mut Page, hero_services: &[String]) {
    let unranked = hero_services.len();
    page.items.sort_by_key(|entry| {
        let rank = entry
            .service_id()
            .and_then(|service_id| hero_services.iter().position(|hero| hero == service_id))
            .unwrap_or(unranked);
        (rank, entry.position())
    });
    renumber_entries(&mut page.items);
}

#[cfg(test)]
mod tests {
    use super::apply_blueprint;
    use crate::blueprint::RoleBlueprint;
    use crate::model::layout::Layout;

    #[test]
    fn hero_services_lead_and_dock_is_replaced() {
        let layout = Layout::default_layout();
        let blueprint = RoleBlueprint::new(&["seva", "news"], &["chat", "wallet"]);
        let next = apply_blueprint(&layout, &blueprint);

        let dock = next
            .quick_access
            .iter()
            .map(|item| (item.service_id.as_str(), item.position))
            .collect::<Vec<_>>();
        assert_eq!(dock, vec![("chat", 0), ("wallet", 1)]);
        assert_eq!(next.quick_access[0].id, "item-chat");
        assert_eq!(next.pages[0].items[0].service_id(), Some("seva"));
        assert_eq!(next.pages[0].items[1].service_id(), Some("news"));
        assert_eq!(next.pages[0].items[2].service_id(), Some("contacts"));
        assert!(!next.pages[0].grid_has_service("chat"));
        assert_eq!(next.item_count(), layout.item_count());
    }

    #[test]
    fn empty_or_unknown_quick_access_uses_fallback_triple() {
        let blueprint = RoleBlueprint::new(&[], &["nope", "nope"]);
        let next = apply_blueprint(&Layout::default_layout(), &blueprint);
        let dock = next
            .quick_access
            .iter()
            .map(|item| item.service_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(dock, vec!["contacts", "calls", "groups"]);
    }

    #[test]
    fn displaced_dock_items_return_to_first_page() {
        let docked = apply_blueprint(
            &Layout::default_layout(),
            &RoleBlueprint::new(&[], &["chat", "seva", "map"]),
        );
        let next = apply_blueprint(&docked, &RoleBlueprint::new(&[], &["chat"]));
        assert!(next.pages[0].grid_has_service("seva"));
        assert!(next.pages[0].grid_has_service("map"));
        assert_eq!(next.quick_access.len(), 1);
        assert_eq!(next.item_count(), 16);
    }

    #[test]
    fn overlay_is_idempotent() {
        let blueprint = RoleBlueprint::new(&["wallet", "seva"], &["chat", "calls", "seva"]);
        let once = apply_blueprint(&Layout::default_layout(), &blueprint);
        assert_eq!(apply_blueprint(&once, &blueprint), once);
    }
}
