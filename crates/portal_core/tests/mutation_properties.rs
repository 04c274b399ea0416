use portal_core::mutation::folder::{create_folder, delete_folder, move_item_to_folder};
use portal_core::mutation::grid::reorder_grid_items;
use portal_core::sync::migrations::run_startup_migrations;
use portal_core::{GridEntry, Layout, LayoutCommand, QuickAccessTarget};
use std::collections::BTreeSet;

/// Small deterministic generator so failures reproduce from the seed.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound.max(1) as u64) as usize
    }
}

fn grid_item_ids(layout: &Layout, page: usize) -> Vec<String> {
    layout.pages[page]
        .items
        .iter()
        .filter_map(GridEntry::as_item)
        .map(|item| item.id.clone())
        .collect()
}

fn folder_ids(layout: &Layout, page: usize) -> Vec<String> {
    layout.pages[page]
        .items
        .iter()
        .filter_map(GridEntry::as_folder)
        .map(|folder| folder.id.clone())
        .collect()
}

fn pick(rng: &mut XorShift, ids: &[String]) -> String {
    if ids.is_empty() {
        "missing".to_string()
    } else {
        ids[rng.below(ids.len())].clone()
    }
}

/// Random structural edit that never deletes a service.
fn random_command(rng: &mut XorShift, layout: &Layout) -> LayoutCommand {
    let page = rng.below(layout.pages.len());
    let entries = layout.pages[page].items.len();
    match rng.below(10) {
        0 => LayoutCommand::CreateFolder {
            page,
            name: String::new(),
            color: None,
        },
        1 => LayoutCommand::MoveItemToFolder {
            page,
            item_id: pick(rng, &grid_item_ids(layout, page)),
            folder_id: pick(rng, &folder_ids(layout, page)),
        },
        2 => {
            let folder_id = pick(rng, &folder_ids(layout, page));
            let item_id = layout.pages[page]
                .folder(&folder_id)
                .and_then(|folder| folder.items.first())
                .map(|item| item.id.clone())
                .unwrap_or_default();
            LayoutCommand::RemoveItemFromFolder {
                page,
                folder_id,
                item_id,
            }
        }
        3 => LayoutCommand::DeleteFolder {
            page,
            folder_id: pick(rng, &folder_ids(layout, page)),
        },
        4 => LayoutCommand::MoveItemToQuickAccess {
            page,
            item_id: pick(rng, &grid_item_ids(layout, page)),
            target: QuickAccessTarget::Slot(rng.below(4)),
        },
        5 => {
            let docked = layout
                .quick_access
                .iter()
                .map(|item| item.id.clone())
                .collect::<Vec<_>>();
            let target = if rng.below(2) == 0 {
                QuickAccessTarget::ReturnToGrid
            } else {
                QuickAccessTarget::Slot(rng.below(3))
            };
            LayoutCommand::MoveItemToQuickAccess {
                page,
                item_id: pick(rng, &docked),
                target,
            }
        }
        6 => LayoutCommand::ReorderGridItems {
            page,
            from: rng.below(entries + 1),
            to: rng.below(entries + 1),
        },
        7 => LayoutCommand::AddNewPage,
        8 => LayoutCommand::DeletePage {
            page: rng.below(layout.pages.len() + 1),
        },
        _ => LayoutCommand::SetGridColumns {
            columns: rng.below(8) as u8,
        },
    }
}

fn assert_invariants(layout: &Layout, expected_items: usize) {
    assert!(!layout.pages.is_empty());
    assert!(layout.quick_access.len() <= 3);
    let slots = layout
        .quick_access
        .iter()
        .map(|item| item.position)
        .collect::<Vec<_>>();
    assert!(slots.windows(2).all(|pair| pair[0] < pair[1]), "dock slots {slots:?}");
    assert!(slots.iter().all(|slot| *slot < 3));

    let services = layout.service_ids();
    let unique = services.iter().collect::<BTreeSet<_>>();
    assert_eq!(unique.len(), services.len(), "duplicated service in {services:?}");
    assert_eq!(services.len(), expected_items);

    for (order, page) in layout.pages.iter().enumerate() {
        assert_eq!(page.order, order);
        for (index, entry) in page.items.iter().enumerate() {
            assert_eq!(entry.position(), index);
            if let GridEntry::Folder(folder) = entry {
                for (index, item) in folder.items.iter().enumerate() {
                    assert_eq!(item.position, index);
                }
            }
        }
    }
}

#[test]
fn random_command_sequences_preserve_layout_invariants() {
    for seed in 1..=40_u64 {
        let mut rng = XorShift(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut layout = run_startup_migrations(&Layout::default_layout());
        for _ in 0..150 {
            let command = random_command(&mut rng, &layout);
            layout = command.apply(&layout);
            assert_invariants(&layout, 16);
        }
    }
}

#[test]
fn folder_round_trip_preserves_item_count() {
    let layout = create_folder(&Layout::default_layout(), 0, "Media", None);
    let folder_id = layout.pages[0].items[16].id().to_string();
    let layout = move_item_to_folder(&layout, 0, "item-news", &folder_id);
    let layout = move_item_to_folder(&layout, 0, "item-video_circles", &folder_id);
    assert_eq!(layout.item_count(), 16);

    let layout = delete_folder(&layout, 0, &folder_id);
    assert_eq!(layout.item_count(), 16);
    assert!(layout.pages[0].grid_has_service("news"));
    assert!(layout.pages[0].items.iter().all(|entry| !entry.is_folder()));
}

#[test]
fn dock_slot_then_return_to_grid_lands_in_grid() {
    let layout = Layout::default_layout();
    let docked = LayoutCommand::MoveItemToQuickAccess {
        page: 0,
        item_id: "item-map".to_string(),
        target: QuickAccessTarget::Slot(1),
    }
    .apply(&layout);
    assert_eq!(docked.quick_access_slot(1).unwrap().service_id, "map");

    let back = LayoutCommand::MoveItemToQuickAccess {
        page: 0,
        item_id: "item-map".to_string(),
        target: QuickAccessTarget::ReturnToGrid,
    }
    .apply(&docked);
    assert!(back.quick_access.is_empty());
    assert!(back.pages[0].grid_has_service("map"));
    assert_eq!(back.item_count(), 16);
}

#[test]
fn out_of_range_reorder_is_a_no_op() {
    let layout = Layout::default_layout();
    assert_eq!(reorder_grid_items(&layout, 0, 0, 99), layout);
    assert_eq!(reorder_grid_items(&layout, 4, 0, 1), layout);
}

#[test]
fn fresh_install_scenario() {
    let fresh = Layout::default_layout();
    assert_eq!(fresh.pages[0].items.len(), 16);
    assert!(fresh.quick_access.is_empty());

    let migrated = run_startup_migrations(&fresh);
    let dock = migrated
        .quick_access
        .iter()
        .map(|item| item.service_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(dock, vec!["contacts", "calls", "groups"]);

    let next = LayoutCommand::MoveItemToQuickAccess {
        page: 0,
        item_id: "item-seva".to_string(),
        target: QuickAccessTarget::Slot(0),
    }
    .apply(&migrated);
    assert_eq!(next.quick_access_slot(0).unwrap().service_id, "seva");
    assert!(next.pages[0].grid_has_service("contacts"));
}
