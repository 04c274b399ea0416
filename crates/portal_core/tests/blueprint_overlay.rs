use portal_core::blueprint::KNOWN_ROLES;
use portal_core::mutation::folder::{create_folder, move_item_to_folder};
use portal_core::sync::migrations::run_startup_migrations;
use portal_core::{
    apply_blueprint, fallback_blueprint, resolve_blueprint, BlueprintSource, Layout, RemoteError,
    RemoteStage, RoleBlueprint,
};
use std::collections::BTreeSet;

struct StaticSource(RoleBlueprint);

impl BlueprintSource for StaticSource {
    fn fetch_blueprint(&self, _role: &str) -> Result<RoleBlueprint, RemoteError> {
        Ok(self.0.clone())
    }
}

struct OfflineSource;

impl BlueprintSource for OfflineSource {
    fn fetch_blueprint(&self, _role: &str) -> Result<RoleBlueprint, RemoteError> {
        Err(RemoteError::http_status(RemoteStage::FetchBlueprint, 502))
    }
}

fn assert_no_duplicates(layout: &Layout) {
    let services = layout.service_ids();
    let unique = services.iter().collect::<BTreeSet<_>>();
    assert_eq!(unique.len(), services.len());
}

#[test]
fn every_fallback_role_overlay_is_idempotent_and_lossless() {
    let base = run_startup_migrations(&Layout::default_layout());
    for role in KNOWN_ROLES {
        let blueprint = fallback_blueprint(role);
        let once = apply_blueprint(&base, &blueprint);
        assert_eq!(apply_blueprint(&once, &blueprint), once, "role {role}");
        assert_eq!(once.item_count(), 16);
        assert_no_duplicates(&once);
    }
}

#[test]
fn dock_services_are_pulled_out_of_folders_with_their_identity() {
    let layout = create_folder(&Layout::default_layout(), 0, "Talk", None);
    let folder_id = layout.pages[0].items[16].id().to_string();
    let layout = move_item_to_folder(&layout, 0, "item-chat", &folder_id);

    let next = apply_blueprint(&layout, &RoleBlueprint::new(&[], &["chat"]));
    assert_eq!(next.quick_access[0].id, "item-chat");
    assert!(next.pages[0].folder(&folder_id).unwrap().items.is_empty());
    assert_no_duplicates(&next);
}

#[test]
fn ranking_is_stable_for_unranked_entries_and_puts_folders_after_heroes() {
    let layout = create_folder(&Layout::default_layout(), 0, "Misc", None);
    let next = apply_blueprint(&layout, &RoleBlueprint::new(&["settings"], &["contacts"]));
    let order = next.pages[0]
        .items
        .iter()
        .map(|entry| entry.service_id().unwrap_or("<folder>"))
        .collect::<Vec<_>>();
    assert_eq!(order[0], "settings");
    assert_eq!(order[1], "calls");
    assert_eq!(order.last(), Some(&"<folder>"));
    for (index, entry) in next.pages[0].items.iter().enumerate() {
        assert_eq!(entry.position(), index);
    }
}

#[test]
fn duplicate_and_excess_quick_access_entries_are_trimmed() {
    let blueprint = RoleBlueprint::new(&[], &["map", "map", "cafe", "shops", "wallet"]);
    let next = apply_blueprint(&Layout::default_layout(), &blueprint);
    let dock = next
        .quick_access
        .iter()
        .map(|item| (item.service_id.as_str(), item.position))
        .collect::<Vec<_>>();
    assert_eq!(dock, vec![("map", 0), ("cafe", 1), ("shops", 2)]);
    assert!(next.pages[0].grid_has_service("wallet"));
}

#[test]
fn resolve_prefers_remote_and_falls_back_on_error() {
    let remote = RoleBlueprint::new(&["library"], &["library"]);
    assert_eq!(
        resolve_blueprint(&StaticSource(remote.clone()), "yogi"),
        remote
    );
    assert_eq!(
        resolve_blueprint(&OfflineSource, "devotee"),
        fallback_blueprint("devotee")
    );
}
