//! Role blueprints: ordering hints derived from the signed-in user's role.
//!
//! # Responsibility
//! - Define the `RoleBlueprint` wire shape.
//! - Resolve a blueprint from a remote source, falling back to a built-in
//!   table when the source fails.
//!
//! # Invariants
//! - Resolution never fails; every role maps to some blueprint.
//! - Unknown roles resolve like `user`.
//!
//! # See also
//! - `overlay` for how a blueprint is applied to a layout.

pub mod overlay;

use crate::model::layout::ServiceId;
use crate::sync::remote::RemoteError;
use log::{info, warn};
use serde::{Deserialize, Serialize};

pub use overlay::apply_blueprint;

/// Role-derived ordering hint served by the blueprint endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBlueprint {
    /// Services pinned to the front of every page, in rank order.
    #[serde(default)]
    pub hero_services: Vec<ServiceId>,
    /// Up to three services for the dock.
    #[serde(default)]
    pub quick_access: Vec<ServiceId>,
}

impl RoleBlueprint {
    pub fn new(hero_services: &[&str], quick_access: &[&str]) -> Self {
        Self {
            hero_services: hero_services.iter().map(|id| id.to_string()).collect(),
            quick_access: quick_access.iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// Roles with a built-in fallback blueprint.
pub const KNOWN_ROLES: &[&str] = &["user", "in_goodness", "yogi", "devotee"];

/// Remote provider of role blueprints.
pub trait BlueprintSource {
    fn fetch_blueprint(&self, role: &str) -> Result<RoleBlueprint, RemoteError>;
}

/// Built-in blueprint for `role`. Unknown roles get the `user` blueprint.
pub fn fallback_blueprint(role: &str) -> RoleBlueprint {
    match role {
        "in_goodness" => RoleBlueprint::new(
            &["seva", "cafe", "shops", "news"],
            &["contacts", "chat", "seva"],
        ),
        "yogi" => RoleBlueprint::new(
            &["education", "library", "video_circles", "multimedia"],
            &["contacts", "chat", "education"],
        ),
        "devotee" => RoleBlueprint::new(
            &["seva", "library", "multimedia", "map"],
            &["contacts", "calls", "seva"],
        ),
        _ => RoleBlueprint::new(
            &["contacts", "chat", "news", "services"],
            &["contacts", "calls", "groups"],
        ),
    }
}

/// Fetches the blueprint for `role`, using `fallback_blueprint` on any
/// source error.
pub fn resolve_blueprint(source: &dyn BlueprintSource, role: &str) -> RoleBlueprint {
    match source.fetch_blueprint(role) {
        Ok(blueprint) => {
            info!("event=blueprint_resolve module=blueprint status=ok role={role} origin=remote");
            blueprint
        }
        Err(err) => {
            warn!(
                "event=blueprint_resolve module=blueprint status=fallback role={role} error_code={} error={}",
                err.code, err
            );
            fallback_blueprint(role)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{fallback_blueprint, resolve_blueprint, BlueprintSource, RoleBlueprint, KNOWN_ROLES};
    use crate::model::catalog::is_known_service;
    use crate::sync::remote::{RemoteError, RemoteStage};

    struct Failing;

    impl BlueprintSource for Failing {
        fn fetch_blueprint(&self, _role: &str) -> Result<RoleBlueprint, RemoteError> {
            Err(RemoteError::network(RemoteStage::FetchBlueprint, "offline"))
        }
    }

    #[test]
    fn fallback_table_uses_catalog_services() {
        for role in KNOWN_ROLES {
            let blueprint = fallback_blueprint(role);
            assert!(blueprint.quick_access.len() <= 3);
            assert!(blueprint
                .hero_services
                .iter()
                .chain(&blueprint.quick_access)
                .all(|id| is_known_service(id)));
        }
        assert_eq!(fallback_blueprint("unknown"), fallback_blueprint("user"));
    }

    #[test]
    fn failing_source_resolves_to_fallback() {
        assert_eq!(resolve_blueprint(&Failing, "yogi"), fallback_blueprint("yogi"));
    }

    #[test]
    fn decodes_camel_case_wire_shape() {
        let blueprint: RoleBlueprint =
            serde_json::from_str(r#"{"heroServices":["seva"],"quickAccess":["chat"]}"#).unwrap();
        assert_eq!(blueprint, RoleBlueprint::new(&["seva"], &["chat"]));
    }
}
