//! Static service catalog consumed read-only by the layout model.
//!
//! # Responsibility
//! - List every service the portal can show, in default page order.
//! - Provide folder palette and dock fallback constants.
//! - Name the services a seeker cannot open before completing the profile.
//!
//! # Invariants
//! - Catalog ids are unique.
//! - Appending an entry here is self-healed into existing installs by
//!   `sync::migrations::ensure_default_services`.

/// One catalog row. Icons and colors are opaque to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

const fn service(
    id: &'static str,
    label: &'static str,
    icon: &'static str,
    color: &'static str,
) -> ServiceDescriptor {
    ServiceDescriptor {
        id,
        label,
        icon,
        color,
    }
}

/// Catalog in default page order.
pub const DEFAULT_SERVICES: &[ServiceDescriptor] = &[
    service("contacts", "Contacts", "users", "#3B82F6"),
    service("calls", "Calls", "phone", "#22C55E"),
    service("groups", "Groups", "users-round", "#8B5CF6"),
    service("chat", "Chat", "message-circle", "#06B6D4"),
    service("seva", "Seva", "hand-heart", "#F97316"),
    service("news", "News", "newspaper", "#EF4444"),
    service("map", "Map", "map", "#10B981"),
    service("cafe", "Cafe", "coffee", "#A16207"),
    service("shops", "Shops", "shopping-bag", "#EC4899"),
    service("services", "Services", "briefcase", "#6366F1"),
    service("library", "Library", "book-open", "#84CC16"),
    service("education", "Education", "graduation-cap", "#0EA5E9"),
    service("multimedia", "Multimedia", "music", "#D946EF"),
    service("video_circles", "Circles", "circle-play", "#F43F5E"),
    service("wallet", "Wallet", "wallet", "#EAB308"),
    service("settings", "Settings", "settings", "#64748B"),
];

/// Dock contents used when a layout has no dock or a blueprint names none.
pub const FALLBACK_QUICK_ACCESS: [&str; 3] = ["contacts", "calls", "groups"];

/// Folder palette; the first entry is the default folder color.
pub const FOLDER_COLORS: &[&str] = &[
    "#6366F1", "#22C55E", "#F97316", "#EF4444", "#06B6D4", "#EAB308", "#64748B", "#EC4899",
];

/// Role whose services stay locked until the profile is filled in.
pub const SEEKER_ROLE: &str = "user";

/// Services a seeker may use, and keep in the dock, before completing the
/// profile.
pub const PROFILE_FREE_SERVICES: &[&str] = &[
    "contacts",
    "chat",
    "calls",
    "cafe",
    "shops",
    "services",
    "map",
    "news",
    "library",
    "education",
    "multimedia",
    "video_circles",
];

/// Also usable without a profile, but never from the dock.
pub const PROFILE_FREE_OFF_DOCK: &[&str] = &["settings", "seva"];

/// Canonical folder holding a seeker's locked services.
pub const LOCKED_FOLDER_ID: &str = "folder-seeker-locked";
pub const LOCKED_FOLDER_NAME: &str = "Unlocks with profile";

/// Whether a seeker without a profile is denied `service_id`.
pub fn is_profile_locked(service_id: &str) -> bool {
    is_known_service(service_id)
        && !PROFILE_FREE_SERVICES.contains(&service_id)
        && !PROFILE_FREE_OFF_DOCK.contains(&service_id)
}

/// Name used when a folder is created with a blank name.
pub const DEFAULT_FOLDER_NAME: &str = "Folder";

/// Returns the default folder color.
pub fn default_folder_color() -> &'static str {
    FOLDER_COLORS[0]
}

/// Looks up one catalog row by service id.
pub fn find_service(service_id: &str) -> Option<&'static ServiceDescriptor> {
    DEFAULT_SERVICES
        .iter()
        .find(|service| service.id == service_id)
}

/// Returns whether `service_id` is present in the catalog.
pub fn is_known_service(service_id: &str) -> bool {
    find_service(service_id).is_some()
}
