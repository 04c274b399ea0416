//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `portal_core` linkage without the Flutter runtime.
//! - Print the first-launch layout for an optional role as JSON.
//!
//! Usage: `portal_cli [role]`

use portal_core::{
    fallback_blueprint, open_db_in_memory, ServerFetch, SqliteLayoutStore, SyncConfig,
    SyncController, SyncMode, SystemClock,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("portal_core ping={}", portal_core::ping());
    println!("portal_core version={}", portal_core::core_version());

    match first_launch_layout(std::env::args().nth(1).as_deref()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("portal_core error={message}");
            ExitCode::FAILURE
        }
    }
}

fn first_launch_layout(role: Option<&str>) -> Result<String, String> {
    let conn = open_db_in_memory().map_err(|err| err.to_string())?;
    let config = SyncConfig {
        mode: SyncMode::LocalOnly,
        ..SyncConfig::default()
    };
    let mut controller = SyncController::new(SqliteLayoutStore::new(conn), SystemClock, config);
    let blueprint = role.map(fallback_blueprint);
    let outcome = controller
        .initialize(ServerFetch::Unreachable, blueprint.as_ref())
        .map_err(|err| err.to_string())?;
    println!(
        "portal_core source={:?} migrated={}",
        outcome.source, outcome.migrated
    );
    serde_json::to_string_pretty(&*controller.current()).map_err(|err| err.to_string())
}
