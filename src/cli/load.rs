use std::path::PathBuf;

use crate::db::{counts, get_connection, init_db};
use crate::error::{DepotError, Result};
use crate::settings::{load_settings, save_settings, shellexpand_path, DB_FILE};

/// Point the settings at another data directory that already holds a depot
/// database.
pub fn run(path: &str) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));
    let db_path = resolved.join(DB_FILE);

    if !db_path.exists() {
        return Err(DepotError::Settings(format!(
            "No {DB_FILE} in {}\nRun `depot init --data-dir {}` to create one.",
            resolved.display(),
            resolved.display()
        )));
    }

    // Older databases may predate the imports log.
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    let c = counts(&conn)?;

    let mut settings = load_settings();
    settings.data_dir = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!(
        "Switched to {} ({} accounts, {} stocks, {} bookings)",
        resolved.display(),
        c.accounts,
        c.stocks,
        c.bookings
    );
    Ok(())
}
