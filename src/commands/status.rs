use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::config::Settings;
use crate::store::{DETECTIONS_TABLE, MESSAGES_TABLE, count_rows};

pub fn run(args: StatusArgs, settings: &Settings) -> Result<()> {
    let db_path = settings.db_path_or(args.db_path.as_ref());

    info!(
        credentials_configured = settings.credentials.is_complete(),
        log_dir = %settings.log_dir.display(),
        "status requested"
    );

    if db_path.exists() {
        let connection = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let messages = count_or_zero(&connection, MESSAGES_TABLE);
        let detections = count_or_zero(&connection, DETECTIONS_TABLE);

        info!(
            path = %db_path.display(),
            messages,
            detections,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Row count for a status report; a table that cannot be counted reports 0
/// after logging why.
fn count_or_zero(connection: &Connection, table: &str) -> i64 {
    count_rows(connection, table).unwrap_or_else(|err| {
        warn!(table, error = %err, "failed to count rows");
        0
    })
}
