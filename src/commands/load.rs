use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::LoadArgs;
use crate::config::Settings;
use crate::model::{InsertSummary, StoredMessage};
use crate::store::{
    MESSAGES_TABLE, count_rows, ensure_messages_table, insert_messages, open_store,
    stored_rows_from_table,
};
use crate::table::load_csv;

pub fn run(args: LoadArgs, settings: &Settings) -> Result<()> {
    let table = load_csv(&args.input)?;
    let rows = stored_rows_from_table(&table)
        .with_context(|| format!("invalid cleaned table: {}", args.input.display()))?;

    let db_path = settings.db_path_or(args.db_path.as_ref());
    let (summary, total) = store_messages(&db_path, &rows)?;

    info!(
        inserted = summary.inserted,
        skipped = summary.skipped_duplicates,
        total,
        db_path = %db_path.display(),
        "load completed"
    );
    Ok(())
}

/// Opens the store, makes sure the messages table exists and inserts `rows`.
/// Returns the insert outcome and the table's row count afterwards.
pub(crate) fn store_messages(
    db_path: &Path,
    rows: &[StoredMessage],
) -> Result<(InsertSummary, i64)> {
    let mut connection = open_store(db_path)?;
    ensure_messages_table(&connection)?;
    let summary = insert_messages(&mut connection, rows)?;
    let total = count_rows(&connection, MESSAGES_TABLE)?;
    Ok((summary, total))
}
