use std::fs;
use std::path::Path;

use rusqlite::{Connection, params};
use tracing::{debug, error, info, warn};

use crate::error::PersistenceError;
use crate::model::{
    CANONICAL_COLUMNS, Detection, InsertSummary, NO_MEDIA, StoredMessage, Table, cell,
};
use crate::text::log_safe;

pub const MESSAGES_TABLE: &str = "telegram_messages";
pub const DETECTIONS_TABLE: &str = "detections";

pub fn open_store(db_path: &Path) -> Result<Connection, PersistenceError> {
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            error!(
                path = %log_safe(&parent.display().to_string()),
                error = %source,
                "failed to create database directory"
            );
            PersistenceError::Directory {
                path: parent.to_path_buf(),
                source,
            }
        })?;
    }

    let shown = db_path.display().to_string();
    let open_error = |source: rusqlite::Error| {
        error!(path = %log_safe(&shown), error = %source, "database connection failed");
        PersistenceError::Open {
            path: db_path.to_path_buf(),
            source,
        }
    };

    let connection = Connection::open(db_path).map_err(open_error)?;
    configure_connection(&connection).map_err(open_error)?;
    connection
        .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map_err(open_error)?;

    info!(path = %log_safe(&shown), "connected to sqlite database");
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> rusqlite::Result<()> {
    connection.pragma_update(None, "journal_mode", "WAL")?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

pub fn ensure_messages_table(connection: &Connection) -> Result<(), PersistenceError> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS telegram_messages (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              channel_title TEXT,
              channel_username TEXT,
              message_id BIGINT UNIQUE,
              message TEXT,
              message_date TEXT,
              media_path TEXT
            );
            ",
        )
        .map_err(|source| schema_error(MESSAGES_TABLE, source))?;

    info!(table = MESSAGES_TABLE, "table ready");
    Ok(())
}

pub fn ensure_detections_table(connection: &Connection) -> Result<(), PersistenceError> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS detections (
              image_path TEXT,
              bounding_box TEXT,
              confidence REAL,
              class_label INTEGER
            );
            ",
        )
        .map_err(|source| schema_error(DETECTIONS_TABLE, source))?;

    info!(table = DETECTIONS_TABLE, "table ready");
    Ok(())
}

fn schema_error(table: &'static str, source: rusqlite::Error) -> PersistenceError {
    error!(table, error = %source, "error creating table");
    PersistenceError::Schema { table, source }
}

/// Maps a cleaned table onto stored rows. Canonical columns that are absent
/// are filled with NULL for every row.
pub fn stored_rows_from_table(table: &Table) -> Result<Vec<StoredMessage>, PersistenceError> {
    let [title, username, message_id, message, date, media_path] =
        CANONICAL_COLUMNS.map(|name| {
            let index = table.column_index(name);
            if index.is_none() {
                warn!(column = name, "missing column added with NULL values");
            }
            index
        });

    table
        .rows
        .iter()
        .map(|row| -> Result<StoredMessage, PersistenceError> {
            let message_id = cell(row, message_id)
                .map(|raw| {
                    raw.trim().parse::<i64>().map_err(|_| {
                        error!(value = %log_safe(raw), "message_id is not an integer");
                        PersistenceError::InvalidValue {
                            column: "message_id",
                            value: raw.to_string(),
                        }
                    })
                })
                .transpose()?;

            Ok(StoredMessage {
                channel_title: cell(row, title).map(ToOwned::to_owned),
                channel_username: cell(row, username).map(ToOwned::to_owned),
                message_id,
                message: cell(row, message).map(ToOwned::to_owned),
                message_date: cell(row, date).map(ToOwned::to_owned),
                media_path: cell(row, media_path).map(ToOwned::to_owned),
            })
        })
        .collect()
}

/// Inserts every row in one transaction. Rows whose `message_id` is already
/// stored are skipped; any other failure rolls the whole batch back.
pub fn insert_messages(
    connection: &mut Connection,
    rows: &[StoredMessage],
) -> Result<InsertSummary, PersistenceError> {
    let result = insert_batch(connection, rows);
    match &result {
        Ok(summary) => {
            info!(
                attempted = summary.attempted,
                inserted = summary.inserted,
                skipped = summary.skipped_duplicates,
                "records inserted into sqlite database"
            );
            if summary.without_message_id > 0 {
                warn!(
                    rows = summary.without_message_id,
                    "rows without message_id are not deduplicated and will repeat on reload"
                );
            }
        }
        Err(err) => error!(error = %err, "error inserting data"),
    }
    result
}

fn insert_batch(
    connection: &mut Connection,
    rows: &[StoredMessage],
) -> Result<InsertSummary, PersistenceError> {
    let tx = connection.transaction()?;
    let mut summary = InsertSummary::default();

    {
        let mut statement = tx.prepare(
            "
            INSERT OR IGNORE INTO telegram_messages
              (channel_title, channel_username, message_id, message, message_date, media_path)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )?;

        for row in rows {
            debug!(
                message_id = ?row.message_id,
                message_date = ?row.message_date,
                "inserting message"
            );
            let changed = statement
                .execute(params![
                    row.channel_title,
                    row.channel_username,
                    row.message_id,
                    row.message,
                    row.message_date,
                    row.media_path,
                ])
                .map_err(|source| PersistenceError::Insert {
                    message_id: row.message_id,
                    source,
                })?;

            summary.attempted += 1;
            if row.message_id.is_none() {
                summary.without_message_id += 1;
            }
            if changed == 0 {
                summary.skipped_duplicates += 1;
            } else {
                summary.inserted += changed;
            }
        }
    }

    tx.commit()?;
    Ok(summary)
}

pub fn count_rows(connection: &Connection, table: &str) -> Result<i64, PersistenceError> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let count = connection.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Distinct media paths referenced by stored messages, in storage order.
pub fn stored_media_paths(connection: &Connection) -> Result<Vec<String>, PersistenceError> {
    let mut statement = connection.prepare(
        "
        SELECT media_path
        FROM telegram_messages
        WHERE media_path IS NOT NULL AND media_path <> ?1
        GROUP BY media_path
        ORDER BY MIN(id)
        ",
    )?;

    let paths = statement
        .query_map([NO_MEDIA], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(paths)
}

pub fn insert_detections(
    connection: &mut Connection,
    image_path: &str,
    detections: &[Detection],
) -> Result<usize, PersistenceError> {
    let tx = connection.transaction()?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO detections(image_path, bounding_box, confidence, class_label)
            VALUES(?1, ?2, ?3, ?4)
            ",
        )?;

        for detection in detections {
            statement.execute(params![
                image_path,
                detection.bounding_box_text(),
                detection.confidence,
                detection.class_label,
            ])?;
        }
    }

    tx.commit()?;
    Ok(detections.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanonicalRecord;

    fn memory_store() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory db");
        ensure_messages_table(&connection).expect("messages table");
        ensure_detections_table(&connection).expect("detections table");
        connection
    }

    fn record(message_id: i64, media_path: &str) -> StoredMessage {
        StoredMessage::from(&CanonicalRecord {
            channel_title: Some("Shop".to_string()),
            channel_username: Some("@shop".to_string()),
            message_id,
            message: format!("message {message_id}"),
            message_date: None,
            media_path: media_path.to_string(),
        })
    }

    #[test]
    fn inserting_twice_does_not_duplicate_rows() {
        let mut connection = memory_store();
        let rows = vec![record(1, "No Media"), record(2, "No Media"), record(3, "No Media")];

        let first = insert_messages(&mut connection, &rows).expect("first insert");
        let after_first = count_rows(&connection, MESSAGES_TABLE).expect("count");
        let second = insert_messages(&mut connection, &rows).expect("second insert");
        let after_second = count_rows(&connection, MESSAGES_TABLE).expect("count");

        assert_eq!(first.inserted, 3);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_duplicates, 3);
        assert_eq!(after_first, 3);
        assert_eq!(after_second, after_first);
    }

    #[test]
    fn rows_without_message_id_are_counted_and_repeat() {
        let mut connection = memory_store();
        let mut orphan = record(0, "No Media");
        orphan.message_id = None;
        let rows = vec![orphan, record(5, "No Media")];

        let first = insert_messages(&mut connection, &rows).expect("first insert");
        let second = insert_messages(&mut connection, &rows).expect("second insert");

        assert_eq!(first.without_message_id, 1);
        assert_eq!(second.without_message_id, 1);
        assert_eq!(second.inserted, 1);
        assert_eq!(second.skipped_duplicates, 1);
        let nulls: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM telegram_messages WHERE message_id IS NULL",
                [],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(nulls, 2);
    }

    #[test]
    fn existing_rows_are_not_overwritten() {
        let mut connection = memory_store();
        insert_messages(&mut connection, &[record(9, "a.jpg")]).expect("insert");
        insert_messages(&mut connection, &[record(9, "b.jpg")]).expect("insert");

        let stored: String = connection
            .query_row(
                "SELECT media_path FROM telegram_messages WHERE message_id = 9",
                [],
                |row| row.get(0),
            )
            .expect("row exists");
        assert_eq!(stored, "a.jpg");
    }

    #[test]
    fn missing_media_path_column_is_stored_as_null() {
        let mut table = Table::new(
            ["channel_title", "channel_username", "message_id", "message", "message_date"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        );
        table.rows.push(vec![
            Some("Shop".to_string()),
            Some("@shop".to_string()),
            Some("11".to_string()),
            Some("hi".to_string()),
            None,
        ]);

        let rows = stored_rows_from_table(&table).expect("rows");
        assert_eq!(rows[0].media_path, None);

        let mut connection = memory_store();
        insert_messages(&mut connection, &rows).expect("insert");
        let (media_path, message_date): (Option<String>, Option<String>) = connection
            .query_row(
                "SELECT media_path, message_date FROM telegram_messages WHERE message_id = 11",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("row exists");
        assert_eq!(media_path, None);
        assert_eq!(message_date, None);
    }

    #[test]
    fn non_integer_message_id_is_rejected() {
        let mut table = Table::new(vec!["message_id".to_string()]);
        table.rows.push(vec![Some("abc".to_string())]);

        let err = stored_rows_from_table(&table).expect_err("must fail");
        assert!(matches!(
            err,
            PersistenceError::InvalidValue {
                column: "message_id",
                ..
            }
        ));
    }

    #[test]
    fn stored_media_paths_skip_sentinel_and_repeats() {
        let mut connection = memory_store();
        let rows = vec![
            record(1, "photos/@shop_1.jpg"),
            record(2, "No Media"),
            record(3, "photos/@shop_3.jpg"),
        ];
        insert_messages(&mut connection, &rows).expect("insert");

        let paths = stored_media_paths(&connection).expect("paths");
        assert_eq!(paths, vec!["photos/@shop_1.jpg", "photos/@shop_3.jpg"]);
    }

    #[test]
    fn detections_are_stored_with_text_bounding_box() {
        let mut connection = memory_store();
        let detections = vec![Detection {
            bounding_box: vec![10.0, 20.5, 110.0, 220.0],
            confidence: 0.87,
            class_label: 39,
        }];

        let saved = insert_detections(&mut connection, "photos/a.jpg", &detections).expect("save");
        assert_eq!(saved, 1);

        let (bbox, class_label): (String, i64) = connection
            .query_row(
                "SELECT bounding_box, class_label FROM detections WHERE image_path = 'photos/a.jpg'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("row exists");
        assert_eq!(bbox, "[10.0, 20.5, 110.0, 220.0]");
        assert_eq!(class_label, 39);
    }

    #[test]
    fn open_store_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("data").join("telegram_messages.db");

        let connection = open_store(&db_path).expect("open");
        ensure_messages_table(&connection).expect("table");
        assert!(db_path.exists());
        assert_eq!(count_rows(&connection, MESSAGES_TABLE).expect("count"), 0);
    }
}
