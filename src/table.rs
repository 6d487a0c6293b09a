use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{error, info};

use crate::error::{ExportError, LoadError};
use crate::model::{CANONICAL_COLUMNS, CanonicalRecord, Table};
use crate::text::log_safe;

pub fn load_csv(path: &Path) -> Result<Table, LoadError> {
    let shown = path.display().to_string();
    let file = File::open(path).map_err(|source| {
        error!(path = %log_safe(&shown), error = %source, "failed to open csv file");
        LoadError::Open {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let table = read_table(file).map_err(|source| {
        error!(path = %log_safe(&shown), error = %source, "failed to parse csv file");
        LoadError::Csv {
            path: path.to_path_buf(),
            source,
        }
    })?;

    info!(
        path = %log_safe(&shown),
        rows = table.len(),
        columns = table.headers.len(),
        "csv file loaded"
    );
    Ok(table)
}

pub fn read_table<R: Read>(reader: R) -> Result<Table, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();

    let mut table = Table::new(headers);
    for record in csv_reader.records() {
        let record = record?;
        let row = record
            .iter()
            .map(|value| {
                if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            })
            .collect();
        table.rows.push(row);
    }

    Ok(table)
}

/// Concatenates tables that share one header, keeping input order.
pub fn merge_tables(tables: Vec<Table>) -> Result<Table, LoadError> {
    let count = tables.len();
    let mut tables = tables.into_iter();
    let Some(mut merged) = tables.next() else {
        error!("no tables supplied for merge");
        return Err(LoadError::NoInput);
    };

    for table in tables {
        if table.headers != merged.headers {
            error!(
                expected = ?merged.headers,
                found = ?table.headers,
                "cannot merge tables with different headers"
            );
            return Err(LoadError::HeaderMismatch {
                expected: merged.headers,
                found: table.headers,
            });
        }
        merged.rows.extend(table.rows);
    }

    info!(tables = count, rows = merged.len(), "tables merged");
    Ok(merged)
}

pub fn save_cleaned_csv(records: &[CanonicalRecord], path: &Path) -> Result<(), ExportError> {
    let shown = path.display().to_string();
    let file = File::create(path).map_err(|source| {
        error!(path = %log_safe(&shown), error = %source, "failed to create output file");
        ExportError::Create {
            path: path.to_path_buf(),
            source,
        }
    })?;

    write_cleaned(records, file).map_err(|source| {
        error!(path = %log_safe(&shown), error = %source, "failed to write cleaned csv");
        ExportError::Csv {
            path: path.to_path_buf(),
            source,
        }
    })?;

    info!(path = %log_safe(&shown), rows = records.len(), "cleaned data saved");
    Ok(())
}

pub fn write_cleaned<W: Write>(records: &[CanonicalRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CANONICAL_COLUMNS)?;

    for record in records {
        let message_id = record.message_id.to_string();
        let message_date = record
            .message_date
            .map(|date| date.to_string())
            .unwrap_or_default();
        csv_writer.write_record([
            record.channel_title.as_deref().unwrap_or_default(),
            record.channel_username.as_deref().unwrap_or_default(),
            message_id.as_str(),
            record.message.as_str(),
            message_date.as_str(),
            record.media_path.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
