use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::cleaning::{CleanOptions, clean_table};
use crate::cli::CleanArgs;
use crate::model::Table;
use crate::table::{load_csv, merge_tables, save_cleaned_csv};
use crate::util::ensure_parent_directory;

pub fn run(args: CleanArgs) -> Result<()> {
    let (raw, _) = load_raw_inputs(&args.inputs)?;
    let options = CleanOptions {
        strip_message: args.strip_message,
    };
    let (records, stats) = clean_table(&raw, options).context("data cleaning failed")?;

    ensure_parent_directory(&args.output)?;
    save_cleaned_csv(&records, &args.output)?;

    info!(
        raw_rows = stats.raw_rows,
        cleaned_rows = records.len(),
        duplicates = stats.duplicate_rows_dropped,
        id_fallbacks = stats.id_fallbacks,
        output = %args.output.display(),
        "clean completed"
    );
    Ok(())
}

/// Loads every raw export and merges them into one table. Also returns the
/// row count of each input, in input order.
pub(crate) fn load_raw_inputs(paths: &[PathBuf]) -> Result<(Table, Vec<usize>)> {
    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        tables.push(load_csv(path)?);
    }

    let row_counts = tables.iter().map(Table::len).collect();
    let merged = merge_tables(tables)?;
    Ok((merged, row_counts))
}
