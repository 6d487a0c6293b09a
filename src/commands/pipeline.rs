use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::cleaning::{CleanOptions, clean_table};
use crate::cli::PipelineArgs;
use crate::commands::clean::load_raw_inputs;
use crate::commands::load::store_messages;
use crate::config::Settings;
use crate::model::{InputFile, PipelineRunSummary, StoredMessage};
use crate::table::save_cleaned_csv;
use crate::util::{
    ensure_parent_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

const SUMMARY_VERSION: u32 = 1;

pub fn run(args: PipelineArgs, settings: &Settings) -> Result<()> {
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(Utc::now()));
    let db_path = settings.db_path_or(args.db_path.as_ref());

    info!(run_id = %run_id, inputs = args.inputs.len(), "starting pipeline");

    let (raw, row_counts) = load_raw_inputs(&args.inputs)?;
    let options = CleanOptions {
        strip_message: args.strip_message,
    };
    let (records, clean_stats) = clean_table(&raw, options).context("data cleaning failed")?;

    if let Some(output) = &args.output {
        ensure_parent_directory(output)?;
        save_cleaned_csv(&records, output)?;
    }

    let rows = records.iter().map(StoredMessage::from).collect::<Vec<_>>();
    let (insert, stored_rows_total) = store_messages(&db_path, &rows)?;

    info!(
        run_id = %run_id,
        cleaned = records.len(),
        inserted = insert.inserted,
        skipped = insert.skipped_duplicates,
        total = stored_rows_total,
        "pipeline completed"
    );

    if let Some(summary_path) = &args.summary_path {
        let mut inputs = Vec::with_capacity(args.inputs.len());
        for (path, rows) in args.inputs.iter().zip(row_counts) {
            inputs.push(InputFile {
                path: path.display().to_string(),
                sha256: sha256_file(path)?,
                rows,
            });
        }

        let summary = PipelineRunSummary {
            summary_version: SUMMARY_VERSION,
            run_id,
            started_at,
            finished_at: now_utc_string(),
            db_path: db_path.display().to_string(),
            cleaned_output_path: args.output.as_ref().map(|p| p.display().to_string()),
            inputs,
            clean: clean_stats,
            cleaned_rows: records.len(),
            insert,
            stored_rows_total,
        };
        write_json_pretty(summary_path, &summary)?;
        info!(path = %summary_path.display(), "wrote pipeline run summary");
    }

    Ok(())
}
