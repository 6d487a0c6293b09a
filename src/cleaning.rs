use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{error, info, warn};

use crate::error::CleanError;
use crate::model::{
    CanonicalRecord, CleanStats, MessageDate, NO_MEDIA, NO_MESSAGE, RAW_COLUMNS, Table, cell,
};
use crate::text::clean_message;

const ZONED_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Run `clean_message` over every message after missing values are filled.
    pub strip_message: bool,
}

struct RawColumns {
    title: usize,
    username: usize,
    id: usize,
    message: usize,
    date: usize,
    media_path: usize,
}

impl RawColumns {
    fn locate(table: &Table) -> Result<Self, CleanError> {
        let find = |name: &'static str| {
            table.column_index(name).ok_or_else(|| {
                error!(column = name, "data cleaning error: required column missing");
                CleanError::MissingColumn(name)
            })
        };

        Ok(Self {
            title: find(RAW_COLUMNS[0])?,
            username: find(RAW_COLUMNS[1])?,
            id: find(RAW_COLUMNS[2])?,
            message: find(RAW_COLUMNS[3])?,
            date: find(RAW_COLUMNS[4])?,
            media_path: find(RAW_COLUMNS[5])?,
        })
    }
}

/// Turns raw scraper rows into canonical records.
///
/// Rows are deduplicated on the `ID` value (first occurrence wins), dates that
/// do not parse become `None`, ids that do not parse become `0`, and missing
/// message text or media paths are replaced with sentinels.
pub fn clean_table(
    table: &Table,
    options: CleanOptions,
) -> Result<(Vec<CanonicalRecord>, CleanStats), CleanError> {
    let columns = RawColumns::locate(table)?;
    let mut stats = CleanStats {
        raw_rows: table.len(),
        ..CleanStats::default()
    };

    let mut seen_ids = HashSet::new();
    let mut unique_rows = Vec::with_capacity(table.len());
    for row in &table.rows {
        if seen_ids.insert(IdKey::of(cell(row, Some(columns.id)))) {
            unique_rows.push(row);
        }
    }
    stats.duplicate_rows_dropped = table.len() - unique_rows.len();
    info!(
        dropped = stats.duplicate_rows_dropped,
        remaining = unique_rows.len(),
        "duplicates removed from dataset"
    );

    let mut records = Vec::with_capacity(unique_rows.len());
    for row in unique_rows {
        let raw_date = cell(row, Some(columns.date));
        let message_date = raw_date.and_then(parse_message_date);
        if raw_date.is_some() && message_date.is_none() {
            stats.date_fallbacks += 1;
        }

        let message_id = match coerce_message_id(cell(row, Some(columns.id))) {
            Some(id) => id,
            None => {
                stats.id_fallbacks += 1;
                0
            }
        };

        let message = match cell(row, Some(columns.message)) {
            Some(text) if options.strip_message => clean_message(text),
            Some(text) => text.to_string(),
            None => {
                stats.messages_filled += 1;
                NO_MESSAGE.to_string()
            }
        };

        let media_path = match cell(row, Some(columns.media_path)) {
            Some(path) => path.to_string(),
            None => {
                stats.media_paths_filled += 1;
                NO_MEDIA.to_string()
            }
        };

        records.push(CanonicalRecord {
            channel_title: cell(row, Some(columns.title)).map(ToOwned::to_owned),
            channel_username: cell(row, Some(columns.username)).map(ToOwned::to_owned),
            message_id,
            message,
            message_date,
            media_path,
        });
    }

    info!(unparsable = stats.date_fallbacks, "date column formatted");
    if stats.id_fallbacks > 0 {
        warn!(
            rows = stats.id_fallbacks,
            "message ids could not be parsed and were set to 0"
        );
    }
    info!(
        messages = stats.messages_filled,
        media_paths = stats.media_paths_filled,
        "missing values filled"
    );
    info!(rows = records.len(), "data cleaning completed");

    Ok((records, stats))
}

/// Parses a scraper timestamp. Anything unrecognised yields `None`.
pub fn parse_message_date(raw: &str) -> Option<MessageDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(MessageDate::Zoned(ts));
    }
    for format in ZONED_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Some(MessageDate::Zoned(ts));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(MessageDate::Naive(ts));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(MessageDate::Naive)
}

/// Integer value of a raw id cell. Numeric text with a fractional part is
/// truncated toward zero; anything else is `None`.
/// Dedup key for a raw `ID` cell: numeric ids compare by value, so "42",
/// "042" and "42.0" are one id. Anything else compares as trimmed text.
#[derive(Debug, PartialEq, Eq, Hash)]
enum IdKey<'a> {
    Numeric(i64),
    Text(Option<&'a str>),
}

impl<'a> IdKey<'a> {
    fn of(raw: Option<&'a str>) -> Self {
        match coerce_message_id(raw) {
            Some(id) => Self::Numeric(id),
            None => Self::Text(raw.map(str::trim)),
        }
    }
}

pub fn coerce_message_id(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }

    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.abs() < i64::MAX as f64 {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn table(rows: &[[&str; 6]]) -> Table {
        let mut table = Table::new(RAW_COLUMNS.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.rows.push(
                row.iter()
                    .map(|v| (!v.is_empty()).then(|| v.to_string()))
                    .collect(),
            );
        }
        table
    }

    #[test]
    fn bad_date_and_missing_values_fall_back_to_defaults() {
        let raw = table(&[["Shop", "@shop", "42", "", "not-a-date", ""]]);
        let (records, stats) = clean_table(&raw, CleanOptions::default()).expect("clean");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.message_id, 42);
        assert_eq!(record.message_date, None);
        assert_eq!(record.message, "No Message");
        assert_eq!(record.media_path, "No Media");
        assert_eq!(stats.date_fallbacks, 1);
        assert_eq!(stats.messages_filled, 1);
        assert_eq!(stats.media_paths_filled, 1);
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let raw = table(&[
            ["Shop", "@shop", "7", "first", "", ""],
            ["Shop", "@shop", "8", "other", "", ""],
            ["Shop", "@shop", "7", "second", "", ""],
        ]);
        let (records, stats) = clean_table(&raw, CleanOptions::default()).expect("clean");

        assert_eq!(records.len(), 2);
        assert_eq!(stats.duplicate_rows_dropped, 1);
        let sevens: Vec<_> = records.iter().filter(|r| r.message_id == 7).collect();
        assert_eq!(sevens.len(), 1);
        assert_eq!(sevens[0].message, "first");
    }

    #[test]
    fn numeric_ids_deduplicate_by_value() {
        let raw = table(&[
            ["Shop", "@shop", "42", "first", "", ""],
            ["Shop", "@shop", "42.0", "second", "", ""],
            ["Shop", "@shop", "042", "third", "", ""],
            ["Shop", "@shop", "43", "other", "", ""],
        ]);
        let (records, stats) = clean_table(&raw, CleanOptions::default()).expect("clean");

        assert_eq!(stats.duplicate_rows_dropped, 2);
        let ids: Vec<i64> = records.iter().map(|r| r.message_id).collect();
        assert_eq!(ids, vec![42, 43]);
        assert_eq!(records[0].message, "first");
    }

    #[test]
    fn rows_without_id_collapse_and_default_to_zero() {
        let raw = table(&[
            ["Shop", "@shop", "", "a", "", ""],
            ["Shop", "@shop", "", "b", "", ""],
            ["Shop", "@shop", "abc", "c", "", ""],
        ]);
        let (records, stats) = clean_table(&raw, CleanOptions::default()).expect("clean");

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.message_id == 0));
        assert_eq!(stats.id_fallbacks, 2);
    }

    #[test]
    fn every_record_has_message_and_media_path() {
        let raw = table(&[
            ["A", "@a", "1", "", "", "photos/@a_1.jpg"],
            ["A", "@a", "2", "hello", "", ""],
            ["", "", "3", "", "", ""],
        ]);
        let (records, _) = clean_table(&raw, CleanOptions::default()).expect("clean");

        assert!(records.iter().all(|r| !r.message.is_empty() && !r.media_path.is_empty()));
        assert_eq!(records[0].media_path, "photos/@a_1.jpg");
        assert_eq!(records[2].channel_title, None);
    }

    #[test]
    fn strip_message_removes_links_and_emoji() {
        let raw = table(&[["A", "@a", "1", "deal \u{1F525} https://a.et/x", "", ""]]);
        let options = CleanOptions {
            strip_message: true,
        };
        let (records, _) = clean_table(&raw, options).expect("clean");
        assert_eq!(records[0].message, "deal  ");
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let raw = Table::new(vec!["ID".to_string(), "Message".to_string()]);
        let err = clean_table(&raw, CleanOptions::default()).expect_err("must fail");
        assert!(matches!(err, CleanError::MissingColumn("Channel Title")));
    }

    #[test]
    fn parse_message_date_keeps_offset() {
        let Some(MessageDate::Zoned(ts)) = parse_message_date("2024-02-10 14:03:27+00:00") else {
            panic!("expected zoned timestamp");
        };
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 2, 10));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (14, 3, 27));
        assert_eq!(ts.offset().local_minus_utc(), 0);

        assert!(matches!(
            parse_message_date("2024-02-10T14:03:27Z"),
            Some(MessageDate::Zoned(_))
        ));
    }

    #[test]
    fn parse_message_date_accepts_naive_forms() {
        assert!(matches!(
            parse_message_date("2024-02-10 14:03:27"),
            Some(MessageDate::Naive(_))
        ));
        let Some(MessageDate::Naive(midnight)) = parse_message_date("2024-02-10") else {
            panic!("expected naive date");
        };
        assert_eq!(midnight.hour(), 0);
        assert_eq!(parse_message_date("10/02/2024 noon"), None);
        assert_eq!(parse_message_date("2024-13-45"), None);
    }

    #[test]
    fn message_date_text_matches_stored_form() {
        let date = parse_message_date("2024-02-10 14:03:27+03:00").expect("parses");
        assert_eq!(date.to_string(), "2024-02-10 14:03:27+03:00");
    }

    #[test]
    fn fractional_seconds_render_as_microseconds() {
        let naive = parse_message_date("2024-02-10 14:03:27.5").expect("parses");
        assert_eq!(naive.to_string(), "2024-02-10 14:03:27.500000");

        let zoned = parse_message_date("2024-02-10T14:03:27.123+00:00").expect("parses");
        assert_eq!(zoned.to_string(), "2024-02-10 14:03:27.123000+00:00");

        let whole = parse_message_date("2024-02-10 14:03:27.000").expect("parses");
        assert_eq!(whole.to_string(), "2024-02-10 14:03:27");
    }

    #[test]
    fn coerce_message_id_handles_numeric_text() {
        assert_eq!(coerce_message_id(Some("42")), Some(42));
        assert_eq!(coerce_message_id(Some(" 42 ")), Some(42));
        assert_eq!(coerce_message_id(Some("42.0")), Some(42));
        assert_eq!(coerce_message_id(Some("4.2e1")), Some(42));
        assert_eq!(coerce_message_id(Some("x42")), None);
        assert_eq!(coerce_message_id(Some("NaN")), None);
        assert_eq!(coerce_message_id(None), None);
    }
}
