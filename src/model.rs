use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub const RAW_COLUMNS: [&str; 6] = [
    "Channel Title",
    "Channel Username",
    "ID",
    "Message",
    "Date",
    "Media Path",
];

pub const CANONICAL_COLUMNS: [&str; 6] = [
    "channel_title",
    "channel_username",
    "message_id",
    "message",
    "message_date",
    "media_path",
];

pub const NO_MESSAGE: &str = "No Message";
pub const NO_MEDIA: &str = "No Media";

/// A header row plus rows of cells. An empty cell is a missing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Value of `column` in `row`, or `None` when the column is absent or the cell is empty.
pub fn cell(row: &[Option<String>], column: Option<usize>) -> Option<&str> {
    column
        .and_then(|index| row.get(index))
        .and_then(|value| value.as_deref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDate {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl fmt::Display for MessageDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (naive, nanos) = match self {
            Self::Zoned(ts) => (ts.naive_local(), ts.nanosecond()),
            Self::Naive(ts) => (*ts, ts.nanosecond()),
        };
        write!(f, "{}", naive.format("%Y-%m-%d %H:%M:%S"))?;
        // Sub-second part is always six digits, or absent.
        if nanos != 0 {
            write!(f, ".{:06}", (nanos % 1_000_000_000) / 1_000)?;
        }
        if let Self::Zoned(ts) = self {
            write!(f, "{}", ts.format("%:z"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub channel_title: Option<String>,
    pub channel_username: Option<String>,
    pub message_id: i64,
    pub message: String,
    pub message_date: Option<MessageDate>,
    pub media_path: String,
}

/// One row as it is bound into `telegram_messages`. Every column is nullable
/// so that partially populated cleaned tables can still be stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredMessage {
    pub channel_title: Option<String>,
    pub channel_username: Option<String>,
    pub message_id: Option<i64>,
    pub message: Option<String>,
    pub message_date: Option<String>,
    pub media_path: Option<String>,
}

impl From<&CanonicalRecord> for StoredMessage {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            channel_title: record.channel_title.clone(),
            channel_username: record.channel_username.clone(),
            message_id: Some(record.message_id),
            message: Some(record.message.clone()),
            message_date: record.message_date.map(|date| date.to_string()),
            media_path: Some(record.media_path.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bounding_box: Vec<f64>,
    pub confidence: f64,
    #[serde(rename = "class")]
    pub class_label: i64,
}

impl Detection {
    /// Coordinate list in the `[x1, y1, x2, y2]` text form stored in the database.
    pub fn bounding_box_text(&self) -> String {
        format!("{:?}", self.bounding_box)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanStats {
    pub raw_rows: usize,
    pub duplicate_rows_dropped: usize,
    pub id_fallbacks: usize,
    pub date_fallbacks: usize,
    pub messages_filled: usize,
    pub media_paths_filled: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertSummary {
    pub attempted: usize,
    pub inserted: usize,
    pub skipped_duplicates: usize,
    /// Rows bound with a NULL `message_id`. UNIQUE does not cover these, so
    /// reloading the same data inserts them again.
    pub without_message_id: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputFile {
    pub path: String,
    pub sha256: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunSummary {
    pub summary_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub db_path: String,
    pub cleaned_output_path: Option<String>,
    pub inputs: Vec<InputFile>,
    pub clean: CleanStats,
    pub cleaned_rows: usize,
    pub insert: InsertSummary,
    pub stored_rows_total: i64,
}
