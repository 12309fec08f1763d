//! Daily entry records and the tabular entry log.
//!
//! The log is a comma-delimited file whose header row doubles as the schema
//! marker. Two generations exist:
//!
//! - legacy: `Date,Sleep,Food,Exercise,Feeling` (no owner column)
//! - current: `Date,Username,Sleep,Food,Exercise,Feeling`
//!
//! Everything here is pure text manipulation; I/O lives in
//! [`crate::services::entries`].

use crate::error::AppError;
use crate::time_utils::parse_calendar_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Owner assigned to rows written before the log had an owner column.
pub const SENTINEL_OWNER: &str = "unknown";

/// Header of the current schema.
pub const CURRENT_HEADER: &str = "Date,Username,Sleep,Food,Exercise,Feeling";

/// Header of the legacy single-user schema.
pub const LEGACY_HEADER: &str = "Date,Sleep,Food,Exercise,Feeling";

const OWNER_COLUMN: &str = "Username";
const DELIMITER: char = ',';
const LEGACY_FIELDS: usize = 5;
const CURRENT_FIELDS: usize = 6;

/// The four daily scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Metrics {
    #[validate(range(min = 1, max = 10))]
    pub sleep: i32,
    #[validate(range(min = 1, max = 10))]
    pub food: i32,
    #[validate(range(min = 1, max = 10))]
    pub exercise: i32,
    #[validate(range(min = 1, max = 10))]
    pub feeling: i32,
}

impl Metrics {
    pub fn new(sleep: i32, food: i32, exercise: i32, feeling: i32) -> Self {
        Self {
            sleep,
            food,
            exercise,
            feeling,
        }
    }
}

/// One row of the entry log. At most one exists per (date, owner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EntryRecord {
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub owner: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl EntryRecord {
    fn date_key(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.date)
    }
}

/// Whether a header row carries the owner column.
pub fn has_owner_column(header: &str) -> bool {
    header.split(DELIMITER).any(|column| column.trim() == OWNER_COLUMN)
}

/// Integer prefix of a field, or 0 when there is none.
///
/// `"7"` → 7, `" 8 "` → 8, `"9.5"` → 9, `"abc"` → 0.
fn parse_metric(field: &str) -> i32 {
    let field = field.trim();
    let end = field
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(field.len());
    field[..end].parse().unwrap_or(0)
}

/// Decode one body line. Malformed lines yield `None`.
fn parse_row(line: &str) -> Option<EntryRecord> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();
    let (date, owner, scores) = match fields.len() {
        LEGACY_FIELDS => (fields[0], SENTINEL_OWNER, &fields[1..]),
        CURRENT_FIELDS => (fields[0], fields[1], &fields[2..]),
        _ => return None,
    };

    Some(EntryRecord {
        date: date.to_string(),
        owner: owner.to_string(),
        metrics: Metrics::new(
            parse_metric(scores[0]),
            parse_metric(scores[1]),
            parse_metric(scores[2]),
            parse_metric(scores[3]),
        ),
    })
}

/// Header row: the first non-blank line.
fn header_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Non-blank body lines, header excluded.
fn body_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .skip(1)
}

/// Zero-padded form of a parsable date, so `2024-3-7` and `2024-03-07`
/// name the same day.
fn normalize_date(date: &str) -> Option<String> {
    parse_calendar_date(date.trim()).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Entries belonging to `owner`, newest date first.
///
/// Legacy rows belong to [`SENTINEL_OWNER`]. Rows with the same date keep
/// their file order; rows with an unparsable date sort last.
pub fn parse_owner_entries(text: &str, owner: &str) -> Vec<EntryRecord> {
    let mut entries: Vec<EntryRecord> = body_lines(text)
        .filter_map(parse_row)
        .filter(|entry| entry.owner == owner)
        .collect();

    // sort_by is stable
    entries.sort_by(|a, b| b.date_key().cmp(&a.date_key()));
    entries
}

/// Rewrite a log into the current schema.
///
/// The header is replaced when it lacks the owner column, every legacy row
/// gains the sentinel owner, dates are zero-padded and blank lines are
/// dropped. Rows of any other width pass through untouched. Running this on
/// its own output is a no-op.
pub fn migrate(text: &str) -> String {
    let header = header_line(text)
        .filter(|h| has_owner_column(h))
        .unwrap_or(CURRENT_HEADER);

    let mut out = String::with_capacity(text.len() + 16);
    out.push_str(header);
    out.push('\n');

    for line in body_lines(text) {
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        if fields.len() != LEGACY_FIELDS && fields.len() != CURRENT_FIELDS {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        match normalize_date(fields[0]) {
            Some(date) => out.push_str(&date),
            None => out.push_str(fields[0]),
        }
        if fields.len() == LEGACY_FIELDS {
            out.push(DELIMITER);
            out.push_str(SENTINEL_OWNER);
        }
        for field in &fields[1..] {
            out.push(DELIMITER);
            out.push_str(field);
        }
        out.push('\n');
    }

    out
}

/// Serialize one current-schema row (no trailing newline).
pub fn format_row(date: &str, owner: &str, metrics: &Metrics) -> String {
    format!(
        "{date},{owner},{},{},{},{}",
        metrics.sleep, metrics.food, metrics.exercise, metrics.feeling
    )
}

/// Migrate `text` and then insert or replace the row for (date, owner).
///
/// An existing row is replaced in place; otherwise the row is appended.
/// Fails with [`AppError::Validation`] if the constructed row does not have
/// exactly the current schema's field count.
pub fn upsert_row(
    text: &str,
    date: &str,
    owner: &str,
    metrics: &Metrics,
) -> Result<String, AppError> {
    let row = format_row(date, owner, metrics);
    let field_count = row.split(DELIMITER).count();
    if field_count != CURRENT_FIELDS || row.contains(['\n', '\r']) {
        return Err(AppError::Validation(format!(
            "entry row has {} fields, expected {}",
            field_count, CURRENT_FIELDS
        )));
    }

    let migrated = migrate(text);
    let mut lines: Vec<&str> = migrated.lines().collect();

    let existing = lines.iter().skip(1).position(|line| {
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        fields.len() == CURRENT_FIELDS && fields[0] == date && fields[1] == owner
    });

    match existing {
        Some(index) => lines[index + 1] = &row,
        None => lines.push(&row),
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}
