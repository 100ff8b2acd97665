use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{fs::File, io::AsyncReadExt};
use tracing::{debug, warn};

use super::{
    entities::{RecordTable, StudyRecord},
    migrate,
};

/// File the diary is persisted to, inside the application directory.
pub const BACKING_FILE: &str = "study_data.csv";

/// Column set of the canonical on-disk layout, in order.
pub const CANONICAL_HEADERS: [&str; 6] =
    ["date", "subject", "duration", "goal", "notes", "content"];

/// This is the standard way of writing a date in studylog.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Interface for abstracting storage of the diary table.
pub trait RecordStore {
    /// Reads the whole backing table. A missing file yields an empty
    /// table, not an error.
    fn load(&self) -> impl Future<Output = Result<LoadedTable>>;

    /// Serializes the full table over the backing file.
    fn persist(&self, table: &RecordTable) -> impl Future<Output = Result<()>>;
}

/// A loaded table together with the rows that had to be dropped.
/// Dropped rows are reported back to the user rather than lost silently.
#[derive(Debug, Default)]
pub struct LoadedTable {
    pub table: RecordTable,
    pub skipped: Vec<SkippedRow>,
}

/// A row excluded at load time because its date did not parse.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub line: u64,
    pub date: String,
}

/// The main realization of [RecordStore], over a local CSV file.
pub struct CsvRecordStore {
    path: PathBuf,
}

impl CsvRecordStore {
    pub fn new(data_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&data_dir)?;

        Ok(Self {
            path: data_dir.join(BACKING_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for CsvRecordStore {
    async fn load(&self) -> Result<LoadedTable> {
        let bytes = match read_locked(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LoadedTable::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {:?}", self.path))
            }
        };
        parse_table(&bytes)
    }

    async fn persist(&self, table: &RecordTable) -> Result<()> {
        let buffer = serialize_table(table)?;

        // The table is rewritten in full through a sibling file, so a crash
        // mid-write never leaves a truncated diary behind.
        let tmp = self.path.with_extension("csv.tmp");
        tokio::fs::write(&tmp, &buffer)
            .await
            .with_context(|| format!("Failed to write {tmp:?}"))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {:?}", self.path))?;
        Ok(())
    }
}

pub(crate) async fn read_locked(path: &Path) -> std::io::Result<Vec<u8>> {
    debug!("Reading {path:?}");
    let mut file = File::open(path).await?;
    file.lock_shared()?;
    let mut bytes = Vec::new();
    let read = file.read_to_end(&mut bytes).await;
    file.unlock_async().await?;
    read?;
    Ok(bytes)
}

pub(crate) fn parse_table(bytes: &[u8]) -> Result<LoadedTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut loaded = LoadedTable::default();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(row as u64 + 2);

        let raw_date = field(&record, columns.date);
        let Some(date) = parse_date(raw_date) else {
            warn!("Dropping row at line {line}: unparsable date {raw_date:?}");
            loaded.skipped.push(SkippedRow {
                line,
                date: raw_date.to_string(),
            });
            continue;
        };

        loaded.table.push(StudyRecord {
            date,
            subject: field(&record, columns.subject).into(),
            minutes: parse_minutes(field(&record, columns.duration), line),
            goal: field(&record, columns.goal).to_string(),
            notes: field(&record, columns.notes).to_string(),
            content: field(&record, columns.content).to_string(),
        });
    }

    Ok(loaded)
}

pub(crate) fn serialize_table(table: &RecordTable) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CANONICAL_HEADERS)?;
    for record in table.records() {
        writer.serialize(record)?;
    }
    Ok(writer.into_inner()?)
}

/// Positions of the canonical columns within the header row. A column the
/// file doesn't carry stays `None` and reads as its default, extra columns
/// are simply never looked at.
struct Columns {
    date: Option<usize>,
    subject: Option<usize>,
    duration: Option<usize>,
    goal: Option<usize>,
    notes: Option<usize>,
    content: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let columns = Self {
            date: find("date"),
            subject: find("subject"),
            duration: find("duration"),
            goal: find("goal"),
            notes: find("notes"),
            content: find("content"),
        };
        if columns.none_present() && migrate::looks_legacy(headers) {
            bail!(
                "The diary file uses a legacy column layout. Run `studylog migrate` to convert it."
            );
        }
        Ok(columns)
    }

    fn none_present(&self) -> bool {
        [
            self.date,
            self.subject,
            self.duration,
            self.goal,
            self.notes,
            self.content,
        ]
        .iter()
        .all(Option::is_none)
    }
}

fn field<'a>(record: &'a csv::StringRecord, index: Option<usize>) -> &'a str {
    index.and_then(|i| record.get(i)).unwrap_or("")
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub(crate) fn parse_minutes(value: &str, line: u64) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        Ok(v) => {
            warn!("Coercing duration {v} at line {line} to 0");
            0.0
        }
        Err(_) => {
            if !value.trim().is_empty() {
                warn!("Coercing unparsable duration {value:?} at line {line} to 0");
            }
            0.0
        }
    }
}
