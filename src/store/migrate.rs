use std::io::ErrorKind;

use anyhow::{bail, Result};
use tracing::{info, warn};

use super::{
    entities::{RecordTable, StudyRecord},
    record_store::{self, CsvRecordStore, RecordStore, SkippedRow, CANONICAL_HEADERS},
};

// Column names the original diary variants wrote. The two duration
// variants differ in unit: bare 공부시간 counted hours, 공부시간(분)
// counted minutes.
const LEGACY_DATE: &str = "날짜";
const LEGACY_SUBJECT: &str = "과목";
const LEGACY_HOURS: &str = "공부시간";
const LEGACY_MINUTES: &str = "공부시간(분)";
const LEGACY_GOAL: &str = "목표";
const LEGACY_CONTENT: &str = "공부내용";
const LEGACY_NOTES: &str = "메모";

/// What a migration run did to the backing file.
#[derive(Debug, PartialEq)]
pub enum MigrationOutcome {
    /// There is no backing file yet.
    Missing,
    /// The file already carries the canonical columns, nothing was touched.
    AlreadyCanonical,
    Migrated {
        rows: usize,
        skipped: Vec<SkippedRow>,
    },
}

pub(crate) fn looks_legacy(headers: &csv::StringRecord) -> bool {
    headers.iter().any(|h| {
        matches!(
            h.trim(),
            LEGACY_DATE | LEGACY_SUBJECT | LEGACY_HOURS | LEGACY_MINUTES
        )
    })
}

fn is_canonical(headers: &csv::StringRecord) -> bool {
    headers
        .iter()
        .any(|h| CANONICAL_HEADERS.contains(&h.trim()))
}

/// One-time backfill of a diary written with a legacy column layout.
/// The rewritten file always carries the full canonical column set, with
/// hour-denominated durations converted to minutes. Reading never branches
/// on schema, this is the only place that understands the old layouts.
pub async fn migrate_file(store: &CsvRecordStore) -> Result<MigrationOutcome> {
    let bytes = match record_store::read_locked(store.path()).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MigrationOutcome::Missing),
        Err(e) => return Err(e.into()),
    };

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(&bytes[..]);
    let headers = reader.headers()?.clone();

    if is_canonical(&headers) {
        return Ok(MigrationOutcome::AlreadyCanonical);
    }
    if !looks_legacy(&headers) {
        bail!("Unrecognized diary columns {headers:?}, refusing to migrate");
    }

    let find = |name: &str| headers.iter().position(|h| h.trim() == name);
    let date = find(LEGACY_DATE);
    let subject = find(LEGACY_SUBJECT);
    let minutes = find(LEGACY_MINUTES);
    let hours = find(LEGACY_HOURS);
    let goal = find(LEGACY_GOAL);
    let content = find(LEGACY_CONTENT);
    let notes = find(LEGACY_NOTES);

    let mut table = RecordTable::default();
    let mut skipped = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(row as u64 + 2);

        let raw_date = field(&record, date);
        let Some(parsed) = record_store::parse_date(raw_date) else {
            warn!("Dropping legacy row at line {line}: unparsable date {raw_date:?}");
            skipped.push(SkippedRow {
                line,
                date: raw_date.to_string(),
            });
            continue;
        };

        // The minute column wins when a file somehow carries both variants.
        let minutes = match minutes {
            Some(index) => record_store::parse_minutes(field(&record, Some(index)), line),
            None => record_store::parse_minutes(field(&record, hours), line) * 60.0,
        };

        table.push(StudyRecord {
            date: parsed,
            subject: field(&record, subject).into(),
            minutes,
            goal: field(&record, goal).to_string(),
            notes: field(&record, notes).to_string(),
            content: field(&record, content).to_string(),
        });
    }

    store.persist(&table).await?;
    info!("Migrated {} legacy rows at {:?}", table.len(), store.path());
    Ok(MigrationOutcome::Migrated {
        rows: table.len(),
        skipped,
    })
}

fn field<'a>(record: &'a csv::StringRecord, index: Option<usize>) -> &'a str {
    index.and_then(|i| record.get(i)).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::store::{
        migrate::{migrate_file, MigrationOutcome},
        record_store::{CsvRecordStore, RecordStore},
    };

    async fn store_with_file(content: &str) -> Result<(tempfile::TempDir, CsvRecordStore)> {
        let dir = tempdir()?;
        let store = CsvRecordStore::new(dir.path().to_owned())?;
        tokio::fs::write(store.path(), content).await?;
        Ok((dir, store))
    }

    #[tokio::test]
    async fn test_migrate_missing_file() -> Result<()> {
        let dir = tempdir()?;
        let store = CsvRecordStore::new(dir.path().to_owned())?;

        assert_eq!(migrate_file(&store).await?, MigrationOutcome::Missing);
        Ok(())
    }

    #[tokio::test]
    async fn test_migrate_canonical_file_is_untouched() -> Result<()> {
        let content = "date,subject,duration,goal,notes,content\n2024-01-10,Math,60,,,\n";
        let (_dir, store) = store_with_file(content).await?;

        assert_eq!(
            migrate_file(&store).await?,
            MigrationOutcome::AlreadyCanonical
        );
        assert_eq!(tokio::fs::read_to_string(store.path()).await?, content);
        Ok(())
    }

    #[tokio::test]
    async fn test_migrate_hour_variant_converts_to_minutes() -> Result<()> {
        let (_dir, store) = store_with_file(
            "날짜,과목,공부시간,목표,공부내용,메모\n\
             2024-01-10,수학,1.5,교과서 복습,적분,어려웠다\n",
        )
        .await?;

        let outcome = migrate_file(&store).await?;

        assert_eq!(
            outcome,
            MigrationOutcome::Migrated {
                rows: 1,
                skipped: vec![]
            }
        );
        let loaded = store.load().await?;
        let record = &loaded.table.records()[0];
        assert_eq!(record.subject.as_ref(), "수학");
        assert_eq!(record.minutes, 90.0);
        assert_eq!(record.goal, "교과서 복습");
        assert_eq!(record.content, "적분");
        assert_eq!(record.notes, "어려웠다");
        Ok(())
    }

    #[tokio::test]
    async fn test_migrate_minute_variant_keeps_values() -> Result<()> {
        let (_dir, store) = store_with_file(
            "날짜,과목,공부시간(분),목표,메모\n\
             2024-01-10,영어,45,,\n",
        )
        .await?;

        migrate_file(&store).await?;

        let loaded = store.load().await?;
        let record = &loaded.table.records()[0];
        assert_eq!(record.minutes, 45.0);
        // The variant without a content column backfills it empty.
        assert_eq!(record.content, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_migrate_drops_unparsable_legacy_dates() -> Result<()> {
        let (_dir, store) = store_with_file(
            "날짜,과목,공부시간,목표,공부내용,메모\n\
             broken,수학,1,,,\n\
             2024-01-10,수학,1,,,\n",
        )
        .await?;

        let outcome = migrate_file(&store).await?;

        match outcome {
            MigrationOutcome::Migrated { rows, skipped } => {
                assert_eq!(rows, 1);
                assert_eq!(skipped.len(), 1);
                assert_eq!(skipped[0].date, "broken");
            }
            other => panic!("expected a migration, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_migrate_rejects_unknown_columns() -> Result<()> {
        let (_dir, store) = store_with_file("foo,bar\n1,2\n").await?;

        assert!(migrate_file(&store).await.is_err());
        Ok(())
    }
}
