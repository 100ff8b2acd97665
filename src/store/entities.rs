use chrono::NaiveDate;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

/// One logged study session. This is the row layout of the backing file:
/// the field order here is the column order on disk, with `minutes`
/// serialized under the `duration` column.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StudyRecord {
    pub date: NaiveDate,
    pub subject: Arc<str>,
    #[serde(rename = "duration")]
    pub minutes: f64,
    pub goal: String,
    pub notes: String,
    pub content: String,
}

impl StudyRecord {
    /// Checks the submission rules. Rows already on disk are exempt: the
    /// load path keeps historical rows however they were written.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.subject.trim().is_empty() {
            return Err(RecordError::EmptySubject);
        }
        if self.minutes <= 0.0 {
            return Err(RecordError::NonPositiveDuration(self.minutes));
        }
        Ok(())
    }

    pub fn with_minutes(self, minutes: f64) -> Self {
        Self { minutes, ..self }
    }
}

/// Why a submitted record was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("subject must not be empty")]
    EmptySubject,
    #[error("study duration must be greater than zero, got {0}")]
    NonPositiveDuration(f64),
}

/// The full diary, in insertion order. Duplicates are permitted; ordering
/// for display is derived when browsing, never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: Vec<StudyRecord>,
}

impl RecordTable {
    pub fn records(&self) -> &[StudyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_minutes(&self) -> f64 {
        self.records.iter().map(|r| r.minutes).sum()
    }

    /// Appends a submitted record. A rejected record leaves the table
    /// untouched.
    pub fn append(&mut self, record: StudyRecord) -> Result<(), RecordError> {
        record.validate()?;
        self.records.push(record);
        Ok(())
    }

    /// Appends without the submission checks. Used when reading rows back
    /// from disk.
    pub fn push(&mut self, record: StudyRecord) {
        self.records.push(record);
    }
}

impl FromIterator<StudyRecord> for RecordTable {
    fn from_iter<T: IntoIterator<Item = StudyRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Selects a single subject, or everything via the `ALL` sentinel.
/// Only the sentinel is case insensitive, subjects themselves match
/// exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum SubjectFilter {
    All,
    Subject(Arc<str>),
}

impl Display for SubjectFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectFilter::All => write!(f, "ALL"),
            SubjectFilter::Subject(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for SubjectFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(SubjectFilter::All)
        } else {
            Ok(SubjectFilter::Subject(s.into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::store::entities::{RecordError, RecordTable, StudyRecord, SubjectFilter};

    pub(crate) fn sample_record() -> StudyRecord {
        StudyRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            subject: "Math".into(),
            minutes: 60.0,
            goal: "finish chapter 3".into(),
            notes: String::new(),
            content: "integrals".into(),
        }
    }

    #[test]
    fn append_accepts_valid_record() {
        let mut table = RecordTable::default();
        table.append(sample_record()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0], sample_record());
    }

    #[test]
    fn append_rejects_empty_subject() {
        let mut table = RecordTable::default();
        let record = StudyRecord {
            subject: "   ".into(),
            ..sample_record()
        };
        assert_eq!(table.append(record), Err(RecordError::EmptySubject));
        assert!(table.is_empty());
    }

    #[test]
    fn append_rejects_zero_duration() {
        let mut table = RecordTable::default();
        let record = sample_record().with_minutes(0.0);
        assert_eq!(
            table.append(record),
            Err(RecordError::NonPositiveDuration(0.0))
        );
        assert!(table.is_empty());
    }

    #[test]
    fn append_rejects_negative_duration() {
        let mut table = RecordTable::default();
        let record = sample_record().with_minutes(-15.0);
        assert_eq!(
            table.append(record),
            Err(RecordError::NonPositiveDuration(-15.0))
        );
        assert!(table.is_empty());
    }

    #[test]
    fn subject_filter_parses_sentinel_case_insensitively() {
        assert_eq!("ALL".parse(), Ok(SubjectFilter::All));
        assert_eq!("all".parse(), Ok(SubjectFilter::All));
        assert_eq!(
            "Math".parse(),
            Ok(SubjectFilter::Subject("Math".into()))
        );
    }
}
