use std::{collections::HashMap, sync::Arc};

use crate::store::entities::{RecordTable, StudyRecord, SubjectFilter};

/// Total study time logged for one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectTotal {
    pub subject: Arc<str>,
    pub minutes: f64,
}

/// Returns every distinct subject with its summed study time, busiest
/// subject first. Ties order alphabetically so output stays stable.
pub fn totals_by_subject(table: &RecordTable) -> Vec<SubjectTotal> {
    let mut map = HashMap::<Arc<str>, f64>::new();

    for record in table.records() {
        *map.entry(record.subject.clone()).or_default() += record.minutes;
    }

    let mut totals = map
        .into_iter()
        .map(|(subject, minutes)| SubjectTotal { subject, minutes })
        .collect::<Vec<_>>();
    totals.sort_by(|a, b| {
        b.minutes
            .total_cmp(&a.minutes)
            .then_with(|| a.subject.cmp(&b.subject))
    });
    totals
}

/// Exact-match subset of the table, or the whole table for [SubjectFilter::All].
pub fn filter_by_subject(table: &RecordTable, filter: &SubjectFilter) -> RecordTable {
    match filter {
        SubjectFilter::All => table.clone(),
        SubjectFilter::Subject(name) => table
            .records()
            .iter()
            .filter(|record| record.subject == *name)
            .cloned()
            .collect(),
    }
}

/// Records ordered for browsing, newest day first. Records within a day
/// keep their insertion order.
pub fn browse(table: &RecordTable) -> Vec<&StudyRecord> {
    let mut records = table.records().iter().collect::<Vec<_>>();
    records.sort_by(|a, b| b.date.cmp(&a.date));
    records
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;

    use crate::{
        cli::output::analysis::{browse, filter_by_subject, totals_by_subject, SubjectTotal},
        store::entities::{RecordTable, StudyRecord, SubjectFilter},
    };

    fn record(date: &str, subject: &str, minutes: f64) -> StudyRecord {
        StudyRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            subject: subject.into(),
            minutes,
            goal: String::new(),
            notes: String::new(),
            content: String::new(),
        }
    }

    fn sample_table() -> Result<RecordTable> {
        let mut table = RecordTable::default();
        table.append(record("2024-01-10", "Math", 60.0))?;
        table.append(record("2024-01-10", "Math", 30.0))?;
        table.append(record("2024-01-12", "History", 45.0))?;
        Ok(table)
    }

    #[test]
    fn test_totals_by_subject_sums_and_sorts_descending() -> Result<()> {
        let totals = totals_by_subject(&sample_table()?);

        assert_eq!(
            totals,
            vec![
                SubjectTotal { subject: "Math".into(), minutes: 90.0 },
                SubjectTotal { subject: "History".into(), minutes: 45.0 },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_totals_by_subject_breaks_ties_alphabetically() -> Result<()> {
        let mut table = RecordTable::default();
        table.append(record("2024-01-10", "Physics", 30.0))?;
        table.append(record("2024-01-10", "Art", 30.0))?;

        let totals = totals_by_subject(&table);

        assert_eq!(totals[0].subject.as_ref(), "Art");
        assert_eq!(totals[1].subject.as_ref(), "Physics");
        Ok(())
    }

    #[test]
    fn test_filter_all_returns_the_table_unchanged() -> Result<()> {
        let table = sample_table()?;

        assert_eq!(filter_by_subject(&table, &SubjectFilter::All), table);
        Ok(())
    }

    #[test]
    fn test_filter_by_subject_is_exact() -> Result<()> {
        let table = sample_table()?;

        let filtered = filter_by_subject(&table, &SubjectFilter::Subject("Math".into()));

        assert_eq!(filtered.len(), 2);
        assert!(filtered.records().iter().all(|r| r.subject.as_ref() == "Math"));

        let none = filter_by_subject(&table, &SubjectFilter::Subject("math".into()));
        assert!(none.is_empty());
        Ok(())
    }

    #[test]
    fn test_browse_orders_newest_first_and_is_stable() -> Result<()> {
        let table = sample_table()?;

        let records = browse(&table);

        assert_eq!(records[0].subject.as_ref(), "History");
        // The two Math records share a date and keep insertion order.
        assert_eq!(records[1].minutes, 60.0);
        assert_eq!(records[2].minutes, 30.0);
        Ok(())
    }

    #[test]
    fn test_empty_table_aggregates_to_empty_sequences() {
        let table = RecordTable::default();

        assert!(totals_by_subject(&table).is_empty());
        assert!(browse(&table).is_empty());
    }
}
