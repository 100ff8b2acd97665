use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    store::entities::RecordTable,
    utils::time::{month_start, week_start},
};

/// One bar of a time-bucketed chart. `start` is the day itself, the Monday
/// of the week, or the first of the month depending on the grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub start: NaiveDate,
    pub minutes: f64,
}

pub fn group_by_day(table: &RecordTable) -> Vec<Bucket> {
    group_by(table, |date| date)
}

pub fn group_by_week(table: &RecordTable) -> Vec<Bucket> {
    group_by(table, week_start)
}

pub fn group_by_month(table: &RecordTable) -> Vec<Bucket> {
    group_by(table, month_start)
}

/// Bucket keys are derived from each record on every call, nothing here is
/// ever stored back into the table.
fn group_by(table: &RecordTable, key: impl Fn(NaiveDate) -> NaiveDate) -> Vec<Bucket> {
    let mut sums = BTreeMap::<NaiveDate, f64>::new();
    for record in table.records() {
        *sums.entry(key(record.date)).or_default() += record.minutes;
    }
    sums.into_iter()
        .map(|(start, minutes)| Bucket { start, minutes })
        .collect()
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;

    use crate::{
        cli::output::grouping::{group_by_day, group_by_month, group_by_week, Bucket},
        store::entities::{RecordTable, StudyRecord},
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

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_table() -> Result<RecordTable> {
        let mut table = RecordTable::default();
        table.append(record("2024-01-10", "Math", 60.0))?;
        table.append(record("2024-01-10", "Math", 30.0))?;
        table.append(record("2024-01-14", "History", 45.0))?;
        table.append(record("2024-02-01", "Math", 15.0))?;
        Ok(table)
    }

    #[test]
    fn test_group_by_day_sums_same_day_records() -> Result<()> {
        let buckets = group_by_day(&sample_table()?);

        assert_eq!(
            buckets,
            vec![
                Bucket { start: date("2024-01-10"), minutes: 90.0 },
                Bucket { start: date("2024-01-14"), minutes: 45.0 },
                Bucket { start: date("2024-02-01"), minutes: 15.0 },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_group_by_week_buckets_on_mondays() -> Result<()> {
        let buckets = group_by_week(&sample_table()?);

        // 2024-01-10 and 2024-01-14 fall in the week of Monday 2024-01-08.
        assert_eq!(
            buckets,
            vec![
                Bucket { start: date("2024-01-08"), minutes: 135.0 },
                Bucket { start: date("2024-01-29"), minutes: 15.0 },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_group_by_month_buckets_on_month_starts() -> Result<()> {
        let buckets = group_by_month(&sample_table()?);

        assert_eq!(
            buckets,
            vec![
                Bucket { start: date("2024-01-01"), minutes: 135.0 },
                Bucket { start: date("2024-02-01"), minutes: 15.0 },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_every_partition_preserves_the_total() -> Result<()> {
        let table = sample_table()?;
        let total = table.total_minutes();

        for buckets in [
            group_by_day(&table),
            group_by_week(&table),
            group_by_month(&table),
        ] {
            let sum: f64 = buckets.iter().map(|b| b.minutes).sum();
            assert_eq!(sum, total);
        }
        Ok(())
    }

    #[test]
    fn test_empty_table_produces_empty_buckets() {
        let table = RecordTable::default();

        assert!(group_by_day(&table).is_empty());
        assert!(group_by_week(&table).is_empty());
        assert!(group_by_month(&table).is_empty());
    }

    #[test]
    fn test_single_record_table_needs_no_special_casing() -> Result<()> {
        let mut table = RecordTable::default();
        table.append(record("2024-01-10", "Math", 60.0))?;

        assert_eq!(group_by_day(&table).len(), 1);
        assert_eq!(group_by_week(&table).len(), 1);
        assert_eq!(group_by_month(&table).len(), 1);
        Ok(())
    }
}
