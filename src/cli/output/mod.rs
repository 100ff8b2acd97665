pub mod analysis;
pub mod grouping;

use ansi_term::Style;
use chrono::NaiveDate;

use crate::{
    config::{AppConfig, DurationUnit},
    store::entities::StudyRecord,
    utils::percentage::{share_of, Percentage},
};

use analysis::SubjectTotal;
use grouping::Bucket;

const BAR_WIDTH: usize = 40;

/// Prints one time-bucketed chart: a label, the summed duration, and a bar
/// scaled against the busiest bucket.
pub fn render_chart(
    title: &str,
    buckets: &[Bucket],
    label: impl Fn(NaiveDate) -> String,
    config: &AppConfig,
) {
    if buckets.is_empty() {
        return;
    }

    println!("{}", Style::new().bold().paint(title));

    let max = buckets
        .iter()
        .map(|b| b.minutes)
        .fold(0.0f64, f64::max);

    for bucket in buckets {
        let bar = config
            .theme
            .colour()
            .paint("█".repeat(bar_length(bucket.minutes, max)));
        println!(
            "{:<16} {:>8}  {}",
            label(bucket.start),
            format_minutes(bucket.minutes, config.unit),
            bar
        );
    }
    println!();
}

/// Prints the ranked per-subject totals. Subjects below `min_share` of the
/// overall time are left out.
pub fn render_subject_totals(totals: &[SubjectTotal], min_share: Percentage, config: &AppConfig) {
    if totals.is_empty() {
        return;
    }

    println!("{}", Style::new().bold().paint("Total by subject"));

    let whole = totals.iter().map(|t| t.minutes).sum::<f64>();
    for total in totals {
        let share = share_of(total.minutes, whole);
        if share < min_share {
            continue;
        }
        println!(
            "{:<16} {:>8}  {:>4.0}%",
            total.subject,
            format_minutes(total.minutes, config.unit),
            *share
        );
    }
    println!();
}

/// Prints one browsable block per record, free-text fields indented under
/// the headline. Empty fields are left out entirely.
pub fn render_records(records: &[&StudyRecord], config: &AppConfig) {
    for record in records {
        println!(
            "{}",
            Style::new().bold().paint(format!(
                "{} - {} ({})",
                record.date.format(crate::store::record_store::DATE_FORMAT),
                record.subject,
                format_minutes(record.minutes, config.unit)
            ))
        );
        for (name, value) in [
            ("goal", &record.goal),
            ("content", &record.content),
            ("notes", &record.notes),
        ] {
            if !value.is_empty() {
                println!("    {name}: {value}");
            }
        }
    }
}

pub fn format_minutes(minutes: f64, unit: DurationUnit) -> String {
    match unit {
        DurationUnit::Minutes => {
            let whole = minutes.round() as i64;
            if whole >= 60 {
                format!("{}h{}m", whole / 60, whole % 60)
            } else {
                format!("{whole}m")
            }
        }
        DurationUnit::Hours => format!("{:.1}h", minutes / 60.0),
    }
}

fn bar_length(minutes: f64, max: f64) -> usize {
    if max <= 0.0 || minutes <= 0.0 {
        return 0;
    }
    // Anything non-zero gets at least one block so it stays visible.
    ((minutes / max * BAR_WIDTH as f64).round() as usize).max(1)
}
