use std::fmt::Display;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, ValueEnum};
use now::DateTimeNow;

use crate::{
    cli::output::{
        analysis::{filter_by_subject, totals_by_subject},
        grouping::{group_by_day, group_by_month, group_by_week},
        render_chart, render_subject_totals,
    },
    config::AppConfig,
    store::{
        entities::{RecordTable, SubjectFilter},
        record_store::{RecordStore, DATE_FORMAT},
    },
    utils::percentage::Percentage,
};

use super::report_skipped;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum ReportPeriod {
    All,
    Week,
    Month,
}

impl Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportPeriod::All => write!(f, "all"),
            ReportPeriod::Week => write!(f, "week"),
            ReportPeriod::Month => write!(f, "month"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(
        long,
        short,
        default_value_t = SubjectFilter::All,
        help = "Only include one subject. ALL keeps every subject"
    )]
    subject: SubjectFilter,
    #[arg(
        long,
        short,
        default_value_t = ReportPeriod::All,
        help = "Restrict the report to the current week or month"
    )]
    period: ReportPeriod,
    #[arg(
        long = "min-share",
        default_value_t = Percentage::new_opt(0.).unwrap(),
        help = "Hide subjects below this share of total time, for example 5%"
    )]
    min_share: Percentage,
}

/// Command to process `report`. Everything is recomputed from the freshly
/// loaded table, the charts never read persisted aggregates.
pub async fn process_report_command(
    ReportCommand {
        subject,
        period,
        min_share,
    }: ReportCommand,
    store: &impl RecordStore,
    config: &AppConfig,
) -> Result<()> {
    let loaded = store.load().await?;
    report_skipped(&loaded.skipped);

    if loaded.table.is_empty() {
        println!("No study records yet.");
        return Ok(());
    }

    let table = restrict_to_period(filter_by_subject(&loaded.table, &subject), period);
    if table.is_empty() {
        println!("No records match the selected filters.");
        return Ok(());
    }

    render_chart(
        "Daily study time",
        &group_by_day(&table),
        |date| date.format(DATE_FORMAT).to_string(),
        config,
    );
    render_chart(
        "Weekly study time (weeks start Monday)",
        &group_by_week(&table),
        |date| date.format(DATE_FORMAT).to_string(),
        config,
    );
    render_chart(
        "Monthly study time",
        &group_by_month(&table),
        |date| date.format("%Y-%m").to_string(),
        config,
    );
    render_subject_totals(&totals_by_subject(&table), min_share, config);
    Ok(())
}

/// Command to process `subjects`: the distinct subjects present with their
/// totals, the same data a filter selector would be populated from.
pub async fn process_subjects_command(store: &impl RecordStore, config: &AppConfig) -> Result<()> {
    let loaded = store.load().await?;
    report_skipped(&loaded.skipped);

    if loaded.table.is_empty() {
        println!("No study records yet.");
        return Ok(());
    }

    render_subject_totals(
        &totals_by_subject(&loaded.table),
        Percentage::new_opt(0.).expect("Zero is a valid percentage"),
        config,
    );
    Ok(())
}

fn restrict_to_period(table: RecordTable, period: ReportPeriod) -> RecordTable {
    let cutoff = match period {
        ReportPeriod::All => return table,
        ReportPeriod::Week => Local::now().beginning_of_week().date_naive(),
        ReportPeriod::Month => Local::now().beginning_of_month().date_naive(),
    };
    table
        .records()
        .iter()
        .filter(|record| record.date >= cutoff)
        .cloned()
        .collect()
}
