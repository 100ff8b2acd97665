use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser};

use crate::{
    config::AppConfig,
    cli::output::format_minutes,
    store::record_store::{RecordStore, DATE_FORMAT},
    store::entities::StudyRecord,
};

use super::{report_skipped, Args, DateStyle};

#[derive(Debug, Parser)]
pub struct AddCommand {
    #[arg(long, short, help = "Subject the session was spent on")]
    subject: String,
    #[arg(
        long,
        short,
        help = "Length of the session, in the configured unit (minutes unless changed)"
    )]
    duration: f64,
    #[arg(
        long,
        help = "Date of the session. Examples are \"today\", \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, help = "Goal for the session")]
    goal: Option<String>,
    #[arg(long, help = "What was studied")]
    content: Option<String>,
    #[arg(long, help = "Free-form notes")]
    notes: Option<String>,
}

/// Command to process `add`. Validates the submission, appends it to the
/// freshly loaded table and persists the whole table back. A rejected
/// submission persists nothing.
pub async fn process_add_command(
    AddCommand {
        subject,
        duration,
        date,
        date_style,
        goal,
        content,
        notes,
    }: AddCommand,
    store: &impl RecordStore,
    config: &AppConfig,
) -> Result<()> {
    let date = match parse_session_date(date, date_style) {
        Ok(value) => value,
        Err(value) => return Err(value),
    };

    let record = StudyRecord {
        date,
        subject: subject.trim().into(),
        minutes: config.unit.to_minutes(duration),
        goal: goal.unwrap_or_default(),
        notes: notes.unwrap_or_default(),
        content: content.unwrap_or_default(),
    };

    let mut loaded = store.load().await?;
    report_skipped(&loaded.skipped);

    if let Err(e) = loaded.table.append(record.clone()) {
        return Err(Args::command()
            .error(clap::error::ErrorKind::ValueValidation, e.to_string())
            .into());
    }

    store.persist(&loaded.table).await?;

    println!(
        "Saved {} - {} ({})",
        record.date.format(DATE_FORMAT),
        record.subject,
        format_minutes(record.minutes, config.unit)
    );
    Ok(())
}

fn parse_session_date(date: Option<String>, date_style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    match date.map(|s| parse_date_string(&s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local).date_naive()),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate session date {e}"),
            )
            .into()),
        None => Ok(now.date_naive()),
    }
}
