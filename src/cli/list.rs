use anyhow::Result;
use clap::Parser;

use crate::{
    cli::output::{
        analysis::{browse, filter_by_subject},
        render_records,
    },
    config::AppConfig,
    store::{entities::SubjectFilter, record_store::RecordStore},
};

use super::report_skipped;

#[derive(Debug, Parser)]
pub struct ListCommand {
    #[arg(
        long,
        short,
        default_value_t = SubjectFilter::All,
        help = "Only include one subject. ALL keeps every subject"
    )]
    subject: SubjectFilter,
}

/// Command to process `list`: every logged session, newest day first.
pub async fn process_list_command(
    ListCommand { subject }: ListCommand,
    store: &impl RecordStore,
    config: &AppConfig,
) -> Result<()> {
    let loaded = store.load().await?;
    report_skipped(&loaded.skipped);

    if loaded.table.is_empty() {
        println!("No study records yet.");
        return Ok(());
    }

    let filtered = filter_by_subject(&loaded.table, &subject);
    if filtered.is_empty() {
        println!("No records match the selected filters.");
        return Ok(());
    }

    render_records(&browse(&filtered), config);
    Ok(())
}
