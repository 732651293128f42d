use anyhow::Result;

use super::args::StatusCliArgs;
use crate::api::{sort_for_display, AudioRecord};
use crate::poller::{FetchKind, FetchOutcome, PollerConfig, StatusPoller};

fn print_records(records: &[AudioRecord]) {
    if records.is_empty() {
        println!("No meetings found. Record one with: voxminute record");
        return;
    }

    let mut records = records.to_vec();
    sort_for_display(&mut records);

    println!("{:<38} {:<28} {:<20} STATUS", "ID", "FILENAME", "UPLOADED");
    for record in &records {
        println!(
            "{:<38} {:<28} {:<20} {}",
            record.id,
            record.filename,
            record.upload_time.as_deref().unwrap_or("-"),
            record.status.as_str()
        );
    }
}

pub async fn handle_status_command(args: StatusCliArgs) -> Result<()> {
    let (config, client) = super::authed_client()?;
    let poller_config = PollerConfig::from_settings(&config.poller);
    let mut poller = StatusPoller::new(client, poller_config);

    if args.watch {
        poller.run(print_records).await;
        return Ok(());
    }

    let bar = super::upload::spinner("Fetching records...");
    let outcome = poller.fetch(FetchKind::Manual).await;
    bar.finish_and_clear();

    match outcome {
        FetchOutcome::GaveUp => {
            eprintln!("Network error. Please try again.");
            anyhow::bail!("could not reach the backend");
        }
        _ => {
            print_records(poller.records());
            Ok(())
        }
    }
}
