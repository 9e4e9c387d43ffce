use super::{account_label, state_label};
use crate::context::Context;
use anyhow::Result;
use colored::Colorize;
use mounting_yard::EndpointSnapshot;
use mounting_yard::mount::validated_mount_point;
use yard_journal::chrono::Utc;
use yard_journal::{AttemptOutcome, MountRecord};

pub fn execute(mut ctx: Context, name: Option<&str>, json: bool) -> Result<()> {
    let mut endpoints = ctx.store.load()?;

    let ids = match name {
        Some(name) => vec![endpoints.require(name)?],
        None => endpoints.iter().map(|e| e.id()).collect(),
    };

    // Drop recorded mount points that have gone away
    for id in &ids {
        if let Some(endpoint) = endpoints.get_mut(*id) {
            validated_mount_point(endpoint);
        }
    }
    ctx.store.save(&mut endpoints)?;

    let snapshots: Vec<EndpointSnapshot> = ids
        .iter()
        .filter_map(|id| endpoints.get(*id))
        .map(|e| e.snapshot())
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("No endpoints saved");
        return Ok(());
    }

    let today = todays_attempts(&ctx).unwrap_or_else(|e| {
        tracing::debug!("Mount journal unavailable: {}", e);
        Vec::new()
    });

    for endpoint in ids.iter().filter_map(|id| endpoints.get(*id)) {
        println!("{}", endpoint.name().cyan().bold());
        println!("  Address: {}", endpoint.address());
        println!("  Account: {}", account_label(endpoint));
        println!("  State: {}", state_label(endpoint.state()));
        if let Some(last) = today.iter().rev().find(|r| r.endpoint == endpoint.name()) {
            println!("  Last attempt today: {}", describe_attempt(last));
        }
    }

    Ok(())
}

fn todays_attempts(ctx: &Context) -> Result<Vec<MountRecord>> {
    Ok(ctx.journal()?.read_day(Utc::now().date_naive())?)
}

fn describe_attempt(record: &MountRecord) -> String {
    let when = record.completed_at.format("%H:%M:%S UTC");
    let what = match record.outcome {
        AttemptOutcome::Mounted => "mounted".green().to_string(),
        AttemptOutcome::AlreadyMounted => "already mounted".green().to_string(),
        AttemptOutcome::OpenedExternally => "opened externally".to_string(),
        AttemptOutcome::Failed | AttemptOutcome::Rejected => match record.status {
            Some(status) => format!("{} (status {status})", "failed".red()),
            None => "failed".red().to_string(),
        },
        AttemptOutcome::TimedOut => "timed out".yellow().to_string(),
    };
    format!("{what} at {when} after {} ms", record.duration_ms)
}
