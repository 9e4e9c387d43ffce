use crate::context::{Context, record};
use anyhow::{Result, bail};
use async_trait::async_trait;
use colored::Colorize;
use mounting_yard::mount::{ensure_mount_dir, parse_address};
use mounting_yard::{
    MountEvent, MountOutcome, MountYard, UriOpener, YardError, detect_platform,
    get_mount_primitive, get_uri_opener,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};
use url::Url;
use yard_journal::{AttemptOutcome, AttemptTimer, JournalWriter};

/// Extra time on top of the mount timeout before giving up on results
const WAIT_GRACE: Duration = Duration::from_secs(5);

/// Stand-in when the desktop has no opener; refuses everything
struct NoOpener;

#[async_trait]
impl UriOpener for NoOpener {
    async fn open(&self, uri: &Url) -> bool {
        warn!("No desktop opener available for {}", uri);
        false
    }
}

struct Pending {
    timer: AttemptTimer,
    scheme: String,
}

pub async fn execute(
    mut ctx: Context,
    names: Vec<String>,
    no_wait: bool,
    wait_secs: Option<u64>,
) -> Result<()> {
    let endpoints = ctx.store.load()?;
    let mut schemes = HashMap::new();
    for name in &names {
        let id = endpoints.require(name)?;
        let scheme = endpoints
            .get(id)
            .and_then(|e| parse_address(e.address()).ok())
            .map(|uri| uri.scheme().to_string())
            .unwrap_or_default();
        schemes.insert(name.clone(), scheme);
    }

    let platform = detect_platform()?;
    let primitive = get_mount_primitive(&platform, no_wait)?;
    let opener = get_uri_opener(&platform).unwrap_or_else(|e| -> Box<dyn UriOpener> {
        warn!("{}; non-native addresses cannot be opened", e);
        Box::new(NoOpener)
    });

    let settings = ctx.config.orchestrator_settings()?;
    ensure_mount_dir(&settings.mount_dir).await?;
    let journal = ctx.journal()?;

    let (yard, task) = MountYard::spawn(endpoints, settings, primitive, opener);
    let mut events = yard.subscribe();
    let mut pending: HashMap<String, Pending> = HashMap::new();
    let mut failures = 0usize;

    for name in names {
        let timer = AttemptTimer::start();
        let scheme = schemes.remove(&name).unwrap_or_default();

        match yard.mount(&name).await {
            Ok(MountOutcome::Requested(request_id)) => {
                println!("{} Connecting {} ({})", "→".cyan(), name.cyan(), request_id);
                pending.insert(name, Pending { timer, scheme });
            }
            Ok(MountOutcome::RequestAlreadyPending) => {
                println!("{} is already connecting", name.cyan());
            }
            Ok(MountOutcome::AlreadyMounted(path)) => {
                println!(
                    "{} {} is mounted at {}",
                    "✓".green(),
                    name.cyan(),
                    path.display()
                );
                let entry = timer
                    .finish(&name, scheme, AttemptOutcome::AlreadyMounted)
                    .with_mount_path(path);
                record(&journal, &entry);
            }
            Ok(MountOutcome::OpenedExternally { opened }) => {
                if opened {
                    println!("{} Opened {} with the desktop", "✓".green(), name.cyan());
                } else {
                    failures += 1;
                    eprintln!("{} The desktop could not open {}", "✗".red(), name.cyan());
                }
                let outcome = if opened {
                    AttemptOutcome::OpenedExternally
                } else {
                    AttemptOutcome::Failed
                };
                record(&journal, &timer.finish(&name, scheme, outcome));
            }
            Err(e) => {
                failures += 1;
                eprintln!("{} {}: {}", "✗".red(), name.cyan(), e);
                let mut entry = timer.finish(&name, scheme, AttemptOutcome::Rejected);
                if let YardError::MountTransport { code } = e {
                    entry = entry.with_status(code);
                }
                record(&journal, &entry);
            }
        }
    }

    if no_wait {
        if !pending.is_empty() {
            println!("Not waiting for {} connection(s)", pending.len());
        }
    } else {
        let limit = wait_secs.map_or_else(
            || ctx.config.mount_timeout() + WAIT_GRACE,
            Duration::from_secs,
        );
        failures += wait_for_results(&mut events, &mut pending, &journal, limit).await;
    }

    let mut endpoints = yard.shutdown().await?;
    task.await?;
    if !no_wait {
        ctx.store.save(&mut endpoints)?;
    }

    if failures > 0 {
        bail!("{failures} connection(s) did not succeed");
    }
    Ok(())
}

/// Drain events until every pending endpoint has reported or `limit` passes.
/// Returns the number of endpoints that did not mount.
async fn wait_for_results(
    events: &mut tokio::sync::broadcast::Receiver<MountEvent>,
    pending: &mut HashMap<String, Pending>,
    journal: &JournalWriter,
    limit: Duration,
) -> usize {
    let deadline = Instant::now() + limit;
    let mut failures = 0;

    while !pending.is_empty() {
        let event = match timeout_at(deadline, events.recv()).await {
            Ok(Ok(event)) => event,
            Ok(Err(RecvError::Lagged(skipped))) => {
                warn!("Missed {} mount events", skipped);
                continue;
            }
            Ok(Err(RecvError::Closed)) | Err(_) => break,
        };

        let Some(Pending { timer, scheme }) = pending.remove(event.name()) else {
            debug!("Ignoring event for {}", event.name());
            continue;
        };

        match event {
            MountEvent::MountSucceeded {
                name,
                path,
                elapsed,
                ..
            } => {
                println!(
                    "{} {} mounted at {} ({:.1?})",
                    "✓".green(),
                    name.cyan(),
                    path.display(),
                    elapsed
                );
                let entry = timer
                    .finish(&name, scheme, AttemptOutcome::Mounted)
                    .with_mount_path(path);
                record(journal, &entry);
            }
            MountEvent::MountFailed { name, status, .. } => {
                failures += 1;
                eprintln!(
                    "{} {} failed to mount (status {})",
                    "✗".red(),
                    name.cyan(),
                    status
                );
                let entry = timer
                    .finish(&name, scheme, AttemptOutcome::Failed)
                    .with_status(status);
                record(journal, &entry);
            }
            MountEvent::AlreadyMounted { name, path, .. } => {
                let entry = timer
                    .finish(&name, scheme, AttemptOutcome::AlreadyMounted)
                    .with_mount_path(path);
                record(journal, &entry);
            }
        }
    }

    for (name, Pending { timer, scheme }) in pending.drain() {
        failures += 1;
        eprintln!("{} Gave up waiting for {}", "✗".red(), name.cyan());
        record(journal, &timer.finish(&name, scheme, AttemptOutcome::TimedOut));
    }

    failures
}
