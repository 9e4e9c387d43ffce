use crate::context::Context;
use anyhow::Result;
use colored::Colorize;
use mounting_yard::Credentials;
use mounting_yard::mount::parse_address;
use tracing::warn;

pub fn execute(
    mut ctx: Context,
    name: String,
    address: String,
    username: Option<String>,
    guest: bool,
) -> Result<()> {
    let mut endpoints = ctx.store.load()?;

    if parse_address(&address).is_err() {
        warn!("'{}' is not a valid address; connecting will fail until it is fixed", address);
    }

    let credentials = Credentials {
        username: username.filter(|u| !u.trim().is_empty()),
        guest,
    };
    endpoints.insert(name.as_str(), address, credentials)?;
    ctx.store.save(&mut endpoints)?;

    println!("{} Added endpoint {}", "✓".green(), name.cyan());
    Ok(())
}
