use super::{account_label, state_label};
use crate::context::Context;
use anyhow::Result;
use colored::Colorize;
use mounting_yard::EndpointSnapshot;

pub fn execute(mut ctx: Context, json: bool) -> Result<()> {
    let endpoints = ctx.store.load()?;

    if json {
        let snapshots: Vec<EndpointSnapshot> = endpoints.iter().map(|e| e.snapshot()).collect();
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    if endpoints.is_empty() {
        println!("No endpoints saved in {}", ctx.store.dir().display());
        println!("\nAdd one with:");
        println!("  {}", "yard add <name> <address>".cyan());
        return Ok(());
    }

    println!("{}", "Endpoints:".bold());
    for endpoint in endpoints.iter() {
        println!(
            "  {} {}",
            endpoint.name().cyan(),
            format!("[{}]", endpoint.kind().label()).dimmed()
        );
        println!("    Address: {}", endpoint.address());
        println!("    Account: {}", account_label(endpoint));
        println!("    State: {}", state_label(endpoint.state()));
    }

    Ok(())
}
