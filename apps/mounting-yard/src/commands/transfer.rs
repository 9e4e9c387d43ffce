use crate::context::Context;
use anyhow::Result;
use colored::Colorize;
use mounting_yard::EndpointStore;
use std::path::Path;

pub fn export(mut ctx: Context, path: &Path) -> Result<()> {
    let endpoints = ctx.store.load()?;
    let count = EndpointStore::export(&endpoints, path)?;
    println!("{} Exported {} endpoints", "✓".green(), count);
    Ok(())
}

pub fn import(mut ctx: Context, path: &Path) -> Result<()> {
    let mut endpoints = ctx.store.load()?;
    let count = EndpointStore::import(&mut endpoints, path)?;
    ctx.store.save(&mut endpoints)?;
    println!("{} Imported {} endpoints", "✓".green(), count);
    Ok(())
}
