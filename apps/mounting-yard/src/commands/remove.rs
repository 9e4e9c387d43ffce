use crate::context::Context;
use anyhow::Result;
use colored::Colorize;

pub fn execute(mut ctx: Context, name: &str) -> Result<()> {
    let mut endpoints = ctx.store.load()?;
    let id = endpoints.require(name)?;
    endpoints.remove(id);
    ctx.store.save(&mut endpoints)?;

    println!("{} Removed endpoint {}", "✓".green(), name.cyan());
    Ok(())
}
