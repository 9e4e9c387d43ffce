use crate::context::Context;
use anyhow::{Result, bail};
use colored::Colorize;

/// Requested modifications; `None` leaves a field alone
#[derive(Debug, Default)]
pub struct Changes {
    pub address: Option<String>,
    pub username: Option<String>,
    pub guest: Option<bool>,
    pub rename: Option<String>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.username.is_none()
            && self.guest.is_none()
            && self.rename.is_none()
    }
}

pub fn execute(mut ctx: Context, name: &str, changes: Changes) -> Result<()> {
    if changes.is_empty() {
        bail!("Nothing to change; see `yard edit --help`");
    }

    let mut endpoints = ctx.store.load()?;
    let id = endpoints.require(name)?;

    if let Some(endpoint) = endpoints.get_mut(id) {
        if let Some(address) = changes.address
            && endpoint.set_address(address)
        {
            println!("Address of {} changed; any recorded mount point was dropped", name.cyan());
        }

        let mut credentials = endpoint.credentials().clone();
        if let Some(username) = changes.username {
            credentials.username = Some(username).filter(|u| !u.trim().is_empty());
        }
        if let Some(guest) = changes.guest {
            credentials.guest = guest;
        }
        endpoint.set_credentials(credentials);
    }

    let final_name = match changes.rename {
        Some(new_name) => {
            endpoints.rename(id, new_name.as_str())?;
            new_name
        }
        None => name.to_string(),
    };

    ctx.store.save(&mut endpoints)?;
    println!("{} Updated endpoint {}", "✓".green(), final_name.cyan());
    Ok(())
}
