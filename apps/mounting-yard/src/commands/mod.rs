pub mod add;
pub mod connect;
pub mod edit;
pub mod list;
pub mod remove;
pub mod status;
pub mod transfer;

use colored::Colorize;
use mounting_yard::{Endpoint, MountState};

/// One-word, colored state for listings
pub(crate) fn state_label(state: &MountState) -> String {
    match state {
        MountState::Idle => "idle".dimmed().to_string(),
        MountState::Requesting(_) => "connecting".yellow().to_string(),
        MountState::Mounted(path) => format!("{} {}", "mounted".green(), path.display()),
    }
}

pub(crate) fn account_label(endpoint: &Endpoint) -> String {
    let credentials = endpoint.credentials();
    if credentials.guest {
        "guest".to_string()
    } else {
        credentials
            .effective_username()
            .unwrap_or("-")
            .to_string()
    }
}
