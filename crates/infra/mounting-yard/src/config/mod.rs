mod manager;
mod types;

pub use manager::ConfigManager;
pub use types::*;
