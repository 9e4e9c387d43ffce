mod set;
mod types;

pub use set::EndpointSet;
pub use types::*;
