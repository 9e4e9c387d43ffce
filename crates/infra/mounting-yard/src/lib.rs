pub mod config;
pub mod endpoint;
pub mod error;
pub mod mount;
pub mod platform;
pub mod store;
pub mod utils;

pub use config::{ConfigManager, YardConfig};
pub use endpoint::{
    Credentials, Endpoint, EndpointId, EndpointKind, EndpointSet, EndpointSnapshot, MountState,
};
pub use error::{Result, YardError};
#[cfg(test)]
pub use mount::{MockMountPrimitive, MockOpener};
pub use mount::{
    CompletionSender, MountCompletion, MountEvent, MountOrchestrator, MountOutcome,
    MountPrimitive, MountRequest, MountYard, OrchestratorSettings, RequestId, UriOpener,
    YardHandle, get_mount_primitive, get_uri_opener,
};
pub use platform::{Platform, PlatformInfo, detect_platform};
pub use store::{EndpointRecord, EndpointStore};
