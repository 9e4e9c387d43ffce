mod dispatcher;
mod opener;
mod orchestrator;
mod primitive;
mod registry;
mod types;
mod utils;
mod validator;
mod yard;

#[cfg(unix)]
mod gio;

#[cfg(test)]
mod mock;

pub use dispatcher::{Route, SchemeDispatcher, external_uri};
pub use opener::SystemOpener;
pub use orchestrator::{
    MountOrchestrator, OrchestratorSettings, STATUS_NO_MOUNT_POINT, STATUS_REQUEST_ID_IN_USE,
    parse_address,
};
pub use primitive::{MountPrimitive, UriOpener, get_mount_primitive, get_uri_opener};
pub use registry::{Released, RequestRegistry};
pub use types::*;
pub use utils::ensure_mount_dir;
pub use validator::validated_mount_point;
pub use yard::{MountYard, YardHandle};

#[cfg(unix)]
pub use gio::GioMountPrimitive;

#[cfg(test)]
pub use mock::{MockMountPrimitive, MockOpener};
