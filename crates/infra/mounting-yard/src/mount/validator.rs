use crate::endpoint::{Endpoint, MountState};
use std::path::PathBuf;
use tracing::debug;

/// Return the endpoint's recorded mount point if it still exists.
///
/// A recorded point that has vanished (the volume was ejected behind our back)
/// is cleared back to [`MountState::Idle`]. Only checked on demand.
pub fn validated_mount_point(endpoint: &mut Endpoint) -> Option<PathBuf> {
    let path = endpoint.state().mounted_path()?.to_path_buf();
    if path.exists() {
        return Some(path);
    }

    debug!(
        "Mount point {} of '{}' is gone; marking idle",
        path.display(),
        endpoint.name()
    );
    endpoint.set_state(MountState::Idle);
    None
}
