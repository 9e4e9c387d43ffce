use crate::endpoint::EndpointId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// Status code reported by a mount primitive when an operation succeeded
pub const STATUS_OK: i32 = 0;

/// Opaque token identifying an outstanding request with the mount primitive.
///
/// Only unique among requests that are currently outstanding; a primitive may
/// hand out the same value again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request#{}", self.0)
    }
}

/// Options handed to the mount primitive for a single request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountOptions {
    /// Authenticate as guest / anonymous
    pub anonymous: bool,

    /// Account to authenticate as
    pub username: Option<String>,

    /// Give up after this long
    pub timeout: Option<Duration>,
}

impl MountOptions {
    pub fn new() -> Self {
        Self {
            anonymous: false,
            username: None,
            timeout: Some(crate::platform::common::MOUNT_TIMEOUT),
        }
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A native mount request
#[derive(Debug, Clone)]
pub struct MountRequest {
    /// Address of the share
    pub uri: Url,

    /// Shared directory under which the primitive places its mounts
    pub mount_dir: PathBuf,

    pub options: MountOptions,
}

/// Out-of-band result of a mount request, delivered on the completion channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountCompletion {
    pub request_id: RequestId,
    pub status: i32,
    pub mounted_paths: Vec<PathBuf>,
}

impl MountCompletion {
    pub fn success(request_id: RequestId, mounted_paths: Vec<PathBuf>) -> Self {
        Self {
            request_id,
            status: STATUS_OK,
            mounted_paths,
        }
    }

    pub fn failure(request_id: RequestId, status: i32) -> Self {
        Self {
            request_id,
            status,
            mounted_paths: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}

pub type CompletionSender = mpsc::UnboundedSender<MountCompletion>;
pub type CompletionReceiver = mpsc::UnboundedReceiver<MountCompletion>;

/// Immediate result of asking the orchestrator to mount an endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// The recorded mount point is still live; nothing was issued
    AlreadyMounted(PathBuf),

    /// A request for this endpoint is already outstanding; nothing was issued
    RequestAlreadyPending,

    /// A native request was issued; watch for its event
    Requested(RequestId),

    /// The address was handed to the external opener
    OpenedExternally { opened: bool },
}

/// Notifications for UI and journal consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountEvent {
    MountSucceeded {
        endpoint: EndpointId,
        name: String,
        path: PathBuf,
        elapsed: Duration,
    },
    MountFailed {
        endpoint: EndpointId,
        name: String,
        status: i32,
        elapsed: Duration,
    },
    AlreadyMounted {
        endpoint: EndpointId,
        name: String,
        path: PathBuf,
    },
}

impl MountEvent {
    pub fn endpoint(&self) -> EndpointId {
        match self {
            Self::MountSucceeded { endpoint, .. }
            | Self::MountFailed { endpoint, .. }
            | Self::AlreadyMounted { endpoint, .. } => *endpoint,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::MountSucceeded { name, .. }
            | Self::MountFailed { name, .. }
            | Self::AlreadyMounted { name, .. } => name,
        }
    }
}
