use crate::mount::RequestId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Stable handle for an endpoint inside an [`EndpointSet`](super::EndpointSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointId(pub(crate) u64);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endpoint#{}", self.0)
    }
}

/// Authentication settings for an endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name to connect as
    pub username: Option<String>,

    /// Connect anonymously (guest access)
    pub guest: bool,
}

impl Credentials {
    pub fn guest() -> Self {
        Self {
            username: None,
            guest: true,
        }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self {
            username: Some(name.into()),
            guest: false,
        }
    }

    /// The username to present to the server, if any.
    ///
    /// Guest mode suppresses the username even when one is recorded.
    pub fn effective_username(&self) -> Option<&str> {
        if self.guest {
            return None;
        }
        self.username.as_deref().filter(|u| !u.is_empty())
    }
}

/// Live mount status of an endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum MountState {
    /// Nothing mounted and nothing in flight
    #[default]
    Idle,

    /// A mount request is outstanding with the primitive
    Requesting(RequestId),

    /// Last known mount location. Advisory until validated.
    Mounted(PathBuf),
}

impl MountState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        match self {
            Self::Requesting(id) => Some(*id),
            _ => None,
        }
    }

    pub fn mounted_path(&self) -> Option<&Path> {
        match self {
            Self::Mounted(path) => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for MountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Requesting(id) => write!(f, "connecting ({id})"),
            Self::Mounted(path) => write!(f, "mounted at {}", path.display()),
        }
    }
}

/// Coarse classification of an endpoint, derived from its address scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Afp,
    Ftp,
    Smb,
    Vnc,
    Other,
}

impl EndpointKind {
    pub fn from_address(address: &str) -> Self {
        match Url::parse(address.trim()) {
            Ok(url) => match url.scheme() {
                "afp" => Self::Afp,
                "ftp" => Self::Ftp,
                "smb" | "cifs" => Self::Smb,
                "vnc" => Self::Vnc,
                _ => Self::Other,
            },
            Err(_) => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Afp => "afp",
            Self::Ftp => "ftp",
            Self::Smb => "smb",
            Self::Vnc => "vnc",
            Self::Other => "other",
        }
    }
}

/// A user-defined remote share plus its live mount status.
///
/// Mount state is only changed by the orchestrator; address edits go through
/// [`MountOrchestrator::set_address`](crate::mount::MountOrchestrator::set_address)
/// so an in-flight request can be cancelled first.
#[derive(Debug, Clone)]
pub struct Endpoint {
    id: EndpointId,
    name: String,
    address: String,
    credentials: Credentials,
    kind: EndpointKind,
    state: MountState,
    modified: bool,
}

impl Endpoint {
    pub(crate) fn new(
        id: EndpointId,
        name: String,
        address: String,
        credentials: Credentials,
    ) -> Self {
        let kind = EndpointKind::from_address(&address);
        Self {
            id,
            name,
            address,
            credentials,
            kind,
            state: MountState::Idle,
            modified: true,
        }
    }

    pub fn id(&self) -> EndpointId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn state(&self) -> &MountState {
        &self.state
    }

    /// Whether the endpoint changed since it was last persisted
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Would replacing the address with `address` point somewhere else?
    pub fn is_material_change(&self, address: &str) -> bool {
        normalize_address(&self.address) != normalize_address(address)
    }

    /// Replace the address. A material change drops any mount state back to idle
    /// and recomputes the kind. Returns whether the change was material.
    pub fn set_address(&mut self, address: impl Into<String>) -> bool {
        let address = address.into();
        let material = self.is_material_change(&address);
        self.address = address;
        self.kind = EndpointKind::from_address(&self.address);
        self.modified = true;
        if material {
            self.state = MountState::Idle;
        }
        material
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        if self.credentials != credentials {
            self.credentials = credentials;
            self.modified = true;
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
        self.modified = true;
    }

    pub(crate) fn set_state(&mut self, state: MountState) {
        if self.state != state {
            self.state = state;
            self.modified = true;
        }
    }

    /// Restore a persisted mount point. Only valid on an idle endpoint.
    pub(crate) fn restore_mount_point(&mut self, path: PathBuf) {
        if self.state.is_idle() {
            self.state = MountState::Mounted(path);
        }
    }

    pub fn snapshot(&self) -> EndpointSnapshot {
        EndpointSnapshot {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            credentials: self.credentials.clone(),
            kind: self.kind,
            state: self.state.clone(),
        }
    }
}

/// Owned copy of an endpoint's visible fields, safe to hand across tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSnapshot {
    pub id: EndpointId,
    pub name: String,
    pub address: String,
    pub credentials: Credentials,
    pub kind: EndpointKind,
    pub state: MountState,
}

fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    Url::parse(trimmed).map_or_else(|_| trimmed.to_string(), |url| url.to_string())
}
