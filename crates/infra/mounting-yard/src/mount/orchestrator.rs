use super::dispatcher::{Route, SchemeDispatcher, external_uri};
use super::primitive::{MountPrimitive, UriOpener};
use super::registry::RequestRegistry;
use super::types::*;
use super::validator::validated_mount_point;
use crate::endpoint::{Credentials, Endpoint, EndpointId, EndpointSet, EndpointSnapshot, MountState};
use crate::error::{Result, YardError};
use crate::platform::common::MOUNT_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Status reported for a "successful" completion that named no mount point (EIO)
pub const STATUS_NO_MOUNT_POINT: i32 = 5;

/// Status reported when the primitive hands out an id that is still outstanding (EBUSY)
pub const STATUS_REQUEST_ID_IN_USE: i32 = 16;

/// Tunables for a [`MountOrchestrator`]
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub dispatcher: SchemeDispatcher,

    /// Directory shared by every native mount
    pub mount_dir: PathBuf,

    pub mount_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            dispatcher: SchemeDispatcher::default(),
            mount_dir: std::env::temp_dir().join("mounting-yard"),
            mount_timeout: MOUNT_TIMEOUT,
        }
    }
}

/// Turns "connect" intents into tracked requests against the mount primitive.
///
/// All methods must be called from a single serialized context (see
/// [`MountYard`](super::MountYard)); completions from the primitive arrive on
/// the channel handed to [`MountOrchestrator::new`] and are fed back through
/// [`MountOrchestrator::handle_completion`] on that same context.
pub struct MountOrchestrator {
    registry: RequestRegistry,
    settings: OrchestratorSettings,
    primitive: Box<dyn MountPrimitive>,
    opener: Box<dyn UriOpener>,
    completions: CompletionSender,
}

impl MountOrchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        primitive: Box<dyn MountPrimitive>,
        opener: Box<dyn UriOpener>,
        completions: CompletionSender,
    ) -> Self {
        Self {
            registry: RequestRegistry::new(),
            settings,
            primitive,
            opener,
            completions,
        }
    }

    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Connect an endpoint.
    ///
    /// Short-circuits on a live mount point or an outstanding request, rejects
    /// unparseable addresses, hands non-native schemes to the opener, and
    /// otherwise issues exactly one native request.
    pub async fn mount(
        &mut self,
        endpoints: &mut EndpointSet,
        id: EndpointId,
    ) -> Result<MountOutcome> {
        let endpoint = lookup(endpoints, id)?;

        if let Some(path) = validated_mount_point(endpoint) {
            debug!("'{}' is already mounted at {}", endpoint.name(), path.display());
            return Ok(MountOutcome::AlreadyMounted(path));
        }

        if let Some(request_id) = self.registry.request_for(id) {
            debug!("'{}' already has {} in flight", endpoint.name(), request_id);
            return Ok(MountOutcome::RequestAlreadyPending);
        }

        let uri = parse_address(endpoint.address())?;

        if self.settings.dispatcher.route(uri.scheme()) == Route::ExternalOpen {
            let target = external_uri(&uri, endpoint.credentials());
            info!("Handing '{}' to the desktop: {}", endpoint.name(), uri);
            let opened = self.opener.open(&target).await;
            return Ok(MountOutcome::OpenedExternally { opened });
        }

        let request = MountRequest {
            uri,
            mount_dir: self.settings.mount_dir.clone(),
            options: mount_options(endpoint.credentials(), self.settings.mount_timeout),
        };

        match self.primitive.mount_async(request, self.completions.clone()) {
            Ok(request_id) => {
                if !self.registry.register(request_id, id) {
                    // The id belongs to another endpoint's live request; leave it be
                    error!(
                        "Mount primitive reused outstanding {} for '{}'",
                        request_id,
                        endpoint.name()
                    );
                    return Err(YardError::MountTransport {
                        code: STATUS_REQUEST_ID_IN_USE,
                    });
                }
                info!("Issued {} for '{}'", request_id, endpoint.name());
                endpoint.set_state(MountState::Requesting(request_id));
                Ok(MountOutcome::Requested(request_id))
            }
            Err(code) => {
                warn!("Mount of '{}' rejected with status {}", endpoint.name(), code);
                Err(YardError::MountTransport { code })
            }
        }
    }

    /// Apply a completion from the primitive.
    ///
    /// Completions for ids the registry no longer knows (cancelled, already
    /// completed or foreign) are ignored.
    pub fn handle_completion(
        &mut self,
        endpoints: &mut EndpointSet,
        completion: MountCompletion,
    ) -> Option<MountEvent> {
        let Some(released) = self.registry.release(completion.request_id) else {
            debug!("Ignoring completion for unknown {}", completion.request_id);
            return None;
        };

        let Some(endpoint) = endpoints.get_mut(released.endpoint) else {
            debug!(
                "{} finished for {}, which no longer exists",
                completion.request_id, released.endpoint
            );
            return None;
        };

        let status = if completion.is_success() {
            if let Some(path) = completion.mounted_paths.into_iter().next() {
                info!(
                    "'{}' mounted at {} in {:?}",
                    endpoint.name(),
                    path.display(),
                    released.elapsed
                );
                endpoint.set_state(MountState::Mounted(path.clone()));
                return Some(MountEvent::MountSucceeded {
                    endpoint: endpoint.id(),
                    name: endpoint.name().to_string(),
                    path,
                    elapsed: released.elapsed,
                });
            }
            warn!("Mount of '{}' succeeded without a mount point", endpoint.name());
            STATUS_NO_MOUNT_POINT
        } else {
            completion.status
        };

        warn!("Mount of '{}' failed with status {}", endpoint.name(), status);
        endpoint.set_state(MountState::Idle);
        Some(MountEvent::MountFailed {
            endpoint: endpoint.id(),
            name: endpoint.name().to_string(),
            status,
            elapsed: released.elapsed,
        })
    }

    /// Cancel the endpoint's outstanding request, if any. Returns whether there
    /// was one.
    pub fn cancel(&mut self, endpoints: &mut EndpointSet, id: EndpointId) -> Result<bool> {
        let endpoint = lookup(endpoints, id)?;
        Ok(self.cancel_endpoint(endpoint))
    }

    fn cancel_endpoint(&mut self, endpoint: &mut Endpoint) -> bool {
        let Some(request_id) = self.registry.request_for(endpoint.id()) else {
            return false;
        };

        info!("Cancelling {} for '{}'", request_id, endpoint.name());
        self.primitive.cancel(request_id);
        self.registry.release(request_id);
        endpoint.set_state(MountState::Idle);
        true
    }

    /// Change an endpoint's address. A material change cancels any in-flight
    /// request and resets the endpoint to idle. Returns whether the change was
    /// material.
    pub fn set_address(
        &mut self,
        endpoints: &mut EndpointSet,
        id: EndpointId,
        address: impl Into<String>,
    ) -> Result<bool> {
        let address = address.into();
        let endpoint = lookup(endpoints, id)?;

        if endpoint.is_material_change(&address) && self.cancel_endpoint(endpoint) {
            info!("Address of '{}' changed while connecting", endpoint.name());
        }
        Ok(endpoint.set_address(address))
    }

    pub fn set_credentials(
        &mut self,
        endpoints: &mut EndpointSet,
        id: EndpointId,
        credentials: Credentials,
    ) -> Result<()> {
        lookup(endpoints, id)?.set_credentials(credentials);
        Ok(())
    }

    /// Remove an endpoint from the active set, cancelling its request first
    pub fn remove_endpoint(
        &mut self,
        endpoints: &mut EndpointSet,
        id: EndpointId,
    ) -> Result<Endpoint> {
        self.cancel(endpoints, id)?;
        endpoints
            .remove(id)
            .ok_or_else(|| YardError::EndpointNotFound {
                name: id.to_string(),
            })
    }

    /// Current state of an endpoint, with its mount point re-validated
    pub fn status(&mut self, endpoints: &mut EndpointSet, id: EndpointId) -> Result<EndpointSnapshot> {
        let endpoint = lookup(endpoints, id)?;
        validated_mount_point(endpoint);
        Ok(endpoint.snapshot())
    }

    /// Cancel everything still in flight
    pub fn shutdown(&mut self, endpoints: &mut EndpointSet) {
        for endpoint in endpoints.iter_mut() {
            self.cancel_endpoint(endpoint);
        }
    }
}

fn lookup(endpoints: &mut EndpointSet, id: EndpointId) -> Result<&mut Endpoint> {
    endpoints
        .get_mut(id)
        .ok_or_else(|| YardError::EndpointNotFound {
            name: id.to_string(),
        })
}

/// Parse an endpoint address, insisting on a scheme
pub fn parse_address(address: &str) -> Result<Url> {
    let invalid = || YardError::InvalidAddress {
        address: address.to_string(),
    };
    let uri = Url::parse(address.trim()).map_err(|_| invalid())?;
    if uri.scheme().is_empty() {
        return Err(invalid());
    }
    Ok(uri)
}

fn mount_options(credentials: &Credentials, timeout: Duration) -> MountOptions {
    let options = MountOptions::new().with_timeout(timeout);
    if credentials.guest {
        options.anonymous()
    } else if let Some(user) = credentials.effective_username() {
        options.with_username(user.to_string())
    } else {
        options
    }
}
