use super::orchestrator::{MountOrchestrator, OrchestratorSettings};
use super::primitive::{MountPrimitive, UriOpener};
use super::types::{CompletionReceiver, MountEvent, MountOutcome};
use crate::endpoint::{Credentials, EndpointId, EndpointSet, EndpointSnapshot};
use crate::error::{Result, YardError};
use std::ops::ControlFlow;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Mount {
        name: String,
        reply: Reply<Result<MountOutcome>>,
    },
    Cancel {
        name: String,
        reply: Reply<Result<bool>>,
    },
    Status {
        name: String,
        reply: Reply<Result<EndpointSnapshot>>,
    },
    List {
        reply: Reply<Vec<EndpointSnapshot>>,
    },
    Add {
        name: String,
        address: String,
        credentials: Credentials,
        reply: Reply<Result<EndpointId>>,
    },
    Remove {
        name: String,
        reply: Reply<Result<()>>,
    },
    Rename {
        name: String,
        new_name: String,
        reply: Reply<Result<()>>,
    },
    SetAddress {
        name: String,
        address: String,
        reply: Reply<Result<bool>>,
    },
    SetCredentials {
        name: String,
        credentials: Credentials,
        reply: Reply<Result<()>>,
    },
    Shutdown {
        reply: Reply<EndpointSet>,
    },
}

/// The single serialized context that owns the endpoint set and orchestrator.
///
/// Commands from [`YardHandle`]s and completions from the mount primitive are
/// processed one at a time on one task, so endpoint state and the request
/// registry are never touched concurrently.
pub struct MountYard {
    endpoints: EndpointSet,
    orchestrator: MountOrchestrator,
    completions: CompletionReceiver,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<MountEvent>,
}

impl MountYard {
    /// Start the yard on the current runtime
    pub fn spawn(
        endpoints: EndpointSet,
        settings: OrchestratorSettings,
        primitive: Box<dyn MountPrimitive>,
        opener: Box<dyn UriOpener>,
    ) -> (YardHandle, JoinHandle<()>) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let yard = Self {
            endpoints,
            orchestrator: MountOrchestrator::new(settings, primitive, opener, completion_tx),
            completions: completion_rx,
            commands: command_rx,
            events: event_tx.clone(),
        };

        let handle = YardHandle {
            commands: command_tx,
            events: event_tx,
        };
        (handle, tokio::spawn(yard.run()))
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                Some(completion) = self.completions.recv() => {
                    if let Some(event) = self
                        .orchestrator
                        .handle_completion(&mut self.endpoints, completion)
                    {
                        self.publish(event);
                    }
                }
                command = self.commands.recv() => match command {
                    Some(command) => {
                        if self.handle(command).await.is_break() {
                            break;
                        }
                    }
                    None => {
                        self.orchestrator.shutdown(&mut self.endpoints);
                        break;
                    }
                },
            }
        }
        info!("Mount yard stopped");
    }

    async fn handle(&mut self, command: Command) -> ControlFlow<()> {
        // A dropped reply receiver just means the caller stopped waiting
        match command {
            Command::Mount { name, reply } => {
                let _ = reply.send(self.mount(&name).await);
            }
            Command::Cancel { name, reply } => {
                let result = self
                    .endpoints
                    .require(&name)
                    .and_then(|id| self.orchestrator.cancel(&mut self.endpoints, id));
                let _ = reply.send(result);
            }
            Command::Status { name, reply } => {
                let result = self
                    .endpoints
                    .require(&name)
                    .and_then(|id| self.orchestrator.status(&mut self.endpoints, id));
                let _ = reply.send(result);
            }
            Command::List { reply } => {
                let _ = reply.send(self.endpoints.iter().map(|e| e.snapshot()).collect());
            }
            Command::Add {
                name,
                address,
                credentials,
                reply,
            } => {
                let _ = reply.send(self.endpoints.insert(name, address, credentials));
            }
            Command::Remove { name, reply } => {
                let result = self.endpoints.require(&name).and_then(|id| {
                    self.orchestrator
                        .remove_endpoint(&mut self.endpoints, id)
                        .map(drop)
                });
                let _ = reply.send(result);
            }
            Command::Rename {
                name,
                new_name,
                reply,
            } => {
                let result = self
                    .endpoints
                    .require(&name)
                    .and_then(|id| self.endpoints.rename(id, new_name));
                let _ = reply.send(result);
            }
            Command::SetAddress {
                name,
                address,
                reply,
            } => {
                let result = self.endpoints.require(&name).and_then(|id| {
                    self.orchestrator
                        .set_address(&mut self.endpoints, id, address)
                });
                let _ = reply.send(result);
            }
            Command::SetCredentials {
                name,
                credentials,
                reply,
            } => {
                let result = self.endpoints.require(&name).and_then(|id| {
                    self.orchestrator
                        .set_credentials(&mut self.endpoints, id, credentials)
                });
                let _ = reply.send(result);
            }
            Command::Shutdown { reply } => {
                self.orchestrator.shutdown(&mut self.endpoints);
                let _ = reply.send(std::mem::take(&mut self.endpoints));
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn mount(&mut self, name: &str) -> Result<MountOutcome> {
        let id = self.endpoints.require(name)?;
        let outcome = self.orchestrator.mount(&mut self.endpoints, id).await?;
        if let MountOutcome::AlreadyMounted(path) = &outcome {
            self.publish(MountEvent::AlreadyMounted {
                endpoint: id,
                name: name.to_string(),
                path: path.clone(),
            });
        }
        Ok(outcome)
    }

    fn publish(&self, event: MountEvent) {
        if self.events.send(event).is_err() {
            debug!("No subscribers for mount event");
        }
    }
}

/// Cloneable front door to a running [`MountYard`]
#[derive(Clone)]
pub struct YardHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<MountEvent>,
}

impl YardHandle {
    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<MountEvent> {
        self.events.subscribe()
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .await
            .map_err(|_| YardError::ServiceStopped)?;
        rx.await.map_err(|_| YardError::ServiceStopped)
    }

    pub async fn mount(&self, name: &str) -> Result<MountOutcome> {
        let name = name.to_string();
        self.request(|reply| Command::Mount { name, reply }).await?
    }

    pub async fn cancel(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.request(|reply| Command::Cancel { name, reply }).await?
    }

    pub async fn status(&self, name: &str) -> Result<EndpointSnapshot> {
        let name = name.to_string();
        self.request(|reply| Command::Status { name, reply }).await?
    }

    pub async fn list(&self) -> Result<Vec<EndpointSnapshot>> {
        self.request(|reply| Command::List { reply }).await
    }

    pub async fn add(
        &self,
        name: impl Into<String>,
        address: impl Into<String>,
        credentials: Credentials,
    ) -> Result<EndpointId> {
        let (name, address) = (name.into(), address.into());
        self.request(|reply| Command::Add {
            name,
            address,
            credentials,
            reply,
        })
        .await?
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        let name = name.to_string();
        self.request(|reply| Command::Remove { name, reply }).await?
    }

    pub async fn rename(&self, name: &str, new_name: impl Into<String>) -> Result<()> {
        let (name, new_name) = (name.to_string(), new_name.into());
        self.request(|reply| Command::Rename {
            name,
            new_name,
            reply,
        })
        .await?
    }

    /// Returns whether the change was material
    pub async fn set_address(&self, name: &str, address: impl Into<String>) -> Result<bool> {
        let (name, address) = (name.to_string(), address.into());
        self.request(|reply| Command::SetAddress {
            name,
            address,
            reply,
        })
        .await?
    }

    pub async fn set_credentials(&self, name: &str, credentials: Credentials) -> Result<()> {
        let name = name.to_string();
        self.request(|reply| Command::SetCredentials {
            name,
            credentials,
            reply,
        })
        .await?
    }

    /// Stop the yard, cancelling in-flight requests, and take back the
    /// endpoint set for persisting.
    pub async fn shutdown(&self) -> Result<EndpointSet> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::MountState;
    use crate::mount::mock::{MockMountPrimitive, MockOpener};
    use crate::mount::types::{RequestId, STATUS_OK};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn spawn_yard() -> (YardHandle, MockMountPrimitive, JoinHandle<()>) {
        let primitive = MockMountPrimitive::new();
        let (handle, task) = MountYard::spawn(
            EndpointSet::new(),
            OrchestratorSettings::default(),
            Box::new(primitive.clone()),
            Box::new(MockOpener::new(true)),
        );
        (handle, primitive, task)
    }

    async fn next_event(events: &mut broadcast::Receiver<MountEvent>) -> MountEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for an event")
            .unwrap()
    }

    #[tokio::test]
    async fn test_completion_publishes_event() {
        let (yard, primitive, _task) = spawn_yard();
        let mut events = yard.subscribe();
        yard.add("nas", "smb://nas/share", Credentials::guest())
            .await
            .unwrap();

        let MountOutcome::Requested(id) = yard.mount("nas").await.unwrap() else {
            panic!("expected a native request");
        };
        primitive.complete(id, STATUS_OK, vec![PathBuf::from("/mnt/nas")]);

        let event = next_event(&mut events).await;
        assert_eq!(event.name(), "nas");
        assert!(matches!(event, MountEvent::MountSucceeded { .. }));

        let status = yard.status("nas").await;
        // The mock path does not exist, so status re-validation drops it
        assert_eq!(status.unwrap().state, MountState::Idle);
    }

    #[tokio::test]
    async fn test_already_mounted_publishes_event() {
        let temp_dir = TempDir::new().unwrap();
        let (yard, primitive, _task) = spawn_yard();
        let mut events = yard.subscribe();
        yard.add("nas", "smb://nas/share", Credentials::default())
            .await
            .unwrap();
        primitive.set_next_id(3);
        yard.mount("nas").await.unwrap();
        primitive.complete(
            RequestId::new(3),
            STATUS_OK,
            vec![temp_dir.path().to_path_buf()],
        );
        next_event(&mut events).await;

        assert_eq!(
            yard.mount("nas").await.unwrap(),
            MountOutcome::AlreadyMounted(temp_dir.path().to_path_buf())
        );
        assert!(matches!(
            next_event(&mut events).await,
            MountEvent::AlreadyMounted { .. }
        ));
        assert_eq!(primitive.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_request_publishes_nothing() {
        let (yard, primitive, _task) = spawn_yard();
        let mut events = yard.subscribe();
        yard.add("nas", "smb://nas/share", Credentials::default())
            .await
            .unwrap();
        primitive.set_next_id(42);
        yard.mount("nas").await.unwrap();

        assert!(yard.cancel("nas").await.unwrap());
        primitive.complete(RequestId::new(42), STATUS_OK, vec![PathBuf::from("/mnt")]);

        // Round-trip a command so the completion has been drained
        yard.list().await.unwrap();
        assert!(events.try_recv().is_err());
        assert_eq!(yard.status("nas").await.unwrap().state, MountState::Idle);
    }

    #[tokio::test]
    async fn test_unknown_endpoint() {
        let (yard, _primitive, _task) = spawn_yard();
        let err = yard.mount("missing").await.unwrap_err();
        assert!(matches!(err, YardError::EndpointNotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_commands() {
        let (yard, primitive, _task) = spawn_yard();
        yard.add("nas", "smb://nas/share", Credentials::default())
            .await
            .unwrap();
        yard.mount("nas").await.unwrap();

        assert!(yard.set_address("nas", "smb://nas2/share").await.unwrap());
        assert_eq!(primitive.cancelled().len(), 1);

        yard.set_credentials("nas", Credentials::user("erin"))
            .await
            .unwrap();
        yard.rename("nas", "office").await.unwrap();

        let list = yard.list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "office");
        assert_eq!(list[0].address, "smb://nas2/share");
        assert_eq!(list[0].credentials, Credentials::user("erin"));

        yard.remove("office").await.unwrap();
        assert!(yard.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_returns_endpoints() {
        let (yard, primitive, task) = spawn_yard();
        yard.add("nas", "smb://nas/share", Credentials::default())
            .await
            .unwrap();
        yard.mount("nas").await.unwrap();

        let endpoints = yard.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(endpoints.len(), 1);
        assert_eq!(primitive.cancelled().len(), 1);
        assert!(matches!(
            yard.list().await.unwrap_err(),
            YardError::ServiceStopped
        ));
    }
}
