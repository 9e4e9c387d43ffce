use super::primitive::{MountPrimitive, UriOpener};
use super::types::*;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use url::Url;

/// Mock mount primitive for testing. Never completes on its own; tests decide
/// when and how each request finishes.
#[derive(Clone, Default)]
pub struct MockMountPrimitive {
    calls: Arc<Mutex<Vec<(RequestId, MountRequest)>>>,
    cancelled: Arc<Mutex<Vec<RequestId>>>,
    next_id: Arc<Mutex<u64>>,
    immediate_status: Arc<Mutex<Option<i32>>>,
    completions: Arc<Mutex<Option<CompletionSender>>>,
}

impl MockMountPrimitive {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next request will get this id; later ones count up from it
    pub fn set_next_id(&self, id: u64) {
        *self.next_id.lock().unwrap() = id;
    }

    /// Reject subsequent requests synchronously with `status`
    pub fn set_should_fail(&self, status: Option<i32>) {
        *self.immediate_status.lock().unwrap() = status;
    }

    pub fn calls(&self) -> Vec<(RequestId, MountRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<RequestId> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Deliver a completion the way a real primitive would
    pub fn complete(&self, request_id: RequestId, status: i32, mounted_paths: Vec<PathBuf>) {
        let sender = self.completions.lock().unwrap().clone();
        sender
            .expect("no request has been issued")
            .send(MountCompletion {
                request_id,
                status,
                mounted_paths,
            })
            .unwrap();
    }
}

impl MountPrimitive for MockMountPrimitive {
    fn mount_async(
        &self,
        request: MountRequest,
        completions: CompletionSender,
    ) -> std::result::Result<RequestId, i32> {
        if let Some(status) = *self.immediate_status.lock().unwrap() {
            return Err(status);
        }

        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = RequestId::new(*next - 1);
        drop(next);

        self.calls.lock().unwrap().push((id, request));
        *self.completions.lock().unwrap() = Some(completions);
        Ok(id)
    }

    fn cancel(&self, request_id: RequestId) {
        self.cancelled.lock().unwrap().push(request_id);
    }

    fn describe(&self, request: &MountRequest) -> String {
        format!("mock mount {}", request.uri)
    }
}

/// Mock opener that records every URI it is given
#[derive(Clone)]
pub struct MockOpener {
    opened: Arc<Mutex<Vec<Url>>>,
    accept: bool,
}

impl MockOpener {
    pub fn new(accept: bool) -> Self {
        Self {
            opened: Arc::new(Mutex::new(Vec::new())),
            accept,
        }
    }

    pub fn opened(&self) -> Vec<Url> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl UriOpener for MockOpener {
    async fn open(&self, uri: &Url) -> bool {
        self.opened.lock().unwrap().push(uri.clone());
        self.accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> MountRequest {
        MountRequest {
            uri: Url::parse("smb://server/share").unwrap(),
            mount_dir: PathBuf::from("/tmp/yard"),
            options: MountOptions::new(),
        }
    }

    #[tokio::test]
    async fn test_mock_mount_primitive() {
        let primitive = MockMountPrimitive::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        primitive.set_next_id(42);

        let id = primitive.mount_async(request(), tx.clone()).unwrap();
        assert_eq!(id, RequestId::new(42));
        assert_eq!(primitive.calls().len(), 1);

        primitive.complete(id, STATUS_OK, vec![PathBuf::from("/mnt/share")]);
        let completion = rx.recv().await.unwrap();
        assert!(completion.is_success());

        primitive.cancel(id);
        assert_eq!(primitive.cancelled(), vec![id]);

        // Test failure mode
        primitive.set_should_fail(Some(5));
        assert_eq!(primitive.mount_async(request(), tx), Err(5));
        assert_eq!(primitive.calls().len(), 1);
    }
}
