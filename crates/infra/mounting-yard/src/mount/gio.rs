use super::primitive::MountPrimitive;
use super::types::*;
use crate::platform::common::{GIO_LOCAL_PATH_PREFIX, MOUNT_TIMEOUT};
use nix::errno::Errno;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

/// Mounts shares through GVfs using the `gio` command line client.
///
/// GVfs decides where the FUSE view of a share lives (normally under
/// `$XDG_RUNTIME_DIR/gvfs`), so the shared mount directory of a request is only
/// reported, never used to place the mount.
pub struct GioMountPrimitive {
    /// Path to the gio binary (cached)
    gio_path: PathBuf,
    next_id: AtomicU64,
    in_flight: Arc<Mutex<HashMap<RequestId, JoinHandle<()>>>>,
    /// Leave gio children running when their task is dropped
    detached: bool,
}

impl GioMountPrimitive {
    pub fn new(gio_path: PathBuf) -> Self {
        Self {
            gio_path,
            next_id: AtomicU64::new(1),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            detached: false,
        }
    }

    /// Let `gio mount` outlive this process. Cancellation then only stops
    /// waiting for the result.
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Build gio mount arguments
    fn build_mount_args(request: &MountRequest) -> Vec<String> {
        let mut args = vec!["mount".to_string()];
        if request.options.anonymous {
            args.push("--anonymous".to_string());
        }
        args.push(uri_for_request(request).to_string());
        args
    }
}

/// The URI handed to gio, with the account name embedded when one is set
fn uri_for_request(request: &MountRequest) -> Url {
    let mut uri = request.uri.clone();
    if !request.options.anonymous
        && let Some(user) = &request.options.username
        && uri.username().is_empty()
        && uri.set_username(user).is_err()
    {
        debug!("Cannot embed username into {}", request.uri);
    }
    uri
}

/// Pull the FUSE paths out of `gio info` output
fn parse_local_paths(info_output: &str) -> Vec<PathBuf> {
    info_output
        .lines()
        .filter_map(|line| line.trim().strip_prefix(GIO_LOCAL_PATH_PREFIX))
        .map(|path| PathBuf::from(path.trim()))
        .collect()
}

fn is_already_mounted(stderr: &str) -> bool {
    stderr.contains("already mounted")
}

async fn run_mount(gio: &Path, request: &MountRequest, detached: bool) -> (i32, Vec<PathBuf>) {
    let args = GioMountPrimitive::build_mount_args(request);
    let limit = request.options.timeout.unwrap_or(MOUNT_TIMEOUT);

    let mut cmd = tokio::process::Command::new(gio);
    cmd.args(&args)
        .stdin(Stdio::null())
        .kill_on_drop(!detached);

    let output = match timeout(limit, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!("Failed to run gio: {}", e);
            return (e.raw_os_error().unwrap_or(Errno::EIO as i32), Vec::new());
        }
        Err(_) => {
            warn!("gio mount timed out after {:?}", limit);
            return (Errno::ETIMEDOUT as i32, Vec::new());
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !is_already_mounted(&stderr) {
            warn!("gio mount failed: {}", stderr.trim());
            let code = output
                .status
                .code()
                .filter(|c| *c != STATUS_OK)
                .unwrap_or(Errno::EIO as i32);
            return (code, Vec::new());
        }
        debug!("Location was already mounted by someone else");
    }

    let uri = uri_for_request(request);
    let info = tokio::process::Command::new(gio)
        .args(["info", uri.as_str()])
        .stdin(Stdio::null())
        .kill_on_drop(!detached)
        .output()
        .await;

    match info {
        Ok(info) if info.status.success() => {
            let paths = parse_local_paths(&String::from_utf8_lossy(&info.stdout));
            if paths.is_empty() {
                warn!("gio info reported no local path for {}", request.uri);
            }
            (STATUS_OK, paths)
        }
        Ok(info) => {
            warn!(
                "gio info failed: {}",
                String::from_utf8_lossy(&info.stderr).trim()
            );
            (STATUS_OK, Vec::new())
        }
        Err(e) => {
            warn!("Failed to run gio info: {}", e);
            (STATUS_OK, Vec::new())
        }
    }
}

impl MountPrimitive for GioMountPrimitive {
    fn mount_async(
        &self,
        request: MountRequest,
        completions: CompletionSender,
    ) -> std::result::Result<RequestId, i32> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("gio mount requested outside of a tokio runtime");
            return Err(Errno::EINVAL as i32);
        };

        let request_id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let gio = self.gio_path.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let detached = self.detached;

        info!("Mounting {} ({})", request.uri, request_id);
        debug!(
            "Mount command: {} (mount dir {})",
            self.describe(&request),
            request.mount_dir.display()
        );

        // Holding the lock across spawn keeps the task from removing its entry
        // before it has been inserted.
        let mut tasks = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = runtime.spawn(async move {
            let (status, mounted_paths) = run_mount(&gio, &request, detached).await;
            in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&request_id);
            let completion = MountCompletion {
                request_id,
                status,
                mounted_paths,
            };
            if completions.send(completion).is_err() {
                debug!("Completion for {} dropped; receiver is gone", request_id);
            }
        });
        tasks.insert(request_id, handle);

        Ok(request_id)
    }

    fn cancel(&self, request_id: RequestId) {
        let handle = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&request_id);
        match handle {
            Some(handle) => {
                info!("Cancelling {}", request_id);
                // Dropping the future kills the gio child unless detached
                handle.abort();
            }
            None => debug!("{} already finished; nothing to cancel", request_id),
        }
    }

    fn describe(&self, request: &MountRequest) -> String {
        format!(
            "{} {}",
            self.gio_path.display(),
            Self::build_mount_args(request).join(" ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, options: MountOptions) -> MountRequest {
        MountRequest {
            uri: Url::parse(uri).unwrap(),
            mount_dir: PathBuf::from("/tmp/yard"),
            options,
        }
    }

    #[test]
    fn test_build_mount_args_guest() {
        let req = request("smb://server/share", MountOptions::new().anonymous());
        assert_eq!(
            GioMountPrimitive::build_mount_args(&req),
            vec!["mount", "--anonymous", "smb://server/share"]
        );
    }

    #[test]
    fn test_build_mount_args_embeds_username() {
        let req = request(
            "smb://server/share",
            MountOptions::new().with_username("alice".to_string()),
        );
        assert_eq!(
            GioMountPrimitive::build_mount_args(&req),
            vec!["mount", "smb://alice@server/share"]
        );
    }

    #[test]
    fn test_parse_local_paths() {
        let output = "display name: share on server\n\
                      type: directory\n\
                      uri: smb://server/share/\n\
                      local path: /run/user/1000/gvfs/smb-share:server=server,share=share\n\
                      unix mount: gvfsd-fuse /run/user/1000/gvfs fuse.gvfsd-fuse\n";
        assert_eq!(
            parse_local_paths(output),
            vec![PathBuf::from(
                "/run/user/1000/gvfs/smb-share:server=server,share=share"
            )]
        );
        assert!(parse_local_paths("type: directory\n").is_empty());
    }

    #[test]
    fn test_mount_outside_runtime_is_rejected() {
        let gio = GioMountPrimitive::new(PathBuf::from("gio"));
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let result = gio.mount_async(request("smb://server/share", MountOptions::new()), tx);
        assert_eq!(result, Err(Errno::EINVAL as i32));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_failure() {
        let gio = GioMountPrimitive::new(PathBuf::from("/nonexistent/gio"));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let id = gio
            .mount_async(request("smb://server/share", MountOptions::new()), tx)
            .unwrap();

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.request_id, id);
        assert!(!completion.is_success());
        assert!(completion.mounted_paths.is_empty());
    }

    /// A stand-in `gio` that mounts instantly and reports `local_path`
    fn fake_gio(dir: &Path, local_path: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join("gio");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\nif [ \"$1\" = info ]; then echo \"local path: {local_path}\"; fi\nexit 0\n"
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[tokio::test]
    async fn test_successful_mount_reports_local_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let gio = GioMountPrimitive::new(fake_gio(temp_dir.path(), "/run/gvfs/share")).detached();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let id = gio
            .mount_async(request("smb://server/share", MountOptions::new()), tx)
            .unwrap();

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.request_id, id);
        assert_eq!(completion.status, STATUS_OK);
        assert_eq!(
            completion.mounted_paths,
            vec![PathBuf::from("/run/gvfs/share")]
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_request_is_noop() {
        let gio = GioMountPrimitive::new(PathBuf::from("gio"));
        gio.cancel(RequestId::new(99));
    }
}
