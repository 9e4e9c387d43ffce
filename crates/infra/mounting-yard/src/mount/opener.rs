use super::primitive::UriOpener;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{debug, warn};
use url::Url;

/// Opens URIs with the desktop's handler (`xdg-open` or `open`)
pub struct SystemOpener {
    program: PathBuf,
}

impl SystemOpener {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

#[async_trait]
impl UriOpener for SystemOpener {
    async fn open(&self, uri: &Url) -> bool {
        debug!("Opening {} with {}", uri, self.program.display());
        let child = tokio::process::Command::new(&self.program)
            .arg(uri.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to run {}: {}", self.program.display(), e);
                return false;
            }
        };

        // Handlers may stay in the foreground until the user closes them; reap
        // the child off to the side.
        let program = self.program.clone();
        let target = uri.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => warn!("{} {} exited with {}", program.display(), target, status),
                Err(e) => warn!("Failed to wait for {}: {}", program.display(), e),
            }
        });
        true
    }
}
