use super::types::{CompletionSender, MountRequest, RequestId};
use crate::error::{Result, YardError};
use crate::platform::PlatformInfo;
use async_trait::async_trait;
use url::Url;

#[cfg(unix)]
use super::gio::GioMountPrimitive;
use super::opener::SystemOpener;

/// The asynchronous OS mount service the orchestrator delegates to.
///
/// Implementations run the actual mount on their own tasks and report the result
/// by sending exactly one [`MountCompletion`](super::MountCompletion) on the
/// supplied channel, unless the request was cancelled first.
pub trait MountPrimitive: Send + Sync {
    /// Start mounting `request`. Must return without waiting for the network.
    ///
    /// `Err(status)` means the request was rejected synchronously and no
    /// completion will follow.
    fn mount_async(
        &self,
        request: MountRequest,
        completions: CompletionSender,
    ) -> std::result::Result<RequestId, i32>;

    /// Best-effort cancellation. Returns immediately; a completion for the
    /// request may still be delivered afterwards.
    fn cancel(&self, request_id: RequestId);

    /// Human-readable command for debugging
    fn describe(&self, request: &MountRequest) -> String;
}

/// Hands an address to whatever the desktop registers for its scheme.
///
/// Runs on the orchestrator's serialized context, so it must return as soon as
/// the handler is launched and never wait for the handler to exit.
#[async_trait]
pub trait UriOpener: Send + Sync {
    /// Returns whether the handler could be launched
    async fn open(&self, uri: &Url) -> bool;
}

/// Factory function to get the mount primitive for the current platform.
///
/// A `detached` primitive leaves its mount helpers running if the process
/// exits before they finish.
pub fn get_mount_primitive(
    platform_info: &PlatformInfo,
    detached: bool,
) -> Result<Box<dyn MountPrimitive>> {
    #[cfg(unix)]
    {
        match platform_info.platform.gio_path() {
            Some(gio) => {
                let primitive = GioMountPrimitive::new(gio.clone());
                Ok(Box::new(if detached {
                    primitive.detached()
                } else {
                    primitive
                }))
            }
            None => Err(YardError::ToolNotFound {
                tool: crate::platform::common::GIO_BINARY.to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = detached;
        Err(YardError::PlatformNotSupported {
            platform: format!("{:?}", platform_info.platform),
        })
    }
}

/// Factory function to get the external opener for the current platform
pub fn get_uri_opener(platform_info: &PlatformInfo) -> Result<Box<dyn UriOpener>> {
    match platform_info.platform.opener_path() {
        Some(path) => Ok(Box::new(SystemOpener::new(path.clone()))),
        None => Err(YardError::ToolNotFound {
            tool: platform_info
                .platform
                .missing_tools()
                .last()
                .map_or_else(|| "open".to_string(), |t| (*t).to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    #[cfg(target_os = "linux")]
    use super::*;
    #[cfg(target_os = "linux")]
    use crate::platform::{LinuxInfo, Platform};
    #[cfg(target_os = "linux")]
    use std::path::PathBuf;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_get_mount_primitive_linux() {
        let platform_info = PlatformInfo {
            platform: Platform::Linux(LinuxInfo {
                distro: "Ubuntu 24.04 LTS".to_string(),
                gio_path: Some(PathBuf::from("/usr/bin/gio")),
                opener_path: Some(PathBuf::from("/usr/bin/xdg-open")),
            }),
            arch: "x86_64".to_string(),
        };

        assert!(get_mount_primitive(&platform_info, false).is_ok());
        assert!(get_mount_primitive(&platform_info, true).is_ok());
        assert!(get_uri_opener(&platform_info).is_ok());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_get_mount_primitive_missing_gio() {
        let platform_info = PlatformInfo {
            platform: Platform::Linux(LinuxInfo {
                distro: "Alpine Linux".to_string(),
                gio_path: None,
                opener_path: None,
            }),
            arch: "x86_64".to_string(),
        };

        match get_mount_primitive(&platform_info, false) {
            Err(YardError::ToolNotFound { tool }) => assert_eq!(tool, "gio"),
            Err(e) => panic!("Expected ToolNotFound error, got {e}"),
            Ok(_) => panic!("Expected ToolNotFound error"),
        }

        match get_uri_opener(&platform_info) {
            Err(YardError::ToolNotFound { tool }) => assert_eq!(tool, "xdg-open"),
            Err(e) => panic!("Expected ToolNotFound error, got {e}"),
            Ok(_) => panic!("Expected ToolNotFound error"),
        }
    }
}
