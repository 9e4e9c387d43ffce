/// Platform-specific constants for mount operations

#[cfg(target_os = "linux")]
pub mod linux {
    /// Command used to hand URIs to the desktop
    pub const OPENER_BINARY: &str = "xdg-open";
}

#[cfg(target_os = "macos")]
pub mod macos {
    /// Command used to hand URIs to the desktop
    pub const OPENER_BINARY: &str = "open";
}

/// Common constants across platforms
pub mod common {
    use std::time::Duration;

    /// GVfs command line client
    pub const GIO_BINARY: &str = "gio";

    /// Prefix of the `gio info` line carrying the FUSE path of a mounted location
    pub const GIO_LOCAL_PATH_PREFIX: &str = "local path:";

    /// Default permissions for the shared mount directory
    pub const MOUNT_POINT_PERMISSIONS: u32 = 0o755;

    /// Timeout for mount operations
    pub const MOUNT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Schemes mounted natively unless configured otherwise
    pub const DEFAULT_NATIVE_SCHEMES: &[&str] = &["smb", "afp", "cifs", "ftp"];

    /// Extension of a single persisted endpoint
    pub const ENDPOINT_EXTENSION: &str = "mountingYard";

    /// Extension of an export bundle holding many endpoints
    pub const EXPORT_EXTENSION: &str = "mountingYardExportFile";
}
