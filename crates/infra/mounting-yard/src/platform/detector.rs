use crate::error::Result;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum Platform {
    Linux(LinuxInfo),
    MacOS(MacOSInfo),
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinuxInfo {
    pub distro: String,
    pub gio_path: Option<PathBuf>,
    pub opener_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacOSInfo {
    pub version: String,
    pub gio_path: Option<PathBuf>,
    pub opener_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PlatformInfo {
    pub platform: Platform,
    pub arch: String,
}

impl Platform {
    /// Whether a native mount backend is available
    pub fn can_mount(&self) -> bool {
        self.gio_path().is_some()
    }

    pub fn gio_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Linux(info) => info.gio_path.as_ref(),
            Self::MacOS(info) => info.gio_path.as_ref(),
            Self::Unsupported(_) => None,
        }
    }

    pub fn opener_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Linux(info) => info.opener_path.as_ref(),
            Self::MacOS(info) => info.opener_path.as_ref(),
            Self::Unsupported(_) => None,
        }
    }

    /// Tools that would need installing for full functionality
    pub fn missing_tools(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.gio_path().is_none() {
            missing.push(crate::platform::common::GIO_BINARY);
        }
        if self.opener_path().is_none() {
            missing.push(opener_binary());
        }
        missing
    }
}

fn opener_binary() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        crate::platform::linux::OPENER_BINARY
    }

    #[cfg(target_os = "macos")]
    {
        crate::platform::macos::OPENER_BINARY
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        "open"
    }
}

pub fn detect_platform() -> Result<PlatformInfo> {
    debug!("Starting platform detection");

    #[cfg(target_os = "linux")]
    {
        detect_linux()
    }

    #[cfg(target_os = "macos")]
    {
        detect_macos()
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let os = std::env::consts::OS;
        Ok(PlatformInfo {
            platform: Platform::Unsupported(os.to_string()),
            arch: std::env::consts::ARCH.to_string(),
        })
    }
}

fn find_tool(name: &str) -> Option<PathBuf> {
    match which::which(name) {
        Ok(path) => {
            debug!("Found {} at: {:?}", name, path);
            Some(path)
        }
        Err(_) => {
            info!("{} not found", name);
            None
        }
    }
}

#[cfg(target_os = "linux")]
fn detect_linux() -> Result<PlatformInfo> {
    let distro = detect_linux_distro();
    info!("Detected Linux distribution: {}", distro);

    let linux_info = LinuxInfo {
        distro,
        gio_path: find_tool(crate::platform::common::GIO_BINARY),
        opener_path: find_tool(crate::platform::linux::OPENER_BINARY),
    };

    Ok(PlatformInfo {
        platform: Platform::Linux(linux_info),
        arch: std::env::consts::ARCH.to_string(),
    })
}

#[cfg(target_os = "linux")]
fn detect_linux_distro() -> String {
    // /etc/os-release is the systemd standard
    if let Ok(content) = std::fs::read_to_string("/etc/os-release") {
        for line in content.lines() {
            if let Some(value) = line.strip_prefix("PRETTY_NAME=") {
                return value.trim_matches('"').to_string();
            }
        }
    }

    "Unknown Linux".to_string()
}

#[cfg(target_os = "macos")]
fn detect_macos() -> Result<PlatformInfo> {
    let output = std::process::Command::new("sw_vers")
        .arg("-productVersion")
        .output()?;
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    info!("Detected macOS version: {}", version);

    let macos_info = MacOSInfo {
        version,
        gio_path: find_tool(crate::platform::common::GIO_BINARY),
        opener_path: find_tool(crate::platform::macos::OPENER_BINARY),
    };

    Ok(PlatformInfo {
        platform: Platform::MacOS(macos_info),
        arch: std::env::consts::ARCH.to_string(),
    })
}
