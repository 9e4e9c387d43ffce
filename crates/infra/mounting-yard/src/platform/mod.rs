mod constants;
mod detector;

pub use constants::*;
pub use detector::{LinuxInfo, MacOSInfo, Platform, PlatformInfo, detect_platform};
