use crate::error::Result;
use std::io::{Error, ErrorKind};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Ensure the shared mount directory exists with proper permissions
pub async fn ensure_mount_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        debug!("Creating mount directory: {}", path.display());
        fs::create_dir_all(path).await?;

        #[cfg(unix)]
        {
            use crate::platform::common::MOUNT_POINT_PERMISSIONS;
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(MOUNT_POINT_PERMISSIONS);
            fs::set_permissions(path, permissions).await?;
        }
    } else if !path.is_dir() {
        return Err(Error::new(
            ErrorKind::NotADirectory,
            format!("{} exists but is not a directory", path.display()),
        )
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_mount_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mount_dir = temp_dir.path().join("mounts");

        assert!(!mount_dir.exists());
        ensure_mount_dir(&mount_dir).await.unwrap();
        assert!(mount_dir.is_dir());

        // Idempotent
        ensure_mount_dir(&mount_dir).await.unwrap();

        #[cfg(unix)]
        {
            use crate::platform::common::MOUNT_POINT_PERMISSIONS;
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&mount_dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, MOUNT_POINT_PERMISSIONS);
        }
    }

    #[tokio::test]
    async fn test_ensure_mount_dir_rejects_files() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("mounts");
        std::fs::write(&file, "not a dir").unwrap();

        assert!(ensure_mount_dir(&file).await.is_err());
    }
}
