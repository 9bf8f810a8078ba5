//! Owner-only directory permission hardening.
//!
//! Shared by [`vantage-store`]'s on-disk counter cache directory, the same
//! shape this helper already hardened for SQLite databases before the crate
//! was repurposed.

use std::io;
use std::path::Path;

/// Ensure a directory exists with owner-only permissions.
///
/// Creates the directory (and parents) if missing, then on Unix tightens
/// permissions to 0o700 if owned by the current user; on Windows, applies
/// an owner-only ACL.
pub fn ensure_secure_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        let metadata = std::fs::metadata(path)?;
        let our_uid = unsafe { libc::getuid() };
        if metadata.uid() != our_uid {
            return Ok(());
        }
        let current_mode = metadata.permissions().mode() & 0o777;
        if current_mode & 0o077 != 0 {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = crate::windows_acl::set_owner_only_dir_acl(path) {
            tracing::warn!(path = %path.display(), "failed to apply owner-only ACL to directory (best-effort): {e}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cache");
        ensure_secure_dir(&target).unwrap();
        assert!(target.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn secure_dir_gets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cache");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).unwrap();
        ensure_secure_dir(&target).unwrap();
        let mode = std::fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700);
    }
}
