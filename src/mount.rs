//! Local mount inspection and execution.
//!
//! The [`Mounter`] trait is the plugin's only window onto the node's
//! filesystem: probing whether a target is already a mount point, creating
//! target directories, bind-mounting, and unmounting.  [`SysMounter`] is the
//! real implementation; tests substitute recording fakes.
//!
//! The live mount table (`/proc/self/mounts`) is the single source of truth
//! for "is this path published" — the plugin keeps no record of its own.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::PluginError;

/// What a probe of a target path found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    /// The path does not exist at all.
    NotFound,
    /// The path exists but nothing is mounted on it.
    NotMounted,
    /// The path is an active mount point.
    Mounted,
}

/// A flag applied to a bind mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountFlag {
    /// Make the source visible at the target without copying data.
    Bind,
    /// Refuse writes through the target.
    ReadOnly,
}

impl std::fmt::Display for MountFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind => f.write_str("bind"),
            Self::ReadOnly => f.write_str("ro"),
        }
    }
}

/// Mount inspection and execution operations.
#[async_trait]
pub trait Mounter: Send + Sync {
    /// Inspect `target` and report whether it exists and whether it is an
    /// active mount point.
    async fn probe(&self, target: &Path) -> Result<MountStatus, PluginError>;

    /// Create `path` and any missing parents, with conservative permissions.
    async fn create_dir_all(&self, path: &Path) -> Result<(), PluginError>;

    /// Bind-mount `source` onto `target` with the given flags.
    async fn bind_mount(
        &self,
        source: &Path,
        target: &Path,
        flags: &[MountFlag],
    ) -> Result<(), PluginError>;

    /// Unmount whatever is mounted at `target`.
    async fn unmount(&self, target: &Path) -> Result<(), PluginError>;
}

/// Directory mode for freshly created target paths.
const TARGET_DIR_MODE: u32 = 0o750;

/// Path of the kernel's view of this process's mount table.
const PROC_MOUNTS: &str = "/proc/self/mounts";

/// Return `true` if `target` appears as a mount point in a mount table in
/// `/proc/self/mounts` format.
///
/// Note: the kernel writes octal escapes (`\040` for space, etc.) into this
/// table.  Target paths here must not contain whitespace, so direct string
/// comparison is safe.
fn lists_mount_point(table: &str, target: &str) -> bool {
    // Format: <device> <mountpoint> <fstype> <options> <dump> <pass>
    table
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(target))
}

/// [`Mounter`] backed by the live mount table and real mount syscalls.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysMounter;

impl SysMounter {
    fn require_utf8<'a>(path: &'a Path) -> Result<&'a str, PluginError> {
        path.to_str()
            .ok_or_else(|| PluginError::Internal(format!("non-UTF8 path: {}", path.display())))
    }
}

#[async_trait]
impl Mounter for SysMounter {
    async fn probe(&self, target: &Path) -> Result<MountStatus, PluginError> {
        match tokio::fs::symlink_metadata(target).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MountStatus::NotFound);
            }
            Err(e) => {
                return Err(PluginError::Internal(format!(
                    "stat {}: {e}",
                    target.display()
                )));
            }
            Ok(_) => {}
        }

        let table = tokio::fs::read_to_string(PROC_MOUNTS)
            .await
            .map_err(|e| PluginError::Internal(format!("read {PROC_MOUNTS}: {e}")))?;

        if lists_mount_point(&table, Self::require_utf8(target)?) {
            Ok(MountStatus::Mounted)
        } else {
            Ok(MountStatus::NotMounted)
        }
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), PluginError> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true).mode(TARGET_DIR_MODE);
        builder
            .create(path)
            .await
            .map_err(|e| PluginError::Internal(format!("create {}: {e}", path.display())))?;
        debug!(path = %path.display(), "target directory created");
        Ok(())
    }

    async fn bind_mount(
        &self,
        source: &Path,
        target: &Path,
        flags: &[MountFlag],
    ) -> Result<(), PluginError> {
        let mut ms_flags = nix::mount::MsFlags::empty();
        for flag in flags {
            ms_flags |= match flag {
                MountFlag::Bind => nix::mount::MsFlags::MS_BIND,
                MountFlag::ReadOnly => nix::mount::MsFlags::MS_RDONLY,
            };
        }

        nix::mount::mount(Some(source), target, None::<&str>, ms_flags, None::<&str>).map_err(
            |e| PluginError::MountFailed {
                path: target.display().to_string(),
                reason: e.to_string(),
            },
        )?;

        // Some kernels ignore MS_RDONLY on the initial bind call; a separate
        // remount pass is required to actually enforce read-only access.
        if flags.contains(&MountFlag::ReadOnly) {
            nix::mount::mount(
                None::<&str>,
                target,
                None::<&str>,
                nix::mount::MsFlags::MS_BIND
                    | nix::mount::MsFlags::MS_REMOUNT
                    | nix::mount::MsFlags::MS_RDONLY,
                None::<&str>,
            )
            .map_err(|e| PluginError::MountFailed {
                path: target.display().to_string(),
                reason: format!("remount read-only: {e}"),
            })?;
        }

        debug!(
            source = %source.display(),
            target = %target.display(),
            "bind mount applied",
        );
        Ok(())
    }

    async fn unmount(&self, target: &Path) -> Result<(), PluginError> {
        nix::mount::umount(target).map_err(|e| PluginError::UnmountFailed {
            path: target.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
/dev/root / ext4 rw,relatime 0 0
tmpfs /tmp tmpfs rw,nosuid,nodev 0 0
/dev/claimd /var/lib/claimd/volumes/vol-1 ext4 rw 0 0
";

    #[test]
    fn mount_table_lookup() {
        assert!(lists_mount_point(TABLE, "/tmp"));
        assert!(lists_mount_point(TABLE, "/var/lib/claimd/volumes/vol-1"));
        assert!(!lists_mount_point(TABLE, "/var/lib/claimd/volumes"));
        assert!(!lists_mount_point(TABLE, "/mnt/a"));
    }

    #[test]
    fn flag_display() {
        assert_eq!(MountFlag::Bind.to_string(), "bind");
        assert_eq!(MountFlag::ReadOnly.to_string(), "ro");
    }

    #[tokio::test]
    async fn probe_missing_path() {
        let status = SysMounter
            .probe(Path::new("/nonexistent/libclaim/test/path"))
            .await
            .unwrap();
        assert_eq!(status, MountStatus::NotFound);
    }

    #[tokio::test]
    async fn probe_plain_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let status = SysMounter.probe(tmp.path()).await.unwrap();
        assert_eq!(status, MountStatus::NotMounted);
    }

    #[tokio::test]
    async fn create_dir_all_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let deep = tmp.path().join("a/b/c");
        SysMounter.create_dir_all(&deep).await.unwrap();
        assert!(deep.is_dir());
    }
}
