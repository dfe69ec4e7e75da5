//! Public snapshot publishing.
//!
//! Three files for external consumers, all derived from the registry and
//! all replaced atomically (write the full sibling `.tmp`, close it, then
//! rename over the target, so consumers never observe a partial file):
//!
//! - the legacy colon-delimited roster at the configured `system.whazzup`
//!   path ([`roster`])
//! - `pilot_snapshot.json` beside it ([`pilots`])
//! - `status.json` beside it, the richer diagnostic variant ([`status`])
//!
//! Snapshot failures are transient-local by contract: they surface as
//! [`SnapshotError`] to the controller, which logs and retries on the
//! next cycle. Nothing here may take down the daemon.

pub mod pilots;
pub mod roster;
pub mod status;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use thiserror::Error;

/// Why a snapshot cycle failed.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Creating, writing, or renaming a snapshot file failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization failed.
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Write `content` to `<target>.tmp`, close it, then rename over `target`.
///
/// When the direct rename fails (some filesystems refuse to replace an
/// existing file), the old target is removed and the rename retried.
pub(crate) fn write_atomic(target: &Path, content: &[u8]) -> Result<(), io::Error> {
    let tmp = tmp_path(target);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(content)?;
        file.flush()?;
    }
    fs::rename(&tmp, target).or_else(|_| {
        let _ = fs::remove_file(target);
        fs::rename(&tmp, target)
    })
}

/// Sibling temporary path: `<target>.tmp`.
fn tmp_path(target: &Path) -> std::path::PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".tmp");
    std::path::PathBuf::from(name)
}
