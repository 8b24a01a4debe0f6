//! Artifact writes: atomic, and at most once per path per run.
//!
//! Every artifact is written to a temporary file in the target directory and
//! renamed into place, so a crash never leaves a half-written artifact under
//! its final name. The [`RunLedger`] records every path claimed during a run
//! so two documents (or two steps) can never overwrite each other's output.

use crate::error::{StepError, StepKind};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::debug;

/// Shared record of artifact paths written during one run.
#[derive(Debug, Clone, Default)]
pub struct RunLedger {
    claimed: Arc<Mutex<HashSet<PathBuf>>>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `path` for writing. Returns `false` if something else in this
    /// run already claimed it.
    pub fn claim(&self, path: &Path) -> bool {
        match self.claimed.lock() {
            Ok(mut set) => set.insert(path.to_path_buf()),
            // A panicking writer poisoned the lock; the set itself is intact.
            Err(poisoned) => poisoned.into_inner().insert(path.to_path_buf()),
        }
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Write `bytes` to `path` via a temp file in the same directory, then rename.
///
/// The parent directory must already exist.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Claim `path` in the ledger and write it atomically, on behalf of `step`.
pub fn write_artifact(
    ledger: &RunLedger,
    step: StepKind,
    path: &Path,
    bytes: &[u8],
) -> Result<(), StepError> {
    if !ledger.claim(path) {
        return Err(StepError::new(
            step,
            format!("'{}' was already written in this run", path.display()),
        ));
    }
    write_atomic(path, bytes)
        .map_err(|e| StepError::new(step, format!("cannot write '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_once_per_path() {
        let ledger = RunLedger::new();
        let p = Path::new("/out/a_text.txt");
        assert!(ledger.claim(p));
        assert!(!ledger.claim(p));
        assert!(ledger.claim(Path::new("/out/b_text.txt")));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn clones_share_state() {
        let a = RunLedger::new();
        let b = a.clone();
        assert!(a.claim(Path::new("x.pdf")));
        assert!(!b.claim(Path::new("x.pdf")));
    }

    #[test]
    fn write_atomic_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        write_atomic(&target, b"first").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"first");
        write_atomic(&target, b"second").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"second");

        // No temp files left behind.
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn write_artifact_refuses_second_write() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a_part001.pdf");
        let ledger = RunLedger::new();
        write_artifact(&ledger, StepKind::Split, &target, b"one").unwrap();
        let err = write_artifact(&ledger, StepKind::Split, &target, b"two").unwrap_err();
        assert_eq!(err.step, StepKind::Split);
        assert_eq!(std::fs::read(&target).unwrap(), b"one");
    }

    #[test]
    fn write_atomic_fails_without_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.txt");
        assert!(write_atomic(&target, b"x").is_err());
    }
}
