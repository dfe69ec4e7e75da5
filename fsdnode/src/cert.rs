//! Credentials table loaded from the certificate file.
//!
//! The authoritative store is external; this boundary only materialises a
//! lookup table from the flat export at the path named by
//! `system.certificates`. The periodic controller watches the file's
//! mtime and calls [`CertStore::check_reload`]; a reload replaces the
//! table contents in place, never the handle.
//!
//! File format: one `ident password level` record per line, whitespace
//! separated. Blank lines and lines starting with `#` or `;` are skipped.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::{info, warn};

/// One credential record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertRecord {
    pub ident: String,
    pub password: String,
    /// Permission level granted at login.
    pub level: i32,
}

/// Process-lifetime credentials table with mtime-based reload.
#[derive(Debug, Default)]
pub struct CertStore {
    path: Option<PathBuf>,
    mtime: Option<SystemTime>,
    records: HashMap<String, CertRecord>,
}

impl CertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the store at a (possibly new) file path.
    ///
    /// Changing the path clears the remembered mtime so the next
    /// [`check_reload`](Self::check_reload) reads the new file.
    pub fn set_path(&mut self, path: PathBuf) {
        if self.path.as_ref() != Some(&path) {
            self.path = Some(path);
            self.mtime = None;
        }
    }

    pub fn get(&self, ident: &str) -> Option<&CertRecord> {
        self.records.get(ident)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reload the table if the file's mtime moved since the last load.
    ///
    /// Returns true when a reload happened. An unreadable file logs a
    /// warning and keeps the previous table (transient-local failure).
    pub fn check_reload(&mut self) -> bool {
        let Some(path) = self.path.clone() else {
            return false;
        };

        let mtime = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(mtime) => mtime,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "certificate file not readable");
                return false;
            }
        };
        if self.mtime == Some(mtime) {
            return false;
        }
        self.mtime = Some(mtime);

        match fs::read_to_string(&path) {
            Ok(content) => {
                self.records = parse_records(&content);
                info!(path = %path.display(), records = self.records.len(), "certificates reloaded");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "certificate reload failed, keeping previous table");
                false
            }
        }
    }
}

fn parse_records(content: &str) -> HashMap<String, CertRecord> {
    let mut records = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(ident), Some(password)) = (fields.next(), fields.next()) else {
            warn!(line, "skipping malformed certificate record");
            continue;
        };
        let level = fields.next().and_then(|l| l.parse().ok()).unwrap_or(0);
        records.insert(
            ident.to_string(),
            CertRecord {
                ident: ident.to_string(),
                password: password.to_string(),
                level,
            },
        );
    }
    records
}
