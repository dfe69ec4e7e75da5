//! Peer server record.
//!
//! One entry per federation peer, plus one for this node itself
//! (`myserver`). Peers announce themselves and are kept alive by periodic
//! server-notify traffic; a peer that falls silent past `SERVERTIMEOUT`
//! is evicted together with every client it owns.

use crate::time::UnixTime;

/// Hostname used by placeholder entries that must never be published.
pub const PLACEHOLDER_HOSTNAME: &str = "n/a";

/// Per-server flag bits as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerFlags(pub u32);

impl ServerFlags {
    /// Receive-only federation member: relays nothing, so its view of
    /// remote clients decays unless the client timeout is stretched.
    pub const SILENT: ServerFlags = ServerFlags(1);

    pub fn contains(&self, other: ServerFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ServerFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: ServerFlags) {
        self.0 &= !other.0;
    }
}

/// A federation peer (or this node's own entry).
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    /// Unique key within the federation.
    pub ident: String,
    pub hostname: String,
    /// Human-readable region, e.g. "Europe".
    pub location: String,
    pub name: String,
    pub email: String,
    pub flags: ServerFlags,
    /// Last-heard wall-clock second.
    pub alive: UnixTime,
}

impl Server {
    pub fn new(
        ident: impl Into<String>,
        hostname: impl Into<String>,
        location: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        flags: ServerFlags,
        now: UnixTime,
    ) -> Self {
        Self {
            ident: ident.into(),
            hostname: hostname.into(),
            location: location.into(),
            name: name.into(),
            email: email.into(),
            flags,
            alive: now,
        }
    }

    /// Refresh the liveness stamp.
    pub fn set_alive(&mut self, now: UnixTime) {
        self.alive = now;
    }

    pub fn is_silent(&self) -> bool {
        self.flags.contains(ServerFlags::SILENT)
    }

    /// Placeholder entries (hostname `"n/a"`) are internal bookkeeping and
    /// never appear in published rosters.
    pub fn is_placeholder(&self) -> bool {
        self.hostname == PLACEHOLDER_HOSTNAME
    }
}
