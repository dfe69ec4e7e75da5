//! In-memory client/server registry.
//!
//! Two owned maps replace the legacy intrusive linked lists: clients keyed
//! by callsign, servers keyed by ident, with the client→server relation
//! expressed as an ident key rather than an owning handle. That keeps
//! same-callsign replacement and eviction cascades free of aliasing
//! hazards, and lookups drop from O(N) scans to hash probes.
//!
//! Iteration order over either map is not part of the contract; the
//! snapshot publisher must not assume one.
//!
//! # Invariants
//!
//! - At most one live client per callsign; inserting a duplicate replaces
//!   the previous session.
//! - Every client's `server_ident` names a live server. Removing a server
//!   through [`Registry::remove_server_cascade`] removes its clients
//!   first, so the relation never dangles.

mod client;
mod plan;
mod server;

pub use client::{
    AtcPosition, Client, ClientHandshake, ClientKind, PilotPosition, HEADING_UNKNOWN,
    MAX_PILOT_RANGE_NM,
};
pub use plan::{FlightPlan, FlightPlanKind};
pub use server::{Server, ServerFlags, PLACEHOLDER_HOSTNAME};

use std::collections::HashMap;

use tracing::{debug, info};

use crate::time::UnixTime;

/// The federation state this node currently knows about.
#[derive(Debug, Default)]
pub struct Registry {
    clients: HashMap<String, Client>,
    servers: HashMap<String, Server>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== clients ====================

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Insert a client, replacing (and returning) any live session with
    /// the same callsign.
    pub fn insert_client(&mut self, client: Client) -> Option<Client> {
        let replaced = self.clients.insert(client.callsign.clone(), client);
        if let Some(old) = &replaced {
            info!(callsign = %old.callsign, "replacing live session with same callsign");
        }
        replaced
    }

    pub fn get_client(&self, callsign: &str) -> Option<&Client> {
        self.clients.get(callsign)
    }

    pub fn get_client_mut(&mut self, callsign: &str) -> Option<&mut Client> {
        self.clients.get_mut(callsign)
    }

    pub fn remove_client(&mut self, callsign: &str) -> Option<Client> {
        self.clients.remove(callsign)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    // ==================== servers ====================

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn insert_server(&mut self, server: Server) -> Option<Server> {
        self.servers.insert(server.ident.clone(), server)
    }

    pub fn get_server(&self, ident: &str) -> Option<&Server> {
        self.servers.get(ident)
    }

    pub fn get_server_mut(&mut self, ident: &str) -> Option<&mut Server> {
        self.servers.get_mut(ident)
    }

    pub fn servers(&self) -> impl Iterator<Item = &Server> {
        self.servers.values()
    }

    /// Remove a server and every client whose affinity points at it.
    ///
    /// Clients go first so the client→server relation is never observable
    /// in a dangling state. Returns the removed server and how many of its
    /// clients went with it.
    pub fn remove_server_cascade(&mut self, ident: &str) -> Option<(Server, usize)> {
        let server = self.servers.remove(ident)?;
        let before = self.clients.len();
        self.clients.retain(|_, c| c.server_ident != ident);
        let dropped = before - self.clients.len();
        if dropped > 0 {
            debug!(server = ident, clients = dropped, "cascaded client removal");
        }
        Some((server, dropped))
    }

    // ==================== eviction ====================

    /// Evict peers silent for longer than `timeout`, cascading to their
    /// clients. The local entry (`my_ident`) is never evicted. Returns the
    /// idents removed.
    pub fn evict_servers(&mut self, now: UnixTime, timeout: i64, my_ident: &str) -> Vec<String> {
        let expired: Vec<String> = self
            .servers
            .values()
            .filter(|s| s.ident != my_ident && now - s.alive > timeout)
            .map(|s| s.ident.clone())
            .collect();

        for ident in &expired {
            if let Some((_, clients)) = self.remove_server_cascade(ident) {
                info!(server = %ident, clients, "peer timed out");
            }
        }
        expired
    }

    /// Evict non-local clients silent for longer than `limit`. Clients
    /// owned by `my_ident` are the protocol layer's responsibility and are
    /// never timed out here. Returns the callsigns removed.
    pub fn evict_clients(&mut self, now: UnixTime, limit: i64, my_ident: &str) -> Vec<String> {
        let expired: Vec<String> = self
            .clients
            .values()
            .filter(|c| c.server_ident != my_ident && now - c.alive > limit)
            .map(|c| c.callsign.clone())
            .collect();

        for callsign in &expired {
            self.clients.remove(callsign);
            info!(callsign = %callsign, "client timed out");
        }
        expired
    }
}
