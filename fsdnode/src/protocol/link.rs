//! Outbound peer traffic boundary.
//!
//! The wire codec lives outside the core; the controller only needs to
//! hand it pings and server-notify broadcasts. [`RecordingLink`] is the
//! test double (same role the no-op logger plays for the log boundary):
//! clone the handle before boxing it into the node, then inspect what
//! the duties sent.

use std::sync::{Arc, Mutex};

use crate::registry::Server;

/// Target ident meaning "every peer".
pub const BROADCAST: &str = "*";

/// Outbound side of the federation protocol.
pub trait PeerLink: Send {
    /// Send a ping with an opaque payload to a peer ident or [`BROADCAST`].
    fn send_ping(&mut self, target: &str, payload: &str);

    /// Announce or refresh a server entry towards a peer or [`BROADCAST`].
    fn send_server_notify(&mut self, target: &str, server: &Server);
}

/// Link that drops everything; standalone nodes run with this.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLink;

impl PeerLink for NullLink {
    fn send_ping(&mut self, _target: &str, _payload: &str) {}

    fn send_server_notify(&mut self, _target: &str, _server: &Server) {}
}

/// Everything a [`RecordingLink`] captured.
#[derive(Debug, Default, Clone)]
pub struct RecordedTraffic {
    /// `(target, payload)` per ping.
    pub pings: Vec<(String, String)>,
    /// `(target, server ident)` per notify.
    pub notifies: Vec<(String, String)>,
}

/// Capturing link for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingLink {
    traffic: Arc<Mutex<RecordedTraffic>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured traffic.
    pub fn recorded(&self) -> RecordedTraffic {
        self.traffic.lock().expect("traffic lock poisoned").clone()
    }

    /// Drain and return the captured traffic.
    pub fn take(&self) -> RecordedTraffic {
        std::mem::take(&mut *self.traffic.lock().expect("traffic lock poisoned"))
    }
}

impl PeerLink for RecordingLink {
    fn send_ping(&mut self, target: &str, payload: &str) {
        self.traffic
            .lock()
            .expect("traffic lock poisoned")
            .pings
            .push((target.to_string(), payload.to_string()));
    }

    fn send_server_notify(&mut self, target: &str, server: &Server) {
        self.traffic
            .lock()
            .expect("traffic lock poisoned")
            .notifies
            .push((target.to_string(), server.ident.clone()));
    }
}
