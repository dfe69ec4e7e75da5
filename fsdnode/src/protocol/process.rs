//! Sub-process pumping and inbound command delivery.
//!
//! The outer supervisor calls the controller's `run` step in a loop; the
//! controller first drains every registered sub-process (wire protocol
//! pump, METAR fetcher, and so on). A sub-process never touches the
//! registry itself: it returns [`Command`]s, wire packets already
//! tokenized by the protocol collaborator, which the controller applies
//! on its own single execution context.

use crate::registry::{ClientHandshake, ServerFlags};

/// Peer announce / notify payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerAnnounce {
    pub ident: String,
    pub hostname: String,
    pub location: String,
    pub name: String,
    pub email: String,
    pub flags: ServerFlags,
}

/// One inbound mutation, pre-tokenized by the wire layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Successful handshake: materialise a client session.
    ClientConnect(ClientHandshake),
    /// Explicit disconnect.
    ClientDisconnect { callsign: String },
    /// Pilot position report tokens (see [`super::parse_pilot_update`]).
    PilotPosition { tokens: Vec<String> },
    /// ATC position report tokens (see [`super::parse_atc_update`]).
    AtcPosition { tokens: Vec<String> },
    /// Flight plan tokens (see [`super::parse_flight_plan`]). `amended`
    /// marks a locally edited plan, which suppresses re-broadcast.
    FlightPlan {
        callsign: String,
        tokens: Vec<String>,
        amended: bool,
    },
    /// Free-form info line appended to a client's info block.
    InfoLine { callsign: String, line: String },
    /// Peer announced itself or refreshed its entry.
    ServerNotify(PeerAnnounce),
    /// Peer departed explicitly; cascade its clients.
    ServerDepart { ident: String },
}

/// A cooperatively scheduled sub-process.
pub trait Process: Send {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Drain pending work, returning any inbound commands produced.
    fn pump(&mut self) -> Vec<Command>;
}

/// Ordered set of registered sub-processes.
#[derive(Default)]
pub struct ProcessManager {
    processes: Vec<Box<dyn Process>>,
}

impl ProcessManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, process: Box<dyn Process>) {
        tracing::debug!(process = process.name(), "registered sub-process");
        self.processes.push(process);
    }

    /// Pump every process once, in registration order.
    pub fn run(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        for process in &mut self.processes {
            commands.append(&mut process.pump());
        }
        commands
    }
}

/// Queue-fed process, shared by handle.
///
/// Clone the handle before registering it: the clone left outside keeps
/// feeding commands while the registered box drains them on each pump.
#[derive(Debug, Default, Clone)]
pub struct QueueProcess {
    name: String,
    pending: std::sync::Arc<std::sync::Mutex<Vec<Command>>>,
}

impl QueueProcess {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pending: Default::default(),
        }
    }

    pub fn push(&self, command: Command) {
        self.pending
            .lock()
            .expect("queue lock poisoned")
            .push(command);
    }
}

impl Process for QueueProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn pump(&mut self) -> Vec<Command> {
        std::mem::take(&mut *self.pending.lock().expect("queue lock poisoned"))
    }
}
