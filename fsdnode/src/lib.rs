//! FSD Node - Flight Simulation Daemon federation member
//!
//! This library implements the session and state-synchronization core of
//! an FSD node: the in-memory client/server registry, the 1 Hz periodic
//! controller, and the public snapshot publisher (legacy roster, pilot
//! JSON, status JSON). Wire framing, METAR, and credential storage
//! internals remain external collaborators behind the [`protocol`],
//! [`cert`], and [`config`] boundaries.
//!
//! # High-Level API
//!
//! ```ignore
//! use fsdnode::config::ConfigManager;
//! use fsdnode::controller::Node;
//! use fsdnode::protocol::NullLink;
//! use fsdnode::time::SystemClock;
//!
//! let config = ConfigManager::load(config_path)?;
//! let mut node = Node::new(config, Box::new(NullLink), Box::new(SystemClock))?;
//!
//! loop {
//!     node.run(); // pump sub-processes + advance periodic duties
//! }
//! ```

pub mod cert;
pub mod config;
pub mod controller;
pub mod geo;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod snapshot;
pub mod time;

/// Version of the FSD node library and CLI.
///
/// Synchronized across the workspace; injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
