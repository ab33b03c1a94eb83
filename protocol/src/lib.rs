//! # Healthcheck Protocol
//!
//! A **liveness monitor** run over an ordered, authenticated channel between
//! two chains.
//!
//! One side plays the **registry**: it keeps a row per pre-registered peer and
//! records the most recent `(timestamp, block)` pair each peer reports.  The
//! other side plays the **monitored** role: it opens a single channel towards
//! the registry with a four-step handshake and then periodically reports its
//! own progress on it.
//!
//! | Module        | Responsibility                                             |
//! |---------------|------------------------------------------------------------|
//! | [`registry`]  | Accepts handshakes, binds channels, applies reports        |
//! | [`monitored`] | Initiates the handshake, emits reports, observes outcomes  |
//! | [`handshake`] | Channel lifecycle callbacks and shared validations         |
//! | [`packet`]    | Packet callbacks and the staleness rule                    |
//! | [`message`]   | JSON wire types: metadata, reports, acknowledgements       |
//! | [`state`]     | Per-peer record kept by the registry                       |
//! | [`store`]     | Keyed persistence of records                               |
//! | [`processor`] | Administrative registration of peers                       |
//! | [`transport`] | Interface to the channel transport beneath the protocol    |
//! | [`events`]    | Observability events and sinks                             |
//!
//! ## Quick start
//!
//! ```rust
//! use healthcheck_protocol::{
//!     instruction::AdminInstruction,
//!     message::LivenessReport,
//!     packet::apply_report,
//!     processor::process_instruction,
//!     store::{MemoryRecordStore, RecordStore},
//! };
//!
//! let store = MemoryRecordStore::default();
//! process_instruction(
//!     &store,
//!     AdminInstruction::CreateChain {
//!         creator: "admin".to_string(),
//!         chain_id: "chain-A".to_string(),
//!         connection_id: "connection-0".to_string(),
//!     },
//! )
//! .unwrap();
//!
//! let record = store.get("chain-A").unwrap().unwrap();
//! let report = LivenessReport { timestamp: 100, block: 5 };
//! let updated = apply_report(&record, &report, 42).unwrap();
//! assert_eq!(updated.last_block, 5);
//!
//! // Replaying the same report is stale.
//! assert!(apply_report(&updated, &report, 43).is_err());
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod handshake;
pub mod instruction;
pub mod message;
#[cfg(any(test, feature = "dev-context-only-utils"))]
pub mod mock;
pub mod monitored;
pub mod packet;
pub mod processor;
pub mod registry;
pub mod state;
pub mod store;
pub mod transport;


use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// The two roles a chain can play on a healthcheck channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Tracks the liveness of monitored peers.
    Registry,
    /// Reports its own liveness to a registry.
    Monitored,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => f.write_str("registry"),
            Self::Monitored => f.write_str("monitored"),
        }
    }
}

// Re-exports for convenience.
pub use {
    config::{MonitoredConfig, RegistryConfig},
    error::{ErrorCategory, HealthcheckError},
    events::{EventSink, HealthcheckEvent, LogEventSink, RecordingEventSink},
    handshake::ChannelHandshake,
    message::{Acknowledgement, HandshakeMetadata, HealthcheckPacketData, LivenessReport},
    monitored::{MonitoredModule, MonitoredState},
    packet::PacketHandler,
    registry::RegistryModule,
    state::{ChainRecord, ChainStatus, HandshakeState},
    store::{MemoryRecordStore, RecordStore, StoreError},
    transport::{ChannelContext, TransportError},
};
