//! Interface to the channel transport beneath the handshake.
//!
//! The transport owns connections, channel identifiers, sequence numbers and
//! capability tokens.  It guarantees ordered, exactly-once delivery on an
//! open channel.  The protocol core reaches it only through
//! [`ChannelContext`], and treats [`Capability`] as an opaque token.

use {
    serde::{Deserialize, Serialize},
    std::fmt,
    thiserror::Error,
};

/// Errors surfaced by the transport collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The capability at `path` is owned by someone else.
    #[error("capability already claimed at {path}")]
    CapabilityTaken { path: String },

    /// The caller does not own the capability for `path`.
    #[error("capability not owned at {path}")]
    CapabilityNotOwned { path: String },

    /// No counterparty chain is known for the connection.
    #[error("connection {0} not found")]
    ConnectionNotFound(String),

    /// No counterparty chain is known for the channel end.
    #[error("channel {channel_id} not found on port {port_id}")]
    ChannelNotFound { port_id: String, channel_id: String },

    /// The packet could not be committed for sending.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Ordering guarantee requested for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelOrder {
    Ordered,
    Unordered,
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordered => f.write_str("ORDERED"),
            Self::Unordered => f.write_str("UNORDERED"),
        }
    }
}

/// The remote end of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub port_id: String,
    /// Empty while the remote end has not been assigned an identifier yet.
    pub channel_id: String,
}

/// Opaque proof of ownership of a channel end, issued by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability(u64);

impl Capability {
    /// Only transports mint capabilities.
    pub fn new(index: u64) -> Self {
        Self(index)
    }
}

/// Path under which the capability for a channel end is registered.
pub fn channel_capability_path(port_id: &str, channel_id: &str) -> String {
    format!("capabilities/ports/{port_id}/channels/{channel_id}")
}

/// A packet committed on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    /// JSON-encoded [`crate::message::HealthcheckPacketData`].
    pub data: Vec<u8>,
    /// Sending-chain height after which an unacknowledged packet times out.
    pub timeout_height: u64,
}

/// Parameters of the first handshake step, delivered to the initiating end.
#[derive(Debug, Clone)]
pub struct OpenInit {
    pub order: ChannelOrder,
    pub connection_hops: Vec<String>,
    pub port_id: String,
    pub channel_id: String,
    pub capability: Capability,
    pub counterparty: Counterparty,
    pub version: String,
}

/// Parameters of the second handshake step, delivered to the accepting end.
#[derive(Debug, Clone)]
pub struct OpenTry {
    pub order: ChannelOrder,
    pub connection_hops: Vec<String>,
    pub port_id: String,
    pub channel_id: String,
    pub capability: Capability,
    pub counterparty: Counterparty,
    /// Whatever the initiating end returned from open-init.
    pub counterparty_version: String,
}

/// What the protocol core needs from the host chain and its transport.
pub trait ChannelContext {
    /// Height of the local chain.
    fn current_height(&self) -> u64;

    /// Local wall-clock time in unix seconds.
    fn current_time(&self) -> u64;

    /// Whether the caller already owns `capability` under `path`.
    fn authenticate_capability(&self, capability: &Capability, path: &str) -> bool;

    /// Take ownership of `capability` under `path`.
    fn claim_capability(&mut self, capability: &Capability, path: &str)
        -> Result<(), TransportError>;

    /// Chain identifier of the counterparty reached through `link_id`.
    fn counterparty_peer_from_link(&self, link_id: &str) -> Result<String, TransportError>;

    /// Chain identifier of the counterparty of the channel end
    /// `(port_id, channel_id)`.
    fn counterparty_peer_from_channel(
        &self,
        port_id: &str,
        channel_id: &str,
    ) -> Result<String, TransportError>;

    /// Commit `data` for delivery on `(port_id, channel_id)`.  Returns the
    /// packet sequence number.
    fn send_packet(
        &mut self,
        capability: &Capability,
        port_id: &str,
        channel_id: &str,
        timeout_height: u64,
        data: Vec<u8>,
    ) -> Result<u64, TransportError>;

    /// The capability for a channel end this side has claimed, if any.
    fn channel_capability(&self, port_id: &str, channel_id: &str) -> Option<Capability>;
}
