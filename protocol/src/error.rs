//! Error types for the healthcheck protocol.
//!
//! Every failure carries the offending value next to the expected one so an
//! operator can diagnose it from the error string alone.  The string form is
//! also what travels back to the sender inside an error acknowledgement.

use {
    crate::{
        store::StoreError,
        transport::{ChannelOrder, TransportError},
        Role,
    },
    thiserror::Error,
};

/// Coarse failure classes used for metrics and for deciding what a failure
/// affects (a whole handshake vs. a single packet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A role received a handshake step it must never handle.
    ProtocolOrdering,
    /// Channel ordering, port, version or metadata did not validate.
    Validation,
    /// The peer is unknown, reached over the wrong link, or already tracked.
    Registration,
    /// A report did not advance the stored `(timestamp, block)` pair.
    Staleness,
    /// A packet or acknowledgement payload could not be decoded.
    Decode,
    /// Administrative registration was refused.
    Admin,
    /// The transport collaborator failed.
    Transport,
    /// The record store failed.
    Store,
}

/// Errors produced by the handshake, packet processor and admin surface.
#[derive(Error, Debug)]
pub enum HealthcheckError {
    // ── Protocol ordering ───────────────────────────────────────────────

    /// The step is never valid for this role.
    #[error("invalid message sent to channel end: {role} does not handle {step}, channel handshake must be initiated by the monitored chain")]
    InvalidChannelFlow {
        /// Role that received the step.
        role: Role,
        /// Handshake step that was refused.
        step: &'static str,
    },

    /// Channels cannot be closed by users.
    #[error("user cannot close channel {channel_id} on port {port_id}")]
    ChannelCloseDisallowed {
        /// Port of the channel end.
        port_id: String,
        /// Channel the user tried to close.
        channel_id: String,
    },

    /// The monitored role received a packet; it only ever sends.
    #[error("can not receive packets on port {port_id}")]
    PacketsNotAccepted {
        /// Port the packet was addressed to.
        port_id: String,
    },

    /// The registry role received an acknowledgement; it never sends packets.
    #[error("registry chain does not send packets; no acknowledgements are expected (sequence {sequence})")]
    UnexpectedAcknowledgement {
        /// Sequence of the acknowledged packet.
        sequence: u64,
    },

    /// The registry role received a timeout; it never sends packets.
    #[error("registry chain does not send packets; no timeouts are expected (sequence {sequence})")]
    UnexpectedTimeout {
        /// Sequence of the timed-out packet.
        sequence: u64,
    },

    // ── Validation ──────────────────────────────────────────────────────

    /// The channel is not `ORDERED`.
    #[error("invalid channel ordering: expected {expected}, got {got}")]
    InvalidChannelOrdering {
        /// Ordering the protocol requires.
        expected: ChannelOrder,
        /// Ordering the handshake proposed.
        got: ChannelOrder,
    },

    /// The local channel end is bound to the wrong port.
    #[error("invalid port: {got}, expected {expected}")]
    InvalidPort {
        /// Port named in the handshake message.
        got: String,
        /// Port this role is configured for.
        expected: String,
    },

    /// The counterparty channel end is bound to the wrong port.
    #[error("invalid counterparty port: {got}, expected {expected}")]
    InvalidCounterpartyPort {
        /// Counterparty port named in the handshake message.
        got: String,
        /// Port the other role is expected to use.
        expected: String,
    },

    /// The channel version string is not valid handshake metadata.
    #[error("invalid handshake metadata: {reason}; metadata: {metadata}")]
    InvalidHandshakeMetadata {
        /// Decoder or encoder failure.
        reason: String,
        /// The offending version string.
        metadata: String,
    },

    /// The negotiated protocol version is not the supported one.
    #[error("invalid version: got {got}, expected {expected}")]
    InvalidVersion {
        /// Version offered by the counterparty.
        got: String,
        /// Version this chain supports.
        expected: String,
    },

    /// The channel does not run over exactly one transport link.
    #[error("invalid connection hops: expected exactly one, got {got}")]
    InvalidConnectionHops {
        /// Number of hops in the handshake message.
        got: usize,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which value failed and why.
        reason: String,
    },

    // ── Registration ────────────────────────────────────────────────────

    /// No record exists for the peer behind the channel or link.
    #[error("chain with the chain ID {peer_id} isn't registered yet")]
    ChainNotRegistered {
        /// Peer the transport resolved.
        peer_id: String,
    },

    /// The handshake arrived over a link other than the registered one.
    #[error("unexpected connection for chain with chain ID {peer_id}, expected: {expected}, got: {got}")]
    UnexpectedConnectionId {
        /// Peer the link resolved to.
        peer_id: String,
        /// Link stored in the peer's record.
        expected: String,
        /// Link the handshake used.
        got: String,
    },

    /// The peer already negotiated intervals on an earlier open-try.
    #[error("chain {peer_id} is already tracked through another channel")]
    ChainAlreadyTracked {
        /// Peer that is already tracked.
        peer_id: String,
    },

    /// Open-confirm for a channel other than the one already bound.
    #[error("chain {peer_id} is already bound to channel {existing}, refusing {got}")]
    ChannelAlreadyBound {
        /// Peer whose record is bound.
        peer_id: String,
        /// Channel stored in the record.
        existing: String,
        /// Channel being confirmed.
        got: String,
    },

    /// Open-confirm for a channel that another peer's record holds.
    #[error("channel {channel_id} is already bound to chain {bound_peer_id}, refusing it for {peer_id}")]
    ChannelBoundToOtherPeer {
        /// Channel being confirmed.
        channel_id: String,
        /// Peer whose record holds the channel.
        bound_peer_id: String,
        /// Peer the confirm was resolved to.
        peer_id: String,
    },

    /// A packet arrived on a channel that is not the one bound to its peer.
    #[error("chain {peer_id} is bound to channel {expected:?}, refusing packet on channel {got}")]
    ChannelNotBound {
        /// Peer the channel resolved to.
        peer_id: String,
        /// Channel stored in the record; empty before open-confirm.
        expected: String,
        /// Channel the packet arrived on.
        got: String,
    },

    /// The monitored side already has its registry channel.
    #[error("channel for sending healthcheck updates is already set to {channel_id}")]
    ChannelAlreadySet {
        /// Channel already in use.
        channel_id: String,
    },

    /// Open-ack for a channel other than the pending open-init.
    #[error("unexpected channel ID: got {got}, expected {expected}")]
    UnexpectedChannelId {
        /// Channel named in the open-ack.
        got: String,
        /// Pending channel; empty when none is pending.
        expected: String,
    },

    /// A report was requested before the handshake completed.
    #[error("no channel for sending healthcheck updates has been established")]
    ChannelNotSet,

    // ── Staleness ───────────────────────────────────────────────────────

    /// The report does not advance the stored `(timestamp, block)` pair.
    #[error(
        "newer healthcheck update has already been submitted for chain with chain ID {peer_id}: \
         stored (timestamp {stored_timestamp}, block {stored_block}), \
         got (timestamp {timestamp}, block {block})"
    )]
    StaleReport {
        /// Reporting peer.
        peer_id: String,
        /// Timestamp already recorded.
        stored_timestamp: u64,
        /// Block already recorded.
        stored_block: u64,
        /// Timestamp carried by the report.
        timestamp: u64,
        /// Block carried by the report.
        block: u64,
    },

    // ── Decode ──────────────────────────────────────────────────────────

    /// Packet data is not a known healthcheck packet.
    #[error("cannot unmarshal packet data: {0}")]
    MalformedPacket(String),

    /// Acknowledgement bytes are not a known acknowledgement.
    #[error("cannot unmarshal packet acknowledgement: {0}")]
    MalformedAcknowledgement(String),

    // ── Admin ───────────────────────────────────────────────────────────

    /// The creator field is empty or blank.
    #[error("invalid creator address: {0:?}")]
    InvalidCreator(String),

    /// The chain identifier is empty or blank.
    #[error("invalid chain ID: {0:?}")]
    InvalidChainId(String),

    /// A record for the peer already exists.
    #[error("chain {peer_id} is already registered")]
    ChainAlreadyRegistered {
        /// Peer named in the instruction.
        peer_id: String,
    },

    /// The signer did not create the record it tries to change.
    #[error("incorrect owner for chain {peer_id}: signer {signer}, owner {owner}")]
    Unauthorized {
        /// Peer named in the instruction.
        peer_id: String,
        /// Account that signed the instruction.
        signer: String,
        /// Account that created the record.
        owner: String,
    },

    /// The link cannot change once a handshake has started.
    #[error("chain {peer_id} has a handshake in progress or completed; its connection can no longer change")]
    ConnectionLocked {
        /// Peer named in the instruction.
        peer_id: String,
    },

    // ── Collaborators ───────────────────────────────────────────────────

    /// The channel transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The record store failed.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),
}

impl HealthcheckError {
    /// The taxonomy class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidChannelFlow { .. }
            | Self::ChannelCloseDisallowed { .. }
            | Self::PacketsNotAccepted { .. }
            | Self::UnexpectedAcknowledgement { .. }
            | Self::UnexpectedTimeout { .. } => ErrorCategory::ProtocolOrdering,
            Self::InvalidChannelOrdering { .. }
            | Self::InvalidPort { .. }
            | Self::InvalidCounterpartyPort { .. }
            | Self::InvalidHandshakeMetadata { .. }
            | Self::InvalidVersion { .. }
            | Self::InvalidConnectionHops { .. }
            | Self::InvalidConfig { .. } => ErrorCategory::Validation,
            Self::ChainNotRegistered { .. }
            | Self::UnexpectedConnectionId { .. }
            | Self::ChainAlreadyTracked { .. }
            | Self::ChannelAlreadyBound { .. }
            | Self::ChannelBoundToOtherPeer { .. }
            | Self::ChannelNotBound { .. }
            | Self::ChannelAlreadySet { .. }
            | Self::UnexpectedChannelId { .. }
            | Self::ChannelNotSet => ErrorCategory::Registration,
            Self::StaleReport { .. } => ErrorCategory::Staleness,
            Self::MalformedPacket(_) | Self::MalformedAcknowledgement(_) => ErrorCategory::Decode,
            Self::InvalidCreator(_)
            | Self::InvalidChainId(_)
            | Self::ChainAlreadyRegistered { .. }
            | Self::Unauthorized { .. }
            | Self::ConnectionLocked { .. } => ErrorCategory::Admin,
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Store(_) => ErrorCategory::Store,
        }
    }
}

/// Convenience result type for healthcheck operations.
pub type Result<T> = std::result::Result<T, HealthcheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_report_names_both_pairs() {
        let err = HealthcheckError::StaleReport {
            peer_id: "chain-A".to_string(),
            stored_timestamp: 100,
            stored_block: 5,
            timestamp: 90,
            block: 6,
        };
        let msg = err.to_string();
        assert!(msg.contains("chain-A"));
        assert!(msg.contains("timestamp 100, block 5"));
        assert!(msg.contains("timestamp 90, block 6"));
        assert_eq!(err.category(), ErrorCategory::Staleness);
    }

    #[test]
    fn test_flow_error_is_ordering_violation() {
        let err = HealthcheckError::InvalidChannelFlow {
            role: Role::Registry,
            step: "open-init",
        };
        assert_eq!(err.category(), ErrorCategory::ProtocolOrdering);
        assert!(err.to_string().contains("registry does not handle open-init"));
    }

    #[test]
    fn test_unbound_channel_names_both_channels() {
        let err = HealthcheckError::ChannelNotBound {
            peer_id: "chain-A".to_string(),
            expected: String::new(),
            got: "channel-7".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "chain chain-A is bound to channel \"\", refusing packet on channel channel-7"
        );
        assert_eq!(err.category(), ErrorCategory::Registration);
    }

    #[test]
    fn test_collaborator_errors_convert() {
        let err: HealthcheckError = TransportError::CapabilityTaken {
            path: "capabilities/ports/healthcheck/channels/channel-0".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Transport);
    }
}
