//! Registry-side state for monitored peers.

use {
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
};

/// Liveness status of a monitored peer as seen by the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum ChainStatus {
    /// No report has been accepted yet.
    #[default]
    Inactive,
    /// At least one report has been accepted.
    Active,
}

/// Where a channel handshake stands for one side of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandshakeState {
    /// Nothing has been committed.
    Uninitiated,
    /// Monitored side: open-init succeeded, waiting for open-ack.
    InitSent,
    /// Registry side: open-try succeeded, waiting for open-confirm.
    TryReceived,
    /// The channel is usable.
    Open,
}

/// Everything the registry knows about one monitored peer.
///
/// Rows are created by administrative registration carrying only `creator`,
/// `peer_id` and `transport_link_id`.  The handshake fills in the intervals
/// and `channel_id`; accepted reports update the liveness fields.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ChainRecord {
    /// Account that registered the peer; the only one allowed to edit or
    /// remove the row.
    pub creator: String,

    /// Unique identifier of the monitored peer.
    pub peer_id: String,

    /// Connection the peer's channel must run over.
    pub transport_link_id: String,

    /// Bound channel, empty until open-confirm.
    pub channel_id: String,

    pub status: ChainStatus,

    /// Peer-reported wall-clock time of the last accepted report.
    pub last_timestamp: u64,

    /// Peer-reported block height of the last accepted report.
    pub last_block: u64,

    /// Registry height at which the last report was accepted.
    pub observed_at_height: u64,

    /// Negotiated blocks between reports (zero until open-try).
    pub update_interval: u64,

    /// Negotiated packet timeout in blocks (zero until open-try).
    pub timeout_interval: u64,
}

impl ChainRecord {
    /// A freshly registered, untracked peer.
    pub fn new(
        creator: impl Into<String>,
        peer_id: impl Into<String>,
        transport_link_id: impl Into<String>,
    ) -> Self {
        Self {
            creator: creator.into(),
            peer_id: peer_id.into(),
            transport_link_id: transport_link_id.into(),
            ..Self::default()
        }
    }

    /// Both intervals have been negotiated, so another handshake must be
    /// refused.
    pub fn is_tracked(&self) -> bool {
        self.update_interval != 0 && self.timeout_interval != 0
    }

    /// Whether a channel has been bound by open-confirm.
    pub fn has_channel(&self) -> bool {
        !self.channel_id.is_empty()
    }

    /// Registry-side handshake progress derived from the stored fields.
    pub fn handshake_state(&self) -> HandshakeState {
        if self.has_channel() {
            HandshakeState::Open
        } else if self.is_tracked() {
            HandshakeState::TryReceived
        } else {
            HandshakeState::Uninitiated
        }
    }

    /// A report is newer only if `(timestamp, block)` is lexicographically
    /// greater than the stored pair.
    pub fn is_advanced_by(&self, timestamp: u64, block: u64) -> bool {
        (timestamp, block) > (self.last_timestamp, self.last_block)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    #[test]
    fn test_new_record_is_untracked() {
        let record = ChainRecord::new("admin", "chain-A", "conn-0");
        assert_eq!(record.status, ChainStatus::Inactive);
        assert_eq!(record.last_timestamp, 0);
        assert_eq!(record.last_block, 0);
        assert!(!record.is_tracked());
        assert!(!record.has_channel());
        assert_eq!(record.handshake_state(), HandshakeState::Uninitiated);
    }

    #[test]
    fn test_one_interval_is_not_tracked() {
        let mut record = ChainRecord::new("admin", "chain-A", "conn-0");
        record.update_interval = 10;
        assert!(!record.is_tracked());
        record.timeout_interval = 20;
        assert!(record.is_tracked());
        assert_eq!(record.handshake_state(), HandshakeState::TryReceived);
        record.channel_id = "channel-0".to_string();
        assert_eq!(record.handshake_state(), HandshakeState::Open);
    }

    #[test_case(100, 5, false ; "identical pair")]
    #[test_case(90, 6, false ; "older timestamp newer block")]
    #[test_case(100, 4, false ; "same timestamp older block")]
    #[test_case(100, 6, true ; "same timestamp newer block")]
    #[test_case(101, 0, true ; "newer timestamp")]
    fn test_is_advanced_by(timestamp: u64, block: u64, expected: bool) {
        let record = ChainRecord {
            last_timestamp: 100,
            last_block: 5,
            ..ChainRecord::new("admin", "chain-A", "conn-0")
        };
        assert_eq!(record.is_advanced_by(timestamp, block), expected);
    }

    #[test]
    fn test_zero_report_does_not_advance_fresh_record() {
        let record = ChainRecord::new("admin", "chain-A", "conn-0");
        assert!(!record.is_advanced_by(0, 0));
        assert!(record.is_advanced_by(0, 1));
    }

    #[test]
    fn test_borsh_roundtrip() {
        let record = ChainRecord {
            channel_id: "channel-7".to_string(),
            status: ChainStatus::Active,
            last_timestamp: 1_700_000_000,
            last_block: 42,
            observed_at_height: 9,
            update_interval: 10,
            timeout_interval: 20,
            ..ChainRecord::new("admin", "chain-A", "conn-0")
        };
        let bytes = borsh::to_vec(&record).unwrap();
        let decoded: ChainRecord = borsh::from_slice(&bytes).unwrap();
        assert_eq!(record, decoded);
    }
}
