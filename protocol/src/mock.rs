//! In-memory [`ChannelContext`] for tests and local simulation.

use {
    crate::transport::{
        channel_capability_path, Capability, ChannelContext, Packet, TransportError,
    },
    std::collections::{HashMap, HashSet},
};

/// Seconds the mock clock advances per block.
pub const MOCK_BLOCK_TIME_SECS: u64 = 5;

#[derive(Debug, Clone)]
struct ChannelEnd {
    peer_id: String,
    counterparty_port: String,
    counterparty_channel: String,
}

/// One chain's view of the transport: its clock, the capabilities it owns,
/// the links and channels it knows about, and the packets it committed.
#[derive(Debug, Default)]
pub struct MockChannelContext {
    pub height: u64,
    pub time: u64,
    owned: HashMap<String, Capability>,
    foreign: HashSet<String>,
    links: HashMap<String, String>,
    channels: HashMap<(String, String), ChannelEnd>,
    sequences: HashMap<(String, String), u64>,
    sent: Vec<Packet>,
    next_capability: u64,
}

impl MockChannelContext {
    pub fn new(height: u64, time: u64) -> Self {
        Self {
            height,
            time,
            ..Self::default()
        }
    }

    /// Commit `blocks` blocks.
    pub fn advance_blocks(&mut self, blocks: u64) {
        self.height = self.height.saturating_add(blocks);
        self.time = self
            .time
            .saturating_add(blocks.saturating_mul(MOCK_BLOCK_TIME_SECS));
    }

    /// Mint a fresh capability, as the transport does when a channel end is
    /// created.
    pub fn new_capability(&mut self) -> Capability {
        self.next_capability = self.next_capability.saturating_add(1);
        Capability::new(self.next_capability)
    }

    /// Make `link_id` lead to `peer_id`.
    pub fn add_link(&mut self, link_id: &str, peer_id: &str) {
        self.links.insert(link_id.to_string(), peer_id.to_string());
    }

    /// Register the local channel end `(port_id, channel_id)` facing `peer_id`.
    pub fn add_channel(
        &mut self,
        port_id: &str,
        channel_id: &str,
        peer_id: &str,
        counterparty_port: &str,
        counterparty_channel: &str,
    ) {
        self.channels.insert(
            (port_id.to_string(), channel_id.to_string()),
            ChannelEnd {
                peer_id: peer_id.to_string(),
                counterparty_port: counterparty_port.to_string(),
                counterparty_channel: counterparty_channel.to_string(),
            },
        );
    }

    /// Mark `path` as owned by some other module.
    pub fn claim_foreign(&mut self, path: &str) {
        self.foreign.insert(path.to_string());
    }

    /// Whether this side holds a capability under `path`.
    pub fn owns(&self, path: &str) -> bool {
        self.owned.contains_key(path)
    }

    /// Packets committed so far.
    pub fn sent(&self) -> &[Packet] {
        &self.sent
    }

    /// Remove and return every committed packet.
    pub fn take_sent(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.sent)
    }
}

impl ChannelContext for MockChannelContext {
    fn current_height(&self) -> u64 {
        self.height
    }

    fn current_time(&self) -> u64 {
        self.time
    }

    fn authenticate_capability(&self, capability: &Capability, path: &str) -> bool {
        self.owned.get(path) == Some(capability)
    }

    fn claim_capability(
        &mut self,
        capability: &Capability,
        path: &str,
    ) -> Result<(), TransportError> {
        if self.owned.contains_key(path) || self.foreign.contains(path) {
            return Err(TransportError::CapabilityTaken {
                path: path.to_string(),
            });
        }
        self.owned.insert(path.to_string(), *capability);
        Ok(())
    }

    fn counterparty_peer_from_link(&self, link_id: &str) -> Result<String, TransportError> {
        self.links
            .get(link_id)
            .cloned()
            .ok_or_else(|| TransportError::ConnectionNotFound(link_id.to_string()))
    }

    fn counterparty_peer_from_channel(
        &self,
        port_id: &str,
        channel_id: &str,
    ) -> Result<String, TransportError> {
        self.channels
            .get(&(port_id.to_string(), channel_id.to_string()))
            .map(|end| end.peer_id.clone())
            .ok_or_else(|| TransportError::ChannelNotFound {
                port_id: port_id.to_string(),
                channel_id: channel_id.to_string(),
            })
    }

    fn send_packet(
        &mut self,
        capability: &Capability,
        port_id: &str,
        channel_id: &str,
        timeout_height: u64,
        data: Vec<u8>,
    ) -> Result<u64, TransportError> {
        let path = channel_capability_path(port_id, channel_id);
        if !self.authenticate_capability(capability, &path) {
            return Err(TransportError::CapabilityNotOwned { path });
        }
        let key = (port_id.to_string(), channel_id.to_string());
        let end = self
            .channels
            .get(&key)
            .cloned()
            .ok_or_else(|| TransportError::ChannelNotFound {
                port_id: port_id.to_string(),
                channel_id: channel_id.to_string(),
            })?;

        let sequence = self.sequences.entry(key).or_insert(0);
        *sequence = sequence.saturating_add(1);
        let sequence = *sequence;

        self.sent.push(Packet {
            sequence,
            source_port: port_id.to_string(),
            source_channel: channel_id.to_string(),
            destination_port: end.counterparty_port,
            destination_channel: end.counterparty_channel,
            data,
            timeout_height,
        });
        Ok(sequence)
    }

    fn channel_capability(&self, port_id: &str, channel_id: &str) -> Option<Capability> {
        self.owned
            .get(&channel_capability_path(port_id, channel_id))
            .copied()
    }
}
