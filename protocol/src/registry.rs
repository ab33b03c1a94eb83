//! The registry (monitor) role.
//!
//! The registry accepts handshakes from pre-registered peers, records the
//! negotiated intervals, binds exactly one channel per peer and applies the
//! liveness reports that arrive on it.  It never initiates a handshake and
//! never sends packets.

use {
    crate::{
        config::RegistryConfig,
        error::{HealthcheckError, Result},
        events::{EventSink, HealthcheckEvent},
        handshake::{check_counterparty_port, check_ordered, check_port, check_version, ChannelHandshake},
        message::{Acknowledgement, HandshakeMetadata, HealthcheckPacketData},
        packet::{apply_report, PacketHandler},
        state::ChainRecord,
        store::RecordStore,
        transport::{channel_capability_path, ChannelContext, OpenInit, OpenTry, Packet},
        Role,
    },
    log::{debug, error, info, warn},
    std::sync::Arc,
};

/// Registry-side channel end.
pub struct RegistryModule<S> {
    config: RegistryConfig,
    store: S,
    events: Arc<dyn EventSink>,
}

impl<S: RecordStore> RegistryModule<S> {
    /// Create a registry over `store`.  Fails if `config` is unusable.
    pub fn new(config: RegistryConfig, store: S, events: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            events,
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The record store, for administrative access.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current record for `peer_id`, if registered.
    pub fn record(&self, peer_id: &str) -> Result<Option<ChainRecord>> {
        Ok(self.store.get(peer_id)?)
    }

    fn load_record(&self, peer_id: &str) -> Result<ChainRecord> {
        self.store
            .get(peer_id)?
            .ok_or_else(|| HealthcheckError::ChainNotRegistered {
                peer_id: peer_id.to_string(),
            })
    }

    /// Validate and apply one inbound packet.  Returns the updated record.
    ///
    /// Nothing is written unless every check passes.
    pub fn process_packet(
        &mut self,
        ctx: &mut dyn ChannelContext,
        packet: &Packet,
    ) -> Result<ChainRecord> {
        let data = HealthcheckPacketData::deserialize(&packet.data)?;

        let peer_id = ctx
            .counterparty_peer_from_channel(&packet.destination_port, &packet.destination_channel)?;
        let record = self.load_record(&peer_id)?;

        // Only the channel completed by open-confirm carries reports.
        if record.channel_id != packet.destination_channel {
            return Err(HealthcheckError::ChannelNotBound {
                peer_id,
                expected: record.channel_id,
                got: packet.destination_channel.clone(),
            });
        }

        let updated = match data {
            HealthcheckPacketData::Report(report) => {
                apply_report(&record, &report, ctx.current_height())?
            }
        };
        self.store.set(&updated)?;
        Ok(updated)
    }
}

impl<S: RecordStore> ChannelHandshake for RegistryModule<S> {
    fn on_chan_open_init(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        msg: &OpenInit,
    ) -> Result<String> {
        warn!("refusing open-init on {}/{}", msg.port_id, msg.channel_id);
        Err(HealthcheckError::InvalidChannelFlow {
            role: Role::Registry,
            step: "open-init",
        })
    }

    fn on_chan_open_try(&mut self, ctx: &mut dyn ChannelContext, msg: &OpenTry) -> Result<String> {
        check_ordered(msg.order)?;
        check_port(&msg.port_id, &self.config.port_id)?;
        check_counterparty_port(&msg.counterparty.port_id, &self.config.counterparty_port_id)?;

        let mut metadata = HandshakeMetadata::decode(&msg.counterparty_version)?;
        check_version(&metadata.version, &self.config.version)?;

        let [link_id] = msg.connection_hops.as_slice() else {
            return Err(HealthcheckError::InvalidConnectionHops {
                got: msg.connection_hops.len(),
            });
        };

        let peer_id = ctx.counterparty_peer_from_link(link_id)?;
        let mut record = self.load_record(&peer_id)?;

        if record.transport_link_id != *link_id {
            return Err(HealthcheckError::UnexpectedConnectionId {
                peer_id,
                expected: record.transport_link_id,
                got: link_id.clone(),
            });
        }

        // Single channel per peer.  A closed or timed-out channel is not
        // reopened.
        if record.is_tracked() {
            return Err(HealthcheckError::ChainAlreadyTracked { peer_id });
        }

        if metadata.update_interval == 0 {
            metadata.update_interval = self.config.default_update_interval;
        }
        if metadata.timeout_interval == 0 {
            metadata.timeout_interval = self.config.default_timeout_interval;
        }
        let original = record.clone();
        record.update_interval = metadata.update_interval;
        record.timeout_interval = metadata.timeout_interval;
        self.store.set(&record)?;

        // Under crossing hellos the capability may already be ours from
        // open-init; only claim it when it is not.  A failed claim puts the
        // record back.
        let path = channel_capability_path(&msg.port_id, &msg.channel_id);
        if !ctx.authenticate_capability(&msg.capability, &path) {
            if let Err(err) = ctx.claim_capability(&msg.capability, &path) {
                warn!("open-try for chain {peer_id} on {}: {err}", msg.channel_id);
                self.store.set(&original)?;
                return Err(err.into());
            }
        }

        info!(
            "open-try accepted for chain {} on {} (update_interval={}, timeout_interval={})",
            peer_id, msg.channel_id, record.update_interval, record.timeout_interval
        );
        Ok(self.config.version.clone())
    }

    fn on_chan_open_ack(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        port_id: &str,
        channel_id: &str,
        _counterparty_channel_id: &str,
        _counterparty_version: &str,
    ) -> Result<()> {
        warn!("refusing open-ack on {port_id}/{channel_id}");
        Err(HealthcheckError::InvalidChannelFlow {
            role: Role::Registry,
            step: "open-ack",
        })
    }

    fn on_chan_open_confirm(
        &mut self,
        ctx: &mut dyn ChannelContext,
        port_id: &str,
        channel_id: &str,
    ) -> Result<()> {
        let peer_id = ctx.counterparty_peer_from_channel(port_id, channel_id)?;
        let mut record = self.load_record(&peer_id)?;

        if record.has_channel() && record.channel_id != channel_id {
            return Err(HealthcheckError::ChannelAlreadyBound {
                peer_id,
                existing: record.channel_id,
                got: channel_id.to_string(),
            });
        }
        if let Some(bound_peer_id) = self.store.channel_binding(channel_id)? {
            if bound_peer_id != peer_id {
                return Err(HealthcheckError::ChannelBoundToOtherPeer {
                    channel_id: channel_id.to_string(),
                    bound_peer_id,
                    peer_id,
                });
            }
        }

        record.channel_id = channel_id.to_string();
        self.store.set(&record)?;

        info!("channel {channel_id} bound to chain {peer_id}");
        self.events.emit(HealthcheckEvent::ChannelOpened {
            port_id: port_id.to_string(),
            channel_id: channel_id.to_string(),
        });
        Ok(())
    }
}

impl<S: RecordStore> PacketHandler for RegistryModule<S> {
    fn on_recv_packet(&mut self, ctx: &mut dyn ChannelContext, packet: &Packet) -> Acknowledgement {
        match self.process_packet(ctx, packet) {
            Ok(record) => {
                debug!(
                    "accepted report from {} (timestamp={}, block={})",
                    record.peer_id, record.last_timestamp, record.last_block
                );
                self.events.emit(HealthcheckEvent::ReportAccepted {
                    peer_id: record.peer_id,
                    timestamp: record.last_timestamp,
                    block: record.last_block,
                    observed_at_height: record.observed_at_height,
                });
                Acknowledgement::success()
            }
            Err(err) => {
                warn!(
                    "rejected packet {} on {}/{}: {}",
                    packet.sequence, packet.destination_port, packet.destination_channel, err
                );
                let peer_id = ctx
                    .counterparty_peer_from_channel(&packet.destination_port, &packet.destination_channel)
                    .ok();
                self.events.emit(HealthcheckEvent::ReportRejected {
                    peer_id,
                    reason: err.to_string(),
                });
                Acknowledgement::error(&err)
            }
        }
    }

    fn on_acknowledgement_packet(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        packet: &Packet,
        _acknowledgement: &[u8],
    ) -> Result<()> {
        error!("registry received an acknowledgement for sequence {}", packet.sequence);
        Err(HealthcheckError::UnexpectedAcknowledgement {
            sequence: packet.sequence,
        })
    }

    fn on_timeout_packet(&mut self, _ctx: &mut dyn ChannelContext, packet: &Packet) -> Result<()> {
        error!("registry received a timeout for sequence {}", packet.sequence);
        Err(HealthcheckError::UnexpectedTimeout {
            sequence: packet.sequence,
        })
    }
}
