//! The monitored role.
//!
//! A monitored chain opens exactly one channel towards its registry and then
//! reports its own progress on it every `update_interval` blocks.  Delivery
//! outcomes come back as acknowledgements or timeouts and are surfaced as
//! events; nothing is retried here.

use {
    crate::{
        config::MonitoredConfig,
        error::{HealthcheckError, Result},
        events::{EventSink, HealthcheckEvent},
        handshake::{check_counterparty_port, check_ordered, check_port, check_version, ChannelHandshake},
        message::{Acknowledgement, HandshakeMetadata, HealthcheckPacketData, LivenessReport},
        packet::PacketHandler,
        state::HandshakeState,
        transport::{
            channel_capability_path, ChannelContext, OpenInit, OpenTry, Packet, TransportError,
        },
        Role,
    },
    log::{debug, info, warn},
    serde::{Deserialize, Serialize},
    std::sync::Arc,
};

/// Local state of the monitored role.  Hosts persist it between blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredState {
    /// Channel reports are sent on; set once by open-ack.
    pub registry_channel_id: Option<String>,
    /// Channel whose open-init succeeded and that awaits open-ack.
    pub pending_channel_id: Option<String>,
    /// Own height at which the last report was committed.
    pub last_report_height: Option<u64>,
}

/// Monitored-side channel end.
pub struct MonitoredModule {
    config: MonitoredConfig,
    state: MonitoredState,
    events: Arc<dyn EventSink>,
}

impl MonitoredModule {
    pub fn new(config: MonitoredConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        Self::with_state(config, MonitoredState::default(), events)
    }

    /// Resume from previously persisted state.
    pub fn with_state(
        config: MonitoredConfig,
        state: MonitoredState,
        events: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state,
            events,
        })
    }

    pub fn config(&self) -> &MonitoredConfig {
        &self.config
    }

    pub fn state(&self) -> &MonitoredState {
        &self.state
    }

    pub fn registry_channel_id(&self) -> Option<&str> {
        self.state.registry_channel_id.as_deref()
    }

    pub fn handshake_state(&self) -> HandshakeState {
        if self.state.registry_channel_id.is_some() {
            HandshakeState::Open
        } else if self.state.pending_channel_id.is_some() {
            HandshakeState::InitSent
        } else {
            HandshakeState::Uninitiated
        }
    }

    /// Whether a report is owed at `height`: the first one right after the
    /// channel opens, then one every `update_interval` blocks.
    pub fn report_due(&self, height: u64) -> bool {
        match self.state.last_report_height {
            None => true,
            Some(last) => height >= last.saturating_add(self.config.update_interval),
        }
    }

    /// Snapshot of the local chain's progress.  Requires a bound channel.
    pub fn build_report(&self, ctx: &dyn ChannelContext) -> Result<LivenessReport> {
        if self.state.registry_channel_id.is_none() {
            return Err(HealthcheckError::ChannelNotSet);
        }
        Ok(LivenessReport {
            timestamp: ctx.current_time(),
            block: ctx.current_height(),
        })
    }

    /// Commit a report on the registry channel.  Returns its sequence.
    pub fn send_report(&mut self, ctx: &mut dyn ChannelContext) -> Result<u64> {
        let report = self.build_report(ctx)?;
        let channel_id = self
            .state
            .registry_channel_id
            .clone()
            .ok_or(HealthcheckError::ChannelNotSet)?;
        let port_id = &self.config.port_id;

        let capability = ctx.channel_capability(port_id, &channel_id).ok_or_else(|| {
            TransportError::CapabilityNotOwned {
                path: channel_capability_path(port_id, &channel_id),
            }
        })?;

        let data = HealthcheckPacketData::from(report).serialize()?;
        let timeout_height = report.block.saturating_add(self.config.timeout_interval);
        let sequence = ctx.send_packet(&capability, port_id, &channel_id, timeout_height, data)?;

        self.state.last_report_height = Some(report.block);
        debug!(
            "sent report {} on {} (timestamp={}, block={})",
            sequence, channel_id, report.timestamp, report.block
        );
        self.events.emit(HealthcheckEvent::ReportSent {
            sequence,
            timestamp: report.timestamp,
            block: report.block,
        });
        Ok(sequence)
    }

    /// End-of-block hook: send a report if one is due.  Returns the sequence
    /// of the committed packet, if any.
    pub fn end_block(&mut self, ctx: &mut dyn ChannelContext) -> Result<Option<u64>> {
        if self.state.registry_channel_id.is_none() {
            return Ok(None);
        }
        if !self.report_due(ctx.current_height()) {
            return Ok(None);
        }
        self.send_report(ctx).map(Some)
    }
}

impl ChannelHandshake for MonitoredModule {
    fn on_chan_open_init(
        &mut self,
        ctx: &mut dyn ChannelContext,
        msg: &OpenInit,
    ) -> Result<String> {
        check_ordered(msg.order)?;
        check_port(&msg.port_id, &self.config.port_id)?;
        check_version(&msg.version, &self.config.version)?;
        check_counterparty_port(&msg.counterparty.port_id, &self.config.counterparty_port_id)?;

        if let Some(channel_id) = &self.state.registry_channel_id {
            return Err(HealthcheckError::ChannelAlreadySet {
                channel_id: channel_id.clone(),
            });
        }

        let metadata = HandshakeMetadata {
            version: msg.version.clone(),
            update_interval: self.config.update_interval,
            timeout_interval: self.config.timeout_interval,
        }
        .encode()?;

        ctx.claim_capability(
            &msg.capability,
            &channel_capability_path(&msg.port_id, &msg.channel_id),
        )?;

        if let Some(previous) = self
            .state
            .pending_channel_id
            .replace(msg.channel_id.clone())
        {
            warn!("open-init on {} supersedes pending {}", msg.channel_id, previous);
        }
        info!("open-init on {}/{}", msg.port_id, msg.channel_id);
        Ok(metadata)
    }

    fn on_chan_open_try(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        msg: &OpenTry,
    ) -> Result<String> {
        warn!("refusing open-try on {}/{}", msg.port_id, msg.channel_id);
        Err(HealthcheckError::InvalidChannelFlow {
            role: Role::Monitored,
            step: "open-try",
        })
    }

    fn on_chan_open_ack(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        port_id: &str,
        channel_id: &str,
        _counterparty_channel_id: &str,
        counterparty_version: &str,
    ) -> Result<()> {
        // An ack for some other channel leaves the pending init alone.
        if self.state.pending_channel_id.as_deref() != Some(channel_id) {
            return Err(HealthcheckError::UnexpectedChannelId {
                got: channel_id.to_string(),
                expected: self.state.pending_channel_id.clone().unwrap_or_default(),
            });
        }
        // From here on the pending init for this channel is consumed.
        self.state.pending_channel_id = None;

        check_version(counterparty_version, &self.config.version)?;
        if let Some(existing) = &self.state.registry_channel_id {
            return Err(HealthcheckError::ChannelAlreadySet {
                channel_id: existing.clone(),
            });
        }

        self.state.registry_channel_id = Some(channel_id.to_string());
        self.state.last_report_height = None;

        info!("registry channel set to {channel_id}");
        self.events.emit(HealthcheckEvent::ChannelOpened {
            port_id: port_id.to_string(),
            channel_id: channel_id.to_string(),
        });
        Ok(())
    }

    fn on_chan_open_confirm(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        port_id: &str,
        channel_id: &str,
    ) -> Result<()> {
        warn!("refusing open-confirm on {port_id}/{channel_id}");
        Err(HealthcheckError::InvalidChannelFlow {
            role: Role::Monitored,
            step: "open-confirm",
        })
    }
}

impl PacketHandler for MonitoredModule {
    fn on_recv_packet(&mut self, _ctx: &mut dyn ChannelContext, packet: &Packet) -> Acknowledgement {
        let err = HealthcheckError::PacketsNotAccepted {
            port_id: packet.destination_port.clone(),
        };
        warn!("{err}");
        Acknowledgement::error(&err)
    }

    fn on_acknowledgement_packet(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        packet: &Packet,
        acknowledgement: &[u8],
    ) -> Result<()> {
        let ack = Acknowledgement::deserialize(acknowledgement)?;
        debug!("acknowledgement for sequence {}: {}", packet.sequence, ack);

        self.events.emit(HealthcheckEvent::PacketAcknowledged { ack: ack.clone() });
        match ack {
            Acknowledgement::Result(result) => {
                self.events
                    .emit(HealthcheckEvent::AcknowledgementSuccess { result });
            }
            Acknowledgement::Error(error) => {
                self.events
                    .emit(HealthcheckEvent::AcknowledgementError { error });
            }
        }
        Ok(())
    }

    fn on_timeout_packet(&mut self, _ctx: &mut dyn ChannelContext, packet: &Packet) -> Result<()> {
        self.events.emit(HealthcheckEvent::PacketTimeout {
            sequence: packet.sequence,
        });
        Ok(())
    }
}
