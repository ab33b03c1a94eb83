//! Healthcheck Test Harness
//!
//! Two simulated chains, each with its own [`MockChannelContext`]:
//!
//! - the **registry chain**, running [`RegistryModule`] over a
//!   [`MemoryRecordStore`]
//! - the **monitored chain**, running [`MonitoredModule`]
//!
//! The harness plays the relayer.  It drives the four handshake steps,
//! commits blocks on both chains, and carries packets, acknowledgements and
//! timeouts across.  Nothing here is asynchronous; every step is processed to
//! completion before the next.

use {
    healthcheck_protocol::{
        config::{MonitoredConfig, RegistryConfig},
        error::Result,
        events::{HealthcheckEvent, RecordingEventSink},
        handshake::ChannelHandshake,
        instruction::AdminInstruction,
        message::Acknowledgement,
        mock::MockChannelContext,
        monitored::MonitoredModule,
        packet::PacketHandler,
        processor::process_instruction,
        registry::RegistryModule,
        state::ChainRecord,
        store::MemoryRecordStore,
        transport::{
            channel_capability_path, ChannelContext, ChannelOrder, Counterparty, OpenInit, OpenTry,
            Packet,
        },
    },
    log::{debug, info},
    std::sync::Arc,
};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Chain identifier of the monitored chain, as the registry resolves it.
pub const MONITORED_CHAIN_ID: &str = "chain-A";

/// Chain identifier of the registry chain, as the monitored side resolves it.
pub const REGISTRY_CHAIN_ID: &str = "registry";

/// Connection between the two chains.
pub const CONNECTION_ID: &str = "connection-0";

/// Channel end on the monitored chain.
pub const MONITORED_CHANNEL_ID: &str = "channel-0";

/// Channel end on the registry chain.
pub const REGISTRY_CHANNEL_ID: &str = "channel-0";

/// Account that registers chains on the registry.
pub const ADMIN: &str = "admin";

/// Starting heights and clocks of the two chains.
pub const REGISTRY_GENESIS_HEIGHT: u64 = 1;
pub const REGISTRY_GENESIS_TIME: u64 = 1_700_000_000;
pub const MONITORED_GENESIS_HEIGHT: u64 = 1;
pub const MONITORED_GENESIS_TIME: u64 = 1_700_000_100;

/// Install a test logger once per process.  Honors `RUST_LOG`.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ─── Relay outcome ───────────────────────────────────────────────────────────

/// What happened to the packets carried by one [`HealthcheckTestHarness::relay_packets`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Acknowledgements written by the registry, in delivery order.
    pub acknowledgements: Vec<Acknowledgement>,
    /// Sequences that expired before delivery.
    pub timed_out: Vec<u64>,
}

// ─── Test harness ────────────────────────────────────────────────────────────

/// Registry chain, monitored chain, and the relayer between them.
pub struct HealthcheckTestHarness {
    pub registry: RegistryModule<MemoryRecordStore>,
    pub registry_ctx: MockChannelContext,
    pub registry_events: Arc<RecordingEventSink>,
    pub monitored: MonitoredModule,
    pub monitored_ctx: MockChannelContext,
    pub monitored_events: Arc<RecordingEventSink>,
    /// Packets committed on the monitored chain and not yet relayed.
    pub in_flight: Vec<Packet>,
}

impl HealthcheckTestHarness {
    /// Both chains with their default configuration.
    pub fn with_default_config() -> Result<Self> {
        Self::new(RegistryConfig::default(), MonitoredConfig::default())
    }

    /// Two chains joined by [`CONNECTION_ID`].  No chain is registered yet.
    pub fn new(registry_config: RegistryConfig, monitored_config: MonitoredConfig) -> Result<Self> {
        init_logger();

        let registry_events = Arc::new(RecordingEventSink::new());
        let monitored_events = Arc::new(RecordingEventSink::new());

        let registry = RegistryModule::new(
            registry_config,
            MemoryRecordStore::default(),
            registry_events.clone(),
        )?;
        let monitored = MonitoredModule::new(monitored_config, monitored_events.clone())?;

        let mut registry_ctx = MockChannelContext::new(REGISTRY_GENESIS_HEIGHT, REGISTRY_GENESIS_TIME);
        registry_ctx.add_link(CONNECTION_ID, MONITORED_CHAIN_ID);

        let mut monitored_ctx =
            MockChannelContext::new(MONITORED_GENESIS_HEIGHT, MONITORED_GENESIS_TIME);
        monitored_ctx.add_link(CONNECTION_ID, REGISTRY_CHAIN_ID);

        Ok(Self {
            registry,
            registry_ctx,
            registry_events,
            monitored,
            monitored_ctx,
            monitored_events,
            in_flight: Vec::new(),
        })
    }

    /// Register the monitored chain on the registry, as an operator would.
    pub fn register_monitored_chain(&self) -> Result<()> {
        self.register_chain(ADMIN, MONITORED_CHAIN_ID, CONNECTION_ID)
    }

    pub fn register_chain(&self, creator: &str, chain_id: &str, connection_id: &str) -> Result<()> {
        process_instruction(
            self.registry.store(),
            AdminInstruction::CreateChain {
                creator: creator.to_string(),
                chain_id: chain_id.to_string(),
                connection_id: connection_id.to_string(),
            },
        )
    }

    /// The registry's record for the monitored chain.
    pub fn record(&self) -> Result<Option<ChainRecord>> {
        self.registry.record(MONITORED_CHAIN_ID)
    }

    // ─── Handshake steps ─────────────────────────────────────────────────

    /// Step 1 on the monitored chain.  Returns the proposed version.
    pub fn chan_open_init(&mut self) -> Result<String> {
        self.monitored_ctx.add_channel(
            &self.monitored.config().port_id,
            MONITORED_CHANNEL_ID,
            REGISTRY_CHAIN_ID,
            &self.monitored.config().counterparty_port_id,
            REGISTRY_CHANNEL_ID,
        );
        let msg = OpenInit {
            order: ChannelOrder::Ordered,
            connection_hops: vec![CONNECTION_ID.to_string()],
            port_id: self.monitored.config().port_id.clone(),
            channel_id: MONITORED_CHANNEL_ID.to_string(),
            capability: self.monitored_ctx.new_capability(),
            counterparty: Counterparty {
                port_id: self.monitored.config().counterparty_port_id.clone(),
                channel_id: String::new(),
            },
            version: self.monitored.config().version.clone(),
        };
        self.monitored.on_chan_open_init(&mut self.monitored_ctx, &msg)
    }

    /// Step 2 on the registry chain.  Returns the registry's version.
    pub fn chan_open_try(&mut self, counterparty_version: &str) -> Result<String> {
        let msg = self.open_try_message(counterparty_version);
        self.registry.on_chan_open_try(&mut self.registry_ctx, &msg)
    }

    /// Step 2 under crossing hellos: the registry chain already holds the
    /// channel capability when open-try arrives.
    pub fn chan_open_try_crossing(&mut self, counterparty_version: &str) -> Result<String> {
        let msg = self.open_try_message(counterparty_version);
        let path = channel_capability_path(&msg.port_id, &msg.channel_id);
        self.registry_ctx.claim_capability(&msg.capability, &path)?;
        self.registry.on_chan_open_try(&mut self.registry_ctx, &msg)
    }

    fn open_try_message(&mut self, counterparty_version: &str) -> OpenTry {
        self.registry_ctx.add_channel(
            &self.registry.config().port_id,
            REGISTRY_CHANNEL_ID,
            MONITORED_CHAIN_ID,
            &self.registry.config().counterparty_port_id,
            MONITORED_CHANNEL_ID,
        );
        OpenTry {
            order: ChannelOrder::Ordered,
            connection_hops: vec![CONNECTION_ID.to_string()],
            port_id: self.registry.config().port_id.clone(),
            channel_id: REGISTRY_CHANNEL_ID.to_string(),
            capability: self.registry_ctx.new_capability(),
            counterparty: Counterparty {
                port_id: self.registry.config().counterparty_port_id.clone(),
                channel_id: MONITORED_CHANNEL_ID.to_string(),
            },
            counterparty_version: counterparty_version.to_string(),
        }
    }

    /// Step 3 on the monitored chain.
    pub fn chan_open_ack(&mut self, counterparty_version: &str) -> Result<()> {
        let port_id = self.monitored.config().port_id.clone();
        self.monitored.on_chan_open_ack(
            &mut self.monitored_ctx,
            &port_id,
            MONITORED_CHANNEL_ID,
            REGISTRY_CHANNEL_ID,
            counterparty_version,
        )
    }

    /// Step 4 on the registry chain.
    pub fn chan_open_confirm(&mut self) -> Result<()> {
        let port_id = self.registry.config().port_id.clone();
        self.registry
            .on_chan_open_confirm(&mut self.registry_ctx, &port_id, REGISTRY_CHANNEL_ID)
    }

    /// All four steps in order.
    pub fn open_channel(&mut self) -> Result<()> {
        let proposed = self.chan_open_init()?;
        let version = self.chan_open_try(&proposed)?;
        self.chan_open_ack(&version)?;
        self.chan_open_confirm()?;
        info!("healthcheck channel open between {MONITORED_CHAIN_ID} and {REGISTRY_CHAIN_ID}");
        Ok(())
    }

    /// Register the monitored chain and open its channel.
    pub fn setup(&mut self) -> Result<()> {
        self.register_monitored_chain()?;
        self.open_channel()
    }

    // ─── Blocks and relaying ─────────────────────────────────────────────

    /// Run the monitored chain's end-of-block hook at its current height.
    pub fn end_block(&mut self) -> Result<Option<u64>> {
        let sequence = self.monitored.end_block(&mut self.monitored_ctx)?;
        self.in_flight.extend(self.monitored_ctx.take_sent());
        Ok(sequence)
    }

    /// Commit `blocks` blocks on both chains, running the monitored chain's
    /// end-of-block hook after each.  Returns the sequences committed.
    pub fn commit_blocks(&mut self, blocks: u64) -> Result<Vec<u64>> {
        let mut sequences = Vec::new();
        for _ in 0..blocks {
            self.registry_ctx.advance_blocks(1);
            self.monitored_ctx.advance_blocks(1);
            sequences.extend(self.end_block()?);
        }
        Ok(sequences)
    }

    /// Deliver everything in flight.  A packet whose timeout height the
    /// monitored chain has passed is timed out instead of delivered.
    pub fn relay_packets(&mut self) -> Result<RelayOutcome> {
        let mut outcome = RelayOutcome::default();
        for packet in std::mem::take(&mut self.in_flight) {
            if self.monitored_ctx.height > packet.timeout_height {
                debug!("relayer: sequence {} timed out", packet.sequence);
                self.monitored
                    .on_timeout_packet(&mut self.monitored_ctx, &packet)?;
                outcome.timed_out.push(packet.sequence);
                continue;
            }

            let ack = self
                .registry
                .on_recv_packet(&mut self.registry_ctx, &packet);
            debug!("relayer: sequence {} acknowledged with {:?}", packet.sequence, ack);
            self.monitored.on_acknowledgement_packet(
                &mut self.monitored_ctx,
                &packet,
                &ack.serialize()?,
            )?;
            outcome.acknowledgements.push(ack);
        }
        Ok(outcome)
    }

    /// Event kinds emitted on the monitored chain, in order.
    pub fn monitored_event_kinds(&self) -> Vec<&'static str> {
        self.monitored_events
            .events()
            .iter()
            .map(HealthcheckEvent::kind)
            .collect()
    }

    /// Event kinds emitted on the registry chain, in order.
    pub fn registry_event_kinds(&self) -> Vec<&'static str> {
        self.registry_events
            .events()
            .iter()
            .map(HealthcheckEvent::kind)
            .collect()
    }
}
