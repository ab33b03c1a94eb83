//! Integration tests for the channel handshake between the two chains.

use {
    crate::harness::{
        HealthcheckTestHarness, ADMIN, CONNECTION_ID, MONITORED_CHAIN_ID, MONITORED_CHANNEL_ID,
        REGISTRY_CHANNEL_ID,
    },
    assert_matches::assert_matches,
    healthcheck_protocol::{
        config::{MonitoredConfig, RegistryConfig},
        error::HealthcheckError,
        instruction::AdminInstruction,
        message::Acknowledgement,
        processor::process_instruction,
        state::{ChainRecord, ChainStatus, HandshakeState},
        transport::channel_capability_path,
    },
};

// ═══════════════════════════════════════════════════════════════════════════
//  1. Happy path
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_handshake_opens_channel() {
    let mut harness = HealthcheckTestHarness::with_default_config().unwrap();
    harness.setup().unwrap();

    let record = harness.record().unwrap().unwrap();
    assert_eq!(record.peer_id, MONITORED_CHAIN_ID);
    assert_eq!(record.channel_id, REGISTRY_CHANNEL_ID);
    assert_eq!(record.update_interval, 10);
    assert_eq!(record.timeout_interval, 20);
    assert_eq!(record.status, ChainStatus::Inactive);
    assert_eq!(record.handshake_state(), HandshakeState::Open);

    assert_eq!(harness.monitored.registry_channel_id(), Some(MONITORED_CHANNEL_ID));
    assert_eq!(harness.monitored.handshake_state(), HandshakeState::Open);

    assert_eq!(harness.registry_event_kinds(), vec!["channel_opened"]);
    assert_eq!(harness.monitored_event_kinds(), vec!["channel_opened"]);
}

#[test]
fn test_handshake_step_by_step() {
    let mut harness = HealthcheckTestHarness::with_default_config().unwrap();
    harness.register_monitored_chain().unwrap();

    let proposed = harness.chan_open_init().unwrap();
    assert_eq!(harness.monitored.handshake_state(), HandshakeState::InitSent);
    assert_eq!(
        harness.record().unwrap().unwrap().handshake_state(),
        HandshakeState::Uninitiated
    );

    let version = harness.chan_open_try(&proposed).unwrap();
    assert_eq!(version, "1");
    assert_eq!(
        harness.record().unwrap().unwrap().handshake_state(),
        HandshakeState::TryReceived
    );

    harness.chan_open_ack(&version).unwrap();
    assert_eq!(harness.monitored.handshake_state(), HandshakeState::Open);
    harness.chan_open_confirm().unwrap();
    assert_eq!(
        harness.record().unwrap().unwrap().handshake_state(),
        HandshakeState::Open
    );
}

#[test]
fn test_handshake_negotiates_proposed_intervals() {
    let monitored_config = MonitoredConfig {
        update_interval: 3,
        timeout_interval: 6,
        ..MonitoredConfig::default()
    };
    let mut harness =
        HealthcheckTestHarness::new(RegistryConfig::default(), monitored_config).unwrap();
    harness.setup().unwrap();

    let record = harness.record().unwrap().unwrap();
    assert_eq!(record.update_interval, 3);
    assert_eq!(record.timeout_interval, 6);
}

#[test]
fn test_crossing_hellos_open_channel() {
    let mut harness = HealthcheckTestHarness::with_default_config().unwrap();
    harness.register_monitored_chain().unwrap();

    let proposed = harness.chan_open_init().unwrap();
    let version = harness.chan_open_try_crossing(&proposed).unwrap();
    assert_eq!(version, "1");
    let path = channel_capability_path(&harness.registry.config().port_id, REGISTRY_CHANNEL_ID);
    assert!(harness.registry_ctx.owns(&path));

    harness.chan_open_ack(&version).unwrap();
    harness.chan_open_confirm().unwrap();
    assert_eq!(
        harness.record().unwrap().unwrap().handshake_state(),
        HandshakeState::Open
    );

    harness.end_block().unwrap();
    let outcome = harness.relay_packets().unwrap();
    assert_eq!(outcome.acknowledgements, vec![Acknowledgement::success()]);
}

// ═══════════════════════════════════════════════════════════════════════════
//  2. Registration
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_handshake_requires_registration() {
    let mut harness = HealthcheckTestHarness::with_default_config().unwrap();

    let proposed = harness.chan_open_init().unwrap();
    assert_matches!(
        harness.chan_open_try(&proposed),
        Err(HealthcheckError::ChainNotRegistered { peer_id }) if peer_id == MONITORED_CHAIN_ID
    );
    assert_eq!(harness.record().unwrap(), None);
    assert!(harness.registry.store().is_empty());
}

#[test]
fn test_handshake_over_unexpected_connection() {
    let mut harness = HealthcheckTestHarness::with_default_config().unwrap();
    harness
        .register_chain(ADMIN, MONITORED_CHAIN_ID, "connection-9")
        .unwrap();

    let proposed = harness.chan_open_init().unwrap();
    assert_matches!(
        harness.chan_open_try(&proposed),
        Err(HealthcheckError::UnexpectedConnectionId { expected, got, .. })
            if expected == "connection-9" && got == CONNECTION_ID
    );
    assert_eq!(
        harness.record().unwrap().unwrap(),
        ChainRecord::new(ADMIN, MONITORED_CHAIN_ID, "connection-9")
    );
}

#[test]
fn test_connection_fixed_by_admin_before_handshake() {
    let mut harness = HealthcheckTestHarness::with_default_config().unwrap();
    harness
        .register_chain(ADMIN, MONITORED_CHAIN_ID, "connection-9")
        .unwrap();
    process_instruction(
        harness.registry.store(),
        AdminInstruction::UpdateChain {
            creator: ADMIN.to_string(),
            chain_id: MONITORED_CHAIN_ID.to_string(),
            connection_id: CONNECTION_ID.to_string(),
        },
    )
    .unwrap();

    harness.open_channel().unwrap();
    assert!(harness.record().unwrap().unwrap().has_channel());

    assert_matches!(
        process_instruction(
            harness.registry.store(),
            AdminInstruction::UpdateChain {
                creator: ADMIN.to_string(),
                chain_id: MONITORED_CHAIN_ID.to_string(),
                connection_id: "connection-9".to_string(),
            },
        ),
        Err(HealthcheckError::ConnectionLocked { .. })
    );
}

#[test]
fn test_version_mismatch_commits_nothing() {
    let registry_config = RegistryConfig {
        version: "2".to_string(),
        ..RegistryConfig::default()
    };
    let mut harness =
        HealthcheckTestHarness::new(registry_config, MonitoredConfig::default()).unwrap();
    harness.register_monitored_chain().unwrap();

    let proposed = harness.chan_open_init().unwrap();
    assert_matches!(
        harness.chan_open_try(&proposed),
        Err(HealthcheckError::InvalidVersion { got, expected }) if got == "1" && expected == "2"
    );
    assert!(!harness.record().unwrap().unwrap().is_tracked());
}

// ═══════════════════════════════════════════════════════════════════════════
//  3. Single channel per peer
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_second_handshake_rejected_on_both_sides() {
    let mut harness = HealthcheckTestHarness::with_default_config().unwrap();
    harness.setup().unwrap();
    let before = harness.record().unwrap().unwrap();

    assert_matches!(
        harness.chan_open_init(),
        Err(HealthcheckError::ChannelAlreadySet { .. })
    );

    let proposed = r#"{"version":"1","update_interval":1,"timeout_interval":2}"#;
    assert_matches!(
        harness.chan_open_try(proposed),
        Err(HealthcheckError::ChainAlreadyTracked { peer_id }) if peer_id == MONITORED_CHAIN_ID
    );
    assert_eq!(harness.record().unwrap().unwrap(), before);
}

#[test]
fn test_deleted_chain_cannot_complete_handshake() {
    let mut harness = HealthcheckTestHarness::with_default_config().unwrap();
    harness.register_monitored_chain().unwrap();
    let proposed = harness.chan_open_init().unwrap();

    process_instruction(
        harness.registry.store(),
        AdminInstruction::DeleteChain {
            creator: ADMIN.to_string(),
            chain_id: MONITORED_CHAIN_ID.to_string(),
        },
    )
    .unwrap();

    assert_matches!(
        harness.chan_open_try(&proposed),
        Err(HealthcheckError::ChainNotRegistered { .. })
    );
}
