//! Protocol-wide constants shared by the registry and monitored roles.

/// Protocol version negotiated during the channel handshake.
pub const VERSION: &str = "1";

/// Port the registry role binds to.
pub const REGISTRY_PORT_ID: &str = "healthcheck";

/// Port the monitored role binds to.
pub const MONITORED_PORT_ID: &str = "monitored";

// ---------------------------------------------------------------------------
// Interval defaults
// ---------------------------------------------------------------------------

/// Update interval (in monitored-chain blocks) the registry fills in when the
/// monitored side leaves it unset.
pub const DEFAULT_UPDATE_INTERVAL: u64 = 10;

/// Timeout interval (in blocks) the registry fills in when the monitored side
/// leaves it unset.
pub const DEFAULT_TIMEOUT_INTERVAL: u64 = 20;

/// Update interval the monitored side proposes in open-init.
pub const MAX_UPDATE_INTERVAL: u64 = 10;

/// Timeout interval the monitored side proposes in open-init.
pub const MAX_TIMEOUT_INTERVAL: u64 = 20;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Key prefix under which [`crate::state::ChainRecord`]s are stored.
pub const DEFAULT_KEY_PREFIX: &str = "Chain/value/";

/// Result bytes carried by a successful acknowledgement.
pub const ACK_SUCCESS_RESULT: [u8; 1] = [1];
