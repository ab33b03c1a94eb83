//! Configuration for the registry and monitored roles.

use {
    crate::{
        constants::{
            DEFAULT_TIMEOUT_INTERVAL, DEFAULT_UPDATE_INTERVAL, MAX_TIMEOUT_INTERVAL,
            MAX_UPDATE_INTERVAL, MONITORED_PORT_ID, REGISTRY_PORT_ID, VERSION,
        },
        error::{HealthcheckError, Result},
    },
    serde::{Deserialize, Serialize},
};

/// Configuration for the registry (monitor) role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Port the registry is bound to.  Open-try on any other port is refused.
    /// Default: `healthcheck`
    pub port_id: String,

    /// Port monitored peers must open their end of the channel on.
    /// Default: `monitored`
    pub counterparty_port_id: String,

    /// Protocol version the registry speaks and returns from open-try.
    pub version: String,

    /// Update interval written to a record when the peer's metadata leaves it
    /// at zero.
    pub default_update_interval: u64,

    /// Timeout interval written to a record when the peer's metadata leaves it
    /// at zero.
    pub default_timeout_interval: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            port_id: REGISTRY_PORT_ID.to_string(),
            counterparty_port_id: MONITORED_PORT_ID.to_string(),
            version: VERSION.to_string(),
            default_update_interval: DEFAULT_UPDATE_INTERVAL,
            default_timeout_interval: DEFAULT_TIMEOUT_INTERVAL,
        }
    }
}

impl RegistryConfig {
    /// Reject configurations the handshake could never succeed with.
    pub fn validate(&self) -> Result<()> {
        check_non_empty("port_id", &self.port_id)?;
        check_non_empty("counterparty_port_id", &self.counterparty_port_id)?;
        check_non_empty("version", &self.version)?;
        check_non_zero("default_update_interval", self.default_update_interval)?;
        check_non_zero("default_timeout_interval", self.default_timeout_interval)
    }
}

/// Configuration for the monitored role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredConfig {
    /// Port the monitored side is bound to.
    /// Default: `monitored`
    pub port_id: String,

    /// Port the registry listens on.
    /// Default: `healthcheck`
    pub counterparty_port_id: String,

    /// Protocol version proposed in open-init and expected back in open-ack.
    pub version: String,

    /// Blocks between two liveness reports.  Also proposed to the registry in
    /// the handshake metadata.
    pub update_interval: u64,

    /// Blocks a report may stay in flight before it times out.  Also proposed
    /// to the registry in the handshake metadata.
    pub timeout_interval: u64,
}

impl Default for MonitoredConfig {
    fn default() -> Self {
        Self {
            port_id: MONITORED_PORT_ID.to_string(),
            counterparty_port_id: REGISTRY_PORT_ID.to_string(),
            version: VERSION.to_string(),
            update_interval: MAX_UPDATE_INTERVAL,
            timeout_interval: MAX_TIMEOUT_INTERVAL,
        }
    }
}

impl MonitoredConfig {
    /// Reject configurations the handshake could never succeed with.
    pub fn validate(&self) -> Result<()> {
        check_non_empty("port_id", &self.port_id)?;
        check_non_empty("counterparty_port_id", &self.counterparty_port_id)?;
        check_non_empty("version", &self.version)?;
        check_non_zero("update_interval", self.update_interval)?;
        check_non_zero("timeout_interval", self.timeout_interval)
    }
}

fn check_non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(HealthcheckError::InvalidConfig {
            reason: format!("{field} must not be empty"),
        });
    }
    Ok(())
}

fn check_non_zero(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(HealthcheckError::InvalidConfig {
            reason: format!("{field} must be greater than zero"),
        });
    }
    Ok(())
}
