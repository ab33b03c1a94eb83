//! Wire types exchanged between the monitored and registry roles.
//!
//! Handshake metadata, packet data and acknowledgements are all JSON.  The
//! metadata travels inside the channel version string during open-init and
//! open-try; reports and acknowledgements travel as packet and ack bytes.

use {
    crate::{
        constants::ACK_SUCCESS_RESULT,
        error::{HealthcheckError, Result},
    },
    serde::{Deserialize, Serialize},
    std::fmt,
};

// ── Handshake metadata ──────────────────────────────────────────────────────

/// Parameters proposed by the monitored side in open-init.
///
/// A zero interval means "not proposed"; the registry substitutes its
/// default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeMetadata {
    pub version: String,
    #[serde(default)]
    pub update_interval: u64,
    #[serde(default)]
    pub timeout_interval: u64,
}

impl HandshakeMetadata {
    /// Encode as a channel version string.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| HealthcheckError::InvalidHandshakeMetadata {
            reason: err.to_string(),
            metadata: format!("{self:?}"),
        })
    }

    /// Decode from the counterparty's channel version string.
    pub fn decode(version: &str) -> Result<Self> {
        serde_json::from_str(version).map_err(|err| HealthcheckError::InvalidHandshakeMetadata {
            reason: format!("error unmarshalling open-try metadata: {err}"),
            metadata: version.to_string(),
        })
    }
}

// ── Packet data ─────────────────────────────────────────────────────────────

/// A peer's attestation of its own progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessReport {
    /// Peer wall-clock time in unix seconds.
    pub timestamp: u64,
    /// Peer block height.
    pub block: u64,
}

/// Every packet on a healthcheck channel carries exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthcheckPacketData {
    Report(LivenessReport),
}

impl HealthcheckPacketData {
    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|err| HealthcheckError::MalformedPacket(err.to_string()))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|err| HealthcheckError::MalformedPacket(err.to_string()))
    }

    /// Short tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Report(_) => "report",
        }
    }
}

impl From<LivenessReport> for HealthcheckPacketData {
    fn from(report: LivenessReport) -> Self {
        Self::Report(report)
    }
}

// ── Acknowledgement ─────────────────────────────────────────────────────────

/// Outcome written by the receiving end for every packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    Result(Vec<u8>),
    Error(String),
}

impl Acknowledgement {
    pub fn success() -> Self {
        Self::Result(ACK_SUCCESS_RESULT.to_vec())
    }

    pub fn error(err: &HealthcheckError) -> Self {
        Self::Error(err.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|err| HealthcheckError::MalformedAcknowledgement(err.to_string()))
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data)
            .map_err(|err| HealthcheckError::MalformedAcknowledgement(err.to_string()))
    }
}

/// `result=<hex bytes>` or `error=<reason>`.
impl fmt::Display for Acknowledgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Result(result) => {
                f.write_str("result=")?;
                for byte in result {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Error(error) => write!(f, "error={error}"),
        }
    }
}
