//! Observability events.
//!
//! Neither role retries anything; instead every delivery outcome and every
//! accepted or rejected report is surfaced here so operators and tooling can
//! act on it.

use {
    crate::message::Acknowledgement,
    log::{info, warn},
    parking_lot::Mutex,
    std::fmt,
};

/// Something worth telling an operator about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthcheckEvent {
    /// A handshake completed on this side.
    ChannelOpened { port_id: String, channel_id: String },
    /// Monitored side committed a liveness report.
    ReportSent {
        sequence: u64,
        timestamp: u64,
        block: u64,
    },
    /// Monitored side received an acknowledgement.
    PacketAcknowledged { ack: Acknowledgement },
    /// The acknowledgement carried a success result.
    AcknowledgementSuccess { result: Vec<u8> },
    /// The acknowledgement carried an error string.
    AcknowledgementError { error: String },
    /// A report timed out before the registry received it.
    PacketTimeout { sequence: u64 },
    /// Registry applied a report.
    ReportAccepted {
        peer_id: String,
        timestamp: u64,
        block: u64,
        observed_at_height: u64,
    },
    /// Registry refused a packet.
    ReportRejected { peer_id: Option<String>, reason: String },
}

impl HealthcheckEvent {
    /// Event type tag, stable for indexing.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChannelOpened { .. } => "channel_opened",
            Self::ReportSent { .. } => "report_sent",
            Self::PacketAcknowledged { .. } => "acknowledgement",
            Self::AcknowledgementSuccess { .. } => "acknowledgement_success",
            Self::AcknowledgementError { .. } => "acknowledgement_error",
            Self::PacketTimeout { .. } => "timeout",
            Self::ReportAccepted { .. } => "report_accepted",
            Self::ReportRejected { .. } => "report_rejected",
        }
    }
}

impl fmt::Display for HealthcheckEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelOpened {
                port_id,
                channel_id,
            } => write!(f, "{}: port={port_id} channel={channel_id}", self.kind()),
            Self::ReportSent {
                sequence,
                timestamp,
                block,
            } => write!(
                f,
                "{}: sequence={sequence} timestamp={timestamp} block={block}",
                self.kind()
            ),
            Self::PacketAcknowledged { ack } => write!(f, "{}: {ack}", self.kind()),
            Self::AcknowledgementSuccess { result } => {
                write!(f, "{}: result={result:?}", self.kind())
            }
            Self::AcknowledgementError { error } => write!(f, "{}: {error}", self.kind()),
            Self::PacketTimeout { sequence } => write!(f, "{}: sequence={sequence}", self.kind()),
            Self::ReportAccepted {
                peer_id,
                timestamp,
                block,
                observed_at_height,
            } => write!(
                f,
                "{}: peer={peer_id} timestamp={timestamp} block={block} observed_at={observed_at_height}",
                self.kind()
            ),
            Self::ReportRejected { peer_id, reason } => write!(
                f,
                "{}: peer={} reason={reason}",
                self.kind(),
                peer_id.as_deref().unwrap_or("<unknown>")
            ),
        }
    }
}

/// Receiver for [`HealthcheckEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: HealthcheckEvent);
}

/// Writes every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: HealthcheckEvent) {
        match event {
            HealthcheckEvent::AcknowledgementError { .. }
            | HealthcheckEvent::PacketTimeout { .. }
            | HealthcheckEvent::ReportRejected { .. } => warn!("{event}"),
            _ => info!("{event}"),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<HealthcheckEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<HealthcheckEvent> {
        self.events.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<HealthcheckEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: HealthcheckEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        sink.emit(HealthcheckEvent::PacketTimeout { sequence: 1 });
        sink.emit(HealthcheckEvent::AcknowledgementError {
            error: "stale".to_string(),
        });
        assert_eq!(
            sink.events(),
            vec![
                HealthcheckEvent::PacketTimeout { sequence: 1 },
                HealthcheckEvent::AcknowledgementError {
                    error: "stale".to_string()
                },
            ]
        );
        assert_eq!(sink.drain().len(), 2);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_display_includes_kind() {
        let event = HealthcheckEvent::ReportRejected {
            peer_id: None,
            reason: "bad".to_string(),
        };
        assert_eq!(event.to_string(), "report_rejected: peer=<unknown> reason=bad");
        assert_eq!(
            HealthcheckEvent::PacketTimeout { sequence: 4 }.to_string(),
            "timeout: sequence=4"
        );
        assert_eq!(
            HealthcheckEvent::PacketAcknowledged {
                ack: Acknowledgement::success()
            }
            .to_string(),
            "acknowledgement: result=01"
        );
    }
}
