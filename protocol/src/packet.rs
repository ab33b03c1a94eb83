//! Packet callbacks and the report staleness rule.

use crate::{
    error::{HealthcheckError, Result},
    message::{Acknowledgement, LivenessReport},
    state::{ChainRecord, ChainStatus},
    transport::{ChannelContext, Packet},
};

/// Packet lifecycle callbacks the transport invokes on a channel end.
pub trait PacketHandler {
    /// A packet arrived.  Failures are returned as an error acknowledgement so
    /// they reach the sender; they never abort the channel.
    fn on_recv_packet(&mut self, ctx: &mut dyn ChannelContext, packet: &Packet) -> Acknowledgement;

    /// The counterparty acknowledged a packet this end sent.
    fn on_acknowledgement_packet(
        &mut self,
        ctx: &mut dyn ChannelContext,
        packet: &Packet,
        acknowledgement: &[u8],
    ) -> Result<()>;

    /// A packet this end sent expired before delivery.
    fn on_timeout_packet(&mut self, ctx: &mut dyn ChannelContext, packet: &Packet) -> Result<()>;
}

/// Apply `report` to `record`, producing the updated row.
///
/// The report must strictly advance `(last_timestamp, last_block)`
/// lexicographically; otherwise the record is returned untouched inside a
/// [`HealthcheckError::StaleReport`].
pub fn apply_report(
    record: &ChainRecord,
    report: &LivenessReport,
    observed_at_height: u64,
) -> Result<ChainRecord> {
    if !record.is_advanced_by(report.timestamp, report.block) {
        return Err(HealthcheckError::StaleReport {
            peer_id: record.peer_id.clone(),
            stored_timestamp: record.last_timestamp,
            stored_block: record.last_block,
            timestamp: report.timestamp,
            block: report.block,
        });
    }
    Ok(ChainRecord {
        status: ChainStatus::Active,
        last_timestamp: report.timestamp,
        last_block: report.block,
        observed_at_height,
        ..record.clone()
    })
}
