//! The four-step channel handshake.
//!
//! ```text
//!   monitored                                  registry
//!   ─────────                                  ────────
//!   open-init  ── metadata (version string) ─▶ open-try
//!   open-ack   ◀── canonical version ───────── (intervals persisted)
//!   (channel bound)  ──────────────────────▶  open-confirm
//!                                              (channel bound)
//! ```
//!
//! The flow is directional: only the monitored role initiates, only the
//! registry accepts.  Each role rejects the steps that belong to the other
//! with [`HealthcheckError::InvalidChannelFlow`].  A rejected step commits
//! nothing, so the channel end falls back to
//! [`HandshakeState::Uninitiated`](crate::state::HandshakeState::Uninitiated).

use crate::{
    error::{HealthcheckError, Result},
    transport::{ChannelContext, ChannelOrder, OpenInit, OpenTry},
};

/// Handshake callbacks the transport invokes on a channel end.
pub trait ChannelHandshake {
    /// Step 1, on the initiating end.  Returns the version string to propose.
    fn on_chan_open_init(&mut self, ctx: &mut dyn ChannelContext, msg: &OpenInit)
        -> Result<String>;

    /// Step 2, on the accepting end.  Returns the version to answer with.
    fn on_chan_open_try(&mut self, ctx: &mut dyn ChannelContext, msg: &OpenTry) -> Result<String>;

    /// Step 3, on the initiating end.
    fn on_chan_open_ack(
        &mut self,
        ctx: &mut dyn ChannelContext,
        port_id: &str,
        channel_id: &str,
        counterparty_channel_id: &str,
        counterparty_version: &str,
    ) -> Result<()>;

    /// Step 4, on the accepting end.
    fn on_chan_open_confirm(
        &mut self,
        ctx: &mut dyn ChannelContext,
        port_id: &str,
        channel_id: &str,
    ) -> Result<()>;

    /// Channels are not user-closable.
    fn on_chan_close_init(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        port_id: &str,
        channel_id: &str,
    ) -> Result<()> {
        Err(HealthcheckError::ChannelCloseDisallowed {
            port_id: port_id.to_string(),
            channel_id: channel_id.to_string(),
        })
    }

    /// A counterparty-driven close is only observed.
    fn on_chan_close_confirm(
        &mut self,
        _ctx: &mut dyn ChannelContext,
        _port_id: &str,
        _channel_id: &str,
    ) -> Result<()> {
        Ok(())
    }
}

// ── Shared step validation ──────────────────────────────────────────────────

pub(crate) fn check_ordered(order: ChannelOrder) -> Result<()> {
    if order != ChannelOrder::Ordered {
        return Err(HealthcheckError::InvalidChannelOrdering {
            expected: ChannelOrder::Ordered,
            got: order,
        });
    }
    Ok(())
}

pub(crate) fn check_port(got: &str, bound: &str) -> Result<()> {
    if got != bound {
        return Err(HealthcheckError::InvalidPort {
            got: got.to_string(),
            expected: bound.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_counterparty_port(got: &str, expected: &str) -> Result<()> {
    if got != expected {
        return Err(HealthcheckError::InvalidCounterpartyPort {
            got: got.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_version(got: &str, expected: &str) -> Result<()> {
    if got != expected {
        return Err(HealthcheckError::InvalidVersion {
            got: got.to_string(),
            expected: expected.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, assert_matches::assert_matches};

    #[test]
    fn test_unordered_rejected() {
        assert!(check_ordered(ChannelOrder::Ordered).is_ok());
        assert_matches!(
            check_ordered(ChannelOrder::Unordered),
            Err(HealthcheckError::InvalidChannelOrdering {
                expected: ChannelOrder::Ordered,
                got: ChannelOrder::Unordered,
            })
        );
    }

    #[test]
    fn test_port_mismatch_names_both() {
        let err = check_port("transfer", "healthcheck").unwrap_err();
        assert_eq!(err.to_string(), "invalid port: transfer, expected healthcheck");
        let err = check_counterparty_port("transfer", "monitored").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid counterparty port: transfer, expected monitored"
        );
    }

    #[test]
    fn test_version_mismatch() {
        assert!(check_version("1", "1").is_ok());
        assert_matches!(
            check_version("2", "1"),
            Err(HealthcheckError::InvalidVersion { got, expected }) if got == "2" && expected == "1"
        );
    }
}
