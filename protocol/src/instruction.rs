//! Administrative instructions for registering monitored chains.
//!
//! Registration happens out-of-band, before any handshake: a row must exist
//! for a peer before its monitored side can open a channel.

use {
    crate::error::{HealthcheckError, Result},
    serde::{Deserialize, Serialize},
};

/// Instructions accepted by [`crate::processor::process_instruction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminInstruction {
    /// Register a chain that is expected to open a channel over
    /// `connection_id`.
    ///
    /// Fails if the chain is already registered.
    CreateChain {
        creator: String,
        chain_id: String,
        connection_id: String,
    },

    /// Point an untracked chain at a different connection.
    ///
    /// Only the original creator may update, and only before the handshake
    /// has recorded intervals for the chain.
    UpdateChain {
        creator: String,
        chain_id: String,
        connection_id: String,
    },

    /// Remove a chain.  Only the original creator may delete.
    DeleteChain { creator: String, chain_id: String },
}

impl AdminInstruction {
    /// Account that signed the instruction.
    pub fn signer(&self) -> &str {
        match self {
            Self::CreateChain { creator, .. }
            | Self::UpdateChain { creator, .. }
            | Self::DeleteChain { creator, .. } => creator,
        }
    }

    /// Chain the instruction is about.
    pub fn chain_id(&self) -> &str {
        match self {
            Self::CreateChain { chain_id, .. }
            | Self::UpdateChain { chain_id, .. }
            | Self::DeleteChain { chain_id, .. } => chain_id,
        }
    }

    /// Stateless checks run before touching the store.
    pub fn validate_basic(&self) -> Result<()> {
        let creator = self.signer();
        if creator.trim().is_empty() || creator.chars().any(char::is_whitespace) {
            return Err(HealthcheckError::InvalidCreator(creator.to_string()));
        }
        let chain_id = self.chain_id();
        if chain_id.trim().is_empty() {
            return Err(HealthcheckError::InvalidChainId(chain_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, assert_matches::assert_matches, test_case::test_case};

    #[test]
    fn test_valid_instruction() {
        let ix = AdminInstruction::CreateChain {
            creator: "admin".to_string(),
            chain_id: "chain-A".to_string(),
            connection_id: "conn-0".to_string(),
        };
        assert!(ix.validate_basic().is_ok());
        assert_eq!(ix.signer(), "admin");
        assert_eq!(ix.chain_id(), "chain-A");
    }

    #[test_case("" ; "empty")]
    #[test_case("  " ; "blank")]
    #[test_case("ad min" ; "embedded space")]
    fn test_invalid_creator(creator: &str) {
        let ix = AdminInstruction::DeleteChain {
            creator: creator.to_string(),
            chain_id: "chain-A".to_string(),
        };
        assert_matches!(ix.validate_basic(), Err(HealthcheckError::InvalidCreator(_)));
    }

    #[test]
    fn test_empty_chain_id() {
        let ix = AdminInstruction::UpdateChain {
            creator: "admin".to_string(),
            chain_id: String::new(),
            connection_id: "conn-0".to_string(),
        };
        assert_matches!(ix.validate_basic(), Err(HealthcheckError::InvalidChainId(_)));
    }
}
