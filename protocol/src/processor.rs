//! Processing of [`AdminInstruction`]s against a [`RecordStore`].

use {
    crate::{
        error::{HealthcheckError, Result},
        instruction::AdminInstruction,
        state::{ChainRecord, HandshakeState},
        store::RecordStore,
    },
    log::*,
};

/// Validate and apply one administrative instruction.
pub fn process_instruction<S: RecordStore + ?Sized>(
    store: &S,
    instruction: AdminInstruction,
) -> Result<()> {
    instruction.validate_basic()?;
    trace!("healthcheck process_instruction: {instruction:?}");

    match instruction {
        AdminInstruction::CreateChain {
            creator,
            chain_id,
            connection_id,
        } => process_create_chain(store, creator, chain_id, connection_id),
        AdminInstruction::UpdateChain {
            creator,
            chain_id,
            connection_id,
        } => process_update_chain(store, creator, chain_id, connection_id),
        AdminInstruction::DeleteChain { creator, chain_id } => {
            process_delete_chain(store, creator, chain_id)
        }
    }
}

fn process_create_chain<S: RecordStore + ?Sized>(
    store: &S,
    creator: String,
    chain_id: String,
    connection_id: String,
) -> Result<()> {
    if store.get(&chain_id)?.is_some() {
        return Err(HealthcheckError::ChainAlreadyRegistered { peer_id: chain_id });
    }
    store.set(&ChainRecord::new(creator, chain_id.as_str(), connection_id.as_str()))?;
    info!("CreateChain: chain={chain_id}, connection={connection_id}");
    Ok(())
}

fn process_update_chain<S: RecordStore + ?Sized>(
    store: &S,
    creator: String,
    chain_id: String,
    connection_id: String,
) -> Result<()> {
    let mut record = load_owned(store, &creator, &chain_id)?;

    // The link is what open-try checks the channel against; once a
    // handshake has touched the row it cannot move.
    if record.handshake_state() != HandshakeState::Uninitiated {
        return Err(HealthcheckError::ConnectionLocked { peer_id: chain_id });
    }

    record.transport_link_id = connection_id;
    store.set(&record)?;
    info!(
        "UpdateChain: chain={}, connection={}",
        chain_id, record.transport_link_id
    );
    Ok(())
}

fn process_delete_chain<S: RecordStore + ?Sized>(
    store: &S,
    creator: String,
    chain_id: String,
) -> Result<()> {
    load_owned(store, &creator, &chain_id)?;
    store.delete(&chain_id)?;
    info!("DeleteChain: chain={chain_id}");
    Ok(())
}

/// Load `chain_id` and check that `signer` registered it.
fn load_owned<S: RecordStore + ?Sized>(store: &S, signer: &str, chain_id: &str) -> Result<ChainRecord> {
    let record = store
        .get(chain_id)?
        .ok_or_else(|| HealthcheckError::ChainNotRegistered {
            peer_id: chain_id.to_string(),
        })?;
    if record.creator != signer {
        return Err(HealthcheckError::Unauthorized {
            peer_id: chain_id.to_string(),
            signer: signer.to_string(),
            owner: record.creator,
        });
    }
    Ok(record)
}
