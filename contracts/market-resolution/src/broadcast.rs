use soroban_sdk::{contractclient, log, Address, BytesN, Env};

use crate::errors::Error;
use crate::signatures::SignatureAggregator;
use crate::types::{PartialBlob, QuorumParams, SettlementStatus, SettlementTx};

/// Interface of the ledger contract that executes settlement transactions.
#[allow(dead_code)]
#[contractclient(name = "SettlementLedgerClient")]
pub trait SettlementLedger {
    /// Accept a fully authorized transaction; returns its transaction id.
    fn submit_settlement(env: Env, tx: SettlementTx, blob: PartialBlob) -> BytesN<32>;

    fn settlement_status(env: Env, tx_id: BytesN<32>) -> SettlementStatus;
}

/// Why a broadcast did not confirm. `tx_id` is set once the ledger has
/// accepted the submission.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BroadcastFailure {
    pub error: Error,
    pub tx_id: Option<BytesN<32>>,
}

/// Submits authorized settlement transactions and checks confirmation.
///
/// Nothing here retries. Re-submitting a resolution must never happen
/// silently, so every failure goes back to the caller.
pub struct ChainBroadcaster;

impl ChainBroadcaster {
    /// Submit and require confirmation. Returns the confirmed transaction id.
    pub fn broadcast(
        env: &Env,
        ledger: &Address,
        tx: &SettlementTx,
        blob: &PartialBlob,
        params: &QuorumParams,
    ) -> Result<BytesN<32>, BroadcastFailure> {
        let tx_id = Self::submit(env, ledger, tx, blob, params)
            .map_err(|error| BroadcastFailure { error, tx_id: None })?;
        match Self::await_confirmation(env, ledger, &tx_id) {
            Ok(_) => Ok(tx_id),
            Err(error) => Err(BroadcastFailure {
                error,
                tx_id: Some(tx_id),
            }),
        }
    }

    pub fn submit(
        env: &Env,
        ledger: &Address,
        tx: &SettlementTx,
        blob: &PartialBlob,
        params: &QuorumParams,
    ) -> Result<BytesN<32>, Error> {
        if blob.digest != SignatureAggregator::transaction_digest(env, tx) {
            return Err(Error::MismatchedTransaction);
        }
        let signers = SignatureAggregator::blob_signers(blob);
        if !SignatureAggregator::threshold_met(&signers, params) {
            return Err(Error::InsufficientSignatures);
        }

        let client = SettlementLedgerClient::new(env, ledger);
        match client.try_submit_settlement(tx, blob) {
            Ok(Ok(tx_id)) => Ok(tx_id),
            _ => {
                log!(env, "settlement submit rejected", tx.market_id.clone());
                Err(Error::BroadcastFailed)
            }
        }
    }

    /// `Confirmed` yields the ledger sequence, `Pending` is a timeout and
    /// `Rejected` or a trapped call is a broadcast failure.
    pub fn await_confirmation(env: &Env, ledger: &Address, tx_id: &BytesN<32>) -> Result<u32, Error> {
        let client = SettlementLedgerClient::new(env, ledger);
        match client.try_settlement_status(tx_id) {
            Ok(Ok(SettlementStatus::Confirmed(sequence))) => Ok(sequence),
            Ok(Ok(SettlementStatus::Pending)) => Err(Error::ConfirmationTimeout),
            _ => {
                log!(env, "settlement rejected", tx_id.clone());
                Err(Error::BroadcastFailed)
            }
        }
    }
}
