use soroban_sdk::{xdr::ToXdr, Bytes, BytesN, Env, Map, Symbol, Vec};

use crate::errors::Error;
use crate::quorum::QuorumAddressDeriver;
use crate::types::{PartialBlob, QuorumParams, SettlementTx, TransactionKind};

/// Builds settlement transactions and collects quorum signatures over them.
///
/// Secret keys never reach the contract. Each signer signs the transaction
/// digest off-chain (see `keyring`) and submits the detached signature,
/// which is verified here with the host's ed25519 check. A signature that
/// does not verify traps the invocation.
pub struct SignatureAggregator;

impl SignatureAggregator {
    pub fn build_unsigned_transaction(
        env: &Env,
        kind: TransactionKind,
        market_id: &Symbol,
        outcome: u32,
        resolution_hash: &BytesN<32>,
        params: &QuorumParams,
    ) -> SettlementTx {
        SettlementTx {
            kind,
            sender: QuorumAddressDeriver::address_for(env, params),
            market_id: market_id.clone(),
            outcome,
            resolution_hash: resolution_hash.clone(),
            quorum_version: params.version,
        }
    }

    /// The message every signer signs: sha256 of the XDR-encoded transaction.
    pub fn transaction_digest(env: &Env, tx: &SettlementTx) -> BytesN<32> {
        let encoded = tx.clone().to_xdr(env);
        env.crypto().sha256(&encoded).to_bytes()
    }

    /// Start a partial blob with the first signature.
    pub fn partial_sign(
        env: &Env,
        tx: &SettlementTx,
        params: &QuorumParams,
        signer_key: &BytesN<32>,
        signature: &BytesN<64>,
    ) -> Result<PartialBlob, Error> {
        let blob = PartialBlob {
            digest: Self::transaction_digest(env, tx),
            signatures: Map::new(env),
        };
        Self::append_signature(env, &blob, params, signer_key, signature)
    }

    pub fn append_signature(
        env: &Env,
        blob: &PartialBlob,
        params: &QuorumParams,
        signer_key: &BytesN<32>,
        signature: &BytesN<64>,
    ) -> Result<PartialBlob, Error> {
        if !params.signers.contains(signer_key) {
            return Err(Error::UnauthorizedSigner);
        }
        if blob.signatures.contains_key(signer_key.clone()) {
            return Err(Error::DuplicateSigner);
        }

        env.crypto()
            .ed25519_verify(signer_key, &Bytes::from(blob.digest.clone()), signature);

        let mut updated = blob.clone();
        updated.signatures.set(signer_key.clone(), signature.clone());
        Ok(updated)
    }

    /// Union of independently collected blobs for the same transaction.
    pub fn merge_signatures(env: &Env, blobs: &Vec<PartialBlob>) -> Result<PartialBlob, Error> {
        let first = blobs.first().ok_or(Error::InvalidInput)?;
        let mut merged = PartialBlob {
            digest: first.digest.clone(),
            signatures: Map::new(env),
        };
        for blob in blobs.iter() {
            if blob.digest != merged.digest {
                return Err(Error::MismatchedTransaction);
            }
            for (key, signature) in blob.signatures.iter() {
                if !merged.signatures.contains_key(key.clone()) {
                    merged.signatures.set(key, signature);
                }
            }
        }
        Ok(merged)
    }

    /// True iff at least `threshold` distinct quorum members are present.
    pub fn threshold_met(signers: &Vec<BytesN<32>>, params: &QuorumParams) -> bool {
        let mut counted: u32 = 0;
        for (index, key) in signers.iter().enumerate() {
            if !params.signers.contains(&key) {
                continue;
            }
            // skip keys already seen earlier in the list
            let first = signers.first_index_of(&key).unwrap_or(index as u32);
            if first == index as u32 {
                counted += 1;
            }
        }
        counted >= params.threshold
    }

    pub fn blob_signers(blob: &PartialBlob) -> Vec<BytesN<32>> {
        blob.signatures.keys()
    }
}
