use soroban_sdk::{log, panic_with_error, xdr::ToXdr, Address, Bytes, BytesN, Env, String, Symbol, Vec};

use crate::admin::AdminRegistry;
use crate::broadcast::{BroadcastFailure, ChainBroadcaster};
use crate::config::ConfigManager;
use crate::errors::Error;
use crate::events::{
    BroadcastFailedEvent, EventEmitter, ProposalCreatedEvent, ProposalExecutedEvent,
};
use crate::markets::MarketGateway;
use crate::quorum::QuorumAddressDeriver;
use crate::signatures::SignatureAggregator;
use crate::storage::{Counters, DataKey, IdIndex};
use crate::types::{
    ProposalStatus, QuorumParams, ResolutionPath, ResolutionProposal, SettlementState,
    SettlementTx, TransactionKind,
};
use crate::validation::InputValidator;

/// Multisig resolution path.
///
/// Per market: `NONE -> PENDING_SIGNATURES -> EXECUTED`. The quorum is
/// snapshotted from the active roster when the proposal is created.
pub struct ResolutionProposalService;

impl ResolutionProposalService {
    pub fn propose(
        env: &Env,
        market_id: &Symbol,
        outcome: u32,
        evidence: &String,
        admin: &Address,
        signature: &BytesN<64>,
    ) -> Result<ResolutionProposal, Error> {
        admin.require_auth();

        let config = ConfigManager::get_config(env)?;
        InputValidator::validate_outcome(outcome)?;
        InputValidator::validate_evidence(evidence, config.max_evidence_length)?;
        MarketGateway::validate_resolvable(env, market_id, ResolutionPath::Multisig)?;
        let proposer = AdminRegistry::get_by_id(env, admin)?;
        if env
            .storage()
            .persistent()
            .has(&DataKey::PendingProposal(market_id.clone()))
        {
            return Err(Error::ConflictingProposal);
        }

        let resolution_hash = Self::resolution_hash(env, market_id, outcome, evidence);
        let (quorum_address, quorum) = Self::snapshot_quorum(env)?;
        let transaction = SignatureAggregator::build_unsigned_transaction(
            env,
            TransactionKind::ResolveMarket,
            market_id,
            outcome,
            &resolution_hash,
            &quorum,
        );
        let blob = SignatureAggregator::partial_sign(
            env,
            &transaction,
            &quorum,
            &proposer.signing_key,
            signature,
        )?;

        let id = Counters::next(env, &DataKey::ProposalCounter);
        let mut signers = Vec::new(env);
        signers.push_back(admin.clone());
        let proposal = ResolutionProposal {
            id,
            market_id: market_id.clone(),
            proposed_outcome: outcome,
            proposer: admin.clone(),
            signers,
            quorum,
            quorum_address: quorum_address.clone(),
            transaction,
            partial_blob: Some(blob),
            status: ProposalStatus::PendingSignatures,
            evidence: evidence.clone(),
            resolution_hash: resolution_hash.clone(),
            settlement: SettlementState::NotBroadcast,
            created_at: env.ledger().timestamp(),
            executed_at: None,
        };

        Self::store(env, &proposal);
        env.storage()
            .persistent()
            .set(&DataKey::PendingProposal(market_id.clone()), &id);
        IdIndex::insert(env, &DataKey::MarketProposals(market_id.clone()), id);
        IdIndex::insert(
            env,
            &DataKey::ProposalsByStatus(ProposalStatus::PendingSignatures),
            id,
        );
        MarketGateway::mark_pending(env, market_id)?;

        EventEmitter::emit_proposal_created(
            env,
            &ProposalCreatedEvent {
                proposal_id: id,
                market_id: market_id.clone(),
                outcome,
                proposer: admin.clone(),
                resolution_hash,
                quorum_address,
                timestamp: env.ledger().timestamp(),
            },
        );

        // a 1-of-N quorum is authorized by the proposer alone
        if Self::threshold_reached(&proposal) {
            return Self::execute(env, proposal);
        }
        Ok(proposal)
    }

    pub fn sign(
        env: &Env,
        proposal_id: u64,
        admin: &Address,
        signature: &BytesN<64>,
    ) -> Result<ResolutionProposal, Error> {
        admin.require_auth();

        let mut proposal = Self::get(env, proposal_id)?;
        if proposal.status == ProposalStatus::Executed {
            return Err(Error::ProposalAlreadyExecuted);
        }
        if let SettlementState::AwaitingConfirmation(_) = proposal.settlement {
            return Err(Error::SettlementAwaitingConfirmation);
        }

        // membership is judged against the snapshot, so an admin removed
        // after the proposal was created can still complete it
        let record = AdminRegistry::get_record(env, admin).ok_or(Error::AdminNotFound)?;
        if !proposal.quorum.signers.contains(&record.signing_key) {
            return Err(Error::UnauthorizedSigner);
        }
        if proposal.signers.contains(admin) {
            return Err(Error::DuplicateSignature);
        }

        let collected = proposal.partial_blob.clone().ok_or(Error::InvalidInput)?;
        let single = SignatureAggregator::partial_sign(
            env,
            &proposal.transaction,
            &proposal.quorum,
            &record.signing_key,
            signature,
        )?;
        let mut blobs = Vec::new(env);
        blobs.push_back(collected);
        blobs.push_back(single);
        proposal.partial_blob = Some(SignatureAggregator::merge_signatures(env, &blobs)?);
        proposal.signers.push_back(admin.clone());

        EventEmitter::emit_proposal_signed(
            env,
            proposal_id,
            admin,
            proposal.signers.len(),
            proposal.quorum.threshold,
        );

        if Self::threshold_reached(&proposal) {
            return Self::execute(env, proposal);
        }
        Self::store(env, &proposal);
        Ok(proposal)
    }

    /// Re-check a transaction whose confirmation timed out.
    pub fn reconcile_settlement(
        env: &Env,
        proposal_id: u64,
        admin: &Address,
    ) -> Result<ResolutionProposal, Error> {
        AdminRegistry::require_admin(env, admin)?;

        let proposal = Self::get(env, proposal_id)?;
        if proposal.status == ProposalStatus::Executed {
            return Err(Error::ProposalAlreadyExecuted);
        }
        let tx_id = match &proposal.settlement {
            SettlementState::AwaitingConfirmation(tx_id) => tx_id.clone(),
            _ => return Err(Error::NothingToReconcile),
        };
        let ledger = ConfigManager::get_config(env)?
            .settlement_ledger
            .ok_or(Error::InvalidConfiguration)?;

        match ChainBroadcaster::await_confirmation(env, &ledger, &tx_id) {
            Ok(_) => Self::commit(env, proposal, SettlementState::Confirmed(tx_id)),
            Err(Error::ConfirmationTimeout) => Err(Error::ConfirmationTimeout),
            Err(error) => Self::degrade(env, proposal, error, Some(tx_id)),
        }
    }

    /// Digest signers must sign for a proposal that would be created now.
    pub fn preview_digest(
        env: &Env,
        market_id: &Symbol,
        outcome: u32,
        evidence: &String,
    ) -> Result<BytesN<32>, Error> {
        InputValidator::validate_outcome(outcome)?;
        let tx = Self::preview_transaction(env, market_id, outcome, evidence)?;
        Ok(SignatureAggregator::transaction_digest(env, &tx))
    }

    pub fn get(env: &Env, proposal_id: u64) -> Result<ResolutionProposal, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Proposal(proposal_id))
            .ok_or(Error::ProposalNotFound)
    }

    pub fn get_pending(env: &Env) -> Vec<ResolutionProposal> {
        Self::load_all(
            env,
            &IdIndex::get(
                env,
                &DataKey::ProposalsByStatus(ProposalStatus::PendingSignatures),
            ),
        )
    }

    pub fn get_for_market(env: &Env, market_id: &Symbol) -> Vec<ResolutionProposal> {
        Self::load_all(
            env,
            &IdIndex::get(env, &DataKey::MarketProposals(market_id.clone())),
        )
    }

    /// `sha256(market_id || outcome || evidence)`; identical facts give an
    /// identical hash.
    pub fn resolution_hash(
        env: &Env,
        market_id: &Symbol,
        outcome: u32,
        evidence: &String,
    ) -> BytesN<32> {
        let mut preimage = Bytes::new(env);
        preimage.append(&market_id.clone().to_xdr(env));
        preimage.extend_from_array(&outcome.to_be_bytes());
        preimage.append(&evidence.clone().to_xdr(env));
        env.crypto().sha256(&preimage).to_bytes()
    }

    // ===== INTERNALS =====

    fn snapshot_quorum(env: &Env) -> Result<(BytesN<32>, QuorumParams), Error> {
        let config = ConfigManager::get_config(env)?;
        let keys = AdminRegistry::active_signing_keys(env);
        QuorumAddressDeriver::derive(
            env,
            config.quorum_version,
            config.multisig_threshold,
            keys.len(),
            &keys,
        )
    }

    fn preview_transaction(
        env: &Env,
        market_id: &Symbol,
        outcome: u32,
        evidence: &String,
    ) -> Result<SettlementTx, Error> {
        let (_, quorum) = Self::snapshot_quorum(env)?;
        let resolution_hash = Self::resolution_hash(env, market_id, outcome, evidence);
        Ok(SignatureAggregator::build_unsigned_transaction(
            env,
            TransactionKind::ResolveMarket,
            market_id,
            outcome,
            &resolution_hash,
            &quorum,
        ))
    }

    fn threshold_reached(proposal: &ResolutionProposal) -> bool {
        match &proposal.partial_blob {
            Some(blob) => SignatureAggregator::threshold_met(
                &SignatureAggregator::blob_signers(blob),
                &proposal.quorum,
            ),
            None => false,
        }
    }

    /// Threshold reached: broadcast when a settlement ledger is configured,
    /// then commit the outcome.
    fn execute(env: &Env, proposal: ResolutionProposal) -> Result<ResolutionProposal, Error> {
        let ledger = match ConfigManager::get_config(env)?.settlement_ledger {
            Some(ledger) => ledger,
            None => return Self::commit(env, proposal, SettlementState::OffChainOnly),
        };
        let blob = proposal.partial_blob.clone().ok_or(Error::InvalidInput)?;

        match ChainBroadcaster::broadcast(
            env,
            &ledger,
            &proposal.transaction,
            &blob,
            &proposal.quorum,
        ) {
            Ok(tx_id) => Self::commit(env, proposal, SettlementState::Confirmed(tx_id)),
            Err(BroadcastFailure {
                error: Error::ConfirmationTimeout,
                tx_id: Some(tx_id),
            }) => {
                // stays pending so nobody re-submits; an operator reconciles
                let mut proposal = proposal;
                proposal.settlement = SettlementState::AwaitingConfirmation(tx_id.clone());
                Self::store(env, &proposal);
                EventEmitter::emit_broadcast_pending(env, proposal.id, &tx_id);
                Ok(proposal)
            }
            Err(BroadcastFailure {
                error: Error::BroadcastFailed,
                tx_id,
            }) => Self::degrade(env, proposal, Error::BroadcastFailed, tx_id),
            Err(failure) => Err(failure.error),
        }
    }

    /// Off-chain finalization after an on-chain failure. The proposal is
    /// flagged so the mismatch can be reconciled by hand.
    fn degrade(
        env: &Env,
        proposal: ResolutionProposal,
        error: Error,
        tx_id: Option<BytesN<32>>,
    ) -> Result<ResolutionProposal, Error> {
        log!(
            env,
            "broadcast failed, finalizing off-chain",
            proposal.id,
            error as u32
        );
        EventEmitter::emit_broadcast_failed(
            env,
            &BroadcastFailedEvent {
                proposal_id: proposal.id,
                market_id: proposal.market_id.clone(),
                error_code: error as u32,
                tx_id,
                timestamp: env.ledger().timestamp(),
            },
        );
        Self::commit(
            env,
            proposal,
            SettlementState::FailedOffChainFallback(error as u32),
        )
    }

    fn commit(
        env: &Env,
        mut proposal: ResolutionProposal,
        settlement: SettlementState,
    ) -> Result<ResolutionProposal, Error> {
        MarketGateway::resolve(
            env,
            &proposal.market_id,
            proposal.proposed_outcome,
            &proposal.evidence,
        )?;
        MarketGateway::close(env, &proposal.market_id)?;

        let tx_id = match &settlement {
            SettlementState::Confirmed(tx_id) => Some(tx_id.clone()),
            _ => None,
        };
        let needs_reconciliation = matches!(settlement, SettlementState::FailedOffChainFallback(_));

        proposal.status = ProposalStatus::Executed;
        proposal.executed_at = Some(env.ledger().timestamp());
        proposal.settlement = settlement;
        Self::store(env, &proposal);

        env.storage()
            .persistent()
            .remove(&DataKey::PendingProposal(proposal.market_id.clone()));
        IdIndex::remove(
            env,
            &DataKey::ProposalsByStatus(ProposalStatus::PendingSignatures),
            proposal.id,
        );

        EventEmitter::emit_proposal_executed(
            env,
            &ProposalExecutedEvent {
                proposal_id: proposal.id,
                market_id: proposal.market_id.clone(),
                outcome: proposal.proposed_outcome,
                tx_id,
                needs_reconciliation,
                timestamp: env.ledger().timestamp(),
            },
        );
        Ok(proposal)
    }

    /// Persist a proposal. Overwriting an executed proposal is a bug and
    /// traps the invocation.
    pub(crate) fn store(env: &Env, proposal: &ResolutionProposal) {
        let key = DataKey::Proposal(proposal.id);
        if let Some(existing) = env
            .storage()
            .persistent()
            .get::<DataKey, ResolutionProposal>(&key)
        {
            if existing.status == ProposalStatus::Executed {
                panic_with_error!(env, Error::TerminalRecordMutation);
            }
        }
        env.storage().persistent().set(&key, proposal);
    }

    fn load_all(env: &Env, ids: &Vec<u64>) -> Vec<ResolutionProposal> {
        let mut proposals = Vec::new(env);
        for id in ids.iter() {
            if let Ok(proposal) = Self::get(env, id) {
                proposals.push_back(proposal);
            }
        }
        proposals
    }
}
