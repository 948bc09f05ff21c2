use soroban_sdk::{panic_with_error, xdr::ToXdr, Address, Bytes, BytesN, Env, String, Symbol, Vec};

use crate::admin::AdminRegistry;
use crate::config::{ConfigManager, OUTCOME_NO, OUTCOME_YES};
use crate::errors::Error;
use crate::events::{EventEmitter, OracleDisputedEvent, OracleLockedEvent, OracleProposedEvent, OracleVoteEvent};
use crate::markets::MarketGateway;
use crate::storage::{AddressList, Counters, DataKey, IdIndex};
use crate::types::{ResolutionPath, UmaResolution, UmaStatus, UmaVote, VoteTally};
use crate::validation::InputValidator;

/// Domain separator for the lock seal.
const LOCK_DOMAIN: &[u8; 4] = b"LOCK";

// ===== OPTIMISTIC ORACLE =====

/// Optimistic resolution with an admin voting panel as the dispute court.
///
/// ```text
/// PROPOSED --(window elapses, no dispute)--> EXPIRED_NO_DISPUTE
/// PROPOSED --(dispute)--> UMA_VOTING --(voting ends | all voted)--> UMA_LOCKED
/// ```
///
/// Both end states are immutable. Every status change is a compare-and-set
/// against the stored status, and any attempt to overwrite a terminal record
/// traps the invocation.
pub struct OptimisticOracle;

impl OptimisticOracle {
    pub fn propose(
        env: &Env,
        market_id: &Symbol,
        outcome: u32,
        evidence: &String,
        admin: &Address,
    ) -> Result<UmaResolution, Error> {
        admin.require_auth();

        let config = ConfigManager::get_config(env)?;
        InputValidator::validate_outcome(outcome)?;
        InputValidator::validate_evidence(evidence, config.max_evidence_length)?;
        MarketGateway::validate_resolvable(env, market_id, ResolutionPath::Optimistic)?;
        AdminRegistry::get_by_id(env, admin)?;
        if env
            .storage()
            .persistent()
            .has(&DataKey::ActiveUma(market_id.clone()))
        {
            return Err(Error::ActiveResolutionExists);
        }

        let now = env.ledger().timestamp();
        let dispute_window_ends = now
            .checked_add(config.dispute_window_secs)
            .ok_or(Error::InvalidConfiguration)?;
        let resolution = UmaResolution {
            id: Counters::next(env, &DataKey::UmaCounter),
            market_id: market_id.clone(),
            proposed_outcome: outcome,
            proposed_by: admin.clone(),
            evidence: evidence.clone(),
            status: UmaStatus::Proposed,
            eligible_voters: AdminRegistry::active_addresses(env),
            proposed_at: now,
            dispute_window_ends,
            voting_ends: None,
            locked_at: None,
            final_outcome: None,
            lock_hash: None,
            dispute_reason: None,
            disputed_by: None,
            disputed_at: None,
        };

        env.storage()
            .persistent()
            .set(&DataKey::Uma(resolution.id), &resolution);
        env.storage()
            .persistent()
            .set(&DataKey::ActiveUma(market_id.clone()), &resolution.id);
        IdIndex::insert(env, &DataKey::MarketUmas(market_id.clone()), resolution.id);
        IdIndex::insert(env, &DataKey::UmasByStatus(UmaStatus::Proposed), resolution.id);
        MarketGateway::update_oracle_status(env, market_id, UmaStatus::Proposed)?;

        EventEmitter::emit_oracle_proposed(
            env,
            &OracleProposedEvent {
                resolution_id: resolution.id,
                market_id: market_id.clone(),
                outcome,
                proposed_by: admin.clone(),
                dispute_window_ends: resolution.dispute_window_ends,
            },
        );
        Ok(resolution)
    }

    /// Challenge the active proposal of a market. Anyone may dispute.
    pub fn dispute(
        env: &Env,
        market_id: &Symbol,
        user: &Address,
        reason: &String,
    ) -> Result<UmaResolution, Error> {
        user.require_auth();
        InputValidator::validate_dispute_reason(reason)?;

        let resolution_id: u64 = match env
            .storage()
            .persistent()
            .get(&DataKey::ActiveUma(market_id.clone()))
        {
            Some(id) => id,
            None => {
                // nothing active; report why instead of "not found"
                let latest = Self::get_latest_for_market(env, market_id)?;
                return Err(if latest.status.is_terminal() {
                    Error::AlreadyLocked
                } else {
                    Error::MarketAlreadyResolved
                });
            }
        };
        let mut resolution = Self::get(env, resolution_id)?;
        if resolution.status != UmaStatus::Proposed {
            return Err(Error::NotInProposedState);
        }

        let now = env.ledger().timestamp();
        if now >= resolution.dispute_window_ends {
            return Err(Error::DisputeWindowExpired);
        }

        let config = ConfigManager::get_config(env)?;
        let voting_ends = now
            .checked_add(config.voting_period_secs)
            .ok_or(Error::InvalidConfiguration)?;
        resolution.status = UmaStatus::UmaVoting;
        resolution.voting_ends = Some(voting_ends);
        resolution.dispute_reason = Some(reason.clone());
        resolution.disputed_by = Some(user.clone());
        resolution.disputed_at = Some(now);
        Self::compare_and_set(env, &resolution, UmaStatus::Proposed)?;
        MarketGateway::update_oracle_status(env, market_id, UmaStatus::UmaVoting)?;

        EventEmitter::emit_oracle_disputed(
            env,
            &OracleDisputedEvent {
                resolution_id,
                market_id: market_id.clone(),
                disputed_by: user.clone(),
                reason: reason.clone(),
                voting_ends,
            },
        );
        Ok(resolution)
    }

    /// Record one panel vote. The last eligible vote locks the outcome in
    /// the same call.
    pub fn cast_vote(
        env: &Env,
        resolution_id: u64,
        admin: &Address,
        vote: u32,
    ) -> Result<UmaVote, Error> {
        admin.require_auth();
        InputValidator::validate_outcome(vote)?;

        let resolution = Self::get(env, resolution_id)?;
        if resolution.status.is_terminal() {
            return Err(Error::AlreadyLocked);
        }
        if resolution.status != UmaStatus::UmaVoting {
            return Err(Error::NotInVotingState);
        }
        let voting_ends = resolution.voting_ends.ok_or(Error::StaleState)?;
        let now = env.ledger().timestamp();
        if now >= voting_ends {
            return Err(Error::VotingWindowExpired);
        }
        if !resolution.eligible_voters.contains(admin) {
            return Err(Error::NotEligibleVoter);
        }

        let vote_key = DataKey::Vote(resolution_id, admin.clone());
        if env.storage().persistent().has(&vote_key) {
            return Err(Error::DuplicateVote);
        }

        let record = UmaVote {
            id: Counters::next(env, &DataKey::VoteCounter),
            resolution_id,
            admin: admin.clone(),
            vote,
            voted_at: now,
        };
        env.storage().persistent().set(&vote_key, &record);
        AddressList::push(env, &DataKey::ResolutionVoters(resolution_id), admin);

        let tally = Self::tally(env, &resolution);
        EventEmitter::emit_oracle_vote(
            env,
            &OracleVoteEvent {
                resolution_id,
                admin: admin.clone(),
                vote,
                votes_cast: tally.cast,
                eligible: tally.eligible,
            },
        );

        if tally.cast >= tally.eligible {
            let final_outcome = Self::decide(&resolution, &tally);
            Self::lock(env, resolution, final_outcome, UmaStatus::UmaLocked, &tally)?;
        }
        Ok(record)
    }

    /// Close voting and lock the majority outcome.
    pub fn finalize(env: &Env, resolution_id: u64) -> Result<UmaResolution, Error> {
        let resolution = Self::get(env, resolution_id)?;
        if resolution.status.is_terminal() {
            return Err(Error::AlreadyLocked);
        }
        if resolution.status != UmaStatus::UmaVoting {
            return Err(Error::NotInVotingState);
        }
        let voting_ends = resolution.voting_ends.ok_or(Error::StaleState)?;

        let tally = Self::tally(env, &resolution);
        if env.ledger().timestamp() < voting_ends && tally.cast < tally.eligible {
            return Err(Error::VotingWindowOpen);
        }

        let final_outcome = Self::decide(&resolution, &tally);
        Self::lock(env, resolution, final_outcome, UmaStatus::UmaLocked, &tally)
    }

    /// Lock an undisputed proposal once its dispute window has elapsed.
    pub fn auto_finalize_no_dispute(env: &Env, resolution_id: u64) -> Result<UmaResolution, Error> {
        let resolution = Self::get(env, resolution_id)?;
        if resolution.status.is_terminal() {
            return Err(Error::AlreadyLocked);
        }
        if resolution.status != UmaStatus::Proposed {
            return Err(Error::NotInProposedState);
        }
        if env.ledger().timestamp() < resolution.dispute_window_ends {
            return Err(Error::DisputeWindowOpen);
        }

        let tally = Self::tally(env, &resolution);
        let final_outcome = resolution.proposed_outcome;
        Self::lock(env, resolution, final_outcome, UmaStatus::ExpiredNoDispute, &tally)
    }

    // ===== QUERIES =====

    pub fn get(env: &Env, resolution_id: u64) -> Result<UmaResolution, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Uma(resolution_id))
            .ok_or(Error::ResolutionNotFound)
    }

    /// Most recent resolution for a market.
    pub fn get_latest_for_market(env: &Env, market_id: &Symbol) -> Result<UmaResolution, Error> {
        let ids = IdIndex::get(env, &DataKey::MarketUmas(market_id.clone()));
        let latest = ids.last().ok_or(Error::ResolutionNotFound)?;
        Self::get(env, latest)
    }

    pub fn get_votes(env: &Env, resolution_id: u64) -> Vec<UmaVote> {
        let mut votes = Vec::new(env);
        for admin in AddressList::get(env, &DataKey::ResolutionVoters(resolution_id)).iter() {
            if let Some(vote) = env
                .storage()
                .persistent()
                .get::<DataKey, UmaVote>(&DataKey::Vote(resolution_id, admin))
            {
                votes.push_back(vote);
            }
        }
        votes
    }

    pub fn get_vote_tally(env: &Env, resolution_id: u64) -> Result<VoteTally, Error> {
        let resolution = Self::get(env, resolution_id)?;
        Ok(Self::tally(env, &resolution))
    }

    /// Ids currently in an active `status`, oldest first. Terminal statuses
    /// are not indexed and always come back empty.
    pub fn ids_in_status(env: &Env, status: UmaStatus) -> Vec<u64> {
        IdIndex::get(env, &DataKey::UmasByStatus(status))
    }

    /// Stop tracking a resolution that can never lock, because its market
    /// was settled by another route. The record keeps its last status.
    pub fn retire(env: &Env, resolution_id: u64) -> Result<(), Error> {
        let resolution = Self::get(env, resolution_id)?;
        if resolution.status.is_terminal() {
            return Err(Error::AlreadyLocked);
        }
        let market = MarketGateway::get_by_id(env, &resolution.market_id)?;
        if !market.status.is_final() {
            return Err(Error::StaleState);
        }

        let active = DataKey::ActiveUma(resolution.market_id.clone());
        if env.storage().persistent().get::<DataKey, u64>(&active) == Some(resolution_id) {
            env.storage().persistent().remove(&active);
        }
        IdIndex::remove(env, &DataKey::UmasByStatus(resolution.status), resolution_id);
        Ok(())
    }

    /// `sha256("LOCK" || id || market_id || final_outcome || locked_at)`
    pub fn lock_hash(
        env: &Env,
        resolution_id: u64,
        market_id: &Symbol,
        final_outcome: u32,
        locked_at: u64,
    ) -> BytesN<32> {
        let mut preimage = Bytes::from_array(env, LOCK_DOMAIN);
        preimage.extend_from_array(&resolution_id.to_be_bytes());
        preimage.append(&market_id.clone().to_xdr(env));
        preimage.extend_from_array(&final_outcome.to_be_bytes());
        preimage.extend_from_array(&locked_at.to_be_bytes());
        env.crypto().sha256(&preimage).to_bytes()
    }

    // ===== INTERNALS =====

    fn tally(env: &Env, resolution: &UmaResolution) -> VoteTally {
        let mut tally = VoteTally {
            yes: 0,
            no: 0,
            cast: 0,
            eligible: resolution.eligible_voters.len(),
        };
        for vote in Self::get_votes(env, resolution.id).iter() {
            match vote.vote {
                OUTCOME_YES => tally.yes += 1,
                OUTCOME_NO => tally.no += 1,
                _ => continue,
            }
            tally.cast += 1;
        }
        tally
    }

    /// Strict majority wins; a tie (zero votes included) keeps the proposal.
    fn decide(resolution: &UmaResolution, tally: &VoteTally) -> u32 {
        if tally.yes > tally.no {
            OUTCOME_YES
        } else if tally.no > tally.yes {
            OUTCOME_NO
        } else {
            resolution.proposed_outcome
        }
    }

    fn lock(
        env: &Env,
        mut resolution: UmaResolution,
        final_outcome: u32,
        status: UmaStatus,
        tally: &VoteTally,
    ) -> Result<UmaResolution, Error> {
        // checked up front so a failure leaves nothing half-written
        let market = MarketGateway::get_by_id(env, &resolution.market_id)?;
        if market.status.is_final() {
            return Err(Error::MarketAlreadyResolved);
        }

        let expected = resolution.status;
        let locked_at = env.ledger().timestamp();
        let lock_hash = Self::lock_hash(
            env,
            resolution.id,
            &resolution.market_id,
            final_outcome,
            locked_at,
        );
        resolution.status = status;
        resolution.final_outcome = Some(final_outcome);
        resolution.locked_at = Some(locked_at);
        resolution.lock_hash = Some(lock_hash.clone());
        Self::compare_and_set(env, &resolution, expected)?;

        env.storage()
            .persistent()
            .remove(&DataKey::ActiveUma(resolution.market_id.clone()));
        MarketGateway::resolve(env, &resolution.market_id, final_outcome, &resolution.evidence)?;
        MarketGateway::close(env, &resolution.market_id)?;
        MarketGateway::update_oracle_status(env, &resolution.market_id, status)?;

        EventEmitter::emit_oracle_locked(
            env,
            &OracleLockedEvent {
                resolution_id: resolution.id,
                market_id: resolution.market_id.clone(),
                status,
                final_outcome,
                yes_votes: tally.yes,
                no_votes: tally.no,
                lock_hash,
                locked_at,
            },
        );
        Ok(resolution)
    }

    /// Store `updated` only if the stored status is still `expected`.
    pub(crate) fn compare_and_set(env: &Env, updated: &UmaResolution, expected: UmaStatus) -> Result<(), Error> {
        let key = DataKey::Uma(updated.id);
        let stored: UmaResolution = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(Error::ResolutionNotFound)?;
        if stored.status.is_terminal() {
            panic_with_error!(env, Error::TerminalRecordMutation);
        }
        if stored.status != expected {
            return Err(Error::StaleState);
        }

        env.storage().persistent().set(&key, updated);
        if updated.status != expected {
            // only active statuses are indexed
            IdIndex::remove(env, &DataKey::UmasByStatus(expected), updated.id);
            if !updated.status.is_terminal() {
                IdIndex::insert(env, &DataKey::UmasByStatus(updated.status), updated.id);
            }
        }
        Ok(())
    }
}
