#![no_std]

//! Market resolution: decides the final outcome of expired binary markets.
//!
//! Two adjudication paths, one per market:
//! - **Multisig**: an admin proposes, a threshold of admins co-sign a
//!   settlement transaction, and the outcome is written once the threshold is
//!   met (optionally broadcast to a settlement ledger first).
//! - **Optimistic oracle**: an admin proposes, anyone may dispute inside the
//!   dispute window, disputes go to an admin vote, and the outcome locks
//!   permanently. Undisputed proposals lock when the window elapses, driven
//!   by the scheduler crank.

pub mod admin;
pub mod broadcast;
pub mod config;
pub mod errors;
pub mod events;
#[cfg(any(test, feature = "keyring"))]
pub mod keyring;
pub mod markets;
pub mod optimistic_oracle;
pub mod proposals;
pub mod quorum;
pub mod scheduler;
pub mod signatures;
pub mod storage;
pub mod types;
pub mod validation;

use soroban_sdk::{contract, contractimpl, Address, BytesN, Env, String, Symbol, Vec};

use admin::AdminRegistry;
use config::{ConfigManager, Environment, ResolutionConfig};
pub use errors::Error;
use markets::MarketGateway;
use optimistic_oracle::OptimisticOracle;
use proposals::ResolutionProposalService;
use quorum::QuorumAddressDeriver;
use scheduler::ResolutionScheduler;
use types::*;

#[contract]
pub struct MarketResolution;

#[contractimpl]
impl MarketResolution {
    // ===== SETUP & ADMINISTRATION =====

    /// Store the environment preset and register the first admin.
    pub fn initialize(
        env: Env,
        admin: Address,
        signing_key: BytesN<32>,
        environment: Option<Environment>,
    ) -> Result<(), Error> {
        admin.require_auth();
        if ConfigManager::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }

        let config = ConfigManager::get_config_for(
            &env,
            environment.unwrap_or(Environment::Development),
        );
        ConfigManager::store_config(&env, &config)?;
        AdminRegistry::initialize(&env, &admin, &signing_key)
    }

    pub fn update_config(
        env: Env,
        admin: Address,
        config: ResolutionConfig,
    ) -> Result<ResolutionConfig, Error> {
        AdminRegistry::require_admin(&env, &admin)?;
        ConfigManager::store_config(&env, &config)?;
        Ok(config)
    }

    pub fn get_config(env: Env) -> Result<ResolutionConfig, Error> {
        ConfigManager::get_config(&env)
    }

    pub fn add_admin(
        env: Env,
        caller: Address,
        admin: Address,
        signing_key: BytesN<32>,
    ) -> Result<(), Error> {
        AdminRegistry::add_admin(&env, &caller, &admin, &signing_key)
    }

    pub fn remove_admin(env: Env, caller: Address, admin: Address) -> Result<(), Error> {
        AdminRegistry::remove_admin(&env, &caller, &admin)
    }

    pub fn get_admins(env: Env) -> Vec<AdminRecord> {
        AdminRegistry::list_all(&env)
    }

    // ===== MARKETS =====

    pub fn register_market(
        env: Env,
        admin: Address,
        market_id: Symbol,
        question: String,
        expiry: u64,
        path: ResolutionPath,
    ) -> Result<MarketRecord, Error> {
        MarketGateway::register(&env, &admin, &market_id, &question, expiry, path)
    }

    pub fn get_market(env: Env, market_id: Symbol) -> Result<MarketRecord, Error> {
        MarketGateway::get_by_id(&env, &market_id)
    }

    // ===== MULTISIG RESOLUTION =====

    /// Quorum address and params for the current active roster.
    pub fn derive_quorum_address(env: Env) -> Result<(BytesN<32>, QuorumParams), Error> {
        let config = ConfigManager::get_config(&env)?;
        let keys = AdminRegistry::active_signing_keys(&env);
        QuorumAddressDeriver::derive(
            &env,
            config.quorum_version,
            config.multisig_threshold,
            keys.len(),
            &keys,
        )
    }

    /// Digest the proposer must sign before calling `propose_resolution`.
    pub fn preview_settlement_digest(
        env: Env,
        market_id: Symbol,
        outcome: u32,
        evidence: String,
    ) -> Result<BytesN<32>, Error> {
        ResolutionProposalService::preview_digest(&env, &market_id, outcome, &evidence)
    }

    pub fn propose_resolution(
        env: Env,
        market_id: Symbol,
        outcome: u32,
        evidence: String,
        admin: Address,
        signature: BytesN<64>,
    ) -> Result<ResolutionProposal, Error> {
        ResolutionProposalService::propose(&env, &market_id, outcome, &evidence, &admin, &signature)
    }

    pub fn sign_resolution(
        env: Env,
        proposal_id: u64,
        admin: Address,
        signature: BytesN<64>,
    ) -> Result<ResolutionProposal, Error> {
        ResolutionProposalService::sign(&env, proposal_id, &admin, &signature)
    }

    pub fn reconcile_settlement(
        env: Env,
        proposal_id: u64,
        admin: Address,
    ) -> Result<ResolutionProposal, Error> {
        ResolutionProposalService::reconcile_settlement(&env, proposal_id, &admin)
    }

    pub fn get_proposal(env: Env, proposal_id: u64) -> Result<ResolutionProposal, Error> {
        ResolutionProposalService::get(&env, proposal_id)
    }

    pub fn get_pending_proposals(env: Env) -> Vec<ResolutionProposal> {
        ResolutionProposalService::get_pending(&env)
    }

    pub fn get_market_proposals(env: Env, market_id: Symbol) -> Vec<ResolutionProposal> {
        ResolutionProposalService::get_for_market(&env, &market_id)
    }

    // ===== OPTIMISTIC ORACLE =====

    pub fn uma_propose(
        env: Env,
        market_id: Symbol,
        outcome: u32,
        evidence: String,
        admin: Address,
    ) -> Result<UmaResolution, Error> {
        OptimisticOracle::propose(&env, &market_id, outcome, &evidence, &admin)
    }

    pub fn uma_dispute(
        env: Env,
        market_id: Symbol,
        user: Address,
        reason: String,
    ) -> Result<UmaResolution, Error> {
        OptimisticOracle::dispute(&env, &market_id, &user, &reason)
    }

    pub fn uma_cast_vote(
        env: Env,
        resolution_id: u64,
        admin: Address,
        vote: u32,
    ) -> Result<UmaVote, Error> {
        OptimisticOracle::cast_vote(&env, resolution_id, &admin, vote)
    }

    pub fn uma_finalize(env: Env, resolution_id: u64) -> Result<UmaResolution, Error> {
        OptimisticOracle::finalize(&env, resolution_id)
    }

    pub fn uma_auto_finalize(env: Env, resolution_id: u64) -> Result<UmaResolution, Error> {
        OptimisticOracle::auto_finalize_no_dispute(&env, resolution_id)
    }

    pub fn get_resolution(env: Env, resolution_id: u64) -> Result<UmaResolution, Error> {
        OptimisticOracle::get(&env, resolution_id)
    }

    /// Latest oracle resolution for a market.
    pub fn get_resolution_status(env: Env, market_id: Symbol) -> Result<UmaResolution, Error> {
        OptimisticOracle::get_latest_for_market(&env, &market_id)
    }

    pub fn get_votes(env: Env, resolution_id: u64) -> Vec<UmaVote> {
        OptimisticOracle::get_votes(&env, resolution_id)
    }

    pub fn get_vote_tally(env: Env, resolution_id: u64) -> Result<VoteTally, Error> {
        OptimisticOracle::get_vote_tally(&env, resolution_id)
    }

    // ===== SCHEDULER =====

    pub fn start_scheduler(env: Env, admin: Address) -> Result<SchedulerState, Error> {
        ResolutionScheduler::start(&env, &admin)
    }

    pub fn stop_scheduler(env: Env, admin: Address) -> Result<SchedulerState, Error> {
        ResolutionScheduler::stop(&env, &admin)
    }

    /// Keeper crank. Callable by anyone once the interval has elapsed.
    pub fn scheduler_tick(env: Env) -> Result<TickReport, Error> {
        ResolutionScheduler::tick(&env)
    }

    pub fn get_scheduler_state(env: Env) -> SchedulerState {
        ResolutionScheduler::get_state(&env)
    }
}

#[cfg(test)]
mod test;



#[cfg(test)]
mod scheduler_tests;
