//! Contract events: the audit log of every resolution transition.
//!
//! Each event is published under a short topic symbol followed by the
//! primary key (market or record id) so indexers can filter cheaply.

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env, String, Symbol};

use crate::types::{ResolutionPath, UmaStatus};

// ===== EVENT TYPES =====

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalCreatedEvent {
    pub proposal_id: u64,
    pub market_id: Symbol,
    pub outcome: u32,
    pub proposer: Address,
    pub resolution_hash: BytesN<32>,
    pub quorum_address: BytesN<32>,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalSignedEvent {
    pub proposal_id: u64,
    pub signer: Address,
    pub signatures: u32,
    pub threshold: u32,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalExecutedEvent {
    pub proposal_id: u64,
    pub market_id: Symbol,
    pub outcome: u32,
    pub tx_id: Option<BytesN<32>>,
    /// Set when the outcome was committed without on-chain confirmation
    pub needs_reconciliation: bool,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BroadcastFailedEvent {
    pub proposal_id: u64,
    pub market_id: Symbol,
    pub error_code: u32,
    pub tx_id: Option<BytesN<32>>,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleProposedEvent {
    pub resolution_id: u64,
    pub market_id: Symbol,
    pub outcome: u32,
    pub proposed_by: Address,
    pub dispute_window_ends: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleDisputedEvent {
    pub resolution_id: u64,
    pub market_id: Symbol,
    pub disputed_by: Address,
    pub reason: String,
    pub voting_ends: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleVoteEvent {
    pub resolution_id: u64,
    pub admin: Address,
    pub vote: u32,
    pub votes_cast: u32,
    pub eligible: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleLockedEvent {
    pub resolution_id: u64,
    pub market_id: Symbol,
    pub status: UmaStatus,
    pub final_outcome: u32,
    pub yes_votes: u32,
    pub no_votes: u32,
    pub lock_hash: BytesN<32>,
    pub locked_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketResolvedEvent {
    pub market_id: Symbol,
    pub outcome: u32,
    pub path: ResolutionPath,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchedulerTickEvent {
    pub tick_at: u64,
    pub auto_finalized: u32,
    pub vote_finalized: u32,
    pub failures: u32,
}

// ===== EVENT EMITTER =====

pub struct EventEmitter;

impl EventEmitter {
    pub fn emit_admin_added(env: &Env, admin: &Address, signing_key: &BytesN<32>) {
        env.events().publish(
            (symbol_short!("adm_add"), admin.clone()),
            (signing_key.clone(), env.ledger().timestamp()),
        );
    }

    pub fn emit_admin_removed(env: &Env, admin: &Address, removed_by: &Address) {
        env.events().publish(
            (symbol_short!("adm_rem"), admin.clone()),
            (removed_by.clone(), env.ledger().timestamp()),
        );
    }

    pub fn emit_market_registered(env: &Env, market_id: &Symbol, expiry: u64, path: ResolutionPath) {
        env.events().publish(
            (symbol_short!("mkt_reg"), market_id.clone()),
            (expiry, path),
        );
    }

    pub fn emit_market_resolved(env: &Env, market_id: &Symbol, outcome: u32, path: ResolutionPath) {
        let event = MarketResolvedEvent {
            market_id: market_id.clone(),
            outcome,
            path,
            timestamp: env.ledger().timestamp(),
        };
        env.events()
            .publish((symbol_short!("mkt_res"), market_id.clone()), event);
    }

    pub fn emit_market_closed(env: &Env, market_id: &Symbol) {
        env.events().publish(
            (symbol_short!("mkt_cls"), market_id.clone()),
            env.ledger().timestamp(),
        );
    }

    pub fn emit_proposal_created(env: &Env, event: &ProposalCreatedEvent) {
        env.events().publish(
            (symbol_short!("prop_crt"), event.market_id.clone()),
            event.clone(),
        );
    }

    pub fn emit_proposal_signed(
        env: &Env,
        proposal_id: u64,
        signer: &Address,
        signatures: u32,
        threshold: u32,
    ) {
        let event = ProposalSignedEvent {
            proposal_id,
            signer: signer.clone(),
            signatures,
            threshold,
            timestamp: env.ledger().timestamp(),
        };
        env.events()
            .publish((symbol_short!("prop_sig"), proposal_id), event);
    }

    pub fn emit_proposal_executed(env: &Env, event: &ProposalExecutedEvent) {
        env.events().publish(
            (symbol_short!("prop_exe"), event.proposal_id),
            event.clone(),
        );
    }

    pub fn emit_broadcast_failed(env: &Env, event: &BroadcastFailedEvent) {
        env.events().publish(
            (symbol_short!("bcast_err"), event.proposal_id),
            event.clone(),
        );
    }

    pub fn emit_broadcast_pending(env: &Env, proposal_id: u64, tx_id: &BytesN<32>) {
        env.events().publish(
            (symbol_short!("bcast_pnd"), proposal_id),
            (tx_id.clone(), env.ledger().timestamp()),
        );
    }

    pub fn emit_oracle_proposed(env: &Env, event: &OracleProposedEvent) {
        env.events().publish(
            (symbol_short!("uma_prop"), event.market_id.clone()),
            event.clone(),
        );
    }

    pub fn emit_oracle_disputed(env: &Env, event: &OracleDisputedEvent) {
        env.events().publish(
            (symbol_short!("uma_disp"), event.market_id.clone()),
            event.clone(),
        );
    }

    pub fn emit_oracle_vote(env: &Env, event: &OracleVoteEvent) {
        env.events().publish(
            (symbol_short!("uma_vote"), event.resolution_id),
            event.clone(),
        );
    }

    pub fn emit_oracle_locked(env: &Env, event: &OracleLockedEvent) {
        env.events().publish(
            (symbol_short!("uma_lock"), event.market_id.clone()),
            event.clone(),
        );
    }

    pub fn emit_scheduler_started(env: &Env, admin: &Address, interval_secs: u64) {
        env.events().publish(
            (symbol_short!("sch_start"), admin.clone()),
            interval_secs,
        );
    }

    pub fn emit_scheduler_stopped(env: &Env, admin: &Address) {
        env.events().publish(
            (symbol_short!("sch_stop"), admin.clone()),
            env.ledger().timestamp(),
        );
    }

    pub fn emit_scheduler_tick(env: &Env, event: &SchedulerTickEvent) {
        env.events()
            .publish((symbol_short!("sch_tick"),), event.clone());
    }

    pub fn emit_scheduler_item_failed(env: &Env, resolution_id: u64, error_code: u32) {
        env.events().publish(
            (symbol_short!("sch_fail"), resolution_id),
            error_code,
        );
    }
}
