use soroban_sdk::{contracttype, Address, Env, Symbol, Vec};

use crate::types::{ProposalStatus, UmaStatus};

// ===== STORAGE KEYS =====

/// Every key the contract writes. Records live in persistent storage, keyed
/// by id; secondary indexes by market and by status let the scheduler and
/// the query entrypoints avoid scanning unrelated records.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// `ResolutionConfig` (instance)
    Config,
    /// `SchedulerState` (instance)
    Scheduler,
    /// Ordered `Vec<Address>` of every admin ever registered (instance)
    AdminRoster,
    /// `AdminRecord`
    Admin(Address),
    /// `MarketRecord`
    Market(Symbol),

    /// Monotonic proposal id counter (instance)
    ProposalCounter,
    /// `ResolutionProposal`
    Proposal(u64),
    /// Id of the market's PENDING_SIGNATURES proposal, if any
    PendingProposal(Symbol),
    /// `Vec<u64>` of proposal ids for a market
    MarketProposals(Symbol),
    /// `Vec<u64>` of proposal ids in an active status; executed proposals
    /// drop out
    ProposalsByStatus(ProposalStatus),

    /// Monotonic oracle resolution id counter (instance)
    UmaCounter,
    /// `UmaResolution`
    Uma(u64),
    /// Id of the market's PROPOSED / UMA_VOTING resolution, if any
    ActiveUma(Symbol),
    /// `Vec<u64>` of resolution ids for a market
    MarketUmas(Symbol),
    /// `Vec<u64>` of resolution ids in PROPOSED or UMA_VOTING
    UmasByStatus(UmaStatus),

    /// Monotonic vote id counter (instance)
    VoteCounter,
    /// `UmaVote` for (resolution id, admin)
    Vote(u64, Address),
    /// `Vec<Address>` of admins that voted on a resolution, in order
    ResolutionVoters(u64),
}

// ===== COUNTERS =====

pub struct Counters;

impl Counters {
    /// Allocate the next id for `key`, starting at 1.
    pub fn next(env: &Env, key: &DataKey) -> u64 {
        let next: u64 = env.storage().instance().get(key).unwrap_or(0u64) + 1;
        env.storage().instance().set(key, &next);
        next
    }
}

// ===== ID INDEXES =====

/// Insert-or-remove lists of record ids.
pub struct IdIndex;

impl IdIndex {
    pub fn get(env: &Env, key: &DataKey) -> Vec<u64> {
        env.storage()
            .persistent()
            .get(key)
            .unwrap_or(Vec::new(env))
    }

    pub fn insert(env: &Env, key: &DataKey, id: u64) {
        let mut ids = Self::get(env, key);
        if !ids.contains(id) {
            ids.push_back(id);
            env.storage().persistent().set(key, &ids);
        }
    }

    pub fn remove(env: &Env, key: &DataKey, id: u64) {
        let mut ids = Self::get(env, key);
        if let Some(index) = ids.first_index_of(id) {
            ids.remove(index);
            env.storage().persistent().set(key, &ids);
        }
    }
}

// ===== ADDRESS LISTS =====

pub struct AddressList;

impl AddressList {
    pub fn get(env: &Env, key: &DataKey) -> Vec<Address> {
        env.storage()
            .persistent()
            .get(key)
            .unwrap_or(Vec::new(env))
    }

    pub fn push(env: &Env, key: &DataKey, address: &Address) {
        let mut list = Self::get(env, key);
        list.push_back(address.clone());
        env.storage().persistent().set(key, &list);
    }
}
