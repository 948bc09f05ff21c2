use soroban_sdk::{contracttype, Address, BytesN, Map, String, Symbol, Vec};

// ===== MARKET TYPES =====

/// Lifecycle of a market as seen by the resolution subsystem.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarketStatus {
    /// Trading or awaiting a resolution proposal
    Open,
    /// A multisig proposal is collecting signatures
    PendingResolution,
    /// Outcome has been written
    Resolved,
    /// Market is closed for good
    Closed,
}

impl MarketStatus {
    /// Resolved and closed markets never accept another proposal.
    pub fn is_final(&self) -> bool {
        matches!(self, MarketStatus::Resolved | MarketStatus::Closed)
    }
}

/// Which adjudication path owns a market. Fixed when the market is
/// registered so the two paths can never race on the same market.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolutionPath {
    Multisig,
    Optimistic,
}

/// The market fields this subsystem reads and writes.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketRecord {
    pub id: Symbol,
    pub question: String,
    pub status: MarketStatus,
    pub expiry: u64,
    /// Mirror of the latest oracle resolution status for quick lookups
    pub oracle_status: Option<UmaStatus>,
    pub resolution_path: ResolutionPath,
    pub outcome: Option<u32>,
    pub evidence: Option<String>,
    pub resolved_at: Option<u64>,
    pub closed_at: Option<u64>,
    /// Set once an oracle resolution locks the outcome
    pub locked: bool,
}

// ===== ADMIN TYPES =====

/// A registered admin: invocation identity plus the ed25519 key used to sign
/// settlement transactions.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminRecord {
    pub address: Address,
    pub signing_key: BytesN<32>,
    pub added_at: u64,
    pub active: bool,
}

// ===== QUORUM & SETTLEMENT TYPES =====

/// Canonical M-of-N quorum description. `signers` is always sorted ascending.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QuorumParams {
    pub version: u32,
    pub threshold: u32,
    pub signers: Vec<BytesN<32>>,
}

/// Application calls a settlement transaction can carry.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionKind {
    ResolveMarket,
}

/// Unsigned settlement transaction. The quorum address is the sender.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SettlementTx {
    pub kind: TransactionKind,
    pub sender: BytesN<32>,
    pub market_id: Symbol,
    pub outcome: u32,
    pub resolution_hash: BytesN<32>,
    pub quorum_version: u32,
}

/// Partially authorized transaction: the digest every signer signed plus
/// the detached signatures keyed by signer public key.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartialBlob {
    pub digest: BytesN<32>,
    pub signatures: Map<BytesN<32>, BytesN<64>>,
}

/// What the settlement ledger reports for a submitted transaction.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SettlementStatus {
    /// Confirmed in the given ledger sequence
    Confirmed(u32),
    Pending,
    Rejected,
}

/// On-chain settlement bookkeeping for a multisig proposal.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SettlementState {
    /// Threshold not reached yet
    NotBroadcast,
    /// No settlement ledger configured; resolved off-chain only
    OffChainOnly,
    /// Confirmed with this transaction id
    Confirmed(BytesN<32>),
    /// Submitted, confirmation still outstanding
    AwaitingConfirmation(BytesN<32>),
    /// Broadcast failed with this error code; resolved off-chain and flagged
    /// for manual reconciliation
    FailedOffChainFallback(u32),
}

// ===== MULTISIG PROPOSAL TYPES =====

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProposalStatus {
    PendingSignatures,
    Executed,
}

/// A multisig resolution proposal.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolutionProposal {
    pub id: u64,
    pub market_id: Symbol,
    pub proposed_outcome: u32,
    pub proposer: Address,
    /// Admins that signed, in signing order
    pub signers: Vec<Address>,
    /// Quorum snapshot taken at propose time
    pub quorum: QuorumParams,
    pub quorum_address: BytesN<32>,
    pub transaction: SettlementTx,
    pub partial_blob: Option<PartialBlob>,
    pub status: ProposalStatus,
    pub evidence: String,
    pub resolution_hash: BytesN<32>,
    pub settlement: SettlementState,
    pub created_at: u64,
    pub executed_at: Option<u64>,
}

// ===== OPTIMISTIC ORACLE TYPES =====

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UmaStatus {
    Proposed,
    UmaVoting,
    UmaLocked,
    ExpiredNoDispute,
}

impl UmaStatus {
    /// Terminal records are immutable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UmaStatus::UmaLocked | UmaStatus::ExpiredNoDispute)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// An optimistic-oracle resolution attempt.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UmaResolution {
    pub id: u64,
    pub market_id: Symbol,
    pub proposed_outcome: u32,
    pub proposed_by: Address,
    pub evidence: String,
    pub status: UmaStatus,
    /// Voting panel snapshot taken at propose time
    pub eligible_voters: Vec<Address>,
    pub proposed_at: u64,
    pub dispute_window_ends: u64,
    pub voting_ends: Option<u64>,
    pub locked_at: Option<u64>,
    pub final_outcome: Option<u32>,
    pub lock_hash: Option<BytesN<32>>,
    pub dispute_reason: Option<String>,
    pub disputed_by: Option<Address>,
    pub disputed_at: Option<u64>,
}

/// A single panel vote. Never mutated once stored.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UmaVote {
    pub id: u64,
    pub resolution_id: u64,
    pub admin: Address,
    pub vote: u32,
    pub voted_at: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteTally {
    pub yes: u32,
    pub no: u32,
    pub cast: u32,
    pub eligible: u32,
}

// ===== SCHEDULER TYPES =====

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchedulerState {
    pub running: bool,
    pub interval_secs: u64,
    pub last_tick_at: Option<u64>,
    pub ticks: u64,
    pub started_at: Option<u64>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TickFailure {
    pub resolution_id: u64,
    pub error_code: u32,
}

/// Outcome of one scheduler pass.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TickReport {
    pub tick_at: u64,
    pub auto_finalized: Vec<u64>,
    pub vote_finalized: Vec<u64>,
    pub failures: Vec<TickFailure>,
    /// Due items were left over for the next tick
    pub truncated: bool,
}
