#![allow(dead_code)]

use soroban_sdk::contracterror;

/// Error codes for the market resolution contract.
///
/// Codes are grouped by how a caller is expected to react:
///
/// **Validation errors (100-199):** bad input or unknown entities. Surfaced
/// immediately, never worth retrying with the same arguments.
///
/// **State-conflict errors (200-299):** the request raced with, or arrived
/// after, another transition. Callers re-query current state instead of
/// retrying blindly.
///
/// **Infrastructure errors (300-399):** the settlement ledger rejected or did
/// not confirm a transaction. The off-chain resolution record is never
/// corrupted by these.
///
/// **Configuration / system errors (400-499):** contract set-up and scheduler
/// lifecycle problems.
///
/// **Fatal (500):** `TerminalRecordMutation` is raised with
/// `panic_with_error!` and traps the invocation. It signals a bug, not a
/// normal error path.
///
/// # Usage
///
/// ```rust
/// # use market_resolution::errors::{Error, ErrorCategory};
/// let error = Error::DuplicateVote;
/// assert_eq!(error.code(), "DUPLICATE_VOTE");
/// assert_eq!(error.category(), ErrorCategory::StateConflict);
/// assert!(!error.is_retryable());
/// ```
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ===== VALIDATION ERRORS =====
    /// Caller is not allowed to perform this action
    Unauthorized = 100,
    /// Market not found
    MarketNotFound = 101,
    /// Outcome must be 0 (NO) or 1 (YES)
    InvalidOutcome = 102,
    /// Market expiry has not passed yet
    MarketNotExpired = 103,
    /// Market is already resolved or closed
    MarketAlreadyResolved = 104,
    /// Admin is not registered or no longer active
    AdminNotFound = 105,
    /// Market already has a proposal awaiting signatures
    ConflictingProposal = 106,
    /// Evidence exceeds the configured length
    InvalidEvidence = 107,
    /// Market is configured for the other resolution path
    WrongResolutionPath = 108,
    /// Proposal not found
    ProposalNotFound = 109,
    /// Oracle resolution not found
    ResolutionNotFound = 110,
    /// Dispute reason must not be empty
    EmptyDisputeReason = 111,
    /// Signer key is not a member of the quorum
    UnauthorizedSigner = 112,
    /// Admin is not part of the voting panel for this resolution
    NotEligibleVoter = 113,
    /// Market is already registered
    MarketAlreadyExists = 114,
    /// Admin is already registered
    AdminAlreadyExists = 115,
    /// Generic malformed input
    InvalidInput = 116,

    // ===== STATE-CONFLICT ERRORS =====
    /// Admin already signed this proposal
    DuplicateSignature = 200,
    /// Key already present in the partial signature blob
    DuplicateSigner = 201,
    /// Admin already voted on this resolution
    DuplicateVote = 202,
    /// Dispute window has closed
    DisputeWindowExpired = 203,
    /// Voting window has closed
    VotingWindowExpired = 204,
    /// Resolution is already in a terminal locked state
    AlreadyLocked = 205,
    /// Resolution is not in the PROPOSED state
    NotInProposedState = 206,
    /// Resolution is not in the UMA_VOTING state
    NotInVotingState = 207,
    /// Proposal has already been executed
    ProposalAlreadyExecuted = 208,
    /// Market already has an active oracle resolution
    ActiveResolutionExists = 209,
    /// Market outcome is permanently locked
    MarketAlreadyLocked = 210,
    /// Dispute window is still open
    DisputeWindowOpen = 211,
    /// Voting window is still open and not every voter has voted
    VotingWindowOpen = 212,
    /// Settlement transaction was submitted and awaits confirmation
    SettlementAwaitingConfirmation = 213,
    /// Signature blobs refer to different transactions
    MismatchedTransaction = 214,
    /// Not enough signatures to authorize the transaction
    InsufficientSignatures = 215,
    /// Nothing to reconcile for this proposal
    NothingToReconcile = 216,
    /// Status changed underneath the caller
    StaleState = 217,

    // ===== INFRASTRUCTURE ERRORS =====
    /// Settlement ledger rejected the transaction
    BroadcastFailed = 300,
    /// Settlement transaction was not confirmed within budget
    ConfirmationTimeout = 301,

    // ===== CONFIGURATION / SYSTEM ERRORS =====
    /// Quorum or contract configuration is invalid
    InvalidConfiguration = 400,
    /// Contract has not been initialized
    NotInitialized = 401,
    /// Contract is already initialized
    AlreadyInitialized = 402,
    /// Scheduler is not running
    SchedulerStopped = 403,
    /// Scheduler interval has not elapsed since the last tick
    SchedulerNotDue = 404,
    /// Scheduler is already running
    SchedulerAlreadyRunning = 405,
    /// Admin roster is full
    TooManyAdmins = 406,

    // ===== FATAL =====
    /// Attempt to overwrite a record that is already terminal
    TerminalRecordMutation = 500,
}

/// Coarse error grouping used by callers for retry-vs-abort decisions.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCategory {
    Validation,
    StateConflict,
    Infrastructure,
    System,
    Fatal,
}

impl Error {
    /// Human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            Error::Unauthorized => "Caller is not authorized to perform this action",
            Error::MarketNotFound => "Market not found",
            Error::InvalidOutcome => "Outcome must be 0 or 1",
            Error::MarketNotExpired => "Market has not reached its expiry",
            Error::MarketAlreadyResolved => "Market is already resolved or closed",
            Error::AdminNotFound => "Admin not found",
            Error::ConflictingProposal => "Market already has a pending proposal",
            Error::InvalidEvidence => "Evidence is too long",
            Error::WrongResolutionPath => "Market uses a different resolution path",
            Error::ProposalNotFound => "Proposal not found",
            Error::ResolutionNotFound => "Resolution not found",
            Error::EmptyDisputeReason => "Dispute reason is required",
            Error::UnauthorizedSigner => "Signer is not a quorum member",
            Error::NotEligibleVoter => "Admin is not eligible to vote on this resolution",
            Error::MarketAlreadyExists => "Market already exists",
            Error::AdminAlreadyExists => "Admin already exists",
            Error::InvalidInput => "Invalid input",
            Error::DuplicateSignature => "Admin already signed this proposal",
            Error::DuplicateSigner => "Signer already present in signature blob",
            Error::DuplicateVote => "Admin already voted",
            Error::DisputeWindowExpired => "Dispute window has expired",
            Error::VotingWindowExpired => "Voting window has expired",
            Error::AlreadyLocked => "Resolution is already locked",
            Error::NotInProposedState => "Resolution is not in proposed state",
            Error::NotInVotingState => "Resolution is not in voting state",
            Error::ProposalAlreadyExecuted => "Proposal has already been executed",
            Error::ActiveResolutionExists => "Market already has an active resolution",
            Error::MarketAlreadyLocked => "Market outcome is permanently locked",
            Error::DisputeWindowOpen => "Dispute window is still open",
            Error::VotingWindowOpen => "Voting window is still open",
            Error::SettlementAwaitingConfirmation => "Settlement is awaiting confirmation",
            Error::MismatchedTransaction => "Signature blobs refer to different transactions",
            Error::InsufficientSignatures => "Signature threshold not met",
            Error::NothingToReconcile => "Proposal has no settlement awaiting confirmation",
            Error::StaleState => "Record status changed concurrently",
            Error::BroadcastFailed => "Settlement ledger rejected the transaction",
            Error::ConfirmationTimeout => "Settlement transaction not confirmed in time",
            Error::InvalidConfiguration => "Invalid configuration",
            Error::NotInitialized => "Contract not initialized",
            Error::AlreadyInitialized => "Contract already initialized",
            Error::SchedulerStopped => "Scheduler is not running",
            Error::SchedulerNotDue => "Scheduler interval has not elapsed",
            Error::SchedulerAlreadyRunning => "Scheduler is already running",
            Error::TooManyAdmins => "Admin roster is full",
            Error::TerminalRecordMutation => "Attempted to mutate a terminal record",
        }
    }

    /// Stable string code for structured logs and client mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized => "UNAUTHORIZED",
            Error::MarketNotFound => "MARKET_NOT_FOUND",
            Error::InvalidOutcome => "INVALID_OUTCOME",
            Error::MarketNotExpired => "MARKET_NOT_EXPIRED",
            Error::MarketAlreadyResolved => "MARKET_ALREADY_RESOLVED",
            Error::AdminNotFound => "ADMIN_NOT_FOUND",
            Error::ConflictingProposal => "CONFLICTING_PROPOSAL",
            Error::InvalidEvidence => "INVALID_EVIDENCE",
            Error::WrongResolutionPath => "WRONG_RESOLUTION_PATH",
            Error::ProposalNotFound => "PROPOSAL_NOT_FOUND",
            Error::ResolutionNotFound => "RESOLUTION_NOT_FOUND",
            Error::EmptyDisputeReason => "EMPTY_DISPUTE_REASON",
            Error::UnauthorizedSigner => "UNAUTHORIZED_SIGNER",
            Error::NotEligibleVoter => "NOT_ELIGIBLE_VOTER",
            Error::MarketAlreadyExists => "MARKET_ALREADY_EXISTS",
            Error::AdminAlreadyExists => "ADMIN_ALREADY_EXISTS",
            Error::InvalidInput => "INVALID_INPUT",
            Error::DuplicateSignature => "DUPLICATE_SIGNATURE",
            Error::DuplicateSigner => "DUPLICATE_SIGNER",
            Error::DuplicateVote => "DUPLICATE_VOTE",
            Error::DisputeWindowExpired => "DISPUTE_WINDOW_EXPIRED",
            Error::VotingWindowExpired => "VOTING_WINDOW_EXPIRED",
            Error::AlreadyLocked => "ALREADY_LOCKED",
            Error::NotInProposedState => "NOT_IN_PROPOSED_STATE",
            Error::NotInVotingState => "NOT_IN_VOTING_STATE",
            Error::ProposalAlreadyExecuted => "PROPOSAL_ALREADY_EXECUTED",
            Error::ActiveResolutionExists => "ACTIVE_RESOLUTION_EXISTS",
            Error::MarketAlreadyLocked => "MARKET_ALREADY_LOCKED",
            Error::DisputeWindowOpen => "DISPUTE_WINDOW_OPEN",
            Error::VotingWindowOpen => "VOTING_WINDOW_OPEN",
            Error::SettlementAwaitingConfirmation => "SETTLEMENT_AWAITING_CONFIRMATION",
            Error::MismatchedTransaction => "MISMATCHED_TRANSACTION",
            Error::InsufficientSignatures => "INSUFFICIENT_SIGNATURES",
            Error::NothingToReconcile => "NOTHING_TO_RECONCILE",
            Error::StaleState => "STALE_STATE",
            Error::BroadcastFailed => "BROADCAST_FAILED",
            Error::ConfirmationTimeout => "CONFIRMATION_TIMEOUT",
            Error::InvalidConfiguration => "INVALID_CONFIGURATION",
            Error::NotInitialized => "NOT_INITIALIZED",
            Error::AlreadyInitialized => "ALREADY_INITIALIZED",
            Error::SchedulerStopped => "SCHEDULER_STOPPED",
            Error::SchedulerNotDue => "SCHEDULER_NOT_DUE",
            Error::SchedulerAlreadyRunning => "SCHEDULER_ALREADY_RUNNING",
            Error::TooManyAdmins => "TOO_MANY_ADMINS",
            Error::TerminalRecordMutation => "TERMINAL_RECORD_MUTATION",
        }
    }

    /// Taxonomy bucket, derived from the numeric code range.
    pub fn category(&self) -> ErrorCategory {
        match *self as u32 {
            100..=199 => ErrorCategory::Validation,
            200..=299 => ErrorCategory::StateConflict,
            300..=399 => ErrorCategory::Infrastructure,
            500..=599 => ErrorCategory::Fatal,
            _ => ErrorCategory::System,
        }
    }

    /// Whether resubmitting the same request later can succeed without the
    /// caller changing anything. Only infrastructure errors qualify, and even
    /// then only after the caller re-checks settlement state.
    pub fn is_retryable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Infrastructure)
    }
}
