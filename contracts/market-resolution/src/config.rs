use soroban_sdk::{contracttype, Address, Env};

use crate::errors::Error;
use crate::storage::DataKey;

/// Configuration for the market resolution contract.
///
/// Constants below are the defaults baked into every environment preset;
/// the persisted `ResolutionConfig` is what the engine actually reads, so an
/// admin can tune windows without redeploying.

// ===== OUTCOME CONSTANTS =====

/// Outcome value for NO
pub const OUTCOME_NO: u32 = 0;

/// Outcome value for YES
pub const OUTCOME_YES: u32 = 1;

// ===== ORACLE WINDOW CONSTANTS =====

/// Dispute window after an optimistic proposal (10 minutes)
pub const DISPUTE_WINDOW_SECS: u64 = 10 * 60;

/// Voting period after a dispute (10 minutes)
pub const VOTING_PERIOD_SECS: u64 = 10 * 60;

/// Upper bound for either window (30 days)
pub const MAX_WINDOW_SECS: u64 = 30 * 24 * 60 * 60;

// ===== SCHEDULER CONSTANTS =====

/// Minimum spacing between scheduler ticks
pub const SCHEDULER_INTERVAL_SECS: u64 = 30;

/// Finalizations attempted per tick; the rest wait for the next tick
pub const MAX_ITEMS_PER_TICK: u32 = 25;

/// Hard cap on `max_items_per_tick`
pub const MAX_ITEMS_PER_TICK_CAP: u32 = 50;

// ===== QUORUM CONSTANTS =====

/// Quorum address derivation scheme version
pub const QUORUM_VERSION: u32 = 1;

/// Default number of signatures required to settle (2-of-N)
pub const DEFAULT_MULTISIG_THRESHOLD: u32 = 2;

/// Hard cap on the admin roster
pub const MAX_ADMINS: u32 = 20;

// ===== VALIDATION CONSTANTS =====

/// Maximum evidence length in bytes
pub const MAX_EVIDENCE_LENGTH: u32 = 1024;

/// Maximum dispute reason length in bytes
pub const MAX_REASON_LENGTH: u32 = 512;

/// Deployment environment preset
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

/// Persisted resolution settings.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolutionConfig {
    pub environment: Environment,
    pub dispute_window_secs: u64,
    pub voting_period_secs: u64,
    pub scheduler_interval_secs: u64,
    pub max_items_per_tick: u32,
    pub quorum_version: u32,
    pub multisig_threshold: u32,
    pub max_evidence_length: u32,
    pub max_admins: u32,
    /// Settlement ledger contract; `None` means off-chain-only resolution
    pub settlement_ledger: Option<Address>,
}

/// Configuration storage and presets
pub struct ConfigManager;

impl ConfigManager {
    pub fn get_development_config(_env: &Env) -> ResolutionConfig {
        ResolutionConfig {
            environment: Environment::Development,
            dispute_window_secs: DISPUTE_WINDOW_SECS,
            voting_period_secs: VOTING_PERIOD_SECS,
            scheduler_interval_secs: SCHEDULER_INTERVAL_SECS,
            max_items_per_tick: MAX_ITEMS_PER_TICK,
            quorum_version: QUORUM_VERSION,
            multisig_threshold: DEFAULT_MULTISIG_THRESHOLD,
            max_evidence_length: MAX_EVIDENCE_LENGTH,
            max_admins: MAX_ADMINS,
            settlement_ledger: None,
        }
    }

    pub fn get_testnet_config(env: &Env) -> ResolutionConfig {
        ResolutionConfig {
            environment: Environment::Testnet,
            ..Self::get_development_config(env)
        }
    }

    /// Mainnet raises the signing threshold to 3.
    pub fn get_mainnet_config(env: &Env) -> ResolutionConfig {
        ResolutionConfig {
            environment: Environment::Mainnet,
            multisig_threshold: 3,
            ..Self::get_development_config(env)
        }
    }

    pub fn get_config_for(env: &Env, environment: Environment) -> ResolutionConfig {
        match environment {
            Environment::Development => Self::get_development_config(env),
            Environment::Testnet => Self::get_testnet_config(env),
            Environment::Mainnet => Self::get_mainnet_config(env),
        }
    }

    /// Validate and persist configuration.
    pub fn store_config(env: &Env, config: &ResolutionConfig) -> Result<(), Error> {
        Self::validate_config(config)?;
        env.storage().instance().set(&DataKey::Config, config);
        Ok(())
    }

    pub fn get_config(env: &Env) -> Result<ResolutionConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)
    }

    pub fn is_initialized(env: &Env) -> bool {
        env.storage().instance().has(&DataKey::Config)
    }

    pub fn validate_config(config: &ResolutionConfig) -> Result<(), Error> {
        if config.dispute_window_secs == 0 || config.voting_period_secs == 0 {
            return Err(Error::InvalidConfiguration);
        }
        if config.dispute_window_secs > MAX_WINDOW_SECS || config.voting_period_secs > MAX_WINDOW_SECS {
            return Err(Error::InvalidConfiguration);
        }
        if config.scheduler_interval_secs == 0 {
            return Err(Error::InvalidConfiguration);
        }
        if config.max_items_per_tick == 0 || config.max_items_per_tick > MAX_ITEMS_PER_TICK_CAP {
            return Err(Error::InvalidConfiguration);
        }
        // version and threshold are encoded as single bytes in the quorum address
        if config.quorum_version == 0 || config.quorum_version > u8::MAX as u32 {
            return Err(Error::InvalidConfiguration);
        }
        if config.max_admins == 0 || config.max_admins > MAX_ADMINS {
            return Err(Error::InvalidConfiguration);
        }
        if config.multisig_threshold == 0 || config.multisig_threshold > config.max_admins {
            return Err(Error::InvalidConfiguration);
        }
        if config.max_evidence_length == 0 {
            return Err(Error::InvalidConfiguration);
        }
        Ok(())
    }
}
