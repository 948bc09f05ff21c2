use soroban_sdk::{Address, Env, String, Symbol};

use crate::admin::AdminRegistry;
use crate::errors::Error;
use crate::events::EventEmitter;
use crate::storage::DataKey;
use crate::types::{MarketRecord, MarketStatus, ResolutionPath, UmaStatus};
use crate::validation::InputValidator;

/// Boundary to the market collaborator.
///
/// Market CRUD lives elsewhere; this gateway only registers the fields the
/// resolution engine needs and applies the writes it is allowed to make
/// (`resolve`, `close`, the oracle-status mirror and the pending flag).
pub struct MarketGateway;

impl MarketGateway {
    pub fn register(
        env: &Env,
        caller: &Address,
        market_id: &Symbol,
        question: &String,
        expiry: u64,
        path: ResolutionPath,
    ) -> Result<MarketRecord, Error> {
        AdminRegistry::require_admin(env, caller)?;

        let key = DataKey::Market(market_id.clone());
        if env.storage().persistent().has(&key) {
            return Err(Error::MarketAlreadyExists);
        }
        InputValidator::validate_question(question)?;

        let market = MarketRecord {
            id: market_id.clone(),
            question: question.clone(),
            status: MarketStatus::Open,
            expiry,
            oracle_status: None,
            resolution_path: path,
            outcome: None,
            evidence: None,
            resolved_at: None,
            closed_at: None,
            locked: false,
        };
        env.storage().persistent().set(&key, &market);

        EventEmitter::emit_market_registered(env, market_id, expiry, path);
        Ok(market)
    }

    pub fn get_by_id(env: &Env, market_id: &Symbol) -> Result<MarketRecord, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Market(market_id.clone()))
            .ok_or(Error::MarketNotFound)
    }

    /// Checks shared by both resolution paths before a proposal is accepted.
    pub fn validate_resolvable(
        env: &Env,
        market_id: &Symbol,
        path: ResolutionPath,
    ) -> Result<MarketRecord, Error> {
        let market = Self::get_by_id(env, market_id)?;
        if market.resolution_path != path {
            return Err(Error::WrongResolutionPath);
        }
        if market.locked {
            return Err(Error::MarketAlreadyLocked);
        }
        if market.status.is_final() {
            return Err(Error::MarketAlreadyResolved);
        }
        if env.ledger().timestamp() < market.expiry {
            return Err(Error::MarketNotExpired);
        }
        Ok(market)
    }

    pub fn mark_pending(env: &Env, market_id: &Symbol) -> Result<(), Error> {
        let mut market = Self::get_by_id(env, market_id)?;
        market.status = MarketStatus::PendingResolution;
        Self::save(env, &market);
        Ok(())
    }

    /// Write the final outcome. Only called after a resolution path has
    /// finalized.
    pub fn resolve(
        env: &Env,
        market_id: &Symbol,
        outcome: u32,
        evidence: &String,
    ) -> Result<(), Error> {
        let mut market = Self::get_by_id(env, market_id)?;
        if market.status.is_final() {
            return Err(Error::MarketAlreadyResolved);
        }
        market.status = MarketStatus::Resolved;
        market.outcome = Some(outcome);
        market.evidence = Some(evidence.clone());
        market.resolved_at = Some(env.ledger().timestamp());
        Self::save(env, &market);

        EventEmitter::emit_market_resolved(env, market_id, outcome, market.resolution_path);
        Ok(())
    }

    pub fn close(env: &Env, market_id: &Symbol) -> Result<(), Error> {
        let mut market = Self::get_by_id(env, market_id)?;
        match market.status {
            MarketStatus::Resolved => {}
            MarketStatus::Closed => return Err(Error::MarketAlreadyResolved),
            _ => return Err(Error::StaleState),
        }
        market.status = MarketStatus::Closed;
        market.closed_at = Some(env.ledger().timestamp());
        Self::save(env, &market);

        EventEmitter::emit_market_closed(env, market_id);
        Ok(())
    }

    pub fn update_oracle_status(
        env: &Env,
        market_id: &Symbol,
        status: UmaStatus,
    ) -> Result<(), Error> {
        let mut market = Self::get_by_id(env, market_id)?;
        market.oracle_status = Some(status);
        if status.is_terminal() {
            market.locked = true;
        }
        Self::save(env, &market);
        Ok(())
    }

    fn save(env: &Env, market: &MarketRecord) {
        env.storage()
            .persistent()
            .set(&DataKey::Market(market.id.clone()), market);
    }
}
