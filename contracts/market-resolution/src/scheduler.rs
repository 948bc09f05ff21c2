use soroban_sdk::{log, Address, Env, Vec};

use crate::admin::AdminRegistry;
use crate::config::{ConfigManager, SCHEDULER_INTERVAL_SECS};
use crate::errors::Error;
use crate::events::{EventEmitter, SchedulerTickEvent};
use crate::optimistic_oracle::OptimisticOracle;
use crate::storage::DataKey;
use crate::types::{SchedulerState, TickFailure, TickReport, UmaStatus};

/// Periodic finalization of oracle resolutions whose windows have elapsed.
///
/// Contracts cannot wake themselves, so the worker is a permissionless
/// `tick` that a keeper calls on an interval. `start`/`stop` gate it and the
/// ledger timestamp is the clock. The manual finalize entrypoints stay
/// available; both routes re-check state and window, so whichever lands
/// first wins and the other gets `AlreadyLocked`.
pub struct ResolutionScheduler;

impl ResolutionScheduler {
    pub fn start(env: &Env, admin: &Address) -> Result<SchedulerState, Error> {
        AdminRegistry::require_admin(env, admin)?;

        let mut state = Self::get_state(env);
        if state.running {
            return Err(Error::SchedulerAlreadyRunning);
        }
        state.running = true;
        state.interval_secs = ConfigManager::get_config(env)?.scheduler_interval_secs;
        state.started_at = Some(env.ledger().timestamp());
        Self::save(env, &state);

        EventEmitter::emit_scheduler_started(env, admin, state.interval_secs);
        Ok(state)
    }

    pub fn stop(env: &Env, admin: &Address) -> Result<SchedulerState, Error> {
        AdminRegistry::require_admin(env, admin)?;

        let mut state = Self::get_state(env);
        if !state.running {
            return Err(Error::SchedulerStopped);
        }
        state.running = false;
        Self::save(env, &state);

        EventEmitter::emit_scheduler_stopped(env, admin);
        Ok(state)
    }

    /// One pass: auto-finalize undisputed proposals, then close elapsed
    /// votes. At most `max_items_per_tick` due items are attempted; the rest
    /// are left for the next tick. A failing item is reported and skipped.
    pub fn tick(env: &Env) -> Result<TickReport, Error> {
        let mut state = Self::get_state(env);
        if !state.running {
            return Err(Error::SchedulerStopped);
        }
        let now = env.ledger().timestamp();
        if let Some(last) = state.last_tick_at {
            if now < last.saturating_add(state.interval_secs) {
                return Err(Error::SchedulerNotDue);
            }
        }
        let mut remaining = ConfigManager::get_config(env)?.max_items_per_tick;

        let mut report = TickReport {
            tick_at: now,
            auto_finalized: Vec::new(env),
            vote_finalized: Vec::new(env),
            failures: Vec::new(env),
            truncated: false,
        };

        for id in OptimisticOracle::ids_in_status(env, UmaStatus::Proposed).iter() {
            let due = match OptimisticOracle::get(env, id) {
                Ok(resolution) => resolution.dispute_window_ends <= now,
                Err(error) => {
                    Self::record_failure(env, &mut report, id, error);
                    continue;
                }
            };
            if !due {
                continue;
            }
            if remaining == 0 {
                report.truncated = true;
                break;
            }
            remaining -= 1;
            match OptimisticOracle::auto_finalize_no_dispute(env, id) {
                Ok(_) => report.auto_finalized.push_back(id),
                Err(error) => Self::record_failure(env, &mut report, id, error),
            }
        }

        for id in OptimisticOracle::ids_in_status(env, UmaStatus::UmaVoting).iter() {
            let due = match OptimisticOracle::get(env, id) {
                Ok(resolution) => resolution.voting_ends.map_or(false, |end| end <= now),
                Err(error) => {
                    Self::record_failure(env, &mut report, id, error);
                    continue;
                }
            };
            if !due {
                continue;
            }
            if remaining == 0 {
                report.truncated = true;
                break;
            }
            remaining -= 1;
            match OptimisticOracle::finalize(env, id) {
                Ok(_) => report.vote_finalized.push_back(id),
                Err(error) => Self::record_failure(env, &mut report, id, error),
            }
        }

        state.last_tick_at = Some(now);
        state.ticks += 1;
        Self::save(env, &state);

        EventEmitter::emit_scheduler_tick(
            env,
            &SchedulerTickEvent {
                tick_at: now,
                auto_finalized: report.auto_finalized.len(),
                vote_finalized: report.vote_finalized.len(),
                failures: report.failures.len(),
            },
        );
        Ok(report)
    }

    pub fn get_state(env: &Env) -> SchedulerState {
        env.storage()
            .instance()
            .get(&DataKey::Scheduler)
            .unwrap_or(SchedulerState {
                running: false,
                interval_secs: SCHEDULER_INTERVAL_SECS,
                last_tick_at: None,
                ticks: 0,
                started_at: None,
            })
    }

    fn save(env: &Env, state: &SchedulerState) {
        env.storage().instance().set(&DataKey::Scheduler, state);
    }

    fn record_failure(env: &Env, report: &mut TickReport, resolution_id: u64, error: Error) {
        log!(env, "scheduler item failed", resolution_id, error as u32);
        // a market settled elsewhere can never lock; stop retrying it
        if error == Error::MarketAlreadyResolved {
            let _ = OptimisticOracle::retire(env, resolution_id);
        }
        EventEmitter::emit_scheduler_item_failed(env, resolution_id, error as u32);
        report.failures.push_back(TickFailure {
            resolution_id,
            error_code: error as u32,
        });
    }
}
