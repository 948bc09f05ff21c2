use soroban_sdk::{Address, BytesN, Env, Vec};

use crate::config::ConfigManager;
use crate::errors::Error;
use crate::events::EventEmitter;
use crate::storage::DataKey;
use crate::types::AdminRecord;

/// Admin roster for the resolution contract.
///
/// Admins authenticate invocations with their `Address` and authorize
/// settlement transactions with their ed25519 `signing_key`. The roster is
/// read when a proposal is created and snapshotted into it; later roster
/// changes never touch in-flight proposals.
pub struct AdminRegistry;

impl AdminRegistry {
    /// Register the first admin. Only valid before any admin exists.
    pub fn initialize(env: &Env, admin: &Address, signing_key: &BytesN<32>) -> Result<(), Error> {
        if !Self::roster(env).is_empty() {
            return Err(Error::AlreadyInitialized);
        }
        Self::insert(env, admin, signing_key)
    }

    pub fn add_admin(
        env: &Env,
        caller: &Address,
        admin: &Address,
        signing_key: &BytesN<32>,
    ) -> Result<(), Error> {
        Self::require_admin(env, caller)?;

        let config = ConfigManager::get_config(env)?;
        if Self::list_active(env).len() >= config.max_admins {
            return Err(Error::TooManyAdmins);
        }
        Self::insert(env, admin, signing_key)
    }

    /// Deactivate an admin. The record is kept so historical proposals and
    /// votes still resolve to a known identity.
    pub fn remove_admin(env: &Env, caller: &Address, admin: &Address) -> Result<(), Error> {
        Self::require_admin(env, caller)?;

        let mut record = Self::get_by_id(env, admin)?;
        let config = ConfigManager::get_config(env)?;
        // the remaining roster must still be able to reach the threshold
        if Self::list_active(env).len() <= config.multisig_threshold {
            return Err(Error::InvalidConfiguration);
        }

        record.active = false;
        env.storage()
            .persistent()
            .set(&DataKey::Admin(admin.clone()), &record);

        EventEmitter::emit_admin_removed(env, admin, caller);
        Ok(())
    }

    /// Active admin record, or `AdminNotFound`.
    pub fn get_by_id(env: &Env, admin: &Address) -> Result<AdminRecord, Error> {
        let record = Self::get_record(env, admin).ok_or(Error::AdminNotFound)?;
        if !record.active {
            return Err(Error::AdminNotFound);
        }
        Ok(record)
    }

    /// Record regardless of active flag.
    pub fn get_record(env: &Env, admin: &Address) -> Option<AdminRecord> {
        env.storage()
            .persistent()
            .get(&DataKey::Admin(admin.clone()))
    }

    /// Every registered admin, active or not, in registration order.
    pub fn list_all(env: &Env) -> Vec<AdminRecord> {
        let mut records = Vec::new(env);
        for address in Self::roster(env).iter() {
            if let Some(record) = Self::get_record(env, &address) {
                records.push_back(record);
            }
        }
        records
    }

    pub fn list_active(env: &Env) -> Vec<AdminRecord> {
        let mut records = Vec::new(env);
        for record in Self::list_all(env).iter() {
            if record.active {
                records.push_back(record);
            }
        }
        records
    }

    pub fn active_addresses(env: &Env) -> Vec<Address> {
        let mut addresses = Vec::new(env);
        for record in Self::list_active(env).iter() {
            addresses.push_back(record.address);
        }
        addresses
    }

    pub fn active_signing_keys(env: &Env) -> Vec<BytesN<32>> {
        let mut keys = Vec::new(env);
        for record in Self::list_active(env).iter() {
            keys.push_back(record.signing_key);
        }
        keys
    }

    /// Authenticate `caller` and check it is an active admin.
    pub fn require_admin(env: &Env, caller: &Address) -> Result<AdminRecord, Error> {
        caller.require_auth();
        Self::get_by_id(env, caller).map_err(|_| Error::Unauthorized)
    }

    fn roster(env: &Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&DataKey::AdminRoster)
            .unwrap_or(Vec::new(env))
    }

    fn insert(env: &Env, admin: &Address, signing_key: &BytesN<32>) -> Result<(), Error> {
        if Self::get_record(env, admin).is_some() {
            return Err(Error::AdminAlreadyExists);
        }
        if signing_key.to_array() == [0u8; 32] {
            return Err(Error::InvalidInput);
        }
        // keys must be unique or the quorum derivation rejects the roster
        for record in Self::list_all(env).iter() {
            if &record.signing_key == signing_key {
                return Err(Error::AdminAlreadyExists);
            }
        }

        let record = AdminRecord {
            address: admin.clone(),
            signing_key: signing_key.clone(),
            added_at: env.ledger().timestamp(),
            active: true,
        };
        env.storage()
            .persistent()
            .set(&DataKey::Admin(admin.clone()), &record);

        let mut roster = Self::roster(env);
        roster.push_back(admin.clone());
        env.storage().instance().set(&DataKey::AdminRoster, &roster);

        EventEmitter::emit_admin_added(env, admin, signing_key);
        Ok(())
    }
}
