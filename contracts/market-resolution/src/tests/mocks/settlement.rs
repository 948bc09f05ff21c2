//! Mock settlement ledger used to drive the broadcast paths.

use soroban_sdk::{contract, contractimpl, contracttype, symbol_short, BytesN, Env, Symbol};

use crate::types::{PartialBlob, SettlementStatus, SettlementTx};

const BEHAVIOR: Symbol = symbol_short!("behavior");
const SUBMITTED: Symbol = symbol_short!("submitted");

/// How the mock responds.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MockBehavior {
    /// Accept and confirm in the current ledger
    Confirm,
    /// Accept, confirmation never arrives
    Pending,
    /// Accept, then report the transaction as rejected
    Reject,
    /// Trap on submit
    Offline,
}

#[contract]
pub struct MockSettlementLedger;

#[contractimpl]
impl MockSettlementLedger {
    pub fn set_behavior(env: Env, behavior: MockBehavior) {
        env.storage().instance().set(&BEHAVIOR, &behavior);
    }

    pub fn submissions(env: Env) -> u32 {
        env.storage().instance().get(&SUBMITTED).unwrap_or(0)
    }

    pub fn submit_settlement(env: Env, tx: SettlementTx, blob: PartialBlob) -> BytesN<32> {
        if Self::behavior(&env) == MockBehavior::Offline {
            panic!("settlement ledger offline");
        }
        let _ = tx;
        let count = Self::submissions(env.clone()) + 1;
        env.storage().instance().set(&SUBMITTED, &count);
        env.crypto()
            .sha256(&soroban_sdk::Bytes::from(blob.digest))
            .to_bytes()
    }

    pub fn settlement_status(env: Env, tx_id: BytesN<32>) -> SettlementStatus {
        let _ = tx_id;
        match Self::behavior(&env) {
            MockBehavior::Confirm => SettlementStatus::Confirmed(env.ledger().sequence()),
            MockBehavior::Pending => SettlementStatus::Pending,
            MockBehavior::Reject | MockBehavior::Offline => SettlementStatus::Rejected,
        }
    }
}

impl MockSettlementLedger {
    fn behavior(env: &Env) -> MockBehavior {
        env.storage()
            .instance()
            .get(&BEHAVIOR)
            .unwrap_or(MockBehavior::Confirm)
    }
}
