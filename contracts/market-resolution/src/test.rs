#![cfg(test)]

extern crate std;

use super::*;
use crate::keyring::{self, tests::XorVault};
use ed25519_dalek::{Signer, SigningKey};
use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Ledger},
    Address, BytesN, Env, String, Symbol,
};

pub(crate) const START: u64 = 1_000;

/// Contract with three admins, development config (2-of-3, 10 minute
/// windows) and the clock at `START`.
pub(crate) struct ResolutionTest {
    pub env: Env,
    pub contract_id: Address,
    pub admins: [Address; 3],
    pub keys: [SigningKey; 3],
}

impl ResolutionTest {
    pub fn setup() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().set_timestamp(START);

        let contract_id = env.register(MarketResolution, ());
        let keys = [
            SigningKey::from_bytes(&[11u8; 32]),
            SigningKey::from_bytes(&[22u8; 32]),
            SigningKey::from_bytes(&[33u8; 32]),
        ];
        let admins = [
            Address::generate(&env),
            Address::generate(&env),
            Address::generate(&env),
        ];

        let client = MarketResolutionClient::new(&env, &contract_id);
        client.initialize(&admins[0], &Self::public(&env, &keys[0]), &None);
        client.add_admin(&admins[0], &admins[1], &Self::public(&env, &keys[1]));
        client.add_admin(&admins[0], &admins[2], &Self::public(&env, &keys[2]));

        Self {
            env,
            contract_id,
            admins,
            keys,
        }
    }

    pub fn client(&self) -> MarketResolutionClient<'_> {
        MarketResolutionClient::new(&self.env, &self.contract_id)
    }

    pub fn public(env: &Env, key: &SigningKey) -> BytesN<32> {
        BytesN::from_array(env, &key.verifying_key().to_bytes())
    }

    /// Register a market that expired at `START`.
    pub fn expired_market(&self, id: Symbol, path: ResolutionPath) -> Symbol {
        self.client().register_market(
            &self.admins[0],
            &id,
            &String::from_str(&self.env, "Will it rain tomorrow?"),
            &START,
            &path,
        );
        id
    }

    pub fn text(&self, value: &str) -> String {
        String::from_str(&self.env, value)
    }

    pub fn advance(&self, secs: u64) {
        self.env
            .ledger()
            .with_mut(|li| li.timestamp = li.timestamp.saturating_add(secs));
    }

    pub fn now(&self) -> u64 {
        self.env.ledger().timestamp()
    }

    pub fn sign(&self, admin: usize, digest: &BytesN<32>) -> BytesN<64> {
        let signature = self.keys[admin].sign(&digest.to_array());
        BytesN::from_array(&self.env, &signature.to_bytes())
    }

    /// Propose through the multisig path with admin 0 as proposer.
    pub fn propose_multisig(&self, market: &Symbol, outcome: u32, evidence: &str) -> ResolutionProposal {
        let client = self.client();
        let evidence = self.text(evidence);
        let digest = client.preview_settlement_digest(market, &outcome, &evidence);
        client.propose_resolution(market, &outcome, &evidence, &self.admins[0], &self.sign(0, &digest))
    }

    pub fn digest_of(proposal: &ResolutionProposal) -> BytesN<32> {
        match &proposal.partial_blob {
            Some(blob) => blob.digest.clone(),
            None => panic!("proposal has no blob"),
        }
    }
}

#[test]
fn test_initialize_registers_first_admin() {
    let test = ResolutionTest::setup();
    let client = test.client();

    let admins = client.get_admins();
    assert_eq!(admins.len(), 3);
    assert_eq!(admins.get(0).unwrap().address, test.admins[0]);
    assert!(admins.iter().all(|a| a.active));

    let config = client.get_config();
    assert_eq!(config.multisig_threshold, 2);
    assert_eq!(config.dispute_window_secs, 600);
    assert_eq!(config.settlement_ledger, None);
}

#[test]
fn test_initialize_twice_fails() {
    let test = ResolutionTest::setup();
    let result = test.client().try_initialize(
        &test.admins[1],
        &ResolutionTest::public(&test.env, &test.keys[1]),
        &None,
    );
    assert_eq!(result, Err(Ok(Error::AlreadyInitialized)));
}

#[test]
fn test_non_admin_cannot_register_market() {
    let test = ResolutionTest::setup();
    let outsider = Address::generate(&test.env);
    let result = test.client().try_register_market(
        &outsider,
        &symbol_short!("m1"),
        &test.text("question"),
        &START,
        &ResolutionPath::Multisig,
    );
    assert_eq!(result, Err(Ok(Error::Unauthorized)));
}

#[test]
fn test_duplicate_admin_key_rejected() {
    let test = ResolutionTest::setup();
    let result = test.client().try_add_admin(
        &test.admins[0],
        &Address::generate(&test.env),
        &ResolutionTest::public(&test.env, &test.keys[1]),
    );
    assert_eq!(result, Err(Ok(Error::AdminAlreadyExists)));
}

#[test]
fn test_remove_admin_keeps_threshold_reachable() {
    let test = ResolutionTest::setup();
    let client = test.client();

    client.remove_admin(&test.admins[0], &test.admins[2]);
    let removed = client.get_admins().get(2).unwrap();
    assert!(!removed.active);

    // two active admins left with a threshold of two
    let result = client.try_remove_admin(&test.admins[0], &test.admins[1]);
    assert_eq!(result, Err(Ok(Error::InvalidConfiguration)));
}

#[test]
fn test_quorum_address_is_stable_across_roster_order() {
    let test = ResolutionTest::setup();
    let (address, params) = test.client().derive_quorum_address();
    assert_eq!(params.threshold, 2);
    assert_eq!(params.signers.len(), 3);

    // a second deployment that registers the same keys in another order
    let other = Env::default();
    other.mock_all_auths();
    let id = other.register(MarketResolution, ());
    let client = MarketResolutionClient::new(&other, &id);
    let admins = [
        Address::generate(&other),
        Address::generate(&other),
        Address::generate(&other),
    ];
    client.initialize(&admins[0], &ResolutionTest::public(&other, &test.keys[2]), &None);
    client.add_admin(&admins[0], &admins[1], &ResolutionTest::public(&other, &test.keys[0]));
    client.add_admin(&admins[0], &admins[2], &ResolutionTest::public(&other, &test.keys[1]));
    let (other_address, _) = client.derive_quorum_address();

    assert_eq!(address.to_array(), other_address.to_array());
}

#[test]
fn test_keyring_signature_is_accepted_by_contract() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let market = test.expired_market(symbol_short!("kr"), ResolutionPath::Multisig);

    let vault = XorVault { mask: [0xa5; 32] };
    let sealed = vault.seal(&[11u8; 32]);
    let (_, params) = client.derive_quorum_address();
    let quorum_keys: std::vec::Vec<[u8; 32]> = params.signers.iter().map(|k| k.to_array()).collect();

    let evidence = test.text("source A");
    let digest = client.preview_settlement_digest(&market, &1, &evidence);
    let signature = keyring::partial_sign(&vault, &sealed, &quorum_keys, &digest.to_array()).unwrap();

    let proposal = client.propose_resolution(
        &market,
        &1,
        &evidence,
        &test.admins[0],
        &BytesN::from_array(&test.env, &signature),
    );
    assert_eq!(proposal.status, ProposalStatus::PendingSignatures);
    assert_eq!(proposal.signers.len(), 1);
}

#[test]
fn test_oracle_happy_path_without_dispute() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let market = test.expired_market(symbol_short!("M1"), ResolutionPath::Optimistic);

    let resolution = client.uma_propose(&market, &1, &test.text("source A"), &test.admins[0]);
    assert_eq!(resolution.status, UmaStatus::Proposed);
    assert_eq!(resolution.dispute_window_ends, START + 600);
    assert_eq!(
        client.get_market(&market).oracle_status,
        Some(UmaStatus::Proposed)
    );

    client.start_scheduler(&test.admins[0]);
    test.advance(600);
    let report = client.scheduler_tick();
    assert_eq!(report.auto_finalized.len(), 1);
    assert_eq!(report.failures.len(), 0);

    let locked = client.get_resolution(&resolution.id);
    assert_eq!(locked.status, UmaStatus::ExpiredNoDispute);
    assert_eq!(locked.final_outcome, Some(1));
    assert!(locked.lock_hash.is_some());

    let market = client.get_market(&market);
    assert_eq!(market.status, MarketStatus::Closed);
    assert_eq!(market.outcome, Some(1));
    assert!(market.locked);
}

#[test]
fn test_oracle_disputed_vote_overturns_proposal() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let market = test.expired_market(symbol_short!("M2"), ResolutionPath::Optimistic);

    let resolution = client.uma_propose(&market, &0, &test.text("source B"), &test.admins[0]);
    let disputer = Address::generate(&test.env);
    let disputed = client.uma_dispute(&market, &disputer, &test.text("evidence contradicts"));
    assert_eq!(disputed.status, UmaStatus::UmaVoting);
    assert_eq!(disputed.disputed_by, Some(disputer));

    client.uma_cast_vote(&resolution.id, &test.admins[1], &1);
    client.uma_cast_vote(&resolution.id, &test.admins[2], &1);

    client.start_scheduler(&test.admins[0]);
    test.advance(600);
    let report = client.scheduler_tick();
    assert_eq!(report.vote_finalized.len(), 1);

    let locked = client.get_resolution(&resolution.id);
    assert_eq!(locked.status, UmaStatus::UmaLocked);
    assert_eq!(locked.final_outcome, Some(1));
    assert_eq!(client.get_market(&market).outcome, Some(1));
}

#[test]
fn test_oracle_dispute_after_window_rejected() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let market = test.expired_market(symbol_short!("M3"), ResolutionPath::Optimistic);

    client.uma_propose(&market, &1, &test.text("source C"), &test.admins[0]);
    test.advance(11 * 60);
    let result = client.try_uma_dispute(
        &market,
        &Address::generate(&test.env),
        &test.text("too late"),
    );
    assert_eq!(result, Err(Ok(Error::DisputeWindowExpired)));
}

#[test]
fn test_multisig_two_of_three() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let market = test.expired_market(symbol_short!("M4"), ResolutionPath::Multisig);

    let proposal = test.propose_multisig(&market, 1, "official result");
    assert_eq!(proposal.status, ProposalStatus::PendingSignatures);
    assert_eq!(
        client.get_market(&market).status,
        MarketStatus::PendingResolution
    );

    let digest = ResolutionTest::digest_of(&proposal);
    let executed = client.sign_resolution(&proposal.id, &test.admins[2], &test.sign(2, &digest));
    assert_eq!(executed.status, ProposalStatus::Executed);
    assert_eq!(executed.settlement, SettlementState::OffChainOnly);
    assert_eq!(executed.executed_at, Some(START));

    let market_record = client.get_market(&market);
    assert_eq!(market_record.status, MarketStatus::Closed);
    assert_eq!(market_record.outcome, Some(1));

    let late = client.try_sign_resolution(&proposal.id, &test.admins[1], &test.sign(1, &digest));
    assert_eq!(late, Err(Ok(Error::ProposalAlreadyExecuted)));
}

#[test]
fn test_multisig_before_expiry_rejected() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let market = symbol_short!("M5");
    client.register_market(
        &test.admins[0],
        &market,
        &test.text("Will it rain next week?"),
        &(START + 3_600),
        &ResolutionPath::Multisig,
    );

    let evidence = test.text("early");
    let digest = client.preview_settlement_digest(&market, &1, &evidence);
    let result = client.try_propose_resolution(
        &market,
        &1,
        &evidence,
        &test.admins[0],
        &test.sign(0, &digest),
    );
    assert_eq!(result, Err(Ok(Error::MarketNotExpired)));
}

#[test]
fn test_paths_do_not_cross() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let market = test.expired_market(symbol_short!("M6"), ResolutionPath::Multisig);

    let result = client.try_uma_propose(&market, &1, &test.text("source"), &test.admins[0]);
    assert_eq!(result, Err(Ok(Error::WrongResolutionPath)));
}
