#![cfg(test)]

extern crate std;

use super::*;
use crate::test::{ResolutionTest, START};
use soroban_sdk::{symbol_short, testutils::Address as _, Address, Symbol};

#[test]
fn test_tick_requires_running_scheduler() {
    let test = ResolutionTest::setup();
    let client = test.client();
    assert!(!client.get_scheduler_state().running);
    assert_eq!(client.try_scheduler_tick(), Err(Ok(Error::SchedulerStopped)));
}

#[test]
fn test_start_and_stop_are_admin_only() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let outsider = Address::generate(&test.env);

    assert_eq!(
        client.try_start_scheduler(&outsider),
        Err(Ok(Error::Unauthorized))
    );

    let state = client.start_scheduler(&test.admins[1]);
    assert!(state.running);
    assert_eq!(state.interval_secs, 30);
    assert_eq!(state.started_at, Some(START));
    assert_eq!(
        client.try_start_scheduler(&test.admins[0]),
        Err(Ok(Error::SchedulerAlreadyRunning))
    );

    let state = client.stop_scheduler(&test.admins[0]);
    assert!(!state.running);
    assert_eq!(
        client.try_stop_scheduler(&test.admins[0]),
        Err(Ok(Error::SchedulerStopped))
    );
}

#[test]
fn test_tick_respects_interval() {
    let test = ResolutionTest::setup();
    let client = test.client();
    client.start_scheduler(&test.admins[0]);

    let first = client.scheduler_tick();
    assert_eq!(first.tick_at, START);
    assert_eq!(client.try_scheduler_tick(), Err(Ok(Error::SchedulerNotDue)));

    test.advance(29);
    assert_eq!(client.try_scheduler_tick(), Err(Ok(Error::SchedulerNotDue)));

    test.advance(1);
    client.scheduler_tick();
    let state = client.get_scheduler_state();
    assert_eq!(state.ticks, 2);
    assert_eq!(state.last_tick_at, Some(START + 30));
}

#[test]
fn test_tick_only_finalizes_elapsed_windows() {
    let test = ResolutionTest::setup();
    let client = test.client();
    client.start_scheduler(&test.admins[0]);

    let early = test.expired_market(symbol_short!("e1"), ResolutionPath::Optimistic);
    let first = client.uma_propose(&early, &1, &test.text("first"), &test.admins[0]);
    test.advance(300);
    let late = test.expired_market(symbol_short!("e2"), ResolutionPath::Optimistic);
    let second = client.uma_propose(&late, &0, &test.text("second"), &test.admins[1]);

    test.advance(300);
    let report = client.scheduler_tick();
    assert_eq!(report.auto_finalized.len(), 1);
    assert_eq!(report.auto_finalized.get(0).unwrap(), first.id);
    assert_eq!(
        client.get_resolution(&second.id).status,
        UmaStatus::Proposed
    );

    test.advance(300);
    let report = client.scheduler_tick();
    assert_eq!(report.auto_finalized.len(), 1);
    assert_eq!(report.auto_finalized.get(0).unwrap(), second.id);
    assert_eq!(client.get_market(&late).outcome, Some(0));
}

#[test]
fn test_tick_skips_disputed_until_voting_ends() {
    let test = ResolutionTest::setup();
    let client = test.client();
    client.start_scheduler(&test.admins[0]);

    let market = test.expired_market(symbol_short!("v1"), ResolutionPath::Optimistic);
    let resolution = client.uma_propose(&market, &1, &test.text("claim"), &test.admins[0]);
    test.advance(500);
    client.uma_dispute(&market, &Address::generate(&test.env), &test.text("wrong"));
    client.uma_cast_vote(&resolution.id, &test.admins[1], &0);

    // dispute window has passed but the resolution is now in voting
    test.advance(200);
    let report = client.scheduler_tick();
    assert_eq!(report.auto_finalized.len(), 0);
    assert_eq!(report.vote_finalized.len(), 0);

    test.advance(400);
    let report = client.scheduler_tick();
    assert_eq!(report.vote_finalized.len(), 1);
    assert_eq!(client.get_resolution(&resolution.id).final_outcome, Some(0));
}

#[test]
fn test_manual_finalize_wins_race_with_tick() {
    let test = ResolutionTest::setup();
    let client = test.client();
    client.start_scheduler(&test.admins[0]);

    let market = test.expired_market(symbol_short!("r1"), ResolutionPath::Optimistic);
    let resolution = client.uma_propose(&market, &1, &test.text("claim"), &test.admins[0]);
    test.advance(600);
    client.uma_auto_finalize(&resolution.id);

    // already locked, so it is no longer a candidate
    let report = client.scheduler_tick();
    assert_eq!(report.auto_finalized.len(), 0);
    assert_eq!(report.failures.len(), 0);
}

#[test]
fn test_item_failure_does_not_stop_the_pass() {
    let test = ResolutionTest::setup();
    let client = test.client();
    client.start_scheduler(&test.admins[0]);

    let broken = test.expired_market(symbol_short!("f1"), ResolutionPath::Optimistic);
    let bad = client.uma_propose(&broken, &1, &test.text("claim"), &test.admins[0]);
    let healthy = test.expired_market(symbol_short!("f2"), ResolutionPath::Optimistic);
    let good = client.uma_propose(&healthy, &0, &test.text("claim"), &test.admins[0]);

    // resolve the first market behind the oracle's back
    test.env.as_contract(&test.contract_id, || {
        crate::markets::MarketGateway::resolve(&test.env, &broken, 0, &test.text("manual"))
    })
    .unwrap();

    test.advance(600);
    let report = client.scheduler_tick();

    assert_eq!(report.failures.len(), 1);
    let failure = report.failures.get(0).unwrap();
    assert_eq!(failure.resolution_id, bad.id);
    assert_eq!(failure.error_code, Error::MarketAlreadyResolved as u32);
    assert_eq!(report.auto_finalized.len(), 1);
    assert_eq!(report.auto_finalized.get(0).unwrap(), good.id);

    // the failed item was left untouched
    assert_eq!(client.get_resolution(&bad.id).status, UmaStatus::Proposed);

    // and is not retried once its market is known to be settled
    test.advance(30);
    let report = client.scheduler_tick();
    assert_eq!(report.failures.len(), 0);
    assert_eq!(report.auto_finalized.len(), 0);
    assert_eq!(
        client.try_uma_dispute(&broken, &Address::generate(&test.env), &test.text("late")),
        Err(Ok(Error::MarketAlreadyResolved))
    );
}

#[test]
fn test_tick_stops_at_item_cap_and_resumes() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let mut config = client.get_config();
    config.max_items_per_tick = 2;
    client.update_config(&test.admins[0], &config);
    client.start_scheduler(&test.admins[0]);

    let mut ids = std::vec::Vec::new();
    for index in 0..5u32 {
        let market = Symbol::new(&test.env, &std::format!("cap{}", index));
        test.expired_market(market.clone(), ResolutionPath::Optimistic);
        let resolution = client.uma_propose(&market, &1, &test.text("claim"), &test.admins[0]);
        ids.push(resolution.id);
    }
    test.advance(600);

    let first = client.scheduler_tick();
    assert_eq!(first.auto_finalized.len(), 2);
    assert!(first.truncated);
    assert_eq!(first.auto_finalized.get(0).unwrap(), ids[0]);

    test.advance(30);
    let second = client.scheduler_tick();
    assert_eq!(second.auto_finalized.len(), 2);
    assert!(second.truncated);

    test.advance(30);
    let third = client.scheduler_tick();
    assert_eq!(third.auto_finalized.len(), 1);
    assert!(!third.truncated);
    assert_eq!(third.auto_finalized.get(0).unwrap(), ids[4]);

    for id in ids.iter() {
        assert_eq!(
            client.get_resolution(id).status,
            UmaStatus::ExpiredNoDispute
        );
    }
}

#[test]
fn test_tick_cap_spans_both_passes() {
    let test = ResolutionTest::setup();
    let client = test.client();
    let mut config = client.get_config();
    config.max_items_per_tick = 1;
    client.update_config(&test.admins[0], &config);
    client.start_scheduler(&test.admins[0]);

    let quiet = test.expired_market(symbol_short!("w1"), ResolutionPath::Optimistic);
    let undisputed = client.uma_propose(&quiet, &1, &test.text("claim"), &test.admins[0]);
    let loud = test.expired_market(symbol_short!("w2"), ResolutionPath::Optimistic);
    let contested = client.uma_propose(&loud, &1, &test.text("claim"), &test.admins[0]);
    client.uma_dispute(&loud, &Address::generate(&test.env), &test.text("wrong"));
    test.advance(600);

    let first = client.scheduler_tick();
    assert_eq!(first.auto_finalized.len(), 1);
    assert_eq!(first.vote_finalized.len(), 0);
    assert!(first.truncated);
    assert_eq!(client.get_resolution(&contested.id).status, UmaStatus::UmaVoting);

    test.advance(30);
    let second = client.scheduler_tick();
    assert_eq!(second.vote_finalized.len(), 1);
    assert!(!second.truncated);
    assert_eq!(
        client.get_resolution(&undisputed.id).status,
        UmaStatus::ExpiredNoDispute
    );
    assert_eq!(client.get_resolution(&contested.id).status, UmaStatus::UmaLocked);
}
