//! State semantics through the dispatcher: cell scoping, opt-in gating,
//! and committed reads.

mod common;

use avm_abi::{AbiValue, MethodDescriptor};
use avm_types::config::RuntimeConfig;
use avm_types::error::{DispatchError, StateError};

use avm_runtime::{CallRequest, Ledger};

use common::{account, counter, COUNTER, COUNTER_APP, GREETING, SCORE};

fn ledger() -> Ledger {
    let mut ledger = Ledger::new(RuntimeConfig::default());
    ledger.register_contract(COUNTER_APP, counter());
    ledger
}

#[test]
fn global_writes_persist_across_dispatches() {
    let mut ledger = ledger();
    let increment = MethodDescriptor::from_signature("increment()uint64").unwrap();

    for expected in 1..=3u128 {
        let request =
            CallRequest::to_method(COUNTER_APP, account(1), &increment, &[]).unwrap();
        let outcome = ledger.dispatch(&request).unwrap();
        assert_eq!(outcome.return_value, Some(AbiValue::Uint(expected)));
    }
    assert_eq!(ledger.read_global(COUNTER_APP, &COUNTER).unwrap(), 3);
}

#[test]
fn string_cells_round_trip_through_a_void_method() {
    let mut ledger = ledger();
    let set_greeting = MethodDescriptor::from_signature("set_greeting(string)void").unwrap();
    let request = CallRequest::to_method(
        COUNTER_APP,
        account(1),
        &set_greeting,
        &[AbiValue::String("hello".to_string())],
    )
    .unwrap();

    let outcome = ledger.dispatch(&request).unwrap();
    assert_eq!(outcome.return_log, None);
    assert_eq!(
        ledger.read_global(COUNTER_APP, &GREETING).unwrap(),
        "hello"
    );
}

#[test]
fn local_state_is_gated_on_opt_in() {
    let mut ledger = ledger();
    let set_score = MethodDescriptor::from_signature("set_score(uint64)uint64").unwrap();
    let alice = account(5);

    let request =
        CallRequest::to_method(COUNTER_APP, alice, &set_score, &[AbiValue::Uint(9)]).unwrap();
    assert!(matches!(
        ledger.dispatch(&request),
        Err(DispatchError::State(StateError::NotOptedIn(_)))
    ));

    ledger.opt_in(COUNTER_APP, &alice).unwrap();
    let outcome = ledger.dispatch(&request).unwrap();
    assert_eq!(outcome.return_value, Some(AbiValue::Uint(9)));
    assert_eq!(ledger.read_local(COUNTER_APP, &SCORE, &alice).unwrap(), 9);
}

#[test]
fn local_cells_are_scoped_per_account() {
    let mut ledger = ledger();
    let set_score = MethodDescriptor::from_signature("set_score(uint64)uint64").unwrap();
    let get_score = MethodDescriptor::from_signature("get_score()uint64").unwrap();
    let alice = account(5);
    let bob = account(6);
    ledger.opt_in(COUNTER_APP, &alice).unwrap();
    ledger.opt_in(COUNTER_APP, &bob).unwrap();

    let request =
        CallRequest::to_method(COUNTER_APP, alice, &set_score, &[AbiValue::Uint(7)]).unwrap();
    ledger.dispatch(&request).unwrap();

    // Bob reads his own cell, which is still at its zero value.
    let request = CallRequest::to_method(COUNTER_APP, bob, &get_score, &[]).unwrap();
    assert_eq!(
        ledger.dispatch(&request).unwrap().return_value,
        Some(AbiValue::Uint(0))
    );

    let request = CallRequest::to_method(COUNTER_APP, alice, &get_score, &[]).unwrap();
    assert_eq!(
        ledger.dispatch(&request).unwrap().return_value,
        Some(AbiValue::Uint(7))
    );
}

#[test]
fn failed_dispatch_leaves_prior_commits_intact() {
    let mut ledger = ledger();
    let set_greeting = MethodDescriptor::from_signature("set_greeting(string)void").unwrap();
    let request = CallRequest::to_method(
        COUNTER_APP,
        account(1),
        &set_greeting,
        &[AbiValue::String("kept".to_string())],
    )
    .unwrap();
    ledger.dispatch(&request).unwrap();

    let bump_then_fail = MethodDescriptor::from_signature("bump_then_fail()void").unwrap();
    let request =
        CallRequest::to_method(COUNTER_APP, account(1), &bump_then_fail, &[]).unwrap();
    assert!(ledger.dispatch(&request).is_err());

    assert_eq!(ledger.read_global(COUNTER_APP, &GREETING).unwrap(), "kept");
    assert_eq!(ledger.read_global(COUNTER_APP, &COUNTER).unwrap(), 0);
}
