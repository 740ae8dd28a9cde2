//! Shared fixture contracts for the integration tests.
#![allow(dead_code)]

use avm_abi::{AbiValue, MethodDescriptor};
use avm_types::error::{AbiError, DispatchError, StateError};
use avm_types::group::{Address, OnCompletion};

use avm_runtime::state::{GlobalStateCell, LocalStateCell};
use avm_runtime::{Argument, Contract};

pub const COUNTER: GlobalStateCell<u64> = GlobalStateCell::new("counter");
pub const GREETING: GlobalStateCell<String> = GlobalStateCell::new("greeting");
pub const SCORE: LocalStateCell<u64> = LocalStateCell::new("score");

pub const CALCULATOR_APP: u64 = 10;
pub const COUNTER_APP: u64 = 20;
pub const VAULT_APP: u64 = 30;

pub fn account(byte: u8) -> Address {
    Address([byte; 32])
}

fn uint_arg(args: &[Argument], index: usize) -> Result<u128, DispatchError> {
    args[index].abi()?.as_uint().ok_or_else(|| {
        DispatchError::Abi(AbiError::Encoding(format!(
            "argument {index} is not a uint"
        )))
    })
}

fn u64_arg(args: &[Argument], index: usize) -> Result<u64, DispatchError> {
    u64::try_from(uint_arg(args, index)?).map_err(|_| {
        DispatchError::Abi(AbiError::Encoding(format!(
            "argument {index} does not fit in a u64"
        )))
    })
}

/// Pure methods over ABI values: arithmetic, echoes of each composite
/// shape, and a seventeen-parameter method exercising slot packing.
pub fn calculator() -> Contract {
    let sum17 = format!("sum17({})uint64", vec!["uint64"; 17].join(","));
    Contract::new()
        .method(
            MethodDescriptor::from_signature("add(uint64,uint64)uint64").unwrap(),
            Box::new(|_, args| {
                let sum = uint_arg(args, 0)? + uint_arg(args, 1)?;
                Ok(Some(AbiValue::Uint(sum)))
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("echo_bytes(byte[])byte[]").unwrap(),
            Box::new(|_, args| Ok(Some(args[0].abi()?.clone()))),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("echo_boolean(bool)bool").unwrap(),
            Box::new(|_, args| Ok(Some(args[0].abi()?.clone()))),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature(
                "echo_nested((uint64[][],(uint64[],string)))(uint64[][],(uint64[],string))",
            )
            .unwrap(),
            Box::new(|_, args| Ok(Some(args[0].abi()?.clone()))),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature(&sum17).unwrap(),
            Box::new(|_, args| {
                let mut sum = 0u128;
                for i in 0..17 {
                    sum += uint_arg(args, i)?;
                }
                Ok(Some(AbiValue::Uint(sum)))
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("report_payment(pay)uint64").unwrap(),
            Box::new(|_, args| {
                let record = args[0].transaction()?;
                match record {
                    avm_types::group::TransactionRecord::Payment { amount, .. } => {
                        Ok(Some(AbiValue::Uint(u128::from(*amount))))
                    }
                    _ => Err(DispatchError::Abi(AbiError::Encoding(
                        "bound reference is not a payment".to_string(),
                    ))),
                }
            }),
        )
        .unwrap()
}

/// Stateful methods: a global counter, per-account scores behind an
/// opt-in gate, and a method that writes then fails to prove rollback.
pub fn counter() -> Contract {
    Contract::new()
        .method(
            MethodDescriptor::from_signature("increment()uint64").unwrap(),
            Box::new(|env, _| {
                let next = env.global_get(&COUNTER)? + 1;
                env.global_set(&COUNTER, &next)?;
                Ok(Some(AbiValue::Uint(u128::from(next))))
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("set_greeting(string)void").unwrap(),
            Box::new(|env, args| {
                let greeting = args[0].abi()?.as_str().ok_or_else(|| {
                    DispatchError::Abi(AbiError::Encoding("argument 0 is not a string".to_string()))
                })?;
                env.global_set(&GREETING, &greeting.to_string())?;
                Ok(None)
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("register()void")
                .unwrap()
                .allow_actions(&[OnCompletion::OptIn]),
            Box::new(|env, _| {
                let sender = *env.sender();
                env.local_set(&SCORE, &sender, &0)?;
                Ok(None)
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("set_score(uint64)uint64").unwrap(),
            Box::new(|env, args| {
                let score = u64_arg(args, 0)?;
                let sender = *env.sender();
                env.local_set(&SCORE, &sender, &score)?;
                Ok(Some(AbiValue::Uint(u128::from(score))))
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("get_score()uint64").unwrap(),
            Box::new(|env, _| {
                let sender = *env.sender();
                let score = env.local_get(&SCORE, &sender)?;
                Ok(Some(AbiValue::Uint(u128::from(score))))
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("bump_then_fail()void").unwrap(),
            Box::new(|env, _| {
                let next = env.global_get(&COUNTER)? + 1;
                env.global_set(&COUNTER, &next)?;
                Err(DispatchError::State(StateError::Backend(
                    "induced failure".to_string(),
                )))
            }),
        )
        .unwrap()
}

/// A contract that exercises inner transactions: payments from the app
/// address, calls into the calculator, and unbounded self-recursion.
pub fn vault() -> Contract {
    Contract::new()
        .method(
            MethodDescriptor::from_signature("pay_out(uint64)void").unwrap(),
            Box::new(|env, args| {
                let amount = u64_arg(args, 0)?;
                let payment = env.build_payment(account(9), amount);
                env.submit(payment);
                Ok(None)
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("delegated_add(uint64,uint64)uint64").unwrap(),
            Box::new(|env, args| {
                let a = args[0].abi()?.clone();
                let b = args[1].abi()?.clone();
                let add = MethodDescriptor::from_signature("add(uint64,uint64)uint64").unwrap();
                let result =
                    env.submit_application_call(CALCULATOR_APP, &add, &[a, b], Vec::new())?;
                Ok(result)
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("delegated_increment()uint64").unwrap(),
            Box::new(|env, _| {
                let increment = MethodDescriptor::from_signature("increment()uint64").unwrap();
                env.submit_application_call(COUNTER_APP, &increment, &[], Vec::new())
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("increment_then_fail()void").unwrap(),
            Box::new(|env, _| {
                let increment = MethodDescriptor::from_signature("increment()uint64").unwrap();
                env.submit_application_call(COUNTER_APP, &increment, &[], Vec::new())?;
                Err(DispatchError::State(StateError::Backend(
                    "induced failure".to_string(),
                )))
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("funded_report(uint64)uint64").unwrap(),
            Box::new(|env, args| {
                let amount = u64_arg(args, 0)?;
                let payment = env.build_payment(account(9), amount);
                let report =
                    MethodDescriptor::from_signature("report_payment(pay)uint64").unwrap();
                env.submit_application_call(CALCULATOR_APP, &report, &[], vec![payment])
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("absorb_failure()uint64").unwrap(),
            Box::new(|env, _| {
                // Tolerates the callee's failure and completes anyway.
                let bump = MethodDescriptor::from_signature("bump_then_fail()void").unwrap();
                match env.submit_application_call(COUNTER_APP, &bump, &[], Vec::new()) {
                    Ok(_) => Ok(Some(AbiValue::Uint(1))),
                    Err(_) => Ok(Some(AbiValue::Uint(0))),
                }
            }),
        )
        .unwrap()
        .method(
            MethodDescriptor::from_signature("recurse()uint64").unwrap(),
            Box::new(|env, _| {
                let recurse = MethodDescriptor::from_signature("recurse()uint64").unwrap();
                env.submit_application_call(VAULT_APP, &recurse, &[], Vec::new())
            }),
        )
        .unwrap()
}
