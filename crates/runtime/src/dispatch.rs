//! The call dispatcher: selector resolution, argument binding, handler
//! execution, and return-value encoding.

use std::collections::BTreeMap;

use avm_abi::{
    codec, AbiType, AbiValue, MethodDescriptor, ParamKind, ReturnKind, RETURN_PREFIX,
};
use avm_types::config::RuntimeConfig;
use avm_types::error::{AbiError, DispatchError};
use avm_types::group::{
    Address, AppId, OnCompletion, TransactionGroup, TransactionRecord,
};

use crate::context::{CallContext, CallEnv};
use crate::state::StateAccess;
use crate::table::Contract;

/// Argument slots beyond this are packed into a tuple in the final slot.
const MAX_ARG_SLOTS: usize = 15;

/// One bound argument as a handler sees it: a decoded ABI value, or a
/// transaction bound from the group for a reference parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Abi(AbiValue),
    Transaction(TransactionRecord),
}

impl Argument {
    pub fn abi(&self) -> Result<&AbiValue, DispatchError> {
        match self {
            Self::Abi(value) => Ok(value),
            Self::Transaction(_) => Err(DispatchError::Abi(AbiError::Encoding(
                "expected an ABI argument, found a transaction reference".to_string(),
            ))),
        }
    }

    pub fn transaction(&self) -> Result<&TransactionRecord, DispatchError> {
        match self {
            Self::Transaction(record) => Ok(record),
            Self::Abi(_) => Err(DispatchError::Abi(AbiError::Encoding(
                "expected a transaction reference, found an ABI argument".to_string(),
            ))),
        }
    }
}

/// An incoming application call, with arguments still in wire form.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub app_id: AppId,
    pub selector: [u8; 4],
    pub args: Vec<Vec<u8>>,
    pub group: TransactionGroup,
    pub sender: Address,
    pub on_completion: OnCompletion,
}

impl CallRequest {
    /// Builds a request for a method, encoding the ABI arguments into
    /// slots. With more than fifteen parameters, the first fourteen get a
    /// slot each and the remainder are packed into a tuple in the last.
    pub fn to_method(
        app_id: AppId,
        sender: Address,
        descriptor: &MethodDescriptor,
        abi_args: &[AbiValue],
    ) -> Result<Self, AbiError> {
        let abi_types: Vec<&AbiType> = descriptor
            .params()
            .iter()
            .filter_map(|p| match p {
                ParamKind::Abi(ty) => Some(ty),
                ParamKind::Reference(_) => None,
            })
            .collect();
        if abi_types.len() != abi_args.len() {
            return Err(AbiError::Encoding(format!(
                "method '{}' takes {} ABI arguments, got {}",
                descriptor.name(),
                abi_types.len(),
                abi_args.len()
            )));
        }

        let mut args = Vec::new();
        if abi_args.len() <= MAX_ARG_SLOTS {
            for (ty, value) in abi_types.iter().zip(abi_args) {
                args.push(codec::encode(ty, value)?);
            }
        } else {
            for (ty, value) in abi_types.iter().zip(abi_args).take(MAX_ARG_SLOTS - 1) {
                args.push(codec::encode(ty, value)?);
            }
            let packed_ty = AbiType::Tuple(
                abi_types[MAX_ARG_SLOTS - 1..]
                    .iter()
                    .map(|ty| (*ty).clone())
                    .collect(),
            );
            let packed = AbiValue::Tuple(abi_args[MAX_ARG_SLOTS - 1..].to_vec());
            args.push(codec::encode(&packed_ty, &packed)?);
        }

        Ok(Self {
            app_id,
            selector: descriptor.selector(),
            args,
            group: TransactionGroup::new(Vec::new()),
            sender,
            on_completion: OnCompletion::NoOp,
        })
    }

    pub fn with_group(mut self, group: TransactionGroup) -> Self {
        self.group = group;
        self
    }

    pub fn with_action(mut self, action: OnCompletion) -> Self {
        self.on_completion = action;
        self
    }
}

/// What a successful invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    /// The decoded return value, `None` for void methods.
    pub return_value: Option<AbiValue>,
    /// The return log entry: the return prefix followed by the encoded
    /// value. Absent for void methods.
    pub return_log: Option<Vec<u8>>,
    /// Every inner transaction issued, in submission order, inner calls'
    /// own transactions included.
    pub inner_transactions: Vec<TransactionRecord>,
}

/// The phases an invocation moves through, in order. Tracked for logging;
/// there is no way to skip or revisit a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingCall,
    ArgumentsBound,
    Executing,
    ReturnEncoded,
    Complete,
}

fn enter(phase: Phase, selector: [u8; 4], depth: u8) {
    log::trace!(
        "dispatch phase={phase:?} selector=0x{} depth={depth}",
        hex::encode(selector)
    );
}

/// Runs one invocation against the given state view. The caller owns the
/// overlay and commit decision; this only mutates the view it is handed.
pub(crate) fn run_invocation(
    contracts: &BTreeMap<AppId, Contract>,
    config: &RuntimeConfig,
    state: &mut dyn StateAccess,
    request: &CallRequest,
    depth: u8,
) -> Result<InvocationOutcome, DispatchError> {
    if depth > config.max_inner_call_depth {
        return Err(DispatchError::DepthExceeded(config.max_inner_call_depth));
    }
    enter(Phase::AwaitingCall, request.selector, depth);

    let contract = contracts
        .get(&request.app_id)
        .ok_or(DispatchError::UnknownApplication(request.app_id))?;
    let descriptor = contract.table().resolve(request.selector)?;

    if !descriptor.allowed_actions().contains(&request.on_completion) {
        return Err(DispatchError::ActionNotAllowed {
            actual: request.on_completion,
            allowed: descriptor.allowed_actions().to_vec(),
        });
    }

    let arguments = bind_arguments(descriptor, request)?;
    enter(Phase::ArgumentsBound, request.selector, depth);

    let mut env = CallEnv {
        contracts,
        config,
        state,
        ctx: CallContext {
            sender: request.sender,
            app_id: request.app_id,
            on_completion: request.on_completion,
            group: request.group.clone(),
            depth,
        },
        inner_transactions: Vec::new(),
    };

    // An opt-in call records the marker before the handler runs, so the
    // handler can already write the caller's local state.
    if request.on_completion == OnCompletion::OptIn {
        let sender = env.ctx.sender;
        env.opt_in(&sender)?;
    }

    enter(Phase::Executing, request.selector, depth);
    let handler = contract
        .handler(request.selector)
        .ok_or(DispatchError::UnknownMethod(request.selector))?;
    let returned = handler(&mut env, &arguments)?;
    let inner_transactions = env.inner_transactions;

    let (return_value, return_log) = encode_return(descriptor, returned)?;
    enter(Phase::ReturnEncoded, request.selector, depth);

    log::debug!(
        "dispatched 0x{} on app {} ({} inner txns)",
        hex::encode(request.selector),
        request.app_id,
        inner_transactions.len()
    );
    enter(Phase::Complete, request.selector, depth);

    Ok(InvocationOutcome {
        return_value,
        return_log,
        inner_transactions,
    })
}

/// Decodes the wire argument slots and binds reference parameters from
/// the transaction group, producing one `Argument` per declared parameter.
fn bind_arguments(
    descriptor: &MethodDescriptor,
    request: &CallRequest,
) -> Result<Vec<Argument>, DispatchError> {
    let abi_count = descriptor.abi_param_count();
    let expected_slots = abi_count.min(MAX_ARG_SLOTS);
    if request.args.len() != expected_slots {
        return Err(DispatchError::Abi(AbiError::Encoding(format!(
            "method '{}' expects {} argument slots, got {}",
            descriptor.name(),
            expected_slots,
            request.args.len()
        ))));
    }

    let abi_types: Vec<&AbiType> = descriptor
        .params()
        .iter()
        .filter_map(|p| match p {
            ParamKind::Abi(ty) => Some(ty),
            ParamKind::Reference(_) => None,
        })
        .collect();

    // Decode each slot; the packed last slot expands back into the
    // individual trailing values.
    let mut abi_values: Vec<AbiValue> = Vec::with_capacity(abi_count);
    if abi_count <= MAX_ARG_SLOTS {
        for (ty, bytes) in abi_types.iter().zip(&request.args) {
            abi_values.push(codec::decode(ty, bytes)?);
        }
    } else {
        for (ty, bytes) in abi_types.iter().zip(&request.args).take(MAX_ARG_SLOTS - 1) {
            abi_values.push(codec::decode(ty, bytes)?);
        }
        let packed_ty = AbiType::Tuple(
            abi_types[MAX_ARG_SLOTS - 1..]
                .iter()
                .map(|ty| (*ty).clone())
                .collect(),
        );
        let packed = codec::decode(&packed_ty, &request.args[MAX_ARG_SLOTS - 1])?;
        match packed {
            AbiValue::Tuple(values) => abi_values.extend(values),
            _ => {
                return Err(DispatchError::Abi(AbiError::Encoding(
                    "packed argument slot did not decode to a tuple".to_string(),
                )))
            }
        }
    }

    // Walk the declaration order, interleaving decoded values with
    // transactions taken from the group front to back.
    let mut values = abi_values.into_iter();
    let mut group_cursor = 0usize;
    let mut arguments = Vec::with_capacity(descriptor.params().len());
    for (position, param) in descriptor.params().iter().enumerate() {
        match param {
            ParamKind::Abi(_) => {
                // Counts were validated above, so a value is always here.
                if let Some(value) = values.next() {
                    arguments.push(Argument::Abi(value));
                }
            }
            ParamKind::Reference(kind) => {
                let record = request.group.get(group_cursor).ok_or(
                    DispatchError::ReferenceMismatch {
                        position,
                        expected: kind.token(),
                        found: None,
                    },
                )?;
                if !kind.matches(record.kind()) {
                    return Err(DispatchError::ReferenceMismatch {
                        position,
                        expected: kind.token(),
                        found: Some(record.kind()),
                    });
                }
                arguments.push(Argument::Transaction(record.clone()));
                group_cursor += 1;
            }
        }
    }
    Ok(arguments)
}

/// Checks the handler's return against the declared kind and encodes the
/// return log entry.
fn encode_return(
    descriptor: &MethodDescriptor,
    returned: Option<AbiValue>,
) -> Result<(Option<AbiValue>, Option<Vec<u8>>), DispatchError> {
    match (descriptor.returns(), returned) {
        (ReturnKind::Void, None) => Ok((None, None)),
        (ReturnKind::Void, Some(_)) => Err(DispatchError::Abi(AbiError::Encoding(format!(
            "void method '{}' returned a value",
            descriptor.name()
        )))),
        (ReturnKind::Abi(_), None) => Err(DispatchError::Abi(AbiError::Encoding(format!(
            "method '{}' returned nothing",
            descriptor.name()
        )))),
        (ReturnKind::Abi(ty), Some(value)) => {
            let encoded = codec::encode(ty, &value)?;
            let mut entry = RETURN_PREFIX.to_vec();
            entry.extend_from_slice(&encoded);
            Ok((Some(value), Some(entry)))
        }
    }
}
