//! Inner transactions: payments and application calls issued by a
//! running handler on behalf of the application.

use avm_abi::{codec, AbiValue, MethodDescriptor, ReturnKind, RETURN_PREFIX};
use avm_types::error::{AbiError, DispatchError};
use avm_types::group::{Address, AppId, OnCompletion, TransactionGroup, TransactionRecord};

use crate::context::CallEnv;
use crate::dispatch::{run_invocation, CallRequest};
use crate::ledger::app_address;
use crate::state::{StateAccess, StateOverlay};

/// A built-but-unsubmitted inner transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerCall {
    record: TransactionRecord,
}

impl InnerCall {
    pub fn payment(sender: Address, receiver: Address, amount: u64) -> Self {
        Self {
            record: TransactionRecord::Payment {
                sender,
                receiver,
                amount,
            },
        }
    }

    pub fn record(&self) -> &TransactionRecord {
        &self.record
    }

    pub fn into_record(self) -> TransactionRecord {
        self.record
    }
}

impl CallEnv<'_> {
    /// Builds a payment from the application's own address.
    pub fn build_payment(&self, receiver: Address, amount: u64) -> InnerCall {
        InnerCall::payment(app_address(self.app_id()), receiver, amount)
    }

    /// Submits a built transaction, recording it in the invocation's
    /// inner-transaction list.
    pub fn submit(&mut self, call: InnerCall) -> TransactionRecord {
        let record = call.into_record();
        log::trace!("inner txn submitted at depth {}", self.depth());
        self.inner_transactions.push(record.clone());
        record
    }

    /// Submits an application call to another registered contract,
    /// synchronously executing it. The target sees the calling
    /// application's address as its sender, and any transactions in
    /// `attached` as its group (reference parameters bind from it).
    ///
    /// Returns the target's decoded return value, taken from its return
    /// log. The nested invocation runs against its own overlay: its
    /// writes merge into the caller's view only when it succeeds, and a
    /// failed callee leaves the caller's state untouched even if the
    /// caller handles the error and continues.
    pub fn submit_application_call(
        &mut self,
        target_app: AppId,
        descriptor: &MethodDescriptor,
        abi_args: &[AbiValue],
        attached: Vec<InnerCall>,
    ) -> Result<Option<AbiValue>, DispatchError> {
        let sender = app_address(self.app_id());
        let attached: Vec<TransactionRecord> =
            attached.into_iter().map(InnerCall::into_record).collect();

        let request = CallRequest::to_method(target_app, sender, descriptor, abi_args)?
            .with_group(TransactionGroup::new(attached.clone()))
            .with_action(OnCompletion::NoOp);

        let depth = self.depth();
        let (outcome, (inserts, deletes)) = {
            let mut child = StateOverlay::new(&*self.state);
            let outcome = run_invocation(
                self.contracts,
                self.config,
                &mut child,
                &request,
                depth + 1,
            )?;
            (outcome, child.into_ordered_batch())
        };
        self.state.batch_apply(&inserts, &deletes)?;

        let returned = decode_return(descriptor, &outcome.return_log)?;

        // Record the attached transactions, the call itself, then the
        // callee's own inner transactions, in execution order.
        self.inner_transactions.extend(attached);
        let mut args = vec![request.selector.to_vec()];
        args.extend(request.args.iter().cloned());
        self.inner_transactions.push(TransactionRecord::ApplicationCall {
            sender,
            app_id: target_app,
            args,
        });
        self.inner_transactions.extend(outcome.inner_transactions);

        Ok(returned)
    }
}

/// Recovers the typed return value from a callee's return log entry.
fn decode_return(
    descriptor: &MethodDescriptor,
    return_log: &Option<Vec<u8>>,
) -> Result<Option<AbiValue>, DispatchError> {
    match descriptor.returns() {
        ReturnKind::Void => Ok(None),
        ReturnKind::Abi(ty) => {
            let entry = return_log.as_ref().ok_or_else(|| {
                DispatchError::Abi(AbiError::Encoding(format!(
                    "method '{}' produced no return log",
                    descriptor.name()
                )))
            })?;
            let payload = entry.strip_prefix(&RETURN_PREFIX[..]).ok_or_else(|| {
                DispatchError::Abi(AbiError::Encoding(
                    "return log entry is missing the return prefix".to_string(),
                ))
            })?;
            Ok(Some(codec::decode(ty, payload)?))
        }
    }
}
