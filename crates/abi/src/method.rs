//! Method descriptors, signatures and selectors.

use crate::abi_type::AbiType;
use avm_types::error::AbiError;
use avm_types::group::{OnCompletion, TransactionKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

/// The 4-byte prefix of a return-value log entry: the first four bytes of
/// the SHA-512/256 hash of the string `"return"`.
pub const RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

/// The kind of transaction a reference parameter binds from the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Payment,
    AssetTransfer,
    ApplicationCall,
    /// Any transaction kind.
    Any,
}

impl ReferenceKind {
    /// The token used for this kind in signature strings.
    pub fn token(self) -> &'static str {
        match self {
            Self::Payment => "pay",
            Self::AssetTransfer => "axfer",
            Self::ApplicationCall => "appl",
            Self::Any => "txn",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "pay" => Some(Self::Payment),
            "axfer" => Some(Self::AssetTransfer),
            "appl" => Some(Self::ApplicationCall),
            "txn" => Some(Self::Any),
            _ => None,
        }
    }

    /// Whether a group record of `kind` satisfies this reference.
    pub fn matches(self, kind: TransactionKind) -> bool {
        match self {
            Self::Payment => kind == TransactionKind::Payment,
            Self::AssetTransfer => kind == TransactionKind::AssetTransfer,
            Self::ApplicationCall => kind == TransactionKind::ApplicationCall,
            Self::Any => true,
        }
    }
}

/// One declared parameter: either ABI-encoded in the argument slots, or a
/// reference bound from the transaction group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Abi(AbiType),
    Reference(ReferenceKind),
}

/// The declared return of a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    Void,
    Abi(AbiType),
}

/// A registered method: name, ordered parameter kinds, return kind, and
/// the on-completion actions it accepts.
///
/// The signature string (`name(pay,uint64)uint64`) losslessly determines
/// the parameter and return kinds; the selector is the first four bytes of
/// the SHA-512/256 hash of that string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<ParamKind>,
    returns: ReturnKind,
    allowed_actions: Vec<OnCompletion>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, params: Vec<ParamKind>, returns: ReturnKind) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            allowed_actions: vec![OnCompletion::NoOp],
        }
    }

    /// Restricts the method to the given on-completion actions.
    pub fn allow_actions(mut self, actions: &[OnCompletion]) -> Self {
        self.allowed_actions = actions.to_vec();
        self
    }

    /// Parses a full `name(args)return` signature.
    pub fn from_signature(signature: &str) -> Result<Self, AbiError> {
        let open = signature
            .find('(')
            .ok_or_else(|| AbiError::Encoding(format!("no '(' in signature '{signature}'")))?;
        // The ')' matching the first '(': the return type may itself be a
        // tuple, so scanning from the end would find the wrong paren.
        let mut depth = 0usize;
        let mut close = None;
        for (idx, c) in signature[open..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + idx);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close
            .ok_or_else(|| AbiError::Encoding(format!("no ')' in signature '{signature}'")))?;
        let name = &signature[..open];
        if name.is_empty() {
            return Err(AbiError::Encoding(format!(
                "empty method name in '{signature}'"
            )));
        }

        let args = &signature[open + 1..close];
        let mut params = Vec::new();
        if !args.is_empty() {
            for token in split_top_level(args) {
                let token = token.trim();
                params.push(match ReferenceKind::from_token(token) {
                    Some(kind) => ParamKind::Reference(kind),
                    None => ParamKind::Abi(AbiType::parse(token)?),
                });
            }
        }

        let ret = &signature[close + 1..];
        let returns = if ret == "void" {
            ReturnKind::Void
        } else {
            ReturnKind::Abi(AbiType::parse(ret)?)
        };
        Ok(Self::new(name, params, returns))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn returns(&self) -> &ReturnKind {
        &self.returns
    }

    pub fn allowed_actions(&self) -> &[OnCompletion] {
        &self.allowed_actions
    }

    /// The number of ABI-encoded (non-reference) parameters.
    pub fn abi_param_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| matches!(p, ParamKind::Abi(_)))
            .count()
    }

    /// The canonical signature string.
    pub fn signature(&self) -> String {
        let mut out = String::from(&self.name);
        out.push('(');
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match param {
                ParamKind::Abi(ty) => out.push_str(&ty.to_string()),
                ParamKind::Reference(kind) => out.push_str(kind.token()),
            }
        }
        out.push(')');
        match &self.returns {
            ReturnKind::Void => out.push_str("void"),
            ReturnKind::Abi(ty) => out.push_str(&ty.to_string()),
        }
        out
    }

    /// The first four bytes of the SHA-512/256 hash of the signature.
    pub fn selector(&self) -> [u8; 4] {
        let digest = Sha512_256::digest(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }
}

/// Splits a comma-separated list, ignoring commas nested in parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_prefix_is_sha512_256_of_return() {
        let digest = Sha512_256::digest(b"return");
        assert_eq!(&digest[..4], RETURN_PREFIX);
    }

    #[test]
    fn signature_round_trips_through_parsing() {
        for sig in [
            "add(uint64,uint64)uint64",
            "echo_bytes(byte[])byte[]",
            "echo_boolean(bool)bool",
            "nest_array_and_tuple(uint64[][],(uint64[],string))void",
            "start_auction(uint64,uint64,axfer)void",
            "get_pay_txn_amount(pay)uint64",
            "no_args()void",
            "pair()(uint64,bool)",
        ] {
            let descriptor = MethodDescriptor::from_signature(sig).unwrap();
            assert_eq!(descriptor.signature(), sig, "{sig}");
        }
    }

    #[test]
    fn reference_tokens_parse_as_references() {
        let descriptor =
            MethodDescriptor::from_signature("start_auction(uint64,uint64,axfer)void").unwrap();
        assert_eq!(descriptor.params().len(), 3);
        assert_eq!(descriptor.abi_param_count(), 2);
        assert_eq!(
            descriptor.params()[2],
            ParamKind::Reference(ReferenceKind::AssetTransfer)
        );
    }

    #[test]
    fn selectors_are_deterministic_and_distinct() {
        let add = MethodDescriptor::from_signature("add(uint64,uint64)uint64").unwrap();
        assert_eq!(add.selector(), add.selector());
        assert_eq!(add.selector().len(), 4);

        let echo = MethodDescriptor::from_signature("echo_bytes(byte[])byte[]").unwrap();
        assert_ne!(add.selector(), echo.selector());

        // Same argument list, different name: different selector.
        let add2 = MethodDescriptor::from_signature("add2(uint64,uint64)uint64").unwrap();
        assert_ne!(add.selector(), add2.selector());
    }

    #[test]
    fn reference_kind_matching() {
        assert!(ReferenceKind::Payment.matches(TransactionKind::Payment));
        assert!(!ReferenceKind::Payment.matches(TransactionKind::AssetTransfer));
        assert!(ReferenceKind::Any.matches(TransactionKind::ApplicationCall));
    }

    #[test]
    fn default_allows_noop_only() {
        let descriptor = MethodDescriptor::from_signature("opt_in()void").unwrap();
        assert_eq!(descriptor.allowed_actions(), &[OnCompletion::NoOp]);
        let descriptor = descriptor.allow_actions(&[OnCompletion::OptIn]);
        assert_eq!(descriptor.allowed_actions(), &[OnCompletion::OptIn]);
    }

    #[test]
    fn descriptors_round_trip_through_json() {
        let descriptor = MethodDescriptor::from_signature("add(uint64,uint64)uint64").unwrap();
        let json = serde_json::to_string(&descriptor).unwrap();
        let back: MethodDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(descriptor, back);
        assert_eq!(descriptor.selector(), back.selector());
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        for bad in ["add", "add(uint64", "(uint64)void", "add()unknown"] {
            assert!(MethodDescriptor::from_signature(bad).is_err(), "{bad}");
        }
    }
}
