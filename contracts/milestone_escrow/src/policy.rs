//! # Access policy
//!
//! Decides which party may invoke each state-changing operation. The caller's
//! identity is always passed in explicitly; signature checks
//! (`require_auth`) happen at the contract entry points before the policy runs.
//!
//! | Operation | Allowed caller |
//! |-----------|----------------|
//! | `fund`    | funder         |
//! | `release` | funder         |
//!
//! Every query is an unauthenticated read and never consults this module.

use soroban_sdk::Address;

use crate::types::EscrowConfig;
use crate::EscrowError;

/// State-changing operations guarded by the policy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Fund,
    Release,
}

/// Fail with `Unauthorized` unless `caller` may perform `op`.
pub fn authorize(config: &EscrowConfig, op: Operation, caller: &Address) -> Result<(), EscrowError> {
    let allowed = match op {
        Operation::Fund | Operation::Release => *caller == config.funder,
    };

    if allowed {
        Ok(())
    } else {
        Err(EscrowError::Unauthorized)
    }
}
