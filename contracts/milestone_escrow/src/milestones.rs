//! # Milestone table
//!
//! Fixed-length, zero-based list of [`Milestone`] records. Lengths and amounts
//! are settled by [`committed_total`] at construction; afterwards only the
//! status of an entry changes.
//!
//! The largest supported committed total is `i128::MAX`. A list whose sum
//! would exceed it is rejected with `AmountOverflow` instead of wrapping.

use soroban_sdk::Vec;

use crate::storage::EscrowStore;
use crate::types::Milestone;
use crate::EscrowError;

/// Validate the caller-supplied amounts and return their sum.
///
/// Rejects an empty list and any amount that is not strictly positive.
pub fn committed_total(amounts: &Vec<i128>) -> Result<i128, EscrowError> {
    if amounts.is_empty() {
        return Err(EscrowError::InvalidMilestones);
    }

    let mut total: i128 = 0;
    for amount in amounts.iter() {
        if amount <= 0 {
            return Err(EscrowError::InvalidMilestones);
        }
        total = total
            .checked_add(amount)
            .ok_or(EscrowError::AmountOverflow)?;
    }
    Ok(total)
}

/// Number of milestones in the table.
pub fn count<S: EscrowStore>(store: &S) -> Result<u32, EscrowError> {
    Ok(store.config()?.milestone_count)
}

/// Look up a milestone by zero-based index.
pub fn get<S: EscrowStore>(store: &S, index: u32) -> Result<Milestone, EscrowError> {
    if index >= count(store)? {
        return Err(EscrowError::InvalidMilestone);
    }
    store.milestone(index).ok_or(EscrowError::InvalidMilestone)
}

/// Sum of the amounts still in `Pending` status.
pub fn pending_total<S: EscrowStore>(store: &S) -> Result<i128, EscrowError> {
    let mut total: i128 = 0;
    for index in 0..count(store)? {
        let milestone = get(store, index)?;
        if milestone.is_pending() {
            total = total
                .checked_add(milestone.amount)
                .ok_or(EscrowError::AmountOverflow)?;
        }
    }
    Ok(total)
}
