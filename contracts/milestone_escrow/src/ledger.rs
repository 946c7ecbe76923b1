//! # Escrow ledger
//!
//! The only code that mutates escrow state. [`EscrowLedger`] combines a
//! backing [`EscrowStore`] with a [`PaymentAsset`] and implements the two
//! transitions, `fund` and `release`.
//!
//! Both transitions follow the same shape: check the policy and
//! preconditions, write the new state, then move tokens. If the token
//! movement fails the written state is restored and `TransferFailed` is
//! returned, so a call either commits everything or nothing. Because state is
//! written before the outbound transfer, a re-entrant `release` of the same
//! index sees `Released` and fails with `AlreadyReleased`.

use soroban_sdk::{token, Address, Env};

use crate::milestones;
use crate::policy::{self, Operation};
use crate::storage::EscrowStore;
use crate::types::{EscrowState, Milestone, MilestoneStatus};
use crate::EscrowError;

/// External asset ledger the escrow custodies funds in.
pub trait PaymentAsset {
    fn balance(&self, owner: &Address) -> i128;
    /// Move `amount` from `from` into custody. `from` must have authorized it.
    fn pull(&self, from: &Address, amount: i128) -> Result<(), EscrowError>;
    /// Move `amount` out of custody to `to`.
    fn push(&self, to: &Address, amount: i128) -> Result<(), EscrowError>;
}

/// [`PaymentAsset`] backed by a Soroban token contract, with the executing
/// contract as custodian.
pub struct TokenAsset {
    env: Env,
    token: Address,
    custody: Address,
}

impl TokenAsset {
    pub fn new(env: &Env, token: &Address) -> Self {
        TokenAsset {
            env: env.clone(),
            token: token.clone(),
            custody: env.current_contract_address(),
        }
    }

    fn client(&self) -> token::Client<'_> {
        token::Client::new(&self.env, &self.token)
    }
}

impl PaymentAsset for TokenAsset {
    fn balance(&self, owner: &Address) -> i128 {
        self.client().balance(owner)
    }

    fn pull(&self, from: &Address, amount: i128) -> Result<(), EscrowError> {
        match self.client().try_transfer(from, &self.custody, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(EscrowError::TransferFailed),
        }
    }

    fn push(&self, to: &Address, amount: i128) -> Result<(), EscrowError> {
        match self.client().try_transfer(&self.custody, to, &amount) {
            Ok(Ok(())) => Ok(()),
            _ => Err(EscrowError::TransferFailed),
        }
    }
}

/// Outcome of a successful release.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payout {
    pub amount: i128,
    /// Custodied balance left after the payout.
    pub remaining: i128,
}

pub struct EscrowLedger<S, A> {
    store: S,
    asset: A,
}

impl<S: EscrowStore, A: PaymentAsset> EscrowLedger<S, A> {
    pub fn new(store: S, asset: A) -> Self {
        EscrowLedger { store, asset }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pull the full committed total from the funder into custody.
    ///
    /// Single-shot: a second call fails with `AlreadyFunded`.
    /// Returns the amount deposited.
    pub fn fund(&mut self, caller: &Address) -> Result<i128, EscrowError> {
        let config = self.store.config()?;
        policy::authorize(&config, Operation::Fund, caller)?;

        let before = self.store.state();
        if before.funded {
            return Err(EscrowError::AlreadyFunded);
        }
        if self.asset.balance(caller) < config.total_committed {
            return Err(EscrowError::InsufficientFunds);
        }

        self.store.set_state(&EscrowState {
            funded: true,
            balance: config.total_committed,
            released_count: before.released_count,
        });

        if let Err(err) = self.asset.pull(caller, config.total_committed) {
            self.store.set_state(&before);
            return Err(err);
        }

        Ok(config.total_committed)
    }

    /// Release milestone `index` (zero-based) and pay its amount to the
    /// freelancer.
    pub fn release(&mut self, caller: &Address, index: u32) -> Result<Payout, EscrowError> {
        let config = self.store.config()?;
        policy::authorize(&config, Operation::Release, caller)?;

        let before = self.store.state();
        if !before.funded {
            return Err(EscrowError::NotFunded);
        }

        let milestone = milestones::get(&self.store, index)?;
        if !milestone.is_pending() {
            return Err(EscrowError::AlreadyReleased);
        }

        let after = EscrowState {
            funded: true,
            balance: before.balance - milestone.amount,
            released_count: before.released_count + 1,
        };

        // Commit before paying out.
        self.store.set_milestone(
            index,
            &Milestone {
                amount: milestone.amount,
                status: MilestoneStatus::Released,
            },
        );
        self.store.set_state(&after);

        if let Err(err) = self.asset.push(&config.freelancer, milestone.amount) {
            self.store.set_milestone(index, &milestone);
            self.store.set_state(&before);
            return Err(err);
        }

        Ok(Payout {
            amount: milestone.amount,
            remaining: after.balance,
        })
    }
}
