//! # Milestone Escrow Contract
//!
//! One deployed instance custodies a single payment token for a single
//! project. The funder commits an ordered list of milestone amounts at
//! construction, deposits their sum once, and then releases milestones one at
//! a time; each release pays that milestone's amount to the freelancer.
//!
//! | Phase        | Entry Point(s)                                         |
//! |--------------|--------------------------------------------------------|
//! | Construction | `__constructor`                                        |
//! | Funding      | [`MilestoneEscrow::fund`]                              |
//! | Release      | [`MilestoneEscrow::release`]                           |
//! | Queries      | `balance_of`, `project`, `payment_token`, `total_milestones`, `milestone_amount`, `milestone_status`, `get_milestone`, `get_escrow`, ... |
//!
//! ## Architecture
//!
//! Transition logic lives in [`ledger`], authorization in [`policy`], the
//! milestone table in [`milestones`] and storage access in [`storage`]. This
//! file contains only the public entry points and event emissions.
//!
//! Milestones are indexed from zero. Releases are not ordered: any pending
//! milestone may be released at any time after funding.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, Address, Env, String, Vec,
};

mod events;
pub mod ledger;
pub mod milestones;
pub mod policy;
mod storage;
mod types;

#[cfg(test)]
mod test_ledger;

pub use events::{EscrowCreated, EscrowFunded, MilestoneReleased};
pub use storage::{ContractStore, EscrowStore};
pub use types::{Escrow, EscrowConfig, EscrowState, Milestone, MilestoneStatus};

use ledger::{EscrowLedger, TokenAsset};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum EscrowError {
    AlreadyFunded     = 1,
    InsufficientFunds = 2,
    InvalidMilestone  = 3,
    AlreadyReleased   = 4,
    Unauthorized      = 5,
    TransferFailed    = 6,
    NotFunded         = 7,
    InvalidMilestones = 8,
    AmountOverflow    = 9,
    NotInitialized    = 10,
}

#[contract]
pub struct MilestoneEscrow;

fn load_config(env: &Env) -> EscrowConfig {
    ContractStore::new(env)
        .config()
        .unwrap_or_else(|err| panic_with_error!(env, err))
}

fn ledger(env: &Env) -> Result<EscrowLedger<ContractStore, TokenAsset>, EscrowError> {
    let store = ContractStore::new(env);
    let config = store.config()?;
    Ok(EscrowLedger::new(store, TokenAsset::new(env, &config.token)))
}

#[contractimpl]
impl MilestoneEscrow {
    // ─────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────

    /// Create the escrow.
    ///
    /// - `milestone_amounts` must be non-empty and every amount strictly positive,
    ///   otherwise deployment aborts with `InvalidMilestones`.
    /// - A sum above `i128::MAX` aborts with `AmountOverflow`.
    /// - `project_id` is stored verbatim and never inspected.
    pub fn __constructor(
        env: Env,
        funder: Address,
        payment_token: Address,
        project_id: String,
        freelancer: Address,
        milestone_amounts: Vec<i128>,
    ) {
        let total_committed = milestones::committed_total(&milestone_amounts)
            .unwrap_or_else(|err| panic_with_error!(&env, err));

        let config = EscrowConfig {
            funder,
            token: payment_token,
            project_id,
            freelancer,
            milestone_count: milestone_amounts.len(),
            total_committed,
        };

        ContractStore::new(&env).create(&config, &milestone_amounts);
        events::escrow_created(&env, &config);
    }

    // ─────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────

    /// Deposit the committed total from `funder` into custody.
    ///
    /// `funder` must sign and must be the funder named at construction.
    /// Funding happens once; a second call fails with `AlreadyFunded`.
    pub fn fund(env: Env, funder: Address) -> Result<(), EscrowError> {
        funder.require_auth();

        let amount = ledger(&env)?.fund(&funder)?;

        events::escrow_funded(&env, &funder, amount);
        Ok(())
    }

    /// Mark milestone `milestone_index` as released and pay it to the
    /// freelancer.
    ///
    /// `funder` must sign and must be the funder named at construction.
    pub fn release(env: Env, funder: Address, milestone_index: u32) -> Result<(), EscrowError> {
        funder.require_auth();

        let mut ledger = ledger(&env)?;
        let payout = ledger.release(&funder, milestone_index)?;

        let config = ledger.store().config()?;
        events::milestone_released(
            &env,
            milestone_index,
            &config.freelancer,
            payout.amount,
            payout.remaining,
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Currently custodied balance.
    pub fn balance_of(env: Env) -> i128 {
        ContractStore::new(&env).state().balance
    }

    /// `(project_id, freelancer)` identity tuple.
    pub fn project(env: Env) -> (String, Address) {
        let config = load_config(&env);
        (config.project_id, config.freelancer)
    }

    pub fn project_id(env: Env) -> String {
        load_config(&env).project_id
    }

    pub fn freelancer(env: Env) -> Address {
        load_config(&env).freelancer
    }

    pub fn funder(env: Env) -> Address {
        load_config(&env).funder
    }

    pub fn payment_token(env: Env) -> Address {
        load_config(&env).token
    }

    pub fn total_milestones(env: Env) -> u32 {
        load_config(&env).milestone_count
    }

    pub fn total_committed(env: Env) -> i128 {
        load_config(&env).total_committed
    }

    pub fn is_funded(env: Env) -> bool {
        ContractStore::new(&env).state().funded
    }

    /// Amount of milestone `index` (zero-based).
    pub fn milestone_amount(env: Env, index: u32) -> Result<i128, EscrowError> {
        Ok(milestones::get(&ContractStore::new(&env), index)?.amount)
    }

    pub fn milestone_status(env: Env, index: u32) -> Result<MilestoneStatus, EscrowError> {
        Ok(milestones::get(&ContractStore::new(&env), index)?.status)
    }

    pub fn get_milestone(env: Env, index: u32) -> Result<Milestone, EscrowError> {
        milestones::get(&ContractStore::new(&env), index)
    }

    /// Aggregated view of configuration and current state.
    pub fn get_escrow(env: Env) -> Escrow {
        let store = ContractStore::new(&env);
        let config = load_config(&env);
        let state = store.state();
        Escrow {
            project_id: config.project_id,
            funder: config.funder,
            freelancer: config.freelancer,
            token: config.token,
            milestone_count: config.milestone_count,
            total_committed: config.total_committed,
            funded: state.funded,
            balance: state.balance,
            released_count: state.released_count,
        }
    }
}
