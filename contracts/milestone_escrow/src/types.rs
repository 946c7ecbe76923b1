//! # Types
//!
//! Shared data structures used across all modules of the escrow contract.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! An escrow is internally stored as two instance entries plus one persistent
//! entry per milestone:
//!
//! - [`EscrowConfig`] — written once by the constructor; never mutated.
//! - [`EscrowState`] — written on funding and on every release.
//! - [`Milestone`] — amount fixed at construction, status flipped on release.
//!
//! The public API exposes the reconstructed [`Escrow`] struct for convenience.
//!
//! ### Milestone status as a Finite-State Machine
//!
//! ```text
//! Pending ──► Released
//! ```
//!
//! `Released` is terminal. `release` rejects any milestone that is not
//! `Pending` with `EscrowError::AlreadyReleased`.

use soroban_sdk::{contracttype, Address, String};

/// Lifecycle status of a single milestone.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MilestoneStatus {
    /// Amount is held in custody.
    Pending,
    /// Amount has been paid out to the freelancer.
    Released,
}

/// One entry of the milestone table.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Milestone {
    /// Quantity of the payment token owed on release. Always positive.
    pub amount: i128,
    pub status: MilestoneStatus,
}

impl Milestone {
    pub fn pending(amount: i128) -> Self {
        Milestone {
            amount,
            status: MilestoneStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MilestoneStatus::Pending
    }
}

/// Immutable escrow configuration, written once at construction.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EscrowConfig {
    pub funder: Address,
    pub token: Address,
    /// Opaque project identifier (e.g. a DID). Stored verbatim.
    pub project_id: String,
    pub freelancer: Address,
    pub milestone_count: u32,
    /// Sum of all milestone amounts, computed with checked arithmetic.
    pub total_committed: i128,
}

/// Mutable escrow state, updated on funding and release.
///
/// Kept small so that release writes stay cheap.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EscrowState {
    pub funded: bool,
    /// Custodied balance: sum of the amounts of all `Pending` milestones once funded.
    pub balance: i128,
    pub released_count: u32,
}

/// Full on-chain view of an escrow instance.
///
/// Used as the public API return type; reconstructed from the split
/// `EscrowConfig` + `EscrowState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Escrow {
    /// Opaque project identifier.
    pub project_id: String,
    /// Account that funds the escrow and approves releases.
    pub funder: Address,
    /// Sole recipient of released milestone amounts.
    pub freelancer: Address,
    /// Payment token contract.
    pub token: Address,
    /// Number of milestones, constant for the life of the escrow.
    pub milestone_count: u32,
    /// Sum of all milestone amounts.
    pub total_committed: i128,
    /// Whether the single funding event has happened.
    pub funded: bool,
    /// Currently custodied balance.
    pub balance: i128,
    /// Number of milestones already released.
    pub released_count: u32,
}
