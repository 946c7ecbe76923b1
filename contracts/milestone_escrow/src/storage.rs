//! # Storage
//!
//! Provides the [`EscrowStore`] seam used by the ledger, and its Soroban-backed
//! implementation [`ContractStore`] over two storage tiers:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key      | Type           | Description                         |
//! |----------|----------------|-------------------------------------|
//! | `Config` | `EscrowConfig` | Immutable escrow configuration      |
//! | `State`  | `EscrowState`  | Funded flag, custodied balance      |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key             | Type        | Description                    |
//! |-----------------|-------------|--------------------------------|
//! | `Milestone(i)`  | `Milestone` | Amount and status of entry `i` |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.

use soroban_sdk::{contracttype, Env, Vec};

use crate::types::{EscrowConfig, EscrowState, Milestone};
use crate::EscrowError;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Immutable escrow configuration (Instance).
    Config,
    /// Mutable escrow state (Instance).
    State,
    /// Milestone record keyed by zero-based index (Persistent).
    Milestone(u32),
}

// ── Store seam ───────────────────────────────────────────────────────

/// Backing store for one escrow instance.
///
/// The ledger only ever talks to this trait, so the transition logic is the
/// same whether state lives in contract storage or in memory.
pub trait EscrowStore {
    fn config(&self) -> Result<EscrowConfig, EscrowError>;
    fn state(&self) -> EscrowState;
    fn set_state(&mut self, state: &EscrowState);
    /// `None` when `index` is outside the table.
    fn milestone(&self, index: u32) -> Option<Milestone>;
    fn set_milestone(&mut self, index: u32, milestone: &Milestone);
}

/// [`EscrowStore`] over the executing contract's own storage.
pub struct ContractStore {
    env: Env,
}

impl ContractStore {
    pub fn new(env: &Env) -> Self {
        ContractStore { env: env.clone() }
    }

    /// Write a freshly constructed escrow: config, zeroed state and every
    /// milestone as `Pending`.
    pub fn create(&mut self, config: &EscrowConfig, amounts: &Vec<i128>) {
        self.env.storage().instance().set(&DataKey::Config, config);
        self.set_state(&EscrowState::default());
        for (index, amount) in amounts.iter().enumerate() {
            self.set_milestone(index as u32, &Milestone::pending(amount));
        }
    }

    /// Extend instance storage TTL if it falls below the threshold.
    fn bump_instance(&self) {
        self.env
            .storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
    }

    /// Extend the TTL for a persistent storage key.
    fn bump_persistent(&self, key: &DataKey) {
        self.env
            .storage()
            .persistent()
            .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
    }
}

impl EscrowStore for ContractStore {
    fn config(&self) -> Result<EscrowConfig, EscrowError> {
        self.bump_instance();
        self.env
            .storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(EscrowError::NotInitialized)
    }

    fn state(&self) -> EscrowState {
        self.bump_instance();
        self.env
            .storage()
            .instance()
            .get(&DataKey::State)
            .unwrap_or_default()
    }

    fn set_state(&mut self, state: &EscrowState) {
        self.env.storage().instance().set(&DataKey::State, state);
        self.bump_instance();
    }

    fn milestone(&self, index: u32) -> Option<Milestone> {
        let key = DataKey::Milestone(index);
        let milestone: Milestone = self.env.storage().persistent().get(&key)?;
        self.bump_persistent(&key);
        Some(milestone)
    }

    fn set_milestone(&mut self, index: u32, milestone: &Milestone) {
        let key = DataKey::Milestone(index);
        self.env.storage().persistent().set(&key, milestone);
        self.bump_persistent(&key);
    }
}
