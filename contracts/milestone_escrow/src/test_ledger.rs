//! Ledger tests against an in-memory store and asset.
//!
//! These run the transition logic without a deployed contract, which lets the
//! asset misbehave on demand (failed transfers, re-entrant calls).

extern crate std;

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec as StdVec;

use soroban_sdk::{testutils::Address as _, Address, Env, String, Vec};

use crate::ledger::{EscrowLedger, PaymentAsset, Payout};
use crate::milestones;
use crate::policy::{self, Operation};
use crate::storage::EscrowStore;
use crate::types::{EscrowConfig, EscrowState, Milestone, MilestoneStatus};
use crate::EscrowError;

// ─────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────

struct StoreInner {
    config: Option<EscrowConfig>,
    state: EscrowState,
    milestones: StdVec<Milestone>,
}

#[derive(Clone)]
struct MemoryStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl MemoryStore {
    fn new(config: EscrowConfig, amounts: &[i128]) -> Self {
        MemoryStore {
            inner: Rc::new(RefCell::new(StoreInner {
                config: Some(config),
                state: EscrowState::default(),
                milestones: amounts.iter().map(|a| Milestone::pending(*a)).collect(),
            })),
        }
    }

    fn empty() -> Self {
        MemoryStore {
            inner: Rc::new(RefCell::new(StoreInner {
                config: None,
                state: EscrowState::default(),
                milestones: StdVec::new(),
            })),
        }
    }

    fn statuses(&self) -> StdVec<MilestoneStatus> {
        self.inner.borrow().milestones.iter().map(|m| m.status).collect()
    }
}

impl EscrowStore for MemoryStore {
    fn config(&self) -> Result<EscrowConfig, EscrowError> {
        self.inner
            .borrow()
            .config
            .clone()
            .ok_or(EscrowError::NotInitialized)
    }

    fn state(&self) -> EscrowState {
        self.inner.borrow().state.clone()
    }

    fn set_state(&mut self, state: &EscrowState) {
        self.inner.borrow_mut().state = state.clone();
    }

    fn milestone(&self, index: u32) -> Option<Milestone> {
        self.inner.borrow().milestones.get(index as usize).cloned()
    }

    fn set_milestone(&mut self, index: u32, milestone: &Milestone) {
        self.inner.borrow_mut().milestones[index as usize] = milestone.clone();
    }
}

// ─────────────────────────────────────────────────────────
// In-memory asset
// ─────────────────────────────────────────────────────────

/// Re-enters the ledger from inside `push`, as a hostile token could.
#[derive(Clone)]
struct Reentry {
    store: MemoryStore,
    caller: Address,
    index: u32,
}

struct AssetInner {
    custody: Address,
    balances: StdVec<(Address, i128)>,
    fail_pull: bool,
    fail_push: bool,
    reentry: Option<Reentry>,
    /// Store snapshots taken at the moment each payout was issued.
    seen_on_push: StdVec<(EscrowState, StdVec<MilestoneStatus>)>,
    reentry_results: StdVec<Result<Payout, EscrowError>>,
}

#[derive(Clone)]
struct MemoryAsset {
    inner: Rc<RefCell<AssetInner>>,
    observed: Option<MemoryStore>,
}

impl MemoryAsset {
    fn new(env: &Env) -> Self {
        MemoryAsset {
            inner: Rc::new(RefCell::new(AssetInner {
                custody: Address::generate(env),
                balances: StdVec::new(),
                fail_pull: false,
                fail_push: false,
                reentry: None,
                seen_on_push: StdVec::new(),
                reentry_results: StdVec::new(),
            })),
            observed: None,
        }
    }

    fn observing(mut self, store: &MemoryStore) -> Self {
        self.observed = Some(store.clone());
        self
    }

    fn mint(&self, to: &Address, amount: i128) {
        self.adjust(to, amount);
    }

    fn custody_balance(&self) -> i128 {
        let custody = self.inner.borrow().custody.clone();
        self.balance(&custody)
    }

    fn adjust(&self, owner: &Address, delta: i128) {
        let mut inner = self.inner.borrow_mut();
        if let Some(entry) = inner.balances.iter_mut().find(|(a, _)| a == owner) {
            entry.1 += delta;
            return;
        }
        inner.balances.push((owner.clone(), delta));
    }
}

impl PaymentAsset for MemoryAsset {
    fn balance(&self, owner: &Address) -> i128 {
        self.inner
            .borrow()
            .balances
            .iter()
            .find(|(a, _)| a == owner)
            .map(|(_, b)| *b)
            .unwrap_or(0)
    }

    fn pull(&self, from: &Address, amount: i128) -> Result<(), EscrowError> {
        if self.inner.borrow().fail_pull {
            return Err(EscrowError::TransferFailed);
        }
        let custody = self.inner.borrow().custody.clone();
        self.adjust(from, -amount);
        self.adjust(&custody, amount);
        Ok(())
    }

    fn push(&self, to: &Address, amount: i128) -> Result<(), EscrowError> {
        if let Some(store) = &self.observed {
            let snapshot = (store.state(), store.statuses());
            self.inner.borrow_mut().seen_on_push.push(snapshot);
        }

        let reentry = self.inner.borrow().reentry.clone();
        if let Some(reentry) = reentry {
            let mut nested = EscrowLedger::new(reentry.store.clone(), NoopAsset);
            let result = nested.release(&reentry.caller, reentry.index);
            self.inner.borrow_mut().reentry_results.push(result);
        }

        if self.inner.borrow().fail_push {
            return Err(EscrowError::TransferFailed);
        }
        let custody = self.inner.borrow().custody.clone();
        self.adjust(&custody, -amount);
        self.adjust(to, amount);
        Ok(())
    }
}

/// Asset that accepts every transfer without tracking balances.
struct NoopAsset;

impl PaymentAsset for NoopAsset {
    fn balance(&self, _owner: &Address) -> i128 {
        i128::MAX
    }

    fn pull(&self, _from: &Address, _amount: i128) -> Result<(), EscrowError> {
        Ok(())
    }

    fn push(&self, _to: &Address, _amount: i128) -> Result<(), EscrowError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

struct Parties {
    funder: Address,
    freelancer: Address,
}

fn memory_escrow(env: &Env, amounts: &[i128]) -> (MemoryStore, Parties) {
    let funder = Address::generate(env);
    let freelancer = Address::generate(env);
    let total = milestones::committed_total(&Vec::from_slice(env, amounts)).unwrap();
    let config = EscrowConfig {
        funder: funder.clone(),
        token: Address::generate(env),
        project_id: String::from_str(env, "did:example:ledger"),
        freelancer: freelancer.clone(),
        milestone_count: amounts.len() as u32,
        total_committed: total,
    };
    (
        MemoryStore::new(config, amounts),
        Parties { funder, freelancer },
    )
}

fn funded_ledger(
    env: &Env,
    amounts: &[i128],
) -> (EscrowLedger<MemoryStore, MemoryAsset>, MemoryStore, MemoryAsset, Parties) {
    let (store, parties) = memory_escrow(env, amounts);
    let asset = MemoryAsset::new(env).observing(&store);
    asset.mint(&parties.funder, amounts.iter().sum());

    let mut ledger = EscrowLedger::new(store.clone(), asset.clone());
    ledger.fund(&parties.funder).unwrap();
    (ledger, store, asset, parties)
}

// ─────────────────────────────────────────────────────────
// Milestone table
// ─────────────────────────────────────────────────────────

#[test]
fn committed_total_sums_positive_amounts() {
    let env = Env::default();
    let amounts = Vec::from_slice(&env, &[1i128, 2, 3]);
    assert_eq!(milestones::committed_total(&amounts), Ok(6));
}

#[test]
fn committed_total_rejects_bad_tables() {
    let env = Env::default();
    assert_eq!(
        milestones::committed_total(&Vec::new(&env)),
        Err(EscrowError::InvalidMilestones)
    );
    assert_eq!(
        milestones::committed_total(&Vec::from_slice(&env, &[5i128, 0])),
        Err(EscrowError::InvalidMilestones)
    );
    assert_eq!(
        milestones::committed_total(&Vec::from_slice(&env, &[-3i128])),
        Err(EscrowError::InvalidMilestones)
    );
    assert_eq!(
        milestones::committed_total(&Vec::from_slice(&env, &[i128::MAX, 1])),
        Err(EscrowError::AmountOverflow)
    );
    assert_eq!(
        milestones::committed_total(&Vec::from_slice(&env, &[i128::MAX])),
        Ok(i128::MAX)
    );
}

#[test]
fn table_lookup_is_zero_based_and_bounded() {
    let env = Env::default();
    let (store, _) = memory_escrow(&env, &[10, 20]);

    assert_eq!(milestones::count(&store), Ok(2));
    assert_eq!(milestones::get(&store, 0).map(|m| m.amount), Ok(10));
    assert_eq!(milestones::get(&store, 1).map(|m| m.amount), Ok(20));
    assert_eq!(milestones::get(&store, 2), Err(EscrowError::InvalidMilestone));
}

#[test]
fn uninitialized_store_is_reported() {
    let env = Env::default();
    let store = MemoryStore::empty();
    let mut ledger = EscrowLedger::new(store.clone(), NoopAsset);

    assert_eq!(milestones::count(&store), Err(EscrowError::NotInitialized));
    assert_eq!(
        ledger.fund(&Address::generate(&env)),
        Err(EscrowError::NotInitialized)
    );
}

// ─────────────────────────────────────────────────────────
// Access policy
// ─────────────────────────────────────────────────────────

#[test]
fn only_funder_passes_policy() {
    let env = Env::default();
    let (store, parties) = memory_escrow(&env, &[1]);
    let config = store.config().unwrap();
    let stranger = Address::generate(&env);

    for op in [Operation::Fund, Operation::Release] {
        assert_eq!(policy::authorize(&config, op, &parties.funder), Ok(()));
        assert_eq!(
            policy::authorize(&config, op, &parties.freelancer),
            Err(EscrowError::Unauthorized)
        );
        assert_eq!(
            policy::authorize(&config, op, &stranger),
            Err(EscrowError::Unauthorized)
        );
    }
}

// ─────────────────────────────────────────────────────────
// Transitions
// ─────────────────────────────────────────────────────────

#[test]
fn release_pays_freelancer_and_reconciles() {
    let env = Env::default();
    let (mut ledger, store, asset, parties) = funded_ledger(&env, &[1, 2, 3]);
    assert_eq!(asset.custody_balance(), 6);

    let payout = ledger.release(&parties.funder, 1).unwrap();

    assert_eq!(payout, Payout { amount: 2, remaining: 4 });
    assert_eq!(asset.balance(&parties.freelancer), 2);
    assert_eq!(asset.custody_balance(), 4);
    assert_eq!(store.state().balance, milestones::pending_total(&store).unwrap());
    assert_eq!(
        ledger.release(&parties.funder, 1),
        Err(EscrowError::AlreadyReleased)
    );
}

#[test]
fn failed_pull_leaves_escrow_unfunded() {
    let env = Env::default();
    let (store, parties) = memory_escrow(&env, &[4, 4]);
    let asset = MemoryAsset::new(&env);
    asset.mint(&parties.funder, 8);
    asset.inner.borrow_mut().fail_pull = true;

    let mut ledger = EscrowLedger::new(store.clone(), asset.clone());
    assert_eq!(ledger.fund(&parties.funder), Err(EscrowError::TransferFailed));
    assert_eq!(store.state(), EscrowState::default());
    assert_eq!(asset.balance(&parties.funder), 8);

    asset.inner.borrow_mut().fail_pull = false;
    assert_eq!(ledger.fund(&parties.funder), Ok(8));
    assert_eq!(store.state().balance, 8);
}

#[test]
fn failed_payout_rolls_back_release() {
    let env = Env::default();
    let (mut ledger, store, asset, parties) = funded_ledger(&env, &[5, 7]);
    let before = store.state();
    asset.inner.borrow_mut().fail_push = true;

    assert_eq!(
        ledger.release(&parties.funder, 0),
        Err(EscrowError::TransferFailed)
    );
    assert_eq!(store.state(), before);
    assert_eq!(
        store.statuses(),
        [MilestoneStatus::Pending, MilestoneStatus::Pending]
    );
    assert_eq!(asset.balance(&parties.freelancer), 0);
    assert_eq!(asset.custody_balance(), 12);

    asset.inner.borrow_mut().fail_push = false;
    let payout = ledger.release(&parties.funder, 0).unwrap();
    assert_eq!(payout.remaining, 7);
    assert_eq!(asset.balance(&parties.freelancer), 5);
}

#[test]
fn status_is_committed_before_payout() {
    let env = Env::default();
    let (mut ledger, _store, asset, parties) = funded_ledger(&env, &[3, 9]);

    ledger.release(&parties.funder, 1).unwrap();

    let seen = asset.inner.borrow().seen_on_push.clone();
    assert_eq!(seen.len(), 1);
    let (state, statuses) = &seen[0];
    assert_eq!(state.balance, 3);
    assert_eq!(state.released_count, 1);
    assert_eq!(
        statuses,
        &[MilestoneStatus::Pending, MilestoneStatus::Released]
    );
}

#[test]
fn reentrant_release_of_same_index_is_rejected() {
    let env = Env::default();
    let (mut ledger, store, asset, parties) = funded_ledger(&env, &[3, 9]);
    asset.inner.borrow_mut().reentry = Some(Reentry {
        store: store.clone(),
        caller: parties.funder.clone(),
        index: 0,
    });

    ledger.release(&parties.funder, 0).unwrap();

    let results = asset.inner.borrow().reentry_results.clone();
    assert_eq!(results, [Err::<Payout, _>(EscrowError::AlreadyReleased)]);
    assert_eq!(store.state().balance, 9);
    assert_eq!(asset.balance(&parties.freelancer), 3);
}

#[test]
fn release_requires_funding_and_bounds() {
    let env = Env::default();
    let (store, parties) = memory_escrow(&env, &[1, 1]);
    let mut ledger = EscrowLedger::new(store, NoopAsset);

    assert_eq!(ledger.release(&parties.funder, 0), Err(EscrowError::NotFunded));

    ledger.fund(&parties.funder).unwrap();
    assert_eq!(
        ledger.release(&parties.funder, 2),
        Err(EscrowError::InvalidMilestone)
    );
    assert_eq!(
        ledger.release(&parties.freelancer, 0),
        Err(EscrowError::Unauthorized)
    );
    assert_eq!(ledger.fund(&parties.funder), Err(EscrowError::AlreadyFunded));
}

#[test]
fn insufficient_balance_blocks_funding() {
    let env = Env::default();
    let (store, parties) = memory_escrow(&env, &[10]);
    let asset = MemoryAsset::new(&env);
    asset.mint(&parties.funder, 9);

    let mut ledger = EscrowLedger::new(store.clone(), asset);
    assert_eq!(
        ledger.fund(&parties.funder),
        Err(EscrowError::InsufficientFunds)
    );
    assert!(!store.state().funded);
}
