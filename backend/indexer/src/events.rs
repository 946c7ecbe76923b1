//! Canonical event types emitted by the milestone escrow contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/milestone_escrow/src/events.rs`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{IndexerError, Result};

/// All recognised event kinds from the escrow contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The escrow was constructed (`created` topic).
    EscrowCreated,
    /// The funder deposited the committed total (`funded` topic).
    EscrowFunded,
    /// One milestone was paid out to the freelancer (`released` topic).
    MilestoneReleased,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::EscrowCreated,
            "funded" => Self::EscrowFunded,
            "released" => Self::MilestoneReleased,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EscrowCreated => "escrow_created",
            Self::EscrowFunded => "escrow_funded",
            Self::MilestoneReleased => "milestone_released",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`].
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "escrow_created" => Self::EscrowCreated,
            "escrow_funded" => Self::EscrowFunded,
            "milestone_released" => Self::MilestoneReleased,
            _ => Self::Unknown,
        }
    }
}

/// A fully decoded escrow event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowEvent {
    pub event_type: String,
    pub contract_id: String,
    /// Opaque project identifier; only carried by `escrow_created`.
    pub project_id: Option<String>,
    /// Zero-based milestone index; only carried by `milestone_released`.
    pub milestone_index: Option<i64>,
    /// Funder for `created`/`funded`, freelancer for `released`.
    pub actor: Option<String>,
    /// Decimal string; token amounts are `i128` on-chain.
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub contract_id: String,
    pub project_id: Option<String>,
    pub milestone_index: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Off-chain projection of one escrow, rebuilt from its indexed events.
///
/// Amounts are decimal strings so that values above 2^53 survive JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscrowSummary {
    pub contract_id: String,
    pub project_id: Option<String>,
    pub total_committed: Option<String>,
    pub funded: bool,
    pub funded_amount: String,
    pub released_amount: String,
    /// `funded_amount - released_amount`.
    pub outstanding: String,
    pub released_milestones: Vec<i64>,
    pub event_count: usize,
}

impl EscrowSummary {
    /// Fold the events of a single contract, in ledger order, into a summary.
    ///
    /// A milestone index seen twice is counted once.
    pub fn from_events(contract_id: &str, events: &[EventRecord]) -> Result<Self> {
        let mut project_id = None;
        let mut total_committed = None;
        let mut funded = false;
        let mut funded_amount: i128 = 0;
        let mut released_amount: i128 = 0;
        let mut released = BTreeSet::new();
        let mut event_count = 0usize;

        for ev in events.iter().filter(|e| e.contract_id == contract_id) {
            event_count += 1;
            match EventKind::from_db_str(&ev.event_type) {
                EventKind::EscrowCreated => {
                    project_id = ev.project_id.clone();
                    total_committed = ev.amount.clone();
                }
                EventKind::EscrowFunded => {
                    if !funded {
                        funded = true;
                        funded_amount = parse_amount(ev)?;
                    }
                }
                EventKind::MilestoneReleased => {
                    let index = ev.milestone_index.ok_or_else(|| {
                        IndexerError::EventParse(format!(
                            "release event {} has no milestone index",
                            ev.id
                        ))
                    })?;
                    if released.insert(index) {
                        released_amount = released_amount
                            .checked_add(parse_amount(ev)?)
                            .ok_or_else(|| overflow(contract_id))?;
                    }
                }
                EventKind::Unknown => {}
            }
        }

        let outstanding = funded_amount
            .checked_sub(released_amount)
            .ok_or_else(|| overflow(contract_id))?;

        Ok(EscrowSummary {
            contract_id: contract_id.to_string(),
            project_id,
            total_committed,
            funded,
            funded_amount: funded_amount.to_string(),
            released_amount: released_amount.to_string(),
            outstanding: outstanding.to_string(),
            released_milestones: released.into_iter().collect(),
            event_count,
        })
    }
}

fn overflow(contract_id: &str) -> IndexerError {
    IndexerError::EventParse(format!("amounts for {contract_id} overflow i128"))
}

fn parse_amount(ev: &EventRecord) -> Result<i128> {
    let raw = ev
        .amount
        .as_deref()
        .ok_or_else(|| IndexerError::EventParse(format!("event {} has no amount", ev.id)))?;
    raw.parse()
        .map_err(|_| IndexerError::EventParse(format!("event {} has bad amount {raw:?}", ev.id)))
}
