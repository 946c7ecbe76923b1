//! # Events
//!
//! Every state change publishes one event. Topics lead with a short symbol so
//! the off-chain indexer can classify them without decoding the payload.
//!
//! | Topics                  | Data                  |
//! |-------------------------|-----------------------|
//! | `("created",)`          | [`EscrowCreated`]     |
//! | `("funded",)`           | [`EscrowFunded`]      |
//! | `("released", index)`   | [`MilestoneReleased`] |

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

use crate::types::EscrowConfig;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EscrowCreated {
    pub project_id: String,
    pub funder: Address,
    pub freelancer: Address,
    pub token: Address,
    pub milestone_count: u32,
    pub total_committed: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EscrowFunded {
    pub funder: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneReleased {
    pub index: u32,
    pub freelancer: Address,
    pub amount: i128,
    pub remaining_balance: i128,
}

pub fn escrow_created(env: &Env, config: &EscrowConfig) {
    env.events().publish(
        (symbol_short!("created"),),
        EscrowCreated {
            project_id: config.project_id.clone(),
            funder: config.funder.clone(),
            freelancer: config.freelancer.clone(),
            token: config.token.clone(),
            milestone_count: config.milestone_count,
            total_committed: config.total_committed,
        },
    );
}

pub fn escrow_funded(env: &Env, funder: &Address, amount: i128) {
    env.events().publish(
        (symbol_short!("funded"),),
        EscrowFunded {
            funder: funder.clone(),
            amount,
        },
    );
}

pub fn milestone_released(
    env: &Env,
    index: u32,
    freelancer: &Address,
    amount: i128,
    remaining_balance: i128,
) {
    env.events().publish(
        (symbol_short!("released"), index),
        MilestoneReleased {
            index,
            freelancer: freelancer.clone(),
            amount,
            remaining_balance,
        },
    );
}
