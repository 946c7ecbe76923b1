//! Application configuration loaded from environment variables.

use crate::errors::{IndexerError, Result};
use crate::rpc::MAX_CONTRACT_IDS;

#[derive(Debug, Clone)]
pub struct Config {
    /// Soroban RPC endpoint (e.g. https://soroban-testnet.stellar.org)
    pub rpc_url: String,
    /// Escrow contract addresses to follow (Strkey format), one per project
    pub contract_ids: Vec<String>,
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) to poll the RPC for new events
    pub poll_interval_secs: u64,
    /// Maximum number of events to fetch per RPC request
    pub events_per_page: u32,
    /// Ledger to start from if no cursor is saved
    pub start_ledger: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let contract_ids = parse_contract_ids(&lookup("CONTRACT_IDS").ok_or_else(|| {
            IndexerError::Config("CONTRACT_IDS environment variable is required".to_string())
        })?);
        if contract_ids.is_empty() {
            return Err(IndexerError::Config(
                "CONTRACT_IDS must name at least one contract".to_string(),
            ));
        }
        if contract_ids.len() > MAX_CONTRACT_IDS {
            return Err(IndexerError::Config(format!(
                "CONTRACT_IDS names {} contracts; at most {MAX_CONTRACT_IDS} are supported",
                contract_ids.len()
            )));
        }

        Ok(Config {
            rpc_url: var("RPC_URL", "https://soroban-testnet.stellar.org"),
            contract_ids,
            database_url: var("DATABASE_URL", "sqlite:./escrow_events.db"),
            api_port: parse_number("API_PORT", &var("API_PORT", "3001"))?,
            poll_interval_secs: parse_number("POLL_INTERVAL_SECS", &var("POLL_INTERVAL_SECS", "5"))?,
            events_per_page: parse_number("EVENTS_PER_PAGE", &var("EVENTS_PER_PAGE", "100"))?,
            start_ledger: parse_number("START_LEDGER", &var("START_LEDGER", "0"))?,
        })
    }
}

/// Split a comma-separated list, dropping blanks and duplicates.
fn parse_contract_ids(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| IndexerError::Config(format!("Invalid {key}: {raw:?}")))
}
