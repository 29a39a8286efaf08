//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the
//! voting protocol:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key           | Type  | Description                       |
//! |---------------|-------|-----------------------------------|
//! | `VotingCount` | `u64` | Auto-increment voting ID counter  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                  | Type           | Description                        |
//! |----------------------|----------------|------------------------------------|
//! | `VotingConfig(id)`   | `VotingConfig` | Immutable voting configuration     |
//! | `VotingState(id)`    | `VotingState`  | Status, tallies, winner            |
//! | `Registered(id)`     | `Vec<Address>` | Whitelist in registration order    |
//! | `Voter(id, address)` | `VoterRecord`  | Registered / voted flags           |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Every voting owns its own keys; nothing here lets one voting touch
//! another's entries.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{VoterRecord, VotingConfig, VotingState};
use crate::Error;

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

/// Key of one voter record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoterKey {
    pub voting_id: u64,
    pub voter: Address,
}

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Global auto-increment counter for voting IDs (Instance).
    VotingCount,
    /// Immutable voting configuration keyed by ID (Persistent).
    VotingConfig(u64),
    /// Mutable voting state keyed by ID (Persistent).
    VotingState(u64),
    /// Ordered whitelist keyed by ID (Persistent).
    Registered(u64),
    /// Per-voter flags (Persistent).
    Voter(VoterKey),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Number of votings created so far.
pub fn voting_count(env: &Env) -> u64 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::VotingCount)
        .unwrap_or(0)
}

/// Atomically reads, increments, and stores the voting counter.
/// Returns the ID to use for the *current* voting (pre-increment value).
pub fn get_and_increment_voting_id(env: &Env) -> u64 {
    let current = voting_count(env);
    env.storage()
        .instance()
        .set(&DataKey::VotingCount, &(current + 1));
    current
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn voter_key(voting_id: u64, voter: &Address) -> DataKey {
    DataKey::Voter(VoterKey {
        voting_id,
        voter: voter.clone(),
    })
}

/// Save the configuration, initial state and whitelist of a new voting.
pub fn save_voting(env: &Env, config: &VotingConfig, state: &VotingState, registered: &Vec<Address>) {
    let config_key = DataKey::VotingConfig(config.id);
    env.storage().persistent().set(&config_key, config);
    bump_persistent(env, &config_key);

    save_voting_state(env, config.id, state);
    save_registered(env, config.id, registered);
}

/// Load only the immutable configuration.
/// Fails with [`Error::IndexOutOfRange`] for an ID that was never assigned.
pub fn load_voting_config(env: &Env, id: u64) -> Result<VotingConfig, Error> {
    let key = DataKey::VotingConfig(id);
    let config: VotingConfig = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::IndexOutOfRange)?;
    bump_persistent(env, &key);
    Ok(config)
}

/// Load only the mutable state.
pub fn load_voting_state(env: &Env, id: u64) -> Result<VotingState, Error> {
    let key = DataKey::VotingState(id);
    let state: VotingState = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::IndexOutOfRange)?;
    bump_persistent(env, &key);
    Ok(state)
}

/// Save only the mutable state (ballots, transitions, close).
pub fn save_voting_state(env: &Env, id: u64, state: &VotingState) {
    let key = DataKey::VotingState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

/// Whitelist of a voting, in registration order.
pub fn load_registered(env: &Env, id: u64) -> Vec<Address> {
    let key = DataKey::Registered(id);
    match env.storage().persistent().get(&key) {
        Some(list) => {
            bump_persistent(env, &key);
            list
        }
        None => Vec::new(env),
    }
}

pub fn save_registered(env: &Env, id: u64, registered: &Vec<Address>) {
    let key = DataKey::Registered(id);
    env.storage().persistent().set(&key, registered);
    bump_persistent(env, &key);
}

/// Voter flags; an unknown identity reads as neither registered nor voted.
pub fn load_voter(env: &Env, voting_id: u64, voter: &Address) -> VoterRecord {
    let key = voter_key(voting_id, voter);
    match env.storage().persistent().get(&key) {
        Some(record) => {
            bump_persistent(env, &key);
            record
        }
        None => VoterRecord::default(),
    }
}

pub fn save_voter(env: &Env, voting_id: u64, voter: &Address, record: &VoterRecord) {
    let key = voter_key(voting_id, voter);
    env.storage().persistent().set(&key, record);
    bump_persistent(env, &key);
}
