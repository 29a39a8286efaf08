// contracts/voting_protocol/src/lib.rs

//! # Voting Protocol Contract
//!
//! Permissioned, time-bounded votings and the factory that creates and
//! indexes them, exposed as the single Soroban contract `VotingProtocol`:
//!
//! | Phase        | Entry Point(s)                                          |
//! |--------------|---------------------------------------------------------|
//! | Creation     | [`VotingProtocol::create_voting`]                       |
//! | Registration | [`VotingProtocol::register_voter`], [`VotingProtocol::register_voters`] |
//! | Balloting    | [`VotingProtocol::vote_for`]                            |
//! | Close        | [`VotingProtocol::close_and_determine_winner`]          |
//! | Queries      | `get_voting`, `get_votings*`, per-field getters         |
//!
//! ## Architecture
//!
//! Rules live in [`voting`], creation and index queries in [`factory`],
//! storage access in [`storage`] and event payloads in [`events`]. This file
//! contains **only** the public entry points.
//!
//! Every state-changing entry point calls `require_auth` on the identity it
//! acts for before anything else. Owner-only operations then compare that
//! identity against the voting's owner.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String, Vec};

pub mod constants;
pub mod events;
mod factory;
mod storage;
pub mod types;
mod voting;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_factory;

pub use types::{
    CandidateTally, VoterRecord, Voting, VotingConfig, VotingParams, VotingState, VotingStatus,
};

/// Rejections. A rejected call leaves every voting exactly as it was.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadyRegistered  = 1,
    AlreadyVoted       = 2,
    TimeExpired        = 3,
    WrongState         = 4,
    CandidateNotFound  = 5,
    Unauthorized       = 6,
    NotWhitelisted     = 7,
    IndexOutOfRange    = 8,
    // Creation parameters:
    InvalidQuestion    = 9,
    NoCandidates       = 10,
    TooManyCandidates  = 11,
    InvalidCandidate   = 12,
    DuplicateCandidate = 13,
    InvalidDuration    = 14,
    InvalidQuorum      = 15,
    TooManyVoters      = 16,
}

#[contract]
pub struct VotingProtocol;

#[contractimpl]
impl VotingProtocol {
    // ─────────────────────────────────────────────────────────
    // Factory
    // ─────────────────────────────────────────────────────────

    /// Create a voting and return its index.
    ///
    /// - `creator` must sign and becomes the owner unless `params.owner` is set.
    /// - The voting starts in `AcceptingRegistrations`; seeded voters do not
    ///   open it.
    pub fn create_voting(env: Env, creator: Address, params: VotingParams) -> Result<u64, Error> {
        factory::create_voting(&env, &creator, &params)
    }

    /// Full view of voting `id`.
    pub fn get_voting(env: Env, id: u64) -> Result<Voting, Error> {
        voting::snapshot(&env, id)
    }

    pub fn get_votings_count(env: Env) -> u64 {
        storage::voting_count(&env)
    }

    /// Every voting, in creation order.
    pub fn get_votings(env: Env) -> Result<Vec<Voting>, Error> {
        factory::get_votings(&env)
    }

    pub fn get_voting_question(env: Env, id: u64) -> Result<String, Error> {
        factory::get_voting_question(&env, id)
    }

    pub fn get_votings_questions(env: Env) -> Result<Vec<String>, Error> {
        factory::get_votings_questions(&env)
    }

    /// IDs of votings owned by `owner` that are past their end but not closed.
    pub fn expired_open_votings(env: Env, owner: Address) -> Result<Vec<u64>, Error> {
        factory::expired_open_votings(&env, &owner)
    }

    // ─────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────

    /// Whitelist `voter`. `caller` must sign and own the voting.
    pub fn register_voter(env: Env, id: u64, caller: Address, voter: Address) -> Result<(), Error> {
        voting::register_voter(&env, id, &caller, voter)
    }

    /// Whitelist `voters` all-or-nothing and open the voting.
    pub fn register_voters(
        env: Env,
        id: u64,
        caller: Address,
        voters: Vec<Address>,
    ) -> Result<(), Error> {
        voting::register_voters(&env, id, &caller, &voters)
    }

    // ─────────────────────────────────────────────────────────
    // Balloting and close
    // ─────────────────────────────────────────────────────────

    /// Cast `voter`'s single ballot. `voter` must sign.
    pub fn vote_for(env: Env, id: u64, voter: Address, candidate: String) -> Result<(), Error> {
        voting::vote_for(&env, id, &voter, &candidate)
    }

    /// Close voting `id` and return the winner, if any. `caller` must sign
    /// and own the voting.
    pub fn close_and_determine_winner(
        env: Env,
        id: u64,
        caller: Address,
    ) -> Result<Option<String>, Error> {
        voting::close_and_determine_winner(&env, id, &caller)
    }

    // ─────────────────────────────────────────────────────────
    // Per-voting queries
    // ─────────────────────────────────────────────────────────

    pub fn question(env: Env, id: u64) -> Result<String, Error> {
        Ok(storage::load_voting_config(&env, id)?.question)
    }

    pub fn candidates(env: Env, id: u64) -> Result<Vec<String>, Error> {
        Ok(storage::load_voting_config(&env, id)?.candidates)
    }

    pub fn candidates_count(env: Env, id: u64) -> Result<u32, Error> {
        Ok(storage::load_voting_config(&env, id)?.candidates.len())
    }

    pub fn time_start(env: Env, id: u64) -> Result<u64, Error> {
        Ok(storage::load_voting_config(&env, id)?.time_start)
    }

    pub fn time_end(env: Env, id: u64) -> Result<u64, Error> {
        Ok(storage::load_voting_config(&env, id)?.time_end)
    }

    pub fn quorum_percent(env: Env, id: u64) -> Result<u32, Error> {
        Ok(storage::load_voting_config(&env, id)?.quorum_percent)
    }

    /// Participation so far, as an integer percentage of the electorate.
    pub fn quorum_percent_achieved(env: Env, id: u64) -> Result<u32, Error> {
        let config = storage::load_voting_config(&env, id)?;
        let state = storage::load_voting_state(&env, id)?;
        Ok(voting::quorum_of(&config, &state))
    }

    pub fn owner(env: Env, id: u64) -> Result<Address, Error> {
        Ok(storage::load_voting_config(&env, id)?.owner)
    }

    pub fn require_registration(env: Env, id: u64) -> Result<bool, Error> {
        Ok(storage::load_voting_config(&env, id)?.require_registration)
    }

    /// `true` once the ledger timestamp reached `time_end`.
    pub fn is_time_expired(env: Env, id: u64) -> Result<bool, Error> {
        let config = storage::load_voting_config(&env, id)?;
        Ok(voting::is_expired(&env, &config))
    }

    /// Registered identities, in registration order.
    pub fn registered_voters(env: Env, id: u64) -> Result<Vec<Address>, Error> {
        storage::load_voting_config(&env, id)?;
        Ok(storage::load_registered(&env, id))
    }

    pub fn voter(env: Env, id: u64, address: Address) -> Result<VoterRecord, Error> {
        voting::voter(&env, id, &address)
    }

    pub fn has_voted(env: Env, id: u64, address: Address) -> Result<bool, Error> {
        Ok(voting::voter(&env, id, &address)?.voted)
    }

    pub fn candidate_votes(env: Env, id: u64, candidate: String) -> Result<u64, Error> {
        voting::candidate_votes(&env, id, &candidate)
    }

    pub fn total_votes(env: Env, id: u64) -> Result<u64, Error> {
        Ok(voting::total_votes(&storage::load_voting_state(&env, id)?))
    }

    /// `None` until the voting closed with quorum and at least one ballot.
    pub fn winner(env: Env, id: u64) -> Result<Option<String>, Error> {
        Ok(storage::load_voting_state(&env, id)?.winner)
    }

    pub fn status(env: Env, id: u64) -> Result<VotingStatus, Error> {
        Ok(storage::load_voting_state(&env, id)?.status)
    }

    /// Exact, byte-wise string equality, used for candidate matching.
    pub fn compare_strings(_env: Env, a: String, b: String) -> bool {
        a == b
    }
}
