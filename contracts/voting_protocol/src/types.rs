//! # Types
//!
//! Shared data structures used across all modules of the voting protocol.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A voting is internally stored as two separate ledger entries:
//!
//! - [`VotingConfig`]: written once at creation; never mutated.
//! - [`VotingState`]: written on every registration, ballot and close.
//!
//! Per-voter records and the ordered whitelist live under their own keys so
//! that a ballot only rewrites the small state entry and one voter record.
//! The public API exposes the reconstructed [`Voting`] struct for convenience.
//!
//! ### Status as a Finite-State Machine
//!
//! [`VotingStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! AcceptingRegistrations ──► Open ──► Closed
//!          └─────────────────────────►┘
//! ```
//!
//! Backward transitions and transitions out of the terminal `Closed` state
//! are rejected with [`Error::WrongState`](crate::Error::WrongState).

use soroban_sdk::{contracttype, Address, Env, String, Vec};

use crate::constants::DEFAULT_REQUIRE_REGISTRATION;

/// Lifecycle status of a voting. The discriminants are the numeric codes
/// clients index the states by.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum VotingStatus {
    /// Owner may register voters one at a time.
    AcceptingRegistrations = 0,
    /// Batch registration happened; ballots are accepted.
    Open = 1,
    /// Terminal. Winner (if any) is fixed.
    Closed = 2,
}

impl VotingStatus {
    /// Whether moving from `self` to `next` is a defined forward transition.
    pub fn can_transition_to(&self, next: VotingStatus) -> bool {
        matches!(
            (self, next),
            (Self::AcceptingRegistrations, Self::Open)
                | (Self::AcceptingRegistrations, Self::Closed)
                | (Self::Open, Self::Closed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::Closed
    }
}

/// Per-identity record of one voting.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VoterRecord {
    pub registered: bool,
    pub voted: bool,
}

/// Parameters accepted by `create_voting`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VotingParams {
    pub question: String,
    /// Ordered, unique candidate names.
    pub candidates: Vec<String>,
    /// Seconds from creation until the voting expires.
    pub duration: u64,
    pub quorum_percent: u32,
    /// Identities registered at creation. Seeding does not open the voting.
    pub initial_voters: Vec<Address>,
    /// Defaults to the creator.
    pub owner: Option<Address>,
    /// When set, only registered identities may cast a ballot.
    pub require_registration: bool,
    /// Electorate used for quorum when no voter was ever registered.
    pub electorate_size: Option<u32>,
}

impl VotingParams {
    /// Parameters with no seeded voters, no explicit owner, the default
    /// registration policy and no configured electorate.
    pub fn new(
        env: &Env,
        question: String,
        candidates: Vec<String>,
        duration: u64,
        quorum_percent: u32,
    ) -> Self {
        VotingParams {
            question,
            candidates,
            duration,
            quorum_percent,
            initial_voters: Vec::new(env),
            owner: None,
            require_registration: DEFAULT_REQUIRE_REGISTRATION,
            electorate_size: None,
        }
    }
}

/// Immutable voting configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VotingConfig {
    pub id: u64,
    pub question: String,
    pub candidates: Vec<String>,
    pub time_start: u64,
    pub time_end: u64,
    pub quorum_percent: u32,
    pub owner: Address,
    pub require_registration: bool,
    pub electorate_size: Option<u32>,
}

/// Mutable voting state, updated on registration, ballots and close.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VotingState {
    pub status: VotingStatus,
    /// Parallel to [`VotingConfig::candidates`].
    pub vote_counts: Vec<u64>,
    /// Size of the whitelist.
    pub registered: u32,
    pub winner: Option<String>,
}

/// Vote count of one candidate.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CandidateTally {
    pub name: String,
    pub votes: u64,
}

/// Full on-chain view of a voting.
///
/// Used as the public API return type; reconstructed internally from
/// the split `VotingConfig` + `VotingState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Voting {
    /// Sequential index assigned by the factory.
    pub id: u64,
    pub question: String,
    /// Candidates in declared order, with their counts.
    pub candidates: Vec<CandidateTally>,
    /// Ledger timestamp captured at creation.
    pub time_start: u64,
    /// `time_start + duration`.
    pub time_end: u64,
    pub quorum_percent: u32,
    /// Participation so far, as an integer percentage of the electorate.
    pub quorum_percent_achieved: u32,
    pub owner: Address,
    pub require_registration: bool,
    pub electorate_size: Option<u32>,
    pub status: VotingStatus,
    /// Size of the whitelist.
    pub registered: u32,
    pub total_votes: u64,
    /// `None` until the voting closed with quorum and at least one ballot.
    pub winner: Option<String>,
}
