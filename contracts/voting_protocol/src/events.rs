//! # Events
//!
//! Every state change publishes one event. Topics are
//! `(symbol, voting_id)` so indexers can filter per voting without decoding
//! the payload:
//!
//! | Topic symbol | Payload            | Published by                                   |
//! |--------------|--------------------|------------------------------------------------|
//! | `created`    | [`VotingCreated`]  | `create_voting`                                |
//! | `register`   | [`VoterRegistered`]| `create_voting` (seeded), `register_voter(s)`  |
//! | `voted`      | [`VoterVoted`]     | `vote_for`                                     |
//! | `closed`     | [`VotingClosed`]   | `close_and_determine_winner`                   |

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VotingCreated {
    pub voting_id: u64,
    pub owner: Address,
    pub question: String,
    pub time_end: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoterRegistered {
    pub voting_id: u64,
    pub voter: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoterVoted {
    pub voting_id: u64,
    pub voter: Address,
    pub candidate: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VotingClosed {
    pub voting_id: u64,
    /// `None` when quorum was missed or no ballot was cast.
    pub winner: Option<String>,
    pub quorum_achieved: bool,
    pub quorum_percent_achieved: u32,
}

pub fn emit_voting_created(
    env: &Env,
    voting_id: u64,
    owner: Address,
    question: String,
    time_end: u64,
) {
    let payload = VotingCreated {
        voting_id,
        owner,
        question,
        time_end,
    };
    env.events()
        .publish((symbol_short!("created"), voting_id), payload);
}

pub fn emit_voter_registered(env: &Env, voting_id: u64, voter: Address) {
    let payload = VoterRegistered { voting_id, voter };
    env.events()
        .publish((symbol_short!("register"), voting_id), payload);
}

pub fn emit_voter_voted(env: &Env, voting_id: u64, voter: Address, candidate: String) {
    let payload = VoterVoted {
        voting_id,
        voter,
        candidate,
    };
    env.events()
        .publish((symbol_short!("voted"), voting_id), payload);
}

pub fn emit_voting_closed(
    env: &Env,
    voting_id: u64,
    winner: Option<String>,
    quorum_achieved: bool,
    quorum_percent_achieved: u32,
) {
    let payload = VotingClosed {
        voting_id,
        winner,
        quorum_achieved,
        quorum_percent_achieved,
    };
    env.events()
        .publish((symbol_short!("closed"), voting_id), payload);
}
