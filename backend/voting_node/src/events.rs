//! Canonical event types emitted by the VotingProtocol contract.
//!
//! These mirror the contract events defined in
//! `contracts/voting_protocol/src/events.rs`: topic `(symbol, voting_id)`,
//! payload a struct with named fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// All recognised event kinds from the voting contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A voting was created (`created` topic).
    VotingCreated,
    /// A voter was whitelisted (`register` topic).
    VoterRegistered,
    /// A ballot was cast (`voted` topic).
    VoterVoted,
    /// A voting was closed (`closed` topic).
    VotingClosed,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::VotingCreated,
            "register" => Self::VoterRegistered,
            "voted" => Self::VoterVoted,
            "closed" => Self::VotingClosed,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VotingCreated => "voting_created",
            Self::VoterRegistered => "voter_registered",
            Self::VoterVoted => "voter_voted",
            Self::VotingClosed => "voting_closed",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded voting event, ready to be stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedEvent {
    /// RPC event id; unique per contract event.
    pub event_id: String,
    pub kind: EventKind,
    pub voting_id: Option<i64>,
    /// Owner, registered voter or ballot caster.
    pub actor: Option<String>,
    /// Question, chosen candidate or winner.
    pub detail: Option<String>,
    /// Event payload as plain JSON.
    pub payload: Value,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// An event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub voting_id: Option<i64>,
    pub actor: Option<String>,
    pub detail: Option<String>,
    pub payload: String,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Indexed view of one voting, folded from its events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VotingRecord {
    pub voting_id: i64,
    pub owner: String,
    pub question: String,
    pub time_end: i64,
    pub registered: i64,
    pub ballots: i64,
    pub closed: bool,
    pub winner: Option<String>,
    pub created_ledger: i64,
}
