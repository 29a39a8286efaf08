//! # Voting instance
//!
//! Rules of a single voting process: fixed question, candidates, deadline and
//! quorum, an owner, and a whitelist grown through registration.
//!
//! | Operation                    | Signer | Allowed in                           |
//! |------------------------------|--------|--------------------------------------|
//! | [`register_voter`]           | owner  | `AcceptingRegistrations`, before end |
//! | [`register_voters`]          | owner  | `AcceptingRegistrations`, before end |
//! | [`vote_for`]                 | voter  | `Open`, before end                   |
//! | [`close_and_determine_winner`] | owner | any non-terminal state              |
//!
//! "Before end" means the ledger timestamp is strictly below `time_end`.
//! Every check runs before the first storage write, so a rejected call
//! leaves the voting exactly as it was.

use soroban_sdk::{Address, Env, Map, String, Vec};

use crate::constants::{
    MAX_BATCH_VOTERS, MAX_CANDIDATES, MAX_CANDIDATE_LENGTH, MAX_QUESTION_LENGTH,
    MAX_QUORUM_PERCENT,
};
use crate::events;
use crate::storage::{
    load_registered, load_voter, load_voting_config, load_voting_state, save_registered,
    save_voter, save_voting_state,
};
use crate::types::{
    CandidateTally, VoterRecord, Voting, VotingConfig, VotingParams, VotingState, VotingStatus,
};
use crate::Error;

// ─────────────────────────────────────────────────────────
// Creation
// ─────────────────────────────────────────────────────────

/// Check creation parameters. Nothing is written.
pub fn validate(params: &VotingParams) -> Result<(), Error> {
    let question_len = params.question.len();
    if question_len > MAX_QUESTION_LENGTH || is_blank(&params.question) {
        return Err(Error::InvalidQuestion);
    }

    let candidates = &params.candidates;
    if candidates.is_empty() {
        return Err(Error::NoCandidates);
    }
    if candidates.len() > MAX_CANDIDATES {
        return Err(Error::TooManyCandidates);
    }
    for (i, name) in candidates.iter().enumerate() {
        if name.len() > MAX_CANDIDATE_LENGTH || is_blank(&name) {
            return Err(Error::InvalidCandidate);
        }
        if candidates.iter().take(i).any(|earlier| earlier == name) {
            return Err(Error::DuplicateCandidate);
        }
    }

    if params.duration == 0 {
        return Err(Error::InvalidDuration);
    }
    if params.quorum_percent > MAX_QUORUM_PERCENT {
        return Err(Error::InvalidQuorum);
    }
    if params.initial_voters.len() > MAX_BATCH_VOTERS {
        return Err(Error::TooManyVoters);
    }
    Ok(())
}

/// Empty or whitespace-only. Callers bound the length first.
fn is_blank(s: &String) -> bool {
    let len = s.len() as usize;
    let mut buf = [0u8; MAX_QUESTION_LENGTH as usize];
    let bytes = &mut buf[..len];
    s.copy_into_slice(bytes);
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Build the configuration and empty state of voting `id`.
pub fn build(
    env: &Env,
    id: u64,
    creator: &Address,
    params: &VotingParams,
) -> Result<(VotingConfig, VotingState), Error> {
    validate(params)?;
    check_new_voters(env, id, &params.initial_voters)?;

    let now = env.ledger().timestamp();
    let time_end = now
        .checked_add(params.duration)
        .ok_or(Error::InvalidDuration)?;

    let config = VotingConfig {
        id,
        question: params.question.clone(),
        candidates: params.candidates.clone(),
        time_start: now,
        time_end,
        quorum_percent: params.quorum_percent,
        owner: params.owner.clone().unwrap_or_else(|| creator.clone()),
        require_registration: params.require_registration,
        electorate_size: params.electorate_size,
    };

    let mut vote_counts = Vec::new(env);
    for _ in 0..config.candidates.len() {
        vote_counts.push_back(0u64);
    }
    let state = VotingState {
        status: VotingStatus::AcceptingRegistrations,
        vote_counts,
        registered: 0,
        winner: None,
    };
    Ok((config, state))
}

/// Reject a batch holding an identity twice or one already registered.
fn check_new_voters(env: &Env, id: u64, voters: &Vec<Address>) -> Result<(), Error> {
    let mut seen: Map<Address, bool> = Map::new(env);
    for voter in voters.iter() {
        if seen.contains_key(voter.clone()) || load_voter(env, id, &voter).registered {
            return Err(Error::AlreadyRegistered);
        }
        seen.set(voter, true);
    }
    Ok(())
}

/// Register initial voters of a freshly stored voting without opening it.
/// [`build`] already rejected duplicates.
pub fn seed_voters(env: &Env, id: u64, voters: &Vec<Address>) -> Result<(), Error> {
    let mut state = load_voting_state(env, id)?;
    register_all(env, id, &mut state, voters);
    save_voting_state(env, id, &state);
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Registration
// ─────────────────────────────────────────────────────────

/// Whitelist a single identity. Owner only.
pub fn register_voter(env: &Env, id: u64, caller: &Address, voter: Address) -> Result<(), Error> {
    caller.require_auth();
    let config = load_voting_config(env, id)?;
    require_owner(&config, caller)?;
    let mut state = load_voting_state(env, id)?;
    check_registration_open(env, &config, &state)?;
    if load_voter(env, id, &voter).registered {
        return Err(Error::AlreadyRegistered);
    }

    let batch = Vec::from_array(env, [voter]);
    register_all(env, id, &mut state, &batch);
    save_voting_state(env, id, &state);
    Ok(())
}

/// Whitelist a batch of identities and open the voting. Owner only.
///
/// The batch is all-or-nothing: an identity that is already registered, or
/// listed twice, rejects the whole call. An empty batch still opens the
/// voting.
pub fn register_voters(
    env: &Env,
    id: u64,
    caller: &Address,
    voters: &Vec<Address>,
) -> Result<(), Error> {
    caller.require_auth();
    let config = load_voting_config(env, id)?;
    require_owner(&config, caller)?;
    let mut state = load_voting_state(env, id)?;
    check_registration_open(env, &config, &state)?;
    if voters.len() > MAX_BATCH_VOTERS {
        return Err(Error::TooManyVoters);
    }
    check_new_voters(env, id, voters)?;

    transition(&mut state, VotingStatus::Open)?;
    register_all(env, id, &mut state, voters);
    save_voting_state(env, id, &state);
    Ok(())
}

fn check_registration_open(
    env: &Env,
    config: &VotingConfig,
    state: &VotingState,
) -> Result<(), Error> {
    if state.status != VotingStatus::AcceptingRegistrations {
        return Err(Error::WrongState);
    }
    if is_expired(env, config) {
        return Err(Error::TimeExpired);
    }
    Ok(())
}

/// Write the voter records and whitelist, announcing each voter. The caller
/// persists `state`.
fn register_all(env: &Env, id: u64, state: &mut VotingState, voters: &Vec<Address>) {
    if voters.is_empty() {
        return;
    }
    let mut registered = load_registered(env, id);
    for voter in voters.iter() {
        let mut record = load_voter(env, id, &voter);
        record.registered = true;
        save_voter(env, id, &voter, &record);
        registered.push_back(voter.clone());
        state.registered += 1;
        events::emit_voter_registered(env, id, voter);
    }
    save_registered(env, id, &registered);
}

// ─────────────────────────────────────────────────────────
// Balloting
// ─────────────────────────────────────────────────────────

/// Cast `voter`'s single ballot for `candidate`.
///
/// Unknown candidates are rejected before anything else, whatever the
/// current state.
pub fn vote_for(env: &Env, id: u64, voter: &Address, candidate: &String) -> Result<(), Error> {
    voter.require_auth();
    let config = load_voting_config(env, id)?;
    let index = candidate_index(&config, candidate).ok_or(Error::CandidateNotFound)?;

    let mut state = load_voting_state(env, id)?;
    if state.status != VotingStatus::Open {
        return Err(Error::WrongState);
    }
    if is_expired(env, &config) {
        return Err(Error::TimeExpired);
    }
    let mut record = load_voter(env, id, voter);
    if config.require_registration && !record.registered {
        return Err(Error::NotWhitelisted);
    }
    if record.voted {
        return Err(Error::AlreadyVoted);
    }

    let count = state.vote_counts.get(index).unwrap_or(0);
    state.vote_counts.set(index, count + 1);
    save_voting_state(env, id, &state);

    record.voted = true;
    save_voter(env, id, voter, &record);

    events::emit_voter_voted(env, id, voter.clone(), candidate.clone());
    Ok(())
}

// ─────────────────────────────────────────────────────────
// Close
// ─────────────────────────────────────────────────────────

/// Close the voting and, if quorum was reached, fix the winner.
/// Owner only; a second call fails with [`Error::WrongState`].
///
/// The winner is the first candidate, in declared order, holding the
/// maximal vote count. No winner is declared when quorum is missed or when
/// no ballot was cast at all.
pub fn close_and_determine_winner(
    env: &Env,
    id: u64,
    caller: &Address,
) -> Result<Option<String>, Error> {
    caller.require_auth();
    let config = load_voting_config(env, id)?;
    require_owner(&config, caller)?;
    let mut state = load_voting_state(env, id)?;
    if state.status.is_terminal() {
        return Err(Error::WrongState);
    }

    let achieved = quorum_of(&config, &state);
    let quorum_achieved = achieved >= config.quorum_percent;
    let winner = if quorum_achieved {
        leading_candidate(&config, &state)
    } else {
        None
    };

    transition(&mut state, VotingStatus::Closed)?;
    state.winner = winner.clone();
    save_voting_state(env, id, &state);

    events::emit_voting_closed(env, id, winner.clone(), quorum_achieved, achieved);
    Ok(winner)
}

fn leading_candidate(config: &VotingConfig, state: &VotingState) -> Option<String> {
    let mut best: Option<(u32, u64)> = None;
    for (index, votes) in state.vote_counts.iter().enumerate() {
        // strict comparison keeps the earliest candidate on ties
        if votes > 0 && best.map_or(true, |(_, max)| votes > max) {
            best = Some((index as u32, votes));
        }
    }
    best.and_then(|(index, _)| config.candidates.get(index))
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

/// Move `state` to `next`, rejecting anything but a forward transition.
pub fn transition(state: &mut VotingState, next: VotingStatus) -> Result<(), Error> {
    if !state.status.can_transition_to(next) {
        return Err(Error::WrongState);
    }
    state.status = next;
    Ok(())
}

fn require_owner(config: &VotingConfig, caller: &Address) -> Result<(), Error> {
    if *caller != config.owner {
        return Err(Error::Unauthorized);
    }
    Ok(())
}

pub fn is_expired(env: &Env, config: &VotingConfig) -> bool {
    env.ledger().timestamp() >= config.time_end
}

pub fn candidate_index(config: &VotingConfig, candidate: &String) -> Option<u32> {
    config
        .candidates
        .iter()
        .position(|name| name == *candidate)
        .map(|i| i as u32)
}

pub fn total_votes(state: &VotingState) -> u64 {
    state.vote_counts.iter().sum()
}

/// Eligible electorate: registered voters, or the configured size when
/// nobody was registered.
fn eligible(config: &VotingConfig, state: &VotingState) -> u32 {
    if state.registered == 0 {
        config.electorate_size.unwrap_or(0)
    } else {
        state.registered
    }
}

/// Participation as an integer percentage of the electorate; 0 when the
/// electorate is empty.
pub fn quorum_of(config: &VotingConfig, state: &VotingState) -> u32 {
    let eligible = eligible(config, state);
    if eligible == 0 {
        return 0;
    }
    let percent = u128::from(total_votes(state)) * 100 / u128::from(eligible);
    u32::try_from(percent).unwrap_or(u32::MAX)
}

// ─────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────

/// Consistent view of configuration and current state.
pub fn snapshot(env: &Env, id: u64) -> Result<Voting, Error> {
    let config = load_voting_config(env, id)?;
    let state = load_voting_state(env, id)?;

    let mut candidates = Vec::new(env);
    for (name, votes) in config.candidates.iter().zip(state.vote_counts.iter()) {
        candidates.push_back(CandidateTally { name, votes });
    }

    Ok(Voting {
        id,
        question: config.question.clone(),
        candidates,
        time_start: config.time_start,
        time_end: config.time_end,
        quorum_percent: config.quorum_percent,
        quorum_percent_achieved: quorum_of(&config, &state),
        owner: config.owner.clone(),
        require_registration: config.require_registration,
        electorate_size: config.electorate_size,
        status: state.status,
        registered: state.registered,
        total_votes: total_votes(&state),
        winner: state.winner.clone(),
    })
}

pub fn voter(env: &Env, id: u64, address: &Address) -> Result<VoterRecord, Error> {
    load_voting_config(env, id)?;
    Ok(load_voter(env, id, address))
}

pub fn candidate_votes(env: &Env, id: u64, candidate: &String) -> Result<u64, Error> {
    let config = load_voting_config(env, id)?;
    let index = candidate_index(&config, candidate).ok_or(Error::CandidateNotFound)?;
    let state = load_voting_state(env, id)?;
    Ok(state.vote_counts.get(index).unwrap_or(0))
}
