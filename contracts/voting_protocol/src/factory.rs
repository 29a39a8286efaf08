//! # Factory
//!
//! Creates votings on demand and indexes them `0..count` through the
//! instance-storage counter. The factory never mutates a voting after
//! creation; every later operation addresses it by ID.

use soroban_sdk::{Address, Env, String, Vec};

use crate::events;
use crate::storage::{
    get_and_increment_voting_id, load_voting_config, load_voting_state, save_voting,
    voting_count,
};
use crate::types::{Voting, VotingParams};
use crate::voting;
use crate::Error;

/// Create a voting and return its index.
///
/// The owner defaults to `creator`. Publishes `created`, followed by one
/// `register` per seeded voter. Duplicate questions are fine. A rejected
/// call consumes no index.
pub fn create_voting(env: &Env, creator: &Address, params: &VotingParams) -> Result<u64, Error> {
    creator.require_auth();

    let next = voting_count(env);
    let (config, state) = voting::build(env, next, creator, params)?;
    let id = get_and_increment_voting_id(env);

    save_voting(env, &config, &state, &Vec::new(env));
    events::emit_voting_created(
        env,
        id,
        config.owner.clone(),
        config.question.clone(),
        config.time_end,
    );
    voting::seed_voters(env, id, &params.initial_voters)?;
    Ok(id)
}

/// Every voting, in creation order.
pub fn get_votings(env: &Env) -> Result<Vec<Voting>, Error> {
    let mut out = Vec::new(env);
    for id in 0..voting_count(env) {
        out.push_back(voting::snapshot(env, id)?);
    }
    Ok(out)
}

pub fn get_voting_question(env: &Env, id: u64) -> Result<String, Error> {
    Ok(load_voting_config(env, id)?.question)
}

pub fn get_votings_questions(env: &Env) -> Result<Vec<String>, Error> {
    let mut out = Vec::new(env);
    for id in 0..voting_count(env) {
        out.push_back(get_voting_question(env, id)?);
    }
    Ok(out)
}

/// IDs of votings owned by `owner` that have expired but are not closed yet.
pub fn expired_open_votings(env: &Env, owner: &Address) -> Result<Vec<u64>, Error> {
    let mut out = Vec::new(env);
    for id in 0..voting_count(env) {
        let config = load_voting_config(env, id)?;
        if config.owner != *owner || !voting::is_expired(env, &config) {
            continue;
        }
        if !load_voting_state(env, id)?.status.is_terminal() {
            out.push_back(id);
        }
    }
    Ok(out)
}
