extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events, Ledger as _},
    vec, Address, Env, IntoVal, String, TryIntoVal, Val, Vec,
};

use crate::events::{VoterRegistered, VoterVoted, VotingClosed, VotingCreated};
use crate::{VotingParams, VotingProtocol, VotingProtocolClient};

const QUESTION: &str = "Do you like this tea?";
const START: u64 = 1_700_000_000;

fn setup() -> (Env, VotingProtocolClient<'static>, Address) {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(START);
    let contract_id = env.register(VotingProtocol, ());
    let client = VotingProtocolClient::new(&env, &contract_id);
    let owner = Address::generate(&env);
    (env, client, owner)
}

fn tea(env: &Env) -> VotingParams {
    VotingParams::new(
        env,
        String::from_str(env, QUESTION),
        vec![env, String::from_str(env, "yes"), String::from_str(env, "no")],
        120,
        50,
    )
}

/// The last `n` events as `(topics, data)`, oldest first.
fn tail(env: &Env, n: u32) -> std::vec::Vec<(Vec<Val>, Val)> {
    let all = env.events().all();
    let len = all.len();
    assert!(len >= n, "expected at least {n} events, found {len}");
    (len - n..len)
        .map(|i| {
            let (_, topics, data) = all.get(i).unwrap();
            (topics, data)
        })
        .collect()
}

#[test]
fn test_voting_created_event() {
    let (env, client, owner) = setup();
    let id = client.create_voting(&owner, &tea(&env));

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("created"), voting_id)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("created").into_val(&env),
        id.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    // Data: VotingCreated struct
    let event_data: VotingCreated = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        VotingCreated {
            voting_id: id,
            owner: owner.clone(),
            question: String::from_str(&env, QUESTION),
            time_end: START + 120,
        }
    );
}

#[test]
fn test_seeded_voters_follow_creation_event() {
    let (env, client, owner) = setup();
    let first = Address::generate(&env);
    let second = Address::generate(&env);
    let mut params = tea(&env);
    params.initial_voters = vec![&env, first.clone(), second.clone()];

    let id = client.create_voting(&owner, &params);

    let events = tail(&env, 3);
    let symbols: std::vec::Vec<soroban_sdk::Symbol> = events
        .iter()
        .map(|(topics, _)| topics.get(0).unwrap().try_into_val(&env).unwrap())
        .collect();
    assert_eq!(
        symbols,
        std::vec![
            symbol_short!("created"),
            symbol_short!("register"),
            symbol_short!("register")
        ]
    );

    let last: VoterRegistered = events[2].1.try_into_val(&env).unwrap();
    assert_eq!(
        last,
        VoterRegistered {
            voting_id: id,
            voter: second,
        }
    );
}

#[test]
fn test_voter_registered_event() {
    let (env, client, owner) = setup();
    let id = client.create_voting(&owner, &tea(&env));
    let voter = Address::generate(&env);

    client.register_voter(&id, &owner, &voter);

    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![
            &env,
            symbol_short!("register").into_val(&env),
            id.into_val(&env),
        ]
    );
    let event_data: VoterRegistered = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(event_data, VoterRegistered { voting_id: id, voter });
}

#[test]
fn test_batch_registration_emits_one_event_per_voter() {
    let (env, client, owner) = setup();
    let id = client.create_voting(&owner, &tea(&env));
    let batch = vec![
        &env,
        Address::generate(&env),
        Address::generate(&env),
        Address::generate(&env),
    ];

    client.register_voters(&id, &owner, &batch);

    let registered: std::vec::Vec<Address> = tail(&env, 3)
        .iter()
        .map(|(_, data)| {
            let event: VoterRegistered = data.try_into_val(&env).unwrap();
            event.voter
        })
        .collect();
    assert_eq!(
        registered,
        std::vec![
            batch.get(0).unwrap(),
            batch.get(1).unwrap(),
            batch.get(2).unwrap()
        ]
    );
}

#[test]
fn test_voter_voted_event() {
    let (env, client, owner) = setup();
    let id = client.create_voting(&owner, &tea(&env));
    let voter = Address::generate(&env);
    client.register_voters(&id, &owner, &vec![&env, voter.clone()]);

    client.vote_for(&id, &voter, &String::from_str(&env, "no"));

    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![&env, symbol_short!("voted").into_val(&env), id.into_val(&env)]
    );
    let event_data: VoterVoted = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        VoterVoted {
            voting_id: id,
            voter,
            candidate: String::from_str(&env, "no"),
        }
    );
}

#[test]
fn test_voting_closed_event() {
    let (env, client, owner) = setup();
    let id = client.create_voting(&owner, &tea(&env));
    let voter = Address::generate(&env);
    client.register_voters(&id, &owner, &vec![&env, voter.clone()]);
    client.vote_for(&id, &voter, &String::from_str(&env, "yes"));

    client.close_and_determine_winner(&id, &owner);

    let last_event = env.events().all().last().expect("No events found");
    assert_eq!(
        last_event.1,
        vec![&env, symbol_short!("closed").into_val(&env), id.into_val(&env)]
    );
    let event_data: VotingClosed = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        VotingClosed {
            voting_id: id,
            winner: Some(String::from_str(&env, "yes")),
            quorum_achieved: true,
            quorum_percent_achieved: 100,
        }
    );
}

#[test]
fn test_closed_event_without_quorum_has_no_winner() {
    let (env, client, owner) = setup();
    let id = client.create_voting(&owner, &tea(&env));
    let batch = vec![
        &env,
        Address::generate(&env),
        Address::generate(&env),
        Address::generate(&env),
    ];
    client.register_voters(&id, &owner, &batch);
    client.vote_for(&id, &batch.get(0).unwrap(), &String::from_str(&env, "yes"));

    client.close_and_determine_winner(&id, &owner);

    let last_event = env.events().all().last().expect("No events found");
    let event_data: VotingClosed = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        VotingClosed {
            voting_id: id,
            winner: None,
            quorum_achieved: false,
            quorum_percent_achieved: 33,
        }
    );
}
