extern crate std;

use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    vec, Address, Env, String, Vec,
};

use crate::invariants::{assert_all_voting_invariants, assert_sequential_ids};
use crate::{Error, VotingParams, VotingProtocol, VotingProtocolClient, VotingStatus};

const QUESTION: &str = "Do you like this tea?";
const START: u64 = 1_700_000_000;

fn setup() -> (Env, VotingProtocolClient<'static>, Address, Address) {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(START);
    let contract_id = env.register(VotingProtocol, ());
    let client = VotingProtocolClient::new(&env, &contract_id);
    let deployer = Address::generate(&env);
    let player = Address::generate(&env);
    (env, client, deployer, player)
}

fn params(env: &Env, question: &str) -> VotingParams {
    VotingParams::new(
        env,
        String::from_str(env, question),
        vec![env, String::from_str(env, "yes"), String::from_str(env, "no")],
        120,
        50,
    )
}

#[test]
fn test_create_voting() {
    let (env, client, deployer, _) = setup();

    let index = client.create_voting(&deployer, &params(&env, QUESTION));

    assert_eq!(index, 0);
    assert_eq!(client.get_votings_count(), 1);

    let voting = client.get_voting(&0);
    assert_eq!(voting.question, String::from_str(&env, QUESTION));
    assert_eq!(voting.time_start, START);
    assert_eq!(voting.owner, deployer);
    assert_eq!(voting.status, VotingStatus::AcceptingRegistrations);

    assert_eq!(client.try_get_voting(&1), Err(Ok(Error::IndexOutOfRange)));
}

#[test]
fn test_create_voting_with_voters_and_owner() {
    let (env, client, deployer, player) = setup();
    let voters = vec![&env, deployer.clone(), player.clone()];
    let mut p = params(&env, QUESTION);
    p.initial_voters = voters.clone();
    p.owner = Some(deployer.clone());

    let id = client.create_voting(&player, &p);

    assert_eq!(client.owner(&id), deployer);
    assert_eq!(client.registered_voters(&id), voters);
    assert_eq!(client.get_voting(&id).registered, 2);
}

#[test]
fn test_indices_are_sequential_and_questions_may_repeat() {
    let (env, client, deployer, _) = setup();

    for i in 0..5u64 {
        let question = if i % 2 == 0 { QUESTION } else { "Coffee?" };
        let index = client.create_voting(&deployer, &params(&env, question));
        assert_eq!(index, i);
        env.ledger().set_timestamp(START + (i + 1) * 10);
    }

    let votings = client.get_votings();
    assert_sequential_ids(&votings);
    for voting in votings.iter() {
        assert_all_voting_invariants(&voting);
    }
    assert_eq!(votings.get(4).unwrap().time_start, START + 40);

    let q = String::from_str(&env, QUESTION);
    let c = String::from_str(&env, "Coffee?");
    assert_eq!(
        client.get_votings_questions(),
        vec![&env, q.clone(), c.clone(), q.clone(), c, q]
    );
}

#[test]
fn test_getters() {
    let (env, client, deployer, _) = setup();
    client.create_voting(&deployer, &params(&env, QUESTION));
    client.create_voting(&deployer, &params(&env, "Coffee?"));

    let votings = client.get_votings();
    assert_eq!(votings.len(), 2);
    assert_eq!(votings.get(1).unwrap(), client.get_voting(&1));

    assert_eq!(
        client.get_voting_question(&0),
        String::from_str(&env, QUESTION)
    );
    assert_eq!(
        client.get_voting_question(&1),
        String::from_str(&env, "Coffee?")
    );
    assert_eq!(
        client.try_get_voting_question(&2),
        Err(Ok(Error::IndexOutOfRange))
    );
    assert_eq!(
        client.try_get_voting(&u64::MAX),
        Err(Ok(Error::IndexOutOfRange))
    );
}

#[test]
fn test_empty_factory() {
    let (_, client, deployer, _) = setup();
    assert_eq!(client.get_votings_count(), 0);
    assert!(client.get_votings().is_empty());
    assert!(client.get_votings_questions().is_empty());
    assert!(client.expired_open_votings(&deployer).is_empty());
}

#[test]
fn test_invalid_creation_does_not_consume_an_index() {
    let (env, client, deployer, _) = setup();

    assert_eq!(
        client.try_create_voting(&deployer, &params(&env, "")),
        Err(Ok(Error::InvalidQuestion))
    );
    assert_eq!(client.get_votings_count(), 0);

    assert_eq!(client.create_voting(&deployer, &params(&env, QUESTION)), 0);
}

#[test]
fn test_instances_are_independent() {
    let (env, client, deployer, player) = setup();
    let first = client.create_voting(&deployer, &params(&env, QUESTION));
    let second = client.create_voting(&player, &params(&env, QUESTION));
    let no = String::from_str(&env, "no");

    client.register_voters(&first, &deployer, &vec![&env, deployer.clone(), player.clone()]);
    client.vote_for(&first, &player, &no);

    // the first owner has no rights over the second instance
    assert_eq!(
        client.try_register_voter(&second, &deployer, &player),
        Err(Ok(Error::Unauthorized))
    );
    assert_eq!(client.status(&second), VotingStatus::AcceptingRegistrations);
    assert_eq!(client.total_votes(&second), 0);
    assert!(!client.voter(&second, &player).voted);
    assert_eq!(client.candidate_votes(&first, &no), 1);
}

#[test]
fn test_expired_open_votings() {
    let (env, client, deployer, player) = setup();
    client.create_voting(&deployer, &params(&env, QUESTION));
    client.create_voting(&player, &params(&env, QUESTION));
    client.create_voting(
        &deployer,
        &VotingParams::new(
            &env,
            String::from_str(&env, "Later?"),
            vec![&env, String::from_str(&env, "yes")],
            3_600,
            0,
        ),
    );

    assert!(client.expired_open_votings(&deployer).is_empty());

    env.ledger().set_timestamp(START + 120);
    assert_eq!(client.expired_open_votings(&deployer), vec![&env, 0u64]);
    assert_eq!(client.expired_open_votings(&player), vec![&env, 1u64]);

    client.close_and_determine_winner(&0, &deployer);
    assert!(client.expired_open_votings(&deployer).is_empty());

    env.ledger().set_timestamp(START + 120 + 3_600);
    let expired: Vec<u64> = client.expired_open_votings(&deployer);
    assert_eq!(expired, vec![&env, 2u64]);
}
