#![allow(dead_code)]

extern crate std;

use crate::types::{Voting, VotingStatus};

/// INV-1: The voting ends strictly after it starts.
pub fn assert_time_window(voting: &Voting) {
    assert!(
        voting.time_end > voting.time_start,
        "INV-1 violated: voting {} ends at {} but starts at {}",
        voting.id,
        voting.time_end,
        voting.time_start
    );
}

/// INV-2: Candidate names are unique and the list is non-empty.
pub fn assert_unique_candidates(voting: &Voting) {
    assert!(
        !voting.candidates.is_empty(),
        "INV-2 violated: voting {} has no candidates",
        voting.id
    );
    for (i, a) in voting.candidates.iter().enumerate() {
        for b in voting.candidates.iter().skip(i + 1) {
            assert_ne!(
                a.name, b.name,
                "INV-2 violated: voting {} has duplicate candidates",
                voting.id
            );
        }
    }
}

/// INV-3: The tally adds up, and under a whitelist ballots never outnumber
/// registered voters.
pub fn assert_one_ballot_per_voter(voting: &Voting) {
    let sum: u64 = voting.candidates.iter().map(|c| c.votes).sum();
    assert_eq!(
        sum, voting.total_votes,
        "INV-3 violated: tally sum {} differs from total {}",
        sum, voting.total_votes
    );
    if voting.require_registration {
        assert!(
            voting.total_votes <= u64::from(voting.registered),
            "INV-3 violated: {} ballots from {} registered voters",
            voting.total_votes,
            voting.registered
        );
    }
}

/// INV-4: A winner exists only on a closed voting, and names a candidate.
pub fn assert_winner_only_when_closed(voting: &Voting) {
    if let Some(winner) = &voting.winner {
        assert_eq!(
            voting.status,
            VotingStatus::Closed,
            "INV-4 violated: voting {} has a winner while {:?}",
            voting.id,
            voting.status
        );
        assert!(
            voting.candidates.iter().any(|c| &c.name == winner),
            "INV-4 violated: winner is not a candidate of voting {}",
            voting.id
        );
    }
}

/// INV-5: Vote counts never decrease.
pub fn assert_counts_monotonic(before: &Voting, after: &Voting) {
    for (b, a) in before.candidates.iter().zip(after.candidates.iter()) {
        assert!(
            a.votes >= b.votes,
            "INV-5 violated: a candidate went from {} to {} votes",
            b.votes,
            a.votes
        );
    }
}

/// INV-6: Status only moves forward.
pub fn assert_valid_status_transition(from: VotingStatus, to: VotingStatus) {
    assert!(
        from == to || from.can_transition_to(to),
        "INV-6 violated: invalid status transition from {:?} to {:?}",
        from,
        to
    );
}

/// INV-7: Fields fixed at creation never change.
pub fn assert_immutable_fields(original: &Voting, current: &Voting) {
    assert_eq!(original.id, current.id, "INV-7 violated: id changed");
    assert_eq!(
        original.question, current.question,
        "INV-7 violated: question changed"
    );
    assert_eq!(
        original.candidates.len(),
        current.candidates.len(),
        "INV-7 violated: candidates changed"
    );
    for (o, c) in original.candidates.iter().zip(current.candidates.iter()) {
        assert_eq!(o.name, c.name, "INV-7 violated: candidates changed");
    }
    assert_eq!(
        (original.time_start, original.time_end),
        (current.time_start, current.time_end),
        "INV-7 violated: time window changed"
    );
    assert_eq!(
        original.quorum_percent, current.quorum_percent,
        "INV-7 violated: quorum changed"
    );
    assert_eq!(original.owner, current.owner, "INV-7 violated: owner changed");
}

/// INV-8: Factory indices are sequential from 0.
pub fn assert_sequential_ids(votings: &soroban_sdk::Vec<Voting>) {
    for (i, voting) in votings.iter().enumerate() {
        assert_eq!(
            voting.id, i as u64,
            "INV-8 violated: expected id {}, got {}",
            i, voting.id
        );
    }
}

/// Run all stateless invariants.
pub fn assert_all_voting_invariants(voting: &Voting) {
    assert_time_window(voting);
    assert_unique_candidates(voting);
    assert_one_ballot_per_voter(voting);
    assert_winner_only_when_closed(voting);
}
