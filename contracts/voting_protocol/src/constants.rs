// Limits applied when a voting is created.

/// Longest accepted question, in bytes.
pub const MAX_QUESTION_LENGTH: u32 = 280;

/// Longest accepted candidate name, in bytes.
pub const MAX_CANDIDATE_LENGTH: u32 = 64;

/// Upper bound on the candidate list of a single voting.
pub const MAX_CANDIDATES: u32 = 32;

/// Upper bound on the voters seeded at creation or registered in one batch.
pub const MAX_BATCH_VOTERS: u32 = 100;

/// Upper bound on a quorum threshold (percent).
pub const MAX_QUORUM_PERCENT: u32 = 100;

/// Default for [`crate::VotingParams::require_registration`].
pub const DEFAULT_REQUIRE_REGISTRATION: bool = true;
