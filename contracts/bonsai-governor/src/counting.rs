use soroban_sdk::{BytesN, Env};

use governor_kit::{CountingPolicy, GovernorError, ProposalVotes, SimpleCounting, Support, VoterId};

/// Simple counting whose tally is only written by finalization.
///
/// Ballots are committed without weight, so the immediate [`CountingPolicy::count_vote`]
/// path is switched off and [`DeferredCounting::tally`] is used instead.
#[derive(Clone, Copy, Default)]
pub struct DeferredCounting {
    inner: SimpleCounting,
}

impl DeferredCounting {
    pub fn new() -> Self {
        Self {
            inner: SimpleCounting,
        }
    }

    /// Adds one finalized ballot. Repeat voters are not rejected here; the
    /// finalization program already kept a single ballot per voter.
    pub fn tally(
        &self,
        env: &Env,
        proposal_id: &BytesN<32>,
        account: &VoterId,
        support: Support,
        weight: i128,
    ) {
        self.inner.add_weight(env, proposal_id, support, weight);
        self.inner.mark_voted(env, proposal_id, account);
    }
}

impl CountingPolicy for DeferredCounting {
    fn has_voted(&self, env: &Env, proposal_id: &BytesN<32>, account: &VoterId) -> bool {
        self.inner.has_voted(env, proposal_id, account)
    }

    fn proposal_votes(&self, env: &Env, proposal_id: &BytesN<32>) -> ProposalVotes {
        self.inner.proposal_votes(env, proposal_id)
    }

    fn count_vote(
        &self,
        _env: &Env,
        _proposal_id: &BytesN<32>,
        _account: &VoterId,
        _support: Support,
        _weight: i128,
    ) -> Result<(), GovernorError> {
        Err(GovernorError::UnsupportedOperation)
    }
}
