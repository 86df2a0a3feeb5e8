//! Finalization verifier.
//!
//! Accepts the journal of the off-chain finalization program and applies its
//! tally. The checks run in a fixed order: program identity, journal shape,
//! ballot box accumulator, finalized flag, voting period over. Only then are
//! weights looked up.

use soroban_sdk::{log, Bytes, BytesN, Env};

use governor_kit::{
    Governor, GovernorError, Journal, ProposalState, QuorumPolicy, SettingsPolicy, Support,
    VoteWeightSource, VoterId,
};

use crate::counting::DeferredCounting;
use crate::ledger;

#[soroban_sdk::contractevent]
#[derive(Clone, Debug, PartialEq)]
pub struct VoteCounted {
    #[topic]
    pub proposal_id: BytesN<32>,
    #[topic]
    pub voter: VoterId,
    pub support: u32,
    pub weight: i128,
}

#[soroban_sdk::contractevent]
#[derive(Clone, Debug, PartialEq)]
pub struct ProposalFinalized {
    #[topic]
    pub proposal_id: BytesN<32>,
    pub ballots: u32,
    pub final_ballot_box_accum: BytesN<32>,
}

pub fn finalize<S, W, Q>(
    env: &Env,
    governor: &Governor<'_, S, W, Q, DeferredCounting>,
    authorized_image_id: &BytesN<32>,
    journal: Bytes,
    image_id: BytesN<32>,
) -> Result<(), GovernorError>
where
    S: SettingsPolicy,
    W: VoteWeightSource,
    Q: QuorumPolicy,
{
    if image_id != *authorized_image_id {
        log!(env, "callback from unexpected image id", image_id);
        return Err(GovernorError::ImageIdMismatch);
    }

    let journal_len = journal.len();
    let journal = Journal::decode(env, journal).map_err(|err| {
        log!(env, "malformed journal", journal_len);
        err
    })?;

    let proposal_id = journal.proposal_id();
    let stored = ledger::accumulator(env, &proposal_id).ok_or(GovernorError::ProposalNotFound)?;
    let claimed = journal.final_ballot_box_accum();
    if claimed != stored {
        log!(env, "ballot box mismatch", proposal_id, stored, claimed);
        return Err(GovernorError::BallotBoxMismatch);
    }

    if ledger::is_finalized(env, &proposal_id) {
        return Err(GovernorError::AlreadyFinalized);
    }

    // base state, the overlay would hide a closed vote behind Active
    match governor.state(&proposal_id)? {
        ProposalState::Pending => return Err(GovernorError::VotingNotStarted),
        ProposalState::Active => return Err(GovernorError::VotingNotEnded),
        _ => {}
    }

    let snapshot = governor.proposal_snapshot(&proposal_id)?;
    for record in journal.ballots() {
        let support = Support::from_u32(record.support)?;
        let weight = governor
            .votes()
            .get_past_votes(env, &record.voter, snapshot);
        governor
            .counting()
            .tally(env, &proposal_id, &record.voter, support, weight);

        VoteCounted {
            proposal_id: proposal_id.clone(),
            voter: record.voter,
            support: support.as_u32(),
            weight,
        }
        .publish(env);
    }

    ledger::mark_finalized(env, &proposal_id);
    ProposalFinalized {
        proposal_id,
        ballots: journal.ballot_count(),
        final_ballot_box_accum: claimed,
    }
    .publish(env);

    Ok(())
}
