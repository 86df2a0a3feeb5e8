//! Ballot commitment ledger: the per-proposal ballot box accumulator, the
//! commitment counter and the finalized flag.

use soroban_sdk::{contracttype, BytesN, Env};

use governor_kit::{fold_ballot, initial_accumulator, BallotRecord, GovernorError};

#[contracttype]
#[derive(Clone)]
enum LedgerKey {
    BallotBox(BytesN<32>),   // proposal_id -> accumulator
    BallotCount(BytesN<32>), // proposal_id -> u32
    Finalized(BytesN<32>),   // proposal_id -> bool
}

/// Starts the ballot box of a freshly created proposal.
pub fn open(env: &Env, proposal_id: &BytesN<32>) {
    env.storage().persistent().set(
        &LedgerKey::BallotBox(proposal_id.clone()),
        &initial_accumulator(proposal_id),
    );
}

/// Folds `record` into the accumulator. Callers validate the ballot first.
pub fn commit(
    env: &Env,
    proposal_id: &BytesN<32>,
    record: &BallotRecord,
) -> Result<BytesN<32>, GovernorError> {
    let accum = accumulator(env, proposal_id).ok_or(GovernorError::ProposalNotFound)?;
    let next = fold_ballot(env, &accum, record);

    let storage = env.storage().persistent();
    storage.set(&LedgerKey::BallotBox(proposal_id.clone()), &next);
    storage.set(
        &LedgerKey::BallotCount(proposal_id.clone()),
        &(ballot_count(env, proposal_id) + 1),
    );
    Ok(next)
}

pub fn accumulator(env: &Env, proposal_id: &BytesN<32>) -> Option<BytesN<32>> {
    env.storage()
        .persistent()
        .get(&LedgerKey::BallotBox(proposal_id.clone()))
}

pub fn ballot_count(env: &Env, proposal_id: &BytesN<32>) -> u32 {
    env.storage()
        .persistent()
        .get(&LedgerKey::BallotCount(proposal_id.clone()))
        .unwrap_or(0)
}

pub fn is_finalized(env: &Env, proposal_id: &BytesN<32>) -> bool {
    env.storage()
        .persistent()
        .get(&LedgerKey::Finalized(proposal_id.clone()))
        .unwrap_or(false)
}

pub fn mark_finalized(env: &Env, proposal_id: &BytesN<32>) {
    env.storage()
        .persistent()
        .set(&LedgerKey::Finalized(proposal_id.clone()), &true);
}
