//! Finalization journal codec.
//!
//! Layout (bit-exact, no delimiters):
//! `[32 bytes proposal id][32 bytes final ballot box accumulator][N x 24 bytes ballot records]`
//!
//! [`run_finalization`] is the computation the off-chain finalization program
//! performs over the committed ballot stream before its output is proven.

use soroban_sdk::{Bytes, BytesN, Env, Map, Vec};

use crate::ballot::{fold_ballot, initial_accumulator, BallotRecord, VoterId, BALLOT_RECORD_LEN};
use crate::GovernorError;

pub const JOURNAL_HEADER_LEN: u32 = 64;

/// Read-only view over a raw journal. Fields are sliced out of the host buffer
/// on access; the record segment is never materialized as a whole.
#[derive(Clone)]
pub struct Journal {
    env: Env,
    raw: Bytes,
    ballots: u32,
}

impl Journal {
    pub fn decode(env: &Env, raw: Bytes) -> Result<Self, GovernorError> {
        let len = raw.len();
        if len < JOURNAL_HEADER_LEN {
            return Err(GovernorError::MalformedJournal);
        }
        let body = len - JOURNAL_HEADER_LEN;
        if body % BALLOT_RECORD_LEN != 0 {
            return Err(GovernorError::MalformedJournal);
        }
        Ok(Self {
            env: env.clone(),
            raw,
            ballots: body / BALLOT_RECORD_LEN,
        })
    }

    pub fn proposal_id(&self) -> BytesN<32> {
        self.word(0)
    }

    pub fn final_ballot_box_accum(&self) -> BytesN<32> {
        self.word(32)
    }

    pub fn ballot_count(&self) -> u32 {
        self.ballots
    }

    pub fn ballot(&self, index: u32) -> Option<BallotRecord> {
        if index >= self.ballots {
            return None;
        }
        let start = JOURNAL_HEADER_LEN + index * BALLOT_RECORD_LEN;
        let mut raw = [0u8; 24];
        self.raw
            .slice(start..start + BALLOT_RECORD_LEN)
            .copy_into_slice(&mut raw);
        Some(BallotRecord::from_array(&self.env, &raw))
    }

    pub fn ballots(&self) -> impl Iterator<Item = BallotRecord> + '_ {
        (0..self.ballots).filter_map(move |i| self.ballot(i))
    }

    fn word(&self, offset: u32) -> BytesN<32> {
        let mut buf = [0u8; 32];
        self.raw.slice(offset..offset + 32).copy_into_slice(&mut buf);
        BytesN::from_array(&self.env, &buf)
    }
}

pub fn encode_journal(
    env: &Env,
    proposal_id: &BytesN<32>,
    final_ballot_box_accum: &BytesN<32>,
    ballots: &Vec<BallotRecord>,
) -> Bytes {
    let mut out = Bytes::from_array(env, &proposal_id.to_array());
    out.extend_from_array(&final_ballot_box_accum.to_array());
    for record in ballots.iter() {
        out.extend_from_array(&record.to_array());
    }
    out
}

/// Replays `committed` (in commitment order) into the ballot box accumulator
/// and keeps the first ballot of every voter, in order of first appearance.
pub fn run_finalization(
    env: &Env,
    proposal_id: &BytesN<32>,
    committed: &Vec<BallotRecord>,
) -> Bytes {
    let mut accum = initial_accumulator(proposal_id);
    let mut seen: Map<VoterId, bool> = Map::new(env);
    let mut unique = Vec::new(env);

    for record in committed.iter() {
        accum = fold_ballot(env, &accum, &record);
        if !seen.contains_key(record.voter.clone()) {
            seen.set(record.voter.clone(), true);
            unique.push_back(record);
        }
    }

    encode_journal(env, proposal_id, &accum, &unique)
}
