//! # Governor Kit
//!
//! Shared governance building blocks for Soroban contracts whose tally is
//! finalized off-chain and delivered back as a proof journal.
//!
//! ## Layout
//! - [`ballot`]: vote support values, 20-byte voter ids, the 24-byte ballot
//!   record and the ballot box accumulator.
//! - [`journal`]: the finalization journal codec and the ballot replay that the
//!   off-chain program runs to produce it.
//! - [`policy`]: strategy objects plugged into the lifecycle (settings, vote
//!   weight source, quorum, counting).
//! - [`lifecycle`]: the proposal lifecycle component composing those policies.
//!
//! ## Ballot accumulator
//! `accum_0 = proposal_id`, `accum_{n+1} = sha256(accum_n || record_n)` where
//! `record_n = [4-byte BE support][20-byte voter]`.

#![no_std]

use soroban_sdk::contracterror;

pub mod ballot;
pub mod journal;
pub mod lifecycle;
pub mod policy;

pub use ballot::{
    fold_ballot, initial_accumulator, voter_id, voter_id_from_public_key, BallotRecord, Support,
    VoterId, BALLOT_RECORD_LEN,
};
pub use journal::{encode_journal, run_finalization, Journal, JOURNAL_HEADER_LEN};
pub use lifecycle::{
    Governor, ProposalAction, ProposalCanceled, ProposalCore, ProposalCreated, ProposalExecuted,
    ProposalState, VoteCast,
};
pub use policy::{
    CountingPolicy, GovernorSettings, ProposalVotes, QuorumFraction, QuorumPolicy,
    SettingsPolicy, SimpleCounting, TokenVotes, VoteWeightSource, QUORUM_DENOMINATOR,
};

#[contracterror]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GovernorError {
    /// Constructor parameters out of range
    InvalidConfig = 1,
    ProposalNotFound = 2,
    ProposalAlreadyExists = 3,
    /// Proposal must carry at least one action
    EmptyProposal = 4,
    /// Proposer votes below the proposal threshold
    InsufficientProposerVotes = 5,
    /// Support is not one of Against / For / Abstain
    InvalidSupport = 10,
    /// Proposal is not in its voting period
    VotingClosed = 11,
    VoteAlreadyCast = 12,
    /// Malformed signature bytes (bad recovery byte or empty r/s)
    InvalidSignature = 13,
    /// Extended voting params are not supported
    ParamsNotSupported = 14,
    /// The immediate-weight voting path is disabled
    UnsupportedOperation = 15,
    /// Callback program identity differs from the authorized image id
    ImageIdMismatch = 20,
    /// Journal shorter than its header or records not a multiple of 24 bytes
    MalformedJournal = 21,
    /// Journal accumulator differs from the on-chain ballot box accumulator
    BallotBoxMismatch = 22,
    AlreadyFinalized = 23,
    /// Finalization before the voting period has started
    VotingNotStarted = 24,
    /// Finalization while the voting period is still open
    VotingNotEnded = 25,
    ProposalNotSuccessful = 30,
    ProposalNotPending = 31,
    NotProposer = 32,
}
