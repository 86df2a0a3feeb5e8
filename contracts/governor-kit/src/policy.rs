//! Strategy objects composed by [`crate::lifecycle::Governor`].
//!
//! Each concern that a governance framework usually mixes in (settings, vote
//! weight lookup, quorum, counting) is a trait with one storage-backed or
//! cross-contract implementation here. Contracts pick and wrap them.

use soroban_sdk::{contracttype, Address, BytesN, Env, IntoVal, Symbol};

use crate::ballot::{Support, VoterId};
use crate::GovernorError;

pub const QUORUM_DENOMINATOR: u32 = 100;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GovernorSettings {
    /// Ledgers between proposal creation and the vote start (snapshot)
    pub voting_delay: u32,
    /// Ledgers between vote start and vote end
    pub voting_period: u32,
    /// Votes a proposer needs to create a proposal
    pub proposal_threshold: i128,
}

pub trait SettingsPolicy {
    fn voting_delay(&self) -> u32;
    fn voting_period(&self) -> u32;
    fn proposal_threshold(&self) -> i128;
}

impl SettingsPolicy for GovernorSettings {
    fn voting_delay(&self) -> u32 {
        self.voting_delay
    }

    fn voting_period(&self) -> u32 {
        self.voting_period
    }

    fn proposal_threshold(&self) -> i128 {
        self.proposal_threshold
    }
}

/// Source of snapshot voting weight.
pub trait VoteWeightSource {
    /// Timepoint used for snapshots and deadlines.
    fn clock(&self, env: &Env) -> u32 {
        env.ledger().sequence()
    }

    fn get_past_votes(&self, env: &Env, account: &VoterId, timepoint: u32) -> i128;

    fn get_past_total_supply(&self, env: &Env, timepoint: u32) -> i128;
}

/// Reads weights from a checkpointed votes token contract.
#[derive(Clone)]
pub struct TokenVotes {
    token: Address,
}

impl TokenVotes {
    pub fn new(token: Address) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &Address {
        &self.token
    }
}

impl VoteWeightSource for TokenVotes {
    fn get_past_votes(&self, env: &Env, account: &VoterId, timepoint: u32) -> i128 {
        env.invoke_contract(
            &self.token,
            &Symbol::new(env, "get_past_votes"),
            soroban_sdk::vec![env, account.into_val(env), timepoint.into_val(env)],
        )
    }

    fn get_past_total_supply(&self, env: &Env, timepoint: u32) -> i128 {
        env.invoke_contract(
            &self.token,
            &Symbol::new(env, "get_past_total_supply"),
            soroban_sdk::vec![env, timepoint.into_val(env)],
        )
    }
}

pub trait QuorumPolicy {
    fn quorum<W: VoteWeightSource>(&self, env: &Env, votes: &W, timepoint: u32) -> i128;
}

/// Quorum as a percentage of the total supply at the snapshot.
#[derive(Clone, Copy)]
pub struct QuorumFraction {
    numerator: u32,
}

impl QuorumFraction {
    pub fn new(numerator: u32) -> Self {
        Self { numerator }
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }
}

impl QuorumPolicy for QuorumFraction {
    fn quorum<W: VoteWeightSource>(&self, env: &Env, votes: &W, timepoint: u32) -> i128 {
        votes.get_past_total_supply(env, timepoint) * i128::from(self.numerator)
            / i128::from(QUORUM_DENOMINATOR)
    }
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProposalVotes {
    pub against: i128,
    pub for_votes: i128,
    pub abstain: i128,
}

pub trait CountingPolicy {
    fn has_voted(&self, env: &Env, proposal_id: &BytesN<32>, account: &VoterId) -> bool;

    fn proposal_votes(&self, env: &Env, proposal_id: &BytesN<32>) -> ProposalVotes;

    /// Records a weighted vote at the moment it is cast.
    fn count_vote(
        &self,
        env: &Env,
        proposal_id: &BytesN<32>,
        account: &VoterId,
        support: Support,
        weight: i128,
    ) -> Result<(), GovernorError>;

    /// For and abstain votes both count towards quorum.
    fn quorum_reached(&self, env: &Env, proposal_id: &BytesN<32>, quorum: i128) -> bool {
        let votes = self.proposal_votes(env, proposal_id);
        quorum <= votes.for_votes + votes.abstain
    }

    fn vote_succeeded(&self, env: &Env, proposal_id: &BytesN<32>) -> bool {
        let votes = self.proposal_votes(env, proposal_id);
        votes.for_votes > votes.against
    }
}

#[contracttype]
#[derive(Clone)]
enum CountingKey {
    Votes(BytesN<32>),          // proposal_id -> ProposalVotes
    Voted(BytesN<32>, VoterId), // (proposal_id, voter) -> bool
}

/// Against / For / Abstain tallies in persistent storage.
#[derive(Clone, Copy, Default)]
pub struct SimpleCounting;

impl SimpleCounting {
    pub fn add_weight(&self, env: &Env, proposal_id: &BytesN<32>, support: Support, weight: i128) {
        let mut votes = self.proposal_votes(env, proposal_id);
        match support {
            Support::Against => votes.against += weight,
            Support::For => votes.for_votes += weight,
            Support::Abstain => votes.abstain += weight,
        }
        env.storage()
            .persistent()
            .set(&CountingKey::Votes(proposal_id.clone()), &votes);
    }

    pub fn mark_voted(&self, env: &Env, proposal_id: &BytesN<32>, account: &VoterId) {
        env.storage()
            .persistent()
            .set(&CountingKey::Voted(proposal_id.clone(), account.clone()), &true);
    }
}

impl CountingPolicy for SimpleCounting {
    fn has_voted(&self, env: &Env, proposal_id: &BytesN<32>, account: &VoterId) -> bool {
        env.storage()
            .persistent()
            .has(&CountingKey::Voted(proposal_id.clone(), account.clone()))
    }

    fn proposal_votes(&self, env: &Env, proposal_id: &BytesN<32>) -> ProposalVotes {
        env.storage()
            .persistent()
            .get(&CountingKey::Votes(proposal_id.clone()))
            .unwrap_or_default()
    }

    fn count_vote(
        &self,
        env: &Env,
        proposal_id: &BytesN<32>,
        account: &VoterId,
        support: Support,
        weight: i128,
    ) -> Result<(), GovernorError> {
        if self.has_voted(env, proposal_id, account) {
            return Err(GovernorError::VoteAlreadyCast);
        }
        self.mark_voted(env, proposal_id, account);
        self.add_weight(env, proposal_id, support, weight);
        Ok(())
    }
}
