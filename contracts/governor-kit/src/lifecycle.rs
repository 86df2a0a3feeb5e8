//! Proposal lifecycle.
//!
//! [`Governor`] owns no configuration of its own: it dispatches to the
//! settings, vote weight, quorum and counting policies it is built with, so a
//! contract can swap any one of them (the Bonsai governor replaces counting).

use soroban_sdk::{contracttype, xdr::ToXdr, Address, BytesN, Env, String, Symbol, Val, Vec};

use crate::ballot::{voter_id, Support, VoterId};
use crate::policy::{CountingPolicy, QuorumPolicy, SettingsPolicy, VoteWeightSource};
use crate::GovernorError;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ProposalState {
    Pending = 0,
    Active = 1,
    Canceled = 2,
    Defeated = 3,
    Succeeded = 4,
    Executed = 5,
}

/// A contract call performed when the proposal is executed.
#[contracttype]
#[derive(Clone)]
pub struct ProposalAction {
    pub target: Address,
    pub function: Symbol,
    pub args: Vec<Val>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalCore {
    pub proposer: Address,
    pub vote_start: u32, // snapshot timepoint
    pub vote_end: u32,   // deadline (inclusive)
    pub executed: bool,
    pub canceled: bool,
}

#[contracttype]
#[derive(Clone)]
enum LifecycleKey {
    Proposal(BytesN<32>), // proposal_id -> ProposalCore
}

// Typed Events
#[soroban_sdk::contractevent]
#[derive(Clone, Debug, PartialEq)]
pub struct ProposalCreated {
    #[topic]
    pub proposal_id: BytesN<32>,
    pub proposer: Address,
    pub vote_start: u32,
    pub vote_end: u32,
    pub description: String,
}

#[soroban_sdk::contractevent]
#[derive(Clone, Debug, PartialEq)]
pub struct ProposalExecuted {
    #[topic]
    pub proposal_id: BytesN<32>,
}

#[soroban_sdk::contractevent]
#[derive(Clone, Debug, PartialEq)]
pub struct ProposalCanceled {
    #[topic]
    pub proposal_id: BytesN<32>,
}

#[soroban_sdk::contractevent]
#[derive(Clone, Debug, PartialEq)]
pub struct VoteCast {
    #[topic]
    pub proposal_id: BytesN<32>,
    #[topic]
    pub voter: VoterId,
    pub support: u32,
    pub weight: i128,
    pub reason: String,
}

pub struct Governor<'a, S, W, Q, C> {
    env: &'a Env,
    settings: S,
    votes: W,
    quorum: Q,
    counting: C,
}

impl<'a, S, W, Q, C> Governor<'a, S, W, Q, C>
where
    S: SettingsPolicy,
    W: VoteWeightSource,
    Q: QuorumPolicy,
    C: CountingPolicy,
{
    pub fn new(env: &'a Env, settings: S, votes: W, quorum: Q, counting: C) -> Self {
        Self {
            env,
            settings,
            votes,
            quorum,
            counting,
        }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn votes(&self) -> &W {
        &self.votes
    }

    pub fn counting(&self) -> &C {
        &self.counting
    }

    pub fn clock(&self) -> u32 {
        self.votes.clock(self.env)
    }

    pub fn description_hash(&self, description: &String) -> BytesN<32> {
        let payload = description.clone().to_xdr(self.env);
        self.env.crypto().keccak256(&payload).to_bytes()
    }

    /// `keccak256(xdr((actions, description_hash)))`
    pub fn hash_proposal(
        &self,
        actions: &Vec<ProposalAction>,
        description_hash: &BytesN<32>,
    ) -> BytesN<32> {
        let payload = (actions.clone(), description_hash.clone()).to_xdr(self.env);
        self.env.crypto().keccak256(&payload).to_bytes()
    }

    pub fn proposal(&self, proposal_id: &BytesN<32>) -> Result<ProposalCore, GovernorError> {
        self.env
            .storage()
            .persistent()
            .get(&LifecycleKey::Proposal(proposal_id.clone()))
            .ok_or(GovernorError::ProposalNotFound)
    }

    pub fn proposal_snapshot(&self, proposal_id: &BytesN<32>) -> Result<u32, GovernorError> {
        Ok(self.proposal(proposal_id)?.vote_start)
    }

    pub fn proposal_deadline(&self, proposal_id: &BytesN<32>) -> Result<u32, GovernorError> {
        Ok(self.proposal(proposal_id)?.vote_end)
    }

    pub fn proposal_proposer(&self, proposal_id: &BytesN<32>) -> Result<Address, GovernorError> {
        Ok(self.proposal(proposal_id)?.proposer)
    }

    pub fn quorum(&self, timepoint: u32) -> i128 {
        self.quorum.quorum(self.env, &self.votes, timepoint)
    }

    pub fn state(&self, proposal_id: &BytesN<32>) -> Result<ProposalState, GovernorError> {
        let core = self.proposal(proposal_id)?;
        if core.executed {
            return Ok(ProposalState::Executed);
        }
        if core.canceled {
            return Ok(ProposalState::Canceled);
        }

        let current = self.clock();
        if core.vote_start >= current {
            return Ok(ProposalState::Pending);
        }
        if core.vote_end >= current {
            return Ok(ProposalState::Active);
        }

        let quorum = self.quorum(core.vote_start);
        if self.counting.quorum_reached(self.env, proposal_id, quorum)
            && self.counting.vote_succeeded(self.env, proposal_id)
        {
            Ok(ProposalState::Succeeded)
        } else {
            Ok(ProposalState::Defeated)
        }
    }

    /// The caller is expected to have authorized `proposer`.
    pub fn propose(
        &self,
        proposer: &Address,
        actions: Vec<ProposalAction>,
        description: String,
    ) -> Result<BytesN<32>, GovernorError> {
        let current = self.clock();

        let threshold = self.settings.proposal_threshold();
        if threshold > 0 {
            let proposer_votes = self.votes.get_past_votes(
                self.env,
                &voter_id(self.env, proposer),
                current.saturating_sub(1),
            );
            if proposer_votes < threshold {
                return Err(GovernorError::InsufficientProposerVotes);
            }
        }

        if actions.is_empty() {
            return Err(GovernorError::EmptyProposal);
        }

        let proposal_id = self.hash_proposal(&actions, &self.description_hash(&description));
        let key = LifecycleKey::Proposal(proposal_id.clone());
        if self.env.storage().persistent().has(&key) {
            return Err(GovernorError::ProposalAlreadyExists);
        }

        let vote_start = current
            .checked_add(self.settings.voting_delay())
            .ok_or(GovernorError::InvalidConfig)?;
        let vote_end = vote_start
            .checked_add(self.settings.voting_period())
            .ok_or(GovernorError::InvalidConfig)?;
        let core = ProposalCore {
            proposer: proposer.clone(),
            vote_start,
            vote_end,
            executed: false,
            canceled: false,
        };
        self.env.storage().persistent().set(&key, &core);

        ProposalCreated {
            proposal_id: proposal_id.clone(),
            proposer: proposer.clone(),
            vote_start,
            vote_end,
            description,
        }
        .publish(self.env);

        Ok(proposal_id)
    }

    /// Immediate-weight voting: looks up the snapshot weight and counts it now.
    pub fn cast_vote(
        &self,
        proposal_id: &BytesN<32>,
        account: &VoterId,
        support: Support,
        reason: String,
    ) -> Result<i128, GovernorError> {
        if self.state(proposal_id)? != ProposalState::Active {
            return Err(GovernorError::VotingClosed);
        }

        let snapshot = self.proposal_snapshot(proposal_id)?;
        let weight = self.votes.get_past_votes(self.env, account, snapshot);
        self.counting
            .count_vote(self.env, proposal_id, account, support, weight)?;

        VoteCast {
            proposal_id: proposal_id.clone(),
            voter: account.clone(),
            support: support.as_u32(),
            weight,
            reason,
        }
        .publish(self.env);

        Ok(weight)
    }

    pub fn execute(
        &self,
        actions: Vec<ProposalAction>,
        description_hash: BytesN<32>,
    ) -> Result<BytesN<32>, GovernorError> {
        let proposal_id = self.hash_proposal(&actions, &description_hash);
        if self.state(&proposal_id)? != ProposalState::Succeeded {
            return Err(GovernorError::ProposalNotSuccessful);
        }

        let mut core = self.proposal(&proposal_id)?;
        core.executed = true;
        self.env
            .storage()
            .persistent()
            .set(&LifecycleKey::Proposal(proposal_id.clone()), &core);

        for action in actions.iter() {
            let _: Val = self
                .env
                .invoke_contract(&action.target, &action.function, action.args.clone());
        }

        ProposalExecuted {
            proposal_id: proposal_id.clone(),
        }
        .publish(self.env);

        Ok(proposal_id)
    }

    /// Only the proposer, and only before voting starts.
    pub fn cancel(
        &self,
        caller: &Address,
        actions: Vec<ProposalAction>,
        description_hash: BytesN<32>,
    ) -> Result<BytesN<32>, GovernorError> {
        let proposal_id = self.hash_proposal(&actions, &description_hash);
        let mut core = self.proposal(&proposal_id)?;
        if core.proposer != *caller {
            return Err(GovernorError::NotProposer);
        }
        if self.state(&proposal_id)? != ProposalState::Pending {
            return Err(GovernorError::ProposalNotPending);
        }

        core.canceled = true;
        self.env
            .storage()
            .persistent()
            .set(&LifecycleKey::Proposal(proposal_id.clone()), &core);

        ProposalCanceled {
            proposal_id: proposal_id.clone(),
        }
        .publish(self.env);

        Ok(proposal_id)
    }
}
