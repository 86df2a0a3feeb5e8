//! # Bonsai Governor
//!
//! A governor whose tally is computed off-chain by a zero-knowledge program
//! and delivered back through a callback relay.
//!
//! ## Voting
//! Ballots are committed without resolving weight. Every commitment (direct,
//! or admitted from a secp256k1 signature over a typed-data digest) is folded
//! into a per-proposal ballot box accumulator:
//! `accum = sha256(accum || [4-byte BE support][20-byte voter])`.
//!
//! ## Finalization
//! The relay invokes [`BonsaiGovernor::on_callback`] with the program journal
//! `[32 proposal id][32 final accumulator][N x 24 ballot records]`. The tally is
//! applied only if the journal comes from the authorized image id and its
//! accumulator equals the on-chain one. A proposal is finalized once.
//!
//! ## State
//! Until a proposal is finalized its tally is empty, so the framework would
//! call it Defeated once voting ends. [`BonsaiGovernor::state`] reports such a
//! proposal as Active until the tally arrives.

#![no_std]

use soroban_sdk::{
    contract, contractimpl, contracttype, panic_with_error, symbol_short, Address, Bytes, BytesN,
    Env, String, Symbol, Vec,
};

use governor_kit::{
    voter_id, BallotRecord, CountingPolicy, Governor, GovernorError, GovernorSettings,
    ProposalAction, ProposalState, ProposalVotes, QuorumFraction, SettingsPolicy, Support,
    TokenVotes, VoteCast, VoterId, QUORUM_DENOMINATOR,
};

mod admission;
mod counting;
mod finalize;
mod ledger;

pub use admission::{NAME, VERSION};
pub use counting::DeferredCounting;
pub use finalize::{ProposalFinalized, VoteCounted};

const CONFIG: Symbol = symbol_short!("config");

/// Deployment parameters. Fixed at construction.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GovernorConfig {
    pub image_id: BytesN<32>,  // finalization program identity
    pub token: Address,        // votes token (get_past_votes / get_past_total_supply)
    pub relay: Address,        // only caller of on_callback
    pub settings: GovernorSettings,
    pub quorum_numerator: u32, // percent of past total supply
}

type Framework<'a> = Governor<'a, GovernorSettings, TokenVotes, QuorumFraction, DeferredCounting>;

fn load_config(env: &Env) -> GovernorConfig {
    env.storage()
        .instance()
        .get(&CONFIG)
        .unwrap_or_else(|| panic_with_error!(env, GovernorError::InvalidConfig))
}

fn framework(env: &Env) -> Framework<'_> {
    let config = load_config(env);
    Governor::new(
        env,
        config.settings,
        TokenVotes::new(config.token),
        QuorumFraction::new(config.quorum_numerator),
        DeferredCounting::new(),
    )
}

/// Common path of every ballot surface. Returns the provisional weight (0).
fn commit_ballot(
    env: &Env,
    proposal_id: BytesN<32>,
    support: Support,
    voter: VoterId,
    reason: String,
) -> Result<i128, GovernorError> {
    // base state: ballots after the deadline are refused while the overlay
    // still reports Active. Finalization also waits for the base state to
    // leave Active, so a finalized ballot box is closed here too.
    if framework(env).state(&proposal_id)? != ProposalState::Active {
        return Err(GovernorError::VotingClosed);
    }

    ledger::commit(env, &proposal_id, &BallotRecord::new(support, voter.clone()))?;

    VoteCast {
        proposal_id,
        voter,
        support: support.as_u32(),
        weight: 0,
        reason,
    }
    .publish(env);

    Ok(0)
}

#[contract]
pub struct BonsaiGovernor;

#[contractimpl]
impl BonsaiGovernor {
    pub fn __constructor(env: Env, config: GovernorConfig) {
        if config.settings.voting_period == 0
            || config.settings.proposal_threshold < 0
            || config.quorum_numerator > QUORUM_DENOMINATOR
        {
            panic_with_error!(&env, GovernorError::InvalidConfig);
        }
        env.storage().instance().set(&CONFIG, &config);
    }

    // ========================================================================
    // Finalization callback
    // ========================================================================

    /// Relay entry point. Returns an empty acknowledgment.
    pub fn on_callback(
        env: Env,
        journal: Bytes,
        image_id: BytesN<32>,
    ) -> Result<Bytes, GovernorError> {
        let config = load_config(&env);
        config.relay.require_auth();

        finalize::finalize(&env, &framework(&env), &config.image_id, journal, image_id)?;
        Ok(Bytes::new(&env))
    }

    // ========================================================================
    // Ballots
    // ========================================================================

    pub fn cast_vote(
        env: Env,
        proposal_id: BytesN<32>,
        voter: Address,
        support: u32,
    ) -> Result<i128, GovernorError> {
        let support = Support::from_u32(support)?;
        voter.require_auth();
        let id = voter_id(&env, &voter);
        commit_ballot(&env, proposal_id, support, id, String::from_str(&env, ""))
    }

    pub fn cast_vote_with_reason(
        env: Env,
        proposal_id: BytesN<32>,
        voter: Address,
        support: u32,
        reason: String,
    ) -> Result<i128, GovernorError> {
        let support = Support::from_u32(support)?;
        voter.require_auth();
        let id = voter_id(&env, &voter);
        commit_ballot(&env, proposal_id, support, id, reason)
    }

    pub fn cast_vote_with_reason_and_params(
        env: Env,
        proposal_id: BytesN<32>,
        voter: Address,
        support: u32,
        reason: String,
        params: Bytes,
    ) -> Result<i128, GovernorError> {
        if !params.is_empty() {
            return Err(GovernorError::ParamsNotSupported);
        }
        let support = Support::from_u32(support)?;
        voter.require_auth();
        let id = voter_id(&env, &voter);
        commit_ballot(&env, proposal_id, support, id, reason)
    }

    /// `signature` is `r || s || v` over [`BonsaiGovernor::ballot_digest`].
    pub fn cast_vote_by_sig(
        env: Env,
        proposal_id: BytesN<32>,
        support: u32,
        signature: BytesN<65>,
    ) -> Result<i128, GovernorError> {
        let digest = admission::ballot_digest(&env, &proposal_id, support);
        let support = Support::from_u32(support)?;
        let voter = admission::recover_voter(&env, &digest, &signature)?;
        commit_ballot(&env, proposal_id, support, voter, String::from_str(&env, ""))
    }

    /// `signature` is `r || s || v` over [`BonsaiGovernor::extended_ballot_digest`].
    pub fn cast_vote_with_reason_and_params_by_sig(
        env: Env,
        proposal_id: BytesN<32>,
        support: u32,
        reason: String,
        params: Bytes,
        signature: BytesN<65>,
    ) -> Result<i128, GovernorError> {
        if !params.is_empty() {
            return Err(GovernorError::ParamsNotSupported);
        }
        let digest =
            admission::extended_ballot_digest(&env, &proposal_id, support, &reason, &params);
        let support = Support::from_u32(support)?;
        let voter = admission::recover_voter(&env, &digest, &signature)?;
        commit_ballot(&env, proposal_id, support, voter, reason)
    }

    // ========================================================================
    // Proposal lifecycle
    // ========================================================================

    pub fn propose(
        env: Env,
        proposer: Address,
        actions: Vec<ProposalAction>,
        description: String,
    ) -> Result<BytesN<32>, GovernorError> {
        proposer.require_auth();
        let proposal_id = framework(&env).propose(&proposer, actions, description)?;
        ledger::open(&env, &proposal_id);
        Ok(proposal_id)
    }

    /// Permissionless once the proposal has Succeeded, which requires a
    /// finalized tally.
    pub fn execute(
        env: Env,
        actions: Vec<ProposalAction>,
        description_hash: BytesN<32>,
    ) -> Result<BytesN<32>, GovernorError> {
        framework(&env).execute(actions, description_hash)
    }

    pub fn cancel(
        env: Env,
        proposer: Address,
        actions: Vec<ProposalAction>,
        description_hash: BytesN<32>,
    ) -> Result<BytesN<32>, GovernorError> {
        proposer.require_auth();
        framework(&env).cancel(&proposer, actions, description_hash)
    }

    pub fn hash_proposal(
        env: Env,
        actions: Vec<ProposalAction>,
        description_hash: BytesN<32>,
    ) -> BytesN<32> {
        framework(&env).hash_proposal(&actions, &description_hash)
    }

    pub fn description_hash(env: Env, description: String) -> BytesN<32> {
        framework(&env).description_hash(&description)
    }

    /// Framework state, except that Defeated reads as Active until the
    /// proposal has been finalized.
    pub fn state(env: Env, proposal_id: BytesN<32>) -> Result<ProposalState, GovernorError> {
        match framework(&env).state(&proposal_id)? {
            ProposalState::Defeated if !ledger::is_finalized(&env, &proposal_id) => {
                Ok(ProposalState::Active)
            }
            state => Ok(state),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn voting_delay(env: Env) -> u32 {
        load_config(&env).settings.voting_delay()
    }

    pub fn voting_period(env: Env) -> u32 {
        load_config(&env).settings.voting_period()
    }

    pub fn proposal_threshold(env: Env) -> i128 {
        load_config(&env).settings.proposal_threshold()
    }

    pub fn quorum(env: Env, timepoint: u32) -> i128 {
        framework(&env).quorum(timepoint)
    }

    pub fn clock(env: Env) -> u32 {
        framework(&env).clock()
    }

    pub fn proposal_snapshot(env: Env, proposal_id: BytesN<32>) -> Result<u32, GovernorError> {
        framework(&env).proposal_snapshot(&proposal_id)
    }

    pub fn proposal_deadline(env: Env, proposal_id: BytesN<32>) -> Result<u32, GovernorError> {
        framework(&env).proposal_deadline(&proposal_id)
    }

    pub fn proposal_proposer(env: Env, proposal_id: BytesN<32>) -> Result<Address, GovernorError> {
        framework(&env).proposal_proposer(&proposal_id)
    }

    pub fn proposal_votes(env: Env, proposal_id: BytesN<32>) -> ProposalVotes {
        framework(&env).counting().proposal_votes(&env, &proposal_id)
    }

    pub fn has_voted(env: Env, proposal_id: BytesN<32>, voter: VoterId) -> bool {
        framework(&env)
            .counting()
            .has_voted(&env, &proposal_id, &voter)
    }

    pub fn ballot_box_accum(
        env: Env,
        proposal_id: BytesN<32>,
    ) -> Result<BytesN<32>, GovernorError> {
        ledger::accumulator(&env, &proposal_id).ok_or(GovernorError::ProposalNotFound)
    }

    /// Commitments received so far, repeat voters included.
    pub fn ballot_count(env: Env, proposal_id: BytesN<32>) -> u32 {
        ledger::ballot_count(&env, &proposal_id)
    }

    pub fn is_finalized(env: Env, proposal_id: BytesN<32>) -> bool {
        ledger::is_finalized(&env, &proposal_id)
    }

    pub fn ballot_digest(env: Env, proposal_id: BytesN<32>, support: u32) -> BytesN<32> {
        admission::ballot_digest(&env, &proposal_id, support).to_bytes()
    }

    pub fn extended_ballot_digest(
        env: Env,
        proposal_id: BytesN<32>,
        support: u32,
        reason: String,
        params: Bytes,
    ) -> BytesN<32> {
        admission::extended_ballot_digest(&env, &proposal_id, support, &reason, &params).to_bytes()
    }

    /// Voter id under which a direct ballot from `voter` is recorded.
    pub fn voter_id(env: Env, voter: Address) -> VoterId {
        governor_kit::voter_id(&env, &voter)
    }

    pub fn image_id(env: Env) -> BytesN<32> {
        load_config(&env).image_id
    }

    pub fn token(env: Env) -> Address {
        load_config(&env).token
    }

    pub fn relay(env: Env) -> Address {
        load_config(&env).relay
    }

    pub fn config(env: Env) -> GovernorConfig {
        load_config(&env)
    }
}
