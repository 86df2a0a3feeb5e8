//! # Votes Token
//!
//! Admin-issued, non-transferable voting units with per-ledger checkpoints.
//! Accounts are 20-byte voter ids, the same identity space ballots are
//! recorded under, so signature voters and address voters hold weight alike.
//!
//! Historical reads (`get_past_votes`, `get_past_total_supply`) answer for any
//! ledger strictly before the current one.

#![no_std]
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, panic_with_error, symbol_short, Address,
    Env, Symbol, Vec,
};

use governor_kit::VoterId;

const ADMIN: Symbol = symbol_short!("admin");

#[contracterror]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum VotesError {
    AlreadyInitialized = 1,
    /// Mint and burn amounts must be positive
    InvalidAmount = 2,
    /// Burn exceeds the account's current votes
    InsufficientVotes = 3,
    /// Past lookups need a timepoint before the current ledger
    FutureLookup = 4,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Account(VoterId), // voter -> Vec<Checkpoint>
    Supply,           // Vec<Checkpoint>
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Checkpoint {
    pub ledger: u32,
    pub votes: i128,
}

// Typed Events
#[soroban_sdk::contractevent]
#[derive(Clone, Debug, PartialEq)]
pub struct VotesMinted {
    #[topic]
    pub account: VoterId,
    pub amount: i128,
    pub votes: i128,
}

#[soroban_sdk::contractevent]
#[derive(Clone, Debug, PartialEq)]
pub struct VotesBurned {
    #[topic]
    pub account: VoterId,
    pub amount: i128,
    pub votes: i128,
}

fn checkpoints(env: &Env, key: &DataKey) -> Vec<Checkpoint> {
    env.storage()
        .persistent()
        .get(key)
        .unwrap_or_else(|| Vec::new(env))
}

fn latest(env: &Env, key: &DataKey) -> i128 {
    checkpoints(env, key).last().map(|c| c.votes).unwrap_or(0)
}

/// Votes of the last checkpoint at or before `timepoint`.
fn upper_lookup(env: &Env, key: &DataKey, timepoint: u32) -> i128 {
    let history = checkpoints(env, key);
    let mut low = 0;
    let mut high = history.len();
    while low < high {
        let mid = low + (high - low) / 2;
        if history.get_unchecked(mid).ledger > timepoint {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    if high == 0 {
        0
    } else {
        history.get_unchecked(high - 1).votes
    }
}

/// Records `votes` at the current ledger, overwriting a checkpoint already
/// written in the same ledger.
fn write_checkpoint(env: &Env, key: &DataKey, votes: i128) {
    let ledger = env.ledger().sequence();
    let mut history = checkpoints(env, key);
    let checkpoint = Checkpoint { ledger, votes };
    match history.last() {
        Some(last) if last.ledger == ledger => history.set(history.len() - 1, checkpoint),
        _ => history.push_back(checkpoint),
    }
    env.storage().persistent().set(key, &history);
}

fn require_past(env: &Env, timepoint: u32) -> Result<(), VotesError> {
    if timepoint >= env.ledger().sequence() {
        return Err(VotesError::FutureLookup);
    }
    Ok(())
}

#[contract]
pub struct VotesToken;

#[contractimpl]
impl VotesToken {
    pub fn __constructor(env: Env, admin: Address) {
        if env.storage().instance().has(&ADMIN) {
            panic_with_error!(&env, VotesError::AlreadyInitialized);
        }
        env.storage().instance().set(&ADMIN, &admin);
    }

    pub fn admin(env: Env) -> Address {
        env.storage().instance().get(&ADMIN).unwrap()
    }

    /// Issue `amount` votes to `to` (admin only)
    pub fn mint(env: Env, to: VoterId, amount: i128) -> Result<(), VotesError> {
        Self::admin(env.clone()).require_auth();
        if amount <= 0 {
            return Err(VotesError::InvalidAmount);
        }

        let account = DataKey::Account(to.clone());
        let votes = latest(&env, &account) + amount;
        write_checkpoint(&env, &account, votes);
        write_checkpoint(&env, &DataKey::Supply, latest(&env, &DataKey::Supply) + amount);

        VotesMinted {
            account: to,
            amount,
            votes,
        }
        .publish(&env);
        Ok(())
    }

    /// Remove `amount` votes from `from` (admin only)
    pub fn burn(env: Env, from: VoterId, amount: i128) -> Result<(), VotesError> {
        Self::admin(env.clone()).require_auth();
        if amount <= 0 {
            return Err(VotesError::InvalidAmount);
        }

        let account = DataKey::Account(from.clone());
        let current = latest(&env, &account);
        if current < amount {
            return Err(VotesError::InsufficientVotes);
        }
        let votes = current - amount;
        write_checkpoint(&env, &account, votes);
        write_checkpoint(&env, &DataKey::Supply, latest(&env, &DataKey::Supply) - amount);

        VotesBurned {
            account: from,
            amount,
            votes,
        }
        .publish(&env);
        Ok(())
    }

    pub fn get_votes(env: Env, account: VoterId) -> i128 {
        latest(&env, &DataKey::Account(account))
    }

    pub fn get_past_votes(env: Env, account: VoterId, timepoint: u32) -> Result<i128, VotesError> {
        require_past(&env, timepoint)?;
        Ok(upper_lookup(&env, &DataKey::Account(account), timepoint))
    }

    pub fn total_supply(env: Env) -> i128 {
        latest(&env, &DataKey::Supply)
    }

    pub fn get_past_total_supply(env: Env, timepoint: u32) -> Result<i128, VotesError> {
        require_past(&env, timepoint)?;
        Ok(upper_lookup(&env, &DataKey::Supply, timepoint))
    }

    /// Checkpoints are keyed by ledger sequence
    pub fn clock(env: Env) -> u32 {
        env.ledger().sequence()
    }

    pub fn voter_id(env: Env, address: Address) -> VoterId {
        governor_kit::voter_id(&env, &address)
    }
}
