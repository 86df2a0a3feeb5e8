// Signature Voting Tests
//
// Ballots admitted from secp256k1 signatures end to end:
// 1. Signers hold votes under their Ethereum-style address
// 2. Signed and direct ballots share one accumulator and one tally
// 3. Tampered or malformed signatures never reach the tally

use soroban_sdk::{
    contract, contractimpl, testutils::Address as _, testutils::Ledger as _, Address, Bytes,
    BytesN, Env, IntoVal, String, Symbol, Vec,
};

use bonsai_governor::{BonsaiGovernor, BonsaiGovernorClient, GovernorConfig};
use governor_kit::{
    run_finalization, voter_id_from_public_key, BallotRecord, GovernorError, GovernorSettings,
    ProposalAction, ProposalState, ProposalVotes, Support, VoterId,
};
use votes_token::{VotesToken, VotesTokenClient};

// secp256k1 secret keys of two off-chain signers
const SIGNER_ONE: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const SIGNER_TWO: &str = "8da4ef21b864d2cc526dbdb2a120bd2874c36c9d0a1fb7f8c63d7f7a8b41de8f";

#[contract]
pub struct Relay;

#[contractimpl]
impl Relay {
    pub fn deliver(env: Env, governor: Address, journal: Bytes, image_id: BytesN<32>) -> Bytes {
        env.invoke_contract(
            &governor,
            &Symbol::new(&env, "on_callback"),
            soroban_sdk::vec![&env, journal.into_val(&env), image_id.into_val(&env)],
        )
    }
}

#[contract]
pub struct Noop;

#[contractimpl]
impl Noop {
    pub fn noop(_env: Env) {}
}

struct Signer {
    secret: libsecp256k1::SecretKey,
}

impl Signer {
    fn from_hex(secret: &str) -> Self {
        let raw: [u8; 32] = hex::decode(secret).unwrap().try_into().unwrap();
        Self {
            secret: libsecp256k1::SecretKey::parse(&raw).unwrap(),
        }
    }

    fn voter_id(&self, env: &Env) -> VoterId {
        let public_key = libsecp256k1::PublicKey::from_secret_key(&self.secret).serialize();
        voter_id_from_public_key(env, &BytesN::from_array(env, &public_key))
    }

    fn sign(&self, env: &Env, digest: &BytesN<32>) -> BytesN<65> {
        let message = libsecp256k1::Message::parse(&digest.to_array());
        let (signature, recovery_id) = libsecp256k1::sign(&message, &self.secret);
        let mut raw = [0u8; 65];
        raw[..64].copy_from_slice(&signature.serialize());
        raw[64] = recovery_id.serialize() + 27;
        BytesN::from_array(env, &raw)
    }
}

fn setup_contracts(
    env: &Env,
) -> (
    BonsaiGovernorClient<'_>,
    VotesTokenClient<'_>,
    Address,
    Address,
    BytesN<32>,
) {
    env.mock_all_auths();
    env.ledger().with_mut(|li| li.sequence_number = 1_000);

    let token_id = env.register(VotesToken, (Address::generate(env),));
    let relay = env.register(Relay, ());
    let target = env.register(Noop, ());
    let image_id: BytesN<32> = BytesN::from_array(
        env,
        &hex::decode("a3f1c2d4e5b60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f90")
            .unwrap()
            .try_into()
            .unwrap(),
    );

    let config = GovernorConfig {
        image_id: image_id.clone(),
        token: token_id.clone(),
        relay: relay.clone(),
        settings: GovernorSettings {
            voting_delay: 1,
            voting_period: 5,
            proposal_threshold: 0,
        },
        quorum_numerator: 25,
    };
    let governor_id = env.register(BonsaiGovernor, (config,));

    (
        BonsaiGovernorClient::new(env, &governor_id),
        VotesTokenClient::new(env, &token_id),
        relay,
        target,
        image_id,
    )
}

fn noop_proposal(env: &Env, governor: &BonsaiGovernorClient, target: &Address) -> BytesN<32> {
    let actions: Vec<ProposalAction> = soroban_sdk::vec![
        env,
        ProposalAction {
            target: target.clone(),
            function: Symbol::new(env, "noop"),
            args: Vec::new(env),
        }
    ];
    let id = governor.propose(
        &Address::generate(env),
        &actions,
        &String::from_str(env, "signature vote"),
    );
    let snapshot = governor.proposal_snapshot(&id);
    env.ledger().with_mut(|li| li.sequence_number = snapshot + 1);
    id
}

fn close_voting(env: &Env, governor: &BonsaiGovernorClient, proposal_id: &BytesN<32>) {
    let deadline = governor.proposal_deadline(proposal_id);
    env.ledger().with_mut(|li| li.sequence_number = deadline + 1);
}

#[test]
fn test_signed_and_direct_ballots_finalize_together() {
    let env = Env::default();
    let (governor, token, relay, target, image_id) = setup_contracts(&env);

    let one = Signer::from_hex(SIGNER_ONE);
    let two = Signer::from_hex(SIGNER_TWO);
    let direct = Address::generate(&env);
    let direct_id = governor.voter_id(&direct);
    token.mint(&one.voter_id(&env), &60);
    token.mint(&two.voter_id(&env), &25);
    token.mint(&direct_id, &15);

    let proposal_id = noop_proposal(&env, &governor, &target);

    let digest = governor.ballot_digest(&proposal_id, &1);
    governor.cast_vote_by_sig(&proposal_id, &1, &one.sign(&env, &digest));

    let reason = String::from_str(&env, "needs more review");
    let digest = governor.extended_ballot_digest(&proposal_id, &0, &reason, &Bytes::new(&env));
    governor.cast_vote_with_reason_and_params_by_sig(
        &proposal_id,
        &0,
        &reason,
        &Bytes::new(&env),
        &two.sign(&env, &digest),
    );

    governor.cast_vote(&proposal_id, &direct, &2);
    assert_eq!(governor.ballot_count(&proposal_id), 3);

    close_voting(&env, &governor, &proposal_id);
    let committed = soroban_sdk::vec![
        &env,
        BallotRecord::new(Support::For, one.voter_id(&env)),
        BallotRecord::new(Support::Against, two.voter_id(&env)),
        BallotRecord::new(Support::Abstain, direct_id),
    ];
    RelayClient::new(&env, &relay).deliver(
        &governor.address,
        &run_finalization(&env, &proposal_id, &committed),
        &image_id,
    );

    assert_eq!(
        governor.proposal_votes(&proposal_id),
        ProposalVotes {
            against: 25,
            for_votes: 60,
            abstain: 15,
        }
    );
    assert!(governor.has_voted(&proposal_id, &one.voter_id(&env)));
    assert_eq!(governor.state(&proposal_id), ProposalState::Succeeded);
}

#[test]
fn test_signature_for_other_proposal_counts_for_nobody() {
    let env = Env::default();
    let (governor, token, relay, target, image_id) = setup_contracts(&env);

    let one = Signer::from_hex(SIGNER_ONE);
    token.mint(&one.voter_id(&env), &60);
    let proposal_id = noop_proposal(&env, &governor, &target);

    // signed over a different proposal id: recovers some unrelated key
    let other_digest = governor.ballot_digest(&BytesN::from_array(&env, &[9u8; 32]), &1);
    governor.cast_vote_by_sig(&proposal_id, &1, &one.sign(&env, &other_digest));

    close_voting(&env, &governor, &proposal_id);

    // the signer's honest ballot is not what was committed
    let claimed = soroban_sdk::vec![&env, BallotRecord::new(Support::For, one.voter_id(&env))];
    assert!(RelayClient::new(&env, &relay)
        .try_deliver(
            &governor.address,
            &run_finalization(&env, &proposal_id, &claimed),
            &image_id,
        )
        .is_err());
    assert!(!governor.is_finalized(&proposal_id));
}

#[test]
fn test_malformed_signature_is_rejected() {
    let env = Env::default();
    let (governor, _, _, target, _) = setup_contracts(&env);

    let one = Signer::from_hex(SIGNER_ONE);
    let proposal_id = noop_proposal(&env, &governor, &target);
    let mut raw = one
        .sign(&env, &governor.ballot_digest(&proposal_id, &1))
        .to_array();
    raw[64] = 29;

    assert_eq!(
        governor.try_cast_vote_by_sig(&proposal_id, &1, &BytesN::from_array(&env, &raw)),
        Err(Ok(GovernorError::InvalidSignature))
    );
    assert_eq!(governor.ballot_count(&proposal_id), 0);
    assert_eq!(governor.ballot_box_accum(&proposal_id), proposal_id);
}
