//! Signature-based vote admission.
//!
//! Ballots are signed over an EIP-712 style typed-data digest:
//! `keccak256(0x19 0x01 || domain_separator || struct_hash)`. The domain binds
//! the governor name and version, the network passphrase hash and this
//! contract's address, so a signature is only valid for one deployment.

use soroban_sdk::{crypto::Hash, xdr::ToXdr, Bytes, BytesN, Env, String};

use governor_kit::{voter_id_from_public_key, GovernorError, VoterId};

pub const NAME: &str = "BonsaiGovernor";
pub const VERSION: &str = "1";

const DOMAIN_TYPE: &[u8] =
    b"EIP712Domain(string name,string version,bytes32 networkId,address verifyingContract)";
const BALLOT_TYPE: &[u8] = b"Ballot(bytes32 proposalId,uint8 support)";
const EXTENDED_BALLOT_TYPE: &[u8] =
    b"ExtendedBallot(bytes32 proposalId,uint8 support,string reason,bytes params)";

fn keccak(env: &Env, data: &[u8]) -> BytesN<32> {
    env.crypto()
        .keccak256(&Bytes::from_slice(env, data))
        .to_bytes()
}

/// `support` left-padded to a 32-byte big-endian word.
fn support_word(support: u32) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[28..].copy_from_slice(&support.to_be_bytes());
    word
}

pub fn domain_separator(env: &Env) -> BytesN<32> {
    let verifying_contract = env.current_contract_address().to_xdr(env);

    let mut data = Bytes::new(env);
    data.append(&keccak(env, DOMAIN_TYPE).into());
    data.append(&keccak(env, NAME.as_bytes()).into());
    data.append(&keccak(env, VERSION.as_bytes()).into());
    data.append(&env.ledger().network_id().into());
    data.append(&env.crypto().keccak256(&verifying_contract).to_bytes().into());
    env.crypto().keccak256(&data).to_bytes()
}

fn typed_digest(env: &Env, struct_hash: &BytesN<32>) -> Hash<32> {
    let mut data = Bytes::from_array(env, &[0x19, 0x01]);
    data.append(&domain_separator(env).into());
    data.append(&struct_hash.clone().into());
    env.crypto().keccak256(&data)
}

pub fn ballot_digest(env: &Env, proposal_id: &BytesN<32>, support: u32) -> Hash<32> {
    let mut data = Bytes::new(env);
    data.append(&keccak(env, BALLOT_TYPE).into());
    data.append(&proposal_id.clone().into());
    data.extend_from_array(&support_word(support));
    let struct_hash = env.crypto().keccak256(&data).to_bytes();
    typed_digest(env, &struct_hash)
}

pub fn extended_ballot_digest(
    env: &Env,
    proposal_id: &BytesN<32>,
    support: u32,
    reason: &String,
    params: &Bytes,
) -> Hash<32> {
    let mut data = Bytes::new(env);
    data.append(&keccak(env, EXTENDED_BALLOT_TYPE).into());
    data.append(&proposal_id.clone().into());
    data.extend_from_array(&support_word(support));
    data.append(&env.crypto().keccak256(&reason.clone().to_xdr(env)).to_bytes().into());
    data.append(&env.crypto().keccak256(params).to_bytes().into());
    let struct_hash = env.crypto().keccak256(&data).to_bytes();
    typed_digest(env, &struct_hash)
}

/// Recovers the signer of `digest` from a 65-byte `r || s || v` signature.
///
/// `v` may be given raw (0/1) or Ethereum-offset (27/28). A signature that is
/// well formed but does not recover traps in the host.
pub fn recover_voter(
    env: &Env,
    digest: &Hash<32>,
    signature: &BytesN<65>,
) -> Result<VoterId, GovernorError> {
    let raw = signature.to_array();
    let recovery_id = match raw[64] {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(GovernorError::InvalidSignature),
    };

    let mut rs = [0u8; 64];
    rs.copy_from_slice(&raw[..64]);
    if rs.iter().all(|b| *b == 0) {
        return Err(GovernorError::InvalidSignature);
    }

    let public_key = env
        .crypto()
        .secp256k1_recover(digest, &BytesN::from_array(env, &rs), recovery_id);
    Ok(voter_id_from_public_key(env, &public_key))
}
