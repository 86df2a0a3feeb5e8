//! Ballot encoding and the ballot box accumulator.

use soroban_sdk::{contracttype, xdr::ToXdr, Address, Bytes, BytesN, Env};

use crate::GovernorError;

/// 20-byte voter identity shared by signature voters and address voters.
pub type VoterId = BytesN<20>;

/// Wire size of one ballot record: 4-byte support + 20-byte voter.
pub const BALLOT_RECORD_LEN: u32 = 24;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Support {
    Against = 0,
    For = 1,
    Abstain = 2,
}

impl Support {
    pub fn from_u32(value: u32) -> Result<Self, GovernorError> {
        match value {
            0 => Ok(Support::Against),
            1 => Ok(Support::For),
            2 => Ok(Support::Abstain),
            _ => Err(GovernorError::InvalidSupport),
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// A committed ballot as it appears in the accumulator and the journal.
///
/// `support` stays a raw `u32` so that a record read back from a journal can
/// be carried around before it is validated.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BallotRecord {
    pub support: u32,
    pub voter: VoterId,
}

impl BallotRecord {
    pub fn new(support: Support, voter: VoterId) -> Self {
        Self {
            support: support.as_u32(),
            voter,
        }
    }

    /// `[4-byte big-endian support][20-byte voter]`
    pub fn to_array(&self) -> [u8; 24] {
        let mut out = [0u8; 24];
        out[0..4].copy_from_slice(&self.support.to_be_bytes());
        out[4..24].copy_from_slice(&self.voter.to_array());
        out
    }

    pub fn from_array(env: &Env, raw: &[u8; 24]) -> Self {
        let mut support = [0u8; 4];
        support.copy_from_slice(&raw[0..4]);
        let mut voter = [0u8; 20];
        voter.copy_from_slice(&raw[4..24]);
        Self {
            support: u32::from_be_bytes(support),
            voter: BytesN::from_array(env, &voter),
        }
    }
}

/// Accumulator value of an empty ballot box.
pub fn initial_accumulator(proposal_id: &BytesN<32>) -> BytesN<32> {
    proposal_id.clone()
}

/// `sha256(accum || record)`
pub fn fold_ballot(env: &Env, accum: &BytesN<32>, record: &BallotRecord) -> BytesN<32> {
    let mut data = Bytes::from_array(env, &accum.to_array());
    data.extend_from_array(&record.to_array());
    env.crypto().sha256(&data).to_bytes()
}

/// Voter id of a Soroban address: last 20 bytes of `keccak256(xdr(address))`.
pub fn voter_id(env: &Env, address: &Address) -> VoterId {
    let digest = env.crypto().keccak256(&address.clone().to_xdr(env));
    last_20(env, &digest.to_bytes().to_array())
}

/// Ethereum-style address of an uncompressed SEC-1 secp256k1 public key.
pub fn voter_id_from_public_key(env: &Env, public_key: &BytesN<65>) -> VoterId {
    // drop the 0x04 prefix
    let coordinates = Bytes::from_array(env, &public_key.to_array()).slice(1..);
    let digest = env.crypto().keccak256(&coordinates);
    last_20(env, &digest.to_bytes().to_array())
}

fn last_20(env: &Env, digest: &[u8; 32]) -> VoterId {
    let mut id = [0u8; 20];
    id.copy_from_slice(&digest[12..32]);
    BytesN::from_array(env, &id)
}
