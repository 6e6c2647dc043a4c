//! Block header serialization, Merkle roots, witness commitment and PoW target

use crate::constants::*;
use crate::encoding::ByteEncoder;
use crate::hashing::hash256;
use crate::types::*;
use std::fmt;

/// Serialized header size in bytes
pub const HEADER_SIZE: usize = 80;

impl BlockHeader {
    /// Template with everything but the nonce fixed; prev block is all-zero
    pub fn new(version: i32, merkle_root: Hash, timestamp: u32, bits: u32) -> Self {
        Self {
            version,
            prev_block_hash: [0u8; 32],
            merkle_root,
            timestamp,
            bits,
            nonce: 0,
        }
    }

    /// version ‖ prev ‖ merkle ‖ time ‖ bits ‖ nonce, all little-endian
    pub fn serialize(&self) -> Vec<u8> {
        let mut enc = ByteEncoder::with_capacity(HEADER_SIZE);
        enc.put(self.version)
            .put_bytes(&self.prev_block_hash)
            .put_bytes(&self.merkle_root)
            .put(self.timestamp)
            .put(self.bits)
            .put(self.nonce);
        enc.into_bytes()
    }

    /// Block hash, internal byte order
    pub fn hash(&self) -> Hash {
        hash256(&self.serialize())
    }
}

/// ComputeMerkleRoot: ℍ* → ℍ
///
/// Hashes are in internal byte order. Each level pairs neighbours and
/// double-hashes the concatenation; an odd level pairs its last hash with
/// itself. A single hash is its own root. An empty list has no root.
pub fn merkle_root(hashes: &[Hash]) -> Option<Hash> {
    if hashes.is_empty() {
        return None;
    }

    let mut level = hashes.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = &pair[0];
                let right = pair.get(1).unwrap_or(left);
                let mut concat = [0u8; 64];
                concat[..32].copy_from_slice(left);
                concat[32..].copy_from_slice(right);
                hash256(&concat)
            })
            .collect();
    }
    level.pop()
}

/// Witness commitment: SHA256d(witness root ‖ reserved value)
///
/// `wtxids` must start with the coinbase's all-zero wtxid.
pub fn witness_commitment(wtxids: &[Hash]) -> Hash {
    let root = merkle_root(wtxids).unwrap_or([0u8; 32]);
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(&root);
    data[32..].copy_from_slice(&WITNESS_RESERVED_VALUE);
    hash256(&data)
}

/// Proof-of-work target as a 256-bit big-endian integer
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target([u8; 32]);

impl Target {
    /// Accepts every hash except all-ones
    pub const MAX: Target = Target([0xff; 32]);

    /// Accepts nothing
    pub const ZERO: Target = Target([0u8; 32]);

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Target(bytes)
    }

    /// Expand compact nBits: mantissa × 256^(exponent − 3)
    ///
    /// Negative encodings expand to zero. Mantissa bytes shifted above 256
    /// bits are dropped.
    pub fn from_compact(bits: u32) -> Self {
        let exponent = (bits >> 24) as usize;
        let mantissa = bits & 0x007f_ffff;
        let mut target = [0u8; 32];

        if bits & 0x0080_0000 != 0 || mantissa == 0 {
            return Target(target);
        }

        if exponent <= 3 {
            let value = mantissa >> (8 * (3 - exponent));
            target[28..].copy_from_slice(&value.to_be_bytes());
            return Target(target);
        }

        // most significant mantissa byte lands at index 32 - exponent
        for (i, byte) in mantissa.to_be_bytes()[1..].iter().enumerate() {
            let index = 32 + i;
            if index >= exponent && index - exponent < 32 {
                target[index - exponent] = *byte;
            }
        }
        Target(target)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Does `hash` (internal order) read as a big-endian number below the target?
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        let mut value = *hash;
        value.reverse();
        value < self.0
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", hex::encode(self.0))
    }
}
