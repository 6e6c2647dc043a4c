//! Hash primitives: SHA256, double-SHA256 and HASH160

use crate::types::Hash;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA256(data)
pub fn sha256(data: &[u8]) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(data));
    hash
}

/// SHA256(SHA256(data))
pub fn hash256(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&Ripemd160::digest(Sha256::digest(data)));
    hash
}
