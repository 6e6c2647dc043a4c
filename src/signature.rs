//! ECDSA signature verification over secp256k1

use crate::error::SignatureError;
use crate::types::Hash;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, Verification};

/// Verify a DER signature (sighash byte already stripped) over a 32-byte digest
///
/// Parse failures of the signature or the public key are reported separately
/// from a well-formed signature that does not verify. High-S signatures are
/// normalized before verification.
pub fn verify_ecdsa<C: Verification>(
    secp: &Secp256k1<C>,
    digest: &Hash,
    signature_der: &[u8],
    public_key: &[u8],
) -> Result<(), SignatureError> {
    let mut signature =
        Signature::from_der(signature_der).map_err(SignatureError::MalformedSignature)?;
    signature.normalize_s();

    let public_key = PublicKey::from_slice(public_key).map_err(SignatureError::MalformedPublicKey)?;
    let message = Message::from_digest(*digest);

    secp.verify_ecdsa(&message, &signature, &public_key)
        .map_err(|_| SignatureError::Invalid)
}
