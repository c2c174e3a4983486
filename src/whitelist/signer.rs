//! Off-chain issuance of eligibility proofs.

use alloy_primitives::{Address, B256, U256};
use k256::ecdsa::{RecoveryId, SigningKey};
use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use super::proof::{Proof, eligibility_digest};

/// Error raised while loading an issuer key or signing with it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssuerKeyError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid secp256k1 private key")]
    InvalidKey,

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Holds the issuer's secp256k1 key and signs proofs with it.
///
/// The key is never printed; `Debug` shows the issuer address only.
#[derive(Clone)]
pub struct ProofIssuer {
    key: SigningKey,
    address: Address,
}

impl ProofIssuer {
    pub fn new(key: SigningKey) -> Self {
        let address = Address::from_private_key(&key);
        Self { key, address }
    }

    /// Loads a key from its 32 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IssuerKeyError> {
        let key = SigningKey::from_slice(bytes).map_err(|_| IssuerKeyError::InvalidKey)?;
        Ok(Self::new(key))
    }

    /// The address a verifier must be configured with.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Signs an eligibility proof for `identity` on `chain_id`.
    ///
    /// The signature is low-s with `v` in `{27, 28}`.
    pub fn sign(
        &self,
        identity: Address,
        chain_id: U256,
        salt: U256,
    ) -> Result<Proof, IssuerKeyError> {
        let digest = eligibility_digest(identity, chain_id, salt);
        let hash = alloy_primitives::eip191_hash_message(digest);

        let (mut signature, mut recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| IssuerKeyError::Signing(e.to_string()))?;
        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let (r, s) = signature.split_bytes();
        Ok(Proof {
            claimed_identity: identity,
            chain_id,
            salt,
            v: 27 + u8::from(recovery_id.is_y_odd()),
            r: B256::from_slice(&r),
            s: B256::from_slice(&s),
        })
    }
}

impl FromStr for ProofIssuer {
    type Err = IssuerKeyError;

    /// Parses a hex private key, with or without `0x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| IssuerKeyError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Debug for ProofIssuer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofIssuer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
