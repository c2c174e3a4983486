//! Eligibility proofs and their canonical encodings.
//!
//! The issuer signs `keccak256(abi.encode(address, uint256, uint256))` over
//! `(claimed_identity, chain_id, salt)` as an EIP-191 personal message. The
//! whitelist mint entry point receives the whole proof ABI-encoded as
//! `tuple(address, uint256, uint256, uint8, bytes32, bytes32)`.

use alloy_primitives::{Address, B256, U256, eip191_hash_message, keccak256};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const WORD: usize = 32;

/// Byte length of the signed eligibility encoding (three ABI words).
pub const ELIGIBILITY_ENCODED_LEN: usize = 3 * WORD;

/// Byte length of an ABI-encoded [`Proof`] (six ABI words).
pub const PROOF_ENCODED_LEN: usize = 6 * WORD;

/// ABI-encodes `(identity, chain_id, salt)` exactly as the issuer hashes it.
///
/// The address is left-padded to 32 bytes; both integers are 32-byte
/// big-endian words.
pub fn encode_eligibility(
    identity: Address,
    chain_id: U256,
    salt: U256,
) -> [u8; ELIGIBILITY_ENCODED_LEN] {
    let mut out = [0u8; ELIGIBILITY_ENCODED_LEN];
    out[..WORD].copy_from_slice(identity.into_word().as_slice());
    out[WORD..2 * WORD].copy_from_slice(&chain_id.to_be_bytes::<WORD>());
    out[2 * WORD..].copy_from_slice(&salt.to_be_bytes::<WORD>());
    out
}

/// The digest the issuer signs, before the personal-message prefix.
pub fn eligibility_digest(identity: Address, chain_id: U256, salt: U256) -> B256 {
    keccak256(encode_eligibility(identity, chain_id, salt))
}

/// A signed statement that `claimed_identity` may mint on chain `chain_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// The identity allowed to redeem this proof.
    #[serde(alias = "whitelistUser")]
    pub claimed_identity: Address,
    /// The chain the proof is valid on.
    pub chain_id: U256,
    /// Issuer-chosen nonce. Carried for wire compatibility only.
    pub salt: U256,
    /// Recovery byte, 27 or 28.
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl Proof {
    /// The eligibility digest covered by the signature.
    pub fn digest(&self) -> B256 {
        eligibility_digest(self.claimed_identity, self.chain_id, self.salt)
    }

    /// The EIP-191 prefixed hash the signature was produced over.
    pub fn signed_hash(&self) -> B256 {
        eip191_hash_message(self.digest())
    }

    /// Encodes the proof as `abi.encode(Proof)`.
    pub fn abi_encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PROOF_ENCODED_LEN);
        out.extend_from_slice(&encode_eligibility(
            self.claimed_identity,
            self.chain_id,
            self.salt,
        ));
        out.extend_from_slice(U256::from(self.v).to_be_bytes::<WORD>().as_slice());
        out.extend_from_slice(self.r.as_slice());
        out.extend_from_slice(self.s.as_slice());
        out
    }

    /// Decodes `abi.encode(Proof)`.
    ///
    /// Rejects inputs of the wrong length and words whose padding bytes are
    /// not zero.
    pub fn abi_decode(bytes: &[u8]) -> Result<Self, ProofDecodeError> {
        if bytes.len() != PROOF_ENCODED_LEN {
            return Err(ProofDecodeError::InvalidLength {
                expected: PROOF_ENCODED_LEN,
                got: bytes.len(),
            });
        }
        let word = |i: usize| &bytes[i * WORD..(i + 1) * WORD];

        let identity_word = word(0);
        if identity_word[..12].iter().any(|b| *b != 0) {
            return Err(ProofDecodeError::DirtyPadding("whitelistUser"));
        }
        let v_word = word(3);
        if v_word[..WORD - 1].iter().any(|b| *b != 0) {
            return Err(ProofDecodeError::DirtyPadding("v"));
        }

        Ok(Self {
            claimed_identity: Address::from_slice(&identity_word[12..]),
            chain_id: U256::from_be_slice(word(1)),
            salt: U256::from_be_slice(word(2)),
            v: v_word[WORD - 1],
            r: B256::from_slice(word(4)),
            s: B256::from_slice(word(5)),
        })
    }

    /// Returns the ABI encoding as a 0x-prefixed hex string.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.abi_encode()))
    }
}

impl FromStr for Proof {
    type Err = ProofDecodeError;

    /// Parses the hex form of the ABI encoding, with or without `0x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| ProofDecodeError::InvalidHex(e.to_string()))?;
        Self::abi_decode(&bytes)
    }
}

impl Display for Proof {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error returned when decoding a [`Proof`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofDecodeError {
    /// The hex string is invalid.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// The encoding is not exactly six words long.
    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// A narrow field's word has non-zero high bytes.
    #[error("Non-zero padding in field {0}")]
    DirtyPadding(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, hex};

    fn sample() -> Proof {
        Proof {
            claimed_identity: address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
            chain_id: U256::from(31337u64),
            salt: U256::from(0x123u64),
            v: 28,
            r: B256::repeat_byte(0x11),
            s: B256::repeat_byte(0x22),
        }
    }

    #[test]
    fn test_eligibility_encoding_layout() {
        let identity = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        let encoded = encode_eligibility(identity, U256::from(31337u64), U256::from(0x123u64));
        assert_eq!(
            hex::encode(encoded),
            concat!(
                "000000000000000000000000f39fd6e51aad88f6f4ce6ab8827279cfffb92266",
                "0000000000000000000000000000000000000000000000000000000000007a69",
                "0000000000000000000000000000000000000000000000000000000000000123",
            )
        );
    }

    #[test]
    fn test_digest_is_keccak_of_encoding() {
        let proof = sample();
        let expected = keccak256(encode_eligibility(
            proof.claimed_identity,
            proof.chain_id,
            proof.salt,
        ));
        assert_eq!(proof.digest(), expected);
    }

    #[test]
    fn test_signed_hash_applies_personal_prefix() {
        let proof = sample();
        let mut prefixed = b"\x19Ethereum Signed Message:\n32".to_vec();
        prefixed.extend_from_slice(proof.digest().as_slice());
        assert_eq!(proof.signed_hash(), keccak256(&prefixed));
    }

    #[test]
    fn test_digest_depends_on_every_field() {
        let base = sample();
        let mut other = base;
        other.salt = U256::from(0x124u64);
        assert_ne!(base.digest(), other.digest());
        let mut other = base;
        other.chain_id = U256::from(1u64);
        assert_ne!(base.digest(), other.digest());
        let mut other = base;
        other.claimed_identity = Address::ZERO;
        assert_ne!(base.digest(), other.digest());
    }

    #[test]
    fn test_abi_layout() {
        let encoded = sample().abi_encode();
        assert_eq!(encoded.len(), PROOF_ENCODED_LEN);
        assert_eq!(encoded[3 * 32 + 31], 28);
        assert_eq!(&encoded[4 * 32..5 * 32], B256::repeat_byte(0x11).as_slice());
        assert_eq!(Proof::abi_decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn test_abi_decode_rejects_wrong_length() {
        let err = Proof::abi_decode(b"proof").unwrap_err();
        assert_eq!(
            err,
            ProofDecodeError::InvalidLength {
                expected: 192,
                got: 5
            }
        );
    }

    #[test]
    fn test_abi_decode_rejects_dirty_address() {
        let mut encoded = sample().abi_encode();
        encoded[0] = 1;
        assert_eq!(
            Proof::abi_decode(&encoded),
            Err(ProofDecodeError::DirtyPadding("whitelistUser"))
        );
    }

    #[test]
    fn test_abi_decode_rejects_wide_v() {
        let mut encoded = sample().abi_encode();
        encoded[3 * 32 + 30] = 1;
        assert_eq!(
            Proof::abi_decode(&encoded),
            Err(ProofDecodeError::DirtyPadding("v"))
        );
    }

    #[test]
    fn test_hex_form() {
        let proof = sample();
        let hex_str = proof.to_hex();
        assert!(hex_str.starts_with("0x000000000000000000000000f39fd6e5"));
        assert_eq!(hex_str.parse::<Proof>().unwrap(), proof);
        assert!(matches!(
            "0xzz".parse::<Proof>(),
            Err(ProofDecodeError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_json_accepts_whitelist_user_alias() {
        let mut value = serde_json::to_value(sample()).unwrap();
        let object = value.as_object_mut().unwrap();
        let identity = object.remove("claimedIdentity").unwrap();
        object.insert("whitelistUser".to_string(), identity);
        let proof: Proof = serde_json::from_value(value).unwrap();
        assert_eq!(proof, sample());
    }

    #[test]
    fn test_known_digest_vector() {
        // keccak256 of 96 zero bytes
        let digest = eligibility_digest(Address::ZERO, U256::ZERO, U256::ZERO);
        assert_eq!(
            digest,
            b256!("46700b4d40ac5c35af2c22dda2787a91eb567b06c924a8fb8ae9a05b20c08c21")
        );
    }
}
