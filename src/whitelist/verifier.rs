//! Issuer signature verification for whitelist proofs.

use alloy_primitives::{Address, Signature, U256, uint};

use super::proof::Proof;
use crate::chain::CallContext;
use crate::mint::{GateRejection, MintGate};

/// Half the secp256k1 group order. Signatures with a larger `s` are the
/// malleable twin of a canonical one.
const SECP256K1N_HALF: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// The specific check a proof failed. Never surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ProofRejection {
    #[error("recovery byte must be 27 or 28, got {0}")]
    InvalidV(u8),
    #[error("signature r or s is zero")]
    ZeroScalar,
    #[error("signature s is in the upper half of the curve order")]
    HighS,
    #[error("signer could not be recovered")]
    Unrecoverable,
    #[error("recovered signer {0} is not the issuer")]
    WrongSigner(Address),
    #[error("proof was issued to {claimed}, not {caller}")]
    WrongIdentity { claimed: Address, caller: Address },
    #[error("proof was issued for chain {0}")]
    WrongChain(U256),
}

/// Accepts proofs signed by a fixed issuer for the calling identity on the
/// current chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofVerifier {
    issuer: Address,
}

impl ProofVerifier {
    pub fn new(issuer: Address) -> Self {
        Self { issuer }
    }

    pub fn issuer(&self) -> Address {
        self.issuer
    }

    /// Verifies `proof` for `caller` on `chain_id` and returns the signer.
    ///
    /// Every failure is reported as the same [`GateRejection::InvalidProof`].
    pub fn verify(
        &self,
        proof: &Proof,
        caller: Address,
        chain_id: u64,
    ) -> Result<Address, GateRejection> {
        let result = self.check_proof(proof, caller, chain_id);

        #[cfg(feature = "tracing")]
        if let Err(reason) = &result {
            tracing::debug!(caller = %caller, reason = %reason, "Proof rejected");
        }

        result.map_err(|_| GateRejection::InvalidProof)
    }

    fn check_proof(
        &self,
        proof: &Proof,
        caller: Address,
        chain_id: u64,
    ) -> Result<Address, ProofRejection> {
        let signer = recover_signer(proof)?;
        if signer != self.issuer {
            return Err(ProofRejection::WrongSigner(signer));
        }
        if proof.claimed_identity != caller {
            return Err(ProofRejection::WrongIdentity {
                claimed: proof.claimed_identity,
                caller,
            });
        }
        if proof.chain_id != U256::from(chain_id) {
            return Err(ProofRejection::WrongChain(proof.chain_id));
        }
        Ok(signer)
    }
}

/// Recovers the address that signed `proof`, enforcing canonical signatures.
fn recover_signer(proof: &Proof) -> Result<Address, ProofRejection> {
    let y_parity = match proof.v {
        27 => false,
        28 => true,
        v => return Err(ProofRejection::InvalidV(v)),
    };
    let r = U256::from_be_bytes(proof.r.0);
    let s = U256::from_be_bytes(proof.s.0);
    if r.is_zero() || s.is_zero() {
        return Err(ProofRejection::ZeroScalar);
    }
    if s > SECP256K1N_HALF {
        return Err(ProofRejection::HighS);
    }

    Signature::new(r, s, y_parity)
        .recover_address_from_prehash(&proof.signed_hash())
        .map_err(|_| ProofRejection::Unrecoverable)
}

impl MintGate for ProofVerifier {
    /// The ABI-encoded proof, decoded only once the window is open.
    type Input = [u8];

    fn check(&self, ctx: &CallContext, input: &[u8]) -> Result<(), GateRejection> {
        let proof = Proof::abi_decode(input).map_err(|_e| {
            #[cfg(feature = "tracing")]
            tracing::debug!(caller = %ctx.caller, error = %_e, "Proof rejected");
            GateRejection::InvalidProof
        })?;
        self.verify(&proof, ctx.caller, ctx.chain_id).map(|_| ())
    }
}
