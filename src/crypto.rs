// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Signer/Verifier over a fixed auth-token digest.
//!
//! The wire protocol authenticates envelopes by ECDSA-P384-signing the MD5
//! digest of the constant string `"dummy"` rather than the envelope content.
//! This is a known weakness inherited from the upstream protocol (the
//! signature proves "holder of a trusted private key", not "author of this
//! message") and is preserved verbatim for wire compatibility. MD5 is used
//! only as the digest fed to ECDSA, never for anything security-load-bearing
//! on its own.
//!
//! `ring`'s `EcdsaKeyPair` always hashes its input internally and cannot sign
//! an externally computed digest, so signing/verification here goes through
//! the RustCrypto `p384`/`ecdsa` crates' prehash API instead.

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use md5::{Digest, Md5};
use p384::NistP384;
use thiserror::Error;

/// The fixed payload whose MD5 digest is signed/verified.
pub const DUMMY_HASH_DATA: &[u8] = b"dummy";

/// Crypto errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The DER-encoded signature could not be parsed.
    #[error("malformed signature encoding")]
    MalformedSignature,
    /// Signing failed at the curve layer (should not happen with valid keys).
    #[error("signing failed")]
    SigningFailed,
}

fn dummy_digest() -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(DUMMY_HASH_DATA);
    hasher.finalize().into()
}

/// Sign the fixed dummy digest with an ECDSA P-384 private key.
///
/// Returns the ASN.1 DER `R||S` encoding, matching `ecdsa.Sign`'s default
/// Go marshaling used by the upstream protocol.
pub fn sign_dummy(signing_key: &SigningKey<NistP384>) -> Result<Vec<u8>, CryptoError> {
    let digest = dummy_digest();
    let sig: EcdsaSignature<NistP384> = signing_key
        .sign_prehash(&digest)
        .map_err(|_| CryptoError::SigningFailed)?;
    Ok(sig.to_der().as_bytes().to_vec())
}

/// Verify a DER-encoded signature over the fixed dummy digest against a
/// single known peer public key.
pub fn verify_dummy(verifying_key: &VerifyingKey<NistP384>, signature_der: &[u8]) -> bool {
    let digest = dummy_digest();
    let Ok(sig) = EcdsaSignature::<NistP384>::from_der(signature_der) else {
        return false;
    };
    verifying_key.verify_prehash(&digest, &sig).is_ok()
}

/// Verify a signature against a set of trusted peer public keys; returns
/// true on the first match, matching the upstream "any known peer" rule.
pub fn verify_trusted<'a, I>(signature_der: &[u8], peers: I) -> bool
where
    I: IntoIterator<Item = &'a VerifyingKey<NistP384>>,
{
    let digest = dummy_digest();
    let Ok(sig) = EcdsaSignature::<NistP384>::from_der(signature_der) else {
        return false;
    };
    peers
        .into_iter()
        .any(|vk| vk.verify_prehash(&digest, &sig).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn sign_then_verify_succeeds() {
        let signing_key = SigningKey::<NistP384>::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        let sig = sign_dummy(&signing_key).expect("sign");
        assert!(verify_dummy(&verifying_key, &sig));
    }

    #[test]
    fn verify_rejects_foreign_key() {
        let signing_key = SigningKey::<NistP384>::random(&mut OsRng);
        let other_key = SigningKey::<NistP384>::random(&mut OsRng);
        let other_verifying = VerifyingKey::from(&other_key);
        let sig = sign_dummy(&signing_key).expect("sign");
        assert!(!verify_dummy(&other_verifying, &sig));
    }

    #[test]
    fn verify_trusted_matches_any_peer() {
        let signing_key = SigningKey::<NistP384>::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        let decoy_key = SigningKey::<NistP384>::random(&mut OsRng);
        let decoy_verifying = VerifyingKey::from(&decoy_key);
        let sig = sign_dummy(&signing_key).expect("sign");
        let peers = vec![decoy_verifying, verifying_key];
        assert!(verify_trusted(&sig, peers.iter()));
    }

    #[test]
    fn verify_rejects_garbage_signature() {
        let signing_key = SigningKey::<NistP384>::random(&mut OsRng);
        let verifying_key = VerifyingKey::from(&signing_key);
        assert!(!verify_dummy(&verifying_key, b"not a signature"));
    }
}
