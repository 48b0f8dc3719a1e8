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

//! ECDSA P-384 keypair load/generate/persist, PEM-encoded PKCS#8 private /
//! SPKI public, mirroring `original_source/node/keys.go`'s on-disk layout:
//! `<keyspath>/priv.key` and `<keyspath>/pub.key`. The in-memory PEM buffer
//! read back off disk is zeroized once the key is parsed out of it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ecdsa::SigningKey;
use p384::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use p384::NistP384;
use rand_core::OsRng;
use thiserror::Error;
use tracing::info;
use zeroize::Zeroize;

/// Private key file name under the keys directory.
pub const PRIV_KEY_FILE: &str = "priv.key";
/// Public key file name under the keys directory.
pub const PUB_KEY_FILE: &str = "pub.key";

/// Key load/generate errors.
#[derive(Debug, Error)]
pub enum KeysError {
    /// Filesystem I/O failure.
    #[error("io error on {path}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// PEM/PKCS#8 decoding failure.
    #[error("invalid key encoding at {path}")]
    InvalidEncoding {
        /// The path that failed.
        path: PathBuf,
    },
}

/// A loaded node keypair plus the PEM text of the public half (broadcast to
/// peers alongside the node's own proposals in the upstream protocol, kept
/// here in case downstream callers need it).
pub struct KeyPair {
    /// Private signing key.
    pub signing_key: SigningKey<NistP384>,
    /// Public verifying key.
    pub verifying_key: ecdsa::VerifyingKey<NistP384>,
    /// PEM encoding of the public key.
    pub public_pem: String,
}

/// Write a fresh keypair to `keyspath` if it does not already contain one.
///
/// Mirrors `WriteKeyPairIfNotExists`: creates the directory, generates a new
/// P-384 keypair, and persists both halves as PEM. Unlike the original this
/// does not sleep afterward — operators coordinate keypair rollout out of
/// band before starting the cluster.
pub fn write_keypair_if_not_exists(keyspath: &Path) -> Result<(), KeysError> {
    if keyspath.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(keyspath).map_err(|source| KeysError::Io {
        path: keyspath.to_path_buf(),
        source,
    })?;
    let signing_key = SigningKey::<NistP384>::random(&mut OsRng);
    let verifying_key = ecdsa::VerifyingKey::from(&signing_key);

    let priv_path = keyspath.join(PRIV_KEY_FILE);
    let pub_path = keyspath.join(PUB_KEY_FILE);

    let priv_pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|_| KeysError::InvalidEncoding {
            path: priv_path.clone(),
        })?;
    std::fs::write(&priv_path, priv_pem.as_bytes()).map_err(|source| KeysError::Io {
        path: priv_path.clone(),
        source,
    })?;

    let pub_pem = verifying_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|_| KeysError::InvalidEncoding {
            path: pub_path.clone(),
        })?;
    std::fs::write(&pub_path, pub_pem.as_bytes()).map_err(|source| KeysError::Io {
        path: pub_path.clone(),
        source,
    })?;

    info!(path = %keyspath.display(), "generated new node keypair");
    Ok(())
}

/// Load a keypair previously written by [`write_keypair_if_not_exists`].
pub fn load_keypair(keyspath: &Path) -> Result<KeyPair, KeysError> {
    let priv_path = keyspath.join(PRIV_KEY_FILE);
    let pub_path = keyspath.join(PUB_KEY_FILE);

    let mut priv_pem = std::fs::read_to_string(&priv_path).map_err(|source| KeysError::Io {
        path: priv_path.clone(),
        source,
    })?;
    let signing_key =
        SigningKey::<NistP384>::from_pkcs8_pem(&priv_pem).map_err(|_| KeysError::InvalidEncoding {
            path: priv_path.clone(),
        });
    priv_pem.zeroize();
    let signing_key = signing_key?;

    let public_pem = std::fs::read_to_string(&pub_path).map_err(|source| KeysError::Io {
        path: pub_path.clone(),
        source,
    })?;
    let verifying_key = ecdsa::VerifyingKey::<NistP384>::from_public_key_pem(&public_pem)
        .map_err(|_| KeysError::InvalidEncoding {
            path: pub_path.clone(),
        })?;

    Ok(KeyPair {
        signing_key,
        verifying_key,
        public_pem,
    })
}

/// Load a peer's public key from its key directory (`<dir>/pub.key`).
pub fn load_public_key(dir: &Path) -> Result<ecdsa::VerifyingKey<NistP384>, KeysError> {
    let pub_path = dir.join(PUB_KEY_FILE);
    let pem = std::fs::read_to_string(&pub_path).map_err(|source| KeysError::Io {
        path: pub_path.clone(),
        source,
    })?;
    ecdsa::VerifyingKey::<NistP384>::from_public_key_pem(&pem)
        .map_err(|_| KeysError::InvalidEncoding { path: pub_path })
}

/// Placeholder to keep the original "wait for cluster keypair rollout"
/// behavior available to callers who explicitly want it (unused by the
/// default startup path, which assumes out-of-band key distribution).
pub const CLUSTER_KEYGEN_SETTLE: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_load_roundtrips() {
        let dir = tempdir().expect("tempdir");
        let keyspath = dir.path().join("keys");
        write_keypair_if_not_exists(&keyspath).expect("write");
        let kp = load_keypair(&keyspath).expect("load");
        let pub_from_dir = load_public_key(&keyspath).expect("load pub");
        assert_eq!(
            kp.verifying_key.to_encoded_point(true),
            pub_from_dir.to_encoded_point(true)
        );
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let keyspath = dir.path().join("keys");
        write_keypair_if_not_exists(&keyspath).expect("write1");
        let first = std::fs::read(keyspath.join(PRIV_KEY_FILE)).expect("read1");
        write_keypair_if_not_exists(&keyspath).expect("write2");
        let second = std::fs::read(keyspath.join(PRIV_KEY_FILE)).expect("read2");
        assert_eq!(first, second);
    }
}
