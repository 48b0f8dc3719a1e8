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

//! Verifier totality: a signature produced by any trusted peer's key
//! verifies against the trusted set, and a signature from an untrusted key
//! never does, using real on-disk keypairs generated under fresh
//! `tempfile` directories.

use pulsar::crypto::{sign_dummy, verify_trusted};
use pulsar::keys::{load_keypair, write_keypair_if_not_exists};
use tempfile::tempdir;

#[test]
fn any_trusted_peer_signature_verifies() {
    let dirs: Vec<_> = (0..4)
        .map(|_| {
            let dir = tempdir().expect("tempdir");
            let keyspath = dir.path().join("keys");
            write_keypair_if_not_exists(&keyspath).expect("write keypair");
            (dir, keyspath)
        })
        .collect();

    let keypairs: Vec<_> = dirs
        .iter()
        .map(|(_dir, keyspath)| load_keypair(keyspath).expect("load keypair"))
        .collect();

    let trusted_verifying_keys: Vec<_> = keypairs.iter().map(|kp| kp.verifying_key).collect();

    for kp in &keypairs {
        let sig = sign_dummy(&kp.signing_key).expect("sign");
        assert!(verify_trusted(&sig, trusted_verifying_keys.iter()));
    }
}

#[test]
fn untrusted_signer_never_verifies() {
    let trusted_dir = tempdir().expect("tempdir");
    let trusted_keyspath = trusted_dir.path().join("keys");
    write_keypair_if_not_exists(&trusted_keyspath).expect("write trusted");
    let trusted = load_keypair(&trusted_keyspath).expect("load trusted");

    let outsider_dir = tempdir().expect("tempdir");
    let outsider_keyspath = outsider_dir.path().join("keys");
    write_keypair_if_not_exists(&outsider_keyspath).expect("write outsider");
    let outsider = load_keypair(&outsider_keyspath).expect("load outsider");

    let sig = sign_dummy(&outsider.signing_key).expect("sign");
    assert!(!verify_trusted(&sig, std::iter::once(&trusted.verifying_key)));
}
