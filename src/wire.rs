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

//! Wire envelopes and their canonical encoding.
//!
//! Analogue of `original_source/node/message.go` and `proposal.go`: a
//! `Proposal` carries one node's random entropy for the round, a
//! `PulseVector` carries one node's view of everyone else's proposals, and
//! an `Envelope` wraps either in the signed transport frame. Encoding is
//! length-delimited bincode (4-byte big-endian length prefix + payload),
//! generalizing the teacher's `bincode::serialize`/`deserialize` use in
//! `networking::p2p` to an explicit multi-record framing, since the spec
//! allows any framing that supports multiple records per stream connection.

use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard cap on a single decoded envelope, defending against memory/CPU
/// bombs via an oversized length prefix (teacher idiom: see
/// `core::types::decode_canonical_limited`).
pub const MAX_ENVELOPE_BYTES: usize = 1 << 20;

/// Wire/codec errors.
#[derive(Debug, Error)]
pub enum WireError {
    /// Serialization failed.
    #[error("failed to encode envelope")]
    Encode,
    /// Deserialization failed, or the frame exceeded the size cap.
    #[error("failed to decode envelope")]
    Decode,
    /// The length prefix exceeded [`MAX_ENVELOPE_BYTES`].
    #[error("envelope length {0} exceeds maximum {MAX_ENVELOPE_BYTES}")]
    TooLarge(usize),
}

fn bincode_opts() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// One node's proposed entropy for the round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Address of the node that generated this proposal.
    pub from: String,
    /// 16-character base58 entropy string.
    pub entropy: String,
}

impl Proposal {
    /// Render as `[from: <from>, data: <entropy>]`, matching
    /// `PulseProposal.String()` in the upstream implementation.
    pub fn display(&self) -> String {
        format!("[from: {}, data: {}]", self.from, self.entropy)
    }
}

/// One node's view of the full set of proposals it collected this round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseVector {
    /// Address of the node that assembled this vector.
    pub from: String,
    /// The proposals this node collected, in arrival order.
    pub proposals: Vec<Proposal>,
}

/// The two message kinds exchanged during a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopePayload {
    /// Collect round: a single proposal.
    Collect(Proposal),
    /// Exchange round: a full pulse vector.
    Vector(PulseVector),
}

/// The signed transport frame carried over the broadcast fabric.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// ASN.1 DER `R||S` ECDSA-P384 signature over the fixed dummy digest.
    pub signature: Vec<u8>,
    /// Round/epoch number.
    pub epoch: u64,
    /// Unix timestamp (seconds) of the round's scheduled start.
    pub round_start_unix: i64,
    /// Address of the sending node.
    pub from: String,
    /// The Collect or Vector payload.
    pub payload: EnvelopePayload,
}

/// Encode an envelope as a length-delimited bincode frame.
pub fn encode(env: &Envelope) -> Result<Vec<u8>, WireError> {
    let body = bincode_opts().serialize(env).map_err(|_| WireError::Encode)?;
    if body.len() > MAX_ENVELOPE_BYTES {
        return Err(WireError::TooLarge(body.len()));
    }
    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_be_bytes());
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// Decode a single envelope from its (already length-prefix-stripped) body.
pub fn decode_body(body: &[u8]) -> Result<Envelope, WireError> {
    if body.len() > MAX_ENVELOPE_BYTES {
        return Err(WireError::TooLarge(body.len()));
    }
    bincode_opts()
        .with_limit(MAX_ENVELOPE_BYTES as u64)
        .deserialize(body)
        .map_err(|_| WireError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_envelope() -> Envelope {
        Envelope {
            signature: vec![1, 2, 3],
            epoch: 7,
            round_start_unix: 1_700_000_000,
            from: "127.0.0.1:9001".to_string(),
            payload: EnvelopePayload::Collect(Proposal {
                from: "127.0.0.1:9001".to_string(),
                entropy: "abc123def456gh78".to_string(),
            }),
        }
    }

    #[test]
    fn roundtrips_collect() {
        let env = sample_envelope();
        let framed = encode(&env).expect("encode");
        let len = u32::from_be_bytes(framed[..4].try_into().unwrap()) as usize;
        let decoded = decode_body(&framed[4..4 + len]).expect("decode");
        assert_eq!(env, decoded);
    }

    #[test]
    fn roundtrips_vector() {
        let env = Envelope {
            payload: EnvelopePayload::Vector(PulseVector {
                from: "127.0.0.1:9002".to_string(),
                proposals: vec![
                    Proposal {
                        from: "127.0.0.1:9001".to_string(),
                        entropy: "aaaaaaaaaaaaaaaa".to_string(),
                    },
                    Proposal {
                        from: "127.0.0.1:9002".to_string(),
                        entropy: "bbbbbbbbbbbbbbbb".to_string(),
                    },
                ],
            }),
            ..sample_envelope()
        };
        let framed = encode(&env).expect("encode");
        let len = u32::from_be_bytes(framed[..4].try_into().unwrap()) as usize;
        let decoded = decode_body(&framed[4..4 + len]).expect("decode");
        assert_eq!(env, decoded);
    }

    #[test]
    fn rejects_oversized_body() {
        let huge = vec![0u8; MAX_ENVELOPE_BYTES + 1];
        assert!(matches!(decode_body(&huge), Err(WireError::TooLarge(_))));
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(matches!(decode_body(&[0xff, 0x00, 0x11]), Err(WireError::Decode)));
    }

    #[test]
    fn proposal_display_matches_upstream_format() {
        let p = Proposal {
            from: "peer-a".to_string(),
            entropy: "entropy-value".to_string(),
        };
        assert_eq!(p.display(), "[from: peer-a, data: entropy-value]");
    }
}
