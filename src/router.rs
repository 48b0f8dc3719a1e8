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

//! Router: demultiplex inbound envelopes into per-round bounded queues.
//!
//! Analogue of `original_source/node/node.go`'s `RouteMsg`: dispatches on
//! the payload tag and forwards onto the appropriate channel. Unlike the
//! upstream (one pair of unbounded channels recreated every round), the
//! queues here are long-lived bounded `tokio::sync::mpsc` channels sized
//! from `node.rounds.{collect,exchange}.max_messages`; a full queue drops
//! the message and logs a warning rather than blocking the transport task.

use std::sync::Arc;

use ecdsa::VerifyingKey;
use p384::NistP384;
use tokio::sync::mpsc;
use tracing::warn;

use crate::telemetry::metrics::Metrics;
use crate::wire::{Envelope, EnvelopePayload, Proposal, PulseVector};

/// The set of trusted peer public keys an inbound envelope's signature is
/// checked against before routing, plus the metrics handle used to record
/// verification failures.
#[derive(Clone)]
pub struct TrustedPeers {
    /// Peer verifying keys loaded from `node.peers[].pubkeydir`.
    pub keys: Arc<Vec<VerifyingKey<NistP384>>>,
    /// Shared metrics registry.
    pub metrics: Arc<Metrics>,
}

/// Sending halves of the router's two per-round queues.
#[derive(Clone)]
pub struct RouterHandles {
    /// Sink for Collect-phase proposals.
    pub pulses_tx: mpsc::Sender<Proposal>,
    /// Sink for Exchange-phase vectors.
    pub vectors_tx: mpsc::Sender<PulseVector>,
}

/// Receiving halves of the router's two per-round queues.
pub struct RouterQueues {
    /// Source of Collect-phase proposals.
    pub pulses_rx: mpsc::Receiver<Proposal>,
    /// Source of Exchange-phase vectors.
    pub vectors_rx: mpsc::Receiver<PulseVector>,
}

/// Build a fresh pair of bounded router queues.
pub fn build(pulses_capacity: usize, vectors_capacity: usize) -> (RouterHandles, RouterQueues) {
    let (pulses_tx, pulses_rx) = mpsc::channel(pulses_capacity.max(1));
    let (vectors_tx, vectors_rx) = mpsc::channel(vectors_capacity.max(1));
    (
        RouterHandles {
            pulses_tx,
            vectors_tx,
        },
        RouterQueues {
            pulses_rx,
            vectors_rx,
        },
    )
}

/// Verify an inbound envelope's signature against the trusted peer set and,
/// if valid, route its payload onto the matching queue. An envelope whose
/// signature matches no known peer is dropped and counted in
/// `verify_failed_total`, matching `VerifyMessageTrusted`'s
/// "not from known public keys" rejection in `node.go`'s `ReceivePulses`/
/// `ReceiveVectors`.
pub async fn verify_and_route(handles: &RouterHandles, trusted: &TrustedPeers, envelope: Envelope) {
    if !crate::crypto::verify_trusted(&envelope.signature, trusted.keys.iter()) {
        trusted.metrics.verify_failed_total.inc();
        warn!(from = %envelope.from, "message verification failed, signature is not from known public keys");
        return;
    }
    route(handles, envelope).await;
}

/// Route an already-verified inbound envelope's payload onto the matching
/// queue, matching `RouteMsg`'s `switch msgType`.
pub async fn route(handles: &RouterHandles, envelope: Envelope) {
    match envelope.payload {
        EnvelopePayload::Collect(proposal) => {
            if handles.pulses_tx.try_send(proposal).is_err() {
                warn!(from = %envelope.from, "pulses queue full or closed, dropping message");
            }
        }
        EnvelopePayload::Vector(vector) => {
            if handles.vectors_tx.try_send(vector).is_err() {
                warn!(from = %envelope.from, "vectors queue full or closed, dropping message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(from: &str, payload: EnvelopePayload) -> Envelope {
        Envelope {
            signature: vec![],
            epoch: 1,
            round_start_unix: 0,
            from: from.to_string(),
            payload,
        }
    }

    #[tokio::test]
    async fn routes_collect_to_pulses_queue() {
        let (handles, mut queues) = build(4, 4);
        let proposal = Proposal {
            from: "peer".to_string(),
            entropy: "abc".to_string(),
        };
        route(&handles, envelope("peer", EnvelopePayload::Collect(proposal.clone()))).await;
        let got = queues.pulses_rx.recv().await.expect("proposal");
        assert_eq!(got, proposal);
        assert!(queues.vectors_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn routes_vector_to_vectors_queue() {
        let (handles, mut queues) = build(4, 4);
        let vector = PulseVector {
            from: "peer".to_string(),
            proposals: vec![],
        };
        route(&handles, envelope("peer", EnvelopePayload::Vector(vector.clone()))).await;
        let got = queues.vectors_rx.recv().await.expect("vector");
        assert_eq!(got, vector);
        assert!(queues.pulses_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_drops_without_panicking() {
        let (handles, _queues) = build(1, 1);
        let proposal = Proposal {
            from: "peer".to_string(),
            entropy: "abc".to_string(),
        };
        route(&handles, envelope("peer", EnvelopePayload::Collect(proposal.clone()))).await;
        // Second send exceeds capacity since nothing has drained the queue.
        route(&handles, envelope("peer", EnvelopePayload::Collect(proposal))).await;
    }
}
