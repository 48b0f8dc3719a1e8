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

//! Node wiring: ties config, transport, consensus, and ledger together.
//!
//! Analogue of `original_source/node/node.go`'s `Node`: owns the keypair,
//! the trusted peer public keys, the broadcast fabric, the ledger client
//! and the single `ConsensusState`. `run` spawns the six long-lived tasks
//! described in the concurrency model (T1 transport, T2 router is implicit
//! in T1's call-through, T3 broadcast is invoked inline from T6, T4
//! reconnect sweep, T5 scheduler, T6 consensus driver).

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ecdsa::VerifyingKey;
use p384::NistP384;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::consensus::ConsensusState;
use crate::wire::{Envelope, EnvelopePayload, Proposal, PulseVector};
use crate::{broadcast, config as cfgmod, crypto, keys, ledger, router, scheduler, telemetry, transport};

/// Fatal node startup errors.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Keypair load/generate failed.
    #[error(transparent)]
    Keys(#[from] keys::KeysError),
    /// Ledger connection failed.
    #[error(transparent)]
    Ledger(#[from] ledger::LedgerError),
    /// TLS material could not be loaded (TCP transport only).
    #[error(transparent)]
    Transport(#[from] transport::TransportError),
}

/// A running pulsar node.
pub struct Node {
    cfg: Config,
    signing_key: ecdsa::SigningKey<NistP384>,
    peer_keys: Vec<VerifyingKey<NistP384>>,
    broadcaster: broadcast::Broadcaster,
    ledger: ledger::Ledger,
    metrics: Arc<telemetry::metrics::Metrics>,
    epoch: u64,
}

impl Node {
    /// Build a node from validated config: load keys, trusted peers, dial
    /// the ledger, and build the broadcast fabric (connections are dialed
    /// by the reconnect task once `run` starts).
    pub async fn build(cfg: Config) -> Result<Self, NodeError> {
        keys::write_keypair_if_not_exists(Path::new(&cfg.node.keyspath))?;
        let keypair = keys::load_keypair(Path::new(&cfg.node.keyspath))?;

        let mut peer_keys = Vec::with_capacity(cfg.node.peers.len());
        for peer in &cfg.node.peers {
            info!(dir = %peer.pubkeydir, "loading peer public key");
            peer_keys.push(keys::load_public_key(Path::new(&peer.pubkeydir))?);
        }

        let mut ledger_client = ledger::Ledger::connect(&cfg.store.host).await?;
        let epoch = ledger_client.latest_epoch().await.unwrap_or(0);

        let metrics = Arc::new(
            telemetry::metrics::Metrics::new().expect("metrics registration cannot fail at startup"),
        );

        let peer_addrs: Vec<String> = cfg.node.peers.iter().map(|p| p.addr.clone()).collect();
        let transport_kind = match cfg.node.transport.as_str() {
            "udp" => broadcast::Transport::Udp,
            _ => broadcast::Transport::Tcp,
        };
        let tls_connector = if transport_kind == broadcast::Transport::Tcp {
            Some(transport::client_tls_connector("certs/client.pem", "certs/client.key")?)
        } else {
            None
        };
        let broadcaster = broadcast::Broadcaster::new(&peer_addrs, transport_kind, tls_connector);

        Ok(Self {
            cfg,
            signing_key: keypair.signing_key,
            peer_keys,
            broadcaster,
            ledger: ledger_client,
            metrics,
            epoch,
        })
    }

    /// Spawn all long-lived tasks and run forever.
    pub async fn run(self) -> Result<(), NodeError> {
        let Node {
            cfg,
            signing_key,
            peer_keys,
            broadcaster,
            mut ledger,
            metrics,
            mut epoch,
        } = self;

        let total_nodes = cfgmod::total_nodes(&cfg);
        let (router_handles, mut router_queues) = router::build(
            cfg.node.rounds.collect.max_messages,
            cfg.node.rounds.exchange.max_messages,
        );
        let trusted_peers = router::TrustedPeers {
            keys: Arc::new(peer_keys),
            metrics: metrics.clone(),
        };

        // T1: transport server.
        {
            let addr = cfg.node.addr.clone();
            let handles = router_handles.clone();
            let trusted = trusted_peers.clone();
            match cfg.node.transport.as_str() {
                "udp" => {
                    tokio::spawn(async move {
                        if let Err(err) = transport::serve_udp(&addr, handles, trusted).await {
                            error!(%err, "UDP transport exited");
                        }
                    });
                }
                _ => {
                    let acceptor =
                        transport::server_tls_acceptor("certs/server.pem", "certs/server.key")?;
                    tokio::spawn(async move {
                        if let Err(err) = transport::serve_tcp(&addr, acceptor, handles, trusted).await {
                            error!(%err, "TCP transport exited");
                        }
                    });
                }
            }
        }

        // T4: reconnect sweep.
        {
            let broadcaster = broadcaster.clone();
            let reconnect = Duration::from_secs(cfg.node.reconnect);
            tokio::spawn(async move {
                broadcaster.run_reconnect_loop(reconnect).await;
            });
        }

        // Telemetry HTTP endpoint.
        {
            let addr = cfg.telemetry.metrics_addr.clone();
            let metrics = metrics.clone();
            tokio::spawn(async move {
                if let Err(err) = telemetry::metrics::serve(&addr, metrics).await {
                    error!(%err, "metrics endpoint exited");
                }
            });
        }

        // T5: scheduler.
        let (round_tx, mut round_rx) = mpsc::channel::<i64>(1);
        {
            let pace_ms = cfg.node.rounds.pace_ms;
            tokio::spawn(async move {
                scheduler::run(pace_ms, round_tx).await;
            });
        }

        // T6: consensus driver (this task), reacting to scheduler ticks.
        let collect_duration = Duration::from_millis(cfg.node.rounds.collect.duration);
        let exchange_duration = Duration::from_millis(cfg.node.rounds.exchange.duration);
        let self_addr = cfg.node.addr.clone();

        while let Some(round_start_unix) = round_rx.recv().await {
            let mut state = ConsensusState::new(total_nodes);
            state.round_start_unix = round_start_unix;

            info!(round_start_unix, epoch, "collect round started");
            let signature = match crypto::sign_dummy(&signing_key) {
                Ok(s) => s,
                Err(err) => {
                    error!(%err, "failed to sign round start, skipping round");
                    continue;
                }
            };
            let self_proposal = new_proposal(&self_addr);
            state.record_self_proposal(self_proposal.clone());
            metrics.round_total.with_label_values(&["collect"]).inc();

            let broadcast_started = Instant::now();
            broadcaster
                .broadcast(&Envelope {
                    signature: signature.clone(),
                    epoch,
                    round_start_unix,
                    from: self_addr.clone(),
                    payload: EnvelopePayload::Collect(self_proposal),
                })
                .await;
            metrics
                .broadcast_latency_ms
                .observe(broadcast_started.elapsed().as_secs_f64() * 1000.0);

            drain_pulses(
                &mut router_queues.pulses_rx,
                &mut state,
                collect_duration,
            )
            .await;

            info!(round_start_unix, "exchange round started");
            let own_vector = state.own_vector(&self_addr);
            state.record_self_vector(own_vector.clone());
            metrics.round_total.with_label_values(&["exchange"]).inc();

            let broadcast_started = Instant::now();
            broadcaster
                .broadcast(&Envelope {
                    signature,
                    epoch,
                    round_start_unix,
                    from: self_addr.clone(),
                    payload: EnvelopePayload::Vector(own_vector),
                })
                .await;
            metrics
                .broadcast_latency_ms
                .observe(broadcast_started.elapsed().as_secs_f64() * 1000.0);

            drain_vectors(
                &mut router_queues.vectors_rx,
                &mut state,
                exchange_duration,
            )
            .await;

            let winner = state.decide_winner();
            info!(winner = %winner, "decided consensus winner");
            match state.self_proposal.as_ref() {
                Some(p) if p.entropy == winner => {
                    metrics.commit_total.inc();
                    if let Err(err) = ledger.commit(&winner).await {
                        error!(%err, "failed to commit winner to ledger");
                    }
                }
                _ if winner == crate::consensus::NO_CONSENSUS_STATUS => {
                    metrics.no_consensus_total.inc();
                }
                _ => {}
            }

            epoch = ledger.latest_epoch().await.unwrap_or(epoch);
            metrics.peers_connected.set(broadcaster.connected_count().await as i64);
            info!(next_epoch = epoch, "round complete");
        }

        Ok(())
    }
}

fn new_proposal(from: &str) -> Proposal {
    Proposal {
        from: from.to_string(),
        entropy: random_entropy(),
    }
}

/// Generate a 16-character base58 entropy string, matching
/// `randomBytesString(16)` + `base58.Encode` in
/// `original_source/node/utils.go`/`message.go`.
fn random_entropy() -> String {
    use rand_core::RngCore;
    let mut raw = [0u8; 32];
    rand_core::OsRng.fill_bytes(&mut raw);
    let encoded = bs58::encode(raw).into_string();
    encoded.chars().take(16).collect()
}

async fn drain_pulses(
    rx: &mut mpsc::Receiver<Proposal>,
    state: &mut ConsensusState,
    duration: Duration,
) {
    let deadline = Instant::now() + duration;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match timeout(remaining, rx.recv()).await {
            Ok(Some(proposal)) => state.record_peer_proposal(proposal),
            Ok(None) => break,
            Err(_) => break,
        }
    }
}

async fn drain_vectors(
    rx: &mut mpsc::Receiver<PulseVector>,
    state: &mut ConsensusState,
    duration: Duration,
) {
    let deadline = Instant::now() + duration;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match timeout(remaining, rx.recv()).await {
            Ok(Some(vector)) => state.record_peer_vector(vector),
            Ok(None) => break,
            Err(_) => break,
        }
    }
}
