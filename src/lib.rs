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

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Pulsar - a small network of nodes that jointly elect a random winner
//! entropy per epoch and commit it to an external ledger.
//!
//! This crate provides:
//! - Deterministic wire types and the Collect/Exchange pulse protocol
//! - A Byzantine-tolerant decision rule (AgreeSet + Winner)
//! - A wall-clock-synchronized round scheduler
//! - ECDSA P-384 message authentication over a fixed peer key set
//! - A TCP(TLS)/UDP broadcast fabric with reconnect
//! - A gRPC ledger client
//! - Structured logging and Prometheus metrics

/// CLI argument parsing.
pub mod cli;
/// Node configuration (YAML, validated).
pub mod config;
/// ECDSA P-384 keypair load/generate/persist.
pub mod keys;
/// Signer/Verifier: sign and verify the fixed "dummy" digest.
pub mod crypto;
/// Wire envelopes: Proposal, PulseVector, Envelope, codec.
pub mod wire;
/// Pulse consensus engine: ConsensusState, decision rule, phase driver.
pub mod consensus;
/// Broadcast fabric: per-peer handles, reconnect sweep.
pub mod broadcast;
/// Transport server: TCP+TLS or UDP inbound acceptor.
pub mod transport;
/// Router: demultiplex inbound envelopes into per-round queues.
pub mod router;
/// Scheduler: wall-clock boundary ticker.
pub mod scheduler;
/// Ledger RPC client.
pub mod ledger;
/// Structured logging and Prometheus metrics.
pub mod telemetry;
/// Node wiring: ties config, transport, consensus and ledger together.
pub mod node;
