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

//! gRPC client for the external ledger (block-store) service.
//!
//! Analogue of `original_source/ledger/server.go`'s RPC surface and
//! `node/store.go`'s `TestBadgerStorage` client wrapper: `commit` appends a
//! winner entropy (the ledger assigns the epoch) and `latest_epoch` returns
//! the highest committed epoch. The payload sent to `Commit` is the raw
//! UTF-8 bytes of the winner entropy string, not a gob-encoded buffer (see
//! `DESIGN.md`'s resolution of the corresponding Open Question).

use thiserror::Error;
use tonic::transport::Channel;

#[allow(clippy::all)]
pub mod proto {
    tonic::include_proto!("pulsar.ledger.v1");
}

use proto::ledger_client::LedgerClient;
use proto::{CommitRequest, LatestBlockEpochRequest};

/// Ledger client errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Failed to establish the gRPC channel.
    #[error("failed to connect to ledger at {host}")]
    Connect {
        /// Configured ledger host.
        host: String,
    },
    /// The RPC returned a transport-level error.
    #[error("ledger rpc failed: {0}")]
    Rpc(#[from] tonic::Status),
    /// The ledger reported an application-level error string.
    #[error("ledger reported an error: {0}")]
    Remote(String),
}

/// A connected ledger client.
pub struct Ledger {
    client: LedgerClient<Channel>,
}

impl Ledger {
    /// Connect to the ledger service at `host` (e.g. `"127.0.0.1:7000"`).
    pub async fn connect(host: &str) -> Result<Self, LedgerError> {
        let endpoint = format!("http://{host}");
        let client = LedgerClient::connect(endpoint)
            .await
            .map_err(|_| LedgerError::Connect {
                host: host.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Commit a winning entropy value to the ledger.
    pub async fn commit(&mut self, winner_entropy: &str) -> Result<(), LedgerError> {
        let request = tonic::Request::new(CommitRequest {
            entropy: winner_entropy.as_bytes().to_vec(),
        });
        let response = self.client.commit(request).await?.into_inner();
        if !response.error.is_empty() {
            return Err(LedgerError::Remote(response.error));
        }
        Ok(())
    }

    /// Fetch the highest committed epoch, or 0 if none has been committed.
    pub async fn latest_epoch(&mut self) -> Result<u64, LedgerError> {
        let request = tonic::Request::new(LatestBlockEpochRequest {});
        let response = self.client.get_latest_block_epoch(request).await?.into_inner();
        if !response.error.is_empty() {
            return Err(LedgerError::Remote(response.error));
        }
        Ok(response.epoch)
    }
}
