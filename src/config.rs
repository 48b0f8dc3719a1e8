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

//! Node configuration: YAML load + `validator` validation.
//!
//! Field layout mirrors `original_source/node/config.go`'s `Config` struct
//! one-for-one (`node.addr`, `node.peers[]`, `node.rounds.{paceMs,collect,
//! exchange}`, `node.reconnect`, `node.transport`, `store.host`,
//! `logging.level`), plus an ambient `telemetry` section and a `format`
//! field on `logging` that the upstream config does not have.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use validator::Validate;

/// Config load/validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}")]
    Read {
        /// Path that failed to read.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The YAML could not be parsed into the config schema.
    #[error("failed to parse config file {path}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },
    /// The config failed `validator` field validation.
    #[error("invalid config: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Root node configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Config {
    /// Core node settings.
    #[validate(nested)]
    pub node: NodeSection,
    /// External block-store settings.
    #[validate(nested)]
    pub store: StoreSection,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
    /// Telemetry (metrics endpoint) settings.
    #[serde(default)]
    pub telemetry: TelemetrySection,
}

/// One peer entry, mirroring `original_source/node/config.go`'s `Peer`.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PeerEntry {
    /// Peer's listen address (`host:port`).
    #[validate(length(min = 1))]
    pub addr: String,
    /// Directory containing the peer's `pub.key`.
    #[serde(rename = "pubkeydir")]
    #[validate(length(min = 1))]
    pub pubkeydir: String,
}

/// Collect/Exchange round timing.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct RoundPhase {
    /// Max buffered messages for this phase's channel.
    pub max_messages: usize,
    /// Phase duration in milliseconds.
    #[validate(range(min = 1))]
    pub duration: u64,
}

/// Round scheduling configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct RoundsSection {
    /// Wall-clock pace between round starts, in milliseconds.
    #[serde(rename = "paceMs")]
    #[validate(range(min = 1))]
    pub pace_ms: u64,
    /// Collect round timing.
    #[validate(nested)]
    pub collect: RoundPhase,
    /// Exchange round timing.
    #[validate(nested)]
    pub exchange: RoundPhase,
}

/// Node-level configuration.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NodeSection {
    /// Directory holding this node's own `priv.key`/`pub.key`.
    #[validate(length(min = 1))]
    pub keyspath: String,
    /// This node's own listen address.
    #[validate(length(min = 1))]
    pub addr: String,
    /// Fixed peer set.
    #[validate(length(min = 1), nested)]
    pub peers: Vec<PeerEntry>,
    /// Round timing.
    #[validate(nested)]
    pub rounds: RoundsSection,
    /// Reconnect sweep interval, in seconds.
    #[validate(range(min = 1))]
    pub reconnect: u64,
    /// Transport kind: `"tcp"` or `"udp"`.
    #[validate(custom(function = "validate_transport"))]
    pub transport: String,
}

fn validate_transport(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "tcp" | "udp" => Ok(()),
        _ => Err(validator::ValidationError::new("unsupported transport")),
    }
}

/// External ledger/block-store connection settings.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct StoreSection {
    /// gRPC host:port of the ledger service.
    #[validate(length(min = 1))]
    pub host: String,
}

/// Structured logging settings.
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingSection {
    /// Log level (`trace`/`debug`/`info`/`warn`/`error`).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (`"json"` or `"compact"`).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Prometheus metrics endpoint settings.
#[derive(Clone, Debug, Deserialize)]
pub struct TelemetrySection {
    /// Address the `/metrics` HTTP endpoint binds to.
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9898".to_string()
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            metrics_addr: default_metrics_addr(),
        }
    }
}

/// Load and validate a config file from `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: Config = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Total participant count used by the consensus decision rule: the fixed
/// peer set plus this node itself (resolves the "`TotalNodes` hard-coded to
/// 4" redesign flag — it now scales with the configured peer list).
pub fn total_nodes(cfg: &Config) -> usize {
    cfg.node.peers.len() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(yaml: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("tempfile");
        f.write_all(yaml.as_bytes()).expect("write");
        f
    }

    const VALID_YAML: &str = r#"
node:
  keyspath: ./keys
  addr: 127.0.0.1:9001
  peers:
    - addr: 127.0.0.1:9002
      pubkeydir: ./peers/2
    - addr: 127.0.0.1:9003
      pubkeydir: ./peers/3
    - addr: 127.0.0.1:9004
      pubkeydir: ./peers/4
  rounds:
    paceMs: 5000
    collect:
      max_messages: 16
      duration: 2000
    exchange:
      max_messages: 16
      duration: 2000
  reconnect: 5
  transport: tcp
store:
  host: 127.0.0.1:7000
"#;

    #[test]
    fn loads_valid_config() {
        let f = write_temp(VALID_YAML);
        let cfg = load(f.path()).expect("valid config should load");
        assert_eq!(cfg.node.peers.len(), 3);
        assert_eq!(total_nodes(&cfg), 4);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.telemetry.metrics_addr, "0.0.0.0:9898");
    }

    #[test]
    fn rejects_bad_transport() {
        let yaml = VALID_YAML.replace("transport: tcp", "transport: carrier-pigeon");
        let f = write_temp(&yaml);
        assert!(load(f.path()).is_err());
    }

    #[test]
    fn rejects_empty_peers() {
        let yaml = r#"
node:
  keyspath: ./keys
  addr: 127.0.0.1:9001
  peers: []
  rounds:
    paceMs: 5000
    collect:
      max_messages: 16
      duration: 2000
    exchange:
      max_messages: 16
      duration: 2000
  reconnect: 5
  transport: tcp
store:
  host: 127.0.0.1:7000
"#;
        let f = write_temp(yaml);
        assert!(load(f.path()).is_err());
    }
}
