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

//! Structured logging setup and the Prometheus metrics submodule.

/// Prometheus registry + `/metrics` HTTP endpoint.
pub mod metrics;

use crate::config::LoggingSection;

/// Initialize the global `tracing` subscriber from the node's logging
/// config. Mirrors the teacher's `tracing_subscriber::fmt()` setup in
/// `src/main.rs`, adding a level/format switch matching
/// `original_source/logger/logging.go`'s zap level selection.
pub fn init(cfg: &LoggingSection) {
    let filter = tracing_subscriber::EnvFilter::try_new(&cfg.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = if cfg.format == "json" {
        subscriber.json().try_init()
    } else {
        subscriber.compact().try_init()
    };

    if result.is_err() {
        eprintln!("tracing subscriber already initialized");
    }
}
