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

//! CLI argument parsing for the `pulsar-node` binary.
//!
//! Mirrors `original_source/node/config.go`'s `MakeConfig` flag parsing
//! (`flag.String("config", "node.yml", ...)`), using `clap`'s derive API
//! instead of the standard library's `flag` package.

use clap::Parser;

/// Pulsar consensus node.
#[derive(Debug, Parser)]
#[command(name = "pulsar-node", version, about = "Pulse consensus node")]
pub struct Args {
    /// Path to the node's YAML config file.
    #[arg(long, default_value = "node.yml")]
    pub config: String,
}

/// Parse process arguments.
pub fn parse() -> Args {
    Args::parse()
}
