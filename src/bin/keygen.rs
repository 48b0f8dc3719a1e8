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

//! `pulsar-keygen`: generate and persist a fresh ECDSA P-384 keypair.
//!
//! Ambient convenience binary, grounded on the teacher's own `keygen`
//! binary pattern and on `original_source/node/keys.go`'s
//! `WriteKeyPairIfNotExists` behavior, adapted from Ed25519 to ECDSA P-384
//! since the wire protocol's signature format is fixed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "pulsar-keygen", about = "Generate an ECDSA P-384 node keypair")]
struct Args {
    /// Directory to write `priv.key`/`pub.key` into.
    #[arg(long)]
    keyspath: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.keyspath.exists() {
        eprintln!(
            "keyspath {} already exists, refusing to overwrite",
            args.keyspath.display()
        );
        return ExitCode::FAILURE;
    }

    match pulsar::keys::write_keypair_if_not_exists(&args.keyspath) {
        Ok(()) => {
            println!("wrote keypair to {}", args.keyspath.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to generate keypair: {err}");
            ExitCode::FAILURE
        }
    }
}
