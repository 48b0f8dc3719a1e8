#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Pulsar node entrypoint.
//!
//! Analogue of `original_source/node/config.go`'s `MakeConfig`/
//! `ValidateConfig` plus `node.go`'s `NewNode`/`StartTransport`/`Schedule`/
//! `Processing` wiring, collapsed into a single `tokio::main`.

use tracing::error;

#[tokio::main]
async fn main() {
    let args = pulsar::cli::parse();

    let cfg = match pulsar::config::load(std::path::Path::new(&args.config)) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("fatal: {err}");
            std::process::exit(1);
        }
    };

    pulsar::telemetry::init(&cfg.logging);

    let node = match pulsar::node::Node::build(cfg).await {
        Ok(node) => node,
        Err(err) => {
            error!(%err, "fatal: node startup failed");
            std::process::exit(1);
        }
    };

    if let Err(err) = node.run().await {
        error!(%err, "fatal: node exited with error");
        std::process::exit(1);
    }
}
