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

//! Broadcast fabric isolation: one peer's connection state must not be
//! affected by another peer's dial failure, matching the upstream's
//! per-peer `Conns[addr] = nil` isolation in `ConnectPeer`/`Broadcast`.

use pulsar::broadcast::{Broadcaster, Transport};

#[tokio::test]
async fn unreachable_peers_stay_isolated_from_each_other() {
    // No TLS connector is configured, so every dial attempt fails
    // immediately — this exercises the "all peers disconnected" path
    // without needing a live listener.
    let peers = vec![
        "127.0.0.1:1".to_string(),
        "127.0.0.1:2".to_string(),
        "127.0.0.1:3".to_string(),
    ];
    let broadcaster = Broadcaster::new(&peers, Transport::Tcp, None);

    assert_eq!(broadcaster.connected_count().await, 0);

    // Broadcasting with no live connections must not panic or block.
    let envelope = pulsar::wire::Envelope {
        signature: vec![],
        epoch: 0,
        round_start_unix: 0,
        from: "self".to_string(),
        payload: pulsar::wire::EnvelopePayload::Collect(pulsar::wire::Proposal {
            from: "self".to_string(),
            entropy: "abcdefghij123456".to_string(),
        }),
    };
    broadcaster.broadcast(&envelope).await;

    assert_eq!(broadcaster.connected_count().await, 0);
}
