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

//! Wall-clock synchronized round scheduler.
//!
//! Analogue of `original_source/node/node.go`'s `Schedule`: every node
//! sleeps until the next multiple of `pace_ms` since the Unix epoch and
//! fires a tick carrying that boundary's Unix timestamp, so independently
//! started nodes converge on the same round-start instant (assuming
//! roughly synchronized clocks, e.g. via ntpd). Grounded in style on the
//! teacher's `core::consensus::hydro::HydroConfig::check_time_window_abs`,
//! which already reasons about absolute millisecond boundaries, generalized
//! here to a pure repeating-boundary tick with no genesis epoch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::info;

/// Compute the next round-start boundary (in epoch milliseconds) strictly
/// after `now_ms`, for a given pace. Pure function, unit-testable without
/// sleeping.
pub fn next_boundary_ms(now_ms: u64, pace_ms: u64) -> u64 {
    debug_assert!(pace_ms > 0);
    (now_ms / pace_ms + 1) * pace_ms
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Runs forever, sending the Unix-seconds timestamp of each round boundary
/// on `tx` as it arrives. Exits when the receiver is dropped.
pub async fn run(pace_ms: u64, tx: mpsc::Sender<i64>) {
    loop {
        let boundary_ms = next_boundary_ms(now_ms(), pace_ms);
        let wait_ms = boundary_ms.saturating_sub(now_ms());
        info!(wait_ms, boundary_ms, "sleeping until next round boundary");
        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        let boundary_unix = (boundary_ms / 1000) as i64;
        if tx.send(boundary_unix).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_next_multiple_of_pace() {
        assert_eq!(next_boundary_ms(0, 1000), 1000);
        assert_eq!(next_boundary_ms(999, 1000), 1000);
        assert_eq!(next_boundary_ms(1000, 1000), 2000);
        assert_eq!(next_boundary_ms(1500, 1000), 2000);
    }

    #[test]
    fn boundary_is_strictly_in_the_future() {
        for now in [0u64, 1, 4999, 5000, 5001, 123_456] {
            let boundary = next_boundary_ms(now, 5000);
            assert!(boundary > now);
            assert_eq!(boundary % 5000, 0);
        }
    }
}
