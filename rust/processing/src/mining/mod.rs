// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room-adjacency pattern mining.
//!
//! Corpus graphs are projected to their room adjacency ([`Transactions`]),
//! handed to a [`FrequentSubgraphMiner`], and the resulting descriptions are
//! parsed back into [`Pattern`]s and located with [`find_matches`].

pub mod matching;
pub mod miner;
pub mod pattern;
pub mod transactions;

pub use matching::{contains, find_matches, Match};
pub use miner::{FrequentSubgraphMiner, MinedPattern, SubgraphEnumerationMiner};
pub use pattern::{canonical_form, describe, normalize_dfs, Pattern, ROOM_EDGE_LABEL};
pub use transactions::{room_projection, Transactions};
