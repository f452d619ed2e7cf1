// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Floorplan Graph
//!
//! Typed graph of apartments, rooms, walls and wall segments.
//!
//! Nodes and edges are stored in slot maps with stable keys and an
//! incidence index. The crate also provides:
//!
//! - builders for whole-floor overlays and per-apartment mining graphs
//! - identical-wall chain simplification and core-to-apartment discovery
//! - JSON snapshots with WKT geometry and a cacache-backed graph store
//! - small labeled graphs with subgraph monomorphism and Weisfeiler-Lehman
//!   signatures, used by pattern mining and module grouping

pub mod builders;
pub mod chain;
pub mod dictionary;
pub mod error;
pub mod graph;
pub mod keys;
pub mod labeled;
pub mod serialization;
pub mod signature;
pub mod store;
pub mod traversal;

pub use builders::{
    apartment_node_id, collinear_overlap, rectify_room, room_node_id, segment_node_id,
    shared_boundary, wall_node_id, GraphBuilder,
};
pub use dictionary::{MetaValue, Metadata};
pub use error::{Error, Result};
pub use graph::{Edge, FloorplanGraph, Node, NodeData, RoomNode, SegmentNode, WallNode};
pub use keys::{EdgeKey, EdgeKind, NodeKey, NodeKind};
pub use labeled::LabeledGraph;
pub use serialization::GraphSnapshot;
pub use signature::{wl_hash, DEFAULT_ITERATIONS};
pub use store::GraphStore;
pub use traversal::{Expansion, StopAtApartments, TraversalPolicy, Unbounded};
