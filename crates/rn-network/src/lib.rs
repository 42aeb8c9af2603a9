//! `rn-network` — road graph, routing, connectivity, loading, and the engine.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`records`]      | Parsed input rows, `Dataset`                               |
//! | [`road`]         | `RoadInfo`, `Access`, speed bands                          |
//! | [`network`]      | `RoadGraph` (directed + undirected CSR), `RoadGraphBuilder` |
//! | [`router`]       | `Router` trait, `AStarRouter`, `CostModel`, `Route`        |
//! | [`articulation`] | `articulation_points` (iterative Tarjan)                   |
//! | [`loader`]       | Tab-separated dataset directory reader                     |
//! | [`engine`]       | `Engine`, `Snapshot`                                       |
//! | [`error`]        | `LoadError`, `QueryError`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on records and route types. |

pub mod articulation;
pub mod engine;
pub mod error;
pub mod loader;
pub mod network;
pub mod records;
pub mod road;
pub mod router;

mod lights;

#[cfg(test)]
mod tests;

pub use articulation::articulation_points;
pub use engine::{Engine, NodeEntry, Snapshot};
pub use error::{LoadError, LoadResult, QueryError, QueryResult};
pub use loader::load_dataset_dir;
pub use network::{Node, Restriction, RoadGraph, RoadGraphBuilder, RoadSegment};
pub use records::{Dataset, NodeRecord, RestrictionRecord, RoadInfoRecord, SegmentRecord};
pub use road::{Access, RoadInfo};
pub use router::{AStarRouter, CostMode, CostModel, DijkstraRouter, LightPolicy, Route, RouteLeg, Router};
