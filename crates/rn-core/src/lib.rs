//! `rn-core` — foundational types for the `rn` road-network engine.
//!
//! This crate is a dependency of every other `rn-*` crate.  It has no `rn-*`
//! dependencies and a single external one (`thiserror`, plus optional
//! `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `RoadId` (external) and `NodeIdx`, `SegmentIdx`, `EdgeId` (dense) |
//! | [`geo`]    | `Location`, `LatLon`, `BoundingBox`, fixed-origin projection |
//! | [`config`] | `EngineConfig`                                            |
//! | [`error`]  | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use geo::{BoundingBox, LatLon, Location};
pub use ids::{EdgeId, NodeId, NodeIdx, RoadId, SegmentIdx};
