//! Parsed input records, in the field order of the source files.
//!
//! These are what an external loader hands to
//! [`Engine::load`](crate::Engine::load).  Coordinates are still raw
//! latitude/longitude here; projection happens when the graph is built.

use rn_core::{LatLon, NodeId, RoadId};

/// `id  lat  lon`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeRecord {
    pub id:       NodeId,
    pub position: LatLon,
}

/// `id  type  label  city  oneway  speed  roadclass  notforcar  notforpede  notforbicy`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadInfoRecord {
    pub id:                  RoadId,
    pub kind:                i32,
    /// Raw label; `"-"` is replaced by the configured placeholder at build time.
    pub label:               String,
    pub city:                String,
    pub one_way:             bool,
    /// 0–6 selects a km/h band; anything else means unlimited.
    pub speed_class:         i32,
    /// 0–3 weight the speed band down; 4 and above leave it unweighted.
    pub road_class:          i32,
    pub not_for_cars:        bool,
    pub not_for_pedestrians: bool,
    pub not_for_cyclists:    bool,
}

/// `roadid  length  nodeid1  nodeid2  lat lon  lat lon …`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentRecord {
    pub road:     RoadId,
    /// Length in kilometres.
    pub length:   f64,
    pub node1:    NodeId,
    pub node2:    NodeId,
    pub polyline: Vec<LatLon>,
}

/// `nodeid1  roadid1  nodeid  roadid2  nodeid2`
///
/// Forbids arriving at `via` from `from_node` and leaving towards `to_node`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestrictionRecord {
    pub from_node: NodeId,
    pub from_road: RoadId,
    pub via:       NodeId,
    pub to_road:   RoadId,
    pub to_node:   NodeId,
}

/// Everything one load consumes.
///
/// `nodes`, `roads`, and `segments` are mandatory; a dataset without them
/// simply yields an empty graph.  `restrictions` and `traffic_lights` are
/// optional sections.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    pub nodes:          Vec<NodeRecord>,
    pub roads:          Vec<RoadInfoRecord>,
    pub segments:       Vec<SegmentRecord>,
    pub restrictions:   Vec<RestrictionRecord>,
    pub traffic_lights: Vec<LatLon>,
}
