//! Road graph representation and builder.
//!
//! # Data layout
//!
//! Nodes are stored in ascending `NodeId` order and addressed by a dense
//! [`NodeIdx`].  The graph keeps three adjacency tables, all in **Compressed
//! Sparse Row (CSR)** form:
//!
//! ```text
//! directed (routing):      edge_*[ node_out_start[n] .. node_out_start[n+1] ]
//! undirected (structure):  neighbor_list[ neighbor_start[n] .. neighbor_start[n+1] ]
//! incident segments:       incident_list[ incident_start[n] .. incident_start[n+1] ]
//! ```
//!
//! The directed table holds one edge per traversable direction of a segment:
//! `node1 → node2` always, `node2 → node1` only when the owning road is not
//! one-way.  The undirected table ignores one-way flags, drops self-loops and
//! lists each neighbour once.
//!
//! Edge arrays (`edge_from`, `edge_to`, `edge_segment`, `edge_length`,
//! `edge_speed`) are indexed by `EdgeId` and sorted by source node, so a
//! node's outgoing edges are a contiguous scan.
//!
//! Nothing here is mutable after [`RoadGraphBuilder::build`].

use std::collections::HashMap;

use log::{debug, warn};

use rn_core::{EdgeId, Location, NodeId, NodeIdx, RoadId, SegmentIdx};

use crate::error::{LoadError, LoadResult};
use crate::lights::mark_lit_nodes;
use crate::records::RestrictionRecord;
use crate::road::RoadInfo;

// ── Graph entities ────────────────────────────────────────────────────────────

/// An intersection or road end.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id:            NodeId,
    pub location:      Location,
    pub traffic_light: bool,
}

/// One stretch of road between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadSegment {
    pub road:     RoadId,
    /// Length in kilometres.
    pub length:   f64,
    pub node1:    NodeIdx,
    pub node2:    NodeIdx,
    /// Projected polyline, `node1` end first.
    pub geometry: Vec<Location>,
}

impl RoadSegment {
    /// The endpoint opposite `node`.
    #[inline]
    pub fn other_end(&self, node: NodeIdx) -> NodeIdx {
        if node == self.node1 { self.node2 } else { self.node1 }
    }
}

/// A forbidden turn `from → via → to`, resolved to dense indices.
///
/// Road ids are kept for reporting only; routing matches on nodes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Restriction {
    pub from:      NodeIdx,
    pub from_road: RoadId,
    pub via:       NodeIdx,
    pub to_road:   RoadId,
    pub to:        NodeIdx,
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Immutable road graph.
///
/// Node and edge arrays are `pub` for direct indexed access on hot paths.  Do
/// not construct directly; use [`RoadGraphBuilder`].
#[derive(Debug)]
pub struct RoadGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Indexed by `NodeIdx`; ascending `NodeId`.
    pub nodes: Vec<Node>,

    /// Indexed by `SegmentIdx`, in input order.
    pub segments: Vec<RoadSegment>,

    // ── Directed CSR ──────────────────────────────────────────────────────
    /// Outgoing edges of node `n` are `node_out_start[n] .. node_out_start[n+1]`.
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    pub edge_from: Vec<NodeIdx>,

    pub edge_to: Vec<NodeIdx>,

    /// Segment traversed by each edge.
    pub edge_segment: Vec<SegmentIdx>,

    /// Copy of the segment length, kept alongside the other edge arrays.
    pub edge_length: Vec<f64>,

    /// Weighted road speed (km/h) of each edge's road.
    pub edge_speed: Vec<f64>,

    // ── Undirected CSR ────────────────────────────────────────────────────
    neighbor_start: Vec<u32>,
    neighbor_list:  Vec<NodeIdx>,

    // ── Node → segment CSR ────────────────────────────────────────────────
    incident_start: Vec<u32>,
    incident_list:  Vec<SegmentIdx>,

    // ── Lookup tables ─────────────────────────────────────────────────────
    node_index:    HashMap<NodeId, NodeIdx>,
    roads:         HashMap<RoadId, RoadInfo>,
    road_segments: HashMap<RoadId, Vec<SegmentIdx>>,
    /// Keyed by the pivot node.
    restrictions:  HashMap<NodeIdx, Vec<Restriction>>,

    max_weighted_speed: f64,
}

impl RoadGraph {
    /// A graph with no nodes, roads, or edges.
    pub fn empty() -> Self {
        Self::assemble(Vec::new(), Vec::new(), Vec::new(), HashMap::new(), Vec::new())
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn index_of(&self, id: NodeId) -> Option<NodeIdx> {
        self.node_index.get(&id).copied()
    }

    #[inline]
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.index()]
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).map(|idx| self.node(idx))
    }

    #[inline]
    pub fn segment(&self, idx: SegmentIdx) -> &RoadSegment {
        &self.segments[idx.index()]
    }

    pub fn road(&self, id: RoadId) -> Option<&RoadInfo> {
        self.roads.get(&id)
    }

    /// Road info of the segment an edge traverses.
    pub fn edge_road(&self, edge: EdgeId) -> Option<&RoadInfo> {
        self.road(self.segment(self.edge_segment[edge.index()]).road)
    }

    /// All roads, in no particular order.
    pub fn roads(&self) -> impl Iterator<Item = &RoadInfo> + '_ {
        self.roads.values()
    }

    /// Segments belonging to `road`, in input order.
    pub fn segments_of_road(&self, road: RoadId) -> &[SegmentIdx] {
        self.road_segments.get(&road).map_or(&[], Vec::as_slice)
    }

    /// Turn restrictions pivoting on `via`.
    pub fn restrictions_at(&self, via: NodeIdx) -> &[Restriction] {
        self.restrictions.get(&via).map_or(&[], Vec::as_slice)
    }

    /// Fastest weighted speed of any road, in km/h.  Zero for a graph
    /// without roads; `f64::MAX`-scale if some road has no speed limit.
    pub fn max_weighted_speed(&self) -> f64 {
        self.max_weighted_speed
    }

    /// Segments with `node` as an endpoint, ascending.  A self-loop is
    /// listed once.
    #[inline]
    pub fn incident_segments(&self, node: NodeIdx) -> &[SegmentIdx] {
        let start = self.incident_start[node.index()] as usize;
        let end   = self.incident_start[node.index() + 1] as usize;
        &self.incident_list[start..end]
    }

    /// Distinct labels of the roads meeting at `node`, sorted.
    pub fn road_labels_at(&self, node: NodeIdx) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .incident_segments(node)
            .iter()
            .filter_map(|&s| self.road(self.segment(s).road))
            .map(|r| r.label.as_str())
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Directed outgoing edges of `node`; respects one-way roads.
    ///
    /// A contiguous index range; no allocation.
    #[inline]
    pub fn out_edges(&self, node: NodeIdx) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeIdx) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Undirected neighbours of `node`; ignores one-way flags.
    #[inline]
    pub fn neighbors(&self, node: NodeIdx) -> &[NodeIdx] {
        let start = self.neighbor_start[node.index()] as usize;
        let end   = self.neighbor_start[node.index() + 1] as usize;
        &self.neighbor_list[start..end]
    }

    // ── Construction ──────────────────────────────────────────────────────

    /// Build CSR tables from validated parts.
    fn assemble(
        nodes: Vec<Node>,
        segments: Vec<RoadSegment>,
        roads: Vec<RoadInfo>,
        node_index: HashMap<NodeId, NodeIdx>,
        restrictions: Vec<Restriction>,
    ) -> Self {
        let node_count = nodes.len();
        let roads: HashMap<RoadId, RoadInfo> = roads.into_iter().map(|r| (r.id, r)).collect();

        // Directed edges: (from, to, segment).  Stable sort keeps segment
        // input order within one source node.
        let mut raw: Vec<(NodeIdx, NodeIdx, SegmentIdx)> = Vec::with_capacity(segments.len() * 2);
        for (i, seg) in segments.iter().enumerate() {
            let s = SegmentIdx(i as u32);
            raw.push((seg.node1, seg.node2, s));
            let one_way = roads.get(&seg.road).is_some_and(|r| r.one_way);
            if !one_way {
                raw.push((seg.node2, seg.node1, s));
            }
        }
        raw.sort_by_key(|&(from, _, _)| from);

        let edge_from:    Vec<NodeIdx>    = raw.iter().map(|e| e.0).collect();
        let edge_to:      Vec<NodeIdx>    = raw.iter().map(|e| e.1).collect();
        let edge_segment: Vec<SegmentIdx> = raw.iter().map(|e| e.2).collect();
        let edge_length:  Vec<f64>        = raw.iter().map(|e| segments[e.2.index()].length).collect();
        let edge_speed:   Vec<f64>        = raw
            .iter()
            .map(|e| roads.get(&segments[e.2.index()].road).map_or(0.0, RoadInfo::weighted_speed))
            .collect();
        let node_out_start = row_pointers(node_count, raw.iter().map(|e| e.0));

        // Undirected neighbours, deduplicated, no self-loops.
        let mut pairs: Vec<(NodeIdx, NodeIdx)> = segments
            .iter()
            .filter(|s| s.node1 != s.node2)
            .flat_map(|s| [(s.node1, s.node2), (s.node2, s.node1)])
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        let neighbor_start = row_pointers(node_count, pairs.iter().map(|p| p.0));
        let neighbor_list  = pairs.into_iter().map(|p| p.1).collect();

        let mut incident: Vec<(NodeIdx, SegmentIdx)> = Vec::with_capacity(segments.len() * 2);
        for (i, seg) in segments.iter().enumerate() {
            let s = SegmentIdx(i as u32);
            incident.push((seg.node1, s));
            if seg.node2 != seg.node1 {
                incident.push((seg.node2, s));
            }
        }
        incident.sort_unstable();
        let incident_start = row_pointers(node_count, incident.iter().map(|p| p.0));
        let incident_list  = incident.into_iter().map(|p| p.1).collect();

        let mut road_segments: HashMap<RoadId, Vec<SegmentIdx>> = HashMap::new();
        for (i, seg) in segments.iter().enumerate() {
            road_segments.entry(seg.road).or_default().push(SegmentIdx(i as u32));
        }

        let mut by_via: HashMap<NodeIdx, Vec<Restriction>> = HashMap::new();
        for r in restrictions {
            by_via.entry(r.via).or_default().push(r);
        }

        let max_weighted_speed = roads.values().map(RoadInfo::weighted_speed).fold(0.0, f64::max);

        RoadGraph {
            nodes,
            segments,
            node_out_start,
            edge_from,
            edge_to,
            edge_segment,
            edge_length,
            edge_speed,
            neighbor_start,
            neighbor_list,
            incident_start,
            incident_list,
            node_index,
            roads,
            road_segments,
            restrictions: by_via,
            max_weighted_speed,
        }
    }
}

/// CSR row pointer for `sources`, which must be sorted ascending.
fn row_pointers(node_count: usize, sources: impl Iterator<Item = NodeIdx>) -> Vec<u32> {
    let mut start = vec![0u32; node_count + 1];
    for from in sources {
        start[from.index() + 1] += 1;
    }
    for i in 1..=node_count {
        start[i] += start[i - 1];
    }
    start
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Collects nodes, roads, segments and restrictions in any order, then
/// validates and freezes them with [`build`](Self::build).
///
/// # Example
///
/// ```
/// use rn_core::{Location, NodeId, RoadId};
/// use rn_network::{RoadGraphBuilder, RoadInfo};
/// use rn_network::road::Access;
///
/// let mut b = RoadGraphBuilder::new();
/// b.add_node(NodeId(10), Location::new(0.0, 0.0));
/// b.add_node(NodeId(20), Location::new(1.0, 0.0));
/// b.add_road(RoadInfo {
///     id: RoadId(1), kind: 0, label: "Queen Street".into(), city: "Auckland".into(),
///     one_way: false, speed_class: 3, road_class: 2, access: Access::default(),
/// });
/// b.add_segment(RoadId(1), 1.0, NodeId(10), NodeId(20), Vec::new());
/// let graph = b.build().unwrap();
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 2); // two-way
/// ```
#[derive(Default)]
pub struct RoadGraphBuilder {
    nodes:           Vec<(NodeId, Location)>,
    roads:           Vec<RoadInfo>,
    segments:        Vec<RawSegment>,
    restrictions:    Vec<RestrictionRecord>,
    lights:          Vec<Location>,
    light_tolerance: f64,
}

struct RawSegment {
    road:     RoadId,
    length:   f64,
    node1:    NodeId,
    node2:    NodeId,
    geometry: Vec<Location>,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate for the expected number of nodes and segments.
    pub fn with_capacity(nodes: usize, segments: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            segments: Vec::with_capacity(segments),
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, id: NodeId, location: Location) {
        self.nodes.push((id, location));
    }

    /// Register road metadata.  A later road with the same id replaces an
    /// earlier one.
    pub fn add_road(&mut self, info: RoadInfo) {
        self.roads.push(info);
    }

    pub fn add_segment(
        &mut self,
        road: RoadId,
        length: f64,
        node1: NodeId,
        node2: NodeId,
        geometry: Vec<Location>,
    ) {
        self.segments.push(RawSegment { road, length, node1, node2, geometry });
    }

    /// Restrictions naming unknown nodes are dropped at build time.
    pub fn add_restriction(&mut self, restriction: RestrictionRecord) {
        self.restrictions.push(restriction);
    }

    /// Traffic-light coordinates to match against nodes during build.
    pub fn traffic_lights(&mut self, lights: Vec<Location>, tolerance: f64) {
        self.lights = lights;
        self.light_tolerance = tolerance;
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn segment_count(&self) -> usize { self.segments.len() }

    /// Validate and freeze.
    ///
    /// # Errors
    ///
    /// - [`LoadError::DuplicateNode`] if two nodes share an id.
    /// - [`LoadError::MissingNode`] if a segment names an unknown node.
    /// - [`LoadError::MissingRoad`] if a segment names a road with no info.
    pub fn build(self) -> LoadResult<RoadGraph> {
        // ── Nodes: ascending id → dense index ─────────────────────────────
        let mut raw_nodes = self.nodes;
        raw_nodes.sort_by_key(|&(id, _)| id);
        if let Some(w) = raw_nodes.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(LoadError::DuplicateNode(w[0].0));
        }
        let node_index: HashMap<NodeId, NodeIdx> = raw_nodes
            .iter()
            .enumerate()
            .map(|(i, &(id, _))| (id, NodeIdx(i as u32)))
            .collect();
        let mut nodes: Vec<Node> = raw_nodes
            .into_iter()
            .map(|(id, location)| Node { id, location, traffic_light: false })
            .collect();

        // ── Roads: last definition wins ───────────────────────────────────
        let mut roads: Vec<RoadInfo> = Vec::with_capacity(self.roads.len());
        let mut road_slot: HashMap<RoadId, usize> = HashMap::with_capacity(self.roads.len());
        for info in self.roads {
            match road_slot.get(&info.id) {
                Some(&slot) => {
                    warn!("road {} defined more than once; keeping the last definition", info.id);
                    roads[slot] = info;
                }
                None => {
                    road_slot.insert(info.id, roads.len());
                    roads.push(info);
                }
            }
        }

        // ── Segments: every endpoint and road must exist ──────────────────
        let resolve = |road: RoadId, id: NodeId| {
            node_index
                .get(&id)
                .copied()
                .ok_or(LoadError::MissingNode { road, node: id })
        };
        let mut segments = Vec::with_capacity(self.segments.len());
        for raw in self.segments {
            if !road_slot.contains_key(&raw.road) {
                return Err(LoadError::MissingRoad(raw.road));
            }
            segments.push(RoadSegment {
                road:     raw.road,
                length:   raw.length,
                node1:    resolve(raw.road, raw.node1)?,
                node2:    resolve(raw.road, raw.node2)?,
                geometry: raw.geometry,
            });
        }

        // ── Restrictions: optional, drop what does not resolve ────────────
        let mut restrictions = Vec::with_capacity(self.restrictions.len());
        for r in self.restrictions {
            let ends = (node_index.get(&r.from_node), node_index.get(&r.via), node_index.get(&r.to_node));
            match ends {
                (Some(&from), Some(&via), Some(&to)) => restrictions.push(Restriction {
                    from,
                    from_road: r.from_road,
                    via,
                    to_road: r.to_road,
                    to,
                }),
                _ => warn!(
                    "dropping restriction {} -> {} -> {}: unknown node",
                    r.from_node, r.via, r.to_node
                ),
            }
        }

        if !self.lights.is_empty() {
            let lit = mark_lit_nodes(&mut nodes, &self.lights, self.light_tolerance);
            debug!("{lit} of {} nodes matched to {} traffic lights", nodes.len(), self.lights.len());
        }

        Ok(RoadGraph::assemble(nodes, segments, roads, node_index, restrictions))
    }
}
