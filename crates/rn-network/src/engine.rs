//! Query facade over an immutable, atomically replaced snapshot.
//!
//! A [`Snapshot`] bundles everything one load produces: the [`RoadGraph`],
//! a quadtree over node locations, and a prefix trie over road labels.  The
//! [`Engine`] holds the current snapshot behind an `Arc`.  A load builds a
//! complete replacement first and swaps it in with a single assignment, so a
//! failed load leaves the previous snapshot untouched and readers holding a
//! cloned `Arc` keep a consistent view.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use rn_core::{BoundingBox, CoreResult, EngineConfig, Location, NodeId, NodeIdx, RoadId, SegmentIdx};
use rn_index::{Located, PrefixTrie, QuadTree};

use crate::articulation::articulation_points;
use crate::error::{LoadResult, QueryError, QueryResult};
use crate::loader::load_dataset_dir;
use crate::network::{Node, RoadGraph, RoadGraphBuilder};
use crate::records::Dataset;
use crate::road::RoadInfo;
use crate::router::{AStarRouter, CostMode, CostModel, LightPolicy, Route, Router};

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Quadtree entry: a node's dense index and where it is.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeEntry {
    pub idx:      NodeIdx,
    pub location: Location,
}

impl Located for NodeEntry {
    #[inline]
    fn location(&self) -> Location {
        self.location
    }
}

/// Everything built by one successful load.
pub struct Snapshot {
    graph:   RoadGraph,
    spatial: QuadTree<NodeEntry>,
    labels:  PrefixTrie<RoadId>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            graph:   RoadGraph::empty(),
            spatial: QuadTree::empty(),
            labels:  PrefixTrie::new(),
        }
    }

    /// Project, validate and index `dataset`.
    pub fn build(dataset: &Dataset, config: &EngineConfig) -> LoadResult<Self> {
        config.validate()?;

        // ── Graph ─────────────────────────────────────────────────────────
        let mut builder = RoadGraphBuilder::with_capacity(dataset.nodes.len(), dataset.segments.len());
        for rec in &dataset.nodes {
            builder.add_node(rec.id, rec.position.project());
        }
        for rec in &dataset.roads {
            builder.add_road(RoadInfo::from_record(rec, &config.placeholder_label));
        }
        for rec in &dataset.segments {
            let geometry = rec.polyline.iter().map(|p| p.project()).collect();
            builder.add_segment(rec.road, rec.length, rec.node1, rec.node2, geometry);
        }
        for &rec in &dataset.restrictions {
            builder.add_restriction(rec);
        }
        builder.traffic_lights(
            dataset.traffic_lights.iter().map(|p| p.project()).collect(),
            config.light_match_tolerance,
        );
        let graph = builder.build()?;

        // ── Spatial index ─────────────────────────────────────────────────
        let extent = BoundingBox::covering(
            graph.nodes.iter().map(|n| n.location),
            config.quadtree_padding,
        );
        let mut spatial = match extent {
            Some(boundary) => {
                QuadTree::with_limits(boundary, config.quadtree_capacity, config.quadtree_max_depth)
            }
            None => QuadTree::empty(),
        };
        for (i, node) in graph.nodes.iter().enumerate() {
            let entry = NodeEntry { idx: NodeIdx(i as u32), location: node.location };
            if !spatial.insert(entry) {
                warn!("{} at {} fell outside the spatial index", node.id, node.location);
            }
        }

        // ── Label trie, in road id order ──────────────────────────────────
        let mut roads: Vec<&RoadInfo> = graph.roads().collect();
        roads.sort_unstable_by_key(|r| r.id);
        let mut labels = PrefixTrie::new();
        for road in roads {
            labels.insert(&road.label, road.id);
        }

        info!(
            "built snapshot: {} nodes, {} segments, {} roads, {} directed edges, {} lit nodes",
            graph.node_count(),
            graph.segment_count(),
            graph.road_count(),
            graph.edge_count(),
            graph.nodes.iter().filter(|n| n.traffic_light).count(),
        );

        Ok(Self { graph, spatial, labels })
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn spatial(&self) -> &QuadTree<NodeEntry> {
        &self.spatial
    }

    pub fn labels(&self) -> &PrefixTrie<RoadId> {
        &self.labels
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// The public entry point: load a dataset, then query it.
///
/// Generic over the [`Router`] so tests and applications can swap the search
/// strategy; the default is [`AStarRouter`].
pub struct Engine<R: Router = AStarRouter> {
    config:   EngineConfig,
    router:   R,
    snapshot: Arc<Snapshot>,
}

impl Engine<AStarRouter> {
    /// An engine with an empty snapshot.
    pub fn new(config: EngineConfig) -> CoreResult<Self> {
        Self::with_router(config, AStarRouter)
    }
}

impl<R: Router> Engine<R> {
    pub fn with_router(config: EngineConfig, router: R) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config, router, snapshot: Arc::new(Snapshot::empty()) })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current snapshot.  Clones stay valid across later loads.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.snapshot.graph
    }

    // ── Loading ───────────────────────────────────────────────────────────

    /// Replace the snapshot with one built from `dataset`.
    ///
    /// On error the previous snapshot stays active.
    pub fn load(&mut self, dataset: &Dataset) -> LoadResult<()> {
        let next = Snapshot::build(dataset, &self.config)?;
        self.snapshot = Arc::new(next);
        Ok(())
    }

    /// [`load`](Self::load) the tab files in `dir`.
    pub fn load_dir(&mut self, dir: &Path) -> LoadResult<()> {
        let dataset = load_dataset_dir(dir)?;
        self.load(&dataset)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Closest node to `location` within the square of half-width `radius`.
    pub fn nearest(&self, location: Location, radius: f64) -> Option<&Node> {
        let snap = &*self.snapshot;
        snap.spatial
            .nearest_within(location, radius)
            .map(|entry| snap.graph.node(entry.idx))
    }

    /// [`nearest`](Self::nearest) with the configured click radius.
    pub fn nearest_to_click(&self, location: Location) -> Option<&Node> {
        self.nearest(location, self.config.click_radius)
    }

    /// Cheapest route from `start` to `goal`.
    ///
    /// An empty route means `start == goal` or no path.
    pub fn route(
        &self,
        start: NodeId,
        goal: NodeId,
        mode: CostMode,
        lights: LightPolicy,
    ) -> QueryResult<Route> {
        let graph = &self.snapshot.graph;
        let cost = CostModel::for_mode(mode, lights, graph, &self.config);
        let route = self.router.route(graph, start, goal, &cost)?;
        debug!(
            "route {start} -> {goal} ({mode:?}, {lights:?}): {} nodes, cost {:.4}",
            route.nodes.len(),
            route.total_cost,
        );
        Ok(route)
    }

    /// Distinct road labels starting with `prefix`, sorted.  Case-sensitive;
    /// the empty prefix matches every label.
    pub fn search(&self, prefix: &str) -> Vec<String> {
        let mut labels: Vec<String> = self
            .search_roads(prefix)
            .into_iter()
            .map(|r| r.label.clone())
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Roads whose label starts with `prefix`, by ascending id.
    pub fn search_roads(&self, prefix: &str) -> Vec<&RoadInfo> {
        let snap = &*self.snapshot;
        let mut ids: Vec<RoadId> = snap.labels.find_all(prefix).into_iter().copied().collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter().filter_map(|id| snap.graph.road(id)).collect()
    }

    /// Every segment of every road matching `prefix`, ascending.
    pub fn highlight(&self, prefix: &str) -> Vec<SegmentIdx> {
        let graph = &self.snapshot.graph;
        let mut segments: Vec<SegmentIdx> = self
            .search_roads(prefix)
            .into_iter()
            .flat_map(|r| graph.segments_of_road(r.id).iter().copied())
            .collect();
        segments.sort_unstable();
        segments
    }

    /// Labels of the roads meeting at `node`.  Empty on an empty graph.
    pub fn road_labels_at(&self, node: NodeId) -> QueryResult<Vec<&str>> {
        let graph = &self.snapshot.graph;
        if graph.is_empty() {
            return Ok(Vec::new());
        }
        let idx = graph.index_of(node).ok_or(QueryError::UnknownNode(node))?;
        Ok(graph.road_labels_at(idx))
    }

    /// Cut vertices of the current network.
    pub fn articulation_points(&self) -> BTreeSet<NodeId> {
        let points = articulation_points(&self.snapshot.graph);
        debug!("{} articulation points", points.len());
        points
    }
}
