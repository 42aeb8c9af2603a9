//! Unit tests for rn-network.
//!
//! Graph-level tests build planar networks directly through
//! `RoadGraphBuilder`; engine and loader tests go through lat/lon records.

#[cfg(test)]
mod helpers {
    use rn_core::{Location, NodeId, RoadId};

    use crate::road::Access;
    use crate::{RoadGraph, RoadGraphBuilder, RoadInfo};

    /// Two-way road at 60 km/h with no class weighting.
    pub fn road(id: u32, label: &str) -> RoadInfo {
        RoadInfo {
            id:          RoadId(id),
            kind:        0,
            label:       label.to_owned(),
            city:        "Auckland".to_owned(),
            one_way:     false,
            speed_class: 3,
            road_class:  4,
            access:      Access::default(),
        }
    }

    pub fn one_way(id: u32, label: &str) -> RoadInfo {
        RoadInfo { one_way: true, ..road(id, label) }
    }

    /// `nodes`: (id, x, y).  `segments`: (road, node1, node2, length).
    pub fn builder(
        nodes: &[(u32, f64, f64)],
        roads: Vec<RoadInfo>,
        segments: &[(u32, u32, u32, f64)],
    ) -> RoadGraphBuilder {
        let mut b = RoadGraphBuilder::new();
        for &(id, x, y) in nodes {
            b.add_node(NodeId(id), Location::new(x, y));
        }
        for r in roads {
            b.add_road(r);
        }
        for &(road, n1, n2, len) in segments {
            b.add_segment(RoadId(road), len, NodeId(n1), NodeId(n2), Vec::new());
        }
        b
    }

    pub fn graph(
        nodes: &[(u32, f64, f64)],
        roads: Vec<RoadInfo>,
        segments: &[(u32, u32, u32, f64)],
    ) -> RoadGraph {
        builder(nodes, roads, segments).build().unwrap()
    }

    /// Undirected graph where every segment is its own unnamed road.
    pub fn topology(node_ids: &[u32], links: &[(u32, u32)]) -> RoadGraph {
        let nodes: Vec<_> = node_ids.iter().map(|&id| (id, id as f64, 0.0)).collect();
        let roads = (0..links.len() as u32).map(|i| road(i, "link")).collect();
        let segments: Vec<_> = links
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| (i as u32, a, b, 1.0))
            .collect();
        graph(&nodes, roads, &segments)
    }

    /// Grid used by the routing tests.
    ///
    /// ```text
    ///   4 ─────2.5───── 5
    ///   │               │
    ///   1 ──1── 2 ──1── 3
    /// ```
    ///
    /// 1-2 and 2-3 are "Queen Street", 3-5 is "Quay Street", 1-4 and 4-5 are
    /// "Karangahape Road".  Cheapest 1 → 5 is 1-2-3-5 (cost 3).
    pub fn grid() -> RoadGraph {
        graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0), (4, 0.0, 1.0), (5, 2.0, 1.0)],
            vec![road(1, "Queen Street"), road(2, "Quay Street"), road(3, "Karangahape Road")],
            &[(1, 1, 2, 1.0), (1, 2, 3, 1.0), (2, 3, 5, 1.0), (3, 1, 4, 1.0), (3, 4, 5, 2.5)],
        )
    }
}

// ── Builder & graph structure ────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use rn_core::{Location, NodeId, NodeIdx, RoadId, SegmentIdx};

    use super::helpers::{builder, graph, one_way, road};
    use crate::{LoadError, RestrictionRecord, RoadGraphBuilder};

    #[test]
    fn empty_build() {
        let g = RoadGraphBuilder::new().build().unwrap();
        assert!(g.is_empty());
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(format!("{g:?}").starts_with("RoadGraph"));
        assert_eq!(g.max_weighted_speed(), 0.0);
    }

    #[test]
    fn node_indices_follow_ascending_ids() {
        let g = graph(&[(30, 0.0, 0.0), (10, 1.0, 0.0), (20, 2.0, 0.0)], vec![], &[]);
        let ids: Vec<u32> = g.nodes.iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(g.index_of(NodeId(30)), Some(NodeIdx(2)));
        assert_eq!(g.node_by_id(NodeId(10)).unwrap().location, Location::new(1.0, 0.0));
        assert!(g.index_of(NodeId(99)).is_none());
    }

    #[test]
    fn duplicate_node_rejected() {
        let err = builder(&[(5, 0.0, 0.0), (5, 1.0, 1.0)], vec![], &[]).build().unwrap_err();
        assert!(matches!(err, LoadError::DuplicateNode(NodeId(5))), "got {err}");
    }

    #[test]
    fn segment_with_unknown_node_rejected() {
        let err = builder(&[(1, 0.0, 0.0)], vec![road(7, "x")], &[(7, 1, 99, 1.0)])
            .build()
            .unwrap_err();
        assert!(
            matches!(err, LoadError::MissingNode { road: RoadId(7), node: NodeId(99) }),
            "got {err}"
        );
    }

    #[test]
    fn segment_with_unknown_road_rejected() {
        let err = builder(&[(1, 0.0, 0.0), (2, 1.0, 0.0)], vec![], &[(7, 1, 2, 1.0)])
            .build()
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingRoad(RoadId(7))), "got {err}");
    }

    #[test]
    fn two_way_road_has_both_directions() {
        let g = graph(&[(1, 0.0, 0.0), (2, 1.0, 0.0)], vec![road(1, "a")], &[(1, 1, 2, 1.0)]);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.out_degree(NodeIdx(0)), 1);
        assert_eq!(g.out_degree(NodeIdx(1)), 1);
    }

    #[test]
    fn one_way_omits_reverse_edge() {
        let g = graph(&[(1, 0.0, 0.0), (2, 1.0, 0.0)], vec![one_way(1, "a")], &[(1, 1, 2, 1.0)]);
        assert_eq!(g.edge_count(), 1);
        let out: Vec<_> = g.out_edges(NodeIdx(0)).map(|e| g.edge_to[e.index()]).collect();
        assert_eq!(out, vec![NodeIdx(1)]);
        assert_eq!(g.out_edges(NodeIdx(1)).count(), 0);
        // Structure still sees the link both ways.
        assert_eq!(g.neighbors(NodeIdx(0)), &[NodeIdx(1)]);
        assert_eq!(g.neighbors(NodeIdx(1)), &[NodeIdx(0)]);
    }

    #[test]
    fn neighbors_are_deduplicated_without_self_loops() {
        let g = graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0)],
            vec![road(1, "a"), road(2, "b")],
            &[(1, 1, 2, 1.0), (2, 2, 1, 1.2), (1, 1, 1, 0.5)],
        );
        assert_eq!(g.neighbors(NodeIdx(0)), &[NodeIdx(1)]);
        assert_eq!(g.neighbors(NodeIdx(1)), &[NodeIdx(0)]);
        // Routing keeps every parallel edge.
        assert_eq!(g.edge_count(), 6);
    }

    #[test]
    fn csr_edges_record_source_and_segment() {
        let g = super::helpers::grid();
        for e in 0..g.edge_count() {
            let seg = g.segment(g.edge_segment[e]);
            let (from, to) = (g.edge_from[e], g.edge_to[e]);
            assert!((seg.node1 == from && seg.node2 == to) || (seg.node2 == from && seg.node1 == to));
            assert_eq!(seg.other_end(from), to);
            assert_eq!(g.edge_length[e], seg.length);
        }
        // Edges are grouped by source.
        assert!(g.edge_from.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn later_road_definition_wins() {
        let g = graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0)],
            vec![road(1, "First"), one_way(1, "Second")],
            &[(1, 1, 2, 1.0)],
        );
        assert_eq!(g.road_count(), 1);
        assert_eq!(g.road(RoadId(1)).unwrap().label, "Second");
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn restrictions_with_unknown_nodes_dropped() {
        let mut b = builder(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0)],
            vec![road(1, "a")],
            &[(1, 1, 2, 1.0), (1, 2, 3, 1.0)],
        );
        let keep = RestrictionRecord {
            from_node: NodeId(1),
            from_road: RoadId(1),
            via:       NodeId(2),
            to_road:   RoadId(1),
            to_node:   NodeId(3),
        };
        b.add_restriction(keep);
        b.add_restriction(RestrictionRecord { to_node: NodeId(99), ..keep });
        let g = b.build().unwrap();

        let at_2 = g.restrictions_at(NodeIdx(1));
        assert_eq!(at_2.len(), 1);
        assert_eq!((at_2[0].from, at_2[0].to), (NodeIdx(0), NodeIdx(2)));
        assert!(g.restrictions_at(NodeIdx(0)).is_empty());
    }

    #[test]
    fn traffic_lights_match_within_manhattan_tolerance() {
        let mut b = builder(&[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0)], vec![], &[]);
        b.traffic_lights(
            vec![
                Location::new(0.004, 0.004),  // 0.008 from node 1
                Location::new(1.0, 0.02),     // 0.02 from node 2
                Location::new(2.006, -0.006), // 0.012 from node 3
            ],
            0.01,
        );
        let g = b.build().unwrap();
        let lit: Vec<bool> = g.nodes.iter().map(|n| n.traffic_light).collect();
        assert_eq!(lit, vec![true, false, false]);
    }

    #[test]
    fn road_labels_at_node_are_distinct_and_sorted() {
        let g = super::helpers::grid();
        let at_3 = g.road_labels_at(g.index_of(NodeId(3)).unwrap());
        assert_eq!(at_3, vec!["Quay Street", "Queen Street"]);
        let at_1 = g.road_labels_at(g.index_of(NodeId(1)).unwrap());
        assert_eq!(at_1, vec!["Karangahape Road", "Queen Street"]);
    }

    #[test]
    fn incident_segments_list_each_segment_once() {
        let g = graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0)],
            vec![road(1, "Queen Street"), road(2, "Roundabout")],
            &[(1, 1, 2, 1.0), (2, 2, 2, 0.3), (1, 2, 3, 1.0)],
        );
        let at = |id| g.incident_segments(g.index_of(NodeId(id)).unwrap()).to_vec();
        assert_eq!(at(1), vec![SegmentIdx(0)]);
        assert_eq!(at(2), vec![SegmentIdx(0), SegmentIdx(1), SegmentIdx(2)]);
        assert_eq!(at(3), vec![SegmentIdx(2)]);
        let mid = g.road_labels_at(g.index_of(NodeId(2)).unwrap());
        assert_eq!(mid, vec!["Queen Street", "Roundabout"]);
    }

    #[test]
    fn segments_grouped_by_road() {
        let g = super::helpers::grid();
        assert_eq!(g.segments_of_road(RoadId(1)).len(), 2);
        assert_eq!(g.segments_of_road(RoadId(2)).len(), 1);
        assert!(g.segments_of_road(RoadId(42)).is_empty());
    }
}

// ── Road speeds ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod road {
    use super::helpers::road;
    use crate::RoadInfo;

    #[test]
    fn speed_bands() {
        let bands: Vec<f64> = (0..=6)
            .map(|c| RoadInfo { speed_class: c, ..road(1, "a") }.speed_kmh())
            .collect();
        assert_eq!(bands, vec![5.0, 20.0, 40.0, 60.0, 80.0, 100.0, 110.0]);
        assert_eq!(RoadInfo { speed_class: 7, ..road(1, "a") }.speed_kmh(), f64::MAX);
        assert_eq!(RoadInfo { speed_class: -1, ..road(1, "a") }.speed_kmh(), f64::MAX);
    }

    #[test]
    fn minor_classes_are_weighted_down() {
        let r = RoadInfo { speed_class: 4, road_class: 0, ..road(1, "a") };
        assert!((r.weighted_speed() - 80.0 * 0.72).abs() < 1e-12);
        let r = RoadInfo { road_class: 3, ..r };
        assert!((r.weighted_speed() - 80.0 * 0.95).abs() < 1e-12);
        let r = RoadInfo { road_class: 9, ..r };
        assert_eq!(r.weighted_speed(), 80.0);
    }
}

// ── Routing ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod router {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rn_core::{EngineConfig, Location, NodeId, NodeIdx, RoadId};

    use super::helpers::{builder, graph, grid, one_way, road};
    use crate::{
        AStarRouter, CostMode, CostModel, DijkstraRouter, LightPolicy, QueryError,
        RestrictionRecord, RoadGraph, RoadInfo, Route, RouteLeg, Router,
    };

    fn model(g: &RoadGraph, mode: CostMode, lights: LightPolicy) -> CostModel {
        CostModel::for_mode(mode, lights, g, &EngineConfig::default())
    }

    fn distance(g: &RoadGraph) -> CostModel {
        model(g, CostMode::Distance, LightPolicy::Ignore)
    }

    fn ids(route: &Route) -> Vec<u32> {
        route.nodes.iter().map(|n| n.0).collect()
    }

    #[test]
    fn cheapest_path_on_grid() {
        let g = grid();
        let r = AStarRouter.route(&g, NodeId(1), NodeId(5), &distance(&g)).unwrap();
        assert_eq!(ids(&r), vec![1, 2, 3, 5]);
        assert_eq!(r.edges.len(), 3);
        assert!((r.total_cost - 3.0).abs() < 1e-12);
        assert!((r.length(&g) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn route_to_self_is_empty() {
        let g = grid();
        let r = AStarRouter.route(&g, NodeId(2), NodeId(2), &distance(&g)).unwrap();
        assert!(r.is_empty());
        assert!(r.edges.is_empty());
        assert_eq!(r.total_cost, 0.0);
    }

    #[test]
    fn unknown_node_is_an_error() {
        let g = grid();
        let err = AStarRouter.route(&g, NodeId(1), NodeId(42), &distance(&g)).unwrap_err();
        assert_eq!(err, QueryError::UnknownNode(NodeId(42)));
        let err = AStarRouter.route(&g, NodeId(42), NodeId(1), &distance(&g)).unwrap_err();
        assert_eq!(err, QueryError::UnknownNode(NodeId(42)));
    }

    #[test]
    fn empty_graph_gives_empty_route() {
        let g = RoadGraph::empty();
        let r = AStarRouter.route(&g, NodeId(1), NodeId(2), &distance(&g)).unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn unreachable_goal_gives_empty_route() {
        let g = graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 5.0, 0.0), (4, 6.0, 0.0)],
            vec![road(1, "a")],
            &[(1, 1, 2, 1.0), (1, 3, 4, 1.0)],
        );
        let r = AStarRouter.route(&g, NodeId(1), NodeId(4), &distance(&g)).unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn one_way_forces_detour_in_reverse() {
        // 1 → 2 is one-way; 1-3-2 is a two-way detour.
        let g = graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 0.5, 0.5)],
            vec![one_way(1, "Short Cut"), road(2, "Long Way")],
            &[(1, 1, 2, 1.0), (2, 1, 3, 1.0), (2, 3, 2, 1.5)],
        );
        let fwd = AStarRouter.route(&g, NodeId(1), NodeId(2), &distance(&g)).unwrap();
        assert_eq!(ids(&fwd), vec![1, 2]);
        let back = AStarRouter.route(&g, NodeId(2), NodeId(1), &distance(&g)).unwrap();
        assert_eq!(ids(&back), vec![2, 3, 1]);
        assert!((back.total_cost - 2.5).abs() < 1e-12);
    }

    #[test]
    fn turn_restriction_forces_detour() {
        //        4
        //      /   \
        // 1 - 2  X  3      no turn 1 → 2 → 3
        let nodes = [(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0), (4, 1.0, 1.0)];
        let segs = [(1, 1, 2, 1.0), (1, 2, 3, 1.0), (2, 2, 4, 1.0), (2, 4, 3, 1.5)];
        let roads = || vec![road(1, "Main"), road(2, "Loop")];

        let open = graph(&nodes, roads(), &segs);
        let r = AStarRouter.route(&open, NodeId(1), NodeId(3), &distance(&open)).unwrap();
        assert_eq!(ids(&r), vec![1, 2, 3]);

        let mut b = builder(&nodes, roads(), &segs);
        b.add_restriction(RestrictionRecord {
            from_node: NodeId(1),
            from_road: RoadId(1),
            via:       NodeId(2),
            to_road:   RoadId(1),
            to_node:   NodeId(3),
        });
        let g = b.build().unwrap();
        let r = AStarRouter.route(&g, NodeId(1), NodeId(3), &distance(&g)).unwrap();
        assert_eq!(ids(&r), vec![1, 2, 4, 3]);
        assert!((r.total_cost - 3.5).abs() < 1e-12);

        // The restriction only binds traffic arriving from 1.
        let r = AStarRouter.route(&g, NodeId(4), NodeId(3), &distance(&g)).unwrap();
        assert_eq!(ids(&r), vec![4, 3]);
    }

    #[test]
    fn speed_mode_prefers_faster_longer_road() {
        // Direct 1-2: 2 km at 20 km/h.  Detour via 3: 3 km at 100 km/h.
        let slow = RoadInfo { speed_class: 1, ..road(1, "Slow") };
        let fast = RoadInfo { speed_class: 5, ..road(2, "Fast") };
        let g = graph(
            &[(1, 0.0, 0.0), (2, 2.0, 0.0), (3, 1.0, 1.0)],
            vec![slow, fast],
            &[(1, 1, 2, 2.0), (2, 1, 3, 1.5), (2, 3, 2, 1.5)],
        );

        let by_distance = AStarRouter.route(&g, NodeId(1), NodeId(2), &distance(&g)).unwrap();
        assert_eq!(ids(&by_distance), vec![1, 2]);

        let speed = model(&g, CostMode::Speed, LightPolicy::Ignore);
        assert!((speed.heuristic_scale - 1.0 / 120.0).abs() < 1e-15);
        let by_time = AStarRouter.route(&g, NodeId(1), NodeId(2), &speed).unwrap();
        assert_eq!(ids(&by_time), vec![1, 3, 2]);
        assert!((by_time.total_cost - 0.03).abs() < 1e-12);
    }

    #[test]
    fn speed_heuristic_shrinks_for_unlimited_roads() {
        let unlimited = RoadInfo { speed_class: 9, ..road(1, "Motorway") };
        let g = graph(&[(1, 0.0, 0.0), (2, 1.0, 0.0)], vec![unlimited], &[(1, 1, 2, 1.0)]);
        let speed = model(&g, CostMode::Speed, LightPolicy::Ignore);
        assert!(speed.heuristic_scale < 1e-300);
        let r = AStarRouter.route(&g, NodeId(1), NodeId(2), &speed).unwrap();
        assert_eq!(ids(&r), vec![1, 2]);
    }

    #[test]
    fn light_preference_steers_through_lit_nodes() {
        // 1 → 4 via unlit 2 (2.0 km) or lit 3 (2.4 km).  4 is lit.
        let mut b = builder(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 1.0, 0.5), (4, 2.0, 0.0)],
            vec![road(1, "Direct"), road(2, "Signals")],
            &[(1, 1, 2, 1.0), (1, 2, 4, 1.0), (2, 1, 3, 1.2), (2, 3, 4, 1.2)],
        );
        b.traffic_lights(vec![Location::new(1.0, 0.5), Location::new(2.0, 0.0)], 0.01);
        let g = b.build().unwrap();

        let plain = AStarRouter.route(&g, NodeId(1), NodeId(4), &distance(&g)).unwrap();
        assert_eq!(ids(&plain), vec![1, 2, 4]);
        assert!((plain.total_cost - 2.0).abs() < 1e-12);

        let lit = model(&g, CostMode::Distance, LightPolicy::PreferLit);
        let r = AStarRouter.route(&g, NodeId(1), NodeId(4), &lit).unwrap();
        assert_eq!(ids(&r), vec![1, 3, 4]);
        assert!((r.total_cost - 2.4).abs() < 1e-12);
    }

    #[test]
    fn legs_merge_consecutive_same_label() {
        let g = grid();
        let r = AStarRouter.route(&g, NodeId(1), NodeId(5), &distance(&g)).unwrap();
        let legs = r.legs(&g);
        assert_eq!(
            legs,
            vec![
                RouteLeg { label: "Queen Street".into(), length: 2.0 },
                RouteLeg { label: "Quay Street".into(), length: 1.0 },
            ]
        );
        assert!(Route::empty().legs(&g).is_empty());
    }

    #[test]
    fn equal_cost_ties_are_deterministic() {
        // Square with two equal paths 1 → 4.
        let g = graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 0.0, 1.0), (4, 1.0, 1.0)],
            vec![road(1, "a")],
            &[(1, 1, 2, 1.0), (1, 2, 4, 1.0), (1, 1, 3, 1.0), (1, 3, 4, 1.0)],
        );
        let first = AStarRouter.route(&g, NodeId(1), NodeId(4), &distance(&g)).unwrap();
        for _ in 0..10 {
            let again = AStarRouter.route(&g, NodeId(1), NodeId(4), &distance(&g)).unwrap();
            assert_eq!(again, first);
        }
    }

    // ── Randomised check against exhaustive search ────────────────────────

    fn exhaustive(
        g: &RoadGraph,
        cost: &CostModel,
        at: NodeIdx,
        goal: NodeIdx,
        seen: &mut [bool],
        acc: f64,
        best: &mut f64,
    ) {
        if at == goal {
            *best = best.min(acc);
            return;
        }
        for e in g.out_edges(at) {
            let next = g.edge_to[e.index()];
            if seen[next.index()] {
                continue;
            }
            seen[next.index()] = true;
            exhaustive(g, cost, next, goal, seen, acc + cost.cost(g, e), best);
            seen[next.index()] = false;
        }
    }

    fn assert_valid_route(g: &RoadGraph, r: &Route, from: NodeId, to: NodeId, cost: &CostModel) {
        assert_eq!(r.nodes.first(), Some(&from));
        assert_eq!(r.nodes.last(), Some(&to));
        assert_eq!(r.edges.len() + 1, r.nodes.len());
        let mut total = 0.0;
        for (i, e) in r.edges.iter().enumerate() {
            assert_eq!(g.node(g.edge_from[e.index()]).id, r.nodes[i]);
            assert_eq!(g.node(g.edge_to[e.index()]).id, r.nodes[i + 1]);
            total += cost.cost(g, *e);
        }
        assert!((total - r.total_cost).abs() < 1e-9);
    }

    #[test]
    fn astar_matches_exhaustive_search_on_random_graphs() {
        let mut rng = SmallRng::seed_from_u64(0xa57a);
        for _trial in 0..40 {
            let n = rng.gen_range(3..=8usize);
            let nodes: Vec<(u32, f64, f64)> = (0..n)
                .map(|i| (i as u32 * 7 + 3, rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0)))
                .collect();

            let m = rng.gen_range(n..2 * n);
            let mut roads = Vec::with_capacity(m);
            let mut segs = Vec::with_capacity(m);
            for r in 0..m as u32 {
                let a = rng.gen_range(0..n);
                let b = (a + rng.gen_range(1..n)) % n;
                let (pa, pb) = (nodes[a], nodes[b]);
                let straight = Location::new(pa.1, pa.2).distance(Location::new(pb.1, pb.2));
                roads.push(RoadInfo {
                    one_way:     rng.gen_bool(0.3),
                    speed_class: rng.gen_range(0..=6),
                    road_class:  rng.gen_range(0..=4),
                    ..road(r, "r")
                });
                segs.push((r, pa.0, pb.0, straight * rng.gen_range(1.0..2.0)));
            }
            let g = graph(&nodes, roads, &segs);

            for mode in [CostMode::Distance, CostMode::Speed] {
                let cost = model(&g, mode, LightPolicy::Ignore);
                for _ in 0..4 {
                    let s = NodeIdx(rng.gen_range(0..n) as u32);
                    let t = NodeIdx(rng.gen_range(0..n) as u32);
                    if s == t {
                        continue;
                    }
                    let (from, to) = (g.node(s).id, g.node(t).id);

                    let mut seen = vec![false; n];
                    seen[s.index()] = true;
                    let mut best = f64::INFINITY;
                    exhaustive(&g, &cost, s, t, &mut seen, 0.0, &mut best);

                    let astar = AStarRouter.route(&g, from, to, &cost).unwrap();
                    let dijkstra = DijkstraRouter.route(&g, from, to, &cost).unwrap();
                    if best.is_infinite() {
                        assert!(astar.is_empty());
                        assert!(dijkstra.is_empty());
                    } else {
                        assert!((astar.total_cost - best).abs() < 1e-9, "{mode:?} {from} -> {to}");
                        assert!((dijkstra.total_cost - best).abs() < 1e-9);
                        assert_valid_route(&g, &astar, from, to, &cost);
                    }
                }
            }
        }
    }
}

// ── Articulation points ───────────────────────────────────────────────────────

#[cfg(test)]
mod articulation {
    use std::collections::BTreeSet;

    use rn_core::NodeId;

    use super::helpers::{graph, one_way, topology};
    use crate::{articulation_points, RoadGraph};

    fn set(ids: &[u32]) -> BTreeSet<NodeId> {
        ids.iter().map(|&i| NodeId(i)).collect()
    }

    #[test]
    fn path_interior_nodes_are_cut_points() {
        let g = topology(&[1, 2, 3, 4, 5], &[(1, 2), (2, 3), (3, 4), (4, 5)]);
        assert_eq!(articulation_points(&g), set(&[2, 3, 4]));
    }

    #[test]
    fn cycle_has_none() {
        let g = topology(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (4, 1)]);
        assert!(articulation_points(&g).is_empty());
    }

    #[test]
    fn star_root_with_several_children() {
        let g = topology(&[1, 2, 3, 4], &[(1, 2), (1, 3), (1, 4)]);
        assert_eq!(articulation_points(&g), set(&[1]));
    }

    #[test]
    fn bridge_between_cycles() {
        let g = topology(
            &[1, 2, 3, 4, 5, 6],
            &[(1, 2), (2, 3), (3, 1), (3, 4), (4, 5), (5, 6), (6, 4)],
        );
        assert_eq!(articulation_points(&g), set(&[3, 4]));
    }

    #[test]
    fn components_are_unioned() {
        let g = topology(
            &[1, 2, 3, 4, 5, 6, 7, 8],
            &[(1, 2), (2, 3), (4, 5), (5, 6), (6, 4), (6, 7)],
        );
        assert_eq!(articulation_points(&g), set(&[2, 6]));
    }

    #[test]
    fn parallel_segments_are_not_a_back_edge() {
        let g = topology(&[1, 2, 3], &[(1, 2), (2, 1), (2, 3)]);
        assert_eq!(articulation_points(&g), set(&[2]));
    }

    #[test]
    fn one_way_flags_ignored() {
        let g = graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0)],
            vec![one_way(1, "a")],
            &[(1, 1, 2, 1.0), (1, 3, 2, 1.0)],
        );
        assert_eq!(articulation_points(&g), set(&[2]));
    }

    #[test]
    fn empty_graph_has_none() {
        assert!(articulation_points(&RoadGraph::empty()).is_empty());
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let ids: Vec<u32> = (0..20_000).collect();
        let links: Vec<(u32, u32)> = ids.windows(2).map(|w| (w[0], w[1])).collect();
        let g = topology(&ids, &links);
        let points = articulation_points(&g);
        assert_eq!(points.len(), ids.len() - 2);
        assert!(!points.contains(&NodeId(0)));
        assert!(!points.contains(&NodeId(19_999)));
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    use rn_core::{NodeId, RoadId};

    use crate::loader::{
        read_segments, read_traffic_lights, LIGHTS_FILE, NODES_FILE, RESTRICTIONS_FILE,
        ROADS_FILE, SEGMENTS_FILE,
    };
    use crate::{load_dataset_dir, LoadError};

    const NODES: &str = "1\t-36.847622\t174.763444\n\
                         2\t-36.847622\t174.773444\n\
                         3\t-36.857622\t174.763444\n";

    const ROADS: &str = "roadid\ttype\tlabel\tcity\toneway\tspeed\troadclass\tnotforcar\tnotforpede\tnotforbicy\n\
                         10\t0\tQueen Street\tAuckland\t0\t3\t2\t0\t0\t0\n\
                         20\t0\t-\tAuckland\t1\t4\t4\t0\t1\t1\n";

    const SEGMENTS: &str = "roadID\tlength\tnodeID1\tnodeID2\tcoords\n\
                            10\t0.9\t1\t2\t-36.847622\t174.763444\t-36.847622\t174.773444\n\
                            20\t1.2\t1\t3\t-36.847622\t174.763444\t-36.852622\t174.763444\t-36.857622\t174.763444\n";

    const RESTRICTIONS: &str = "nodeID1\troadID1\tnodeID\troadID2\tnodeID2\n\
                                2\t10\t1\t20\t3\n";

    const LIGHTS: &str = "lon lat\n174.763444 -36.847622\n\n";

    fn write_mandatory(dir: &Path) {
        fs::write(dir.join(NODES_FILE), NODES).unwrap();
        fs::write(dir.join(ROADS_FILE), ROADS).unwrap();
        fs::write(dir.join(SEGMENTS_FILE), SEGMENTS).unwrap();
    }

    #[test]
    fn reads_full_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_mandatory(dir.path());
        fs::write(dir.path().join(RESTRICTIONS_FILE), RESTRICTIONS).unwrap();
        fs::write(dir.path().join(LIGHTS_FILE), LIGHTS).unwrap();

        let ds = load_dataset_dir(dir.path()).unwrap();
        assert_eq!(ds.nodes.len(), 3);
        assert_eq!(ds.nodes[2].id, NodeId(3));
        assert_eq!(ds.nodes[2].position.lat, -36.857622);

        assert_eq!(ds.roads.len(), 2);
        assert_eq!(ds.roads[0].label, "Queen Street");
        assert_eq!(ds.roads[1].label, "-");
        assert!(ds.roads[1].one_way);
        assert!(ds.roads[1].not_for_pedestrians && ds.roads[1].not_for_cyclists);
        assert!(!ds.roads[1].not_for_cars);
        assert_eq!(ds.roads[0].road_class, 2);

        assert_eq!(ds.segments.len(), 2);
        assert_eq!(ds.segments[1].road, RoadId(20));
        assert_eq!(ds.segments[1].length, 1.2);
        assert_eq!(ds.segments[1].polyline.len(), 3);

        assert_eq!(ds.restrictions.len(), 1);
        assert_eq!(ds.restrictions[0].via, NodeId(1));
        assert_eq!(ds.restrictions[0].to_road, RoadId(20));

        assert_eq!(ds.traffic_lights.len(), 1);
        assert_eq!(ds.traffic_lights[0].lat, -36.847622);
        assert_eq!(ds.traffic_lights[0].lon, 174.763444);
    }

    #[test]
    fn missing_optional_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_mandatory(dir.path());
        let ds = load_dataset_dir(dir.path()).unwrap();
        assert!(ds.restrictions.is_empty());
        assert!(ds.traffic_lights.is_empty());
    }

    #[test]
    fn malformed_optional_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_mandatory(dir.path());
        fs::write(dir.path().join(RESTRICTIONS_FILE), "header\n2\tten\t1\t20\t3\n").unwrap();
        let ds = load_dataset_dir(dir.path()).unwrap();
        assert!(ds.restrictions.is_empty());
        assert_eq!(ds.segments.len(), 2);
    }

    #[test]
    fn malformed_mandatory_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_mandatory(dir.path());
        fs::write(dir.path().join(NODES_FILE), "1\tnot-a-number\t174.0\n").unwrap();
        let err = load_dataset_dir(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { file: NODES_FILE, line: 1, .. }), "got {err}");
    }

    #[test]
    fn missing_mandatory_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset_dir(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }), "got {err}");
    }

    #[test]
    fn dangling_coordinate_rejected() {
        let text = "header\n10\t0.9\t1\t2\t-36.8\n";
        let err = read_segments(Cursor::new(text)).unwrap_err();
        assert!(matches!(err, LoadError::Parse { file: SEGMENTS_FILE, .. }), "got {err}");
    }

    #[test]
    fn short_light_rows_ignored() {
        let text = "lon lat\n174.7\t-36.8\njunk\n   \n174.8 -36.9 extra\n";
        let lights = read_traffic_lights(Cursor::new(text)).unwrap();
        assert_eq!(lights.len(), 2);
        assert_eq!(lights[1].lon, 174.8);
    }

    #[test]
    fn engine_loads_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_mandatory(dir.path());
        fs::write(dir.path().join(LIGHTS_FILE), LIGHTS).unwrap();

        let mut engine = crate::Engine::new(Default::default()).unwrap();
        engine.load_dir(dir.path()).unwrap();
        assert_eq!(engine.graph().node_count(), 3);
        assert_eq!(engine.search(""), vec!["Queen Street", "Unnamed road"]);
        // The light sits exactly on node 1.
        assert!(engine.graph().node_by_id(NodeId(1)).unwrap().traffic_light);
        assert!(!engine.graph().node_by_id(NodeId(2)).unwrap().traffic_light);
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod engine {
    use std::sync::Arc;

    use rn_core::geo::{ORIGIN_LAT, ORIGIN_LON};
    use rn_core::{EngineConfig, LatLon, Location, NodeId, RoadId, SegmentIdx};

    use crate::{
        CostMode, Dataset, Engine, LightPolicy, LoadError, NodeRecord, QueryError,
        RoadInfoRecord, SegmentRecord,
    };

    fn node(id: u32, dlat: f64, dlon: f64) -> NodeRecord {
        NodeRecord { id: NodeId(id), position: LatLon::new(ORIGIN_LAT + dlat, ORIGIN_LON + dlon) }
    }

    fn road(id: u32, label: &str) -> RoadInfoRecord {
        RoadInfoRecord {
            id:                  RoadId(id),
            kind:                0,
            label:               label.to_owned(),
            city:                "Auckland".to_owned(),
            one_way:             false,
            speed_class:         3,
            road_class:          4,
            not_for_cars:        false,
            not_for_pedestrians: false,
            not_for_cyclists:    false,
        }
    }

    fn segment(road: u32, length: f64, n1: u32, n2: u32) -> SegmentRecord {
        SegmentRecord { road: RoadId(road), length, node1: NodeId(n1), node2: NodeId(n2), polyline: vec![] }
    }

    /// ```text
    ///           4
    ///         / |
    /// 1 ─ 2 ─ 3 |      roughly 1.11 km apart
    ///      \____/
    /// ```
    /// 1-2, 2-3: "Queen Street".  2-4: "Quay Street".  3-4: unnamed.
    fn sample() -> Dataset {
        Dataset {
            nodes: vec![
                node(1, 0.0, 0.0),
                node(2, 0.0, 0.01),
                node(3, 0.0, 0.02),
                node(4, 0.01, 0.01),
            ],
            roads: vec![road(10, "Queen Street"), road(20, "Quay Street"), road(30, "-")],
            segments: vec![
                segment(10, 1.2, 1, 2),
                segment(10, 1.2, 2, 3),
                segment(20, 1.2, 2, 4),
                segment(30, 2.0, 3, 4),
            ],
            ..Dataset::default()
        }
    }

    fn loaded() -> Engine {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.load(&sample()).unwrap();
        engine
    }

    #[test]
    fn empty_engine_returns_empty_results() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        assert!(engine.graph().is_empty());
        assert!(engine.nearest(Location::new(0.0, 0.0), 1.0).is_none());
        let r = engine.route(NodeId(1), NodeId(2), CostMode::Distance, LightPolicy::Ignore).unwrap();
        assert!(r.is_empty());
        assert!(engine.search("").is_empty());
        assert!(engine.highlight("").is_empty());
        assert!(engine.road_labels_at(NodeId(1)).unwrap().is_empty());
        assert!(engine.articulation_points().is_empty());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig { quadtree_capacity: 0, ..EngineConfig::default() };
        assert!(Engine::new(config).is_err());
        let config = EngineConfig { unlit_penalty: 0.5, ..EngineConfig::default() };
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn nearest_node_to_click() {
        let engine = loaded();
        let hit = engine.nearest(Location::new(1.1, 0.05), 0.2).unwrap();
        assert_eq!(hit.id, NodeId(2));
        assert!(engine.nearest(Location::new(5.0, 5.0), 0.2).is_none());
        assert_eq!(engine.nearest_to_click(Location::new(0.001, 0.001)).unwrap().id, NodeId(1));
        assert_eq!(engine.snapshot().spatial().len(), 4);
    }

    #[test]
    fn prefix_search() {
        let engine = loaded();
        assert_eq!(engine.search("Qu"), vec!["Quay Street", "Queen Street"]);
        assert_eq!(engine.search("Quee"), vec!["Queen Street"]);
        assert_eq!(engine.search(""), vec!["Quay Street", "Queen Street", "Unnamed road"]);
        assert!(engine.search("qu").is_empty());
        assert!(engine.search("Queen Streets").is_empty());

        let roads: Vec<RoadId> = engine.search_roads("Q").into_iter().map(|r| r.id).collect();
        assert_eq!(roads, vec![RoadId(10), RoadId(20)]);
    }

    #[test]
    fn highlight_returns_every_segment_of_matching_roads() {
        let engine = loaded();
        assert_eq!(engine.highlight("Queen"), vec![SegmentIdx(0), SegmentIdx(1)]);
        assert_eq!(engine.highlight("Q").len(), 3);
        assert!(engine.highlight("Z").is_empty());
    }

    #[test]
    fn route_and_articulation() {
        let engine = loaded();
        let r = engine.route(NodeId(1), NodeId(3), CostMode::Distance, LightPolicy::Ignore).unwrap();
        assert_eq!(r.nodes, vec![NodeId(1), NodeId(2), NodeId(3)]);
        assert_eq!(r.legs(engine.graph()).len(), 1);
        assert!((r.total_cost - 2.4).abs() < 1e-12);

        let points: Vec<NodeId> = engine.articulation_points().into_iter().collect();
        assert_eq!(points, vec![NodeId(2)]);
    }

    #[test]
    fn unknown_node_is_query_error() {
        let engine = loaded();
        let err = engine
            .route(NodeId(1), NodeId(42), CostMode::Speed, LightPolicy::Ignore)
            .unwrap_err();
        assert_eq!(err, QueryError::UnknownNode(NodeId(42)));
        assert_eq!(engine.road_labels_at(NodeId(42)).unwrap_err(), QueryError::UnknownNode(NodeId(42)));
    }

    #[test]
    fn labels_around_a_node() {
        let engine = loaded();
        assert_eq!(engine.road_labels_at(NodeId(2)).unwrap(), vec!["Quay Street", "Queen Street"]);
        assert_eq!(engine.road_labels_at(NodeId(3)).unwrap(), vec!["Queen Street", "Unnamed road"]);
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let mut engine = loaded();
        let before = engine.snapshot();

        let mut broken = sample();
        broken.segments.push(segment(10, 1.0, 1, 99));
        let err = engine.load(&broken).unwrap_err();
        assert!(matches!(err, LoadError::MissingNode { node: NodeId(99), .. }));

        assert!(Arc::ptr_eq(&before, &engine.snapshot()));
        assert_eq!(engine.graph().node_count(), 4);
        assert_eq!(engine.search("Qu").len(), 2);
    }

    #[test]
    fn held_snapshot_survives_reload() {
        let mut engine = loaded();
        let old = engine.snapshot();

        let mut smaller = sample();
        smaller.nodes.truncate(2);
        smaller.segments.truncate(1);
        engine.load(&smaller).unwrap();

        assert_eq!(engine.graph().node_count(), 2);
        assert_eq!(old.graph().node_count(), 4);
        assert!(old.graph().node_by_id(NodeId(4)).is_some());
    }

    #[test]
    fn reload_is_deterministic_regardless_of_record_order() {
        let a = loaded();

        let mut shuffled = sample();
        shuffled.nodes.reverse();
        shuffled.roads.reverse();
        let mut b = Engine::new(EngineConfig::default()).unwrap();
        b.load(&shuffled).unwrap();

        for mode in [CostMode::Distance, CostMode::Speed] {
            let ra = a.route(NodeId(1), NodeId(4), mode, LightPolicy::PreferLit).unwrap();
            let rb = b.route(NodeId(1), NodeId(4), mode, LightPolicy::PreferLit).unwrap();
            assert_eq!(ra, rb);
        }
        assert_eq!(a.articulation_points(), b.articulation_points());
        assert_eq!(a.search(""), b.search(""));
    }

    #[test]
    fn traffic_lights_projected_and_matched() {
        let mut ds = sample();
        ds.traffic_lights = vec![LatLon::new(ORIGIN_LAT, ORIGIN_LON + 0.01)];
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.load(&ds).unwrap();
        let lit: Vec<NodeId> = engine
            .graph()
            .nodes
            .iter()
            .filter(|n| n.traffic_light)
            .map(|n| n.id)
            .collect();
        assert_eq!(lit, vec![NodeId(2)]);
    }
}
