//! Synthetic central-Auckland dataset.
//!
//! Eleven intersections around Queen Street and Karangahape Road, seven roads
//! (one of them one-way, one unnamed), a banned turn, and three sets of
//! signals.  Coordinates are approximate; segment lengths are derived from
//! the projected positions so the router's straight-line heuristic holds.

use rn_core::{LatLon, NodeId, RoadId};
use rn_network::{Dataset, NodeRecord, RestrictionRecord, RoadInfoRecord, SegmentRecord};

pub const BRITOMART:     NodeId = NodeId(1);
pub const PONSONBY_ROAD: NodeId = NodeId(11);

const NODES: [(u32, f64, f64); 11] = [
    (1,  -36.8443, 174.7676), // Britomart
    (2,  -36.8448, 174.7660), // Queen / Customs
    (3,  -36.8485, 174.7649), // Queen / Victoria
    (4,  -36.8510, 174.7640), // Queen / Wellesley
    (5,  -36.8545, 174.7625), // Queen / Mayoral Drive
    (6,  -36.8585, 174.7605), // Queen / Karangahape
    (7,  -36.8600, 174.7660), // Symonds / Karangahape
    (8,  -36.8520, 174.7690), // Symonds / Wellesley
    (9,  -36.8480, 174.7625), // Albert / Victoria
    (10, -36.8475, 174.7600), // Hobson / Victoria
    (11, -36.8570, 174.7480), // Ponsonby Road
];

// (id, label, one_way, speed class, road class)
const ROADS: [(u32, &str, bool, i32, i32); 7] = [
    (100, "Queen Street",         false, 2, 2),
    (101, "Karangahape Road",     false, 2, 2),
    (102, "Symonds Street",       false, 3, 3),
    (103, "Victoria Street West", false, 2, 1),
    (104, "Customs Street East",  true,  2, 2),
    (105, "Wellesley Street",     false, 2, 2),
    (106, "-",                    false, 0, 0),
];

// (road, node1, node2)
const SEGMENTS: [(u32, u32, u32); 13] = [
    (100, 1, 2),
    (100, 2, 3),
    (100, 3, 4),
    (100, 4, 5),
    (100, 5, 6),
    (101, 6, 7),
    (101, 6, 11),
    (102, 7, 8),
    (104, 1, 8),
    (103, 10, 9),
    (103, 9, 3),
    (105, 4, 8),
    (106, 9, 4),
];

const SIGNALS: [u32; 3] = [3, 4, 6];

/// Build the dataset as a loader would hand it over.
pub fn build_dataset() -> Dataset {
    let position = |id: u32| {
        NODES
            .iter()
            .find(|n| n.0 == id)
            .map(|&(_, lat, lon)| LatLon::new(lat, lon))
            .unwrap_or(LatLon::new(0.0, 0.0))
    };

    let nodes = NODES
        .iter()
        .map(|&(id, lat, lon)| NodeRecord { id: NodeId(id), position: LatLon::new(lat, lon) })
        .collect();

    let roads = ROADS
        .iter()
        .map(|&(id, label, one_way, speed_class, road_class)| RoadInfoRecord {
            id: RoadId(id),
            kind: 0,
            label: label.to_owned(),
            city: "Auckland Central".to_owned(),
            one_way,
            speed_class,
            road_class,
            not_for_cars: false,
            not_for_pedestrians: false,
            not_for_cyclists: false,
        })
        .collect();

    let segments = SEGMENTS
        .iter()
        .map(|&(road, a, b)| {
            let (pa, pb) = (position(a), position(b));
            // 15% longer than the straight line, rounded up to metres.
            let straight = pa.project().distance(pb.project());
            SegmentRecord {
                road:     RoadId(road),
                length:   (straight * 1.15 * 1000.0).ceil() / 1000.0,
                node1:    NodeId(a),
                node2:    NodeId(b),
                polyline: vec![pa, pb],
            }
        })
        .collect();

    // No turning from Queen Street north of Mayoral Drive into Wellesley.
    let restrictions = vec![RestrictionRecord {
        from_node: NodeId(5),
        from_road: RoadId(100),
        via:       NodeId(4),
        to_road:   RoadId(105),
        to_node:   NodeId(8),
    }];

    let traffic_lights = SIGNALS.iter().map(|&id| position(id)).collect();

    Dataset { nodes, roads, segments, restrictions, traffic_lights }
}
