//! Post-load traffic-light matching.
//!
//! Light coordinates come from a separate survey and never coincide exactly
//! with node positions.  A node counts as lit if any light lies within a
//! Manhattan distance `tolerance` of it.  Lights are bulk-loaded into an
//! R-tree (via `rstar`) and each node probes the square of half-width
//! `tolerance` around itself, which bounds the Manhattan diamond.

use rstar::{RTree, AABB};

use rn_core::Location;

use crate::network::Node;

/// Set `traffic_light` on every node with a light nearby.  Returns the number
/// of nodes marked.
pub(crate) fn mark_lit_nodes(nodes: &mut [Node], lights: &[Location], tolerance: f64) -> usize {
    if lights.is_empty() {
        return 0;
    }

    // O(L log L) bulk load is cheaper than L inserts.
    let tree: RTree<[f64; 2]> = RTree::bulk_load(lights.iter().map(|l| [l.x, l.y]).collect());

    let mut marked = 0;
    for node in nodes.iter_mut() {
        let Location { x, y } = node.location;
        let probe = AABB::from_corners([x - tolerance, y - tolerance], [x + tolerance, y + tolerance]);
        node.traffic_light = tree
            .locate_in_envelope(&probe)
            .any(|&[lx, ly]| node.location.is_close(Location::new(lx, ly), tolerance));
        marked += node.traffic_light as usize;
    }
    marked
}
