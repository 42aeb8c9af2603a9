//! Articulation points (cut vertices) of the undirected road graph.
//!
//! Tarjan's low-link algorithm, run with an explicit frame stack so a long
//! chain of roads cannot overflow the call stack.  Each frame records the
//! node, its DFS parent, and a cursor into its neighbour slice; `depth` and
//! `reach_back` live in flat arrays indexed by `NodeIdx`.

use std::collections::BTreeSet;

use rn_core::{NodeId, NodeIdx};

use crate::network::RoadGraph;

const UNVISITED: u32 = u32::MAX;

struct Frame {
    node:   NodeIdx,
    parent: NodeIdx,
    cursor: usize,
}

/// Every node whose removal disconnects some pair of other nodes, across all
/// components.  One-way flags are ignored.
pub fn articulation_points(graph: &RoadGraph) -> BTreeSet<NodeId> {
    let n = graph.node_count();
    let mut depth      = vec![UNVISITED; n];
    let mut reach_back = vec![0u32; n];
    let mut is_cut     = vec![false; n];
    let mut stack: Vec<Frame> = Vec::new();

    for root in (0..n).map(|i| NodeIdx(i as u32)) {
        if depth[root.index()] != UNVISITED {
            continue;
        }
        depth[root.index()] = 0;
        reach_back[root.index()] = 0;
        let mut root_children = 0u32;

        // Each root child starts its own subtree.
        for &child in graph.neighbors(root) {
            if depth[child.index()] != UNVISITED {
                continue;
            }
            root_children += 1;
            depth[child.index()] = 1;
            reach_back[child.index()] = 1;
            stack.push(Frame { node: child, parent: root, cursor: 0 });

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                let neighbors = graph.neighbors(node);

                if let Some(&next) = neighbors.get(frame.cursor) {
                    frame.cursor += 1;
                    if next == frame.parent {
                        continue;
                    }
                    if depth[next.index()] == UNVISITED {
                        let d = depth[node.index()] + 1;
                        depth[next.index()] = d;
                        reach_back[next.index()] = d;
                        stack.push(Frame { node: next, parent: node, cursor: 0 });
                    } else {
                        reach_back[node.index()] = reach_back[node.index()].min(depth[next.index()]);
                    }
                    continue;
                }

                // All neighbours done: fold into the parent.
                let parent = frame.parent;
                stack.pop();
                if parent != root {
                    reach_back[parent.index()] = reach_back[parent.index()].min(reach_back[node.index()]);
                    if reach_back[node.index()] >= depth[parent.index()] {
                        is_cut[parent.index()] = true;
                    }
                }
            }
        }

        if root_children > 1 {
            is_cut[root.index()] = true;
        }
    }

    is_cut
        .iter()
        .enumerate()
        .filter(|&(_, &cut)| cut)
        .map(|(i, _)| graph.nodes[i].id)
        .collect()
}
