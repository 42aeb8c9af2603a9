//! Engine configuration.

use crate::{CoreError, CoreResult};

/// Tunables shared by the loader, the spatial index, and the router.
///
/// Typically left at [`Default`]; applications may load it from JSON with the
/// `serde` feature.  All distances are in projected kilometres.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Items a quadtree cell holds before it splits.  Default: 4.
    pub quadtree_capacity: usize,

    /// Deepest quadtree level.  Cells at this depth never split, so more than
    /// `quadtree_capacity` items at one location cannot recurse forever.
    pub quadtree_max_depth: u32,

    /// Padding added around the node extent when sizing the root square.
    /// Must be positive so the easternmost/northernmost nodes fall inside
    /// the half-open boundary.
    pub quadtree_padding: f64,

    /// Half-width of the square searched by `nearest` when the caller does
    /// not supply one.  Default: 0.01 km.
    pub click_radius: f64,

    /// Manhattan distance within which a traffic-light coordinate marks a
    /// node as lit.
    pub light_match_tolerance: f64,

    /// Multiplier applied to edges into unlit nodes when routing prefers lit
    /// intersections.
    pub unlit_penalty: f64,

    /// Upper bound for the speed-mode heuristic scale (hours per km).  The
    /// router lowers it further if the network has faster roads.
    pub speed_heuristic_ceiling: f64,

    /// Label substituted for roads whose label is `"-"`.
    pub placeholder_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quadtree_capacity:       4,
            quadtree_max_depth:      24,
            quadtree_padding:        1e-6,
            click_radius:            0.01,
            light_match_tolerance:   0.01,
            unlit_penalty:           2.0,
            speed_heuristic_ceiling: 1.0 / 120.0,
            placeholder_label:       "Unnamed road".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Reject values that would break an index or the router's admissibility.
    pub fn validate(&self) -> CoreResult<()> {
        if self.quadtree_capacity == 0 {
            return Err(CoreError::Config("quadtree_capacity must be at least 1".into()));
        }
        if !(self.quadtree_padding > 0.0) {
            return Err(CoreError::Config("quadtree_padding must be positive".into()));
        }
        if !(self.click_radius >= 0.0) || !(self.light_match_tolerance >= 0.0) {
            return Err(CoreError::Config("search radii must be non-negative".into()));
        }
        if !(self.unlit_penalty >= 1.0) {
            return Err(CoreError::Config(format!(
                "unlit_penalty {} is below 1.0",
                self.unlit_penalty
            )));
        }
        if !(self.speed_heuristic_ceiling >= 0.0) {
            return Err(CoreError::Config("speed_heuristic_ceiling must be non-negative".into()));
        }
        Ok(())
    }
}
