//! Planar coordinates, the fixed-origin projection, and bounding squares.
//!
//! Input records carry WGS-84 latitude/longitude.  They are projected once at
//! load time onto a flat plane centred on Auckland, measured in kilometres:
//! `x` grows eastwards and `y` grows northwards.  Everything downstream (the
//! quadtree, the A* heuristic, nearest-node lookup) works in this plane.
//!
//! Precision is `f64` throughout.  Segment lengths in the input files are
//! kilometres with three decimals, so the heuristic and the edge costs must
//! share units and rounding behaviour.

use std::fmt;

/// Latitude of the projection origin (centre of Auckland).
pub const ORIGIN_LAT: f64 = -36.847622;
/// Longitude of the projection origin.
pub const ORIGIN_LON: f64 = 174.763444;
/// Kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

// ── LatLon ────────────────────────────────────────────────────────────────────

/// A raw WGS-84 coordinate as read from the input files.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Project onto the engine's planar coordinate system.
    #[inline]
    pub fn project(self) -> Location {
        Location::from_lat_lon(self.lat, self.lon)
    }
}

// ── Location ──────────────────────────────────────────────────────────────────

/// A point on the projected plane, in kilometres from the origin.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Equirectangular projection about [`ORIGIN_LAT`]/[`ORIGIN_LON`].
    ///
    /// The longitude scale uses the cosine of the latitude *offset* from the
    /// origin, not of the absolute latitude.  Existing datasets assume this.
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        let y = (lat - ORIGIN_LAT) * KM_PER_DEGREE;
        let x = (lon - ORIGIN_LON)
            * (KM_PER_DEGREE * (lat - ORIGIN_LAT).to_radians().cos());
        Self { x, y }
    }

    /// Euclidean distance.
    #[inline]
    pub fn distance(self, other: Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// `true` if `other` is within Manhattan distance `dist` of `self`.
    #[inline]
    pub fn is_close(self, other: Location, dist: f64) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() <= dist
    }

    #[inline]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ── BoundingBox ───────────────────────────────────────────────────────────────

/// Axis-aligned square given by its minimum corner and side length.
///
/// Containment is half-open on both axes: `[x, x + size) × [y, y + size)`.
/// Adjacent squares therefore never both claim a point on their shared edge.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub origin: Location,
    pub size:   f64,
}

impl BoundingBox {
    #[inline]
    pub const fn new(origin: Location, size: f64) -> Self {
        Self { origin, size }
    }

    /// The zero-size square at the origin.  Contains nothing.
    pub const EMPTY: BoundingBox = BoundingBox::new(Location::new(0.0, 0.0), 0.0);

    /// Square of side `2 * radius` centred on `centre`.
    pub fn around(centre: Location, radius: f64) -> Self {
        Self::new(centre.offset(-radius, -radius), radius * 2.0)
    }

    /// Smallest square anchored at the minimum corner of `points` that holds
    /// all of them, grown by `padding` on every side.
    ///
    /// Returns `None` for an empty iterator.
    pub fn covering<I>(points: I, padding: f64) -> Option<Self>
    where
        I: IntoIterator<Item = Location>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let side = (max_x - min_x).max(max_y - min_y);
        Some(Self::new(
            Location::new(min_x - padding, min_y - padding),
            side + padding * 2.0,
        ))
    }

    #[inline]
    pub fn contains(&self, p: Location) -> bool {
        p.x >= self.origin.x
            && p.x < self.origin.x + self.size
            && p.y >= self.origin.y
            && p.y < self.origin.y + self.size
    }

    /// `true` if the two squares share any area.
    ///
    /// Strict inequalities match the half-open containment: squares that only
    /// touch along an edge do not intersect, and a zero-size square intersects
    /// nothing.
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.size > 0.0
            && other.size > 0.0
            && self.origin.x < other.origin.x + other.size
            && other.origin.x < self.origin.x + self.size
            && self.origin.y < other.origin.y + other.size
            && other.origin.y < self.origin.y + self.size
    }
}
