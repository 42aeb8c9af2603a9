//! Point quadtree over the projected plane.
//!
//! # Layout
//!
//! Each cell keeps up to `capacity` items of its own.  The first insert that
//! would overflow a leaf splits it into four quadrants; items already held by
//! the cell stay where they are and later items descend.  Splits are never
//! undone.
//!
//! ```text
//!   +-------+-------+
//!   |  NW 2 |  NE 3 |
//!   +-------+-------+   quadrant = (x >= mid.x) + 2 * (y >= mid.y)
//!   |  SW 0 |  SE 1 |
//!   +-------+-------+
//! ```
//!
//! Cells are described by exact min/max corners rather than origin + size.
//! A child's far edges are copies of its parent's, so an item routed by the
//! midpoint test always lies inside the child it was routed to, and range
//! pruning never drops a stored item to float rounding.

use rn_core::{BoundingBox, Location};

/// Anything with a planar position can be stored in a [`QuadTree`].
pub trait Located {
    fn location(&self) -> Location;
}

impl Located for Location {
    #[inline]
    fn location(&self) -> Location {
        *self
    }
}

/// Default number of items a cell holds before splitting.
pub const DEFAULT_CAPACITY: usize = 4;

/// Default deepest level; cells at this depth absorb overflow instead of
/// splitting.
pub const DEFAULT_MAX_DEPTH: u32 = 24;

// ── Region ────────────────────────────────────────────────────────────────────

/// Half-open rectangle `[min.x, max.x) × [min.y, max.y)`.
#[derive(Copy, Clone, Debug)]
struct Region {
    min: Location,
    max: Location,
}

impl Region {
    fn from_box(bb: &BoundingBox) -> Self {
        Self {
            min: bb.origin,
            max: bb.origin.offset(bb.size, bb.size),
        }
    }

    #[inline]
    fn mid(&self) -> Location {
        Location::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    #[inline]
    fn quadrant_of(&self, p: Location) -> usize {
        let mid = self.mid();
        (p.x >= mid.x) as usize + 2 * (p.y >= mid.y) as usize
    }

    fn split(&self) -> [Region; 4] {
        let (lo, mid, hi) = (self.min, self.mid(), self.max);
        [
            Region { min: lo, max: mid },
            Region { min: Location::new(mid.x, lo.y), max: Location::new(hi.x, mid.y) },
            Region { min: Location::new(lo.x, mid.y), max: Location::new(mid.x, hi.y) },
            Region { min: mid, max: hi },
        ]
    }

    #[inline]
    fn intersects(&self, range: &BoundingBox) -> bool {
        let q_max = range.origin.offset(range.size, range.size);
        range.size > 0.0
            && self.min.x < q_max.x
            && range.origin.x < self.max.x
            && self.min.y < q_max.y
            && range.origin.y < self.max.y
    }
}

// ── Cell ──────────────────────────────────────────────────────────────────────

struct Cell<T> {
    region:   Region,
    items:    Vec<T>,
    children: Option<Box<[Cell<T>; 4]>>,
}

impl<T> Cell<T> {
    fn leaf(region: Region) -> Self {
        Self { region, items: Vec::new(), children: None }
    }
}

// ── QuadTree ──────────────────────────────────────────────────────────────────

/// Fixed-boundary point quadtree.
///
/// # Example
///
/// ```
/// use rn_core::{BoundingBox, Location};
/// use rn_index::QuadTree;
///
/// let mut qt = QuadTree::new(BoundingBox::new(Location::new(0.0, 0.0), 10.0));
/// assert!(qt.insert(Location::new(1.0, 1.0)));
/// assert!(!qt.insert(Location::new(11.0, 1.0))); // outside the root square
///
/// let hits = qt.query_range(&BoundingBox::new(Location::new(0.5, 0.5), 1.0));
/// assert_eq!(hits.len(), 1);
/// ```
pub struct QuadTree<T> {
    boundary:  BoundingBox,
    root:      Cell<T>,
    capacity:  usize,
    max_depth: u32,
    len:       usize,
}

impl<T: Located> QuadTree<T> {
    pub fn new(boundary: BoundingBox) -> Self {
        Self::with_limits(boundary, DEFAULT_CAPACITY, DEFAULT_MAX_DEPTH)
    }

    pub fn with_limits(boundary: BoundingBox, capacity: usize, max_depth: u32) -> Self {
        Self {
            boundary,
            root: Cell::leaf(Region::from_box(&boundary)),
            capacity,
            max_depth,
            len: 0,
        }
    }

    /// A tree with a zero-size boundary.  Every insert is rejected and every
    /// query is empty; nothing is ever allocated.
    pub fn empty() -> Self {
        Self::new(BoundingBox::EMPTY)
    }

    pub fn boundary(&self) -> BoundingBox {
        self.boundary
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `item`.  Returns `false`, leaving the tree unchanged, if its
    /// location is outside the root square.
    pub fn insert(&mut self, item: T) -> bool {
        let p = item.location();
        if !self.boundary.contains(p) {
            return false;
        }

        let mut cell = &mut self.root;
        let mut depth = 0;
        loop {
            if cell.children.is_none()
                && (cell.items.len() < self.capacity || depth >= self.max_depth)
            {
                cell.items.push(item);
                self.len += 1;
                return true;
            }
            let quadrant = cell.region.quadrant_of(p);
            let split = cell.region.split();
            let children = cell
                .children
                .get_or_insert_with(|| Box::new(split.map(Cell::leaf)));
            cell = &mut children[quadrant];
            depth += 1;
        }
    }

    /// All items whose location `range` contains.  Order is unspecified.
    pub fn query_range(&self, range: &BoundingBox) -> Vec<&T> {
        let mut out = Vec::new();
        if !self.is_empty() {
            collect(&self.root, range, &mut out);
        }
        out
    }

    /// Closest item to `centre` among those inside the square of half-width
    /// `radius` around it.  Ties go to the item found first.
    pub fn nearest_within(&self, centre: Location, radius: f64) -> Option<&T> {
        self.query_range(&BoundingBox::around(centre, radius))
            .into_iter()
            .map(|item| (item.location().distance(centre), item))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, item)| item)
    }
}

fn collect<'a, T: Located>(cell: &'a Cell<T>, range: &BoundingBox, out: &mut Vec<&'a T>) {
    if !cell.region.intersects(range) {
        return;
    }
    out.extend(cell.items.iter().filter(|item| range.contains(item.location())));
    if let Some(children) = &cell.children {
        for child in children.iter() {
            collect(child, range, out);
        }
    }
}
