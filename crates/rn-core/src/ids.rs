//! Strongly typed, zero-cost identifier wrappers.
//!
//! Two families live here:
//!
//! - **External ids** (`NodeId`, `RoadId`) are the integers found in the input
//!   records.  They are sparse and carry no ordering guarantees.
//! - **Dense indices** (`NodeIdx`, `SegmentIdx`, `EdgeId`) are assigned by the
//!   graph builder and index directly into its SoA `Vec`s.
//!
//! All ids are `Copy + Ord + Hash`.  Keeping the two families as distinct
//! types stops an input id from being used as an array index by accident.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

/// Adds indexing helpers to a dense id generated by [`typed_id!`].
macro_rules! dense_index {
    ($name:ident($inner:ty)) => {
        impl $name {
            /// Sentinel meaning "no valid index" (`MAX` of the inner type).
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Node (intersection) id as it appears in the input records.
    pub struct NodeId(u32);
}

typed_id! {
    /// Road id.  Shared by a `RoadInfo` and every segment that belongs to it.
    pub struct RoadId(u32);
}

typed_id! {
    /// Dense index of a node inside a built graph.
    pub struct NodeIdx(u32);
}

typed_id! {
    /// Dense index of a road segment inside a built graph.
    pub struct SegmentIdx(u32);
}

typed_id! {
    /// Index of a directed edge (one traversal direction of a segment).
    pub struct EdgeId(u32);
}

dense_index!(NodeIdx(u32));
dense_index!(SegmentIdx(u32));
dense_index!(EdgeId(u32));
