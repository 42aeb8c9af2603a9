//! `rn-index` — lookup structures that do not depend on graph connectivity.
//!
//! # Crate layout
//!
//! | Module        | Contents                                            |
//! |---------------|-----------------------------------------------------|
//! | [`quadtree`]  | `QuadTree<T>`, `Located`                            |
//! | [`trie`]      | `PrefixTrie<T>`                                     |
//!
//! Both structures are built once per load and are read-only afterwards.

pub mod quadtree;
pub mod trie;


pub use quadtree::{Located, QuadTree};
pub use trie::PrefixTrie;
