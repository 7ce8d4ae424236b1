//! Ordered storage built in two layers.
//!
//! ## Binary tree core
//!
//! The [`bitree`] module is a plain binary tree: it owns its nodes, knows how to
//! attach a leaf at a vacant child slot, tear a subtree down, and merge two
//! disjoint trees under a new root. It knows nothing about ordering; callers
//! decide where nodes go.
//!
//! ## AVL layer
//!
//! The [`avl`] module builds a search tree on top of the core. Every payload is
//! wrapped in an entry carrying a balance factor, and each insertion repairs the
//! balance on its way back up the recursion with the classic AVL rotations, so
//! the height of the tree stays within a constant factor of `lg N`.
//!
//! Deletion is lazy: [`avl::AvlTree::remove`] marks an entry as hidden instead
//! of restructuring the tree. Hidden entries stay allocated (and counted by
//! [`avl::AvlTree::size`]) but are invisible to lookups, and re-inserting the
//! same key revives the existing node in place rather than allocating a new one.
//! This trades memory for a deletion that never has to rebalance anything.
//!
//! ```
//! use bistree::avl::AvlTree;
//!
//! let mut tree = AvlTree::ordered();
//! for key in [5, 3, 8, 1] {
//!     tree.insert(key).unwrap();
//! }
//!
//! assert_eq!(tree.lookup(&3), Ok(&3));
//!
//! // Lazy removal: the key disappears from lookups but the node stays.
//! tree.remove(&3).unwrap();
//! assert!(tree.lookup(&3).is_err());
//! assert_eq!(tree.size(), 4);
//! ```

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod avl;
pub mod bitree;

mod error;

pub use error::{TreeError, TreeResult};
