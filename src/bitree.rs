//! A plain binary tree: the structural layer beneath [`crate::avl`].
//!
//! The tree owns its nodes outright (each parent owns its children through
//! [`Link`] slots) and tracks how many nodes are allocated. It enforces only
//! structural rules (a leaf may be attached at a vacant slot, never on top of
//! an occupied one) and leaves all ordering decisions to its callers.
//!
//! Slots are addressed through [`Position`] handles, which pair a mutable child
//! slot with the bookkeeping needed to keep the owning tree's node count exact.
//!
//! # Examples
//!
//! ```
//! use bistree::bitree::BiTree;
//!
//! let mut tree = BiTree::new();
//! tree.root_position().insert('a').unwrap();
//! tree.root_position().left().unwrap().insert('b').unwrap();
//! tree.root_position().right().unwrap().insert('c').unwrap();
//! assert_eq!(tree.size(), 3);
//!
//! let mut visited = Vec::new();
//! tree.in_order(&mut |c| visited.push(*c));
//! assert_eq!(visited, ['b', 'a', 'c']);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::{TreeError, TreeResult};

/// An owned child slot: either vacant or holding the root of a subtree.
pub type Link<T> = Option<Box<Node<T>>>;

/// A cleanup hook invoked exactly once per payload when nodes are torn down.
pub type Destroy<T> = Rc<dyn Fn(T)>;

/// A single tree node, owning its payload and up to two children.
pub struct Node<T> {
    pub(crate) data: T,
    pub(crate) left: Link<T>,
    pub(crate) right: Link<T>,
}

impl<T> Node<T> {
    pub(crate) fn leaf(data: T) -> Self {
        Node {
            data,
            left: None,
            right: None,
        }
    }

    /// A reference to the payload stored in this node.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// A mutable reference to the payload stored in this node.
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// The root of the left subtree, if present.
    pub fn left(&self) -> Option<&Node<T>> {
        self.left.as_deref()
    }

    /// The root of the right subtree, if present.
    pub fn right(&self) -> Option<&Node<T>> {
        self.right.as_deref()
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("data", &self.data)
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}

/// Attaches a new leaf at `slot`, failing if the slot is occupied.
pub(crate) fn attach<T>(slot: &mut Link<T>, data: T) -> TreeResult<()> {
    if slot.is_some() {
        return Err(TreeError::InvalidPosition);
    }
    *slot = Some(Box::new(Node::leaf(data)));
    Ok(())
}

/// Tears down the subtree rooted at `link`, bottom-up, invoking the destructor
/// per payload and decrementing `size` per freed node.
fn dispose<T>(link: Link<T>, size: &mut usize, destroy: Option<&Destroy<T>>) {
    if let Some(node) = link {
        let node = *node;
        dispose(node.left, size, destroy);
        dispose(node.right, size, destroy);
        match destroy {
            Some(destroy) => destroy(node.data),
            None => drop(node.data),
        }
        *size -= 1;
    }
}

/// A binary tree that owns its nodes and counts how many are allocated.
///
/// An optional destructor, fixed at construction, is invoked once per payload
/// whenever nodes are torn down, whether through [`Position::remove_subtree`],
/// [`BiTree::clear`], or the tree being dropped.
pub struct BiTree<T> {
    pub(crate) root: Link<T>,
    pub(crate) size: usize,
    pub(crate) destroy: Option<Destroy<T>>,
}

impl<T> Default for BiTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for BiTree<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: fmt::Debug> fmt::Debug for BiTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BiTree")
            .field("size", &self.size)
            .field("root", &self.root())
            .finish()
    }
}

impl<T> BiTree<T> {
    /// Generates a new, empty tree with no destructor.
    pub fn new() -> Self {
        BiTree {
            root: None,
            size: 0,
            destroy: None,
        }
    }

    /// Generates a new, empty tree whose payloads will be handed to `destroy`
    /// when their nodes are freed.
    pub fn with_destroy(destroy: impl Fn(T) + 'static) -> Self
    where
        T: 'static,
    {
        BiTree {
            root: None,
            size: 0,
            destroy: Some(Rc::new(destroy)),
        }
    }

    /// The number of nodes currently allocated in the tree.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the tree holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The root node, if the tree is non-empty.
    pub fn root(&self) -> Option<&Node<T>> {
        self.root.as_deref()
    }

    /// The root node, mutably.
    pub fn root_mut(&mut self) -> Option<&mut Node<T>> {
        self.root.as_deref_mut()
    }

    /// The position of the root slot. All structural edits start here and
    /// descend with [`Position::left`] / [`Position::right`].
    pub fn root_position(&mut self) -> Position<'_, T> {
        Position {
            slot: &mut self.root,
            size: &mut self.size,
            destroy: self.destroy.as_ref(),
        }
    }

    /// Destroys every node in the tree, invoking the destructor bottom-up once
    /// per payload. A no-op on an empty tree.
    pub fn clear(&mut self) {
        dispose(self.root.take(), &mut self.size, self.destroy.as_ref());
    }

    /// Merges two trees under a new root holding `data`.
    ///
    /// The former roots of `left` and `right` become the new root's children;
    /// both input trees are left empty. The merged tree inherits `left`'s
    /// destructor and its size is one more than the input sizes combined.
    ///
    /// # Examples
    ///
    /// ```
    /// use bistree::bitree::BiTree;
    ///
    /// let mut left = BiTree::new();
    /// left.root_position().insert(1).unwrap();
    /// let mut right = BiTree::new();
    /// right.root_position().insert(3).unwrap();
    ///
    /// let merged = BiTree::merge(&mut left, &mut right, 2);
    /// assert_eq!(merged.size(), 3);
    /// assert!(left.is_empty() && right.is_empty());
    /// ```
    pub fn merge(left: &mut Self, right: &mut Self, data: T) -> Self {
        let size = left.size + right.size + 1;
        let root = Node {
            data,
            left: left.root.take(),
            right: right.root.take(),
        };
        left.size = 0;
        right.size = 0;
        BiTree {
            root: Some(Box::new(root)),
            size,
            destroy: left.destroy.as_ref().map(Rc::clone),
        }
    }

    /// Visits every payload in order: left subtree, node, right subtree.
    pub fn in_order(&self, visit: &mut impl FnMut(&T)) {
        fn walk<T>(link: &Link<T>, visit: &mut impl FnMut(&T)) {
            if let Some(node) = link {
                walk(&node.left, visit);
                visit(&node.data);
                walk(&node.right, visit);
            }
        }
        walk(&self.root, visit);
    }

    /// Visits every payload bottom-up: left subtree, right subtree, node.
    pub fn post_order(&self, visit: &mut impl FnMut(&T)) {
        fn walk<T>(link: &Link<T>, visit: &mut impl FnMut(&T)) {
            if let Some(node) = link {
                walk(&node.left, visit);
                walk(&node.right, visit);
                visit(&node.data);
            }
        }
        walk(&self.root, visit);
    }
}

/// A mutable position within a tree, addressing one child slot.
///
/// A position is either vacant or occupied. A leaf can be [inserted] at a
/// vacant position; an occupied position can be narrowed to the slots of its
/// children or torn down wholesale with [`remove_subtree`].
///
/// [inserted]: Position::insert
/// [`remove_subtree`]: Position::remove_subtree
pub struct Position<'a, T> {
    slot: &'a mut Link<T>,
    size: &'a mut usize,
    destroy: Option<&'a Destroy<T>>,
}

impl<'a, T> Position<'a, T> {
    /// Whether no node occupies this position.
    pub fn is_vacant(&self) -> bool {
        self.slot.is_none()
    }

    /// The node occupying this position, if any.
    pub fn node(&self) -> Option<&Node<T>> {
        self.slot.as_deref()
    }

    /// The node occupying this position, mutably.
    pub fn node_mut(&mut self) -> Option<&mut Node<T>> {
        self.slot.as_deref_mut()
    }

    /// Attaches a new leaf holding `data` at this position.
    ///
    /// Fails with [`TreeError::InvalidPosition`] if the position is already
    /// occupied; insertion never replaces an existing node.
    pub fn insert(self, data: T) -> TreeResult<()> {
        attach(self.slot, data)?;
        *self.size += 1;
        Ok(())
    }

    /// Narrows to the left child slot of the node at this position.
    ///
    /// Fails with [`TreeError::InvalidPosition`] if this position is vacant.
    pub fn left(self) -> TreeResult<Position<'a, T>> {
        match *self.slot {
            Some(ref mut node) => Ok(Position {
                slot: &mut node.left,
                size: self.size,
                destroy: self.destroy,
            }),
            None => Err(TreeError::InvalidPosition),
        }
    }

    /// Narrows to the right child slot of the node at this position.
    ///
    /// Fails with [`TreeError::InvalidPosition`] if this position is vacant.
    pub fn right(self) -> TreeResult<Position<'a, T>> {
        match *self.slot {
            Some(ref mut node) => Ok(Position {
                slot: &mut node.right,
                size: self.size,
                destroy: self.destroy,
            }),
            None => Err(TreeError::InvalidPosition),
        }
    }

    /// Destroys the entire subtree rooted at this position, invoking the
    /// tree's destructor bottom-up once per payload and adjusting the tree's
    /// size. A no-op on a vacant position.
    pub fn remove_subtree(self) {
        dispose(self.slot.take(), self.size, self.destroy);
    }
}
