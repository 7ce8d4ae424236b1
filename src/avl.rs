//! An AVL-balanced search tree with lazy deletion.
//!
//! Every payload is wrapped in an entry carrying a balance factor (the height
//! of the left subtree minus the height of the right, kept in `{-1, 0, +1}`)
//! and a hidden flag. Insertion descends recursively under a comparator fixed
//! at construction, and on the way back up repairs any factor that drifted out
//! of range with a single or double rotation, so an imbalance never outlives
//! the insert call that caused it.
//!
//! Removal is lazy: it flips the hidden flag and touches nothing else. The node
//! stays allocated, keeps participating in comparisons, and still counts toward
//! [`AvlTree::size`]; it just stops being visible to [`AvlTree::lookup`] and
//! [`AvlTree::iter`]. Inserting the same key again revives the node in place
//! with the new payload, so a key is allocated at most one node over the
//! tree's whole lifetime. Nothing is freed before the tree is cleared or
//! dropped.
//!
//! # Examples
//!
//! ```
//! use std::cmp::Ordering;
//!
//! use bistree::avl::AvlTree;
//!
//! // Order entries by their key alone, ignoring the payload.
//! fn by_key(a: &(u32, &'static str), b: &(u32, &'static str)) -> Ordering {
//!     a.0.cmp(&b.0)
//! }
//!
//! let mut tree = AvlTree::new(by_key);
//! tree.insert((1, "one")).unwrap();
//! tree.insert((2, "two")).unwrap();
//!
//! // A second insert for a live key is rejected.
//! assert!(tree.insert((1, "uno")).is_err());
//!
//! // Removal hides the entry without freeing its node...
//! tree.remove(&(2, "")).unwrap();
//! assert!(tree.lookup(&(2, "")).is_err());
//! assert_eq!(tree.size(), 2);
//!
//! // ...and re-inserting the key revives the node with the new payload.
//! tree.insert((2, "zwei")).unwrap();
//! assert_eq!(tree.lookup(&(2, "")), Ok(&(2, "zwei")));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::bitree::{self, BiTree, Destroy, Link, Node};
use crate::error::{TreeError, TreeResult};

/// height(left subtree) − height(right subtree), constrained to {+1, 0, −1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Factor {
    LeftHeavy,
    Balanced,
    RightHeavy,
}

/// What each node of the underlying binary tree stores: the user payload plus
/// the balance and tombstone bookkeeping.
pub(crate) struct Entry<T> {
    pub(crate) value: T,
    pub(crate) factor: Factor,
    pub(crate) hidden: bool,
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Entry {
            value,
            factor: Factor::Balanced,
            hidden: false,
        }
    }
}

/// A self-balancing binary search tree (specifically, an AVL tree) with lazy
/// deletion. See the [module docs](self) for the full story.
///
/// The comparator `C` defines a total order over payloads and must not change
/// over the tree's lifetime. Payloads that compare equal are the same key.
pub struct AvlTree<T, C> {
    tree: BiTree<Entry<T>>,
    compare: C,
    destroy: Option<Destroy<T>>,
}

impl<T: fmt::Debug, C> fmt::Debug for AvlTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Ord> AvlTree<T, fn(&T, &T) -> Ordering> {
    /// Generates a new, empty tree ordered by the payload's `Ord`
    /// implementation.
    pub fn ordered() -> Self {
        AvlTree::new(T::cmp)
    }
}

impl<T, C> AvlTree<T, C> {
    /// The number of physically allocated nodes, hidden entries included.
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// Whether the tree holds no nodes at all. A tree whose every entry is
    /// hidden is not empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Iterates over the live (non-hidden) payloads in comparator order.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_edge(self.tree.root());
        iter
    }

    /// Destroys every node, live and hidden alike, invoking the destructor
    /// once per payload. The tree is left empty and ready for reuse.
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Generates a new, empty tree ordered by `compare`.
    pub fn new(compare: C) -> Self {
        AvlTree {
            tree: BiTree::new(),
            compare,
            destroy: None,
        }
    }

    /// Generates a new, empty tree ordered by `compare`, whose payloads are
    /// handed to `destroy` when they are torn down or replaced on revival.
    pub fn with_destroy(compare: C, destroy: impl Fn(T) + 'static) -> Self
    where
        T: 'static,
    {
        let destroy: Destroy<T> = Rc::new(destroy);
        let hook = Rc::clone(&destroy);
        AvlTree {
            tree: BiTree::with_destroy(move |entry: Entry<T>| hook(entry.value)),
            compare,
            destroy: Some(destroy),
        }
    }

    /// Inserts `data` into the tree, rebalancing as needed.
    ///
    /// If an entry comparing equal to `data` is already present and live, this
    /// fails with [`TreeError::DuplicateKey`] and changes nothing. If such an
    /// entry exists but is hidden, the node is revived in place: the old
    /// payload is handed to the destructor, `data` takes its slot, and no
    /// structural change happens at all.
    pub fn insert(&mut self, data: T) -> TreeResult<()> {
        let outcome = insert_at(&mut self.tree.root, data, &self.compare, self.destroy.as_ref())?;
        if let InsertOutcome::Created { .. } = outcome {
            self.tree.size += 1;
        }
        Ok(())
    }

    /// Removes the entry comparing equal to `key` by hiding it.
    ///
    /// No node is freed and no rebalancing happens; [`AvlTree::size`] is
    /// unchanged. Fails with [`TreeError::NotFound`] only when no entry
    /// compares equal to `key`; re-removing an already-hidden entry succeeds.
    pub fn remove(&mut self, key: &T) -> TreeResult<()> {
        let mut current = self.tree.root.as_deref_mut();
        while let Some(node) = current {
            match (self.compare)(key, &node.data.value) {
                Ordering::Less => current = node.left.as_deref_mut(),
                Ordering::Greater => current = node.right.as_deref_mut(),
                Ordering::Equal => {
                    node.data.hidden = true;
                    return Ok(());
                }
            }
        }
        Err(TreeError::NotFound)
    }

    /// Finds the live entry comparing equal to `key`.
    ///
    /// Fails with [`TreeError::NotFound`] when the key is absent or its entry
    /// is hidden.
    pub fn lookup(&self, key: &T) -> TreeResult<&T> {
        let mut current = self.tree.root();
        while let Some(node) = current {
            match (self.compare)(key, &node.data().value) {
                Ordering::Less => current = node.left(),
                Ordering::Greater => current = node.right(),
                Ordering::Equal => {
                    return if node.data().hidden {
                        Err(TreeError::NotFound)
                    } else {
                        Ok(&node.data().value)
                    };
                }
            }
        }
        Err(TreeError::NotFound)
    }
}

impl<'a, T, C> IntoIterator for &'a AvlTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// In-order iterator over a tree's live payloads. Hidden entries are skipped.
pub struct Iter<'a, T> {
    stack: Vec<&'a Node<Entry<T>>>,
}

impl<'a, T> Iter<'a, T> {
    fn push_left_edge(&mut self, mut node: Option<&'a Node<Entry<T>>>) {
        while let Some(n) = node {
            self.stack.push(n);
            node = n.left();
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        while let Some(node) = self.stack.pop() {
            self.push_left_edge(node.right());
            if !node.data().hidden {
                return Some(&node.data().value);
            }
        }
        None
    }
}

/// What a recursive insertion step reports to its caller.
enum InsertOutcome {
    /// A fresh leaf was attached somewhere below; `grew` is whether this
    /// subtree got taller, obliging the caller to re-examine its own factor.
    Created { grew: bool },
    /// A hidden entry was revived in place. The structure is untouched, so no
    /// caller rebalances anything.
    Revived,
}

fn insert_at<T, C>(
    slot: &mut Link<Entry<T>>,
    data: T,
    compare: &C,
    destroy: Option<&Destroy<T>>,
) -> TreeResult<InsertOutcome>
where
    C: Fn(&T, &T) -> Ordering,
{
    let node = match *slot {
        Some(ref mut node) => node,
        None => {
            bitree::attach(slot, Entry::new(data))?;
            return Ok(InsertOutcome::Created { grew: true });
        }
    };

    match compare(&data, &node.data.value) {
        Ordering::Less => {
            let outcome = insert_at(&mut node.left, data, compare, destroy)?;
            if !matches!(outcome, InsertOutcome::Created { grew: true }) {
                return Ok(outcome);
            }
            // The left subtree got taller; absorb the growth or rotate.
            match node.data.factor {
                Factor::LeftHeavy => {
                    rebalance_left(slot);
                    Ok(InsertOutcome::Created { grew: false })
                }
                Factor::Balanced => {
                    node.data.factor = Factor::LeftHeavy;
                    Ok(InsertOutcome::Created { grew: true })
                }
                Factor::RightHeavy => {
                    node.data.factor = Factor::Balanced;
                    Ok(InsertOutcome::Created { grew: false })
                }
            }
        }
        Ordering::Greater => {
            let outcome = insert_at(&mut node.right, data, compare, destroy)?;
            if !matches!(outcome, InsertOutcome::Created { grew: true }) {
                return Ok(outcome);
            }
            match node.data.factor {
                Factor::LeftHeavy => {
                    node.data.factor = Factor::Balanced;
                    Ok(InsertOutcome::Created { grew: false })
                }
                Factor::Balanced => {
                    node.data.factor = Factor::RightHeavy;
                    Ok(InsertOutcome::Created { grew: true })
                }
                Factor::RightHeavy => {
                    rebalance_right(slot);
                    Ok(InsertOutcome::Created { grew: false })
                }
            }
        }
        Ordering::Equal => {
            if !node.data.hidden {
                return Err(TreeError::DuplicateKey);
            }
            let old = mem::replace(&mut node.data.value, data);
            match destroy {
                Some(destroy) => destroy(old),
                None => drop(old),
            }
            node.data.hidden = false;
            Ok(InsertOutcome::Revived)
        }
    }
}

/// Repairs a left-side imbalance: the subtree at `slot` was already left-heavy
/// and its left side just got taller.
///
/// When the left child leans left this is a single (LL) rotation promoting the
/// left child; otherwise a double (LR) rotation promotes the left child's
/// right child, with factors recomputed from the grandchild's old factor.
fn rebalance_left<T>(slot: &mut Link<Entry<T>>) {
    let mut root = slot.take().expect("rebalancing requires a subtree root");
    let mut left = root
        .left
        .take()
        .expect("a left-heavy node has a left child");

    if left.data.factor == Factor::LeftHeavy {
        // LL: promote the left child.
        root.left = left.right.take();
        root.data.factor = Factor::Balanced;
        left.data.factor = Factor::Balanced;
        left.right = Some(root);
        *slot = Some(left);
    } else {
        // LR: promote the left child's right child.
        let mut grandchild = left
            .right
            .take()
            .expect("a double rotation pivots on a grandchild");
        left.right = grandchild.left.take();
        root.left = grandchild.right.take();
        match grandchild.data.factor {
            Factor::LeftHeavy => {
                root.data.factor = Factor::RightHeavy;
                left.data.factor = Factor::Balanced;
            }
            Factor::Balanced => {
                root.data.factor = Factor::Balanced;
                left.data.factor = Factor::Balanced;
            }
            Factor::RightHeavy => {
                root.data.factor = Factor::Balanced;
                left.data.factor = Factor::LeftHeavy;
            }
        }
        grandchild.data.factor = Factor::Balanced;
        grandchild.left = Some(left);
        grandchild.right = Some(root);
        *slot = Some(grandchild);
    }
}

/// Mirror image of [`rebalance_left`] for a right-side imbalance (RR/RL).
fn rebalance_right<T>(slot: &mut Link<Entry<T>>) {
    let mut root = slot.take().expect("rebalancing requires a subtree root");
    let mut right = root
        .right
        .take()
        .expect("a right-heavy node has a right child");

    if right.data.factor == Factor::RightHeavy {
        // RR: promote the right child.
        root.right = right.left.take();
        root.data.factor = Factor::Balanced;
        right.data.factor = Factor::Balanced;
        right.left = Some(root);
        *slot = Some(right);
    } else {
        // RL: promote the right child's left child.
        let mut grandchild = right
            .left
            .take()
            .expect("a double rotation pivots on a grandchild");
        right.left = grandchild.right.take();
        root.right = grandchild.left.take();
        match grandchild.data.factor {
            Factor::LeftHeavy => {
                root.data.factor = Factor::Balanced;
                right.data.factor = Factor::RightHeavy;
            }
            Factor::Balanced => {
                root.data.factor = Factor::Balanced;
                right.data.factor = Factor::Balanced;
            }
            Factor::RightHeavy => {
                root.data.factor = Factor::LeftHeavy;
                right.data.factor = Factor::Balanced;
            }
        }
        grandchild.data.factor = Factor::Balanced;
        grandchild.right = Some(right);
        grandchild.left = Some(root);
        *slot = Some(grandchild);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Recursively checks the AVL and ordering invariants below `link`:
    /// the stored factor must equal the measured height difference, stay in
    /// range, and children must straddle their parent. Returns the height.
    pub(super) fn audit<T: Ord>(link: &Link<Entry<T>>) -> usize {
        match link {
            None => 0,
            Some(node) => {
                let left = audit(&node.left);
                let right = audit(&node.right);

                let diff = left as isize - right as isize;
                assert!(diff.abs() <= 1, "subtree heights differ by {diff}");
                let expected = match node.data.factor {
                    Factor::LeftHeavy => 1,
                    Factor::Balanced => 0,
                    Factor::RightHeavy => -1,
                };
                assert_eq!(diff, expected, "stored factor disagrees with heights");

                if let Some(l) = node.left() {
                    assert!(l.data().value < node.data.value);
                }
                if let Some(r) = node.right() {
                    assert!(r.data().value > node.data.value);
                }

                left.max(right) + 1
            }
        }
    }

    fn tree_of(keys: &[i32]) -> AvlTree<i32, fn(&i32, &i32) -> Ordering> {
        let mut tree = AvlTree::ordered();
        for &key in keys {
            tree.insert(key).unwrap();
            audit(&tree.tree.root);
        }
        tree
    }

    /// All keys in the tree, hidden ones included, in symmetric order.
    fn all_keys(tree: &AvlTree<i32, fn(&i32, &i32) -> Ordering>) -> Vec<i32> {
        let mut keys = Vec::new();
        tree.tree.in_order(&mut |entry| keys.push(entry.value));
        keys
    }

    #[test]
    fn spec_sequence_stays_balanced() {
        let tree = tree_of(&[5, 3, 8, 1, 4, 7, 9, 2]);

        assert_eq!(tree.size(), 8);
        let in_order: Vec<i32> = tree.iter().copied().collect();
        assert_eq!(in_order, [1, 2, 3, 4, 5, 7, 8, 9]);
    }

    #[test]
    fn ascending_run_triggers_rr_rotation() {
        let tree = tree_of(&[1, 2, 3]);

        // Without the rotation the tree would be a height-3 right spine.
        assert_eq!(audit(&tree.tree.root), 2);
        assert_eq!(tree.tree.root().unwrap().data().value, 2);
    }

    #[test]
    fn descending_run_triggers_ll_rotation() {
        let tree = tree_of(&[3, 2, 1]);

        assert_eq!(audit(&tree.tree.root), 2);
        assert_eq!(tree.tree.root().unwrap().data().value, 2);
    }

    #[test]
    fn zigzag_triggers_lr_rotation() {
        let tree = tree_of(&[3, 1, 2]);

        assert_eq!(audit(&tree.tree.root), 2);
        assert_eq!(tree.tree.root().unwrap().data().value, 2);
    }

    #[test]
    fn zigzag_triggers_rl_rotation() {
        let tree = tree_of(&[1, 3, 2]);

        assert_eq!(audit(&tree.tree.root), 2);
        assert_eq!(tree.tree.root().unwrap().data().value, 2);
    }

    #[test]
    fn long_runs_stay_logarithmic() {
        // 128 keys fit in height 8; a naive BST would build a 128-deep spine.
        let up = tree_of(&(0..128).collect::<Vec<_>>());
        assert!(audit(&up.tree.root) <= 8);

        let down = tree_of(&(0..128).rev().collect::<Vec<_>>());
        assert!(audit(&down.tree.root) <= 8);
    }

    #[test]
    fn interleaved_inserts_stay_balanced() {
        // A fixed pseudo-random permutation; `tree_of` audits every step.
        let keys: Vec<i32> = (0..257).map(|i| (i * 167) % 257).collect();
        let tree = tree_of(&keys);

        assert_eq!(tree.size(), 257);
        let sorted: Vec<i32> = tree.iter().copied().collect();
        assert_eq!(sorted, (0..257).collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_of_live_key_is_rejected_unchanged() {
        let mut tree = tree_of(&[5, 3, 8]);
        let before = all_keys(&tree);

        assert_eq!(tree.insert(5), Err(TreeError::DuplicateKey));

        assert_eq!(tree.size(), 3);
        assert_eq!(all_keys(&tree), before);
        audit(&tree.tree.root);
    }

    #[test]
    fn remove_hides_without_freeing() {
        let mut tree = tree_of(&[5, 3, 8, 1, 4]);

        tree.remove(&3).unwrap();

        assert_eq!(tree.size(), 5);
        assert_eq!(tree.lookup(&3), Err(TreeError::NotFound));
        // The node is still physically in the tree.
        assert_eq!(all_keys(&tree), [1, 3, 4, 5, 8]);
        // But iteration skips it.
        let live: Vec<i32> = tree.iter().copied().collect();
        assert_eq!(live, [1, 4, 5, 8]);
    }

    #[test]
    fn remove_of_absent_key_fails() {
        let mut tree = tree_of(&[5, 3, 8]);
        assert_eq!(tree.remove(&4), Err(TreeError::NotFound));
    }

    #[test]
    fn remove_of_hidden_key_is_a_successful_no_op() {
        let mut tree = tree_of(&[5, 3, 8]);
        tree.remove(&3).unwrap();

        assert_eq!(tree.remove(&3), Ok(()));
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn reinsert_revives_in_place() {
        fn by_key(a: &(i32, char), b: &(i32, char)) -> Ordering {
            a.0.cmp(&b.0)
        }

        let mut tree = AvlTree::new(by_key);
        tree.insert((10, 'a')).unwrap();
        tree.insert((5, 'x')).unwrap();
        assert_eq!(tree.size(), 2);

        tree.remove(&(10, ' ')).unwrap();
        assert_eq!(tree.lookup(&(10, ' ')), Err(TreeError::NotFound));

        // Revival: no new node, new payload.
        tree.insert((10, 'b')).unwrap();
        assert_eq!(tree.size(), 2);
        assert_eq!(tree.lookup(&(10, ' ')), Ok(&(10, 'b')));
    }

    #[test]
    fn revival_destroys_the_replaced_payload() {
        fn by_key(a: &(i32, char), b: &(i32, char)) -> Ordering {
            a.0.cmp(&b.0)
        }

        let destroyed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&destroyed);

        let mut tree =
            AvlTree::with_destroy(by_key, move |_: (i32, char)| counter.set(counter.get() + 1));
        tree.insert((10, 'a')).unwrap();
        tree.remove(&(10, ' ')).unwrap();
        assert_eq!(destroyed.get(), 0);

        tree.insert((10, 'b')).unwrap();
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn hidden_entries_still_route_comparisons() {
        let mut tree = tree_of(&[8, 4, 12, 2, 6, 10, 14]);
        tree.remove(&8).unwrap();
        tree.remove(&4).unwrap();

        // New keys descend through the hidden nodes as before.
        tree.insert(5).unwrap();
        tree.insert(13).unwrap();
        audit(&tree.tree.root);

        let live: Vec<i32> = tree.iter().copied().collect();
        assert_eq!(live, [2, 5, 6, 10, 12, 13, 14]);
    }

    #[test]
    fn clear_destroys_live_and_hidden_alike() {
        let destroyed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&destroyed);

        let mut tree = AvlTree::with_destroy(i32::cmp, move |_| counter.set(counter.get() + 1));
        for key in [5, 3, 8, 1, 4] {
            tree.insert(key).unwrap();
        }
        tree.remove(&3).unwrap();
        tree.remove(&8).unwrap();

        tree.clear();
        assert_eq!(destroyed.get(), 5);
        assert_eq!(tree.size(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.lookup(&5), Err(TreeError::NotFound));

        // The tree is reusable after a clear.
        tree.insert(7).unwrap();
        assert_eq!(tree.lookup(&7), Ok(&7));
    }

    #[test]
    fn drop_destroys_every_payload() {
        let destroyed = Rc::new(Cell::new(0));
        let counter = Rc::clone(&destroyed);

        {
            let mut tree = AvlTree::with_destroy(i32::cmp, move |_| counter.set(counter.get() + 1));
            for key in 0..10 {
                tree.insert(key).unwrap();
            }
            tree.remove(&4).unwrap();
        }

        assert_eq!(destroyed.get(), 10);
    }

    #[test]
    fn empty_tree_behaves() {
        let mut tree: AvlTree<i32, _> = AvlTree::ordered();
        assert!(tree.is_empty());
        assert_eq!(tree.lookup(&1), Err(TreeError::NotFound));
        assert_eq!(tree.remove(&1), Err(TreeError::NotFound));
        assert_eq!(tree.iter().next(), None);
        tree.clear();
        assert_eq!(tree.size(), 0);
    }
}
