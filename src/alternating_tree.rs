//! Alternating Tree
//!
//! Bookkeeping of the alternating trees and the tree edges between them. Every edge that may become tight is kept in
//! exactly one heap, chosen by the labels and trees of its endpoints:
//!
//! - (+, ∞) edges in `plus_infinity_edges` of the tree of the PLUS endpoint
//! - (+, +) edges within one tree in `plus_plus_edges` of that tree
//! - (+, +) edges across two trees in `plus_plus_edges` of the tree edge joining them
//! - (+, -) edges across two trees in `plus_minus_edges[k]` of the tree edge, where `head[k]` is the tree of the PLUS endpoint
//!
//! A tree edge lives in two lists: `first[0]` of its `head[1]` tree and `first[1]` of its `head[0]` tree, so walking
//! `first[dir]` of a tree yields tree edges whose opposite tree is `head[dir]`.
//!

use super::util::*;
use super::heap::*;
use super::blossom_graph::*;
use crate::derivative::Derivative;

/// which heap currently holds an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeHeap {
    PlusInfinity(TreeIndex),
    PlusPlus(TreeIndex),
    CrossPlusPlus(TreeEdgeIndex),
    CrossPlusMinus(TreeEdgeIndex, usize),
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Tree {
    pub root: NodeIndex,
    /// dual change not yet applied to the nodes and edges of this tree
    pub eps: Weight,
    #[derivative(Debug="ignore")]
    pub plus_plus_edges: AddressableHeap<EdgeIndex>,
    #[derivative(Debug="ignore")]
    pub plus_infinity_edges: AddressableHeap<EdgeIndex>,
    /// MINUS blossoms keyed by their stored dual
    #[derivative(Debug="ignore")]
    pub minus_blossoms: AddressableHeap<NodeIndex>,
    /// the tree edge towards the tree being processed, valid only between `set_current_edges` and `clear_current_edges`
    pub current_edge: Option<TreeEdgeIndex>,
    pub current_direction: usize,
    pub first: [Option<TreeEdgeIndex>; 2],
}

impl Tree {

    pub fn new(root: NodeIndex) -> Self {
        Self {
            root,
            eps: 0.,
            plus_plus_edges: AddressableHeap::new(),
            plus_infinity_edges: AddressableHeap::new(),
            minus_blossoms: AddressableHeap::new(),
            current_edge: None,
            current_direction: 0,
            first: [None, None],
        }
    }

}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct TreeEdge {
    /// `head[0]` is the tree this edge points to, `head[1]` the tree it comes from
    pub head: [TreeIndex; 2],
    pub next: [Option<TreeEdgeIndex>; 2],
    pub prev: [Option<TreeEdgeIndex>; 2],
    #[derivative(Debug="ignore")]
    pub plus_plus_edges: AddressableHeap<EdgeIndex>,
    #[derivative(Debug="ignore")]
    pub plus_minus_edges: [AddressableHeap<EdgeIndex>; 2],
}

impl BlossomState {

    pub fn tree(&self, tree_index: TreeIndex) -> &Tree {
        self.trees[tree_index].as_ref().expect("tree is already dissolved")
    }

    pub fn tree_mut(&mut self, tree_index: TreeIndex) -> &mut Tree {
        self.trees[tree_index].as_mut().expect("tree is already dissolved")
    }

    pub fn tree_edge(&self, tree_edge_index: TreeEdgeIndex) -> &TreeEdge {
        self.tree_edges[tree_edge_index].as_ref().expect("tree edge is already removed")
    }

    pub fn tree_edge_mut(&mut self, tree_edge_index: TreeEdgeIndex) -> &mut TreeEdge {
        self.tree_edges[tree_edge_index].as_mut().expect("tree edge is already removed")
    }

    pub fn tree_eps(&self, tree_index: TreeIndex) -> Weight {
        self.tree(tree_index).eps
    }

    pub fn live_trees(&self) -> Vec<TreeIndex> {
        (0..self.trees.len()).filter(|&tree_index| self.trees[tree_index].is_some()).collect()
    }

    /// turn an unmatched outer node into the root of a new single-node tree
    pub fn add_tree(&mut self, root: NodeIndex) -> TreeIndex {
        let tree_index = self.trees.len();
        self.trees.push(Some(Tree::new(root)));
        let node = &mut self.nodes[root];
        debug_assert!(node.is_outer && node.matched.is_none(), "only an unmatched outer node can be a tree root");
        node.label = Label::Plus;
        node.tree = Some(tree_index);
        node.is_tree_root = true;
        node.first_tree_child = None;
        node.tree_sibling_next = None;
        node.tree_sibling_prev = None;
        self.tree_num += 1;
        tree_index
    }

    /*
     * tree edges
     */

    /// link two trees; `to` immediately becomes the current neighbour of `from`
    pub fn add_tree_edge(&mut self, from: TreeIndex, to: TreeIndex) -> TreeEdgeIndex {
        debug_assert_ne!(from, to, "a tree edge joins two different trees");
        debug_assert!(self.tree_edges_of(from).iter().all(|&(tree_edge_index, dir)| self.tree_edge(tree_edge_index).head[dir] != to),
            "trees {} and {} are already joined, the current edges are not set", from, to);
        let tree_edge_index = self.tree_edges.len();
        let next = [self.tree(from).first[0], self.tree(to).first[1]];
        self.tree_edges.push(Some(TreeEdge {
            head: [to, from],
            next,
            prev: [None, None],
            plus_plus_edges: AddressableHeap::new(),
            plus_minus_edges: [AddressableHeap::new(), AddressableHeap::new()],
        }));
        if let Some(next_0) = next[0] {
            self.tree_edge_mut(next_0).prev[0] = Some(tree_edge_index);
        }
        if let Some(next_1) = next[1] {
            self.tree_edge_mut(next_1).prev[1] = Some(tree_edge_index);
        }
        self.tree_mut(from).first[0] = Some(tree_edge_index);
        let to_tree = self.tree_mut(to);
        to_tree.first[1] = Some(tree_edge_index);
        to_tree.current_edge = Some(tree_edge_index);
        to_tree.current_direction = 0;
        tree_edge_index
    }

    pub fn remove_from_tree_edge_list(&mut self, tree_edge_index: TreeEdgeIndex) {
        for dir in 0..2 {
            let tree_edge = self.tree_edge(tree_edge_index);
            let (prev, next, owner) = (tree_edge.prev[dir], tree_edge.next[dir], tree_edge.head[1 - dir]);
            match prev {
                Some(prev) => self.tree_edge_mut(prev).next[dir] = next,
                None => self.tree_mut(owner).first[dir] = next,
            }
            if let Some(next) = next {
                self.tree_edge_mut(next).prev[dir] = prev;
            }
        }
    }

    /// `(tree edge, dir)` pairs of the tree, where `head[dir]` of the tree edge is the opposite tree
    pub fn tree_edges_of(&self, tree_index: TreeIndex) -> Vec<(TreeEdgeIndex, usize)> {
        let mut result = vec![];
        for dir in 0..2 {
            let mut tree_edge_index = self.tree(tree_index).first[dir];
            while let Some(current) = tree_edge_index {
                result.push((current, dir));
                tree_edge_index = self.tree_edge(current).next[dir];
            }
        }
        result
    }

    /// let every neighbour of the tree point at the tree edge joining them
    pub fn set_current_edges(&mut self, tree_index: TreeIndex) {
        for (tree_edge_index, dir) in self.tree_edges_of(tree_index) {
            let opposite = self.tree_edge(tree_edge_index).head[dir];
            let opposite_tree = self.tree_mut(opposite);
            opposite_tree.current_edge = Some(tree_edge_index);
            opposite_tree.current_direction = dir;
        }
    }

    pub fn clear_current_edges(&mut self, tree_index: TreeIndex) {
        self.tree_mut(tree_index).current_edge = None;
        for (tree_edge_index, dir) in self.tree_edges_of(tree_index) {
            let opposite = self.tree_edge(tree_edge_index).head[dir];
            self.tree_mut(opposite).current_edge = None;
        }
    }

    /// the tree edge from `tree` to `opposite_tree` and its direction, created on first discovery;
    /// the current edges of `tree` must be set
    pub fn tree_edge_towards(&mut self, tree_index: TreeIndex, opposite_tree: TreeIndex) -> (TreeEdgeIndex, usize) {
        let opposite = self.tree(opposite_tree);
        match opposite.current_edge {
            Some(tree_edge_index) => (tree_edge_index, opposite.current_direction),
            None => (self.add_tree_edge(tree_index, opposite_tree), 0),
        }
    }

    /// unlink every tree edge of a tree that is being dissolved; candidates left in the heaps of a tree edge are
    /// handed over to the neighbour, for which they are now (+, ∞) edges
    pub fn remove_tree_edges(&mut self, tree_index: TreeIndex) {
        for (tree_edge_index, dir) in self.tree_edges_of(tree_index) {
            let opposite = self.tree_edge(tree_edge_index).head[dir];
            self.tree_mut(opposite).current_edge = None;
            let mut handed_over = vec![];
            let mut dropped = vec![];
            {
                let tree_edge = self.tree_edges[tree_edge_index].as_mut().expect("tree edge is already removed");
                let opposite_tree = self.trees[opposite].as_mut().expect("tree is already dissolved");
                handed_over.extend(opposite_tree.plus_infinity_edges.meld(&mut tree_edge.plus_plus_edges));
                handed_over.extend(opposite_tree.plus_infinity_edges.meld(&mut tree_edge.plus_minus_edges[dir]));
                dropped.extend(tree_edge.plus_minus_edges[1 - dir].drain());
            }
            for edge_index in handed_over {
                self.edges[edge_index].heap = Some(EdgeHeap::PlusInfinity(opposite));
            }
            for edge_index in dropped {
                self.edges[edge_index].heap = None;
            }
            self.remove_from_tree_edge_list(tree_edge_index);
            self.tree_edges[tree_edge_index] = None;
        }
    }

    /// drop the tree together with everything left in its heaps
    pub fn dissolve_tree(&mut self, tree_index: TreeIndex) {
        let mut tree = self.trees[tree_index].take().expect("tree is already dissolved");
        debug_assert!(tree.first.iter().all(|first| first.is_none()), "tree edges must be removed first");
        for edge_index in tree.plus_plus_edges.drain().into_iter().chain(tree.plus_infinity_edges.drain()) {
            self.edges[edge_index].heap = None;
        }
        for node_index in tree.minus_blossoms.drain() {
            self.nodes[node_index].minus_heap = None;
        }
        self.tree_num -= 1;
    }

    /*
     * heaps
     */

    fn insert_edge(&mut self, edge_index: EdgeIndex, location: EdgeHeap) {
        let edge = &self.edges[edge_index];
        assert!(edge.heap.is_none(), "edge {} is already in {:?}", edge_index, edge.heap);
        let key = edge.slack;
        match location {
            EdgeHeap::PlusInfinity(tree_index) => self.tree_mut(tree_index).plus_infinity_edges.insert(edge_index, key),
            EdgeHeap::PlusPlus(tree_index) => self.tree_mut(tree_index).plus_plus_edges.insert(edge_index, key),
            EdgeHeap::CrossPlusPlus(tree_edge_index) => self.tree_edge_mut(tree_edge_index).plus_plus_edges.insert(edge_index, key),
            EdgeHeap::CrossPlusMinus(tree_edge_index, k) => self.tree_edge_mut(tree_edge_index).plus_minus_edges[k].insert(edge_index, key),
        }
        self.edges[edge_index].heap = Some(location);
    }

    /// take the edge out of whatever heap holds it
    pub fn detach_edge(&mut self, edge_index: EdgeIndex) -> Option<EdgeHeap> {
        let location = self.edges[edge_index].heap.take()?;
        let removed = match location {
            EdgeHeap::PlusInfinity(tree_index) => self.tree_mut(tree_index).plus_infinity_edges.remove(&edge_index),
            EdgeHeap::PlusPlus(tree_index) => self.tree_mut(tree_index).plus_plus_edges.remove(&edge_index),
            EdgeHeap::CrossPlusPlus(tree_edge_index) => self.tree_edge_mut(tree_edge_index).plus_plus_edges.remove(&edge_index),
            EdgeHeap::CrossPlusMinus(tree_edge_index, k) => self.tree_edge_mut(tree_edge_index).plus_minus_edges[k].remove(&edge_index),
        };
        assert!(removed.is_some(), "edge {} is not in {:?}", edge_index, location);
        Some(location)
    }

    pub fn edge_heap_key(&self, location: EdgeHeap, edge_index: EdgeIndex) -> Option<Weight> {
        match location {
            EdgeHeap::PlusInfinity(tree_index) => self.trees[tree_index].as_ref()?.plus_infinity_edges.key_of(&edge_index),
            EdgeHeap::PlusPlus(tree_index) => self.trees[tree_index].as_ref()?.plus_plus_edges.key_of(&edge_index),
            EdgeHeap::CrossPlusPlus(tree_edge_index) => self.tree_edges[tree_edge_index].as_ref()?.plus_plus_edges.key_of(&edge_index),
            EdgeHeap::CrossPlusMinus(tree_edge_index, k) => self.tree_edges[tree_edge_index].as_ref()?.plus_minus_edges[k].key_of(&edge_index),
        }
    }

    pub fn add_plus_infinity_edge(&mut self, tree_index: TreeIndex, edge_index: EdgeIndex) {
        self.insert_edge(edge_index, EdgeHeap::PlusInfinity(tree_index));
    }

    pub fn add_plus_plus_edge(&mut self, tree_index: TreeIndex, edge_index: EdgeIndex) {
        self.insert_edge(edge_index, EdgeHeap::PlusPlus(tree_index));
    }

    pub fn add_cross_plus_plus_edge(&mut self, tree_edge_index: TreeEdgeIndex, edge_index: EdgeIndex) {
        self.insert_edge(edge_index, EdgeHeap::CrossPlusPlus(tree_edge_index));
    }

    /// (-, +) edge whose PLUS endpoint is in the opposite tree `head[dir]`
    pub fn add_to_current_minus_plus_heap(&mut self, tree_edge_index: TreeEdgeIndex, edge_index: EdgeIndex, dir: usize) {
        self.insert_edge(edge_index, EdgeHeap::CrossPlusMinus(tree_edge_index, dir));
    }

    /// (+, -) edge whose MINUS endpoint is in the opposite tree `head[dir]`
    pub fn add_to_current_plus_minus_heap(&mut self, tree_edge_index: TreeEdgeIndex, edge_index: EdgeIndex, dir: usize) {
        self.insert_edge(edge_index, EdgeHeap::CrossPlusMinus(tree_edge_index, 1 - dir));
    }

    pub fn remove_plus_infinity_edge(&mut self, tree_index: TreeIndex, edge_index: EdgeIndex) {
        let location = self.detach_edge(edge_index);
        assert_eq!(location, Some(EdgeHeap::PlusInfinity(tree_index)), "edge {} must be a (+, inf) edge", edge_index);
    }

    pub fn remove_plus_plus_edge(&mut self, tree_index: TreeIndex, edge_index: EdgeIndex) {
        let location = self.detach_edge(edge_index);
        assert_eq!(location, Some(EdgeHeap::PlusPlus(tree_index)), "edge {} must be an in-tree (+, +) edge", edge_index);
    }

    pub fn remove_cross_plus_plus_edge(&mut self, edge_index: EdgeIndex) {
        let location = self.detach_edge(edge_index);
        assert!(matches!(location, Some(EdgeHeap::CrossPlusPlus(_))), "edge {} must be a cross-tree (+, +) edge", edge_index);
    }

    pub fn remove_cross_plus_minus_edge(&mut self, edge_index: EdgeIndex) {
        let location = self.detach_edge(edge_index);
        assert!(matches!(location, Some(EdgeHeap::CrossPlusMinus(..))), "edge {} must be a cross-tree (+, -) edge", edge_index);
    }

    pub fn add_minus_blossom(&mut self, tree_index: TreeIndex, node_index: NodeIndex) {
        debug_assert!(self.nodes[node_index].minus_heap.is_none());
        let dual = self.nodes[node_index].dual;
        self.tree_mut(tree_index).minus_blossoms.insert(node_index, dual);
        self.nodes[node_index].minus_heap = Some(tree_index);
    }

    pub fn remove_minus_blossom(&mut self, node_index: NodeIndex) {
        let tree_index = self.nodes[node_index].minus_heap.take().expect("node is not in a minus-blossom heap");
        self.tree_mut(tree_index).minus_blossoms.remove(&node_index);
    }

    /*
     * queries
     */

    /// all nodes of the tree in depth-first order, starting with the root
    pub fn tree_nodes(&self, tree_index: TreeIndex) -> Vec<NodeIndex> {
        let root = self.tree(tree_index).root;
        let mut result = vec![root];
        let mut current = root;
        loop {
            if let Some(child) = self.nodes[current].first_tree_child {
                current = child;
            } else {
                loop {
                    if current == root {
                        return result
                    }
                    if let Some(next) = self.nodes[current].tree_sibling_next {
                        current = next;
                        break
                    }
                    current = self.tree_parent(current).expect("non-root tree node must have a parent");
                }
            }
            result.push(current);
        }
    }

    /// the largest value the eps of the tree may reach before some in-tree constraint becomes tight;
    /// cross-tree (+, +) edges are left to the dual updater
    pub fn get_eps(&self, tree_index: TreeIndex) -> Weight {
        let tree = self.tree(tree_index);
        let mut eps = Weight::INFINITY;
        if let Some(slack) = tree.plus_infinity_edges.min_key() {
            eps = eps.min(slack);
        }
        if let Some(dual) = tree.minus_blossoms.min_key() {
            eps = eps.min(dual);
        }
        if let Some(slack) = tree.plus_plus_edges.min_key() {
            eps = eps.min(slack / 2.);
        }
        eps
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    /// four singleton trees, one per vertex of a path 0 - 1 - 2 - 3
    fn path_forest() -> BlossomState {
        let initializer = SolverInitializer::new(4, vec![(0, 1, 2.), (1, 2, 3.), (2, 3, 4.)]);
        let mut state = BlossomState::new(&initializer, 0.);
        for vertex in 0..4 {
            state.add_tree(vertex);
        }
        state
    }

    #[test]
    fn alternating_tree_tree_edge_lists() {  // cargo test alternating_tree_tree_edge_lists -- --nocapture
        let mut state = path_forest();
        let a = state.add_tree_edge(1, 0);
        state.clear_current_edges(1);
        let b = state.add_tree_edge(1, 2);
        state.clear_current_edges(1);
        let c = state.add_tree_edge(3, 1);
        state.clear_current_edges(3);
        let mut edges_of_1 = state.tree_edges_of(1);
        edges_of_1.sort();
        assert_eq!(edges_of_1, vec![(a, 0), (b, 0), (c, 1)]);
        state.set_current_edges(1);
        assert_eq!(state.tree(0).current_edge, Some(a));
        assert_eq!(state.tree(3).current_edge, Some(c));
        assert_eq!(state.tree(3).current_direction, 1);
        assert_eq!(state.tree_edge_towards(1, 2), (b, 0));
        state.clear_current_edges(1);
        state.remove_from_tree_edge_list(b);
        state.tree_edges[b] = None;
        let mut edges_of_1 = state.tree_edges_of(1);
        edges_of_1.sort();
        assert_eq!(edges_of_1, vec![(a, 0), (c, 1)]);
        assert!(state.tree_edges_of(2).is_empty());
    }

    #[test]
    fn alternating_tree_heap_membership() {  // cargo test alternating_tree_heap_membership -- --nocapture
        let mut state = path_forest();
        state.add_plus_plus_edge(0, 0);
        state.add_plus_infinity_edge(1, 1);
        assert_eq!(state.get_eps(0), 1.);
        assert_eq!(state.get_eps(1), 3.);
        assert_eq!(state.get_eps(2), Weight::INFINITY);
        state.remove_plus_plus_edge(0, 0);
        assert_eq!(state.edges[0].heap, None);
        let tree_edge_index = state.add_tree_edge(2, 3);
        state.add_to_current_minus_plus_heap(tree_edge_index, 2, state.tree(3).current_direction);
        assert_eq!(state.edges[2].heap, Some(EdgeHeap::CrossPlusMinus(tree_edge_index, 0)));
        assert_eq!(state.edge_heap_key(EdgeHeap::CrossPlusMinus(tree_edge_index, 0), 2), Some(4.));
        state.remove_cross_plus_minus_edge(2);
        state.add_to_current_plus_minus_heap(tree_edge_index, 2, 0);
        assert_eq!(state.edges[2].heap, Some(EdgeHeap::CrossPlusMinus(tree_edge_index, 1)));
    }

    #[test]
    #[should_panic]
    fn alternating_tree_wrong_heap_removal() {  // cargo test alternating_tree_wrong_heap_removal -- --nocapture
        let mut state = path_forest();
        state.add_plus_infinity_edge(1, 1);
        state.remove_plus_plus_edge(1, 1);
    }

    #[test]
    fn alternating_tree_hand_over_candidates() {  // cargo test alternating_tree_hand_over_candidates -- --nocapture
        let mut state = path_forest();
        let tree_edge_index = state.add_tree_edge(1, 2);
        state.add_cross_plus_plus_edge(tree_edge_index, 1);
        state.clear_current_edges(1);
        state.remove_tree_edges(1);
        assert_eq!(state.edges[1].heap, Some(EdgeHeap::PlusInfinity(2)));
        assert_eq!(state.tree(2).plus_infinity_edges.find_min(), Some((1, 3.)));
        assert!(state.tree_edges_of(2).is_empty());
        state.dissolve_tree(1);
        assert_eq!(state.tree_num, 3);
        assert!(state.trees[1].is_none());
    }

    #[test]
    fn alternating_tree_depth_first_nodes() {  // cargo test alternating_tree_depth_first_nodes -- --nocapture
        let initializer = SolverInitializer::new(6, vec![(0, 1, 1.), (1, 2, 1.), (0, 3, 1.), (3, 4, 1.), (4, 5, 1.)]);
        let mut state = BlossomState::new(&initializer, 0.);
        let tree_index = state.add_tree(0);
        state.add_child(0, 1, 0, true);
        state.add_child(1, 2, 1, true);
        state.add_child(0, 3, 2, true);
        state.add_child(3, 4, 3, true);
        assert_eq!(state.tree_nodes(tree_index), vec![0, 3, 4, 1, 2]);
        assert_eq!(state.tree_grandparent(4), Some(0));
    }

}
