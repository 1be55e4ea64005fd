//! Primal Updater
//!
//! The four primal operations of Blossom V: grow, augment, shrink and expand. These are the only functions that change
//! the topology of the alternating forest.
//!
//! No operation calls another one directly. Grow, shrink and expand may discover a tight cross-tree (+, +) edge while
//! reclassifying edges; they return it and [`PrimalUpdater::run`] performs the augmentation afterwards, so the call
//! depth stays at one no matter how operations chain.
//!

use super::util::*;
use super::blossom_graph::*;
use super::mwpm_solver::SolverOptions;
use crate::serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub grow_num: usize,
    pub augment_num: usize,
    pub shrink_num: usize,
    pub expand_num: usize,
    pub dual_update_num: usize,
    /// the largest number of node pairs waiting in the recursive grow worklist
    pub grow_worklist_peak: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimalOperation {
    /// a tight (+, ∞) edge
    Grow(EdgeIndex),
    /// a tight cross-tree (+, +) edge
    Augment(EdgeIndex),
    /// a tight in-tree (+, +) edge
    Shrink(EdgeIndex),
    /// a MINUS blossom with zero true dual
    Expand(NodeIndex),
}

#[derive(Debug, Clone)]
pub struct PrimalUpdater {
    /// grow every tight (+, ∞) edge found while growing
    pub recursive_grow: bool,
    /// augment as soon as a tight cross-tree (+, +) edge shows up inside another operation
    pub immediate_augment: bool,
    /// panic if the recursive grow worklist exceeds this many node pairs
    pub max_grow_worklist: Option<usize>,
    pub statistics: Statistics,
}

impl PrimalUpdater {

    pub fn new(options: &SolverOptions) -> Self {
        Self {
            recursive_grow: options.recursive_grow,
            immediate_augment: options.immediate_augment,
            max_grow_worklist: options.max_grow_worklist,
            statistics: Statistics::default(),
        }
    }

    /// run one operation to completion, followed by the augmentation it requested if any; afterwards all scratch
    /// flags are dropped. The current edges of the tree being operated on must be set
    pub fn run(&mut self, state: &mut BlossomState, operation: PrimalOperation) {
        let augment_edge = match operation {
            PrimalOperation::Grow(edge_index) => self.grow(state, edge_index),
            PrimalOperation::Augment(edge_index) => {
                self.augment(state, edge_index);
                None
            },
            PrimalOperation::Shrink(edge_index) => self.shrink(state, edge_index).1,
            PrimalOperation::Expand(blossom) => self.expand(state, blossom),
        };
        if let Some(edge_index) = augment_edge {
            if self.immediate_augment {
                trace!("immediate augmentation on edge {} after {:?}", edge_index, operation);
                self.augment(state, edge_index);
            }
        }
        state.next_generation();
    }

    /*
     * grow
     */

    /// attach the free matched pair behind a tight (+, ∞) edge to the tree; with `recursive_grow` the sweep continues
    /// depth-first into further tight (+, ∞) edges of the new PLUS nodes. Stops early and returns the edge when a tight
    /// cross-tree (+, +) edge is found and immediate augmentation is enabled
    pub fn grow(&mut self, state: &mut BlossomState, edge_index: EdgeIndex) -> Option<EdgeIndex> {
        let head = state.edges[edge_index].head;
        let dir_to_minus = if state.nodes[head[0]].is_infinity() { 0 } else { 1 };
        let in_tree = head[1 - dir_to_minus];
        let mut minus = head[dir_to_minus];
        assert!(state.nodes[in_tree].is_plus() && state.nodes[minus].is_infinity(), "grow requires a (+, inf) edge, edge {}", edge_index);
        let tree = state.tree_of(in_tree);
        assert!(state.edges[edge_index].slack <= state.tree_eps(tree), "grow requires a tight edge, edge {}", edge_index);
        debug!("grow edge {} from node {} to node {}", edge_index, in_tree, minus);
        let mut plus = state.matched_partner(minus);
        let minus_matched = state.nodes[minus].matched.expect("free node must be matched");
        state.add_child(in_tree, minus, edge_index, true);
        state.add_child(minus, plus, minus_matched, true);
        let stop = plus;
        let mut pending: usize = 1;  // the pair being processed counts
        let mut augment_edge = None;
        loop {
            assert!(state.nodes[minus].is_infinity() && state.nodes[plus].is_infinity(),
                "node pair ({}, {}) is already labelled, the grow worklist aliases a finished node", minus, plus);
            state.nodes[minus].label = Label::Minus;
            state.nodes[plus].label = Label::Plus;
            state.set_marked(minus, false);
            state.set_marked(plus, false);
            pending -= 1;
            self.process_minus_node_grow(state, minus);
            let (candidate, newly_pending) = self.process_plus_node_grow(state, plus);
            self.statistics.grow_num += 1;
            pending += newly_pending;
            self.statistics.grow_worklist_peak = self.statistics.grow_worklist_peak.max(pending);
            if let Some(max_grow_worklist) = self.max_grow_worklist {
                assert!(pending <= max_grow_worklist, "grow worklist holds {} pairs, more than the limit {}", pending, max_grow_worklist);
            }
            if candidate.is_some() {
                augment_edge = candidate;
                if self.immediate_augment {
                    break
                }
            }
            // next pending pair in depth-first order below `stop`
            if let Some(child) = state.nodes[plus].first_tree_child {
                minus = child;
                plus = state.matched_partner(minus);
                continue
            }
            let mut current = plus;
            while current != stop && state.nodes[current].tree_sibling_next.is_none() {
                current = state.tree_parent(current).expect("grown node must have a parent");
            }
            if !state.nodes[current].is_minus() {
                break
            }
            minus = state.nodes[current].tree_sibling_next.expect("loop stops at a node with a next sibling");
            plus = state.matched_partner(minus);
        }
        augment_edge
    }

    fn process_minus_node_grow(&mut self, state: &mut BlossomState, minus: NodeIndex) {
        let tree = state.tree_of(minus);
        let eps = state.tree_eps(tree);
        state.nodes[minus].dual += eps;
        if state.nodes[minus].is_blossom {
            state.add_minus_blossom(tree, minus);
        }
        let partner = state.matched_partner(minus);
        for (edge_index, dir) in state.incident_edges(minus) {
            let opposite = state.edges[edge_index].head[dir];
            state.edges[edge_index].slack -= eps;
            if !state.nodes[opposite].is_plus() {
                continue
            }
            let opposite_tree = state.tree_of(opposite);
            if opposite_tree != tree {
                let (tree_edge_index, direction) = state.tree_edge_towards(tree, opposite_tree);
                state.remove_plus_infinity_edge(opposite_tree, edge_index);
                state.add_to_current_minus_plus_heap(tree_edge_index, edge_index, direction);
            } else if opposite != partner {
                state.remove_plus_infinity_edge(tree, edge_index);
            }
        }
    }

    /// returns a tight cross-tree (+, +) edge if found, and the number of free pairs queued for recursive growth
    fn process_plus_node_grow(&mut self, state: &mut BlossomState, plus: NodeIndex) -> (Option<EdgeIndex>, usize) {
        let tree = state.tree_of(plus);
        let eps = state.tree_eps(tree);
        state.nodes[plus].dual -= eps;
        let mut augment_edge = None;
        let mut newly_pending = 0;
        for (edge_index, dir) in state.incident_edges(plus) {
            let opposite = state.edges[edge_index].head[dir];
            state.edges[edge_index].slack += eps;
            match state.nodes[opposite].label {
                Label::Plus => {
                    let opposite_tree = state.tree_of(opposite);
                    if opposite_tree == tree {
                        state.remove_plus_infinity_edge(tree, edge_index);
                        state.add_plus_plus_edge(tree, edge_index);
                    } else {
                        let (tree_edge_index, _) = state.tree_edge_towards(tree, opposite_tree);
                        state.remove_plus_infinity_edge(opposite_tree, edge_index);
                        state.add_cross_plus_plus_edge(tree_edge_index, edge_index);
                        if state.edges[edge_index].slack <= eps + state.tree_eps(opposite_tree) {
                            augment_edge = Some(edge_index);
                        }
                    }
                },
                Label::Minus => {
                    let opposite_tree = state.tree_of(opposite);
                    if opposite_tree != tree {
                        let (tree_edge_index, direction) = state.tree_edge_towards(tree, opposite_tree);
                        state.add_to_current_plus_minus_heap(tree_edge_index, edge_index, direction);
                    }
                },
                Label::Infinity => {
                    state.add_plus_infinity_edge(tree, edge_index);
                    if self.recursive_grow && state.edges[edge_index].slack <= eps && !state.is_marked(opposite) {
                        let partner = state.matched_partner(opposite);
                        let opposite_matched = state.nodes[opposite].matched.expect("free node must be matched");
                        state.set_marked(opposite, true);
                        state.set_marked(partner, true);
                        state.add_child(plus, opposite, edge_index, true);
                        state.add_child(opposite, partner, opposite_matched, true);
                        newly_pending += 1;
                    }
                },
            }
        }
        (augment_edge, newly_pending)
    }

    /*
     * augment
     */

    /// flip the alternating paths from both endpoints of a tight cross-tree (+, +) edge to their roots and dissolve both trees
    pub fn augment(&mut self, state: &mut BlossomState, edge_index: EdgeIndex) {
        let head = state.edges[edge_index].head;
        assert!(state.nodes[head[0]].is_plus() && state.nodes[head[1]].is_plus(), "augment requires a (+, +) edge, edge {}", edge_index);
        let trees = [state.tree_of(head[0]), state.tree_of(head[1])];
        assert_ne!(trees[0], trees[1], "augment requires a cross-tree edge, edge {}", edge_index);
        assert!(state.edges[edge_index].slack <= state.tree_eps(trees[0]) + state.tree_eps(trees[1]),
            "augment requires a tight edge, edge {}", edge_index);
        debug!("augment edge {} between trees {} and {}", edge_index, trees[0], trees[1]);
        for node in head {
            self.augment_branch(state, node, edge_index);
            state.nodes[node].matched = Some(edge_index);
        }
        self.statistics.augment_num += 1;
    }

    fn augment_branch(&mut self, state: &mut BlossomState, first: NodeIndex, augment_edge: EdgeIndex) {
        let tree = state.tree_of(first);
        let eps = state.tree_eps(tree);
        let root = state.tree(tree).root;
        for node in state.tree_nodes(tree) {
            if state.is_marked(node) {
                // queued by an interrupted recursive grow, still a free matched node
                state.set_marked(node, false);
                state.nodes[node].tree = None;
                continue
            }
            let is_plus = state.nodes[node].is_plus();
            if is_plus {
                state.nodes[node].dual += eps;
            } else {
                state.nodes[node].dual -= eps;
            }
            for (edge_index, dir) in state.incident_edges(node) {
                let opposite = state.edges[edge_index].head[dir];
                let opposite_tree = match (state.nodes[opposite].label, state.nodes[opposite].tree) {
                    (Label::Infinity, _) => None,
                    (_, opposite_tree) => opposite_tree.filter(|&opposite_tree| opposite_tree != tree),
                };
                if is_plus {
                    state.edges[edge_index].slack -= eps;
                    if let Some(opposite_tree) = opposite_tree {
                        if state.nodes[opposite].is_plus() {
                            state.remove_cross_plus_plus_edge(edge_index);
                            state.add_plus_infinity_edge(opposite_tree, edge_index);
                        } else {
                            state.remove_cross_plus_minus_edge(edge_index);
                        }
                    }
                } else {
                    state.edges[edge_index].slack += eps;
                    if let Some(opposite_tree) = opposite_tree {
                        if state.nodes[opposite].is_plus() {
                            state.remove_cross_plus_minus_edge(edge_index);
                            state.add_plus_infinity_edge(opposite_tree, edge_index);
                        }
                    }
                }
            }
            state.nodes[node].label = Label::Infinity;
            state.nodes[node].tree = None;
        }
        state.remove_tree_edges(tree);
        // flip the matching along the path from `first` to the root
        let mut matched = augment_edge;
        let mut plus = first;
        let mut minus = state.tree_parent(plus);
        while let Some(minus_node) = minus {
            state.nodes[plus].matched = Some(matched);
            matched = state.nodes[minus_node].parent_edge.expect("non-root tree node must have a parent edge");
            state.nodes[minus_node].matched = Some(matched);
            plus = state.tree_parent(minus_node).expect("MINUS node must have a parent");
            minus = state.tree_parent(plus);
        }
        debug_assert_eq!(plus, root);
        state.nodes[root].matched = Some(matched);
        state.nodes[root].is_tree_root = false;
        state.dissolve_tree(tree);
    }

    /*
     * shrink
     */

    /// contract the odd circuit closed by a tight in-tree (+, +) edge into a new PLUS blossom; returns the blossom and
    /// a tight cross-tree (+, +) edge if one appeared
    pub fn shrink(&mut self, state: &mut BlossomState, edge_index: EdgeIndex) -> (NodeIndex, Option<EdgeIndex>) {
        let head = state.edges[edge_index].head;
        assert!(state.nodes[head[0]].is_plus() && state.nodes[head[1]].is_plus(), "shrink requires a (+, +) edge, edge {}", edge_index);
        let tree = state.tree_of(head[0]);
        assert_eq!(state.tree_of(head[1]), tree, "shrink requires an in-tree edge, edge {}", edge_index);
        let eps = state.tree_eps(tree);
        assert!(state.edges[edge_index].slack <= 2. * eps, "shrink requires a tight edge, edge {}", edge_index);
        let blossom_root = self.find_blossom_root(state, edge_index);
        let blossom = state.nodes.len();
        debug!("shrink edge {} into blossom {} rooted at node {}", edge_index, blossom, blossom_root);
        let mut blossom_node = Node::new_blossom(tree, -eps);
        blossom_node.is_tree_root = state.nodes[blossom_root].is_tree_root;
        if blossom_node.is_tree_root {
            state.tree_mut(tree).root = blossom;
        } else {
            blossom_node.matched = state.nodes[blossom_root].matched;
        }
        state.nodes.push(blossom_node);
        let circuit = Self::circuit_nodes(state, edge_index, blossom_root);
        for &(node, _) in circuit.iter() {
            state.set_marked(node, true);
        }
        let augment_edge = self.update_tree_structure(state, blossom_root, blossom, &circuit);
        Self::set_blossom_siblings(state, edge_index, &circuit);
        for &(node, _) in circuit.iter() {
            state.set_marked(node, false);
            state.set_processed(node, false);
        }
        state.nodes[blossom_root].matched = None;
        state.blossom_num += 1;
        self.statistics.shrink_num += 1;
        (blossom, augment_edge)
    }

    /// lowest common ancestor of the endpoints, found by climbing two levels at a time alternately from both sides;
    /// also flags every node of the circuit as inner
    pub fn find_blossom_root(&mut self, state: &mut BlossomState, edge_index: EdgeIndex) -> NodeIndex {
        let head = state.edges[edge_index].head;
        let mut endpoints = head;
        let mut branch = 0;
        let (root, upper_bound) = loop {
            if state.is_marked(endpoints[branch]) {
                break (endpoints[branch], endpoints[1 - branch])
            }
            state.set_marked(endpoints[branch], true);
            if state.nodes[endpoints[branch]].is_tree_root {
                let mut jump = endpoints[1 - branch];
                while !state.is_marked(jump) {
                    jump = state.tree_grandparent(jump).expect("the tree root is marked, so the climb stops below it");
                }
                break (jump, endpoints[branch])
            }
            endpoints[branch] = state.tree_grandparent(endpoints[branch]).expect("non-root PLUS node has a grandparent");
            branch = 1 - branch;
        };
        let mut jump = root;
        while jump != upper_bound {
            jump = state.tree_grandparent(jump).expect("upper bound lies above the blossom root");
            state.set_marked(jump, false);
        }
        for endpoint in head {
            let mut current = endpoint;
            while current != root {
                state.set_marked(current, false);
                state.nodes[current].is_outer = false;
                current = state.tree_parent(current).expect("circuit node below the root has a parent");
            }
        }
        state.set_marked(root, false);
        state.nodes[root].is_outer = false;
        root
    }

    /// `head[0]` up to and including the root with direction 0, then `head[1]` up to but excluding the root with direction 1
    fn circuit_nodes(state: &BlossomState, edge_index: EdgeIndex, blossom_root: NodeIndex) -> Vec<(NodeIndex, usize)> {
        let head = state.edges[edge_index].head;
        let mut circuit = vec![];
        let mut current = head[0];
        loop {
            circuit.push((current, 0));
            if current == blossom_root {
                break
            }
            current = state.tree_parent(current).expect("circuit node below the root has a parent");
        }
        let mut current = head[1];
        while current != blossom_root {
            circuit.push((current, 1));
            current = state.tree_parent(current).expect("circuit node below the root has a parent");
        }
        circuit
    }

    /// detach every circuit node from the tree and hang its children and boundary edges on the blossom; the blossom
    /// root goes last because both circuit neighbours must leave its child list first
    fn update_tree_structure(&mut self, state: &mut BlossomState, blossom_root: NodeIndex, blossom: NodeIndex
            , circuit: &[(NodeIndex, usize)]) -> Option<EdgeIndex> {
        let mut augment_edge = None;
        for &(node, _) in circuit.iter() {
            if node != blossom_root {
                if state.nodes[node].is_plus() {
                    state.remove_from_child_list(node);
                    state.move_children_to(node, blossom);
                    if let Some(edge_index) = self.shrink_plus_node(state, node, blossom) {
                        augment_edge = Some(edge_index);
                    }
                    state.set_processed(node, true);
                } else {
                    if state.nodes[node].is_blossom {
                        state.remove_minus_blossom(node);
                    }
                    state.remove_from_child_list(node);  // its only child is on the circuit
                    self.shrink_minus_node(state, node, blossom);
                }
            }
            state.nodes[node].blossom_parent = Some(blossom);
            state.nodes[node].blossom_grandparent = Some(blossom);
        }
        if !state.nodes[blossom_root].is_tree_root {
            let parent = state.tree_parent(blossom_root).expect("non-root node has a parent");
            let parent_edge = state.nodes[blossom_root].parent_edge.expect("non-root node has a parent edge");
            state.remove_from_child_list(blossom_root);
            state.add_child(parent, blossom, parent_edge, false);
        }
        state.move_children_to(blossom_root, blossom);
        if let Some(edge_index) = self.shrink_plus_node(state, blossom_root, blossom) {
            augment_edge = Some(edge_index);
        }
        state.nodes[blossom_root].is_tree_root = false;
        augment_edge
    }

    fn shrink_plus_node(&mut self, state: &mut BlossomState, plus: NodeIndex, blossom: NodeIndex) -> Option<EdgeIndex> {
        let tree = state.tree_of(plus);
        let eps = state.tree_eps(tree);
        state.nodes[plus].dual += eps;
        let mut augment_edge = None;
        for (edge_index, dir) in state.incident_edges(plus) {
            let opposite = state.edges[edge_index].head[dir];
            if !state.is_marked(opposite) {
                state.move_edge_tail(plus, blossom, edge_index);
                if state.nodes[opposite].is_plus() {
                    let opposite_tree = state.tree_of(opposite);
                    if opposite_tree != tree && state.edges[edge_index].slack <= eps + state.tree_eps(opposite_tree) {
                        augment_edge = Some(edge_index);
                    }
                }
            } else if state.nodes[opposite].is_plus() {
                if !state.is_processed(opposite) {
                    state.remove_plus_plus_edge(tree, edge_index);
                }
                state.edges[edge_index].slack -= eps;
            }
        }
        augment_edge
    }

    fn shrink_minus_node(&mut self, state: &mut BlossomState, minus: NodeIndex, blossom: NodeIndex) {
        let tree = state.tree_of(minus);
        let eps = state.tree_eps(tree);
        state.nodes[minus].dual -= eps;
        for (edge_index, dir) in state.incident_edges(minus) {
            let opposite = state.edges[edge_index].head[dir];
            if !state.is_marked(opposite) {
                state.move_edge_tail(minus, blossom, edge_index);
                state.edges[edge_index].slack += 2. * eps;
                match state.nodes[opposite].label {
                    Label::Plus => {
                        let opposite_tree = state.tree_of(opposite);
                        if opposite_tree == tree {
                            state.add_plus_plus_edge(tree, edge_index);
                        } else {
                            let (tree_edge_index, _) = state.tree_edge_towards(tree, opposite_tree);
                            state.remove_cross_plus_minus_edge(edge_index);
                            state.add_cross_plus_plus_edge(tree_edge_index, edge_index);
                        }
                    },
                    Label::Minus => {
                        let opposite_tree = state.tree_of(opposite);
                        if opposite_tree != tree {
                            let (tree_edge_index, direction) = state.tree_edge_towards(tree, opposite_tree);
                            state.add_to_current_plus_minus_heap(tree_edge_index, edge_index, direction);
                        }
                    },
                    Label::Infinity => {
                        state.add_plus_infinity_edge(tree, edge_index);
                    },
                }
            } else if state.nodes[opposite].is_minus() {
                state.edges[edge_index].slack += eps;
            }
        }
    }

    /// link the circuit into a ring of `blossom_sibling` edges: on the first branch each node points at the edge below
    /// it, on the second branch at its own parent edge
    fn set_blossom_siblings(state: &mut BlossomState, edge_index: EdgeIndex, circuit: &[(NodeIndex, usize)]) {
        let mut prev_edge = edge_index;
        for &(node, dir) in circuit.iter() {
            if dir == 0 {
                state.nodes[node].blossom_sibling = Some(prev_edge);
                if let Some(parent_edge) = state.nodes[node].parent_edge {
                    prev_edge = parent_edge;
                }
            } else {
                state.nodes[node].blossom_sibling = state.nodes[node].parent_edge;
            }
        }
    }

    /*
     * expand
     */

    fn sibling_next(state: &BlossomState, node: NodeIndex) -> NodeIndex {
        let sibling = state.nodes[node].blossom_sibling.expect("circuit node must have a blossom sibling");
        state.opposite(sibling, node)
    }

    /// bring the circuit of a MINUS blossom with zero true dual back to the surface: the even branch between the node
    /// matched outside and the node the parent edge enters joins the tree, the odd branch becomes free matched pairs
    pub fn expand(&mut self, state: &mut BlossomState, blossom: NodeIndex) -> Option<EdgeIndex> {
        let node = &state.nodes[blossom];
        assert!(node.is_blossom && node.is_outer && node.is_minus(), "only an outer MINUS blossom can be expanded, node {}", blossom);
        let tree = state.tree_of(blossom);
        let eps = state.tree_eps(tree);
        assert!(node.dual <= eps, "blossom {} still has a positive dual", blossom);
        debug!("expand blossom {}", blossom);
        let parent_edge = node.parent_edge.expect("MINUS node has a parent edge");
        let matched = node.matched.expect("MINUS node is matched");
        let parent_original = state.current_original(parent_edge, blossom);
        let branches_endpoint = state.penultimate_blossom(parent_original);
        let matched_original = state.current_original(matched, blossom);
        let blossom_root = state.penultimate_blossom(matched_original);
        state.nodes[blossom].dual -= eps;
        state.remove_minus_blossom(blossom);
        state.remove_from_child_list(blossom);
        for (edge_index, dir) in state.incident_edges(blossom) {
            let penultimate = state.penultimate_blossom(state.edges[edge_index].head_original[1 - dir]);
            state.move_edge_tail(blossom, penultimate, edge_index);
        }
        let mut current = blossom_root;
        loop {
            state.set_marked(current, true);
            current = Self::sibling_next(state, current);
            if current == blossom_root {
                break
            }
        }
        // orient the ring so that the even branch runs forward from the blossom root
        let mut hops = 0;
        let mut current = blossom_root;
        while current != branches_endpoint {
            hops += 1;
            current = Self::sibling_next(state, current);
        }
        if hops % 2 == 1 {
            Self::reverse_blossom_siblings(state, blossom_root);
        }
        self.expand_odd_branch(state, tree, blossom_root, branches_endpoint);
        let augment_edge = self.expand_even_branch(state, tree, blossom_root, branches_endpoint, blossom);
        let mut current = blossom_root;
        loop {
            state.set_marked(current, false);
            state.set_processed(current, false);
            current = Self::sibling_next(state, current);
            if current == blossom_root {
                break
            }
        }
        let node = &mut state.nodes[blossom];
        node.is_removed = true;
        node.is_outer = false;
        node.label = Label::Infinity;
        node.tree = None;
        node.first_tree_child = None;
        state.blossom_num -= 1;
        state.removed_num += 1;
        self.statistics.expand_num += 1;
        augment_edge
    }

    fn reverse_blossom_siblings(state: &mut BlossomState, start: NodeIndex) {
        let mut prev_edge = state.nodes[start].blossom_sibling.expect("circuit node must have a blossom sibling");
        let mut current = start;
        loop {
            current = state.opposite(prev_edge, current);
            let reversed = prev_edge;
            prev_edge = state.nodes[current].blossom_sibling.expect("circuit node must have a blossom sibling");
            state.nodes[current].blossom_sibling = Some(reversed);
            if current == start {
                break
            }
        }
    }

    fn expand_odd_branch(&mut self, state: &mut BlossomState, tree: TreeIndex, blossom_root: NodeIndex, branches_endpoint: NodeIndex) {
        let mut current = Self::sibling_next(state, branches_endpoint);
        while current != blossom_root {
            let pair_edge = state.nodes[current].blossom_sibling.expect("circuit node must have a blossom sibling");
            let partner = state.opposite(pair_edge, current);
            for node in [current, partner] {
                let node_ref = &mut state.nodes[node];
                node_ref.label = Label::Infinity;
                node_ref.is_outer = true;
                node_ref.tree = None;
                node_ref.matched = Some(pair_edge);
                self.expand_infinity_node(state, tree, node);
            }
            current = Self::sibling_next(state, partner);
        }
    }

    fn expand_infinity_node(&mut self, state: &mut BlossomState, tree: TreeIndex, node: NodeIndex) {
        let eps = state.tree_eps(tree);
        for (edge_index, dir) in state.incident_edges(node) {
            let opposite = state.edges[edge_index].head[dir];
            if state.is_marked(opposite) {
                continue
            }
            state.edges[edge_index].slack += eps;
            if state.nodes[opposite].is_plus() {
                let opposite_tree = state.tree_of(opposite);
                if opposite_tree != tree {
                    state.remove_cross_plus_minus_edge(edge_index);
                }
                state.add_plus_infinity_edge(opposite_tree, edge_index);
            }
        }
    }

    fn expand_even_branch(&mut self, state: &mut BlossomState, tree: TreeIndex, blossom_root: NodeIndex, branches_endpoint: NodeIndex
            , blossom: NodeIndex) -> Option<EdgeIndex> {
        let blossom_matched = state.nodes[blossom].matched.expect("MINUS node is matched");
        let blossom_parent_edge = state.nodes[blossom].parent_edge.expect("MINUS node has a parent edge");
        // first pass: labels, matching and tree structure, walking upwards from the blossom root
        for node in [blossom_root, branches_endpoint] {
            assert!(!state.nodes[node].is_outer && state.is_marked(node), "even branch node {} is already on the surface", node);
        }
        state.nodes[blossom_root].matched = Some(blossom_matched);
        state.nodes[blossom_root].tree = Some(tree);
        state.nodes[blossom_root].first_tree_child = None;  // a circuit node keeps its child list from the shrink
        let child = state.opposite(blossom_matched, blossom_root);
        state.add_child(blossom_root, child, blossom_matched, false);
        let mut current = blossom_root;
        let mut prev = current;
        state.nodes[current].label = Label::Minus;
        state.nodes[current].is_outer = true;
        state.nodes[current].parent_edge = Some(blossom_parent_edge);
        while current != branches_endpoint {
            current = Self::sibling_next(state, current);
            let plus_matched = state.nodes[current].blossom_sibling.expect("circuit node must have a blossom sibling");
            Self::surface_even_node(state, current, tree, Label::Plus, plus_matched);
            let prev_sibling = state.nodes[prev].blossom_sibling.expect("circuit node must have a blossom sibling");
            state.add_child(current, prev, prev_sibling, false);
            prev = current;
            current = Self::sibling_next(state, current);
            Self::surface_even_node(state, current, tree, Label::Minus, plus_matched);
            let prev_sibling = state.nodes[prev].blossom_sibling.expect("circuit node must have a blossom sibling");
            state.add_child(current, prev, prev_sibling, false);
            prev = current;
        }
        let outside_parent = state.opposite(blossom_parent_edge, branches_endpoint);
        state.add_child(outside_parent, branches_endpoint, blossom_parent_edge, false);
        // second pass: duals, slacks and heaps, which need the final labels of the whole branch
        let mut augment_edge = None;
        let mut current = blossom_root;
        self.expand_minus_node(state, current);
        while current != branches_endpoint {
            current = Self::sibling_next(state, current);
            if let Some(edge_index) = self.expand_plus_node(state, current) {
                augment_edge = Some(edge_index);
            }
            state.set_processed(current, true);
            current = Self::sibling_next(state, current);
            self.expand_minus_node(state, current);
        }
        augment_edge
    }

    fn surface_even_node(state: &mut BlossomState, node: NodeIndex, tree: TreeIndex, label: Label, matched: EdgeIndex) {
        assert!(!state.nodes[node].is_outer && state.is_marked(node), "even branch node {} is already on the surface", node);
        let node_ref = &mut state.nodes[node];
        node_ref.label = label;
        node_ref.is_outer = true;
        node_ref.is_tree_root = false;
        node_ref.tree = Some(tree);
        node_ref.matched = Some(matched);
        node_ref.first_tree_child = None;
    }

    fn expand_minus_node(&mut self, state: &mut BlossomState, minus: NodeIndex) {
        let tree = state.tree_of(minus);
        let eps = state.tree_eps(tree);
        state.nodes[minus].dual += eps;
        if state.nodes[minus].is_blossom {
            state.add_minus_blossom(tree, minus);
        }
        for (edge_index, dir) in state.incident_edges(minus) {
            let opposite = state.edges[edge_index].head[dir];
            if state.is_marked(opposite) && !state.nodes[opposite].is_plus() {
                state.edges[edge_index].slack -= eps;
            }
        }
    }

    fn expand_plus_node(&mut self, state: &mut BlossomState, plus: NodeIndex) -> Option<EdgeIndex> {
        let tree = state.tree_of(plus);
        let eps = state.tree_eps(tree);
        state.nodes[plus].dual -= eps;
        let mut augment_edge = None;
        for (edge_index, dir) in state.incident_edges(plus) {
            let opposite = state.edges[edge_index].head[dir];
            let (marked, processed) = (state.is_marked(opposite), state.is_processed(opposite));
            let label = state.nodes[opposite].label;
            if !marked || (label == Label::Plus && !processed) {
                state.edges[edge_index].slack += 2. * eps;
            } else if label == Label::Infinity {
                state.edges[edge_index].slack += eps;
            }
            match label {
                Label::Plus => {
                    let opposite_tree = state.tree_of(opposite);
                    if opposite_tree == tree {
                        if !processed {
                            state.add_plus_plus_edge(tree, edge_index);
                        }
                    } else {
                        let (tree_edge_index, _) = state.tree_edge_towards(tree, opposite_tree);
                        state.remove_cross_plus_minus_edge(edge_index);
                        state.add_cross_plus_plus_edge(tree_edge_index, edge_index);
                        if state.edges[edge_index].slack <= eps + state.tree_eps(opposite_tree) {
                            augment_edge = Some(edge_index);
                        }
                    }
                },
                Label::Minus => {
                    let opposite_tree = state.tree_of(opposite);
                    if opposite_tree != tree {
                        let (tree_edge_index, direction) = state.tree_edge_towards(tree, opposite_tree);
                        state.add_to_current_plus_minus_heap(tree_edge_index, edge_index, direction);
                    }
                },
                Label::Infinity => {
                    state.add_plus_infinity_edge(tree, edge_index);
                },
            }
        }
        augment_edge
    }

}
