//! Blossom Graph
//!
//! The node and edge arena that every primal operation mutates. Nodes are either original vertices or blossom
//! pseudo-nodes created by shrink; all links between them are integer handles into the arena.
//!
//! An edge stored in the incident list `first[dir]` of node `n` has `head[1 - dir] == n`; its opposite endpoint is
//! therefore `head[dir]`. These lists are circular and doubly linked through `next[dir]` and `prev[dir]`.
//!

use super::util::*;
use super::alternating_tree::*;
use super::visualize::*;
use crate::derivative::Derivative;
use crate::serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    /// even distance from the root of its alternating tree
    Plus,
    /// odd distance from the root of its alternating tree
    Minus,
    /// not in any tree
    Infinity,
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Node {
    pub label: Label,
    /// the stored dual; the true dual of an outer tree node is `dual + eps` if PLUS and `dual - eps` if MINUS
    pub dual: Weight,
    pub is_blossom: bool,
    /// false once the node is contracted into a blossom
    pub is_outer: bool,
    pub is_tree_root: bool,
    /// an expanded blossom, kept in the arena so that its index stays valid
    pub is_removed: bool,
    /// scratch flags are stamped with the generation in which they were set, see [`BlossomState::next_generation`]
    #[derivative(Debug="ignore")]
    mark_stamp: usize,
    #[derivative(Debug="ignore")]
    processed_stamp: usize,
    pub tree: Option<TreeIndex>,
    pub matched: Option<EdgeIndex>,
    /// the edge to the tree parent; ignored for the tree root
    pub parent_edge: Option<EdgeIndex>,
    pub first_tree_child: Option<NodeIndex>,
    pub tree_sibling_next: Option<NodeIndex>,
    /// the `prev` pointer of the first child points to the last child
    pub tree_sibling_prev: Option<NodeIndex>,
    /// the edge to the next node on the odd circuit of the blossom that contains this node
    pub blossom_sibling: Option<EdgeIndex>,
    pub blossom_parent: Option<NodeIndex>,
    /// shortcut to some ancestor in the blossom hierarchy, compressed by [`BlossomState::penultimate_blossom`]
    pub blossom_grandparent: Option<NodeIndex>,
    /// heads of the two circular incident-edge lists
    pub first: [Option<EdgeIndex>; 2],
    /// the tree whose minus-blossom heap currently holds this node
    pub minus_heap: Option<TreeIndex>,
}

impl Node {

    pub fn new_vertex(dual: Weight) -> Self {
        Self {
            label: Label::Infinity,
            dual,
            is_blossom: false,
            is_outer: true,
            is_tree_root: false,
            is_removed: false,
            mark_stamp: 0,
            processed_stamp: 0,
            tree: None,
            matched: None,
            parent_edge: None,
            first_tree_child: None,
            tree_sibling_next: None,
            tree_sibling_prev: None,
            blossom_sibling: None,
            blossom_parent: None,
            blossom_grandparent: None,
            first: [None, None],
            minus_heap: None,
        }
    }

    pub fn new_blossom(tree: TreeIndex, dual: Weight) -> Self {
        Self {
            label: Label::Plus,
            is_blossom: true,
            tree: Some(tree),
            ..Self::new_vertex(dual)
        }
    }

    pub fn is_plus(&self) -> bool { self.label == Label::Plus }
    pub fn is_minus(&self) -> bool { self.label == Label::Minus }
    pub fn is_infinity(&self) -> bool { self.label == Label::Infinity }

}

#[derive(Debug, Clone)]
pub struct Edge {
    pub weight: Weight,
    /// reduced cost, stale by the eps of the trees its endpoints belong to
    pub slack: Weight,
    /// current endpoints, which move up and down the blossom hierarchy
    pub head: [NodeIndex; 2],
    /// the original vertices this edge connects
    pub head_original: [NodeIndex; 2],
    pub next: [EdgeIndex; 2],
    pub prev: [EdgeIndex; 2],
    /// the heap that currently holds this edge
    pub heap: Option<EdgeHeap>,
}

impl Edge {

    /// `head[1 - dir]` is the vertex that will list this edge in its incident list `first[dir]`
    pub fn new(index: EdgeIndex, head: [VertexIndex; 2], weight: Weight, slack: Weight) -> Self {
        Self {
            weight,
            slack,
            head,
            head_original: head,
            next: [index, index],
            prev: [index, index],
            heap: None,
        }
    }

}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct BlossomState {
    pub vertex_num: VertexNum,
    /// vertices first, then blossoms in creation order
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// `None` once the tree is dissolved by an augmentation
    pub trees: Vec<Option<Tree>>,
    /// `None` once either tree of the pair is dissolved
    pub tree_edges: Vec<Option<TreeEdge>>,
    /// number of live trees
    pub tree_num: usize,
    /// number of blossoms that are not expanded yet
    pub blossom_num: usize,
    /// number of expanded blossoms
    pub removed_num: usize,
    /// scratch flags stamped with an older generation are considered cleared
    #[derivative(Debug="ignore")]
    generation: usize,
}

impl BlossomState {

    /// build the vertices and edges; trees are created by the solver afterwards
    pub fn new(initializer: &SolverInitializer, initial_dual: Weight) -> Self {
        let vertex_num = initializer.vertex_num;
        let nodes: Vec<Node> = (0..vertex_num).map(|_| Node::new_vertex(initial_dual)).collect();
        let mut state = Self {
            vertex_num,
            nodes,
            edges: Vec::with_capacity(initializer.weighted_edges.len()),
            trees: vec![],
            tree_edges: vec![],
            tree_num: 0,
            blossom_num: 0,
            removed_num: 0,
            generation: 1,
        };
        for (edge_index, &(u, v, weight)) in initializer.weighted_edges.iter().enumerate() {
            let slack = weight - 2. * initial_dual;
            // `u` keeps the edge in `first[0]` and `v` in `first[1]`, so `v` is the opposite endpoint seen from `u`
            state.edges.push(Edge::new(edge_index, [v, u], weight, slack));
            state.add_edge(u, edge_index, 0);
            state.add_edge(v, edge_index, 1);
            debug_assert_eq!(state.edges[edge_index].head, state.edges[edge_index].head_original);
        }
        state
    }

    /*
     * scratch flags
     */

    pub fn is_marked(&self, node: NodeIndex) -> bool {
        self.nodes[node].mark_stamp == self.generation
    }

    pub fn set_marked(&mut self, node: NodeIndex, marked: bool) {
        self.nodes[node].mark_stamp = if marked { self.generation } else { 0 };
    }

    pub fn is_processed(&self, node: NodeIndex) -> bool {
        self.nodes[node].processed_stamp == self.generation
    }

    pub fn set_processed(&mut self, node: NodeIndex, processed: bool) {
        self.nodes[node].processed_stamp = if processed { self.generation } else { 0 };
    }

    /// implicitly clear every mark and processed flag
    pub fn next_generation(&mut self) {
        if self.generation == usize::MAX {  // rarely happens
            self.generation = 0;
            for node in self.nodes.iter_mut() {
                node.mark_stamp = 0;
                node.processed_stamp = 0;
            }
        }
        self.generation += 1;
    }

    /*
     * edges
     */

    pub fn opposite(&self, edge_index: EdgeIndex, node: NodeIndex) -> NodeIndex {
        let head = &self.edges[edge_index].head;
        debug_assert!(head[0] == node || head[1] == node, "node {} is not an endpoint of edge {}", node, edge_index);
        if head[0] == node { head[1] } else { head[0] }
    }

    /// the original vertex of the edge on the side of `endpoint`
    pub fn current_original(&self, edge_index: EdgeIndex, endpoint: NodeIndex) -> NodeIndex {
        let edge = &self.edges[edge_index];
        debug_assert!(edge.head[0] == endpoint || edge.head[1] == endpoint);
        if edge.head[0] == endpoint { edge.head_original[0] } else { edge.head_original[1] }
    }

    /// append `edge_index` to the incident list `first[dir]` of `node` and make `node` its `head[1 - dir]`
    pub fn add_edge(&mut self, node: NodeIndex, edge_index: EdgeIndex, dir: usize) {
        match self.nodes[node].first[dir] {
            None => {
                self.nodes[node].first[dir] = Some(edge_index);
                let edge = &mut self.edges[edge_index];
                edge.next[dir] = edge_index;
                edge.prev[dir] = edge_index;
            },
            Some(first) => {
                let last = self.edges[first].prev[dir];
                self.edges[edge_index].prev[dir] = last;
                self.edges[edge_index].next[dir] = first;
                self.edges[last].next[dir] = edge_index;
                self.edges[first].prev[dir] = edge_index;
            },
        }
        self.edges[edge_index].head[1 - dir] = node;
    }

    pub fn remove_edge(&mut self, node: NodeIndex, edge_index: EdgeIndex, dir: usize) {
        let (prev, next) = (self.edges[edge_index].prev[dir], self.edges[edge_index].next[dir]);
        if prev == edge_index {
            self.nodes[node].first[dir] = None;
        } else {
            self.edges[prev].next[dir] = next;
            self.edges[next].prev[dir] = prev;
            if self.nodes[node].first[dir] == Some(edge_index) {
                self.nodes[node].first[dir] = Some(next);
            }
        }
    }

    /// move the endpoint `from` of the edge to `to`, e.g. from a circuit node to its new blossom
    pub fn move_edge_tail(&mut self, from: NodeIndex, to: NodeIndex, edge_index: EdgeIndex) {
        let dir = if self.edges[edge_index].head[0] == from { 1 } else { 0 };
        debug_assert_eq!(self.edges[edge_index].head[1 - dir], from);
        self.remove_edge(from, edge_index, dir);
        self.add_edge(to, edge_index, dir);
    }

    /// snapshot of `(edge, dir)` pairs incident to the node, where `edges[edge].head[dir]` is the opposite endpoint;
    /// taken before iterating so that callers may move edges meanwhile
    pub fn incident_edges(&self, node: NodeIndex) -> Vec<(EdgeIndex, usize)> {
        let mut result = vec![];
        for dir in 0..2 {
            if let Some(first) = self.nodes[node].first[dir] {
                let mut edge_index = first;
                loop {
                    result.push((edge_index, dir));
                    edge_index = self.edges[edge_index].next[dir];
                    if edge_index == first {
                        break
                    }
                }
            }
        }
        result
    }

    /*
     * alternating tree structure
     */

    pub fn tree_of(&self, node: NodeIndex) -> TreeIndex {
        self.nodes[node].tree.expect("node must belong to a tree")
    }

    pub fn tree_parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        if self.nodes[node].is_tree_root {
            return None
        }
        self.nodes[node].parent_edge.map(|parent_edge| self.opposite(parent_edge, node))
    }

    pub fn tree_grandparent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.tree_parent(node).and_then(|parent| self.tree_parent(parent))
    }

    /// the other endpoint of the matched edge
    pub fn matched_partner(&self, node: NodeIndex) -> NodeIndex {
        let matched = self.nodes[node].matched.expect("node must be matched");
        self.opposite(matched, node)
    }

    /// push `child` to the front of the child list of `parent`; `grow` resets the stale child list of a node that just joined a tree
    pub fn add_child(&mut self, parent: NodeIndex, child: NodeIndex, parent_edge: EdgeIndex, grow: bool) {
        let first = self.nodes[parent].first_tree_child;
        let parent_tree = self.nodes[parent].tree;
        // the child list is circular in the prev direction, so the first child knows the last one
        let last = match first {
            Some(first) => self.nodes[first].tree_sibling_prev,
            None => Some(child),
        };
        let child_node = &mut self.nodes[child];
        child_node.parent_edge = Some(parent_edge);
        child_node.tree = parent_tree;
        child_node.tree_sibling_next = first;
        child_node.tree_sibling_prev = last;
        if grow {
            child_node.first_tree_child = None;
        }
        if let Some(first) = first {
            self.nodes[first].tree_sibling_prev = Some(child);
        }
        self.nodes[parent].first_tree_child = Some(child);
    }

    /// unlink the node from the child list of its tree parent; must run while the parent edge still points at the node
    pub fn remove_from_child_list(&mut self, node: NodeIndex) {
        if self.nodes[node].is_tree_root {
            return
        }
        let parent = self.tree_parent(node).expect("non-root tree node must have a parent");
        let prev = self.nodes[node].tree_sibling_prev.expect("child list is circular in the prev direction");
        let next = self.nodes[node].tree_sibling_next;
        if self.nodes[prev].tree_sibling_next.is_none() {  // node is the first child
            self.nodes[parent].first_tree_child = next;
        } else {
            self.nodes[prev].tree_sibling_next = next;
        }
        match next {
            None => {  // node is the last child
                if let Some(first) = self.nodes[parent].first_tree_child {
                    self.nodes[first].tree_sibling_prev = Some(prev);
                }
            },
            Some(next) => {
                self.nodes[next].tree_sibling_prev = Some(prev);
            },
        }
    }

    /// append all children of `from` to the child list of `to`; the parent edges are moved separately
    pub fn move_children_to(&mut self, from: NodeIndex, to: NodeIndex) {
        let Some(first) = self.nodes[from].first_tree_child else { return };
        match self.nodes[to].first_tree_child {
            None => {
                self.nodes[to].first_tree_child = Some(first);
            },
            Some(to_first) => {
                let to_last = self.nodes[to_first].tree_sibling_prev.expect("child list is circular in the prev direction");
                let from_last = self.nodes[first].tree_sibling_prev;
                self.nodes[to_last].tree_sibling_next = Some(first);
                self.nodes[to_first].tree_sibling_prev = from_last;
                self.nodes[first].tree_sibling_prev = Some(to_last);
            },
        }
        self.nodes[from].first_tree_child = None;
    }

    pub fn tree_children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children = vec![];
        let mut child = self.nodes[node].first_tree_child;
        while let Some(current) = child {
            children.push(current);
            child = self.nodes[current].tree_sibling_next;
        }
        children
    }

    /// true dual of a node: the lazy eps of its tree applies to outer nodes only, shrink has already settled the
    /// duals of inner nodes
    pub fn true_dual(&self, node: NodeIndex) -> Weight {
        let node_ref = &self.nodes[node];
        if !node_ref.is_outer {
            return node_ref.dual
        }
        match (node_ref.label, node_ref.tree) {
            (Label::Plus, Some(tree)) => node_ref.dual + self.tree_eps(tree),
            (Label::Minus, Some(tree)) => node_ref.dual - self.tree_eps(tree),
            _ => node_ref.dual,
        }
    }

    /*
     * blossom hierarchy
     */

    /// the child of the outer blossom that contains `node`, i.e. the last ancestor before reaching an outer node;
    /// compresses `blossom_grandparent` of every node visited on the way
    pub fn penultimate_blossom(&mut self, node: NodeIndex) -> NodeIndex {
        debug_assert!(!self.nodes[node].is_outer, "an outer node has no penultimate blossom");
        let mut current = node;
        let mut visited = vec![];
        loop {
            let parent = self.nodes[current].blossom_parent.expect("inner node must have a blossom parent");
            let grandparent = self.nodes[current].blossom_grandparent.unwrap_or(parent);
            if !self.nodes[grandparent].is_outer && !self.nodes[grandparent].is_removed {
                visited.push(current);
                current = grandparent;
            } else if !self.nodes[parent].is_outer {
                visited.push(current);
                current = parent;
            } else {
                break
            }
        }
        for visited_node in visited {
            self.nodes[visited_node].blossom_grandparent = Some(current);
        }
        current
    }

    /// the chain `[node, parent, grandparent, ..]` up to and including the outer node that contains `node`
    pub fn blossom_ancestors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.checked_blossom_ancestors(node).unwrap_or_else(|message| panic!("{}", message))
    }

    fn checked_blossom_ancestors(&self, node: NodeIndex) -> Result<Vec<NodeIndex>, String> {
        let mut chain = vec![node];
        let mut current = node;
        while !self.nodes[current].is_outer {
            current = self.nodes[current].blossom_parent.ok_or_else(|| format!("inner node {} has no blossom parent", current))?;
            chain.push(current);
            if chain.len() > self.nodes.len() {
                return Err(format!("blossom hierarchy above node {} contains a cycle", node))
            }
        }
        Ok(chain)
    }

    /// consistency checks over the whole state, run after each primal operation when enabled
    pub fn sanity_check(&self) -> Result<(), String> {
        // trees
        let live_trees = self.trees.iter().filter(|tree| tree.is_some()).count();
        if live_trees != self.tree_num {
            return Err(format!("tree_num {} but {} live trees", self.tree_num, live_trees))
        }
        for (tree_index, tree) in self.trees.iter().enumerate() {
            let Some(tree) = tree else { continue };
            let root = &self.nodes[tree.root];
            if !root.is_tree_root || root.tree != Some(tree_index) || !root.is_plus() {
                return Err(format!("root {} of tree {} is not a PLUS tree root", tree.root, tree_index))
            }
            if root.matched.is_some() {
                return Err(format!("root {} of tree {} must be unmatched", tree.root, tree_index))
            }
            for node_index in self.tree_nodes(tree_index) {
                let node = &self.nodes[node_index];
                if !node.is_outer || node.tree != Some(tree_index) || node.is_infinity() {
                    return Err(format!("node {} in tree {} must be outer and labelled", node_index, tree_index))
                }
                if node_index != tree.root {
                    if node.is_tree_root {
                        return Err(format!("node {} is a second root of tree {}", node_index, tree_index))
                    }
                    let Some(matched) = node.matched else {
                        return Err(format!("non-root node {} of tree {} is unmatched", node_index, tree_index))
                    };
                    let parent = self.tree_parent(node_index).ok_or_else(|| format!("node {} has no tree parent", node_index))?;
                    if node.is_minus() && !self.nodes[parent].is_plus() || node.is_plus() && !self.nodes[parent].is_minus() {
                        return Err(format!("labels of node {} and its parent {} do not alternate", node_index, parent))
                    }
                    if node.is_plus() && Some(matched) != node.parent_edge {
                        return Err(format!("PLUS node {} must be matched to its tree parent", node_index))
                    }
                }
                if node.is_minus() {
                    let children = self.tree_children(node_index);
                    if children.len() != 1 || self.nodes[node_index].matched.map(|matched| self.opposite(matched, node_index)) != Some(children[0]) {
                        return Err(format!("MINUS node {} must have exactly its matched partner as child", node_index))
                    }
                    if node.is_blossom && node.minus_heap != Some(tree_index) {
                        return Err(format!("MINUS blossom {} missing from the minus-blossom heap", node_index))
                    }
                }
            }
        }
        // heaps: every item must know the heap that holds it
        let mut edge_heaps = vec![];
        for (tree_index, tree) in self.trees.iter().enumerate() {
            let Some(tree) = tree else { continue };
            edge_heaps.push((&tree.plus_infinity_edges, EdgeHeap::PlusInfinity(tree_index)));
            edge_heaps.push((&tree.plus_plus_edges, EdgeHeap::PlusPlus(tree_index)));
            for (node_index, _) in tree.minus_blossoms.items() {
                if self.nodes[node_index].minus_heap != Some(tree_index) {
                    return Err(format!("node {} is in the minus-blossom heap of tree {} but records {:?}", node_index, tree_index
                        , self.nodes[node_index].minus_heap))
                }
            }
        }
        for (tree_edge_index, tree_edge) in self.tree_edges.iter().enumerate() {
            let Some(tree_edge) = tree_edge else { continue };
            edge_heaps.push((&tree_edge.plus_plus_edges, EdgeHeap::CrossPlusPlus(tree_edge_index)));
            for k in 0..2 {
                edge_heaps.push((&tree_edge.plus_minus_edges[k], EdgeHeap::CrossPlusMinus(tree_edge_index, k)));
            }
        }
        for (heap, location) in edge_heaps {
            for (edge_index, _) in heap.items() {
                if self.edges[edge_index].heap != Some(location) {
                    return Err(format!("edge {} is in {:?} but records {:?}", edge_index, location, self.edges[edge_index].heap))
                }
            }
        }
        // nodes
        for (node_index, node) in self.nodes.iter().enumerate() {
            if node.is_removed {
                continue
            }
            if !node.is_outer {
                self.checked_blossom_ancestors(node_index)?;
                if node.minus_heap.is_some() {
                    return Err(format!("inner node {} is still in a minus-blossom heap", node_index))
                }
            } else if node.is_infinity() {
                if node.matched.is_none() {
                    return Err(format!("free node {} outside of trees must be matched", node_index))
                }
            } else {
                match node.tree {
                    Some(tree) if self.trees[tree].is_some() => { },
                    _ => return Err(format!("labelled node {} does not belong to a live tree", node_index)),
                }
            }
        }
        // edges: lazy duality invariant on the surface and heap keys
        for (edge_index, edge) in self.edges.iter().enumerate() {
            let [u, v] = edge.head;
            if let Some(location) = edge.heap {
                let key = self.edge_heap_key(location, edge_index);
                if key != Some(edge.slack) {
                    return Err(format!("edge {} is in {:?} with key {:?} but slack {}", edge_index, location, key, edge.slack))
                }
            }
            if u == v || !self.nodes[u].is_outer || !self.nodes[v].is_outer {
                continue
            }
            let mut expected = edge.weight;
            for side in 0..2 {
                let ancestors = self.checked_blossom_ancestors(edge.head_original[side])?;
                if ancestors.last() != Some(&edge.head[side]) {
                    return Err(format!("edge {} is attached to {} which does not contain vertex {}", edge_index, edge.head[side], edge.head_original[side]))
                }
                for ancestor in ancestors {
                    expected -= if ancestor == edge.head[side] { self.true_dual(ancestor) } else { self.nodes[ancestor].dual };
                }
            }
            let mut stored = edge.slack;
            for endpoint in [u, v] {
                match (self.nodes[endpoint].label, self.nodes[endpoint].tree) {
                    (Label::Plus, Some(tree)) => stored -= self.tree_eps(tree),
                    (Label::Minus, Some(tree)) => stored += self.tree_eps(tree),
                    _ => { },
                }
            }
            if (stored - expected).abs() > WEIGHT_TOLERANCE * (1. + edge.weight.abs()) {
                return Err(format!("edge {} has corrected slack {} but weight minus duals is {}", edge_index, stored, expected))
            }
            if expected < -WEIGHT_TOLERANCE * (1. + edge.weight.abs()) {
                return Err(format!("edge {} violates dual feasibility with slack {}", edge_index, expected))
            }
        }
        Ok(())
    }

}

impl MatchingVisualizer for BlossomState {
    fn snapshot(&self, abbrev: bool) -> serde_json::Value {
        let nodes: Vec<serde_json::Value> = self.nodes.iter().enumerate().map(|(node_index, node)| {
            if node.is_removed {
                return serde_json::Value::Null
            }
            json!({
                if abbrev { "l" } else { "label" }: node.label,
                if abbrev { "d" } else { "dual" }: self.true_dual(node_index),
                if abbrev { "o" } else { "is_outer" }: i32::from(node.is_outer),
                if abbrev { "t" } else { "tree" }: node.tree,
                if abbrev { "m" } else { "matched" }: node.matched,
                if abbrev { "p" } else { "blossom_parent" }: node.blossom_parent,
            })
        }).collect();
        let edges: Vec<serde_json::Value> = self.edges.iter().map(|edge| {
            json!({
                if abbrev { "w" } else { "weight" }: edge.weight,
                if abbrev { "s" } else { "slack" }: edge.slack,
                if abbrev { "h" } else { "head" }: edge.head,
            })
        }).collect();
        let trees: Vec<serde_json::Value> = self.trees.iter().map(|tree| match tree {
            Some(tree) => json!({
                if abbrev { "r" } else { "root" }: tree.root,
                if abbrev { "e" } else { "eps" }: tree.eps,
            }),
            None => serde_json::Value::Null,
        }).collect();
        json!({
            "nodes": nodes,
            "edges": edges,
            "trees": trees,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_state() -> BlossomState {
        let initializer = SolverInitializer::new(4, vec![(0, 1, 2.), (1, 2, 4.), (2, 3, 2.), (3, 0, 6.)]);
        BlossomState::new(&initializer, 1.)
    }

    #[test]
    fn blossom_graph_incident_lists() {  // cargo test blossom_graph_incident_lists -- --nocapture
        let state = square_state();
        // vertex 1 has edge 0 in direction 1 and edge 1 in direction 0
        let mut incident = state.incident_edges(1);
        incident.sort();
        assert_eq!(incident, vec![(0, 1), (1, 0)]);
        for (edge_index, dir) in state.incident_edges(0) {
            assert_eq!(state.edges[edge_index].head[1 - dir], 0);
        }
        assert_eq!(state.opposite(0, 0), 1);
        assert_eq!(state.current_original(3, 0), 0);
        assert_eq!(state.edges[1].slack, 2.);
        // edge (u, v) points from u to v: u lists it in direction 0 and sees v at head[0]
        for (edge_index, &(u, v, _)) in [(0, 1, 2.), (1, 2, 4.), (2, 3, 2.), (3, 0, 6.)].iter().enumerate() {
            assert_eq!(state.edges[edge_index].head_original, [v, u]);
            assert!(state.incident_edges(u).contains(&(edge_index, 0)));
            assert_eq!(state.opposite(edge_index, u), v);
        }
    }

    #[test]
    fn blossom_graph_cyclic_hierarchy_rejected() {  // cargo test blossom_graph_cyclic_hierarchy_rejected -- --nocapture
        let mut state = square_state();
        state.nodes[0].matched = Some(0);
        state.nodes[1].matched = Some(0);
        state.nodes[2].matched = Some(2);
        state.nodes[3].matched = Some(2);
        state.sanity_check().unwrap();
        // vertices 0 and 1 claim each other as blossom parent
        for (child, parent) in [(0, 1), (1, 0)] {
            state.nodes[child].is_outer = false;
            state.nodes[child].blossom_parent = Some(parent);
        }
        let message = state.sanity_check().unwrap_err();
        assert!(message.contains("cycle"), "{}", message);
        state.nodes[1].blossom_parent = None;
        let message = state.sanity_check().unwrap_err();
        assert!(message.contains("no blossom parent"), "{}", message);
    }

    #[test]
    fn blossom_graph_move_edge_tail() {  // cargo test blossom_graph_move_edge_tail -- --nocapture
        let mut state = square_state();
        state.nodes.push(Node::new_vertex(0.));
        let blossom = 4;
        state.move_edge_tail(1, blossom, 1);
        assert_eq!(state.opposite(1, 2), blossom);
        assert_eq!(state.current_original(1, blossom), 1);
        assert_eq!(state.incident_edges(1), vec![(0, 1)]);
        assert_eq!(state.incident_edges(blossom), vec![(1, 0)]);
        state.move_edge_tail(1, blossom, 0);
        assert!(state.incident_edges(1).is_empty());
        assert_eq!(state.incident_edges(blossom).len(), 2);
    }

    #[test]
    fn blossom_graph_child_list() {  // cargo test blossom_graph_child_list -- --nocapture
        let initializer = SolverInitializer::new(6, vec![(0, 1, 1.), (0, 2, 1.), (0, 3, 1.), (0, 4, 1.), (4, 5, 1.)]);
        let mut state = BlossomState::new(&initializer, 0.);
        state.nodes[0].is_tree_root = true;
        for (child, edge) in [(1, 0), (2, 1), (3, 2)] {
            state.add_child(0, child, edge, true);
        }
        assert_eq!(state.tree_children(0), vec![3, 2, 1]);
        assert_eq!(state.tree_parent(2), Some(0));
        assert_eq!(state.tree_parent(0), None);
        state.remove_from_child_list(2);
        assert_eq!(state.tree_children(0), vec![3, 1]);
        state.remove_from_child_list(3);
        assert_eq!(state.tree_children(0), vec![1]);
        assert_eq!(state.nodes[1].tree_sibling_prev, Some(1));
        // concatenate the children of vertex 4 after those of vertex 0
        state.add_child(0, 4, 3, true);
        state.add_child(4, 5, 4, true);
        state.move_children_to(4, 0);
        assert_eq!(state.tree_children(0), vec![4, 1, 5]);
        assert_eq!(state.nodes[4].first_tree_child, None);
        assert_eq!(state.nodes[4].tree_sibling_prev, Some(5));
    }

    #[test]
    fn blossom_graph_scratch_generations() {  // cargo test blossom_graph_scratch_generations -- --nocapture
        let mut state = square_state();
        state.set_marked(2, true);
        state.set_processed(3, true);
        assert!(state.is_marked(2) && state.is_processed(3));
        state.set_marked(2, false);
        assert!(!state.is_marked(2));
        state.set_marked(1, true);
        state.next_generation();
        assert!(!state.is_marked(1) && !state.is_processed(3));
    }

    #[test]
    fn blossom_graph_penultimate_blossom() {  // cargo test blossom_graph_penultimate_blossom -- --nocapture
        let mut state = square_state();
        // blossom 4 contains vertex 0 and blossom 5, which contains vertex 1
        for _ in 0..2 {
            state.nodes.push(Node::new_vertex(0.));
        }
        state.nodes[4].is_blossom = true;
        state.nodes[5].is_blossom = true;
        for (child, parent) in [(0, 4), (5, 4), (1, 5)] {
            state.nodes[child].is_outer = false;
            state.nodes[child].blossom_parent = Some(parent);
            state.nodes[child].blossom_grandparent = Some(parent);
        }
        assert_eq!(state.penultimate_blossom(1), 5);
        assert_eq!(state.penultimate_blossom(0), 0);
        assert_eq!(state.blossom_ancestors(1), vec![1, 5, 4]);
        // once 4 is expanded, blossom 5 is outer and vertex 1 becomes the penultimate node
        state.nodes[4].is_outer = false;
        state.nodes[4].is_removed = true;
        state.nodes[5].is_outer = true;
        assert_eq!(state.penultimate_blossom(1), 1);
    }

}
