//! Minimum-Weight Perfect Matching Solver
//!
//! This module drives the primal updater and the dual updater until every vertex is matched, then breaks down the
//! remaining blossoms to report the perfect matching together with its dual certificate.
//!

use super::util::*;
use super::blossom_graph::*;
use super::primal_updater::*;
use super::dual_updater::*;
use super::visualize::*;
use crate::derivative::Derivative;
use crate::serde::{Serialize, Deserialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverOptions {
    /// keep growing along tight (+, inf) edges of the nodes that a grow adds to the tree
    #[serde(default = "solver_default_configs::recursive_grow")]
    pub recursive_grow: bool,
    /// augment as soon as a primal operation reveals a tight cross-tree (+, +) edge
    #[serde(default = "solver_default_configs::immediate_augment")]
    pub immediate_augment: bool,
    /// check all invariants after every primal operation, which is slow
    #[serde(default = "solver_default_configs::sanity_check")]
    pub sanity_check: bool,
    /// panic when a recursive grow queues more node pairs than this
    #[serde(default = "solver_default_configs::max_grow_worklist")]
    pub max_grow_worklist: Option<usize>,
}

pub mod solver_default_configs {
    pub fn recursive_grow() -> bool { true }
    pub fn immediate_augment() -> bool { true }
    pub fn sanity_check() -> bool { false }
    pub fn max_grow_worklist() -> Option<usize> { None }  // by default unlimited
}

impl Default for SolverOptions {
    fn default() -> Self {
        serde_json::from_value(json!({})).expect("every option has a default value")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfectMatching {
    /// the matched edge of each vertex
    pub matched_edges: Vec<EdgeIndex>,
    /// the vertex each vertex is matched to
    pub partners: Vec<VertexIndex>,
    /// total weight of the matched edges
    pub weight: Weight,
}

impl PerfectMatching {

    /// each matched pair once, as `(smaller vertex, larger vertex, edge)`
    pub fn pairs(&self) -> Vec<(VertexIndex, VertexIndex, EdgeIndex)> {
        self.partners.iter().enumerate().filter(|&(vertex, &partner)| vertex < partner)
            .map(|(vertex, &partner)| (vertex, partner, self.matched_edges[vertex])).collect()
    }

}

/// a serial Blossom V solver
#[derive(Derivative)]
#[derivative(Debug)]
pub struct BlossomSolver {
    initializer: SolverInitializer,
    pub options: SolverOptions,
    #[derivative(Debug="ignore")]
    pub state: BlossomState,
    pub primal_updater: PrimalUpdater,
    #[derivative(Debug="ignore")]
    dual_module: DualModuleFixedDelta,
}

impl BlossomSolver {

    /// validate the graph and build the initial forest: every vertex is a single-node tree and every edge joins two trees
    pub fn new(initializer: &SolverInitializer, options: SolverOptions) -> Result<Self, BlossomError> {
        initializer.validate()?;
        let initial_dual = initializer.min_weight() / 2.;
        let mut state = BlossomState::new(initializer, initial_dual);
        for vertex in 0..initializer.vertex_num {
            let tree_index = state.add_tree(vertex);
            debug_assert_eq!(tree_index, vertex);
        }
        for tree_index in 0..initializer.vertex_num {
            state.set_current_edges(tree_index);
            for (edge_index, dir) in state.incident_edges(tree_index) {
                let opposite = state.edges[edge_index].head[dir];
                if opposite < tree_index {
                    continue  // already added from the other side
                }
                let (tree_edge_index, _) = state.tree_edge_towards(tree_index, opposite);
                state.add_cross_plus_plus_edge(tree_edge_index, edge_index);
            }
            state.clear_current_edges(tree_index);
        }
        Ok(Self {
            initializer: initializer.clone(),
            primal_updater: PrimalUpdater::new(&options),
            options,
            state,
            dual_module: DualModuleFixedDelta::new(),
        })
    }

    pub fn statistics(&self) -> &Statistics {
        &self.primal_updater.statistics
    }

    pub fn solve(&mut self) -> Result<PerfectMatching, BlossomError> {
        self.solve_visualizer(None)
    }

    pub fn solve_visualizer(&mut self, mut visualizer: Option<&mut Visualizer>) -> Result<PerfectMatching, BlossomError> {
        if let Some(visualizer) = visualizer.as_mut() {
            visualizer.snapshot("initial".to_string(), &*self).map_err(|error| BlossomError::Visualizer(error.to_string()))?;
        }
        while self.state.tree_num > 0 {
            let mut changed = false;
            for tree_index in self.state.live_trees() {
                if self.state.trees[tree_index].is_none() {
                    continue  // dissolved earlier in this pass
                }
                changed |= self.process_tree(tree_index, &mut visualizer)?;
            }
            if !changed {
                match self.dual_module.update_duals(&mut self.state) {
                    Some(_) => {
                        self.primal_updater.statistics.dual_update_num += 1;
                        if let Some(visualizer) = visualizer.as_mut() {
                            visualizer.snapshot("dual update".to_string(), &*self).map_err(|error| BlossomError::Visualizer(error.to_string()))?;
                        }
                    },
                    None => return Err(BlossomError::NoPerfectMatching),
                }
            }
        }
        let perfect_matching = self.perfect_matching();
        info!("perfect matching of weight {} found, {:?}", perfect_matching.weight, self.statistics());
        Ok(perfect_matching)
    }

    /// run primal operations on one tree until none applies or the tree is gone; returns whether anything changed
    fn process_tree(&mut self, tree_index: TreeIndex, visualizer: &mut Option<&mut Visualizer>) -> Result<bool, BlossomError> {
        let tree_num = self.state.tree_num;
        self.state.set_current_edges(tree_index);
        if let Some(edge_index) = self.tight_cross_edge(tree_index) {
            self.primal_operation(PrimalOperation::Augment(edge_index), visualizer)?;
            return Ok(true)
        }
        let mut changed = false;
        while self.state.tree_num == tree_num {
            let tree = self.state.tree(tree_index);
            let eps = tree.eps;
            let operation = if let Some((edge_index, _)) = tree.plus_infinity_edges.find_min().filter(|&(_, slack)| slack <= eps) {
                PrimalOperation::Grow(edge_index)
            } else if let Some((edge_index, _)) = tree.plus_plus_edges.find_min().filter(|&(_, slack)| slack <= 2. * eps) {
                PrimalOperation::Shrink(edge_index)
            } else if let Some((blossom, _)) = tree.minus_blossoms.find_min().filter(|&(_, dual)| dual <= eps) {
                PrimalOperation::Expand(blossom)
            } else {
                break
            };
            self.primal_operation(operation, visualizer)?;
            changed = true;
        }
        if self.state.trees[tree_index].is_some() {
            self.state.clear_current_edges(tree_index);
        }
        Ok(changed)
    }

    /// a cross-tree (+, +) edge of the tree that is tight; the current edges of the tree must be set
    fn tight_cross_edge(&self, tree_index: TreeIndex) -> Option<EdgeIndex> {
        let eps = self.state.tree_eps(tree_index);
        for (tree_edge_index, dir) in self.state.tree_edges_of(tree_index) {
            let tree_edge = self.state.tree_edge(tree_edge_index);
            let opposite_eps = self.state.tree_eps(tree_edge.head[dir]);
            if let Some((edge_index, slack)) = tree_edge.plus_plus_edges.find_min() {
                if slack <= eps + opposite_eps {
                    return Some(edge_index)
                }
            }
        }
        None
    }

    fn primal_operation(&mut self, operation: PrimalOperation, visualizer: &mut Option<&mut Visualizer>) -> Result<(), BlossomError> {
        self.primal_updater.run(&mut self.state, operation);
        if self.options.sanity_check {
            if let Err(message) = self.state.sanity_check() {
                panic!("sanity check failed after {:?}: {}", operation, message);
            }
        }
        if let Some(visualizer) = visualizer.as_mut() {
            visualizer.snapshot(format!("{:?}", operation), &*self).map_err(|error| BlossomError::Visualizer(error.to_string()))?;
        }
        Ok(())
    }

    /// break down all blossoms to find the matched edge of every vertex; all trees must be dissolved
    pub fn perfect_matching(&mut self) -> PerfectMatching {
        assert_eq!(self.state.tree_num, 0, "perfect matching is only available after all trees are augmented");
        let mut pending: Vec<NodeIndex> = (0..self.state.nodes.len()).filter(|&node_index| {
            let node = &self.state.nodes[node_index];
            node.is_blossom && node.is_outer && !node.is_removed
        }).collect();
        while let Some(blossom) = pending.pop() {
            let matched = self.state.nodes[blossom].matched.expect("a blossom in a perfect matching must be matched");
            // the child of the blossom holding the matched edge keeps it, the rest of the circuit pairs up
            let inside = self.state.edges[matched].head_original.into_iter()
                .find(|&vertex| self.state.blossom_ancestors(vertex).contains(&blossom))
                .expect("matched edge of a blossom must end inside it");
            let mut child = inside;
            while self.state.nodes[child].blossom_parent != Some(blossom) {
                child = self.state.nodes[child].blossom_parent.expect("vertex lies inside the blossom");
            }
            self.state.nodes[child].matched = Some(matched);
            if self.state.nodes[child].is_blossom {
                pending.push(child);
            }
            let mut current = self.sibling_next(child);
            while current != child {
                let pair_edge = self.state.nodes[current].blossom_sibling.expect("circuit node must have a blossom sibling");
                let partner = self.sibling_next(current);
                for node in [current, partner] {
                    self.state.nodes[node].matched = Some(pair_edge);
                    if self.state.nodes[node].is_blossom {
                        pending.push(node);
                    }
                }
                current = self.sibling_next(partner);
            }
        }
        let vertex_num = self.state.vertex_num;
        let mut matched_edges = Vec::with_capacity(vertex_num);
        let mut partners = Vec::with_capacity(vertex_num);
        let mut weight = 0.;
        for vertex in 0..vertex_num {
            let edge_index = self.state.nodes[vertex].matched.expect("every vertex must be matched");
            let edge = &self.state.edges[edge_index];
            let partner = if edge.head_original[0] == vertex { edge.head_original[1] } else { edge.head_original[0] };
            debug_assert!(edge.head_original.contains(&vertex), "vertex {} is matched to edge {} that does not touch it", vertex, edge_index);
            if vertex < partner {
                weight += edge.weight;
            }
            matched_edges.push(edge_index);
            partners.push(partner);
        }
        for vertex in 0..vertex_num {
            assert_eq!(partners[partners[vertex]], vertex, "matching is not symmetric at vertex {}", vertex);
        }
        PerfectMatching { matched_edges, partners, weight }
    }

    fn sibling_next(&self, node: NodeIndex) -> NodeIndex {
        let sibling = self.state.nodes[node].blossom_sibling.expect("circuit node must have a blossom sibling");
        self.state.opposite(sibling, node)
    }

    /// every live blossom that contains the vertex
    fn containing_blossoms(&self, vertex: VertexIndex) -> BTreeSet<NodeIndex> {
        self.state.blossom_ancestors(vertex).into_iter().skip(1).collect()
    }

    /// objective of the dual problem: every vertex dual plus every blossom dual
    pub fn dual_objective(&self) -> Weight {
        let mut objective = 0.;
        for (node_index, node) in self.state.nodes.iter().enumerate() {
            if !node.is_removed {
                objective += self.state.true_dual(node_index);
            }
        }
        objective
    }

    /// check that the duals are feasible and prove optimality of the matching
    pub fn verify_certificate(&self, perfect_matching: &PerfectMatching) -> Result<(), String> {
        let total_weight: Weight = self.initializer.weighted_edges.iter().map(|&(_, _, weight)| weight.abs()).sum();
        let tolerance = WEIGHT_TOLERANCE * (1. + total_weight);
        for (node_index, node) in self.state.nodes.iter().enumerate() {
            if node.is_blossom && !node.is_removed && self.state.true_dual(node_index) < -tolerance {
                return Err(format!("blossom {} has negative dual {}", node_index, self.state.true_dual(node_index)))
            }
        }
        for (edge_index, &(u, v, weight)) in self.initializer.weighted_edges.iter().enumerate() {
            let mut reduced_cost = weight - self.state.true_dual(u) - self.state.true_dual(v);
            let (blossoms_u, blossoms_v) = (self.containing_blossoms(u), self.containing_blossoms(v));
            for &blossom in blossoms_u.symmetric_difference(&blossoms_v) {
                reduced_cost -= self.state.true_dual(blossom);
            }
            if reduced_cost < -tolerance {
                return Err(format!("edge {} has negative reduced cost {}", edge_index, reduced_cost))
            }
            if perfect_matching.matched_edges[u] == edge_index && reduced_cost > tolerance {
                return Err(format!("matched edge {} is not tight, reduced cost {}", edge_index, reduced_cost))
            }
        }
        let dual_objective = self.dual_objective();
        if (perfect_matching.weight - dual_objective).abs() > tolerance {
            return Err(format!("duality gap: matching weight {} but dual objective {}", perfect_matching.weight, dual_objective))
        }
        Ok(())
    }

}

// static functions, not recommended because the solver state is dropped afterwards
impl BlossomSolver {

    pub fn mwpm_solve(initializer: &SolverInitializer) -> Result<PerfectMatching, BlossomError> {
        Self::mwpm_solve_visualizer(initializer, SolverOptions::default(), None)
    }

    pub fn mwpm_solve_visualizer(initializer: &SolverInitializer, options: SolverOptions, visualizer: Option<&mut Visualizer>) -> Result<PerfectMatching, BlossomError> {
        let mut solver = Self::new(initializer, options)?;
        solver.solve_visualizer(visualizer)
    }

}

impl MatchingVisualizer for BlossomSolver {
    fn snapshot(&self, abbrev: bool) -> serde_json::Value {
        let mut value = self.state.snapshot(abbrev);
        snapshot_combine_values(&mut value, json!({
            "statistics": self.statistics(),
        }));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_options() -> SolverOptions {
        SolverOptions { sanity_check: true, ..SolverOptions::default() }
    }

    fn solve_checked(initializer: &SolverInitializer, options: SolverOptions) -> (BlossomSolver, PerfectMatching) {
        let mut solver = BlossomSolver::new(initializer, options).unwrap();
        let perfect_matching = solver.solve().unwrap();
        solver.verify_certificate(&perfect_matching).unwrap();
        (solver, perfect_matching)
    }

    #[test]
    fn mwpm_solver_odd_vertex_num() {  // cargo test mwpm_solver_odd_vertex_num -- --nocapture
        let triangle = SolverInitializer::new(3, vec![(0, 1, 1.), (1, 2, 1.), (2, 0, 1.)]);
        assert_eq!(BlossomSolver::mwpm_solve(&triangle).unwrap_err(), BlossomError::OddVertexNum(3));
    }

    #[test]
    fn mwpm_solver_square() {  // cargo test mwpm_solver_square -- --nocapture
        let square = SolverInitializer::new(4, vec![(0, 1, 1.), (1, 2, 1.), (2, 3, 1.), (3, 0, 1.)]);
        let (solver, perfect_matching) = solve_checked(&square, checked_options());
        assert_eq!(perfect_matching.weight, 2.);
        assert_eq!(perfect_matching.pairs().len(), 2);
        assert_eq!(solver.statistics().shrink_num, 0, "a bipartite graph has no odd circuit");
    }

    #[test]
    fn mwpm_solver_empty_graph() {  // cargo test mwpm_solver_empty_graph -- --nocapture
        let empty = SolverInitializer::new(0, vec![]);
        let perfect_matching = BlossomSolver::mwpm_solve(&empty).unwrap();
        assert_eq!(perfect_matching.weight, 0.);
        assert!(perfect_matching.partners.is_empty());
    }

    #[test]
    fn mwpm_solver_parallel_and_negative_edges() {  // cargo test mwpm_solver_parallel_and_negative_edges -- --nocapture
        let parallel = SolverInitializer::new(2, vec![(0, 1, 5.), (1, 0, 3.)]);
        let (_, perfect_matching) = solve_checked(&parallel, checked_options());
        assert_eq!(perfect_matching.weight, 3.);
        assert_eq!(perfect_matching.matched_edges, vec![1, 1]);
        let negative = SolverInitializer::new(4, vec![(0, 1, -4.), (2, 3, -1.), (0, 2, -10.), (1, 3, -10.)]);
        let (_, perfect_matching) = solve_checked(&negative, checked_options());
        assert_eq!(perfect_matching.weight, -20.);
        assert_eq!(perfect_matching.partners, vec![2, 3, 0, 1]);
    }

    #[test]
    fn mwpm_solver_triangle_with_pendant() {  // cargo test mwpm_solver_triangle_with_pendant -- --nocapture
        // the triangle must be shrunk before vertex 3 can reach it
        let initializer = SolverInitializer::new(4, vec![(0, 1, 1.), (1, 2, 1.), (2, 0, 1.), (0, 3, 10.)]);
        let (solver, perfect_matching) = solve_checked(&initializer, checked_options());
        assert_eq!(perfect_matching.weight, 11.);
        assert_eq!(perfect_matching.partners, vec![3, 2, 1, 0]);
        assert_eq!(solver.statistics().shrink_num, 1);
        assert_eq!(solver.statistics().expand_num, 0);
        assert_eq!(solver.state.blossom_num, 1);
        assert!((solver.dual_objective() - 11.).abs() < 1e-9);
    }

    #[test]
    fn mwpm_solver_duals_inside_live_blossom() {  // cargo test mwpm_solver_duals_inside_live_blossom -- --nocapture
        let initializer = SolverInitializer::new(4, vec![(1, 2, 0.), (0, 1, 0.), (0, 2, 0.), (3, 0, 100.)]);
        let mut solver = BlossomSolver::new(&initializer, checked_options()).unwrap();
        solver.primal_updater.run(&mut solver.state, PrimalOperation::Augment(0));
        solver.state.set_current_edges(0);
        solver.primal_updater.run(&mut solver.state, PrimalOperation::Grow(1));
        solver.primal_updater.run(&mut solver.state, PrimalOperation::Shrink(2));
        assert_eq!(solver.dual_module.update_duals(&mut solver.state), Some(50.));
        solver.state.sanity_check().unwrap();
        // the circuit nodes keep their settled duals, only the blossom follows the eps of its tree
        assert_eq!(solver.dual_objective(), 100.);
        let snapshot = solver.snapshot(true);
        for vertex in 0..3 {
            assert_eq!(snapshot["nodes"][vertex]["d"], json!(0.));
        }
        assert_eq!(snapshot["nodes"][4]["d"], json!(50.));
        assert_eq!(snapshot["nodes"][3]["d"], json!(50.));
        // and still after the tree of the blossom is dissolved
        solver.primal_updater.run(&mut solver.state, PrimalOperation::Augment(3));
        assert_eq!(solver.state.tree_num, 0);
        let perfect_matching = solver.perfect_matching();
        assert_eq!(perfect_matching.weight, 100.);
        assert_eq!(perfect_matching.partners, vec![3, 2, 1, 0]);
        assert_eq!(solver.dual_objective(), 100.);
        solver.verify_certificate(&perfect_matching).unwrap();
        assert_eq!(solver.snapshot(true)["nodes"][0]["d"], json!(0.));
    }

    #[test]
    fn mwpm_solver_shrink_then_expand() {  // cargo test mwpm_solver_shrink_then_expand -- --nocapture
        // the triangle becomes a blossom, is matched to vertex 4 and later entered from vertex 3 as a MINUS node;
        // its dual drops to zero before vertex 5 can be reached, so it is expanded
        let initializer = SolverInitializer::new(6, vec![(0, 1, 2.), (1, 2, 2.), (2, 0, 2.), (0, 3, 10.), (1, 4, 4.), (4, 5, 100.)]);
        let (solver, perfect_matching) = solve_checked(&initializer, checked_options());
        assert_eq!(perfect_matching.weight, 112.);
        assert_eq!(perfect_matching.partners, vec![3, 2, 1, 0, 5, 4]);
        let statistics = solver.statistics();
        assert_eq!(statistics.shrink_num, 1);
        assert_eq!(statistics.expand_num, 1);
        assert_eq!(statistics.augment_num, 3);
        assert_eq!(solver.state.blossom_num, 0);
        assert_eq!(solver.state.removed_num, 1);
    }

    #[test]
    fn mwpm_solver_recursive_grow() {  // cargo test mwpm_solver_recursive_grow -- --nocapture
        // growing from vertex 4 reaches pair (0, 1) and then immediately pair (2, 3)
        let initializer = SolverInitializer::new(6, vec![(0, 1, 0.), (2, 3, 0.), (1, 2, 0.), (4, 0, 1.), (5, 3, 1.)]);
        let (solver, perfect_matching) = solve_checked(&initializer, checked_options());
        assert_eq!(perfect_matching.weight, 2.);
        assert_eq!(perfect_matching.partners, vec![4, 2, 1, 5, 0, 3]);
        assert_eq!(solver.statistics().grow_worklist_peak, 1);
        let options = SolverOptions { recursive_grow: false, ..checked_options() };
        let (solver, perfect_matching) = solve_checked(&initializer, options);
        assert_eq!(perfect_matching.weight, 2.);
        assert_eq!(solver.statistics().grow_worklist_peak, 0);
    }

    #[test]
    #[should_panic]
    fn mwpm_solver_grow_worklist_limit() {  // cargo test mwpm_solver_grow_worklist_limit -- --nocapture
        let initializer = SolverInitializer::new(6, vec![(0, 1, 0.), (2, 3, 0.), (1, 2, 0.), (4, 0, 1.), (5, 3, 1.)]);
        let options = SolverOptions { max_grow_worklist: Some(0), ..SolverOptions::default() };
        BlossomSolver::mwpm_solve_visualizer(&initializer, options, None).ok();
    }

    #[test]
    fn mwpm_solver_no_perfect_matching() {  // cargo test mwpm_solver_no_perfect_matching -- --nocapture
        let star = SolverInitializer::new(4, vec![(0, 1, 1.), (0, 2, 1.), (0, 3, 1.)]);
        assert_eq!(BlossomSolver::mwpm_solve(&star), Err(BlossomError::NoPerfectMatching));
        let two_triangles = SolverInitializer::new(6, vec![(0, 1, 1.), (1, 2, 1.), (2, 0, 1.), (3, 4, 1.), (4, 5, 1.), (5, 3, 1.)]);
        assert_eq!(BlossomSolver::mwpm_solve(&two_triangles), Err(BlossomError::NoPerfectMatching));
        let isolated = SolverInitializer::new(2, vec![]);
        assert_eq!(BlossomSolver::mwpm_solve(&isolated), Err(BlossomError::NoPerfectMatching));
    }

    #[test]
    fn mwpm_solver_bipartite_certificate() {  // cargo test mwpm_solver_bipartite_certificate -- --nocapture
        // complete bipartite graph K_{4,4} with weights |i - j| * 3 + (i * j) % 5
        let mut weighted_edges = vec![];
        for i in 0..4 {
            for j in 0..4 {
                let weight = ((i as i64 - j as i64).abs() * 3 + ((i * j) % 5) as i64) as Weight;
                weighted_edges.push((i, 4 + j, weight));
            }
        }
        let initializer = SolverInitializer::new(8, weighted_edges);
        let (solver, perfect_matching) = solve_checked(&initializer, checked_options());
        assert_eq!(Some(perfect_matching.weight), brute_force_min_weight(&initializer));
        assert!((solver.dual_objective() - perfect_matching.weight).abs() < 1e-6);
    }

    #[test]
    fn mwpm_solver_random_against_brute_force() {  // cargo test mwpm_solver_random_against_brute_force -- --nocapture
        let mut total = Statistics::default();
        for seed in 0..200 {
            let vertex_num = 2 * (2 + seed as usize % 6);
            let initializer = random_graph(vertex_num, 0.4, 20, seed % 4 != 0, seed);
            let expected = brute_force_min_weight(&initializer);
            let mut solver = BlossomSolver::new(&initializer, checked_options()).unwrap();
            match solver.solve() {
                Ok(perfect_matching) => {
                    assert_eq!(Some(perfect_matching.weight), expected, "wrong weight for seed {}", seed);
                    solver.verify_certificate(&perfect_matching).unwrap();
                    for (u, v, edge_index) in perfect_matching.pairs() {
                        let (a, b, _) = initializer.weighted_edges[edge_index];
                        assert!((a, b) == (u, v) || (b, a) == (u, v));
                    }
                },
                Err(error) => {
                    assert_eq!(error, BlossomError::NoPerfectMatching);
                    assert_eq!(expected, None, "a perfect matching exists for seed {}", seed);
                },
            }
            let statistics = solver.statistics();
            total.shrink_num += statistics.shrink_num;
            total.expand_num += statistics.expand_num;
        }
        assert!(total.shrink_num > 0, "random instances should exercise shrink");
        assert!(total.expand_num > 0, "random instances should exercise expand");
    }

    #[test]
    fn mwpm_solver_option_variants_agree() {  // cargo test mwpm_solver_option_variants_agree -- --nocapture
        for seed in 0..40 {
            let initializer = random_graph(12, 0.5, 50, true, 1000 + seed);
            let expected = brute_force_min_weight(&initializer);
            for recursive_grow in [false, true] {
                for immediate_augment in [false, true] {
                    let options = SolverOptions { recursive_grow, immediate_augment, ..checked_options() };
                    let (_, perfect_matching) = solve_checked(&initializer, options);
                    assert_eq!(Some(perfect_matching.weight), expected, "seed {} recursive_grow {} immediate_augment {}"
                        , seed, recursive_grow, immediate_augment);
                }
            }
        }
    }

    #[test]
    fn mwpm_solver_options_from_json() {  // cargo test mwpm_solver_options_from_json -- --nocapture
        let options: SolverOptions = serde_json::from_str(r#"{"immediate_augment": false}"#).unwrap();
        assert!(options.recursive_grow);
        assert!(!options.immediate_augment);
        assert_eq!(options.max_grow_worklist, None);
        assert!(serde_json::from_str::<SolverOptions>(r#"{"unknown": 1}"#).is_err());
    }

    #[test]
    fn mwpm_solver_visualizer_snapshots() {  // cargo test mwpm_solver_visualizer_snapshots -- --nocapture
        let initializer = SolverInitializer::new(4, vec![(0, 1, 1.), (1, 2, 1.), (2, 0, 1.), (0, 3, 10.)]);
        let mut visualizer = Visualizer::new(None).unwrap();
        let perfect_matching = BlossomSolver::mwpm_solve_visualizer(&initializer, SolverOptions::default(), Some(&mut visualizer)).unwrap();
        assert_eq!(perfect_matching.weight, 11.);
        if !cfg!(feature = "disable_visualizer") {
            assert!(visualizer.snapshot_num() >= 3, "initial state, operations and dual updates are recorded");
        }
    }

}
