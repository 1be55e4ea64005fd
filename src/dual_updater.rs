//! Dual Updater
//!
//! Raises the lazy `eps` of the alternating trees when no primal operation applies. Only the trees' `eps` change here;
//! the stored duals and slacks catch up lazily when the primal updater next touches the nodes.
//!

use super::util::*;
use super::blossom_graph::*;

/// common trait that must be implemented for each dual update strategy
pub trait DualModuleImpl {

    /// the dual change to apply to every tree, or `None` if the duals can grow without bound, which means that no
    /// perfect matching exists
    fn compute_maximum_update_length(&self, state: &BlossomState) -> Option<Weight>;

    /// apply [`DualModuleImpl::compute_maximum_update_length`] to the `eps` of every live tree and return it
    fn update_duals(&mut self, state: &mut BlossomState) -> Option<Weight> {
        let delta = self.compute_maximum_update_length(state)?;
        for tree_index in state.live_trees() {
            state.tree_mut(tree_index).eps += delta;
        }
        trace!("dual update by {}", delta);
        Some(delta)
    }

}

/// one uniform delta for all trees; a uniform change keeps the slack of every cross-tree (+, -) edge unchanged, so only
/// in-tree constraints and cross-tree (+, +) edges bound it
#[derive(Debug, Clone, Default)]
pub struct DualModuleFixedDelta {}

impl DualModuleFixedDelta {

    pub fn new() -> Self {
        Self {}
    }

}

impl DualModuleImpl for DualModuleFixedDelta {

    fn compute_maximum_update_length(&self, state: &BlossomState) -> Option<Weight> {
        let mut delta = Weight::INFINITY;
        for tree_index in state.live_trees() {
            let tree = state.tree(tree_index);
            delta = delta.min(state.get_eps(tree_index) - tree.eps);
            // each cross-tree (+, +) edge is visited once, from the tree it points to
            for (tree_edge_index, dir) in state.tree_edges_of(tree_index) {
                if dir != 1 {
                    continue
                }
                let tree_edge = state.tree_edge(tree_edge_index);
                if let Some(slack) = tree_edge.plus_plus_edges.min_key() {
                    let opposite_eps = state.tree_eps(tree_edge.head[dir]);
                    delta = delta.min((slack - tree.eps - opposite_eps) / 2.);
                }
            }
        }
        if delta == Weight::INFINITY {
            return None
        }
        assert!(delta >= 0., "dual update must not decrease any tree, delta = {}", delta);
        Some(delta)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_updater_fixed_delta() {  // cargo test dual_updater_fixed_delta -- --nocapture
        // two singleton trees joined by an edge of slack 6 and a free pair hanging off the first tree
        let initializer = SolverInitializer::new(4, vec![(0, 1, 6.), (0, 2, 10.), (2, 3, 0.)]);
        let mut state = BlossomState::new(&initializer, 0.);
        state.add_tree(0);
        state.add_tree(1);
        state.nodes[2].matched = Some(2);
        state.nodes[3].matched = Some(2);
        let tree_edge_index = state.add_tree_edge(0, 1);
        state.add_cross_plus_plus_edge(tree_edge_index, 0);
        state.clear_current_edges(0);
        state.add_plus_infinity_edge(0, 1);
        let mut dual_module = DualModuleFixedDelta::new();
        assert_eq!(dual_module.update_duals(&mut state), Some(3.));
        assert_eq!(state.tree_eps(0), 3.);
        assert_eq!(state.tree_eps(1), 3.);
        // the cross edge is tight now, so no further uniform change is possible
        assert_eq!(dual_module.compute_maximum_update_length(&state), Some(0.));
    }

    #[test]
    fn dual_updater_unbounded() {  // cargo test dual_updater_unbounded -- --nocapture
        let initializer = SolverInitializer::new(2, vec![]);
        let mut state = BlossomState::new(&initializer, 0.);
        state.add_tree(0);
        state.add_tree(1);
        let mut dual_module = DualModuleFixedDelta::new();
        assert_eq!(dual_module.update_duals(&mut state), None);
        assert_eq!(state.tree_eps(0), 0.);
    }

}
