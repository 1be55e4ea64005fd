extern crate rand_xoshiro;
extern crate priority_queue;
extern crate ordered_float;
extern crate serde;
#[macro_use] extern crate serde_json;
#[macro_use] extern crate log;
extern crate chrono;
extern crate derivative;
extern crate thiserror;

pub mod util;
pub mod heap;
pub mod blossom_graph;
pub mod alternating_tree;
pub mod primal_updater;
pub mod dual_updater;
pub mod mwpm_solver;
pub mod visualize;

use util::*;
use mwpm_solver::*;


/// solve minimum-weight perfect matching with the default options (to inspect duals or statistics, keep a
/// [`mwpm_solver::BlossomSolver`] object instead)
pub fn blossom_mwpm(initializer: &SolverInitializer) -> Result<PerfectMatching, BlossomError> {
    BlossomSolver::mwpm_solve(initializer)
}
