use crate::rand_xoshiro;
use crate::rand_xoshiro::rand_core::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// edge weights, dual variables and slacks; integer weights stay exact because every dual change is a dyadic fraction
pub type Weight = f64;
pub type VertexIndex = usize;
pub type EdgeIndex = usize;
/// index of a node in [`crate::blossom_graph::BlossomState::nodes`]; the first `vertex_num` nodes are the vertices
pub type NodeIndex = usize;
pub type TreeIndex = usize;
pub type TreeEdgeIndex = usize;
pub type VertexNum = usize;

/// tolerance used when comparing floating point duals against each other in certificates
pub const WEIGHT_TOLERANCE: Weight = 1e-9;

/// errors that are caused by the input rather than by a bug of the algorithm
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlossomError {
    #[error("graph has {0} vertices, a perfect matching requires an even number")]
    OddVertexNum(VertexNum),
    #[error("edge {edge} refers to vertex {vertex} but there are only {vertex_num} vertices")]
    VertexOutOfRange { edge: EdgeIndex, vertex: VertexIndex, vertex_num: VertexNum },
    #[error("edge {edge} is a self loop on vertex {vertex}")]
    SelfLoop { edge: EdgeIndex, vertex: VertexIndex },
    #[error("edge {edge} has a non-finite weight")]
    NonFiniteWeight { edge: EdgeIndex },
    #[error("the graph does not have a perfect matching")]
    NoPerfectMatching,
    #[error("failed to record a visualizer snapshot: {0}")]
    Visualizer(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverInitializer {
    /// the number of vertices
    pub vertex_num: VertexNum,
    /// weighted edges, where vertex indices are within the range [0, vertex_num)
    pub weighted_edges: Vec<(VertexIndex, VertexIndex, Weight)>,
}

impl SolverInitializer {

    pub fn new(vertex_num: VertexNum, weighted_edges: Vec<(VertexIndex, VertexIndex, Weight)>) -> Self {
        Self {
            vertex_num,
            weighted_edges,
        }
    }

    /// reject inputs on which no primal operation should ever run
    pub fn validate(&self) -> Result<(), BlossomError> {
        if self.vertex_num % 2 == 1 {
            return Err(BlossomError::OddVertexNum(self.vertex_num))
        }
        for (edge_index, &(i, j, weight)) in self.weighted_edges.iter().enumerate() {
            for vertex in [i, j] {
                if vertex >= self.vertex_num {
                    return Err(BlossomError::VertexOutOfRange { edge: edge_index, vertex, vertex_num: self.vertex_num })
                }
            }
            if i == j {
                return Err(BlossomError::SelfLoop { edge: edge_index, vertex: i })
            }
            if !weight.is_finite() {
                return Err(BlossomError::NonFiniteWeight { edge: edge_index })
            }
        }
        Ok(())
    }

    /// minimum edge weight, or 0 for an empty edge set
    pub fn min_weight(&self) -> Weight {
        self.weighted_edges.iter().map(|&(_, _, weight)| weight).fold(None, |min: Option<Weight>, weight| {
            Some(min.map_or(weight, |min| min.min(weight)))
        }).unwrap_or(0.)
    }

}

#[allow(dead_code)]
/// use Xoshiro256StarStar for deterministic random number generator
pub type DeterministicRng = rand_xoshiro::Xoshiro256StarStar;

pub trait F64Rng {
    fn next_f64(&mut self) -> f64;
}

impl F64Rng for DeterministicRng {
    fn next_f64(&mut self) -> f64 {
        f64::from_bits(0x3FF << 52 | self.next_u64() >> 12) - 1.
    }
}

/// random graph with integer weights in `[0, max_weight]`; when `plant_perfect_matching` is set,
/// a random perfect matching is always part of the edge set so that a solution exists
pub fn random_graph(vertex_num: VertexNum, edge_probability: f64, max_weight: u32, plant_perfect_matching: bool, seed: u64) -> SolverInitializer {
    let mut rng = DeterministicRng::seed_from_u64(seed);
    let mut weighted_edges = vec![];
    let random_weight = |rng: &mut DeterministicRng| (rng.next_u32() % (max_weight + 1)) as Weight;
    if plant_perfect_matching {
        // Fisher-Yates shuffle, then pair consecutive vertices
        let mut order: Vec<VertexIndex> = (0..vertex_num).collect();
        for i in (1..vertex_num).rev() {
            let j = (rng.next_u64() % (i as u64 + 1)) as usize;
            order.swap(i, j);
        }
        for pair in order.chunks(2) {
            if let [a, b] = *pair {
                let weight = random_weight(&mut rng);
                weighted_edges.push((a, b, weight));
            }
        }
    }
    for i in 0..vertex_num {
        for j in (i + 1)..vertex_num {
            if rng.next_f64() < edge_probability {
                let weight = random_weight(&mut rng);
                weighted_edges.push((i, j, weight));
            }
        }
    }
    SolverInitializer::new(vertex_num, weighted_edges)
}

/// exact minimum-weight perfect matching by dynamic programming over vertex subsets, used as ground truth;
/// returns `None` if no perfect matching exists
pub fn brute_force_min_weight(initializer: &SolverInitializer) -> Option<Weight> {
    let vertex_num = initializer.vertex_num;
    assert!(vertex_num <= 24, "brute force matching is exponential, {} vertices is too many", vertex_num);
    if vertex_num % 2 == 1 {
        return None
    }
    // keep only the lightest of parallel edges
    let mut lightest = BTreeMap::<(VertexIndex, VertexIndex), Weight>::new();
    for &(i, j, weight) in initializer.weighted_edges.iter() {
        let key = if i < j { (i, j) } else { (j, i) };
        let entry = lightest.entry(key).or_insert(weight);
        if weight < *entry {
            *entry = weight;
        }
    }
    let mut neighbors: Vec<Vec<(VertexIndex, Weight)>> = vec![vec![]; vertex_num];
    for (&(i, j), &weight) in lightest.iter() {
        neighbors[i].push((j, weight));
        neighbors[j].push((i, weight));
    }
    let full: usize = (1usize << vertex_num) - 1;
    // best[mask] is the minimum weight of matching all vertices in `mask`
    let mut best: Vec<Option<Weight>> = vec![None; full + 1];
    best[0] = Some(0.);
    for mask in 1..=full {
        if mask.count_ones() % 2 == 1 {
            continue
        }
        let lowest = mask.trailing_zeros() as usize;
        let mut result: Option<Weight> = None;
        for &(peer, weight) in neighbors[lowest].iter() {
            if mask & (1 << peer) == 0 {
                continue
            }
            if let Some(rest) = best[mask & !(1 << lowest) & !(1 << peer)] {
                let candidate = rest + weight;
                if result.map_or(true, |current| candidate < current) {
                    result = Some(candidate);
                }
            }
        }
        best[mask] = result;
    }
    best[full]
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn util_validate_initializer() {  // cargo test util_validate_initializer -- --nocapture
        let triangle = SolverInitializer::new(3, vec![(0, 1, 1.), (1, 2, 1.), (2, 0, 1.)]);
        assert_eq!(triangle.validate(), Err(BlossomError::OddVertexNum(3)));
        let out_of_range = SolverInitializer::new(2, vec![(0, 2, 1.)]);
        assert_eq!(out_of_range.validate(), Err(BlossomError::VertexOutOfRange { edge: 0, vertex: 2, vertex_num: 2 }));
        let self_loop = SolverInitializer::new(2, vec![(0, 1, 1.), (1, 1, 1.)]);
        assert_eq!(self_loop.validate(), Err(BlossomError::SelfLoop { edge: 1, vertex: 1 }));
        let nan = SolverInitializer::new(2, vec![(0, 1, Weight::NAN)]);
        assert_eq!(nan.validate(), Err(BlossomError::NonFiniteWeight { edge: 0 }));
        let square = SolverInitializer::new(4, vec![(0, 1, 1.), (1, 2, 1.), (2, 3, 1.), (3, 0, 1.)]);
        assert_eq!(square.validate(), Ok(()));
        assert_eq!(square.min_weight(), 1.);
    }

    #[test]
    fn util_brute_force_small_cases() {  // cargo test util_brute_force_small_cases -- --nocapture
        let square = SolverInitializer::new(4, vec![(0, 1, 1.), (1, 2, 1.), (2, 3, 1.), (3, 0, 1.)]);
        assert_eq!(brute_force_min_weight(&square), Some(2.));
        let weighted_square = SolverInitializer::new(4, vec![(0, 1, 5.), (1, 2, 1.), (2, 3, 5.), (3, 0, 1.), (0, 2, 0.)]);
        assert_eq!(brute_force_min_weight(&weighted_square), Some(2.));
        let star = SolverInitializer::new(4, vec![(0, 1, 1.), (0, 2, 1.), (0, 3, 1.)]);
        assert_eq!(brute_force_min_weight(&star), None);
        let empty = SolverInitializer::new(0, vec![]);
        assert_eq!(brute_force_min_weight(&empty), Some(0.));
    }

    #[test]
    fn util_random_graph_planted_matching() {  // cargo test util_random_graph_planted_matching -- --nocapture
        for seed in 0..20 {
            let initializer = random_graph(10, 0.2, 30, true, seed);
            assert!(initializer.validate().is_ok());
            assert!(brute_force_min_weight(&initializer).is_some(), "planted matching must exist for seed {}", seed);
        }
        let first = random_graph(8, 0.5, 10, false, 42);
        let second = random_graph(8, 0.5, 10, false, 42);
        assert_eq!(first.weighted_edges, second.weighted_edges, "generator must be deterministic");
    }

}
