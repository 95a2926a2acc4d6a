//! # neatmark
//! The core mechanics of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Provides:
//! - a [`Registry`] that hands out node identities and connection
//!   innovation numbers, so that identical structural mutations arising
//!   independently receive the same historical marking;
//! - a [`Genome`] type with the classic NEAT mutation operators, the
//!   historical-marking alignment used by both [compatibility distance]
//!   and [crossover];
//! - a [`RecurrentNetwork`] phenotype that evaluates possibly cyclic
//!   topologies by iterative relaxation.
//!
//! Population-level bookkeeping (speciation, stagnation, reproduction) is
//! left to downstream consumers; this crate supplies the single- and
//! two-genome operations such a loop calls.
//!
//! [`Registry`]: crate::genomics::Registry
//! [`Genome`]: crate::genomics::Genome
//! [compatibility distance]: crate::genomics::Genome::compatibility_distance
//! [crossover]: crate::genomics::Genome::crossover
//! [`RecurrentNetwork`]: crate::networks::RecurrentNetwork
//!
//! # Example usage: growing and comparing two genomes
//! ```
//! use neatmark::genomics::{GeneticConfig, Genome, Registry};
//! use std::num::NonZeroUsize;
//!
//! let config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     ..GeneticConfig::default()
//! };
//! let mut registry = Registry::new(&config).unwrap();
//! let mut rng = rand::thread_rng();
//!
//! let mut first = registry.empty_genome();
//! first.create_connection(&mut registry, 0, 2, 0.5).unwrap();
//! first.create_connection(&mut registry, 1, 2, -0.5).unwrap();
//!
//! let mut second = first.clone();
//! second.mutate_node(&mut registry, &mut rng).unwrap();
//!
//! // Both genomes share the historical markings of their common structure.
//! let distance = Genome::compatibility_distance(&first, &second, &config);
//! assert!(distance > 0.0);
//!
//! let child = Genome::crossover(&second, &first, &config, &mut rng).unwrap();
//! assert_eq!(child.connections().count(), second.connections().count());
//!
//! let evaluation = child.evaluate(&[1.0, 1.0], &config).unwrap();
//! assert_eq!(evaluation.outputs.len(), 1);
//! ```

pub mod genomics;
pub mod networks;

pub use genomics::{
    ConnectionGene, Error, ErrorKind, GeneticConfig, Genome, NodeGene, NodeType, Registry,
};
pub use networks::{Evaluation, RecurrentNetwork};

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
///
/// Node identities and connection innovation numbers
/// are both drawn from this type, from separate counters.
pub type Innovation = usize;
