use super::{Error, Result};

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Default upper bound on node identities, 2^20.
pub const DEFAULT_MAX_NODES: usize = 1 << 20;

/// Default cap on relaxation passes during evaluation.
pub const DEFAULT_MAX_EVALUATIONS: usize = 100;

/// Default retry budget for connection addition mutations.
pub const DEFAULT_MAX_CONNECTION_ATTEMPTS: usize = 100;

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Use
/// [`validate`] to check a hand-written or
/// deserialized configuration.
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Weight of excess genes in compatibility distance (C1).
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in compatibility distance (C2).
    pub disjoint_gene_factor: f32,
    /// Weight of the average common gene weight difference
    /// in compatibility distance (C3).
    pub common_weight_factor: f32,
    /// Distance below which two genomes are considered compatible.
    pub compatibility_threshold: f32,
    /// Genomes with fewer connections than this are not
    /// normalized by size in compatibility distance.
    pub small_genome_threshold: usize,
    /// Chance that a connection's weight is mutated
    /// during [`mutate`](crate::genomics::Genome::mutate).
    pub weight_mutation_chance: f32,
    /// Chance that a mutated weight is shifted.
    pub weight_shift_chance: f32,
    /// Chance that a mutated weight is replaced, when not shifted.
    /// `weight_shift_chance + weight_random_chance` should not exceed 1.
    pub weight_random_chance: f32,
    /// Magnitude of bound on weight shift uniform distribution.
    pub weight_shift_strength: f32,
    /// Magnitude of bound on weight replacement uniform distribution.
    pub weight_random_strength: f32,
    /// Magnitude of bound on the weight of connections
    /// created by connection addition mutations.
    pub initial_weight_bound: f32,
    /// Chance of a node addition mutation during `mutate`.
    pub node_addition_mutation_chance: f32,
    /// Chance of a connection addition mutation during `mutate`.
    pub connection_addition_mutation_chance: f32,
    /// Maximum number of node pairs sampled by a connection
    /// addition mutation before it gives up.
    pub max_connection_addition_attempts: usize,
    /// Chance an inherited gene is disabled if it was
    /// disabled in either parent.
    pub inherit_disabled_chance: f32,
    /// Upper bound on node identities. Connection hashes are
    /// computed as `source * max_nodes + target`.
    pub max_nodes: usize,
    /// Maximum number of relaxation passes in an evaluation.
    pub max_evaluations: usize,
}

impl GeneticConfig {
    /// Returns a "zero-valued" configuration.
    /// All rates and factors are 0, counts are 1, and
    /// the `max_*` limits keep their default values.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::GeneticConfig;
    ///
    /// let cfg = GeneticConfig {
    ///     // Specify some values here...
    ///     node_addition_mutation_chance: 1.0,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(cfg.validate().is_ok());
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
            compatibility_threshold: 0.0,
            small_genome_threshold: 0,
            weight_mutation_chance: 0.0,
            weight_shift_chance: 0.0,
            weight_random_chance: 0.0,
            weight_shift_strength: 0.0,
            weight_random_strength: 0.0,
            initial_weight_bound: 0.0,
            node_addition_mutation_chance: 0.0,
            connection_addition_mutation_chance: 0.0,
            max_connection_addition_attempts: DEFAULT_MAX_CONNECTION_ATTEMPTS,
            inherit_disabled_chance: 0.0,
            max_nodes: DEFAULT_MAX_NODES,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }

    /// Checks that every probability lies in `[0, 1]`, that
    /// magnitudes are non-negative, and that `max_nodes` leaves
    /// room beyond the input and output nodes while keeping
    /// connection hashes within 64 bits.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] naming the first offending field.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::GeneticConfig;
    ///
    /// assert!(GeneticConfig::default().validate().is_ok());
    ///
    /// let config = GeneticConfig {
    ///     inherit_disabled_chance: 1.5,
    ///     ..GeneticConfig::default()
    /// };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        let chances = [
            ("weight_mutation_chance", self.weight_mutation_chance),
            ("weight_shift_chance", self.weight_shift_chance),
            ("weight_random_chance", self.weight_random_chance),
            (
                "node_addition_mutation_chance",
                self.node_addition_mutation_chance,
            ),
            (
                "connection_addition_mutation_chance",
                self.connection_addition_mutation_chance,
            ),
            ("inherit_disabled_chance", self.inherit_disabled_chance),
        ];
        if let Some((name, value)) = chances
            .iter()
            .find(|(_, chance)| !(0.0..=1.0).contains(chance))
        {
            return Err(Error::InvalidConfig {
                name: *name,
                value: *value as f64,
            });
        }
        if self.weight_shift_chance + self.weight_random_chance > 1.0 + f32::EPSILON {
            return Err(Error::InvalidConfig {
                name: "weight_random_chance",
                value: self.weight_random_chance as f64,
            });
        }

        let magnitudes = [
            ("excess_gene_factor", self.excess_gene_factor),
            ("disjoint_gene_factor", self.disjoint_gene_factor),
            ("common_weight_factor", self.common_weight_factor),
            ("compatibility_threshold", self.compatibility_threshold),
            ("weight_shift_strength", self.weight_shift_strength),
            ("weight_random_strength", self.weight_random_strength),
            ("initial_weight_bound", self.initial_weight_bound),
        ];
        if let Some((name, value)) = magnitudes
            .iter()
            .find(|(_, magnitude)| !(magnitude.is_finite() && *magnitude >= 0.0))
        {
            return Err(Error::InvalidConfig {
                name: *name,
                value: *value as f64,
            });
        }

        let seeded = self.input_count.get().saturating_add(self.output_count.get());
        let hash_space = (self.max_nodes as u64).checked_mul(self.max_nodes as u64);
        if self.max_nodes <= seeded || hash_space.is_none() {
            return Err(Error::InvalidConfig {
                name: "max_nodes",
                value: self.max_nodes as f64,
            });
        }
        Ok(())
    }
}

impl Default for GeneticConfig {
    /// The parameter set of the canonical NEAT experiments.
    fn default() -> GeneticConfig {
        GeneticConfig {
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 0.4,
            compatibility_threshold: 3.0,
            small_genome_threshold: 20,
            weight_mutation_chance: 0.8,
            weight_shift_chance: 0.9,
            weight_random_chance: 0.1,
            weight_shift_strength: 0.3,
            weight_random_strength: 1.0,
            initial_weight_bound: 1.0,
            node_addition_mutation_chance: 0.03,
            connection_addition_mutation_chance: 0.05,
            inherit_disabled_chance: 0.75,
            ..GeneticConfig::zero()
        }
    }
}
