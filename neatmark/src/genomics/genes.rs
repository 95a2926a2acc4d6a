use crate::Innovation;

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Connection genes are the principal components of genomes.
/// They are created between two nodes, and become
/// network connections in the genome's phenotype.
///
/// Two connection genes between the same pair of nodes
/// always carry the same innovation number, whichever
/// genome or mutation produced them. Weight and enabled
/// status belong to each genome's own copy.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    innovation: Innovation,
    source: Innovation,
    target: Innovation,
    weight: f32,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new _enabled_ connection gene. Innovation numbers
    /// are assigned by the registry.
    pub(crate) fn new(
        innovation: Innovation,
        source: Innovation,
        target: Innovation,
        weight: f32,
    ) -> ConnectionGene {
        ConnectionGene {
            innovation,
            source,
            target,
            weight,
            enabled: true,
        }
    }

    /// Returns a uniformly distributed value in `[-bound, bound]`.
    pub(crate) fn random_weight<R: Rng + ?Sized>(bound: f32, rng: &mut R) -> f32 {
        if bound > 0.0 {
            rng.gen_range(-bound..=bound)
        } else {
            0.0
        }
    }

    /// Perturbs the weight by a uniform amount in `[-strength, strength]`.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// let mut genome = registry.empty_genome();
    /// genome.create_connection(&mut registry, 0, 1, 3.0).unwrap();
    ///
    /// let gene = genome.connection_mut(0).unwrap();
    /// gene.shift_weight(0.5, &mut rand::thread_rng());
    /// assert!((gene.weight() - 3.0).abs() <= 0.5);
    /// ```
    pub fn shift_weight<R: Rng + ?Sized>(&mut self, strength: f32, rng: &mut R) {
        self.weight += Self::random_weight(1.0, rng) * strength;
    }

    /// Replaces the weight with a uniform value in `[-strength, strength]`.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// let mut genome = registry.empty_genome();
    /// genome.create_connection(&mut registry, 0, 1, 30.0).unwrap();
    ///
    /// let gene = genome.connection_mut(0).unwrap();
    /// gene.randomize_weight(2.0, &mut rand::thread_rng());
    /// assert!(gene.weight().abs() <= 2.0);
    /// ```
    pub fn randomize_weight<R: Rng + ?Sized>(&mut self, strength: f32, rng: &mut R) {
        self.weight = Self::random_weight(1.0, rng) * strength;
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the identity of the node the connection originates from.
    pub fn source(&self) -> Innovation {
        self.source
    }

    /// Returns the identity of the node the connection feeds into.
    pub fn target(&self) -> Innovation {
        self.target
    }

    /// Returns the `(source, target)` pair.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.source, self.target)
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the gene's weight.
    pub fn set_weight(&mut self, w: f32) {
        self.weight = w;
    }

    /// Returns whether the gene is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the gene's expression status.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.source,
            self.target,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}
