use super::{ConnectionGene, Error, GeneticConfig, Genome, Result};
use crate::Innovation;

use rand::Rng;

use std::collections::btree_map;
use std::iter::Peekable;

/// Gene counts from aligning two genomes
/// by innovation number.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Alignment {
    /// Genes beyond the other genome's highest innovation number.
    pub excess: usize,
    /// Unmatched genes within both genomes' innovation range.
    pub disjoint: usize,
    /// Genes present in both genomes.
    pub matching: usize,
    /// Sum of absolute weight differences between matching genes.
    pub weight_difference: f32,
}

impl Alignment {
    /// Returns the average absolute weight difference
    /// between matching genes.
    ///
    /// # Errors
    /// Returns [`Error::NoMatchingGenes`] if there are none.
    pub fn mean_weight_difference(&self) -> Result<f32> {
        if self.matching == 0 {
            Err(Error::NoMatchingGenes)
        } else {
            Ok(self.weight_difference / self.matching as f32)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Side {
    First,
    Second,
}

#[derive(Debug)]
enum Aligned<'a> {
    Matching(&'a ConnectionGene, &'a ConnectionGene),
    Disjoint(Side, &'a ConnectionGene),
    Excess(Side, &'a ConnectionGene),
}

/// Merge scan over two genomes' connections
/// in ascending innovation order.
struct Genes<'a> {
    first: Peekable<btree_map::Values<'a, Innovation, ConnectionGene>>,
    second: Peekable<btree_map::Values<'a, Innovation, ConnectionGene>>,
}

impl<'a> Genes<'a> {
    fn new(first: &'a Genome, second: &'a Genome) -> Genes<'a> {
        Genes {
            first: first.connections.values().peekable(),
            second: second.connections.values().peekable(),
        }
    }
}

impl<'a> Iterator for Genes<'a> {
    type Item = Aligned<'a>;

    fn next(&mut self) -> Option<Aligned<'a>> {
        let first = self.first.peek().map(|g| g.innovation());
        let second = self.second.peek().map(|g| g.innovation());
        match (first, second) {
            (Some(a), Some(b)) if a == b => {
                let (a, b) = (self.first.next()?, self.second.next()?);
                Some(Aligned::Matching(a, b))
            }
            (Some(a), Some(b)) if a < b => {
                self.first.next().map(|g| Aligned::Disjoint(Side::First, g))
            }
            (Some(_), Some(_)) => self.second.next().map(|g| Aligned::Disjoint(Side::Second, g)),
            (Some(_), None) => self.first.next().map(|g| Aligned::Excess(Side::First, g)),
            (None, Some(_)) => self.second.next().map(|g| Aligned::Excess(Side::Second, g)),
            (None, None) => None,
        }
    }
}

impl Genome {
    /// Aligns the connections of two genomes by innovation number,
    /// counting matching, disjoint and excess genes.
    ///
    /// Excess genes are those of the genome with the higher maximum
    /// innovation number lying past the other's maximum, so the
    /// result does not depend on argument order.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Genome, Registry};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut registry = Registry::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     ..GeneticConfig::zero()
    /// })
    /// .unwrap();
    /// let mut first = registry.empty_genome();
    /// let mut second = registry.empty_genome();
    ///
    /// first.create_connection(&mut registry, 0, 3, 1.0).unwrap(); // 0
    /// second.create_connection(&mut registry, 1, 3, 1.0).unwrap(); // 1
    /// first.create_connection(&mut registry, 2, 3, 1.0).unwrap(); // 2
    /// second.create_connection(&mut registry, 0, 3, 3.0).unwrap(); // 0
    ///
    /// let alignment = Genome::alignment(&first, &second);
    /// assert_eq!(alignment.matching, 1);
    /// assert_eq!(alignment.disjoint, 1);
    /// assert_eq!(alignment.excess, 1);
    /// assert_eq!(alignment.mean_weight_difference().unwrap(), 2.0);
    /// ```
    pub fn alignment(first: &Genome, second: &Genome) -> Alignment {
        Genes::new(first, second).fold(Alignment::default(), |mut alignment, aligned| {
            match aligned {
                Aligned::Matching(a, b) => {
                    alignment.matching += 1;
                    alignment.weight_difference += (a.weight() - b.weight()).abs();
                }
                Aligned::Disjoint(..) => alignment.disjoint += 1,
                Aligned::Excess(..) => alignment.excess += 1,
            }
            alignment
        })
    }

    /// Calculates the _compatibility distance_ between two genomes:
    ///
    /// `C1 × excess / N + C2 × disjoint / N + C3 × mean weight difference`
    ///
    /// where `N` is the connection count of the larger genome, or 1
    /// if it is below `config.small_genome_threshold`. The weight
    /// term is 0 when the genomes share no genes.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Genome, Registry};
    /// use std::num::NonZeroUsize;
    ///
    /// // Completely arbitrary quantities.
    /// const EXCESS_FACTOR: f32 = 1.5;
    /// const DISJOINT_FACTOR: f32 = 0.5;
    /// const WEIGHT_FACTOR: f32 = 0.25;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     excess_gene_factor: EXCESS_FACTOR,
    ///     disjoint_gene_factor: DISJOINT_FACTOR,
    ///     common_weight_factor: WEIGHT_FACTOR,
    ///     small_genome_threshold: 20,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = Registry::new(&config).unwrap();
    /// let mut first = registry.empty_genome();
    /// let mut second = registry.empty_genome();
    ///
    /// // Common gene, weight difference of 2.0.
    /// first.create_connection(&mut registry, 0, 2, 1.0).unwrap();
    /// second.create_connection(&mut registry, 0, 2, -1.0).unwrap();
    /// // Excess gene.
    /// first.create_connection(&mut registry, 1, 2, 1.0).unwrap();
    ///
    /// assert_eq!(
    ///     Genome::compatibility_distance(&first, &second, &config),
    ///     EXCESS_FACTOR * 1.0 + WEIGHT_FACTOR * 2.0
    /// );
    /// assert_eq!(Genome::compatibility_distance(&first, &first, &config), 0.0);
    /// ```
    pub fn compatibility_distance(first: &Genome, second: &Genome, config: &GeneticConfig) -> f32 {
        let alignment = Self::alignment(first, second);

        let size = first.connections.len().max(second.connections.len());
        let normalizer = if size < config.small_genome_threshold {
            1.0
        } else {
            size.max(1) as f32
        };
        let weight_difference = alignment.mean_weight_difference().unwrap_or(0.0);

        config.excess_gene_factor * alignment.excess as f32 / normalizer
            + config.disjoint_gene_factor * alignment.disjoint as f32 / normalizer
            + config.common_weight_factor * weight_difference
    }

    /// Whether the compatibility distance between the two genomes
    /// is below `config.compatibility_threshold`.
    pub fn is_compatible(first: &Genome, second: &Genome, config: &GeneticConfig) -> bool {
        Self::compatibility_distance(first, second, config) < config.compatibility_threshold
    }

    /// Produces a child genome from two parents.
    ///
    /// Matching genes are inherited from either parent with equal
    /// chance. If a matching gene is disabled in either parent, the
    /// child's copy is disabled with probability
    /// `config.inherit_disabled_chance`, and enabled otherwise.
    /// Disjoint and excess genes are inherited from `primary` only.
    ///
    /// The child's nodes are exactly the endpoints of its connections.
    ///
    /// # Errors
    /// Returns an error if an inherited connection has an endpoint
    /// missing from both parents, which well-formed genomes never have.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Genome, Registry};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = Registry::new(&config).unwrap();
    /// let mut primary = registry.empty_genome();
    /// let mut secondary = registry.empty_genome();
    ///
    /// primary.create_connection(&mut registry, 0, 2, 1.0).unwrap();
    /// secondary.create_connection(&mut registry, 0, 2, 2.0).unwrap();
    /// secondary.create_connection(&mut registry, 1, 2, 1.0).unwrap();
    ///
    /// let child = Genome::crossover(&primary, &secondary, &config, &mut rand::thread_rng()).unwrap();
    ///
    /// // Only the matching gene is inherited, with either weight.
    /// assert_eq!(child.connections().count(), 1);
    /// assert!([1.0, 2.0].contains(&child.connection(0).unwrap().weight()));
    ///
    /// // Node 1 is not an endpoint of any inherited connection.
    /// assert_eq!(child.nodes().map(|n| n.innovation()).collect::<Vec<_>>(), vec![0, 2]);
    /// ```
    pub fn crossover<R: Rng + ?Sized>(
        primary: &Genome,
        secondary: &Genome,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Genome> {
        let mut child = Genome::default();

        for aligned in Genes::new(primary, secondary) {
            let gene = match aligned {
                Aligned::Matching(a, b) => {
                    let mut gene = (if rng.gen::<bool>() { a } else { b }).clone();
                    let disabled = !(a.enabled() && b.enabled());
                    gene.set_enabled(
                        !(disabled && rng.gen::<f32>() < config.inherit_disabled_chance),
                    );
                    gene
                }
                Aligned::Disjoint(Side::First, gene) | Aligned::Excess(Side::First, gene) => {
                    gene.clone()
                }
                Aligned::Disjoint(Side::Second, _) | Aligned::Excess(Side::Second, _) => continue,
            };
            child.connections.insert(gene.innovation(), gene);
        }

        let endpoints: Vec<Innovation> = child
            .connections()
            .flat_map(|c| [c.source(), c.target()])
            .collect();
        for id in endpoints {
            if !child.nodes.contains_key(&id) {
                let node = primary.node(id).or_else(|_| secondary.node(id))?;
                child.nodes.insert(id, *node);
            }
        }

        Ok(child)
    }
}
