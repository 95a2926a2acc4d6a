use super::{ConnectionGene, GeneticConfig, Genome, NodeGene, NodeType, Registry, Result};
use crate::Innovation;

use log::debug;
use rand::prelude::{IteratorRandom, Rng};

impl Genome {
    /// Induces a _connection mutation_ in the genome.
    ///
    /// Up to `config.max_connection_addition_attempts` pairs of
    /// distinct nodes are sampled. A pair is rejected if the target
    /// is an input node, the source an output node, or if the genome
    /// already holds the connection registered for the pair in either
    /// direction. The first acceptable pair is connected with a weight
    /// drawn from `[-initial_weight_bound, initial_weight_bound]`.
    ///
    /// Returns `Ok(None)` if every attempt was rejected.
    ///
    /// # Errors
    /// Returns an error only if the registry rejects the connection,
    /// which a genome built through the same registry never triggers.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     initial_weight_bound: 2.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = Registry::new(&config).unwrap();
    /// let mut genome = registry.empty_genome();
    ///
    /// let connection = genome
    ///     .mutate_connection(&mut registry, &config, &mut rand::thread_rng())
    ///     .unwrap()
    ///     .expect("two viable pairs exist")
    ///     .clone();
    ///
    /// // Only input -> output pairs are possible.
    /// assert_eq!(connection.target(), 2);
    /// assert!(connection.weight().abs() <= config.initial_weight_bound);
    /// ```
    pub fn mutate_connection<R: Rng + ?Sized>(
        &mut self,
        registry: &mut Registry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Option<&ConnectionGene>> {
        let candidates: Vec<NodeGene> = self.nodes().copied().collect();
        if candidates.len() < 2 {
            debug!("connection mutation skipped: fewer than two nodes");
            return Ok(None);
        }

        for _ in 0..config.max_connection_addition_attempts {
            let (source, target) = Self::sample_node_pair(&candidates, rng);
            if !source.can_be_source()
                || !target.can_be_target()
                || self.has_connection(registry, source.innovation(), target.innovation())
                || self.has_connection(registry, target.innovation(), source.innovation())
            {
                continue;
            }

            let weight = ConnectionGene::random_weight(config.initial_weight_bound, rng);
            let connection = registry.create_connection(&source, &target, weight)?;
            return self.add_connection(connection).map(Some);
        }

        debug!(
            "connection mutation found no viable pair in {} attempts",
            config.max_connection_addition_attempts
        );
        Ok(None)
    }

    /// Samples two distinct nodes uniformly.
    fn sample_node_pair<R: Rng + ?Sized>(
        nodes: &[NodeGene],
        rng: &mut R,
    ) -> (NodeGene, NodeGene) {
        let first = rng.gen_range(0..nodes.len());
        let mut second = rng.gen_range(0..nodes.len() - 1);
        if second >= first {
            second += 1;
        }
        (nodes[first], nodes[second])
    }

    /// Whether the genome holds the registered connection
    /// from `source` to `target`.
    fn has_connection(&self, registry: &Registry, source: Innovation, target: Innovation) -> bool {
        registry
            .innovation_of(source, target)
            .map_or(false, |innovation| self.connections.contains_key(&innovation))
    }

    /// Induces a _node mutation_ in the genome.
    ///
    /// A random enabled connection is disabled and replaced by a
    /// new hidden node, a connection from the original source to it
    /// with weight 1.0, and a connection from it to the original
    /// target carrying the original weight.
    ///
    /// Returns the two new connections and the new node, or
    /// `Ok(None)` if the genome has no enabled connections.
    ///
    /// # Errors
    /// Returns an error if the registry has run out of node identities.
    /// The genome is left unchanged in that case.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, NodeType, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// let mut genome = registry.empty_genome();
    /// genome.create_connection(&mut registry, 0, 1, 0.75).unwrap();
    ///
    /// let (incoming, node, outgoing) = genome
    ///     .mutate_node(&mut registry, &mut rand::thread_rng())
    ///     .unwrap()
    ///     .expect("one enabled connection exists");
    ///
    /// assert_eq!(node.node_type(), NodeType::Hidden);
    /// assert_eq!(incoming.endpoints(), (0, node.innovation()));
    /// assert_eq!(incoming.weight(), 1.0);
    /// assert_eq!(outgoing.endpoints(), (node.innovation(), 1));
    /// assert_eq!(outgoing.weight(), 0.75);
    ///
    /// // The split connection remains, disabled.
    /// assert!(!genome.connection(0).unwrap().enabled());
    /// ```
    pub fn mutate_node<R: Rng + ?Sized>(
        &mut self,
        registry: &mut Registry,
        rng: &mut R,
    ) -> Result<Option<(&ConnectionGene, &NodeGene, &ConnectionGene)>> {
        let split = match self.connections().filter(|c| c.enabled()).choose(rng) {
            Some(connection) => connection.clone(),
            None => {
                debug!("node mutation skipped: no enabled connections");
                return Ok(None);
            }
        };
        let source = *self.node(split.source())?;
        let target = *self.node(split.target())?;

        let node = registry.create_node(NodeType::Hidden)?;
        let incoming = registry.create_connection(&source, &node, 1.0)?;
        let outgoing = registry.create_connection(&node, &target, split.weight())?;
        let (incoming_id, outgoing_id) = (incoming.innovation(), outgoing.innovation());

        self.connection_mut(split.innovation())?.set_enabled(false);
        self.add_node(node)?;
        self.add_connection(incoming)?;
        self.add_connection(outgoing)?;

        Ok(Some((
            self.connection(incoming_id)?,
            self.node(node.innovation())?,
            self.connection(outgoing_id)?,
        )))
    }

    /// Shifts the weight of the connection with the passed innovation
    /// number by a uniform amount in `[-weight_shift_strength, weight_shift_strength]`.
    ///
    /// # Errors
    /// Returns an error if the genome has no such connection.
    pub fn mutate_weight_shift<R: Rng + ?Sized>(
        &mut self,
        innovation: Innovation,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<()> {
        self.connection_mut(innovation)?
            .shift_weight(config.weight_shift_strength, rng);
        Ok(())
    }

    /// Replaces the weight of the connection with the passed innovation
    /// number by a uniform value in `[-weight_random_strength, weight_random_strength]`.
    ///
    /// # Errors
    /// Returns an error if the genome has no such connection.
    pub fn mutate_weight_random<R: Rng + ?Sized>(
        &mut self,
        innovation: Innovation,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<()> {
        self.connection_mut(innovation)?
            .randomize_weight(config.weight_random_strength, rng);
        Ok(())
    }

    /// Induces _weight mutations_ in the genome.
    ///
    /// Each connection is mutated with probability
    /// `weight_mutation_chance`, by a shift with probability
    /// `weight_shift_chance`, else by replacement with
    /// probability `weight_random_chance`.
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for connection in self.connections.values_mut() {
            if rng.gen::<f32>() >= config.weight_mutation_chance {
                continue;
            }
            let choice = rng.gen::<f32>();
            if choice < config.weight_shift_chance {
                connection.shift_weight(config.weight_shift_strength, rng);
            } else if choice < config.weight_shift_chance + config.weight_random_chance {
                connection.randomize_weight(config.weight_random_strength, rng);
            }
        }
    }

    /// Performs all mutations on the genome: weight mutations,
    /// then a connection mutation with probability
    /// `connection_addition_mutation_chance`, then a node
    /// mutation with probability `node_addition_mutation_chance`.
    ///
    /// A connection added in this call may be split by
    /// the node mutation that follows it.
    ///
    /// # Errors
    /// Returns an error if a structural mutation fails,
    /// see [`mutate_connection`] and [`mutate_node`].
    ///
    /// [`mutate_connection`]: Genome::mutate_connection
    /// [`mutate_node`]: Genome::mutate_node
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    ///
    /// let config = GeneticConfig {
    ///     connection_addition_mutation_chance: 1.0,
    ///     node_addition_mutation_chance: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = Registry::new(&config).unwrap();
    /// let mut genome = registry.empty_genome();
    ///
    /// genome.mutate(&mut registry, &config, &mut rand::thread_rng()).unwrap();
    ///
    /// // The only possible connection was added, then split.
    /// assert_eq!(genome.nodes().count(), 3);
    /// assert_eq!(genome.connections().count(), 3);
    /// assert_eq!(genome.connections().filter(|c| c.enabled()).count(), 2);
    /// ```
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        registry: &mut Registry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<()> {
        self.mutate_weights(config, rng);
        if rng.gen::<f32>() < config.connection_addition_mutation_chance {
            self.mutate_connection(registry, config, rng)?;
        }
        if rng.gen::<f32>() < config.node_addition_mutation_chance {
            self.mutate_node(registry, rng)?;
        }
        Ok(())
    }
}
