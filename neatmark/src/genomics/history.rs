use super::{ConnectionGene, Error, GeneticConfig, Genome, NodeGene, NodeType, Result};
use crate::Innovation;

use ahash::RandomState;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// A `Registry` is the authority over node identities and
/// connection innovation numbers for one evolutionary run.
///
/// Node identities are dense and assigned in creation order,
/// starting with the configured input nodes, then the output nodes.
///
/// Connections are identified by the hash
/// `source * max_nodes + target` of their endpoints. The first
/// connection created between a pair of nodes is recorded as the
/// canonical one and receives the next innovation number; every
/// later connection between the same pair, in any genome, receives
/// that same number. Weight and enabled status are never shared.
///
/// Genomes borrow the registry mutably for the duration of any
/// operation that allocates structure, so allocation is serialized
/// by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    input_count: usize,
    output_count: usize,
    max_nodes: usize,
    nodes: Vec<NodeGene>,
    connections: Vec<ConnectionGene>,
    innovations: HashMap<u64, Innovation, RandomState>,
}

impl Registry {
    /// Creates a new registry seeded with the configured
    /// input and output nodes.
    ///
    /// # Errors
    /// Returns an error if `config` fails [validation].
    ///
    /// [validation]: GeneticConfig::validate
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, NodeType, Registry};
    /// use std::num::NonZeroUsize;
    ///
    /// let registry = Registry::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(registry.node_count(), 5);
    /// assert!(registry.inputs().all(|n| n.node_type() == NodeType::Input));
    /// assert!(registry.outputs().all(|n| n.node_type() == NodeType::Output));
    /// assert_eq!(registry.connection_count(), 0);
    /// ```
    pub fn new(config: &GeneticConfig) -> Result<Registry> {
        config.validate()?;
        let mut registry = Registry {
            input_count: 0,
            output_count: 0,
            max_nodes: config.max_nodes,
            nodes: vec![],
            connections: vec![],
            innovations: HashMap::default(),
        };
        registry.reset(config.input_count.get(), config.output_count.get())?;
        Ok(registry)
    }

    /// Forgets every node and connection, then reseeds
    /// the input and output nodes.
    ///
    /// # Errors
    /// Returns an error, leaving the registry untouched, if the
    /// input and output nodes would not leave identities to spare
    /// below `max_nodes`.
    pub fn reset(&mut self, input_count: usize, output_count: usize) -> Result<()> {
        match input_count.checked_add(output_count) {
            Some(seeded) if seeded < self.max_nodes => {}
            _ => return Err(Error::NodeLimitReached(self.max_nodes)),
        }
        debug!(
            "resetting registry with {} inputs and {} outputs",
            input_count, output_count
        );
        self.input_count = input_count;
        self.output_count = output_count;
        self.nodes.clear();
        self.connections.clear();
        self.innovations.clear();

        self.nodes.extend(
            (0..input_count)
                .map(|id| NodeGene::new(id, NodeType::Input))
                .chain(
                    (input_count..input_count + output_count)
                        .map(|id| NodeGene::new(id, NodeType::Output)),
                ),
        );
        Ok(())
    }

    /// Allocates the next node identity and registers
    /// a node of the passed type under it.
    ///
    /// # Errors
    /// Returns an error if `max_nodes` identities are already in use,
    /// since further identities would break connection hash uniqueness.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, NodeType, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// let first = registry.create_node(NodeType::Hidden).unwrap();
    /// let second = registry.create_node(NodeType::Hidden).unwrap();
    ///
    /// assert_eq!(second.innovation(), first.innovation() + 1);
    /// ```
    pub fn create_node(&mut self, node_type: NodeType) -> Result<NodeGene> {
        if self.nodes.len() >= self.max_nodes {
            return Err(Error::NodeLimitReached(self.max_nodes));
        }
        let node = NodeGene::new(self.nodes.len(), node_type);
        trace!("registered node {}", node);
        self.nodes.push(node);
        Ok(node)
    }

    /// Returns a new connection between `source` and `target`.
    ///
    /// If a connection between the same pair was created before,
    /// the new gene reuses its innovation number; otherwise the next
    /// innovation number is assigned and the gene becomes canonical.
    /// The returned gene is always a fresh, enabled value.
    ///
    /// # Errors
    /// Returns an error if either node was not created by this registry,
    /// if `target` is an input node or if `source` is an output node.
    /// Also fails if the pair's hash does not fit in 64 bits, which
    /// only happens for a `max_nodes` that would not pass validation.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// let input = *registry.node(0).unwrap();
    /// let output = *registry.node(1).unwrap();
    ///
    /// let first = registry.create_connection(&input, &output, 0.5).unwrap();
    /// let second = registry.create_connection(&input, &output, -2.0).unwrap();
    ///
    /// assert_eq!(first.innovation(), second.innovation());
    /// assert_eq!(second.weight(), -2.0);
    /// assert_eq!(registry.connection_count(), 1);
    /// ```
    pub fn create_connection(
        &mut self,
        source: &NodeGene,
        target: &NodeGene,
        weight: f32,
    ) -> Result<ConnectionGene> {
        self.check_registered(source)?;
        self.check_registered(target)?;
        if !source.can_be_source() {
            return Err(Error::OutputSource(source.innovation()));
        }
        if !target.can_be_target() {
            return Err(Error::InputTarget(target.innovation()));
        }

        let hash = self
            .connection_hash(source.innovation(), target.innovation())
            .ok_or(Error::NodeLimitReached(self.max_nodes))?;
        let next_innovation = self.connections.len();
        let innovation = match self.innovations.entry(hash) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                entry.insert(next_innovation);
                self.connections.push(ConnectionGene::new(
                    next_innovation,
                    source.innovation(),
                    target.innovation(),
                    weight,
                ));
                trace!(
                    "registered innovation {} for {} -> {}",
                    next_innovation,
                    source.innovation(),
                    target.innovation()
                );
                next_innovation
            }
        };

        Ok(ConnectionGene::new(
            innovation,
            source.innovation(),
            target.innovation(),
            weight,
        ))
    }

    fn check_registered(&self, node: &NodeGene) -> Result<()> {
        match self.nodes.get(node.innovation()) {
            Some(registered) if registered == node => Ok(()),
            Some(registered) => Err(Error::UnexpectedNodeType {
                id: node.innovation(),
                expected: registered.node_type(),
                found: node.node_type(),
            }),
            None => Err(Error::UnknownNode(node.innovation())),
        }
    }

    /// Returns the historical hash of a connection from
    /// `source` to `target`, `source * max_nodes + target`,
    /// or `None` if it overflows a `u64`.
    pub fn connection_hash(&self, source: Innovation, target: Innovation) -> Option<u64> {
        (source as u64)
            .checked_mul(self.max_nodes as u64)?
            .checked_add(target as u64)
    }

    /// Returns the innovation number assigned to connections
    /// from `source` to `target`, if any was ever created.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// assert_eq!(registry.innovation_of(0, 1), None);
    ///
    /// let mut genome = registry.empty_genome();
    /// genome.create_connection(&mut registry, 0, 1, 1.0).unwrap();
    ///
    /// assert_eq!(registry.innovation_of(0, 1), Some(0));
    /// assert_eq!(registry.innovation_of(1, 0), None);
    /// ```
    pub fn innovation_of(&self, source: Innovation, target: Innovation) -> Option<Innovation> {
        let hash = self.connection_hash(source, target)?;
        self.innovations.get(&hash).copied()
    }

    /// Returns a genome containing every registered
    /// input and output node, and no connections.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, NodeType, Registry};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut registry = Registry::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(3).unwrap(),
    ///     ..GeneticConfig::zero()
    /// })
    /// .unwrap();
    /// // Hidden nodes are not part of empty genomes.
    /// registry.create_node(NodeType::Hidden).unwrap();
    ///
    /// let genome = registry.empty_genome();
    /// assert_eq!(genome.nodes().count(), 6);
    /// assert_eq!(genome.connections().count(), 0);
    /// ```
    pub fn empty_genome(&self) -> Genome {
        Genome::with_nodes(self.inputs().chain(self.outputs()).copied())
    }

    /// Returns the registered node with identity `id`.
    ///
    /// # Errors
    /// Returns an error if the identity has not been assigned.
    pub fn node(&self, id: Innovation) -> Result<&NodeGene> {
        self.nodes.get(id).ok_or(Error::UnknownNode(id))
    }

    /// Returns the canonical connection with the passed innovation
    /// number, i.e. the first one created between its endpoints.
    ///
    /// # Errors
    /// Returns an error if the innovation number has not been assigned.
    pub fn connection(&self, innovation: Innovation) -> Result<&ConnectionGene> {
        self.connections
            .get(innovation)
            .ok_or(Error::UnknownConnection(innovation))
    }

    /// Returns an iterator over all registered nodes, by identity.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.iter()
    }

    /// Returns an iterator over all canonical connections, by innovation.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.iter()
    }

    /// Returns an iterator over the input nodes.
    pub fn inputs(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes
            .get(..self.input_count)
            .unwrap_or_default()
            .iter()
    }

    /// Returns an iterator over the output nodes.
    pub fn outputs(&self) -> impl Iterator<Item = &NodeGene> {
        let end = self.input_count.saturating_add(self.output_count);
        self.nodes
            .get(self.input_count..end)
            .unwrap_or_default()
            .iter()
    }

    /// Returns the number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of assigned innovation numbers.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Returns the number of input nodes.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Returns the number of output nodes.
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Returns the upper bound on node identities.
    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }
}
