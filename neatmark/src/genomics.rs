//! Genomes are the focus of evolution in NEAT.
//! They are a collection of connection genes and nodes that
//! can be instantiated as a phenotype (a recurrent neural network).
//! Genomes are progressively mutated, thus adding complexity
//! and functionality, and are aligned with one another through
//! the historical markings assigned by a [`Registry`].
mod alignment;
mod config;
mod errors;
mod genes;
mod history;
mod mutation;
mod nodes;

pub use alignment::Alignment;
pub use config::{
    GeneticConfig, DEFAULT_MAX_CONNECTION_ATTEMPTS, DEFAULT_MAX_EVALUATIONS, DEFAULT_MAX_NODES,
};
pub use errors::{Error, ErrorKind, Result};
pub use genes::ConnectionGene;
pub use history::Registry;
pub use nodes::{NodeGene, NodeType};

use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

/// A mutable collection of connection genes and nodes.
///
/// Both collections are keyed and iterated in ascending
/// order (node identity and innovation number respectively),
/// which alignment relies on.
///
/// Every connection's endpoints are nodes of the genome,
/// no two connections share an innovation number, input
/// nodes are never targets and output nodes never sources.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Genome {
    nodes: BTreeMap<Innovation, NodeGene>,
    connections: BTreeMap<Innovation, ConnectionGene>,
}

impl Genome {
    /// Returns a genome containing the passed nodes
    /// and no connections.
    pub(crate) fn with_nodes(nodes: impl IntoIterator<Item = NodeGene>) -> Genome {
        Genome {
            nodes: nodes.into_iter().map(|n| (n.innovation(), n)).collect(),
            connections: BTreeMap::new(),
        }
    }

    /// Creates a new node in `registry` and adds it to the genome.
    ///
    /// # Errors
    /// Returns an error if the registry has run out of node identities.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, NodeType, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// let mut genome = registry.empty_genome();
    ///
    /// let node = *genome.create_node(&mut registry, NodeType::Hidden).unwrap();
    ///
    /// assert_eq!(genome.nodes().count(), 3);
    /// assert_eq!(registry.node(node.innovation()).unwrap(), &node);
    /// ```
    pub fn create_node(
        &mut self,
        registry: &mut Registry,
        node_type: NodeType,
    ) -> Result<&NodeGene> {
        let node = registry.create_node(node_type)?;
        self.add_node(node)
    }

    /// Creates a connection between two of the genome's nodes
    /// through `registry`, and adds it to the genome.
    ///
    /// # Errors
    /// Returns an error if either endpoint is not in the genome,
    /// if the genome already has a connection between them, if
    /// `target` is an input node or if `source` is an output node.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, NodeType, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// let mut genome = registry.empty_genome();
    /// let hidden = genome.create_node(&mut registry, NodeType::Hidden).unwrap().innovation();
    ///
    /// let connection = genome.create_connection(&mut registry, 0, hidden, 2.5).unwrap();
    /// assert_eq!(connection.endpoints(), (0, hidden));
    /// assert_eq!(connection.weight(), 2.5);
    ///
    /// // Cycles and self-loops are allowed.
    /// genome.create_connection(&mut registry, hidden, hidden, -1.0).unwrap();
    /// genome.create_connection(&mut registry, hidden, 1, 1.0).unwrap();
    ///
    /// // Duplicates are not.
    /// assert!(genome.create_connection(&mut registry, 0, hidden, 1.0).is_err());
    /// ```
    pub fn create_connection(
        &mut self,
        registry: &mut Registry,
        source: Innovation,
        target: Innovation,
        weight: f32,
    ) -> Result<&ConnectionGene> {
        let (source, target) = match (self.nodes.get(&source), self.nodes.get(&target)) {
            (Some(s), Some(t)) => (*s, *t),
            _ => return Err(Error::NonexistantEndpoints(source, target)),
        };
        let connection = registry.create_connection(&source, &target, weight)?;
        self.add_connection(connection)
    }

    /// Adds a registered node to the genome.
    ///
    /// # Errors
    /// Returns an error if a node with the same identity
    /// is already present.
    pub fn add_node(&mut self, node: NodeGene) -> Result<&NodeGene> {
        if self.nodes.contains_key(&node.innovation()) {
            return Err(Error::DuplicateNode(node.innovation()));
        }
        Ok(self.nodes.entry(node.innovation()).or_insert(node))
    }

    /// Adds a connection gene to the genome, as is.
    ///
    /// # Errors
    /// Returns an error if the innovation number is already
    /// present, if either endpoint is missing from the genome,
    /// if the target is an input node or if the source is an
    /// output node.
    pub fn add_connection(&mut self, connection: ConnectionGene) -> Result<&ConnectionGene> {
        self.check_connection_viability(&connection)?;
        Ok(self
            .connections
            .entry(connection.innovation())
            .or_insert(connection))
    }

    fn check_connection_viability(&self, connection: &ConnectionGene) -> Result<()> {
        let (source, target) = connection.endpoints();
        if self.connections.contains_key(&connection.innovation()) {
            return Err(Error::DuplicateConnection {
                innovation: connection.innovation(),
                input: source,
                output: target,
            });
        }
        match (self.nodes.get(&source), self.nodes.get(&target)) {
            (Some(s), _) if !s.can_be_source() => Err(Error::OutputSource(source)),
            (_, Some(t)) if !t.can_be_target() => Err(Error::InputTarget(target)),
            (Some(_), Some(_)) => Ok(()),
            _ => Err(Error::NonexistantEndpoints(source, target)),
        }
    }

    /// Returns the node with identity `id`.
    ///
    /// # Errors
    /// Returns an error if the genome has no such node.
    pub fn node(&self, id: Innovation) -> Result<&NodeGene> {
        self.nodes.get(&id).ok_or(Error::UnknownNode(id))
    }

    /// Returns the connection with the passed innovation number.
    ///
    /// # Errors
    /// Returns an error if the genome has no such connection.
    pub fn connection(&self, innovation: Innovation) -> Result<&ConnectionGene> {
        self.connections
            .get(&innovation)
            .ok_or(Error::UnknownConnection(innovation))
    }

    /// Returns a mutable reference to the connection
    /// with the passed innovation number.
    ///
    /// # Errors
    /// Returns an error if the genome has no such connection.
    pub fn connection_mut(&mut self, innovation: Innovation) -> Result<&mut ConnectionGene> {
        self.connections
            .get_mut(&innovation)
            .ok_or(Error::UnknownConnection(innovation))
    }

    /// Returns an iterator over the genome's nodes,
    /// in ascending identity order.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    /// use std::num::NonZeroUsize;
    ///
    /// let registry = Registry::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// })
    /// .unwrap();
    /// let genome = registry.empty_genome();
    ///
    /// for node in genome.nodes() {
    ///     println!("node: {}", node);
    /// }
    /// ```
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// Returns an iterator over the genome's connections,
    /// in ascending innovation order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    /// Returns the highest innovation number in the genome,
    /// or `None` if it has no connections.
    pub fn max_innovation(&self) -> Option<Innovation> {
        self.connections.keys().next_back().copied()
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let connections: Vec<String> = self.connections().map(|c| c.to_string()).collect();
        let nodes: Vec<String> = self.nodes().map(|n| n.to_string()).collect();
        f.debug_struct("Genome")
            .field("Connections", &connections)
            .field("Nodes", &nodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn setup(inputs: usize, outputs: usize) -> (Registry, Genome) {
        let registry = Registry::new(&GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            ..GeneticConfig::zero()
        })
        .unwrap();
        let genome = registry.empty_genome();
        (registry, genome)
    }

    #[test]
    fn create_connection() {
        let (mut registry, mut genome) = setup(2, 1);
        let connection = genome
            .create_connection(&mut registry, 1, 2, 0.5)
            .unwrap()
            .clone();

        assert_eq!(connection.innovation(), 0);
        assert_eq!(genome.connection(0).unwrap(), &connection);
        assert_eq!(genome.max_innovation(), Some(0));
    }

    #[test]
    fn create_connection_invalid_endpoints() {
        let (mut registry, mut genome) = setup(2, 1);

        assert_eq!(
            genome.create_connection(&mut registry, 2, 0, 1.0).unwrap_err(),
            Error::OutputSource(2)
        );
        assert_eq!(
            genome.create_connection(&mut registry, 0, 1, 1.0).unwrap_err(),
            Error::InputTarget(1)
        );
        assert_eq!(
            genome.create_connection(&mut registry, 0, 7, 1.0).unwrap_err(),
            Error::NonexistantEndpoints(0, 7)
        );
        assert_eq!(genome.connections().count(), 0);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn create_connection_duplicate() {
        let (mut registry, mut genome) = setup(1, 1);
        genome.create_connection(&mut registry, 0, 1, 1.0).unwrap();

        assert_eq!(
            genome.create_connection(&mut registry, 0, 1, 2.0).unwrap_err(),
            Error::DuplicateConnection {
                innovation: 0,
                input: 0,
                output: 1
            }
        );
        assert_eq!(genome.connection(0).unwrap().weight(), 1.0);
        assert_eq!(genome.connections().count(), 1);
        assert_eq!(registry.connection_count(), 1);
        assert_eq!(registry.connection(0).unwrap().weight(), 1.0);
    }

    #[test]
    fn independent_genomes_share_innovations() {
        let (mut registry, mut first) = setup(2, 1);
        let mut second = registry.empty_genome();

        first.create_connection(&mut registry, 0, 2, 1.0).unwrap();
        first.create_connection(&mut registry, 1, 2, 1.0).unwrap();
        // Created in the opposite order in the second genome.
        second.create_connection(&mut registry, 1, 2, -1.0).unwrap();
        second.create_connection(&mut registry, 0, 2, -1.0).unwrap();

        let innovations = |g: &Genome| {
            g.connections()
                .map(|c| (c.endpoints(), c.innovation()))
                .collect::<Vec<_>>()
        };
        assert_eq!(innovations(&first), vec![((0, 2), 0), ((1, 2), 1)]);
        assert_eq!(innovations(&first), innovations(&second));
    }

    #[test]
    fn add_node_duplicate() {
        let (registry, mut genome) = setup(1, 1);
        let input = *registry.node(0).unwrap();
        assert_eq!(genome.add_node(input), Err(Error::DuplicateNode(0)));
    }

    #[test]
    fn add_connection_requires_endpoints() {
        let (mut registry, mut genome) = setup(1, 1);
        let hidden = registry.create_node(NodeType::Hidden).unwrap();
        let input = *registry.node(0).unwrap();
        let connection = registry.create_connection(&input, &hidden, 1.0).unwrap();

        assert_eq!(
            genome.add_connection(connection.clone()),
            Err(Error::NonexistantEndpoints(0, hidden.innovation()))
        );
        genome.add_node(hidden).unwrap();
        assert!(genome.add_connection(connection).is_ok());
    }

    #[test]
    fn lookups() {
        let (_, mut genome) = setup(1, 1);
        assert_eq!(genome.node(5).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(genome.connection(0).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(genome.connection_mut(0).is_err());
        assert_eq!(genome.max_innovation(), None);
    }

    #[test]
    fn ordered_iteration() {
        let (mut registry, mut genome) = setup(2, 2);
        let h = genome
            .create_node(&mut registry, NodeType::Hidden)
            .unwrap()
            .innovation();
        for (s, t) in [(h, 3), (0, h), (1, 2), (0, 3)] {
            genome.create_connection(&mut registry, s, t, 1.0).unwrap();
        }
        let ids: Vec<_> = genome.nodes().map(|n| n.innovation()).collect();
        let innovations: Vec<_> = genome.connections().map(|c| c.innovation()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(innovations, vec![0, 1, 2, 3]);
        assert_eq!(genome.max_innovation(), Some(3));
    }

    #[test]
    fn serde_roundtrip() {
        let (mut registry, mut genome) = setup(2, 1);
        genome.create_connection(&mut registry, 0, 2, 0.25).unwrap();
        genome.connection_mut(0).unwrap().set_enabled(false);

        let json = serde_json::to_string(&genome).unwrap();
        let restored: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, genome);
    }

    #[test]
    fn display() {
        let (mut registry, mut genome) = setup(1, 1);
        genome.create_connection(&mut registry, 0, 1, 0.5).unwrap();
        let shown = genome.to_string();
        assert!(shown.contains("0[0->1, 0.500]"));
        assert!(shown.contains("1[OUTPUT]"));
    }
}
