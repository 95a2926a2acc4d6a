//! A network is the phenotype of a genome: a compiled,
//! index-based copy of its enabled connections, with
//! disabled connections being ignored.
//!
//! Networks may be cyclic, so they are evaluated by
//! synchronous relaxation: every pass propagates all
//! activations through all connections at once, and
//! passes repeat until the outputs stop changing or a
//! pass limit is reached. Activation state is local to
//! each evaluation call.

use crate::genomics::{Error, GeneticConfig, Genome, NodeType, Result};
use crate::Innovation;

use ahash::RandomState;
use log::debug;

use std::collections::HashMap;

/// Steepened logistic transfer function.
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-4.9 * x).exp())
}

/// The outcome of evaluating a network.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Output node activations, in ascending identity order.
    pub outputs: Vec<f32>,
    /// Number of relaxation passes performed.
    pub iterations: usize,
    /// Whether the last pass left the outputs unchanged.
    /// If not, `outputs` holds the last computed values.
    pub settled: bool,
}

#[derive(Clone, Copy, Debug)]
struct Connection {
    source: usize,
    target: usize,
    weight: f32,
}

/// An arbitrarily-structured, possibly recurrent, neural network.
#[derive(Clone, Debug)]
pub struct RecurrentNetwork {
    node_ids: Box<[Innovation]>,
    inputs: Box<[(usize, Innovation)]>,
    outputs: Box<[usize]>,
    receivers: Box<[usize]>,
    connections: Box<[Connection]>,
}

impl From<&Genome> for RecurrentNetwork {
    /// Compiles the enabled connections of `genome`.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    /// use neatmark::networks::RecurrentNetwork;
    /// use std::num::NonZeroUsize;
    ///
    /// let registry = Registry::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// })
    /// .unwrap();
    /// let network = RecurrentNetwork::from(&registry.empty_genome());
    ///
    /// assert_eq!(network.output_ids().collect::<Vec<_>>(), vec![3, 4]);
    /// ```
    fn from(genome: &Genome) -> RecurrentNetwork {
        let node_ids: Vec<Innovation> = genome.nodes().map(|n| n.innovation()).collect();
        let node_index_from_id: HashMap<_, _, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        let mut inputs = vec![];
        let mut outputs = vec![];
        for (index, node) in genome.nodes().enumerate() {
            match node.node_type() {
                NodeType::Input => inputs.push((index, node.innovation())),
                NodeType::Output => outputs.push(index),
                NodeType::Hidden => {}
            }
        }

        let connections: Vec<Connection> = genome
            .connections()
            .filter(|c| c.enabled())
            .filter_map(|c| {
                Some(Connection {
                    source: *node_index_from_id.get(&c.source())?,
                    target: *node_index_from_id.get(&c.target())?,
                    weight: c.weight(),
                })
            })
            .collect();

        let mut receivers: Vec<usize> = connections.iter().map(|c| c.target).collect();
        receivers.sort_unstable();
        receivers.dedup();

        RecurrentNetwork {
            node_ids: node_ids.into(),
            inputs: inputs.into(),
            outputs: outputs.into(),
            receivers: receivers.into(),
            connections: connections.into(),
        }
    }
}

impl RecurrentNetwork {
    /// Evaluates the network on `inputs`, indexed by
    /// input node identity, for at most `max_evaluations`
    /// passes.
    ///
    /// Each pass computes every enabled connection's contribution
    /// from the current activations, then sets every node receiving
    /// contributions to the [`sigmoid`] of their sum. Evaluation stops
    /// once a pass reproduces the previous pass's outputs.
    ///
    /// Reaching the pass limit is not an error: the last
    /// computed outputs are returned with `settled` unset.
    ///
    /// # Errors
    /// Returns an error unless `inputs` holds exactly one value
    /// per identity up to the highest input node identity.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    /// use neatmark::networks::{sigmoid, RecurrentNetwork};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut registry = Registry::new(&GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// })
    /// .unwrap();
    /// let mut genome = registry.empty_genome();
    /// genome.create_connection(&mut registry, 0, 2, 2.5).unwrap();
    /// genome.create_connection(&mut registry, 1, 2, -2.5).unwrap();
    ///
    /// let network = RecurrentNetwork::from(&genome);
    /// let evaluation = network.evaluate(&[0.5, 1.0], 100).unwrap();
    ///
    /// assert!(evaluation.settled);
    /// assert_eq!(evaluation.outputs, vec![sigmoid(0.5 * 2.5 + 1.0 * -2.5)]);
    /// ```
    pub fn evaluate(&self, inputs: &[f32], max_evaluations: usize) -> Result<Evaluation> {
        if inputs.len() != self.input_span() {
            return Err(Error::InputCountMismatch {
                expected: self.input_span(),
                found: inputs.len(),
            });
        }
        self.relax(inputs, max_evaluations)
    }

    fn relax(&self, inputs: &[f32], max_evaluations: usize) -> Result<Evaluation> {
        let mut activations = vec![0.0; self.node_ids.len()];
        for &(index, id) in self.inputs.iter() {
            activations[index] = *inputs.get(id).ok_or_else(|| Error::InputCountMismatch {
                expected: self.input_span(),
                found: inputs.len(),
            })?;
        }

        let mut contributions = vec![0.0; self.connections.len()];
        let mut input_sums = vec![0.0; self.node_ids.len()];
        let mut previous: Option<Vec<f32>> = None;

        for iteration in 1..=max_evaluations {
            for (contribution, connection) in contributions.iter_mut().zip(self.connections.iter())
            {
                *contribution = activations[connection.source] * connection.weight;
            }
            for (contribution, connection) in contributions.iter().zip(self.connections.iter()) {
                input_sums[connection.target] += contribution;
            }
            for &receiver in self.receivers.iter() {
                activations[receiver] = sigmoid(input_sums[receiver]);
                input_sums[receiver] = 0.0;
            }

            let outputs = self.collect_outputs(&activations);
            if previous.as_ref() == Some(&outputs) {
                return Ok(Evaluation {
                    outputs,
                    iterations: iteration,
                    settled: true,
                });
            }
            previous = Some(outputs);
        }

        debug!(
            "network did not settle within {} evaluations",
            max_evaluations
        );
        Ok(Evaluation {
            outputs: previous.unwrap_or_else(|| self.collect_outputs(&activations)),
            iterations: max_evaluations,
            settled: false,
        })
    }

    fn collect_outputs(&self, activations: &[f32]) -> Vec<f32> {
        self.outputs.iter().map(|&i| activations[i]).collect()
    }

    /// Smallest input vector length covering every input node.
    fn input_span(&self) -> usize {
        self.inputs.iter().map(|&(_, id)| id + 1).max().unwrap_or(0)
    }

    /// Returns the identities of the output nodes,
    /// in the order their values are reported.
    pub fn output_ids(&self) -> impl Iterator<Item = Innovation> + '_ {
        self.outputs.iter().map(move |&i| self.node_ids[i])
    }
}

impl Genome {
    /// Evaluates the genome's phenotype on `inputs`, one
    /// value per configured input node, for at most
    /// `config.max_evaluations` passes.
    ///
    /// Use [`RecurrentNetwork`] directly to evaluate
    /// the same genome repeatedly.
    ///
    /// # Errors
    /// Returns an error if `inputs` does not hold
    /// exactly `config.input_count` values.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, Registry};
    /// use neatmark::networks::sigmoid;
    ///
    /// let config = GeneticConfig::zero();
    /// let mut registry = Registry::new(&config).unwrap();
    /// let mut genome = registry.empty_genome();
    /// genome.create_connection(&mut registry, 0, 1, 0.8).unwrap();
    ///
    /// let evaluation = genome.evaluate(&[1.0], &config).unwrap();
    /// assert_eq!(evaluation.outputs, vec![sigmoid(0.8)]);
    ///
    /// assert!(genome.evaluate(&[1.0, 0.0], &config).is_err());
    /// ```
    pub fn evaluate(&self, inputs: &[f32], config: &GeneticConfig) -> Result<Evaluation> {
        if inputs.len() != config.input_count.get() {
            return Err(Error::InputCountMismatch {
                expected: config.input_count.get(),
                found: inputs.len(),
            });
        }
        RecurrentNetwork::from(self).relax(inputs, config.max_evaluations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ErrorKind, Registry};
    use std::num::NonZeroUsize;

    fn config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            ..GeneticConfig::zero()
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn single_connection_settles() {
        let config = config(1, 1);
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        genome.create_connection(&mut registry, 0, 1, 0.3).unwrap();

        let network = RecurrentNetwork::from(&genome);
        let first_pass = network.evaluate(&[1.0], 1).unwrap();
        assert!((first_pass.outputs[0] - sigmoid(0.3)).abs() < 1e-6);
        assert!(!first_pass.settled);

        let evaluation = genome.evaluate(&[1.0], &config).unwrap();
        assert!(evaluation.settled);
        assert_eq!(evaluation.iterations, 2);
        assert_eq!(evaluation.outputs, first_pass.outputs);
        assert!((evaluation.outputs[0] - 1.0 / (1.0 + (-4.9f32 * 0.3).exp())).abs() < 1e-6);
    }

    #[test]
    fn hidden_chain() {
        let config = config(1, 1);
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        let h = genome
            .create_node(&mut registry, NodeType::Hidden)
            .unwrap()
            .innovation();
        genome.create_connection(&mut registry, 0, h, 1.0).unwrap();
        genome.create_connection(&mut registry, h, 1, 1.0).unwrap();

        let evaluation = genome.evaluate(&[0.5], &config).unwrap();
        assert!(evaluation.settled);
        assert_eq!(evaluation.outputs, vec![sigmoid(sigmoid(0.5))]);
        assert_eq!(evaluation.iterations, 3);
    }

    #[test]
    fn disabled_connections_are_ignored() {
        let config = config(2, 1);
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        genome.create_connection(&mut registry, 0, 2, 1.0).unwrap();
        genome.create_connection(&mut registry, 1, 2, 5.0).unwrap();
        genome.connection_mut(1).unwrap().set_enabled(false);

        let evaluation = genome.evaluate(&[1.0, 1.0], &config).unwrap();
        assert_eq!(evaluation.outputs, vec![sigmoid(1.0)]);
    }

    #[test]
    fn unconnected_outputs_stay_at_zero() {
        let config = config(2, 2);
        let registry = Registry::new(&config).unwrap();
        let genome = registry.empty_genome();

        let evaluation = genome.evaluate(&[1.0, 1.0], &config).unwrap();
        assert_eq!(evaluation.outputs, vec![0.0, 0.0]);
        assert!(evaluation.settled);
    }

    #[test]
    fn oscillating_network_hits_the_cap() {
        init_logging();
        let config = GeneticConfig {
            max_evaluations: 25,
            ..config(1, 1)
        };
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        let h = genome
            .create_node(&mut registry, NodeType::Hidden)
            .unwrap()
            .innovation();
        // A strongly inhibitory self-loop flips between high and low.
        genome.create_connection(&mut registry, h, h, -10.0).unwrap();
        genome.create_connection(&mut registry, 0, h, 5.0).unwrap();
        genome.create_connection(&mut registry, h, 1, 1.0).unwrap();

        let evaluation = genome.evaluate(&[1.0], &config).unwrap();
        assert!(!evaluation.settled);
        assert_eq!(evaluation.iterations, 25);
        assert_eq!(evaluation.outputs.len(), 1);
    }

    #[test]
    fn zero_passes() {
        let config = config(1, 1);
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        genome.create_connection(&mut registry, 0, 1, 1.0).unwrap();

        let evaluation = RecurrentNetwork::from(&genome).evaluate(&[1.0], 0).unwrap();
        assert_eq!(evaluation.outputs, vec![0.0]);
        assert_eq!(evaluation.iterations, 0);
        assert!(!evaluation.settled);
    }

    #[test]
    fn input_count_mismatch() {
        let config = config(3, 1);
        let registry = Registry::new(&config).unwrap();
        let genome = registry.empty_genome();

        let err = genome.evaluate(&[1.0], &config).unwrap_err();
        assert_eq!(
            err,
            Error::InputCountMismatch {
                expected: 3,
                found: 1
            }
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(RecurrentNetwork::from(&genome)
            .evaluate(&[1.0, 2.0], 10)
            .is_err());
    }

    #[test]
    fn network_rejects_surplus_inputs() {
        let config = config(2, 1);
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        genome.create_connection(&mut registry, 0, 2, 1.0).unwrap();
        let network = RecurrentNetwork::from(&genome);

        assert_eq!(
            network.evaluate(&[1.0, 0.0, 7.0], 10).unwrap_err(),
            Error::InputCountMismatch {
                expected: 2,
                found: 3
            }
        );
        assert_eq!(
            network.evaluate(&[1.0, 0.0], 10).unwrap(),
            genome.evaluate(&[1.0, 0.0], &config).unwrap()
        );
    }

    #[test]
    fn genome_without_every_input_node_still_evaluates() {
        let config = config(2, 1);
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        genome.create_connection(&mut registry, 0, 2, 1.0).unwrap();
        let mut trimmed = Genome::with_nodes([*genome.node(0).unwrap(), *genome.node(2).unwrap()]);
        trimmed
            .add_connection(genome.connection(0).unwrap().clone())
            .unwrap();

        let evaluation = trimmed.evaluate(&[1.0, 0.5], &config).unwrap();
        assert_eq!(evaluation.outputs, vec![sigmoid(1.0)]);
        assert!(RecurrentNetwork::from(&trimmed)
            .evaluate(&[1.0, 0.5], 10)
            .is_err());
    }

    #[test]
    fn evaluations_do_not_share_state() {
        let config = config(1, 1);
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        genome.create_connection(&mut registry, 0, 1, 1.0).unwrap();
        let mut other = genome.clone();
        other.connection_mut(0).unwrap().set_weight(-1.0);

        let network = RecurrentNetwork::from(&genome);
        let first = network.evaluate(&[1.0], 100).unwrap();
        let _ = RecurrentNetwork::from(&other).evaluate(&[1.0], 100).unwrap();
        let _ = network.evaluate(&[-3.0], 100).unwrap();
        assert_eq!(network.evaluate(&[1.0], 100).unwrap(), first);
    }

    #[test]
    fn outputs_follow_identity_order() {
        let config = config(1, 3);
        let mut registry = Registry::new(&config).unwrap();
        let mut genome = registry.empty_genome();
        genome.create_connection(&mut registry, 0, 3, 1.0).unwrap();
        genome.create_connection(&mut registry, 0, 1, -1.0).unwrap();

        let network = RecurrentNetwork::from(&genome);
        assert_eq!(network.output_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
        let evaluation = network.evaluate(&[1.0], 100).unwrap();
        assert_eq!(evaluation.outputs, vec![sigmoid(-1.0), 0.0, sigmoid(1.0)]);
    }
}
