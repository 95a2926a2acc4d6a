use crate::genomics::NodeType;
use crate::Innovation;

use thiserror::Error;

/// Specialized result type for genome operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A malformed or inconsistent argument was passed.
    InvalidArgument,
    /// A lookup by node identity or innovation number
    /// fell outside the known range.
    NotFound,
    /// An operation was undefined for the given input,
    /// e.g. averaging over an empty set.
    Degenerate,
}

/// Errors raised by registry, genome and network operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The node identity has not been assigned by the registry.
    #[error("node with id {0} does not exist")]
    UnknownNode(Innovation),
    /// The innovation number has not been assigned by the registry.
    #[error("connection with innovation number {0} does not exist")]
    UnknownConnection(Innovation),
    /// The node identity is already present in the genome.
    #[error("duplicate node insertion with id {0}")]
    DuplicateNode(Innovation),
    /// The innovation number is already present in the genome.
    #[error("duplicate connection insertion with id {innovation} between endpoints {input} -> {output}")]
    DuplicateConnection {
        innovation: Innovation,
        input: Innovation,
        output: Innovation,
    },
    /// At least one endpoint of the connection is absent from the genome.
    #[error("connection insertion between nonexistant endpoint(s) {0} -> {1}")]
    NonexistantEndpoints(Innovation, Innovation),
    /// The connection would feed into an input node.
    #[error("connection insertion with input node {0} as target")]
    InputTarget(Innovation),
    /// The connection would originate from an output node.
    #[error("connection insertion with output node {0} as source")]
    OutputSource(Innovation),
    /// The node type name is not one of `INPUT`, `HIDDEN`, `OUTPUT`.
    #[error("unknown node type {0:?}, expected one of INPUT, HIDDEN, OUTPUT")]
    UnknownNodeType(String),
    /// The registry cannot allocate further node identities
    /// without breaking connection hash uniqueness.
    #[error("node limit of {0} reached")]
    NodeLimitReached(usize),
    /// A node has a different type than the operation requires.
    #[error("node {id} is of type {found:?}, expected {expected:?}")]
    UnexpectedNodeType {
        id: Innovation,
        expected: NodeType,
        found: NodeType,
    },
    /// A configuration value is out of its valid range.
    #[error("invalid configuration value for {name}: {value}")]
    InvalidConfig { name: &'static str, value: f64 },
    /// The number of supplied inputs does not match the network.
    #[error("expected {expected} input values, found {found}")]
    InputCountMismatch { expected: usize, found: usize },
    /// The two genomes share no homologous genes.
    #[error("genomes share no matching genes")]
    NoMatchingGenes,
}

impl Error {
    /// Returns the broad category of the error.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{Error, ErrorKind};
    ///
    /// assert_eq!(Error::UnknownNode(7).kind(), ErrorKind::NotFound);
    /// assert_eq!(Error::NoMatchingGenes.kind(), ErrorKind::Degenerate);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownNode(_) | Self::UnknownConnection(_) => ErrorKind::NotFound,
            Self::NoMatchingGenes => ErrorKind::Degenerate,
            Self::DuplicateNode(_)
            | Self::DuplicateConnection { .. }
            | Self::NonexistantEndpoints(..)
            | Self::InputTarget(_)
            | Self::OutputSource(_)
            | Self::UnknownNodeType(_)
            | Self::NodeLimitReached(_)
            | Self::UnexpectedNodeType { .. }
            | Self::InvalidConfig { .. }
            | Self::InputCountMismatch { .. } => ErrorKind::InvalidArgument,
        }
    }
}
