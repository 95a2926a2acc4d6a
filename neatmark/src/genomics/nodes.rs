use super::Error;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// A NodeType indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Input nodes. Never the target of a connection.
    Input,
    /// Hidden nodes, introduced by node mutations.
    Hidden,
    /// Output nodes. Never the source of a connection.
    Output,
}

impl FromStr for NodeType {
    type Err = Error;

    /// Parses `"INPUT"`, `"HIDDEN"` or `"OUTPUT"`, ignoring case.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::NodeType;
    ///
    /// assert_eq!("HIDDEN".parse::<NodeType>().unwrap(), NodeType::Hidden);
    /// assert!("BIAS".parse::<NodeType>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<NodeType, Error> {
        match s.to_ascii_uppercase().as_str() {
            "INPUT" => Ok(NodeType::Input),
            "HIDDEN" => Ok(NodeType::Hidden),
            "OUTPUT" => Ok(NodeType::Output),
            _ => Err(Error::UnknownNodeType(s.to_string())),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "INPUT",
            Self::Hidden => "HIDDEN",
            Self::Output => "OUTPUT",
        })
    }
}

/// Nodes are the structural elements of genomes
/// between which connections are created.
///
/// A node's identity and type are fixed by the [`Registry`]
/// when it is created; genomes hold copies of the same
/// canonical node. Activation state lives in the
/// [`RecurrentNetwork`] built for each evaluation, never here.
///
/// [`Registry`]: crate::genomics::Registry
/// [`RecurrentNetwork`]: crate::networks::RecurrentNetwork
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct NodeGene {
    id: Innovation,
    node_type: NodeType,
}

impl NodeGene {
    /// Creates a node with the passed identity.
    /// Identities are handed out by the registry only.
    pub(crate) fn new(id: Innovation, node_type: NodeType) -> NodeGene {
        NodeGene { id, node_type }
    }

    /// Returns the node's identity.
    ///
    /// # Examples
    /// ```
    /// use neatmark::genomics::{GeneticConfig, NodeType, Registry};
    ///
    /// let mut registry = Registry::new(&GeneticConfig::zero()).unwrap();
    /// let node = registry.create_node(NodeType::Hidden).unwrap();
    ///
    /// // One input and one output were registered first.
    /// assert_eq!(node.innovation(), 2);
    /// ```
    pub fn innovation(&self) -> Innovation {
        self.id
    }

    /// Returns the node's type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Whether a connection may originate at this node.
    pub fn can_be_source(&self) -> bool {
        self.node_type != NodeType::Output
    }

    /// Whether a connection may terminate at this node.
    pub fn can_be_target(&self) -> bool {
        self.node_type != NodeType::Input
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}]", self.id, self.node_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::ErrorKind;

    #[test]
    fn parse_node_types() {
        assert_eq!("input".parse::<NodeType>().unwrap(), NodeType::Input);
        assert_eq!("Hidden".parse::<NodeType>().unwrap(), NodeType::Hidden);
        assert_eq!("OUTPUT".parse::<NodeType>().unwrap(), NodeType::Output);

        let err = "SENSOR".parse::<NodeType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn endpoint_roles() {
        let input = NodeGene::new(0, NodeType::Input);
        let hidden = NodeGene::new(1, NodeType::Hidden);
        let output = NodeGene::new(2, NodeType::Output);

        assert!(input.can_be_source() && !input.can_be_target());
        assert!(hidden.can_be_source() && hidden.can_be_target());
        assert!(!output.can_be_source() && output.can_be_target());
    }

    #[test]
    fn display() {
        assert_eq!(NodeGene::new(4, NodeType::Hidden).to_string(), "4[HIDDEN]");
    }
}
