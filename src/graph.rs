use std::hash::Hash;

use crate::Symbol;

/// A key identifying one node of an [`ExprGraph`].
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct EntityId(u32);

impl From<usize> for EntityId {
    fn from(n: usize) -> EntityId {
        EntityId(n as u32)
    }
}

impl From<EntityId> for usize {
    fn from(id: EntityId) -> usize {
        id.0 as usize
    }
}

impl std::fmt::Debug for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the scope (function, block, region) owning a parameter.
///
/// Two parameters are congruent only if their scopes and positions both
/// match, so the scope only needs to be comparable, not inspectable.
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct ScopeId(
    /// The raw scope identity.
    pub u32,
);

/// The classification of a graph node, as seen by the numbering core.
///
/// This is the whole contract between [`ValueNumbering`](crate::ValueNumbering)
/// and the graph: each variant carries exactly the fields its hashing rule
/// reads. A node that fits none of the first three shapes is `Opaque` and
/// always gets a fresh number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a, E> {
    /// A leaf constant. Numbered by content: two constants carrying equal
    /// `content` words receive equal numbers, whether or not they are the
    /// same node.
    Constant {
        /// The constant's value, or a caller-chosen digest of it.
        content: u64,
    },
    /// A positional parameter of some scope. Congruent to another parameter
    /// only when both the scope and the position match.
    Parameter {
        /// The owning scope.
        scope: ScopeId,
        /// Zero-based position within the scope.
        index: u32,
    },
    /// An operation over other nodes. Numbered from the opcode and the
    /// operands' value numbers, in operand order; when `commutative` is set
    /// and there are exactly two operands, the operand numbers are sorted
    /// first so mirrored nodes collide.
    Operation {
        /// The operation code.
        op: Symbol,
        /// Whether operand order is semantically irrelevant.
        commutative: bool,
        /// The operand nodes, in order.
        operands: &'a [E],
    },
    /// Anything the caller cannot or will not classify. Always receives a
    /// fresh, never-shared number.
    Opaque,
}

/// A source of graph nodes for value numbering.
///
/// The numbering core owns no nodes; it sees the caller's graph only through
/// this trait, one [`classify`](ExprSource::classify) call per node. The
/// caller guarantees every entity handed to the core stays valid for the
/// duration of the call that uses it.
pub trait ExprSource {
    /// The node handle type. A handle is cheap to copy and identifies a node
    /// by identity, not by structure.
    type Entity: Copy + Eq + Hash;

    /// Classifies `entity` into one of the four [`NodeKind`] shapes.
    fn classify(&self, entity: Self::Entity) -> NodeKind<'_, Self::Entity>;
}

#[derive(Debug, Clone)]
enum Node {
    Constant(u64),
    Parameter { scope: ScopeId, index: u32 },
    Operation { op: Symbol, commutative: bool, operands: Vec<EntityId> },
    Opaque,
}

/// A minimal arena of expression nodes, for callers (and tests) that don't
/// already own a graph representation.
///
/// Nodes are addressed by [`EntityId`] in insertion order. Back-edges —
/// operand chains that lead back to an ancestor — are built by inserting the
/// operation with a placeholder operand and patching it afterwards with
/// [`set_operand`](ExprGraph::set_operand).
///
/// # Example
/// ```
/// use valnum::ExprGraph;
///
/// let mut graph = ExprGraph::default();
/// let one = graph.constant(1);
/// let cyclic = graph.operation("inc", false, vec![one]);
/// graph.set_operand(cyclic, 0, cyclic);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExprGraph {
    nodes: Vec<Node>,
}

impl ExprGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn add(&mut self, node: Node) -> EntityId {
        let id = EntityId::from(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Adds a constant leaf carrying `content`.
    pub fn constant(&mut self, content: u64) -> EntityId {
        self.add(Node::Constant(content))
    }

    /// Adds a parameter at position `index` of `scope`.
    pub fn parameter(&mut self, scope: ScopeId, index: u32) -> EntityId {
        self.add(Node::Parameter { scope, index })
    }

    /// Adds an operation node with the given opcode and operands.
    pub fn operation(
        &mut self,
        op: impl Into<Symbol>,
        commutative: bool,
        operands: Vec<EntityId>,
    ) -> EntityId {
        self.add(Node::Operation {
            op: op.into(),
            commutative,
            operands,
        })
    }

    /// Adds an unclassified node.
    pub fn opaque(&mut self) -> EntityId {
        self.add(Node::Opaque)
    }

    /// Redirects operand `index` of the operation `node` to `target`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not an operation or `index` is out of range.
    pub fn set_operand(&mut self, node: EntityId, index: usize, target: EntityId) {
        match &mut self.nodes[usize::from(node)] {
            Node::Operation { operands, .. } => operands[index] = target,
            other => panic!("set_operand on non-operation node {}: {:?}", node, other),
        }
    }
}

impl ExprSource for ExprGraph {
    type Entity = EntityId;

    fn classify(&self, entity: EntityId) -> NodeKind<'_, EntityId> {
        match &self.nodes[usize::from(entity)] {
            Node::Constant(content) => NodeKind::Constant { content: *content },
            Node::Parameter { scope, index } => NodeKind::Parameter {
                scope: *scope,
                index: *index,
            },
            Node::Operation {
                op,
                commutative,
                operands,
            } => NodeKind::Operation {
                op: *op,
                commutative: *commutative,
                operands,
            },
            Node::Opaque => NodeKind::Opaque,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_round_trip() {
        let mut graph = ExprGraph::new();
        let c = graph.constant(42);
        let p = graph.parameter(ScopeId(3), 1);
        let o = graph.operation("add", true, vec![c, p]);
        let u = graph.opaque();

        assert_eq!(graph.classify(c), NodeKind::Constant { content: 42 });
        assert_eq!(
            graph.classify(p),
            NodeKind::Parameter {
                scope: ScopeId(3),
                index: 1
            }
        );
        match graph.classify(o) {
            NodeKind::Operation {
                op,
                commutative,
                operands,
            } => {
                assert_eq!(op, Symbol::from("add"));
                assert!(commutative);
                assert_eq!(operands, &[c, p]);
            }
            kind => panic!("expected operation, got {:?}", kind),
        }
        assert_eq!(graph.classify(u), NodeKind::Opaque);
    }

    #[test]
    fn operand_patching() {
        let mut graph = ExprGraph::new();
        let a = graph.constant(1);
        let b = graph.constant(2);
        let o = graph.operation("sub", false, vec![a, a]);
        graph.set_operand(o, 1, b);
        match graph.classify(o) {
            NodeKind::Operation { operands, .. } => assert_eq!(operands, &[a, b]),
            kind => panic!("expected operation, got {:?}", kind),
        }
    }
}
