use crate::{dvr::DVRSet, types::*};

/// Index of a node in a [`ProofTree`].
pub type NodeId = usize;

/// One step of a replayed proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofTreeNode<S, V> {
    pub sentence: S,
    /// The label that produced this step; `0` for frames pushed without a label.
    pub label: LabTok,
    /// The frames consumed by this step, in stack order.
    pub children: Vec<NodeId>,
    pub dists: DVRSet<V>,
    /// `false` if the step was consumed as a floating hypothesis.
    pub essential: bool,
    /// Number of the assertion applied, `0` for hypotheses.
    pub number: LabTok,
}

/// The derivation tree recorded while replaying a proof.
///
/// Nodes live in an arena and refer to their children by index. A node can be the child of more
/// than one parent when a saved step is referenced again, so in general this is a DAG whose nodes
/// are only ever added after their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofTree<S, V> {
    nodes: Vec<ProofTreeNode<S, V>>,
    root: Option<NodeId>,
}

impl<S, V> Default for ProofTree<S, V> {
    fn default() -> Self {
        ProofTree {
            nodes: Vec::new(),
            root: None,
        }
    }
}

impl<S, V> ProofTree<S, V> {
    pub fn push(&mut self, node: ProofTreeNode<S, V>) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> &ProofTreeNode<S, V> {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ProofTreeNode<S, V> {
        &mut self.nodes[id]
    }

    /// The node of the frame on top of the stack.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    /// Visits the nodes below `root` in post-order. A node is only descended into if
    /// [`TreeVisitor::enter`] returns `true`, and only then is [`TreeVisitor::leave`] called for
    /// it.
    pub fn walk<'t, W: TreeVisitor<'t, S, V>>(&'t self, root: NodeId, visitor: &mut W) {
        if !visitor.enter(self, root) {
            return;
        }
        let mut stack = vec![(root, 0)];
        while let Some((id, next)) = stack.last_mut() {
            match self.nodes[*id].children.get(*next) {
                Some(&child) => {
                    *next += 1;
                    if visitor.enter(self, child) {
                        stack.push((child, 0));
                    }
                }
                None => {
                    let id = *id;
                    stack.pop();
                    visitor.leave(self, id);
                }
            }
        }
    }
}

/// Callbacks for [`ProofTree::walk`].
pub trait TreeVisitor<'t, S, V> {
    /// Called before the children of `id` are visited. Returning `false` skips them.
    fn enter(&mut self, tree: &'t ProofTree<S, V>, id: NodeId) -> bool;

    /// Called after the children of `id` were visited.
    fn leave(&mut self, tree: &'t ProofTree<S, V>, id: NodeId);
}
