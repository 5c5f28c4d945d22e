//! Conditionals and their placeholders
//!
//! A `!ProcIf` cannot be decided while a variation is still being assembled, since
//! the values it depends on may come from anywhere in the tree. Expansion emits a
//! [`Pending`] instead and [`crate::deferred`] fills it in afterwards.

use super::{mismatch, HandlerKind, NodeHandler};
use crate::expand::{failed, single, Expander, Variation, Variations};
use crate::meta::Metadata;
use crate::node::{Node, Pending};
use crate::tags::ProcTag;
use crate::{ProcgenError, ProcgenResult};

pub struct ProcIfHandler;

impl NodeHandler for ProcIfHandler {
    fn name(&self) -> &'static str {
        "ProcIf"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Proc(ProcTag::If(_)))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Conditional
    }

    fn count(&self, _node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        Ok(1)
    }

    fn iterate<'a>(&self, node: &'a Node, _expander: &Expander) -> Variations<'a> {
        let Node::Proc(ProcTag::If(proc_if)) = node else {
            return failed(mismatch(self, node));
        };
        single((Node::Pending(Pending::new(proc_if.clone())), Metadata::new()))
    }

    fn sample(&self, node: &Node, _expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Proc(ProcTag::If(proc_if)) = node else {
            return Err(mismatch(self, node));
        };
        Ok((Node::Pending(Pending::new(proc_if.clone())), Metadata::new()))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Proc(ProcTag::If(proc_if)) => proc_if
                .condition
                .cases
                .iter()
                .chain(proc_if.then.iter())
                .chain(proc_if.default.iter())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Label rules only live in `proc_meta`, which is removed before expansion
pub struct ProcIfLabelsHandler;

impl NodeHandler for ProcIfLabelsHandler {
    fn name(&self) -> &'static str {
        "ProcIfLabels"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Proc(ProcTag::IfLabels(_)))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Conditional
    }

    fn count(&self, _node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        Ok(1)
    }

    fn iterate<'a>(&self, _node: &'a Node, _expander: &Expander) -> Variations<'a> {
        failed(ProcgenError::internal(
            ".iterate should not be called on ProcIfLabels.",
        ))
    }

    fn sample(&self, _node: &Node, _expander: &Expander) -> ProcgenResult<Variation> {
        Err(ProcgenError::internal(
            ".sample should not be called on ProcIfLabels.",
        ))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Proc(ProcTag::IfLabels(labels)) => labels.condition.cases.iter().collect(),
            _ => Vec::new(),
        }
    }
}

pub struct PendingHandler;

impl NodeHandler for PendingHandler {
    fn name(&self) -> &'static str {
        "Pending"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Pending(_))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Placeholder
    }

    fn count(&self, _node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        Ok(1)
    }

    fn iterate<'a>(&self, _node: &'a Node, _expander: &Expander) -> Variations<'a> {
        failed(ProcgenError::internal(
            "An unresolved !ProcIf cannot be expanded again.",
        ))
    }

    fn sample(&self, _node: &Node, _expander: &Expander) -> ProcgenResult<Variation> {
        Err(ProcgenError::internal(
            "An unresolved !ProcIf cannot be expanded again.",
        ))
    }

    fn children<'a>(&self, _node: &'a Node) -> Vec<&'a Node> {
        Vec::new()
    }
}
