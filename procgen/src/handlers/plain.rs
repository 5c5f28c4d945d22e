//! Plain YAML sequences, mappings and scalars

use super::{mismatch, HandlerKind, NodeHandler};
use crate::expand::{failed, product_map, single, Expander, Variation, Variations};
use crate::meta::Metadata;
use crate::node::{Mapping, Node};
use crate::ProcgenResult;

pub struct PlainSequence;

impl NodeHandler for PlainSequence {
    fn name(&self) -> &'static str {
        "Sequence"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Sequence(_))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Static
    }

    fn count(&self, node: &Node, expander: &Expander) -> ProcgenResult<u128> {
        expander.count_product(&self.children(node))
    }

    fn iterate<'a>(&self, node: &'a Node, expander: &Expander) -> Variations<'a> {
        if !self.can_handle(node) {
            return failed(mismatch(self, node));
        }
        product_map(expander, self.children(node), Node::Sequence)
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        if !self.can_handle(node) {
            return Err(mismatch(self, node));
        }
        let (values, meta) = expander.sample_all(&self.children(node))?;
        Ok((Node::Sequence(values), meta))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Sequence(items) => items.iter().collect(),
            _ => Vec::new(),
        }
    }
}

pub struct PlainMapping;

impl PlainMapping {
    fn rebuild(mapping: &Mapping, values: Vec<Node>) -> Node {
        // Keys are taken up front so they always line up with the values.
        let keys = mapping.entries.iter().map(|(key, _)| key.clone());
        Node::Mapping(Mapping::new(keys.zip(values).collect()))
    }
}

impl NodeHandler for PlainMapping {
    fn name(&self) -> &'static str {
        "Mapping"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Mapping(_))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Static
    }

    fn count(&self, node: &Node, expander: &Expander) -> ProcgenResult<u128> {
        expander.count_product(&self.children(node))
    }

    fn iterate<'a>(&self, node: &'a Node, expander: &Expander) -> Variations<'a> {
        let Node::Mapping(mapping) = node else {
            return failed(mismatch(self, node));
        };
        product_map(expander, self.children(node), move |values| {
            Self::rebuild(mapping, values)
        })
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Mapping(mapping) = node else {
            return Err(mismatch(self, node));
        };
        let (values, meta) = expander.sample_all(&self.children(node))?;
        Ok((Self::rebuild(mapping, values), meta))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Mapping(mapping) => mapping.entries.iter().map(|(_, value)| value).collect(),
            _ => Vec::new(),
        }
    }
}

pub struct PlainScalar;

impl NodeHandler for PlainScalar {
    fn name(&self) -> &'static str {
        "Scalar"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Scalar(_))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Static
    }

    fn count(&self, _node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        Ok(1)
    }

    fn iterate<'a>(&self, node: &'a Node, _expander: &Expander) -> Variations<'a> {
        single((node.clone(), Metadata::new()))
    }

    fn sample(&self, node: &Node, _expander: &Expander) -> ProcgenResult<Variation> {
        Ok((node.clone(), Metadata::new()))
    }

    fn children<'a>(&self, _node: &'a Node) -> Vec<&'a Node> {
        Vec::new()
    }
}
