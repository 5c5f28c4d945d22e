//! Fixed-schema AnimalAI records, `!R` ranges and other tagged scalars

use super::{mismatch, HandlerKind, NodeHandler};
use crate::expand::{failed, product_map, single, Expander, Variation, Variations};
use crate::meta::Metadata;
use crate::node::Node;
use crate::ProcgenResult;

/// `!ArenaConfig`, `!Arena`, `!Item`, `!Vector3` and `!RGB`
pub struct RecordHandler;

impl NodeHandler for RecordHandler {
    fn name(&self) -> &'static str {
        "Record"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Record(_))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Static
    }

    fn count(&self, node: &Node, expander: &Expander) -> ProcgenResult<u128> {
        expander.count_product(&self.children(node))
    }

    fn iterate<'a>(&self, node: &'a Node, expander: &Expander) -> Variations<'a> {
        let Node::Record(record) = node else {
            return failed(mismatch(self, node));
        };
        product_map(expander, self.children(node), move |values| {
            Node::Record(record.with_values(values))
        })
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Record(record) = node else {
            return Err(mismatch(self, node));
        };
        let (values, meta) = expander.sample_all(&self.children(node))?;
        Ok((Node::Record(record.with_values(values)), meta))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Record(record) => record.fields.iter().map(|(_, value)| value).collect(),
            _ => Vec::new(),
        }
    }
}

/// `!R [min, max]` is a comparison operand and is copied through as-is
pub struct RangeHandler;

impl NodeHandler for RangeHandler {
    fn name(&self) -> &'static str {
        "R"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Range(_))
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

pub struct TaggedScalarHandler;

impl NodeHandler for TaggedScalarHandler {
    fn name(&self) -> &'static str {
        "TaggedScalar"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Tagged(_))
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
