//! Combinatorial `!Proc*` tags

use super::{mismatch, HandlerKind, NodeHandler};
use crate::expand::{failed, Expander, Variation, Variations};
use crate::meta::Metadata;
use crate::node::{Node, Record};
use crate::tags::ProcTag;
use crate::ProcgenResult;

/// `amount` independent copies of `value`
fn repeat(value: Node, amount: usize) -> Node {
    Node::Sequence(vec![value; amount])
}

pub struct ProcListHandler;

impl NodeHandler for ProcListHandler {
    fn name(&self) -> &'static str {
        "ProcList"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Proc(ProcTag::List(_)))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Combinatorial
    }

    fn count(&self, node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        match node {
            Node::Proc(ProcTag::List(list)) => Ok(list.options.len() as u128),
            _ => Err(mismatch(self, node)),
        }
    }

    fn iterate<'a>(&self, node: &'a Node, _expander: &Expander) -> Variations<'a> {
        let Node::Proc(ProcTag::List(list)) = node else {
            return failed(mismatch(self, node));
        };
        Box::new(
            list.options
                .iter()
                .map(|option| Ok((option.clone(), Metadata::new()))),
        )
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Proc(ProcTag::List(list)) = node else {
            return Err(mismatch(self, node));
        };
        let idx = expander.choose_index(list.options.len());
        Ok((list.options[idx].clone(), Metadata::new()))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Proc(ProcTag::List(list)) => list.options.iter().collect(),
            _ => Vec::new(),
        }
    }
}

pub struct ProcListLabelledHandler;

impl NodeHandler for ProcListLabelledHandler {
    fn name(&self) -> &'static str {
        "ProcListLabelled"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Proc(ProcTag::ListLabelled(_)))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Combinatorial
    }

    fn count(&self, node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        match node {
            Node::Proc(ProcTag::ListLabelled(list)) => Ok(list.options.len() as u128),
            _ => Err(mismatch(self, node)),
        }
    }

    fn iterate<'a>(&self, node: &'a Node, _expander: &Expander) -> Variations<'a> {
        let Node::Proc(ProcTag::ListLabelled(list)) = node else {
            return failed(mismatch(self, node));
        };
        Box::new(list.options.iter().map(|option| {
            Ok((option.value.clone(), Metadata::with_label(&option.label)))
        }))
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Proc(ProcTag::ListLabelled(list)) = node else {
            return Err(mismatch(self, node));
        };
        let option = &list.options[expander.choose_index(list.options.len())];
        Ok((option.value.clone(), Metadata::with_label(&option.label)))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Proc(ProcTag::ListLabelled(list)) => {
                list.options.iter().map(|option| &option.value).collect()
            }
            _ => Vec::new(),
        }
    }
}

pub struct ProcColorHandler;

impl NodeHandler for ProcColorHandler {
    fn name(&self) -> &'static str {
        "ProcColor"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Proc(ProcTag::Color(_)))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Combinatorial
    }

    fn count(&self, node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        match node {
            Node::Proc(ProcTag::Color(color)) => Ok(color.amount.get() as u128),
            _ => Err(mismatch(self, node)),
        }
    }

    fn iterate<'a>(&self, node: &'a Node, _expander: &Expander) -> Variations<'a> {
        let Node::Proc(ProcTag::Color(color)) = node else {
            return failed(mismatch(self, node));
        };
        Box::new(
            color
                .palette()
                .iter()
                .map(|&(r, g, b)| Ok((Node::Record(Record::rgb(r, g, b)), Metadata::new()))),
        )
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Proc(ProcTag::Color(color)) = node else {
            return Err(mismatch(self, node));
        };
        let palette = color.palette();
        let (r, g, b) = palette[expander.choose_index(palette.len())];
        Ok((Node::Record(Record::rgb(r, g, b)), Metadata::new()))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Proc(ProcTag::Color(color)) => vec![color.amount.as_node()],
            _ => Vec::new(),
        }
    }
}

pub struct ProcVector3ScaledHandler;

impl NodeHandler for ProcVector3ScaledHandler {
    fn name(&self) -> &'static str {
        "ProcVector3Scaled"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Proc(ProcTag::Vector3Scaled(_)))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Combinatorial
    }

    fn count(&self, node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        match node {
            Node::Proc(ProcTag::Vector3Scaled(scaled)) => Ok(scaled.scales.len() as u128),
            _ => Err(mismatch(self, node)),
        }
    }

    fn iterate<'a>(&self, node: &'a Node, _expander: &Expander) -> Variations<'a> {
        let Node::Proc(ProcTag::Vector3Scaled(scaled)) = node else {
            return failed(mismatch(self, node));
        };
        Box::new((0..scaled.scales.len()).map(move |idx| {
            let mut meta = Metadata::new();
            meta.add_label(scaled.label(idx));
            Ok((Node::Record(scaled.scaled(idx)), meta))
        }))
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Proc(ProcTag::Vector3Scaled(scaled)) = node else {
            return Err(mismatch(self, node));
        };
        let idx = expander.choose_index(scaled.scales.len());
        let mut meta = Metadata::new();
        meta.add_label(scaled.label(idx));
        Ok((Node::Record(scaled.scaled(idx)), meta))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Proc(ProcTag::Vector3Scaled(scaled)) => scaled
                .base
                .as_deref()
                .into_iter()
                .chain(scaled.scales.iter())
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub struct ProcRepeatChoiceHandler;

impl NodeHandler for ProcRepeatChoiceHandler {
    fn name(&self) -> &'static str {
        "ProcRepeatChoice"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Proc(ProcTag::RepeatChoice(_)))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Combinatorial
    }

    fn count(&self, node: &Node, expander: &Expander) -> ProcgenResult<u128> {
        match node {
            // Repeating one choice adds no variations of its own.
            Node::Proc(ProcTag::RepeatChoice(choice)) => expander.count(&choice.value),
            _ => Err(mismatch(self, node)),
        }
    }

    fn iterate<'a>(&self, node: &'a Node, expander: &Expander) -> Variations<'a> {
        let Node::Proc(ProcTag::RepeatChoice(choice)) = node else {
            return failed(mismatch(self, node));
        };
        let amount = choice.amount.get();
        Box::new(
            expander
                .iterate(&choice.value)
                .map(move |variation| variation.map(|(value, meta)| (repeat(value, amount), meta))),
        )
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Proc(ProcTag::RepeatChoice(choice)) = node else {
            return Err(mismatch(self, node));
        };
        let (value, meta) = expander.sample(&choice.value)?;
        Ok((repeat(value, choice.amount.get()), meta))
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Proc(ProcTag::RepeatChoice(choice)) => {
                vec![choice.amount.as_node(), choice.value.as_ref()]
            }
            _ => Vec::new(),
        }
    }
}

pub struct ProcRestrictCombinationsHandler;

impl NodeHandler for ProcRestrictCombinationsHandler {
    fn name(&self) -> &'static str {
        "ProcRestrictCombinations"
    }

    fn can_handle(&self, node: &Node) -> bool {
        matches!(node, Node::Proc(ProcTag::RestrictCombinations(_)))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Combinatorial
    }

    fn count(&self, node: &Node, _expander: &Expander) -> ProcgenResult<u128> {
        match node {
            Node::Proc(ProcTag::RestrictCombinations(restrict)) => {
                Ok(restrict.amount.get() as u128)
            }
            _ => Err(mismatch(self, node)),
        }
    }

    /// Samples instead of taking the first `amount` variations, which gives a
    /// wider spread. Deterministic only for a fixed seed.
    fn iterate<'a>(&self, node: &'a Node, expander: &Expander) -> Variations<'a> {
        let Node::Proc(ProcTag::RestrictCombinations(restrict)) = node else {
            return failed(mismatch(self, node));
        };
        let expander = expander.clone();
        Box::new((0..restrict.amount.get()).map(move |_| expander.sample(&restrict.item)))
    }

    fn sample(&self, node: &Node, expander: &Expander) -> ProcgenResult<Variation> {
        let Node::Proc(ProcTag::RestrictCombinations(restrict)) = node else {
            return Err(mismatch(self, node));
        };
        expander.sample(&restrict.item)
    }

    fn children<'a>(&self, node: &'a Node) -> Vec<&'a Node> {
        match node {
            Node::Proc(ProcTag::RestrictCombinations(restrict)) => {
                vec![restrict.amount.as_node(), restrict.item.as_ref()]
            }
            _ => Vec::new(),
        }
    }
}
