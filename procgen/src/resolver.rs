//! Condition resolution
//!
//! Conditionals name the values they depend on with dotted references such as
//! `goal.sizes.0.x`: the first segment is the `id` of a record somewhere in the
//! finished variation, the rest is a path into it. [`ConditionResolver`] looks
//! those values up and matches them against the cases of a `!ProcIf` or
//! `!ProcIfLabels`.
//!
//! A reference may land on another unresolved `!ProcIf`. That one is resolved on
//! the spot against the same tree, which is why the resolver keeps the chain of
//! conditionals it is working on: a conditional that shows up twice in the chain
//! depends on itself.

use crate::codec;
use crate::node::{Node, Record, Scalar};
use crate::tags::{Condition, ProcIf, ProcIfLabels, ProcTag};
use crate::{ProcgenError, ProcgenResult};
use std::borrow::Cow;
use std::sync::Arc;

/// Relative tolerance for numeric case matches
pub const REL_TOL: f64 = 1e-9;

/// Outcome of matching a condition against a variation
#[derive(Debug)]
pub struct Resolution<'a> {
    /// First matching case, if any
    pub index: Option<usize>,
    /// The looked-up value of each variable, in order
    pub values: Vec<Cow<'a, Node>>,
}

/// Looks up variables in one finished variation
pub struct ConditionResolver<'a> {
    root: &'a Node,
    /// Conditionals currently being resolved, outermost first
    resolving: Vec<*const ProcIf>,
}

impl<'a> ConditionResolver<'a> {
    pub fn new(root: &'a Node) -> Self {
        Self {
            root,
            resolving: Vec::new(),
        }
    }

    /// Match `condition` against the variation; first matching case wins
    pub fn resolve(&mut self, condition: &Condition) -> ProcgenResult<Resolution<'a>> {
        let values = condition
            .variables
            .iter()
            .map(|variable| self.find_variable(variable))
            .collect::<ProcgenResult<Vec<_>>>()?;

        let index = (0..condition.cases.len()).find(|&idx| {
            let case = condition.case_values(idx);
            case.len() == values.len()
                && values
                    .iter()
                    .zip(case)
                    .all(|(value, case)| matches(value, case))
        });

        Ok(Resolution { index, values })
    }

    /// Value and label a `!ProcIf` stands for in this variation
    pub fn resolve_if<'b>(
        &mut self,
        proc_if: &'b Arc<ProcIf>,
    ) -> ProcgenResult<(&'b Node, Option<&'b str>)> {
        let ptr = Arc::as_ptr(proc_if);
        if self.resolving.contains(&ptr) {
            return Err(annotated(
                "CircularCondition",
                format!(
                    "The !ProcIf on {} depends on its own value.",
                    proc_if.condition.display_variables()
                ),
                &Node::Proc(ProcTag::If(proc_if.clone())),
            ));
        }

        self.resolving.push(ptr);
        let resolution = self.resolve(&proc_if.condition);
        self.resolving.pop();
        let resolution = resolution?;

        if let Some(idx) = resolution.index {
            return Ok((&proc_if.then[idx], proc_if.label(idx)));
        }

        let values = display_values(&resolution.values, proc_if.condition.multi);
        let node = || Node::Proc(ProcTag::If(proc_if.clone()));
        let Some(default) = &proc_if.default else {
            return Err(annotated(
                "MissingCase",
                format!(
                    "Could not find a matching case for {} = {} in `cases` and there is no default.",
                    proc_if.condition.display_variables(),
                    values
                ),
                &node(),
            ));
        };
        if proc_if.labels.is_some() && proc_if.default_label.is_none() {
            return Err(annotated(
                "MissingCase",
                format!(
                    "Could not find a matching case for {} = {} in `cases` and there is no default label.",
                    proc_if.condition.display_variables(),
                    values
                ),
                &node(),
            ));
        }
        Ok((default, proc_if.default_label.as_deref()))
    }

    /// Label a `!ProcIfLabels` rule assigns to this variation
    pub fn resolve_labels<'b>(&mut self, rule: &'b ProcIfLabels) -> ProcgenResult<&'b str> {
        let resolution = self.resolve(&rule.condition)?;
        if let Some(idx) = resolution.index {
            return Ok(&rule.labels[idx]);
        }
        rule.default.as_deref().ok_or_else(|| {
            annotated(
                "MissingCase",
                format!(
                    "Could not find a matching case for {} = {} in `cases` and there is no default.",
                    rule.condition.display_variables(),
                    display_values(&resolution.values, rule.condition.multi)
                ),
                &Node::Proc(ProcTag::IfLabels(rule.clone())),
            )
        })
    }

    /// Value of a dotted reference
    fn find_variable(&mut self, variable: &str) -> ProcgenResult<Cow<'a, Node>> {
        let mut segments = variable.split('.');
        let item_id = segments.next().unwrap_or_default();

        let Some(item) = find_item(item_id, self.root) else {
            return Err(ProcgenError::resolution(
                "IDNotFound",
                format!(
                    "Could not find an Item with id '{}', but it is needed for a variable ({}).\nDid you forget to specify the id in the corresponding Item?",
                    item_id, variable
                ),
            ));
        };

        let not_found = || {
            ProcgenError::resolution(
                "NonExistentVariable",
                format!(
                    "Could not find variable '{}' in Item '{}', but it is referred to in some place (e.g. a !ProcIf).",
                    variable, item_id
                ),
            )
        };

        let mut current: Cow<'a, Node> = Cow::Borrowed(item);
        for segment in segments {
            // Only scalars come out owned, and scalars have no children.
            let Cow::Borrowed(node) = current else {
                return Err(not_found());
            };
            current = match step(node, segment).ok_or_else(not_found)? {
                Cow::Borrowed(Node::Pending(pending)) => {
                    Cow::Borrowed(self.resolve_if(&pending.source)?.0)
                }
                next => next,
            };
        }
        Ok(current)
    }
}

/// Depth-first, pre-order search for the record with the given id.
///
/// Only records carry ids. Procedural tags, ranges and unresolved conditionals
/// are never searched.
pub fn find_item<'a>(id: &str, node: &'a Node) -> Option<&'a Node> {
    match node {
        Node::Record(Record { id: Some(own), .. }) if own == id => Some(node),
        Node::Record(record) => record
            .fields
            .iter()
            .find_map(|(_, value)| find_item(id, value)),
        Node::Sequence(items) => items.iter().find_map(|item| find_item(id, item)),
        Node::Mapping(mapping) => mapping
            .entries
            .iter()
            .find_map(|(_, value)| find_item(id, value)),
        Node::Scalar(_) | Node::Range(_) | Node::Tagged(_) | Node::Proc(_) | Node::Pending(_) => {
            None
        }
    }
}

/// One path step: digits index lists, anything else names a field or key
fn step<'a>(node: &'a Node, segment: &str) -> Option<Cow<'a, Node>> {
    let index = if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        Some(segment.parse::<usize>().ok()?)
    } else {
        None
    };

    match (node, index) {
        (Node::Sequence(items), Some(idx)) => items.get(idx).map(Cow::Borrowed),
        (Node::Mapping(mapping), Some(idx)) => mapping
            .get(&Scalar::Int(i64::try_from(idx).ok()?))
            .map(Cow::Borrowed),
        (Node::Mapping(mapping), None) => mapping.get_str(segment).map(Cow::Borrowed),
        (Node::Record(record), None) => record.get(segment).map(Cow::Borrowed),
        (Node::Range(range), Some(0)) => Some(Cow::Owned(Node::Scalar(range.min.clone()))),
        (Node::Range(range), Some(1)) => Some(Cow::Owned(Node::Scalar(range.max.clone()))),
        _ => None,
    }
}

/// Whether a looked-up value satisfies one case value
pub fn matches(value: &Node, case: &Node) -> bool {
    let number = value.as_scalar().and_then(Scalar::as_f64);
    match case {
        Node::Range(range) => number.is_some_and(|v| range.contains(v)),
        Node::Scalar(expected) if expected.is_numeric() => {
            match (number, expected.as_f64()) {
                (Some(a), Some(b)) => is_close(a, b),
                _ => false,
            }
        }
        _ => value == case,
    }
}

fn is_close(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= REL_TOL * a.abs().max(b.abs())
}

fn display_values(values: &[Cow<'_, Node>], multi: bool) -> String {
    let rendered = values
        .iter()
        .map(|value| codec::to_flow(value).unwrap_or_else(|_| value.describe()))
        .collect::<Vec<_>>();
    if multi {
        format!("[{}]", rendered.join(", "))
    } else {
        rendered.join(", ")
    }
}

/// Resolution error showing the offending conditional
fn annotated(label: &str, message: String, node: &Node) -> ProcgenError {
    match codec::to_yaml(node) {
        Ok(text) => ProcgenError::resolution_at(label, message, text),
        Err(_) => ProcgenError::resolution(label, message),
    }
}
