//! Second pass over a finished variation
//!
//! Every [`Node::Pending`] left by expansion is resolved against the variation in
//! depth-first order and replaced in place, so later conditionals see the values
//! of earlier ones. Document-level `!ProcIfLabels` rules run last.

use crate::meta::Metadata;
use crate::node::Node;
use crate::resolver::ConditionResolver;
use crate::tags::ProcIfLabels;
use crate::{ProcgenError, ProcgenResult};
use tracing::debug;

/// Child positions from the root down to one node
type NodePath = Vec<usize>;

/// Fill in all conditionals of `variation` and append their labels to `meta`
pub fn resolve_variation(
    variation: &mut Node,
    meta: &mut Metadata,
    rules: &[ProcIfLabels],
) -> ProcgenResult<()> {
    let mut pending = Vec::new();
    collect_pending(variation, &mut Vec::new(), &mut pending);

    for path in pending {
        let source = match node_at(variation, &path) {
            Some(Node::Pending(placeholder)) => placeholder.source.clone(),
            _ => {
                return Err(ProcgenError::internal(format!(
                    "Expected an unresolved !ProcIf at {:?}",
                    path
                )))
            }
        };

        let (value, label) = {
            let mut resolver = ConditionResolver::new(variation);
            let (value, label) = resolver.resolve_if(&source)?;
            (value.clone(), label.map(str::to_owned))
        };
        debug!(
            variables = %source.condition.display_variables(),
            label = label.as_deref().unwrap_or(""),
            "Resolved !ProcIf"
        );

        let slot = node_at_mut(variation, &path).ok_or_else(|| {
            ProcgenError::internal(format!("Lost the !ProcIf at {:?}", path))
        })?;
        *slot = value;
        meta.add_label(label.as_deref());
    }

    for rule in rules {
        let label = ConditionResolver::new(variation)
            .resolve_labels(rule)?
            .to_owned();
        debug!(label = %label, "Applied !ProcIfLabels");
        meta.labels.push(label);
    }

    Ok(())
}

/// Paths of all placeholders, depth-first pre-order
fn collect_pending(node: &Node, path: &mut NodePath, out: &mut Vec<NodePath>) {
    let children: Vec<&Node> = match node {
        Node::Pending(_) => {
            out.push(path.clone());
            return;
        }
        Node::Sequence(items) => items.iter().collect(),
        Node::Mapping(mapping) => mapping.entries.iter().map(|(_, value)| value).collect(),
        Node::Record(record) => record.fields.iter().map(|(_, value)| value).collect(),
        Node::Scalar(_) | Node::Range(_) | Node::Tagged(_) | Node::Proc(_) => return,
    };
    for (idx, child) in children.into_iter().enumerate() {
        path.push(idx);
        collect_pending(child, path, out);
        path.pop();
    }
}

fn node_at<'n>(node: &'n Node, path: &[usize]) -> Option<&'n Node> {
    let Some((&first, rest)) = path.split_first() else {
        return Some(node);
    };
    let child = match node {
        Node::Sequence(items) => items.get(first)?,
        Node::Mapping(mapping) => &mapping.entries.get(first)?.1,
        Node::Record(record) => &record.fields.get(first)?.1,
        _ => return None,
    };
    node_at(child, rest)
}

fn node_at_mut<'n>(node: &'n mut Node, path: &[usize]) -> Option<&'n mut Node> {
    let Some((&first, rest)) = path.split_first() else {
        return Some(node);
    };
    let child = match node {
        Node::Sequence(items) => items.get_mut(first)?,
        Node::Mapping(mapping) => &mut mapping.entries.get_mut(first)?.1,
        Node::Record(record) => &mut record.fields.get_mut(first)?.1,
        _ => return None,
    };
    node_at_mut(child, rest)
}
