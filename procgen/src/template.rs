use crate::node::{Node, RecordKind, PROC_LABELS_FIELD, TEMPLATE_META_FIELD};
use crate::tags::{ProcIfLabels, ProcTag};
use crate::{ProcgenError, ProcgenResult};

/// Document-level settings read from `proc_meta`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateMeta {
    /// Label rules, applied in order after each variation is resolved
    pub proc_labels: Vec<ProcIfLabels>,
}

/// A template ready for generation: the tree without `proc_meta`, plus what it held
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub body: Node,
    pub meta: TemplateMeta,
}

impl Template {
    /// Separate `proc_meta` from the rest of the document. The input is left as is.
    pub fn split(document: &Node) -> ProcgenResult<Self> {
        let Node::Record(root) = document else {
            return Ok(Self {
                body: document.clone(),
                meta: TemplateMeta::default(),
            });
        };
        if root.kind != RecordKind::ArenaConfig {
            return Ok(Self {
                body: document.clone(),
                meta: TemplateMeta::default(),
            });
        }

        let mut body = root.clone();
        let mut meta = TemplateMeta::default();
        if let Some(pos) = body
            .fields
            .iter()
            .position(|(name, _)| name == TEMPLATE_META_FIELD)
        {
            let (_, section) = body.fields.remove(pos);
            meta.proc_labels = label_rules(&section)?;
        }

        Ok(Self {
            body: Node::Record(body),
            meta,
        })
    }
}

fn label_rules(section: &Node) -> ProcgenResult<Vec<ProcIfLabels>> {
    let Node::Mapping(section) = section else {
        return Err(ProcgenError::structure(
            "`proc_meta` must be a mapping.",
        ));
    };
    let Some(rules) = section.get_str(PROC_LABELS_FIELD) else {
        return Ok(Vec::new());
    };
    let Node::Sequence(rules) = rules else {
        return Err(ProcgenError::structure(
            "`proc_labels` must be a list of !ProcIfLabels.",
        ));
    };
    rules
        .iter()
        .map(|rule| match rule {
            Node::Proc(ProcTag::IfLabels(rule)) => Ok(rule.clone()),
            other => Err(ProcgenError::structure(format!(
                "`proc_labels` must be a list of !ProcIfLabels, found {}.",
                other.describe()
            ))),
        })
        .collect()
}
