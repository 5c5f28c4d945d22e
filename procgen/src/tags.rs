//! Procedural tags
//!
//! The closed set of `!Proc*` tags that make a template produce more than one
//! variation (the combinatorial tags) or fill in values after a variation has been
//! assembled (the conditional tags). Constructors validate shape eagerly, so a
//! malformed tag is reported when the template is read and never during expansion.

use crate::node::{Node, Record, RecordKind, Scalar};
use crate::{ProcgenError, ProcgenResult};
use std::sync::Arc;

/// Red, green, blue, then yellow, magenta, cyan, then shades of gray and dark red/green.
pub const COLORS: [(i64, i64, i64); 10] = [
    (255, 0, 0),
    (0, 255, 0),
    (0, 0, 255),
    (255, 255, 0),
    (255, 0, 255),
    (0, 255, 255),
    (192, 192, 192),
    (128, 128, 128),
    (128, 0, 0),
    (0, 128, 0),
];

#[derive(Debug, Clone, PartialEq)]
pub enum ProcTag {
    List(ProcList),
    ListLabelled(ProcListLabelled),
    Color(ProcColor),
    Vector3Scaled(ProcVector3Scaled),
    RepeatChoice(ProcRepeatChoice),
    RestrictCombinations(ProcRestrictCombinations),
    If(Arc<ProcIf>),
    IfLabels(ProcIfLabels),
}

impl ProcTag {
    /// YAML tag name, without the leading `!`
    pub fn tag(&self) -> &'static str {
        match self {
            ProcTag::List(_) => "ProcList",
            ProcTag::ListLabelled(_) => "ProcListLabelled",
            ProcTag::Color(_) => "ProcColor",
            ProcTag::Vector3Scaled(_) => "ProcVector3Scaled",
            ProcTag::RepeatChoice(_) => "ProcRepeatChoice",
            ProcTag::RestrictCombinations(_) => "ProcRestrictCombinations",
            ProcTag::If(_) => "ProcIf",
            ProcTag::IfLabels(_) => "ProcIfLabels",
        }
    }
}

/// Non-negative count field such as `amount`.
///
/// Keeps a node form of the number so generic walks see it like any other child.
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    value: usize,
    node: Box<Node>,
}

impl Amount {
    pub fn new(value: usize) -> Self {
        Self {
            value,
            node: Box::new(Node::Scalar(Scalar::Int(value as i64))),
        }
    }

    pub fn get(&self) -> usize {
        self.value
    }

    pub fn as_node(&self) -> &Node {
        &self.node
    }
}

fn require_static(tag: &str, field: &str, node: &Node) -> ProcgenResult<()> {
    if node.contains_proc() {
        return Err(ProcgenError::structure(format!(
            "!{} `{}` values are copied as-is and cannot contain other !Proc tags, found {}.",
            tag,
            field,
            node.describe()
        )));
    }
    Ok(())
}

/// `!ProcList`: choose exactly one option per variation
#[derive(Debug, Clone, PartialEq)]
pub struct ProcList {
    pub options: Vec<Node>,
}

impl ProcList {
    pub fn new(options: Vec<Node>) -> ProcgenResult<Self> {
        if options.is_empty() {
            return Err(ProcgenError::structure("!ProcList needs at least one option."));
        }
        for option in &options {
            require_static("ProcList", "options", option)?;
        }
        Ok(Self { options })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelledOption {
    pub value: Node,
    pub label: String,
}

/// `!ProcListLabelled`: like `!ProcList`, and the chosen option's label goes into the metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ProcListLabelled {
    pub options: Vec<LabelledOption>,
}

impl ProcListLabelled {
    pub fn new(options: Vec<LabelledOption>) -> ProcgenResult<Self> {
        if options.is_empty() {
            return Err(ProcgenError::structure(
                "!ProcListLabelled needs at least one option.",
            ));
        }
        for option in &options {
            require_static("ProcListLabelled", "value", &option.value)?;
        }
        Ok(Self { options })
    }
}

/// `!ProcColor n`: one of the first `n` palette colors
#[derive(Debug, Clone, PartialEq)]
pub struct ProcColor {
    pub amount: Amount,
}

impl ProcColor {
    pub fn new(amount: usize) -> ProcgenResult<Self> {
        if amount == 0 || amount > COLORS.len() {
            return Err(ProcgenError::structure(format!(
                "!ProcColor amount must be between 1 and {}, got {}.",
                COLORS.len(),
                amount
            )));
        }
        Ok(Self {
            amount: Amount::new(amount),
        })
    }

    pub fn palette(&self) -> &'static [(i64, i64, i64)] {
        &COLORS[..self.amount.get()]
    }
}

/// `!ProcVector3Scaled`: a base vector scaled by one of several factors
#[derive(Debug, Clone, PartialEq)]
pub struct ProcVector3Scaled {
    /// `!Vector3` with numeric components; defaults to (1, 1, 1)
    pub base: Option<Box<Node>>,
    /// Numeric scalars
    pub scales: Vec<Node>,
    pub labels: Option<Vec<String>>,
}

impl ProcVector3Scaled {
    pub fn new(
        base: Option<Node>,
        scales: Vec<Node>,
        labels: Option<Vec<String>>,
    ) -> ProcgenResult<Self> {
        if scales.is_empty() {
            return Err(ProcgenError::structure(
                "!ProcVector3Scaled needs at least one scale.",
            ));
        }
        if let Some(scale) = scales
            .iter()
            .find(|s| !s.as_scalar().is_some_and(Scalar::is_numeric))
        {
            return Err(ProcgenError::structure(format!(
                "!ProcVector3Scaled scales must be numbers, got {}.",
                scale.describe()
            )));
        }
        if let Some(labels) = &labels {
            if labels.len() != scales.len() {
                return Err(ProcgenError::structure(format!(
                    "!ProcVector3Scaled has {} scales but {} labels. They should be equal.",
                    scales.len(),
                    labels.len()
                )));
            }
        }
        if let Some(base) = &base {
            components(base)?;
        }
        Ok(Self {
            base: base.map(Box::new),
            scales,
            labels,
        })
    }

    pub fn scale(&self, index: usize) -> f64 {
        self.scales[index]
            .as_scalar()
            .and_then(Scalar::as_f64)
            .unwrap_or(1.0)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(index))
            .map(String::as_str)
    }

    /// Base vector multiplied by the scale at `index`
    pub fn scaled(&self, index: usize) -> Record {
        let (x, y, z) = match &self.base {
            Some(base) => components(base).unwrap_or((1.0, 1.0, 1.0)),
            None => (1.0, 1.0, 1.0),
        };
        let scale = self.scale(index);
        Record::vector3(x * scale, y * scale, z * scale)
    }
}

fn components(base: &Node) -> ProcgenResult<(f64, f64, f64)> {
    let invalid = || {
        ProcgenError::structure(format!(
            "!ProcVector3Scaled base must be a !Vector3 with numeric x, y and z, got {}.",
            base.describe()
        ))
    };
    let Node::Record(record) = base else {
        return Err(invalid());
    };
    if record.kind != RecordKind::Vector3 {
        return Err(invalid());
    }
    let component = |name: &str| {
        record
            .get(name)
            .and_then(Node::as_scalar)
            .and_then(Scalar::as_f64)
            .ok_or_else(invalid)
    };
    Ok((component("x")?, component("y")?, component("z")?))
}

/// `!ProcRepeatChoice`: one choice from `value`, repeated `amount` times in a list
#[derive(Debug, Clone, PartialEq)]
pub struct ProcRepeatChoice {
    pub amount: Amount,
    pub value: Box<Node>,
}

impl ProcRepeatChoice {
    pub fn new(amount: usize, value: Node) -> Self {
        Self {
            amount: Amount::new(amount),
            value: Box::new(value),
        }
    }
}

/// `!ProcRestrictCombinations`: at most `amount` sampled variations of `item`
#[derive(Debug, Clone, PartialEq)]
pub struct ProcRestrictCombinations {
    pub amount: Amount,
    pub item: Box<Node>,
}

impl ProcRestrictCombinations {
    pub fn new(amount: usize, item: Node) -> Self {
        Self {
            amount: Amount::new(amount),
            item: Box::new(item),
        }
    }
}

/// Variables and cases shared by `!ProcIf` and `!ProcIfLabels`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Dotted references such as `goal.sizes.0.x`
    pub variables: Vec<String>,
    /// `variable` was written as a list
    pub multi: bool,
    /// As written: a value or `!R` range per case, or a list of them when `multi`
    pub cases: Vec<Node>,
}

impl Condition {
    pub fn new(variables: Vec<String>, multi: bool, cases: Vec<Node>) -> ProcgenResult<Self> {
        if variables.is_empty() {
            return Err(ProcgenError::structure("`variable` must name at least one variable."));
        }
        let condition = Self {
            variables,
            multi,
            cases,
        };
        for (idx, case) in condition.cases.iter().enumerate() {
            require_static("ProcIf", "cases", case)?;
            let arity = condition.case_values(idx).len();
            if arity != condition.variables.len() {
                return Err(ProcgenError::structure(format!(
                    "Length of case {} is {} and does not match with length {} of variables.\nCase {}: {}\nVariables: {}",
                    idx + 1,
                    arity,
                    condition.variables.len(),
                    idx + 1,
                    case.describe(),
                    condition.variables.join(", ")
                )));
            }
        }
        Ok(condition)
    }

    /// Positional values of a case, one per variable
    pub fn case_values(&self, idx: usize) -> Vec<&Node> {
        match &self.cases[idx] {
            Node::Sequence(values) => values.iter().collect(),
            value => vec![value],
        }
    }

    /// `variable` as written, for output and messages
    pub fn variable_node(&self) -> Node {
        if self.multi {
            Node::Sequence(self.variables.iter().map(Node::str).collect())
        } else {
            Node::str(self.variables[0].clone())
        }
    }

    /// Variable names the way they were written
    pub fn display_variables(&self) -> String {
        if self.multi {
            format!("[{}]", self.variables.join(", "))
        } else {
            self.variables[0].clone()
        }
    }
}

/// `!ProcIf`: a value picked by matching other values of the finished variation
#[derive(Debug, Clone, PartialEq)]
pub struct ProcIf {
    pub condition: Condition,
    pub then: Vec<Node>,
    pub default: Option<Node>,
    pub labels: Option<Vec<String>>,
    pub default_label: Option<String>,
}

impl ProcIf {
    pub fn new(
        condition: Condition,
        then: Vec<Node>,
        default: Option<Node>,
        labels: Option<Vec<String>>,
        default_label: Option<String>,
    ) -> ProcgenResult<Self> {
        if then.len() != condition.cases.len() {
            return Err(ProcgenError::structure(format!(
                "!ProcIf has {} cases but {} `then` values. They should be equal.",
                condition.cases.len(),
                then.len()
            )));
        }
        if let Some(labels) = &labels {
            if labels.len() != condition.cases.len() {
                return Err(ProcgenError::structure(format!(
                    "!ProcIf has {} cases but {} labels. They should be equal.",
                    condition.cases.len(),
                    labels.len()
                )));
            }
        }
        for value in then.iter().chain(default.iter()) {
            require_static("ProcIf", "then", value)?;
        }
        Ok(Self {
            condition,
            then,
            default,
            labels,
            default_label,
        })
    }

    pub fn label(&self, idx: usize) -> Option<&str> {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(idx))
            .map(String::as_str)
    }
}

/// `!ProcIfLabels`: a label picked by matching values of the finished variation.
///
/// Declared once per document under `proc_meta.proc_labels`, never inline.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcIfLabels {
    pub condition: Condition,
    pub labels: Vec<String>,
    /// Label used when no case matches
    pub default: Option<String>,
}

impl ProcIfLabels {
    pub fn new(
        condition: Condition,
        labels: Vec<String>,
        default: Option<String>,
    ) -> ProcgenResult<Self> {
        if labels.len() != condition.cases.len() {
            return Err(ProcgenError::structure(format!(
                "!ProcIfLabels has a different number of cases ({}) vs. labels ({}). They should be equal.",
                condition.cases.len(),
                labels.len()
            )));
        }
        Ok(Self {
            condition,
            labels,
            default,
        })
    }
}
