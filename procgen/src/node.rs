//! Document model
//!
//! A template is a tree of [`Node`]s. Plain YAML containers and scalars sit next to
//! fixed-schema AnimalAI records (`!Item`, `!Vector3`, ...), the `!R` range operand,
//! and the procedural tags from [`crate::tags`]. Expanded variations use the same
//! type, with [`Node::Pending`] standing in for conditionals that still need the
//! deferred pass.

use crate::tags::{ProcIf, ProcTag};
use crate::{ProcgenError, ProcgenResult};
use std::fmt;
use std::sync::Arc;

/// Any element of a template or variation tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Sequence(Vec<Node>),
    Mapping(Mapping),
    Scalar(Scalar),
    Record(Record),
    Range(Range),
    Tagged(TaggedScalar),
    Proc(ProcTag),
    Pending(Pending),
}

/// YAML scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", format_float(*x)),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Render a float so that it reads back as a float (`1.0`, not `1`)
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        ".nan".to_string()
    } else if value.is_infinite() && value > 0.0 {
        ".inf".to_string()
    } else if value.is_infinite() {
        "-.inf".to_string()
    } else if value.abs() >= 1e16 || (value != 0.0 && value.abs() < 1e-4) {
        // Exponent form; plain digits this large would read back as an integer.
        format!("{:e}", value)
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Plain YAML mapping; keeps source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    pub entries: Vec<(Scalar, Node)>,
}

impl Mapping {
    pub fn new(entries: Vec<(Scalar, Node)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &Scalar) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, Scalar::Str(s) if s == key))
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The fixed-schema AnimalAI mapping types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    ArenaConfig,
    Arena,
    Item,
    Vector3,
    Rgb,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::ArenaConfig,
        RecordKind::Arena,
        RecordKind::Item,
        RecordKind::Vector3,
        RecordKind::Rgb,
    ];

    /// YAML tag name, without the leading `!`
    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::ArenaConfig => "ArenaConfig",
            RecordKind::Arena => "Arena",
            RecordKind::Item => "Item",
            RecordKind::Vector3 => "Vector3",
            RecordKind::Rgb => "RGB",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Allowed fields, in output order
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            RecordKind::ArenaConfig => &[
                "arenas",
                "randomizeArenas",
                "showNotification",
                "canResetEpisode",
                "canChangePerspective",
                TEMPLATE_META_FIELD,
            ],
            RecordKind::Arena => &["pass_mark", "t", "items"],
            RecordKind::Item => &["name", "positions", "rotations", "colors", "sizes"],
            RecordKind::Vector3 => &["x", "y", "z"],
            RecordKind::Rgb => &["r", "g", "b"],
        }
    }

    /// Small records render on one line
    pub fn is_flow(&self) -> bool {
        matches!(self, RecordKind::Vector3 | RecordKind::Rgb)
    }
}

/// Field of `!ArenaConfig` holding document-level settings. Never part of the output.
pub const TEMPLATE_META_FIELD: &str = "proc_meta";

/// Key under [`TEMPLATE_META_FIELD`] listing the `!ProcIfLabels` rules
pub const PROC_LABELS_FIELD: &str = "proc_labels";

/// Field that names a record as a cross-reference target. Never part of the output.
pub const ID_FIELD: &str = "id";

/// Fixed-schema mapping, e.g. `!Item` or `!Vector3`
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    /// Fields in source order
    pub fields: Vec<(String, Node)>,
    pub id: Option<String>,
}

impl Record {
    pub fn new(kind: RecordKind, fields: Vec<(String, Node)>) -> Self {
        Self {
            kind,
            fields,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Node> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Fields in the kind's declared order, skipping absent ones
    pub fn ordered_fields(&self) -> Vec<(&str, &Node)> {
        self.kind
            .fields()
            .iter()
            .filter_map(|name| self.get(name).map(|value| (*name, value)))
            .collect()
    }

    /// A copy with the same kind and id but new field values, in the same order
    pub fn with_values(&self, values: Vec<Node>) -> Record {
        Record {
            kind: self.kind,
            fields: self
                .fields
                .iter()
                .map(|(name, _)| name.clone())
                .zip(values)
                .collect(),
            id: self.id.clone(),
        }
    }

    /// Three numeric components as a `!Vector3`
    pub fn vector3(x: f64, y: f64, z: f64) -> Record {
        Record::new(
            RecordKind::Vector3,
            vec![
                ("x".to_string(), Node::Scalar(Scalar::Float(x))),
                ("y".to_string(), Node::Scalar(Scalar::Float(y))),
                ("z".to_string(), Node::Scalar(Scalar::Float(z))),
            ],
        )
    }

    pub fn rgb(r: i64, g: i64, b: i64) -> Record {
        Record::new(
            RecordKind::Rgb,
            vec![
                ("r".to_string(), Node::Scalar(Scalar::Int(r))),
                ("g".to_string(), Node::Scalar(Scalar::Int(g))),
                ("b".to_string(), Node::Scalar(Scalar::Int(b))),
            ],
        )
    }
}

/// Closed numeric interval `!R [min, max]`, only used as a case in conditionals
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub min: Scalar,
    pub max: Scalar,
}

impl Range {
    pub fn new(min: Scalar, max: Scalar) -> ProcgenResult<Self> {
        let (Some(lo), Some(hi)) = (min.as_f64(), max.as_f64()) else {
            return Err(ProcgenError::structure(format!(
                "Range !R bounds must be numbers, got [{}, {}].",
                min, max
            )));
        };
        if lo > hi {
            return Err(ProcgenError::structure(format!(
                "Range !R minimum {} is greater than maximum {}.",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        match (self.min.as_f64(), self.max.as_f64()) {
            (Some(lo), Some(hi)) => lo <= value && value <= hi,
            _ => false,
        }
    }
}

/// Any other scalar carrying an application tag; copied through unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedScalar {
    pub tag: String,
    pub value: Scalar,
}

/// Unresolved output of a `!ProcIf`, replaced during the deferred pass
#[derive(Debug, Clone)]
pub struct Pending {
    pub source: Arc<ProcIf>,
}

impl Pending {
    pub fn new(source: Arc<ProcIf>) -> Self {
        Self { source }
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

impl Node {
    pub fn str(value: impl Into<String>) -> Node {
        Node::Scalar(Scalar::Str(value.into()))
    }

    pub fn int(value: i64) -> Node {
        Node::Scalar(Scalar::Int(value))
    }

    pub fn float(value: f64) -> Node {
        Node::Scalar(Scalar::Float(value))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether this subtree contains a procedural tag anywhere
    pub fn contains_proc(&self) -> bool {
        match self {
            Node::Proc(_) | Node::Pending(_) => true,
            Node::Sequence(items) => items.iter().any(Node::contains_proc),
            Node::Mapping(mapping) => mapping.entries.iter().any(|(_, v)| v.contains_proc()),
            Node::Record(record) => record.fields.iter().any(|(_, v)| v.contains_proc()),
            Node::Scalar(_) | Node::Range(_) | Node::Tagged(_) => false,
        }
    }

    /// Short description for error messages
    pub fn describe(&self) -> String {
        match self {
            Node::Sequence(items) => format!("a list of {} items", items.len()),
            Node::Mapping(_) => "a mapping".to_string(),
            Node::Scalar(scalar) => format!("the value {}", scalar),
            Node::Record(record) => format!("!{}", record.kind.tag()),
            Node::Range(range) => format!("!R [{}, {}]", range.min, range.max),
            Node::Tagged(tagged) => format!("!{} {}", tagged.tag, tagged.value),
            Node::Proc(tag) => format!("!{}", tag.tag()),
            Node::Pending(_) => "an unresolved !ProcIf".to_string(),
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<Record> for Node {
    fn from(record: Record) -> Self {
        Node::Record(record)
    }
}

impl From<ProcTag> for Node {
    fn from(tag: ProcTag) -> Self {
        Node::Proc(tag)
    }
}
