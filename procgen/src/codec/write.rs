use crate::node::{format_float, Mapping, Node, Record, Scalar};
use crate::tags::ProcTag;
use crate::{ProcgenError, ProcgenResult};
use std::borrow::Cow;
use std::fmt::Write;

/// Characters that end a plain scalar inside `[...]` or `{...}`
const FLOW_INDICATORS: [char; 5] = [',', '[', ']', '{', '}'];

/// Render a node as a YAML document
pub fn to_yaml(node: &Node) -> ProcgenResult<String> {
    let mut out = String::new();
    match shape(node)? {
        Shape::Inline(text) => writeln!(out, "{}", text)?,
        Shape::Tagged(tag, body) => {
            writeln!(out, "!{}", tag)?;
            write_body(&mut out, body, 0)?;
        }
        Shape::Plain(body) => write_body(&mut out, body, 0)?,
    }
    Ok(out)
}

/// Render a node on a single line, in YAML flow style
pub fn to_flow(node: &Node) -> ProcgenResult<String> {
    match node {
        Node::Scalar(scalar) => scalar_text(scalar, true),
        Node::Tagged(tagged) => Ok(format!("!{} {}", tagged.tag, scalar_text(&tagged.value, true)?)),
        Node::Range(range) => Ok(format!(
            "!R [{}, {}]",
            scalar_text(&range.min, true)?,
            scalar_text(&range.max, true)?
        )),
        Node::Sequence(items) => {
            let items = items.iter().map(to_flow).collect::<ProcgenResult<Vec<_>>>()?;
            Ok(format!("[{}]", items.join(", ")))
        }
        Node::Mapping(mapping) => flow_mapping(mapping),
        Node::Record(record) => {
            let fields = record
                .ordered_fields()
                .into_iter()
                .map(|(name, value)| Ok(format!("{}: {}", name, to_flow(value)?)))
                .collect::<ProcgenResult<Vec<_>>>()?;
            Ok(format!("!{} {{{}}}", record.kind.tag(), fields.join(", ")))
        }
        Node::Proc(tag) => Ok(format!("!{} {}", tag.tag(), to_flow(&proc_view(tag))?)),
        Node::Pending(_) => Err(unresolved()),
    }
}

fn flow_mapping(mapping: &Mapping) -> ProcgenResult<String> {
    let entries = mapping
        .entries
        .iter()
        .map(|(key, value)| Ok(format!("{}: {}", scalar_text(key, true)?, to_flow(value)?)))
        .collect::<ProcgenResult<Vec<_>>>()?;
    Ok(format!("{{{}}}", entries.join(", ")))
}

fn unresolved() -> ProcgenError {
    ProcgenError::internal("An unresolved !ProcIf was about to be written.")
}

/// How a node is laid out
enum Shape<'n> {
    /// On the line of its key or list dash
    Inline(String),
    /// A tag after the key or dash, the body on the lines below
    Tagged(&'static str, Body<'n>),
    /// Only the body, on the lines below
    Plain(Body<'n>),
}

enum Body<'n> {
    Entries(Vec<(String, Cow<'n, Node>)>),
    Items(Vec<Cow<'n, Node>>),
}

fn shape(node: &Node) -> ProcgenResult<Shape<'_>> {
    if let Some(text) = inline(node)? {
        return Ok(Shape::Inline(text));
    }
    Ok(match node {
        Node::Sequence(items) => Shape::Plain(Body::Items(items.iter().map(Cow::Borrowed).collect())),
        Node::Mapping(mapping) => Shape::Plain(entries(mapping)?),
        Node::Record(record) => Shape::Tagged(record.kind.tag(), record_entries(record)),
        Node::Proc(tag) => Shape::Tagged(tag.tag(), owned_body(proc_view(tag))?),
        _ => return Err(ProcgenError::internal(format!("Cannot lay out {}", node.describe()))),
    })
}

/// Flow text for nodes that stay on one line, `None` for block nodes
fn inline(node: &Node) -> ProcgenResult<Option<String>> {
    let is_inline = match node {
        Node::Scalar(_) | Node::Tagged(_) | Node::Range(_) => true,
        Node::Sequence(items) => items
            .iter()
            .all(|item| matches!(item, Node::Scalar(_) | Node::Range(_) | Node::Tagged(_))),
        Node::Mapping(mapping) => mapping.is_empty(),
        Node::Record(record) => record.kind.is_flow() || record.fields.is_empty(),
        Node::Proc(tag) => return Ok(inline(&proc_view(tag))?.map(|text| format!("!{} {}", tag.tag(), text))),
        Node::Pending(_) => return Err(unresolved()),
    };
    if is_inline {
        to_flow(node).map(Some)
    } else {
        Ok(None)
    }
}

fn entries(mapping: &Mapping) -> ProcgenResult<Body<'_>> {
    let entries = mapping
        .entries
        .iter()
        .map(|(key, value)| Ok((scalar_text(key, false)?, Cow::Borrowed(value))))
        .collect::<ProcgenResult<Vec<_>>>()?;
    Ok(Body::Entries(entries))
}

fn record_entries(record: &Record) -> Body<'_> {
    Body::Entries(
        record
            .ordered_fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), Cow::Borrowed(value)))
            .collect(),
    )
}

fn owned_body(view: Node) -> ProcgenResult<Body<'static>> {
    match view {
        Node::Sequence(items) => Ok(Body::Items(items.into_iter().map(Cow::Owned).collect())),
        Node::Mapping(mapping) => {
            let entries = mapping
                .entries
                .into_iter()
                .map(|(key, value)| Ok((scalar_text(&key, false)?, Cow::Owned(value))))
                .collect::<ProcgenResult<Vec<_>>>()?;
            Ok(Body::Entries(entries))
        }
        other => Err(ProcgenError::internal(format!(
            "Cannot lay out {} as a block",
            other.describe()
        ))),
    }
}

fn write_body(out: &mut String, body: Body<'_>, indent: usize) -> ProcgenResult<()> {
    match body {
        Body::Entries(entries) => {
            for (key, value) in entries {
                write_entry(out, &key, &value, indent)?;
            }
        }
        Body::Items(items) => {
            for item in items {
                write_item(out, &item, indent)?;
            }
        }
    }
    Ok(())
}

fn write_entry(out: &mut String, key: &str, value: &Node, indent: usize) -> ProcgenResult<()> {
    let pad = " ".repeat(indent);
    match shape(value)? {
        Shape::Inline(text) => writeln!(out, "{}{}: {}", pad, key, text)?,
        Shape::Tagged(tag, body) => {
            writeln!(out, "{}{}: !{}", pad, key, tag)?;
            write_body(out, body, indent + 2)?;
        }
        Shape::Plain(body) => {
            writeln!(out, "{}{}:", pad, key)?;
            write_body(out, body, indent + 2)?;
        }
    }
    Ok(())
}

fn write_item(out: &mut String, item: &Node, indent: usize) -> ProcgenResult<()> {
    let pad = " ".repeat(indent);
    match shape(item)? {
        Shape::Inline(text) => writeln!(out, "{}- {}", pad, text)?,
        Shape::Tagged(tag, body) => {
            writeln!(out, "{}- !{}", pad, tag)?;
            write_body(out, body, indent + 2)?;
        }
        Shape::Plain(body) => {
            // The dash takes the place of the first line's indentation.
            let mut nested = String::new();
            write_body(&mut nested, body, indent + 2)?;
            out.push_str(&pad);
            out.push_str("- ");
            out.push_str(&nested[indent + 2..]);
        }
    }
    Ok(())
}

fn scalar_text(scalar: &Scalar, flow: bool) -> ProcgenResult<String> {
    Ok(match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => format_float(*f),
        Scalar::Str(s) => string_text(s, flow)?,
    })
}

/// Quote a string only when YAML would read it as something else
fn string_text(value: &str, flow: bool) -> ProcgenResult<String> {
    let emitted = serde_yaml::to_string(value)
        .map_err(|err| ProcgenError::internal(format!("Could not quote {:?}: {}", value, err)))?;
    let emitted = emitted.trim_end_matches('\n');
    let plain_in_flow = flow && emitted == value && value.contains(FLOW_INDICATORS);
    if emitted.contains('\n') || plain_in_flow {
        return serde_json::to_string(value)
            .map_err(|err| ProcgenError::internal(format!("Could not quote {:?}: {}", value, err)));
    }
    Ok(emitted.to_string())
}

/// Plain-node view of a procedural tag, used to write template copies
fn proc_view(tag: &ProcTag) -> Node {
    fn entry(key: &str, value: Node) -> (Scalar, Node) {
        (Scalar::Str(key.to_string()), value)
    }
    fn strings(values: &[String]) -> Node {
        Node::Sequence(values.iter().map(Node::str).collect())
    }

    match tag {
        ProcTag::List(list) => Node::Sequence(list.options.clone()),
        ProcTag::ListLabelled(list) => Node::Sequence(
            list.options
                .iter()
                .map(|option| {
                    Node::Mapping(Mapping::new(vec![
                        entry("value", option.value.clone()),
                        entry("label", Node::str(option.label.clone())),
                    ]))
                })
                .collect(),
        ),
        ProcTag::Color(color) => color.amount.as_node().clone(),
        ProcTag::Vector3Scaled(scaled) => {
            let mut entries = Vec::new();
            if let Some(base) = &scaled.base {
                entries.push(entry("base", base.as_ref().clone()));
            }
            entries.push(entry("scales", Node::Sequence(scaled.scales.clone())));
            if let Some(labels) = &scaled.labels {
                entries.push(entry("labels", strings(labels)));
            }
            Node::Mapping(Mapping::new(entries))
        }
        ProcTag::RepeatChoice(choice) => Node::Mapping(Mapping::new(vec![
            entry("amount", choice.amount.as_node().clone()),
            entry("value", choice.value.as_ref().clone()),
        ])),
        ProcTag::RestrictCombinations(restrict) => Node::Mapping(Mapping::new(vec![
            entry("amount", restrict.amount.as_node().clone()),
            entry("item", restrict.item.as_ref().clone()),
        ])),
        ProcTag::If(proc_if) => {
            let mut entries = vec![
                entry("variable", proc_if.condition.variable_node()),
                entry("cases", Node::Sequence(proc_if.condition.cases.clone())),
                entry("then", Node::Sequence(proc_if.then.clone())),
            ];
            if let Some(default) = &proc_if.default {
                entries.push(entry("default", default.clone()));
            }
            if let Some(labels) = &proc_if.labels {
                entries.push(entry("labels", strings(labels)));
            }
            if let Some(label) = &proc_if.default_label {
                entries.push(entry("default_label", Node::str(label.clone())));
            }
            Node::Mapping(Mapping::new(entries))
        }
        ProcTag::IfLabels(rule) => {
            let mut entries = vec![
                entry("variable", rule.condition.variable_node()),
                entry("cases", Node::Sequence(rule.condition.cases.clone())),
                entry("labels", strings(&rule.labels)),
            ];
            if let Some(default) = &rule.default {
                entries.push(entry("default", Node::str(default.clone())));
            }
            Node::Mapping(Mapping::new(entries))
        }
    }
}
