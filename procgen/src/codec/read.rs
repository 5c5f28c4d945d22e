use crate::node::{
    Mapping, Node, Range, Record, RecordKind, Scalar, TaggedScalar, ID_FIELD, PROC_LABELS_FIELD,
    TEMPLATE_META_FIELD,
};
use crate::tags::{
    Condition, LabelledOption, ProcColor, ProcIf, ProcIfLabels, ProcList, ProcListLabelled,
    ProcRepeatChoice, ProcRestrictCombinations, ProcTag, ProcVector3Scaled,
};
use crate::{ProcgenError, ProcgenResult};
use serde_yaml::value::TaggedValue;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Read and parse a template file
pub fn read(path: &Path) -> ProcgenResult<Node> {
    let source_id = path.display().to_string();
    let text = fs::read_to_string(path)
        .map_err(|err| ProcgenError::io(source_id.clone(), err.to_string()))?;
    parse(&text, &source_id)
}

/// Parse a template from YAML text. `source_id` names the text in error messages.
pub fn parse(text: &str, source_id: &str) -> ProcgenResult<Node> {
    let value: Value =
        serde_yaml::from_str(text).map_err(|err| syntax_error(&err, text, source_id))?;
    to_node(&value)
}

fn syntax_error(err: &serde_yaml::Error, text: &str, source_id: &str) -> ProcgenError {
    let (index, line, column) = match err.location() {
        Some(location) => (Some(location.index()), location.line(), location.column()),
        None => (None, 0, 0),
    };
    ProcgenError::parse(
        err.to_string(),
        source_id,
        Arc::from(text),
        index,
        line,
        column,
    )
}

/// Structural error showing the YAML it was raised for
fn invalid(message: impl Into<String>, value: &Value) -> ProcgenError {
    match serde_yaml::to_string(value) {
        Ok(text) => ProcgenError::structure_at(message, text),
        Err(_) => ProcgenError::structure(message),
    }
}

fn to_node(value: &Value) -> ProcgenResult<Node> {
    match value {
        Value::Sequence(items) => Ok(Node::Sequence(
            items.iter().map(to_node).collect::<ProcgenResult<_>>()?,
        )),
        Value::Mapping(mapping) => {
            let mut entries = Vec::with_capacity(mapping.len());
            for (key, value) in mapping {
                let key = to_scalar(key)
                    .ok_or_else(|| invalid("Mapping keys must be plain scalars.", key))?;
                entries.push((key, to_node(value)?));
            }
            Ok(Node::Mapping(Mapping::new(entries)))
        }
        Value::Tagged(tagged) => to_tagged(tagged),
        scalar => to_scalar(scalar)
            .map(Node::Scalar)
            .ok_or_else(|| invalid("Expected a scalar.", scalar)),
    }
}

fn to_scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Null => Some(Scalar::Null),
        Value::Bool(b) => Some(Scalar::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Scalar::Int(i)),
            None => n.as_f64().map(Scalar::Float),
        },
        Value::String(s) => Some(Scalar::Str(s.clone())),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Tag without the leading `!`
fn tag_name(tagged: &TaggedValue) -> String {
    tagged.tag.to_string().trim_start_matches('!').to_string()
}

fn to_tagged(tagged: &TaggedValue) -> ProcgenResult<Node> {
    let tag = tag_name(tagged);
    let tag = tag.as_str();
    let value = &tagged.value;

    if let Some(kind) = RecordKind::from_tag(tag) {
        return to_record(kind, value).map(Node::Record);
    }

    let proc = match tag {
        "R" => return to_range(value).map(Node::Range),
        "ProcList" => ProcTag::List(ProcList::new(nodes("ProcList", value)?)?),
        "ProcListLabelled" => ProcTag::ListLabelled(to_list_labelled(value)?),
        "ProcColor" => ProcTag::Color(ProcColor::new(amount("ProcColor", value)?)?),
        "ProcVector3Scaled" => ProcTag::Vector3Scaled(to_vector3_scaled(value)?),
        "ProcRepeatChoice" => {
            let fields = Fields::new("ProcRepeatChoice", value, &["amount", "value"])?;
            ProcTag::RepeatChoice(ProcRepeatChoice::new(
                amount("ProcRepeatChoice", fields.required("amount")?)?,
                to_node(fields.required("value")?)?,
            ))
        }
        "ProcRestrictCombinations" => {
            let fields =
                Fields::new("ProcRestrictCombinations", value, &["amount", "item", "value"])?;
            let item = match (fields.get("item"), fields.get("value")) {
                (Some(_), Some(_)) => {
                    return Err(invalid(
                        "!ProcRestrictCombinations takes either `item` or `value`, not both.",
                        value,
                    ))
                }
                (Some(item), None) | (None, Some(item)) => item,
                (None, None) => fields.required("item")?,
            };
            ProcTag::RestrictCombinations(ProcRestrictCombinations::new(
                amount("ProcRestrictCombinations", fields.required("amount")?)?,
                to_node(item)?,
            ))
        }
        "ProcIf" => ProcTag::If(Arc::new(to_proc_if(value)?)),
        "ProcIfLabels" => {
            return Err(invalid(
                "!ProcIfLabels can only be declared under proc_meta.proc_labels of the !ArenaConfig.",
                value,
            ))
        }
        other => return to_unknown(other, value),
    };
    Ok(Node::Proc(proc))
}

/// Application scalar tags are kept as they are. Anything bigger is a typo.
fn to_unknown(tag: &str, value: &Value) -> ProcgenResult<Node> {
    match to_scalar(value) {
        Some(scalar) => Ok(Node::Tagged(TaggedScalar {
            tag: tag.to_string(),
            value: scalar,
        })),
        None => Err(invalid(format!("Unknown tag !{}.", tag), value)),
    }
}

fn to_record(kind: RecordKind, value: &Value) -> ProcgenResult<Record> {
    let mapping = match value {
        Value::Mapping(mapping) => Some(mapping),
        Value::Null => None,
        _ => {
            return Err(invalid(
                format!("!{} must be a mapping.", kind.tag()),
                value,
            ))
        }
    };

    let mut record = Record::new(kind, Vec::new());
    for (key, field) in mapping.into_iter().flatten() {
        let name = key_name(key)
            .ok_or_else(|| invalid(format!("!{} keys must be strings.", kind.tag()), value))?;
        if name == ID_FIELD {
            let id = to_scalar(field)
                .filter(|id| !matches!(id, Scalar::Null))
                .ok_or_else(|| invalid("`id` must be a plain value.", field))?;
            record.id = Some(id.to_string());
            continue;
        }
        if !kind.fields().contains(&name.as_str()) {
            return Err(invalid(
                format!(
                    "Unexpected key '{}' in tag '{}'. Allowed keys: {}.",
                    name,
                    kind.tag(),
                    kind.fields().join(", ")
                ),
                value,
            ));
        }
        let node = if kind == RecordKind::ArenaConfig && name == TEMPLATE_META_FIELD {
            to_template_meta(field)?
        } else {
            to_node(field)?
        };
        record.fields.push((name, node));
    }
    Ok(record)
}

/// `proc_meta: {proc_labels: [!ProcIfLabels ...]}`
fn to_template_meta(value: &Value) -> ProcgenResult<Node> {
    let fields = Fields::new(TEMPLATE_META_FIELD, value, &[PROC_LABELS_FIELD])?;
    let mut rules = Vec::new();
    if let Some(labels) = fields.get(PROC_LABELS_FIELD) {
        let Value::Sequence(items) = labels else {
            return Err(invalid(
                "`proc_labels` must be a list of !ProcIfLabels.",
                labels,
            ));
        };
        for item in items {
            match item {
                Value::Tagged(tagged) if tag_name(tagged) == "ProcIfLabels" => {
                    rules.push(Node::Proc(ProcTag::IfLabels(to_proc_if_labels(
                        &tagged.value,
                    )?)));
                }
                other => {
                    return Err(invalid(
                        "`proc_labels` must be a list of !ProcIfLabels.",
                        other,
                    ))
                }
            }
        }
    }
    Ok(Node::Mapping(Mapping::new(vec![(
        Scalar::Str(PROC_LABELS_FIELD.to_string()),
        Node::Sequence(rules),
    )])))
}

fn to_range(value: &Value) -> ProcgenResult<Range> {
    let bounds = match value {
        Value::Sequence(items) => items.iter().map(to_scalar).collect::<Option<Vec<_>>>(),
        _ => None,
    };
    match bounds {
        Some(bounds) if bounds.len() == 2 => {
            let mut bounds = bounds.into_iter();
            match (bounds.next(), bounds.next()) {
                (Some(min), Some(max)) => Range::new(min, max),
                _ => Err(invalid("Range !R must have exactly 2 elements.", value)),
            }
        }
        Some(bounds) => Err(invalid(
            format!("Range !R must have exactly 2 elements, got {}.", bounds.len()),
            value,
        )),
        None => Err(invalid("Range !R must be a list of two numbers.", value)),
    }
}

fn to_list_labelled(value: &Value) -> ProcgenResult<ProcListLabelled> {
    let Value::Sequence(items) = value else {
        return Err(invalid("!ProcListLabelled must be a list.", value));
    };
    let options = items
        .iter()
        .map(|item| {
            let fields = Fields::new("ProcListLabelled", item, &["value", "label"]).map_err(
                |_| {
                    invalid(
                        "!ProcListLabelled items must be a mapping of (value, label).",
                        item,
                    )
                },
            )?;
            Ok(LabelledOption {
                value: to_node(fields.required("value")?)?,
                label: string("ProcListLabelled", "label", fields.required("label")?)?,
            })
        })
        .collect::<ProcgenResult<Vec<_>>>()?;
    ProcListLabelled::new(options)
}

fn to_vector3_scaled(value: &Value) -> ProcgenResult<ProcVector3Scaled> {
    let fields = Fields::new("ProcVector3Scaled", value, &["base", "scales", "labels"])?;
    let base = fields.get("base").map(to_node).transpose()?;
    let scales = nodes("ProcVector3Scaled", fields.required("scales")?)?;
    let labels = fields
        .get("labels")
        .map(|labels| strings("ProcVector3Scaled", "labels", labels))
        .transpose()?;
    ProcVector3Scaled::new(base, scales, labels)
}

fn to_condition(tag: &'static str, fields: &Fields<'_>) -> ProcgenResult<Condition> {
    let variable = fields.required("variable")?;
    let (variables, multi) = match variable {
        Value::Sequence(_) => (strings(tag, "variable", variable)?, true),
        _ => (vec![string(tag, "variable", variable)?], false),
    };
    let cases = nodes(tag, fields.required("cases")?)?;
    Condition::new(variables, multi, cases)
}

fn to_proc_if(value: &Value) -> ProcgenResult<ProcIf> {
    let fields = Fields::new(
        "ProcIf",
        value,
        &["variable", "cases", "then", "default", "labels", "default_label"],
    )?;
    let condition = to_condition("ProcIf", &fields)?;
    let then = nodes("ProcIf", fields.required("then")?)?;
    let default = fields
        .get("default")
        .filter(|default| !default.is_null())
        .map(to_node)
        .transpose()?;
    let labels = fields
        .get("labels")
        .map(|labels| strings("ProcIf", "labels", labels))
        .transpose()?;
    let default_label = fields
        .get("default_label")
        .map(|label| string("ProcIf", "default_label", label))
        .transpose()?;
    ProcIf::new(condition, then, default, labels, default_label)
}

fn to_proc_if_labels(value: &Value) -> ProcgenResult<ProcIfLabels> {
    let fields = Fields::new(
        "ProcIfLabels",
        value,
        &["variable", "cases", "labels", "default"],
    )?;
    let condition = to_condition("ProcIfLabels", &fields)?;
    let labels = strings("ProcIfLabels", "labels", fields.required("labels")?)?;
    let default = fields
        .get("default")
        .map(|label| string("ProcIfLabels", "default", label))
        .transpose()?;
    ProcIfLabels::new(condition, labels, default)
}

fn key_name(key: &Value) -> Option<String> {
    match to_scalar(key)? {
        Scalar::Null => None,
        scalar => Some(scalar.to_string()),
    }
}

fn nodes(tag: &str, value: &Value) -> ProcgenResult<Vec<Node>> {
    match value {
        Value::Sequence(items) => items.iter().map(to_node).collect(),
        _ => Err(invalid(format!("!{} expects a list here.", tag), value)),
    }
}

fn string(tag: &str, field: &str, value: &Value) -> ProcgenResult<String> {
    match to_scalar(value) {
        Some(Scalar::Null) | None => Err(invalid(
            format!("!{} `{}` must be a string.", tag, field),
            value,
        )),
        Some(scalar) => Ok(scalar.to_string()),
    }
}

fn strings(tag: &str, field: &str, value: &Value) -> ProcgenResult<Vec<String>> {
    match value {
        Value::Sequence(items) => items.iter().map(|item| string(tag, field, item)).collect(),
        _ => Err(invalid(
            format!("!{} `{}` must be a list of strings.", tag, field),
            value,
        )),
    }
}

fn amount(tag: &str, value: &Value) -> ProcgenResult<usize> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(format!("!{} amount must be a non-negative integer.", tag), value))
}

/// Keys of a tag's mapping, checked against the keys it accepts
struct Fields<'v> {
    tag: &'static str,
    source: &'v Value,
    entries: Vec<(String, &'v Value)>,
}

impl<'v> Fields<'v> {
    fn new(tag: &'static str, value: &'v Value, allowed: &[&str]) -> ProcgenResult<Self> {
        let Value::Mapping(mapping) = value else {
            return Err(invalid(format!("!{} must be a mapping.", tag), value));
        };
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, field) in mapping {
            let name =
                key_name(key).ok_or_else(|| invalid(format!("!{} keys must be strings.", tag), value))?;
            if !allowed.contains(&name.as_str()) {
                return Err(invalid(
                    format!(
                        "Unexpected key '{}' in tag '{}'. Allowed keys: {}.",
                        name,
                        tag,
                        allowed.join(", ")
                    ),
                    value,
                ));
            }
            entries.push((name, field));
        }
        Ok(Self {
            tag,
            source: value,
            entries,
        })
    }

    fn get(&self, name: &str) -> Option<&'v Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    fn required(&self, name: &str) -> ProcgenResult<&'v Value> {
        self.get(name).ok_or_else(|| {
            invalid(
                format!("!{} is missing the required key '{}'.", self.tag, name),
                self.source,
            )
        })
    }
}
