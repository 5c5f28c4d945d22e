use super::{iterate_all, parse, values};
use crate::expand::Expander;
use crate::handlers::{handler_for, HandlerKind};
use crate::node::{Node, Pending, Record};
use crate::tags::{Condition, ProcIf, ProcIfLabels, ProcTag};
use crate::ProcgenError;
use std::sync::Arc;

#[test]
fn test_dispatch_prefers_tags_over_containers() {
    let list = parse("!ProcList [1, 2]");
    assert_eq!(handler_for(&list).unwrap().name(), "ProcList");
    assert_eq!(handler_for(&list).unwrap().kind(), HandlerKind::Combinatorial);

    let sequence = parse("[1, 2]");
    assert_eq!(handler_for(&sequence).unwrap().name(), "Sequence");
    assert_eq!(handler_for(&sequence).unwrap().kind(), HandlerKind::Static);

    let vector = parse("!Vector3 {x: 1, y: 2, z: 3}");
    assert_eq!(handler_for(&vector).unwrap().name(), "Record");
}

#[test]
fn test_proc_list_in_declared_order() {
    let node = parse("!ProcList [c, a, b]");
    assert_eq!(
        values(&node),
        vec![Node::str("c"), Node::str("a"), Node::str("b")]
    );
}

#[test]
fn test_proc_list_labelled_adds_labels() {
    let node = parse(
        r#"
!ProcListLabelled
- value: 1
  label: one
- value: 2
  label: two
"#,
    );
    let variations = iterate_all(&node);
    assert_eq!(variations.len(), 2);
    assert_eq!(variations[0].0, Node::int(1));
    assert_eq!(variations[0].1.labels, vec!["one"]);
    assert_eq!(variations[1].1.labels, vec!["two"]);
}

#[test]
fn test_proc_color_uses_palette_prefix() {
    let node = parse("!ProcColor 3");
    assert_eq!(Expander::new(0).count(&node).unwrap(), 3);
    assert_eq!(
        values(&node),
        vec![
            Node::Record(Record::rgb(255, 0, 0)),
            Node::Record(Record::rgb(0, 255, 0)),
            Node::Record(Record::rgb(0, 0, 255)),
        ]
    );
}

#[test]
fn test_proc_color_amount_out_of_range() {
    for text in ["!ProcColor 0", "!ProcColor 11"] {
        let result = crate::codec::parse(text, "test.yaml");
        assert!(
            matches!(result, Err(ProcgenError::Structure { .. })),
            "{} should be rejected, got {:?}",
            text,
            result
        );
    }
}

#[test]
fn test_proc_vector3_scaled() {
    let node = parse(
        r#"
!ProcVector3Scaled
base: !Vector3 {x: 1, y: 2, z: 3}
scales: [1, 2.5]
labels: [small, big]
"#,
    );
    let variations = iterate_all(&node);
    assert_eq!(variations.len(), 2);
    assert_eq!(variations[1].0, Node::Record(Record::vector3(2.5, 5.0, 7.5)));
    assert_eq!(variations[1].1.labels, vec!["big"]);
}

#[test]
fn test_proc_vector3_scaled_defaults_to_unit_base() {
    let node = parse("!ProcVector3Scaled {scales: [2]}");
    assert_eq!(values(&node), vec![Node::Record(Record::vector3(2.0, 2.0, 2.0))]);
}

#[test]
fn test_proc_vector3_scaled_label_mismatch() {
    let result = crate::codec::parse(
        "!ProcVector3Scaled {scales: [1, 2], labels: [only]}",
        "test.yaml",
    );
    assert!(matches!(result, Err(ProcgenError::Structure { .. })));
}

#[test]
fn test_repeat_choice_counts_the_choice_only() {
    let node = parse(
        r#"
!ProcRepeatChoice
amount: 4
value: !ProcList [a, b, c]
"#,
    );
    assert_eq!(Expander::new(0).count(&node).unwrap(), 3);

    let variations = values(&node);
    assert_eq!(variations.len(), 3);
    assert_eq!(variations[1], Node::Sequence(vec![Node::str("b"); 4]));
}

#[test]
fn test_repeat_choice_copies_are_independent() {
    let node = parse("!ProcRepeatChoice {amount: 3, value: !ProcList [[1, 2]]}");
    let (value, _) = Expander::new(0).sample(&node).unwrap();
    let Node::Sequence(mut copies) = value else {
        panic!("expected a list");
    };
    if let Node::Sequence(first) = &mut copies[0] {
        first.push(Node::int(3));
    }
    assert_eq!(copies[1], Node::Sequence(vec![Node::int(1), Node::int(2)]));
    assert_eq!(copies[2], Node::Sequence(vec![Node::int(1), Node::int(2)]));
}

#[test]
fn test_repeat_choice_zero_amount() {
    let node = parse("!ProcRepeatChoice {amount: 0, value: !ProcList [a, b]}");
    assert_eq!(
        values(&node),
        vec![Node::Sequence(vec![]), Node::Sequence(vec![])]
    );
}

#[test]
fn test_restrict_combinations_caps_count_and_iteration() {
    let node = parse(
        r#"
!ProcRestrictCombinations
amount: 4
item: [!ProcList [1, 2, 3], !ProcList [4, 5, 6]]
"#,
    );
    assert_eq!(Expander::new(0).count(&node).unwrap(), 4);
    assert_eq!(values(&node).len(), 4);
}

#[test]
fn test_restrict_combinations_accepts_value_alias() {
    let node = parse("!ProcRestrictCombinations {amount: 2, value: !ProcList [1, 2]}");
    assert_eq!(Expander::new(0).count(&node).unwrap(), 2);
}

#[test]
fn test_proc_if_emits_placeholder() {
    let node = parse(
        r#"
!ProcIf
variable: foo.x
cases: [1]
then: [one]
"#,
    );
    assert_eq!(Expander::new(0).count(&node).unwrap(), 1);
    let variations = values(&node);
    assert_eq!(variations.len(), 1);
    assert!(matches!(variations[0], Node::Pending(_)));
}

#[test]
fn test_handler_kinds() {
    let kind = |text: &str| handler_for(&parse(text)).unwrap().kind();
    assert_eq!(kind("!Vector3 {x: 1, y: 2, z: 3}"), HandlerKind::Static);
    assert_eq!(kind("!R [0, 1]"), HandlerKind::Static);
    assert_eq!(kind("!ProcColor 2"), HandlerKind::Combinatorial);
    assert_eq!(
        kind("!ProcRestrictCombinations {amount: 2, item: !ProcList [a, b, c]}"),
        HandlerKind::Combinatorial
    );
    assert_eq!(
        kind("!ProcIf {variable: foo.x, cases: [1], then: [one]}"),
        HandlerKind::Conditional
    );

    let Node::Proc(ProcTag::If(proc_if)) =
        parse("!ProcIf {variable: foo.x, cases: [1], then: [one]}")
    else {
        panic!("expected a !ProcIf");
    };
    let pending = Node::Pending(Pending::new(proc_if));
    assert_eq!(handler_for(&pending).unwrap().kind(), HandlerKind::Placeholder);
}

#[test]
fn test_conditionals_are_left_out_of_explanation() {
    let node = parse(
        r#"
- !ProcList [1, 2]
- !ProcIf
  variable: foo.x
  cases: [1]
  then: [one]
"#,
    );
    assert_eq!(Expander::new(0).explain(&node).unwrap(), "2#ProcList");
}

#[test]
fn test_proc_if_labels_cannot_be_expanded() {
    let condition = Condition::new(vec!["foo.x".to_string()], false, vec![Node::int(1)]).unwrap();
    let rule = ProcIfLabels::new(condition, vec!["one".to_string()], None).unwrap();
    let node = Node::Proc(ProcTag::IfLabels(rule));

    let expander = Expander::new(0);
    assert_eq!(expander.count(&node).unwrap(), 1);

    let error = expander.sample(&node).unwrap_err();
    assert!(matches!(error, ProcgenError::Internal(_)));
    assert!(!error.is_user_facing());
    assert!(expander.iterate(&node).next().unwrap().is_err());
}

#[test]
fn test_pending_cannot_be_expanded() {
    let condition = Condition::new(vec!["foo.x".to_string()], false, vec![Node::int(1)]).unwrap();
    let proc_if = ProcIf::new(condition, vec![Node::str("one")], None, None, None).unwrap();
    let node = Node::Pending(Pending::new(Arc::new(proc_if)));

    let error = Expander::new(0).sample(&node).unwrap_err();
    assert!(matches!(error, ProcgenError::Internal(_)));
    assert!(Expander::new(0).explain(&node).is_err());
}

#[test]
fn test_proc_values_must_be_static() {
    let result = crate::codec::parse("!ProcList [!ProcList [1, 2]]", "test.yaml");
    assert!(matches!(result, Err(ProcgenError::Structure { .. })));

    let result = crate::codec::parse(
        "!ProcIf {variable: foo.x, cases: [1], then: [!ProcColor 2]}",
        "test.yaml",
    );
    assert!(matches!(result, Err(ProcgenError::Structure { .. })));
}

#[test]
fn test_proc_if_length_mismatch() {
    let result = crate::codec::parse(
        "!ProcIf {variable: foo.x, cases: [1, 2], then: [one]}",
        "test.yaml",
    );
    assert!(matches!(result, Err(ProcgenError::Structure { .. })));

    let result = crate::codec::parse(
        "!ProcIf {variable: [foo.x, foo.y], cases: [[1, 2], [3]], then: [a, b]}",
        "test.yaml",
    );
    let error = result.unwrap_err();
    assert!(error.to_string().contains("Length of case 2 is 1"));
}
