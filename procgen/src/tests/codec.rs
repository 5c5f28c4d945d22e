use super::parse;
use crate::codec::{to_flow, to_yaml};
use crate::node::{Node, Pending, Record, RecordKind, Scalar, TaggedScalar};
use crate::tags::{Condition, ProcIf, ProcTag};
use crate::ProcgenError;
use std::sync::Arc;

#[test]
fn test_parse_records_keep_ids_apart() {
    let node = parse("!Item {id: goal, name: GoodGoal}");
    let Node::Record(item) = node else {
        panic!("expected a record");
    };
    assert_eq!(item.kind, RecordKind::Item);
    assert_eq!(item.id.as_deref(), Some("goal"));
    assert_eq!(item.fields.len(), 1);
}

#[test]
fn test_parse_rejects_unknown_record_fields() {
    let error = crate::codec::parse("!Item {nme: Wall}", "test.yaml").unwrap_err();
    assert!(matches!(error, ProcgenError::Structure { .. }));
    assert!(error.to_string().contains("Unexpected key 'nme' in tag 'Item'"));
}

#[test]
fn test_parse_keeps_unknown_scalar_tags() {
    let node = parse("!Seed 42");
    assert_eq!(
        node,
        Node::Tagged(TaggedScalar {
            tag: "Seed".to_string(),
            value: Scalar::Int(42),
        })
    );
    assert_eq!(to_yaml(&node).unwrap(), "!Seed 42\n");
}

#[test]
fn test_parse_rejects_unknown_collection_tags() {
    let error = crate::codec::parse("!ProcLst [1, 2]", "test.yaml").unwrap_err();
    assert!(matches!(error, ProcgenError::Structure { .. }));
}

#[test]
fn test_parse_range() {
    assert!(matches!(parse("!R [0, 10]"), Node::Range(_)));
    for text in ["!R [10, 0]", "!R [1, 2, 3]", "!R [a, b]"] {
        let result = crate::codec::parse(text, "test.yaml");
        assert!(
            matches!(result, Err(ProcgenError::Structure { .. })),
            "{}",
            text
        );
    }
}

#[test]
fn test_parse_syntax_error_has_location() {
    let error = crate::codec::parse("a: [1, 2\nb: 3\n", "broken.yaml").unwrap_err();
    let ProcgenError::Parse(details) = error else {
        panic!("expected a parse error, got {:?}", error);
    };
    assert_eq!(details.source_id, "broken.yaml");
    assert!(details.line > 0);
}

#[test]
fn test_proc_if_labels_only_in_template_meta() {
    let error = crate::codec::parse(
        "!ProcIfLabels {variable: a.b, cases: [1], labels: [x]}",
        "test.yaml",
    )
    .unwrap_err();
    assert!(matches!(error, ProcgenError::Structure { .. }));
}

#[test]
fn test_write_layout() {
    let node = parse(
        r#"
!ArenaConfig
arenas:
  0: !Arena
    t: 250
    items:
    - !Item
      id: wall
      name: Wall
      positions:
      - !Vector3 {x: 1, y: 0, z: 2.5}
      colors:
      - !RGB {r: 255, g: 0, b: 0}
"#,
    );
    let expected = "\
!ArenaConfig
arenas:
  0: !Arena
    t: 250
    items:
      - !Item
        name: Wall
        positions:
          - !Vector3 {x: 1, y: 0, z: 2.5}
        colors:
          - !RGB {r: 255, g: 0, b: 0}
";
    assert_eq!(to_yaml(&node).unwrap(), expected);
}

#[test]
fn test_write_fields_in_declared_order() {
    let node = parse("!Item {sizes: [1], name: Wall}");
    assert_eq!(to_flow(&node).unwrap(), "!Item {name: Wall, sizes: [1]}");
}

#[test]
fn test_write_scalar_lists_in_flow_style() {
    let node = parse("a: [1, 2.0, x]\nb:\n  - [1]\n  - c\n");
    assert_eq!(to_yaml(&node).unwrap(), "a: [1, 2.0, x]\nb:\n  - [1]\n  - c\n");
}

#[test]
fn test_write_nested_mappings_in_lists() {
    let node = parse("- a: 1\n  b: 2\n- c: 3\n");
    assert_eq!(to_yaml(&node).unwrap(), "- a: 1\n  b: 2\n- c: 3\n");
}

#[test]
fn test_write_quotes_ambiguous_strings() {
    assert_eq!(to_flow(&Node::str("123")).unwrap(), "'123'");
    assert_eq!(to_flow(&Node::str("true")).unwrap(), "'true'");
    assert_eq!(to_flow(&Node::str("Wall")).unwrap(), "Wall");
    assert_eq!(to_flow(&Node::float(3.0)).unwrap(), "3.0");
}

#[test]
fn test_write_unresolved_placeholder_fails() {
    let condition = Condition::new(vec!["a.b".to_string()], false, vec![Node::int(1)]).unwrap();
    let proc_if = ProcIf::new(condition, vec![Node::int(2)], None, None, None).unwrap();
    let node = Node::Sequence(vec![Node::Pending(Pending::new(Arc::new(proc_if)))]);

    let error = to_yaml(&node).unwrap_err();
    assert!(matches!(error, ProcgenError::Internal(_)));
}

#[test]
fn test_template_copy_is_stable() {
    let text = r#"
!ArenaConfig
proc_meta:
  proc_labels:
  - !ProcIfLabels
    variable: wall.sizes.0.x
    cases: [!R [0, 1], 2]
    labels: [thin, thick]
    default: other
arenas:
  0: !Arena
    t: 100
    items:
    - !Item
      id: wall
      name: !ProcListLabelled
        - value: Wall
          label: opaque
        - value: WallTransparent
          label: transparent
      colors: !ProcColor 4
      sizes:
      - !ProcVector3Scaled
        base: !Vector3 {x: 1, y: 2, z: 3}
        scales: [1, 1.5]
      - !ProcRestrictCombinations
        amount: 2
        item: !ProcRepeatChoice {amount: 2, value: !ProcList [1, 2]}
    - !Item
      name: GoodGoal
      sizes:
      - !ProcIf
        variable: [wall.sizes.0.x, wall.name]
        cases: [[1, Wall], [1.5, Wall]]
        then:
        - !Vector3 {x: 5, y: 5, z: 5}
        - !Vector3 {x: 10, y: 10, z: 10}
        default: !Vector3 {x: 1, y: 1, z: 1}
"#;
    let copy = to_yaml(&parse(text)).unwrap();
    assert_eq!(to_yaml(&parse(&copy)).unwrap(), copy);

    assert!(copy.starts_with("!ArenaConfig\narenas:\n"), "{}", copy);
    assert!(copy.contains("cases: [!R [0, 1], 2]"), "{}", copy);
    assert!(copy.contains("colors: !ProcColor 4"), "{}", copy);
    assert!(copy.contains("item: !ProcRepeatChoice"), "{}", copy);
    assert!(copy.contains("default: !Vector3 {x: 1, y: 1, z: 1}"), "{}", copy);
    assert!(!copy.contains("id: wall"), "{}", copy);
}

#[test]
fn test_write_proc_tags_in_tagged_form() {
    let node = Node::Proc(ProcTag::Color(crate::tags::ProcColor::new(3).unwrap()));
    assert_eq!(to_flow(&node).unwrap(), "!ProcColor 3");
    assert_eq!(
        to_flow(&Node::Record(Record::rgb(1, 2, 3))).unwrap(),
        "!RGB {r: 1, g: 2, b: 3}"
    );
}

#[test]
fn test_write_keeps_large_and_tiny_floats_as_floats() {
    let doc = parse("a: 1.0e17\nb: -2.5e20\nc: 12345678901234567.0\nd: 0.00001\ne: 3.0\n");
    let text = to_yaml(&doc).unwrap();
    assert!(text.contains("a: 1e17\n"), "{}", text);
    assert!(text.contains("b: -2.5e20\n"), "{}", text);
    assert!(text.contains("d: 1e-5\n"), "{}", text);
    assert!(text.contains("e: 3.0\n"), "{}", text);

    let back = parse(&text);
    assert_eq!(back, doc);
    let Node::Mapping(mapping) = back else {
        panic!("expected a mapping");
    };
    assert!(mapping
        .entries
        .iter()
        .all(|(_, value)| matches!(value, Node::Scalar(Scalar::Float(_)))));
}
