//! Contract validation integration tests.

use incant_core::{validate, ContractSchema, FieldType, FieldValue, Reason};
use serde_json::json;

fn str_max(max: usize) -> FieldType {
    FieldType::Str {
        min_len: None,
        max_len: Some(max),
    }
}

#[test]
fn string_within_max_is_valid() {
    let schema = ContractSchema::new().with("summary", str_max(5));
    let result = validate(&schema, &json!({"summary": "hello"})).unwrap();
    assert_eq!(
        result.get("summary"),
        Some(&FieldValue::Text("hello".into()))
    );
}

#[test]
fn string_over_max_fails_with_max_len() {
    let schema = ContractSchema::new().with("summary", str_max(5));
    let err = validate(&schema, &json!({"summary": "hello!"})).unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].reason, Reason::MaxLen);
    assert_eq!(err.failures[0].field, "summary");
}

#[test]
fn string_length_counts_characters_not_bytes() {
    let schema = ContractSchema::new().with("word", str_max(4));
    assert!(validate(&schema, &json!({"word": "héllo"})).is_err());
    assert!(validate(&schema, &json!({"word": "héll"})).is_ok());
}

#[test]
fn int_accepts_number_or_fully_numeric_text() {
    let schema = ContractSchema::new().with("score", FieldType::int());
    let result = validate(&schema, &json!({"score": "42"})).unwrap();
    assert_eq!(result.get("score"), Some(&FieldValue::Int(42)));
    let result = validate(&schema, &json!({"score": 7})).unwrap();
    assert_eq!(result.get("score"), Some(&FieldValue::Int(7)));
}

#[test]
fn int_rejects_partial_parses_and_fractions() {
    let schema = ContractSchema::new().with("score", FieldType::int());
    for bad in [json!("42abc"), json!(4.2), json!(true)] {
        let err = validate(&schema, &json!({ "score": bad })).unwrap_err();
        assert_eq!(err.failures[0].reason, Reason::Type);
    }
}

#[test]
fn int_bounds_are_enforced() {
    let schema = ContractSchema::new().with(
        "score",
        FieldType::Int {
            min: Some(0),
            max: Some(10),
        },
    );
    assert!(validate(&schema, &json!({"score": 10})).is_ok());
    let err = validate(&schema, &json!({"score": 11})).unwrap_err();
    assert_eq!(err.failures[0].reason, Reason::Max);
    let err = validate(&schema, &json!({"score": -1})).unwrap_err();
    assert_eq!(err.failures[0].reason, Reason::Min);
}

#[test]
fn float_rounds_to_precision_after_bounds() {
    let schema = ContractSchema::new().with(
        "ratio",
        FieldType::Float {
            min: None,
            max: None,
            precision: Some(2),
        },
    );
    let result = validate(&schema, &json!({"ratio": 3.14159})).unwrap();
    assert_eq!(result.get("ratio"), Some(&FieldValue::Float(3.14)));
}

#[test]
fn float_bounds_apply_to_the_unrounded_value() {
    // 10.004 would round into range; bounds are checked first.
    let schema = ContractSchema::new().with(
        "ratio",
        FieldType::Float {
            min: None,
            max: Some(10.0),
            precision: Some(2),
        },
    );
    let err = validate(&schema, &json!({"ratio": 10.004})).unwrap_err();
    assert_eq!(err.failures[0].reason, Reason::Max);
}

#[test]
fn bool_accepts_the_fixed_vocabulary() {
    let schema = ContractSchema::new().with("ok", FieldType::Bool);
    for (value, expected) in [
        (json!(true), true),
        (json!("TRUE"), true),
        (json!("yes"), true),
        (json!("1"), true),
        (json!(false), false),
        (json!("No"), false),
        (json!(0), false),
    ] {
        let result = validate(&schema, &json!({ "ok": value })).unwrap();
        assert_eq!(result.get("ok"), Some(&FieldValue::Bool(expected)));
    }
    let err = validate(&schema, &json!({"ok": "maybe"})).unwrap_err();
    assert_eq!(err.failures[0].reason, Reason::Type);
}

#[test]
fn code_strips_markdown_fences_and_keeps_the_language_tag() {
    let schema = ContractSchema::new().with(
        "example",
        FieldType::Code {
            language: "python".into(),
        },
    );
    let reply = json!({"example": "```python\ndef foo(): pass\n```"});
    let result = validate(&schema, &reply).unwrap();
    assert_eq!(
        result.get("example"),
        Some(&FieldValue::Code {
            language: "python".into(),
            text: "def foo(): pass".into(),
        })
    );
}

#[test]
fn list_length_is_checked_before_elements() {
    // Both elements are invalid ints, but the length failure wins alone.
    let schema = ContractSchema::new().with(
        "nums",
        FieldType::List {
            item: Box::new(FieldType::int()),
            exactly: Some(3),
            min: None,
            max: None,
        },
    );
    let err = validate(&schema, &json!({"nums": ["x", "y"]})).unwrap_err();
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].reason, Reason::Length);
}

#[test]
fn list_reports_every_failing_index() {
    let schema = ContractSchema::new().with("nums", FieldType::list(FieldType::int()));
    let err = validate(&schema, &json!({"nums": [1, "x", 3, []]})).unwrap_err();
    let fields: Vec<&str> = err.failures.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["nums[1]", "nums[3]"]);
}

#[test]
fn valid_list_coerces_every_element() {
    let schema = ContractSchema::new().with("nums", FieldType::list(FieldType::int()));
    let result = validate(&schema, &json!({"nums": [1, "2", 3]})).unwrap();
    assert_eq!(
        result.get("nums"),
        Some(&FieldValue::List(vec![
            FieldValue::Int(1),
            FieldValue::Int(2),
            FieldValue::Int(3),
        ]))
    );
}

#[test]
fn optional_accepts_null_absent_and_present() {
    let schema = ContractSchema::new()
        .with("required", FieldType::str())
        .with(
            "extra",
            FieldType::Optional {
                item: Box::new(FieldType::str()),
            },
        );
    let result = validate(&schema, &json!({"required": "yes", "extra": "maybe"})).unwrap();
    assert_eq!(result.get("extra"), Some(&FieldValue::Text("maybe".into())));

    let result = validate(&schema, &json!({"required": "yes", "extra": null})).unwrap();
    assert_eq!(result.get("extra"), Some(&FieldValue::None));

    let result = validate(&schema, &json!({"required": "yes"})).unwrap();
    assert_eq!(result.get("extra"), Some(&FieldValue::None));
}

#[test]
fn optional_still_validates_present_values() {
    let schema = ContractSchema::new().with(
        "extra",
        FieldType::Optional {
            item: Box::new(str_max(3)),
        },
    );
    let err = validate(&schema, &json!({"extra": "long"})).unwrap_err();
    assert_eq!(err.failures[0].reason, Reason::MaxLen);
}

#[test]
fn enum_coerces_case_insensitively_to_the_declared_choice() {
    let schema = ContractSchema::new().with(
        "size",
        FieldType::Enum {
            choices: vec!["small".into(), "medium".into(), "large".into()],
            case_insensitive: true,
        },
    );
    let result = validate(&schema, &json!({"size": "Medium"})).unwrap();
    assert_eq!(result.get("size"), Some(&FieldValue::Text("medium".into())));
}

#[test]
fn enum_case_sensitive_rejects_wrong_case() {
    let schema = ContractSchema::new().with(
        "size",
        FieldType::Enum {
            choices: vec!["small".into(), "medium".into()],
            case_insensitive: false,
        },
    );
    let err = validate(&schema, &json!({"size": "Medium"})).unwrap_err();
    assert_eq!(err.failures[0].reason, Reason::Choice);
    assert!(err.failures[0].expected.contains("small, medium"));
}

#[test]
fn all_invalid_fields_are_reported_at_once() {
    let schema = ContractSchema::new()
        .with("summary", str_max(5))
        .with("score", FieldType::int())
        .with("ok", FieldType::Bool);
    let err = validate(
        &schema,
        &json!({"summary": "far too long", "score": "NaN", "ok": "yes"}),
    )
    .unwrap_err();
    let fields: Vec<&str> = err.failures.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, vec!["summary", "score"]);
}

#[test]
fn missing_required_field_is_reported() {
    let schema = ContractSchema::new().with("name", FieldType::str());
    let err = validate(&schema, &json!({})).unwrap_err();
    assert_eq!(err.failures[0].reason, Reason::Missing);
    assert_eq!(err.failures[0].actual, "nothing");
}

#[test]
fn non_object_reply_is_a_type_failure() {
    let schema = ContractSchema::new().with("name", FieldType::str());
    let err = validate(&schema, &json!([1, 2, 3])).unwrap_err();
    assert_eq!(err.failures[0].field, "$");
    assert_eq!(err.failures[0].reason, Reason::Type);
}

#[test]
fn result_preserves_declaration_order() {
    let schema = ContractSchema::new()
        .with("zeta", FieldType::int())
        .with("alpha", FieldType::int());
    let result = validate(&schema, &json!({"alpha": 1, "zeta": 2})).unwrap();
    let names: Vec<&str> = result.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
}

#[test]
fn prompt_instructions_list_every_field() {
    let schema = ContractSchema::new()
        .with("summary", str_max(100))
        .with("steps", FieldType::list(FieldType::str()));
    let text = schema.prompt_instructions();
    assert!(text.contains("JSON object"), "{}", text);
    assert!(text.contains("\"summary\": text (maximum 100 characters)"));
    assert!(text.contains("\"steps\": list where each item is text"));
}

#[test]
fn schema_loads_from_json_and_rejects_duplicates() {
    let schema = ContractSchema::from_json(
        r#"[
            {"name": "summary", "type": "str", "max_len": 100},
            {"name": "score", "type": "int", "min": 0, "max": 10},
            {"name": "size", "type": "enum", "choices": ["s", "m"], "case_insensitive": true}
        ]"#,
    )
    .unwrap();
    assert_eq!(schema.fields.len(), 3);

    let err = ContractSchema::from_json(
        r#"[
            {"name": "a", "type": "bool"},
            {"name": "a", "type": "bool"}
        ]"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("duplicate field 'a'"));
}

#[test]
fn validation_error_display_lists_every_failure() {
    let schema = ContractSchema::new()
        .with("a", FieldType::int())
        .with("b", FieldType::Bool);
    let err = validate(&schema, &json!({"a": "x", "b": "y"})).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("2 invalid field(s)"), "{}", text);
    assert!(text.contains("'a'") && text.contains("'b'"), "{}", text);
}
