use optree_core::api::parse_literal;
use optree_core::{EmitOptions, QuoteStyle, Value};

#[test]
fn test_simple_parse_to_json() {
    let source = r#"
        {
            name: "My Chart",
            version: 1.5,
            enabled: true,
            'tags': ['a', "b", `c`],
            chart: {
                type: 'line',
                height: 400,
            },
            empty: null,
            missing: undefined,
        }
    "#;

    let expected_json = serde_json::json!({
        "name": "My Chart",
        "version": 1.5,
        "enabled": true,
        "tags": ["a", "b", "c"],
        "chart": {
            "type": "line",
            "height": 400,
        },
        "empty": null,
    });

    let document = parse_literal(source, "test.js").unwrap();
    let result = document.to_json().unwrap();
    let result_json: serde_json::Value = serde_json::from_str(&result).unwrap();

    assert_eq!(result_json, expected_json);
}

#[test]
fn test_json_keeps_source_key_order() {
    let document = parse_literal("{ zeta: 1, alpha: 2, mid: 3 }", "test.js").unwrap();
    assert_eq!(
        document.to_json().unwrap(),
        "{\n  \"zeta\": 1,\n  \"alpha\": 2,\n  \"mid\": 3\n}"
    );
}

#[cfg(feature = "yaml")]
#[test]
fn test_simple_parse_to_yaml() {
    let source = r#"
        {
            name: "My Chart",
            version: 1.5,
            enabled: true,
        }
    "#;

    let expected_yaml = "name: My Chart\nversion: 1.5\nenabled: true\n";

    let document = parse_literal(source, "test.js").unwrap();
    let result = document.to_yaml().unwrap();

    assert_eq!(result, expected_yaml);
}

#[test]
fn test_serialize_document_with_serde() {
    let document = parse_literal("{ a: [1, 2], b: { c: 'd' } }", "test.js").unwrap();
    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json, serde_json::json!({ "a": [1, 2], "b": { "c": "d" } }));

    let with_callable = parse_literal("{ f: function () {} }", "test.js").unwrap();
    assert!(serde_json::to_value(&with_callable).is_err());
}

#[test]
fn test_declaration_round_trip() {
    let source = "var chartOptions = { title: { text: \"Sales\" } };";
    let document = parse_literal(source, "test.js").unwrap();
    let declaration = document.declaration.as_ref().unwrap();
    assert_eq!(declaration.keyword, "var");
    assert_eq!(declaration.name, "chartOptions");

    let options = EmitOptions {
        indent: 2,
        quote: QuoteStyle::Double,
        ..EmitOptions::default()
    };
    assert_eq!(
        document.to_literal(&options),
        "var chartOptions = {\n  title: {\n    text: \"Sales\"\n  }\n};"
    );
}

#[test]
fn test_references_and_callables_are_values() {
    let source = r#"{
        color: Highcharts.getOptions,
        formatter: function () {
            return '<b>' + this.x + '</b>';
        }
    }"#;
    let document = parse_literal(source, "test.js").unwrap();
    let root = document.to_value();
    assert_eq!(
        root.get("color"),
        Some(&Value::Identifier("Highcharts.getOptions".to_string()))
    );
    match root.get("formatter") {
        Some(Value::Callable(callable)) => {
            assert!(callable.as_str().starts_with("function () {"));
            assert!(callable.as_str().ends_with('}'));
        }
        other => panic!("Expected a callable, got {other:?}"),
    }
}

#[test]
fn test_literal_output_is_reparseable() {
    let source = "{ 'data-id': 'x', list: [{ a: 1 }, { b: [true, null] }], n: -0.5 }";
    let first = parse_literal(source, "test.js").unwrap();
    let emitted = first.to_literal(&EmitOptions::default());
    let second = parse_literal(&emitted, "emitted.js").unwrap();
    assert_eq!(first.root, second.root);
}
