#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
use pyo3::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

mod classify;
mod config;
mod detect;
mod error;
mod generic;
mod hierarchy;
mod sequence;
mod table;
mod tree;
pub mod types;

pub use config::{ParseOptions, SignKeywords};
pub use detect::{candidates, Dialect};
pub use error::{Error, Result};
pub use types::{Document, Node};

/// Parse an ASCII diagram with default options.
pub fn parse(text: &str) -> Document {
    detect::parse_with(text, &ParseOptions::default())
}

pub fn parse_with(text: &str, opts: &ParseOptions) -> Document {
    detect::parse_with(text, opts)
}

pub fn to_json(doc: &Document) -> Result<String> {
    serde_json::to_string_pretty(doc).map_err(Error::Serialize)
}

/// Read a document back from JSON. Nodes of an unknown `type` are kept
/// verbatim as [`Node::Unknown`] and written back unchanged by [`to_json`].
pub fn from_json(text: &str) -> Result<Document> {
    serde_json::from_str(text).map_err(Error::from_document_json)
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pyfunction]
fn parse_text(text: String) -> PyResult<String> {
    to_json(&parse(&text))
        .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn parse_text_wasm(text: &str) -> std::result::Result<String, JsValue> {
    to_json(&parse(text)).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn parse_text_with_options_wasm(
    text: &str,
    options_json: &str,
) -> std::result::Result<String, JsValue> {
    let opts =
        ParseOptions::from_json(options_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_json(&parse_with(text, &opts)).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Validate a stored document and re-emit it in canonical form.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn normalize_json_wasm(json: &str) -> std::result::Result<String, JsValue> {
    from_json(json)
        .and_then(|doc| to_json(&doc))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(all(feature = "python", not(target_arch = "wasm32")))]
#[pymodule]
fn ascii_card(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(parse_text, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Card, Panel};
    use std::fs;
    use std::path::{Path, PathBuf};

    fn run_fixture(input_path: &Path) {
        let golden_path = input_path.with_extension("golden.json");
        let input = fs::read_to_string(input_path).expect("Failed to read input");
        let golden = fs::read_to_string(&golden_path).expect("Failed to read golden");

        let json_out = to_json(&parse(&input)).unwrap();
        let v_out: serde_json::Value = serde_json::from_str(&json_out).unwrap();
        let v_golden: serde_json::Value = serde_json::from_str(&golden).unwrap();

        if v_out != v_golden {
            let nodes_out = v_out["nodes"].as_array().unwrap();
            let nodes_golden = v_golden["nodes"].as_array().unwrap();

            if nodes_out.len() == nodes_golden.len() {
                for (i, (a, b)) in nodes_out.iter().zip(nodes_golden.iter()).enumerate() {
                    if a != b {
                        println!("Mismatch at node index {}", i);
                        println!("Got: {}", serde_json::to_string_pretty(a).unwrap());
                        println!("Exp: {}", serde_json::to_string_pretty(b).unwrap());
                        break;
                    }
                }
            }

            assert_eq!(v_out, v_golden, "Mismatch in fixture {}", input_path.display());
        }
    }

    #[test]
    fn test_fixtures() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let mut inputs: Vec<PathBuf> = fs::read_dir(&dir)
            .expect("Failed to read fixtures dir")
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        inputs.sort();
        assert!(!inputs.is_empty(), "no fixtures under {}", dir.display());

        for input in &inputs {
            run_fixture(input);
        }
    }

    #[test]
    fn stored_documents_survive_a_round_trip() {
        let doc = parse("제목\n✅ 장점\n• 빠름\n1. 설치\n-> 현장 확인\n용량: 5kW");
        let back = from_json(&to_json(&doc).unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn malformed_json_is_a_syntax_error() {
        let err = from_json(r#"{"title": "x", "nodes": [],}"#).unwrap_err();
        match err {
            Error::Syntax { line, column, .. } => {
                assert_eq!(line, 1);
                assert!(column > 0);
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_shape_is_not_a_syntax_error() {
        let err = from_json(r#"{"title": 3, "nodes": []}"#).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn unknown_node_types_keep_their_fields() {
        let text = r#"{"title": "t", "nodes": [{"type": "gauge", "value": 3, "unit": "kW"}, {"type": "highlight", "text": "→ ok"}]}"#;
        let doc = from_json(text).unwrap();
        match &doc.nodes[0] {
            Node::Unknown(raw) => {
                assert_eq!(raw.kind(), "gauge");
                assert_eq!(raw.fields()["value"], 3);
            }
            other => panic!("expected unknown, got {}", other.kind()),
        }
        assert_eq!(doc.nodes[0].kind(), "gauge");
        assert_eq!(doc.nodes[1], Node::highlight("→ ok"));

        let out = to_json(&doc).unwrap();
        let v_in: serde_json::Value = serde_json::from_str(text).unwrap();
        let v_out: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v_out, v_in);
        assert_eq!(to_json(&from_json(&out).unwrap()).unwrap(), out);
    }

    #[test]
    fn unknown_column_children_survive_a_round_trip() {
        let text = r#"{"title": "", "nodes": [{"type": "columns", "children": [{"type": "card", "title": "a"}, {"type": "gauge", "value": [1, 2]}]}]}"#;
        let doc = from_json(text).unwrap();
        let Node::Columns(cols) = &doc.nodes[0] else {
            panic!("expected columns, got {}", doc.nodes[0].kind());
        };
        assert!(matches!(&cols.children[0], Panel::Card(c) if c.title == "a"));
        assert!(matches!(&cols.children[1], Panel::Unknown(raw) if raw.kind() == "gauge"));

        let out = to_json(&doc).unwrap();
        let v_out: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v_out["nodes"][0]["children"][1], serde_json::json!({"type": "gauge", "value": [1, 2]}));
        assert_eq!(to_json(&from_json(&out).unwrap()).unwrap(), out);
    }

    #[test]
    fn malformed_known_node_is_still_a_shape_error() {
        let err = from_json(r#"{"nodes": [{"type": "table", "headers": 3}]}"#).unwrap_err();
        assert!(matches!(err, Error::Shape(_)), "got {err:?}");
    }

    #[test]
    fn absent_cost_is_written_as_null() {
        let doc = Document {
            title: String::new(),
            nodes: vec![Node::Box(Card {
                title: "RDS".into(),
                ..Card::default()
            })],
        };
        let v: serde_json::Value = serde_json::from_str(&to_json(&doc).unwrap()).unwrap();
        assert_eq!(v["nodes"][0]["cost"], serde_json::Value::Null);
        assert_eq!(v["nodes"][0]["items"], serde_json::json!([]));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let doc = from_json("{}").unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn header_separator_alias_is_accepted() {
        let doc = from_json(
            r#"{"nodes": [{"type": "table", "headers": ["a"], "rows": [], "hasHeaderSep": true}]}"#,
        )
        .unwrap();
        match &doc.nodes[0] {
            Node::Table(t) => assert!(t.has_header_separator),
            other => panic!("expected table, got {}", other.kind()),
        }
    }
}
