use std::fmt::{self, Write};

use serde_json::Value;

use crate::config::node::{ConfigNode, Entry};

/// Keys starting with this prefix are hidden by `Display`.
pub const DEFAULT_SKIP_PREFIX: &str = "_";

const INDENT_STEP: usize = 2;

impl ConfigNode {
    /// YAML-like dump: `key: value` for leaves, `key:` followed by the indented
    /// children for nodes, two spaces per level, insertion order.
    pub fn pprint(&self, skip_prefix: Option<&str>) -> String {
        let mut out = String::new();
        // Writing into a String can not fail.
        let _ = write_node(&mut out, self, 0, skip_prefix);
        out
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0, Some(DEFAULT_SKIP_PREFIX))
    }
}

/// Strings print bare; everything else prints as compact JSON.
pub fn render_leaf(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn write_node<W: Write>(
    out: &mut W,
    node: &ConfigNode,
    indent: usize,
    skip_prefix: Option<&str>,
) -> fmt::Result {
    for (key, entry) in node.iter() {
        if is_skipped(key, skip_prefix) {
            continue;
        }
        match entry {
            Entry::Node(child) => {
                writeln!(out, "{:indent$}{key}:", "")?;
                write_node(out, child, indent + INDENT_STEP, skip_prefix)?;
            }
            Entry::Value(value) => {
                writeln!(out, "{:indent$}{key}: {}", "", render_leaf(value))?;
            }
        }
    }
    Ok(())
}

fn is_skipped(key: &str, skip_prefix: Option<&str>) -> bool {
    skip_prefix.is_some_and(|prefix| !prefix.is_empty() && key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_leaf;
    use crate::config::node::ConfigNode;

    #[test]
    fn dump_matches_expected_layout() {
        let mut node = ConfigNode::from_iter([("a", 1)]);
        node.set("b", 2, false).expect("set");
        node.delete("a").expect("delete");
        node.register("a.b.c").expect("register");

        assert_eq!(node.pprint(None), "b: 2\na:\n  b:\n    c:\n");
        assert_eq!(node.to_string(), "b: 2\na:\n  b:\n    c:\n");
    }

    #[test]
    fn skip_prefix_hides_keys_at_every_level() {
        let mut node = ConfigNode::new();
        node.insert("_hidden", 1).expect("insert");
        node.insert("model._cache", "x").expect("insert");
        node.insert("model.depth", 3).expect("insert");

        assert_eq!(node.to_string(), "model:\n  depth: 3\n");
        assert_eq!(node.pprint(Some("")), node.pprint(None));
        assert_eq!(
            node.pprint(None),
            "_hidden: 1\nmodel:\n  _cache: x\n  depth: 3\n"
        );
    }

    #[test]
    fn leaves_render_as_plain_text() {
        assert_eq!(render_leaf(&json!("text")), "text");
        assert_eq!(render_leaf(&json!(1.5)), "1.5");
        assert_eq!(render_leaf(&json!(true)), "true");
        assert_eq!(render_leaf(&json!(null)), "null");
        assert_eq!(render_leaf(&json!(false)), "false");
        assert_eq!(render_leaf(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn merged_booleans_dump_in_json_spelling() {
        let mut node = ConfigNode::new();
        crate::config::overrides::merge_args(&mut node, ["z=True", "n=None"]).expect("merge");
        assert_eq!(node.pprint(None), "z: true\nn: null\n");
    }

    #[test]
    fn empty_tree_dumps_nothing() {
        assert_eq!(ConfigNode::new().pprint(None), "");
    }
}
