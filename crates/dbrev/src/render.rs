use anyhow::Result;
use dbrev_core::{DbElement, DbModel, ElementKind};
use serde_json::{Value, json};
use uuid::Uuid;

fn keyword(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Catalog => "catalog",
        ElementKind::Schema => "schema",
        ElementKind::Entity => "entity",
        ElementKind::Column => "column",
        ElementKind::Procedure => "procedure",
    }
}

/// Two-space indented outline, one node per line, siblings in sort order.
pub fn render_outline(model: &DbModel) -> String {
    let mut out = String::new();
    for node in model.root_nodes() {
        outline_node(model, node, 0, &mut out);
    }
    out
}

fn outline_node(model: &DbModel, node: &DbElement, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(keyword(node.kind));
    out.push(' ');
    out.push_str(node.label());
    out.push('\n');

    for child in model.children_of(node.id) {
        outline_node(model, child, depth + 1, out);
    }
}

/// The model as a nested JSON document, terminated by a newline.
pub fn render_json(model: &DbModel) -> Result<String> {
    let document = json!({
        "name": model.name(),
        "children": json_children(model, None),
    });

    let mut out = serde_json::to_string_pretty(&document)?;
    out.push('\n');
    Ok(out)
}

fn json_children(model: &DbModel, parent: Option<Uuid>) -> Vec<Value> {
    model
        .children(parent)
        .into_iter()
        .map(|node| {
            let mut value = json!({
                "kind": keyword(node.kind),
                "name": node.name.as_deref(),
            });

            let children = json_children(model, Some(node.id));
            if !children.is_empty() {
                value["children"] = Value::Array(children);
            }

            value
        })
        .collect()
}
