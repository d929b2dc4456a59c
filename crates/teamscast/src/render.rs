use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Placeholder substituted for a node that was already rendered once.
const CIRCULAR_PLACEHOLDER: &str = "[Circular]";

/// Shared handle to a diagnostic node. Transport responses drag arbitrary
/// internals along (sockets, in-flight requests), so the graph may alias
/// and even loop back on itself.
pub type DiagRef = Arc<Mutex<DiagValue>>;

/// JSON-like diagnostic value. Children are `DiagRef` handles rather than
/// owned values so a response graph can contain cycles and shared nodes.
#[derive(Debug)]
pub enum DiagValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<DiagRef>),
    Object(Vec<(String, DiagRef)>),
}

/// Wrap a value into a shared node.
pub fn diag(value: DiagValue) -> DiagRef {
    Arc::new(Mutex::new(value))
}

impl From<serde_json::Value> for DiagValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DiagValue::Null,
            serde_json::Value::Bool(b) => DiagValue::Bool(b),
            serde_json::Value::Number(n) => DiagValue::Number(n),
            serde_json::Value::String(s) => DiagValue::String(s),
            serde_json::Value::Array(items) => {
                DiagValue::Array(items.into_iter().map(|item| diag(item.into())).collect())
            }
            serde_json::Value::Object(fields) => DiagValue::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, diag(value.into())))
                    .collect(),
            ),
        }
    }
}

/// Render a diagnostic graph as pretty JSON-style text.
///
/// Container nodes are tracked by identity; a node seen a second time is
/// replaced with `"[Circular]"`, so rendering terminates on any graph and
/// never fails the way a structural serializer would.
pub fn render(value: &DiagRef) -> String {
    let mut out = String::new();
    let mut visited = HashSet::new();
    write_value(&mut out, value, 0, &mut visited);
    out
}

/// Render an error chain through the same diagnostic path.
pub fn render_error(err: &anyhow::Error) -> String {
    let node = diag(DiagValue::Object(vec![(
        "error".to_string(),
        diag(DiagValue::String(format!("{err:#}"))),
    )]));
    render(&node)
}

// Recovers the value even if a lock was poisoned; rendering is read-only.
fn read(value: &DiagRef) -> MutexGuard<'_, DiagValue> {
    match value.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// The visited check happens on the node identity BEFORE locking, so a node
// that is an ancestor of itself is elided instead of re-locked.
fn write_value(
    out: &mut String,
    value: &DiagRef,
    indent: usize,
    visited: &mut HashSet<*const Mutex<DiagValue>>,
) {
    let ptr = Arc::as_ptr(value);
    if visited.contains(&ptr) {
        push_json_string(out, CIRCULAR_PLACEHOLDER);
        return;
    }

    let node = read(value);
    match &*node {
        DiagValue::Null => out.push_str("null"),
        DiagValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        DiagValue::Number(n) => out.push_str(&n.to_string()),
        DiagValue::String(s) => push_json_string(out, s),
        DiagValue::Array(items) => {
            visited.insert(ptr);
            if items.is_empty() {
                out.push_str("[]");
            } else {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push('\n');
                    push_indent(out, indent + 1);
                    write_value(out, item, indent + 1, visited);
                }
                out.push('\n');
                push_indent(out, indent);
                out.push(']');
            }
        }
        DiagValue::Object(fields) => {
            visited.insert(ptr);
            if fields.is_empty() {
                out.push_str("{}");
            } else {
                out.push('{');
                for (i, (key, child)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push('\n');
                    push_indent(out, indent + 1);
                    push_json_string(out, key);
                    out.push_str(": ");
                    write_value(out, child, indent + 1, visited);
                }
                out.push('\n');
                push_indent(out, indent);
                out.push('}');
            }
        }
    }
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str("  ");
    }
}

fn push_json_string(out: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        // Unreachable for plain strings; keep the output well-formed anyway.
        Err(_) => out.push_str("\"\""),
    }
}
