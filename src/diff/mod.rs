//! Pre/post state differentials.

use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// How a diff line relates the two trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Context,
    Removed,
    Added,
}

impl Change {
    fn marker(&self) -> char {
        match self {
            Change::Context => ' ',
            Change::Removed => '-',
            Change::Added => '+',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub change: Change,
    pub depth: usize,
    pub text: String,
}

/// Structural differential between two JSON trees
#[derive(Debug, Clone, Default)]
pub struct Diff {
    lines: Vec<DiffLine>,
}

impl Diff {
    /// Compare `pre` against `post`, walking object keys in sorted order
    pub fn new(pre: &Value, post: &Value) -> Self {
        let mut diff = Diff::default();
        diff.compare(pre, post, None, 0);
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of added and removed lines
    pub fn change_count(&self) -> usize {
        self.lines.iter().filter(|l| l.change != Change::Context).count()
    }

    fn compare(&mut self, pre: &Value, post: &Value, key: Option<&str>, depth: usize) {
        match (pre, post) {
            (Value::Object(a), Value::Object(b)) => {
                let start = self.lines.len();
                let child_depth = if key.is_some() { depth + 1 } else { depth };
                let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
                for k in keys {
                    match (a.get(k), b.get(k)) {
                        (Some(x), Some(y)) => self.compare(x, y, Some(k), child_depth),
                        (Some(x), None) => self.emit_subtree(Change::Removed, k, x, child_depth),
                        (None, Some(y)) => self.emit_subtree(Change::Added, k, y, child_depth),
                        (None, None) => {}
                    }
                }
                if let Some(k) = key {
                    if self.lines.len() > start {
                        self.lines.insert(
                            start,
                            DiffLine {
                                change: Change::Context,
                                depth,
                                text: format!("{}:", k),
                            },
                        );
                    }
                }
            }
            _ if pre == post => {}
            _ => match key {
                Some(k) => {
                    self.emit_subtree(Change::Removed, k, pre, depth);
                    self.emit_subtree(Change::Added, k, post, depth);
                }
                None => {
                    self.push(Change::Removed, depth, render_scalar(pre));
                    self.push(Change::Added, depth, render_scalar(post));
                }
            },
        }
    }

    fn emit_subtree(&mut self, change: Change, key: &str, value: &Value, depth: usize) {
        match value {
            Value::Object(map) => {
                self.push(change, depth, format!("{}:", key));
                for (k, v) in map {
                    self.emit_subtree(change, k, v, depth + 1);
                }
            }
            other => self.push(change, depth, format!("{}: {}", key, render_scalar(other))),
        }
    }

    fn push(&mut self, change: Change, depth: usize, text: String) {
        self.lines.push(DiffLine { change, depth, text });
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}{}{}", line.change.marker(), " ".repeat(line.depth), line.text)?;
        }
        Ok(())
    }
}

/// Line-based unified diff of two texts, empty when they are identical
pub fn text_diff(pre: &str, post: &str, pre_label: &str, post_label: &str) -> String {
    if pre == post {
        return String::new();
    }
    let diff = similar::TextDiff::from_lines(pre, post);
    diff.unified_diff()
        .context_radius(3)
        .header(pre_label, post_label)
        .to_string()
}
