//! Markdown to rich-text document conversion.
//!
//! The tracker's rich-text API accepts a JSON node tree, not Markdown. The
//! dialect handled here is the one the extraction model is prompted to
//! write: headings, flat bullet lists, task lists, `**bold**`, separators
//! and plain paragraphs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());

static TASK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s+\[([xX ])\]\s*(.*)$").unwrap());

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

static RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-{3,}$|^\*{3,}$|^_{3,}$").unwrap());

/// Source of task list and task item ids, unique for the process lifetime.
static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(1);

fn next_id(prefix: &str) -> String {
    format!("{}-{}", prefix, NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed))
}

/// Placeholder for text that would otherwise be empty.
const EMPTY_TEXT: &str = " ";

// =============================================================================
// Tree
// =============================================================================

/// A run of inline text, optionally bold. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub bold: bool,
}

impl TextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    fn new(text: impl Into<String>, bold: bool) -> Self {
        let text = text.into();
        let text = if text.is_empty() {
            EMPTY_TEXT.to_string()
        } else {
            text
        };
        Self { text, bold }
    }

    fn to_value(&self) -> Value {
        if self.bold {
            json!({"type": "text", "text": self.text, "marks": [{"type": "strong"}]})
        } else {
            json!({"type": "text", "text": self.text})
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Todo,
    Done,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Todo => "TODO",
            TaskState::Done => "DONE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub state: TaskState,
    pub content: Vec<TextSpan>,
}

/// Top-level block node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, content: Vec<TextSpan> },
    Paragraph(Vec<TextSpan>),
    /// One paragraph per item; nesting is flattened.
    BulletList(Vec<Vec<TextSpan>>),
    TaskList { id: String, items: Vec<TaskItem> },
    Rule,
}

impl Block {
    fn to_value(&self) -> Value {
        match self {
            Block::Heading { level, content } => json!({
                "type": "heading",
                "attrs": {"level": level},
                "content": spans_value(content),
            }),
            Block::Paragraph(content) => paragraph_value(content),
            Block::BulletList(items) => json!({
                "type": "bulletList",
                "content": items
                    .iter()
                    .map(|item| json!({"type": "listItem", "content": [paragraph_value(item)]}))
                    .collect::<Vec<_>>(),
            }),
            Block::TaskList { id, items } => json!({
                "type": "taskList",
                "attrs": {"localId": id},
                "content": items
                    .iter()
                    .map(|item| json!({
                        "type": "taskItem",
                        "attrs": {"localId": item.id, "state": item.state.as_str()},
                        "content": spans_value(&item.content),
                    }))
                    .collect::<Vec<_>>(),
            }),
            Block::Rule => json!({"type": "rule"}),
        }
    }
}

fn spans_value(spans: &[TextSpan]) -> Vec<Value> {
    spans.iter().map(TextSpan::to_value).collect()
}

fn paragraph_value(spans: &[TextSpan]) -> Value {
    json!({"type": "paragraph", "content": spans_value(spans)})
}

/// Root node. Always holds at least one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    /// The document that stands in for empty input.
    pub fn blank() -> Self {
        Self {
            blocks: vec![Block::Paragraph(vec![TextSpan::plain(EMPTY_TEXT)])],
        }
    }

    /// Text content, one line per paragraph, heading, list item or task.
    /// Rules render as `---`.
    pub fn plain_text(&self) -> String {
        fn join(spans: &[TextSpan]) -> String {
            spans.iter().map(|s| s.text.as_str()).collect()
        }

        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Heading { content, .. } | Block::Paragraph(content) => {
                    lines.push(join(content))
                }
                Block::BulletList(items) => {
                    lines.extend(items.iter().map(|item| format!("- {}", join(item))))
                }
                Block::TaskList { items, .. } => lines.extend(items.iter().map(|item| {
                    let mark = if item.state == TaskState::Done { "x" } else { " " };
                    format!("- [{}] {}", mark, join(&item.content))
                })),
                Block::Rule => lines.push("---".to_string()),
            }
        }
        lines.join("\n")
    }

    /// Wire representation: `{"type":"doc","version":1,"content":[...]}`.
    pub fn to_value(&self) -> Value {
        json!({
            "type": "doc",
            "version": 1,
            "content": self.blocks.iter().map(Block::to_value).collect::<Vec<_>>(),
        })
    }
}

// =============================================================================
// Conversion
// =============================================================================

/// Convert the supported Markdown dialect into a [`Document`].
pub fn markdown_to_document(markdown: &str) -> Document {
    let normalized = markdown.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').map(str::trim).collect();

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(caps) = HEADING_RE.captures(line) {
            if !blocks.is_empty() {
                blocks.push(Block::Rule);
            }
            blocks.push(Block::Heading {
                level: caps[1].len() as u8,
                content: parse_inline(&caps[2]),
            });
            i += 1;
            continue;
        }

        if RULE_RE.is_match(line) {
            blocks.push(Block::Rule);
            i += 1;
            continue;
        }

        if TASK_RE.is_match(line) {
            let id = next_id("tl");
            let mut items = Vec::new();
            while let Some(caps) = lines.get(i).and_then(|l| TASK_RE.captures(l)) {
                let state = if caps[1].eq_ignore_ascii_case("x") {
                    TaskState::Done
                } else {
                    TaskState::Todo
                };
                items.push(TaskItem {
                    id: next_id("ti"),
                    state,
                    content: parse_inline(&caps[2]),
                });
                i += 1;
            }
            blocks.push(Block::TaskList { id, items });
            continue;
        }

        if is_bullet_line(line) {
            let mut items = Vec::new();
            while let Some(item) = lines.get(i).filter(|l| is_bullet_line(l)) {
                items.push(parse_inline(&item[2..]));
                i += 1;
            }
            blocks.push(Block::BulletList(items));
            continue;
        }

        if !line.is_empty() {
            blocks.push(Block::Paragraph(parse_inline(line)));
        }
        i += 1;
    }

    if blocks.is_empty() {
        Document::blank()
    } else {
        Document { blocks }
    }
}

fn is_bullet_line(line: &str) -> bool {
    !TASK_RE.is_match(line) && (line.starts_with("- ") || line.starts_with("* "))
}

/// Split inline text into plain and bold spans.
fn parse_inline(text: &str) -> Vec<TextSpan> {
    if text.trim().is_empty() {
        return vec![TextSpan::plain(EMPTY_TEXT)];
    }

    let mut spans = Vec::new();
    let mut last = 0;
    for caps in BOLD_RE.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(TextSpan::plain(&text[last..whole.start()]));
        }
        spans.push(TextSpan::bold(inner.as_str()));
        last = whole.end();
    }
    if last < text.len() {
        spans.push(TextSpan::plain(&text[last..]));
    }
    spans
}
