//! Canonicalization of tracker search queries.
//!
//! Model-generated queries often mix `AND` and `OR` without grouping, which
//! the tracker evaluates as `(project AND a) OR b`, leaking results from
//! every project. These helpers regroup such queries, normalize field
//! aliases and drop duplicated alternatives.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static ORDER_BY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\sORDER\s+BY\s").unwrap());

static OR_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+OR\s+").unwrap());

static LAST_AND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^(.*)\s+AND\s+(.+)$").unwrap());

static DESCRIPTION_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdescription\s*~").unwrap());

/// Words ignored when building a free-text search term.
const STOPWORDS: &[&str] = &[
    "o", "a", "os", "as", "um", "uma", "de", "do", "da", "dos", "das", "em", "no", "na", "nos",
    "nas", "para", "por", "com", "e", "é", "me", "que", "já", "qual", "quais", "quando", "como",
    "sobre", "tem", "foi", "está", "estão", "ser", "isso", "esse", "explica", "explique",
    "mostre", "mostra", "liste", "listar", "busca", "buscar", "resume", "resumo", "fala", "fale",
    "quero", "preciso", "gostaria",
];

const MAX_SEARCH_TERMS: usize = 3;

/// Closed set of listing intents with a canned fallback query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingIntent {
    /// Open bugs, newest first.
    OpenBugs,
    /// Full-text search on keywords taken from the question.
    TextSearch,
    /// Everything, newest first.
    Default,
}

impl ListingIntent {
    /// Map a router tag to an intent. Unknown tags fall back to `Default`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "listar_bugs_abertos" => ListingIntent::OpenBugs,
            "busca_texto" => ListingIntent::TextSearch,
            _ => ListingIntent::Default,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            ListingIntent::OpenBugs => "listar_bugs_abertos",
            ListingIntent::TextSearch => "busca_texto",
            ListingIntent::Default => "default",
        }
    }
}

impl fmt::Display for ListingIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Group the alternatives of an ungrouped `project ... AND a OR b` query.
///
/// `project = X AND a OR b OR c ORDER BY k` becomes
/// `project = X AND (a OR b OR c) ORDER BY k`. Queries that are already
/// grouped, or that do not start with a project filter, are returned as-is.
pub fn fix_precedence(query: &str) -> String {
    let upper = query.to_uppercase();
    if !(upper.contains(" AND ") && upper.contains(" OR ")) {
        return query.to_string();
    }
    if upper.contains("AND (") || upper.contains("AND(") {
        return query.to_string();
    }

    let (core, order_by) = match ORDER_BY_RE.find(query) {
        Some(m) => (
            query[..m.start()].trim(),
            format!(" {}", query[m.start()..].trim()),
        ),
        None => (query.trim(), String::new()),
    };

    let parts: Vec<&str> = OR_SPLIT_RE.split(core).map(str::trim).collect();
    if parts.len() < 2 {
        return query.to_string();
    }

    let first_upper = parts[0].to_uppercase();
    if !(first_upper.contains("PROJECT") && first_upper.contains(" AND ")) {
        return query.to_string();
    }

    let Some(caps) = LAST_AND_RE.captures(parts[0]) else {
        return query.to_string();
    };
    let prefix = caps[1].trim();
    let mut conditions = vec![caps[2].trim()];
    conditions.extend(parts[1..].iter().copied());

    format!("{} AND ({}){}", prefix, conditions.join(" OR "), order_by)
}

/// Normalize a query: regroup precedence, collapse whitespace, rewrite
/// `description ~` to `text ~` and drop duplicated `OR` alternatives.
///
/// Applying it twice yields the same result as applying it once.
pub fn sanitize(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        return String::new();
    }

    let regrouped = fix_precedence(&collapse_whitespace(query));
    let collapsed = collapse_whitespace(&regrouped);
    let aliased = DESCRIPTION_ALIAS_RE.replace_all(&collapsed, "text ~");

    let mut seen: Vec<String> = Vec::new();
    let mut clauses: Vec<&str> = Vec::new();
    for clause in aliased.split(" OR ").map(str::trim).filter(|c| !c.is_empty()) {
        let normalized = collapse_whitespace(clause);
        if seen.contains(&normalized) {
            continue;
        }
        seen.push(normalized);
        clauses.push(clause);
    }
    clauses.join(" OR ")
}

/// Canned query for an intent, scoped to `project_keys` when any are given.
pub fn default_for_intent(intent: ListingIntent, question: &str, project_keys: &[String]) -> String {
    let projects = project_keys
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let scope = if projects.is_empty() {
        String::new()
    } else {
        format!("project in ({}) AND ", projects)
    };

    match intent {
        ListingIntent::OpenBugs => format!(
            "{}issuetype = Bug AND statusCategory != Done ORDER BY updated DESC",
            scope
        ),
        ListingIntent::TextSearch => {
            let terms = extract_text_query(question);
            if terms.is_empty() {
                default_for_intent(ListingIntent::Default, question, project_keys)
            } else {
                format!("{}text ~ {} ORDER BY updated DESC", scope, quote(&terms))
            }
        }
        ListingIntent::Default => {
            if projects.is_empty() {
                "ORDER BY updated DESC".to_string()
            } else {
                format!("project in ({}) ORDER BY updated DESC", projects)
            }
        }
    }
}

/// Up to three meaningful lower-case words from a question.
pub fn extract_text_query(question: &str) -> String {
    const PUNCTUATION: &[char] = &[
        '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '[', ']', '{', '}',
    ];
    question
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(PUNCTUATION).to_string())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .take(MAX_SEARCH_TERMS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
